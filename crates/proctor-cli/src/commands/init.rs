//! The `proctor init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create proctor.toml
    if std::path::Path::new("proctor.toml").exists() {
        println!("proctor.toml already exists, skipping.");
    } else {
        std::fs::write("proctor.toml", SAMPLE_CONFIG)?;
        println!("Created proctor.toml");
    }

    // Create sample exam
    std::fs::create_dir_all("exams")?;
    let sample_path = std::path::Path::new("exams/sample.toml");
    if sample_path.exists() {
        println!("exams/sample.toml already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_EXAM)?;
        println!("Created exams/sample.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit proctor.toml to point at your exam server, or keep the local backend");
    println!("  2. Run: proctor validate --exam exams/sample.toml");
    println!("  3. Run: proctor take --exam sample");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# proctor configuration

# Manual submit: "last_question_only" or "any_question"
submit_policy = "last_question_only"
# Automatic retries when a result cannot be saved
max_retries = 2
retry_delay_ms = 1000

[backend]
type = "local"
exams_dir = "./exams"
reports_dir = "./proctor-reports"
user_name = "${USER}"

# [backend]
# type = "http"
# base_url = "http://localhost:5000"
# token = "${PROCTOR_TOKEN}"
"#;

const SAMPLE_EXAM: &str = r#"[exam]
id = "sample"
name = "Sample Exam"
category = "General Knowledge"
duration = 300
total_marks = 12
passing_marks = 4

[[questions]]
id = "planets"
name = "How many planets are in the Solar System?"
correct_option = "B"
explanation = "Pluto was reclassified as a dwarf planet in 2006, leaving eight."

[questions.options]
A = "Seven"
B = "Eight"
C = "Nine"
D = "Ten"

[[questions]]
id = "boiling"
name = "At sea level, water boils at which temperature?"
correct_option = "C"

[questions.options]
A = "90 °C"
B = "95 °C"
C = "100 °C"
D = "110 °C"

[[questions]]
id = "largest_ocean"
name = "Which is the largest ocean?"
correct_option = "D"
explanation = "The Pacific covers roughly a third of the Earth's surface."

[questions.options]
A = "Atlantic"
B = "Indian"
C = "Arctic"
D = "Pacific"
"#;
