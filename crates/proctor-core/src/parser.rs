//! Exam definition parser.
//!
//! Loads exams from TOML (hand-written) or JSON (backend export) files and
//! directories, and validates them.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{ExamDefinition, Question};
use crate::scoring::CORRECT_MARKS;

/// Intermediate TOML structure for parsing exam files.
#[derive(Debug, Deserialize)]
struct TomlExamFile {
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    id: String,
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default = "default_duration")]
    duration: u32,
    #[serde(default)]
    total_marks: Option<i32>,
    #[serde(default)]
    passing_marks: i32,
}

fn default_duration() -> u32 {
    600
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    name: String,
    options: BTreeMap<String, String>,
    correct_option: String,
    #[serde(default)]
    explanation: Option<String>,
}

/// Parse a single exam file. `.json` files use the backend's format,
/// anything else is read as TOML.
pub fn parse_exam(path: &Path) -> Result<ExamDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;

    parse_exam_str(&content, path)
}

/// Parse exam file contents; the extension of `source_path` picks the format.
pub fn parse_exam_str(content: &str, source_path: &Path) -> Result<ExamDefinition> {
    if source_path.extension().is_some_and(|ext| ext == "json") {
        return serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()));
    }

    let parsed: TomlExamFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions: Vec<Question> = parsed
        .questions
        .into_iter()
        .map(|q| Question {
            id: q.id,
            name: q.name,
            options: q.options,
            correct_option: q.correct_option,
            explanation: q.explanation,
        })
        .collect();

    let total_marks = parsed
        .exam
        .total_marks
        .unwrap_or(questions.len() as i32 * CORRECT_MARKS);

    Ok(ExamDefinition {
        id: parsed.exam.id,
        name: parsed.exam.name,
        category: parsed.exam.category,
        duration: parsed.exam.duration,
        total_marks,
        passing_marks: parsed.exam.passing_marks,
        questions,
    })
}

/// Recursively load all `.toml` and `.json` exam files from a directory.
pub fn load_exam_directory(dir: &Path) -> Result<Vec<ExamDefinition>> {
    let mut exams = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            exams.extend(load_exam_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_exam(&path) {
                Ok(exam) => exams.push(exam),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    exams.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(exams)
}

/// A warning from exam validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn exam(message: impl Into<String>) -> Self {
        Self {
            question_id: None,
            message: message.into(),
        }
    }

    fn question(question: &Question, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(question.id.clone()),
            message: message.into(),
        }
    }
}

/// Validate an exam definition for common authoring mistakes.
pub fn validate_exam(exam: &ExamDefinition) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if exam.questions.is_empty() {
        warnings.push(ValidationWarning::exam("exam has no questions"));
    }

    if exam.duration == 0 {
        warnings.push(ValidationWarning::exam(
            "duration is 0; the exam submits on the first tick",
        ));
    }

    if exam.passing_marks > exam.total_marks {
        warnings.push(ValidationWarning::exam(format!(
            "passing marks ({}) exceed total marks ({})",
            exam.passing_marks, exam.total_marks
        )));
    }

    let obtainable = exam.questions.len() as i32 * CORRECT_MARKS;
    if !exam.questions.is_empty() && exam.total_marks != obtainable {
        warnings.push(ValidationWarning::exam(format!(
            "total marks ({}) differ from the obtainable maximum ({obtainable})",
            exam.total_marks
        )));
    }

    let mut seen_ids = HashSet::new();
    for question in &exam.questions {
        if !seen_ids.insert(&question.id) {
            warnings.push(ValidationWarning::question(
                question,
                format!("duplicate question ID: {}", question.id),
            ));
        }

        if question.name.trim().is_empty() {
            warnings.push(ValidationWarning::question(question, "prompt is empty"));
        }

        if question.options.len() < 2 {
            warnings.push(ValidationWarning::question(
                question,
                "fewer than two options",
            ));
        }

        if !question.has_option(&question.correct_option) {
            warnings.push(ValidationWarning::question(
                question,
                format!(
                    "correct option '{}' is not one of the options",
                    question.correct_option
                ),
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[exam]
id = "arithmetic"
name = "Arithmetic"
category = "Maths"
duration = 120
total_marks = 8
passing_marks = 4

[[questions]]
id = "add"
name = "What is 1 + 1?"
correct_option = "B"
explanation = "One plus one is two."

[questions.options]
A = "1"
B = "2"
C = "3"

[[questions]]
id = "mul"
name = "What is 2 * 3?"
correct_option = "A"

[questions.options]
A = "6"
B = "5"
"#;

    #[test]
    fn parse_valid_toml() {
        let exam = parse_exam_str(VALID_TOML, &PathBuf::from("exam.toml")).unwrap();
        assert_eq!(exam.id, "arithmetic");
        assert_eq!(exam.duration, 120);
        assert_eq!(exam.questions.len(), 2);
        assert_eq!(exam.questions[0].option_text("B"), Some("2"));
        assert_eq!(exam.questions[1].correct_option, "A");
        assert!(validate_exam(&exam).is_empty());
    }

    #[test]
    fn parse_missing_optional_fields() {
        let toml = r#"
[exam]
id = "minimal"
name = "Minimal"

[[questions]]
id = "q1"
name = "Pick A"
correct_option = "A"
options = { A = "yes", B = "no" }
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("exam.toml")).unwrap();
        assert_eq!(exam.duration, 600);
        assert_eq!(exam.total_marks, 4);
        assert_eq!(exam.passing_marks, 0);
        assert!(exam.category.is_none());
    }

    #[test]
    fn parse_backend_json() {
        let json = r#"{
            "id": "j1",
            "name": "From backend",
            "duration": 60,
            "totalMarks": 4,
            "passingMarks": 2,
            "questions": [
                {"id": "q", "name": "?", "options": {"A": "a", "B": "b"}, "correctOption": "A"}
            ]
        }"#;
        let exam = parse_exam_str(json, &PathBuf::from("exam.json")).unwrap();
        assert_eq!(exam.passing_marks, 2);
        assert_eq!(exam.questions[0].correct_option, "A");
    }

    #[test]
    fn validate_reports_authoring_mistakes() {
        let toml = r#"
[exam]
id = "broken"
name = "Broken"
duration = 0
total_marks = 4
passing_marks = 10

[[questions]]
id = "same"
name = "First"
correct_option = "E"
options = { A = "a", B = "b" }

[[questions]]
id = "same"
name = " "
correct_option = "A"
options = { A = "a" }
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("exam.toml")).unwrap();
        let warnings = validate_exam(&exam);
        let has = |needle: &str| warnings.iter().any(|w| w.message.contains(needle));
        assert!(has("duration is 0"));
        assert!(has("passing marks (10) exceed"));
        assert!(has("obtainable maximum (8)"));
        assert!(has("duplicate question ID"));
        assert!(has("'E' is not one of the options"));
        assert!(has("prompt is empty"));
        assert!(has("fewer than two options"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_exam_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("arithmetic.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not = [toml").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let exams = load_exam_directory(dir.path()).unwrap();
        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].id, "arithmetic");
    }
}
