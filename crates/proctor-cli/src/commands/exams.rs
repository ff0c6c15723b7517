//! The `proctor exams` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use proctor_client::config::{create_backend, load_config_from};
use proctor_core::model::{ExamQuery, ExamSummary};
use proctor_core::timer::format_clock;

pub async fn execute(
    search: Option<String>,
    category: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let backend = create_backend(&config.backend)?;

    let query = ExamQuery { search, category };
    let mut exams = backend
        .fetch_exams(&query)
        .await
        .context("failed to load the exam catalogue")?;
    tracing::debug!(backend = backend.name(), count = exams.len(), "catalogue loaded");

    if exams.is_empty() {
        println!("No exams found.");
        return Ok(());
    }

    exams.sort_by(|a, b| a.name.cmp(&b.name));
    println!("{}", catalogue_table(&exams));
    Ok(())
}

fn catalogue_table(exams: &[ExamSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Id",
        "Name",
        "Category",
        "Duration",
        "Total Marks",
        "Passing Marks",
    ]);
    for exam in exams {
        table.add_row(vec![
            Cell::new(&exam.id),
            Cell::new(&exam.name),
            Cell::new(exam.category.as_deref().unwrap_or("-")),
            Cell::new(format_clock(exam.duration)),
            Cell::new(exam.total_marks),
            Cell::new(exam.passing_marks),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncategorised_exams_show_a_dash() {
        let exams = vec![ExamSummary {
            id: "warmup".into(),
            name: "Warm-up".into(),
            category: None,
            duration: 90,
            total_marks: 8,
            passing_marks: 4,
        }];
        let rendered = catalogue_table(&exams).to_string();
        assert!(rendered.contains("Warm-up"));
        assert!(rendered.contains(" - "));
        assert!(rendered.contains(&format_clock(90)));
    }
}
