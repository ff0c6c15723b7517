//! The `proctor history` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use proctor_client::config::{create_backend, load_config_from};
use proctor_core::statistics::{filter_reports, AttemptStats};
use proctor_core::traits::ReportRecord;

pub async fn execute(search: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let backend = create_backend(&config.backend)?;

    let user = backend
        .fetch_user()
        .await
        .context("failed to load the signed-in user")?;
    let reports = backend
        .fetch_reports(&user.id)
        .await
        .context("failed to load reports")?;

    let shown: Vec<ReportRecord> = filter_reports(&reports, search.as_deref().unwrap_or(""))
        .into_iter()
        .cloned()
        .collect();

    if shown.is_empty() {
        println!("No attempts found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Exam",
        "Date",
        "Total Marks",
        "Passing Marks",
        "Obtained",
        "Verdict",
    ]);
    for report in &shown {
        table.add_row(vec![
            Cell::new(&report.exam.name),
            Cell::new(report.created_at.format("%d-%m-%Y")),
            Cell::new(report.exam.total_marks),
            Cell::new(report.exam.passing_marks),
            Cell::new(report.result.total_marks_obtained),
            Cell::new(report.result.verdict),
        ]);
    }
    println!("{table}");

    let stats = AttemptStats::compute(&shown);
    println!(
        "Attempts: {}  Passed: {} ({:.1}%)  Best: {}  Average: {:.2}",
        stats.attempts,
        stats.passes,
        stats.pass_rate() * 100.0,
        stats.best_score,
        stats.average_score,
    );

    Ok(())
}
