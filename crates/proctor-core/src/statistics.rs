//! Aggregate statistics over a user's past attempts.

use serde::{Deserialize, Serialize};

use crate::traits::ReportRecord;

/// Summary of a set of attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptStats {
    /// Number of attempts.
    pub attempts: usize,
    /// Attempts with a pass verdict.
    pub passes: usize,
    /// Highest total marks, or 0 with no attempts.
    pub best_score: i32,
    /// Mean total marks, or 0.0 with no attempts.
    pub average_score: f64,
}

impl AttemptStats {
    pub fn compute(records: &[ReportRecord]) -> Self {
        let attempts = records.len();
        if attempts == 0 {
            return Self {
                attempts: 0,
                passes: 0,
                best_score: 0,
                average_score: 0.0,
            };
        }

        let scores = records.iter().map(|r| r.result.total_marks_obtained);
        let best_score = scores.clone().max().unwrap_or(0).max(0);
        let total: i64 = scores.map(i64::from).sum();
        let passes = records
            .iter()
            .filter(|r| r.result.verdict.is_pass())
            .count();

        Self {
            attempts,
            passes,
            best_score,
            average_score: total as f64 / attempts as f64,
        }
    }

    /// Fraction of attempts that passed, in [0, 1].
    pub fn pass_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.passes as f64 / self.attempts as f64
        }
    }
}

/// Keep records whose exam name contains `query` (case-insensitive) or whose
/// creation date, formatted `DD-MM-YYYY`, contains it.
pub fn filter_reports<'a>(records: &'a [ReportRecord], query: &str) -> Vec<&'a ReportRecord> {
    let needle = query.trim().to_lowercase();
    records
        .iter()
        .filter(|r| {
            needle.is_empty()
                || r.exam.name.to_lowercase().contains(&needle)
                || r.created_at
                    .format("%d-%m-%Y")
                    .to_string()
                    .contains(&needle)
        })
        .collect()
}
