//! The `proctor score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use proctor_core::parser::parse_exam;
use proctor_core::scoring::{review_entries, score, AnswerMap};

use crate::render;

pub fn execute(exam_path: PathBuf, answers_path: PathBuf, show_review: bool) -> Result<()> {
    let exam = parse_exam(&exam_path)?;

    let content = std::fs::read_to_string(&answers_path)
        .with_context(|| format!("failed to read answers: {}", answers_path.display()))?;
    let answers: AnswerMap = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answers: {}", answers_path.display()))?;

    let ignored = answers.range(exam.question_count()..).count();
    if ignored > 0 {
        eprintln!("Warning: {ignored} answer(s) refer to questions the exam does not have.");
    }

    let result = score(&exam.questions, &answers, exam.passing_marks);
    println!("{} ({} questions)", exam.name, exam.question_count());
    println!("{}", render::result_table(&exam, &result));

    if show_review {
        println!("{}", render::review(&review_entries(&exam.questions, &result)));
    }

    Ok(())
}
