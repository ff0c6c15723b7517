//! Scoring engine.
//!
//! Pure functions that turn a question set and an answer map into a
//! [`ScoreResult`]. The marking scheme is fixed: +4 correct, -1 wrong,
//! 0 unattempted. Ties with the passing threshold are a pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{OptionKey, Question, Verdict};

/// Marks awarded for a correct answer.
pub const CORRECT_MARKS: i32 = 4;
/// Marks awarded (deducted) for a wrong answer.
pub const WRONG_MARKS: i32 = -1;
/// Marks for a question left unattempted.
pub const UNATTEMPTED_MARKS: i32 = 0;

/// Question index (0-based, exam order) → selected option key.
///
/// A missing index means the question was not attempted.
pub type AnswerMap = BTreeMap<usize, OptionKey>;

/// Outcome of a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Wrong,
    Unattempted,
}

impl Outcome {
    /// Classify a selection against a question.
    pub fn classify(question: &Question, selected: Option<&str>) -> Self {
        match selected {
            None => Outcome::Unattempted,
            Some(key) if key == question.correct_option => Outcome::Correct,
            Some(_) => Outcome::Wrong,
        }
    }

    /// Contribution of this outcome to the total.
    pub fn marks(self) -> i32 {
        match self {
            Outcome::Correct => CORRECT_MARKS,
            Outcome::Wrong => WRONG_MARKS,
            Outcome::Unattempted => UNATTEMPTED_MARKS,
        }
    }
}

/// Marks contributed by one question given the candidate's selection.
pub fn marks_for(question: &Question, selected: Option<&str>) -> i32 {
    Outcome::classify(question, selected).marks()
}

/// Result of scoring one attempt. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Questions answered correctly, in exam order.
    pub correct_answers: Vec<Question>,
    /// Questions answered incorrectly, in exam order.
    pub wrong_answers: Vec<Question>,
    /// Questions with no selection, in exam order.
    #[serde(default)]
    pub unattempted: Vec<Question>,
    /// Sum of per-question marks. May be negative.
    #[serde(default)]
    pub total_marks_obtained: i32,
    pub verdict: Verdict,
    /// Snapshot of the answers that were scored.
    #[serde(default)]
    pub selected_options: AnswerMap,
}

impl ScoreResult {
    /// Number of questions that were scored.
    pub fn question_count(&self) -> usize {
        self.correct_answers.len() + self.wrong_answers.len() + self.unattempted.len()
    }
}

/// Score an attempt.
///
/// Deterministic and side-effect free; safe to call speculatively.
pub fn score(questions: &[Question], answers: &AnswerMap, passing_marks: i32) -> ScoreResult {
    let mut correct_answers = Vec::new();
    let mut wrong_answers = Vec::new();
    let mut unattempted = Vec::new();
    let mut total = 0;

    for (index, question) in questions.iter().enumerate() {
        let outcome = Outcome::classify(question, answers.get(&index).map(String::as_str));
        total += outcome.marks();
        match outcome {
            Outcome::Correct => correct_answers.push(question.clone()),
            Outcome::Wrong => wrong_answers.push(question.clone()),
            Outcome::Unattempted => unattempted.push(question.clone()),
        }
    }

    // Entries past the last question cannot be scored; keep the snapshot honest.
    let selected_options = answers
        .range(..questions.len())
        .map(|(i, k)| (*i, k.clone()))
        .collect();

    ScoreResult {
        correct_answers,
        wrong_answers,
        unattempted,
        total_marks_obtained: total,
        verdict: Verdict::from_marks(total, passing_marks),
        selected_options,
    }
}

/// Text used when a question carries no explanation.
pub const NO_EXPLANATION: &str = "No explanation provided.";

/// Per-question breakdown shown when reviewing a submitted attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    /// 1-based question number.
    pub number: usize,
    pub prompt: String,
    /// Submitted option key and text, `None` if unattempted.
    pub submitted: Option<(OptionKey, String)>,
    /// Correct option key and text.
    pub correct: (OptionKey, String),
    pub outcome: Outcome,
    pub marks: i32,
    pub explanation: String,
}

/// Build the review breakdown from a stored result without rescoring.
pub fn review_entries(questions: &[Question], result: &ScoreResult) -> Vec<ReviewEntry> {
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let selected = result.selected_options.get(&index).map(String::as_str);
            let outcome = Outcome::classify(question, selected);
            let option_pair = |key: &str| {
                (
                    key.to_string(),
                    question.option_text(key).unwrap_or_default().to_string(),
                )
            };

            ReviewEntry {
                number: index + 1,
                prompt: question.name.clone(),
                submitted: selected.map(option_pair),
                correct: option_pair(&question.correct_option),
                outcome,
                marks: outcome.marks(),
                explanation: question
                    .explanation
                    .clone()
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| NO_EXPLANATION.to_string()),
            }
        })
        .collect()
}
