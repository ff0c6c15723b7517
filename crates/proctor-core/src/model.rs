//! Core data model types for proctor.
//!
//! Exam definitions are loaded once from a backend and never mutated while a
//! session is running. Field names on the wire are camelCase to match the
//! documents the exam backend serves.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Key of an answer option (e.g. "A".."D").
pub type OptionKey = String;

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier within the exam.
    #[serde(alias = "_id")]
    pub id: String,
    /// The prompt shown to the candidate.
    pub name: String,
    /// Option key → option text, ordered by key.
    pub options: BTreeMap<OptionKey, String>,
    /// Key of the correct option.
    pub correct_option: OptionKey,
    /// Optional explanation shown during review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    /// Text of the given option, if the key exists.
    pub fn option_text(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Whether `key` names one of this question's options.
    pub fn has_option(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }
}

/// A complete exam as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamDefinition {
    /// Unique identifier for this exam.
    #[serde(alias = "_id")]
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Optional category (e.g. "CMAT").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Total time allowed, in seconds.
    pub duration: u32,
    /// Maximum obtainable marks.
    pub total_marks: i32,
    /// Minimum marks for a pass verdict (inclusive).
    pub passing_marks: i32,
    /// Questions in exam order.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl ExamDefinition {
    /// Number of questions in the exam.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// The question at `index`, if in bounds.
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}

/// Catalogue entry for an exam, without its questions.
///
/// Also the shape of the `exam` object nested in a stored report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub total_marks: i32,
    #[serde(default)]
    pub passing_marks: i32,
}

impl From<&ExamDefinition> for ExamSummary {
    fn from(exam: &ExamDefinition) -> Self {
        Self {
            id: exam.id.clone(),
            name: exam.name.clone(),
            category: exam.category.clone(),
            duration: exam.duration,
            total_marks: exam.total_marks,
            passing_marks: exam.passing_marks,
        }
    }
}

/// Filter for the exam catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExamQuery {
    /// Case-insensitive substring of the exam name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Exact category, ignoring case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ExamQuery {
    /// Whether `exam` passes both filters. Blank filters match everything.
    pub fn matches(&self, exam: &ExamSummary) -> bool {
        let search_ok = match non_blank(&self.search) {
            Some(needle) => exam.name.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        };
        let category_ok = match non_blank(&self.category) {
            Some(wanted) => exam
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(wanted)),
            None => true,
        };
        search_ok && category_ok
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Pass/fail outcome of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    /// Ties with the passing threshold count as a pass.
    pub fn from_marks(obtained: i32, passing_marks: i32) -> Self {
        if obtained >= passing_marks {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "Pass"),
            Verdict::Fail => write!(f, "Fail"),
        }
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pass" => Ok(Verdict::Pass),
            "fail" => Ok(Verdict::Fail),
            other => Err(format!("unknown verdict: {other}")),
        }
    }
}

/// The signed-in candidate, as returned by the user endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_tie_is_pass() {
        assert_eq!(Verdict::from_marks(10, 10), Verdict::Pass);
        assert_eq!(Verdict::from_marks(9, 10), Verdict::Fail);
        assert_eq!(Verdict::from_marks(-3, -4), Verdict::Pass);
    }

    #[test]
    fn verdict_display_and_parse() {
        assert_eq!(Verdict::Pass.to_string(), "Pass");
        assert_eq!("fail".parse::<Verdict>().unwrap(), Verdict::Fail);
        assert!("maybe".parse::<Verdict>().is_err());
    }

    #[test]
    fn exam_from_backend_json() {
        let json = r#"{
            "_id": "exam-1",
            "name": "Arithmetic",
            "duration": 600,
            "totalMarks": 8,
            "passingMarks": 4,
            "questions": [
                {
                    "_id": "q1",
                    "name": "1 + 1?",
                    "options": {"A": "1", "B": "2"},
                    "correctOption": "B"
                },
                {
                    "_id": "q2",
                    "name": "2 * 3?",
                    "options": {"A": "6", "B": "5"},
                    "correctOption": "A",
                    "explanation": "Multiplication."
                }
            ]
        }"#;
        let exam: ExamDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(exam.id, "exam-1");
        assert_eq!(exam.question_count(), 2);
        assert_eq!(exam.questions[0].option_text("B"), Some("2"));
        assert!(exam.questions[0].explanation.is_none());
        assert!(exam.question(2).is_none());
    }

    #[test]
    fn user_info_defaults() {
        let user: UserInfo = serde_json::from_str(r#"{"_id": "u1", "isAdmin": true}"#).unwrap();
        assert_eq!(user.id, "u1");
        assert!(user.is_admin);
        assert!(user.name.is_empty());
    }

    fn summary(name: &str, category: Option<&str>) -> ExamSummary {
        ExamSummary {
            id: name.to_lowercase(),
            name: name.into(),
            category: category.map(String::from),
            duration: 600,
            total_marks: 40,
            passing_marks: 20,
        }
    }

    #[test]
    fn exam_query_filters_by_name_and_category() {
        let physics = summary("JEE Physics", Some("JEE"));
        let biology = summary("NEET Biology", Some("NEET"));
        let misc = summary("Puzzles", None);

        let all = ExamQuery::default();
        assert!(all.matches(&physics) && all.matches(&misc));

        let search = ExamQuery {
            search: Some("physics".into()),
            category: None,
        };
        assert!(search.matches(&physics));
        assert!(!search.matches(&biology));

        let category = ExamQuery {
            search: Some("  ".into()),
            category: Some("neet".into()),
        };
        assert!(category.matches(&biology));
        assert!(!category.matches(&physics));
        assert!(!category.matches(&misc));
    }

    #[test]
    fn summary_from_catalogue_entry_without_questions() {
        let json = r#"{"_id": "e1", "name": "CMAT Mock", "category": "CMAT",
                       "duration": 1800, "totalMarks": 400, "passingMarks": 160,
                       "questions": ["q1", "q2"]}"#;
        let exam: ExamSummary = serde_json::from_str(json).unwrap();
        assert_eq!(exam.id, "e1");
        assert_eq!(exam.total_marks, 400);
        assert_eq!(exam.category.as_deref(), Some("CMAT"));
    }
}
