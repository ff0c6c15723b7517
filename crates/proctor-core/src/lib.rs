//! proctor-core: the exam session engine.
//!
//! This crate defines the data model, the countdown timer, the session
//! controller and the scoring rules that the rest of proctor builds on.

pub mod error;
pub mod model;
pub mod parser;
pub mod scoring;
pub mod session;
pub mod statistics;
pub mod timer;
pub mod traits;

pub use error::SessionError;
pub use model::{ExamDefinition, ExamQuery, ExamSummary, Question, UserInfo, Verdict};
pub use scoring::{score, AnswerMap, ScoreResult};
pub use session::{ExamSession, Phase, SessionConfig, SubmitPolicy, SubmitTrigger};
pub use timer::{Countdown, Tick};
pub use traits::{ExamBackend, ReportRecord, ReportRequest};
