//! Exam session controller.
//!
//! One [`ExamSession`] owns every piece of mutable state for one candidate
//! taking one exam: phase, question pointer, answers, review flags, the
//! countdown and the scored result. All transitions run to completion on
//! `&mut self`; the only suspension point is the report submission.
//!
//! ```text
//! instructions --start--> in progress --submit/time up--> submitted --review--> review
//!      ^                                                                          |
//!      +---------------------------------retake-----------------------------------+
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{ExamDefinition, Question};
use crate::scoring::{self, AnswerMap, ReviewEntry, ScoreResult};
use crate::timer::{Countdown, Tick};
use crate::traits::{ExamBackend, ReportRequest};

/// Upper bound for the delay between automatic submission retries.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Instructions,
    InProgress,
    Submitted,
    Review,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Instructions => write!(f, "reading instructions"),
            Phase::InProgress => write!(f, "in progress"),
            Phase::Submitted => write!(f, "submitted"),
            Phase::Review => write!(f, "reviewing"),
        }
    }
}

/// What caused a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// The candidate asked to submit.
    Manual,
    /// The countdown expired.
    TimeUp,
}

/// Where a manual submit is accepted. Expiry always submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitPolicy {
    #[default]
    LastQuestionOnly,
    AnyQuestion,
}

/// Automatic retry of a failed report submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero leaves retrying to the candidate.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Configuration for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub submit_policy: SubmitPolicy,
    pub retry: RetryPolicy,
}

/// Palette state of a question, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Answered,
    MarkedForReview,
    Current,
    NotVisited,
}

/// The session state machine.
#[derive(Debug)]
pub struct ExamSession {
    exam: Arc<ExamDefinition>,
    user_id: String,
    config: SessionConfig,
    attempt_id: Uuid,
    phase: Phase,
    current_index: usize,
    answers: AnswerMap,
    review_flags: BTreeSet<usize>,
    seconds_remaining: u32,
    countdown: Countdown,
    /// Computed once per attempt; frozen answers while awaiting persistence.
    result: Option<ScoreResult>,
    in_flight: bool,
}

impl ExamSession {
    /// Build a session in the instructions phase.
    pub fn new(
        exam: Arc<ExamDefinition>,
        user_id: impl Into<String>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        if exam.questions.is_empty() {
            return Err(SessionError::EmptyExam(exam.id.clone()));
        }

        let seconds_remaining = exam.duration;
        Ok(Self {
            exam,
            user_id: user_id.into(),
            config,
            attempt_id: Uuid::new_v4(),
            phase: Phase::Instructions,
            current_index: 0,
            answers: AnswerMap::new(),
            review_flags: BTreeSet::new(),
            seconds_remaining,
            countdown: Countdown::new(),
            result: None,
            in_flight: false,
        })
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Leave the instructions and start the countdown.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.expect_phase(Phase::Instructions, "start the exam")?;
        self.seconds_remaining = self.exam.duration;
        self.countdown.start(self.exam.duration);
        self.phase = Phase::InProgress;
        tracing::info!(
            exam = %self.exam.id,
            attempt = %self.attempt_id,
            duration = self.exam.duration,
            "exam started"
        );
        Ok(())
    }

    /// Advance the countdown by one second.
    ///
    /// Returns the report to persist when this tick expired the exam. Ticks
    /// arriving outside an active attempt (including ones queued before a
    /// manual submit) are ignored.
    pub fn on_tick(&mut self) -> Option<ReportRequest> {
        if self.phase != Phase::InProgress || self.answers_frozen() {
            return None;
        }

        match self.countdown.tick() {
            Tick::Idle => None,
            Tick::Remaining(secs) => {
                self.seconds_remaining = secs;
                None
            }
            Tick::Expired => {
                self.seconds_remaining = 0;
                tracing::info!(exam = %self.exam.id, "time up, submitting");
                match self.begin_submit(SubmitTrigger::TimeUp) {
                    Ok(request) => Some(request),
                    Err(e) => {
                        tracing::debug!("expiry ignored: {e}");
                        None
                    }
                }
            }
        }
    }

    /// Score the attempt (once) and hand out the report to persist.
    ///
    /// Stops the countdown and marks the submission as in flight. If a
    /// previous attempt to persist failed, the stored result is reused.
    pub fn begin_submit(&mut self, trigger: SubmitTrigger) -> Result<ReportRequest, SessionError> {
        self.expect_phase(Phase::InProgress, "submit")?;
        if self.in_flight {
            return Err(SessionError::SubmissionInFlight);
        }
        if trigger == SubmitTrigger::Manual && self.result.is_none() && !self.can_submit() {
            return Err(SessionError::SubmitNotAllowed);
        }

        self.countdown.stop();

        let result = match &self.result {
            Some(result) => result.clone(),
            None => {
                let result =
                    scoring::score(&self.exam.questions, &self.answers, self.exam.passing_marks);
                tracing::info!(
                    exam = %self.exam.id,
                    attempt = %self.attempt_id,
                    ?trigger,
                    total = result.total_marks_obtained,
                    verdict = %result.verdict,
                    "attempt scored"
                );
                self.result = Some(result.clone());
                result
            }
        };

        self.in_flight = true;
        Ok(ReportRequest {
            exam: self.exam.id.clone(),
            result,
            user: self.user_id.clone(),
        })
    }

    /// Record the backend's answer to the report started by [`begin_submit`].
    ///
    /// On success the session moves to `Submitted`. On failure it stays in
    /// progress with the result kept for [`retry_submit`].
    ///
    /// [`begin_submit`]: ExamSession::begin_submit
    /// [`retry_submit`]: ExamSession::retry_submit
    pub fn complete_submit(&mut self, outcome: anyhow::Result<()>) -> Result<(), SessionError> {
        if !self.in_flight {
            return Err(SessionError::InvalidPhase {
                action: "complete a submission",
                phase: self.phase,
            });
        }
        self.in_flight = false;

        match outcome {
            Ok(()) => {
                self.phase = Phase::Submitted;
                tracing::info!(exam = %self.exam.id, attempt = %self.attempt_id, "report saved");
                Ok(())
            }
            Err(e) => {
                let message = format!("{e:#}");
                tracing::warn!(exam = %self.exam.id, "report submission failed: {message}");
                Err(SessionError::SubmissionFailed(message))
            }
        }
    }

    /// Re-send the already scored result after a failed submission.
    pub fn retry_submit(&mut self) -> Result<ReportRequest, SessionError> {
        if self.phase != Phase::InProgress || self.result.is_none() {
            return Err(SessionError::NothingToRetry);
        }
        self.begin_submit(SubmitTrigger::Manual)
    }

    /// Submit and persist through `backend`, retrying per the session's
    /// [`RetryPolicy`] with exponential backoff.
    ///
    /// Also resumes a previously failed submission without rescoring.
    pub async fn submit(
        &mut self,
        trigger: SubmitTrigger,
        backend: &dyn ExamBackend,
    ) -> Result<(), SessionError> {
        let request = self.begin_submit(trigger)?;
        self.persist(request, backend).await
    }

    /// Persist a report obtained from [`begin_submit`], [`retry_submit`] or
    /// [`on_tick`].
    ///
    /// [`begin_submit`]: ExamSession::begin_submit
    /// [`retry_submit`]: ExamSession::retry_submit
    /// [`on_tick`]: ExamSession::on_tick
    pub async fn persist(
        &mut self,
        request: ReportRequest,
        backend: &dyn ExamBackend,
    ) -> Result<(), SessionError> {
        let mut retry_delay = self.config.retry.retry_delay;
        let mut retry = 0;
        loop {
            match backend.submit_report(&request).await {
                Ok(()) => return self.complete_submit(Ok(())),
                Err(e) if retry < self.config.retry.max_retries => {
                    retry += 1;
                    tracing::warn!(
                        backend = backend.name(),
                        "report submission failed, retry {retry} in {retry_delay:?}: {e:#}"
                    );
                    tokio::time::sleep(retry_delay).await;
                    retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
                }
                Err(e) => return self.complete_submit(Err(e)),
            }
        }
    }

    /// Open the review of a submitted attempt. Never rescores.
    pub fn review(&mut self) -> Result<&ScoreResult, SessionError> {
        self.expect_phase(Phase::Submitted, "review")?;
        self.phase = Phase::Review;
        self.result.as_ref().ok_or(SessionError::InvalidPhase {
            action: "review",
            phase: Phase::Submitted,
        })
    }

    /// Reset the attempt and return to the instructions.
    pub fn retake(&mut self) -> Result<(), SessionError> {
        self.expect_phase(Phase::Review, "retake")?;
        self.countdown = Countdown::new();
        self.answers.clear();
        self.review_flags.clear();
        self.current_index = 0;
        self.seconds_remaining = self.exam.duration;
        self.result = None;
        self.attempt_id = Uuid::new_v4();
        self.phase = Phase::Instructions;
        tracing::info!(exam = %self.exam.id, attempt = %self.attempt_id, "retake");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Answers and navigation
    // -----------------------------------------------------------------------

    /// Select `key` for question `index`. Idempotent.
    pub fn select_option(&mut self, index: usize, key: &str) -> bool {
        if !self.accepts_answers("select") {
            return false;
        }
        match self.exam.question(index) {
            Some(question) if question.has_option(key) => {
                self.answers.insert(index, key.to_string());
                true
            }
            _ => {
                tracing::debug!(index, key, "select ignored: no such question or option");
                false
            }
        }
    }

    /// Remove the selection for question `index`. Returns whether one existed.
    pub fn clear_option(&mut self, index: usize) -> bool {
        if !self.accepts_answers("clear") {
            return false;
        }
        self.answers.remove(&index).is_some()
    }

    /// Flip the review flag of question `index`.
    pub fn toggle_review(&mut self, index: usize) -> bool {
        if !self.accepts_answers("mark") || index >= self.question_count() {
            return false;
        }
        if !self.review_flags.remove(&index) {
            self.review_flags.insert(index);
        }
        true
    }

    pub fn select_current(&mut self, key: &str) -> bool {
        self.select_option(self.current_index, key)
    }

    pub fn clear_current(&mut self) -> bool {
        self.clear_option(self.current_index)
    }

    pub fn toggle_review_current(&mut self) -> bool {
        self.toggle_review(self.current_index)
    }

    /// Jump to question `index`. Out-of-range targets are ignored.
    pub fn go_to(&mut self, index: usize) -> bool {
        if self.phase != Phase::InProgress || index >= self.question_count() {
            tracing::debug!(index, phase = %self.phase, "navigation ignored");
            return false;
        }
        self.current_index = index;
        true
    }

    /// Move forward one question; no-op on the last.
    pub fn next(&mut self) -> bool {
        self.go_to(self.current_index + 1)
    }

    /// Move back one question; no-op on the first.
    pub fn previous(&mut self) -> bool {
        match self.current_index.checked_sub(1) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn exam(&self) -> &ExamDefinition {
        &self.exam
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.exam.questions[self.current_index]
    }

    pub fn question_count(&self) -> usize {
        self.exam.questions.len()
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 == self.question_count()
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn selected(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn is_marked(&self, index: usize) -> bool {
        self.review_flags.contains(&index)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn marked_count(&self) -> usize {
        self.review_flags.len()
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    /// The scored result, once the attempt has been submitted.
    pub fn result(&self) -> Option<&ScoreResult> {
        self.result.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Scored but not yet accepted by the backend.
    pub fn is_submission_pending(&self) -> bool {
        self.phase == Phase::InProgress && self.result.is_some() && !self.in_flight
    }

    /// Whether a manual submit is currently enabled.
    pub fn can_submit(&self) -> bool {
        self.phase == Phase::InProgress
            && !self.in_flight
            && match self.config.submit_policy {
                SubmitPolicy::AnyQuestion => true,
                SubmitPolicy::LastQuestionOnly => self.is_last_question(),
            }
    }

    /// Palette status of question `index`.
    pub fn question_status(&self, index: usize) -> Option<QuestionStatus> {
        if index >= self.question_count() {
            return None;
        }
        let status = if self.answers.contains_key(&index) {
            QuestionStatus::Answered
        } else if self.review_flags.contains(&index) {
            QuestionStatus::MarkedForReview
        } else if index == self.current_index {
            QuestionStatus::Current
        } else {
            QuestionStatus::NotVisited
        };
        Some(status)
    }

    /// Per-question breakdown of the submitted attempt.
    pub fn review_entries(&self) -> Option<Vec<ReviewEntry>> {
        match self.phase {
            Phase::Submitted | Phase::Review => self
                .result
                .as_ref()
                .map(|result| scoring::review_entries(&self.exam.questions, result)),
            _ => None,
        }
    }

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidPhase {
                action,
                phase: self.phase,
            })
        }
    }

    fn answers_frozen(&self) -> bool {
        self.in_flight || self.result.is_some()
    }

    fn accepts_answers(&self, action: &str) -> bool {
        let accepted = self.phase == Phase::InProgress && !self.answers_frozen();
        if !accepted {
            tracing::debug!(action, phase = %self.phase, "answer change ignored");
        }
        accepted
    }
}
