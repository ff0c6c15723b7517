//! The `proctor take` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use proctor_client::config::{create_backend, load_config_from};
use proctor_core::session::{ExamSession, Phase, SubmitTrigger};
use proctor_core::traits::ExamBackend;
use proctor_core::SessionError;

use crate::render;

/// A line typed by the candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Next,
    Previous,
    /// 1-based question number.
    Goto(usize),
    Select(String),
    Clear,
    Mark,
    Status,
    Submit,
    Retry,
    Review,
    Retake,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err("empty command".into());
    };
    let arg = words.next();

    let command = match (head.to_lowercase().as_str(), arg) {
        ("start", None) => Command::Start,
        ("next" | "n", None) => Command::Next,
        ("prev" | "p", None) => Command::Previous,
        ("goto" | "g", Some(n)) => match n.parse::<usize>() {
            Ok(n) if n >= 1 => Command::Goto(n),
            _ => return Err(format!("not a question number: {n}")),
        },
        ("select" | "s", Some(key)) => Command::Select(key.to_string()),
        ("clear", None) => Command::Clear,
        ("mark", None) => Command::Mark,
        ("status", None) => Command::Status,
        ("submit", None) => Command::Submit,
        ("retry", None) => Command::Retry,
        ("review", None) => Command::Review,
        ("retake", None) => Command::Retake,
        ("help" | "?", None) => Command::Help,
        ("quit" | "exit" | "q", None) => Command::Quit,
        // A bare short token is taken as an option key.
        (_, None) if head.len() <= 2 => Command::Select(head.to_string()),
        _ => return Err(format!("unknown command: {}", line.trim())),
    };

    if words.next().is_some() {
        return Err(format!("too many arguments: {}", line.trim()));
    }
    Ok(command)
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub async fn execute(exam_id: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let backend = create_backend(&config.backend)?;

    let user = backend
        .fetch_user()
        .await
        .context("failed to load the signed-in user")?;
    let exam = backend
        .fetch_exam(&exam_id)
        .await
        .with_context(|| format!("failed to load exam '{exam_id}'"))?;

    tracing::debug!(backend = backend.name(), exam = %exam.id, user = %user.id, "exam loaded");

    let mut session = ExamSession::new(Arc::new(exam), user.id, config.session_config())?;
    println!("{}", render::instructions(session.exam()));

    let mut input = spawn_stdin_reader();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let flow = match parse_command(&line) {
                    Ok(command) => handle(&mut session, backend.as_ref(), command).await,
                    Err(message) => {
                        println!("{message} (type `help` for commands)");
                        Flow::Continue
                    }
                };
                if flow == Flow::Quit {
                    break;
                }
            }
            _ = ticker.tick() => on_tick(&mut session, backend.as_ref()).await,
        }
    }

    if session.is_submission_pending() {
        eprintln!("Warning: your result was scored but never saved.");
    }
    Ok(())
}

/// Read stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn on_tick(session: &mut ExamSession, backend: &dyn ExamBackend) {
    if let Some(request) = session.on_tick() {
        println!("\nTime is up! Submitting your answers...");
        let outcome = session.persist(request, backend).await;
        report_submission(session, outcome);
        return;
    }

    let remaining = session.seconds_remaining();
    if session.phase() == Phase::InProgress && remaining > 0 && remaining % 60 == 0 {
        println!("{} left", proctor_core::timer::format_clock(remaining));
    }
}

async fn handle(session: &mut ExamSession, backend: &dyn ExamBackend, command: Command) -> Flow {
    match command {
        Command::Start => match session.start() {
            Ok(()) => show_question(session),
            Err(e) => println!("{e}"),
        },
        Command::Next => {
            if session.next() {
                show_question(session);
            } else {
                println!("No next question.");
            }
        }
        Command::Previous => {
            if session.previous() {
                show_question(session);
            } else {
                println!("No previous question.");
            }
        }
        Command::Goto(number) => {
            if session.go_to(number - 1) {
                show_question(session);
            } else {
                println!("No question {number}.");
            }
        }
        Command::Select(key) => {
            let question = session.current_question();
            let key = if question.has_option(&key) {
                key
            } else {
                key.to_uppercase()
            };
            if session.select_current(&key) {
                show_question(session);
            } else {
                println!("Cannot select '{key}' now.");
            }
        }
        Command::Clear => {
            if session.clear_current() {
                show_question(session);
            }
        }
        Command::Mark => {
            if session.toggle_review_current() {
                show_question(session);
            }
        }
        Command::Status => match session.phase() {
            Phase::InProgress => show_question(session),
            phase => println!("Exam is {phase}."),
        },
        Command::Submit => {
            let outcome = session.submit(SubmitTrigger::Manual, backend).await;
            report_submission(session, outcome);
        }
        Command::Retry => match session.retry_submit() {
            Ok(request) => {
                let outcome = session.persist(request, backend).await;
                report_submission(session, outcome);
            }
            Err(e) => println!("{e}"),
        },
        Command::Review => match session.review() {
            Ok(_) => {
                if let Some(entries) = session.review_entries() {
                    println!("{}", render::review(&entries));
                }
                println!("Type `retake` to try again or `quit` to leave.");
            }
            Err(e) => println!("{e}"),
        },
        Command::Retake => match session.retake() {
            Ok(()) => println!("{}", render::instructions(session.exam())),
            Err(e) => println!("{e}"),
        },
        Command::Help => println!("{}", render::help()),
        Command::Quit => return Flow::Quit,
    }
    Flow::Continue
}

fn show_question(session: &ExamSession) {
    println!("{}", render::question(session));
    println!("{}", render::palette(session));
}

fn report_submission(session: &ExamSession, outcome: Result<(), SessionError>) {
    match outcome {
        Ok(()) => {
            println!("Exam submitted.");
            if let Some(result) = session.result() {
                println!("{}", render::result_table(session.exam(), result));
            }
            println!("Type `review` to see the answers.");
        }
        Err(e) if e.is_retryable() => {
            println!("{e}");
            println!("Your answers are kept. Type `retry` to send them again.");
        }
        Err(e) => println!("{e}"),
    }
}
