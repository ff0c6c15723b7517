//! Terminal rendering shared by the commands.

use comfy_table::{Cell, Table};

use proctor_core::model::ExamDefinition;
use proctor_core::scoring::{Outcome, ReviewEntry, ScoreResult, CORRECT_MARKS, WRONG_MARKS};
use proctor_core::session::{ExamSession, QuestionStatus};
use proctor_core::timer::format_clock;

pub fn instructions(exam: &ExamDefinition) -> String {
    let mut out = format!("{}\n", exam.name);
    if let Some(category) = &exam.category {
        out.push_str(&format!("Category: {category}\n"));
    }
    out.push_str(&format!(
        "Questions: {}  Duration: {}  Total marks: {}  Passing marks: {}\n",
        exam.question_count(),
        format_clock(exam.duration),
        exam.total_marks,
        exam.passing_marks,
    ));
    out.push_str(&format!(
        "\nMarking: +{CORRECT_MARKS} for a correct answer, {WRONG_MARKS} for a wrong one, 0 if left blank.\n\
         The exam is submitted automatically when the time runs out.\n\
         Type `start` to begin, `help` for the list of commands.\n"
    ));
    out
}

pub fn help() -> &'static str {
    "Commands:\n  \
     start             begin the exam\n  \
     next | n          next question\n  \
     prev | p          previous question\n  \
     goto <n>          jump to question n\n  \
     select <key>      choose an option (or just type the key)\n  \
     clear             clear the selection\n  \
     mark              toggle mark for review\n  \
     status            show the current question and palette\n  \
     submit            submit the exam\n  \
     retry             resend a submission that failed\n  \
     review            show the per-question review\n  \
     retake            start over after reviewing\n  \
     quit              leave"
}

/// The current question with its options and the candidate's selection.
pub fn question(session: &ExamSession) -> String {
    let index = session.current_index();
    let question = session.current_question();
    let selected = session.selected(index);

    let mut out = format!(
        "\nQuestion {}/{}{}   time left {}\n{}\n",
        index + 1,
        session.question_count(),
        if session.is_marked(index) {
            " (marked for review)"
        } else {
            ""
        },
        format_clock(session.seconds_remaining()),
        question.name,
    );
    for (key, text) in &question.options {
        let marker = if selected == Some(key.as_str()) {
            "(x)"
        } else {
            "( )"
        };
        out.push_str(&format!("  {marker} {key}: {text}\n"));
    }
    if session.can_submit() {
        out.push_str("Type `submit` when you are done.\n");
    }
    out
}

/// One cell per question: `+` answered, `?` marked, `>` current, `.` not visited.
pub fn palette(session: &ExamSession) -> String {
    let cells: Vec<String> = (0..session.question_count())
        .filter_map(|i| {
            let symbol = match session.question_status(i)? {
                QuestionStatus::Answered => '+',
                QuestionStatus::MarkedForReview => '?',
                QuestionStatus::Current => '>',
                QuestionStatus::NotVisited => '.',
            };
            Some(format!("{}{symbol}", i + 1))
        })
        .collect();
    format!(
        "[{}]  answered {}  marked {}",
        cells.join(" "),
        session.answered_count(),
        session.marked_count()
    )
}

pub fn result_table(exam: &ExamDefinition, result: &ScoreResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Result", ""]);
    table.add_row(vec![Cell::new("Total marks"), Cell::new(exam.total_marks)]);
    table.add_row(vec![Cell::new("Passing marks"), Cell::new(exam.passing_marks)]);
    table.add_row(vec![
        Cell::new("Obtained marks"),
        Cell::new(result.total_marks_obtained),
    ]);
    table.add_row(vec![
        Cell::new("Correct answers"),
        Cell::new(result.correct_answers.len()),
    ]);
    table.add_row(vec![
        Cell::new("Wrong answers"),
        Cell::new(result.wrong_answers.len()),
    ]);
    table.add_row(vec![
        Cell::new("Unattempted"),
        Cell::new(result.unattempted.len()),
    ]);
    table.add_row(vec![Cell::new("Verdict"), Cell::new(result.verdict)]);
    table
}

pub fn review(entries: &[ReviewEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let verdict = match entry.outcome {
            Outcome::Correct => "correct",
            Outcome::Wrong => "wrong",
            Outcome::Unattempted => "not attempted",
        };
        out.push_str(&format!(
            "\n{}. {}  [{verdict}, {:+}]\n",
            entry.number, entry.prompt, entry.marks
        ));
        match &entry.submitted {
            Some((key, text)) => out.push_str(&format!("   Your answer:    {key}: {text}\n")),
            None => out.push_str("   Your answer:    -\n"),
        }
        out.push_str(&format!(
            "   Correct answer: {}: {}\n   Explanation:    {}\n",
            entry.correct.0, entry.correct.1, entry.explanation
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use proctor_core::model::Question;
    use proctor_core::scoring::{review_entries, score, AnswerMap};
    use proctor_core::session::SessionConfig;

    use super::*;

    fn exam() -> ExamDefinition {
        let options: BTreeMap<String, String> = [("A", "Paris"), ("B", "Rome")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ExamDefinition {
            id: "geo".into(),
            name: "Geography".into(),
            category: Some("General".into()),
            duration: 90,
            total_marks: 8,
            passing_marks: 4,
            questions: vec![
                Question {
                    id: "q1".into(),
                    name: "Capital of France?".into(),
                    options: options.clone(),
                    correct_option: "A".into(),
                    explanation: None,
                },
                Question {
                    id: "q2".into(),
                    name: "Capital of Italy?".into(),
                    options,
                    correct_option: "B".into(),
                    explanation: Some("Rome has been the capital since 1871.".into()),
                },
            ],
        }
    }

    #[test]
    fn instructions_mention_marking_scheme() {
        let text = instructions(&exam());
        assert!(text.contains("Geography"));
        assert!(text.contains("Duration: 0:01:30"));
        assert!(text.contains("+4"));
        assert!(text.contains("-1"));
    }

    #[test]
    fn question_shows_selection_and_palette() {
        let mut session =
            ExamSession::new(Arc::new(exam()), "u", SessionConfig::default()).unwrap();
        session.start().unwrap();
        session.select_current("B");
        session.next();
        session.toggle_review_current();

        let text = question(&session);
        assert!(text.contains("Question 2/2 (marked for review)"));
        assert!(text.contains("Type `submit`"));

        session.previous();
        let text = question(&session);
        assert!(text.contains("(x) B: Rome"));
        assert!(text.contains("( ) A: Paris"));

        assert_eq!(palette(&session), "[1+ 2?]  answered 1  marked 1");
    }

    #[test]
    fn review_lists_every_question() {
        let exam = exam();
        let answers: AnswerMap = [(0, "B".to_string())].into_iter().collect();
        let result = score(&exam.questions, &answers, exam.passing_marks);
        let text = review(&review_entries(&exam.questions, &result));

        assert!(text.contains("1. Capital of France?  [wrong, -1]"));
        assert!(text.contains("Your answer:    B: Rome"));
        assert!(text.contains("No explanation provided."));
        assert!(text.contains("2. Capital of Italy?  [not attempted, +0]"));
        assert!(text.contains("since 1871"));
    }

    #[test]
    fn result_table_has_verdict() {
        let exam = exam();
        let answers: AnswerMap = [(0, "A".to_string())].into_iter().collect();
        let result = score(&exam.questions, &answers, exam.passing_marks);
        let rendered = result_table(&exam, &result).to_string();
        assert!(rendered.contains("Obtained marks"));
        assert!(rendered.contains("Pass"));
    }
}
