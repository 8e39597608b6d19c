//! Objective answer evaluation.
//!
//! A decision procedure invoked once per (question, answer) pair. Objective
//! types are classified as correct or incorrect; subjective types are always
//! flagged for external scoring. The evaluator never invents a score.

use crate::model::{AnswerKey, Question, QuestionType};

/// The evaluator's verdict on one submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    Correct,
    Incorrect,
    /// Subjective type; scoring must come from the assist service or a
    /// human override.
    NeedsReview,
}

/// Judge a submitted response against the question's correct-answer
/// specification.
pub fn evaluate(question: &Question, response: &AnswerKey) -> Evaluation {
    match question.question_type {
        QuestionType::Choice | QuestionType::Boolean => {
            match (&question.correct_answer, response) {
                (Some(AnswerKey::Single(key)), AnswerKey::Single(given)) => {
                    if normalize(given) == normalize(key) {
                        Evaluation::Correct
                    } else {
                        Evaluation::Incorrect
                    }
                }
                // Shape mismatch (or a key the validator should have caught)
                // never earns credit.
                _ => Evaluation::Incorrect,
            }
        }
        QuestionType::FillBlank => match (&question.correct_answer, response) {
            (Some(AnswerKey::Single(key)), AnswerKey::Single(given)) => {
                if normalize(given) == normalize(key) {
                    Evaluation::Correct
                } else {
                    Evaluation::Incorrect
                }
            }
            (Some(AnswerKey::Many(keys)), AnswerKey::Many(given)) => {
                let all_match = keys.len() == given.len()
                    && keys
                        .iter()
                        .zip(given.iter())
                        .all(|(k, g)| normalize(g) == normalize(k));
                if all_match {
                    Evaluation::Correct
                } else {
                    Evaluation::Incorrect
                }
            }
            _ => Evaluation::Incorrect,
        },
        QuestionType::ShortText | QuestionType::LongText | QuestionType::NumericProblem => {
            Evaluation::NeedsReview
        }
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}
