//! Score aggregation.
//!
//! Combines per-question outcomes (auto-graded plus externally supplied
//! subjective scores) into a total score, percentage, letter grade, and
//! per-question outcome classification. Pure and idempotent: the same
//! question/answer sets always aggregate to the same result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::evaluator::{evaluate, Evaluation};
use crate::model::{
    validate_question_set, Answer, ExamResult, Question, QuestionOutcome,
};

/// One band of the letter-grade table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GradeBand {
    pub min_percentage: f64,
    pub letter: char,
}

/// Percentage-to-letter lookup table.
///
/// Bands are ordered best-first with strictly decreasing cutoffs, which is
/// what makes the mapping monotonic: a higher percentage can never land in
/// a later (worse) band than a lower one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeTable {
    bands: Vec<GradeBand>,
    fallback: char,
}

impl GradeTable {
    pub fn new(bands: Vec<GradeBand>, fallback: char) -> Result<Self, ValidationError> {
        for pair in bands.windows(2) {
            if pair[1].min_percentage >= pair[0].min_percentage {
                return Err(ValidationError::GradeTable(pair[1].min_percentage));
            }
        }
        Ok(Self { bands, fallback })
    }

    pub fn grade(&self, percentage: f64) -> char {
        self.bands
            .iter()
            .find(|band| percentage >= band.min_percentage)
            .map(|band| band.letter)
            .unwrap_or(self.fallback)
    }
}

impl Default for GradeTable {
    fn default() -> Self {
        Self {
            bands: vec![
                GradeBand {
                    min_percentage: 90.0,
                    letter: 'A',
                },
                GradeBand {
                    min_percentage: 80.0,
                    letter: 'B',
                },
                GradeBand {
                    min_percentage: 70.0,
                    letter: 'C',
                },
                GradeBand {
                    min_percentage: 60.0,
                    letter: 'D',
                },
            ],
            fallback: 'F',
        }
    }
}

/// Ratio cutoffs for the per-question outcome classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutcomeThresholds {
    /// final/marks at or above this is `correct`.
    pub correct_ratio: f64,
    /// final/marks at or above this (but below `correct_ratio`) is `partial`.
    pub partial_ratio: f64,
}

impl Default for OutcomeThresholds {
    fn default() -> Self {
        Self {
            correct_ratio: 0.7,
            partial_ratio: 0.4,
        }
    }
}

/// Aggregate one attempt with the default outcome thresholds.
pub fn aggregate(
    questions: &[Question],
    answers: &[Answer],
    table: &GradeTable,
) -> Result<ExamResult, ValidationError> {
    aggregate_with(questions, answers, table, &OutcomeThresholds::default())
}

/// Aggregate one attempt into an [`ExamResult`].
///
/// The question list is validated before any scoring runs. Grading the
/// individual questions has no ordering dependency; the reduce at the end
/// runs over all of them.
pub fn aggregate_with(
    questions: &[Question],
    answers: &[Answer],
    table: &GradeTable,
    thresholds: &OutcomeThresholds,
) -> Result<ExamResult, ValidationError> {
    validate_question_set(questions)?;

    let answers_by_id: BTreeMap<&str, &Answer> = answers
        .iter()
        .map(|a| (a.question_id.as_str(), a))
        .collect();

    let mut outcomes = BTreeMap::new();
    let mut question_scores = BTreeMap::new();
    let mut pending_review = Vec::new();
    let mut total_score = 0.0;
    let mut max_score = 0.0;

    for question in questions {
        max_score += question.marks;

        let answer = answers_by_id.get(question.id.as_str());

        let (final_score, outcome) = match answer {
            None => (0.0, QuestionOutcome::Unanswered),
            Some(answer) => match answer.response.as_ref() {
                None => (0.0, QuestionOutcome::Unanswered),
                Some(response) => match evaluate(question, response) {
                    Evaluation::Correct => (question.marks, QuestionOutcome::Correct),
                    Evaluation::Incorrect => (0.0, QuestionOutcome::Incorrect),
                    Evaluation::NeedsReview => subjective_score(question, answer, thresholds),
                },
            },
        };

        if outcome == QuestionOutcome::Pending {
            pending_review.push(question.id.clone());
        }

        total_score += final_score;
        question_scores.insert(question.id.clone(), final_score);
        outcomes.insert(question.id.clone(), outcome);
    }

    let percentage = if max_score == 0.0 {
        0.0
    } else {
        100.0 * total_score / max_score
    };

    Ok(ExamResult {
        total_score,
        max_score,
        percentage,
        grade: table.grade(percentage),
        outcomes,
        question_scores,
        pending_review,
    })
}

/// Resolve a subjective question's score from the known external scores.
///
/// A human `manual_score` (absolute points) overrides the assist service's
/// `ai_score` (a 0-100 percentage of the marks) unconditionally. With
/// neither present the question stays `pending`: "not yet graded" is never
/// folded into "graded wrong".
fn subjective_score(
    question: &Question,
    answer: &Answer,
    thresholds: &OutcomeThresholds,
) -> (f64, QuestionOutcome) {
    let final_score = if let Some(manual) = answer.manual_score {
        manual.clamp(0.0, question.marks)
    } else if let Some(ai) = answer.ai_score {
        question.marks * ai.clamp(0.0, 100.0) / 100.0
    } else {
        return (0.0, QuestionOutcome::Pending);
    };

    let ratio = final_score / question.marks;
    let outcome = if ratio >= thresholds.correct_ratio {
        QuestionOutcome::Correct
    } else if ratio >= thresholds.partial_ratio {
        QuestionOutcome::Partial
    } else {
        QuestionOutcome::Incorrect
    };
    (final_score, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerKey, Difficulty, QuestionType};

    fn objective(id: &str, qtype: QuestionType, key: &str, marks: f64) -> Question {
        Question {
            id: id.into(),
            text: format!("question {id}"),
            question_type: qtype,
            topic: "general".into(),
            difficulty: Difficulty::Medium,
            marks,
            options: if qtype == QuestionType::Choice {
                vec!["A".into(), "B".into(), "C".into()]
            } else {
                vec![]
            },
            correct_answer: Some(AnswerKey::Single(key.into())),
            grading_rubric: None,
        }
    }

    fn subjective(id: &str, marks: f64) -> Question {
        Question {
            id: id.into(),
            text: format!("essay {id}"),
            question_type: QuestionType::LongText,
            topic: "general".into(),
            difficulty: Difficulty::Medium,
            marks,
            options: vec![],
            correct_answer: None,
            grading_rubric: None,
        }
    }

    fn answered(id: &str, response: &str) -> Answer {
        Answer {
            question_id: id.into(),
            response: Some(AnswerKey::Single(response.into())),
            ai_score: None,
            ai_feedback: None,
            manual_score: None,
            manual_feedback: None,
        }
    }

    #[test]
    fn choice_plus_boolean_end_to_end() {
        let questions = vec![
            objective("q1", QuestionType::Choice, "B", 5.0),
            objective("q2", QuestionType::Boolean, "true", 5.0),
        ];
        let answers = vec![answered("q1", "B"), answered("q2", "false")];

        let result = aggregate(&questions, &answers, &GradeTable::default()).unwrap();
        assert_eq!(result.total_score, 5.0);
        assert_eq!(result.max_score, 10.0);
        assert_eq!(result.percentage, 50.0);
        assert_eq!(result.grade, 'F');
        assert_eq!(result.outcomes["q1"], QuestionOutcome::Correct);
        assert_eq!(result.outcomes["q2"], QuestionOutcome::Incorrect);
    }

    #[test]
    fn missing_answer_is_unanswered() {
        let questions = vec![objective("q1", QuestionType::Boolean, "true", 5.0)];
        let result = aggregate(&questions, &[], &GradeTable::default()).unwrap();
        assert_eq!(result.outcomes["q1"], QuestionOutcome::Unanswered);
        assert_eq!(result.total_score, 0.0);
    }

    #[test]
    fn ungraded_subjective_stays_pending_not_incorrect() {
        let questions = vec![subjective("q1", 10.0)];
        let answers = vec![answered("q1", "a long essay about rivers")];

        let result = aggregate(&questions, &answers, &GradeTable::default()).unwrap();
        assert_eq!(result.outcomes["q1"], QuestionOutcome::Pending);
        assert_eq!(result.question_scores["q1"], 0.0);
        assert_eq!(result.pending_review, vec!["q1".to_string()]);
    }

    #[test]
    fn ai_score_is_percentage_of_marks() {
        let questions = vec![subjective("q1", 8.0)];
        let mut answer = answered("q1", "essay");
        answer.ai_score = Some(50.0);

        let result = aggregate(&questions, &[answer], &GradeTable::default()).unwrap();
        assert_eq!(result.question_scores["q1"], 4.0);
        assert_eq!(result.outcomes["q1"], QuestionOutcome::Partial);
        assert!(result.pending_review.is_empty());
    }

    #[test]
    fn manual_score_overrides_ai_score() {
        let questions = vec![subjective("q1", 10.0)];
        let mut answer = answered("q1", "essay");
        answer.ai_score = Some(20.0);
        answer.manual_score = Some(9.0);

        let result = aggregate(&questions, &[answer], &GradeTable::default()).unwrap();
        assert_eq!(result.question_scores["q1"], 9.0);
        assert_eq!(result.outcomes["q1"], QuestionOutcome::Correct);
    }

    #[test]
    fn final_score_never_exceeds_marks() {
        let questions = vec![subjective("q1", 5.0)];
        let mut answer = answered("q1", "essay");
        answer.manual_score = Some(50.0);

        let result = aggregate(&questions, &[answer], &GradeTable::default()).unwrap();
        assert_eq!(result.question_scores["q1"], 5.0);
        assert_eq!(result.percentage, 100.0);

        let mut over_ai = answered("q1", "essay");
        over_ai.ai_score = Some(250.0);
        let result = aggregate(&questions, &[over_ai], &GradeTable::default()).unwrap();
        assert_eq!(result.question_scores["q1"], 5.0);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let questions = vec![
            objective("q1", QuestionType::Choice, "A", 5.0),
            subjective("q2", 10.0),
        ];
        let mut essay = answered("q2", "essay");
        essay.ai_score = Some(65.0);
        let answers = vec![answered("q1", "A"), essay];

        let first = aggregate(&questions, &answers, &GradeTable::default()).unwrap();
        let second = aggregate(&questions, &answers, &GradeTable::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn grade_mapping_is_monotonic() {
        let table = GradeTable::default();
        let mut percentages: Vec<f64> = (0..=100).map(f64::from).collect();
        percentages.push(59.9);
        percentages.push(89.9);

        // A worse letter must never appear at a higher percentage. Letters
        // in the default table are ordered A < B < ... in char order, so
        // the char itself is usable as a rank.
        for pair in percentages.windows(2) {
            let lower = table.grade(pair[0]);
            let higher = table.grade(pair[1]);
            if pair[0] <= pair[1] {
                assert!(
                    higher <= lower,
                    "grade({}) = {higher} is worse than grade({}) = {lower}",
                    pair[1],
                    pair[0]
                );
            }
        }
    }

    #[test]
    fn non_monotonic_table_is_rejected() {
        let bands = vec![
            GradeBand {
                min_percentage: 80.0,
                letter: 'A',
            },
            GradeBand {
                min_percentage: 90.0,
                letter: 'B',
            },
        ];
        assert!(matches!(
            GradeTable::new(bands, 'F'),
            Err(ValidationError::GradeTable(_))
        ));
    }

    #[test]
    fn empty_exam_scores_zero_percent() {
        let result = aggregate(&[], &[], &GradeTable::default()).unwrap();
        assert_eq!(result.max_score, 0.0);
        assert_eq!(result.percentage, 0.0);
        assert_eq!(result.grade, 'F');
    }

    #[test]
    fn malformed_questions_rejected_before_scoring() {
        let mut bad = objective("q1", QuestionType::Choice, "A", 5.0);
        bad.marks = -2.0;
        assert!(aggregate(&[bad], &[], &GradeTable::default()).is_err());
    }

    #[test]
    fn outcome_boundaries_are_inclusive() {
        let questions = vec![subjective("q1", 10.0)];

        let mut at_correct = answered("q1", "essay");
        at_correct.ai_score = Some(70.0);
        let result = aggregate(&questions, &[at_correct], &GradeTable::default()).unwrap();
        assert_eq!(result.outcomes["q1"], QuestionOutcome::Correct);

        let mut at_partial = answered("q1", "essay");
        at_partial.ai_score = Some(40.0);
        let result = aggregate(&questions, &[at_partial], &GradeTable::default()).unwrap();
        assert_eq!(result.outcomes["q1"], QuestionOutcome::Partial);

        let mut below_partial = answered("q1", "essay");
        below_partial.ai_score = Some(39.0);
        let result = aggregate(&questions, &[below_partial], &GradeTable::default()).unwrap();
        assert_eq!(result.outcomes["q1"], QuestionOutcome::Incorrect);
    }
}
