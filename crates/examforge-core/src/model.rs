//! Core data model types for examforge.
//!
//! These are the fundamental types that the entire examforge system uses
//! to represent questions, answers, attempt history, and student profiles.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Skill level assigned to students before any attempt history exists.
pub const DEFAULT_SKILL_LEVEL: u8 = 5;

/// The kind of question, which determines how it is graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Choice,
    Boolean,
    FillBlank,
    ShortText,
    LongText,
    NumericProblem,
}

impl QuestionType {
    /// Objective types have a single verifiable correct answer and are
    /// auto-gradable. Everything else requires AI or human judgment.
    pub fn is_objective(self) -> bool {
        matches!(
            self,
            QuestionType::Choice | QuestionType::Boolean | QuestionType::FillBlank
        )
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Choice => write!(f, "choice"),
            QuestionType::Boolean => write!(f, "boolean"),
            QuestionType::FillBlank => write!(f, "fill_blank"),
            QuestionType::ShortText => write!(f, "short_text"),
            QuestionType::LongText => write!(f, "long_text"),
            QuestionType::NumericProblem => write!(f, "numeric_problem"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "choice" | "multiple_choice" => Ok(QuestionType::Choice),
            "boolean" | "true_false" => Ok(QuestionType::Boolean),
            "fill_blank" | "fillblank" => Ok(QuestionType::FillBlank),
            "short_text" => Ok(QuestionType::ShortText),
            "long_text" => Ok(QuestionType::LongText),
            "numeric_problem" => Ok(QuestionType::NumericProblem),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Question difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Map a 1-10 difficulty preference onto a tier.
    pub fn from_preference(level: u8) -> Self {
        match level {
            0..=3 => Difficulty::Easy,
            4..=6 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    /// The 1-10 preference value a tier corresponds to.
    pub fn preference_level(self) -> u8 {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Medium => 5,
            Difficulty::Hard => 8,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A correct-answer specification or a student response.
///
/// `Many` carries one entry per blank for multi-blank fill-in questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    Single(String),
    Many(Vec<String>),
}

impl AnswerKey {
    /// Flatten to a display string for prompts and feedback.
    pub fn as_text(&self) -> String {
        match self {
            AnswerKey::Single(s) => s.clone(),
            AnswerKey::Many(parts) => parts.join("; "),
        }
    }
}

/// A single exam question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within an exam.
    pub id: String,
    /// The question text shown to the student.
    pub text: String,
    /// Question kind, drives grading.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Topic this question covers.
    pub topic: String,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Marks awarded for a fully correct answer. Must be positive.
    pub marks: f64,
    /// Options for choice questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// The correct answer. Required for objective types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<AnswerKey>,
    /// Rubric handed to the subjective-grading assist service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grading_rubric: Option<String>,
}

/// A student's answer to one question, together with any subjective scores
/// already supplied by the assist service or a human grader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    /// The submitted response. `None` means the question was left blank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AnswerKey>,
    /// Assist-service score as a percentage (0-100) of the question's marks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_feedback: Option<String>,
    /// Human override, in absolute points. Always wins over `ai_score`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_feedback: Option<String>,
}

/// One graded question inside a historical attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptEntry {
    pub question_id: String,
    pub question_type: QuestionType,
    pub topic: String,
    pub marks: f64,
    pub score_earned: f64,
    #[serde(default = "default_true")]
    pub answered: bool,
}

fn default_true() -> bool {
    true
}

/// Immutable record of one completed exam attempt. Read-only input to
/// profile analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub exam_id: String,
    /// Overall percentage scored on this attempt.
    pub percentage: f64,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub entries: Vec<AttemptEntry>,
}

/// Direction a student's recent results are moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Improving => write!(f, "improving"),
            Trend::Declining => write!(f, "declining"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Persisted per-student-per-subject mastery summary.
///
/// Keyed by (student_id, subject). Created on first analysis, updated in
/// place afterwards, never deleted by this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceProfile {
    pub student_id: String,
    pub subject: String,
    /// 1-10 proficiency summary.
    pub skill_level: u8,
    #[serde(default)]
    pub strengths: BTreeSet<String>,
    #[serde(default)]
    pub weaknesses: BTreeSet<String>,
    #[serde(default)]
    pub preferred_question_types: BTreeSet<QuestionType>,
    /// 1-10 difficulty preference.
    pub difficulty_preference: u8,
    pub trend: Trend,
    pub updated_at: DateTime<Utc>,
}

/// Output of a profile analysis run: the profile fields plus the derived
/// values the adaptive selector consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    pub student_id: String,
    pub subject: String,
    pub skill_level: u8,
    pub strengths: BTreeSet<String>,
    pub weaknesses: BTreeSet<String>,
    pub preferred_question_types: BTreeSet<QuestionType>,
    pub difficulty_preference: u8,
    pub trend: Trend,
    /// Mean percentage over the attempt window. `None` when no attempts
    /// were available.
    pub average_score: Option<f64>,
    pub recommended_difficulty: Difficulty,
    /// Topics the next exam should concentrate on, weakest first.
    pub focus_topics: Vec<String>,
}

impl PerformanceAnalysis {
    /// The analysis used when neither a stored profile nor attempt history
    /// exists.
    pub fn defaults(student_id: &str, subject: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            subject: subject.to_string(),
            skill_level: DEFAULT_SKILL_LEVEL,
            strengths: BTreeSet::new(),
            weaknesses: BTreeSet::new(),
            preferred_question_types: BTreeSet::new(),
            difficulty_preference: Difficulty::Medium.preference_level(),
            trend: Trend::Stable,
            average_score: None,
            recommended_difficulty: Difficulty::Medium,
            focus_topics: Vec::new(),
        }
    }

    /// Carry a stored profile over unchanged (used when no new attempts
    /// are available).
    pub fn from_profile(profile: &PerformanceProfile) -> Self {
        Self {
            student_id: profile.student_id.clone(),
            subject: profile.subject.clone(),
            skill_level: profile.skill_level,
            strengths: profile.strengths.clone(),
            weaknesses: profile.weaknesses.clone(),
            preferred_question_types: profile.preferred_question_types.clone(),
            difficulty_preference: profile.difficulty_preference,
            trend: profile.trend,
            average_score: None,
            recommended_difficulty: Difficulty::from_preference(profile.difficulty_preference),
            focus_topics: profile.weaknesses.iter().cloned().collect(),
        }
    }

    /// Materialize a brand-new profile row from this analysis.
    pub fn to_profile(&self, now: DateTime<Utc>) -> PerformanceProfile {
        PerformanceProfile {
            student_id: self.student_id.clone(),
            subject: self.subject.clone(),
            skill_level: self.skill_level,
            strengths: self.strengths.clone(),
            weaknesses: self.weaknesses.clone(),
            preferred_question_types: self.preferred_question_types.clone(),
            difficulty_preference: self.difficulty_preference,
            trend: self.trend,
            updated_at: now,
        }
    }

    /// Overwrite the analytic fields of an existing profile row. The
    /// identity key and the stored difficulty preference are left alone.
    pub fn apply_to(&self, profile: &mut PerformanceProfile, now: DateTime<Utc>) {
        profile.skill_level = self.skill_level;
        profile.strengths = self.strengths.clone();
        profile.weaknesses = self.weaknesses.clone();
        profile.preferred_question_types = self.preferred_question_types.clone();
        profile.trend = self.trend;
        profile.updated_at = now;
    }
}

/// Classification of one question's outcome for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionOutcome {
    Correct,
    Incorrect,
    Partial,
    /// Subjective question still waiting for an AI or manual score.
    Pending,
    Unanswered,
}

impl fmt::Display for QuestionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionOutcome::Correct => write!(f, "correct"),
            QuestionOutcome::Incorrect => write!(f, "incorrect"),
            QuestionOutcome::Partial => write!(f, "partial"),
            QuestionOutcome::Pending => write!(f, "pending"),
            QuestionOutcome::Unanswered => write!(f, "unanswered"),
        }
    }
}

/// The aggregated result of grading one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub total_score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub grade: char,
    /// Per-question outcome classification, keyed by question id.
    pub outcomes: BTreeMap<String, QuestionOutcome>,
    /// Per-question final scores, keyed by question id.
    pub question_scores: BTreeMap<String, f64>,
    /// Questions that still need manual review before the result is final.
    pub pending_review: Vec<String>,
}

/// A named collection of questions, typically one exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    pub id: String,
    pub name: String,
    pub subject: String,
    #[serde(default)]
    pub grade_level: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// One student's submitted answers for an exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub student_id: String,
    pub exam_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// Advisory topic-mix percentages communicated to the generation service.
///
/// The service authors the questions, so the mix cannot be verified locally;
/// this is a contract, not an enforced invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixPolicy {
    pub weakness_pct: u8,
    pub strength_pct: u8,
    pub novel_pct: u8,
}

impl Default for MixPolicy {
    fn default() -> Self {
        Self {
            weakness_pct: 60,
            strength_pct: 30,
            novel_pct: 10,
        }
    }
}

/// Skill-scaled marks per difficulty tier for newly authored questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkWeighting {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl MarkWeighting {
    pub fn marks_for(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}

/// Parameter object sent to the external question-generation service.
/// Request-scoped only; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub subject: String,
    pub grade_level: String,
    pub difficulty: Difficulty,
    /// Topics the exam should focus on. Empty means the service default.
    #[serde(default)]
    pub topics: Vec<String>,
    pub question_count: usize,
    pub mark_weighting: MarkWeighting,
    pub mix_policy: MixPolicy,
    /// One-line profile summary for the service's prompt context.
    #[serde(default)]
    pub profile_summary: String,
}

/// Check a question list before any grading or analysis runs.
///
/// Malformed input is rejected here; it is never silently coerced.
pub fn validate_question_set(questions: &[Question]) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for q in questions {
        if q.id.trim().is_empty() {
            return Err(ValidationError::Question {
                id: q.id.clone(),
                reason: "empty question id".into(),
            });
        }
        if !seen.insert(q.id.clone()) {
            return Err(ValidationError::DuplicateId(q.id.clone()));
        }
        if q.text.trim().is_empty() {
            return Err(ValidationError::Question {
                id: q.id.clone(),
                reason: "empty question text".into(),
            });
        }
        if q.topic.trim().is_empty() {
            return Err(ValidationError::Question {
                id: q.id.clone(),
                reason: "empty topic".into(),
            });
        }
        if !q.marks.is_finite() || q.marks <= 0.0 {
            return Err(ValidationError::Question {
                id: q.id.clone(),
                reason: format!("marks must be positive, got {}", q.marks),
            });
        }
        if q.question_type.is_objective() {
            match &q.correct_answer {
                None => {
                    return Err(ValidationError::Question {
                        id: q.id.clone(),
                        reason: format!("{} question has no correct answer", q.question_type),
                    });
                }
                Some(AnswerKey::Many(parts)) if parts.is_empty() => {
                    return Err(ValidationError::Question {
                        id: q.id.clone(),
                        reason: "empty answer list".into(),
                    });
                }
                Some(_) => {}
            }
        }
        if q.question_type == QuestionType::Choice {
            if q.options.is_empty() {
                return Err(ValidationError::Question {
                    id: q.id.clone(),
                    reason: "choice question has no options".into(),
                });
            }
            if let Some(AnswerKey::Single(key)) = &q.correct_answer {
                let key_norm = key.trim().to_lowercase();
                if !q
                    .options
                    .iter()
                    .any(|o| o.trim().to_lowercase() == key_norm)
                {
                    return Err(ValidationError::Question {
                        id: q.id.clone(),
                        reason: format!("correct answer '{key}' is not among the options"),
                    });
                }
            }
        }
    }
    Ok(())
}
