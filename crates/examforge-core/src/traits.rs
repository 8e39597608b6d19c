//! Trait seams for the external collaborators.
//!
//! These async traits are implemented by the `examforge-providers` crate
//! (question generation, grading assist) and the `examforge-store` crate
//! (profile persistence).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{GeneratorError, StoreError};
use crate::model::{GenerationRequest, PerformanceProfile, Question, QuestionType};

// ---------------------------------------------------------------------------
// Question generation
// ---------------------------------------------------------------------------

/// Trait for services that author exam questions from a parameter set.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Human-readable generator name (e.g. "http", "template").
    fn name(&self) -> &str;

    /// Author questions for the given request.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<Vec<Question>, GeneratorError>;
}

/// Acceptance gate for generated questions, applied before any are used.
///
/// The checks are structural only: a non-empty list, non-empty question
/// text, and a finite non-negative mark value per item. The advisory topic
/// mix is deliberately NOT verified here.
pub fn validate_generated(questions: &[Question]) -> Result<(), GeneratorError> {
    if questions.is_empty() {
        return Err(GeneratorError::InvalidResponse(
            "empty question list".into(),
        ));
    }
    for (idx, q) in questions.iter().enumerate() {
        if q.text.trim().is_empty() {
            return Err(GeneratorError::InvalidResponse(format!(
                "question {idx} has empty text"
            )));
        }
        if !q.marks.is_finite() || q.marks < 0.0 {
            return Err(GeneratorError::InvalidResponse(format!(
                "question {idx} has invalid marks {}",
                q.marks
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Subjective grading assist
// ---------------------------------------------------------------------------

/// Request to the subjective-grading assist service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistRequest {
    pub question_text: String,
    pub question_type: QuestionType,
    pub student_answer: String,
    /// Reference answer, when one exists.
    #[serde(default)]
    pub correct_answer: Option<String>,
    /// Grading rubric, when one exists.
    #[serde(default)]
    pub rubric: Option<String>,
}

/// Response from the assist service. Always advisory: a human
/// `manual_score` overrides it unconditionally downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistResponse {
    /// Score as a percentage (0-100) of the question's marks.
    pub score: f64,
    pub feedback: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Trait for the AI service that scores free-text answers.
#[async_trait]
pub trait SubjectiveGrader: Send + Sync {
    fn name(&self) -> &str;

    async fn grade(&self, request: &AssistRequest) -> Result<AssistResponse, GeneratorError>;
}

// ---------------------------------------------------------------------------
// Profile store
// ---------------------------------------------------------------------------

/// Identity key of a profile row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileKey {
    pub student_id: String,
    pub subject: String,
}

impl ProfileKey {
    pub fn new(student_id: &str, subject: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            subject: subject.to_string(),
        }
    }
}

pub type ProfileVersion = u64;

/// A profile row together with the version counter used for conditional
/// writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionedProfile {
    pub version: ProfileVersion,
    pub profile: PerformanceProfile,
}

/// Persistent profile storage.
///
/// `store` is a compare-and-swap upsert: `expected = None` creates the row
/// and fails with `Conflict` if one already exists; `Some(v)` updates only
/// while the stored version is still `v`. A bare last-write-wins upsert is
/// not expressible through this trait.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch(&self, key: &ProfileKey) -> Result<Option<VersionedProfile>, StoreError>;

    async fn store(
        &self,
        key: &ProfileKey,
        profile: PerformanceProfile,
        expected: Option<ProfileVersion>,
    ) -> Result<ProfileVersion, StoreError>;
}
