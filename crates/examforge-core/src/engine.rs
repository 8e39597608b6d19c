//! Exam orchestration.
//!
//! Coordinates the slow, fallible call to the external question-generation
//! service (bounded retries with backoff, then a deterministic fallback)
//! and the parallel fan-out of subjective answers to the grading-assist
//! service. Grading itself is pure and synchronous.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::error::ValidationError;
use crate::model::{Answer, ExamResult, GenerationRequest, Question};
use crate::score::{aggregate, GradeTable};
use crate::traits::{
    validate_generated, AssistRequest, QuestionGenerator, SubjectiveGrader,
};

/// Retry behavior for generation calls. An explicit policy object so the
/// schedule can be unit-tested without a real external service.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts against the external service before falling back.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub initial_backoff: Duration,
    /// Ceiling on the backoff delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

/// Where the questions of a generated exam came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamSource {
    /// The external generation service.
    Service,
    /// The deterministic fallback template.
    FallbackTemplate,
}

/// A usable exam, whichever path produced it.
#[derive(Debug, Clone)]
pub struct GeneratedExam {
    pub questions: Vec<Question>,
    pub source: ExamSource,
}

/// The central orchestrator.
pub struct ExamEngine {
    generator: Arc<dyn QuestionGenerator>,
    fallback: Arc<dyn QuestionGenerator>,
    policy: RetryPolicy,
}

impl ExamEngine {
    pub fn new(
        generator: Arc<dyn QuestionGenerator>,
        fallback: Arc<dyn QuestionGenerator>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            generator,
            fallback,
            policy,
        }
    }

    /// Produce an exam for the request.
    ///
    /// The external generator is tried under the retry policy; every
    /// accepted response passes the structural acceptance gate first. When
    /// the service stays unavailable or keeps returning invalid payloads,
    /// the deterministic fallback produces the exam instead: the caller
    /// always receives a usable exam, never a raw service failure.
    pub async fn generate_exam(&self, request: &GenerationRequest) -> anyhow::Result<GeneratedExam> {
        let mut backoff = self.policy.initial_backoff;

        for attempt in 1..=self.policy.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(self.policy.max_backoff);
            }

            match self.generator.generate(request).await {
                Ok(questions) => match validate_generated(&questions) {
                    Ok(()) => {
                        return Ok(GeneratedExam {
                            questions,
                            source: ExamSource::Service,
                        });
                    }
                    Err(e) => {
                        tracing::warn!(
                            subject = %request.subject,
                            attempt,
                            "rejected generated exam: {e}"
                        );
                    }
                },
                Err(e) if e.is_permanent() => {
                    tracing::error!(
                        subject = %request.subject,
                        generator = self.generator.name(),
                        "generation failed permanently: {e}"
                    );
                    break;
                }
                Err(e) => {
                    if let Some(ms) = e.retry_after_ms() {
                        backoff = Duration::from_millis(ms);
                    }
                    tracing::warn!(
                        subject = %request.subject,
                        attempt,
                        "generation attempt failed: {e}"
                    );
                }
            }
        }

        tracing::warn!(
            subject = %request.subject,
            generator = self.generator.name(),
            "falling back to template exam after {} attempts",
            self.policy.max_attempts
        );
        let questions = self
            .fallback
            .generate(request)
            .await
            .map_err(|e| anyhow::anyhow!("fallback generator failed: {e}"))?;
        Ok(GeneratedExam {
            questions,
            source: ExamSource::FallbackTemplate,
        })
    }

    /// Grade one submitted attempt. Pure delegate to the aggregator;
    /// validation runs before any scoring.
    pub fn grade_attempt(
        &self,
        questions: &[Question],
        answers: &[Answer],
        table: &GradeTable,
    ) -> Result<ExamResult, ValidationError> {
        aggregate(questions, answers, table)
    }
}

/// Fan pending subjective answers out to the grading-assist service.
///
/// Answers that already carry a manual or AI score are left alone, as are
/// objective questions. Assist failures are logged and the answer stays
/// pending; it is never defaulted to zero. Returns how many answers were
/// scored.
pub async fn assist_grade(
    grader: Arc<dyn SubjectiveGrader>,
    questions: &[Question],
    answers: &mut [Answer],
    parallelism: usize,
) -> usize {
    let questions_by_id: HashMap<&str, &Question> =
        questions.iter().map(|q| (q.id.as_str(), q)).collect();
    let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));

    let mut futures = FuturesUnordered::new();
    for (idx, answer) in answers.iter().enumerate() {
        if answer.manual_score.is_some() || answer.ai_score.is_some() {
            continue;
        }
        let Some(question) = questions_by_id.get(answer.question_id.as_str()) else {
            continue;
        };
        if question.question_type.is_objective() {
            continue;
        }
        let Some(response) = &answer.response else {
            continue;
        };

        let request = AssistRequest {
            question_text: question.text.clone(),
            question_type: question.question_type,
            student_answer: response.as_text(),
            correct_answer: question.correct_answer.as_ref().map(|k| k.as_text()),
            rubric: question.grading_rubric.clone(),
        };
        let question_id = answer.question_id.clone();
        let grader = Arc::clone(&grader);
        let semaphore = Arc::clone(&semaphore);

        futures.push(async move {
            let _permit = semaphore.acquire_owned().await;
            (idx, question_id, grader.grade(&request).await)
        });
    }

    let mut graded = 0usize;
    while let Some((idx, question_id, result)) = futures.next().await {
        match result {
            Ok(response) => {
                answers[idx].ai_score = Some(response.score.clamp(0.0, 100.0));
                answers[idx].ai_feedback = Some(response.feedback);
                graded += 1;
            }
            Err(e) => {
                tracing::warn!(
                    question_id = %question_id,
                    "assist grading failed, leaving answer pending: {e}"
                );
            }
        }
    }
    graded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::error::GeneratorError;
    use crate::model::{
        AnswerKey, Difficulty, MarkWeighting, MixPolicy, QuestionType,
    };
    use crate::traits::AssistResponse;

    fn request() -> GenerationRequest {
        GenerationRequest {
            subject: "math".into(),
            grade_level: "8".into(),
            difficulty: Difficulty::Medium,
            topics: vec!["fractions".into()],
            question_count: 2,
            mark_weighting: MarkWeighting {
                easy: 3,
                medium: 5,
                hard: 8,
            },
            mix_policy: MixPolicy::default(),
            profile_summary: String::new(),
        }
    }

    fn question(id: &str) -> Question {
        Question {
            id: id.into(),
            text: format!("question {id}"),
            question_type: QuestionType::Choice,
            topic: "fractions".into(),
            difficulty: Difficulty::Medium,
            marks: 5.0,
            options: vec!["A".into(), "B".into()],
            correct_answer: Some(AnswerKey::Single("A".into())),
            grading_rubric: None,
        }
    }

    /// Test generator that fails a scripted number of times, then succeeds
    /// with the given payload.
    struct ScriptedGenerator {
        fail_first: u32,
        payload: Vec<Question>,
        permanent: bool,
        calls: AtomicU32,
    }

    impl ScriptedGenerator {
        fn failing(fail_first: u32, payload: Vec<Question>) -> Self {
            Self {
                fail_first,
                payload,
                permanent: false,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl QuestionGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<Vec<Question>, GeneratorError> {
            let call = self.calls.fetch_add(1, Ordering::Relaxed);
            if self.permanent {
                return Err(GeneratorError::AuthenticationFailed("bad key".into()));
            }
            if call < self.fail_first {
                return Err(GeneratorError::Timeout(30));
            }
            Ok(self.payload.clone())
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let generator = Arc::new(ScriptedGenerator::failing(2, vec![question("q1")]));
        let fallback = Arc::new(ScriptedGenerator::failing(0, vec![question("fb")]));
        let engine = ExamEngine::new(generator.clone(), fallback, fast_policy());

        let exam = engine.generate_exam(&request()).await.unwrap();
        assert_eq!(exam.source, ExamSource::Service);
        assert_eq!(exam.questions[0].id, "q1");
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn falls_back_after_exhausted_retries() {
        let generator = Arc::new(ScriptedGenerator::failing(10, vec![]));
        let fallback = Arc::new(ScriptedGenerator::failing(0, vec![question("fb")]));
        let engine = ExamEngine::new(generator.clone(), fallback, fast_policy());

        let exam = engine.generate_exam(&request()).await.unwrap();
        assert_eq!(exam.source, ExamSource::FallbackTemplate);
        assert_eq!(exam.questions[0].id, "fb");
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn invalid_payload_counts_as_a_failed_attempt() {
        // Empty list fails the acceptance gate every time.
        let generator = Arc::new(ScriptedGenerator::failing(0, vec![]));
        let fallback = Arc::new(ScriptedGenerator::failing(0, vec![question("fb")]));
        let engine = ExamEngine::new(generator.clone(), fallback, fast_policy());

        let exam = engine.generate_exam(&request()).await.unwrap();
        assert_eq!(exam.source, ExamSource::FallbackTemplate);
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn permanent_errors_skip_remaining_retries() {
        let generator = Arc::new(ScriptedGenerator {
            fail_first: 0,
            payload: vec![],
            permanent: true,
            calls: AtomicU32::new(0),
        });
        let fallback = Arc::new(ScriptedGenerator::failing(0, vec![question("fb")]));
        let engine = ExamEngine::new(generator.clone(), fallback, fast_policy());

        let exam = engine.generate_exam(&request()).await.unwrap();
        assert_eq!(exam.source, ExamSource::FallbackTemplate);
        assert_eq!(generator.calls(), 1);
    }

    struct FixedGrader {
        score: f64,
        fail: bool,
    }

    #[async_trait]
    impl SubjectiveGrader for FixedGrader {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn grade(
            &self,
            _request: &AssistRequest,
        ) -> Result<AssistResponse, GeneratorError> {
            if self.fail {
                return Err(GeneratorError::Timeout(30));
            }
            Ok(AssistResponse {
                score: self.score,
                feedback: "reasonable attempt".into(),
                suggestions: vec![],
            })
        }
    }

    fn essay(id: &str) -> Question {
        Question {
            id: id.into(),
            text: format!("essay {id}"),
            question_type: QuestionType::LongText,
            topic: "writing".into(),
            difficulty: Difficulty::Medium,
            marks: 10.0,
            options: vec![],
            correct_answer: None,
            grading_rubric: None,
        }
    }

    fn answer(id: &str) -> Answer {
        Answer {
            question_id: id.into(),
            response: Some(AnswerKey::Single("my essay".into())),
            ai_score: None,
            ai_feedback: None,
            manual_score: None,
            manual_feedback: None,
        }
    }

    #[tokio::test]
    async fn assist_grade_fills_pending_subjective_answers() {
        let questions = vec![essay("q1"), question("q2")];
        let mut answers = vec![answer("q1"), answer("q2")];

        let graded = assist_grade(
            Arc::new(FixedGrader {
                score: 72.0,
                fail: false,
            }),
            &questions,
            &mut answers,
            4,
        )
        .await;

        assert_eq!(graded, 1);
        assert_eq!(answers[0].ai_score, Some(72.0));
        assert!(answers[0].ai_feedback.is_some());
        // Objective answer untouched.
        assert_eq!(answers[1].ai_score, None);
    }

    #[tokio::test]
    async fn assist_grade_respects_existing_scores() {
        let questions = vec![essay("q1")];
        let mut answers = vec![answer("q1")];
        answers[0].manual_score = Some(8.0);

        let graded = assist_grade(
            Arc::new(FixedGrader {
                score: 10.0,
                fail: false,
            }),
            &questions,
            &mut answers,
            4,
        )
        .await;

        assert_eq!(graded, 0);
        assert_eq!(answers[0].ai_score, None);
    }

    #[tokio::test]
    async fn assist_failure_leaves_answer_pending() {
        let questions = vec![essay("q1")];
        let mut answers = vec![answer("q1")];

        let graded = assist_grade(
            Arc::new(FixedGrader {
                score: 0.0,
                fail: true,
            }),
            &questions,
            &mut answers,
            4,
        )
        .await;

        assert_eq!(graded, 0);
        assert_eq!(answers[0].ai_score, None);
    }

    #[tokio::test]
    async fn assist_grade_clamps_out_of_range_scores() {
        let questions = vec![essay("q1")];
        let mut answers = vec![answer("q1")];

        assist_grade(
            Arc::new(FixedGrader {
                score: 250.0,
                fail: false,
            }),
            &questions,
            &mut answers,
            4,
        )
        .await;

        assert_eq!(answers[0].ai_score, Some(100.0));
    }
}
