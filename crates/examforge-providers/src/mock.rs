//! Mock generator for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use examforge_core::error::GeneratorError;
use examforge_core::model::{GenerationRequest, Question};
use examforge_core::traits::QuestionGenerator;

/// A mock question generator for testing retry and fallback behavior
/// without a real service.
///
/// Fails the first `fail_first` calls with a timeout, then returns the
/// configured questions.
pub struct MockGenerator {
    questions: Vec<Question>,
    fail_first: u32,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl MockGenerator {
    /// A mock that always succeeds with the given questions.
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions,
            fail_first: 0,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A mock that times out `fail_first` times before succeeding.
    pub fn failing_times(fail_first: u32, questions: Vec<Question>) -> Self {
        Self {
            questions,
            fail_first,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A mock that never produces questions.
    pub fn always_failing() -> Self {
        Self::failing_times(u32::MAX, vec![])
    }

    /// Number of calls made to this generator.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The most recent request received.
    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, GeneratorError> {
        let call = self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if call < self.fail_first {
            return Err(GeneratorError::Timeout(30));
        }
        Ok(self.questions.clone())
    }
}
