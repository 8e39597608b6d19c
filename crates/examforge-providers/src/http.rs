//! HTTP client for the external question-generation service.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use examforge_core::error::GeneratorError;
use examforge_core::model::{GenerationRequest, Question};
use examforge_core::traits::{validate_generated, QuestionGenerator};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const GENERATE_PATH: &str = "/v1/exams/generate";

/// Client for the service that authors exam questions from a parameter set.
pub struct HttpQuestionGenerator {
    api_key: String,
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpQuestionGenerator {
    pub fn new(api_key: &str, base_url: &str, timeout_secs: Option<u64>) -> Self {
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            client,
        }
    }
}

#[derive(Deserialize)]
struct GenerateExamResponse {
    questions: Vec<Question>,
}

#[derive(Deserialize)]
struct ServiceError {
    error: ServiceErrorBody,
}

#[derive(Deserialize)]
struct ServiceErrorBody {
    message: String,
}

#[async_trait]
impl QuestionGenerator for HttpQuestionGenerator {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, request), fields(subject = %request.subject))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, GeneratorError> {
        let url = format!("{}{GENERATE_PATH}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout(self.timeout_secs)
                } else {
                    GeneratorError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(GeneratorError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::AuthenticationFailed(body));
        }
        if status == 404 {
            return Err(GeneratorError::EndpointNotFound(url));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ServiceError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GeneratorError::ApiError { status, message });
        }

        let payload: GenerateExamResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(format!("malformed body: {e}")))?;

        validate_generated(&payload.questions)?;
        Ok(payload.questions)
    }
}
