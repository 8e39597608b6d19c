//! HTTP client for the subjective-grading assist service.
//!
//! The service scores free-text answers as a percentage of the question's
//! marks. Its output is always advisory: a human manual score overrides it
//! unconditionally downstream.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use examforge_core::error::GeneratorError;
use examforge_core::traits::{AssistRequest, AssistResponse, SubjectiveGrader};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const ASSIST_PATH: &str = "/v1/grading/assist";

/// Client for the AI grading-assist service.
pub struct HttpAssistGrader {
    api_key: String,
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpAssistGrader {
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
struct WireAssistResponse {
    score: f64,
    #[serde(default)]
    feedback: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

#[async_trait]
impl SubjectiveGrader for HttpAssistGrader {
    fn name(&self) -> &str {
        "http-assist"
    }

    #[instrument(skip(self, request), fields(question_type = %request.question_type))]
    async fn grade(&self, request: &AssistRequest) -> Result<AssistResponse, GeneratorError> {
        let url = format!("{}{ASSIST_PATH}", self.base_url);
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
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::AuthenticationFailed(body));
        }
        if status == 404 {
            return Err(GeneratorError::EndpointNotFound(url));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::ApiError {
                status,
                message: body,
            });
        }

        let payload: WireAssistResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(format!("malformed body: {e}")))?;

        if !payload.score.is_finite() {
            return Err(GeneratorError::InvalidResponse(format!(
                "non-finite score {}",
                payload.score
            )));
        }

        Ok(AssistResponse {
            score: payload.score.clamp(0.0, 100.0),
            feedback: payload.feedback,
            suggestions: payload.suggestions,
        })
    }
}
