//! examforge-providers — Outbound service clients.
//!
//! HTTP clients for the question-generation and subjective-grading assist
//! services, the deterministic fallback template generator, and a mock
//! generator for tests.

pub mod config;
pub mod grader;
pub mod http;
pub mod mock;
pub mod template;

pub use config::{load_config_from, ServiceConfig};
pub use grader::HttpAssistGrader;
pub use http::HttpQuestionGenerator;
pub use mock::MockGenerator;
pub use template::TemplateGenerator;
