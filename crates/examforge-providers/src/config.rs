//! Service configuration and client factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::grader::HttpAssistGrader;
use crate::http::HttpQuestionGenerator;

/// Connection settings for one outbound service.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure
/// in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ServiceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEndpoint")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Top-level examforge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// The question-generation service. Absent means the deterministic
    /// template generator is used directly.
    #[serde(default)]
    pub generator: Option<ServiceEndpoint>,
    /// The subjective-grading assist service. Absent means subjective
    /// answers stay pending until a human scores them.
    #[serde(default)]
    pub assist: Option<ServiceEndpoint>,
    /// Output directory for reports and generated exams.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Max concurrent assist-grading calls.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./examforge-results")
}

fn default_parallelism() -> usize {
    4
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            generator: None,
            assist: None,
            output_dir: default_output_dir(),
            parallelism: default_parallelism(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_endpoint(endpoint: &ServiceEndpoint) -> ServiceEndpoint {
    ServiceEndpoint {
        base_url: resolve_env_vars(&endpoint.base_url),
        api_key: resolve_env_vars(&endpoint.api_key),
        timeout_secs: endpoint.timeout_secs,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examforge.toml` in the current directory
/// 2. `~/.config/examforge/config.toml`
///
/// Environment variable overrides: `EXAMFORGE_GENERATOR_KEY`,
/// `EXAMFORGE_ASSIST_KEY`.
pub fn load_config() -> Result<ServiceConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ServiceConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examforge.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ServiceConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ServiceConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("EXAMFORGE_GENERATOR_KEY") {
        if let Some(generator) = config.generator.as_mut() {
            generator.api_key = key;
        }
    }
    if let Ok(key) = std::env::var("EXAMFORGE_ASSIST_KEY") {
        if let Some(assist) = config.assist.as_mut() {
            assist.api_key = key;
        }
    }

    // Resolve env vars in endpoints
    config.generator = config.generator.as_ref().map(resolve_endpoint);
    config.assist = config.assist.as_ref().map(resolve_endpoint);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examforge"))
}

/// Build the generation client from configuration, if one is configured.
pub fn create_generator(config: &ServiceConfig) -> Option<HttpQuestionGenerator> {
    config.generator.as_ref().map(|endpoint| {
        HttpQuestionGenerator::new(&endpoint.api_key, &endpoint.base_url, endpoint.timeout_secs)
    })
}

/// Build the assist-grading client from configuration, if one is configured.
pub fn create_assist_grader(config: &ServiceConfig) -> Option<HttpAssistGrader> {
    config.assist.as_ref().map(|endpoint| {
        HttpAssistGrader::new(&endpoint.api_key, &endpoint.base_url, endpoint.timeout_secs)
    })
}
