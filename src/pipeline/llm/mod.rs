//! Text-generation backends.
//!
//! Everything above this module sees a single capability: given a model
//! identifier and a prompt, return a completion or fail.

pub mod gemini;
pub mod ollama;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::config::{AppConfig, LlmProvider};

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Cannot reach generation service at {0}")]
    Connection(String),

    #[error("Generation service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Unexpected response shape: {0}")]
    ResponseParsing(String),

    #[error("Generation service is not configured")]
    NotConfigured,
}

/// Generation capability (allows mocking for tests)
pub trait LlmClient: Send + Sync {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError>;
}

/// Build the configured backend, or `None` when it cannot serve requests
/// (Gemini without an API key).
pub fn client_from_config(config: &AppConfig) -> Option<Arc<dyn LlmClient>> {
    let timeout = config.llm_timeout_secs;
    let built: Result<Arc<dyn LlmClient>, LlmError> = match config.llm_provider {
        LlmProvider::Gemini => match &config.gemini_api_key {
            Some(key) => GeminiClient::new(key, timeout).map(|c| Arc::new(c) as Arc<dyn LlmClient>),
            None => Err(LlmError::NotConfigured),
        },
        LlmProvider::Ollama => {
            OllamaClient::new(&config.ollama_url, timeout).map(|c| Arc::new(c) as Arc<dyn LlmClient>)
        }
    };

    match built {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(
                provider = config.llm_provider.as_str(),
                error = %e,
                "Generation service unavailable"
            );
            None
        }
    }
}

/// Map a reqwest failure onto `LlmError`, naming the endpoint on connect errors.
///
/// The request URL is stripped from the message; error text ends up in chat
/// replies and on disk.
pub(crate) fn map_send_error(e: reqwest::Error, endpoint: &str, timeout_secs: u64) -> LlmError {
    let e = e.without_url();
    if e.is_connect() {
        LlmError::Connection(endpoint.to_string())
    } else if e.is_timeout() {
        LlmError::HttpClient(format!("Request timed out after {timeout_secs}s"))
    } else {
        LlmError::HttpClient(e.to_string())
    }
}

pub(crate) fn build_http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, LlmError> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LlmError::HttpClient(format!("Failed to create HTTP client: {e}")))
}

/// Mock LLM client for testing with per-model canned responses and failures.
pub struct MockLlmClient {
    default_response: String,
    responses: HashMap<String, String>,
    failing: Vec<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            responses: HashMap::new(),
            failing: Vec::new(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, model: &str, response: &str) -> Self {
        self.responses.insert(model.to_string(), response.to_string());
        self
    }

    /// Make `model` fail with an API error.
    pub fn failing_for(mut self, model: &str) -> Self {
        self.failing.push(model.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(model, prompt)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((model.to_string(), prompt.to_string()));
        }

        if self.failing.iter().any(|m| m == model) {
            return Err(LlmError::Api {
                status: 503,
                body: format!("{model} unavailable"),
            });
        }
        Ok(self
            .responses
            .get(model)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_without_key_is_unconfigured() {
        let config = AppConfig::default();
        assert!(client_from_config(&config).is_none());
    }

    #[test]
    fn gemini_with_key_is_configured() {
        let config = AppConfig {
            gemini_api_key: Some("test-key".into()),
            ..AppConfig::default()
        };
        assert!(client_from_config(&config).is_some());
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = AppConfig {
            llm_provider: LlmProvider::Ollama,
            ..AppConfig::default()
        };
        assert!(client_from_config(&config).is_some());
    }

    #[test]
    fn mock_routes_by_model() {
        let mock = MockLlmClient::new("default")
            .with_response("b", "from b")
            .failing_for("c");

        assert_eq!(mock.generate("a", "p").unwrap(), "default");
        assert_eq!(mock.generate("b", "p").unwrap(), "from b");
        assert!(matches!(mock.generate("c", "p"), Err(LlmError::Api { status: 503, .. })));
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.calls()[1].0, "b");
    }
}
