use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Labscribe";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Response language for sessions that never asked for another one.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Gemini models tried in order for every generation call.
pub const DEFAULT_GEMINI_MODELS: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
];

/// Local Ollama models tried in order.
pub const DEFAULT_OLLAMA_MODELS: &[&str] = &["medgemma", "medgemma:27b", "medgemma:4b"];

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
/// 16 MB upload ceiling.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
pub const DEFAULT_TESSDATA_DIR: &str = "/usr/share/tesseract-ocr/5/tessdata";

/// `RUST_LOG` fallback when the variable is unset or unparsable.
pub fn default_log_filter() -> &'static str {
    "labscribe=info,tower_http=info"
}

/// Per-user data directory, falling back to the temp dir on hosts without one.
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Where the session map lives between restarts.
pub fn default_session_file() -> PathBuf {
    app_data_dir().join("sessions.json")
}

/// Load `.env` into the process environment if one exists.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Which generation backend serves extraction and chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    Ollama,
}

impl LlmProvider {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ollama" => Self::Ollama,
            _ => Self::Gemini,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }

    fn default_models(&self) -> &'static [&'static str] {
        match self {
            Self::Gemini => DEFAULT_GEMINI_MODELS,
            Self::Ollama => DEFAULT_OLLAMA_MODELS,
        }
    }
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm_provider: LlmProvider,
    pub gemini_api_key: Option<String>,
    pub ollama_url: String,
    /// Model identifiers in fallback order. The first is the primary.
    pub llm_models: Vec<String>,
    pub llm_timeout_secs: u64,
    pub session_file: PathBuf,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    pub default_language: String,
    pub tessdata_dir: PathBuf,
}

impl AppConfig {
    /// Build config from `.env` plus the process environment.
    pub fn from_env() -> Self {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm_provider = get("LLM_PROVIDER")
            .map(|v| LlmProvider::parse(&v))
            .unwrap_or(LlmProvider::Gemini);

        let llm_models = get("LLM_MODELS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|models| !models.is_empty())
            .unwrap_or_else(|| {
                llm_provider
                    .default_models()
                    .iter()
                    .map(|m| m.to_string())
                    .collect()
            });

        Self {
            llm_provider,
            gemini_api_key: get("GEMINI_API_KEY"),
            ollama_url: get("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            llm_models,
            llm_timeout_secs: get("LLM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
            session_file: get("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(default_session_file),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            max_upload_bytes: get("MAX_UPLOAD_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            default_language: get("DEFAULT_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            tessdata_dir: get("TESSDATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TESSDATA_DIR)),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(
            provider = self.llm_provider.as_str(),
            models = ?self.llm_models,
            api_key_set = self.gemini_api_key.is_some(),
            timeout_secs = self.llm_timeout_secs,
            "LLM configuration"
        );
        tracing::info!(
            session_file = %self.session_file.display(),
            bind_addr = %self.bind_addr,
            max_upload_bytes = self.max_upload_bytes,
            "Server configuration"
        );
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::default();
        assert_eq!(config.llm_provider, LlmProvider::Gemini);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.llm_models[0], "gemini-2.0-flash");
        assert_eq!(config.llm_models.len(), DEFAULT_GEMINI_MODELS.len());
        assert_eq!(config.llm_timeout_secs, 120);
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.default_language, "English");
        assert!(config.session_file.ends_with("sessions.json"));
    }

    #[test]
    fn ollama_provider_switches_default_models() {
        let config = config_from(&[("LLM_PROVIDER", "Ollama")]);
        assert_eq!(config.llm_provider, LlmProvider::Ollama);
        assert_eq!(config.llm_models[0], "medgemma");
    }

    #[test]
    fn explicit_model_list_is_trimmed() {
        let config = config_from(&[("LLM_MODELS", " a , b,, c ")]);
        assert_eq!(config.llm_models, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = config_from(&[("GEMINI_API_KEY", "  "), ("LLM_MODELS", ",")]);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.llm_models[0], "gemini-2.0-flash");
    }

    #[test]
    fn unparsable_numbers_fall_back() {
        let config = config_from(&[("LLM_TIMEOUT_SECS", "soon"), ("MAX_UPLOAD_BYTES", "-1")]);
        assert_eq!(config.llm_timeout_secs, DEFAULT_LLM_TIMEOUT_SECS);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with(APP_NAME));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
