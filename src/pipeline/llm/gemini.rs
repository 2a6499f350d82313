use serde_json::json;

use super::{build_http_client, map_send_error, LlmClient, LlmError};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, LlmError> {
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: GEMINI_ENDPOINT.to_string(),
            client: build_http_client(timeout_secs)?,
            timeout_secs,
        })
    }

    /// Point at a different host (proxies, local test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn build_request_body(prompt: &str) -> serde_json::Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
        })
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a response body.
fn response_text(resp: &serde_json::Value) -> Result<String, LlmError> {
    resp["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            let reason = resp["promptFeedback"]["blockReason"]
                .as_str()
                .map(|r| format!("prompt blocked: {r}"))
                .unwrap_or_else(|| "missing candidates[0].content.parts[0].text".into());
            LlmError::ResponseParsing(reason)
        })
}

impl LlmClient for GeminiClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/{model}:generateContent", self.base_url);
        tracing::debug!(model, prompt_chars = prompt.len(), "Gemini request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&Self::build_request_body(prompt))
            .send()
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.without_url().to_string()))?;
        response_text(&parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_prompt_as_single_user_part() {
        let body = GeminiClient::build_request_body("Explain ALT");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Explain ALT");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn reads_first_candidate_text() {
        let resp = json!({
            "candidates": [{ "content": { "parts": [{ "text": "[]" }] } }]
        });
        assert_eq!(response_text(&resp).unwrap(), "[]");
    }

    #[test]
    fn blocked_prompt_is_a_parse_error() {
        let resp = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = response_text(&resp).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn unreachable_host_is_a_connection_error() {
        let client = GeminiClient::new("k", 2)
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let err = client.generate("gemini-pro", "hi").unwrap_err();
        assert!(matches!(err, LlmError::Connection(_) | LlmError::HttpClient(_)));
    }

    /// A listener that accepts each connection and closes it unanswered.
    fn hangup_server() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                drop(stream);
            }
        });
        format!("http://{addr}")
    }

    #[test]
    fn dropped_connection_error_never_carries_the_key() {
        let client = GeminiClient::new("SECRET-API-KEY", 5)
            .unwrap()
            .with_base_url(&hangup_server());
        let err = client.generate("gemini-pro", "hi").unwrap_err();
        let text = err.to_string();
        assert!(!text.contains("SECRET-API-KEY"), "key leaked: {text}");
        assert!(!text.contains("key="), "query leaked: {text}");
    }
}
