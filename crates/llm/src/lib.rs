//! Text-generation backends for CartScribe.
//!
//! The rest of the workspace only sees the [`Generator`] trait: one prompt in,
//! raw model text out.  Which backend sits behind it is decided once at start
//! by [`build_generator`] from the `[llm]` config section.

mod catalog;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use cartscribe_config::LlmConfig;

pub use catalog::{DEFAULT_PROBE_MODELS, ModelProbe, list_gemini_models, probe_gemini_models};

/// Why a generation call produced no usable text.
///
/// Callers in the product flows treat every variant the same way (they fall
/// back to mock data); the variants exist for logging and diagnostics.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no model configured: {0}")]
    NotConfigured(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{provider} error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{0} response contained no text")]
    EmptyResponse(&'static str),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The single capability the core needs from a language model.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// False when no backend is behind this generator at all.
    fn is_configured(&self) -> bool {
        true
    }

    /// Short human-readable description, e.g. `gemini:gemini-2.5-flash`.
    fn label(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Ollama,
    OpenRouter,
}

impl Provider {
    /// Case-insensitive parse of the `llm.provider` config value.  Unknown
    /// values resolve to Gemini.
    pub fn from_config(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ollama" => Self::Ollama,
            "openrouter" => Self::OpenRouter,
            _ => Self::Gemini,
        }
    }
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, GenerationError> {
    let mut builder = reqwest::Client::builder();
    if timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_secs));
    }
    Ok(builder.build()?)
}

/// Pick the backend for `config`.  A provider whose API key is missing yields
/// [`Unconfigured`], which puts every request on the mock-data path.
pub fn build_generator(config: &LlmConfig) -> Arc<dyn Generator> {
    let generator: Arc<dyn Generator> = match Provider::from_config(&config.provider) {
        Provider::Gemini if config.gemini_api_key.trim().is_empty() => {
            warn!("Gemini API key not found; using mock mode");
            Arc::new(Unconfigured::new("GOOGLE_API_KEY is not set"))
        }
        Provider::Gemini => or_unconfigured(GeminiClient::from_config(config)),
        Provider::Ollama => or_unconfigured(OllamaClient::from_config(config)),
        Provider::OpenRouter if config.openrouter_api_key.trim().is_empty() => {
            warn!("OpenRouter API key not found; using mock mode");
            Arc::new(Unconfigured::new("OPENROUTER_API_KEY is not set"))
        }
        Provider::OpenRouter => or_unconfigured(OpenRouterClient::from_config(config)),
    };
    info!(generator = %generator.label(), "generator initialized");
    generator
}

fn or_unconfigured<G>(client: Result<G, GenerationError>) -> Arc<dyn Generator>
where
    G: Generator + 'static,
{
    match client {
        Ok(client) => Arc::new(client),
        Err(err) => {
            warn!(%err, "failed to build HTTP client; using mock mode");
            Arc::new(Unconfigured::new(err.to_string()))
        }
    }
}

// ── Unconfigured ─────────────────────────────────────────────────────────────

/// Stand-in used when no backend can be reached.  Every call fails.
#[derive(Debug, Clone)]
pub struct Unconfigured {
    reason: String,
}

impl Unconfigured {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Generator for Unconfigured {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured(self.reason.clone()))
    }

    fn is_configured(&self) -> bool {
        false
    }

    fn label(&self) -> String {
        "mock".to_string()
    }
}

// ── Gemini ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        Self::new(
            &config.gemini_base_url,
            &config.gemini_api_key,
            &config.gemini_model,
            config.request_timeout_secs,
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model.trim_start_matches("models/"),
        )
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let payload = json!({
            "contents": [
                {"parts": [{"text": prompt}]}
            ]
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                provider: "Gemini",
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = serde_json::from_str(&response.text().await?)?;
        gemini_reply_text(&body).ok_or(GenerationError::EmptyResponse("Gemini"))
    }

    fn label(&self) -> String {
        format!("gemini:{}", self.model)
    }
}

/// Concatenate every text part of the first candidate.
fn gemini_reply_text(body: &serde_json::Value) -> Option<String> {
    let parts = body
        .get("candidates")
        .and_then(|candidates| candidates.get(0))
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.as_array())?;

    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|text| text.as_str()))
        .collect::<String>();

    non_blank(text)
}

// ── Ollama ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            client: http_client(config.request_timeout_secs)?,
            base_url: config.ollama_base_url.clone(),
            model: config.ollama_model.clone(),
        })
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let endpoint = format!("{}/api/generate", self.base_url.trim_end_matches('/'));

        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        });

        let response = self.client.post(endpoint).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                provider: "Ollama",
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = serde_json::from_str(&response.text().await?)?;
        body.get("response")
            .and_then(|value| value.as_str())
            .and_then(|text| non_blank(text.to_string()))
            .ok_or(GenerationError::EmptyResponse("Ollama"))
    }

    fn label(&self) -> String {
        format!("ollama:{}", self.model)
    }
}

// ── OpenRouter ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            client: http_client(config.request_timeout_secs)?,
            api_key: config.openrouter_api_key.clone(),
            model: config.openrouter_model.clone(),
        })
    }
}

#[async_trait]
impl Generator for OpenRouterClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        });

        let response = self
            .client
            .post("https://openrouter.ai/api/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "https://cartscribe.local")
            .header("X-Title", "CartScribe")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                provider: "OpenRouter",
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = serde_json::from_str(&response.text().await?)?;
        openrouter_reply_text(&body).ok_or(GenerationError::EmptyResponse("OpenRouter"))
    }

    fn label(&self) -> String {
        format!("openrouter:{}", self.model)
    }
}

fn openrouter_reply_text(body: &serde_json::Value) -> Option<String> {
    body.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .and_then(|text| non_blank(text.to_string()))
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Provider parsing ───────────────────────────────────────────────────

    #[test]
    fn provider_from_config_is_case_insensitive() {
        assert_eq!(Provider::from_config("Ollama"), Provider::Ollama);
        assert_eq!(Provider::from_config(" openrouter "), Provider::OpenRouter);
        assert_eq!(Provider::from_config("gemini"), Provider::Gemini);
        assert_eq!(Provider::from_config("something-else"), Provider::Gemini);
    }

    // ── build_generator ────────────────────────────────────────────────────

    #[test]
    fn missing_gemini_key_selects_mock_mode() {
        let config = LlmConfig::default();
        let generator = build_generator(&config);
        assert_eq!(generator.label(), "mock");
    }

    #[test]
    fn gemini_key_selects_gemini_client() {
        let config = LlmConfig {
            gemini_api_key: "key".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(build_generator(&config).label(), "gemini:gemini-2.5-flash");
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(build_generator(&config).label(), "ollama:llama3.1:8b");
    }

    #[test]
    fn openrouter_without_key_selects_mock_mode() {
        let config = LlmConfig {
            provider: "openrouter".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(build_generator(&config).label(), "mock");
    }

    #[tokio::test]
    async fn client_build_failure_falls_back_to_mock_mode() {
        let failed: Result<OllamaClient, GenerationError> =
            Err(GenerationError::NotConfigured("TLS backend unavailable".to_string()));
        let generator = or_unconfigured(failed);
        assert_eq!(generator.label(), "mock");
        let err = generator.generate("hello").await.unwrap_err();
        assert!(
            matches!(err, GenerationError::NotConfigured(ref reason) if reason.contains("TLS backend"))
        );
    }

    #[test]
    fn http_client_honors_timeout_settings() {
        assert!(http_client(0).is_ok());
        assert!(http_client(30).is_ok());
    }

    #[tokio::test]
    async fn unconfigured_always_fails() {
        let generator = Unconfigured::new("no key");
        assert!(!generator.is_configured());
        let err = generator.generate("hello").await.unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured(ref reason) if reason == "no key"));
    }

    // ── Gemini endpoint + reply parsing ────────────────────────────────────

    #[test]
    fn gemini_endpoint_strips_models_prefix_and_trailing_slash() {
        let client =
            GeminiClient::new("https://example.test/", "k", "models/gemini-pro", 0).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn gemini_reply_joins_parts() {
        let body = json!({
            "candidates": [
                {"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}
            ]
        });
        assert_eq!(gemini_reply_text(&body).as_deref(), Some("Hello world"));
    }

    #[test]
    fn gemini_reply_missing_candidates_is_none() {
        assert!(gemini_reply_text(&json!({"promptFeedback": {}})).is_none());
        let blank = json!({"candidates": [{"content": {"parts": [{"text": "  "}]}}]});
        assert!(gemini_reply_text(&blank).is_none());
    }

    #[test]
    fn openrouter_reply_reads_first_choice() {
        let body = json!({"choices": [{"message": {"content": "[1, 2]"}}]});
        assert_eq!(openrouter_reply_text(&body).as_deref(), Some("[1, 2]"));
        assert!(openrouter_reply_text(&json!({"choices": []})).is_none());
    }

    #[test]
    fn api_error_display_names_provider() {
        let err = GenerationError::Api {
            provider: "Gemini",
            status: 429,
            body: "quota".to_string(),
        };
        assert_eq!(err.to_string(), "Gemini error (429): quota");
    }

    #[test]
    fn decode_error_converts_from_serde() {
        let err: GenerationError = serde_json::from_str::<serde_json::Value>("<html>")
            .unwrap_err()
            .into();
        assert!(matches!(err, GenerationError::Decode(_)));
        assert!(err.to_string().starts_with("malformed response body"));
    }
}
