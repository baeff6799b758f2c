use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

// ── LLM config ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `gemini`, `ollama` or `openrouter`.
    pub provider: String,
    pub gemini_model: String,
    /// Overridden by `GOOGLE_API_KEY` when that variable is non-empty.
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub ollama_model: String,
    /// Overridden by `OLLAMA_BASE_URL` when that variable is non-empty.
    pub ollama_base_url: String,
    pub openrouter_model: String,
    /// Overridden by `OPENROUTER_API_KEY` when that variable is non-empty.
    pub openrouter_api_key: String,
    /// Transport timeout for a single generation call.  `0` disables it.
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_api_key: String::new(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            ollama_model: "llama3.1:8b".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            openrouter_model: "openai/gpt-4o-mini".to_string(),
            openrouter_api_key: String::new(),
            request_timeout_secs: 60,
        }
    }
}

// ── Fallback config ───────────────────────────────────────────────────────────

/// Controls the synthetic data used when the model cannot answer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FallbackConfig {
    /// When set, mock records are drawn from a generator seeded with this
    /// value, so the same query always produces the same mock record.
    pub seed: Option<u64>,
}

// ── Server config ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub socket_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: "/tmp/cartscribe.sock".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub fallback: FallbackConfig,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        override_from_env(&mut config.llm.gemini_api_key, "GOOGLE_API_KEY");
        override_from_env(&mut config.llm.openrouter_api_key, "OPENROUTER_API_KEY");
        override_from_env(&mut config.llm.ollama_base_url, "OLLAMA_BASE_URL");
        override_from_env(&mut config.server.socket_path, "CARTSCRIBE_SOCKET");

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    pub fn active_model(&self) -> &str {
        if self.llm.provider.eq_ignore_ascii_case("openrouter") {
            &self.llm.openrouter_model
        } else if self.llm.provider.eq_ignore_ascii_case("ollama") {
            &self.llm.ollama_model
        } else {
            &self.llm.gemini_model
        }
    }
}

fn override_from_env(target: &mut String, var: &str) {
    if let Ok(value) = env::var(var) {
        if !value.trim().is_empty() {
            *target = value;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
