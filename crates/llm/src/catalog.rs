//! Operator diagnostics: which Gemini models exist and which ones answer.

use serde::Deserialize;
use tracing::{debug, warn};

use cartscribe_config::LlmConfig;

use crate::{GeminiClient, GenerationError, Generator, http_client};

/// Candidates tried by `cartscribe probe` when no explicit list is given.
pub const DEFAULT_PROBE_MODELS: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-2.5-flash",
    "gemini-flash-latest",
    "gemini-flash-lite-latest",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

/// Names of the models that support `generateContent`, sorted.
pub async fn list_gemini_models(config: &LlmConfig) -> Result<Vec<String>, GenerationError> {
    if config.gemini_api_key.trim().is_empty() {
        return Err(GenerationError::NotConfigured(
            "GOOGLE_API_KEY is not set".to_string(),
        ));
    }

    let client = http_client(config.request_timeout_secs)?;
    let mut models = Vec::new();
    let mut page_token: Option<String> = None;
    loop {
        let endpoint = models_page_url(&config.gemini_base_url, page_token.as_deref());
        let response = client
            .get(endpoint)
            .header("x-goog-api-key", &config.gemini_api_key)
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

        let page: ModelList = serde_json::from_str(&response.text().await?)?;
        debug!(models = page.models.len(), "fetched model page");
        models.extend(page.models);
        match page.next_page_token.filter(|token| !token.is_empty()) {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }
    Ok(generation_capable(models))
}

fn models_page_url(base_url: &str, page_token: Option<&str>) -> String {
    let mut url = format!("{}/v1beta/models?pageSize=1000", base_url.trim_end_matches('/'));
    if let Some(token) = page_token {
        url.push_str("&pageToken=");
        url.push_str(token);
    }
    url
}

fn generation_capable(models: Vec<ModelEntry>) -> Vec<String> {
    let mut names = models
        .into_iter()
        .filter(|model| {
            model
                .supported_generation_methods
                .iter()
                .any(|method| method == "generateContent")
        })
        .map(|model| model.name)
        .collect::<Vec<_>>();
    names.sort();
    names.dedup();
    names
}

/// Outcome of sending a trivial prompt to one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelProbe {
    /// The model answered; holds the first 20 characters of the reply.
    Ok { model: String, preview: String },
    /// The call failed; holds the first 100 characters of the error.
    Failed { model: String, error: String },
}

pub async fn probe_gemini_models(config: &LlmConfig, candidates: &[String]) -> Vec<ModelProbe> {
    let mut results = Vec::with_capacity(candidates.len());
    for model in candidates {
        let reply = match GeminiClient::new(
            &config.gemini_base_url,
            &config.gemini_api_key,
            model,
            config.request_timeout_secs,
        ) {
            Ok(client) => client.generate("Hi").await,
            Err(err) => Err(err),
        };
        let probe = match reply {
            Ok(reply) => {
                debug!(%model, "probe succeeded");
                ModelProbe::Ok {
                    model: model.clone(),
                    preview: reply.chars().take(20).collect(),
                }
            }
            Err(err) => {
                warn!(%model, %err, "probe failed");
                ModelProbe::Failed {
                    model: model.clone(),
                    error: err.to_string().chars().take(100).collect(),
                }
            }
        };
        results.push(probe);
    }
    results
}
