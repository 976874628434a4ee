use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::{
    provider::{Provider, ProviderError},
    types::Enrichment,
};

pub const EMPTY_TRANSCRIPT_SUMMARY: &str = "No transcript text found.";
pub const MAX_TAGS: usize = 8;
pub const FALLBACK_SUMMARY_CHARS: usize = 280;

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("Provider error: {0}")]
    ProviderError(#[from] ProviderError),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid API response: {reason}")]
    InvalidApiResponse { reason: String },
}

/// Anything that turns a prompt into raw model text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, EnrichError>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatCompletionsClient {
    /// Build a client for `provider`, failing fast when its API key is missing.
    pub fn from_provider(provider: Provider, model: Option<String>) -> Result<Self, EnrichError> {
        let config = provider.config();
        let api_key = provider.validate_api_key()?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.to_string(),
            api_key,
            model: model.unwrap_or_else(|| config.model.to_string()),
            temperature: 0.2,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn complete(&self, prompt: &str) -> Result<String, EnrichError> {
        let response = self
            .http
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "temperature": self.temperature,
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| EnrichError::InvalidApiResponse {
                reason: format!("missing message content: {response}"),
            })?;

        Ok(content.trim().to_string())
    }
}

pub fn build_prompt(text: &str) -> String {
    format!(
        r#"
Analyze this TikTok transcript.
1) Provide a short 1–2 sentence summary (plain English).
2) Suggest 3–5 descriptive, lowercase tags (single words or short phrases).
Return valid JSON with keys "summary" and "tags".
Transcript:
{text}
"#
    )
}

/// Interpret raw model output as `{summary, tags}`.
///
/// Output that is not a JSON object degrades to its first 280 characters as the
/// summary with no tags; this never fails.
pub fn parse_enrichment(raw: &str) -> Enrichment {
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(raw) else {
        debug!("model output is not a JSON object, keeping raw text");
        return Enrichment {
            summary: raw.chars().take(FALLBACK_SUMMARY_CHARS).collect(),
            tags: Vec::new(),
        };
    };

    let summary = match fields.get("summary") {
        None | Some(Value::Null) => String::new(),
        Some(value) => stringify(value).trim().to_string(),
    };

    let tags = match fields.get("tags") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| stringify(item).trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .take(MAX_TAGS)
            .collect(),
        _ => Vec::new(),
    };

    Enrichment { summary, tags }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "none".to_string(),
        other => other.to_string(),
    }
}

/// Summarizes and tags transcript text through a [`TextGenerator`].
pub struct Enricher {
    generator: Box<dyn TextGenerator>,
}

impl Enricher {
    pub fn new(generator: Box<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Empty text short-circuits to a placeholder without calling the generator.
    /// Generator failures are returned as-is; malformed output is not an error.
    pub async fn enrich(&self, text: &str) -> Result<Enrichment, EnrichError> {
        if text.is_empty() {
            return Ok(Enrichment {
                summary: EMPTY_TRANSCRIPT_SUMMARY.to_string(),
                tags: Vec::new(),
            });
        }

        let raw = self.generator.complete(&build_prompt(text)).await?;
        Ok(parse_enrichment(&raw))
    }
}
