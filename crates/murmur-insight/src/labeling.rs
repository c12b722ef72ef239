//! Labeling capability used by the enhancement overlay.
//!
//! The capability is a trait object so the orchestrator can run against a
//! remote chat model or a test stub. [`OpenAiLabeler`] speaks the
//! OpenAI-compatible `/v1/chat/completions` protocol and asks for a JSON
//! object reply.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use murmur_core::config::{EnhancementConfig, EnhancementProviderKind};
use murmur_core::types::SentimentLabel;

use crate::error::LabelingError;

/// Title and insights proposed for one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterLabeling {
    pub title: String,
    pub key_insights: Vec<String>,
}

/// Cohort contrast proposed for one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub key_similarities: Vec<String>,
    pub key_differences: Vec<String>,
}

/// Generates cluster titles and insights from representative texts.
///
/// Implementations perform a single attempt per call. Timeouts and retries
/// are applied by the caller.
#[async_trait]
pub trait LabelingCapability: Send + Sync {
    async fn label_cluster(
        &self,
        theme: &str,
        texts: &[String],
    ) -> Result<ClusterLabeling, LabelingError>;

    async fn summarize_comparison(
        &self,
        theme: &str,
        title: &str,
        sentiment: SentimentLabel,
        baseline_texts: &[String],
        comparison_texts: &[String],
    ) -> Result<ComparisonSummary, LabelingError>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}

/// Build the labeler selected by `config`, or `None` when enhancement is off.
pub fn create_labeler(
    config: &EnhancementConfig,
) -> Result<Option<Arc<dyn LabelingCapability>>, LabelingError> {
    match config.provider {
        EnhancementProviderKind::None => Ok(None),
        EnhancementProviderKind::OpenaiCompatible => {
            Ok(Some(Arc::new(OpenAiLabeler::new(config)?)))
        }
    }
}

const SYSTEM_PROMPT: &str = "You are a product insights analyst.\n\
Follow instructions exactly.\n\
Return ONLY valid JSON. Do not wrap in markdown. Do not include explanations.\n";

fn bullet_list(texts: &[String]) -> String {
    if texts.is_empty() {
        return "- (none)".to_string();
    }
    texts
        .iter()
        .map(|t| format!("- {}", t))
        .collect::<Vec<_>>()
        .join("\n")
}

fn label_prompt(theme: &str, texts: &[String]) -> String {
    format!(
        "Theme: {theme}\n\
         Task: Create a concise cluster title and key insights.\n\
         Return JSON exactly in this shape: {{\"title\": \"...\", \"key_insights\": [\"...\", \"...\"]}}\n\
         Rules:\n\
         - Title: concise and specific\n\
         - Insights: short bullet-like sentences\n\n\
         Sentences:\n{}",
        bullet_list(texts)
    )
}

fn comparison_prompt(
    theme: &str,
    title: &str,
    sentiment: SentimentLabel,
    baseline_texts: &[String],
    comparison_texts: &[String],
) -> String {
    format!(
        "Theme: {theme}\n\
         Cluster title: {title}\n\
         Cluster sentiment: {sentiment}\n\
         Task: For THIS cluster only, compare baseline vs comparison feedback.\n\
         Return JSON exactly in this shape: {{\"key_similarities\": [\"...\"], \"key_differences\": [\"...\"]}}\n\
         Rules:\n\
         - Similarities and differences MUST be consistent with the cluster sentiment.\n\
         - Similarities: what both cohorts express in common\n\
         - Differences: what changes between cohorts (volume, details, phrasing)\n\
         - Keep items concise and actionable\n\n\
         Baseline representative sentences:\n{}\n\n\
         Comparison representative sentences:\n{}",
        bullet_list(baseline_texts),
        bullet_list(comparison_texts)
    )
}

/// Remove an optional Markdown code fence around a JSON reply.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn parse_reply<T: DeserializeOwned>(content: &str) -> Result<T, LabelingError> {
    serde_json::from_str(strip_code_fence(content))
        .map_err(|e| LabelingError::MalformedResponse(e.to_string()))
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions labeler for OpenAI-compatible endpoints.
pub struct OpenAiLabeler {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl std::fmt::Debug for OpenAiLabeler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiLabeler")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl OpenAiLabeler {
    pub fn new(config: &EnhancementConfig) -> Result<Self, LabelingError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LabelingError::Transport(format!("HTTP client: {}", e)))?;
        let endpoint = format!(
            "{}/v1/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        info!(endpoint = %endpoint, model = %config.model, "labeling provider configured");
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Send one prompt and return the first choice's text.
    async fn complete(&self, prompt: &str) -> Result<String, LabelingError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(LabelingError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| LabelingError::MalformedResponse(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LabelingError::MalformedResponse("no choices in reply".to_string()))?;
        debug!(chars = content.len(), "labeling reply received");
        Ok(content)
    }
}

#[async_trait]
impl LabelingCapability for OpenAiLabeler {
    async fn label_cluster(
        &self,
        theme: &str,
        texts: &[String],
    ) -> Result<ClusterLabeling, LabelingError> {
        let content = self.complete(&label_prompt(theme, texts)).await?;
        parse_reply(&content)
    }

    async fn summarize_comparison(
        &self,
        theme: &str,
        title: &str,
        sentiment: SentimentLabel,
        baseline_texts: &[String],
        comparison_texts: &[String],
    ) -> Result<ComparisonSummary, LabelingError> {
        let prompt = comparison_prompt(theme, title, sentiment, baseline_texts, comparison_texts);
        let content = self.complete(&prompt).await?;
        parse_reply(&content)
    }

    fn name(&self) -> &'static str {
        "openai_compatible"
    }
}
