use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MurmurError, Result};

/// Top-level configuration for a Murmur analysis run.
///
/// Loaded from `murmur.toml` by default. Each section corresponds to one
/// pipeline stage or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MurmurConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
    #[serde(default)]
    pub enhancement: EnhancementConfig,
}

impl MurmurConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed. The result is
    /// not validated; call [`MurmurConfig::validate`] before running.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MurmurConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Render the configuration as pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MurmurError::Config(e.to_string()))
    }

    /// Check every bound and return a normalized copy.
    ///
    /// The similarity threshold is clamped into `[0, 1]` here so the
    /// clustering engine can treat an out-of-range value as a programming
    /// error. Everything else that is out of range is rejected.
    pub fn validate(&self) -> Result<Self> {
        let mut config = self.clone();

        let threshold = config.clustering.similarity_threshold;
        if threshold.is_nan() {
            return Err(MurmurError::Config(
                "clustering.similarity_threshold must be a number".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&threshold) {
            let clamped = threshold.clamp(0.0, 1.0);
            warn!(
                threshold,
                clamped, "similarity_threshold out of range, clamping"
            );
            config.clustering.similarity_threshold = clamped;
        }
        if config.clustering.max_clusters == 0 {
            return Err(MurmurError::Config(
                "clustering.max_clusters must be at least 1".to_string(),
            ));
        }

        let s = &config.sentiment;
        if !(s.strong_negative_threshold < s.negative_threshold
            && s.negative_threshold < 0.0
            && 0.0 < s.positive_threshold
            && s.positive_threshold <= 1.0
            && s.strong_negative_threshold >= -1.0)
        {
            return Err(MurmurError::Config(format!(
                "sentiment thresholds must satisfy -1 <= strong_negative < negative < 0 < positive <= 1 \
                 (got {}, {}, {})",
                s.strong_negative_threshold, s.negative_threshold, s.positive_threshold
            )));
        }

        let i = &config.insights;
        check_bounds("insights", i.min_insights, i.max_insights)?;
        check_bounds("similarities", i.min_similarities, i.max_similarities)?;
        check_bounds("differences", i.min_differences, i.max_differences)?;
        if i.representative_texts == 0 {
            return Err(MurmurError::Config(
                "insights.representative_texts must be at least 1".to_string(),
            ));
        }

        config.embedding.validate()?;
        config.enhancement.validate()?;

        Ok(config)
    }
}

fn check_bounds(name: &str, min: usize, max: usize) -> Result<()> {
    if min == 0 {
        return Err(MurmurError::Config(format!(
            "insights.min_{} must be at least 1",
            name
        )));
    }
    if min > max {
        return Err(MurmurError::Config(format!(
            "insights.min_{name} ({min}) must not exceed insights.max_{name} ({max})"
        )));
    }
    Ok(())
}

fn check_timeout(name: &str, secs: f64) -> Result<()> {
    if secs <= 0.0 || Duration::try_from_secs_f64(secs).is_err() {
        return Err(MurmurError::Config(format!(
            "{} must be a positive, representable number of seconds",
            name
        )));
    }
    Ok(())
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Which embedding strategy a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// In-process TF-IDF vectors.
    #[default]
    Tfidf,
    /// OpenAI-compatible `/v1/embeddings` endpoint.
    Http,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    #[serde(default)]
    pub tfidf: TfidfConfig,
    #[serde(default)]
    pub http: HttpEmbeddingConfig,
}

impl EmbeddingConfig {
    fn validate(&self) -> Result<()> {
        let t = &self.tfidf;
        if t.ngram_min == 0 || t.ngram_min > t.ngram_max {
            return Err(MurmurError::Config(format!(
                "embedding.tfidf n-gram range is invalid ({}..={})",
                t.ngram_min, t.ngram_max
            )));
        }
        if t.max_features == Some(0) {
            return Err(MurmurError::Config(
                "embedding.tfidf.max_features must be at least 1".to_string(),
            ));
        }

        if self.provider == EmbeddingProviderKind::Http {
            let h = &self.http;
            if h.base_url.trim().is_empty() || h.api_key.trim().is_empty() || h.model.trim().is_empty()
            {
                return Err(MurmurError::Config(
                    "embedding.provider = \"http\" requires base_url, api_key and model".to_string(),
                ));
            }
            check_timeout("embedding.http.timeout_secs", h.timeout_secs)?;
            if h.batch_size == 0 {
                return Err(MurmurError::Config(
                    "embedding.http.batch_size must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Local TF-IDF vectorizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TfidfConfig {
    /// Keep only the most frequent terms. `None` keeps the full vocabulary.
    pub max_features: Option<usize>,
    /// Smallest n-gram length.
    pub ngram_min: usize,
    /// Largest n-gram length.
    pub ngram_max: usize,
    /// Weight terms by smoothed inverse document frequency.
    pub use_idf: bool,
    /// Use `1 + ln(tf)` instead of raw counts.
    pub sublinear_tf: bool,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            max_features: None,
            ngram_min: 1,
            ngram_max: 1,
            use_idf: true,
            sublinear_tf: false,
        }
    }
}

/// Remote embedding endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpEmbeddingConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: f64,
    /// Texts sent per request.
    pub batch_size: usize,
    /// Extra attempts per batch after the first failure.
    pub max_retries: u32,
}

impl Default for HttpEmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            timeout_secs: 30.0,
            batch_size: 256,
            max_retries: 2,
        }
    }
}

impl HttpEmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}

/// What happens to clusters past `max_clusters`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowStrategy {
    /// Merge the tail into one synthetic cluster.
    #[default]
    #[serde(alias = "OTHER")]
    Other,
    /// Discard the tail.
    #[serde(alias = "DROP")]
    Drop,
}

/// Clustering and selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Minimum cosine similarity to a centroid for an item to join a cluster.
    pub similarity_threshold: f64,
    /// Upper bound on clusters in the output.
    pub max_clusters: usize,
    pub overflow_strategy: OverflowStrategy,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.55,
            max_clusters: 10,
            overflow_strategy: OverflowStrategy::Other,
        }
    }
}

/// Sentiment label cut points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub positive_threshold: f64,
    pub negative_threshold: f64,
    /// Stricter boundary for flagging strongly negative clusters.
    pub strong_negative_threshold: f64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            positive_threshold: 0.05,
            negative_threshold: -0.05,
            strong_negative_threshold: -0.5,
        }
    }
}

/// Budgets for generated insight lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    pub min_insights: usize,
    pub max_insights: usize,
    pub min_similarities: usize,
    pub max_similarities: usize,
    pub min_differences: usize,
    pub max_differences: usize,
    /// Representative texts kept per cohort per cluster.
    pub representative_texts: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            min_insights: 2,
            max_insights: 3,
            min_similarities: 1,
            max_similarities: 3,
            min_differences: 1,
            max_differences: 3,
            representative_texts: 5,
        }
    }
}

/// Which labeling capability, if any, enhances deterministic insights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementProviderKind {
    #[default]
    None,
    OpenaiCompatible,
}

/// LLM enhancement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    pub provider: EnhancementProviderKind,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: f64,
    pub temperature: f64,
    /// Extra attempts per call after the first failure.
    pub max_retries: u32,
    /// Clusters past this rank always keep deterministic insights.
    pub max_clusters: usize,
    /// Representative texts sent per cohort.
    pub representative_texts: usize,
    pub title_min_chars: usize,
    pub title_max_chars: usize,
    /// Clusters labeled in parallel.
    pub concurrency: usize,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            provider: EnhancementProviderKind::None,
            base_url: String::new(),
            api_key: String::new(),
            model: String::new(),
            timeout_secs: 20.0,
            temperature: 0.2,
            max_retries: 1,
            max_clusters: 10,
            representative_texts: 10,
            title_min_chars: 3,
            title_max_chars: 80,
            concurrency: 1,
        }
    }
}

impl EnhancementConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != EnhancementProviderKind::None
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        check_timeout("enhancement.timeout_secs", self.timeout_secs)?;
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(MurmurError::Config(format!(
                "enhancement.temperature must be within [0, 2] (got {})",
                self.temperature
            )));
        }
        if self.title_min_chars == 0 || self.title_min_chars > self.title_max_chars {
            return Err(MurmurError::Config(format!(
                "enhancement title bounds are invalid ({}..={})",
                self.title_min_chars, self.title_max_chars
            )));
        }
        if self.representative_texts == 0 {
            return Err(MurmurError::Config(
                "enhancement.representative_texts must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(MurmurError::Config(
                "enhancement.concurrency must be at least 1".to_string(),
            ));
        }
        if self.is_enabled()
            && (self.base_url.trim().is_empty()
                || self.api_key.trim().is_empty()
                || self.model.trim().is_empty())
        {
            return Err(MurmurError::Config(
                "enhancement.provider = \"openai_compatible\" requires base_url, api_key and model"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
