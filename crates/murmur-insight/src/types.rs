use serde::{Deserialize, Serialize};

use murmur_core::types::{
    AnalyzeResponse, ComparisonCluster, ComparisonResponse, SentimentLabel, StandaloneCluster,
    StandaloneResponse,
};

/// Output shape selected by the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    Standalone,
    Comparison,
}

/// A cluster produced by the clustering engine.
///
/// `member_indices` are corpus positions in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAssignment {
    pub cluster_id: usize,
    pub member_indices: Vec<usize>,
    /// Set on the synthetic cluster built from overflow.
    pub is_overflow_merge: bool,
}

impl ClusterAssignment {
    pub fn size(&self) -> usize {
        self.member_indices.len()
    }

    /// Position of the earliest member.
    pub fn earliest(&self) -> usize {
        self.member_indices.first().copied().unwrap_or(usize::MAX)
    }
}

/// Per-cluster statistics and cohort partitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub id: usize,
    /// Zero-based position in the output.
    pub rank: usize,
    pub size: usize,
    pub sentiment_label: SentimentLabel,
    pub mean_score: f64,
    /// Mean score is at or below the strong-negative threshold.
    pub strongly_negative: bool,
    pub baseline_item_ids: Vec<String>,
    pub comparison_item_ids: Vec<String>,
    pub baseline_representative_texts: Vec<String>,
    pub comparison_representative_texts: Vec<String>,
    pub is_overflow_merge: bool,
    pub member_indices: Vec<usize>,
}

/// Which generator produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    Deterministic,
    Enhanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandaloneInsights {
    pub title: String,
    pub sentiment: SentimentLabel,
    pub key_insights: Vec<String>,
    pub source: InsightSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonInsights {
    pub title: String,
    pub sentiment: SentimentLabel,
    pub baseline_sentences: Vec<String>,
    pub comparison_sentences: Vec<String>,
    pub key_similarities: Vec<String>,
    pub key_differences: Vec<String>,
    pub source: InsightSource,
}

/// Insights for one cluster, shaped by the analysis mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InsightPayload {
    Standalone(StandaloneInsights),
    Comparison(ComparisonInsights),
}

impl InsightPayload {
    pub fn title(&self) -> &str {
        match self {
            InsightPayload::Standalone(p) => &p.title,
            InsightPayload::Comparison(p) => &p.title,
        }
    }

    pub fn source(&self) -> InsightSource {
        match self {
            InsightPayload::Standalone(p) => p.source,
            InsightPayload::Comparison(p) => p.source,
        }
    }
}

/// A selected cluster joined with its insights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedCluster {
    pub report: ClusterReport,
    pub payload: InsightPayload,
}

/// What the enhancement overlay did during one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancementSummary {
    /// Clusters that received a labeling call.
    pub attempted: usize,
    /// Clusters whose payload was replaced.
    pub enhanced: usize,
    /// Eligible clusters skipped because the breaker was open.
    pub skipped: usize,
    pub breaker_tripped: bool,
}

/// Everything the pipeline produces for one request, in rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub mode: AnalysisMode,
    pub clusters: Vec<AnalyzedCluster>,
    /// Items discarded by the drop overflow strategy.
    pub dropped_items: usize,
    pub enhancement: EnhancementSummary,
}

impl AnalysisOutput {
    pub fn empty(mode: AnalysisMode) -> Self {
        Self {
            mode,
            clusters: Vec::new(),
            dropped_items: 0,
            enhancement: EnhancementSummary::default(),
        }
    }

    /// Render the response document for this output's mode.
    pub fn to_response(&self) -> AnalyzeResponse {
        match self.mode {
            AnalysisMode::Standalone => AnalyzeResponse::Standalone(StandaloneResponse {
                clusters: self
                    .clusters
                    .iter()
                    .filter_map(|c| match &c.payload {
                        InsightPayload::Standalone(p) => Some(StandaloneCluster {
                            title: p.title.clone(),
                            sentiment: p.sentiment,
                            key_insights: p.key_insights.clone(),
                        }),
                        InsightPayload::Comparison(_) => None,
                    })
                    .collect(),
            }),
            AnalysisMode::Comparison => AnalyzeResponse::Comparison(ComparisonResponse {
                clusters: self
                    .clusters
                    .iter()
                    .filter_map(|c| match &c.payload {
                        InsightPayload::Comparison(p) => Some(ComparisonCluster {
                            title: p.title.clone(),
                            sentiment: p.sentiment,
                            baseline_sentences: p.baseline_sentences.clone(),
                            comparison_sentences: p.comparison_sentences.clone(),
                            key_similarities: p.key_similarities.clone(),
                            key_differences: p.key_differences.clone(),
                        }),
                        InsightPayload::Standalone(_) => None,
                    })
                    .collect(),
            }),
        }
    }
}
