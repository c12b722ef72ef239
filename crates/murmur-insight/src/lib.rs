//! Murmur Insight crate - clustering and insight generation for survey
//! feedback.
//!
//! Provides the analysis pipeline stages:
//! - Text normalization and rule-based sentence sentiment
//! - Greedy threshold clustering over embedding vectors
//! - Ranking with OTHER/DROP overflow handling
//! - Per-cluster reports with representative texts
//! - Deterministic TF-IDF titles and insights
//! - Optional labeling overlay guarded by a per-request circuit breaker

pub mod aggregate;
pub mod cluster;
pub mod enhance;
pub mod error;
pub mod labeling;
mod lexicon;
pub mod normalize;
pub mod pipeline;
pub mod select;
pub mod sentiment;
pub mod summarizer;
pub mod types;

pub use aggregate::ReportAggregator;
pub use cluster::GreedyClusterer;
pub use enhance::{BudgetValidator, EnhancementOrchestrator};
pub use error::{InsightError, LabelingError};
pub use labeling::{
    create_labeler, ClusterLabeling, ComparisonSummary, LabelingCapability, OpenAiLabeler,
};
pub use normalize::normalize;
pub use pipeline::AnalysisPipeline;
pub use select::{rank_clusters, select_clusters, Selection};
pub use sentiment::SentimentScorer;
pub use summarizer::DeterministicInsightGenerator;
pub use types::{
    AnalysisMode, AnalysisOutput, AnalyzedCluster, ClusterAssignment, ClusterReport,
    ComparisonInsights, EnhancementSummary, InsightPayload, InsightSource, StandaloneInsights,
};
