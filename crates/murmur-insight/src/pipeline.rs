//! End-to-end analysis pipeline.
//!
//! A request flows through:
//! 1. Validation and normalization
//! 2. Sentence sentiment
//! 3. One embedding call over the combined corpus (baseline first)
//! 4. Greedy clustering
//! 5. Ranking and overflow handling
//! 6. Report aggregation
//! 7. Deterministic insights
//! 8. Optional enhancement overlay

use std::sync::Arc;

use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use murmur_core::config::MurmurConfig;
use murmur_core::types::{AnalyzeRequest, Cohort, FeedbackItem};
use murmur_embedding::{create_provider, EmbeddingError, EmbeddingProvider};

use crate::aggregate::ReportAggregator;
use crate::cluster::GreedyClusterer;
use crate::enhance::EnhancementOrchestrator;
use crate::error::InsightError;
use crate::labeling::{create_labeler, LabelingCapability};
use crate::normalize::normalize;
use crate::select::select_clusters;
use crate::sentiment::SentimentScorer;
use crate::summarizer::DeterministicInsightGenerator;
use crate::types::{AnalysisMode, AnalysisOutput, AnalyzedCluster};

/// Request-scoped analysis over a fixed configuration.
///
/// Holds no per-request state, so one pipeline can serve any number of
/// requests.
pub struct AnalysisPipeline {
    config: MurmurConfig,
    embedder: Box<dyn EmbeddingProvider>,
    scorer: SentimentScorer,
    clusterer: GreedyClusterer,
    generator: DeterministicInsightGenerator,
    enhancer: Option<EnhancementOrchestrator>,
}

impl std::fmt::Debug for AnalysisPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPipeline")
            .field("embedder", &self.embedder.name())
            .field("threshold", &self.clusterer.threshold())
            .field("enhancer", &self.enhancer)
            .finish()
    }
}

impl AnalysisPipeline {
    /// Build a pipeline around an explicit embedding provider, without
    /// enhancement.
    pub fn new(
        config: &MurmurConfig,
        embedder: Box<dyn EmbeddingProvider>,
    ) -> Result<Self, InsightError> {
        let config = config.validate()?;
        Ok(Self {
            scorer: SentimentScorer::new(&config.sentiment),
            clusterer: GreedyClusterer::new(config.clustering.similarity_threshold)?,
            generator: DeterministicInsightGenerator::new(config.insights.clone()),
            embedder,
            enhancer: None,
            config,
        })
    }

    /// Build the providers named in `config`.
    pub fn from_config(config: &MurmurConfig) -> Result<Self, InsightError> {
        let config = config.validate()?;
        let embedder = create_provider(&config.embedding)?;
        let pipeline = Self::new(&config, embedder)?;
        match create_labeler(&pipeline.config.enhancement)
            .map_err(|e| InsightError::Config(format!("labeling provider: {}", e)))?
        {
            Some(labeler) => Ok(pipeline.with_labeler(labeler)),
            None => Ok(pipeline),
        }
    }

    /// Enable enhancement with `labeler`.
    pub fn with_labeler(mut self, labeler: Arc<dyn LabelingCapability>) -> Self {
        self.enhancer = Some(EnhancementOrchestrator::new(
            labeler,
            self.config.enhancement.clone(),
            self.config.insights.clone(),
        ));
        self
    }

    pub fn config(&self) -> &MurmurConfig {
        &self.config
    }

    pub fn is_enhanced(&self) -> bool {
        self.enhancer.is_some()
    }

    /// Analyze one request.
    ///
    /// Fails only on invalid input or an embedding failure. Enhancement
    /// problems are absorbed and reported in the output summary.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisOutput, InsightError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("analyze", request_id = %request_id);
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &AnalyzeRequest) -> Result<AnalysisOutput, InsightError> {
        request.validate()?;
        let mode = if request.is_comparison() {
            AnalysisMode::Comparison
        } else {
            AnalysisMode::Standalone
        };

        let items = self.build_items(request);
        info!(item_count = items.len(), mode = ?mode, "analysis started");
        if items.is_empty() {
            info!(cluster_count = 0, "empty corpus");
            return Ok(AnalysisOutput::empty(mode));
        }

        let texts: Vec<String> = items.iter().map(|i| i.normalized_text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        check_vectors(&vectors, items.len())?;
        debug!(
            provider = self.embedder.name(),
            dims = vectors.first().map(|v| v.len()).unwrap_or(0),
            "corpus embedded"
        );

        let clusters = self.clusterer.cluster(&vectors);
        let found = clusters.len();
        let selection = select_clusters(
            clusters,
            self.config.clustering.max_clusters,
            self.config.clustering.overflow_strategy,
        );

        let aggregator = ReportAggregator::new(
            self.scorer.clone(),
            self.config.insights.representative_texts,
        );
        let reports = aggregator.build_reports(&selection.clusters, &items, &vectors);

        let mut analyzed: Vec<AnalyzedCluster> = reports
            .into_iter()
            .map(|report| AnalyzedCluster {
                payload: self.generator.generate(mode, &request.theme, &report),
                report,
            })
            .collect();

        let enhancement = match &self.enhancer {
            Some(enhancer) => enhancer.enhance(&request.theme, &mut analyzed).await,
            None => Default::default(),
        };

        info!(
            item_count = items.len(),
            clusters_found = found,
            cluster_count = analyzed.len(),
            dropped_items = selection.dropped_items,
            threshold = self.clusterer.threshold(),
            "analysis finished"
        );

        Ok(AnalysisOutput {
            mode,
            clusters: analyzed,
            dropped_items: selection.dropped_items,
            enhancement,
        })
    }

    /// Normalize and score every sentence, baseline first.
    fn build_items(&self, request: &AnalyzeRequest) -> Vec<FeedbackItem> {
        let baseline = request.baseline.iter().map(|s| (s, Cohort::Baseline));
        let comparison = request
            .comparison_sentences()
            .iter()
            .map(|s| (s, Cohort::Comparison));
        baseline
            .chain(comparison)
            .enumerate()
            .map(|(position, (sentence, cohort))| {
                let normalized_text = normalize(&sentence.sentence);
                let (sentiment_score, sentiment_label) = self.scorer.score(&normalized_text);
                FeedbackItem {
                    id: sentence.id.clone(),
                    raw_text: sentence.sentence.clone(),
                    normalized_text,
                    sentiment_score,
                    sentiment_label,
                    cohort,
                    position,
                }
            })
            .collect()
    }
}

/// One vector per item, all of one dimensionality.
fn check_vectors(vectors: &[Vec<f32>], expected: usize) -> Result<(), EmbeddingError> {
    if vectors.len() != expected {
        return Err(EmbeddingError::MalformedResponse(format!(
            "expected {} vectors, got {}",
            expected,
            vectors.len()
        )));
    }
    let dims = vectors.first().map(|v| v.len()).unwrap_or(0);
    if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
        return Err(EmbeddingError::DimensionMismatch {
            expected: dims,
            actual: bad.len(),
        });
    }
    Ok(())
}
