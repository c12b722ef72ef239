//! Optional enhancement overlay on top of deterministic insights.
//!
//! Eligible clusters (non-overflow, in rank order, up to
//! `enhancement.max_clusters`) are sent to the labeling capability in windows
//! of `enhancement.concurrency`. Replies are checked against the configured
//! budgets before they replace anything. The first failure trips a circuit
//! breaker that lives only for the current `enhance` call; every later
//! cluster keeps its deterministic payload.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::{self, JoinSet};
use tracing::{debug, info, warn};

use murmur_core::config::{EnhancementConfig, InsightsConfig};
use murmur_core::retry::{execute_with_retry, AttemptError, RetryPolicy};
use murmur_core::types::SentimentLabel;

use crate::error::LabelingError;
use crate::labeling::{ClusterLabeling, ComparisonSummary, LabelingCapability};
use crate::types::{AnalyzedCluster, EnhancementSummary, InsightPayload, InsightSource};

/// Checks labeling replies against title and list bounds.
#[derive(Debug, Clone)]
pub struct BudgetValidator {
    title_min_chars: usize,
    title_max_chars: usize,
    budget: InsightsConfig,
}

/// Trim every item and drop the ones left empty.
fn clean_items(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn check_count(name: &str, items: &[String], min: usize, max: usize) -> Result<(), LabelingError> {
    if items.len() < min || items.len() > max {
        return Err(LabelingError::Budget(format!(
            "{} count {} outside [{}, {}]",
            name,
            items.len(),
            min,
            max
        )));
    }
    Ok(())
}

impl BudgetValidator {
    pub fn new(enhancement: &EnhancementConfig, budget: InsightsConfig) -> Self {
        Self {
            title_min_chars: enhancement.title_min_chars,
            title_max_chars: enhancement.title_max_chars,
            budget,
        }
    }

    /// Trimmed title if its length in chars is within bounds.
    pub fn title(&self, title: &str) -> Result<String, LabelingError> {
        let title = title.trim();
        let chars = title.chars().count();
        if chars < self.title_min_chars || chars > self.title_max_chars {
            return Err(LabelingError::Budget(format!(
                "title length {} outside [{}, {}]",
                chars, self.title_min_chars, self.title_max_chars
            )));
        }
        Ok(title.to_string())
    }

    pub fn standalone(&self, labeling: ClusterLabeling) -> Result<ClusterLabeling, LabelingError> {
        let title = self.title(&labeling.title)?;
        let key_insights = clean_items(labeling.key_insights);
        check_count(
            "insight",
            &key_insights,
            self.budget.min_insights,
            self.budget.max_insights,
        )?;
        Ok(ClusterLabeling {
            title,
            key_insights,
        })
    }

    pub fn comparison(&self, summary: ComparisonSummary) -> Result<ComparisonSummary, LabelingError> {
        let key_similarities = clean_items(summary.key_similarities);
        let key_differences = clean_items(summary.key_differences);
        check_count(
            "similarity",
            &key_similarities,
            self.budget.min_similarities,
            self.budget.max_similarities,
        )?;
        check_count(
            "difference",
            &key_differences,
            self.budget.min_differences,
            self.budget.max_differences,
        )?;
        Ok(ComparisonSummary {
            key_similarities,
            key_differences,
        })
    }
}

/// Per-request breaker. Once open it stays open.
#[derive(Debug, Default)]
struct CircuitBreaker {
    open: bool,
}

impl CircuitBreaker {
    fn trip(&mut self) {
        self.open = true;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Everything one labeling task needs, owned so it can run on a tokio task.
struct LabelJob {
    rank: usize,
    theme: String,
    sentiment: SentimentLabel,
    texts: Vec<String>,
    baseline_texts: Vec<String>,
    comparison_texts: Vec<String>,
    prior: InsightPayload,
}

fn into_labeling_error(err: AttemptError<LabelingError>) -> LabelingError {
    match err {
        AttemptError::TimedOut(d) => {
            LabelingError::Timeout(format!("no reply within {:.1}s", d.as_secs_f64()))
        }
        AttemptError::Failed(e) => e,
    }
}

async fn label_cluster(
    labeler: &dyn LabelingCapability,
    policy: &RetryPolicy,
    theme: &str,
    texts: &[String],
) -> Result<ClusterLabeling, LabelingError> {
    execute_with_retry(policy, move |_| labeler.label_cluster(theme, texts))
        .await
        .into_result()
        .map_err(into_labeling_error)
}

/// Run the labeling calls for one cluster and build its enhanced payload.
async fn run_job(
    labeler: Arc<dyn LabelingCapability>,
    policy: RetryPolicy,
    validator: BudgetValidator,
    job: LabelJob,
) -> Result<InsightPayload, LabelingError> {
    let labeler = labeler.as_ref();
    let theme = job.theme.as_str();
    match job.prior {
        InsightPayload::Standalone(mut insights) => {
            let labeling = label_cluster(labeler, &policy, theme, &job.texts).await?;
            let labeling = validator.standalone(labeling)?;
            insights.title = labeling.title;
            insights.key_insights = labeling.key_insights;
            insights.source = InsightSource::Enhanced;
            Ok(InsightPayload::Standalone(insights))
        }
        InsightPayload::Comparison(mut insights) => {
            let labeling = label_cluster(labeler, &policy, theme, &job.texts).await?;
            let title = validator.title(&labeling.title)?;
            let (baseline, comparison) = (&job.baseline_texts, &job.comparison_texts);
            let title_ref = title.as_str();
            let sentiment = job.sentiment;
            let summary = execute_with_retry(&policy, move |_| {
                labeler.summarize_comparison(theme, title_ref, sentiment, baseline, comparison)
            })
            .await
            .into_result()
            .map_err(into_labeling_error)?;
            let summary = validator.comparison(summary)?;
            insights.title = title;
            insights.key_similarities = summary.key_similarities;
            insights.key_differences = summary.key_differences;
            insights.source = InsightSource::Enhanced;
            Ok(InsightPayload::Comparison(insights))
        }
    }
}

/// Applies the labeling capability to eligible clusters.
pub struct EnhancementOrchestrator {
    labeler: Arc<dyn LabelingCapability>,
    config: EnhancementConfig,
    validator: BudgetValidator,
}

impl std::fmt::Debug for EnhancementOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnhancementOrchestrator")
            .field("labeler", &self.labeler.name())
            .field("max_clusters", &self.config.max_clusters)
            .field("concurrency", &self.config.concurrency)
            .finish()
    }
}

impl EnhancementOrchestrator {
    pub fn new(
        labeler: Arc<dyn LabelingCapability>,
        config: EnhancementConfig,
        budget: InsightsConfig,
    ) -> Self {
        let validator = BudgetValidator::new(&config, budget);
        Self {
            labeler,
            config,
            validator,
        }
    }

    fn job(&self, rank: usize, theme: &str, cluster: &AnalyzedCluster) -> LabelJob {
        let cap = self.config.representative_texts;
        let report = &cluster.report;
        let texts = report
            .baseline_representative_texts
            .iter()
            .chain(report.comparison_representative_texts.iter())
            .take(cap)
            .cloned()
            .collect();
        LabelJob {
            rank,
            theme: theme.to_string(),
            sentiment: report.sentiment_label,
            texts,
            baseline_texts: report.baseline_representative_texts.iter().take(cap).cloned().collect(),
            comparison_texts: report.comparison_representative_texts.iter().take(cap).cloned().collect(),
            prior: cluster.payload.clone(),
        }
    }

    /// Overwrite deterministic payloads where labeling succeeds.
    ///
    /// Never fails. Clusters that are not enhanced keep their payload
    /// unchanged.
    pub async fn enhance(&self, theme: &str, clusters: &mut [AnalyzedCluster]) -> EnhancementSummary {
        let eligible: Vec<usize> = clusters
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.report.is_overflow_merge)
            .map(|(i, _)| i)
            .take(self.config.max_clusters)
            .collect();

        let policy = RetryPolicy::new(self.config.max_retries, self.config.timeout());
        let mut breaker = CircuitBreaker::default();
        let mut summary = EnhancementSummary::default();

        for window in eligible.chunks(self.config.concurrency.max(1)) {
            if breaker.is_open() {
                summary.skipped += window.len();
                continue;
            }

            let mut tasks = JoinSet::new();
            let mut task_ranks: HashMap<task::Id, usize> = HashMap::with_capacity(window.len());
            for &index in window {
                let job = self.job(index, theme, &clusters[index]);
                let rank = job.rank;
                let labeler = Arc::clone(&self.labeler);
                let validator = self.validator.clone();
                let handle = tasks.spawn(async move {
                    (rank, run_job(labeler, policy, validator, job).await)
                });
                task_ranks.insert(handle.id(), rank);
                summary.attempted += 1;
            }

            let mut results: Vec<(usize, Result<InsightPayload, LabelingError>)> =
                Vec::with_capacity(window.len());
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((rank, result)) => results.push((rank, result)),
                    Err(e) => match task_ranks.get(&e.id()) {
                        // An aborted task fails only its own rank.
                        Some(&rank) => results.push((
                            rank,
                            Err(LabelingError::Transport(format!("labeling task aborted: {}", e))),
                        )),
                        None => {
                            warn!(error = %e, "labeling task aborted");
                            breaker.trip();
                        }
                    },
                }
            }
            results.sort_by_key(|(rank, _)| *rank);

            for (rank, result) in results {
                if breaker.is_open() {
                    summary.skipped += 1;
                    continue;
                }
                match result {
                    Ok(payload) => {
                        debug!(rank, title = %payload.title(), "cluster enhanced");
                        clusters[rank].payload = payload;
                        summary.enhanced += 1;
                    }
                    Err(e) => {
                        warn!(
                            rank,
                            labeler = self.labeler.name(),
                            error = %e,
                            "enhancement failed, keeping deterministic insights"
                        );
                        breaker.trip();
                    }
                }
            }
        }

        summary.breaker_tripped = breaker.is_open();
        info!(
            attempted = summary.attempted,
            enhanced = summary.enhanced,
            skipped = summary.skipped,
            breaker_tripped = summary.breaker_tripped,
            "enhancement finished"
        );
        summary
    }
}
