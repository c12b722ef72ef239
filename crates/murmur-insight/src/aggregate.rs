//! Per-cluster report aggregation.

use std::collections::HashSet;

use tracing::debug;

use murmur_core::types::{Cohort, FeedbackItem};
use murmur_embedding::{cosine_similarity, mean_vector};

use crate::sentiment::SentimentScorer;
use crate::types::{ClusterAssignment, ClusterReport};

/// Builds [`ClusterReport`]s from selected clusters.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    scorer: SentimentScorer,
    representative_texts: usize,
}

impl ReportAggregator {
    pub fn new(scorer: SentimentScorer, representative_texts: usize) -> Self {
        Self {
            scorer,
            representative_texts,
        }
    }

    /// One report per cluster, keeping the given rank order.
    pub fn build_reports(
        &self,
        clusters: &[ClusterAssignment],
        items: &[FeedbackItem],
        vectors: &[Vec<f32>],
    ) -> Vec<ClusterReport> {
        let reports: Vec<ClusterReport> = clusters
            .iter()
            .enumerate()
            .map(|(rank, cluster)| self.build_report(rank, cluster, items, vectors))
            .collect();
        debug!(clusters = reports.len(), "cluster reports built");
        reports
    }

    fn build_report(
        &self,
        rank: usize,
        cluster: &ClusterAssignment,
        items: &[FeedbackItem],
        vectors: &[Vec<f32>],
    ) -> ClusterReport {
        let members: Vec<&FeedbackItem> =
            cluster.member_indices.iter().map(|&i| &items[i]).collect();

        let scores: Vec<f64> = members.iter().map(|m| m.sentiment_score).collect();
        let (mean_score, sentiment_label) = self.scorer.cluster_sentiment(&scores);

        let centroid = mean_vector(cluster.member_indices.iter().map(|&i| vectors[i].as_slice()));

        ClusterReport {
            id: cluster.cluster_id,
            rank,
            size: cluster.size(),
            sentiment_label,
            mean_score,
            strongly_negative: self.scorer.is_strongly_negative(mean_score),
            baseline_item_ids: cohort_ids(&members, Cohort::Baseline),
            comparison_item_ids: cohort_ids(&members, Cohort::Comparison),
            baseline_representative_texts: self.representatives(
                &members,
                Cohort::Baseline,
                &centroid,
                vectors,
            ),
            comparison_representative_texts: self.representatives(
                &members,
                Cohort::Comparison,
                &centroid,
                vectors,
            ),
            is_overflow_merge: cluster.is_overflow_merge,
            member_indices: cluster.member_indices.clone(),
        }
    }

    /// Texts closest to the centroid, returned in input order.
    ///
    /// Similarity ties break toward the earlier position. Empty texts are
    /// never representative.
    fn representatives(
        &self,
        members: &[&FeedbackItem],
        cohort: Cohort,
        centroid: &[f32],
        vectors: &[Vec<f32>],
    ) -> Vec<String> {
        let mut scored: Vec<(f64, &FeedbackItem)> = members
            .iter()
            .filter(|m| m.cohort == cohort && !m.normalized_text.is_empty())
            .map(|m| (cosine_similarity(&vectors[m.position], centroid), *m))
            .collect();
        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.position.cmp(&b.1.position))
        });
        scored.truncate(self.representative_texts);
        scored.sort_by_key(|(_, m)| m.position);
        scored
            .into_iter()
            .map(|(_, m)| m.normalized_text.clone())
            .collect()
    }
}

/// Ids of one cohort's members, deduplicated in first-seen order.
fn cohort_ids(members: &[&FeedbackItem], cohort: Cohort) -> Vec<String> {
    let mut seen = HashSet::new();
    members
        .iter()
        .filter(|m| m.cohort == cohort)
        .filter(|m| seen.insert(m.id.as_str()))
        .map(|m| m.id.clone())
        .collect()
}
