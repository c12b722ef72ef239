//! Greedy threshold clustering over cosine similarity.

use tracing::debug;

use murmur_embedding::RunningCentroid;

use crate::error::InsightError;
use crate::types::ClusterAssignment;

/// Single-pass clusterer.
///
/// Items are visited in corpus order. Each joins the earliest-created
/// cluster whose running-mean centroid has cosine similarity at or above the
/// threshold, or starts a new cluster when none qualifies.
#[derive(Debug, Clone)]
pub struct GreedyClusterer {
    threshold: f64,
}

impl GreedyClusterer {
    /// Create a clusterer. The threshold must already be within `[0, 1]`.
    pub fn new(threshold: f64) -> Result<Self, InsightError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(InsightError::Config(format!(
                "similarity threshold {} is outside [0, 1]",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Partition `vectors` into clusters. Cluster ids follow creation order.
    pub fn cluster(&self, vectors: &[Vec<f32>]) -> Vec<ClusterAssignment> {
        let mut centroids: Vec<RunningCentroid> = Vec::new();
        let mut members: Vec<Vec<usize>> = Vec::new();

        for (pos, v) in vectors.iter().enumerate() {
            let target = centroids
                .iter()
                .position(|c| c.similarity(v) >= self.threshold);
            match target {
                Some(id) => {
                    centroids[id].add(v);
                    members[id].push(pos);
                }
                None => {
                    centroids.push(RunningCentroid::new(v));
                    members.push(vec![pos]);
                }
            }
        }

        debug!(
            items = vectors.len(),
            clusters = members.len(),
            threshold = self.threshold,
            "greedy clustering finished"
        );

        members
            .into_iter()
            .enumerate()
            .map(|(cluster_id, member_indices)| ClusterAssignment {
                cluster_id,
                member_indices,
                is_overflow_merge: false,
            })
            .collect()
    }
}
