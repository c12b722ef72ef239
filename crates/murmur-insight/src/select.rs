//! Cluster ranking and overflow handling.

use tracing::info;

use murmur_core::config::OverflowStrategy;

use crate::types::ClusterAssignment;

/// Clusters kept for reporting, in rank order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub clusters: Vec<ClusterAssignment>,
    /// Items removed by [`OverflowStrategy::Drop`].
    pub dropped_items: usize,
}

/// Rank by size descending, then by earliest member position.
pub fn rank_clusters(mut clusters: Vec<ClusterAssignment>) -> Vec<ClusterAssignment> {
    clusters.sort_by(|a, b| {
        b.size()
            .cmp(&a.size())
            .then_with(|| a.earliest().cmp(&b.earliest()))
    });
    clusters
}

/// Keep at most `max_clusters` clusters, merging or dropping the tail.
pub fn select_clusters(
    clusters: Vec<ClusterAssignment>,
    max_clusters: usize,
    strategy: OverflowStrategy,
) -> Selection {
    let mut ranked = rank_clusters(clusters);
    if ranked.len() <= max_clusters {
        return Selection {
            clusters: ranked,
            dropped_items: 0,
        };
    }

    match strategy {
        OverflowStrategy::Other => {
            let keep = max_clusters.saturating_sub(1);
            let tail = ranked.split_off(keep);
            let merged_from = tail.len();
            let next_id = ranked
                .iter()
                .chain(tail.iter())
                .map(|c| c.cluster_id + 1)
                .max()
                .unwrap_or(0);
            let mut members: Vec<usize> =
                tail.into_iter().flat_map(|c| c.member_indices).collect();
            members.sort_unstable();
            info!(
                merged_clusters = merged_from,
                merged_items = members.len(),
                "overflow clusters merged"
            );
            ranked.push(ClusterAssignment {
                cluster_id: next_id,
                member_indices: members,
                is_overflow_merge: true,
            });
            Selection {
                clusters: ranked,
                dropped_items: 0,
            }
        }
        OverflowStrategy::Drop => {
            let tail = ranked.split_off(max_clusters);
            let dropped_items: usize = tail.iter().map(|c| c.size()).sum();
            info!(
                dropped_clusters = tail.len(),
                dropped_items, "overflow clusters dropped"
            );
            Selection {
                clusters: ranked,
                dropped_items,
            }
        }
    }
}
