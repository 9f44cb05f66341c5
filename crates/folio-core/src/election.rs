//! Electing the authoritative chapter list among detected TOC clusters.

use crate::error::CorpusError;
use crate::toc::TocCluster;

/// Score of a cluster: its length plus two points per strictly sequential
/// adjacent pair.
pub fn cluster_score(cluster: &TocCluster) -> usize {
    cluster.len() + 2 * cluster.sequential_pairs()
}

/// Pick the highest-scoring cluster. Ties keep the earliest cluster.
///
/// Returns [`CorpusError::NoTocCluster`] if `clusters` is empty.
pub fn elect_cluster(clusters: &[TocCluster]) -> Result<&TocCluster, CorpusError> {
    let mut best: Option<(&TocCluster, usize)> = None;
    for cluster in clusters {
        let score = cluster_score(cluster);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((cluster, score)),
        }
    }
    best.map(|(c, _)| c).ok_or(CorpusError::NoTocCluster)
}
