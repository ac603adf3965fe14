//! Reciprocal Rank Fusion (RRF) algorithm.
//!
//! Combines multiple ranked lists into a single fused ranking.
//! Based on: Cormack, Clarke, Buettcher (2009) - "Reciprocal Rank Fusion
//! outperforms Condorcet and individual Rank Learning Methods"

use std::collections::HashMap;

/// Configuration for RRF algorithm.
#[derive(Debug, Clone, Copy)]
pub struct RrfConfig {
    /// The k parameter controls how much weight is given to lower-ranked items.
    /// Higher k values give more weight to items ranked lower in the lists.
    /// Default is 60, which is the value recommended in the original paper.
    pub k: u32,
}

impl Default for RrfConfig {
    fn default() -> Self {
        Self { k: 60 }
    }
}

impl RrfConfig {
    /// Creates a new RRF config with the specified k value.
    #[must_use]
    pub const fn new(k: u32) -> Self {
        Self { k }
    }
}

/// Performs Reciprocal Rank Fusion on multiple ranked lists.
///
/// The RRF score for each item is calculated as:
/// `score(d) = Σ 1 / (k + rank(d))`
///
/// where the sum is over all ranked lists that contain item d.
///
/// # Arguments
///
/// * `ranked_lists` - Slice of ranked lists, where each list contains item IDs
///   ordered by relevance (most relevant first).
/// * `config` - RRF configuration (k parameter).
///
/// # Returns
///
/// A vector of (`item_id`, `rrf_score`) tuples, sorted by score descending.
///
/// # Examples
///
/// ```
/// use ioslab_tutor::search::{reciprocal_rank_fusion, RrfConfig};
///
/// let list1 = vec![1, 2, 3, 4, 5];
/// let list2 = vec![3, 1, 5, 2, 4];
///
/// let config = RrfConfig::new(60);
/// let fused = reciprocal_rank_fusion(&[&list1, &list2], &config);
///
/// // Items appearing in both lists with good ranks will score highest
/// assert!(!fused.is_empty());
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn reciprocal_rank_fusion(ranked_lists: &[&[i64]], config: &RrfConfig) -> Vec<(i64, f64)> {
    let mut scores: HashMap<i64, f64> = HashMap::new();

    for list in ranked_lists {
        for (rank, &item_id) in list.iter().enumerate() {
            // RRF formula: 1 / (k + rank)
            // rank is 0-indexed, so we add 1 to make it 1-indexed
            let rrf_score = 1.0 / f64::from(config.k + (rank as u32) + 1);
            *scores.entry(item_id).or_insert(0.0) += rrf_score;
        }
    }

    // Sort by score descending
    let mut results: Vec<(i64, f64)> = scores.into_iter().collect();
    results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    results
}

/// Performs weighted RRF where each list has a weight.
///
/// Useful when you want to give more importance to one retrieval method.
///
/// # Arguments
///
/// * `ranked_lists` - Slice of (list, weight) tuples.
/// * `config` - RRF configuration.
///
/// # Returns
///
/// A vector of (`item_id`, `weighted_rrf_score`) tuples, sorted by score descending.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn weighted_rrf(ranked_lists: &[(&[i64], f64)], config: &RrfConfig) -> Vec<(i64, f64)> {
    let mut scores: HashMap<i64, f64> = HashMap::new();

    for (list, weight) in ranked_lists {
        for (rank, &item_id) in list.iter().enumerate() {
            let rrf_score = weight / f64::from(config.k + (rank as u32) + 1);
            *scores.entry(item_id).or_insert(0.0) += rrf_score;
        }
    }

    let mut results: Vec<(i64, f64)> = scores.into_iter().collect();
    results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    results
}
