//! Tier distribution of a dataset
//!
//! Global invariants enforced:
//! - Aggregates are derived, never stored
//! - Buckets are ordered by rank (below-risk first)
//! - Counts over all buckets equal the number of points

use crate::dataset::{Metric, RiskPoint};
use crate::risk::TierTable;
use rayon::prelude::*;
use serde::Serialize;

/// Points and magnitude falling into one tier
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct TierBucket {
    pub rank: usize,
    pub label: String,
    pub color: String,
    pub count: usize,
    pub total: f64,
}

/// Distribution of a dataset over the tier table
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct TierDistribution {
    pub metric: String,
    pub points: usize,
    pub total: f64,
    pub buckets: Vec<TierBucket>,
}

impl TierDistribution {
    /// Buckets with at least one point
    pub fn occupied(&self) -> impl Iterator<Item = &TierBucket> {
        self.buckets.iter().filter(|b| b.count > 0)
    }
}

/// Classify every point and tally per tier
///
/// Classification runs in parallel; totals are summed in input order so the
/// result is identical across runs.
pub fn tier_distribution(points: &[RiskPoint], metric: Metric, table: &TierTable) -> TierDistribution {
    let ranks = table.tiers().len() + 1;

    let classified: Vec<(usize, f64)> = points
        .par_iter()
        .map(|point| {
            let magnitude = metric.value(point);
            (table.classify(magnitude).rank(), magnitude)
        })
        .collect();

    let mut tally = vec![(0usize, 0.0f64); ranks];
    for (rank, magnitude) in classified {
        tally[rank].0 += 1;
        if magnitude.is_finite() {
            tally[rank].1 += magnitude;
        }
    }

    let mut buckets = Vec::with_capacity(ranks);
    buckets.push(TierBucket {
        rank: 0,
        label: "below risk".to_string(),
        color: table.below_risk_color().to_hex(),
        count: tally[0].0,
        total: tally[0].1,
    });
    for (index, tier) in table.tiers().iter().enumerate() {
        let (count, total) = tally[index + 1];
        buckets.push(TierBucket {
            rank: index + 1,
            label: tier.label.to_string(),
            color: tier.color.to_hex(),
            count,
            total,
        });
    }

    TierDistribution {
        metric: metric.as_str().to_string(),
        points: points.len(),
        total: buckets.iter().map(|b| b.total).sum(),
        buckets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(losses: f64) -> RiskPoint {
        RiskPoint {
            lat: 0.0,
            lng: 0.0,
            losses,
            fatalities: Some(losses / 1000.0),
            buildings: None,
        }
    }

    #[test]
    fn test_counts_sum_to_points() {
        let points: Vec<RiskPoint> = [10.0, 1500.0, 2500.0, 7500.0, 20_000_000.0]
            .into_iter()
            .map(point)
            .collect();
        let dist = tier_distribution(&points, Metric::Losses, TierTable::builtin());

        assert_eq!(dist.points, 5);
        assert_eq!(dist.buckets.len(), 12);
        assert_eq!(dist.buckets.iter().map(|b| b.count).sum::<usize>(), 5);
        assert_eq!(dist.buckets[0].count, 1);
        assert_eq!(dist.buckets[1].count, 2);
        assert_eq!(dist.buckets[1].total, 4000.0);
        assert_eq!(dist.buckets[2].color, "#fafcf3");
        assert_eq!(dist.buckets[11].count, 1);
    }

    #[test]
    fn test_metric_selects_magnitude() {
        let points = vec![point(20_000_000.0)];
        let dist = tier_distribution(&points, Metric::Fatalities, TierTable::builtin());
        // 20_000 fatalities lands in the 10k - 25k tier
        assert_eq!(dist.metric, "fatalities");
        assert_eq!(dist.occupied().next().map(|b| b.rank), Some(3));
    }

    #[test]
    fn test_empty_dataset() {
        let dist = tier_distribution(&[], Metric::Losses, TierTable::builtin());
        assert_eq!(dist.points, 0);
        assert_eq!(dist.occupied().count(), 0);
        assert_eq!(dist.total, 0.0);
    }
}
