//! Grid binning of risk points for globe rendering
//!
//! Points are grouped into `cell_deg` x `cell_deg` latitude/longitude cells.
//! Each bin carries its summed metric weight, which is what the renderer
//! colors: the top face gets the tier hex, the side faces the same hex with
//! the alpha suffix appended.
//!
//! Global invariants enforced:
//! - Bins are ordered by (row, col) ascending
//! - Every finite point lands in exactly one bin

use crate::color::with_alpha_suffix;
use crate::dataset::{Metric, RiskPoint};
use crate::risk::TierTable;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_CELL_DEG: f64 = 2.0;

/// Summed weight for one grid cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    /// Cell center latitude
    pub lat: f64,
    /// Cell center longitude
    pub lng: f64,
    pub sum_weight: f64,
    pub points: usize,
}

/// A bin with its resolved face colors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColoredBin {
    #[serde(flatten)]
    pub bin: Bin,
    pub tier: String,
    pub top_color: String,
    pub side_color: String,
}

fn cell_index(value: f64, cell_deg: f64) -> i64 {
    (value / cell_deg).floor() as i64
}

/// Grid cell of a point; the north pole folds into the top row and the
/// antimeridian at +180 wraps to -180
fn cell_of(lat: f64, lng: f64, cell_deg: f64) -> (i64, i64) {
    let top_row = (90.0 / cell_deg).ceil() as i64 - 1;
    let row = cell_index(lat, cell_deg).min(top_row);
    let lng = if lng >= 180.0 { lng - 360.0 } else { lng };
    (row, cell_index(lng, cell_deg))
}

/// Sum metric weights per grid cell
pub fn bin_points(points: &[RiskPoint], metric: Metric, cell_deg: f64) -> Vec<Bin> {
    let mut cells: BTreeMap<(i64, i64), (f64, usize)> = BTreeMap::new();
    let mut dropped = 0usize;

    for point in points {
        if !point.lat.is_finite() || !point.lng.is_finite() {
            dropped += 1;
            continue;
        }
        let key = cell_of(point.lat, point.lng, cell_deg);
        let entry = cells.entry(key).or_insert((0.0, 0));
        entry.0 += metric.value(point);
        entry.1 += 1;
    }
    if dropped > 0 {
        tracing::warn!(dropped, "points with non-finite coordinates not binned");
    }

    cells
        .into_iter()
        .map(|((row, col), (sum_weight, count))| Bin {
            lat: (row as f64 + 0.5) * cell_deg,
            lng: (col as f64 + 0.5) * cell_deg,
            sum_weight,
            points: count,
        })
        .collect()
}

/// Resolve top and side colors for each bin
pub fn colorize_bins(bins: Vec<Bin>, table: &TierTable, side_alpha: &str) -> Vec<ColoredBin> {
    bins.into_iter()
        .map(|bin| {
            let class = table.classify(bin.sum_weight);
            let top_color = class.color().to_hex();
            ColoredBin {
                tier: class.label().to_string(),
                side_color: with_alpha_suffix(&top_color, side_alpha),
                top_color,
                bin,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64, losses: f64) -> RiskPoint {
        RiskPoint {
            lat,
            lng,
            losses,
            fatalities: None,
            buildings: None,
        }
    }

    #[test]
    fn test_points_in_same_cell_are_summed() {
        let points = vec![point(0.5, 0.5, 3000.0), point(1.5, 1.9, 4000.0)];
        let bins = bin_points(&points, Metric::Losses, 2.0);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].sum_weight, 7000.0);
        assert_eq!(bins[0].points, 2);
        assert_eq!((bins[0].lat, bins[0].lng), (1.0, 1.0));
    }

    #[test]
    fn test_negative_coordinates_floor() {
        let bins = bin_points(&[point(-0.1, -0.1, 1.0)], Metric::Losses, 2.0);
        assert_eq!((bins[0].lat, bins[0].lng), (-1.0, -1.0));
    }

    #[test]
    fn test_bins_ordered_by_row_then_col() {
        let points = vec![point(10.0, 0.0, 1.0), point(0.0, 10.0, 1.0), point(0.0, 0.0, 1.0)];
        let bins = bin_points(&points, Metric::Losses, 2.0);
        let centers: Vec<(f64, f64)> = bins.iter().map(|b| (b.lat, b.lng)).collect();
        assert_eq!(centers, vec![(1.0, 1.0), (1.0, 11.0), (11.0, 1.0)]);
    }

    #[test]
    fn test_map_edges_stay_inside_grid() {
        let points = vec![point(90.0, 180.0, 1.0), point(-90.0, -180.0, 1.0)];
        let bins = bin_points(&points, Metric::Losses, 2.0);
        let centers: Vec<(f64, f64)> = bins.iter().map(|b| (b.lat, b.lng)).collect();
        assert_eq!(centers, vec![(-89.0, -179.0), (89.0, -179.0)]);

        for cell_deg in [7.0, 90.0] {
            for bin in bin_points(&points, Metric::Losses, cell_deg) {
                assert!((-90.0..=90.0).contains(&bin.lat), "lat {} for {}", bin.lat, cell_deg);
                assert!((-180.0..180.0).contains(&bin.lng), "lng {} for {}", bin.lng, cell_deg);
            }
        }
    }

    #[test]
    fn test_non_finite_points_dropped() {
        let bins = bin_points(&[point(f64::NAN, 0.0, 1.0)], Metric::Losses, 2.0);
        assert!(bins.is_empty());
    }

    #[test]
    fn test_colorize_uses_summed_weight() {
        // 3000 + 4500 = 7500 -> 5k - 10k tier
        let points = vec![point(0.5, 0.5, 3000.0), point(0.6, 0.6, 4500.0)];
        let colored = colorize_bins(
            bin_points(&points, Metric::Losses, 2.0),
            TierTable::builtin(),
            "80",
        );
        assert_eq!(colored[0].tier, "5k - 10k");
        assert_eq!(colored[0].top_color, "#fafcf3");
        assert_eq!(colored[0].side_color, "#fafcf380");
    }
}
