//! Two-country comparison data for the radar chart

use crate::boundaries::{CountryBoundaries, CountryShape};
use crate::dataset::{Metric, RiskPoint};
use rayon::prelude::*;
use serde::Serialize;

/// Title shown when no country is selected
pub const EMPTY_TITLE: &str = "Select countries to compare";

/// Summed metrics over the points inside one country
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CountryTotals {
    pub country: String,
    pub points: usize,
    pub losses: f64,
    pub fatalities: f64,
    pub buildings: f64,
}

impl CountryTotals {
    fn axis_value(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Metric(metric) => match metric {
                Metric::Losses => self.losses,
                Metric::Fatalities => self.fatalities,
                Metric::Buildings => self.buildings,
            },
            Axis::Points => self.points as f64,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Metric(Metric),
    Points,
}

impl Axis {
    fn subject(&self) -> &'static str {
        match self {
            Axis::Metric(Metric::Losses) => "AAL economic",
            Axis::Metric(Metric::Fatalities) => "AAL fatalities",
            Axis::Metric(Metric::Buildings) => "AAL buildings",
            Axis::Points => "Data points",
        }
    }
}

const AXES: [Axis; 4] = [
    Axis::Metric(Metric::Losses),
    Axis::Metric(Metric::Fatalities),
    Axis::Metric(Metric::Buildings),
    Axis::Points,
];

/// One spoke of the radar chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarAxis {
    pub subject: String,
    #[serde(rename = "A", skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
    #[serde(rename = "B", skip_serializing_if = "Option::is_none")]
    pub b: Option<f64>,
    #[serde(rename = "fullMark")]
    pub full_mark: f64,
}

/// Radar chart input for up to two countries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<CountryTotals>,
    pub axes: Vec<RadarAxis>,
}

/// Sum metrics for points inside a country's polygons
pub fn country_totals(points: &[RiskPoint], shape: &CountryShape) -> CountryTotals {
    let inside: Vec<&RiskPoint> = points
        .par_iter()
        .filter(|p| shape.contains(p.lat, p.lng))
        .collect();

    CountryTotals {
        country: shape.name.clone(),
        points: inside.len(),
        losses: inside.iter().map(|p| Metric::Losses.value(p)).sum(),
        fatalities: inside.iter().map(|p| Metric::Fatalities.value(p)).sum(),
        buildings: inside.iter().map(|p| Metric::Buildings.value(p)).sum(),
    }
}

/// Chart title for the current selection
pub fn comparison_title(first: Option<&str>, second: Option<&str>) -> String {
    match (first, second) {
        (Some(a), Some(b)) => format!("{} vs {}", a, b),
        (Some(one), None) | (None, Some(one)) => one.to_string(),
        (None, None) => EMPTY_TITLE.to_string(),
    }
}

/// Build radar axes from zero, one, or two country totals
pub fn build_comparison(first: Option<CountryTotals>, second: Option<CountryTotals>) -> Comparison {
    let title = comparison_title(
        first.as_ref().map(|t| t.country.as_str()),
        second.as_ref().map(|t| t.country.as_str()),
    );

    let axes = AXES
        .iter()
        .map(|axis| {
            let a = first.as_ref().map(|t| t.axis_value(*axis));
            let b = second.as_ref().map(|t| t.axis_value(*axis));
            RadarAxis {
                subject: axis.subject().to_string(),
                a,
                b,
                full_mark: a.unwrap_or(0.0).max(b.unwrap_or(0.0)),
            }
        })
        .collect();

    Comparison {
        title,
        countries: first.into_iter().chain(second).collect(),
        axes,
    }
}

/// Look up both countries and compare them
pub fn compare_countries(
    points: &[RiskPoint],
    boundaries: &CountryBoundaries,
    first: &str,
    second: Option<&str>,
) -> anyhow::Result<Comparison> {
    let lookup = |name: &str| {
        boundaries
            .find(name)
            .map(|shape| country_totals(points, shape))
            .ok_or_else(|| anyhow::anyhow!("country not found in boundaries: {}", name))
    };

    let a = lookup(first)?;
    let b = second.map(lookup).transpose()?;
    Ok(build_comparison(Some(a), b))
}
