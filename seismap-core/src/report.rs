//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs

use crate::aggregates::TierDistribution;
use crate::color::with_alpha_suffix;
use crate::compare::Comparison;
use crate::risk::TierTable;
use serde::{Deserialize, Serialize};

/// Classification result for one magnitude
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ClassificationReport {
    pub magnitude: f64,
    pub rank: usize,
    pub tier: String,
    pub rgb: String,
    pub hex: String,
    pub side_hex: String,
}

impl ClassificationReport {
    pub fn new(magnitude: f64, table: &TierTable, side_alpha: &str) -> Self {
        let class = table.classify(magnitude);
        let color = class.color();
        let hex = color.to_hex();
        ClassificationReport {
            magnitude,
            rank: class.rank(),
            tier: class.label().to_string(),
            rgb: color.to_css(),
            side_hex: with_alpha_suffix(&hex, side_alpha),
            hex,
        }
    }
}

/// One legend row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct LegendEntry {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    pub color: String,
}

/// Legend rows: below-risk first, then tiers in ascending order
pub fn legend(table: &TierTable) -> Vec<LegendEntry> {
    let mut entries = Vec::with_capacity(table.tiers().len() + 1);
    entries.push(LegendEntry {
        label: format!("< {}", table.floor()),
        lower: None,
        upper: Some(table.floor()),
        color: table.below_risk_color().to_hex(),
    });
    entries.extend(table.tiers().iter().map(|tier| LegendEntry {
        label: tier.label.to_string(),
        lower: Some(tier.lower),
        upper: (!tier.is_unbounded()).then_some(tier.upper),
        color: tier.color.to_hex(),
    }));
    entries
}

/// Render classification rows as text
pub fn render_classifications_text(reports: &[ClassificationReport]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<16} {:<6} {:<14} {:<9} {:<11} {}\n",
        "MAGNITUDE", "RANK", "TIER", "HEX", "SIDE", "RGB"
    ));
    for r in reports {
        output.push_str(&format!(
            "{:<16} {:<6} {:<14} {:<9} {:<11} {}\n",
            format_magnitude(r.magnitude),
            r.rank,
            truncate_or_pad(&r.tier, 14),
            r.hex,
            r.side_hex,
            r.rgb,
        ));
    }
    output
}

/// Render the legend as text
pub fn render_legend_text(entries: &[LegendEntry]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<14} {:<14} {:<14} {}\n",
        "LABEL", "FROM", "TO", "COLOR"
    ));
    for e in entries {
        output.push_str(&format!(
            "{:<14} {:<14} {:<14} {}\n",
            truncate_or_pad(&e.label, 14),
            e.lower.map(format_magnitude).unwrap_or_else(|| "-".to_string()),
            e.upper.map(format_magnitude).unwrap_or_else(|| "-".to_string()),
            e.color,
        ));
    }
    output
}

/// Render a tier distribution as text
pub fn render_distribution_text(dist: &TierDistribution) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Tier distribution by {} ({} points)\n",
        dist.metric, dist.points
    ));
    output.push_str(&format!(
        "{:<6} {:<14} {:<9} {:<10} {:<8} {}\n",
        "RANK", "TIER", "COLOR", "COUNT", "SHARE", "TOTAL"
    ));
    for b in &dist.buckets {
        let share = if dist.points == 0 {
            0.0
        } else {
            b.count as f64 * 100.0 / dist.points as f64
        };
        output.push_str(&format!(
            "{:<6} {:<14} {:<9} {:<10} {:<8} {}\n",
            b.rank,
            truncate_or_pad(&b.label, 14),
            b.color,
            b.count,
            format!("{:.1}%", share),
            format_magnitude(b.total),
        ));
    }
    output
}

/// Render a comparison as text
pub fn render_comparison_text(cmp: &Comparison) -> String {
    let mut output = String::new();
    output.push_str(&cmp.title);
    output.push('\n');
    output.push_str(&format!(
        "{:<16} {:<16} {:<16} {}\n",
        "SUBJECT", "A", "B", "FULL MARK"
    ));
    for axis in &cmp.axes {
        output.push_str(&format!(
            "{:<16} {:<16} {:<16} {}\n",
            axis.subject,
            axis.a.map(format_magnitude).unwrap_or_else(|| "-".to_string()),
            axis.b.map(format_magnitude).unwrap_or_else(|| "-".to_string()),
            format_magnitude(axis.full_mark),
        ));
    }
    output
}

/// Render any report as pretty JSON
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Integers without a fraction, everything else with two decimals
fn format_magnitude(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{}", value)
    } else if value.is_finite() {
        format!("{:.2}", value)
    } else {
        value.to_string()
    }
}

/// Truncate or pad string to fixed width
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}
