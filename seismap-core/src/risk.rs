//! Risk tier classification
//!
//! Global invariants enforced:
//! - Tiers are sorted, contiguous, and non-overlapping
//! - Exactly one tier is unbounded above, and it is last
//! - Lower bounds are inclusive, upper bounds exclusive
//! - Classification is total and monotonic in magnitude

use crate::color::{with_alpha_suffix, Rgb, SIDE_FACE_ALPHA};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::OnceLock;
use thiserror::Error;

/// One contiguous magnitude range and its display color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTier {
    /// Inclusive lower bound
    pub lower: f64,
    /// Exclusive upper bound (`f64::INFINITY` for the top tier)
    #[serde(with = "unbounded_as_null")]
    pub upper: f64,
    pub color: Rgb,
    pub label: Cow<'static, str>,
}

impl RiskTier {
    pub const fn new(lower: f64, upper: f64, color: Rgb, label: &'static str) -> Self {
        RiskTier {
            lower,
            upper,
            color,
            label: Cow::Borrowed(label),
        }
    }

    pub fn contains(&self, magnitude: f64) -> bool {
        self.lower <= magnitude && magnitude < self.upper
    }

    pub fn is_unbounded(&self) -> bool {
        self.upper == f64::INFINITY
    }
}

/// Color used for magnitudes below the first tier
pub const BELOW_RISK_COLOR: Rgb = Rgb::WHITE;

/// Losses color scale from the GEM global seismic risk map style
pub const DEFAULT_TIERS: &[RiskTier] = &[
    RiskTier::new(1_000.0, 5_000.0, Rgb::new(240, 248, 255), "1k - 5k"),
    RiskTier::new(5_000.0, 10_000.0, Rgb::new(250, 252, 243), "5k - 10k"),
    RiskTier::new(10_000.0, 25_000.0, Rgb::new(139, 210, 206), "10k - 25k"),
    RiskTier::new(25_000.0, 50_000.0, Rgb::new(213, 230, 53), "25k - 50k"),
    RiskTier::new(50_000.0, 100_000.0, Rgb::new(244, 237, 30), "50k - 100k"),
    RiskTier::new(100_000.0, 500_000.0, Rgb::new(246, 219, 30), "100k - 500k"),
    RiskTier::new(500_000.0, 1_000_000.0, Rgb::new(249, 201, 29), "500k - 1M"),
    RiskTier::new(1_000_000.0, 2_000_000.0, Rgb::new(249, 168, 14), "1M - 2M"),
    RiskTier::new(2_000_000.0, 5_000_000.0, Rgb::new(249, 134, 0), "2M - 5M"),
    RiskTier::new(5_000_000.0, 10_000_000.0, Rgb::new(255, 97, 3), "5M - 10M"),
    RiskTier::new(10_000_000.0, f64::INFINITY, Rgb::new(255, 69, 0), "10M+"),
];

/// Violations of the tier table invariants
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TierTableError {
    #[error("tier table is empty")]
    Empty,
    #[error("tier {index} has a non-finite lower bound ({lower})")]
    NonFiniteLower { index: usize, lower: f64 },
    #[error("tier {index} has an invalid upper bound ({upper})")]
    InvalidUpper { index: usize, upper: f64 },
    #[error("tier {index} is empty: lower {lower} must be less than upper {upper}")]
    EmptyRange { index: usize, lower: f64, upper: f64 },
    #[error("tier {index} starts at {lower} but the previous tier ends at {previous_upper}")]
    NotContiguous {
        index: usize,
        lower: f64,
        previous_upper: f64,
    },
    #[error("tier {index} is unbounded but is not the last tier")]
    UnboundedNotLast { index: usize },
    #[error("last tier must be unbounded above (ends at {upper})")]
    BoundedTop { upper: f64 },
}

/// Outcome of classifying a magnitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RiskClass<'a> {
    /// Below the first tier's lower bound
    BelowRisk { color: Rgb },
    /// Inside (or falling back to) a tier
    Tier { index: usize, tier: &'a RiskTier },
}

impl<'a> RiskClass<'a> {
    pub fn color(&self) -> Rgb {
        match self {
            RiskClass::BelowRisk { color } => *color,
            RiskClass::Tier { tier, .. } => tier.color,
        }
    }

    /// Ordinal position: 0 for below-risk, `index + 1` for tiers
    pub fn rank(&self) -> usize {
        match self {
            RiskClass::BelowRisk { .. } => 0,
            RiskClass::Tier { index, .. } => index + 1,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RiskClass::BelowRisk { .. } => "below risk",
            RiskClass::Tier { tier, .. } => &*tier.label,
        }
    }

    pub fn tier(&self) -> Option<&'a RiskTier> {
        match self {
            RiskClass::BelowRisk { .. } => None,
            RiskClass::Tier { tier, .. } => Some(*tier),
        }
    }

    pub fn is_below_risk(&self) -> bool {
        matches!(self, RiskClass::BelowRisk { .. })
    }
}

/// A validated, immutable tier table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierTable {
    tiers: Vec<RiskTier>,
    below_risk: Rgb,
}

impl TierTable {
    /// Build a table, checking every ordering and bound invariant
    pub fn new(tiers: Vec<RiskTier>, below_risk: Rgb) -> Result<Self, TierTableError> {
        validate_tiers(&tiers)?;
        Ok(TierTable { tiers, below_risk })
    }

    /// The built-in losses scale, shared process-wide
    pub fn builtin() -> &'static TierTable {
        static BUILTIN: OnceLock<TierTable> = OnceLock::new();
        BUILTIN.get_or_init(|| TierTable {
            tiers: DEFAULT_TIERS.to_vec(),
            below_risk: BELOW_RISK_COLOR,
        })
    }

    pub fn tiers(&self) -> &[RiskTier] {
        &self.tiers
    }

    pub fn below_risk_color(&self) -> Rgb {
        self.below_risk
    }

    /// Lower bound of the first tier
    pub fn floor(&self) -> f64 {
        self.tiers[0].lower
    }

    /// Classify a magnitude
    ///
    /// 1. Below the first tier's lower bound: below-risk
    /// 2. First tier with `lower <= m < upper`
    /// 3. No match (NaN, +inf): last tier
    pub fn classify(&self, magnitude: f64) -> RiskClass<'_> {
        if magnitude < self.floor() {
            return RiskClass::BelowRisk {
                color: self.below_risk,
            };
        }

        if let Some((index, tier)) = self
            .tiers
            .iter()
            .enumerate()
            .find(|(_, tier)| tier.contains(magnitude))
        {
            return RiskClass::Tier { index, tier };
        }

        let index = self.tiers.len() - 1;
        RiskClass::Tier {
            index,
            tier: &self.tiers[index],
        }
    }

    pub fn resolve_color(&self, magnitude: f64) -> Rgb {
        self.classify(magnitude).color()
    }

    pub fn resolve_color_hex(&self, magnitude: f64) -> String {
        self.resolve_color(magnitude).to_hex()
    }

    /// Top color with an alpha suffix appended, for extruded side faces
    pub fn resolve_side_color_hex(&self, magnitude: f64, alpha: &str) -> String {
        with_alpha_suffix(&self.resolve_color_hex(magnitude), alpha)
    }
}

impl Default for TierTable {
    fn default() -> Self {
        TierTable::builtin().clone()
    }
}

/// Check tier ordering and bounds
pub fn validate_tiers(tiers: &[RiskTier]) -> Result<(), TierTableError> {
    if tiers.is_empty() {
        return Err(TierTableError::Empty);
    }

    let last = tiers.len() - 1;
    for (index, tier) in tiers.iter().enumerate() {
        if !tier.lower.is_finite() {
            return Err(TierTableError::NonFiniteLower {
                index,
                lower: tier.lower,
            });
        }
        if tier.upper.is_nan() || tier.upper == f64::NEG_INFINITY {
            return Err(TierTableError::InvalidUpper {
                index,
                upper: tier.upper,
            });
        }
        if tier.lower >= tier.upper {
            return Err(TierTableError::EmptyRange {
                index,
                lower: tier.lower,
                upper: tier.upper,
            });
        }
        if tier.is_unbounded() && index != last {
            return Err(TierTableError::UnboundedNotLast { index });
        }
        if index > 0 {
            let previous_upper = tiers[index - 1].upper;
            if tier.lower != previous_upper {
                return Err(TierTableError::NotContiguous {
                    index,
                    lower: tier.lower,
                    previous_upper,
                });
            }
        }
    }

    if !tiers[last].is_unbounded() {
        return Err(TierTableError::BoundedTop {
            upper: tiers[last].upper,
        });
    }

    Ok(())
}

/// Classify against the built-in table
pub fn classify(magnitude: f64) -> RiskClass<'static> {
    TierTable::builtin().classify(magnitude)
}

/// Tier color for a magnitude (built-in table)
pub fn resolve_color(magnitude: f64) -> Rgb {
    TierTable::builtin().resolve_color(magnitude)
}

/// Tier color as `#rrggbb` (built-in table)
pub fn resolve_color_hex(magnitude: f64) -> String {
    TierTable::builtin().resolve_color_hex(magnitude)
}

/// Side-face color with the default alpha suffix (built-in table)
pub fn resolve_side_color_hex(magnitude: f64) -> String {
    TierTable::builtin().resolve_side_color_hex(magnitude, SIDE_FACE_ALPHA)
}

/// JSON has no infinity; the unbounded top tier serializes its upper bound as null
mod unbounded_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(upper: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if upper.is_infinite() && upper.is_sign_positive() {
            serializer.serialize_none()
        } else {
            serializer.serialize_f64(*upper)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
