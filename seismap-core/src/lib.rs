//! Seismap core library - seismic risk tier classification and color mapping

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Classification is total: every f64 maps to a tier or the below-risk sentinel
// - Tier tables are validated once at construction and never mutated
// - No global mutable state; classification is safe to call from any thread
// - Identical input yields byte-for-byte identical output

pub mod aggregates;
pub mod bins;
pub mod boundaries;
pub mod color;
pub mod compare;
pub mod config;
pub mod country;
pub mod dataset;
pub mod report;
pub mod risk;

pub use color::{hex_to_rgb, rgb_to_hex, Rgb};
pub use config::ResolvedConfig;
pub use dataset::{Metric, RiskPoint};
pub use risk::{
    classify, resolve_color, resolve_color_hex, resolve_side_color_hex, RiskClass, RiskTier,
    TierTable,
};
