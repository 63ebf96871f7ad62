//! Configuration file support for Seismap
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.seismaprc.json` in project root
//! 3. `seismap.config.json` in project root
//! 4. `"seismap"` key in `package.json`
//!
//! All fields are optional. CLI flags take precedence over config file values.
//! A tier table is validated once here; classification never re-checks it.

use crate::bins::DEFAULT_CELL_DEG;
use crate::color::{is_valid_alpha_suffix, Rgb, SIDE_FACE_ALPHA};
use crate::dataset::Metric;
use crate::risk::{RiskTier, TierTable, BELOW_RISK_COLOR};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Seismap configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeismapConfig {
    /// Replacement tier table (default: built-in losses scale)
    #[serde(default)]
    pub tiers: Option<Vec<TierConfig>>,

    /// Color for magnitudes below the first tier (default: #ffffff)
    #[serde(default)]
    pub below_risk_color: Option<String>,

    /// Alpha suffix for side faces (default: "80")
    #[serde(default)]
    pub side_alpha: Option<String>,

    /// Metric used as magnitude (default: losses)
    #[serde(default)]
    pub metric: Option<Metric>,

    /// Keep every Nth feature when optimizing (default: 1)
    #[serde(default)]
    pub sample_rate: Option<usize>,

    /// Grid cell size in degrees for binning (default: 2.0)
    #[serde(default)]
    pub bin_size_deg: Option<f64>,
}

/// One tier in a config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierConfig {
    /// Inclusive lower bound
    pub min: f64,
    /// Exclusive upper bound; null or absent means unbounded
    #[serde(default)]
    pub max: Option<f64>,
    /// `rgb(r, g, b)` or `#rrggbb`
    pub color: String,
    /// Display label (default: derived from bounds)
    #[serde(default)]
    pub label: Option<String>,
}

impl TierConfig {
    fn default_label(&self) -> String {
        match self.max {
            Some(max) => format!("{} - {}", self.min, max),
            None => format!("{}+", self.min),
        }
    }

    fn to_tier(&self, index: usize) -> Result<RiskTier> {
        let color: Rgb = self
            .color
            .parse()
            .with_context(|| format!("tiers[{}].color is not a valid color", index))?;
        Ok(RiskTier {
            lower: self.min,
            upper: self.max.unwrap_or(f64::INFINITY),
            color,
            label: Cow::Owned(self.label.clone().unwrap_or_else(|| self.default_label())),
        })
    }
}

/// Resolved configuration with a validated tier table
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub table: TierTable,
    pub side_alpha: String,
    pub metric: Metric,
    pub sample_rate: usize,
    pub bin_size_deg: f64,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl SeismapConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        self.build_table()?;

        if let Some(ref alpha) = self.side_alpha {
            if !is_valid_alpha_suffix(alpha) {
                anyhow::bail!("side_alpha must be two hex digits (got {:?})", alpha);
            }
        }

        if let Some(rate) = self.sample_rate {
            if rate == 0 {
                anyhow::bail!("sample_rate must be at least 1 (got {})", rate);
            }
        }

        if let Some(size) = self.bin_size_deg {
            if !(size > 0.0 && size <= 90.0) {
                anyhow::bail!("bin_size_deg must be in (0, 90] (got {})", size);
            }
        }

        Ok(())
    }

    fn build_table(&self) -> Result<TierTable> {
        let below_risk = match self.below_risk_color {
            Some(ref c) => c
                .parse::<Rgb>()
                .context("below_risk_color is not a valid color")?,
            None => BELOW_RISK_COLOR,
        };

        match self.tiers {
            None if self.below_risk_color.is_none() => Ok(TierTable::builtin().clone()),
            None => Ok(TierTable::new(
                TierTable::builtin().tiers().to_vec(),
                below_risk,
            )?),
            Some(ref tiers) => {
                let tiers = tiers
                    .iter()
                    .enumerate()
                    .map(|(i, t)| t.to_tier(i))
                    .collect::<Result<Vec<_>>>()?;
                TierTable::new(tiers, below_risk).context("invalid tier table")
            }
        }
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        Ok(ResolvedConfig {
            table: self.build_table()?,
            side_alpha: self
                .side_alpha
                .clone()
                .unwrap_or_else(|| SIDE_FACE_ALPHA.to_string()),
            metric: self.metric.unwrap_or_default(),
            sample_rate: self.sample_rate.unwrap_or(1),
            bin_size_deg: self.bin_size_deg.unwrap_or(DEFAULT_CELL_DEG),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Create a default resolved config (no config file)
    pub fn defaults() -> Result<Self> {
        SeismapConfig::default().resolve()
    }
}

/// Discover and load config from a project root
///
/// Returns `Ok(None)` if no config file is found.
pub fn discover_config(project_root: &Path) -> Result<Option<(SeismapConfig, PathBuf)>> {
    for name in [".seismaprc.json", "seismap.config.json"] {
        let path = project_root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }

    let pkg_path = project_root.join("package.json");
    if pkg_path.exists() {
        if let Some(config) = load_from_package_json(&pkg_path)? {
            return Ok(Some((config, pkg_path)));
        }
    }

    Ok(None)
}

/// Load config from a specific JSON file
pub fn load_config_file(path: &Path) -> Result<SeismapConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: SeismapConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in {}", path.display()))?;

    Ok(config)
}

/// Load config from the "seismap" key in package.json
fn load_from_package_json(path: &Path) -> Result<Option<SeismapConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let pkg: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    match pkg.get("seismap") {
        Some(value) => {
            let config: SeismapConfig = serde_json::from_value(value.clone())
                .with_context(|| format!("invalid \"seismap\" config in {}", path.display()))?;
            config
                .validate()
                .with_context(|| format!("invalid \"seismap\" config in {}", path.display()))?;
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

/// Load and resolve config: explicit path, or discover from project root
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, path) = if let Some(explicit) = config_path {
        (load_config_file(explicit)?, Some(explicit.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (SeismapConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = path;
    Ok(resolved)
}
