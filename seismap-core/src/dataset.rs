//! Seismic risk datasets
//!
//! The source dataset is a GeoJSON FeatureCollection whose feature properties
//! carry `lat`, `lon`, `losses`, `fatalities` and `buildings`. Optimizing it
//! drops geometry and every other property, producing a flat JSON array of
//! [`RiskPoint`] records that a browser can load quickly.
//!
//! Global invariants enforced:
//! - Feature order is preserved
//! - Sampling keeps indices `0, n, 2n, ...` of the usable features

use anyhow::{Context, Result};
use geojson::{Feature, GeoJson};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// One geolocated risk record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub losses: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatalities: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buildings: Option<f64>,
}

/// The metric used as classification magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Losses,
    Fatalities,
    Buildings,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Losses, Metric::Fatalities, Metric::Buildings];

    /// Magnitude of this metric for a point (missing values count as zero)
    pub fn value(&self, point: &RiskPoint) -> f64 {
        match self {
            Metric::Losses => point.losses,
            Metric::Fatalities => point.fatalities.unwrap_or(0.0),
            Metric::Buildings => point.buildings.unwrap_or(0.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Losses => "losses",
            Metric::Fatalities => "fatalities",
            Metric::Buildings => "buildings",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "losses" => Ok(Metric::Losses),
            "fatalities" => Ok(Metric::Fatalities),
            "buildings" => Ok(Metric::Buildings),
            other => anyhow::bail!(
                "unknown metric '{}' (expected losses, fatalities or buildings)",
                other
            ),
        }
    }
}

/// Counts from an optimize run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimizeStats {
    pub original_features: usize,
    pub skipped_features: usize,
    pub kept_points: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl OptimizeStats {
    pub fn input_mb(&self) -> f64 {
        self.input_bytes as f64 / 1024.0 / 1024.0
    }

    pub fn output_mb(&self) -> f64 {
        self.output_bytes as f64 / 1024.0 / 1024.0
    }
}

fn number_property(feature: &Feature, key: &str) -> Option<f64> {
    feature.property(key).and_then(|v| v.as_f64())
}

/// Coordinates from `lat`/`lon` properties, else from a Point geometry
fn feature_position(feature: &Feature) -> Option<(f64, f64)> {
    if let (Some(lat), Some(lng)) = (
        number_property(feature, "lat"),
        number_property(feature, "lon").or_else(|| number_property(feature, "lng")),
    ) {
        return Some((lat, lng));
    }

    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(geojson::Value::Point(coords)) if coords.len() >= 2 => Some((coords[1], coords[0])),
        _ => None,
    }
}

fn feature_to_point(feature: &Feature) -> Option<RiskPoint> {
    let (lat, lng) = feature_position(feature)?;
    Some(RiskPoint {
        lat,
        lng,
        losses: number_property(feature, "losses").unwrap_or(0.0),
        fatalities: number_property(feature, "fatalities"),
        buildings: number_property(feature, "buildings"),
    })
}

/// Reduce a GeoJSON FeatureCollection to flat risk points
///
/// Features without coordinates are skipped. With `sample_rate = n` only every
/// nth usable feature is kept.
pub fn optimize_geojson(text: &str, sample_rate: usize) -> Result<(Vec<RiskPoint>, OptimizeStats)> {
    if sample_rate == 0 {
        anyhow::bail!("sample rate must be at least 1");
    }

    let geojson: GeoJson = text.parse().context("failed to parse GeoJSON")?;
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => anyhow::bail!("expected a GeoJSON FeatureCollection"),
    };

    let original_features = collection.features.len();
    let usable: Vec<RiskPoint> = collection
        .features
        .iter()
        .filter_map(feature_to_point)
        .collect();
    let skipped_features = original_features - usable.len();
    if skipped_features > 0 {
        tracing::warn!(skipped = skipped_features, "features without coordinates skipped");
    }

    let points: Vec<RiskPoint> = usable
        .into_iter()
        .enumerate()
        .filter(|(index, _)| index % sample_rate == 0)
        .map(|(_, point)| point)
        .collect();

    let stats = OptimizeStats {
        original_features,
        skipped_features,
        kept_points: points.len(),
        ..OptimizeStats::default()
    };
    Ok((points, stats))
}

/// Serialize points as a compact JSON array
pub fn points_to_json(points: &[RiskPoint]) -> Result<String> {
    serde_json::to_string(points).context("failed to serialize risk points")
}

/// Optimize a GeoJSON file and write the flat array to `output`
pub fn optimize_file(input: &Path, output: &Path, sample_rate: usize) -> Result<OptimizeStats> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read dataset: {}", input.display()))?;
    let (points, mut stats) = optimize_geojson(&text, sample_rate)
        .with_context(|| format!("failed to optimize {}", input.display()))?;

    let json = points_to_json(&points)?;
    atomic_write(output, &json)?;

    stats.input_bytes = text.len() as u64;
    stats.output_bytes = json.len() as u64;
    tracing::debug!(
        input = %input.display(),
        output = %output.display(),
        kept = stats.kept_points,
        "dataset optimized"
    );
    Ok(stats)
}

/// Default output path: `<stem>-optimized.json` beside the input
pub fn default_output_path(input: &Path) -> std::path::PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    input.with_file_name(format!("{}-optimized.json", stem))
}

/// Load an optimized dataset
pub fn load_points(path: &Path) -> Result<Vec<RiskPoint>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse dataset: {}", path.display()))
}

/// Write a file via temp file + rename
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    use std::fs;
    use std::io::Write;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)
        .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write to temp file: {}", temp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to sync temp file: {}", temp_path.display()))?;
    drop(file);

    fs::rename(&temp_path, path)
        .with_context(|| format!("failed to rename temp file to: {}", path.display()))?;

    Ok(())
}
