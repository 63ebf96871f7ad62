//! Dataset pipeline tests - optimize, summarize, bin, and compare fixtures

use seismap_core::aggregates::tier_distribution;
use seismap_core::bins::{bin_points, colorize_bins};
use seismap_core::boundaries::CountryBoundaries;
use seismap_core::compare::compare_countries;
use seismap_core::country::country_profile_path;
use seismap_core::dataset::{self, Metric};
use seismap_core::report;
use seismap_core::TierTable;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join("seismap")
        .join(name)
}

fn optimized_fixture(dir: &tempfile::TempDir) -> PathBuf {
    let output = dir.path().join("seismic-risk-optimized.json");
    dataset::optimize_file(&fixture_path("seismic-risk.geojson"), &output, 1)
        .expect("fixture should optimize");
    output
}

#[test]
fn test_optimize_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out").join("points.json");
    let stats =
        dataset::optimize_file(&fixture_path("seismic-risk.geojson"), &output, 1).unwrap();

    assert_eq!(stats.original_features, 6);
    assert_eq!(stats.skipped_features, 1);
    assert_eq!(stats.kept_points, 5);
    assert!(stats.output_bytes < stats.input_bytes);

    let points = dataset::load_points(&output).unwrap();
    assert_eq!(points.len(), 5);
    assert_eq!(points[0].lat, -33.45);
    assert_eq!(points[0].lng, -70.65);
    assert_eq!(points[3].fatalities, None);
    assert_eq!(points[4].lat, -16.41);
}

#[test]
fn test_optimize_is_byte_for_byte_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.json");
    let second = dir.path().join("b.json");
    dataset::optimize_file(&fixture_path("seismic-risk.geojson"), &first, 1).unwrap();
    dataset::optimize_file(&fixture_path("seismic-risk.geojson"), &second, 1).unwrap();

    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap()
    );
    assert!(!dir.path().join("a.tmp").exists(), "temp file left behind");
}

#[test]
fn test_optimize_missing_input_errors() {
    let dir = tempfile::tempdir().unwrap();
    let result = dataset::optimize_file(
        &dir.path().join("missing.geojson"),
        &dir.path().join("out.json"),
        1,
    );
    assert!(result.is_err());
}

#[test]
fn test_summary_over_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let points = dataset::load_points(&optimized_fixture(&dir)).unwrap();
    let dist = tier_distribution(&points, Metric::Losses, TierTable::builtin());

    let occupied: Vec<usize> = dist.occupied().map(|b| b.rank).collect();
    assert_eq!(occupied, vec![0, 2, 5, 8, 11]);
    assert_eq!(dist.total, 13_607_000.0);

    let text = report::render_distribution_text(&dist);
    assert!(text.starts_with("Tier distribution by losses (5 points)"));
}

#[test]
fn test_bins_over_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let points = dataset::load_points(&optimized_fixture(&dir)).unwrap();
    let bins = colorize_bins(
        bin_points(&points, Metric::Losses, 90.0),
        TierTable::builtin(),
        "80",
    );

    // Everything sits in the (-90..0, -90..0) cell
    assert_eq!(bins.len(), 1);
    assert_eq!(bins[0].bin.points, 5);
    assert_eq!(bins[0].top_color, "#ff4500");
    assert_eq!(bins[0].side_color, "#ff450080");
}

#[test]
fn test_compare_chile_and_peru() {
    let dir = tempfile::tempdir().unwrap();
    let points = dataset::load_points(&optimized_fixture(&dir)).unwrap();
    let boundaries = CountryBoundaries::load(&fixture_path("countries.geojson")).unwrap();

    let cmp = compare_countries(&points, &boundaries, "Chile", Some("Peru")).unwrap();
    assert_eq!(cmp.title, "Chile vs Peru");
    assert_eq!(cmp.countries[0].points, 2);
    assert_eq!(cmp.countries[0].losses, 13_500_000.0);
    assert_eq!(cmp.countries[1].points, 3);
    assert_eq!(cmp.countries[1].losses, 107_000.0);

    let fatalities = &cmp.axes[1];
    assert_eq!(fatalities.subject, "AAL fatalities");
    assert_eq!(fatalities.full_mark, 352.0);
}

#[test]
fn test_clicked_country_resolves_to_profile() {
    let boundaries = CountryBoundaries::load(&fixture_path("countries.geojson")).unwrap();
    let clicked = boundaries.country_at(-12.05, -77.04).expect("Lima is in Peru");
    assert_eq!(
        country_profile_path(&clicked.name),
        "/country-profiles/country_profile_Peru.png"
    );
    assert!(boundaries.country_at(40.0, 0.0).is_none());
}
