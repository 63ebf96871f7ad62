//! Seismap CLI - seismic risk classification and dataset tooling

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output
// - Results on stdout, diagnostics on stderr

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use seismap_core::aggregates::tier_distribution;
use seismap_core::bins::{bin_points, colorize_bins};
use seismap_core::boundaries::CountryBoundaries;
use seismap_core::compare::compare_countries;
use seismap_core::config::{self, ResolvedConfig};
use seismap_core::country::{country_profile_path, normalize_country_name, region_of, ProfileCatalog};
use seismap_core::report::{self, ClassificationReport};
use seismap_core::{dataset, Metric};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seismap")]
#[command(about = "Seismic risk color classification, dataset optimization, and country profiles")]
#[command(version = env!("SEISMAP_VERSION"))]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify magnitudes into risk tiers and colors
    Classify {
        /// One or more magnitudes (loss amount, fatalities, or buildings)
        #[arg(required = true, allow_negative_numbers = true)]
        magnitudes: Vec<f64>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the tier legend
    Legend {
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Reduce a GeoJSON risk dataset to a flat JSON array
    Optimize {
        /// Source GeoJSON FeatureCollection
        input: PathBuf,

        /// Output path (default: <input stem>-optimized.json)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Keep every Nth feature (overrides config file)
        #[arg(long)]
        sample_rate: Option<usize>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show how a dataset distributes over the risk tiers
    Summary {
        /// Optimized dataset (JSON array)
        dataset: PathBuf,

        /// Metric to classify (overrides config file)
        #[arg(long)]
        metric: Option<MetricArg>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Aggregate a dataset into colored grid bins (JSON)
    Bins {
        /// Optimized dataset (JSON array)
        dataset: PathBuf,

        /// Metric to sum per bin (overrides config file)
        #[arg(long)]
        metric: Option<MetricArg>,

        /// Cell size in degrees (overrides config file)
        #[arg(long)]
        cell_deg: Option<f64>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Resolve a country's profile image path
    Profile {
        /// Country display name
        #[arg(required_unless_present = "at")]
        country: Option<String>,

        /// Resolve the country at LAT,LNG instead (requires --boundaries)
        #[arg(long, value_parser = parse_lat_lng, allow_hyphen_values = true, requires = "boundaries")]
        at: Option<(f64, f64)>,

        /// Country boundary GeoJSON
        #[arg(long)]
        boundaries: Option<PathBuf>,

        /// Directory of profile images to check against
        #[arg(long)]
        profiles_dir: Option<PathBuf>,
    },
    /// Compare one or two countries for the radar chart
    Compare {
        /// Optimized dataset (JSON array)
        dataset: PathBuf,

        /// Country boundary GeoJSON
        #[arg(long)]
        boundaries: PathBuf,

        /// First country
        first: String,

        /// Second country
        second: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Validate a configuration file
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without running anything
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum MetricArg {
    Losses,
    Fatalities,
    Buildings,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Losses => Metric::Losses,
            MetricArg::Fatalities => Metric::Fatalities,
            MetricArg::Buildings => Metric::Buildings,
        }
    }
}

fn parse_lat_lng(s: &str) -> Result<(f64, f64), String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{}'", s))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lng))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(format!("coordinates out of range: {},{}", lat, lng));
    }
    Ok((lat, lng))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load configuration relative to the current directory
fn load_config(config_path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let project_root = std::env::current_dir()?;
    let resolved = config::load_and_resolve(&project_root, config_path)
        .context("failed to load configuration")?;
    if let Some(path) = &resolved.config_path {
        eprintln!("Using config: {}", path.display());
    }
    tracing::debug!(
        metric = %resolved.metric,
        tiers = resolved.table.tiers().len(),
        side_alpha = %resolved.side_alpha,
        "configuration resolved"
    );
    Ok(resolved)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Classify {
            magnitudes,
            format,
            config: config_path,
        } => {
            let resolved = load_config(config_path.as_deref())?;
            let reports: Vec<ClassificationReport> = magnitudes
                .iter()
                .map(|m| ClassificationReport::new(*m, &resolved.table, &resolved.side_alpha))
                .collect();

            match format {
                OutputFormat::Text => print!("{}", report::render_classifications_text(&reports)),
                OutputFormat::Json => println!("{}", report::render_json(&reports)?),
            }
        }
        Commands::Legend {
            format,
            config: config_path,
        } => {
            let resolved = load_config(config_path.as_deref())?;
            let entries = report::legend(&resolved.table);

            match format {
                OutputFormat::Text => print!("{}", report::render_legend_text(&entries)),
                OutputFormat::Json => println!("{}", report::render_json(&entries)?),
            }
        }
        Commands::Optimize {
            input,
            output,
            sample_rate,
            config: config_path,
        } => {
            if !input.exists() {
                anyhow::bail!("Path does not exist: {}", input.display());
            }
            let resolved = load_config(config_path.as_deref())?;
            let sample_rate = sample_rate.unwrap_or(resolved.sample_rate);
            let output = output.unwrap_or_else(|| dataset::default_output_path(&input));

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner.set_message(format!("Optimizing {}", input.display()));

            let result = dataset::optimize_file(&input, &output, sample_rate);
            spinner.finish_and_clear();
            let stats = result?;

            println!("Original features: {}", stats.original_features);
            if stats.skipped_features > 0 {
                println!("Skipped features (no coordinates): {}", stats.skipped_features);
            }
            if sample_rate > 1 {
                println!("Sample rate: every {} feature(s)", sample_rate);
            }
            println!("Optimized features: {}", stats.kept_points);
            println!("Original size: {:.2} MB", stats.input_mb());
            println!("Optimized size: {:.2} MB", stats.output_mb());
            println!("Wrote {}", output.display());
        }
        Commands::Summary {
            dataset: dataset_path,
            metric,
            format,
            config: config_path,
        } => {
            let resolved = load_config(config_path.as_deref())?;
            let metric = metric.map(Metric::from).unwrap_or(resolved.metric);
            let points = dataset::load_points(&dataset_path)?;
            let dist = tier_distribution(&points, metric, &resolved.table);

            match format {
                OutputFormat::Text => print!("{}", report::render_distribution_text(&dist)),
                OutputFormat::Json => println!("{}", report::render_json(&dist)?),
            }
        }
        Commands::Bins {
            dataset: dataset_path,
            metric,
            cell_deg,
            config: config_path,
        } => {
            let resolved = load_config(config_path.as_deref())?;
            let metric = metric.map(Metric::from).unwrap_or(resolved.metric);
            let cell_deg = cell_deg.unwrap_or(resolved.bin_size_deg);
            if !(cell_deg > 0.0 && cell_deg <= 90.0) {
                anyhow::bail!("--cell-deg must be in (0, 90] (got {})", cell_deg);
            }

            let points = dataset::load_points(&dataset_path)?;
            let bins = colorize_bins(
                bin_points(&points, metric, cell_deg),
                &resolved.table,
                &resolved.side_alpha,
            );
            println!("{}", report::render_json(&bins)?);
        }
        Commands::Profile {
            country,
            at,
            boundaries,
            profiles_dir,
        } => {
            let name = match (country, at) {
                (Some(name), _) => name,
                (None, Some((lat, lng))) => {
                    let path = boundaries
                        .as_deref()
                        .context("--at requires --boundaries")?;
                    let boundaries = CountryBoundaries::load(path)?;
                    boundaries
                        .country_at(lat, lng)
                        .map(|c| c.name.clone())
                        .with_context(|| format!("no country contains {},{}", lat, lng))?
                }
                (None, None) => anyhow::bail!("a country name or --at LAT,LNG is required"),
            };

            let normalized = normalize_country_name(&name);
            println!("Country: {}", name);
            println!("Normalized: {}", normalized);
            if let Some(region) = region_of(&normalized) {
                println!("Region: {}", region.as_str());
            }
            println!("Profile: {}", country_profile_path(&name));

            if let Some(dir) = profiles_dir {
                let catalog = ProfileCatalog::scan(&dir)?;
                let missing = catalog.missing_alias_targets();
                if !missing.is_empty() {
                    eprintln!(
                        "Alias targets without a profile image: {}",
                        missing.into_iter().collect::<Vec<_>>().join(", ")
                    );
                }
                if catalog.contains(&name) {
                    println!("Image: found");
                } else {
                    eprintln!(
                        "Image not found in {} ({} profiles available)",
                        dir.display(),
                        catalog.len()
                    );
                    std::process::exit(1);
                }
            }
        }
        Commands::Compare {
            dataset: dataset_path,
            boundaries,
            first,
            second,
            format,
        } => {
            let points = dataset::load_points(&dataset_path)?;
            let boundaries = CountryBoundaries::load(&boundaries)?;
            let cmp = compare_countries(&points, &boundaries, &first, second.as_deref())?;

            match format {
                OutputFormat::Text => print!("{}", report::render_comparison_text(&cmp)),
                OutputFormat::Json => println!("{}", report::render_json(&cmp)?),
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref());

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;

                println!("Configuration:");
                if let Some(ref p) = resolved.config_path {
                    println!("  Source: {}", p.display());
                } else {
                    println!("  Source: defaults (no config file found)");
                }
                println!();
                println!("Rendering:");
                println!("  metric: {}", resolved.metric);
                println!("  side_alpha: {}", resolved.side_alpha);
                println!("  bin_size_deg: {}", resolved.bin_size_deg);
                println!("  sample_rate: {}", resolved.sample_rate);
                println!();
                println!("Tiers:");
                print!(
                    "{}",
                    report::render_legend_text(&report::legend(&resolved.table))
                );
            }
        },
    }

    Ok(())
}
