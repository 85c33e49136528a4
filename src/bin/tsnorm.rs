//! tsnorm - feature matrix normalization CLI
//!
//! Command-line interface for quality-aware filtering and normalization of
//! time-series feature matrices.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tsnorm::data::FeatureSet;
use tsnorm::error::Result;
use tsnorm::pipeline::{normalize, NormalizeConfig};
use tsnorm::quality::{mask_special_values, profile_good_values};
use tsnorm::transform::TRANSFORM_NAMES;

/// Quality-aware feature matrix normalization
#[derive(Parser)]
#[command(name = "tsnorm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Serialization format for the normalization info file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InfoFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter and normalize a feature matrix
    Normalize {
        /// Path to feature matrix TSV (rows = time series, header = operations)
        #[arg(short = 'd', long)]
        data: PathBuf,

        /// Path to quality code TSV of the same shape
        #[arg(short, long)]
        quality: Option<PathBuf>,

        /// Path to class label TSV (name\tgroup)
        #[arg(short, long)]
        groups: Option<PathBuf>,

        /// Pipeline configuration YAML (overrides the flags below)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Transform name
        #[arg(short, long, default_value = "mixedSigmoid")]
        transform: String,

        /// Minimum good-value proportion per observation
        #[arg(long, default_value_t = 0.70)]
        obs_threshold: f64,

        /// Minimum good-value proportion per feature
        #[arg(long, default_value_t = 1.0)]
        feat_threshold: f64,

        /// Also drop features constant within any declared class
        #[arg(long)]
        class_filter: bool,

        /// Output path for the normalized matrix TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Output path for the normalization info file
        #[arg(long)]
        info: Option<PathBuf>,

        /// Serialization format for the info file
        #[arg(long, value_enum, default_value_t = InfoFormat::Yaml)]
        info_format: InfoFormat,
    },

    /// Profile good-value proportions without filtering
    Profile {
        /// Path to feature matrix TSV
        #[arg(short = 'd', long)]
        data: PathBuf,

        /// Path to quality code TSV of the same shape
        #[arg(short, long)]
        quality: Option<PathBuf>,
    },

    /// List the registered transform names
    Transforms,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize {
            data,
            quality,
            groups,
            config,
            transform,
            obs_threshold,
            feat_threshold,
            class_filter,
            output,
            info,
            info_format,
        } => {
            let set = FeatureSet::from_tsv_parts(&data, quality.as_ref(), groups.as_ref())?;
            println!(
                "Loaded {} time series x {} operations",
                set.n_observations(),
                set.n_features()
            );

            let config = match config {
                Some(path) => NormalizeConfig::from_yaml(&std::fs::read_to_string(path)?)?,
                None => {
                    let mut c = NormalizeConfig::default()
                        .with_transform(&transform)
                        .with_thresholds(obs_threshold, feat_threshold);
                    if class_filter {
                        c = c.with_class_filter();
                    }
                    c
                }
            };

            let result = normalize(set, &config)?;
            println!(
                "Kept {} time series x {} operations",
                result.set.n_observations(),
                result.set.n_features()
            );
            println!("{}", result.info.description);

            result.set.to_tsv(&output)?;
            println!("Normalized matrix written to {}", output.display());

            if let Some(info_path) = info {
                let serialized = match info_format {
                    InfoFormat::Yaml => serde_yaml::to_string(&result.info)?,
                    InfoFormat::Json => serde_json::to_string_pretty(&result.info)?,
                };
                std::fs::write(&info_path, serialized)?;
                println!("Normalization info written to {}", info_path.display());
            }
        }

        Commands::Profile { data, quality } => {
            let set = FeatureSet::from_tsv_parts(&data, quality.as_ref(), None)?;
            let (masked, outcome) = mask_special_values(set.data(), set.quality());
            println!(
                "{} time series x {} operations",
                set.n_observations(),
                set.n_features()
            );
            println!("{}", outcome);
            println!("{}", profile_good_values(&masked));
        }

        Commands::Transforms => {
            for name in TRANSFORM_NAMES {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
