use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use topogen::config::Config;
use topogen::config_loader::{self, CliOverrides};
use topogen::orchestrator;

fn parse_duration(value: &str) -> Result<Duration, humantime_serde::re::humantime::DurationError> {
    humantime_serde::re::humantime::parse_duration(value)
}

/// Topology and traffic generation for point-to-point network simulations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the run configuration YAML file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for the generated artifacts
    #[arg(short, long, default_value = "topogen_output")]
    output: PathBuf,

    /// Seed for the flow scheduler
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated run length, e.g. "120s"
    #[arg(long, value_parser = parse_duration)]
    stop_time: Option<Duration>,

    /// Adjacency matrix file
    #[arg(long)]
    adjacency: Option<PathBuf>,

    /// Node coordinates file
    #[arg(long)]
    coordinates: Option<PathBuf>,

    /// Write a configuration file with every default value and exit
    #[arg(long, value_name = "PATH", conflicts_with = "config")]
    init_config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            seed: self.seed,
            stop_time: self.stop_time,
            adjacency_matrix: self.adjacency.clone(),
            node_coordinates: self.coordinates.clone(),
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration before logging so its log level can apply
    let mut config = match &args.config {
        Some(path) => config_loader::load_config(path)?,
        None => Config::default(),
    };
    let default_level = config.general.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    if let Some(path) = &args.init_config {
        config_loader::write_default_config(path)?;
        return Ok(());
    }

    info!("Starting topogen");
    info!("Configuration file: {:?}", args.config);
    info!("Output directory: {:?}", args.output);

    config_loader::apply_overrides(&mut config, &args.overrides())
        .wrap_err("Invalid command line overrides")?;

    let summary = orchestrator::generate(&config, &args.output)?;

    info!(
        "Generated {} nodes, {} links and {} flows with seed {}",
        summary.node_count, summary.link_count, summary.flow_count, summary.seed
    );
    if summary.skipped_flows > 0 {
        info!("{} flows were skipped", summary.skipped_flows);
    }
    info!(
        "{} queue samples (peak {}), {} drop-ratio samples",
        summary.queue_samples, summary.peak_queue_length, summary.drop_samples
    );
    info!("Artifacts written to {:?}", args.output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["topogen", "--config", "test.yaml"]);

        assert_eq!(args.config, Some(PathBuf::from("test.yaml")));
        assert_eq!(args.output, PathBuf::from("topogen_output"));
        assert!(args.seed.is_none());
    }

    #[test]
    fn test_override_args() {
        let args = Args::parse_from([
            "topogen",
            "--seed", "7",
            "--stop-time", "30s",
            "--adjacency", "m.txt",
            "--coordinates", "c.txt",
        ]);

        let overrides = args.overrides();
        assert_eq!(overrides.seed, Some(7));
        assert_eq!(overrides.stop_time, Some(Duration::from_secs(30)));
        assert_eq!(overrides.adjacency_matrix, Some(PathBuf::from("m.txt")));
        assert_eq!(overrides.node_coordinates, Some(PathBuf::from("c.txt")));
    }

    #[test]
    fn test_bad_stop_time() {
        assert!(Args::try_parse_from(["topogen", "--stop-time", "soon"]).is_err());
    }

    #[test]
    fn test_init_config_conflicts_with_config() {
        assert!(Args::try_parse_from(["topogen", "--config", "a.yaml", "--init-config", "b.yaml"]).is_err());
    }
}
