use crate::config::Config;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// CLI arguments that can override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub seed: Option<u64>,
    pub stop_time: Option<Duration>,
    pub adjacency_matrix: Option<PathBuf>,
    pub node_coordinates: Option<PathBuf>,
}

/// Apply CLI overrides to a configuration
pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) -> Result<()> {
    if let Some(seed) = overrides.seed {
        info!("Overriding seed: {}", seed);
        config.general.seed = Some(seed);
    }

    if let Some(stop_time) = overrides.stop_time {
        info!("Overriding stop time: {:?}", stop_time);
        config.general.stop_time = stop_time;
    }

    if let Some(path) = &overrides.adjacency_matrix {
        info!("Overriding adjacency matrix file: {:?}", path);
        config.inputs.adjacency_matrix = path.clone();
    }

    if let Some(path) = &overrides.node_coordinates {
        info!("Overriding node coordinates file: {:?}", path);
        config.inputs.node_coordinates = path.clone();
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}

/// Write a configuration file populated with every default value
pub fn write_default_config(path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(&Config::default())
        .wrap_err("Failed to serialize default configuration")?;
    std::fs::write(path, yaml)
        .wrap_err_with(|| format!("Failed to write configuration '{}'", path.display()))?;
    info!("Default configuration written to: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let yaml = r#"
general:
  stop_time: "30s"
inputs:
  adjacency_matrix: "adj.txt"
  node_coordinates: "coords.txt"
nodes:
  endpoints: 2
  relays: 1
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.general.stop_time, Duration::from_secs(30));
        assert_eq!(config.nodes.relays, 1);
    }

    #[test]
    fn test_load_invalid_config() {
        let yaml = r#"
nodes:
  endpoints: 1
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        assert!(load_config(temp_file.path()).is_err());
        assert!(load_config(Path::new("/nonexistent/config.yaml")).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        let overrides = CliOverrides {
            seed: Some(42),
            stop_time: Some(Duration::from_secs(10)),
            adjacency_matrix: Some(PathBuf::from("other_adj.txt")),
            node_coordinates: None,
        };

        apply_overrides(&mut config, &overrides).unwrap();

        assert_eq!(config.general.seed, Some(42));
        assert_eq!(config.general.stop_time, Duration::from_secs(10));
        assert_eq!(config.inputs.adjacency_matrix, PathBuf::from("other_adj.txt"));
        assert_eq!(config.inputs.node_coordinates, PathBuf::from("scratch/node_coordinates.txt"));

        let zero = CliOverrides { stop_time: Some(Duration::ZERO), ..Default::default() };
        assert!(apply_overrides(&mut config, &zero).is_err());
    }

    #[test]
    fn test_default_config_loads_back() {
        let temp_file = NamedTempFile::new().unwrap();
        write_default_config(temp_file.path()).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.nodes.endpoints, 50);
        assert_eq!(config.traffic.packet_interval, Duration::from_micros(3750));
    }
}
