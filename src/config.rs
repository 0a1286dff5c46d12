use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::rate::DataRate;

/// Complete run configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub inputs: InputsConfig,
    #[serde(default)]
    pub nodes: NodesConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub traffic: TrafficConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl Config {
    /// Validate the settings that do not depend on the input files
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.general.stop_time.is_zero() {
            return Err(ValidationError::InvalidGeneral(
                "stop_time must be greater than zero".to_string(),
            ));
        }

        if self.nodes.endpoints < 2 {
            return Err(ValidationError::InvalidNodes(format!(
                "at least 2 endpoints are needed to form a flow, got {}",
                self.nodes.endpoints
            )));
        }

        let error_rate = self.links.error_rate;
        if !(0.0..=1.0).contains(&error_rate) {
            return Err(ValidationError::InvalidLinks(format!(
                "error_rate must be within [0, 1], got {}",
                error_rate
            )));
        }
        if self.links.queue_capacity == 0 {
            return Err(ValidationError::InvalidLinks(
                "queue_capacity cannot be zero".to_string(),
            ));
        }

        if self.traffic.decision_interval.is_zero() {
            return Err(ValidationError::InvalidTraffic(
                "decision_interval must be greater than zero".to_string(),
            ));
        }
        if self.traffic.packet_interval.is_zero() {
            return Err(ValidationError::InvalidTraffic(
                "packet_interval must be greater than zero".to_string(),
            ));
        }
        if self.traffic.packet_size == 0 {
            return Err(ValidationError::InvalidTraffic(
                "packet_size cannot be zero".to_string(),
            ));
        }

        if self.monitor.queue_interval.is_zero() {
            return Err(ValidationError::InvalidMonitor(
                "queue_interval must be greater than zero".to_string(),
            ));
        }
        if self.monitor.drop_report_every == 0 {
            return Err(ValidationError::InvalidMonitor(
                "drop_report_every cannot be zero".to_string(),
            ));
        }
        if let Some(range) = &self.monitor.nodes {
            if range.start >= range.end {
                return Err(ValidationError::InvalidMonitor(format!(
                    "monitored node range {}..{} is empty",
                    range.start, range.end
                )));
            }
        }

        Ok(())
    }

    /// Validate the settings against the number of nodes in the matrix
    pub fn validate_for_dimension(&self, dimension: usize) -> Result<(), ValidationError> {
        if self.nodes.endpoints > dimension {
            return Err(ValidationError::InvalidNodes(format!(
                "{} endpoints configured but the adjacency matrix only has {} nodes",
                self.nodes.endpoints, dimension
            )));
        }

        if self.nodes.endpoints + self.nodes.relays != dimension {
            log::warn!(
                "{} endpoints + {} relays does not match the {} nodes of the adjacency matrix; nodes from index {} on are relays",
                self.nodes.endpoints,
                self.nodes.relays,
                dimension,
                self.nodes.endpoints
            );
        }

        if let Some(range) = &self.monitor.nodes {
            if range.end > dimension {
                return Err(ValidationError::InvalidMonitor(format!(
                    "monitored node range {}..{} exceeds the {} nodes of the topology",
                    range.start, range.end, dimension
                )));
            }
        }

        Ok(())
    }

    /// Node indices the queue probe inspects
    pub fn monitored_nodes(&self, dimension: usize) -> Range<usize> {
        match &self.monitor.nodes {
            Some(range) => range.start..range.end,
            None => 0..dimension,
        }
    }
}

/// Shared general configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GeneralConfig {
    #[serde(with = "humantime_serde")]
    pub stop_time: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Paths of the topology input files
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct InputsConfig {
    pub adjacency_matrix: PathBuf,
    pub node_coordinates: PathBuf,
}

/// Role split of the node indices
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NodesConfig {
    /// Nodes [0, endpoints) originate and terminate traffic
    pub endpoints: usize,
    /// Nodes from `endpoints` on only forward
    pub relays: usize,
}

/// Link class parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LinksConfig {
    pub endpoint_relay_rate: DataRate,
    pub relay_relay_rate: DataRate,
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    /// Egress queue capacity per device, in packets
    pub queue_capacity: u32,
    /// Receive error rate on the second device of every link
    pub error_rate: f64,
}

/// Flow generation parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TrafficConfig {
    #[serde(with = "humantime_serde")]
    pub decision_interval: Duration,
    pub port: u16,
    pub packet_size: u32,
    #[serde(with = "humantime_serde")]
    pub packet_interval: Duration,
    pub max_packets: u32,
}

/// Monitor probe parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MonitorConfig {
    #[serde(with = "humantime_serde")]
    pub queue_interval: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<NodeRange>,
    pub drop_report_every: u32,
}

/// Half-open range of node indices
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NodeRange {
    pub start: usize,
    pub end: usize,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid node configuration: {0}")]
    InvalidNodes(String),
    #[error("Invalid link configuration: {0}")]
    InvalidLinks(String),
    #[error("Invalid traffic configuration: {0}")]
    InvalidTraffic(String),
    #[error("Invalid monitor configuration: {0}")]
    InvalidMonitor(String),
}

/// Default implementations
impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            stop_time: Duration::from_secs(120),
            seed: None,
            log_level: Some("info".to_string()),
        }
    }
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            adjacency_matrix: PathBuf::from("scratch/adjacency_matrix.txt"),
            node_coordinates: PathBuf::from("scratch/node_coordinates.txt"),
        }
    }
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            endpoints: 50,
            relays: 30,
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            endpoint_relay_rate: DataRate::from_bps(10_000_000),
            relay_relay_rate: DataRate::from_bps(500_000),
            delay: Duration::from_millis(2),
            queue_capacity: 100_000,
            error_rate: 0.0,
        }
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            decision_interval: Duration::from_millis(100),
            port: 9,
            packet_size: 210,
            packet_interval: Duration::from_micros(3750),
            max_packets: 1000,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            queue_interval: Duration::from_millis(200),
            nodes: None,
            drop_report_every: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let yaml = r#"
general:
  stop_time: "60s"
  seed: 7
  log_level: debug
inputs:
  adjacency_matrix: "data/adj.txt"
  node_coordinates: "data/coords.txt"
nodes:
  endpoints: 4
  relays: 2
links:
  endpoint_relay_rate: "100Mbps"
  relay_relay_rate: "1Mbps"
  delay: "5ms"
  queue_capacity: 500
  error_rate: 0.01
traffic:
  decision_interval: "100ms"
  port: 4000
  packet_size: 512
  packet_interval: "3750us"
  max_packets: 10
monitor:
  queue_interval: "200ms"
  nodes: { start: 4, end: 6 }
  drop_report_every: 50
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.validate_for_dimension(6).is_ok());

        assert_eq!(config.general.stop_time, Duration::from_secs(60));
        assert_eq!(config.general.seed, Some(7));
        assert_eq!(config.inputs.adjacency_matrix, PathBuf::from("data/adj.txt"));
        assert_eq!(config.links.endpoint_relay_rate.bps(), 100_000_000);
        assert_eq!(config.links.delay, Duration::from_millis(5));
        assert_eq!(config.traffic.packet_interval, Duration::from_micros(3750));
        assert_eq!(config.monitored_nodes(6), 4..6);
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let yaml = r#"
nodes:
  endpoints: 4
traffic:
  port: 10
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.nodes.endpoints, 4);
        assert_eq!(config.nodes.relays, 30);
        assert_eq!(config.traffic.port, 10);
        assert_eq!(config.traffic.decision_interval, Duration::from_millis(100));
        assert_eq!(config.general.stop_time, Duration::from_secs(120));
        assert_eq!(config.links.relay_relay_rate.bps(), 500_000);
        assert_eq!(config.monitor.queue_interval, Duration::from_millis(200));
        assert_eq!(config.monitored_nodes(80), 0..80);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.nodes.endpoints = 1;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidNodes(_))));
        config.nodes.endpoints = 2;

        config.links.error_rate = 1.5;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidLinks(_))));
        config.links.error_rate = f64::NAN;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidLinks(_))));
        config.links.error_rate = 0.0;

        config.traffic.decision_interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTraffic(_))));
        config.traffic.decision_interval = Duration::from_millis(100);

        config.monitor.nodes = Some(NodeRange { start: 3, end: 3 });
        assert!(matches!(config.validate(), Err(ValidationError::InvalidMonitor(_))));
    }

    #[test]
    fn test_dimension_validation() {
        let mut config = Config::default();
        config.nodes.endpoints = 3;
        config.nodes.relays = 1;
        assert!(config.validate_for_dimension(4).is_ok());
        assert!(matches!(
            config.validate_for_dimension(2),
            Err(ValidationError::InvalidNodes(_))
        ));

        config.monitor.nodes = Some(NodeRange { start: 0, end: 5 });
        assert!(matches!(
            config.validate_for_dimension(4),
            Err(ValidationError::InvalidMonitor(_))
        ));
    }

    #[test]
    fn test_invalid_rate_rejected_at_parse() {
        let yaml = r#"
links:
  endpoint_relay_rate: "very fast"
"#;
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }
}
