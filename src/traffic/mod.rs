//! Traffic generation module.
//!
//! Flows are drawn up front for the whole run; each one is later installed on
//! the substrate with a start and a stop event at its window edges.

pub mod flow;
pub mod scheduler;

use serde::Serialize;

pub use flow::{Flow, Sink};
pub use scheduler::{endpoint_sinks, resolve_seed, FlowParams, FlowScheduler};

/// Everything the traffic side of a run consists of
#[derive(Debug, Serialize)]
pub struct TrafficPlan {
    pub seed: u64,
    pub sinks: Vec<Sink>,
    pub flows: Vec<Flow>,
}
