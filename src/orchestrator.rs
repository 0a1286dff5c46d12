//! Run orchestrator.
//!
//! This module coordinates a complete run: reading and checking the inputs,
//! building the topology, installing it on a substrate, scheduling flows and
//! queue samples on the kernel, running the kernel and writing the artifacts.

use color_eyre::eyre::{Context, Result};
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::Config;
use crate::matrix_reader::{self, AdjacencyMatrix, CoordinateList};
use crate::monitor::{self, Monitor, MonitorReport};
use crate::substrate::{
    install_flows, install_sinks, install_topology, EventLoop, InstalledFlow, Kernel,
    MemorySubstrate, Substrate, SubstrateWorld,
};
use crate::topology::{Topology, TopologyBuilder};
use crate::traffic::{endpoint_sinks, resolve_seed, FlowScheduler, TrafficPlan};
use crate::utils::time::{periodic_instants, SimTime};
use crate::utils::validation::inspect_matrix;

pub const TOPOLOGY_FILE: &str = "topology.json";
pub const FLOWS_FILE: &str = "flows.json";
pub const MONITOR_FILE: &str = "monitor.json";

/// The world kernel tasks run against
pub struct Simulation<S> {
    pub substrate: S,
    pub topology: Rc<Topology>,
    pub monitor: Monitor,
}

impl<S: Substrate> Simulation<S> {
    pub fn sample_queues(&mut self, now: SimTime) {
        self.monitor.sample_queues(now, &self.topology, &self.substrate);
    }
}

impl<S: Substrate> SubstrateWorld for Simulation<S> {
    type Substrate = S;

    fn substrate_mut(&mut self) -> &mut S {
        &mut self.substrate
    }
}

/// Everything a finished run leaves behind
pub struct RunOutcome<S> {
    pub simulation: Simulation<S>,
    pub plan: TrafficPlan,
    pub installed: Vec<InstalledFlow>,
    pub tasks_run: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub node_count: usize,
    pub link_count: usize,
    pub flow_count: usize,
    pub skipped_flows: usize,
    pub queue_samples: usize,
    pub drop_samples: usize,
    pub peak_queue_length: u32,
}

/// Read both input files and cross-check their sizes
pub fn load_inputs(config: &Config) -> Result<(AdjacencyMatrix, CoordinateList)> {
    let matrix = matrix_reader::read_adjacency_matrix(&config.inputs.adjacency_matrix)
        .wrap_err("Failed to read the adjacency matrix")?;
    matrix_reader::log_matrix("adjacency matrix", &matrix);

    let coordinates = matrix_reader::read_coordinates(&config.inputs.node_coordinates)
        .wrap_err("Failed to read the node coordinates")?;
    matrix_reader::log_coordinates("node coordinates", &coordinates);

    matrix_reader::check_dimensions(&matrix, &coordinates)?;
    Ok((matrix, coordinates))
}

/// Build the topology described by the configured input files
pub fn load_topology(config: &Config) -> Result<Topology> {
    let (matrix, coordinates) = load_inputs(config)?;
    config.validate_for_dimension(matrix.dimension())?;
    inspect_matrix(&matrix);

    let topology = TopologyBuilder::from_config(config)
        .build(&matrix, &coordinates)
        .wrap_err("Failed to build the topology")?;
    Ok(topology)
}

/// Install `topology` on `substrate`, schedule traffic and sampling, and run
/// the event loop until the configured stop time
pub fn run<S: Substrate + 'static>(
    config: &Config,
    topology: Topology,
    substrate: S,
    seed: u64,
) -> Result<RunOutcome<S>> {
    config.validate()?;
    let stop_time = config.general.stop_time;
    let monitor = Monitor::new(
        config.monitored_nodes(topology.node_count()),
        config.monitor.drop_report_every,
    );
    let mut simulation = Simulation {
        substrate,
        topology: Rc::new(topology),
        monitor,
    };
    let topology = Rc::clone(&simulation.topology);
    let mut kernel: EventLoop<Simulation<S>> = EventLoop::new();

    info!("Install topology.");
    let drop_hook = simulation.monitor.drop_hook();
    install_topology(&topology, &mut simulation.substrate, &drop_hook)
        .wrap_err("Failed to install the topology")?;

    info!("Create Applications.");
    let sinks = endpoint_sinks(config.nodes.endpoints, config.traffic.port, stop_time);
    install_sinks(&sinks, &mut simulation.substrate).wrap_err("Failed to install sinks")?;

    let flows = FlowScheduler::from_config(config, seed).plan(stop_time);
    let installed = install_flows(&flows, &topology, config.traffic.port, &mut simulation, &mut kernel)
        .wrap_err("Failed to install flows")?;

    let mut samples = 0;
    for at in periodic_instants(config.monitor.queue_interval, stop_time) {
        kernel.schedule(
            at,
            Box::new(|simulation: &mut Simulation<S>, now: SimTime| simulation.sample_queues(now)),
        );
        samples += 1;
    }
    info!(
        "Scheduled {} queue samples every {:?} over nodes {:?}",
        samples,
        config.monitor.queue_interval,
        config.monitored_nodes(topology.node_count())
    );

    info!("Run Simulation.");
    let tasks_run = kernel.run(&mut simulation, stop_time);
    info!("Simulation finished at {:?} after {} events", kernel.now(), tasks_run);

    Ok(RunOutcome {
        simulation,
        plan: TrafficPlan { seed, sinks, flows },
        installed,
        tasks_run,
    })
}

fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path, what: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {} to JSON", what))?;
    fs::write(path, json).with_context(|| format!("Failed to write {} to {}", what, path.display()))?;
    info!("Wrote {} to {:?}", what, path);
    Ok(())
}

/// Run the configured scenario on the in-memory substrate and write
/// `topology.json`, `flows.json`, `monitor.json` and the TSV series into
/// `output_dir`
pub fn generate(config: &Config, output_dir: &Path) -> Result<RunSummary> {
    config.validate()?;
    let topology = load_topology(config)?;
    let seed = resolve_seed(config.general.seed);

    fs::create_dir_all(output_dir)
        .wrap_err_with(|| format!("Failed to create output directory '{}'", output_dir.display()))?;

    let outcome = run(config, topology, MemorySubstrate::new(), seed)?;
    let RunOutcome {
        simulation,
        plan,
        installed,
        ..
    } = outcome;
    let Simulation { topology, monitor, .. } = simulation;
    let report: MonitorReport = monitor.into_report();

    write_json(&*topology, &output_dir.join(TOPOLOGY_FILE), "topology")?;
    write_json(&plan, &output_dir.join(FLOWS_FILE), "flow plan")?;
    monitor::write_json_report(&report, &output_dir.join(MONITOR_FILE))?;
    monitor::write_tsv_reports(&report, output_dir)?;

    Ok(RunSummary {
        seed,
        node_count: topology.node_count(),
        link_count: topology.link_count(),
        flow_count: installed.len(),
        skipped_flows: plan.flows.len() - installed.len(),
        queue_samples: report.queue_samples.len(),
        drop_samples: report.drop_samples.len(),
        peak_queue_length: report.peak_queue_length(),
    })
}

/// Output paths written by [`generate`]
pub fn artifact_paths(output_dir: &Path) -> Vec<PathBuf> {
    [TOPOLOGY_FILE, FLOWS_FILE, MONITOR_FILE, monitor::report::QUEUE_TSV, monitor::report::DROP_TSV]
        .iter()
        .map(|name| output_dir.join(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationError;
    use crate::matrix_reader::InputError;
    use crate::topology::DeviceId;
    use std::time::Duration;
    use tempfile::TempDir;

    fn scenario(dir: &Path, matrix: &str, coordinates: &str, endpoints: usize, relays: usize) -> Config {
        let adjacency = dir.join("adjacency.txt");
        let coords = dir.join("coordinates.txt");
        fs::write(&adjacency, matrix).unwrap();
        fs::write(&coords, coordinates).unwrap();

        let mut config = Config::default();
        config.inputs.adjacency_matrix = adjacency;
        config.inputs.node_coordinates = coords;
        config.nodes.endpoints = endpoints;
        config.nodes.relays = relays;
        config.general.stop_time = Duration::from_secs(1);
        config.general.seed = Some(42);
        config
    }

    const RING: &str = "0 1 0 0\n0 0 1 0\n0 0 0 1\n1 0 0 0\n";
    const RING_COORDS: &str = "0 0\n1 0\n1 1\n0 1\n";

    #[test]
    fn test_run_on_memory_substrate() {
        let dir = TempDir::new().unwrap();
        let config = scenario(dir.path(), RING, RING_COORDS, 2, 2);
        let topology = load_topology(&config).unwrap();
        assert_eq!(topology.link_count(), 4);

        let outcome = run(&config, topology, MemorySubstrate::new(), 42).unwrap();
        let simulation = &outcome.simulation;

        // 1 s of 200 ms samples, starting at 0
        assert_eq!(simulation.monitor.queue_samples().len(), 5);
        assert!(simulation.monitor.queue_samples().iter().all(|s| s.max_queue_length == 0));

        // Two endpoints give exactly one flow per decision interval
        assert_eq!(outcome.plan.flows.len(), 10);
        assert_eq!(outcome.installed.len(), 10);
        assert_eq!(outcome.plan.sinks.len(), 2);
        assert_eq!(outcome.tasks_run, 10 * 2 + 5);

        // Every flow was started and stopped before the loop ended
        assert_eq!(simulation.substrate.active_flows(), 0);
        assert!(simulation.substrate.flows().iter().all(|f| f.starts == 1 && f.stops == 1));
        assert!(simulation.substrate.is_traced(DeviceId(1)));
    }

    #[test]
    fn test_same_seed_same_plan() {
        let dir = TempDir::new().unwrap();
        let config = scenario(dir.path(), RING, RING_COORDS, 4, 0);
        let first = run(&config, load_topology(&config).unwrap(), MemorySubstrate::new(), 7).unwrap();
        let second = run(&config, load_topology(&config).unwrap(), MemorySubstrate::new(), 7).unwrap();
        assert_eq!(first.plan.flows, second.plan.flows);
    }

    #[test]
    fn test_dimension_mismatch_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = scenario(dir.path(), RING, "0 0\n1 1\n", 2, 2);
        let err = load_topology(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InputError>(),
            Some(InputError::DimensionMismatch { coordinates: 2, matrix: 4 })
        ));
    }

    #[test]
    fn test_too_many_endpoints_for_matrix() {
        let dir = TempDir::new().unwrap();
        let config = scenario(dir.path(), "0 1\n0 0\n", "0 0\n1 1\n", 3, 0);
        assert!(load_topology(&config).is_err());
    }

    #[test]
    fn test_single_endpoint_cannot_run() {
        let dir = TempDir::new().unwrap();
        let config = scenario(dir.path(), "0 1\n0 0\n", "0 0\n1 1\n", 1, 1);

        // The topology itself is fine with one endpoint
        let topology = load_topology(&config).unwrap();
        assert_eq!(topology.link_count(), 1);

        let err = run(&config, topology, MemorySubstrate::new(), 1).err().unwrap();
        assert!(matches!(err.downcast_ref::<ValidationError>(), Some(ValidationError::InvalidNodes(_))));

        let output = dir.path().join("out");
        let err = generate(&config, &output).unwrap_err();
        assert!(matches!(err.downcast_ref::<ValidationError>(), Some(ValidationError::InvalidNodes(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_generate_writes_artifacts() {
        let dir = TempDir::new().unwrap();
        let config = scenario(dir.path(), RING, RING_COORDS, 2, 2);
        let output = dir.path().join("out");

        let summary = generate(&config, &output).unwrap();
        assert_eq!(summary.seed, 42);
        assert_eq!(summary.node_count, 4);
        assert_eq!(summary.link_count, 4);
        assert_eq!(summary.flow_count, 10);
        assert_eq!(summary.skipped_flows, 0);
        assert_eq!(summary.queue_samples, 5);

        for path in artifact_paths(&output) {
            assert!(path.exists(), "missing {:?}", path);
        }

        let topology: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output.join(TOPOLOGY_FILE)).unwrap()).unwrap();
        assert_eq!(topology["links"].as_array().unwrap().len(), 4);
        assert_eq!(topology["nodes"][1]["position"]["y"], 0.0);
        assert_eq!(topology["nodes"][2]["position"]["y"], -1.0);

        let flows: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output.join(FLOWS_FILE)).unwrap()).unwrap();
        assert_eq!(flows["seed"], 42);
        assert_eq!(flows["flows"].as_array().unwrap().len(), 10);
    }
}
