//! Randomized flow scheduling.
//!
//! Time is cut into decision intervals. In each one the endpoint indices are
//! shuffled, a pair count is drawn from `[1, endpoints / 2]`, and consecutive
//! shuffled elements are paired up. Pairing consecutive elements of a
//! permutation means no endpoint takes part in two flows of the same interval.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use crate::config::Config;
use crate::utils::time::{nth_period, whole_periods, SimTime};

use super::flow::{Flow, Sink};

/// Per-flow packet parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FlowParams {
    pub packet_size: u32,
    pub packet_interval: Duration,
    pub max_packets: u32,
}

/// Draws randomized flows between endpoints
#[derive(Debug)]
pub struct FlowScheduler {
    endpoints: usize,
    decision_interval: Duration,
    params: FlowParams,
    rng: StdRng,
    order: Vec<usize>,
}

impl FlowScheduler {
    /// `endpoints` must be at least 2
    pub fn new(endpoints: usize, decision_interval: Duration, params: FlowParams, seed: u64) -> Self {
        FlowScheduler {
            endpoints,
            decision_interval,
            params,
            rng: StdRng::seed_from_u64(seed),
            order: (0..endpoints).collect(),
        }
    }

    pub fn from_config(config: &Config, seed: u64) -> Self {
        Self::new(
            config.nodes.endpoints,
            config.traffic.decision_interval,
            FlowParams {
                packet_size: config.traffic.packet_size,
                packet_interval: config.traffic.packet_interval,
                max_packets: config.traffic.max_packets,
            },
            seed,
        )
    }

    /// Draw the flows of decision interval `t`
    pub fn interval_flows(&mut self, t: u64) -> Vec<Flow> {
        let start = nth_period(self.decision_interval, t);
        let stop = start + self.decision_interval;

        // Every interval starts again from the identity order
        for (slot, index) in self.order.iter_mut().enumerate() {
            *index = slot;
        }
        self.order.shuffle(&mut self.rng);
        let pair_count = self.rng.gen_range(1..=self.endpoints / 2);

        self.order
            .chunks_exact(2)
            .take(pair_count)
            .map(|pair| Flow {
                interval: t,
                source: pair[1],
                destination: pair[0],
                start,
                stop,
                packet_size: self.params.packet_size,
                packet_interval: self.params.packet_interval,
                max_packets: self.params.max_packets,
            })
            .collect()
    }

    /// Draw flows for every decision interval that fits into `duration`
    pub fn plan(&mut self, duration: SimTime) -> Vec<Flow> {
        let intervals = whole_periods(duration, self.decision_interval);
        let mut flows = Vec::new();
        for t in 0..intervals {
            let drawn = self.interval_flows(t);
            debug!("decision interval {}: {} flows", t, drawn.len());
            flows.extend(drawn);
        }
        let packets: u64 = flows.iter().map(|flow| u64::from(flow.expected_packets())).sum();
        info!(
            "Scheduled {} flows ({} packets) over {} decision intervals of {:?}",
            flows.len(),
            packets,
            intervals,
            self.decision_interval
        );
        flows
    }
}

/// One sink per endpoint for the whole run
pub fn endpoint_sinks(endpoints: usize, port: u16, stop: SimTime) -> Vec<Sink> {
    (0..endpoints)
        .map(|node| Sink {
            node,
            port,
            start: Duration::ZERO,
            stop,
        })
        .collect()
}

/// Seed from configuration, or a fresh one that is logged so the run can be replayed
pub fn resolve_seed(configured: Option<u64>) -> u64 {
    match configured {
        Some(seed) => seed,
        None => {
            let seed = rand::random::<u64>();
            info!("No seed configured, using random seed {}", seed);
            seed
        }
    }
}
