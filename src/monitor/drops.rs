//! Drop-ratio probe.
//!
//! The substrate calls [`DropRatioProbe::record`] for every packet dropped on
//! a traced receive path. The emitted ratio divides the cumulative drop count
//! by the uid of the packet that triggered the report. Uids grow with every
//! packet the substrate creates, so this approximates drops per packet sent
//! but is not an exact loss rate.

use log::info;
use serde::Serialize;

use crate::substrate::PacketUid;
use crate::utils::time::{serialize_secs, SimTime};

pub const DEFAULT_REPORT_EVERY: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropSample {
    #[serde(serialize_with = "serialize_secs")]
    pub time: SimTime,
    pub ratio: f64,
}

#[derive(Debug, Clone)]
pub struct DropRatioProbe {
    every: u32,
    invocations: u32,
    drops: u64,
    samples: Vec<DropSample>,
}

impl DropRatioProbe {
    pub fn new(every: u32) -> Self {
        DropRatioProbe {
            every: every.max(1),
            invocations: 0,
            drops: 0,
            samples: Vec::new(),
        }
    }

    /// Count one drop; every `every` calls a sample is emitted and returned
    pub fn record(&mut self, now: SimTime, uid: PacketUid) -> Option<DropSample> {
        self.drops += 1;
        self.invocations += 1;
        if self.invocations < self.every {
            return None;
        }
        self.invocations = 0;

        // A uid of 0 gives an infinite ratio
        let ratio = self.drops as f64 / uid as f64;
        info!("{}\t {}", now.as_secs_f64(), ratio);
        let sample = DropSample { time: now, ratio };
        self.samples.push(sample.clone());
        Some(sample)
    }

    pub fn drops(&self) -> u64 {
        self.drops
    }

    pub fn samples(&self) -> &[DropSample] {
        &self.samples
    }

    pub fn take_samples(&mut self) -> Vec<DropSample> {
        std::mem::take(&mut self.samples)
    }
}

impl Default for DropRatioProbe {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_EVERY)
    }
}
