//! Flow and sink descriptors.

use serde::Serialize;
use std::time::Duration;

use crate::topology::NodeIndex;
use crate::utils::time::{serialize_secs, SimTime};

/// One constant-bit-rate flow confined to a single decision interval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flow {
    /// Decision interval the flow was drawn in
    pub interval: u64,
    /// Node the traffic is sent from
    pub source: NodeIndex,
    /// Node whose primary address the traffic is sent to
    pub destination: NodeIndex,
    #[serde(serialize_with = "serialize_secs")]
    pub start: SimTime,
    #[serde(serialize_with = "serialize_secs")]
    pub stop: SimTime,
    pub packet_size: u32,
    #[serde(with = "humantime_serde")]
    pub packet_interval: Duration,
    pub max_packets: u32,
}

impl Flow {
    pub fn window(&self) -> Duration {
        self.stop.saturating_sub(self.start)
    }

    /// Packets actually sent, bounded by both the window and the packet cap
    pub fn expected_packets(&self) -> u32 {
        let interval = self.packet_interval.as_nanos();
        if interval == 0 {
            return self.max_packets;
        }
        let fits = self.window().as_nanos().div_ceil(interval);
        fits.min(u128::from(self.max_packets)) as u32
    }
}

/// A packet sink listening on an endpoint for the whole run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sink {
    pub node: NodeIndex,
    pub port: u16,
    #[serde(serialize_with = "serialize_secs")]
    pub start: SimTime,
    #[serde(serialize_with = "serialize_secs")]
    pub stop: SimTime,
}
