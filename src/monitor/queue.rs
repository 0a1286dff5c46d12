//! Queue-length probe.

use log::info;
use serde::Serialize;
use std::ops::Range;

use crate::substrate::QueueIntrospection;
use crate::topology::{NodeIndex, Topology};
use crate::utils::time::{serialize_secs, SimTime};

/// Largest per-node egress backlog observed at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSample {
    #[serde(serialize_with = "serialize_secs")]
    pub time: SimTime,
    pub max_queue_length: u32,
}

/// Samples the aggregate queue depth of a range of nodes
#[derive(Debug, Clone)]
pub struct QueueProbe {
    nodes: Range<NodeIndex>,
}

impl QueueProbe {
    pub fn new(nodes: Range<NodeIndex>) -> Self {
        QueueProbe { nodes }
    }

    /// Packets queued on every point-to-point device of `node`
    pub fn node_backlog<Q: QueueIntrospection + ?Sized>(
        topology: &Topology,
        queues: &Q,
        node: NodeIndex,
    ) -> u32 {
        topology
            .node(node)
            .map(|node| {
                node.data_devices()
                    .map(|device| queues.queued_packets(device))
                    .fold(0u32, u32::saturating_add)
            })
            .unwrap_or(0)
    }

    pub fn sample<Q: QueueIntrospection + ?Sized>(
        &self,
        now: SimTime,
        topology: &Topology,
        queues: &Q,
    ) -> QueueSample {
        let max_queue_length = self
            .nodes
            .clone()
            .map(|node| Self::node_backlog(topology, queues, node))
            .max()
            .unwrap_or(0);

        info!("{}\t {}", now.as_secs_f64(), max_queue_length);
        QueueSample {
            time: now,
            max_queue_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::DeviceId;
    use std::collections::HashMap;
    use std::time::Duration;

    struct FixedQueues(HashMap<DeviceId, u32>);

    impl QueueIntrospection for FixedQueues {
        fn queued_packets(&self, device: DeviceId) -> u32 {
            self.0.get(&device).copied().unwrap_or(0)
        }
    }

    fn star() -> Topology {
        use crate::matrix_reader::{parse_adjacency_matrix, parse_coordinates};
        use crate::topology::{LinkParams, TopologyBuilder};
        use crate::utils::DataRate;

        // node 0 links to 1, 2 and 3
        let matrix = parse_adjacency_matrix("0 1 1 1\n0 0 0 0\n0 0 0 0\n0 0 0 0\n").unwrap();
        let coordinates = parse_coordinates("0 0\n1 0\n0 1\n1 1\n").unwrap();
        let params = LinkParams {
            endpoint_relay_rate: DataRate::from_bps(10_000_000),
            relay_relay_rate: DataRate::from_bps(500_000),
            delay: Duration::from_millis(2),
            queue_capacity: 100,
            error_rate: 0.0,
        };
        TopologyBuilder::new(2, 2, params).build(&matrix, &coordinates).unwrap()
    }

    #[test]
    fn test_empty_queues_sample_zero() {
        let topology = star();
        let probe = QueueProbe::new(0..topology.node_count());
        let sample = probe.sample(Duration::ZERO, &topology, &FixedQueues(HashMap::new()));
        assert_eq!(sample.max_queue_length, 0);
        assert_eq!(sample.time, Duration::ZERO);
    }

    #[test]
    fn test_sum_per_node_then_max() {
        let topology = star();
        // Devices 0, 2 and 4 sit on node 0; 1, 3 and 5 on nodes 1, 2 and 3
        let queues = FixedQueues(HashMap::from([
            (DeviceId(0), 3),
            (DeviceId(2), 4),
            (DeviceId(4), 5),
            (DeviceId(5), 10),
        ]));

        let probe = QueueProbe::new(0..4);
        assert_eq!(QueueProbe::node_backlog(&topology, &queues, 0), 12);
        assert_eq!(probe.sample(Duration::from_millis(200), &topology, &queues).max_queue_length, 12);

        // Restricting the range leaves node 0 out
        let probe = QueueProbe::new(1..4);
        assert_eq!(probe.sample(Duration::from_millis(400), &topology, &queues).max_queue_length, 10);
    }

    #[test]
    fn test_empty_range() {
        let topology = star();
        let queues = FixedQueues(HashMap::from([(DeviceId(0), 3)]));
        let probe = QueueProbe::new(2..2);
        assert_eq!(probe.sample(Duration::ZERO, &topology, &queues).max_queue_length, 0);
    }
}
