//! Queue and drop monitoring.
//!
//! The [`Monitor`] owns both probes. Queue sampling is driven by tasks the
//! orchestrator schedules on the kernel; drop counting is driven by the
//! substrate through the hook returned from [`Monitor::drop_hook`].

pub mod drops;
pub mod queue;
pub mod report;

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use crate::substrate::{DropHook, PacketUid, QueueIntrospection};
use crate::topology::{NodeIndex, Topology};
use crate::utils::time::SimTime;

pub use drops::{DropRatioProbe, DropSample, DEFAULT_REPORT_EVERY};
pub use queue::{QueueProbe, QueueSample};
pub use report::{write_json_report, write_tsv_reports, MonitorReport};

pub struct Monitor {
    queue_probe: QueueProbe,
    queue_samples: Vec<QueueSample>,
    drops: Rc<RefCell<DropRatioProbe>>,
}

impl Monitor {
    pub fn new(nodes: Range<NodeIndex>, drop_report_every: u32) -> Self {
        Monitor {
            queue_probe: QueueProbe::new(nodes),
            queue_samples: Vec::new(),
            drops: Rc::new(RefCell::new(DropRatioProbe::new(drop_report_every))),
        }
    }

    pub fn sample_queues<Q: QueueIntrospection + ?Sized>(
        &mut self,
        now: SimTime,
        topology: &Topology,
        queues: &Q,
    ) -> &QueueSample {
        let sample = self.queue_probe.sample(now, topology, queues);
        self.queue_samples.push(sample);
        &self.queue_samples[self.queue_samples.len() - 1]
    }

    /// Callback to hand to the substrate for every traced receive path
    pub fn drop_hook(&self) -> DropHook {
        let probe = Rc::clone(&self.drops);
        Rc::new(move |now: SimTime, uid: PacketUid| {
            probe.borrow_mut().record(now, uid);
        })
    }

    pub fn queue_samples(&self) -> &[QueueSample] {
        &self.queue_samples
    }

    pub fn drop_samples(&self) -> Vec<DropSample> {
        self.drops.borrow().samples().to_vec()
    }

    pub fn total_drops(&self) -> u64 {
        self.drops.borrow().drops()
    }

    pub fn into_report(self) -> MonitorReport {
        let drop_samples = self.drops.borrow_mut().take_samples();
        MonitorReport {
            queue_samples: self.queue_samples,
            drop_samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::DeviceId;
    use std::time::Duration;

    struct Flat(u32);

    impl QueueIntrospection for Flat {
        fn queued_packets(&self, _device: DeviceId) -> u32 {
            self.0
        }
    }

    #[test]
    fn test_hook_feeds_drop_probe() {
        let monitor = Monitor::new(0..0, 3);
        let hook = monitor.drop_hook();
        for uid in 1..=7 {
            hook(Duration::from_millis(uid), uid);
        }
        assert_eq!(monitor.total_drops(), 7);
        let samples = monitor.drop_samples();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].ratio, 6.0 / 6.0);

        let report = monitor.into_report();
        assert_eq!(report.drop_samples.len(), 2);
        assert!(report.queue_samples.is_empty());
    }

    #[test]
    fn test_queue_samples_accumulate() {
        let topology = crate::topology::Topology {
            nodes: Vec::new(),
            links: Vec::new(),
            devices: Vec::new(),
            addresses: Default::default(),
        };
        let mut monitor = Monitor::new(0..0, 100);
        monitor.sample_queues(Duration::ZERO, &topology, &Flat(5));
        let last = monitor.sample_queues(Duration::from_millis(200), &topology, &Flat(5));
        assert_eq!(last.max_queue_length, 0);
        assert_eq!(monitor.queue_samples().len(), 2);
    }
}
