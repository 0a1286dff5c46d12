//! In-process substrate.
//!
//! Records everything the generator asks for without moving any packets.
//! Queue occupancy and receive drops are driven from the outside through
//! [`MemorySubstrate::set_queued`] and [`MemorySubstrate::inject_rx_drop`],
//! which is what the dry run and the tests rely on.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddrV4};

use crate::topology::{Device, DeviceId, Link, Node, NodeIndex};
use crate::traffic::{Flow, Sink};
use crate::utils::time::SimTime;

use super::{DropHook, FlowId, PacketUid, QueueIntrospection, Substrate, SubstrateError};

struct MemoryDevice {
    node: NodeIndex,
    addresses: Vec<(Ipv4Addr, u8)>,
    queue_capacity: Option<u32>,
    receive_error_rate: Option<f64>,
    queued: u32,
    rx_drops: u64,
    hooks: Vec<DropHook>,
}

/// State of an installed flow
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryFlow {
    pub flow: Flow,
    pub destination: SocketAddrV4,
    pub active: bool,
    pub starts: u32,
    pub stops: u32,
}

/// Substrate that only keeps books
#[derive(Default)]
pub struct MemorySubstrate {
    nodes: HashMap<NodeIndex, String>,
    links: usize,
    devices: HashMap<DeviceId, MemoryDevice>,
    sinks: Vec<Sink>,
    flows: Vec<MemoryFlow>,
}

impl MemorySubstrate {
    pub fn new() -> Self {
        Self::default()
    }

    fn device_mut(&mut self, device: DeviceId) -> Result<&mut MemoryDevice, SubstrateError> {
        self.devices
            .get_mut(&device)
            .ok_or(SubstrateError::UnknownDevice(device))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn addresses(&self, device: DeviceId) -> &[(Ipv4Addr, u8)] {
        self.devices
            .get(&device)
            .map(|d| d.addresses.as_slice())
            .unwrap_or(&[])
    }

    pub fn queue_capacity(&self, device: DeviceId) -> Option<u32> {
        self.devices.get(&device).and_then(|d| d.queue_capacity)
    }

    pub fn receive_error_rate(&self, device: DeviceId) -> Option<f64> {
        self.devices.get(&device).and_then(|d| d.receive_error_rate)
    }

    pub fn is_traced(&self, device: DeviceId) -> bool {
        self.devices
            .get(&device)
            .map(|d| !d.hooks.is_empty())
            .unwrap_or(false)
    }

    pub fn rx_drops(&self, device: DeviceId) -> u64 {
        self.devices.get(&device).map(|d| d.rx_drops).unwrap_or(0)
    }

    pub fn sinks(&self) -> &[Sink] {
        &self.sinks
    }

    pub fn flows(&self) -> &[MemoryFlow] {
        &self.flows
    }

    pub fn active_flows(&self) -> usize {
        self.flows.iter().filter(|f| f.active).count()
    }

    /// Set the egress queue occupancy of `device`, clamped to its capacity
    pub fn set_queued(&mut self, device: DeviceId, packets: u32) -> Result<(), SubstrateError> {
        let entry = self.device_mut(device)?;
        entry.queued = match entry.queue_capacity {
            Some(capacity) => packets.min(capacity),
            None => packets,
        };
        Ok(())
    }

    /// Report a receive-path drop on `device` to every hook tracing it
    pub fn inject_rx_drop(
        &mut self,
        device: DeviceId,
        now: SimTime,
        uid: PacketUid,
    ) -> Result<(), SubstrateError> {
        let entry = self.device_mut(device)?;
        entry.rx_drops += 1;
        log::trace!("rx drop of packet {} on {} (node {}) at {:?}", uid, device, entry.node, now);
        for hook in &entry.hooks {
            hook(now, uid);
        }
        Ok(())
    }
}

impl QueueIntrospection for MemorySubstrate {
    fn queued_packets(&self, device: DeviceId) -> u32 {
        self.devices.get(&device).map(|d| d.queued).unwrap_or(0)
    }
}

impl Substrate for MemorySubstrate {
    fn add_node(&mut self, node: &Node) -> Result<(), SubstrateError> {
        self.nodes.insert(node.index, node.name.clone());
        Ok(())
    }

    fn add_link(&mut self, _link: &Link, devices: [&Device; 2]) -> Result<(), SubstrateError> {
        for device in devices {
            if !self.nodes.contains_key(&device.node) {
                return Err(SubstrateError::UnknownNode(device.node));
            }
            if self.devices.contains_key(&device.id) {
                return Err(SubstrateError::DuplicateDevice(device.id));
            }
        }
        for device in devices {
            self.devices.insert(
                device.id,
                MemoryDevice {
                    node: device.node,
                    addresses: Vec::new(),
                    queue_capacity: None,
                    receive_error_rate: None,
                    queued: 0,
                    rx_drops: 0,
                    hooks: Vec::new(),
                },
            );
        }
        self.links += 1;
        Ok(())
    }

    fn assign_address(
        &mut self,
        device: DeviceId,
        address: Ipv4Addr,
        prefix_len: u8,
    ) -> Result<(), SubstrateError> {
        self.device_mut(device)?.addresses.push((address, prefix_len));
        Ok(())
    }

    fn set_receive_error_rate(&mut self, device: DeviceId, rate: f64) -> Result<(), SubstrateError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(SubstrateError::Rejected(format!("error rate {} outside [0, 1]", rate)));
        }
        self.device_mut(device)?.receive_error_rate = Some(rate);
        Ok(())
    }

    fn set_queue_capacity(&mut self, device: DeviceId, packets: u32) -> Result<(), SubstrateError> {
        let entry = self.device_mut(device)?;
        entry.queue_capacity = Some(packets);
        entry.queued = entry.queued.min(packets);
        Ok(())
    }

    fn trace_rx_drops(&mut self, device: DeviceId, hook: DropHook) -> Result<(), SubstrateError> {
        self.device_mut(device)?.hooks.push(hook);
        Ok(())
    }

    fn install_sink(&mut self, sink: &Sink) -> Result<(), SubstrateError> {
        if !self.nodes.contains_key(&sink.node) {
            return Err(SubstrateError::UnknownNode(sink.node));
        }
        self.sinks.push(sink.clone());
        Ok(())
    }

    fn install_flow(&mut self, flow: &Flow, destination: SocketAddrV4) -> Result<FlowId, SubstrateError> {
        if !self.nodes.contains_key(&flow.source) {
            return Err(SubstrateError::UnknownNode(flow.source));
        }
        let id = FlowId(self.flows.len());
        self.flows.push(MemoryFlow {
            flow: flow.clone(),
            destination,
            active: false,
            starts: 0,
            stops: 0,
        });
        Ok(id)
    }

    fn start_flow(&mut self, flow: FlowId) {
        match self.flows.get_mut(flow.0) {
            Some(entry) => {
                entry.active = true;
                entry.starts += 1;
            }
            None => log::warn!("start requested for unknown flow {:?}", flow),
        }
    }

    fn stop_flow(&mut self, flow: FlowId) {
        match self.flows.get_mut(flow.0) {
            Some(entry) => {
                entry.active = false;
                entry.stops += 1;
            }
            None => log::warn!("stop requested for unknown flow {:?}", flow),
        }
    }
}
