//! Simulation/delivery substrate interface.
//!
//! Packet transmission, queuing disciplines, routing and time advance are not
//! done here. This module describes what the generator needs from whatever
//! does them ([`Substrate`], [`Kernel`]) and pushes a built topology onto it.
//! [`MemorySubstrate`] and [`EventLoop`] are in-process implementations used
//! by the CLI dry run and by tests.

pub mod install;
pub mod kernel;
pub mod memory;

use std::net::{Ipv4Addr, SocketAddrV4};
use std::rc::Rc;

use crate::topology::{Device, DeviceId, Link, Node, NodeIndex};
use crate::traffic::{Flow, Sink};
use crate::utils::time::SimTime;

pub use install::{install_flows, install_sinks, install_topology, InstalledFlow, SubstrateWorld};
pub use kernel::{EventLoop, Kernel, Task};
pub use memory::{MemoryFlow, MemorySubstrate};

/// Unique identifier the substrate gives a packet
pub type PacketUid = u64;

/// Called by the substrate for every packet dropped on a traced receive path
pub type DropHook = Rc<dyn Fn(SimTime, PacketUid)>;

/// Handle of a flow installed on the substrate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowId(pub usize);

/// Errors a substrate can report while the topology is being installed
#[derive(Debug, thiserror::Error)]
pub enum SubstrateError {
    #[error("Unknown node {0}")]
    UnknownNode(NodeIndex),

    #[error("Unknown device {0}")]
    UnknownDevice(DeviceId),

    #[error("Device {0} installed twice")]
    DuplicateDevice(DeviceId),

    #[error("Substrate rejected the request: {0}")]
    Rejected(String),
}

/// Read access to per-device egress queues
pub trait QueueIntrospection {
    /// Packets currently waiting in the egress queue of `device`
    fn queued_packets(&self, device: DeviceId) -> u32;
}

/// The primitives the generator drives on the external simulator
pub trait Substrate: QueueIntrospection {
    fn add_node(&mut self, node: &Node) -> Result<(), SubstrateError>;

    /// Create the channel and both devices of `link`
    fn add_link(&mut self, link: &Link, devices: [&Device; 2]) -> Result<(), SubstrateError>;

    fn assign_address(
        &mut self,
        device: DeviceId,
        address: Ipv4Addr,
        prefix_len: u8,
    ) -> Result<(), SubstrateError>;

    /// Attach a random receive error model with the given rate
    fn set_receive_error_rate(&mut self, device: DeviceId, rate: f64) -> Result<(), SubstrateError>;

    fn set_queue_capacity(&mut self, device: DeviceId, packets: u32) -> Result<(), SubstrateError>;

    /// Invoke `hook` for every packet dropped on the receive path of `device`
    fn trace_rx_drops(&mut self, device: DeviceId, hook: DropHook) -> Result<(), SubstrateError>;

    fn install_sink(&mut self, sink: &Sink) -> Result<(), SubstrateError>;

    /// Prepare a flow toward `destination`; it stays idle until started
    fn install_flow(&mut self, flow: &Flow, destination: SocketAddrV4) -> Result<FlowId, SubstrateError>;

    fn start_flow(&mut self, flow: FlowId);

    fn stop_flow(&mut self, flow: FlowId);
}
