//! Topology type definitions.
//!
//! Nodes, point-to-point links and the devices that attach a link to each of
//! its two nodes. Everything here is built once and read-only afterwards.

use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::ip::{AddressRegistry, Subnet, LOOPBACK};
use crate::utils::rate::DataRate;

/// Index of a node in the adjacency matrix
pub type NodeIndex = usize;

/// Handle of one point-to-point device, unique across the topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DeviceId(pub usize);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev{}", self.0)
    }
}

/// Role of a node in the traffic pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeRole {
    /// Originates and terminates flows
    Endpoint,
    /// Only forwards
    Relay,
}

impl NodeRole {
    pub fn for_index(index: NodeIndex, endpoints: usize) -> Self {
        if index < endpoints {
            NodeRole::Endpoint
        } else {
            NodeRole::Relay
        }
    }
}

/// Display name of node `index`: "endpoint1", "endpoint2", ..., "relay1", ...
pub fn node_name(index: NodeIndex, endpoints: usize) -> String {
    match NodeRole::for_index(index, endpoints) {
        NodeRole::Endpoint => format!("endpoint{}", index + 1),
        NodeRole::Relay => format!("relay{}", index - endpoints + 1),
    }
}

/// Display position; y is already sign-inverted relative to the input file
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One entry of a node's interface table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interface {
    pub address: Ipv4Addr,
    pub prefix_len: u8,
    /// None for the loopback interface
    pub device: Option<DeviceId>,
    pub metric: u32,
}

impl Interface {
    pub fn loopback() -> Self {
        Interface {
            address: LOOPBACK,
            prefix_len: 8,
            device: None,
            metric: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub index: NodeIndex,
    pub role: NodeRole,
    pub name: String,
    pub position: Position,
    /// Interface 0 is the loopback; point-to-point interfaces follow in link order
    pub interfaces: Vec<Interface>,
}

impl Node {
    /// Interfaces that carry traffic, i.e. everything but the loopback
    pub fn data_interfaces(&self) -> &[Interface] {
        self.interfaces.get(1..).unwrap_or(&[])
    }

    pub fn data_devices(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.data_interfaces().iter().filter_map(|iface| iface.device)
    }

    /// Address of interface 1, the one flows toward this node are sent to
    pub fn primary_address(&self) -> Option<Ipv4Addr> {
        self.data_interfaces().first().map(|iface| iface.address)
    }

    pub fn is_isolated(&self) -> bool {
        self.data_interfaces().is_empty()
    }
}

/// Rate/delay/error profile of a link, chosen by the role of its row node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LinkClass {
    EndpointRelay,
    RelayRelay,
}

impl fmt::Display for LinkClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkClass::EndpointRelay => write!(f, "Endpoint-Relay"),
            LinkClass::RelayRelay => write!(f, "Relay-Relay"),
        }
    }
}

/// One end of a link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: DeviceId,
    pub node: NodeIndex,
    /// Index into the topology's link list
    pub link: usize,
    /// "<own node>--<peer node>"
    pub name: String,
    pub address: Ipv4Addr,
    pub queue_capacity: u32,
    /// Set only on the second device of a link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive_error_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub index: usize,
    /// Row index of the matrix entry
    pub a: NodeIndex,
    /// Column index of the matrix entry
    pub b: NodeIndex,
    pub class: LinkClass,
    pub data_rate: DataRate,
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    pub subnet: Subnet,
    /// Device on `a`, then device on `b`
    pub devices: [DeviceId; 2],
}

/// The complete built topology
#[derive(Debug, Serialize)]
pub struct Topology {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub devices: Vec<Device>,
    #[serde(skip)]
    pub addresses: AddressRegistry,
}

impl Topology {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id.0)
    }

    pub fn primary_address(&self, index: NodeIndex) -> Option<Ipv4Addr> {
        self.node(index).and_then(Node::primary_address)
    }

    /// Name of the device that owns `addr`
    pub fn owner_of(&self, addr: Ipv4Addr) -> Option<&str> {
        self.addresses.owner(addr)
    }
}
