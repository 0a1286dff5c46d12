//! Network topology module.
//!
//! This module turns the validated adjacency matrix and coordinate list into
//! nodes, point-to-point links and their devices.

pub mod types;
pub mod builder;

// Re-export key types and functions for easier access
pub use types::{
    node_name, Device, DeviceId, Interface, Link, LinkClass, Node, NodeIndex, NodeRole, Position,
    Topology,
};
pub use builder::{LinkParams, TopologyBuilder, TopologyError};
