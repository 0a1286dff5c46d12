//! Topology construction from an adjacency matrix.
//!
//! The whole matrix is scanned row-major. Every set entry `[i][j]` becomes one
//! point-to-point link between node i and node j, so a symmetric matrix gives
//! two parallel links per pair. Callers that want one link per pair must pass
//! an upper-triangular matrix.

use log::{debug, info, trace, warn};
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::config::Config;
use crate::ip::{AddressError, AddressRegistry, SubnetAllocator};
use crate::matrix_reader::{self, AdjacencyMatrix, CoordinateList, InputError};
use crate::utils::rate::DataRate;

use super::types::*;

/// Errors raised while building a topology
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Link class parameters shared by every link the builder creates
#[derive(Debug, Clone, PartialEq)]
pub struct LinkParams {
    pub endpoint_relay_rate: DataRate,
    pub relay_relay_rate: DataRate,
    pub delay: Duration,
    pub queue_capacity: u32,
    pub error_rate: f64,
}

impl LinkParams {
    pub fn rate_for(&self, class: LinkClass) -> DataRate {
        match class {
            LinkClass::EndpointRelay => self.endpoint_relay_rate,
            LinkClass::RelayRelay => self.relay_relay_rate,
        }
    }
}

impl From<&crate::config::LinksConfig> for LinkParams {
    fn from(links: &crate::config::LinksConfig) -> Self {
        LinkParams {
            endpoint_relay_rate: links.endpoint_relay_rate,
            relay_relay_rate: links.relay_relay_rate,
            delay: links.delay,
            queue_capacity: links.queue_capacity,
            error_rate: links.error_rate,
        }
    }
}

/// Builds a [`Topology`] from validated inputs
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    endpoints: usize,
    relays: usize,
    params: LinkParams,
    base: Ipv4Addr,
}

impl TopologyBuilder {
    pub fn new(endpoints: usize, relays: usize, params: LinkParams) -> Self {
        TopologyBuilder {
            endpoints,
            relays,
            params,
            base: Ipv4Addr::new(10, 0, 0, 0),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.nodes.endpoints,
            config.nodes.relays,
            LinkParams::from(&config.links),
        )
    }

    /// Use a different /8 for link subnets
    pub fn with_base(mut self, base: Ipv4Addr) -> Self {
        self.base = base;
        self
    }

    pub fn build(
        &self,
        matrix: &AdjacencyMatrix,
        coordinates: &CoordinateList,
    ) -> Result<Topology, TopologyError> {
        matrix_reader::check_dimensions(matrix, coordinates)?;

        info!("Create Nodes.");
        let mut nodes: Vec<Node> = (0..matrix.dimension())
            .map(|index| Node {
                index,
                role: NodeRole::for_index(index, self.endpoints),
                name: node_name(index, self.endpoints),
                position: Position::default(),
                interfaces: vec![Interface::loopback()],
            })
            .collect();

        info!("Create Links Between Nodes.");
        let mut allocator = SubnetAllocator::new(self.base);
        let mut addresses = AddressRegistry::new();
        let mut links = Vec::new();
        let mut devices: Vec<Device> = Vec::new();

        for i in 0..matrix.dimension() {
            for j in 0..matrix.dimension() {
                if !matrix.is_set(i, j) {
                    trace!("matrix element [{}][{}] is 0", i, j);
                    continue;
                }

                let class = match NodeRole::for_index(i, self.endpoints) {
                    NodeRole::Endpoint => LinkClass::EndpointRelay,
                    NodeRole::Relay => LinkClass::RelayRelay,
                };
                let subnet = allocator.current()?;
                let link_index = links.len();

                let ends = [(i, j, 1u32), (j, i, 2u32)];
                let mut ids = [DeviceId(0); 2];
                for (slot, &(own, peer, host)) in ends.iter().enumerate() {
                    let address = subnet
                        .host(host)
                        .ok_or(AddressError::NoSuchHost { subnet, host })?;
                    let id = DeviceId(devices.len());
                    let name = format!("{}--{}", nodes[own].name, nodes[peer].name);
                    addresses.register(address, &name)?;

                    nodes[own].interfaces.push(Interface {
                        address,
                        prefix_len: subnet.prefix_len,
                        device: Some(id),
                        metric: 1,
                    });
                    devices.push(Device {
                        id,
                        node: own,
                        link: link_index,
                        name,
                        address,
                        queue_capacity: self.params.queue_capacity,
                        // Only the receive path of the second device is lossy
                        receive_error_rate: (slot == 1).then_some(self.params.error_rate),
                    });
                    ids[slot] = id;
                }

                links.push(Link {
                    index: link_index,
                    a: i,
                    b: j,
                    class,
                    data_rate: self.params.rate_for(class),
                    delay: self.params.delay,
                    subnet,
                    devices: ids,
                });
                allocator.allocate()?;
                debug!("matrix element [{}][{}] is 1 ({} link on {})", i, j, class, subnet);
            }
        }

        info!("Number of links in the adjacency matrix is: {}", links.len());
        info!(
            "Number of all nodes is: {} ({} endpoints, {} relays configured)",
            nodes.len(),
            self.endpoints,
            self.relays
        );

        info!("Allocate Positions to Nodes.");
        for (node, coordinate) in nodes.iter_mut().zip(coordinates.iter()) {
            // The display origin is the upper left corner, so y is flipped
            node.position = Position {
                x: coordinate.x,
                y: -coordinate.y,
            };
        }

        for node in nodes.iter().filter(|node| node.is_isolated()) {
            warn!("Node {} has no links and no address", node.name);
        }

        Ok(Topology {
            nodes,
            links,
            devices,
            addresses,
        })
    }
}
