//! Pushing a built topology and its traffic onto a substrate.

use log::{debug, info, warn};
use std::net::SocketAddrV4;

use crate::topology::{NodeIndex, Topology};
use crate::traffic::{Flow, Sink};
use crate::utils::time::SimTime;

use super::{DropHook, FlowId, Kernel, MemorySubstrate, Substrate, SubstrateError};

/// A world that tasks scheduled on the kernel can reach the substrate through
pub trait SubstrateWorld {
    type Substrate: Substrate;

    fn substrate_mut(&mut self) -> &mut Self::Substrate;
}

impl SubstrateWorld for MemorySubstrate {
    type Substrate = MemorySubstrate;

    fn substrate_mut(&mut self) -> &mut MemorySubstrate {
        self
    }
}

/// A flow accepted by the substrate, with its start/stop tasks on the kernel
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledFlow {
    pub id: FlowId,
    pub source: NodeIndex,
    pub destination: SocketAddrV4,
    pub start: SimTime,
    pub stop: SimTime,
}

/// Create nodes, links, addresses, queue limits and error models.
///
/// `drop_hook` is attached to every device that carries a receive error
/// model, i.e. the second device of each link.
pub fn install_topology<S: Substrate + ?Sized>(
    topology: &Topology,
    substrate: &mut S,
    drop_hook: &DropHook,
) -> Result<(), SubstrateError> {
    for node in &topology.nodes {
        substrate.add_node(node)?;
    }

    for link in &topology.links {
        let [first, second] = link.devices;
        let devices = [
            topology.device(first).ok_or(SubstrateError::UnknownDevice(first))?,
            topology.device(second).ok_or(SubstrateError::UnknownDevice(second))?,
        ];
        substrate.add_link(link, devices)?;

        for device in devices {
            substrate.assign_address(device.id, device.address, link.subnet.prefix_len)?;
            substrate.set_queue_capacity(device.id, device.queue_capacity)?;
            if let Some(rate) = device.receive_error_rate {
                substrate.set_receive_error_rate(device.id, rate)?;
                substrate.trace_rx_drops(device.id, drop_hook.clone())?;
            }
        }
        debug!("installed link {} ({}) between {} and {}", link.index, link.class, link.a, link.b);
    }

    info!(
        "Installed {} nodes and {} links on the substrate",
        topology.node_count(),
        topology.link_count()
    );
    Ok(())
}

pub fn install_sinks<S: Substrate + ?Sized>(sinks: &[Sink], substrate: &mut S) -> Result<(), SubstrateError> {
    for sink in sinks {
        substrate.install_sink(sink)?;
    }
    debug!("installed {} sinks", sinks.len());
    Ok(())
}

/// Install every flow and schedule its start and stop.
///
/// Flows toward a node without a primary address cannot be addressed and are
/// skipped with a warning.
pub fn install_flows<W, K>(
    flows: &[Flow],
    topology: &Topology,
    port: u16,
    world: &mut W,
    kernel: &mut K,
) -> Result<Vec<InstalledFlow>, SubstrateError>
where
    W: SubstrateWorld + 'static,
    K: Kernel<W> + ?Sized,
{
    let mut installed = Vec::with_capacity(flows.len());

    for flow in flows {
        let Some(address) = topology.primary_address(flow.destination) else {
            warn!(
                "Skipping flow {} -> {} in interval {}: destination has no address",
                flow.source, flow.destination, flow.interval
            );
            continue;
        };
        let destination = SocketAddrV4::new(address, port);
        let id = world.substrate_mut().install_flow(flow, destination)?;

        kernel.schedule(
            flow.start,
            Box::new(move |world: &mut W, _: SimTime| world.substrate_mut().start_flow(id)),
        );
        kernel.schedule(
            flow.stop,
            Box::new(move |world: &mut W, _: SimTime| world.substrate_mut().stop_flow(id)),
        );

        installed.push(InstalledFlow {
            id,
            source: flow.source,
            destination,
            start: flow.start,
            stop: flow.stop,
        });
    }

    let skipped = flows.len() - installed.len();
    if skipped > 0 {
        warn!("{} of {} flows were skipped", skipped, flows.len());
    }
    info!("Installed {} flows", installed.len());
    Ok(installed)
}
