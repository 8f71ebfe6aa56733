//! Reference topology generators.
//!
//! * `star` (internal): one access switch per address pair, every access
//!   switch uplinked to the main switch, plus a gateway router owning the
//!   `.254` address of every internal /24.
//! * `flat` (external): one host per MAC carrying all of that MAC's IPs,
//!   each behind its own switch, plus an edge router that routes back to the
//!   internal gateways.

use super::generator::{ExternalGenerator, ExternalPackage, InternalGenerator, InternalPackage};
use super::graph::TopologyGraph;
use super::types::{host_name, switch_name, HostNode, NameAllocator, RouterNode, SegmentNodes, SwitchNode};
use crate::address::{AddressPair, ExternalAddressIndex};
use crate::emulation::EmulatedNetwork;
use crate::plugin::{PluginError, PluginFault, PluginModule};
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

const INTERNAL_ROUTER_ID: &str = "int-gw";
const EXTERNAL_ROUTER_ID: &str = "ext-edge";

/// Gateway address (`.254`) of the /24 an address lives in
fn gateway_for(ip: &str) -> Option<String> {
    let addr: Ipv4Addr = ip.parse().ok()?;
    let [a, b, c, _] = addr.octets();
    Some(format!("{}.{}.{}.254", a, b, c))
}

/// The /24 network an address lives in
fn subnet_of(ip: &str) -> Option<String> {
    let addr: Ipv4Addr = ip.parse().ok()?;
    let [a, b, c, _] = addr.octets();
    Some(format!("{}.{}.{}.0/24", a, b, c))
}

/// Add a host behind its own switch, uplinked to the main switch
fn add_access_host(
    graph: &mut TopologyGraph,
    main_switch: &str,
    names: &mut NameAllocator,
    mac: &str,
    ips: Vec<String>,
    nodes: &mut SegmentNodes,
) -> Result<(), PluginFault> {
    let index = names.allocate();
    let default_route = ips.first().and_then(|ip| gateway_for(ip));

    let switch = graph.add_switch(SwitchNode {
        name: switch_name(index),
        index,
    })?;
    let host = graph.add_host(HostNode {
        name: host_name(index),
        index,
        mac: Some(mac.to_string()),
        ips,
        default_route,
    })?;

    graph.add_link(&host.name, &switch.name)?;
    graph.add_link(&switch.name, main_switch)?;

    nodes.switches.insert(host.name.clone(), switch);
    nodes.hosts.push(host);
    Ok(())
}

fn enable_forwarding(net: &dyn EmulatedNetwork, router: &RouterNode) -> Result<(), PluginFault> {
    net.cmd(&router.name, "sysctl -w net.ipv4.ip_forward=1")
        .map_err(|e| PluginFault::runtime(e.to_string()))?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct StarTopology;

impl InternalGenerator for StarTopology {
    fn create_topo(
        &mut self,
        graph: &mut TopologyGraph,
        main_switch: &str,
        addresses: &[AddressPair],
        names: &mut NameAllocator,
    ) -> Result<SegmentNodes, PluginFault> {
        let mut nodes = SegmentNodes::default();
        let mut ordered: Vec<&AddressPair> = addresses.iter().collect();
        ordered.sort();

        for pair in ordered {
            add_access_host(graph, main_switch, names, &pair.mac, vec![pair.ip.clone()], &mut nodes)?;
        }

        let gateways: BTreeSet<String> = addresses.iter().filter_map(|p| gateway_for(&p.ip)).collect();
        if !gateways.is_empty() {
            let router = graph.add_router(RouterNode {
                name: "r0".to_string(),
                id: INTERNAL_ROUTER_ID.to_string(),
                ips: gateways.into_iter().collect(),
            })?;
            graph.add_link(&router.name, main_switch)?;
            nodes.routers.insert(INTERNAL_ROUTER_ID.to_string(), router);
        }

        Ok(nodes)
    }

    fn configure_routers(
        &self,
        net: &dyn EmulatedNetwork,
        routers: &[&RouterNode],
    ) -> Result<(), PluginFault> {
        for router in routers {
            enable_forwarding(net, router)?;
            log::info!("Configured internal router {}", router.name);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FlatTopology;

impl ExternalGenerator for FlatTopology {
    fn create_topo(
        &mut self,
        graph: &mut TopologyGraph,
        main_switch: &str,
        addresses: &ExternalAddressIndex,
        internal_routers: &BTreeMap<String, RouterNode>,
        names: &mut NameAllocator,
    ) -> Result<SegmentNodes, PluginFault> {
        let mut nodes = SegmentNodes::default();

        for (mac, ips) in addresses {
            add_access_host(graph, main_switch, names, mac, ips.iter().cloned().collect(), &mut nodes)?;
        }

        if !addresses.is_empty() {
            let gateways: BTreeSet<String> = addresses
                .values()
                .flatten()
                .filter_map(|ip| gateway_for(ip))
                .collect();
            let router = graph.add_router(RouterNode {
                name: format!("r{}", internal_routers.len()),
                id: EXTERNAL_ROUTER_ID.to_string(),
                ips: gateways.into_iter().collect(),
            })?;
            graph.add_link(&router.name, main_switch)?;
            nodes.routers.insert(EXTERNAL_ROUTER_ID.to_string(), router);
        }

        Ok(nodes)
    }

    fn configure_routers(
        &self,
        net: &dyn EmulatedNetwork,
        routers: &[&RouterNode],
        internal_routers: &BTreeMap<String, RouterNode>,
    ) -> Result<(), PluginFault> {
        for router in routers {
            enable_forwarding(net, router)?;
            for gateway in internal_routers.values().flat_map(|r| r.ips.iter()) {
                if let Some(subnet) = subnet_of(gateway) {
                    let command = format!("ip route replace {} via {}", subnet, gateway);
                    net.cmd(&router.name, &command)
                        .map_err(|e| PluginFault::runtime(e.to_string()))?;
                }
            }
            log::info!("Configured external router {}", router.name);
        }
        Ok(())
    }
}

/// Package with the reference internal generators
pub fn internal_package() -> Result<InternalPackage, PluginError> {
    let mut package = InternalPackage::new(super::generator::INTERNAL_NAMESPACE);
    package.register(
        PluginModule::<dyn InternalGenerator>::new("star")
            .with_entry_point("StarTopology", || Box::new(StarTopology)),
    )?;
    Ok(package)
}

/// Package with the reference external generators
pub fn external_package() -> Result<ExternalPackage, PluginError> {
    let mut package = ExternalPackage::new(super::generator::EXTERNAL_NAMESPACE);
    package.register(
        PluginModule::<dyn ExternalGenerator>::new("flat")
            .with_entry_point("FlatTopology", || Box::new(FlatTopology)),
    )?;
    Ok(package)
}
