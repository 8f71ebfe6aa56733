//! Two-phase topology construction.
//!
//! The internal phase runs first and starts naming at 0. The external phase
//! continues the shared host/switch sequence at an offset equal to the size
//! of the internal switch registry, which is 0 when the internal phase
//! degraded.
//!
//! A generator that violates its contract (reports a contract fault, or
//! hands back nodes that do not match the graph) is logged and its segment
//! is left empty; the nodes it added to the graph are rolled back. Runtime
//! faults from a generator abort the build.

use super::generator::{
    ExternalGenerator, ExternalPackage, InternalGenerator, InternalPackage, EXTERNAL_CONTRACT,
    INTERNAL_CONTRACT,
};
use super::graph::TopologyGraph;
use super::registry::NodeRegistry;
use super::types::{NameAllocator, NodeRole, Segment, SegmentNodes, SwitchNode, MAIN_SWITCH};
use super::TopologyError;
use crate::address::{AddressPair, ExternalAddressIndex};
use crate::emulation::EmulatedNetwork;
use crate::plugin::PluginFault;
use std::fmt;

/// An instantiated generator together with its resolved entry point name
pub struct Generator<T: ?Sized> {
    pub name: String,
    pub plugin: Box<T>,
}

impl<T: ?Sized> fmt::Debug for Generator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Result of both build phases
#[derive(Debug)]
pub struct BuiltTopology {
    pub graph: TopologyGraph,
    pub main_switch: String,
    pub internal: NodeRegistry,
    pub external: NodeRegistry,
    /// First index of the external segment on the shared naming axis
    pub offset: usize,
    pub internal_generator: Generator<dyn InternalGenerator>,
    pub external_generator: Generator<dyn ExternalGenerator>,
}

impl BuiltTopology {
    /// Names of every host and router, i.e. every node that runs commands
    pub fn endpoint_names(&self) -> Vec<String> {
        let mut names = self.internal.host_names();
        names.extend(self.external.host_names());
        names.extend(self.internal.router_names());
        names.extend(self.external.router_names());
        names
    }

    /// Let both generators configure their routers on the running network.
    ///
    /// Contract faults are logged and skipped; runtime faults are returned.
    pub fn configure_routers(&self, net: &dyn EmulatedNetwork) -> Result<(), TopologyError> {
        let int_routers: Vec<_> = self.internal.routers().values().collect();
        let result = self
            .internal_generator
            .plugin
            .configure_routers(net, &int_routers);
        check_configure(&self.internal_generator.name, Segment::Internal, result)?;

        let ext_routers: Vec<_> = self.external.routers().values().collect();
        let result = self.external_generator.plugin.configure_routers(
            net,
            &ext_routers,
            self.internal.routers(),
        );
        check_configure(&self.external_generator.name, Segment::External, result)
    }
}

fn check_configure(
    plugin: &str,
    segment: Segment,
    result: Result<(), PluginFault>,
) -> Result<(), TopologyError> {
    match result {
        Ok(()) => Ok(()),
        Err(PluginFault::Contract(reason)) => {
            log::error!("{} could not configure {} routers: {}", plugin, segment, reason);
            Ok(())
        }
        Err(PluginFault::Runtime(reason)) => Err(TopologyError::GeneratorFailed {
            plugin: plugin.to_string(),
            segment,
            reason,
        }),
    }
}

pub struct TopologyBuilder<'a> {
    internal: &'a InternalPackage,
    external: &'a ExternalPackage,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(internal: &'a InternalPackage, external: &'a ExternalPackage) -> Self {
        Self { internal, external }
    }

    /// Run the internal and then the external phase.
    ///
    /// Fails if a configured module cannot be resolved or a generator
    /// reports a runtime fault.
    pub fn build(
        &self,
        internal_module: &str,
        external_module: &str,
        internal_addresses: &[AddressPair],
        external_index: &ExternalAddressIndex,
    ) -> Result<BuiltTopology, TopologyError> {
        let mut graph = TopologyGraph::new();
        graph.add_switch(SwitchNode {
            name: MAIN_SWITCH.to_string(),
            index: 0,
        })?;

        log::info!("Int net length: {}", internal_addresses.len());
        log::info!("Ext net length: {}", external_index.len());

        // Internal phase
        let entry = self.internal.resolve(internal_module)?;
        let mut internal_generator = Generator {
            name: entry.name.clone(),
            plugin: entry.instantiate(),
        };
        let mut names = NameAllocator::new();
        let snapshot = graph.clone();
        let result = internal_generator.plugin.create_topo(
            &mut graph,
            MAIN_SWITCH,
            internal_addresses,
            &mut names,
        );
        let internal = settle_phase(
            &internal_generator.name,
            Segment::Internal,
            INTERNAL_CONTRACT,
            result,
            &mut graph,
            snapshot,
            &names,
        )?;

        // External phase
        let offset = internal.switch_count();
        if names.allocated() != offset {
            log::warn!(
                "{} claimed {} naming slots but registered {} switches; external naming continues at {}",
                internal_generator.name,
                names.allocated(),
                offset,
                offset
            );
        }

        let entry = self.external.resolve(external_module)?;
        let mut external_generator = Generator {
            name: entry.name.clone(),
            plugin: entry.instantiate(),
        };
        let mut names = NameAllocator::starting_at(offset);
        let snapshot = graph.clone();
        let result = external_generator.plugin.create_topo(
            &mut graph,
            MAIN_SWITCH,
            external_index,
            internal.routers(),
            &mut names,
        );
        let external = settle_phase(
            &external_generator.name,
            Segment::External,
            EXTERNAL_CONTRACT,
            result,
            &mut graph,
            snapshot,
            &names,
        )?;

        log::info!(
            "Topology has {} hosts, {} switches, {} routers and {} links",
            graph.count(NodeRole::Host),
            graph.count(NodeRole::Switch),
            graph.count(NodeRole::Router),
            graph.links().len()
        );

        Ok(BuiltTopology {
            graph,
            main_switch: MAIN_SWITCH.to_string(),
            internal,
            external,
            offset,
            internal_generator,
            external_generator,
        })
    }
}

/// Turn a generator result into a registry, degrading on contract problems
fn settle_phase(
    plugin: &str,
    segment: Segment,
    contract: &str,
    result: Result<SegmentNodes, PluginFault>,
    graph: &mut TopologyGraph,
    snapshot: TopologyGraph,
    names: &NameAllocator,
) -> Result<NodeRegistry, TopologyError> {
    let violation = match result {
        Ok(nodes) => match check_contract(graph, &nodes, names) {
            Ok(()) => {
                let registry = NodeRegistry::from_nodes(segment, nodes);
                registry.log_summary(plugin);
                return Ok(registry);
            }
            Err(reason) => reason,
        },
        Err(PluginFault::Contract(reason)) => reason,
        Err(PluginFault::Runtime(reason)) => {
            log::error!("{} failed while generating the {} network", plugin, segment);
            return Err(TopologyError::GeneratorFailed {
                plugin: plugin.to_string(),
                segment,
                reason,
            });
        }
    };

    log::error!("{}: {}", plugin, violation);
    log::error!("{} must have {} method", plugin, contract);
    log::warn!("Continuing with an empty {} network", segment);
    *graph = snapshot;
    Ok(NodeRegistry::new(segment))
}

/// Check that reported nodes exist in the graph and follow the naming rules
fn check_contract(
    graph: &TopologyGraph,
    nodes: &SegmentNodes,
    names: &NameAllocator,
) -> Result<(), String> {
    for host in &nodes.hosts {
        if !graph.has_node(&host.name, NodeRole::Host) {
            return Err(format!("host '{}' was reported but never added", host.name));
        }
        if host.index < names.start() || host.index >= names.peek() {
            return Err(format!(
                "host '{}' uses index {} outside of its allocated range {}..{}",
                host.name,
                host.index,
                names.start(),
                names.peek()
            ));
        }
        if !nodes.switches.contains_key(&host.name) {
            return Err(format!("host '{}' has no attached switch", host.name));
        }
    }

    for (host_name, switch) in &nodes.switches {
        if !nodes.hosts.iter().any(|h| &h.name == host_name) {
            return Err(format!(
                "switch '{}' is keyed by unknown host '{}'",
                switch.name, host_name
            ));
        }
        if !graph.has_node(&switch.name, NodeRole::Switch) {
            return Err(format!("switch '{}' was reported but never added", switch.name));
        }
    }

    for (id, router) in &nodes.routers {
        if !graph.has_node(&router.name, NodeRole::Router) {
            return Err(format!(
                "router '{}' ({}) was reported but never added",
                router.name, id
            ));
        }
    }

    Ok(())
}
