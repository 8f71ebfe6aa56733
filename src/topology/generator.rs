//! Topology generator plugin contracts.
//!
//! The internal generator receives the flat list of internal address pairs.
//! The external generator receives the MAC-keyed external index, the routers
//! the internal generator produced, and a naming cursor that already starts
//! past the internal segment.

use super::graph::TopologyGraph;
use super::types::{NameAllocator, RouterNode, SegmentNodes};
use super::TopologyError;
use crate::address::{AddressPair, ExternalAddressIndex};
use crate::emulation::EmulatedNetwork;
use crate::plugin::{PluginFault, PluginPackage};
use std::collections::BTreeMap;

pub const INTERNAL_NAMESPACE: &str = "internal_network";
pub const EXTERNAL_NAMESPACE: &str = "external_network";

/// Shape an internal generator must have, used in diagnostics
pub const INTERNAL_CONTRACT: &str =
    "create_topo(graph, main_switch, internal_addresses, names) -> (hosts, switches, routers)";

/// Shape an external generator must have, used in diagnostics
pub const EXTERNAL_CONTRACT: &str = "create_topo(graph, main_switch, external_address_index, \
     internal_routers, names) -> (hosts, switches, routers)";

pub trait InternalGenerator {
    fn create_topo(
        &mut self,
        graph: &mut TopologyGraph,
        main_switch: &str,
        addresses: &[AddressPair],
        names: &mut NameAllocator,
    ) -> Result<SegmentNodes, PluginFault>;

    /// Configure the generator's routers once the emulated network is up
    fn configure_routers(
        &self,
        _net: &dyn EmulatedNetwork,
        _routers: &[&RouterNode],
    ) -> Result<(), PluginFault> {
        Ok(())
    }
}

pub trait ExternalGenerator {
    fn create_topo(
        &mut self,
        graph: &mut TopologyGraph,
        main_switch: &str,
        addresses: &ExternalAddressIndex,
        internal_routers: &BTreeMap<String, RouterNode>,
        names: &mut NameAllocator,
    ) -> Result<SegmentNodes, PluginFault>;

    /// Configure the generator's routers once the emulated network is up
    fn configure_routers(
        &self,
        _net: &dyn EmulatedNetwork,
        _routers: &[&RouterNode],
        _internal_routers: &BTreeMap<String, RouterNode>,
    ) -> Result<(), PluginFault> {
        Ok(())
    }
}

pub type InternalPackage = PluginPackage<dyn InternalGenerator>;
pub type ExternalPackage = PluginPackage<dyn ExternalGenerator>;

/// Graph errors inside a generator mean it did not follow the naming rules
impl From<TopologyError> for PluginFault {
    fn from(err: TopologyError) -> Self {
        PluginFault::Contract(err.to_string())
    }
}
