//! Per-segment node registry.
//!
//! Tracks the hosts, switches and routers a generator plugin produced so
//! later phases can address them by role. Registries are filled once by the
//! builder and only read afterwards.

use super::types::{HostNode, RouterNode, Segment, SegmentNodes, SwitchNode};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub struct NodeRegistry {
    segment: Segment,
    /// Host name -> host
    hosts: BTreeMap<String, HostNode>,
    /// Host name -> switch the host is attached to
    switches: BTreeMap<String, SwitchNode>,
    /// Router id -> router
    routers: BTreeMap<String, RouterNode>,
}

impl NodeRegistry {
    pub fn new(segment: Segment) -> Self {
        NodeRegistry {
            segment,
            hosts: BTreeMap::new(),
            switches: BTreeMap::new(),
            routers: BTreeMap::new(),
        }
    }

    pub fn from_nodes(segment: Segment, nodes: SegmentNodes) -> Self {
        let mut registry = Self::new(segment);
        for host in nodes.hosts {
            registry.hosts.insert(host.name.clone(), host);
        }
        registry.switches = nodes.switches;
        registry.routers = nodes.routers;
        registry
    }

    pub fn host(&self, name: &str) -> Option<&HostNode> {
        self.hosts.get(name)
    }

    /// Switch attached to the given host
    pub fn switch_for_host(&self, host_name: &str) -> Option<&SwitchNode> {
        self.switches.get(host_name)
    }

    pub fn router(&self, id: &str) -> Option<&RouterNode> {
        self.routers.get(id)
    }

    /// Hosts ordered by their position on the naming axis
    pub fn hosts(&self) -> Vec<&HostNode> {
        let mut hosts: Vec<&HostNode> = self.hosts.values().collect();
        hosts.sort_by_key(|h| h.index);
        hosts
    }

    pub fn host_names(&self) -> Vec<String> {
        self.hosts().into_iter().map(|h| h.name.clone()).collect()
    }

    /// Distinct switch names, ordered by switch index
    pub fn switch_names(&self) -> Vec<String> {
        let unique: BTreeSet<(usize, &str)> = self
            .switches
            .values()
            .map(|s| (s.index, s.name.as_str()))
            .collect();
        unique.into_iter().map(|(_, name)| name.to_string()).collect()
    }

    pub fn router_names(&self) -> Vec<String> {
        self.routers.values().map(|r| r.name.clone()).collect()
    }

    pub fn routers(&self) -> &BTreeMap<String, RouterNode> {
        &self.routers
    }

    pub fn host_switches(&self) -> &BTreeMap<String, SwitchNode> {
        &self.switches
    }

    /// Host name -> numeric index of the attached switch
    pub fn switch_index_by_host(&self) -> BTreeMap<String, usize> {
        self.switches
            .iter()
            .map(|(host, switch)| (host.clone(), switch.index))
            .collect()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Number of host -> switch entries; this is what the naming offset of
    /// the next segment is derived from
    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }

    pub fn router_count(&self) -> usize {
        self.routers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty() && self.switches.is_empty() && self.routers.is_empty()
    }

    /// Log the registry contents at info level
    pub fn log_summary(&self, generator: &str) {
        log::info!(
            "{} generated the {} network with {} hosts, {} switches, {} routers",
            generator,
            self.segment,
            self.host_count(),
            self.switch_count(),
            self.router_count()
        );
        log::info!("HOSTS: {:?}", self.host_names());
        log::info!("SWITCHES: {:?}", self.switch_names());
        log::info!("ROUTERS: {:?}", self.routers.keys().collect::<Vec<_>>());
    }
}
