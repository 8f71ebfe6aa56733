//! Topology graph handed to the emulation engine.
//!
//! Generator plugins add nodes and links here; node names are unique across
//! the whole graph, regardless of segment.

use super::types::{HostNode, NodeRole, RouterNode, SwitchNode, TopologyNode};
use super::TopologyError;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TopologyGraph {
    nodes: BTreeMap<String, TopologyNode>,
    links: Vec<Link>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, node: TopologyNode) -> Result<(), TopologyError> {
        if self.nodes.contains_key(node.name()) {
            return Err(TopologyError::DuplicateNode(node.name().to_string()));
        }
        log::debug!("Adding {} {}", node.role(), node.name());
        self.nodes.insert(node.name().to_string(), node);
        Ok(())
    }

    pub fn add_host(&mut self, host: HostNode) -> Result<HostNode, TopologyError> {
        self.insert(TopologyNode::Host(host.clone()))?;
        Ok(host)
    }

    pub fn add_switch(&mut self, switch: SwitchNode) -> Result<SwitchNode, TopologyError> {
        self.insert(TopologyNode::Switch(switch.clone()))?;
        Ok(switch)
    }

    pub fn add_router(&mut self, router: RouterNode) -> Result<RouterNode, TopologyError> {
        self.insert(TopologyNode::Router(router.clone()))?;
        Ok(router)
    }

    /// Connect two existing nodes
    pub fn add_link(&mut self, source: &str, target: &str) -> Result<(), TopologyError> {
        for end in [source, target] {
            if !self.nodes.contains_key(end) {
                return Err(TopologyError::UnknownNode(end.to_string()));
            }
        }
        self.links.push(Link {
            source: source.to_string(),
            target: target.to_string(),
        });
        Ok(())
    }

    pub fn node(&self, name: &str) -> Option<&TopologyNode> {
        self.nodes.get(name)
    }

    /// Check that `name` exists and has the given role
    pub fn has_node(&self, name: &str, role: NodeRole) -> bool {
        self.nodes.get(name).map_or(false, |n| n.role() == role)
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Number of nodes with the given role
    pub fn count(&self, role: NodeRole) -> usize {
        self.nodes.values().filter(|n| n.role() == role).count()
    }
}
