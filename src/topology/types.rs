//! Topology type definitions.
//!
//! Nodes produced by the generator plugins, the shared naming cursor and the
//! per-phase result a generator hands back to the builder.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Name of the framework-owned switch that joins both segments
pub const MAIN_SWITCH: &str = "c0";

/// Network segment a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Internal,
    External,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Internal => "internal",
            Segment::External => "external",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a node in the topology graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Host,
    Switch,
    Router,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeRole::Host => "host",
            NodeRole::Switch => "switch",
            NodeRole::Router => "router",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostNode {
    pub name: String,
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    pub ips: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_route: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchNode {
    pub name: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterNode {
    pub name: String,
    pub id: String,
    pub ips: Vec<String>,
}

/// A host, switch or router created by a generator plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum TopologyNode {
    Host(HostNode),
    Switch(SwitchNode),
    Router(RouterNode),
}

impl TopologyNode {
    pub fn name(&self) -> &str {
        match self {
            TopologyNode::Host(h) => &h.name,
            TopologyNode::Switch(s) => &s.name,
            TopologyNode::Router(r) => &r.name,
        }
    }

    pub fn role(&self) -> NodeRole {
        match self {
            TopologyNode::Host(_) => NodeRole::Host,
            TopologyNode::Switch(_) => NodeRole::Switch,
            TopologyNode::Router(_) => NodeRole::Router,
        }
    }

    /// Position on the shared host/switch naming axis; routers have none
    pub fn index(&self) -> Option<usize> {
        match self {
            TopologyNode::Host(h) => Some(h.index),
            TopologyNode::Switch(s) => Some(s.index),
            TopologyNode::Router(_) => None,
        }
    }
}

impl fmt::Display for TopologyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Host name for a slot on the shared naming axis
pub fn host_name(index: usize) -> String {
    format!("h{}", index)
}

/// Switch name for a slot on the shared naming axis
pub fn switch_name(index: usize) -> String {
    format!("s{}", index)
}

/// Cursor over the integer sequence shared by hosts and switches.
///
/// Every slot yields one host name and one switch name with the same index,
/// so a host and the switch it hangs off line up numerically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAllocator {
    start: usize,
    next: usize,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(offset: usize) -> Self {
        Self {
            start: offset,
            next: offset,
        }
    }

    /// Claim the next slot index
    pub fn allocate(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }

    /// The first index this allocator handed out (or will hand out)
    pub fn start(&self) -> usize {
        self.start
    }

    /// The index the next call to [`allocate`](Self::allocate) returns
    pub fn peek(&self) -> usize {
        self.next
    }

    /// Number of slots claimed so far
    pub fn allocated(&self) -> usize {
        self.next - self.start
    }
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// What a generator plugin reports back for its segment.
///
/// `switches` is keyed by host name and holds the switch that host is
/// attached to; `routers` is keyed by the generator's own router id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentNodes {
    pub hosts: Vec<HostNode>,
    pub switches: BTreeMap<String, SwitchNode>,
    pub routers: BTreeMap<String, RouterNode>,
}
