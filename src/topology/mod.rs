//! Network topology construction.
//!
//! This module contains the node model, the graph handed to the emulation
//! engine, the per-segment registries and the builder that drives the
//! internal and external generator plugins.

pub mod builder;
pub mod builtin;
pub mod generator;
pub mod graph;
pub mod plan;
pub mod registry;
pub mod types;

// Re-export key types and functions for easier access
pub use builder::{BuiltTopology, TopologyBuilder};
pub use generator::{ExternalGenerator, ExternalPackage, InternalGenerator, InternalPackage};
pub use graph::{Link, TopologyGraph};
pub use plan::write_plan;
pub use registry::NodeRegistry;
pub use types::{
    HostNode, NameAllocator, NodeRole, RouterNode, Segment, SegmentNodes, SwitchNode,
    TopologyNode, MAIN_SWITCH,
};

use crate::plugin::PluginError;

/// Errors raised while building the topology
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("Node '{0}' already exists in the topology")]
    DuplicateNode(String),
    #[error("Node '{0}' does not exist in the topology")]
    UnknownNode(String),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error("{plugin} failed while handling the {segment} network: {reason}")]
    GeneratorFailed {
        plugin: String,
        segment: Segment,
        reason: String,
    },
}
