//! Topology plan export.
//!
//! The emulation engine instantiates the network from a JSON plan written
//! here: the full node/link graph plus the role registries of both segments.

use super::builder::BuiltTopology;
use super::graph::TopologyGraph;
use super::registry::NodeRegistry;
use super::types::{HostNode, RouterNode, SwitchNode};
use color_eyre::eyre::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize, Debug)]
pub struct SegmentPlan<'a> {
    pub generator: &'a str,
    pub hosts: Vec<&'a HostNode>,
    pub switches: &'a BTreeMap<String, SwitchNode>,
    pub routers: &'a BTreeMap<String, RouterNode>,
}

impl<'a> SegmentPlan<'a> {
    fn new(generator: &'a str, registry: &'a NodeRegistry) -> Self {
        Self {
            generator,
            hosts: registry.hosts(),
            switches: registry.host_switches(),
            routers: registry.routers(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct TopologyPlan<'a> {
    pub main_switch: &'a str,
    pub offset: usize,
    pub graph: &'a TopologyGraph,
    pub internal: SegmentPlan<'a>,
    pub external: SegmentPlan<'a>,
}

impl<'a> TopologyPlan<'a> {
    pub fn new(built: &'a BuiltTopology) -> Self {
        Self {
            main_switch: &built.main_switch,
            offset: built.offset,
            graph: &built.graph,
            internal: SegmentPlan::new(&built.internal_generator.name, &built.internal),
            external: SegmentPlan::new(&built.external_generator.name, &built.external),
        }
    }
}

/// Write the topology plan as pretty-printed JSON, replacing any previous plan
pub fn write_plan(built: &BuiltTopology, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).wrap_err_with(|| {
                format!("Failed to create plan directory '{}'", parent.display())
            })?;
        }
    }

    let file = File::create(path)
        .wrap_err_with(|| format!("Failed to create topology plan '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &TopologyPlan::new(built))
        .wrap_err("Failed to serialize topology plan")?;
    writer.flush()?;

    log::info!("Wrote topology plan to {:?}", path);
    Ok(())
}
