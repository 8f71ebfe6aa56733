//! Test-case plugins.
//!
//! A test case declares a trigger identifier and runs against the live
//! network with the full node inventory and the list of target addresses.
//! Test cases are instantiated once per invocation and keep no state
//! between runs.

pub mod builtin;
pub mod orchestrator;

pub use orchestrator::{discover_plugins, DiscoveredTestCase, RunReport, TestOrchestrator, TestOutcome};

use crate::config::TrafficConfig;
use crate::emulation::EmulatedNetwork;
use crate::plugin::{PluginFault, PluginPackage};
use crate::topology::BuiltTopology;

pub const TEST_CASE_NAMESPACE: &str = "test_cases";

/// Shape a test case must have, used in diagnostics
pub const TEST_CASE_CONTRACT: &str =
    "run(targets, int_hosts, ext_hosts, int_switches, ext_switches, int_routers, ext_routers)";

/// Node names of both segments, grouped by role
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeInventory {
    pub int_hosts: Vec<String>,
    pub ext_hosts: Vec<String>,
    pub int_switches: Vec<String>,
    pub ext_switches: Vec<String>,
    pub int_routers: Vec<String>,
    pub ext_routers: Vec<String>,
}

impl NodeInventory {
    pub fn from_topology(built: &BuiltTopology) -> Self {
        Self {
            int_hosts: built.internal.host_names(),
            ext_hosts: built.external.host_names(),
            int_switches: built.internal.switch_names(),
            ext_switches: built.external.switch_names(),
            int_routers: built.internal.router_names(),
            ext_routers: built.external.router_names(),
        }
    }
}

/// Everything a test case gets to work with
pub struct TestContext<'a> {
    pub net: &'a dyn EmulatedNetwork,
    pub targets: &'a [String],
    pub nodes: &'a NodeInventory,
    /// Port and resource of the HTTP servers under load
    pub traffic: &'a TrafficConfig,
}

pub trait TestCase {
    /// Identifier matched against the requested test runs
    fn trigger(&self) -> &str;

    fn run(&mut self, ctx: &TestContext<'_>) -> Result<(), PluginFault>;
}

pub type TestCasePackage = PluginPackage<dyn TestCase>;
