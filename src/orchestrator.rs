//! Testbed run orchestration.
//!
//! Coordinates a complete run: address classification, topology
//! construction, the plan handed to the emulation engine, and then
//! everything that needs the live network (router setup, inventories,
//! servers, test cases, traffic).

use crate::address::{aggregate_by_mac, partition, read_records_file};
use crate::config::{Config, GeneratorSelection};
use crate::emulation::{start_http_servers, wait_until_ready, EmulatedNetwork};
use crate::inventory::InventoryLogger;
use crate::plugin::PluginError;
use crate::testcase::{self, NodeInventory, RunReport, TestCasePackage, TestContext, TestOrchestrator};
use crate::topology::{self, write_plan, BuiltTopology, ExternalPackage, InternalPackage, TopologyBuilder};
use crate::traffic;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Every plugin package known to a run
pub struct Plugins {
    pub internal: InternalPackage,
    pub external: ExternalPackage,
    pub test_cases: TestCasePackage,
}

impl Plugins {
    /// Packages holding the plugins shipped with the crate
    pub fn builtin() -> Result<Self, PluginError> {
        Ok(Self {
            internal: topology::builtin::internal_package()?,
            external: topology::builtin::external_package()?,
            test_cases: testcase::builtin::test_case_package()?,
        })
    }

    /// Fail fast when a configured generator is not registered
    pub fn validate(&self, generators: &GeneratorSelection) -> Result<(), PluginError> {
        self.internal.ensure_registered(&generators.internal)?;
        self.external.ensure_registered(&generators.external)?;
        Ok(())
    }
}

/// Per-run switches, usually coming from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides `files.mac-ip`
    pub mac_ip: Option<PathBuf>,
    pub exec_tests: bool,
    /// Requested test case triggers
    pub tests: BTreeSet<String>,
    pub start_servers: bool,
    pub traffic: bool,
    /// Stop after writing the topology plan
    pub plan_only: bool,
}

/// What a run produced
#[derive(Debug, Default)]
pub struct RunSummary {
    pub plan_path: PathBuf,
    pub offset: usize,
    pub targets: Vec<String>,
    pub attackers: Vec<String>,
    pub report: Option<RunReport>,
}

/// Classify the configured MAC/IP records and build both segments
pub fn build_topology(
    config: &Config,
    plugins: &Plugins,
    mac_ip_override: Option<&PathBuf>,
) -> Result<BuiltTopology> {
    let generators = config.generators()?;
    plugins.validate(&generators)?;

    let mac_ip = mac_ip_override.unwrap_or(&config.files.mac_ip);
    let records = read_records_file(mac_ip)?;

    let pattern = config.internal_pattern()?;
    let addresses = partition(&records, &pattern);
    let external_index = aggregate_by_mac(&addresses.external);

    let built = TopologyBuilder::new(&plugins.internal, &plugins.external)
        .build(
            &generators.internal,
            &generators.external,
            &addresses.internal,
            &external_index,
        )
        .wrap_err("Failed to build the test network topology")?;
    Ok(built)
}

/// Execute a complete testbed run.
///
/// `connect` attaches to the emulated network once the plan is written; it
/// receives the built topology so it knows which nodes to expect.
pub fn run<N, F>(
    config: &Config,
    plugins: &Plugins,
    options: &RunOptions,
    connect: F,
) -> Result<RunSummary>
where
    N: EmulatedNetwork,
    F: FnOnce(&BuiltTopology) -> Result<N>,
{
    let built = build_topology(config, plugins, options.mac_ip.as_ref())?;

    let plan_path = config.files.topology_plan.clone();
    write_plan(&built, &plan_path)?;

    let mut summary = RunSummary {
        plan_path,
        offset: built.offset,
        ..Default::default()
    };
    if options.plan_only {
        info!("Plan only run, not attaching to the emulated network");
        return Ok(summary);
    }

    let net = connect(&built).wrap_err("Failed to attach to the emulated network")?;
    wait_until_ready(&net, config.readiness_timeout()?, config.poll_interval()?)?;

    built
        .configure_routers(&net)
        .wrap_err("Failed to configure routers")?;

    let inventory = InventoryLogger::new(&config.files.target_hosts, &config.files.attack_hosts);
    summary.targets = inventory
        .log_internal(&net, built.internal.host_count(), &built.internal.switch_index_by_host())
        .wrap_err("Failed to log target hosts")?;
    summary.attackers = inventory
        .log_external(&net, built.offset, built.external.host_count())
        .wrap_err("Failed to log attack hosts")?;

    let nodes = NodeInventory::from_topology(&built);

    if options.start_servers {
        let directory = config.servers.directory.to_string_lossy();
        start_http_servers(&net, &nodes.ext_hosts, &directory, config.servers.port)
            .wrap_err("Failed to start HTTP servers")?;
    }

    if options.exec_tests {
        if options.tests.is_empty() {
            warn!("Test execution requested without any test triggers");
        }
        info!("Executing test cases");
        let ctx = TestContext {
            net: &net,
            targets: &summary.targets,
            nodes: &nodes,
            traffic: &config.traffic,
        };
        let orchestrator =
            TestOrchestrator::new(&plugins.test_cases, config.testing.exclude.iter().cloned());
        let report = orchestrator.run(&options.tests, &ctx);
        let failures = report.failures().count();
        if failures > 0 {
            warn!("{} test cases did not pass", failures);
        }
        summary.report = Some(report);
    }

    if options.traffic {
        let pairs = summary.targets.len().min(nodes.ext_hosts.len());
        for target in &summary.targets[pairs..] {
            warn!("No attack host left to generate traffic against {}", target);
        }
        traffic::generate(
            &net,
            &nodes.ext_hosts[..pairs],
            &summary.targets[..pairs],
            config.traffic.port,
            &config.traffic.resource,
        )
        .wrap_err("Failed to generate traffic")?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulation::fake::FakeNetwork;
    use crate::traffic::load_command;
    use std::cell::OnceCell;
    use std::fs;
    use tempfile::tempdir;

    const MAC_IP: &str = "\
aa:bb:cc:dd:ee:01 192.168.0.10
aa:bb:cc:dd:ee:02 192.168.0.11
aa:bb:cc:dd:ee:03 8.8.8.8
";

    fn config_in(dir: &std::path::Path) -> Config {
        let yaml = format!(
            r#"
network:
  ids-test-topo:
    internal-network: star
    external-network: flat
files:
  mac-ip: {dir}/mac_ip.txt
  target-hosts: {dir}/target_hosts.txt
  attack-hosts: {dir}/attack_hosts.txt
  topology-plan: {dir}/plan/topology.json
testing:
  readiness-timeout: 1s
  poll-interval: 1ms
"#,
            dir = dir.display()
        );
        fs::write(dir.join("mac_ip.txt"), MAC_IP).unwrap();
        serde_yaml::from_str(&yaml).unwrap()
    }

    #[test]
    fn test_unknown_generator_fails_before_reading_input() {
        let dir = tempdir().unwrap();
        let mut config = config_in(dir.path());
        config
            .network
            .get_mut(crate::config::FRAMEWORK_NAME)
            .unwrap()
            .external_network = Some("mesh".to_string());
        fs::remove_file(dir.path().join("mac_ip.txt")).unwrap();

        let plugins = Plugins::builtin().unwrap();
        let err = build_topology(&config, &plugins, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PluginError>(),
            Some(PluginError::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn test_plan_only_skips_emulation() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let plugins = Plugins::builtin().unwrap();
        let options = RunOptions {
            plan_only: true,
            ..Default::default()
        };

        let summary = run(&config, &plugins, &options, |_| -> Result<FakeNetwork> {
            panic!("plan only run must not connect")
        })
        .unwrap();

        assert!(summary.plan_path.exists());
        assert_eq!(summary.offset, 2);
        assert!(summary.targets.is_empty());
        assert!(!dir.path().join("target_hosts.txt").exists());
    }

    fn fake_network(built: &BuiltTopology) -> FakeNetwork {
        let hosts: Vec<(String, &str)> = built
            .endpoint_names()
            .into_iter()
            .map(|name| {
                let ip = match name.as_str() {
                    "h0" => "192.168.0.10",
                    "h1" => "192.168.0.11",
                    "h2" => "8.8.8.8",
                    _ => "10.255.0.1",
                };
                (name, ip)
            })
            .collect();
        let refs: Vec<(&str, &str)> = hosts.iter().map(|(h, ip)| (h.as_str(), *ip)).collect();
        FakeNetwork::with_hosts(&refs)
    }

    #[test]
    fn test_traffic_with_more_targets_than_attackers() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let plugins = Plugins::builtin().unwrap();
        let options = RunOptions {
            traffic: true,
            ..Default::default()
        };
        let net = OnceCell::new();

        let summary =
            run(&config, &plugins, &options, |built| Ok(net.get_or_init(|| fake_network(built)))).unwrap();

        assert_eq!(summary.targets, vec!["192.168.0.10", "192.168.0.11"]);
        assert_eq!(summary.attackers, vec!["8.8.8.8"]);
        let net = net.get().unwrap();
        let load: Vec<String> = net
            .commands_for("h2")
            .into_iter()
            .filter(|c| c.starts_with("ab "))
            .collect();
        assert_eq!(load, vec![load_command("192.168.0.10", 8000, "index.html")]);
    }

    #[test]
    fn test_full_run_with_fake_network() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let plugins = Plugins::builtin().unwrap();
        let options = RunOptions {
            exec_tests: true,
            tests: ["ping".to_string()].into_iter().collect(),
            ..Default::default()
        };

        let summary = run(&config, &plugins, &options, |built| Ok(fake_network(built))).unwrap();

        assert_eq!(summary.targets, vec!["192.168.0.10", "192.168.0.11"]);
        assert_eq!(summary.attackers, vec!["8.8.8.8"]);
        let report = summary.report.unwrap();
        assert_eq!(report.executed_modules(), vec!["ping_sweep"]);
        assert!(report.all_passed());

        let targets = fs::read_to_string(dir.path().join("target_hosts.txt")).unwrap();
        assert_eq!(targets, "0_0_192.168.0.10\n1_1_192.168.0.11\n");
        let attackers = fs::read_to_string(dir.path().join("attack_hosts.txt")).unwrap();
        assert_eq!(attackers, "8.8.8.8\n");
    }
}
