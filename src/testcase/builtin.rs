//! Reference test cases.
//!
//! `smoke_test` only checks that every host answers; it is listed in
//! [`DEFAULT_EXCLUDE`] and stays out of regular runs.

use super::{TestCase, TestCasePackage, TestContext};
use crate::plugin::{PluginError, PluginFault, PluginModule};
use crate::traffic;

/// Modules skipped during discovery unless configured otherwise
pub const DEFAULT_EXCLUDE: &[&str] = &["smoke_test"];

/// Every external host pings every target once
#[derive(Debug, Default)]
pub struct PingSweep;

impl TestCase for PingSweep {
    fn trigger(&self) -> &str {
        "ping"
    }

    fn run(&mut self, ctx: &TestContext<'_>) -> Result<(), PluginFault> {
        if ctx.nodes.ext_hosts.is_empty() {
            return Err(PluginFault::contract("ping sweep needs at least one external host"));
        }

        for attacker in &ctx.nodes.ext_hosts {
            for target in ctx.targets {
                let command = format!("ping -c 1 -W 1 {}", target);
                match ctx.net.cmd(attacker, &command) {
                    Ok(_) => log::debug!("{} reached {}", attacker, target),
                    Err(e) => log::warn!("{} could not reach {}: {}", attacker, target, e),
                }
            }
        }
        Ok(())
    }
}

/// External hosts drive HTTP load at the targets, paired positionally
#[derive(Debug, Default)]
pub struct HttpLoad;

impl TestCase for HttpLoad {
    fn trigger(&self) -> &str {
        "http-load"
    }

    fn run(&mut self, ctx: &TestContext<'_>) -> Result<(), PluginFault> {
        let count = ctx.targets.len().min(ctx.nodes.ext_hosts.len());
        traffic::generate(
            ctx.net,
            &ctx.nodes.ext_hosts[..count],
            &ctx.targets[..count],
            ctx.traffic.port,
            &ctx.traffic.resource,
        )
        .map_err(|e| PluginFault::runtime(e.to_string()))
    }
}

/// Checks that every internal and external host reports an address
#[derive(Debug, Default)]
pub struct SmokeTest;

impl TestCase for SmokeTest {
    fn trigger(&self) -> &str {
        "smoke"
    }

    fn run(&mut self, ctx: &TestContext<'_>) -> Result<(), PluginFault> {
        for host in ctx.nodes.int_hosts.iter().chain(&ctx.nodes.ext_hosts) {
            let ip = ctx
                .net
                .host_ip(host)
                .map_err(|e| PluginFault::runtime(e.to_string()))?;
            log::info!("{} is up at {}", host, ip);
        }
        Ok(())
    }
}

/// Package with the reference test cases
pub fn test_case_package() -> Result<TestCasePackage, PluginError> {
    let mut package = TestCasePackage::new(super::TEST_CASE_NAMESPACE);
    package.register(
        PluginModule::<dyn TestCase>::new("ping_sweep")
            .with_tagged_entry_point("PingSweep", "ping", || Box::new(PingSweep)),
    )?;
    package.register(
        PluginModule::<dyn TestCase>::new("http_load")
            .with_tagged_entry_point("HttpLoad", "http-load", || Box::new(HttpLoad)),
    )?;
    package.register(
        PluginModule::<dyn TestCase>::new("smoke_test")
            .with_tagged_entry_point("SmokeTest", "smoke", || Box::new(SmokeTest)),
    )?;
    Ok(package)
}
