//! Test-case discovery and sequential execution.

use super::{TestCase, TestCasePackage, TestContext, TEST_CASE_CONTRACT};
use crate::plugin::{self, EntryPoint, PluginFault};
use std::collections::BTreeSet;

/// A resolved, not yet instantiated test case
#[derive(Debug)]
pub struct DiscoveredTestCase<'a> {
    pub module: String,
    pub entry: &'a EntryPoint<dyn TestCase>,
}

/// Resolve every module of the package except the excluded ones.
///
/// Excluded modules are never resolved. Modules that fail to resolve are
/// logged and left out.
pub fn discover_plugins<'a>(
    package: &'a TestCasePackage,
    exclude: &BTreeSet<String>,
) -> Vec<DiscoveredTestCase<'a>> {
    let mut discovered = Vec::new();

    for module in package.modules() {
        if exclude.contains(&module.name) {
            log::debug!("Skipping excluded test case module {}", module.name);
            continue;
        }

        match plugin::resolve(module) {
            Ok(entry) => discovered.push(DiscoveredTestCase {
                module: module.name.clone(),
                entry,
            }),
            Err(e) => log::error!("Cannot load test case module {}: {}", module.name, e),
        }
    }

    discovered
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    Passed,
    NotTriggered,
    ContractMismatch(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub module: String,
    pub name: String,
    pub trigger: String,
    pub outcome: TestOutcome,
}

/// Outcome of every discovered test case, in execution order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub results: Vec<TestResult>,
}

impl RunReport {
    /// Test cases whose trigger matched and that were invoked
    pub fn executed(&self) -> impl Iterator<Item = &TestResult> {
        self.results
            .iter()
            .filter(|r| r.outcome != TestOutcome::NotTriggered)
    }

    pub fn executed_modules(&self) -> Vec<&str> {
        self.executed().map(|r| r.module.as_str()).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| {
            matches!(
                r.outcome,
                TestOutcome::Failed(_) | TestOutcome::ContractMismatch(_)
            )
        })
    }

    pub fn all_passed(&self) -> bool {
        self.failures().next().is_none()
    }
}

pub struct TestOrchestrator<'a> {
    package: &'a TestCasePackage,
    exclude: BTreeSet<String>,
}

impl<'a> TestOrchestrator<'a> {
    pub fn new(package: &'a TestCasePackage, exclude: impl IntoIterator<Item = String>) -> Self {
        Self {
            package,
            exclude: exclude.into_iter().collect(),
        }
    }

    /// Run every discovered test case whose trigger is in `requested`.
    ///
    /// Test cases run one after another in discovery order. A failing or
    /// misbehaving test case is recorded and the remaining ones still run.
    /// Entry points tagged with a trigger that was not requested are never
    /// instantiated.
    pub fn run(&self, requested: &BTreeSet<String>, ctx: &TestContext<'_>) -> RunReport {
        let mut report = RunReport::default();

        for test in discover_plugins(self.package, &self.exclude) {
            let name = test.entry.name.clone();

            if let Some(tag) = test.entry.tag() {
                if !requested.contains(tag) {
                    report.results.push(TestResult {
                        module: test.module,
                        name,
                        trigger: tag.to_string(),
                        outcome: TestOutcome::NotTriggered,
                    });
                    continue;
                }
            }

            let mut instance = test.entry.instantiate();
            let trigger = instance.trigger().to_string();

            let outcome = match test.entry.tag() {
                Some(tag) if tag != trigger => {
                    let reason = format!("registered for trigger '{}' but reports '{}'", tag, trigger);
                    log::error!("{}: {}", name, reason);
                    TestOutcome::ContractMismatch(reason)
                }
                _ if !requested.contains(&trigger) => TestOutcome::NotTriggered,
                _ => execute(&name, instance.as_mut(), ctx),
            };

            report.results.push(TestResult {
                module: test.module,
                name,
                trigger,
                outcome,
            });
        }

        report
    }
}

fn execute(name: &str, instance: &mut dyn TestCase, ctx: &TestContext<'_>) -> TestOutcome {
    log::info!("Executing {}", name);
    match instance.run(ctx) {
        Ok(()) => {
            log::info!("{} finished", name);
            TestOutcome::Passed
        }
        Err(PluginFault::Contract(reason)) => {
            log::error!("{}: {}", name, reason);
            log::error!("Error. {} must have {} method", name, TEST_CASE_CONTRACT);
            TestOutcome::ContractMismatch(reason)
        }
        Err(PluginFault::Runtime(reason)) => {
            log::error!("{} failed: {}", name, reason);
            TestOutcome::Failed(reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrafficConfig;
    use crate::emulation::fake::FakeNetwork;
    use crate::plugin::PluginModule;
    use crate::testcase::NodeInventory;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<String>>>;

    struct Scripted {
        module: &'static str,
        trigger: &'static str,
        fault: Option<PluginFault>,
        calls: Calls,
    }

    impl TestCase for Scripted {
        fn trigger(&self) -> &str {
            self.trigger
        }

        fn run(&mut self, ctx: &TestContext<'_>) -> Result<(), PluginFault> {
            self.calls.lock().unwrap().push(self.module.to_string());
            assert_eq!(ctx.targets.len(), 1);
            match &self.fault {
                Some(fault) => Err(fault.clone()),
                None => Ok(()),
            }
        }
    }

    fn register(
        package: &mut TestCasePackage,
        calls: &Calls,
        module: &'static str,
        trigger: &'static str,
        fault: Option<PluginFault>,
    ) {
        let calls = Arc::clone(calls);
        package
            .register(PluginModule::<dyn TestCase>::new(module).with_entry_point(
                format!("{}Case", module),
                move || {
                    Box::new(Scripted {
                        module,
                        trigger,
                        fault: fault.clone(),
                        calls: Arc::clone(&calls),
                    })
                },
            ))
            .unwrap();
    }

    fn package(calls: &Calls) -> TestCasePackage {
        let mut package = TestCasePackage::new("test_cases");
        register(&mut package, calls, "a_contract", "dos", Some(PluginFault::contract("bad args")));
        register(&mut package, calls, "b_flood", "dos", None);
        register(&mut package, calls, "c_scan", "recon", None);
        register(&mut package, calls, "d_crash", "dos", Some(PluginFault::runtime("boom")));
        register(&mut package, calls, "e_after", "dos", None);
        register(&mut package, calls, "smoke_test", "dos", None);
        package
    }

    fn requested(triggers: &[&str]) -> BTreeSet<String> {
        triggers.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_discovery_skips_excluded_modules() {
        let calls = Calls::default();
        let package = package(&calls);
        let exclude = requested(&["smoke_test"]);

        let discovered = discover_plugins(&package, &exclude);
        let modules: Vec<_> = discovered.iter().map(|d| d.module.as_str()).collect();
        assert_eq!(modules, vec!["a_contract", "b_flood", "c_scan", "d_crash", "e_after"]);
    }

    #[test]
    fn test_failures_do_not_stop_later_plugins() {
        let calls = Calls::default();
        let package = package(&calls);
        let orchestrator = TestOrchestrator::new(&package, vec!["smoke_test".to_string()]);
        let net = FakeNetwork::default();
        let nodes = NodeInventory::default();
        let targets = vec!["10.0.0.1".to_string()];
        let traffic = TrafficConfig::default();
        let ctx = TestContext {
            net: &net,
            targets: &targets,
            nodes: &nodes,
            traffic: &traffic,
        };

        let report = orchestrator.run(&requested(&["dos"]), &ctx);

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["a_contract", "b_flood", "d_crash", "e_after"]
        );
        assert_eq!(report.executed_modules(), vec!["a_contract", "b_flood", "d_crash", "e_after"]);
        assert_eq!(report.results.len(), 5);
        assert_eq!(
            report.results[0].outcome,
            TestOutcome::ContractMismatch("bad args".to_string())
        );
        assert_eq!(report.results[2].outcome, TestOutcome::NotTriggered);
        assert_eq!(report.results[3].outcome, TestOutcome::Failed("boom".to_string()));
        assert_eq!(report.failures().count(), 2);
        assert!(!report.all_passed());
    }

    #[test]
    fn test_excluded_module_never_runs_even_if_triggered() {
        let calls = Calls::default();
        let package = package(&calls);
        let orchestrator = TestOrchestrator::new(&package, vec!["smoke_test".to_string()]);
        let net = FakeNetwork::default();
        let nodes = NodeInventory::default();
        let targets = vec!["10.0.0.1".to_string()];
        let traffic = TrafficConfig::default();
        let ctx = TestContext {
            net: &net,
            targets: &targets,
            nodes: &nodes,
            traffic: &traffic,
        };

        let report = orchestrator.run(&requested(&["dos", "recon"]), &ctx);

        assert!(!calls.lock().unwrap().iter().any(|m| m == "smoke_test"));
        assert!(report.results.iter().all(|r| r.module != "smoke_test"));
        assert_eq!(report.executed().count(), 5);
    }

    #[test]
    fn test_no_requested_triggers_runs_nothing() {
        let calls = Calls::default();
        let package = package(&calls);
        let orchestrator = TestOrchestrator::new(&package, Vec::new());
        let net = FakeNetwork::default();
        let nodes = NodeInventory::default();
        let traffic = TrafficConfig::default();
        let ctx = TestContext {
            net: &net,
            targets: &[],
            nodes: &nodes,
            traffic: &traffic,
        };

        let report = orchestrator.run(&BTreeSet::new(), &ctx);

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(report.executed().count(), 0);
        assert!(report.all_passed());
    }

    fn tagged_package(built: &Arc<AtomicUsize>, calls: &Calls) -> TestCasePackage {
        let mut package = TestCasePackage::new("test_cases");
        for (module, tag, trigger) in [
            ("dos_flood", "dos", "dos"),
            ("recon_scan", "recon", "recon"),
            ("renamed", "dos", "ddos"),
        ] {
            let built = Arc::clone(built);
            let calls = Arc::clone(calls);
            package
                .register(PluginModule::<dyn TestCase>::new(module).with_tagged_entry_point(
                    format!("{}Case", module),
                    tag,
                    move || {
                        built.fetch_add(1, Ordering::SeqCst);
                        Box::new(Scripted {
                            module,
                            trigger,
                            fault: None,
                            calls: Arc::clone(&calls),
                        })
                    },
                ))
                .unwrap();
        }
        package
    }

    #[test]
    fn test_untriggered_tagged_plugins_are_not_instantiated() {
        let built = Arc::new(AtomicUsize::new(0));
        let calls = Calls::default();
        let package = tagged_package(&built, &calls);
        let net = FakeNetwork::default();
        let nodes = NodeInventory::default();
        let targets = vec!["10.0.0.1".to_string()];
        let traffic = TrafficConfig::default();
        let ctx = TestContext {
            net: &net,
            targets: &targets,
            nodes: &nodes,
            traffic: &traffic,
        };

        let report = TestOrchestrator::new(&package, Vec::new()).run(&requested(&["recon"]), &ctx);

        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(*calls.lock().unwrap(), vec!["recon_scan"]);
        assert_eq!(report.results[0].trigger, "dos");
        assert_eq!(report.results[0].outcome, TestOutcome::NotTriggered);
        assert_eq!(report.results[2].module, "renamed");
        assert_eq!(report.results[2].outcome, TestOutcome::NotTriggered);
        assert!(report.all_passed());
    }

    #[test]
    fn test_tag_disagreeing_with_trigger_is_contract_mismatch() {
        let built = Arc::new(AtomicUsize::new(0));
        let calls = Calls::default();
        let package = tagged_package(&built, &calls);
        let net = FakeNetwork::default();
        let nodes = NodeInventory::default();
        let targets = vec!["10.0.0.1".to_string()];
        let traffic = TrafficConfig::default();
        let ctx = TestContext {
            net: &net,
            targets: &targets,
            nodes: &nodes,
            traffic: &traffic,
        };

        let report = TestOrchestrator::new(&package, Vec::new()).run(&requested(&["dos"]), &ctx);

        assert_eq!(built.load(Ordering::SeqCst), 2);
        assert_eq!(*calls.lock().unwrap(), vec!["dos_flood"]);
        assert_eq!(report.executed_modules(), vec!["dos_flood", "renamed"]);
        assert_eq!(report.results[2].trigger, "ddos");
        assert!(matches!(
            report.results[2].outcome,
            TestOutcome::ContractMismatch(ref reason) if reason.contains("'dos'")
        ));
        assert_eq!(report.failures().count(), 1);
    }
}
