use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use idstestbed::config_loader;
use idstestbed::emulation::NetnsNetwork;
use idstestbed::orchestrator::{self, Plugins, RunOptions};
use log::info;
use std::path::PathBuf;

/// Build an IDS test network and run test cases against it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the testbed configuration YAML file
    #[arg(short, long, default_value = "config/config.yaml")]
    config: PathBuf,

    /// MAC/IP input file, overrides `files.mac-ip`
    #[arg(long)]
    mac_ip: Option<PathBuf>,

    /// Run the test cases selected with --test
    #[arg(long)]
    exec_tests: bool,

    /// Trigger of a test case to run (repeatable)
    #[arg(short, long = "test", value_name = "TRIGGER")]
    tests: Vec<String>,

    /// Prefix of the network namespaces backing the emulated hosts
    #[arg(long, default_value = "ids-")]
    netns_prefix: String,

    /// Run namespace commands through sudo
    #[arg(long)]
    sudo: bool,

    /// Start HTTP servers on the external hosts
    #[arg(long)]
    start_servers: bool,

    /// Generate HTTP load from the external hosts against the targets
    #[arg(long)]
    traffic: bool,

    /// Only build the topology and write the plan
    #[arg(long)]
    plan_only: bool,

    /// Print the registered plugins and exit
    #[arg(long)]
    list_plugins: bool,
}

impl Args {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            mac_ip: self.mac_ip.clone(),
            exec_tests: self.exec_tests,
            tests: self.tests.iter().cloned().collect(),
            start_servers: self.start_servers,
            traffic: self.traffic,
            plan_only: self.plan_only,
        }
    }
}

fn list_plugins(plugins: &Plugins) {
    println!("{}: {}", plugins.internal.namespace(), plugins.internal.module_names().join(", "));
    println!("{}: {}", plugins.external.namespace(), plugins.external.module_names().join(", "));
    println!("{}: {}", plugins.test_cases.namespace(), plugins.test_cases.module_names().join(", "));
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let plugins = Plugins::builtin()?;
    if args.list_plugins {
        list_plugins(&plugins);
        return Ok(());
    }

    info!("Configuration file: {:?}", args.config);
    let config = config_loader::load_config(&args.config)?;

    let options = args.run_options();
    let summary = orchestrator::run(&config, &plugins, &options, |built| {
        Ok(NetnsNetwork::new(&args.netns_prefix, built.endpoint_names()).with_sudo(args.sudo))
    })?;

    info!("Topology plan written to {:?}", summary.plan_path);
    if !options.plan_only {
        info!(
            "{} target hosts, {} attack hosts (offset {})",
            summary.targets.len(),
            summary.attackers.len(),
            summary.offset
        );
    }
    if let Some(report) = &summary.report {
        for result in &report.results {
            info!("{} [{}]: {:?}", result.name, result.trigger, result.outcome);
        }
    }

    info!("Run completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["idstestbed", "--config", "test.yaml"]);

        assert_eq!(args.config, PathBuf::from("test.yaml"));
        assert_eq!(args.netns_prefix, "ids-");
        assert!(!args.exec_tests);
        assert!(args.tests.is_empty());
    }

    #[test]
    fn test_repeated_test_triggers() {
        let args = Args::parse_from([
            "idstestbed",
            "--exec-tests",
            "--test",
            "ping",
            "-t",
            "http-load",
            "--mac-ip",
            "records.txt",
        ]);

        let options = args.run_options();
        assert!(options.exec_tests);
        assert_eq!(options.tests.len(), 2);
        assert!(options.tests.contains("http-load"));
        assert_eq!(options.mac_ip, Some(PathBuf::from("records.txt")));
    }

    #[test]
    fn test_plan_only_flag() {
        let args = Args::parse_from(["idstestbed", "--plan-only", "--list-plugins"]);
        assert!(args.run_options().plan_only);
        assert!(args.list_plugins);
    }
}
