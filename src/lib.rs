//! # idstestbed - IDS test network builder and test runner
//!
//! This library builds a two-segment test network for intrusion detection
//! systems from a list of MAC/IP records and drives pluggable test cases
//! against it.
//!
//! ## Overview
//!
//! Records whose IP matches the internal pattern become the protected
//! (internal) segment; every other record is grouped by MAC into the
//! attacker (external) segment. Topology generator plugins turn each segment
//! into hosts, switches and routers attached to a shared main switch. After
//! the emulation engine instantiates the network, the live addresses are
//! written to inventory files and the requested test cases are run.
//!
//! ## Architecture
//!
//! - `address`: MAC/IP record parsing and internal/external classification
//! - `plugin`: named plugin packages and entry point resolution
//! - `topology`: graph, node registries, generator plugins and the two-phase builder
//! - `testcase`: test case plugins and their orchestrator
//! - `inventory`: target and attack host inventory files
//! - `traffic`: HTTP load generation between segments
//! - `emulation`: boundary to the network emulation engine
//! - `config` / `config_loader`: YAML configuration
//! - `orchestrator`: a complete run from configuration to test report
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use idstestbed::emulation::NetnsNetwork;
//! use idstestbed::orchestrator::{self, Plugins, RunOptions};
//! use idstestbed::config_loader;
//! use std::path::Path;
//!
//! let config = config_loader::load_config(Path::new("config/config.yaml"))?;
//! let plugins = Plugins::builtin()?;
//! let options = RunOptions::default();
//!
//! let summary = orchestrator::run(&config, &plugins, &options, |built| {
//!     Ok(NetnsNetwork::new("ids-", built.endpoint_names()))
//! })?;
//! println!("{} targets", summary.targets.len());
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! network:
//!   ids-test-topo:
//!     internal-network: star
//!     external-network: flat
//!     internal-ip-pattern: "^192.168"
//! testing:
//!   exclude: [smoke_test]
//!   readiness-timeout: 30s
//! ```
//!
//! ## Error Handling
//!
//! Each module reports its own `thiserror` enum. Application level functions
//! return `color_eyre::Result` with context attached.

pub mod address;
pub mod config;
pub mod config_loader;
pub mod emulation;
pub mod inventory;
pub mod orchestrator;
pub mod plugin;
pub mod testcase;
pub mod topology;
pub mod traffic;
pub mod utils;
