//! Linux network namespace backend.
//!
//! Attaches to an emulated network whose hosts are already running as
//! network namespaces named `<prefix><host>`. Commands are executed with
//! `ip netns exec`; creating and wiring the namespaces is the emulation
//! engine's job.

use super::{EmulatedNetwork, EmulationError};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct NetnsNetwork {
    prefix: String,
    hosts: Vec<String>,
    use_sudo: bool,
}

impl NetnsNetwork {
    /// `hosts` are the host names the network is expected to contain
    pub fn new(prefix: &str, hosts: Vec<String>) -> Self {
        Self {
            prefix: prefix.to_string(),
            hosts,
            use_sudo: false,
        }
    }

    /// Run every `ip` invocation through `sudo`
    pub fn with_sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }

    pub fn namespace(&self, host: &str) -> String {
        format!("{}{}", self.prefix, host)
    }

    fn ip_command(&self) -> Command {
        if self.use_sudo {
            let mut command = Command::new("sudo");
            command.arg("ip");
            command
        } else {
            Command::new("ip")
        }
    }

    fn existing_namespaces(&self) -> Result<Vec<String>, EmulationError> {
        let output = self.ip_command().args(["netns", "list"]).output()?;
        if !output.status.success() {
            return Err(EmulationError::CommandFailed {
                host: "-".to_string(),
                command: "ip netns list".to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(parse_netns_list(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Extract namespace names from `ip netns list` output.
///
/// Lines look like `ns1 (id: 0)` or just `ns1`.
fn parse_netns_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

impl EmulatedNetwork for NetnsNetwork {
    fn cmd(&self, host: &str, command: &str) -> Result<String, EmulationError> {
        if !self.hosts.iter().any(|h| h == host) {
            return Err(EmulationError::HostNotFound(host.to_string()));
        }

        let namespace = self.namespace(host);
        log::debug!("[{}] {}", namespace, command);
        let output = self
            .ip_command()
            .args(["netns", "exec", &namespace, "sh", "-c", command])
            .output()?;

        if !output.status.success() {
            return Err(EmulationError::CommandFailed {
                host: host.to_string(),
                command: command.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn is_connected(&self) -> Result<bool, EmulationError> {
        let existing = self.existing_namespaces()?;
        let missing: Vec<String> = self
            .hosts
            .iter()
            .map(|h| self.namespace(h))
            .filter(|ns| !existing.contains(ns))
            .collect();

        if !missing.is_empty() {
            log::debug!("Namespaces not up yet: {:?}", missing);
        }
        Ok(missing.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_netns_list() {
        let output = "ids-h1 (id: 1)\nids-h0 (id: 0)\n\nplain\n";
        assert_eq!(parse_netns_list(output), vec!["ids-h1", "ids-h0", "plain"]);
    }

    #[test]
    fn test_namespace_name() {
        let net = NetnsNetwork::new("ids-", vec!["h0".to_string()]);
        assert_eq!(net.namespace("h0"), "ids-h0");
    }

    #[test]
    fn test_unknown_host_rejected_before_exec() {
        let net = NetnsNetwork::new("ids-", vec!["h0".to_string()]);
        assert!(matches!(
            net.cmd("h5", "true"),
            Err(EmulationError::HostNotFound(_))
        ));
    }
}
