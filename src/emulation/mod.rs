//! Boundary to the network emulation engine.
//!
//! The engine that instantiates switches, links and host namespaces lives
//! outside this crate. Everything here talks to it through
//! [`EmulatedNetwork`]: run a command on a host, ask for a host's address,
//! and check whether the emulated control plane is up.

pub mod netns;
pub mod readiness;
pub mod servers;

pub use netns::NetnsNetwork;
pub use readiness::wait_until_ready;
pub use servers::start_http_servers;

use std::time::Duration;

/// Errors reported by an emulated network backend
#[derive(Debug, thiserror::Error)]
pub enum EmulationError {
    #[error("Host '{0}' does not exist in the emulated network")]
    HostNotFound(String),
    #[error("Command '{command}' failed on host '{host}': {reason}")]
    CommandFailed {
        host: String,
        command: String,
        reason: String,
    },
    #[error("Host '{0}' reported no IP address")]
    NoAddress(String),
    #[error("Emulated network not ready after {waited:?}")]
    ReadinessTimeout { waited: Duration },
    #[error("Emulation I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running emulated network that hosts can be driven through
pub trait EmulatedNetwork {
    /// Run a shell command on `host` and return its standard output
    fn cmd(&self, host: &str, command: &str) -> Result<String, EmulationError>;

    /// Whether the emulated network is connected and ready for traffic
    fn is_connected(&self) -> Result<bool, EmulationError>;

    /// The live IP address of `host`.
    ///
    /// Uses `hostname -I` and keeps the first address reported.
    fn host_ip(&self, host: &str) -> Result<String, EmulationError> {
        let output = self.cmd(host, "hostname -I")?;
        output
            .split_whitespace()
            .next()
            .map(str::to_string)
            .ok_or_else(|| EmulationError::NoAddress(host.to_string()))
    }
}

impl<N: EmulatedNetwork + ?Sized> EmulatedNetwork for &N {
    fn cmd(&self, host: &str, command: &str) -> Result<String, EmulationError> {
        (**self).cmd(host, command)
    }

    fn is_connected(&self) -> Result<bool, EmulationError> {
        (**self).is_connected()
    }

    fn host_ip(&self, host: &str) -> Result<String, EmulationError> {
        (**self).host_ip(host)
    }
}

/// Quote `value` as a single POSIX shell word
pub(crate) fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}


#[cfg(test)]
mod tests {
    use super::fake::FakeNetwork;
    use super::*;

    #[test]
    fn test_host_ip_takes_first_address() {
        let net = FakeNetwork::with_hosts(&[("h0", "10.0.0.1")]);
        assert_eq!(net.host_ip("h0").unwrap(), "10.0.0.1");
    }

    #[test]
    fn test_host_ip_unknown_host() {
        let net = FakeNetwork::default();
        assert!(matches!(
            net.host_ip("h7"),
            Err(EmulationError::HostNotFound(ref h)) if h == "h7"
        ));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/var/www"), "'/var/www'");
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn test_host_ip_empty_output() {
        let net = FakeNetwork::with_hosts(&[("h0", "")]);
        assert!(matches!(net.host_ip("h0"), Err(EmulationError::NoAddress(_))));
    }
}
