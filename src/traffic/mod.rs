//! Background HTTP load generation.

use crate::emulation::{EmulatedNetwork, EmulationError};

/// Concurrent requests per load-generation command
pub const CONCURRENCY: u32 = 1;
/// Requests per load-generation command
pub const REQUEST_COUNT: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum TrafficError {
    #[error("No source host at position {index} for target {target}")]
    MissingSource { index: usize, target: String },
    #[error(transparent)]
    Emulation(#[from] EmulationError),
}

/// Backgrounded `ab` invocation against `target:port/resource`
pub fn load_command(target: &str, port: u16, resource: &str) -> String {
    format!(
        "ab -c {} -n {} http://{}:{}/{} > /dev/null 2>&1 &",
        CONCURRENCY,
        REQUEST_COUNT,
        target,
        port,
        resource.trim_start_matches('/')
    )
}

/// Issue one load command from `hosts[i]` against `targets[i]` for every target.
///
/// Pairing is positional. The commands are fire-and-forget; nothing is
/// collected from them.
pub fn generate(
    net: &dyn EmulatedNetwork,
    hosts: &[String],
    targets: &[String],
    port: u16,
    resource: &str,
) -> Result<(), TrafficError> {
    for (index, target) in targets.iter().enumerate() {
        let host = hosts.get(index).ok_or_else(|| TrafficError::MissingSource {
            index,
            target: target.clone(),
        })?;
        let command = load_command(target, port, resource);
        log::info!("Executing ab command on {}: {}", host, command);
        let output = net.cmd(host, &command)?;
        if !output.trim().is_empty() {
            log::info!("{}", output.trim());
        }
    }
    Ok(())
}
