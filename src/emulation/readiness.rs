//! Readiness gate before test traffic is sent.

use super::{EmulatedNetwork, EmulationError};
use std::thread;
use std::time::{Duration, Instant};

/// Poll the network until it reports connected or `timeout` elapses.
///
/// Returns the time spent waiting. The network is always asked at least
/// once, even with a zero timeout.
pub fn wait_until_ready(
    net: &dyn EmulatedNetwork,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Duration, EmulationError> {
    let started = Instant::now();
    log::info!("Waiting up to {:?} for the emulated network to connect", timeout);

    loop {
        if net.is_connected()? {
            let waited = started.elapsed();
            log::info!("Emulated network connected after {:?}", waited);
            return Ok(waited);
        }

        let waited = started.elapsed();
        if waited >= timeout {
            log::error!("Emulated network still not connected after {:?}", waited);
            return Err(EmulationError::ReadinessTimeout { waited });
        }

        log::debug!("Emulated network not connected yet, retrying");
        thread::sleep(poll_interval.min(timeout - waited));
    }
}
