//! File-serving processes on emulated hosts.

use super::{shell_quote, EmulatedNetwork, EmulationError};

/// Command that starts a backgrounded static file server on `port`
pub fn http_server_command(port: u16) -> String {
    format!("python3 -m http.server {} > /dev/null 2>&1 &", port)
}

/// Start a simple HTTP server serving `directory` on every host in `hosts`
pub fn start_http_servers(
    net: &dyn EmulatedNetwork,
    hosts: &[String],
    directory: &str,
    port: u16,
) -> Result<(), EmulationError> {
    log::info!("Starting HTTP servers on {} hosts", hosts.len());
    let command = format!("cd {} && {}", shell_quote(directory), http_server_command(port));

    for host in hosts {
        net.cmd(host, &command)?;
        log::info!("{} server started on port {}", host, port);
    }

    Ok(())
}
