//! Host inventory files.
//!
//! After the emulated network is up, the live addresses of the internal
//! hosts (the targets) and of the external hosts (the attackers) are
//! written to two line-oriented files for other tooling. Each call truncates
//! its file, so a rerun replaces the previous inventory.

use crate::emulation::{EmulatedNetwork, EmulationError};
use crate::topology::types::host_name;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Failed to write inventory file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Host '{0}' has no attached switch")]
    MissingSwitch(String),
    #[error(transparent)]
    Emulation(#[from] EmulationError),
}

/// One line of an inventory file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryRecord {
    Internal {
        index: usize,
        switch_index: usize,
        ip: String,
    },
    External {
        ip: String,
    },
}

impl fmt::Display for InventoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryRecord::Internal {
                index,
                switch_index,
                ip,
            } => write!(f, "{}_{}_{}", index, switch_index, ip),
            InventoryRecord::External { ip } => write!(f, "{}", ip),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InventoryLogger {
    target_hosts: PathBuf,
    attack_hosts: PathBuf,
}

impl InventoryLogger {
    pub fn new(target_hosts: impl Into<PathBuf>, attack_hosts: impl Into<PathBuf>) -> Self {
        Self {
            target_hosts: target_hosts.into(),
            attack_hosts: attack_hosts.into(),
        }
    }

    pub fn target_hosts_path(&self) -> &Path {
        &self.target_hosts
    }

    pub fn attack_hosts_path(&self) -> &Path {
        &self.attack_hosts
    }

    /// Record internal hosts `h0..h{host_count}` and return their addresses.
    ///
    /// Each line is `{index}_{switch_index}_{ip}`.
    pub fn log_internal(
        &self,
        net: &dyn EmulatedNetwork,
        host_count: usize,
        switch_index_by_host: &BTreeMap<String, usize>,
    ) -> Result<Vec<String>, InventoryError> {
        let mut writer = InventoryWriter::create(&self.target_hosts)?;
        let mut targets = Vec::with_capacity(host_count);
        for index in 0..host_count {
            let name = host_name(index);
            let ip = net.host_ip(&name)?;
            let switch_index = *switch_index_by_host
                .get(&name)
                .ok_or_else(|| InventoryError::MissingSwitch(name.clone()))?;
            writer.write(&InventoryRecord::Internal {
                index,
                switch_index,
                ip: ip.clone(),
            })?;
            targets.push(ip);
        }
        writer.finish()?;

        log::info!("Logged {} target hosts to {:?}", targets.len(), self.target_hosts);
        Ok(targets)
    }

    /// Record external hosts `h{offset}..h{offset + count}` and return their addresses
    pub fn log_external(
        &self,
        net: &dyn EmulatedNetwork,
        offset: usize,
        ext_host_count: usize,
    ) -> Result<Vec<String>, InventoryError> {
        let mut writer = InventoryWriter::create(&self.attack_hosts)?;
        let mut attackers = Vec::with_capacity(ext_host_count);
        for index in offset..offset + ext_host_count {
            let ip = net.host_ip(&host_name(index))?;
            writer.write(&InventoryRecord::External { ip: ip.clone() })?;
            attackers.push(ip);
        }
        writer.finish()?;

        log::info!("Logged {} attack hosts to {:?}", attackers.len(), self.attack_hosts);
        Ok(attackers)
    }
}

/// Line writer over a freshly truncated inventory file
struct InventoryWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl InventoryWriter {
    fn create(path: &Path) -> Result<Self, InventoryError> {
        let file = File::create(path).map_err(|source| InventoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    fn write(&mut self, record: &InventoryRecord) -> Result<(), InventoryError> {
        writeln!(self.writer, "{}", record).map_err(|source| self.io_error(source))
    }

    fn finish(mut self) -> Result<(), InventoryError> {
        self.writer.flush().map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> InventoryError {
        InventoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
