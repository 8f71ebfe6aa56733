use crate::utils::duration::parse_duration;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Key of this framework's section under `network`
pub const FRAMEWORK_NAME: &str = "ids-test-topo";

/// Addresses matching this prefix are internal unless configured otherwise
pub const DEFAULT_INTERNAL_PATTERN: &str = "^192.168";

/// Top-level testbed configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub network: HashMap<String, FrameworkNetwork>,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub testing: TestingConfig,
    #[serde(default)]
    pub servers: ServersConfig,
    #[serde(default)]
    pub traffic: TrafficConfig,
}

/// Generator selection for one framework
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct FrameworkNetwork {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_ip_pattern: Option<String>,
}

/// Names of the configured topology generator modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSelection {
    pub internal: String,
    pub external: String,
}

/// Input and output file locations
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct FilesConfig {
    pub mac_ip: PathBuf,
    pub target_hosts: PathBuf,
    pub attack_hosts: PathBuf,
    pub topology_plan: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct TestingConfig {
    /// Test case modules never loaded
    pub exclude: Vec<String>,
    pub readiness_timeout: String,
    pub poll_interval: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct ServersConfig {
    pub directory: PathBuf,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct TrafficConfig {
    pub port: u16,
    pub resource: String,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),
    #[error("Invalid internal IP pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration { field: String, reason: String },
}

impl Config {
    /// Validate the configuration
    ///
    /// Checks that the framework section names both generators, that the
    /// internal pattern compiles and that the durations parse.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.generators()?;
        self.internal_pattern()?;
        self.readiness_timeout()?;
        self.poll_interval()?;
        Ok(())
    }

    /// The `network.ids-test-topo` section
    pub fn framework(&self) -> Result<&FrameworkNetwork, ValidationError> {
        self.network.get(FRAMEWORK_NAME).ok_or_else(|| {
            ValidationError::ConfigurationMissing(format!("network.{}", FRAMEWORK_NAME))
        })
    }

    pub fn generators(&self) -> Result<GeneratorSelection, ValidationError> {
        let framework = self.framework()?;
        let require = |value: &Option<String>, key: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    ValidationError::ConfigurationMissing(format!(
                        "network.{}.{}",
                        FRAMEWORK_NAME, key
                    ))
                })
        };

        Ok(GeneratorSelection {
            internal: require(&framework.internal_network, "internal-network")?,
            external: require(&framework.external_network, "external-network")?,
        })
    }

    /// Compiled pattern selecting internal addresses
    pub fn internal_pattern(&self) -> Result<Regex, ValidationError> {
        let pattern = self
            .framework()?
            .internal_ip_pattern
            .as_deref()
            .unwrap_or(DEFAULT_INTERNAL_PATTERN);
        Regex::new(pattern).map_err(|source| ValidationError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
    }

    pub fn readiness_timeout(&self) -> Result<Duration, ValidationError> {
        parse_field("testing.readiness-timeout", &self.testing.readiness_timeout)
    }

    pub fn poll_interval(&self) -> Result<Duration, ValidationError> {
        parse_field("testing.poll-interval", &self.testing.poll_interval)
    }
}

fn parse_field(field: &str, value: &str) -> Result<Duration, ValidationError> {
    parse_duration(value).map_err(|reason| ValidationError::InvalidDuration {
        field: field.to_string(),
        reason,
    })
}

/// Default implementations
impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            mac_ip: PathBuf::from("config/mac_ip.txt"),
            target_hosts: PathBuf::from("config/target_hosts.txt"),
            attack_hosts: PathBuf::from("config/attack_hosts.txt"),
            topology_plan: PathBuf::from("config/topology.json"),
        }
    }
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            exclude: crate::testcase::builtin::DEFAULT_EXCLUDE
                .iter()
                .map(|m| m.to_string())
                .collect(),
            readiness_timeout: "30s".to_string(),
            poll_interval: "500ms".to_string(),
        }
    }
}

impl Default for ServersConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/var/www"),
            port: 8000,
        }
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            resource: "index.html".to_string(),
        }
    }
}
