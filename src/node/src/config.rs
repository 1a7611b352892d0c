//! Node configuration loading and validation

use anyhow::{Context, Result};
use relaygate_crypto::KemAlgorithm;
use relaygate_delivery::SelectionPolicy;
use relaygate_reputation::ReputationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete node configuration
///
/// Every section is optional in the TOML file; missing keys take the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub node: NodeSection,

    #[serde(default)]
    pub reputation: ReputationConfig,

    #[serde(default)]
    pub delivery: DeliverySection,

    #[serde(default)]
    pub crypto: CryptoSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeSection {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Registry file, relative paths resolve under `data_dir`
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,

    /// Nodes to generate when the registry file is missing
    #[serde(default = "default_registry_count")]
    pub registry_count: usize,

    #[serde(default = "default_true")]
    pub auto_generate_registry: bool,

    #[serde(default = "default_round_interval")]
    pub round_interval_ms: u64,

    /// Stop after this many rounds; run until shutdown when unset
    #[serde(default)]
    pub max_rounds: Option<u64>,

    #[serde(default = "default_scores_path")]
    pub scores_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliverySection {
    #[serde(default)]
    pub policy: SelectionPolicy,

    /// File sealed every round; rounds only score nodes when unset
    #[serde(default)]
    pub payload_path: Option<PathBuf>,

    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: PathBuf,

    /// Open every envelope with the recipient's registered secret key
    #[serde(default = "default_true")]
    pub verify_roundtrip: bool,

    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CryptoSection {
    #[serde(default)]
    pub algorithm: KemAlgorithm,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_host")]
    pub host: String,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_true() -> bool { true }
fn default_data_dir() -> PathBuf { PathBuf::from("./data") }
fn default_registry_path() -> PathBuf { PathBuf::from("nodes.json") }
fn default_registry_count() -> usize { 8 }
fn default_round_interval() -> u64 { 4000 }
fn default_scores_path() -> PathBuf { PathBuf::from("scores.json") }
fn default_outbox_dir() -> PathBuf { PathBuf::from("outbox") }
fn default_store_timeout() -> u64 { 2000 }
fn default_metrics_host() -> String { "0.0.0.0".to_string() }
fn default_metrics_port() -> u16 { 9090 }

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            registry_path: default_registry_path(),
            registry_count: default_registry_count(),
            auto_generate_registry: true,
            round_interval_ms: default_round_interval(),
            max_rounds: None,
            scores_path: default_scores_path(),
        }
    }
}

impl Default for DeliverySection {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::default(),
            payload_path: None,
            outbox_dir: default_outbox_dir(),
            verify_roundtrip: true,
            store_timeout_ms: default_store_timeout(),
        }
    }
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_metrics_host(),
            port: default_metrics_port(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read configuration file {:?}", path.as_ref()))?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse configuration file")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.node.round_interval_ms == 0 {
            anyhow::bail!("round_interval_ms must be greater than zero");
        }

        if self.node.registry_count == 0 {
            anyhow::bail!("registry_count must be at least 1");
        }

        if self.node.max_rounds == Some(0) {
            anyhow::bail!("max_rounds must be at least 1 when set");
        }

        if self.delivery.store_timeout_ms == 0 {
            anyhow::bail!("store_timeout_ms must be greater than zero");
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            anyhow::bail!("metrics port must be set when metrics are enabled");
        }

        self.reputation
            .validate()
            .context("Invalid [reputation] section")?;

        Ok(())
    }

    /// Get absolute data directory path
    pub fn data_dir(&self) -> PathBuf {
        if self.node.data_dir.is_absolute() {
            self.node.data_dir.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.node.data_dir)
        }
    }

    pub fn registry_path(&self) -> PathBuf {
        self.under_data_dir(&self.node.registry_path)
    }

    pub fn scores_path(&self) -> PathBuf {
        self.under_data_dir(&self.node.scores_path)
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.under_data_dir(&self.delivery.outbox_dir)
    }

    pub fn payload_path(&self) -> Option<PathBuf> {
        self.delivery
            .payload_path
            .as_ref()
            .map(|p| self.under_data_dir(p))
    }

    pub fn round_interval(&self) -> Duration {
        Duration::from_millis(self.node.round_interval_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery.store_timeout_ms)
    }

    fn under_data_dir(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir().join(path)
        }
    }
}
