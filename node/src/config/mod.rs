use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gossip::GossipParams;

const DEFAULT_BLOCK_STORE_DIR: &str = "blocks";
const DEFAULT_EMISSION_PERIOD_MS: u64 = 5000;
const DEFAULT_AMOUNT_PER_ONCE: usize = 2;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Failed to write configuration: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Configuration {
    pub node: NodeConfig,
    pub storage: StorageConfig,
    pub gossip: GossipConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    /// Hex encoded ed25519 private key used to sign produced blocks.
    pub private_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding one file per committed block.
    pub block_store_path: String,
    /// Answer account queries through a secondary index instead of a
    /// full chain scan.
    #[serde(default)]
    pub indexed: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            block_store_path: DEFAULT_BLOCK_STORE_DIR.to_string(),
            indexed: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GossipConfig {
    /// Interval between gossip batches, in milliseconds.
    pub emission_period_ms: u64,
    /// Number of peers emitted per batch.
    pub amount_per_once: usize,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            emission_period_ms: DEFAULT_EMISSION_PERIOD_MS,
            amount_per_once: DEFAULT_AMOUNT_PER_ONCE,
        }
    }
}

impl GossipConfig {
    pub fn gossip_params(&self) -> GossipParams {
        GossipParams::new(
            Duration::from_millis(self.emission_period_ms),
            self.amount_per_once,
        )
    }
}

impl Configuration {
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Configuration, ConfigurationError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;
        config
            .try_deserialize::<Configuration>()
            .map_err(ConfigurationError::Load)
    }

    pub fn try_save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigurationError> {
        let rendered = toml::to_string(self)?;
        std::fs::write(path.as_ref(), rendered)?;
        Ok(())
    }
}
