use anyhow::{bail, Context, Result};
use celes_system::SystemConfig;
use celes_types::{Asset, BlockNum, Name, Symbol};
use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "celes.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
    /// `pretty` or `json`
    pub log_format: String,
    /// Snapshots kept after every save; older ones are pruned.
    pub retain_snapshots: u64,
    pub genesis: GenesisConfig,
    pub system: SystemConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            retain_snapshots: 16,
            genesis: GenesisConfig::default(),
            system: SystemConfig::default(),
        }
    }
}

/// One funded account at genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance {
    pub account: Name,
    pub quantity: Asset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    pub core_symbol: Symbol,
    /// Core tokens backing the resource market at creation.
    pub quote_balance: i64,
    pub start_block: BlockNum,
    pub start_time_secs: u64,
    /// Issue every reward holding pool at its full capacity.
    pub fund_reward_pools: bool,
    pub balances: Vec<GenesisBalance>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            core_symbol: Symbol::new("CELES", 4).unwrap_or(Symbol::from_raw(0)),
            quote_balance: 10_000_000_000,
            start_block: 1,
            start_time_secs: 0,
            fund_reward_pools: true,
            balances: Vec::new(),
        }
    }
}

impl NodeConfig {
    /// Layer an optional TOML file under `CELES_`-prefixed environment
    /// variables; nested keys use `__`, e.g. `CELES_SYSTEM__GOVERNANCE__BP_COUNT`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let resolved = match path {
            Some(path) => {
                if !path.exists() {
                    bail!(
                        "Configuration file {} not found (specified via --config)",
                        path.display()
                    );
                }
                Some(path.to_path_buf())
            }
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            }
        };

        let mut builder = Config::builder();
        if let Some(path) = &resolved {
            builder = builder.add_source(ConfigFile::from(path.as_path()));
        }
        builder = builder.add_source(
            Environment::with_prefix("CELES")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: NodeConfig = builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.system
            .validate()
            .context("invalid system parameters")?;
        if !matches!(self.log_format.as_str(), "pretty" | "json") {
            bail!("log_format must be 'pretty' or 'json', got '{}'", self.log_format);
        }
        if self.retain_snapshots == 0 {
            bail!("retain_snapshots must be at least 1");
        }
        if self.genesis.quote_balance <= 0 {
            bail!("genesis.quote_balance must be positive");
        }
        if let Some(bad) = self
            .genesis
            .balances
            .iter()
            .find(|b| b.quantity.symbol != self.genesis.core_symbol || b.quantity.amount <= 0)
        {
            bail!("genesis balance for {} is invalid: {}", bad.account, bad.quantity);
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("state")
    }
}
