//! `config.toml`: cluster, defaults for the form fields, and the token
//! registry used to label balances.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chain_sol::{Pubkey, TOKEN_PROGRAM_ID};
use serde::{Deserialize, Serialize};
use sol_rpc::{Cluster, Commitment};
use tracing::debug;

use crate::error::{DashboardError, Result};

const APP_DIR: &str = "sol-dashboard";

/// `EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v`
pub const USDC_MAINNET_MINT: Pubkey = Pubkey::new([
    0xc6, 0xfa, 0x7a, 0xf3, 0xbe, 0xdb, 0xad, 0x3a, 0x3d, 0x65, 0xf3, 0x6a, 0xab, 0xc9, 0x74, 0x31,
    0xb1, 0xbb, 0xe4, 0xc2, 0xd2, 0xf6, 0xe0, 0xe4, 0x7c, 0xa6, 0x02, 0x03, 0x45, 0x2f, 0x5d, 0x61,
]);

/// `Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB`
pub const USDT_MAINNET_MINT: Pubkey = Pubkey::new([
    0xce, 0x01, 0x0e, 0x60, 0xaf, 0xed, 0xb2, 0x27, 0x17, 0xbd, 0x63, 0x19, 0x2f, 0x54, 0x14, 0x5a,
    0x3f, 0x96, 0x5a, 0x33, 0xbb, 0x82, 0xd2, 0xc7, 0x02, 0x9e, 0xb2, 0xce, 0x1e, 0x20, 0x82, 0x64,
]);

/// `4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU`
pub const USDC_DEVNET_MINT: Pubkey = Pubkey::new([
    0x3b, 0x44, 0x2c, 0xb3, 0x91, 0x21, 0x57, 0xf1, 0x3a, 0x93, 0x3d, 0x01, 0x34, 0x28, 0x2d, 0x03,
    0x2b, 0x5f, 0xfe, 0xcd, 0x01, 0xa2, 0xdb, 0xf1, 0xb7, 0x79, 0x06, 0x08, 0xdf, 0x00, 0x2e, 0xa7,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cluster: Cluster,

    /// Overrides the cluster's public endpoint.
    #[serde(default)]
    pub rpc_url: Option<String>,

    #[serde(default = "default_token_program_id")]
    pub token_program_id: Pubkey,

    #[serde(default = "default_token_symbol")]
    pub token_symbol: String,

    #[serde(default)]
    pub recipient: Option<String>,

    #[serde(default = "default_commitment")]
    pub commitment: Commitment,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,

    #[serde(default = "default_confirm_poll_ms")]
    pub confirm_poll_ms: u64,

    #[serde(default = "default_keyfile")]
    pub keyfile: PathBuf,

    /// Extra symbol -> mint entries, merged over the cluster's defaults.
    #[serde(default)]
    pub tokens: BTreeMap<String, Pubkey>,
}

fn default_token_program_id() -> Pubkey {
    TOKEN_PROGRAM_ID
}

fn default_token_symbol() -> String {
    "USDC".to_string()
}

fn default_commitment() -> Commitment {
    Commitment::Processed
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_confirm_timeout_secs() -> u64 {
    60
}

fn default_confirm_poll_ms() -> u64 {
    500
}

fn default_keyfile() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("wallet.json")
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cluster: Cluster::default(),
            rpc_url: None,
            token_program_id: default_token_program_id(),
            token_symbol: default_token_symbol(),
            recipient: None,
            commitment: default_commitment(),
            request_timeout_secs: default_request_timeout_secs(),
            confirm_timeout_secs: default_confirm_timeout_secs(),
            confirm_poll_ms: default_confirm_poll_ms(),
            keyfile: default_keyfile(),
            tokens: BTreeMap::new(),
        }
    }
}

impl Config {
    /// `<config dir>/sol-dashboard/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Read `path`, or return defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| DashboardError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&contents)
            .map_err(|e| DashboardError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DashboardError::Config(e.to_string()))?;
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| DashboardError::Config(e.to_string()))?;
        fs::write(path, contents).map_err(|e| DashboardError::Config(e.to_string()))
    }

    pub fn rpc_url(&self) -> &str {
        self.rpc_url.as_deref().unwrap_or_else(|| self.cluster.url())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_ms)
    }

    /// Cluster defaults plus the `[tokens]` table.
    pub fn token_registry(&self) -> TokenRegistry {
        let mut registry = TokenRegistry::for_cluster(&self.cluster);
        for (symbol, mint) in &self.tokens {
            registry.insert(symbol, *mint);
        }
        registry
    }
}

/// Symbol <-> mint lookups. Symbols are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRegistry {
    by_symbol: BTreeMap<String, Pubkey>,
}

impl TokenRegistry {
    pub fn for_cluster(cluster: &Cluster) -> Self {
        let mut registry = TokenRegistry::default();
        match cluster {
            Cluster::Devnet => registry.insert("USDC", USDC_DEVNET_MINT),
            _ => {
                registry.insert("USDC", USDC_MAINNET_MINT);
                registry.insert("USDT", USDT_MAINNET_MINT);
            }
        }
        registry
    }

    pub fn insert(&mut self, symbol: &str, mint: Pubkey) {
        self.by_symbol.insert(symbol.trim().to_ascii_uppercase(), mint);
    }

    pub fn mint_for(&self, symbol: &str) -> Option<Pubkey> {
        self.by_symbol
            .get(&symbol.trim().to_ascii_uppercase())
            .copied()
    }

    pub fn symbol_for(&self, mint: &Pubkey) -> Option<&str> {
        self.by_symbol
            .iter()
            .find(|(_, m)| *m == mint)
            .map(|(symbol, _)| symbol.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}
