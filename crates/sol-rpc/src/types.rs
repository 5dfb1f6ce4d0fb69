//! Request and response shapes for the RPC methods we call.

use std::fmt;
use std::str::FromStr;

use chain_sol::{Hash, Pubkey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

/// How final a read or confirmation must be.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(RpcError::Decode {
                method: "commitment".into(),
                reason: format!("unknown commitment level {other:?}"),
            }),
        }
    }
}

/// A public Solana cluster, or a custom RPC endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Cluster {
    MainnetBeta,
    #[default]
    Devnet,
    Testnet,
    Localnet,
    Custom(String),
}

impl Cluster {
    /// JSON-RPC endpoint for the cluster.
    pub fn url(&self) -> &str {
        match self {
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
            Cluster::Custom(url) => url,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::Localnet => "localnet",
            Cluster::Custom(url) => url,
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Cluster {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "mainnet-beta" | "mainnet" | "m" => Ok(Cluster::MainnetBeta),
            "devnet" | "d" => Ok(Cluster::Devnet),
            "testnet" | "t" => Ok(Cluster::Testnet),
            "localnet" | "localhost" | "l" => Ok(Cluster::Localnet),
            url if url.starts_with("http://") || url.starts_with("https://") => {
                Ok(Cluster::Custom(url.to_string()))
            }
            other => Err(RpcError::InvalidCluster(other.to_string())),
        }
    }
}

impl TryFrom<String> for Cluster {
    type Error = RpcError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Cluster> for String {
    fn from(c: Cluster) -> Self {
        c.name().to_string()
    }
}

/// Which token accounts `getTokenAccountsByOwner` should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAccountsFilter {
    Mint(Pubkey),
    ProgramId(Pubkey),
}

impl TokenAccountsFilter {
    pub(crate) fn to_json(self) -> Value {
        match self {
            TokenAccountsFilter::Mint(mint) => serde_json::json!({ "mint": mint.to_string() }),
            TokenAccountsFilter::ProgramId(id) => {
                serde_json::json!({ "programId": id.to_string() })
            }
        }
    }
}

/// Account data with the base64 payload already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub lamports: u64,
    pub owner: Pubkey,
    pub data: Vec<u8>,
    pub executable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedAccount {
    pub pubkey: Pubkey,
    pub account: Account,
}

/// Token balance as reported by `getTokenAccountBalance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    /// Base units, as a decimal string (u64 does not survive JSON numbers).
    pub amount: String,
    pub decimals: u8,
    pub ui_amount_string: String,
}

impl TokenAmount {
    pub fn base_units(&self) -> Option<u64> {
        self.amount.parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockhashInfo {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// One entry of `getSignatureStatuses`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    pub slot: u64,
    /// `None` once the block is rooted.
    pub confirmations: Option<u64>,
    pub err: Option<Value>,
    pub confirmation_status: Option<Commitment>,
}

impl SignatureStatus {
    /// Commitment the transaction has reached.
    pub fn commitment(&self) -> Commitment {
        match (self.confirmation_status, self.confirmations) {
            (Some(c), _) => c,
            (None, None) => Commitment::Finalized,
            (None, Some(_)) => Commitment::Processed,
        }
    }

    pub fn satisfies(&self, wanted: Commitment) -> bool {
        self.commitment() >= wanted
    }
}

// ---------------------------------------------------------------------------
// Wire envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    pub result: Option<Value>,
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// `{ "context": { "slot": .. }, "value": .. }`
#[derive(Debug, Deserialize)]
pub(crate) struct WithContext<T> {
    pub value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UiBlockhash {
    pub blockhash: String,
    pub last_valid_block_height: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UiKeyedAccount {
    pub pubkey: String,
    pub account: UiAccount,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UiAccount {
    pub lamports: u64,
    pub owner: String,
    /// `[payload, "base64"]`
    pub data: (String, String),
    #[serde(default)]
    pub executable: bool,
}
