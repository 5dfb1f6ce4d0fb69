use chain_sol::{SolError, Signature};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("no result in {0} response")]
    MissingResult(String),

    #[error("failed to decode {method} response: {reason}")]
    Decode { method: String, reason: String },

    #[error("transaction {signature} failed: {reason}")]
    TransactionFailed { signature: Signature, reason: String },

    #[error("transaction {signature} was not confirmed within {secs}s")]
    ConfirmTimeout { signature: Signature, secs: u64 },

    #[error("invalid cluster: {0}")]
    InvalidCluster(String),

    #[error(transparent)]
    Sol(#[from] SolError),
}

pub type Result<T> = std::result::Result<T, RpcError>;

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        RpcError::Transport(e.to_string())
    }
}
