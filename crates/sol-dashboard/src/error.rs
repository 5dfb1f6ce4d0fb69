use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("invalid recipient {0:?}")]
    InvalidRecipient(String),

    #[error("insufficient balance: need {needed} lamports, have {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Wallet(#[from] wallet_core::WalletError),

    #[error(transparent)]
    Rpc(#[from] sol_rpc::RpcError),

    #[error(transparent)]
    Sol(#[from] chain_sol::SolError),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
