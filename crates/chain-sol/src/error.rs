use thiserror::Error;

/// Errors raised while parsing, building or signing Solana data.
#[derive(Debug, Error)]
pub enum SolError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("invalid token account: {0}")]
    InvalidTokenAccount(String),
}
