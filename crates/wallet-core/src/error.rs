use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    /// Shown verbatim to the user when an action needs a wallet.
    #[error("Wallet Not connected")]
    NotConnected,

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Keyfile error: {0}")]
    Keyfile(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Rpc(#[from] sol_rpc::RpcError),
}

impl From<chain_sol::SolError> for WalletError {
    fn from(e: chain_sol::SolError) -> Self {
        WalletError::SigningFailed(format!("SOL: {e}"))
    }
}

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        WalletError::Keyfile(e.to_string())
    }
}
