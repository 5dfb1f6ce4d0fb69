//! Wallet side of the dashboard: the [`WalletAdapter`] seam, a local
//! keypair implementation, and the key material plumbing behind it
//! (BIP-39 phrases, SLIP-0010 derivation, encrypted keyfiles).

pub mod adapter;
pub mod derivation;
pub mod error;
pub mod keyfile;
pub mod keypair_wallet;
pub mod mnemonic;

pub use adapter::WalletAdapter;
pub use derivation::{derive_signing_key, derive_solana_key, solana_path};
pub use error::WalletError;
pub use keyfile::{KdfParams, Keyfile};
pub use keypair_wallet::{KeypairWallet, WalletSource};
pub use mnemonic::{generate_mnemonic, mnemonic_to_seed, validate_mnemonic};
