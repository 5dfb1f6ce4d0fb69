use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use chain_sol::{Pubkey, Transaction};
use ed25519_dalek::SigningKey;
use secrecy::{ExposeSecret, SecretBox, SecretString};
use tracing::info;
use zeroize::Zeroizing;

use crate::adapter::WalletAdapter;
use crate::derivation::derive_solana_key;
use crate::error::WalletError;
use crate::keyfile::Keyfile;
use crate::mnemonic::mnemonic_to_seed;

/// Where a [`KeypairWallet`] gets its key on `connect`.
pub enum WalletSource {
    Keyfile {
        path: PathBuf,
        password: SecretString,
    },
    Mnemonic {
        phrase: SecretString,
        passphrase: SecretString,
        account: u32,
    },
    /// A raw 32-byte ed25519 secret.
    SecretKey(SecretBox<[u8; 32]>),
}

impl WalletSource {
    pub fn secret_key(bytes: [u8; 32]) -> Self {
        WalletSource::SecretKey(SecretBox::new(Box::new(bytes)))
    }

    fn load(&self) -> Result<SigningKey, WalletError> {
        match self {
            WalletSource::Keyfile { path, password } => {
                Keyfile::load(path)?.decrypt(password.expose_secret().as_bytes())
            }
            WalletSource::Mnemonic {
                phrase,
                passphrase,
                account,
            } => {
                let seed = mnemonic_to_seed(phrase, passphrase.expose_secret())?;
                derive_solana_key(seed.as_slice(), *account)
            }
            WalletSource::SecretKey(bytes) => Ok(SigningKey::from_bytes(bytes.expose_secret())),
        }
    }
}

impl fmt::Debug for WalletSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletSource::Keyfile { path, .. } => {
                f.debug_struct("Keyfile").field("path", path).finish_non_exhaustive()
            }
            WalletSource::Mnemonic { account, .. } => f
                .debug_struct("Mnemonic")
                .field("account", account)
                .finish_non_exhaustive(),
            WalletSource::SecretKey(_) => f.write_str("SecretKey(..)"),
        }
    }
}

/// Wallet adapter backed by a local ed25519 key.
///
/// The key lives in memory only between `connect` and `disconnect`.
/// `SigningKey` zeroizes itself on drop.
#[derive(Debug)]
pub struct KeypairWallet {
    source: WalletSource,
    key: Option<SigningKey>,
}

impl KeypairWallet {
    pub fn new(source: WalletSource) -> Self {
        Self { source, key: None }
    }

    /// Build an already-connected wallet from a signing key.
    pub fn from_signing_key(key: SigningKey) -> Self {
        let bytes = Zeroizing::new(key.to_bytes());
        Self {
            source: WalletSource::secret_key(*bytes),
            key: Some(key),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.key.is_some()
    }
}

#[async_trait]
impl WalletAdapter for KeypairWallet {
    fn name(&self) -> &str {
        "Keypair"
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.key
            .as_ref()
            .map(|k| Pubkey::new(k.verifying_key().to_bytes()))
    }

    async fn connect(&mut self) -> Result<Pubkey, WalletError> {
        if let Some(pubkey) = self.public_key() {
            return Ok(pubkey);
        }
        let key = self.source.load()?;
        let pubkey = Pubkey::new(key.verifying_key().to_bytes());
        self.key = Some(key);
        info!(%pubkey, source = ?self.source, "wallet connected");
        Ok(pubkey)
    }

    async fn disconnect(&mut self) {
        if let Some(key) = self.key.take() {
            info!(pubkey = %Pubkey::new(key.verifying_key().to_bytes()), "wallet disconnected");
        }
    }

    async fn sign_transaction(&self, tx: &Transaction) -> Result<Transaction, WalletError> {
        let key = self.key.as_ref().ok_or(WalletError::NotConnected)?;
        let mut signed = tx.clone();
        signed.sign(key)?;
        Ok(signed)
    }
}
