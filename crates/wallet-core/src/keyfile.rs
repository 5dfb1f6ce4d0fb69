//! Password-encrypted keyfile for a single Solana signing key.
//!
//! The 32-byte ed25519 secret is encrypted with AES-256-GCM under a key
//! stretched from the password with Argon2id. The document is JSON:
//!
//! ```json
//! { "version": 1, "pubkey": "<base58>", "kdf": { ... },
//!   "salt": "<hex>", "ciphertext": "<hex nonce || ciphertext || tag>" }
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;

use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, KeyInit, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use chain_sol::Pubkey;
use ed25519_dalek::SigningKey;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use crate::error::WalletError;

pub const KEYFILE_VERSION: u32 = 1;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// Argon2id cost parameters, stored alongside the ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub lanes: u32,
}

impl Default for KdfParams {
    /// 64 MiB, 3 passes, 4 lanes.
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            lanes: 4,
        }
    }
}

impl KdfParams {
    fn derive_key(&self, password: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; 32]>, WalletError> {
        let params = Params::new(self.memory_kib, self.iterations, self.lanes, Some(32))
            .map_err(|e| WalletError::Keyfile(format!("invalid argon2 params: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut output = Zeroizing::new([0u8; 32]);
        argon2
            .hash_password_into(password, salt, &mut output[..])
            .map_err(|e| WalletError::EncryptionFailed(format!("argon2 failed: {e}")))?;
        Ok(output)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyfile {
    pub version: u32,
    pub pubkey: Pubkey,
    #[serde(default)]
    pub kdf: KdfParams,
    pub salt: String,
    pub ciphertext: String,
}

impl Keyfile {
    /// Encrypt `signing_key` under `password` with the default KDF cost.
    pub fn encrypt(signing_key: &SigningKey, password: &[u8]) -> Result<Self, WalletError> {
        Self::encrypt_with(signing_key, password, KdfParams::default())
    }

    pub fn encrypt_with(
        signing_key: &SigningKey,
        password: &[u8],
        kdf: KdfParams,
    ) -> Result<Self, WalletError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let key = kdf.derive_key(password, &salt)?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut secret = signing_key.to_bytes();
        let sealed = cipher.encrypt(&nonce, secret.as_slice());
        secret.zeroize();
        let sealed = sealed.map_err(|e| WalletError::EncryptionFailed(e.to_string()))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + sealed.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&sealed);

        Ok(Self {
            version: KEYFILE_VERSION,
            pubkey: Pubkey::new(signing_key.verifying_key().to_bytes()),
            kdf,
            salt: hex::encode(salt),
            ciphertext: hex::encode(payload),
        })
    }

    /// Recover the signing key. A wrong password or tampered file is
    /// `DecryptionFailed`.
    pub fn decrypt(&self, password: &[u8]) -> Result<SigningKey, WalletError> {
        if self.version != KEYFILE_VERSION {
            return Err(WalletError::Keyfile(format!(
                "unsupported keyfile version {}",
                self.version
            )));
        }
        let salt = hex::decode(&self.salt)
            .map_err(|e| WalletError::Keyfile(format!("invalid salt: {e}")))?;
        let payload = hex::decode(&self.ciphertext)
            .map_err(|e| WalletError::Keyfile(format!("invalid ciphertext: {e}")))?;
        if payload.len() < NONCE_LEN {
            return Err(WalletError::Keyfile(format!(
                "ciphertext too short: {} bytes",
                payload.len()
            )));
        }

        let key = self.kdf.derive_key(password, &salt)?;
        let (nonce, sealed) = payload.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
        let plain = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(nonce), sealed)
                .map_err(|_| {
                    WalletError::DecryptionFailed("wrong password or corrupted keyfile".into())
                })?,
        );

        let secret: &[u8; 32] = plain.as_slice().try_into().map_err(|_| {
            WalletError::DecryptionFailed(format!("expected 32-byte secret, got {}", plain.len()))
        })?;
        let signing_key = SigningKey::from_bytes(secret);

        let derived = Pubkey::new(signing_key.verifying_key().to_bytes());
        if derived != self.pubkey {
            return Err(WalletError::Keyfile(format!(
                "keyfile pubkey {} does not match its secret ({derived})",
                self.pubkey
            )));
        }
        Ok(signing_key)
    }

    pub fn to_json(&self) -> Result<String, WalletError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| WalletError::Keyfile(format!("serialization failed: {e}")))
    }

    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        serde_json::from_str(json)
            .map_err(|e| WalletError::Keyfile(format!("malformed keyfile: {e}")))
    }

    /// Write the keyfile, creating parent directories. On unix the file is
    /// created with mode `0600`.
    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = self.to_json()?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        debug!(path = %path.display(), pubkey = %self.pubkey, "keyfile written");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let json = fs::read_to_string(path)
            .map_err(|e| WalletError::Keyfile(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}
