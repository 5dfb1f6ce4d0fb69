//! SLIP-0010 Ed25519 derivation on Solana's `m/44'/501'/{account}'/0'` path.

use ed25519_dalek::SigningKey;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::{Zeroize, Zeroizing};

use crate::error::WalletError;

type HmacSha512 = Hmac<Sha512>;

const HARDENED: u32 = 0x8000_0000;

/// Solana's BIP-44 coin type.
pub const SOLANA_COIN_TYPE: u32 = 501;

pub fn solana_path(account: u32) -> String {
    format!("m/44'/{SOLANA_COIN_TYPE}'/{account}'/0'")
}

/// Derive the signing key at `path` from a BIP-39 seed.
///
/// Ed25519 only supports hardened children, so every component must carry
/// a `'` or `h` suffix.
pub fn derive_signing_key(seed: &[u8], path: &str) -> Result<SigningKey, WalletError> {
    let components = parse_derivation_path(path)?;

    let mut mac = HmacSha512::new_from_slice(b"ed25519 seed")
        .map_err(|e| WalletError::DerivationFailed(e.to_string()))?;
    mac.update(seed);
    let mut node = Zeroizing::new(<[u8; 64]>::from(mac.finalize().into_bytes()));

    for index in components {
        let (key, chain_code) = node.split_at(32);
        let mut mac = HmacSha512::new_from_slice(chain_code)
            .map_err(|e| WalletError::DerivationFailed(e.to_string()))?;
        mac.update(&[0x00]);
        mac.update(key);
        mac.update(&(index | HARDENED).to_be_bytes());
        let mut child = <[u8; 64]>::from(mac.finalize().into_bytes());
        node.copy_from_slice(&child);
        child.zeroize();
    }

    let mut secret = [0u8; 32];
    secret.copy_from_slice(&node[..32]);
    let signing_key = SigningKey::from_bytes(&secret);
    secret.zeroize();
    Ok(signing_key)
}

/// Derive the Solana key for `account` from a BIP-39 seed.
pub fn derive_solana_key(seed: &[u8], account: u32) -> Result<SigningKey, WalletError> {
    derive_signing_key(seed, &solana_path(account))
}

/// Parse `"m/44'/501'/0'/0'"` into `[44, 501, 0, 0]`.
fn parse_derivation_path(path: &str) -> Result<Vec<u32>, WalletError> {
    let rest = path
        .strip_prefix("m/")
        .ok_or_else(|| WalletError::DerivationFailed("path must start with m/".into()))?;

    rest.split('/')
        .map(|component| {
            let digits = component
                .strip_suffix('\'')
                .or_else(|| component.strip_suffix('h'))
                .ok_or_else(|| {
                    WalletError::DerivationFailed(format!(
                        "ed25519 requires hardened components, got {component:?}"
                    ))
                })?;
            let index = digits.parse::<u32>().map_err(|e| {
                WalletError::DerivationFailed(format!("invalid path component {component:?}: {e}"))
            })?;
            if index >= HARDENED {
                return Err(WalletError::DerivationFailed(format!(
                    "path component {component:?} out of range"
                )));
            }
            Ok(index)
        })
        .collect()
}
