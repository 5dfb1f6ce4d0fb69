use bip39::{Language, Mnemonic};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use zeroize::{Zeroize, Zeroizing};

use crate::error::WalletError;

/// Generate a new 24-word BIP-39 mnemonic (256 bits of entropy).
pub fn generate_mnemonic() -> Result<SecretString, WalletError> {
    let mut entropy = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()));
    entropy.zeroize();
    Ok(SecretString::from(mnemonic?.to_string()))
}

pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse_in_normalized(Language::English, &normalize(phrase)).is_ok()
}

/// 64-byte BIP-39 seed for `phrase` + `passphrase`.
pub fn mnemonic_to_seed(
    phrase: &SecretString,
    passphrase: &str,
) -> Result<Zeroizing<[u8; 64]>, WalletError> {
    let normalized = Zeroizing::new(normalize(phrase.expose_secret()));
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_seed(passphrase)))
}

/// Lowercase and collapse whitespace, so pasted phrases parse.
fn normalize(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
