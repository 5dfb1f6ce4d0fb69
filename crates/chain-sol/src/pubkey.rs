//! Base58-encoded fixed-size values: account keys, blockhashes and
//! transaction signatures.
//!
//! A Solana address is the Base58 encoding of the raw 32-byte Ed25519 public
//! key (no hashing step). Blockhashes use the same encoding, and signatures
//! are 64 bytes in the same alphabet.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SolError;

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], String> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| format!("base58 decode failed: {e}"))?;

    bytes
        .try_into()
        .map_err(|v: Vec<u8>| format!("expected {N} bytes, got {}", v.len()))
}

macro_rules! base58_value {
    ($name:ident, $len:expr, $err:ident) => {
        impl $name {
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn to_bytes(&self) -> [u8; $len] {
                self.0
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = SolError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<$len>(s.trim()).map(Self).map_err(SolError::$err)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = SolError;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                <[u8; $len]>::try_from(bytes).map(Self).map_err(|_| {
                    SolError::$err(format!("expected {} bytes, got {}", $len, bytes.len()))
                })
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&bs58::encode(&self.0).into_string())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

/// A 32-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Pubkey([u8; 32]);

base58_value!(Pubkey, 32, InvalidAddress);

impl Pubkey {
    /// Shortened form used in lists: first and last four characters.
    pub fn abbreviated(&self) -> String {
        let full = self.to_string();
        if full.len() <= 10 {
            return full;
        }
        format!("{}..{}", &full[..4], &full[full.len() - 4..])
    }
}

/// A recent blockhash, as returned by `getLatestBlockhash`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash([u8; 32]);

base58_value!(Hash, 32, SerializationError);

/// A 64-byte Ed25519 transaction signature. The first signature of a
/// transaction doubles as its id.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 64]);

base58_value!(Signature, 64, InvalidSignature);

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; 64])
    }
}

impl Signature {
    pub fn is_zeroed(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}
