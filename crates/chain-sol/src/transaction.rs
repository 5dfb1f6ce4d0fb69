//! Legacy Solana transaction format: compile, serialize, sign.
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]:
//!       program_id_index    u8
//!       num_accounts        compact-u16
//!       account_indices     u8 * num_accounts
//!       data_len            compact-u16
//!       data                u8 * data_len
//! ```

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

use crate::error::SolError;
use crate::pubkey::{Hash, Pubkey, Signature};

/// The System Program: 32 zero bytes, `11111111111111111111111111111111`.
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new([0u8; 32]);

/// System Program `Transfer` instruction index (u32 LE).
const SYSTEM_TRANSFER_IX_INDEX: u32 = 2;

/// Account indices are a single byte on the wire.
const MAX_ACCOUNT_KEYS: usize = u8::MAX as usize + 1;

// ---------------------------------------------------------------------------
// Compact-u16
// ---------------------------------------------------------------------------

/// Encode a `u16` in Solana's compact-u16 (7 bits per byte, LE, MSB = more).
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Decode a compact-u16 from the front of `data`.
///
/// Returns `(value, bytes_consumed)`.
#[cfg(any(test, feature = "test-utils"))]
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), SolError> {
    let truncated =
        || SolError::SerializationError("unexpected end of data while decoding compact-u16".into());

    let mut value: u32 = 0;
    for (i, byte) in data.iter().take(3).enumerate() {
        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return u16::try_from(value)
                .map(|v| (v, i + 1))
                .map_err(|_| SolError::SerializationError("compact-u16 value overflow".into()));
        }
    }

    if data.len() >= 3 {
        Err(SolError::SerializationError("compact-u16 longer than 3 bytes".into()))
    } else {
        Err(truncated())
    }
}

fn compact_len(len: usize, what: &str) -> Result<Vec<u8>, SolError> {
    u16::try_from(len)
        .map(encode_compact_u16)
        .map_err(|_| SolError::SerializationError(format!("too many {what}: {len}")))
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// An instruction before compilation into a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// System Program transfer of `lamports` from `from` to `to`.
pub fn system_transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_IX_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
        data,
    }
}

/// An instruction whose accounts are indices into `Message::account_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// The signed portion of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
    /// Canonical order: writable signers (fee payer first), read-only
    /// signers, writable non-signers, read-only non-signers.
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Hash,
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Compile `instructions` with `fee_payer` as the first signer.
    pub fn compile(
        instructions: &[Instruction],
        fee_payer: &Pubkey,
        recent_blockhash: Hash,
    ) -> Result<Self, SolError> {
        struct Entry {
            pubkey: Pubkey,
            is_signer: bool,
            is_writable: bool,
        }

        let mut entries: Vec<Entry> = Vec::new();
        let mut upsert = |pubkey: Pubkey, signer: bool, writable: bool| {
            if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
                entry.is_signer |= signer;
                entry.is_writable |= writable;
            } else {
                entries.push(Entry {
                    pubkey,
                    is_signer: signer,
                    is_writable: writable,
                });
            }
        };

        upsert(*fee_payer, true, true);
        for ix in instructions {
            for meta in &ix.accounts {
                upsert(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            upsert(ix.program_id, false, false);
        }

        if entries.len() > MAX_ACCOUNT_KEYS {
            return Err(SolError::TransactionBuildError(format!(
                "too many accounts: {} (max {MAX_ACCOUNT_KEYS})",
                entries.len()
            )));
        }

        // Stable sort: the fee payer is inserted first and is a writable
        // signer, so it stays at index 0.
        entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
            (true, true) => 0u8,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        let count = |f: fn(&Entry) -> bool| entries.iter().filter(|&e| f(e)).count() as u8;
        let num_required_signatures = count(|e| e.is_signer);
        let num_readonly_signed = count(|e| e.is_signer && !e.is_writable);
        let num_readonly_unsigned = count(|e| !e.is_signer && !e.is_writable);

        let account_keys: Vec<Pubkey> = entries.iter().map(|e| e.pubkey).collect();
        let index_of = |key: &Pubkey| -> Result<u8, SolError> {
            account_keys
                .iter()
                .position(|k| k == key)
                .map(|i| i as u8)
                .ok_or_else(|| SolError::TransactionBuildError(format!("{key} not in account keys")))
        };

        let compiled = instructions
            .iter()
            .map(|ix| {
                Ok(CompiledInstruction {
                    program_id_index: index_of(&ix.program_id)?,
                    account_indices: ix
                        .accounts
                        .iter()
                        .map(|meta| index_of(&meta.pubkey))
                        .collect::<Result<_, SolError>>()?,
                    data: ix.data.clone(),
                })
            })
            .collect::<Result<Vec<_>, SolError>>()?;

        Ok(Self {
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            account_keys,
            recent_blockhash,
            instructions: compiled,
        })
    }

    /// Accounts whose signatures the transaction needs, in slot order.
    pub fn signers(&self) -> &[Pubkey] {
        let n = (self.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.signers().first()
    }

    /// The bytes that get signed.
    pub fn serialize(&self) -> Result<Vec<u8>, SolError> {
        let mut buf = Vec::with_capacity(256);

        buf.push(self.num_required_signatures);
        buf.push(self.num_readonly_signed);
        buf.push(self.num_readonly_unsigned);

        buf.extend_from_slice(&compact_len(self.account_keys.len(), "account keys")?);
        for key in &self.account_keys {
            buf.extend_from_slice(key.as_ref());
        }

        buf.extend_from_slice(self.recent_blockhash.as_ref());

        buf.extend_from_slice(&compact_len(self.instructions.len(), "instructions")?);
        for ix in &self.instructions {
            buf.push(ix.program_id_index);
            buf.extend_from_slice(&compact_len(ix.account_indices.len(), "instruction accounts")?);
            buf.extend_from_slice(&ix.account_indices);
            buf.extend_from_slice(&compact_len(ix.data.len(), "instruction data bytes")?);
            buf.extend_from_slice(&ix.data);
        }

        Ok(buf)
    }

    /// Parse a serialized message. Trailing bytes are an error.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn deserialize(bytes: &[u8]) -> Result<Self, SolError> {
        let mut reader = Reader { bytes, pos: 0 };

        let num_required_signatures = reader.u8()?;
        let num_readonly_signed = reader.u8()?;
        let num_readonly_unsigned = reader.u8()?;

        let num_accounts = reader.compact_u16()?;
        let account_keys = (0..num_accounts)
            .map(|_| reader.array::<32>().map(Pubkey::new))
            .collect::<Result<Vec<_>, _>>()?;

        let recent_blockhash = Hash::new(reader.array::<32>()?);

        let num_instructions = reader.compact_u16()?;
        let mut instructions = Vec::with_capacity(num_instructions as usize);
        for _ in 0..num_instructions {
            let program_id_index = reader.u8()?;
            let n = reader.compact_u16()? as usize;
            let account_indices = reader.take(n)?.to_vec();
            let n = reader.compact_u16()? as usize;
            let data = reader.take(n)?.to_vec();
            instructions.push(CompiledInstruction {
                program_id_index,
                account_indices,
                data,
            });
        }

        if reader.pos != bytes.len() {
            return Err(SolError::SerializationError(format!(
                "{} trailing bytes after message",
                bytes.len() - reader.pos
            )));
        }

        Ok(Self {
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

#[cfg(any(test, feature = "test-utils"))]
impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], SolError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| SolError::SerializationError("transaction data truncated".into()))?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, SolError> {
        Ok(self.take(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], SolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn compact_u16(&mut self) -> Result<u16, SolError> {
        let (value, used) = decode_compact_u16(&self.bytes[self.pos..])?;
        self.pos += used;
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A message plus one signature slot per required signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signatures: Vec<Signature>,
    pub message: Message,
}

impl Transaction {
    /// Wrap a message with zeroed signature slots.
    pub fn new_unsigned(message: Message) -> Self {
        Self {
            signatures: vec![Signature::default(); message.num_required_signatures as usize],
            message,
        }
    }

    /// The transaction id: its first signature.
    pub fn signature(&self) -> Option<&Signature> {
        self.signatures.first()
    }

    pub fn is_fully_signed(&self) -> bool {
        !self.signatures.is_empty() && self.signatures.iter().all(|s| !s.is_zeroed())
    }

    /// Sign the message and write the signature into the slot belonging to
    /// `signing_key`'s public key.
    pub fn sign(&mut self, signing_key: &SigningKey) -> Result<Signature, SolError> {
        let pubkey = Pubkey::new(signing_key.verifying_key().to_bytes());
        let slot = self
            .message
            .signers()
            .iter()
            .position(|k| *k == pubkey)
            .ok_or_else(|| {
                SolError::SigningError(format!("{pubkey} not found in transaction signers"))
            })?;

        if self.signatures.len() != self.message.num_required_signatures as usize {
            return Err(SolError::SigningError(format!(
                "expected {} signature slots, found {}",
                self.message.num_required_signatures,
                self.signatures.len()
            )));
        }

        let message_bytes = self.message.serialize()?;
        let signature = Signature::new(signing_key.sign(&message_bytes).to_bytes());
        self.signatures[slot] = signature;
        Ok(signature)
    }

    /// Check every signature slot against its signer.
    pub fn verify(&self) -> Result<(), SolError> {
        let message_bytes = self.message.serialize()?;
        let signers = self.message.signers();
        if signers.len() != self.signatures.len() {
            return Err(SolError::InvalidSignature(format!(
                "{} signatures for {} signers",
                self.signatures.len(),
                signers.len()
            )));
        }

        for (key, sig) in signers.iter().zip(&self.signatures) {
            let vk = VerifyingKey::from_bytes(key.as_bytes())
                .map_err(|e| SolError::InvalidSignature(format!("{key}: {e}")))?;
            vk.verify(&message_bytes, &ed25519_dalek::Signature::from_bytes(sig.as_bytes()))
                .map_err(|_| SolError::InvalidSignature(format!("bad signature for {key}")))?;
        }

        Ok(())
    }

    /// Wire format, as submitted through `sendTransaction`.
    pub fn to_wire(&self) -> Result<Vec<u8>, SolError> {
        let message_bytes = self.message.serialize()?;
        let mut wire = compact_len(self.signatures.len(), "signatures")?;
        wire.reserve(self.signatures.len() * Signature::LEN + message_bytes.len());
        for sig in &self.signatures {
            wire.extend_from_slice(sig.as_ref());
        }
        wire.extend_from_slice(&message_bytes);
        Ok(wire)
    }

    /// Parse the wire format back into a transaction.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn from_wire(wire: &[u8]) -> Result<Self, SolError> {
        let (num_sigs, used) = decode_compact_u16(wire)?;
        let sigs_end = used + num_sigs as usize * Signature::LEN;
        if sigs_end > wire.len() {
            return Err(SolError::SerializationError(
                "transaction too short: signature slots exceed length".into(),
            ));
        }

        let signatures = wire[used..sigs_end]
            .chunks_exact(Signature::LEN)
            .map(Signature::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let message = Message::deserialize(&wire[sigs_end..])?;

        Ok(Self {
            signatures,
            message,
        })
    }
}

/// Unsigned single-transfer transaction paid for by `from`.
pub fn transfer_transaction(
    from: &Pubkey,
    to: &Pubkey,
    lamports: u64,
    recent_blockhash: Hash,
) -> Result<Transaction, SolError> {
    if lamports == 0 {
        return Err(SolError::InvalidAmount("amount must be > 0".into()));
    }
    let message =
        Message::compile(&[system_transfer(from, to, lamports)], from, recent_blockhash)?;
    Ok(Transaction::new_unsigned(message))
}
