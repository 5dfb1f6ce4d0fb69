//! Solana primitives for the dashboard.
//!
//! Addresses, lamport arithmetic, the compact transaction wire format and the
//! bits of the SPL Token program the dashboard reads. Everything is built on
//! `ed25519-dalek`, `curve25519-dalek` and `bs58` rather than `solana-sdk`.

pub mod error;
pub mod pubkey;
pub mod spl_token;
pub mod transaction;
pub mod units;

pub use error::SolError;
pub use pubkey::{Hash, Pubkey, Signature};
pub use spl_token::{
    derive_associated_token_address, find_program_address, AccountState, TokenAccountLayout,
    ASSOCIATED_TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID, TOKEN_ACCOUNT_LEN, TOKEN_PROGRAM_ID,
};
#[cfg(any(test, feature = "test-utils"))]
pub use transaction::decode_compact_u16;
pub use transaction::{
    encode_compact_u16, system_transfer, transfer_transaction, AccountMeta, CompiledInstruction,
    Instruction, Message, Transaction, SYSTEM_PROGRAM_ID,
};
pub use units::{lamports_to_sol, lamports_to_sol_string, sol_to_lamports, LAMPORTS_PER_SOL};
