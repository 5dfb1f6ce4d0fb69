//! SPL Token program ids, associated token account derivation and the
//! token-account data layout.

use sha2::{Digest, Sha256};

use crate::error::SolError;
use crate::pubkey::Pubkey;

/// `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: Pubkey = Pubkey::new([
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79, 0xac,
    0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff, 0x00, 0xa9,
]);

/// `TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb`
pub const TOKEN_2022_PROGRAM_ID: Pubkey = Pubkey::new([
    0x06, 0xdd, 0xf6, 0xe1, 0xee, 0x75, 0x8f, 0xde, 0x18, 0x42, 0x5d, 0xbc, 0xe4, 0x6c, 0xcd, 0xda,
    0xb6, 0x1a, 0xfc, 0x4d, 0x83, 0xb9, 0x0d, 0x27, 0xfe, 0xbd, 0xf9, 0x28, 0xd8, 0xa1, 0x8b, 0xfc,
]);

/// `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey = Pubkey::new([
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d, 0x83,
    0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9, 0xf8, 0x59,
]);

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

// ---------------------------------------------------------------------------
// Program derived addresses
// ---------------------------------------------------------------------------

/// Associated token account for `wallet` + `mint` under `token_program`.
///
/// Seeds: `[wallet, token_program, mint]`, owned by the ATA program.
pub fn derive_associated_token_address(
    wallet: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Result<Pubkey, SolError> {
    find_program_address(
        &[wallet.as_ref(), token_program.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .map(|(address, _bump)| address)
}

/// First bump seed (255 down to 0) whose hash lands off the Ed25519 curve.
pub fn find_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<(Pubkey, u8), SolError> {
    (0u8..=255)
        .rev()
        .find_map(|bump| create_program_address(seeds, bump, program_id).map(|a| (a, bump)))
        .ok_or_else(|| SolError::InvalidAddress("could not find valid PDA bump seed".into()))
}

fn create_program_address(seeds: &[&[u8]], bump: u8, program_id: &Pubkey) -> Option<Pubkey> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id.as_ref());
    hasher.update(PDA_MARKER);

    let hash: [u8; 32] = hasher.finalize().into();
    (!is_on_curve(&hash)).then_some(Pubkey::new(hash))
}

fn is_on_curve(bytes: &[u8; 32]) -> bool {
    curve25519_dalek::edwards::CompressedEdwardsY(*bytes)
        .decompress()
        .is_some()
}

// ---------------------------------------------------------------------------
// Token account layout
// ---------------------------------------------------------------------------

/// Size of a plain SPL token account. Token-2022 accounts with extensions
/// are longer but share this prefix.
pub const TOKEN_ACCOUNT_LEN: usize = 165;

const STATE_OFFSET: usize = 108;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    Uninitialized,
    Initialized,
    Frozen,
}

/// The parts of a token account the dashboard reads.
///
/// ```text
///   0..32   mint
///  32..64   owner
///  64..72   amount (u64 LE, base units)
///  72..108  delegate (COption<Pubkey>)
/// 108       state
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccountLayout {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub state: AccountState,
}

impl TokenAccountLayout {
    pub fn unpack(data: &[u8]) -> Result<Self, SolError> {
        if data.len() < TOKEN_ACCOUNT_LEN {
            return Err(SolError::InvalidTokenAccount(format!(
                "expected at least {TOKEN_ACCOUNT_LEN} bytes, got {}",
                data.len()
            )));
        }

        let state = match data[STATE_OFFSET] {
            0 => AccountState::Uninitialized,
            1 => AccountState::Initialized,
            2 => AccountState::Frozen,
            other => {
                return Err(SolError::InvalidTokenAccount(format!(
                    "unknown account state {other}"
                )))
            }
        };

        let mut amount = [0u8; 8];
        amount.copy_from_slice(&data[64..72]);

        Ok(Self {
            mint: Pubkey::try_from(&data[0..32])?,
            owner: Pubkey::try_from(&data[32..64])?,
            amount: u64::from_le_bytes(amount),
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(mint: [u8; 32], owner: [u8; 32], amount: u64, state: u8) -> Vec<u8> {
        let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
        data[0..32].copy_from_slice(&mint);
        data[32..64].copy_from_slice(&owner);
        data[64..72].copy_from_slice(&amount.to_le_bytes());
        data[STATE_OFFSET] = state;
        data
    }

    #[test]
    fn program_id_constants_match_their_addresses() {
        assert_eq!(
            TOKEN_PROGRAM_ID.to_string(),
            "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
        );
        assert_eq!(
            TOKEN_2022_PROGRAM_ID.to_string(),
            "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb"
        );
        assert_eq!(
            ASSOCIATED_TOKEN_PROGRAM_ID.to_string(),
            "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL"
        );
    }

    #[test]
    fn ata_is_off_curve_and_deterministic() {
        let wallet = Pubkey::new([0xAA; 32]);
        let mint: Pubkey = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".parse().unwrap();

        let a = derive_associated_token_address(&wallet, &mint, &TOKEN_PROGRAM_ID).unwrap();
        let b = derive_associated_token_address(&wallet, &mint, &TOKEN_PROGRAM_ID).unwrap();

        assert_eq!(a, b);
        assert!(!is_on_curve(a.as_bytes()));
    }

    #[test]
    fn ata_depends_on_every_seed() {
        let wallet = Pubkey::new([0x01; 32]);
        let mint = Pubkey::new([0xFF; 32]);
        let base = derive_associated_token_address(&wallet, &mint, &TOKEN_PROGRAM_ID).unwrap();

        let other_wallet =
            derive_associated_token_address(&Pubkey::new([0x02; 32]), &mint, &TOKEN_PROGRAM_ID)
                .unwrap();
        let other_mint =
            derive_associated_token_address(&wallet, &Pubkey::new([0xFE; 32]), &TOKEN_PROGRAM_ID)
                .unwrap();
        let other_program =
            derive_associated_token_address(&wallet, &mint, &TOKEN_2022_PROGRAM_ID).unwrap();

        assert_ne!(base, other_wallet);
        assert_ne!(base, other_mint);
        assert_ne!(base, other_program);
    }

    #[test]
    fn basepoint_is_on_curve() {
        let mut basepoint = [0x66u8; 32];
        basepoint[0] = 0x58;
        assert!(is_on_curve(&basepoint));
    }

    #[test]
    fn unpack_reads_mint_owner_amount() {
        let data = packed([3; 32], [4; 32], 1_234_567, 1);
        let account = TokenAccountLayout::unpack(&data).unwrap();

        assert_eq!(account.mint, Pubkey::new([3; 32]));
        assert_eq!(account.owner, Pubkey::new([4; 32]));
        assert_eq!(account.amount, 1_234_567);
        assert_eq!(account.state, AccountState::Initialized);
    }

    #[test]
    fn unpack_accepts_extended_accounts() {
        let mut data = packed([3; 32], [4; 32], 9, 2);
        data.extend_from_slice(&[0u8; 40]);
        let account = TokenAccountLayout::unpack(&data).unwrap();
        assert_eq!(account.state, AccountState::Frozen);
    }

    #[test]
    fn unpack_rejects_short_data() {
        let err = TokenAccountLayout::unpack(&[0u8; 82]).unwrap_err();
        assert!(err.to_string().contains("expected at least 165 bytes, got 82"));
    }

    #[test]
    fn unpack_rejects_unknown_state() {
        let data = packed([3; 32], [4; 32], 9, 7);
        assert!(TokenAccountLayout::unpack(&data).is_err());
    }
}
