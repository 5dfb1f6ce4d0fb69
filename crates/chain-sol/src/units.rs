//! Lamport <-> SOL conversion.
//!
//! Amounts typed by a user are parsed as exact decimals, never through `f64`,
//! so `0.1` SOL is always `100_000_000` lamports.

use crate::error::SolError;

/// Number of lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Decimal places of the native coin.
pub const SOL_DECIMALS: usize = 9;

/// Parse a decimal SOL amount (`"1"`, `"0.001"`, `".5"`) into lamports.
///
/// Rejects empty input, signs, exponents, more than nine fractional digits
/// and values that overflow `u64`.
pub fn sol_to_lamports(input: &str) -> Result<u64, SolError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(SolError::InvalidAmount("amount is empty".into()));
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(SolError::InvalidAmount(format!("not a number: {s}")));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SolError::InvalidAmount(format!("not a number: {s}")));
    }
    if frac.len() > SOL_DECIMALS {
        return Err(SolError::InvalidAmount(format!(
            "at most {SOL_DECIMALS} decimal places allowed, got {}",
            frac.len()
        )));
    }

    let overflow = || SolError::InvalidAmount(format!("amount too large: {s}"));

    let whole_lamports = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u64>()
            .map_err(|_| overflow())?
            .checked_mul(LAMPORTS_PER_SOL)
            .ok_or_else(overflow)?
    };

    let frac_lamports = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = SOL_DECIMALS);
        padded.parse::<u64>().map_err(|_| overflow())?
    };

    whole_lamports.checked_add(frac_lamports).ok_or_else(overflow)
}

/// Format lamports as a SOL decimal string without trailing zeros.
pub fn lamports_to_sol_string(lamports: u64) -> String {
    let whole = lamports / LAMPORTS_PER_SOL;
    let frac = lamports % LAMPORTS_PER_SOL;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0>width$}", width = SOL_DECIMALS);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Lossy conversion for display purposes only.
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}
