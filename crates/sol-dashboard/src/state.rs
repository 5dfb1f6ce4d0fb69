//! Dashboard state: plain data the view renders from.

use chain_sol::Pubkey;
use sol_rpc::TokenAmount;

use crate::config::Config;

/// Prefilled transfer amount, in SOL.
pub const DEFAULT_AMOUNT: &str = "0.001";

/// One row of "Your Token Balances".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    /// The token account.
    pub account: Pubkey,
    pub mint: Pubkey,
    /// Registry symbol, or the shortened mint when unknown.
    pub symbol: String,
    pub amount: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    /// Connected wallet, mirrored from the adapter.
    pub wallet: Option<Pubkey>,
    /// Transfer amount in SOL, as typed.
    pub amount_input: String,
    pub token_balances: Vec<TokenBalance>,
    /// Lamports. `None` until fetched.
    pub sol_balance: Option<u64>,
    /// A send is in flight.
    pub loading: bool,
    pub recipient: String,
    pub token_symbol: String,
    /// Token account of `recipient` holding `token_symbol`.
    pub token_address: Option<Pubkey>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            wallet: None,
            amount_input: DEFAULT_AMOUNT.to_string(),
            token_balances: Vec::new(),
            sol_balance: None,
            loading: false,
            recipient: String::new(),
            token_symbol: String::new(),
            token_address: None,
        }
    }
}

impl DashboardState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            recipient: config.recipient.clone().unwrap_or_default(),
            token_symbol: config.token_symbol.clone(),
            ..Self::default()
        }
    }

    /// Forget everything fetched for the current wallet.
    pub fn clear_balances(&mut self) {
        self.sol_balance = None;
        self.token_balances.clear();
    }
}
