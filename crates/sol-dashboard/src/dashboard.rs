use chain_sol::{
    sol_to_lamports, transfer_transaction, Pubkey, Signature, SolError, TokenAccountLayout,
};
use futures::future::join_all;
use sol_rpc::{confirm_transaction, KeyedAccount, RpcApi, TokenAccountsFilter};
use tracing::{debug, info, warn};
use wallet_core::{WalletAdapter, WalletError};

use crate::config::{Config, TokenRegistry};
use crate::error::{DashboardError, Result};
use crate::notify::{Notifier, Toast};
use crate::state::{DashboardState, TokenBalance};
use crate::view;

/// Flat fee for a single-signature transaction.
pub const TRANSFER_FEE_LAMPORTS: u64 = 5_000;

/// Headless wallet dashboard: balance, a SOL transfer form and token rows.
///
/// Every operation reports its outcome as a toast; failures never escape as
/// errors except from [`connect_wallet`](Self::connect_wallet).
pub struct Dashboard<R, W, N> {
    rpc: R,
    wallet: W,
    notifier: N,
    config: Config,
    registry: TokenRegistry,
    state: DashboardState,
}

impl<R: RpcApi, W: WalletAdapter, N: Notifier> Dashboard<R, W, N> {
    pub fn new(rpc: R, wallet: W, notifier: N, config: Config) -> Self {
        let registry = config.token_registry();
        let state = DashboardState::from_config(&config);
        Self {
            rpc,
            wallet,
            notifier,
            config,
            registry,
            state,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn render(&self) -> String {
        view::render(&self.state)
    }

    // -----------------------------------------------------------------------
    // Wallet
    // -----------------------------------------------------------------------

    /// Connect through the adapter, then load balances for the new key.
    pub async fn connect_wallet(&mut self) -> Result<Pubkey> {
        let pubkey = self.wallet.connect().await?;
        self.state.wallet = Some(pubkey);
        info!(%pubkey, adapter = self.wallet.name(), "dashboard wallet connected");
        self.refresh().await;
        Ok(pubkey)
    }

    pub async fn disconnect_wallet(&mut self) {
        self.wallet.disconnect().await;
        self.state.wallet = None;
        self.state.clear_balances();
    }

    // -----------------------------------------------------------------------
    // Form fields
    // -----------------------------------------------------------------------

    pub fn set_amount(&mut self, input: &str) {
        self.state.amount_input = input.to_string();
    }

    pub async fn set_recipient(&mut self, recipient: &str) {
        self.state.recipient = recipient.trim().to_string();
        self.resolve_token_address().await;
    }

    pub async fn set_token_symbol(&mut self, symbol: &str) {
        self.state.token_symbol = symbol.trim().to_string();
        self.resolve_token_address().await;
    }

    // -----------------------------------------------------------------------
    // Send
    // -----------------------------------------------------------------------

    /// Transfer `amount_input` SOL to `recipient` and wait for confirmation.
    pub async fn send_sol(&mut self) -> Option<Signature> {
        let Some(from) = self.wallet.public_key() else {
            self.notifier
                .notify(Toast::error(WalletError::NotConnected.to_string()));
            return None;
        };

        self.state.loading = true;
        let outcome = self.transfer(from).await;

        let signature = match outcome {
            Ok(signature) => {
                self.notifier.notify(Toast::success("Transaction Successful"));
                self.state.amount_input.clear();
                self.fetch_sol_balance().await;
                Some(signature)
            }
            Err(e) => {
                warn!(error = %e, "send failed");
                self.notify_error(&e);
                None
            }
        };

        self.state.loading = false;
        signature
    }

    async fn transfer(&self, from: Pubkey) -> Result<Signature> {
        let input = self.state.amount_input.trim();
        let lamports = sol_to_lamports(input).map_err(|e| DashboardError::InvalidAmount {
            input: input.to_string(),
            reason: match e {
                SolError::InvalidAmount(reason) => reason,
                other => other.to_string(),
            },
        })?;
        if lamports == 0 {
            return Err(DashboardError::InvalidAmount {
                input: input.to_string(),
                reason: "amount must be > 0".into(),
            });
        }

        let to: Pubkey = self
            .state
            .recipient
            .parse()
            .map_err(|_| DashboardError::InvalidRecipient(self.state.recipient.clone()))?;

        let commitment = self.config.commitment;
        let available = self.rpc.get_balance(&from, commitment).await?;
        let needed = lamports
            .checked_add(TRANSFER_FEE_LAMPORTS)
            .ok_or_else(|| DashboardError::InvalidAmount {
                input: input.to_string(),
                reason: "amount overflows u64".into(),
            })?;
        if available < needed {
            return Err(DashboardError::InsufficientBalance { needed, available });
        }

        let blockhash = self.rpc.get_latest_blockhash(commitment).await?;
        let tx = transfer_transaction(&from, &to, lamports, blockhash.blockhash)?;

        info!(%from, %to, lamports, "sending SOL");
        let signature = self.wallet.send_transaction(&tx, &self.rpc).await?;
        debug!(%signature, "submitted, waiting for confirmation");

        confirm_transaction(
            &self.rpc,
            &signature,
            commitment,
            self.config.confirm_timeout(),
            self.config.confirm_poll_interval(),
        )
        .await?;

        Ok(signature)
    }

    // -----------------------------------------------------------------------
    // Balances
    // -----------------------------------------------------------------------

    /// Run both balance fetches concurrently.
    pub async fn refresh(&mut self) {
        let Some(owner) = self.wallet.public_key() else {
            return;
        };
        let (tokens, sol) = tokio::join!(
            self.load_token_balances(&owner),
            self.load_sol_balance(&owner)
        );
        self.apply_token_balances(tokens);
        self.apply_sol_balance(sol);
    }

    pub async fn fetch_sol_balance(&mut self) {
        let Some(owner) = self.wallet.public_key() else {
            return;
        };
        let result = self.load_sol_balance(&owner).await;
        self.apply_sol_balance(result);
    }

    pub async fn fetch_token_balances(&mut self) {
        let Some(owner) = self.wallet.public_key() else {
            return;
        };
        let result = self.load_token_balances(&owner).await;
        self.apply_token_balances(result);
    }

    async fn load_sol_balance(&self, owner: &Pubkey) -> Result<u64> {
        Ok(self.rpc.get_balance(owner, self.config.commitment).await?)
    }

    async fn load_token_balances(&self, owner: &Pubkey) -> Result<Vec<TokenBalance>> {
        let commitment = self.config.commitment;
        let accounts = self
            .rpc
            .get_token_accounts_by_owner(
                owner,
                TokenAccountsFilter::ProgramId(self.config.token_program_id),
                commitment,
            )
            .await?;

        let layouts: Vec<_> = accounts
            .iter()
            .filter_map(unpack_token_account)
            .collect();

        let amounts = join_all(
            layouts
                .iter()
                .map(|(account, _)| self.rpc.get_token_account_balance(account, commitment)),
        )
        .await;

        layouts
            .into_iter()
            .zip(amounts)
            .map(|((account, layout), amount)| -> Result<TokenBalance> {
                Ok(TokenBalance {
                    account,
                    mint: layout.mint,
                    symbol: self.label(&layout.mint),
                    amount: amount?,
                })
            })
            .collect()
    }

    fn label(&self, mint: &Pubkey) -> String {
        self.registry
            .symbol_for(mint)
            .map(str::to_string)
            .unwrap_or_else(|| mint.abbreviated())
    }

    fn apply_sol_balance(&mut self, result: Result<u64>) {
        match result {
            Ok(lamports) => {
                debug!(lamports, "sol balance");
                self.state.sol_balance = Some(lamports);
            }
            Err(e) => self.notify_error(&e),
        }
    }

    fn apply_token_balances(&mut self, result: Result<Vec<TokenBalance>>) {
        match result {
            Ok(rows) => {
                debug!(count = rows.len(), "token balances");
                self.state.token_balances = rows;
            }
            Err(e) => self.notify_error(&e),
        }
    }

    // -----------------------------------------------------------------------
    // Token account lookup
    // -----------------------------------------------------------------------

    /// Find `recipient`'s token account for `token_symbol`.
    ///
    /// The previous result is cleared first, so `token_address` always
    /// belongs to the current recipient and symbol.
    pub async fn resolve_token_address(&mut self) -> Option<Pubkey> {
        self.state.token_address = None;
        let symbol = self.state.token_symbol.clone();
        if self.state.recipient.is_empty() || symbol.is_empty() {
            return None;
        }

        match self.find_token_account(&symbol).await {
            Ok(Some(account)) => {
                debug!(%account, %symbol, "resolved token account");
                self.state.token_address = Some(account);
                Some(account)
            }
            Ok(None) => {
                self.notifier
                    .notify(Toast::error(format!("No tokens found with symbol {symbol}")));
                None
            }
            Err(e) => {
                self.notify_error(&e);
                None
            }
        }
    }

    async fn find_token_account(&self, symbol: &str) -> Result<Option<Pubkey>> {
        let owner: Pubkey = self
            .state
            .recipient
            .parse()
            .map_err(|_| DashboardError::InvalidRecipient(self.state.recipient.clone()))?;
        let Some(mint) = self.registry.mint_for(symbol) else {
            return Ok(None);
        };

        let accounts = self
            .rpc
            .get_token_accounts_by_owner(
                &owner,
                TokenAccountsFilter::ProgramId(self.config.token_program_id),
                self.config.commitment,
            )
            .await?;

        Ok(accounts
            .iter()
            .filter_map(unpack_token_account)
            .find(|(_, layout)| layout.mint == mint)
            .map(|(account, _)| account))
    }

    fn notify_error(&self, e: &DashboardError) {
        self.notifier.notify(Toast::error(format!("Error: {e}")));
    }
}

/// Accounts that do not parse as SPL token accounts are skipped.
fn unpack_token_account(keyed: &KeyedAccount) -> Option<(Pubkey, TokenAccountLayout)> {
    match TokenAccountLayout::unpack(&keyed.account.data) {
        Ok(layout) => Some((keyed.pubkey, layout)),
        Err(e) => {
            warn!(account = %keyed.pubkey, error = %e, "skipping unreadable token account");
            None
        }
    }
}
