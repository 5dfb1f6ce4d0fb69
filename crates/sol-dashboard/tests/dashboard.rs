//! Dashboard behaviour against an in-memory node.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chain_sol::{Hash, Pubkey, Signature, Transaction, TOKEN_ACCOUNT_LEN, TOKEN_PROGRAM_ID};
use serde_json::json;
use sol_dashboard::config::USDC_DEVNET_MINT;
use sol_dashboard::{Config, Dashboard, MemoryNotifier, Toast, ToastLevel};
use sol_rpc::{
    Account, BlockhashInfo, Commitment, KeyedAccount, Result, RpcApi, RpcError, SignatureStatus,
    TokenAccountsFilter, TokenAmount,
};
use wallet_core::{KeypairWallet, WalletAdapter, WalletSource};

const WALLET_SECRET: [u8; 32] = [7; 32];
const UNKNOWN_MINT: Pubkey = Pubkey::new([0x55; 32]);

fn recipient() -> Pubkey {
    Pubkey::new([0x21; 32])
}

fn token_account(mint: Pubkey, owner: Pubkey, amount: u64) -> Account {
    let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
    data[0..32].copy_from_slice(mint.as_bytes());
    data[32..64].copy_from_slice(owner.as_bytes());
    data[64..72].copy_from_slice(&amount.to_le_bytes());
    data[108] = 1;
    Account {
        lamports: 2_039_280,
        owner: TOKEN_PROGRAM_ID,
        data,
        executable: false,
    }
}

fn ui_amount(amount: &str, decimals: u8, ui: &str) -> TokenAmount {
    TokenAmount {
        amount: amount.into(),
        decimals,
        ui_amount_string: ui.into(),
    }
}

/// Scripted node. Every method call is recorded by its JSON-RPC name.
#[derive(Default)]
struct MockRpc {
    balance: Mutex<u64>,
    token_accounts: Mutex<HashMap<Pubkey, Vec<KeyedAccount>>>,
    token_amounts: Mutex<HashMap<Pubkey, TokenAmount>>,
    fail_balance: Mutex<bool>,
    fail_token_accounts: Mutex<bool>,
    hang_send: Mutex<bool>,
    send_error: Mutex<Option<String>>,
    status_error: Mutex<Option<serde_json::Value>>,
    calls: Mutex<Vec<&'static str>>,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl MockRpc {
    fn with_balance(lamports: u64) -> Self {
        let rpc = Self::default();
        *rpc.balance.lock().unwrap() = lamports;
        rpc
    }

    fn add_token_account(
        &self,
        owner: Pubkey,
        account: Pubkey,
        mint: Pubkey,
        amount: TokenAmount,
    ) {
        let base: u64 = amount.amount.parse().unwrap();
        self.token_accounts
            .lock()
            .unwrap()
            .entry(owner)
            .or_default()
            .push(KeyedAccount {
                pubkey: account,
                account: token_account(mint, owner, base),
            });
        self.token_amounts.lock().unwrap().insert(account, amount);
    }

    fn record(&self, method: &'static str) {
        self.calls.lock().unwrap().push(method);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|m| ***m == *method).count()
    }

    fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl RpcApi for MockRpc {
    async fn get_balance(&self, _: &Pubkey, _: Commitment) -> Result<u64> {
        self.record("getBalance");
        if *self.fail_balance.lock().unwrap() {
            return Err(RpcError::Transport("connection refused".into()));
        }
        Ok(*self.balance.lock().unwrap())
    }

    async fn get_latest_blockhash(&self, _: Commitment) -> Result<BlockhashInfo> {
        self.record("getLatestBlockhash");
        Ok(BlockhashInfo {
            blockhash: Hash::new([0xBB; 32]),
            last_valid_block_height: 1_000,
        })
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        filter: TokenAccountsFilter,
        _: Commitment,
    ) -> Result<Vec<KeyedAccount>> {
        self.record("getTokenAccountsByOwner");
        assert_eq!(filter, TokenAccountsFilter::ProgramId(TOKEN_PROGRAM_ID));
        if *self.fail_token_accounts.lock().unwrap() {
            return Err(RpcError::Transport("connection reset".into()));
        }
        Ok(self
            .token_accounts
            .lock()
            .unwrap()
            .get(owner)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_token_account_balance(
        &self,
        account: &Pubkey,
        _: Commitment,
    ) -> Result<TokenAmount> {
        self.record("getTokenAccountBalance");
        self.token_amounts
            .lock()
            .unwrap()
            .get(account)
            .cloned()
            .ok_or_else(|| RpcError::Rpc {
                code: -32602,
                message: "Invalid param: could not find account".into(),
            })
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<Signature> {
        self.record("sendTransaction");
        let hang = *self.hang_send.lock().unwrap();
        if hang {
            std::future::pending::<()>().await;
        }
        if let Some(message) = self.send_error.lock().unwrap().clone() {
            return Err(RpcError::Rpc {
                code: -32002,
                message,
            });
        }
        let tx = Transaction::from_wire(wire)?;
        self.sent.lock().unwrap().push(wire.to_vec());
        Ok(*tx.signature().unwrap())
    }

    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureStatus>>> {
        self.record("getSignatureStatuses");
        let err = self.status_error.lock().unwrap().clone();
        Ok(signatures
            .iter()
            .map(|_| {
                Some(SignatureStatus {
                    slot: 42,
                    confirmations: Some(0),
                    err: err.clone(),
                    confirmation_status: Some(Commitment::Processed),
                })
            })
            .collect())
    }
}

type TestDashboard = Dashboard<MockRpc, KeypairWallet, MemoryNotifier>;

async fn wallet_pubkey() -> Pubkey {
    let mut wallet = KeypairWallet::new(WalletSource::secret_key(WALLET_SECRET));
    wallet.connect().await.unwrap()
}

fn config() -> Config {
    Config {
        recipient: Some(recipient().to_string()),
        ..Config::default()
    }
}

fn dashboard(rpc: MockRpc) -> TestDashboard {
    Dashboard::new(
        rpc,
        KeypairWallet::new(WalletSource::secret_key(WALLET_SECRET)),
        MemoryNotifier::new(),
        config(),
    )
}

async fn connected(rpc: MockRpc) -> TestDashboard {
    let mut dash = dashboard(rpc);
    dash.connect_wallet().await.unwrap();
    dash.rpc().clear_calls();
    dash.notifier().clear();
    dash
}

fn toasts(dash: &TestDashboard) -> Vec<Toast> {
    dash.notifier().toasts()
}

// ─── send_sol ───────────────────────────────────────────────────────

#[tokio::test]
async fn send_without_wallet_toasts_and_touches_nothing() {
    let mut dash = dashboard(MockRpc::with_balance(10_000_000_000));

    assert!(dash.send_sol().await.is_none());

    assert_eq!(toasts(&dash), vec![Toast::error("Wallet Not connected")]);
    assert!(dash.rpc().calls().is_empty());
    assert!(!dash.state().loading);
    assert_eq!(dash.state().amount_input, "0.001");
}

#[tokio::test]
async fn successful_send() {
    let mut dash = connected(MockRpc::with_balance(1_000_000_000)).await;
    let sender = dash.wallet().public_key().unwrap();

    let signature = dash.send_sol().await.expect("send should succeed");

    assert_eq!(toasts(&dash), vec![Toast::success("Transaction Successful")]);
    assert_eq!(dash.state().amount_input, "");
    assert!(!dash.state().loading);
    assert_eq!(dash.state().sol_balance, Some(1_000_000_000));
    assert_eq!(
        dash.rpc().calls(),
        vec![
            "getBalance",
            "getLatestBlockhash",
            "sendTransaction",
            "getSignatureStatuses",
            "getBalance",
        ]
    );

    let sent = dash.rpc().sent.lock().unwrap();
    let tx = Transaction::from_wire(&sent[0]).unwrap();
    tx.verify().unwrap();
    assert_eq!(tx.signature(), Some(&signature));
    assert_eq!(tx.message.fee_payer(), Some(&sender));
    assert_eq!(tx.message.account_keys[1], recipient());
    // System transfer: index 2, then 0.001 SOL in lamports.
    assert_eq!(tx.message.instructions[0].data[..4], 2u32.to_le_bytes());
    assert_eq!(tx.message.instructions[0].data[4..], 1_000_000u64.to_le_bytes());
}

#[tokio::test]
async fn loading_is_set_while_send_is_in_flight() {
    let rpc = MockRpc::with_balance(1_000_000_000);
    *rpc.hang_send.lock().unwrap() = true;
    let mut dash = connected(rpc).await;
    assert!(dash.render().contains("[ Send SOL ]"));

    // Drop the send while the node is still holding sendTransaction.
    let outcome = tokio::time::timeout(Duration::from_millis(50), dash.send_sol()).await;

    assert!(outcome.is_err());
    assert_eq!(dash.rpc().count("sendTransaction"), 1);
    assert!(dash.state().loading);
    assert!(dash.render().contains("[ Sending... ]"));
    assert!(toasts(&dash).is_empty());
}

#[tokio::test]
async fn rpc_failure_during_send() {
    let rpc = MockRpc::with_balance(1_000_000_000);
    *rpc.send_error.lock().unwrap() = Some("Transaction simulation failed".into());
    let mut dash = connected(rpc).await;

    assert!(dash.send_sol().await.is_none());

    assert_eq!(
        toasts(&dash),
        vec![Toast::error("Error: RPC error -32002: Transaction simulation failed")]
    );
    assert!(!dash.state().loading);
    assert_eq!(dash.state().amount_input, "0.001");
    assert_eq!(dash.rpc().count("getSignatureStatuses"), 0);
}

#[tokio::test]
async fn failed_execution_is_reported() {
    let rpc = MockRpc::with_balance(1_000_000_000);
    *rpc.status_error.lock().unwrap() = Some(json!({ "InstructionError": [0, "Custom"] }));
    let mut dash = connected(rpc).await;

    assert!(dash.send_sol().await.is_none());

    let toast = dash.notifier().last().unwrap();
    assert_eq!(toast.level, ToastLevel::Error);
    assert!(toast.message.starts_with("Error: transaction "));
    assert!(toast.message.contains("InstructionError"));
    assert!(!dash.state().loading);
}

#[tokio::test]
async fn bad_amounts_never_reach_the_network() {
    for input in ["0", "0.000", "-1", "abc", "", "1.0000000001"] {
        let mut dash = connected(MockRpc::with_balance(1_000_000_000)).await;
        dash.set_amount(input);

        assert!(dash.send_sol().await.is_none(), "{input:?} was accepted");

        let toast = dash.notifier().last().unwrap();
        assert!(
            toast.message.starts_with("Error: invalid amount"),
            "{input:?}: {}",
            toast.message
        );
        assert!(dash.rpc().calls().is_empty(), "{input:?} made RPC calls");
        assert!(!dash.state().loading);
    }
}

#[tokio::test]
async fn bad_recipient_is_rejected_before_sending() {
    let mut dash = connected(MockRpc::with_balance(1_000_000_000)).await;
    dash.set_recipient("not-an-address").await;
    dash.notifier().clear();

    assert!(dash.send_sol().await.is_none());
    assert_eq!(
        dash.notifier().last().unwrap().message,
        "Error: invalid recipient \"not-an-address\""
    );
    assert_eq!(dash.rpc().count("sendTransaction"), 0);
}

#[tokio::test]
async fn balance_must_cover_amount_and_fee() {
    // 0.001 SOL + 5000 lamports fee = 1_005_000 lamports needed.
    let mut dash = connected(MockRpc::with_balance(1_004_999)).await;

    assert!(dash.send_sol().await.is_none());

    assert_eq!(
        toasts(&dash),
        vec![Toast::error(
            "Error: insufficient balance: need 1005000 lamports, have 1004999"
        )]
    );
    assert_eq!(dash.rpc().calls(), vec!["getBalance"]);
}

// ─── balances ───────────────────────────────────────────────────────

#[tokio::test]
async fn connect_loads_and_labels_token_balances() {
    let rpc = MockRpc::with_balance(2_500_000_000);
    let owner = wallet_pubkey().await;
    let usdc = ui_amount("12500000", 6, "12.5");
    rpc.add_token_account(owner, Pubkey::new([1; 32]), USDC_DEVNET_MINT, usdc);
    rpc.add_token_account(owner, Pubkey::new([2; 32]), UNKNOWN_MINT, ui_amount("7", 0, "7"));

    let mut dash = dashboard(rpc);
    dash.connect_wallet().await.unwrap();

    let state = dash.state();
    assert_eq!(state.wallet, Some(owner));
    assert_eq!(state.sol_balance, Some(2_500_000_000));
    assert_eq!(state.token_balances.len(), 2);
    assert_eq!(state.token_balances[0].symbol, "USDC");
    assert_eq!(state.token_balances[0].mint, USDC_DEVNET_MINT);
    assert_eq!(state.token_balances[1].symbol, UNKNOWN_MINT.abbreviated());
    assert_eq!(dash.rpc().count("getTokenAccountBalance"), 2);
    assert!(toasts(&dash).is_empty());

    let text = dash.render();
    assert!(text.contains("Your Balance: 2.5 SOL"));
    assert!(text.contains("  USDC: 12.5 tokens\n"));
    assert!(text.contains(&format!("  {}: 7 tokens\n", UNKNOWN_MINT.abbreviated())));
}

#[tokio::test]
async fn missing_token_balance_fails_the_whole_fetch() {
    let rpc = MockRpc::with_balance(1);
    let owner = wallet_pubkey().await;
    let usdc = ui_amount("1", 6, "0.000001");
    rpc.add_token_account(owner, Pubkey::new([1; 32]), USDC_DEVNET_MINT, usdc);
    rpc.token_amounts.lock().unwrap().clear();

    let mut dash = dashboard(rpc);
    dash.connect_wallet().await.unwrap();

    assert!(dash.state().token_balances.is_empty());
    assert_eq!(dash.state().sol_balance, Some(1));
    assert_eq!(
        toasts(&dash),
        vec![Toast::error(
            "Error: RPC error -32602: Invalid param: could not find account"
        )]
    );
}

#[tokio::test]
async fn unreadable_token_accounts_are_skipped() {
    let rpc = MockRpc::with_balance(1);
    let owner = wallet_pubkey().await;
    let good = Pubkey::new([1; 32]);
    rpc.add_token_account(owner, good, USDC_DEVNET_MINT, ui_amount("3", 6, "0.000003"));
    rpc.token_accounts
        .lock()
        .unwrap()
        .entry(owner)
        .or_default()
        .push(KeyedAccount {
            pubkey: Pubkey::new([2; 32]),
            account: Account {
                lamports: 1,
                owner: TOKEN_PROGRAM_ID,
                data: vec![0; 10],
                executable: false,
            },
        });

    let mut dash = dashboard(rpc);
    dash.connect_wallet().await.unwrap();

    let rows = &dash.state().token_balances;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].account, good);
    assert_eq!(dash.rpc().count("getTokenAccountBalance"), 1);
    assert!(toasts(&dash).is_empty());
}

#[tokio::test]
async fn fetches_without_wallet_are_noops() {
    let mut dash = dashboard(MockRpc::with_balance(1));
    dash.fetch_sol_balance().await;
    dash.fetch_token_balances().await;
    dash.refresh().await;

    assert!(dash.rpc().calls().is_empty());
    assert!(dash.state().sol_balance.is_none());
    assert!(toasts(&dash).is_empty());
}

#[tokio::test]
async fn balance_fetch_error_is_toasted() {
    let mut dash = connected(MockRpc::with_balance(1)).await;
    *dash.rpc().fail_balance.lock().unwrap() = true;

    dash.fetch_sol_balance().await;

    assert_eq!(
        toasts(&dash),
        vec![Toast::error("Error: RPC transport error: connection refused")]
    );
    assert_eq!(dash.state().sol_balance, Some(1));
}

#[tokio::test]
async fn disconnect_clears_balances() {
    let mut dash = connected(MockRpc::with_balance(3_000_000_000)).await;
    assert!(dash.render().contains("Your Balance: 3 SOL"));

    dash.disconnect_wallet().await;

    assert!(dash.state().wallet.is_none());
    assert!(dash.state().sol_balance.is_none());
    assert!(dash.render().contains("Wallet: not connected"));
    assert!(dash.render().contains("Your Balance: 0 SOL"));
}

// ─── token account lookup ───────────────────────────────────────────

#[tokio::test]
async fn resolves_recipient_token_account_by_symbol() {
    let rpc = MockRpc::default();
    let usdc_account = Pubkey::new([0x31; 32]);
    let usdc = ui_amount("1", 6, "0.000001");
    rpc.add_token_account(recipient(), Pubkey::new([0x30; 32]), UNKNOWN_MINT, ui_amount("1", 0, "1"));
    rpc.add_token_account(recipient(), usdc_account, USDC_DEVNET_MINT, usdc);
    let mut dash = dashboard(rpc);

    dash.set_token_symbol("usdc").await;

    assert_eq!(dash.state().token_address, Some(usdc_account));
    assert!(toasts(&dash).is_empty());
}

#[tokio::test]
async fn symbol_without_matching_account_is_reported() {
    let rpc = MockRpc::default();
    rpc.add_token_account(recipient(), Pubkey::new([0x30; 32]), UNKNOWN_MINT, ui_amount("1", 0, "1"));
    let mut dash = dashboard(rpc);

    dash.set_token_symbol("USDC").await;
    assert_eq!(toasts(&dash), vec![Toast::error("No tokens found with symbol USDC")]);
    assert!(dash.state().token_address.is_none());

    dash.set_token_symbol("XYZ").await;
    assert_eq!(
        dash.notifier().last(),
        Some(Toast::error("No tokens found with symbol XYZ"))
    );
}

#[tokio::test]
async fn changing_recipient_re_resolves() {
    let rpc = MockRpc::default();
    let other = Pubkey::new([0x44; 32]);
    let account = Pubkey::new([0x45; 32]);
    rpc.add_token_account(other, account, USDC_DEVNET_MINT, ui_amount("5", 6, "0.000005"));
    let mut dash = dashboard(rpc);

    dash.set_recipient(&other.to_string()).await;

    assert_eq!(dash.state().recipient, other.to_string());
    assert_eq!(dash.state().token_address, Some(account));
    assert_eq!(dash.rpc().count("getTokenAccountsByOwner"), 1);
}

#[tokio::test]
async fn clearing_recipient_drops_resolved_account() {
    let rpc = MockRpc::default();
    let usdc_account = Pubkey::new([0x31; 32]);
    rpc.add_token_account(recipient(), usdc_account, USDC_DEVNET_MINT, ui_amount("1", 6, "0.000001"));
    let mut dash = dashboard(rpc);

    dash.set_token_symbol("USDC").await;
    assert_eq!(dash.state().token_address, Some(usdc_account));

    dash.set_recipient("").await;

    assert!(dash.state().token_address.is_none());
    assert!(toasts(&dash).is_empty());
    assert_eq!(dash.rpc().count("getTokenAccountsByOwner"), 1);
}

#[tokio::test]
async fn lookup_rpc_error_is_toasted_and_clears_account() {
    let rpc = MockRpc::default();
    let usdc_account = Pubkey::new([0x31; 32]);
    rpc.add_token_account(recipient(), usdc_account, USDC_DEVNET_MINT, ui_amount("1", 6, "0.000001"));
    let mut dash = dashboard(rpc);
    dash.set_token_symbol("USDC").await;
    assert_eq!(dash.state().token_address, Some(usdc_account));

    *dash.rpc().fail_token_accounts.lock().unwrap() = true;
    assert!(dash.resolve_token_address().await.is_none());

    assert_eq!(
        toasts(&dash),
        vec![Toast::error("Error: RPC transport error: connection reset")]
    );
    assert!(dash.state().token_address.is_none());
}
