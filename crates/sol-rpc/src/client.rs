//! HTTP JSON-RPC client for a Solana node.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chain_sol::{Hash, Pubkey, Signature};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::api::RpcApi;
use crate::error::{Result, RpcError};
use crate::types::{
    Account, BlockhashInfo, Commitment, KeyedAccount, RpcResponse, SignatureStatus,
    TokenAccountsFilter, TokenAmount, UiBlockhash, UiKeyedAccount, WithContext,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RpcClient {
    url: String,
    client: Client,
    next_id: AtomicU64,
    preflight_commitment: Commitment,
}

impl RpcClient {
    pub fn new(url: &str) -> Self {
        Self::from_client(url, Client::new())
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::from_client(url, client))
    }

    fn from_client(url: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            client,
            next_id: AtomicU64::new(1),
            preflight_commitment: Commitment::Processed,
        }
    }

    /// Commitment used for `sendTransaction` preflight simulation.
    pub fn with_preflight_commitment(mut self, commitment: Commitment) -> Self {
        self.preflight_commitment = commitment;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = request_body(id, method, params);
        let started = Instant::now();

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = parse_response(method, status, &bytes)?;

        debug!(method, id, elapsed_ms = started.elapsed().as_millis() as u64, "rpc call");
        decode_result(method, body)
    }
}

fn request_body(id: u64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

/// A body that is not a JSON-RPC envelope is a decode failure, whatever the
/// HTTP status.
fn parse_response(method: &str, status: StatusCode, bytes: &[u8]) -> Result<RpcResponse> {
    serde_json::from_slice(bytes).map_err(|e| RpcError::Decode {
        method: method.to_string(),
        reason: format!("HTTP {status}: {e}"),
    })
}

fn decode_result<T: DeserializeOwned>(method: &str, body: RpcResponse) -> Result<T> {
    if let Some(error) = body.error {
        return Err(RpcError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    let result = body
        .result
        .ok_or_else(|| RpcError::MissingResult(method.to_string()))?;

    serde_json::from_value(result).map_err(|e| RpcError::Decode {
        method: method.to_string(),
        reason: e.to_string(),
    })
}

fn decode_keyed_account(ui: UiKeyedAccount) -> Result<KeyedAccount> {
    let (payload, encoding) = ui.account.data;
    if encoding != "base64" {
        return Err(RpcError::Decode {
            method: "getTokenAccountsByOwner".into(),
            reason: format!("unexpected account encoding {encoding:?}"),
        });
    }

    let data = BASE64.decode(payload).map_err(|e| RpcError::Decode {
        method: "getTokenAccountsByOwner".into(),
        reason: format!("account data: {e}"),
    })?;

    Ok(KeyedAccount {
        pubkey: ui.pubkey.parse()?,
        account: Account {
            lamports: ui.account.lamports,
            owner: ui.account.owner.parse()?,
            data,
            executable: ui.account.executable,
        },
    })
}

#[async_trait]
impl RpcApi for RpcClient {
    async fn get_balance(&self, pubkey: &Pubkey, commitment: Commitment) -> Result<u64> {
        let res: WithContext<u64> = self
            .call(
                "getBalance",
                json!([pubkey.to_string(), { "commitment": commitment }]),
            )
            .await?;
        Ok(res.value)
    }

    async fn get_latest_blockhash(&self, commitment: Commitment) -> Result<BlockhashInfo> {
        let res: WithContext<UiBlockhash> = self
            .call("getLatestBlockhash", json!([{ "commitment": commitment }]))
            .await?;
        Ok(BlockhashInfo {
            blockhash: res.value.blockhash.parse::<Hash>()?,
            last_valid_block_height: res.value.last_valid_block_height,
        })
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        filter: TokenAccountsFilter,
        commitment: Commitment,
    ) -> Result<Vec<KeyedAccount>> {
        let res: WithContext<Vec<UiKeyedAccount>> = self
            .call(
                "getTokenAccountsByOwner",
                json!([
                    owner.to_string(),
                    filter.to_json(),
                    { "commitment": commitment, "encoding": "base64" }
                ]),
            )
            .await?;
        res.value.into_iter().map(decode_keyed_account).collect()
    }

    async fn get_token_account_balance(
        &self,
        account: &Pubkey,
        commitment: Commitment,
    ) -> Result<TokenAmount> {
        let res: WithContext<TokenAmount> = self
            .call(
                "getTokenAccountBalance",
                json!([account.to_string(), { "commitment": commitment }]),
            )
            .await?;
        Ok(res.value)
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<Signature> {
        let signature: String = self
            .call(
                "sendTransaction",
                json!([
                    BASE64.encode(wire),
                    {
                        "encoding": "base64",
                        "skipPreflight": false,
                        "preflightCommitment": self.preflight_commitment,
                    }
                ]),
            )
            .await?;
        Ok(signature.parse()?)
    }

    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureStatus>>> {
        let sigs: Vec<String> = signatures.iter().map(|s| s.to_string()).collect();
        let res: WithContext<Vec<Option<SignatureStatus>>> = self
            .call(
                "getSignatureStatuses",
                json!([sigs, { "searchTransactionHistory": false }]),
            )
            .await?;
        Ok(res.value)
    }
}
