use std::time::Duration;

use async_trait::async_trait;
use chain_sol::{Pubkey, Signature};
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::error::{Result, RpcError};
use crate::types::{
    BlockhashInfo, Commitment, KeyedAccount, SignatureStatus, TokenAccountsFilter, TokenAmount,
};

/// The RPC methods the dashboard depends on.
#[async_trait]
pub trait RpcApi: Send + Sync {
    /// Lamport balance of `pubkey`.
    async fn get_balance(&self, pubkey: &Pubkey, commitment: Commitment) -> Result<u64>;

    async fn get_latest_blockhash(&self, commitment: Commitment) -> Result<BlockhashInfo>;

    /// Token accounts owned by `owner`, with raw account data.
    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        filter: TokenAccountsFilter,
        commitment: Commitment,
    ) -> Result<Vec<KeyedAccount>>;

    async fn get_token_account_balance(
        &self,
        account: &Pubkey,
        commitment: Commitment,
    ) -> Result<TokenAmount>;

    /// Submit a signed wire-format transaction. Returns its signature.
    async fn send_transaction(&self, wire: &[u8]) -> Result<Signature>;

    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureStatus>>>;
}

/// Poll `getSignatureStatuses` until `signature` reaches `commitment`.
///
/// Fails with `TransactionFailed` if the node reports an execution error and
/// with `ConfirmTimeout` once `timeout` has elapsed.
pub async fn confirm_transaction<R: RpcApi + ?Sized>(
    rpc: &R,
    signature: &Signature,
    commitment: Commitment,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<SignatureStatus> {
    let deadline = Instant::now() + timeout;

    loop {
        let status = rpc
            .get_signature_statuses(std::slice::from_ref(signature))
            .await?
            .into_iter()
            .next()
            .flatten();

        match status {
            Some(status) if status.err.is_some() => {
                let reason = status
                    .err
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_default();
                return Err(RpcError::TransactionFailed {
                    signature: *signature,
                    reason,
                });
            }
            Some(status) if status.satisfies(commitment) => {
                info!(%signature, slot = status.slot, %commitment, "transaction confirmed");
                return Ok(status);
            }
            Some(status) => {
                debug!(%signature, reached = %status.commitment(), wanted = %commitment, "waiting");
            }
            None => debug!(%signature, "signature not yet seen"),
        }

        if Instant::now() + poll_interval > deadline {
            return Err(RpcError::ConfirmTimeout {
                signature: *signature,
                secs: timeout.as_secs(),
            });
        }
        sleep(poll_interval).await;
    }
}
