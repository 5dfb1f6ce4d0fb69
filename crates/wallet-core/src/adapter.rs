use async_trait::async_trait;
use chain_sol::{Pubkey, Signature, Transaction};
use sol_rpc::RpcApi;
use tracing::debug;

use crate::error::WalletError;

/// A wallet that can hand out its public key and sign on request.
///
/// The dashboard only talks to wallets through this trait, so a browser
/// extension bridge or a hardware signer can stand in for the local
/// [`KeypairWallet`](crate::KeypairWallet).
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Human-readable adapter name, e.g. `"Keypair"`.
    fn name(&self) -> &str;

    /// `None` until [`connect`](Self::connect) succeeds.
    fn public_key(&self) -> Option<Pubkey>;

    async fn connect(&mut self) -> Result<Pubkey, WalletError>;

    async fn disconnect(&mut self);

    /// Return a copy of `tx` with this wallet's signature filled in.
    ///
    /// Fails with [`WalletError::NotConnected`] when no key is loaded.
    async fn sign_transaction(&self, tx: &Transaction) -> Result<Transaction, WalletError>;

    /// Sign `tx` and submit it through `rpc`.
    async fn send_transaction(
        &self,
        tx: &Transaction,
        rpc: &dyn RpcApi,
    ) -> Result<Signature, WalletError> {
        let signed = self.sign_transaction(tx).await?;
        if !signed.is_fully_signed() {
            return Err(WalletError::Rejected(
                "transaction still has unsigned slots".into(),
            ));
        }
        let wire = signed.to_wire()?;
        debug!(adapter = self.name(), bytes = wire.len(), "submitting transaction");
        Ok(rpc.send_transaction(&wire).await?)
    }
}
