//! Solana JSON-RPC client.
//!
//! Only the handful of methods the dashboard calls are implemented. The
//! [`RpcApi`] trait is the seam the dashboard and wallet adapters program
//! against; [`RpcClient`] is the HTTP implementation.

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::{confirm_transaction, RpcApi};
pub use client::RpcClient;
pub use error::{Result, RpcError};
pub use types::{
    Account, BlockhashInfo, Cluster, Commitment, KeyedAccount, SignatureStatus,
    TokenAccountsFilter, TokenAmount,
};
