//! Headless Solana wallet dashboard.
//!
//! [`Dashboard`] ties a [`WalletAdapter`](wallet_core::WalletAdapter) and an
//! [`RpcApi`](sol_rpc::RpcApi) together: it shows the SOL balance and token
//! balances of the connected wallet, sends SOL, and reports every outcome
//! through a [`Notifier`].

pub mod config;
pub mod dashboard;
pub mod error;
pub mod notify;
pub mod state;
pub mod view;

pub use config::{Config, TokenRegistry};
pub use dashboard::{Dashboard, TRANSFER_FEE_LAMPORTS};
pub use error::{DashboardError, Result};
pub use notify::{ConsoleNotifier, MemoryNotifier, Notifier, Toast, ToastLevel, TracingNotifier};
pub use state::{DashboardState, TokenBalance, DEFAULT_AMOUNT};
pub use view::render;
