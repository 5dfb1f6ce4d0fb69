//! Text rendering of the dashboard.

use std::fmt::Write;

use chain_sol::lamports_to_sol_string;

use crate::state::DashboardState;

pub fn render(state: &DashboardState) -> String {
    let mut out = String::new();

    let wallet = state
        .wallet
        .map(|pk| pk.to_string())
        .unwrap_or_else(|| "not connected".to_string());
    let _ = writeln!(out, "Wallet: {wallet}");

    let _ = writeln!(
        out,
        "Your Balance: {} SOL",
        lamports_to_sol_string(state.sol_balance.unwrap_or(0))
    );
    let _ = writeln!(out, "Amount (SOL): {}", state.amount_input);
    if !state.recipient.is_empty() {
        let _ = writeln!(out, "Recipient: {}", state.recipient);
    }
    let button = if state.loading { "Sending..." } else { "Send SOL" };
    let _ = writeln!(out, "[ {button} ]");

    let _ = writeln!(out);
    let _ = writeln!(out, "Your Token Balances:");
    for row in &state.token_balances {
        let _ = writeln!(out, "  {}: {} tokens", row.symbol, row.amount.ui_amount_string);
    }

    out
}
