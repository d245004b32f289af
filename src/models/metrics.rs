//! Journal performance statistics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate statistics over the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalStats {
    /// When these stats were calculated
    pub calculated_at: DateTime<Utc>,

    // === Exposure ===
    /// Trades still fully open
    pub open_positions: u32,

    /// Σ risk dollars of open trades
    pub open_risk_total: Decimal,

    // === Realized ===
    /// Trades with at least one exit (trimmed or closed)
    pub closed_trade_count: u32,

    /// Σ realized P&L of trimmed and closed trades
    pub total_pnl: Decimal,

    pub wins: u32,
    pub losses: u32,

    /// Win rate in percent, none before the first exit
    pub win_rate: Option<f64>,

    /// Average realized P&L of winners
    pub avg_win: Decimal,

    /// Average realized loss of losers (absolute value)
    pub avg_loss: Decimal,

    /// Gross profit / gross loss, none without losses
    pub profit_factor: Option<f64>,

    /// Mean / population std-dev of per-trade percent returns
    pub sharpe: Option<f64>,

    // === Account growth ===
    pub starting_account: Decimal,
    pub current_account: Decimal,

    /// total_pnl as a percentage of the starting account
    pub trading_growth: Decimal,

    /// (current − starting) as a percentage of the starting account
    pub total_growth: Decimal,

    /// current − starting − total_pnl
    pub net_cash_flow: Decimal,
}

impl JournalStats {
    pub fn empty(starting_account: Decimal, current_account: Decimal) -> Self {
        Self {
            calculated_at: Utc::now(),
            open_positions: 0,
            open_risk_total: Decimal::ZERO,
            closed_trade_count: 0,
            total_pnl: Decimal::ZERO,
            wins: 0,
            losses: 0,
            win_rate: None,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            profit_factor: None,
            sharpe: None,
            starting_account,
            current_account,
            trading_growth: Decimal::ZERO,
            total_growth: Decimal::ZERO,
            net_cash_flow: current_account - starting_account,
        }
    }
}

impl std::fmt::Display for JournalStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Trading Performance ===")?;
        writeln!(f, "Open Positions:   {}", self.open_positions)?;
        writeln!(f, "Open Risk:        ${:.2}", self.open_risk_total)?;
        writeln!(f, "Total P&L:        ${:.2}", self.total_pnl)?;
        writeln!(f, "Closed Trades:    {}", self.closed_trade_count)?;
        match self.win_rate {
            Some(rate) => writeln!(f, "Win Rate:         {:.1}%", rate)?,
            None => writeln!(f, "Win Rate:         n/a")?,
        }
        writeln!(f, "Wins / Losses:    {} / {}", self.wins, self.losses)?;
        writeln!(f, "Avg Win:          ${:.2}", self.avg_win)?;
        writeln!(f, "Avg Loss:         ${:.2}", self.avg_loss)?;
        match self.profit_factor {
            Some(pf) => writeln!(f, "Profit Factor:    {:.2}", pf)?,
            None => writeln!(f, "Profit Factor:    n/a")?,
        }
        match self.sharpe {
            Some(s) => writeln!(f, "Sharpe Ratio:     {:.2}", s)?,
            None => writeln!(f, "Sharpe Ratio:     n/a")?,
        }

        writeln!(f, "\n=== Account Growth ===")?;
        writeln!(f, "Starting Account: ${:.2}", self.starting_account)?;
        writeln!(f, "Current Account:  ${:.2}", self.current_account)?;
        writeln!(f, "Trading Growth:   {:.2}%", self.trading_growth)?;
        writeln!(f, "Total Growth:     {:.2}%", self.total_growth)?;
        write!(f, "Net Cash Flow:    ${:.2}", self.net_cash_flow)
    }
}

/// One point of the realized equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub date: DateTime<Utc>,
    pub balance: Decimal,
    pub pnl: Decimal,
    pub ticker: String,
}
