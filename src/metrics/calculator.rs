//! Calculator for journal performance statistics: win rate, profit factor,
//! Sharpe ratio, account growth and the realized equity curve.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use statrs::statistics::Statistics;

use crate::models::{AccountLedger, EquityPoint, JournalStats, Trade, TradeStatus};
use crate::trading::Settings;

/// Calculator for computing journal statistics.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Calculate statistics over the whole journal.
    ///
    /// Trimmed trades count as realized alongside closed ones, using their
    /// accumulated P&L so far.
    pub fn calculate(trades: &[Trade], settings: &Settings, account: &AccountLedger) -> JournalStats {
        let mut stats = JournalStats::empty(settings.starting_account_size, account.current_size);

        let open: Vec<&Trade> = trades
            .iter()
            .filter(|t| t.status() == TradeStatus::Open)
            .collect();
        stats.open_positions = open.len() as u32;
        stats.open_risk_total = open.iter().map(|t| t.risk_dollars).sum();

        let realized: Vec<&Trade> = trades.iter().filter(|t| has_exits(t)).collect();
        stats.closed_trade_count = realized.len() as u32;

        let pnls: Vec<Decimal> = realized.iter().map(|t| t.total_realized_pnl()).collect();
        Self::calculate_pnl_stats(&mut stats, &pnls);
        stats.sharpe = Self::calculate_sharpe(&realized);

        Self::calculate_growth(&mut stats);
        stats.calculated_at = Utc::now();
        stats
    }

    /// Win/loss counts, averages and profit factor.
    fn calculate_pnl_stats(stats: &mut JournalStats, pnls: &[Decimal]) {
        stats.total_pnl = pnls.iter().copied().sum();
        if pnls.is_empty() {
            return;
        }

        let wins: Vec<Decimal> = pnls.iter().copied().filter(|p| *p > Decimal::ZERO).collect();
        let losses: Vec<Decimal> = pnls.iter().copied().filter(|p| *p < Decimal::ZERO).collect();

        stats.wins = wins.len() as u32;
        stats.losses = losses.len() as u32;
        stats.win_rate = Some(wins.len() as f64 / pnls.len() as f64 * 100.0);

        let gross_profit: Decimal = wins.iter().copied().sum();
        let gross_loss: Decimal = losses.iter().map(|l| l.abs()).sum();

        if !wins.is_empty() {
            stats.avg_win = gross_profit / Decimal::from(wins.len() as u32);
        }
        if !losses.is_empty() {
            stats.avg_loss = gross_loss / Decimal::from(losses.len() as u32);
        }
        if gross_loss > Decimal::ZERO {
            stats.profit_factor =
                Some(gross_profit.to_f64().unwrap_or(0.0) / gross_loss.to_f64().unwrap_or(1.0));
        }
    }

    /// Mean over population std-dev of per-trade percent returns.
    ///
    /// Not annualized and no risk-free rate.
    fn calculate_sharpe(realized: &[&Trade]) -> Option<f64> {
        if realized.len() < 2 {
            return None;
        }

        let returns: Vec<f64> = realized
            .iter()
            .filter_map(|t| {
                let size = if t.position_size.is_zero() {
                    Decimal::ONE
                } else {
                    t.position_size
                };
                (t.total_realized_pnl() / size * dec!(100)).to_f64()
            })
            .collect();

        let mean = returns.clone().mean();
        let std_dev = returns.population_std_dev();

        if std_dev > 0.0 && std_dev.is_finite() {
            Some(mean / std_dev)
        } else {
            None
        }
    }

    fn calculate_growth(stats: &mut JournalStats) {
        let start = stats.starting_account;
        if start > Decimal::ZERO {
            stats.trading_growth = stats.total_pnl / start * dec!(100);
            stats.total_growth = (stats.current_account - start) / start * dec!(100);
        }
        stats.net_cash_flow = stats.current_account - start - stats.total_pnl;
    }

    /// Running balance after each realized trade, oldest exit first.
    ///
    /// Starts with a point at the starting balance one day before the first
    /// exit. Empty when nothing has been realized.
    pub fn equity_curve(trades: &[Trade], starting_balance: Decimal) -> Vec<EquityPoint> {
        let mut realized: Vec<(DateTime<Utc>, Decimal, &str)> = trades
            .iter()
            .filter(|t| has_exits(t))
            .map(|t| (realized_at(t), t.total_realized_pnl(), t.ticker.as_str()))
            .collect();

        let Some(first) = realized.iter().map(|(date, _, _)| *date).min() else {
            return Vec::new();
        };
        realized.sort_by_key(|(date, _, _)| *date);

        let mut balance = starting_balance;
        let mut points = Vec::with_capacity(realized.len() + 1);
        points.push(EquityPoint {
            date: first - Duration::days(1),
            balance,
            pnl: Decimal::ZERO,
            ticker: "Start".to_string(),
        });

        for (date, pnl, ticker) in realized {
            balance += pnl;
            points.push(EquityPoint {
                date,
                balance,
                pnl,
                ticker: ticker.to_string(),
            });
        }

        points
    }
}

fn has_exits(trade: &Trade) -> bool {
    matches!(trade.status(), TradeStatus::Trimmed | TradeStatus::Closed)
}

/// Close date if closed, else the latest trim, else when it was logged.
fn realized_at(trade: &Trade) -> DateTime<Utc> {
    trade
        .exit_date()
        .or_else(|| trade.trim_history().iter().map(|e| e.date).max())
        .unwrap_or(trade.timestamp)
}
