//! Partial-exit ("trim") records and helpers.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Append-only record of one partial or final exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimEvent {
    /// Ordinal within the trade's history
    pub id: i64,

    /// When the exit happened
    pub date: DateTime<Utc>,

    /// Shares closed by this exit
    pub shares: u64,

    /// Price the shares were sold at
    pub exit_price: Decimal,

    /// Exit measured in R against the trade's planned entry/stop
    pub r_multiple: Decimal,

    /// (exit_price − entry) × shares
    pub pnl: Decimal,

    /// Percentage of the pre-trim remaining shares requested
    pub percent_trimmed: Decimal,
}

/// Parameters for a trim command.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimRequest {
    /// Percentage of remaining shares to close, (0, 100]
    pub percent: Decimal,
    pub exit_price: Decimal,
    pub date: DateTime<Utc>,
    /// Optional trailing stop for the shares left open
    pub new_stop: Option<Decimal>,
}

impl TrimRequest {
    pub fn new(percent: Decimal, exit_price: Decimal, date: DateTime<Utc>) -> Self {
        Self {
            percent,
            exit_price,
            date,
            new_stop: None,
        }
    }

    /// A full close of whatever is still open.
    pub fn close(exit_price: Decimal, date: DateTime<Utc>) -> Self {
        Self::new(dec!(100), exit_price, date)
    }

    pub fn with_new_stop(mut self, stop: Decimal) -> Self {
        self.new_stop = Some(stop);
        self
    }
}

/// What a trim would do, computed without touching the trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimPreview {
    pub shares_closing: u64,
    pub shares_remaining: u64,
    pub profit_per_share: Decimal,
    pub pnl: Decimal,
    pub r_multiple: Decimal,
    pub is_full_close: bool,
}

/// Shares closed by trimming `percent` of `remaining`, floored.
pub fn shares_for_percent(remaining: u64, percent: Decimal) -> u64 {
    (Decimal::from(remaining) * percent / dec!(100))
        .floor()
        .to_u64()
        .unwrap_or(0)
}

/// Suggested trim size when taking profit at `r`: 1 / (1 + R).
///
/// 1R → 50%, 2R → 33%, 3R → 25%, 4R → 20%, 5R → 17%.
pub fn suggested_trim_percent(r: Decimal) -> Decimal {
    if r <= dec!(-1) {
        return dec!(100);
    }
    (dec!(100) / (Decimal::ONE + r)).round()
}

/// Price at which a long trade reaches `r` multiples of its planned risk.
pub fn exit_price_for_r(entry: Decimal, stop: Decimal, r: Decimal) -> Decimal {
    entry + r * (entry - stop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggested_trim_percent() {
        assert_eq!(suggested_trim_percent(dec!(1)), dec!(50));
        assert_eq!(suggested_trim_percent(dec!(2)), dec!(33));
        assert_eq!(suggested_trim_percent(dec!(3)), dec!(25));
        assert_eq!(suggested_trim_percent(dec!(4)), dec!(20));
        assert_eq!(suggested_trim_percent(dec!(5)), dec!(17));
    }

    #[test]
    fn test_exit_price_for_r() {
        assert_eq!(exit_price_for_r(dec!(100), dec!(95), dec!(2)), dec!(110));
        assert_eq!(exit_price_for_r(dec!(100), dec!(95), dec!(-1)), dec!(95));
    }

    #[test]
    fn test_shares_for_percent_floors() {
        assert_eq!(shares_for_percent(100, dec!(50)), 50);
        assert_eq!(shares_for_percent(7, dec!(33)), 2); // 2.31
        assert_eq!(shares_for_percent(1, dec!(50)), 0);
        assert_eq!(shares_for_percent(1, dec!(100)), 1);
    }
}
