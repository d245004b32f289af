//! Journal trade record and the trim engine that moves it through
//! open → trimmed → closed.
//!
//! `remaining_shares`, `total_realized_pnl` and `status` are stored for
//! cheap reads but are projections of `trim_history`; they are private and
//! only written by [`Trade::apply_trim`], [`Trade::apply_edit`] and the
//! legacy-record migration.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{JournalError, SizingError, TrimError};

use super::sizing::SizingResult;
use super::trim::{shares_for_percent, TrimEvent, TrimPreview, TrimRequest};

/// Realized profit may fall short of remaining risk by this much and still
/// count as a free roll.
pub const FREE_ROLL_EPSILON: Decimal = dec!(0.01);

/// Lifecycle state of a journal trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Trimmed,
    Closed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Trimmed => "trimmed",
            TradeStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-supplied fields when logging a trade.
#[derive(Debug, Clone, Default)]
pub struct TradeMeta {
    pub ticker: String,
    pub notes: String,
}

/// Direct override of a trade's entry, stop and open share count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeEdit {
    pub entry: Decimal,
    pub stop: Decimal,
    pub shares: u64,
}

/// Aggregate fields derived purely from the trim history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeProjection {
    pub remaining_shares: u64,
    pub total_realized_pnl: Decimal,
    pub status: TradeStatus,
}

impl TradeProjection {
    /// Replay `history` against `original_shares`.
    pub fn from_history(original_shares: u64, history: &[TrimEvent]) -> Self {
        let trimmed: u64 = history.iter().map(|e| e.shares).sum();
        let remaining_shares = original_shares.saturating_sub(trimmed);
        let total_realized_pnl = history.iter().map(|e| e.pnl).sum();

        let status = if history.is_empty() {
            TradeStatus::Open
        } else if remaining_shares == 0 {
            TradeStatus::Closed
        } else {
            TradeStatus::Trimmed
        };

        Self {
            remaining_shares,
            total_realized_pnl,
            status,
        }
    }
}

/// A logged trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TradeRecord")]
pub struct Trade {
    /// Creation-time derived identifier (milliseconds since epoch)
    pub id: i64,

    /// When the trade was logged
    pub timestamp: DateTime<Utc>,

    pub ticker: String,
    pub entry: Decimal,

    /// Planned stop; R-multiples are always measured against it
    pub stop: Decimal,

    /// Trailing stop set while trimming, if it was moved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stop: Option<Decimal>,

    pub target: Option<Decimal>,

    /// entry × shares at creation (or last edit)
    pub position_size: Decimal,

    /// |entry − stop|
    pub stop_distance: Decimal,

    /// Dollar risk at creation (or last edit)
    pub risk_dollars: Decimal,

    /// Risk percent selected when the trade was sized
    pub risk_percent: Decimal,

    #[serde(default)]
    pub notes: String,

    original_shares: u64,
    remaining_shares: u64,
    status: TradeStatus,
    trim_history: Vec<TrimEvent>,
    #[serde(rename = "totalRealizedPnL")]
    total_realized_pnl: Decimal,

    // Populated only when fully closed, for single-exit consumers
    exit_price: Option<Decimal>,
    exit_date: Option<DateTime<Utc>>,
    pnl: Option<Decimal>,
}

impl Trade {
    /// Build a new open trade from a sizing result.
    pub fn from_sizing(
        id: i64,
        timestamp: DateTime<Utc>,
        result: &SizingResult,
        meta: &TradeMeta,
    ) -> Self {
        let ticker = meta.ticker.trim().to_uppercase();
        Self {
            id,
            timestamp,
            ticker: if ticker.is_empty() {
                "UNKNOWN".to_string()
            } else {
                ticker
            },
            entry: result.entry_price,
            stop: result.stop_price,
            current_stop: None,
            target: result.target_price,
            position_size: result.position_size,
            stop_distance: result.stop_per_share,
            risk_dollars: result.risk_dollars,
            risk_percent: result.original_risk_percent,
            notes: meta.notes.clone(),
            original_shares: result.shares,
            remaining_shares: result.shares,
            status: TradeStatus::Open,
            trim_history: Vec::new(),
            total_realized_pnl: Decimal::ZERO,
            exit_price: None,
            exit_date: None,
            pnl: None,
        }
    }

    pub fn original_shares(&self) -> u64 {
        self.original_shares
    }

    pub fn remaining_shares(&self) -> u64 {
        self.remaining_shares
    }

    pub fn status(&self) -> TradeStatus {
        self.status
    }

    pub fn trim_history(&self) -> &[TrimEvent] {
        &self.trim_history
    }

    pub fn total_realized_pnl(&self) -> Decimal {
        self.total_realized_pnl
    }

    pub fn exit_price(&self) -> Option<Decimal> {
        self.exit_price
    }

    pub fn exit_date(&self) -> Option<DateTime<Utc>> {
        self.exit_date
    }

    pub fn pnl(&self) -> Option<Decimal> {
        self.pnl
    }

    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    /// Trailing stop if one was set, otherwise the planned stop.
    pub fn active_stop(&self) -> Decimal {
        self.current_stop.unwrap_or(self.stop)
    }

    /// Planned risk per share (entry − stop).
    pub fn risk_per_share(&self) -> Decimal {
        self.entry - self.stop
    }

    /// R-multiple of an exit at `price`, relative to the planned risk.
    pub fn r_multiple_at(&self, price: Decimal) -> Decimal {
        let risk = self.risk_per_share();
        if risk.is_zero() {
            return Decimal::ZERO;
        }
        (price - self.entry) / risk
    }

    /// Realized P&L in R (against dollar risk at creation).
    pub fn realized_r(&self) -> Option<Decimal> {
        if self.trim_history.is_empty() || self.risk_dollars <= Decimal::ZERO {
            return None;
        }
        Some(self.total_realized_pnl / self.risk_dollars)
    }

    /// Realized P&L as a percentage of the full position cost.
    pub fn realized_pnl_percent(&self) -> Option<Decimal> {
        let cost = self.entry * Decimal::from(self.original_shares);
        if self.trim_history.is_empty() || cost <= Decimal::ZERO {
            return None;
        }
        Some(self.total_realized_pnl / cost * dec!(100))
    }

    /// Dollar risk still carried by the open remainder.
    pub fn remaining_risk(&self) -> Decimal {
        Decimal::from(self.remaining_shares) * (self.entry - self.active_stop())
    }

    /// A trimmed trade whose realized profit already covers the risk left
    /// on the remainder.
    pub fn is_free_roll(&self) -> bool {
        self.status == TradeStatus::Trimmed
            && self.total_realized_pnl >= self.remaining_risk() - FREE_ROLL_EPSILON
    }

    /// Status label for display, with free-rolled trades called out.
    pub fn display_status(&self) -> &'static str {
        if self.is_free_roll() {
            return "Free Rolled";
        }
        match self.status {
            TradeStatus::Open => "Open",
            TradeStatus::Trimmed => "Trimmed",
            TradeStatus::Closed => "Closed",
        }
    }

    /// Replay the trim history.
    pub fn projection(&self) -> TradeProjection {
        TradeProjection::from_history(self.original_shares, &self.trim_history)
    }

    /// Whether the stored aggregates equal the replayed history.
    pub fn is_consistent(&self) -> bool {
        let projected = self.projection();
        projected.remaining_shares == self.remaining_shares
            && projected.total_realized_pnl == self.total_realized_pnl
            && projected.status == self.status
    }

    fn validate_trim(&self, percent: Decimal, exit_price: Decimal) -> Result<(), TrimError> {
        if self.status == TradeStatus::Closed {
            return Err(TrimError::TradeClosed);
        }
        if percent <= Decimal::ZERO || percent > dec!(100) {
            return Err(TrimError::InvalidPercent(percent));
        }
        if exit_price <= Decimal::ZERO {
            return Err(TrimError::InvalidExitPrice(exit_price));
        }
        Ok(())
    }

    /// What trimming `percent` at `exit_price` would do.
    pub fn preview_trim(&self, percent: Decimal, exit_price: Decimal) -> Result<TrimPreview, TrimError> {
        self.validate_trim(percent, exit_price)?;

        let shares_closing = shares_for_percent(self.remaining_shares, percent);
        let profit_per_share = exit_price - self.entry;
        let shares_remaining = self.remaining_shares - shares_closing;

        Ok(TrimPreview {
            shares_closing,
            shares_remaining,
            profit_per_share,
            pnl: profit_per_share * Decimal::from(shares_closing),
            r_multiple: self.r_multiple_at(exit_price),
            is_full_close: shares_closing > 0 && shares_remaining == 0,
        })
    }

    /// Exit part or all of the remaining shares.
    ///
    /// Every check happens before the first write; on error the trade is
    /// untouched.
    pub fn apply_trim(&mut self, request: &TrimRequest) -> Result<TrimEvent, TrimError> {
        self.validate_trim(request.percent, request.exit_price)?;

        let shares = shares_for_percent(self.remaining_shares, request.percent);
        if shares == 0 {
            return Err(TrimError::NoSharesToClose);
        }

        let next_id = self.trim_history.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let event = TrimEvent {
            id: next_id,
            date: request.date,
            shares,
            exit_price: request.exit_price,
            r_multiple: self.r_multiple_at(request.exit_price),
            pnl: (request.exit_price - self.entry) * Decimal::from(shares),
            percent_trimmed: request.percent,
        };

        self.trim_history.push(event.clone());
        self.remaining_shares -= shares;
        self.total_realized_pnl += event.pnl;

        if let Some(stop) = request.new_stop.filter(|s| *s > Decimal::ZERO) {
            self.current_stop = Some(stop);
        }

        if self.remaining_shares == 0 {
            self.status = TradeStatus::Closed;
            self.exit_price = Some(request.exit_price);
            self.exit_date = Some(request.date);
            self.pnl = Some(self.total_realized_pnl);
        } else {
            self.status = TradeStatus::Trimmed;
        }

        Ok(event)
    }

    /// Override entry, stop and open share count.
    ///
    /// Trim history is never rewritten. For a trimmed trade the new share
    /// count replaces the remainder and the original count is rebased so
    /// that trimmed + remaining still equals original.
    pub fn apply_edit(&mut self, edit: &TradeEdit) -> Result<(), JournalError> {
        if self.status == TradeStatus::Closed {
            return Err(JournalError::TradeClosed(self.id));
        }
        if edit.entry <= Decimal::ZERO {
            return Err(JournalError::InvalidEdit("Please enter a valid entry price".into()));
        }
        if edit.stop <= Decimal::ZERO {
            return Err(JournalError::InvalidEdit("Please enter a valid stop loss".into()));
        }
        if edit.shares == 0 {
            return Err(JournalError::InvalidEdit(
                "Please enter a valid number of shares".into(),
            ));
        }
        if edit.stop >= edit.entry {
            return Err(SizingError::StopAboveEntry.into());
        }

        let trimmed: u64 = self.trim_history.iter().map(|e| e.shares).sum();
        let shares = Decimal::from(edit.shares);

        self.entry = edit.entry;
        self.stop = edit.stop;
        self.current_stop = None;
        self.stop_distance = (edit.entry - edit.stop).abs();
        self.risk_dollars = self.stop_distance * shares;
        self.position_size = edit.entry * shares;
        self.remaining_shares = edit.shares;
        self.original_shares = edit.shares + trimmed;

        Ok(())
    }
}

/// On-disk shape of a trade, tolerant of records written before partial
/// exits existed (no `originalShares`, a single `shares` count, and an
/// optional single-exit `pnl`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradeRecord {
    id: i64,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    ticker: String,
    entry: Decimal,
    stop: Decimal,
    #[serde(default)]
    original_stop: Option<Decimal>,
    #[serde(default)]
    current_stop: Option<Decimal>,
    #[serde(default)]
    target: Option<Decimal>,
    #[serde(default)]
    shares: Option<u64>,
    #[serde(default)]
    original_shares: Option<u64>,
    #[serde(default)]
    remaining_shares: Option<u64>,
    #[serde(default)]
    position_size: Option<Decimal>,
    #[serde(default)]
    stop_distance: Option<Decimal>,
    #[serde(default)]
    risk_dollars: Option<Decimal>,
    #[serde(default)]
    risk_percent: Option<Decimal>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    status: Option<TradeStatus>,
    #[serde(default)]
    trim_history: Option<Vec<TrimEvent>>,
    #[serde(default, rename = "totalRealizedPnL")]
    total_realized_pnl: Option<Decimal>,
    #[serde(default)]
    exit_price: Option<Decimal>,
    #[serde(default)]
    exit_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pnl: Option<Decimal>,
}

impl From<TradeRecord> for Trade {
    fn from(r: TradeRecord) -> Self {
        // A stop moved during an earlier trim left the planned stop in
        // `originalStop`.
        let (stop, current_stop) = match r.original_stop {
            Some(original) if original != r.stop => (original, r.current_stop.or(Some(r.stop))),
            _ => (r.stop, r.current_stop),
        };

        let legacy_shares = r.shares.unwrap_or(0);
        let original_shares = r.original_shares.unwrap_or(legacy_shares);
        let stop_distance = r.stop_distance.unwrap_or((r.entry - stop).abs());

        let mut trade = Trade {
            id: r.id,
            timestamp: r.timestamp,
            ticker: r.ticker,
            entry: r.entry,
            stop,
            current_stop,
            target: r.target,
            position_size: r
                .position_size
                .unwrap_or(r.entry * Decimal::from(original_shares)),
            stop_distance,
            risk_dollars: r
                .risk_dollars
                .unwrap_or(stop_distance * Decimal::from(original_shares)),
            risk_percent: r.risk_percent.unwrap_or(Decimal::ZERO),
            notes: r.notes.unwrap_or_default(),
            original_shares,
            remaining_shares: original_shares,
            status: TradeStatus::Open,
            trim_history: Vec::new(),
            total_realized_pnl: Decimal::ZERO,
            exit_price: None,
            exit_date: None,
            pnl: None,
        };

        if r.original_shares.is_some() {
            let history = r.trim_history.unwrap_or_default();
            let projected = TradeProjection::from_history(original_shares, &history);
            trade.remaining_shares = r.remaining_shares.unwrap_or(projected.remaining_shares);
            trade.total_realized_pnl = r.total_realized_pnl.unwrap_or(projected.total_realized_pnl);
            trade.status = r.status.unwrap_or(projected.status);
            trade.trim_history = history;
            trade.exit_price = r.exit_price;
            trade.exit_date = r.exit_date;
            trade.pnl = r.pnl;
            return trade;
        }

        // Pre-trim record: a closed single-exit trade becomes one full exit so
        // that the history still accounts for every share.
        if r.status == Some(TradeStatus::Closed) && original_shares > 0 {
            let shares = Decimal::from(original_shares);
            // Missing exit price: back it out of the recorded P&L
            let exit_price = r
                .exit_price
                .filter(|p| *p > Decimal::ZERO)
                .or_else(|| r.pnl.map(|pnl| trade.entry + pnl / shares))
                .unwrap_or(trade.entry);
            let pnl = r.pnl.unwrap_or((exit_price - trade.entry) * shares);
            trade.close_legacy(exit_price, r.exit_date.unwrap_or(r.timestamp), pnl);
        }

        trade
    }
}

impl Trade {
    /// Record a pre-trim closed trade as one full exit with the P&L it was
    /// saved with.
    fn close_legacy(&mut self, exit_price: Decimal, date: DateTime<Utc>, pnl: Decimal) {
        self.trim_history = vec![TrimEvent {
            id: 1,
            date,
            shares: self.original_shares,
            exit_price,
            r_multiple: self.r_multiple_at(exit_price),
            pnl,
            percent_trimmed: dec!(100),
        }];
        self.remaining_shares = 0;
        self.total_realized_pnl = pnl;
        self.status = TradeStatus::Closed;
        self.exit_price = Some(exit_price);
        self.exit_date = Some(date);
        self.pnl = Some(pnl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
    }

    fn sample_trade(shares: u64) -> Trade {
        let result = SizingResult {
            is_complete: true,
            entry_price: dec!(100),
            stop_price: dec!(95),
            target_price: Some(dec!(120)),
            shares,
            position_size: dec!(100) * Decimal::from(shares),
            risk_dollars: dec!(5) * Decimal::from(shares),
            stop_per_share: dec!(5),
            original_risk_percent: dec!(1),
            ..SizingResult::empty()
        };
        let meta = TradeMeta {
            ticker: "aapl".to_string(),
            notes: "breakout".to_string(),
        };
        Trade::from_sizing(1_700_000_000_000, day(1), &result, &meta)
    }

    #[test]
    fn test_new_trade_is_open() {
        let trade = sample_trade(100);
        assert_eq!(trade.ticker, "AAPL");
        assert_eq!(trade.status(), TradeStatus::Open);
        assert_eq!(trade.remaining_shares(), 100);
        assert_eq!(trade.original_shares(), 100);
        assert!(trade.trim_history().is_empty());
        assert!(trade.is_consistent());
    }

    #[test]
    fn test_trim_then_close() {
        let mut trade = sample_trade(100);

        let first = trade
            .apply_trim(&TrimRequest::new(dec!(50), dec!(110), day(2)))
            .unwrap();
        assert_eq!(first.shares, 50);
        assert_eq!(first.pnl, dec!(500));
        assert_eq!(first.r_multiple, dec!(2));
        assert_eq!(trade.remaining_shares(), 50);
        assert_eq!(trade.status(), TradeStatus::Trimmed);
        assert!(trade.exit_price().is_none());

        let second = trade
            .apply_trim(&TrimRequest::new(dec!(100), dec!(90), day(3)))
            .unwrap();
        assert_eq!(second.shares, 50);
        assert_eq!(second.pnl, dec!(-500));
        assert_eq!(second.r_multiple, dec!(-2));
        assert_eq!(trade.remaining_shares(), 0);
        assert_eq!(trade.status(), TradeStatus::Closed);
        assert_eq!(trade.total_realized_pnl(), Decimal::ZERO);
        assert_eq!(trade.exit_price(), Some(dec!(90)));
        assert_eq!(trade.exit_date(), Some(day(3)));
        assert_eq!(trade.pnl(), Some(Decimal::ZERO));
        assert!(trade.is_consistent());
    }

    #[test]
    fn test_trim_rejects_zero_shares_without_mutation() {
        let mut trade = sample_trade(1);
        let before = trade.clone();

        let err = trade
            .apply_trim(&TrimRequest::new(dec!(50), dec!(110), day(2)))
            .unwrap_err();

        assert_eq!(err, TrimError::NoSharesToClose);
        assert_eq!(trade, before);
    }

    #[test]
    fn test_trim_validation() {
        let mut trade = sample_trade(10);
        let before = trade.clone();

        assert_eq!(
            trade.apply_trim(&TrimRequest::new(dec!(0), dec!(110), day(2))),
            Err(TrimError::InvalidPercent(dec!(0)))
        );
        assert_eq!(
            trade.apply_trim(&TrimRequest::new(dec!(101), dec!(110), day(2))),
            Err(TrimError::InvalidPercent(dec!(101)))
        );
        assert_eq!(
            trade.apply_trim(&TrimRequest::new(dec!(50), dec!(0), day(2))),
            Err(TrimError::InvalidExitPrice(dec!(0)))
        );
        assert_eq!(trade, before);

        trade.apply_trim(&TrimRequest::close(dec!(100), day(2))).unwrap();
        assert_eq!(
            trade.apply_trim(&TrimRequest::close(dec!(100), day(3))),
            Err(TrimError::TradeClosed)
        );
    }

    #[test]
    fn test_r_multiple_sign() {
        let trade = sample_trade(10);
        assert!(trade.r_multiple_at(dec!(101)) > Decimal::ZERO);
        assert!(trade.r_multiple_at(dec!(99)) < Decimal::ZERO);
        assert_eq!(trade.r_multiple_at(dec!(100)), Decimal::ZERO);
    }

    #[test]
    fn test_r_multiple_uses_planned_stop_after_stop_move() {
        let mut trade = sample_trade(100);
        trade
            .apply_trim(&TrimRequest::new(dec!(50), dec!(110), day(2)).with_new_stop(dec!(100)))
            .unwrap();
        assert_eq!(trade.current_stop, Some(dec!(100)));
        assert_eq!(trade.stop, dec!(95));

        let event = trade
            .apply_trim(&TrimRequest::close(dec!(115), day(3)))
            .unwrap();
        assert_eq!(event.r_multiple, dec!(3));
    }

    #[test]
    fn test_projection_matches_after_every_trim() {
        let percents = [dec!(10), dec!(33), dec!(50), dec!(25), dec!(75), dec!(100)];
        let prices = [dec!(104), dec!(97.5), dec!(112), dec!(100), dec!(90)];

        for original in [1u64, 3, 7, 10, 99, 100, 1234] {
            let mut trade = sample_trade(original);
            for (i, percent) in percents.iter().enumerate() {
                let price = prices[i % prices.len()];
                let _ = trade.apply_trim(&TrimRequest::new(*percent, price, day(2)));

                assert!(trade.is_consistent(), "inconsistent after trim {}", i);
                let trimmed: u64 = trade.trim_history().iter().map(|e| e.shares).sum();
                assert_eq!(trimmed + trade.remaining_shares(), trade.original_shares());
            }
            assert_eq!(trade.status(), TradeStatus::Closed);
        }
    }

    #[test]
    fn test_free_roll() {
        let mut trade = sample_trade(100);
        // 50 @ 110 realizes 500, remaining risk 50 × 5 = 250
        trade
            .apply_trim(&TrimRequest::new(dec!(50), dec!(110), day(2)))
            .unwrap();
        assert!(trade.is_free_roll());
        assert_eq!(trade.display_status(), "Free Rolled");

        let mut small = sample_trade(100);
        // 10 @ 101 realizes 10, remaining risk 90 × 5 = 450
        small
            .apply_trim(&TrimRequest::new(dec!(10), dec!(101), day(2)))
            .unwrap();
        assert!(!small.is_free_roll());
        assert_eq!(small.display_status(), "Trimmed");

        assert!(!sample_trade(100).is_free_roll());
    }

    #[test]
    fn test_free_roll_epsilon() {
        let mut trade = sample_trade(2);
        // 1 @ 104.99 realizes 4.99 against 1 × 5 remaining risk
        trade
            .apply_trim(&TrimRequest::new(dec!(50), dec!(104.99), day(2)))
            .unwrap();
        assert!(trade.is_free_roll());
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let trade = sample_trade(100);
        let preview = trade.preview_trim(dec!(25), dec!(110)).unwrap();
        assert_eq!(preview.shares_closing, 25);
        assert_eq!(preview.shares_remaining, 75);
        assert_eq!(preview.pnl, dec!(250));
        assert!(!preview.is_full_close);
        assert_eq!(trade.remaining_shares(), 100);

        let full = trade.preview_trim(dec!(100), dec!(90)).unwrap();
        assert!(full.is_full_close);
        assert_eq!(full.pnl, dec!(-1000));
    }

    #[test]
    fn test_edit_open_trade() {
        let mut trade = sample_trade(100);
        trade
            .apply_edit(&TradeEdit {
                entry: dec!(50),
                stop: dec!(48),
                shares: 200,
            })
            .unwrap();

        assert_eq!(trade.original_shares(), 200);
        assert_eq!(trade.remaining_shares(), 200);
        assert_eq!(trade.stop_distance, dec!(2));
        assert_eq!(trade.risk_dollars, dec!(400));
        assert_eq!(trade.position_size, dec!(10000));
        assert!(trade.is_consistent());
    }

    #[test]
    fn test_edit_trimmed_trade_keeps_history_and_conservation() {
        let mut trade = sample_trade(100);
        trade
            .apply_trim(&TrimRequest::new(dec!(50), dec!(110), day(2)))
            .unwrap();
        trade
            .apply_edit(&TradeEdit {
                entry: dec!(100),
                stop: dec!(97),
                shares: 30,
            })
            .unwrap();

        assert_eq!(trade.trim_history().len(), 1);
        assert_eq!(trade.trim_history()[0].pnl, dec!(500));
        assert_eq!(trade.remaining_shares(), 30);
        assert_eq!(trade.original_shares(), 80);
        assert_eq!(trade.status(), TradeStatus::Trimmed);
        assert!(trade.is_consistent());
    }

    #[test]
    fn test_edit_rejections() {
        let mut trade = sample_trade(10);
        assert!(matches!(
            trade.apply_edit(&TradeEdit { entry: dec!(0), stop: dec!(1), shares: 1 }),
            Err(JournalError::InvalidEdit(_))
        ));
        assert!(matches!(
            trade.apply_edit(&TradeEdit { entry: dec!(10), stop: dec!(9), shares: 0 }),
            Err(JournalError::InvalidEdit(_))
        ));

        // Long only: the stop must stay below entry
        assert_eq!(
            trade.apply_edit(&TradeEdit { entry: dec!(100), stop: dec!(105), shares: 10 }),
            Err(JournalError::Sizing(SizingError::StopAboveEntry))
        );
        assert_eq!(
            trade.apply_edit(&TradeEdit { entry: dec!(100), stop: dec!(100), shares: 10 }),
            Err(JournalError::Sizing(SizingError::StopAboveEntry))
        );
        assert_eq!(trade.stop, dec!(95));
        let event = trade.apply_trim(&TrimRequest::new(dec!(50), dec!(110), day(2))).unwrap();
        assert_eq!(event.r_multiple, dec!(2));

        trade.apply_trim(&TrimRequest::close(dec!(120), day(2))).unwrap();
        assert_eq!(
            trade.apply_edit(&TradeEdit { entry: dec!(10), stop: dec!(9), shares: 5 }),
            Err(JournalError::TradeClosed(trade.id))
        );
    }

    #[test]
    fn test_serde_roundtrip_preserves_history() {
        let mut trade = sample_trade(100);
        trade
            .apply_trim(&TrimRequest::new(dec!(50), dec!(110), day(2)))
            .unwrap();

        let json = serde_json::to_string(&trade).unwrap();
        assert!(json.contains("\"originalShares\":100"));
        assert!(json.contains("\"status\":\"trimmed\""));

        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trade);
    }

    #[test]
    fn test_legacy_open_record_is_migrated() {
        let json = r#"{
            "id": 1700000000000,
            "timestamp": "2024-03-01T12:00:00Z",
            "ticker": "TSLA",
            "entry": 243.1,
            "stop": 237.9,
            "target": null,
            "shares": 19,
            "positionSize": 4618.9,
            "riskDollars": 98.8,
            "riskPercent": 1,
            "notes": null,
            "status": "open",
            "exitPrice": null,
            "exitDate": null,
            "pnl": null
        }"#;

        let trade: Trade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.original_shares(), 19);
        assert_eq!(trade.remaining_shares(), 19);
        assert!(trade.trim_history().is_empty());
        assert_eq!(trade.total_realized_pnl(), Decimal::ZERO);
        assert_eq!(trade.status(), TradeStatus::Open);
        assert_eq!(trade.notes, "");
        assert!(trade.is_consistent());
    }

    #[test]
    fn test_legacy_closed_record_becomes_single_exit() {
        let json = r#"{
            "id": 1700000000001,
            "timestamp": "2024-03-01T12:00:00Z",
            "ticker": "NVDA",
            "entry": 100,
            "stop": 95,
            "shares": 20,
            "status": "closed",
            "exitPrice": 110,
            "exitDate": "2024-03-05T12:00:00Z",
            "pnl": 200
        }"#;

        let trade: Trade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.status(), TradeStatus::Closed);
        assert_eq!(trade.remaining_shares(), 0);
        assert_eq!(trade.trim_history().len(), 1);
        assert_eq!(trade.trim_history()[0].shares, 20);
        assert_eq!(trade.total_realized_pnl(), dec!(200));
        assert_eq!(trade.pnl(), Some(dec!(200)));
        assert!(trade.is_consistent());
    }

    #[test]
    fn test_legacy_closed_record_without_exit_price_stays_closed() {
        let json = r#"{
            "id": 1700000000002,
            "timestamp": "2024-03-01T12:00:00Z",
            "ticker": "MSFT",
            "entry": 100,
            "stop": 95,
            "shares": 20,
            "status": "closed",
            "pnl": 150
        }"#;

        let trade: Trade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.status(), TradeStatus::Closed);
        assert_eq!(trade.remaining_shares(), 0);
        assert_eq!(trade.pnl(), Some(dec!(150)));
        assert_eq!(trade.total_realized_pnl(), dec!(150));
        // 150 / 20 shares above a $100 entry
        assert_eq!(trade.exit_price(), Some(dec!(107.5)));
        assert_eq!(trade.trim_history()[0].r_multiple, dec!(1.5));
        assert!(trade.is_consistent());

        // A zero exit price is treated the same way
        let zero_exit = json.replace(r#""pnl": 150"#, r#""pnl": 150, "exitPrice": 0"#);
        let trade: Trade = serde_json::from_str(&zero_exit).unwrap();
        assert_eq!(trade.status(), TradeStatus::Closed);
        assert_eq!(trade.exit_price(), Some(dec!(107.5)));

        // Neither price nor P&L: closed flat at entry
        let bare = r#"{
            "id": 1700000000003,
            "timestamp": "2024-03-01T12:00:00Z",
            "ticker": "MSFT",
            "entry": 100,
            "stop": 95,
            "shares": 20,
            "status": "closed"
        }"#;
        let trade: Trade = serde_json::from_str(bare).unwrap();
        assert_eq!(trade.status(), TradeStatus::Closed);
        assert_eq!(trade.remaining_shares(), 0);
        assert_eq!(trade.total_realized_pnl(), dec!(0));
        assert!(trade.is_consistent());
    }

    #[test]
    fn test_record_with_original_stop_restores_planned_stop() {
        let json = r#"{
            "id": 1,
            "timestamp": "2024-03-01T12:00:00Z",
            "ticker": "AMD",
            "entry": 100,
            "stop": 100,
            "originalStop": 95,
            "originalShares": 100,
            "remainingShares": 50,
            "status": "trimmed",
            "trimHistory": [{
                "id": 1, "date": "2024-03-02T12:00:00Z", "shares": 50,
                "exitPrice": 110, "rMultiple": 2, "pnl": 500, "percentTrimmed": 50
            }],
            "totalRealizedPnL": 500
        }"#;

        let trade: Trade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.stop, dec!(95));
        assert_eq!(trade.current_stop, Some(dec!(100)));
        assert_eq!(trade.risk_per_share(), dec!(5));
        assert!(trade.is_free_roll());
    }
}
