//! Trade manager: the single owner of settings, account and journal state.
//!
//! Every mutation goes through a command method here. Commands validate
//! before they write, update the account ledger, log, and publish a
//! [`JournalEvent`]. Persistence is the caller's job after a command
//! returns `Ok`.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{JournalError, SizingError};
use crate::models::{
    AccountLedger, RLevel, RiskScenario, SizingInput, SizingResult, Trade, TradeEdit, TradeMeta,
    TradeStatus, TrimEvent, TrimPreview, TrimRequest,
};

use super::events::{EventBus, EventReceiver, JournalEvent};
use super::{PositionSizer, Settings};

/// Which journal entries to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    Trimmed,
    Closed,
    /// Trimmed or closed with positive realized P&L
    Winners,
    /// Trimmed or closed with negative realized P&L
    Losers,
}

impl StatusFilter {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "open" => Self::Open,
            "trimmed" => Self::Trimmed,
            "closed" => Self::Closed,
            "winners" | "wins" => Self::Winners,
            "losers" | "losses" => Self::Losers,
            _ => Self::All,
        }
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        let has_exits = matches!(trade.status(), TradeStatus::Trimmed | TradeStatus::Closed);
        match self {
            Self::All => true,
            Self::Open => trade.status() == TradeStatus::Open,
            Self::Trimmed => trade.status() == TradeStatus::Trimmed,
            Self::Closed => trade.status() == TradeStatus::Closed,
            Self::Winners => has_exits && trade.total_realized_pnl() > Decimal::ZERO,
            Self::Losers => has_exits && trade.total_realized_pnl() < Decimal::ZERO,
        }
    }
}

/// Column to order listed trades by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Date,
    Ticker,
    Entry,
    Pnl,
}

impl SortKey {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ticker" => Self::Ticker,
            "entry" => Self::Entry,
            "pnl" => Self::Pnl,
            _ => Self::Date,
        }
    }

    fn compare(&self, a: &Trade, b: &Trade) -> Ordering {
        match self {
            Self::Date => a.timestamp.cmp(&b.timestamp),
            Self::Ticker => a.ticker.to_lowercase().cmp(&b.ticker.to_lowercase()),
            Self::Entry => a.entry.cmp(&b.entry),
            Self::Pnl => a.total_realized_pnl().cmp(&b.total_realized_pnl()),
        }
    }
}

/// State owner for the calculator and the journal.
#[derive(Debug)]
pub struct TradeManager {
    settings: Settings,
    account: AccountLedger,
    sizer: PositionSizer,

    /// Newest first
    trades: Vec<Trade>,

    last_id: i64,
    events: EventBus,
}

impl Default for TradeManager {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl TradeManager {
    /// Empty journal seeded from `settings`.
    pub fn new(settings: Settings) -> Self {
        let account = AccountLedger::from_settings(&settings);
        Self {
            settings,
            account,
            sizer: PositionSizer::new(),
            trades: Vec::new(),
            last_id: 0,
            events: EventBus::default(),
        }
    }

    /// Rebuild state from storage.
    ///
    /// A persisted account is authoritative for realized P&L, so deleted
    /// trades keep their contribution. Without one, realized P&L is summed
    /// from the journal. Trades are re-ordered newest first.
    pub fn restore(settings: Settings, mut trades: Vec<Trade>, account: Option<AccountLedger>) -> Self {
        trades.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        let account = match account {
            Some(mut ledger) => {
                ledger.recompute_size(&settings);
                ledger
            }
            None => {
                let mut ledger = AccountLedger::from_settings(&settings);
                ledger.realized_pnl = trades
                    .iter()
                    .filter(|t| t.status() != TradeStatus::Open)
                    .map(|t| t.total_realized_pnl())
                    .sum();
                ledger.recompute_size(&settings);
                ledger
            }
        };

        let inconsistent = trades.iter().filter(|t| !t.is_consistent()).count();
        if inconsistent > 0 {
            warn!(count = inconsistent, "Loaded trades whose totals disagree with their trim history");
        }

        let last_id = trades.iter().map(|t| t.id).max().unwrap_or(0);
        info!(
            trades = trades.len(),
            realized_pnl = %account.realized_pnl,
            account_size = %account.current_size,
            "Restored journal"
        );

        Self {
            settings,
            account,
            sizer: PositionSizer::new(),
            trades,
            last_id,
            events: EventBus::default(),
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn account(&self) -> &AccountLedger {
        &self.account
    }

    // === Calculator ===

    /// Sizing input from the current account, risk and cap.
    pub fn sizing_input(
        &self,
        entry: Option<Decimal>,
        stop: Option<Decimal>,
        target: Option<Decimal>,
    ) -> SizingInput {
        SizingInput {
            account_size: self.account.current_size,
            risk_percent: self.account.risk_percent,
            entry_price: entry,
            stop_price: stop,
            target_price: target,
            max_position_percent: self.account.max_position_percent,
        }
    }

    pub fn compute_sizing(&self, input: &SizingInput) -> Result<SizingResult, SizingError> {
        self.sizer.compute(input)
    }

    pub fn scenarios(&self, input: &SizingInput) -> Vec<RiskScenario> {
        self.sizer.scenarios(input)
    }

    pub fn r_ladder(&self, result: &SizingResult) -> Vec<RLevel> {
        self.sizer.r_ladder(result)
    }

    /// Select the risk percent used for the next sizing.
    pub fn set_risk_percent(&mut self, risk_percent: Decimal) -> Result<(), SizingError> {
        if risk_percent <= Decimal::ZERO {
            return Err(SizingError::InvalidInput {
                field: "risk percent",
                value: risk_percent,
            });
        }
        self.account.risk_percent = risk_percent;
        self.publish_account();
        Ok(())
    }

    /// Select the max position percent used for the next sizing.
    pub fn set_max_position_percent(&mut self, percent: Decimal) -> Result<(), SizingError> {
        if percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(SizingError::InvalidInput {
                field: "max position percent",
                value: percent,
            });
        }
        self.account.max_position_percent = percent;
        self.publish_account();
        Ok(())
    }

    // === Journal commands ===

    /// Log a trade from a sizing result.
    pub fn create_trade(&mut self, result: &SizingResult, meta: TradeMeta) -> Result<Trade, JournalError> {
        self.create_trade_at(result, meta, Utc::now())
    }

    /// Log a trade with an explicit timestamp.
    pub fn create_trade_at(
        &mut self,
        result: &SizingResult,
        meta: TradeMeta,
        timestamp: DateTime<Utc>,
    ) -> Result<Trade, JournalError> {
        if !result.is_tradeable() {
            return Err(JournalError::NoShares);
        }

        let id = self.next_id(timestamp);
        let trade = Trade::from_sizing(id, timestamp, result, &meta);
        self.trades.insert(0, trade.clone());

        info!(
            trade_id = trade.id,
            ticker = %trade.ticker,
            shares = trade.original_shares(),
            entry = %trade.entry,
            stop = %trade.stop,
            "Trade logged"
        );
        self.events.send(JournalEvent::TradeCreated(trade.clone()));
        Ok(trade)
    }

    /// What a trim would do, without applying it.
    pub fn preview_trim(&self, id: i64, percent: Decimal, exit_price: Decimal) -> Result<TrimPreview, JournalError> {
        let trade = self.trade(id).ok_or(JournalError::TradeNotFound(id))?;
        Ok(trade.preview_trim(percent, exit_price)?)
    }

    /// Exit part or all of a trade's remaining shares.
    pub fn apply_trim(&mut self, id: i64, request: &TrimRequest) -> Result<TrimEvent, JournalError> {
        let idx = self.index_of(id)?;

        let event = match self.trades[idx].apply_trim(request) {
            Ok(event) => event,
            Err(e) => {
                warn!(trade_id = id, error = %e, "Trim rejected");
                return Err(e.into());
            }
        };

        self.account.record_realized(event.pnl, &self.settings);

        let trade = self.trades[idx].clone();
        if trade.is_closed() {
            info!(
                trade_id = id,
                ticker = %trade.ticker,
                exit_price = %event.exit_price,
                pnl = %trade.total_realized_pnl(),
                "Trade closed"
            );
            self.events.send(JournalEvent::TradeClosed {
                trade,
                trim: event.clone(),
            });
        } else {
            info!(
                trade_id = id,
                ticker = %trade.ticker,
                shares = event.shares,
                remaining = trade.remaining_shares(),
                pnl = %event.pnl,
                r = %event.r_multiple.round_dp(2),
                "Trade trimmed"
            );
            self.events.send(JournalEvent::TradeTrimmed {
                trade,
                trim: event.clone(),
            });
        }
        self.publish_account();

        Ok(event)
    }

    /// Exit everything still open at `exit_price`.
    pub fn close_trade(&mut self, id: i64, exit_price: Decimal, date: DateTime<Utc>) -> Result<TrimEvent, JournalError> {
        self.apply_trim(id, &TrimRequest::close(exit_price, date))
    }

    /// Override entry, stop and shares.
    pub fn edit_trade(&mut self, id: i64, edit: &TradeEdit) -> Result<Trade, JournalError> {
        let idx = self.index_of(id)?;
        self.trades[idx].apply_edit(edit)?;

        let trade = self.trades[idx].clone();
        info!(
            trade_id = id,
            entry = %trade.entry,
            stop = %trade.stop,
            shares = trade.remaining_shares(),
            "Trade edited"
        );
        self.events.send(JournalEvent::TradeUpdated(trade.clone()));
        Ok(trade)
    }

    /// Edit ticker and notes, allowed in any status.
    pub fn annotate_trade(&mut self, id: i64, ticker: Option<String>, notes: Option<String>) -> Result<Trade, JournalError> {
        let idx = self.index_of(id)?;
        let trade = &mut self.trades[idx];
        if let Some(ticker) = ticker.map(|t| t.trim().to_uppercase()).filter(|t| !t.is_empty()) {
            trade.ticker = ticker;
        }
        if let Some(notes) = notes {
            trade.notes = notes;
        }

        let trade = trade.clone();
        debug!(trade_id = id, ticker = %trade.ticker, "Trade annotated");
        self.events.send(JournalEvent::TradeUpdated(trade.clone()));
        Ok(trade)
    }

    /// Remove a trade regardless of status.
    ///
    /// Realized P&L already booked to the account stays booked.
    pub fn delete_trade(&mut self, id: i64) -> Option<Trade> {
        let idx = self.trades.iter().position(|t| t.id == id)?;
        let trade = self.trades.remove(idx);

        info!(
            trade_id = id,
            ticker = %trade.ticker,
            status = %trade.status(),
            "Trade deleted"
        );
        self.events.send(JournalEvent::TradeDeleted(trade.clone()));
        Some(trade)
    }

    // === Queries ===

    pub fn trade(&self, id: i64) -> Option<&Trade> {
        self.trades.iter().find(|t| t.id == id)
    }

    /// All trades, newest first.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Trades matching `filter`, newest first.
    pub fn filtered(&self, filter: StatusFilter) -> Vec<&Trade> {
        self.trades.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Trades matching `filter`, ordered by `key`.
    pub fn sorted(&self, filter: StatusFilter, key: SortKey, ascending: bool) -> Vec<&Trade> {
        let mut trades = self.filtered(filter);
        trades.sort_by(|a, b| {
            let ord = key.compare(a, b);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        trades
    }

    /// Trades with shares still open.
    pub fn active_trades(&self) -> Vec<&Trade> {
        self.trades.iter().filter(|t| !t.is_closed()).collect()
    }

    // === Account commands ===

    /// Replace settings and re-derive the account size.
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), JournalError> {
        settings.validate().map_err(JournalError::InvalidEdit)?;

        self.account.apply_settings(&settings);
        self.settings = settings;

        info!(
            starting = %self.settings.starting_account_size,
            dynamic = self.settings.dynamic_account_enabled,
            account_size = %self.account.current_size,
            "Settings updated"
        );
        self.events.send(JournalEvent::SettingsChanged(self.settings.clone()));
        self.publish_account();
        Ok(())
    }

    /// Override the account size used for sizing.
    ///
    /// In dynamic mode the next trim or close recomputes it.
    pub fn set_account_size(&mut self, size: Decimal) -> Result<(), SizingError> {
        if size <= Decimal::ZERO {
            return Err(SizingError::InvalidInput {
                field: "account size",
                value: size,
            });
        }
        self.account.current_size = size;
        debug!(account_size = %size, "Account size set");
        self.publish_account();
        Ok(())
    }

    /// Clear the journal and realized P&L and restore default settings.
    pub fn reset(&mut self) {
        let removed = self.trades.len();
        self.settings = Settings::default();
        self.account = AccountLedger::from_settings(&self.settings);
        self.trades.clear();

        info!(removed, "Journal and account reset");
        self.events.send(JournalEvent::JournalReset);
        self.publish_account();
    }

    /// Replace settings, journal and realized P&L wholesale (backup import).
    pub fn replace_all(&mut self, settings: Settings, trades: Vec<Trade>, realized_pnl: Option<Decimal>) {
        let account = realized_pnl.map(|realized_pnl| AccountLedger {
            realized_pnl,
            ..AccountLedger::from_settings(&settings)
        });
        let restored = Self::restore(settings, trades, account);

        self.settings = restored.settings;
        self.account = restored.account;
        self.last_id = self.last_id.max(restored.last_id);
        self.trades = restored.trades;

        self.events.send(JournalEvent::SettingsChanged(self.settings.clone()));
        self.publish_account();
    }

    fn publish_account(&self) {
        self.events.send(JournalEvent::AccountChanged {
            current_size: self.account.current_size,
            realized_pnl: self.account.realized_pnl,
        });
    }

    fn index_of(&self, id: i64) -> Result<usize, JournalError> {
        self.trades
            .iter()
            .position(|t| t.id == id)
            .ok_or(JournalError::TradeNotFound(id))
    }

    /// Millisecond timestamp, bumped past the last id on collision.
    fn next_id(&mut self, timestamp: DateTime<Utc>) -> i64 {
        let id = timestamp.timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id
    }
}
