//! Data models for sizing results, journal trades, trims, account and stats.

mod account;
mod metrics;
mod sizing;
mod trade;
mod trim;

pub use account::AccountLedger;
pub use metrics::{EquityPoint, JournalStats};
pub use sizing::{RLevel, RiskScenario, SizingInput, SizingResult, SizingWarning};
pub use trade::{Trade, TradeEdit, TradeMeta, TradeStatus};
pub use trim::{exit_price_for_r, suggested_trim_percent, TrimEvent, TrimPreview, TrimRequest};
