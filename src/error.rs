//! Domain errors for sizing, trimming and journal commands.
//!
//! All of these are user-correctable: the caller re-prompts and nothing
//! has been mutated when one is returned.

use rust_decimal::Decimal;
use thiserror::Error;

/// Why a sizing calculation could not produce a result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizingError {
    #[error("Stop must be below entry for long trades")]
    StopAboveEntry,

    #[error("Invalid {field}: {value}")]
    InvalidInput { field: &'static str, value: Decimal },
}

/// Why a trim was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrimError {
    #[error("Trade is already closed")]
    TradeClosed,

    #[error("Trim percent must be in (0, 100], got {0}")]
    InvalidPercent(Decimal),

    #[error("Please enter a valid exit price (got {0})")]
    InvalidExitPrice(Decimal),

    #[error("No shares to close")]
    NoSharesToClose,
}

/// Errors surfaced by journal commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    #[error("Trade not found: {0}")]
    TradeNotFound(i64),

    #[error("Enter a valid trade to log (sizing produced no shares)")]
    NoShares,

    #[error("Trade {0} is closed and can no longer be edited")]
    TradeClosed(i64),

    #[error("Invalid edit: {0}")]
    InvalidEdit(String),

    #[error(transparent)]
    Sizing(#[from] SizingError),

    #[error(transparent)]
    Trim(#[from] TrimError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_error_converts_into_journal_error() {
        let err: JournalError = TrimError::NoSharesToClose.into();
        assert_eq!(err, JournalError::Trim(TrimError::NoSharesToClose));
        assert_eq!(err.to_string(), "No shares to close");
    }
}
