//! Inputs and outputs of a position-sizing calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything the sizer needs for one calculation.
///
/// Entry and stop are optional because the calculator is evaluated on
/// every input change; a missing price is an incomplete form, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingInput {
    /// Account equity used as the sizing base
    pub account_size: Decimal,

    /// Risk budget as a percentage of the account (1 = 1%)
    pub risk_percent: Decimal,

    /// Planned entry price
    pub entry_price: Option<Decimal>,

    /// Protective stop price (below entry for a long)
    pub stop_price: Option<Decimal>,

    /// Optional profit target
    #[serde(default)]
    pub target_price: Option<Decimal>,

    /// Maximum position size as a percentage of the account (0, 100]
    pub max_position_percent: Decimal,
}

/// Non-blocking conditions worth showing beside a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SizingWarning {
    /// Target supplied at or below entry; R-multiple will be zero or negative
    TargetAtOrBelowEntry,
    /// Share count was cut by the maximum position cap
    PositionLimited { max_position_percent: Decimal },
}

impl std::fmt::Display for SizingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizingWarning::TargetAtOrBelowEntry => {
                write!(f, "Target should be above entry for long trades")
            }
            SizingWarning::PositionLimited { max_position_percent } => {
                write!(f, "Position limited to {}% of account", max_position_percent)
            }
        }
    }
}

/// Result of a sizing calculation.
///
/// Carries both the risk-based ("original") figures and the figures after
/// the max-position cap so a caller can show the struck-through value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingResult {
    /// False when entry/stop (or account/risk) were missing
    pub is_complete: bool,

    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub target_price: Option<Decimal>,

    /// Share count, floored, after any limiting
    pub shares: u64,

    /// shares × entry
    pub position_size: Decimal,

    /// Dollar risk at the actual share count
    pub risk_dollars: Decimal,

    /// risk_dollars as a percentage of the account
    pub risk_percent: Decimal,

    /// position_size as a percentage of the account
    pub percent_of_account: Decimal,

    /// Whether the max-position cap reduced the share count
    pub is_limited: bool,

    // === Pre-limit figures ===
    pub original_shares: u64,
    pub original_position_size: Decimal,
    pub original_percent_of_account: Decimal,
    pub original_risk_dollars: Decimal,
    pub original_risk_percent: Decimal,

    // === Stop ===
    /// entry − stop
    pub stop_per_share: Decimal,

    /// Stop distance as a percentage of entry
    pub stop_distance_percent: Decimal,

    // === Target projections (only when a target differs from entry) ===
    pub r_multiple: Option<Decimal>,
    pub profit: Option<Decimal>,
    pub roi_percent: Option<Decimal>,
    pub account_growth_percent: Option<Decimal>,

    /// Price at +5R
    pub target_5r: Option<Decimal>,

    #[serde(default)]
    pub warnings: Vec<SizingWarning>,
}

impl SizingResult {
    /// Zeroed result for an incomplete form.
    pub fn empty() -> Self {
        Self {
            is_complete: false,
            entry_price: Decimal::ZERO,
            stop_price: Decimal::ZERO,
            target_price: None,
            shares: 0,
            position_size: Decimal::ZERO,
            risk_dollars: Decimal::ZERO,
            risk_percent: Decimal::ZERO,
            percent_of_account: Decimal::ZERO,
            is_limited: false,
            original_shares: 0,
            original_position_size: Decimal::ZERO,
            original_percent_of_account: Decimal::ZERO,
            original_risk_dollars: Decimal::ZERO,
            original_risk_percent: Decimal::ZERO,
            stop_per_share: Decimal::ZERO,
            stop_distance_percent: Decimal::ZERO,
            r_multiple: None,
            profit: None,
            roi_percent: None,
            account_growth_percent: None,
            target_5r: None,
            warnings: Vec::new(),
        }
    }

    /// Whether this result can be logged as a trade.
    pub fn is_tradeable(&self) -> bool {
        self.is_complete && self.shares > 0
    }
}

impl Default for SizingResult {
    fn default() -> Self {
        Self::empty()
    }
}

/// One row of the "what if I risked X%" table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScenario {
    pub risk_percent: Decimal,
    pub shares: u64,
    pub position_size: Decimal,
    pub actual_risk: Decimal,
    /// Matches the risk percent currently selected
    pub is_active: bool,
}

/// A price level expressed in R (multiples of the per-share risk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RLevel {
    pub r: i32,
    pub price: Decimal,
    pub profit: Decimal,
}
