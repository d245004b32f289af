//! Risk-based position sizing capped by a maximum position size.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::error::SizingError;
use crate::models::{RLevel, RiskScenario, SizingInput, SizingResult, SizingWarning};

/// Risk levels (in percent) shown in the scenario table.
pub const SCENARIO_RISK_LEVELS: [Decimal; 5] = [dec!(0.1), dec!(0.25), dec!(0.5), dec!(1), dec!(1.5)];

/// Highest R level on the ladder.
const LADDER_TOP: i32 = 5;

/// Share count and position size after the risk budget and the cap.
struct Allocation {
    nominal_shares: u64,
    nominal_position: Decimal,
    shares: u64,
    position: Decimal,
    is_limited: bool,
}

/// Calculator for long position sizes.
///
/// Risk-based sizing is the primary driver; the max-position cap can only
/// reduce the share count. Shares are always floored so the actual risk
/// never exceeds the budget.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    risk_levels: Vec<Decimal>,
}

impl Default for PositionSizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionSizer {
    pub fn new() -> Self {
        Self::with_risk_levels(SCENARIO_RISK_LEVELS.to_vec())
    }

    /// Use custom scenario risk levels.
    pub fn with_risk_levels(risk_levels: Vec<Decimal>) -> Self {
        Self { risk_levels }
    }

    /// Size a position.
    ///
    /// Missing or zero prices (or a zero account/risk) give an incomplete,
    /// zeroed result. A stop at or above entry is `StopAboveEntry`.
    pub fn compute(&self, input: &SizingInput) -> Result<SizingResult, SizingError> {
        validate(input)?;

        let (entry, stop) = match (input.entry_price, input.stop_price) {
            (Some(entry), Some(stop)) if !entry.is_zero() && !stop.is_zero() => (entry, stop),
            _ => return Ok(SizingResult::empty()),
        };
        if input.account_size.is_zero() || input.risk_percent.is_zero() {
            return Ok(SizingResult::empty());
        }
        if stop >= entry {
            return Err(SizingError::StopAboveEntry);
        }

        // A zero target counts as none
        let target_price = input.target_price.filter(|t| !t.is_zero());

        let account = input.account_size;
        let risk_per_share = entry - stop;
        let nominal_risk = account * input.risk_percent / dec!(100);
        let max_position = account * input.max_position_percent / dec!(100);

        let alloc = allocate(nominal_risk, risk_per_share, entry, max_position);

        let risk_dollars = Decimal::from(alloc.shares) * risk_per_share;
        let mut result = SizingResult {
            is_complete: true,
            entry_price: entry,
            stop_price: stop,
            target_price,
            shares: alloc.shares,
            position_size: alloc.position,
            risk_dollars,
            risk_percent: risk_dollars / account * dec!(100),
            percent_of_account: alloc.position / account * dec!(100),
            is_limited: alloc.is_limited,
            original_shares: alloc.nominal_shares,
            original_position_size: alloc.nominal_position,
            original_percent_of_account: alloc.nominal_position / account * dec!(100),
            original_risk_dollars: nominal_risk,
            original_risk_percent: input.risk_percent,
            stop_per_share: risk_per_share,
            stop_distance_percent: risk_per_share / entry * dec!(100),
            r_multiple: None,
            profit: None,
            roi_percent: None,
            account_growth_percent: None,
            target_5r: Some(entry + Decimal::from(LADDER_TOP) * risk_per_share),
            warnings: Vec::new(),
        };

        if let Some(target) = target_price.filter(|t| *t != entry) {
            let profit_per_share = target - entry;
            let profit = Decimal::from(alloc.shares) * profit_per_share;
            result.r_multiple = Some(profit_per_share / risk_per_share);
            result.profit = Some(profit);
            result.roi_percent = Some(profit_per_share / entry * dec!(100));
            result.account_growth_percent = Some(profit / account * dec!(100));
        }
        if target_price.is_some_and(|t| t <= entry) {
            result.warnings.push(SizingWarning::TargetAtOrBelowEntry);
        }
        if alloc.is_limited {
            result.warnings.push(SizingWarning::PositionLimited {
                max_position_percent: input.max_position_percent,
            });
        }

        debug!(
            shares = result.shares,
            position_size = %result.position_size,
            risk_dollars = %result.risk_dollars,
            is_limited = result.is_limited,
            "Sized position"
        );

        Ok(result)
    }

    /// Shares, position size and actual risk at each scenario risk level,
    /// using the same floor and cap rules as [`compute`](Self::compute).
    ///
    /// Empty unless the input is complete and valid.
    pub fn scenarios(&self, input: &SizingInput) -> Vec<RiskScenario> {
        let Ok(result) = self.compute(input) else {
            return Vec::new();
        };
        if !result.is_complete {
            return Vec::new();
        }

        let account = input.account_size;
        let entry = result.entry_price;
        let risk_per_share = result.stop_per_share;
        let max_position = account * input.max_position_percent / dec!(100);

        self.risk_levels
            .iter()
            .map(|&risk_percent| {
                let budget = account * risk_percent / dec!(100);
                let alloc = allocate(budget, risk_per_share, entry, max_position);
                RiskScenario {
                    risk_percent,
                    shares: alloc.shares,
                    position_size: alloc.position,
                    actual_risk: Decimal::from(alloc.shares) * risk_per_share,
                    is_active: risk_percent == input.risk_percent,
                }
            })
            .collect()
    }

    /// Price and profit at the stop (−1R), entry (0R) and +1R through +5R.
    ///
    /// Empty for a result with no shares.
    pub fn r_ladder(&self, result: &SizingResult) -> Vec<RLevel> {
        if !result.is_tradeable() {
            return Vec::new();
        }

        let risk_per_share = result.stop_per_share;
        let shares = Decimal::from(result.shares);

        (-1..=LADDER_TOP)
            .map(|r| {
                let k = Decimal::from(r);
                RLevel {
                    r,
                    price: result.entry_price + k * risk_per_share,
                    profit: k * risk_per_share * shares,
                }
            })
            .collect()
    }
}

fn validate(input: &SizingInput) -> Result<(), SizingError> {
    let checks = [
        ("account size", Some(input.account_size)),
        ("risk percent", Some(input.risk_percent)),
        ("entry price", input.entry_price),
        ("stop price", input.stop_price),
        ("target price", input.target_price),
    ];
    for (field, value) in checks {
        if let Some(value) = value.filter(|v| v.is_sign_negative() && !v.is_zero()) {
            return Err(SizingError::InvalidInput { field, value });
        }
    }

    let max = input.max_position_percent;
    if max <= Decimal::ZERO || max > dec!(100) {
        return Err(SizingError::InvalidInput {
            field: "max position percent",
            value: max,
        });
    }
    Ok(())
}

fn allocate(
    risk_budget: Decimal,
    risk_per_share: Decimal,
    entry: Decimal,
    max_position: Decimal,
) -> Allocation {
    let nominal_shares = floor_shares(risk_budget / risk_per_share);
    let nominal_position = Decimal::from(nominal_shares) * entry;

    if nominal_position > max_position {
        let shares = floor_shares(max_position / entry);
        Allocation {
            nominal_shares,
            nominal_position,
            shares,
            position: Decimal::from(shares) * entry,
            is_limited: true,
        }
    } else {
        Allocation {
            nominal_shares,
            nominal_position,
            shares: nominal_shares,
            position: nominal_position,
            is_limited: false,
        }
    }
}

fn floor_shares(value: Decimal) -> u64 {
    value.floor().to_u64().unwrap_or(0)
}
