//! Account-level running figures: realized P&L and the size the sizer
//! works from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::trading::Settings;

/// Running account state shared by the sizer and the trim engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLedger {
    /// Account size used for sizing
    pub current_size: Decimal,

    /// Realized P&L accumulated over every trim and close
    #[serde(rename = "realizedPnL")]
    pub realized_pnl: Decimal,

    /// Risk percent currently selected
    pub risk_percent: Decimal,

    /// Max position percent currently selected
    pub max_position_percent: Decimal,
}

impl AccountLedger {
    /// Fresh ledger seeded from settings, with no realized P&L.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            current_size: settings.starting_account_size,
            realized_pnl: Decimal::ZERO,
            risk_percent: settings.default_risk_percent,
            max_position_percent: settings.default_max_position_percent,
        }
    }

    /// Add realized P&L from one exit and refresh the account size.
    pub fn record_realized(&mut self, pnl: Decimal, settings: &Settings) {
        self.realized_pnl += pnl;
        self.recompute_size(settings);
    }

    /// starting + realized in dynamic mode. In fixed mode the size is left
    /// alone so a manual override survives.
    pub fn recompute_size(&mut self, settings: &Settings) {
        if settings.dynamic_account_enabled {
            self.current_size = settings.starting_account_size + self.realized_pnl;
        }
    }

    /// Re-derive the size after a settings change.
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.risk_percent = settings.default_risk_percent;
        self.max_position_percent = settings.default_max_position_percent;
        self.current_size = if settings.dynamic_account_enabled {
            settings.starting_account_size + self.realized_pnl
        } else {
            settings.starting_account_size
        };
    }
}
