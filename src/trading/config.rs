//! Account and sizing settings.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// User settings that seed the account and the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Account equity before any logged trade
    pub starting_account_size: Decimal,

    /// Risk percent the calculator starts with (1 = 1%)
    pub default_risk_percent: Decimal,

    /// Maximum position size as a percentage of the account
    pub default_max_position_percent: Decimal,

    /// Track the account as starting size + realized P&L
    pub dynamic_account_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starting_account_size: dec!(10000),
            default_risk_percent: dec!(1),
            default_max_position_percent: dec!(100),
            dynamic_account_enabled: true,
        }
    }
}

impl Settings {
    /// Reject values the calculator cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.starting_account_size <= Decimal::ZERO {
            return Err(format!(
                "starting account size must be positive, got {}",
                self.starting_account_size
            ));
        }
        if self.default_risk_percent <= Decimal::ZERO {
            return Err(format!(
                "risk percent must be positive, got {}",
                self.default_risk_percent
            ));
        }
        if self.default_max_position_percent <= Decimal::ZERO
            || self.default_max_position_percent > dec!(100)
        {
            return Err(format!(
                "max position percent must be in (0, 100], got {}",
                self.default_max_position_percent
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.starting_account_size, dec!(10000));
        assert!(settings.dynamic_account_enabled);
    }

    #[test]
    fn test_validate_rejects_bad_max_position() {
        let settings = Settings {
            default_max_position_percent: dec!(150),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
