//! Versioned JSON backup of settings, journal and realized P&L.
//!
//! The document shape matches what the browser version of the calculator
//! exported, so its backups import unchanged:
//!
//! ```json
//! { "version": 1, "exportDate": "...", "settings": {..}, "journal": [..],
//!   "account": { "realizedPnL": 0 } }
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::Trade;
use crate::trading::{Settings, TradeManager};

pub const BACKUP_VERSION: u32 = 1;

/// Account figures carried in a backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupAccount {
    #[serde(rename = "realizedPnL", default)]
    pub realized_pnl: Decimal,
}

/// A full backup document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: u32,
    pub export_date: DateTime<Utc>,
    pub settings: Settings,
    /// Newest first
    pub journal: Vec<Trade>,
    #[serde(default)]
    pub account: Option<BackupAccount>,
}

impl Backup {
    /// Snapshot the manager's state.
    pub fn from_manager(manager: &TradeManager) -> Self {
        Self {
            version: BACKUP_VERSION,
            export_date: Utc::now(),
            settings: manager.settings().clone(),
            journal: manager.trades().to_vec(),
            account: Some(BackupAccount {
                realized_pnl: manager.account().realized_pnl,
            }),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize backup")
    }

    /// Parse and check a backup document.
    ///
    /// Rejects documents without `settings` or `journal` and versions newer
    /// than this build understands. Legacy trade records are upgraded while
    /// parsing.
    pub fn parse(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).context("Backup is not valid JSON")?;

        if value.get("settings").map_or(true, |v| v.is_null())
            || value.get("journal").map_or(true, |v| v.is_null())
        {
            bail!("Invalid backup file format: settings and journal are required");
        }

        // Older exports may omit these
        let mut value = value;
        if let Some(obj) = value.as_object_mut() {
            obj.entry("version").or_insert(serde_json::json!(BACKUP_VERSION));
            obj.entry("exportDate")
                .or_insert(serde_json::json!(Utc::now().to_rfc3339()));
        }

        let backup: Backup =
            serde_json::from_value(value).context("Invalid backup file format")?;

        if backup.version > BACKUP_VERSION {
            bail!(
                "Backup version {} is newer than supported version {}",
                backup.version,
                BACKUP_VERSION
            );
        }
        if let Err(e) = backup.settings.validate() {
            bail!("Invalid settings in backup: {}", e);
        }

        let inconsistent = backup.journal.iter().filter(|t| !t.is_consistent()).count();
        if inconsistent > 0 {
            warn!(count = inconsistent, "Backup contains trades whose totals disagree with their trim history");
        }

        Ok(backup)
    }

    /// Replace the manager's settings, journal and realized P&L.
    ///
    /// Without an `account` section realized P&L is rebuilt from the journal.
    pub fn apply(self, manager: &mut TradeManager) -> usize {
        let count = self.journal.len();
        let realized = self.account.map(|a| a.realized_pnl);
        manager.replace_all(self.settings, self.journal, realized);
        count
    }
}

/// File name for a backup taken today.
pub fn default_file_name() -> String {
    format!("trade-manager-backup-{}.json", Utc::now().format("%Y-%m-%d"))
}

/// Write a backup of `manager` to `path`. Returns the number of trades.
pub fn export_to_file(manager: &TradeManager, path: &Path) -> Result<usize> {
    let backup = Backup::from_manager(manager);
    let json = backup.to_json()?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write backup to {}", path.display()))?;

    info!(path = %path.display(), trades = backup.journal.len(), "Data exported");
    Ok(backup.journal.len())
}

/// Read and validate a backup from `path`.
pub fn read_from_file(path: &Path) -> Result<Backup> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read backup from {}", path.display()))?;
    Backup::parse(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TradeMeta, TradeStatus, TrimRequest};
    use rust_decimal_macros::dec;

    fn manager_with_history() -> TradeManager {
        let mut mgr = TradeManager::new(Settings {
            starting_account_size: dec!(50000),
            ..Default::default()
        });
        let input = mgr.sizing_input(Some(dec!(100)), Some(dec!(95)), Some(dec!(120)));
        let result = mgr.compute_sizing(&input).unwrap();
        let trade = mgr
            .create_trade(&result, TradeMeta { ticker: "SPY".into(), notes: "test".into() })
            .unwrap();
        mgr.apply_trim(trade.id, &TrimRequest::new(dec!(50), dec!(110), Utc::now()))
            .unwrap();
        mgr
    }

    #[test]
    fn test_export_import_roundtrip() {
        let source = manager_with_history();
        let json = Backup::from_manager(&source).to_json().unwrap();
        assert!(json.contains("\"realizedPnL\""));
        assert!(json.contains("\"exportDate\""));

        let mut target = TradeManager::default();
        let count = Backup::parse(&json).unwrap().apply(&mut target);

        assert_eq!(count, 1);
        assert_eq!(target.trades(), source.trades());
        assert_eq!(target.settings(), source.settings());
        assert_eq!(target.account().realized_pnl, dec!(500));
        assert_eq!(target.account().current_size, dec!(50500));
    }

    #[test]
    fn test_rejects_missing_sections() {
        assert!(Backup::parse(r#"{"version":1,"journal":[]}"#).is_err());
        assert!(Backup::parse(r#"{"version":1,"settings":{}}"#).is_err());
        assert!(Backup::parse("not json").is_err());
    }

    #[test]
    fn test_rejects_newer_version() {
        let json = r#"{"version":2,"exportDate":"2024-01-01T00:00:00Z","settings":{},"journal":[]}"#;
        assert!(Backup::parse(json).is_err());
    }

    #[test]
    fn test_imports_browser_backup() {
        let json = r#"{
            "version": 1,
            "exportDate": "2024-02-10T18:22:03.120Z",
            "settings": {
                "startingAccountSize": 25000,
                "defaultRiskPercent": 0.5,
                "defaultMaxPositionPercent": 50,
                "dynamicAccountEnabled": true,
                "theme": "dark",
                "sarMember": true
            },
            "journal": [{
                "id": 1707580000000,
                "timestamp": "2024-02-10T15:46:40.000Z",
                "ticker": "AMD",
                "entry": 170.5,
                "stop": 165.25,
                "target": null,
                "shares": 23,
                "positionSize": 3921.5,
                "riskDollars": 120.75,
                "riskPercent": 0.5,
                "notes": "",
                "status": "open",
                "exitPrice": null,
                "exitDate": null,
                "pnl": null
            }],
            "account": { "realizedPnL": 312.4 }
        }"#;

        let mut mgr = TradeManager::default();
        Backup::parse(json).unwrap().apply(&mut mgr);

        assert_eq!(mgr.settings().starting_account_size, dec!(25000));
        assert_eq!(mgr.account().realized_pnl, dec!(312.4));
        assert_eq!(mgr.account().current_size, dec!(25312.4));

        let trade = &mgr.trades()[0];
        assert_eq!(trade.original_shares(), 23);
        assert_eq!(trade.status(), TradeStatus::Open);
    }

    #[test]
    fn test_file_roundtrip() {
        let mgr = manager_with_history();
        let path = std::env::temp_dir().join(format!("riskcalc-backup-{}.json", std::process::id()));

        assert_eq!(export_to_file(&mgr, &path).unwrap(), 1);
        let backup = read_from_file(&path).unwrap();
        assert_eq!(backup.journal.len(), 1);
        assert_eq!(backup.version, BACKUP_VERSION);

        let _ = std::fs::remove_file(&path);
    }
}
