//! SQLite persistence for the journal.
//!
//! Stores everything needed to resume a session:
//! - Settings (single row)
//! - Account state: current size, realized P&L, selected risk and cap
//! - Trades, one JSON record per trade in the export shape
//!
//! Amounts are stored as decimal text so nothing is lost to floats.

use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqlitePoolOptions, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::models::{AccountLedger, Trade};
use crate::trading::{JournalEvent, Settings, TradeManager};

/// Database connection pool.
pub struct Database {
    pool: SqlitePool,
}

/// Settings row.
#[derive(Debug, Clone, sqlx::FromRow)]
struct StoredSettings {
    starting_account_size: String,
    default_risk_percent: String,
    default_max_position_percent: String,
    dynamic_account_enabled: bool,
}

/// Account state row.
#[derive(Debug, Clone, sqlx::FromRow)]
struct StoredAccount {
    current_size: String,
    realized_pnl: String,
    risk_percent: String,
    max_position_percent: String,
}

/// Trade row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredTrade {
    pub id: i64,
    pub ticker: String,
    pub status: String,
    pub created_at: String,
    pub record: String,
    pub updated_at: String,
}

impl StoredTrade {
    pub fn to_trade(&self) -> Result<Trade> {
        serde_json::from_str(&self.record)
            .with_context(|| format!("Corrupt trade record {}", self.id))
    }
}

impl Database {
    /// Create a new database connection.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Each in-memory connection is its own database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run all database migrations.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                starting_account_size TEXT NOT NULL,
                default_risk_percent TEXT NOT NULL,
                default_max_position_percent TEXT NOT NULL,
                dynamic_account_enabled INTEGER NOT NULL DEFAULT 1,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS account_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                current_size TEXT NOT NULL,
                realized_pnl TEXT NOT NULL DEFAULT '0',
                risk_percent TEXT NOT NULL,
                max_position_percent TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY,
                ticker TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                record TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_status ON trades(status)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_created ON trades(created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ==================== Settings ====================

    pub async fn load_settings(&self) -> Result<Option<Settings>> {
        let row = sqlx::query_as::<_, StoredSettings>(
            r#"
            SELECT starting_account_size, default_risk_percent,
                   default_max_position_percent, dynamic_account_enabled
            FROM settings WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch settings")?;

        row.map(|r| {
            Ok(Settings {
                starting_account_size: parse_decimal("starting_account_size", &r.starting_account_size)?,
                default_risk_percent: parse_decimal("default_risk_percent", &r.default_risk_percent)?,
                default_max_position_percent: parse_decimal(
                    "default_max_position_percent",
                    &r.default_max_position_percent,
                )?,
                dynamic_account_enabled: r.dynamic_account_enabled,
            })
        })
        .transpose()
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        write_settings(&mut conn, settings).await
    }

    // ==================== Account ====================

    pub async fn load_account(&self) -> Result<Option<AccountLedger>> {
        let row = sqlx::query_as::<_, StoredAccount>(
            r#"
            SELECT current_size, realized_pnl, risk_percent, max_position_percent
            FROM account_state WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account state")?;

        row.map(|r| {
            Ok(AccountLedger {
                current_size: parse_decimal("current_size", &r.current_size)?,
                realized_pnl: parse_decimal("realized_pnl", &r.realized_pnl)?,
                risk_percent: parse_decimal("risk_percent", &r.risk_percent)?,
                max_position_percent: parse_decimal("max_position_percent", &r.max_position_percent)?,
            })
        })
        .transpose()
    }

    pub async fn save_account(&self, account: &AccountLedger) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        write_account(&mut conn, account).await
    }

    // ==================== Trades ====================

    /// Insert or replace a trade.
    pub async fn save_trade(&self, trade: &Trade) -> Result<()> {
        let record = serde_json::to_string(trade).context("Failed to serialize trade")?;

        sqlx::query(
            r#"
            INSERT INTO trades (id, ticker, status, created_at, record, updated_at)
            VALUES (?, ?, ?, ?, ?, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                ticker = excluded.ticker,
                status = excluded.status,
                record = excluded.record,
                updated_at = datetime('now')
            "#,
        )
        .bind(trade.id)
        .bind(&trade.ticker)
        .bind(trade.status().as_str())
        .bind(trade.timestamp.to_rfc3339())
        .bind(record)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete_trade(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM trades WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_trade_rows(&self) -> Result<Vec<StoredTrade>> {
        sqlx::query_as::<_, StoredTrade>("SELECT * FROM trades ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch trades")
    }

    /// All trades, newest first.
    pub async fn load_trades(&self) -> Result<Vec<Trade>> {
        self.get_trade_rows()
            .await?
            .iter()
            .map(StoredTrade::to_trade)
            .collect()
    }

    /// Rewrite records stored before partial exits existed.
    ///
    /// Parsing already backfills the missing fields; saving the parsed trade
    /// makes the upgrade permanent so it happens once.
    pub async fn migrate_legacy_trades(&self) -> Result<usize> {
        let rows = sqlx::query_as::<_, StoredTrade>(
            "SELECT * FROM trades WHERE json_extract(record, '$.originalShares') IS NULL",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to scan for legacy trades")?;

        for row in &rows {
            let trade = row.to_trade()?;
            self.save_trade(&trade).await?;
            debug!(trade_id = trade.id, ticker = %trade.ticker, "Migrated legacy trade");
        }

        if !rows.is_empty() {
            info!(count = rows.len(), "Migrated legacy trade records");
        }
        Ok(rows.len())
    }

    // ==================== Journal ====================

    /// Build the trade manager from stored state.
    pub async fn load_manager(&self) -> Result<TradeManager> {
        self.migrate_legacy_trades().await?;

        let settings = self.load_settings().await?.unwrap_or_default();
        let account = self.load_account().await?;
        let trades = self.load_trades().await?;

        Ok(TradeManager::restore(settings, trades, account))
    }

    /// Replace everything stored with the manager's state, atomically.
    pub async fn save_all(&self, manager: &TradeManager) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM trades").execute(&mut *tx).await?;
        for trade in manager.trades() {
            let record = serde_json::to_string(trade).context("Failed to serialize trade")?;
            sqlx::query(
                "INSERT INTO trades (id, ticker, status, created_at, record) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(trade.id)
            .bind(&trade.ticker)
            .bind(trade.status().as_str())
            .bind(trade.timestamp.to_rfc3339())
            .bind(record)
            .execute(&mut *tx)
            .await?;
        }
        write_settings(&mut tx, manager.settings()).await?;
        write_account(&mut tx, manager.account()).await?;
        tx.commit().await?;

        info!(trades = manager.trades().len(), "Saved full journal");
        Ok(())
    }

    /// Persist the records touched by one journal event.
    pub async fn apply_event(&self, event: &JournalEvent) -> Result<()> {
        match event {
            JournalEvent::TradeCreated(trade)
            | JournalEvent::TradeUpdated(trade)
            | JournalEvent::TradeTrimmed { trade, .. }
            | JournalEvent::TradeClosed { trade, .. } => self.save_trade(trade).await,
            JournalEvent::TradeDeleted(trade) => self.delete_trade(trade.id).await.map(|_| ()),
            JournalEvent::SettingsChanged(settings) => self.save_settings(settings).await,
            JournalEvent::AccountChanged { .. } | JournalEvent::JournalReset => Ok(()),
        }
    }
}

async fn write_settings(conn: &mut SqliteConnection, settings: &Settings) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (
            id, starting_account_size, default_risk_percent,
            default_max_position_percent, dynamic_account_enabled, updated_at
        ) VALUES (1, ?, ?, ?, ?, datetime('now'))
        ON CONFLICT(id) DO UPDATE SET
            starting_account_size = excluded.starting_account_size,
            default_risk_percent = excluded.default_risk_percent,
            default_max_position_percent = excluded.default_max_position_percent,
            dynamic_account_enabled = excluded.dynamic_account_enabled,
            updated_at = datetime('now')
        "#,
    )
    .bind(settings.starting_account_size.to_string())
    .bind(settings.default_risk_percent.to_string())
    .bind(settings.default_max_position_percent.to_string())
    .bind(settings.dynamic_account_enabled)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn write_account(conn: &mut SqliteConnection, account: &AccountLedger) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO account_state (
            id, current_size, realized_pnl, risk_percent, max_position_percent, updated_at
        ) VALUES (1, ?, ?, ?, ?, datetime('now'))
        ON CONFLICT(id) DO UPDATE SET
            current_size = excluded.current_size,
            realized_pnl = excluded.realized_pnl,
            risk_percent = excluded.risk_percent,
            max_position_percent = excluded.max_position_percent,
            updated_at = datetime('now')
        "#,
    )
    .bind(account.current_size.to_string())
    .bind(account.realized_pnl.to_string())
    .bind(account.risk_percent.to_string())
    .bind(account.max_position_percent.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value).with_context(|| format!("Invalid {} in database: {}", field, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SizingResult, TradeMeta, TradeStatus, TrimRequest};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    async fn memory_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    async fn trade_count(db: &Database) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trades")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        count
    }

    fn sized(entry: Decimal, stop: Decimal, shares: u64) -> SizingResult {
        SizingResult {
            is_complete: true,
            entry_price: entry,
            stop_price: stop,
            shares,
            position_size: entry * Decimal::from(shares),
            risk_dollars: (entry - stop) * Decimal::from(shares),
            stop_per_share: entry - stop,
            original_risk_percent: dec!(1),
            ..SizingResult::empty()
        }
    }

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let db = memory_db().await;
        assert!(db.load_settings().await.unwrap().is_none());

        let settings = Settings {
            starting_account_size: dec!(25000.50),
            default_risk_percent: dec!(0.5),
            default_max_position_percent: dec!(20),
            dynamic_account_enabled: false,
        };
        db.save_settings(&settings).await.unwrap();
        assert_eq!(db.load_settings().await.unwrap(), Some(settings));
    }

    #[tokio::test]
    async fn test_account_roundtrip() {
        let db = memory_db().await;
        let account = AccountLedger {
            current_size: dec!(10512.25),
            realized_pnl: dec!(512.25),
            risk_percent: dec!(1),
            max_position_percent: dec!(100),
        };
        db.save_account(&account).await.unwrap();
        assert_eq!(db.load_account().await.unwrap(), Some(account));
    }

    #[tokio::test]
    async fn test_trade_save_update_delete() {
        let db = memory_db().await;
        let at = Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap();
        let meta = TradeMeta {
            ticker: "aapl".to_string(),
            notes: String::new(),
        };
        let mut trade = Trade::from_sizing(1, at, &sized(dec!(100), dec!(95), 100), &meta);

        db.save_trade(&trade).await.unwrap();
        trade
            .apply_trim(&TrimRequest::new(dec!(50), dec!(110), at))
            .unwrap();
        db.save_trade(&trade).await.unwrap();

        let loaded = db.load_trades().await.unwrap();
        assert_eq!(loaded, vec![trade.clone()]);
        assert_eq!(loaded[0].status(), TradeStatus::Trimmed);

        let rows = db.get_trade_rows().await.unwrap();
        assert_eq!(rows[0].status, "trimmed");
        assert_eq!(rows[0].ticker, "AAPL");

        assert!(db.delete_trade(1).await.unwrap());
        assert!(!db.delete_trade(1).await.unwrap());
        assert_eq!(trade_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_legacy_records_migrate_once() {
        let db = memory_db().await;
        let legacy = r#"{"id":7,"timestamp":"2024-01-02T15:00:00Z","ticker":"TSLA",
            "entry":200,"stop":190,"shares":10,"status":"open"}"#;
        sqlx::query("INSERT INTO trades (id, ticker, status, created_at, record) VALUES (7, 'TSLA', 'open', '2024-01-02T15:00:00Z', ?)")
            .bind(legacy)
            .execute(&db.pool)
            .await
            .unwrap();

        assert_eq!(db.migrate_legacy_trades().await.unwrap(), 1);
        assert_eq!(db.migrate_legacy_trades().await.unwrap(), 0);

        let trades = db.load_trades().await.unwrap();
        assert_eq!(trades[0].original_shares(), 10);
        assert_eq!(trades[0].remaining_shares(), 10);
        assert!(trades[0].trim_history().is_empty());
    }

    #[tokio::test]
    async fn test_events_persist_and_reload() {
        let db = memory_db().await;
        let mut mgr = TradeManager::new(Settings {
            starting_account_size: dec!(50000),
            ..Default::default()
        });
        let mut rx = mgr.subscribe();

        let input = mgr.sizing_input(Some(dec!(100)), Some(dec!(95)), None);
        let result = mgr.compute_sizing(&input).unwrap();
        let trade = mgr
            .create_trade(&result, TradeMeta { ticker: "nvda".into(), notes: String::new() })
            .unwrap();
        mgr.apply_trim(trade.id, &TrimRequest::new(dec!(50), dec!(110), Utc::now()))
            .unwrap();

        while let Some(Ok(event)) = rx.try_recv() {
            db.apply_event(&event).await.unwrap();
        }
        db.save_settings(mgr.settings()).await.unwrap();
        db.save_account(mgr.account()).await.unwrap();

        let reloaded = db.load_manager().await.unwrap();
        assert_eq!(reloaded.trades(), mgr.trades());
        assert_eq!(reloaded.account().realized_pnl, dec!(500));
        assert_eq!(reloaded.account().current_size, dec!(50500));
    }

    #[tokio::test]
    async fn test_save_all_replaces_journal() {
        let db = memory_db().await;
        let at = Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap();
        let stale = Trade::from_sizing(99, at, &sized(dec!(10), dec!(9), 5), &TradeMeta::default());
        db.save_trade(&stale).await.unwrap();

        let mut mgr = TradeManager::default();
        mgr.set_account_size(dec!(12000)).unwrap();
        db.save_all(&mgr).await.unwrap();

        assert_eq!(trade_count(&db).await, 0);
        assert_eq!(db.load_settings().await.unwrap(), Some(Settings::default()));
        assert_eq!(db.load_account().await.unwrap(), Some(mgr.account().clone()));
    }
}
