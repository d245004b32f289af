//! Position-Sizing Calculator and Trade Journal
//!
//! Sizes long equity trades from account size, risk percent and a stop,
//! then tracks each logged trade through partial exits ("trims") to a
//! fully realized P&L, keeping account size and statistics in step.

mod backup;
mod db;
mod error;
mod metrics;
mod models;
mod trading;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::db::Database;
use crate::metrics::StatsCalculator;
use crate::models::{
    exit_price_for_r, suggested_trim_percent, SizingResult, Trade, TradeEdit, TradeMeta,
    TrimRequest,
};
use crate::trading::{EventReceiver, JournalEvent, Settings, SortKey, StatusFilter, TradeManager};

/// Position-sizing calculator and trade journal CLI.
#[derive(Parser)]
#[command(name = "riskcalc")]
#[command(about = "Size trades by risk and track partial exits", long_about = None)]
struct Cli {
    /// Database file path
    #[arg(short, long, env = "RISKCALC_DATABASE", default_value = "sqlite:./riskcalc.db?mode=rwc")]
    database: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a position size without logging it
    Calc {
        /// Entry price
        #[arg(short, long, value_parser = parse_price)]
        entry: Decimal,

        /// Stop loss price
        #[arg(short, long, value_parser = parse_price)]
        stop: Decimal,

        /// Profit target
        #[arg(short, long, value_parser = parse_price)]
        target: Option<Decimal>,

        /// Account size for this calculation (e.g. 50k, 1.5M, 25,000)
        #[arg(short, long, value_parser = parse_amount)]
        account: Option<Decimal>,

        /// Risk percent of account
        #[arg(short, long, value_parser = parse_price)]
        risk: Option<Decimal>,

        /// Maximum position size as percent of account
        #[arg(short, long, value_parser = parse_price)]
        max_position: Option<Decimal>,

        /// Show the risk scenario table
        #[arg(long)]
        scenarios: bool,
    },

    /// Size a trade and log it to the journal
    Log {
        /// Ticker symbol
        ticker: String,

        #[arg(short, long, value_parser = parse_price)]
        entry: Decimal,

        #[arg(short, long, value_parser = parse_price)]
        stop: Decimal,

        #[arg(short, long, value_parser = parse_price)]
        target: Option<Decimal>,

        /// Risk percent of account (kept for later trades)
        #[arg(short, long, value_parser = parse_price)]
        risk: Option<Decimal>,

        /// Max position percent (kept for later trades)
        #[arg(short, long, value_parser = parse_price)]
        max_position: Option<Decimal>,

        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// Exit part of an open trade
    Trim {
        /// Trade id
        id: i64,

        /// Exit price
        #[arg(short, long, value_parser = parse_price, conflicts_with = "at_r")]
        price: Option<Decimal>,

        /// Exit at this R-multiple of the planned risk instead of a price
        #[arg(long)]
        at_r: Option<Decimal>,

        /// Percent of remaining shares to close (defaults to 1/(1+R))
        #[arg(short = 'P', long)]
        percent: Option<Decimal>,

        /// Exit date (YYYY-MM-DD or RFC 3339, default now)
        #[arg(long, value_parser = parse_date)]
        date: Option<DateTime<Utc>>,

        /// Move the stop on the remaining shares
        #[arg(long, value_parser = parse_price)]
        new_stop: Option<Decimal>,

        /// Only show what the trim would do
        #[arg(long)]
        preview: bool,
    },

    /// Close all remaining shares of a trade
    Close {
        id: i64,

        #[arg(short, long, value_parser = parse_price)]
        price: Decimal,

        #[arg(long, value_parser = parse_date)]
        date: Option<DateTime<Utc>>,
    },

    /// Edit a trade's entry, stop, shares, ticker or notes
    Edit {
        id: i64,

        #[arg(short, long, value_parser = parse_price)]
        entry: Option<Decimal>,

        #[arg(short, long, value_parser = parse_price)]
        stop: Option<Decimal>,

        /// Shares still open
        #[arg(long)]
        shares: Option<u64>,

        #[arg(short, long)]
        ticker: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete a trade (realized P&L stays on the account)
    Delete { id: i64 },

    /// List journal trades
    List {
        /// all, open, trimmed, closed, winners, losers
        #[arg(short, long, default_value = "all")]
        filter: String,

        /// date, ticker, entry, pnl
        #[arg(short, long, default_value = "date")]
        sort: String,

        /// Oldest / smallest first
        #[arg(long)]
        asc: bool,
    },

    /// Show one trade with its trim history
    Show { id: i64 },

    /// Show journal statistics
    Stats {
        /// Also print the equity curve
        #[arg(long)]
        equity: bool,
    },

    /// Show or change settings
    Settings {
        /// Starting account size (e.g. 10k)
        #[arg(long, value_parser = parse_amount)]
        starting_size: Option<Decimal>,

        /// Default risk percent
        #[arg(long, value_parser = parse_price)]
        risk: Option<Decimal>,

        /// Default max position percent
        #[arg(long, value_parser = parse_price)]
        max_position: Option<Decimal>,

        /// Track account as starting size + realized P&L
        #[arg(long)]
        dynamic: Option<bool>,

        /// Override the current account size used for sizing
        #[arg(long, value_parser = parse_amount)]
        current_size: Option<Decimal>,
    },

    /// Clear the journal, realized P&L and settings
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Export a JSON backup
    Export {
        /// Output file (default trade-manager-backup-<date>.json)
        path: Option<PathBuf>,
    },

    /// Import a JSON backup, replacing the journal
    Import { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if std::env::var("RUST_LOG").is_ok() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_target(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    // Initialize database and load state
    let db = Database::new(&cli.database).await?;
    let mut manager = db.load_manager().await?;
    let mut events = manager.subscribe();

    match cli.command {
        Commands::Calc {
            entry,
            stop,
            target,
            account,
            risk,
            max_position,
            scenarios,
        } => {
            let mut input = manager.sizing_input(Some(entry), Some(stop), target);
            if let Some(account) = account {
                input.account_size = account;
            }
            if let Some(risk) = risk {
                input.risk_percent = risk;
            }
            if let Some(max) = max_position {
                input.max_position_percent = max;
            }

            let result = manager.compute_sizing(&input)?;
            print_sizing(&result, input.account_size);

            if result.is_tradeable() {
                println!("\n--- R Levels ---");
                for level in manager.r_ladder(&result) {
                    println!(
                        "  {:>3}R  ${:>10.2}  {:>+12.2}",
                        level.r, level.price, level.profit
                    );
                }
            }

            if scenarios {
                println!("\n--- Risk Scenarios ---");
                println!("  {:>6}  {:>8}  {:>12}  {:>10}", "RISK", "SHARES", "POSITION", "RISK $");
                for row in manager.scenarios(&input) {
                    println!(
                        "{} {:>5}%  {:>8}  ${:>11.2}  ${:>9.2}",
                        if row.is_active { ">" } else { " " },
                        row.risk_percent,
                        row.shares,
                        row.position_size,
                        row.actual_risk
                    );
                }
            }
        }

        Commands::Log {
            ticker,
            entry,
            stop,
            target,
            risk,
            max_position,
            notes,
        } => {
            if let Some(risk) = risk {
                manager.set_risk_percent(risk)?;
            }
            if let Some(max) = max_position {
                manager.set_max_position_percent(max)?;
            }

            let input = manager.sizing_input(Some(entry), Some(stop), target);
            let result = manager.compute_sizing(&input)?;
            let trade = manager.create_trade(&result, TradeMeta { ticker, notes })?;

            print_sizing(&result, input.account_size);
            println!("\nLogged {} as trade #{}", trade.ticker, trade.id);
        }

        Commands::Trim {
            id,
            price,
            at_r,
            percent,
            date,
            new_stop,
            preview,
        } => {
            let trade = manager
                .trade(id)
                .ok_or_else(|| anyhow!("Trade not found: {}", id))?;

            let exit_price = match (price, at_r) {
                (Some(price), _) => price,
                (None, Some(r)) => exit_price_for_r(trade.entry, trade.stop, r),
                (None, None) => return Err(anyhow!("Specify --price or --at-r")),
            };
            // Losing exits default to the whole position
            let percent = percent.unwrap_or_else(|| {
                suggested_trim_percent(trade.r_multiple_at(exit_price)).min(Decimal::ONE_HUNDRED)
            });

            if preview {
                let p = manager.preview_trim(id, percent, exit_price)?;
                println!("\n=== Trim Preview: {} ===", trade.ticker);
                println!("Exit Price:       ${:.2} ({:+.2}R)", exit_price, p.r_multiple);
                println!("Shares Closing:   {} ({}%)", p.shares_closing, percent);
                println!("Shares Remaining: {}", p.shares_remaining);
                println!("Profit/Share:     ${:+.2}", p.profit_per_share);
                println!("P&L:              ${:+.2}", p.pnl);
                if p.is_full_close {
                    println!("This closes the trade.");
                }
                return Ok(());
            }

            let mut request = TrimRequest::new(percent, exit_price, date.unwrap_or_else(Utc::now));
            if let Some(stop) = new_stop {
                request = request.with_new_stop(stop);
            }

            let event = manager.apply_trim(id, &request)?;
            println!(
                "Trimmed {} shares at ${:.2} ({:+.2}R): P&L ${:+.2}",
                event.shares, event.exit_price, event.r_multiple, event.pnl
            );
            if let Some(trade) = manager.trade(id) {
                println!("Status: {} ({} shares left)", trade.display_status(), trade.remaining_shares());
            }
        }

        Commands::Close { id, price, date } => {
            let event = manager.close_trade(id, price, date.unwrap_or_else(Utc::now))?;
            let total = manager
                .trade(id)
                .map(|t| t.total_realized_pnl())
                .unwrap_or(event.pnl);
            println!(
                "Closed {} shares at ${:.2} ({:+.2}R). Total P&L ${:+.2}",
                event.shares, event.exit_price, event.r_multiple, total
            );
        }

        Commands::Edit {
            id,
            entry,
            stop,
            shares,
            ticker,
            notes,
        } => {
            let current = manager
                .trade(id)
                .ok_or_else(|| anyhow!("Trade not found: {}", id))?
                .clone();

            if entry.is_some() || stop.is_some() || shares.is_some() {
                let edit = TradeEdit {
                    entry: entry.unwrap_or(current.entry),
                    stop: stop.unwrap_or(current.stop),
                    shares: shares.unwrap_or(current.remaining_shares()),
                };
                manager.edit_trade(id, &edit)?;
            }
            if ticker.is_some() || notes.is_some() {
                manager.annotate_trade(id, ticker, notes)?;
            }

            if let Some(trade) = manager.trade(id) {
                print_trade(trade);
            }
        }

        Commands::Delete { id } => match manager.delete_trade(id) {
            Some(trade) => println!("Deleted {} (#{})", trade.ticker, trade.id),
            None => println!("Trade not found: {}", id),
        },

        Commands::List { filter, sort, asc } => {
            let trades = manager.sorted(StatusFilter::from_str(&filter), SortKey::from_str(&sort), asc);

            if trades.is_empty() {
                println!("No trades. Use 'riskcalc log <ticker> --entry <price> --stop <price>' to add one.");
                return Ok(());
            }

            println!(
                "\n{:<14} {:<10} {:<8} {:>10} {:>10} {:>9} {:>12} {:<12}",
                "ID", "DATE", "TICKER", "ENTRY", "STOP", "SHARES", "P&L", "STATUS"
            );
            println!("{}", "-".repeat(92));

            for t in &trades {
                println!(
                    "{:<14} {:<10} {:<8} {:>10.2} {:>10.2} {:>4}/{:<4} {:>12.2} {:<12}",
                    t.id,
                    t.timestamp.format("%Y-%m-%d"),
                    truncate(&t.ticker, 8),
                    t.entry,
                    t.active_stop(),
                    t.remaining_shares(),
                    t.original_shares(),
                    t.total_realized_pnl(),
                    t.display_status()
                );
            }
            println!("\n{} of {} trades", trades.len(), manager.trades().len());
        }

        Commands::Show { id } => {
            let trade = manager
                .trade(id)
                .ok_or_else(|| anyhow!("Trade not found: {}", id))?;
            print_trade(trade);
        }

        Commands::Stats { equity } => {
            let stats = StatsCalculator::calculate(manager.trades(), manager.settings(), manager.account());
            println!("\n{}", stats);

            let active = manager.active_trades();
            if !active.is_empty() {
                let at_risk: Decimal = active.iter().map(|t| t.remaining_risk()).sum();
                let free_rolls = active.iter().filter(|t| t.is_free_roll()).count();
                println!(
                    "Active Positions: {} ({} free rolled), ${:.2} still at risk",
                    active.len(),
                    free_rolls,
                    at_risk
                );
            }

            if equity {
                let curve = StatsCalculator::equity_curve(
                    manager.trades(),
                    manager.settings().starting_account_size,
                );
                println!("\n=== Equity Curve ===");
                for point in curve {
                    println!(
                        "  {}  {:<8} {:>+12.2}  ${:>12.2}",
                        point.date.format("%Y-%m-%d"),
                        truncate(&point.ticker, 8),
                        point.pnl,
                        point.balance
                    );
                }
            }
        }

        Commands::Settings {
            starting_size,
            risk,
            max_position,
            dynamic,
            current_size,
        } => {
            let changed = starting_size.is_some()
                || risk.is_some()
                || max_position.is_some()
                || dynamic.is_some();

            if changed {
                let current = manager.settings();
                let settings = Settings {
                    starting_account_size: starting_size.unwrap_or(current.starting_account_size),
                    default_risk_percent: risk.unwrap_or(current.default_risk_percent),
                    default_max_position_percent: max_position
                        .unwrap_or(current.default_max_position_percent),
                    dynamic_account_enabled: dynamic.unwrap_or(current.dynamic_account_enabled),
                };
                manager.update_settings(settings)?;
            }
            if let Some(size) = current_size {
                manager.set_account_size(size)?;
            }

            let s = manager.settings();
            let a = manager.account();
            println!("\n=== Settings ===");
            println!("Starting Account:     ${:.2}", s.starting_account_size);
            println!("Default Risk:         {}%", s.default_risk_percent);
            println!("Default Max Position: {}%", s.default_max_position_percent);
            println!("Dynamic Account:      {}", if s.dynamic_account_enabled { "On" } else { "Off" });
            println!("\n=== Account ===");
            println!("Current Size:         ${:.2}", a.current_size);
            println!("Realized P&L:         ${:+.2}", a.realized_pnl);
            println!("Risk:                 {}%", a.risk_percent);
            println!("Max Position:         {}%", a.max_position_percent);
        }

        Commands::Reset { yes } => {
            if !yes {
                println!("This deletes every trade and resets the account. Re-run with --yes to confirm.");
                return Ok(());
            }
            manager.reset();
            println!("Journal and account reset.");
        }

        Commands::Export { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(backup::default_file_name()));
            let count = backup::export_to_file(&manager, &path)?;
            println!("Exported {} trades to {}", count, path.display());
        }

        Commands::Import { path } => {
            let count = backup::read_from_file(&path)?.apply(&mut manager);
            // Trades are replaced wholesale, not event by event
            db.save_all(&manager).await?;
            drain(&mut events);
            println!("Imported {} trades", count);
        }
    }

    persist(&db, &manager, &mut events).await;
    Ok(())
}

/// Write everything the command changed. Failures are reported but the
/// command's result stands.
async fn persist(db: &Database, manager: &TradeManager, events: &mut EventReceiver) {
    let mut pending = Vec::new();
    let mut lagged = false;
    while let Some(event) = events.try_recv() {
        match event {
            Ok(event) => pending.push(event),
            Err(e) => {
                warn!(error = %e, "Missed journal events, saving full journal");
                lagged = true;
            }
        }
    }
    if pending.is_empty() && !lagged {
        return;
    }

    let result = if lagged || pending.iter().any(|e| matches!(e, JournalEvent::JournalReset)) {
        db.save_all(manager).await
    } else {
        apply_events(db, manager, &pending).await
    };

    match result {
        Ok(()) => info!(events = pending.len(), "Saved changes"),
        Err(e) => {
            warn!(error = %e, "Failed to save changes");
            eprintln!("Warning: changes could not be saved ({}). They will be lost on exit.", e);
        }
    }
}

async fn apply_events(db: &Database, manager: &TradeManager, events: &[JournalEvent]) -> Result<()> {
    for event in events {
        db.apply_event(event).await?;
    }
    db.save_account(manager.account()).await
}

fn drain(events: &mut EventReceiver) {
    while events.try_recv().is_some() {}
}

fn print_sizing(r: &SizingResult, account_size: Decimal) {
    if !r.is_complete {
        println!("Enter entry and stop prices to size a trade.");
        return;
    }

    println!("\n=== Position Size ===");
    println!("Account:          ${:.2}", account_size);
    if r.is_limited {
        println!("Shares:           {} (was {})", r.shares, r.original_shares);
        println!(
            "Position:         ${:.2} (was ${:.2})",
            r.position_size, r.original_position_size
        );
        println!(
            "Of Account:       {:.2}% (was {:.2}%)",
            r.percent_of_account, r.original_percent_of_account
        );
        println!(
            "Risk:             ${:.2} = {:.2}% (was ${:.2} = {}%)",
            r.risk_dollars, r.risk_percent, r.original_risk_dollars, r.original_risk_percent
        );
    } else {
        println!("Shares:           {}", r.shares);
        println!("Position:         ${:.2}", r.position_size);
        println!("Of Account:       {:.2}%", r.percent_of_account);
        println!("Risk:             ${:.2} = {:.2}%", r.risk_dollars, r.risk_percent);
    }
    println!(
        "Stop Distance:    ${:.2}/share ({:.2}%)",
        r.stop_per_share, r.stop_distance_percent
    );

    if let (Some(rm), Some(profit), Some(roi)) = (r.r_multiple, r.profit, r.roi_percent) {
        println!("\n--- Target ---");
        println!("R-Multiple:       {:.2}R", rm);
        println!("Profit:           ${:+.2}", profit);
        println!("ROI:              {:+.2}%", roi);
        if let Some(growth) = r.account_growth_percent {
            println!("Account Growth:   {:+.2}%", growth);
        }
    }
    if let Some(t5) = r.target_5r {
        println!("5R Target:        ${:.2}", t5);
    }

    for warning in &r.warnings {
        println!("! {}", warning);
    }
}

fn print_trade(t: &Trade) {
    println!("\n=== {} (#{}) ===", t.ticker, t.id);
    println!("Logged:           {}", t.timestamp.format("%Y-%m-%d %H:%M"));
    println!("Status:           {}", t.display_status());
    println!("Entry:            ${:.2}", t.entry);
    println!("Stop:             ${:.2}", t.stop);
    if let Some(current) = t.current_stop {
        println!("Current Stop:     ${:.2}", current);
    }
    if let Some(target) = t.target {
        println!("Target:           ${:.2}", target);
    }
    println!("Shares:           {} of {}", t.remaining_shares(), t.original_shares());
    println!("Position:         ${:.2}", t.position_size);
    println!("Risk:             ${:.2} ({}%)", t.risk_dollars, t.risk_percent);
    println!("Realized P&L:     ${:+.2}", t.total_realized_pnl());
    if let Some(r) = t.realized_r() {
        println!("Realized R:       {:+.2}R", r);
    }
    if let Some(pct) = t.realized_pnl_percent() {
        println!("Realized %:       {:+.2}%", pct);
    }
    if !t.is_closed() {
        println!("Remaining Risk:   ${:.2}", t.remaining_risk());
    }
    if let (Some(price), Some(date), Some(pnl)) = (t.exit_price(), t.exit_date(), t.pnl()) {
        println!(
            "Closed:           ${:.2} on {} (${:+.2})",
            price,
            date.format("%Y-%m-%d"),
            pnl
        );
    }
    if !t.notes.is_empty() {
        println!("Notes:            {}", t.notes);
    }

    if !t.trim_history().is_empty() {
        println!("\n--- Exits ---");
        for e in t.trim_history() {
            println!(
                "  {}  {:>5} sh ({:>3}%) @ ${:>9.2}  {:>+6.2}R  ${:>+10.2}",
                e.date.format("%Y-%m-%d"),
                e.shares,
                e.percent_trimmed,
                e.exit_price,
                e.r_multiple,
                e.pnl
            );
        }
    }
}

/// Parse an amount, accepting `k`/`m` suffixes and thousands separators.
fn parse_amount(s: &str) -> std::result::Result<Decimal, String> {
    let cleaned = s.trim().replace([',', '$'], "");
    let (digits, multiplier) = match cleaned.chars().last().map(|c| c.to_ascii_lowercase()) {
        Some('k') => (&cleaned[..cleaned.len() - 1], Decimal::from(1_000)),
        Some('m') => (&cleaned[..cleaned.len() - 1], Decimal::from(1_000_000)),
        _ => (cleaned.as_str(), Decimal::ONE),
    };

    Decimal::from_str(digits.trim())
        .map(|n| n * multiplier)
        .map_err(|_| format!("invalid amount: {}", s))
}

/// Parse a price or percent, allowing `$` and thousands separators.
fn parse_price(s: &str) -> std::result::Result<Decimal, String> {
    let cleaned = s.trim().replace([',', '$', '%'], "");
    Decimal::from_str(&cleaned).map_err(|_| format!("invalid number: {}", s))
}

/// Parse `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
fn parse_date(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date: {}", s))
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_amount_suffixes() {
        assert_eq!(parse_amount("50k"), Ok(dec!(50000)));
        assert_eq!(parse_amount("1.5M"), Ok(dec!(1500000)));
        assert_eq!(parse_amount("25,000"), Ok(dec!(25000)));
        assert_eq!(parse_amount("$10,500.25"), Ok(dec!(10500.25)));
        assert_eq!(parse_amount(" 2 K "), Ok(dec!(2000)));
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("k").is_err());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("$1,234.50"), Ok(dec!(1234.50)));
        assert_eq!(parse_price("0.5%"), Ok(dec!(0.5)));
        assert!(parse_price("").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-05"),
            Ok(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date("2024-03-05T14:30:00Z"),
            Ok(Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap())
        );
        assert!(parse_date("March 5").is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("AAPL", 8), "AAPL");
        assert_eq!(truncate("VERYLONGTICKER", 8), "VERYL...");
    }
}
