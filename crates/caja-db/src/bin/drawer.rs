//! # Drawer Session Runner
//!
//! Opens a cash session on a register, rings up a batch of cash sales
//! against it and closes out with a count.
//!
//! ## Usage
//! ```bash
//! # 20 sales on the default register (default)
//! cargo run -p caja-db --bin drawer
//!
//! # Custom register and sale count
//! cargo run -p caja-db --bin drawer -- --register caja-2 --sales 50
//!
//! # Specify database path
//! cargo run -p caja-db --bin drawer -- --db ./data/caja.db
//! ```
//!
//! ## Environment
//! `CAJA_*` variables configure the register (see `RegisterConfig::from_env`)
//! and the database (see `DbConfig::from_env`). `RUST_LOG` overrides the log
//! filter. Command line flags win over both.

use std::env;

use caja_core::{
    format_change_breakdown, CashBreakdown, CoreError, Denomination, Money, RegisterConfig,
};
use caja_db::{Database, DbConfig, DbError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Bills a customer might pay with, smallest first.
const TENDER_BILLS: &[Denomination] = &[
    Denomination::Twenties,
    Denomination::Fifties,
    Denomination::Hundreds,
    Denomination::TwoHundreds,
    Denomination::FiveHundreds,
    Denomination::Thousands,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config = RegisterConfig::from_env();
    let mut sales: usize = 20;
    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sales" | "-n" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--register" | "-r" => {
                if i + 1 < args.len() {
                    config.register_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Caja drawer session runner");
                println!();
                println!("Usage: drawer [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --sales <N>        Cash sales to ring up (default: 20)");
                println!("  -r, --register <ID>    Register to operate (default: caja-1)");
                println!("  -d, --db <PATH>        Database file path (default: ./caja_dev.db)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db_config = match db_path {
        Some(path) => DbConfig::new(path),
        None => DbConfig::from_env("./caja_dev.db"),
    };
    let db = Database::new(db_config).await?;
    let repo = db.sessions().with_tenant(config.tenant_id.clone());

    info!(register_id = %config.register_id, policy = ?config.shortfall_policy, "Register ready");

    let session = match repo.get_open_for_register(&config.register_id).await? {
        Some(session) => {
            info!(session_id = %session.id, "Resuming open session");
            session
        }
        None => repo.open_session(&config.register_id, &opening_float()).await?,
    };

    println!("Register: {} ({})", config.register_id, config.currency_code);
    println!("Session:  {}", session.id);
    println!("Float:    {}", session.current_breakdown.total_cash());
    println!();

    let mut completed = 0;
    let mut blocked = 0;

    for n in 0..sales {
        let due = sale_amount(n);
        let tendered = tender_for(due);

        match repo
            .record_cash_sale(&session.id, due, &tendered, config.shortfall_policy)
            .await
        {
            Ok(outcome) => {
                completed += 1;
                println!(
                    "  #{:<3} due {:>9}  paid {:>9}  change {}",
                    n + 1,
                    due,
                    tendered.total_cash(),
                    outcome.summary
                );
            }
            Err(DbError::Core(CoreError::InsufficientChange { missing })) => {
                blocked += 1;
                println!("  #{:<3} due {:>9}  BLOCKED (short {})", n + 1, due, missing);
            }
            Err(e) => return Err(e.into()),
        }
    }

    // Petty payout taken by hand, e.g. a delivery tip
    let payout = CashBreakdown::empty().with(Denomination::Peso10, 3);
    match repo
        .give_manual_change(&session.id, &payout, config.strict_debit)
        .await
    {
        Ok(_) => println!("  payout {}", format_change_breakdown(&payout)),
        Err(DbError::Core(e @ CoreError::Overdraw { .. })) => println!("  payout refused: {}", e),
        Err(e) => return Err(e.into()),
    }

    // Count what the drawer should hold; a real close uses the cashier's count
    let expected = match repo.get_by_id(&session.id).await? {
        Some(current) => current.current_breakdown,
        None => return Err(DbError::not_found("CashSession", session.id.clone()).into()),
    };

    let closed = repo.close_session(&session.id, &expected).await?;
    let recon = &closed.reconciliation;

    if !recon.is_balanced() {
        warn!(variance = %recon.variance, "Drawer did not balance");
    }

    println!();
    println!("Sales:    {} completed, {} blocked", completed, blocked);
    println!("Expected: {}", recon.expected_total);
    println!("Counted:  {}", recon.counted_total);
    println!("Variance: {}", recon.variance);
    println!("Drawer:   {}", format_change_breakdown(&expected));

    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - ERROR: Critical failures
/// - WARN: Blocked sales, shortfalls, variances
/// - INFO: Session open/close
/// - DEBUG: Each movement
///
/// Set `RUST_LOG=caja=trace` for verbose output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,caja=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Morning float: $2,000 spread across small bills and coins.
fn opening_float() -> CashBreakdown {
    CashBreakdown::from_counts([
        (Denomination::Hundreds, 5),
        (Denomination::Fifties, 10),
        (Denomination::Twenties, 20),
        (Denomination::Peso10, 20),
        (Denomination::Peso5, 20),
        (Denomination::Peso2, 25),
        (Denomination::Peso1, 50),
        (Denomination::Centavos50, 40),
        (Denomination::Centavos20, 50),
        (Denomination::Centavos10, 100),
    ])
}

/// Deterministic ticket totals between $12.50 and about $1,500.
fn sale_amount(n: usize) -> Money {
    let cents = 1_250 + ((n as i64 * 7_919) % 1_500) * 100 + (n as i64 * 37 % 20) * 10;
    Money::from_cents(cents)
}

/// Smallest single bill covering `due`, or enough $1000 bills.
fn tender_for(due: Money) -> CashBreakdown {
    match TENDER_BILLS.iter().find(|bill| bill.value() >= due) {
        Some(bill) => CashBreakdown::empty().with(*bill, 1),
        None => {
            let thousand = Denomination::Thousands.value().cents();
            let count = (due.cents() + thousand - 1) / thousand;
            CashBreakdown::empty().with(Denomination::Thousands, count as u32)
        }
    }
}
