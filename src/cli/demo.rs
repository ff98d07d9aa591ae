use colored::Colorize;
use rusqlite::{Connection, OptionalExtension};

use crate::db::{get_connection, init_db, set_metadata};
use crate::detector;
use crate::error::Result;
use crate::fmt::round_cents;
use crate::models::{Direction, Polarity};
use crate::reconciler::{reconcile, TxnInput};
use crate::settings::{db_path, get_data_dir};

struct DemoTxn {
    date: &'static str,
    description: &'static str,
    amount: f64,
    direction: Direction,
    suggested: Option<&'static str>,
}

const CHECKING_TXNS: &[DemoTxn] = &[
    DemoTxn { date: "2025-06-03", description: "STRIPE PAYOUT", amount: 8200.00, direction: Direction::Credit, suggested: Some("Client Revenue") },
    DemoTxn { date: "2025-06-05", description: "ONLINE TRANSFER TO SAVINGS", amount: -2500.00, direction: Direction::Debit, suggested: None },
    DemoTxn { date: "2025-06-05", description: "GITHUB INC", amount: -21.00, direction: Direction::Debit, suggested: Some("Software & Subscriptions") },
    DemoTxn { date: "2025-06-08", description: "AMAZON WEB SERVICES", amount: -189.00, direction: Direction::Debit, suggested: Some("Hosting & Infrastructure") },
    DemoTxn { date: "2025-06-10", description: "PAYMENT TO HARBOR CARD", amount: -850.00, direction: Direction::Debit, suggested: None },
    DemoTxn { date: "2025-06-12", description: "DOORDASH DELIVERY", amount: -32.18, direction: Direction::Debit, suggested: Some("Meals") },
    DemoTxn { date: "2025-06-15", description: "WIRE TRANSFER TO TORONTO", amount: -1000.00, direction: Direction::Debit, suggested: None },
    DemoTxn { date: "2025-06-17", description: "STRIPE PAYOUT", amount: 6400.00, direction: Direction::Credit, suggested: Some("Client Revenue") },
    DemoTxn { date: "2025-06-20", description: "WEWORK MEMBERSHIP", amount: -450.00, direction: Direction::Debit, suggested: Some("Rent / Lease") },
    DemoTxn { date: "2025-06-28", description: "COMCAST BUSINESS", amount: -129.99, direction: Direction::Debit, suggested: Some("Utilities") },
];

const SAVINGS_TXNS: &[DemoTxn] = &[
    DemoTxn { date: "2025-06-05", description: "ONLINE TRANSFER FROM CHECKING", amount: 2500.00, direction: Direction::Credit, suggested: None },
    DemoTxn { date: "2025-06-30", description: "INTEREST PAYMENT", amount: 1.12, direction: Direction::Credit, suggested: Some("Interest Income") },
];

const CARD_TXNS: &[DemoTxn] = &[
    DemoTxn { date: "2025-06-04", description: "STAPLES OFFICE SUPPLY", amount: -67.23, direction: Direction::Debit, suggested: Some("Office Expense") },
    DemoTxn { date: "2025-06-09", description: "ZOOM VIDEO COMMUNICATIONS", amount: -14.99, direction: Direction::Debit, suggested: Some("Software & Subscriptions") },
    DemoTxn { date: "2025-06-11", description: "PAYMENT RECEIVED - THANK YOU", amount: 850.00, direction: Direction::Credit, suggested: None },
    DemoTxn { date: "2025-06-22", description: "FEDEX SHIPPING", amount: -18.75, direction: Direction::Debit, suggested: Some("Office Expense") },
];

const TORONTO_TXNS: &[DemoTxn] = &[
    DemoTxn { date: "2025-06-16", description: "INCOMING WIRE TRANSFER", amount: 1370.00, direction: Direction::Credit, suggested: None },
];

fn seed_account(
    conn: &Connection,
    name: &str,
    account_type: &str,
    company: &str,
    currency: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO accounts (name, account_type, institution, company, currency) \
         VALUES (?1, ?2, 'Demo Bank', ?3, ?4)",
        rusqlite::params![name, account_type, company, currency],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert one statement plus its transactions. The closing balance is
/// derived from the rows themselves so the statement reconciles cleanly,
/// then shifted by `closing_offset` when a discrepancy is wanted.
fn seed_statement(
    conn: &Connection,
    account_id: i64,
    account_type: &str,
    opening: f64,
    closing_offset: f64,
    txns: &[DemoTxn],
) -> Result<i64> {
    let inputs: Vec<TxnInput> = txns
        .iter()
        .enumerate()
        .map(|(i, t)| TxnInput {
            id: i as i64,
            date: t.date.to_string(),
            amount: t.amount,
            direction: t.direction,
        })
        .collect();
    let polarity = Polarity::from_account_type(account_type);
    let report = reconcile(opening, &inputs, polarity, 0.0);
    let closing = round_cents(report.calculated_closing + closing_offset);

    let mut total_credits = 0.0;
    let mut total_debits = 0.0;
    for t in txns {
        match t.direction {
            Direction::Credit => total_credits += t.amount.abs(),
            Direction::Debit => total_debits += t.amount.abs(),
        }
    }

    conn.execute(
        "INSERT INTO statements \
         (account_id, period_start, period_end, opening_balance, closing_balance, \
          total_credits, total_debits, transaction_count) \
         VALUES (?1, '2025-06-01', '2025-06-30', ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            account_id,
            opening,
            closing,
            round_cents(total_credits),
            round_cents(total_debits),
            txns.len() as i64,
        ],
    )?;
    let statement_id = conn.last_insert_rowid();

    let currency: String = conn.query_row(
        "SELECT currency FROM accounts WHERE id = ?1",
        [account_id],
        |r| r.get(0),
    )?;
    for t in txns {
        let suggested_id: Option<i64> = match t.suggested {
            Some(name) => conn
                .query_row("SELECT id FROM categories WHERE name = ?1", [name], |r| r.get(0))
                .optional()?,
            None => None,
        };
        conn.execute(
            "INSERT INTO transactions \
             (account_id, statement_id, date, description, amount, direction, currency, \
              suggested_category_id, needs_review) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
            rusqlite::params![
                account_id,
                statement_id,
                t.date,
                t.description,
                t.amount,
                t.direction.as_str(),
                currency,
                suggested_id,
            ],
        )?;
    }
    Ok(statement_id)
}

pub fn run() -> Result<()> {
    std::fs::create_dir_all(get_data_dir())?;
    let mut conn = get_connection(&db_path())?;
    init_db(&conn)?;

    let existing: Option<i64> = conn
        .query_row("SELECT id FROM accounts WHERE name = 'Operating Checking'", [], |r| r.get(0))
        .optional()?;
    if existing.is_some() {
        println!("Demo data already loaded.");
        return Ok(());
    }

    set_metadata(&conn, "company_name", "Harbor & Finch Bookkeeping")?;
    conn.execute(
        "INSERT OR IGNORE INTO fx_rates (from_currency, to_currency, rate, source) \
         VALUES ('USD', 'CAD', 1.37, 'demo-fixed')",
        [],
    )?;

    let checking = seed_account(&conn, "Operating Checking", "checking", "Harbor Web Studio", "USD")?;
    let savings = seed_account(&conn, "Reserve Savings", "savings", "Harbor Web Studio", "USD")?;
    let card = seed_account(&conn, "Team Card", "credit_card", "Harbor Holdings", "USD")?;
    let toronto = seed_account(&conn, "Toronto Checking", "checking", "Harbor Web Studio", "CAD")?;

    let checking_stmt = seed_statement(&conn, checking, "checking", 12000.00, 0.0, CHECKING_TXNS)?;
    seed_statement(&conn, savings, "savings", 8000.00, 0.0, SAVINGS_TXNS)?;
    // The card statement is deliberately 4.50 off to demo a discrepancy.
    let card_stmt = seed_statement(&conn, card, "credit_card", 412.45, 4.50, CARD_TXNS)?;
    seed_statement(&conn, toronto, "checking", 0.0, 0.0, TORONTO_TXNS)?;

    let outcome = detector::detect_candidates(&mut conn)?;

    let txn_count: i64 = conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?;
    println!("{}", "Demo data loaded.".green());
    println!("  4 accounts, 4 statements, {txn_count} transactions");
    println!(
        "  {} transfer candidate(s) detected, {} auto-linked",
        outcome.created, outcome.auto_linked
    );
    println!();
    println!("Things to try:");
    println!("  reckon reconcile --statement {checking_stmt}   (balances cleanly)");
    println!("  reckon reconcile --statement {card_stmt}   (shows a $4.50 discrepancy)");
    println!("  reckon transfers list");
    println!("  reckon transfers review");
    println!("  reckon review");
    Ok(())
}
