use rusqlite::Connection;

use crate::error::{ReckonError, Result};
use crate::fmt::round_cents;
use crate::models::{Direction, Polarity, Statement};

/// Cumulative float rounding across many rows can legitimately drift by a
/// cent or so; anything below this is reconciled, anything at or above it is
/// a real mismatch.
pub const BALANCE_TOLERANCE: f64 = 0.02;

pub struct TxnInput {
    pub id: i64,
    pub date: String,
    pub amount: f64,
    pub direction: Direction,
}

#[derive(Debug)]
pub struct RowBalance {
    pub transaction_id: i64,
    pub running_balance: f64,
    /// Non-finite source amount: contributed zero effect, needs a human look.
    pub suspect: bool,
}

#[derive(Debug)]
pub struct ReconcileReport {
    pub rows: Vec<RowBalance>,
    pub calculated_closing: f64,
    pub statement_closing: f64,
    pub discrepancy: f64,
    pub is_balanced: bool,
    pub suspect_count: usize,
}

/// Compute per-transaction running balances and the closing discrepancy for
/// one statement period. Pure: no side effects, deterministic for a given
/// input set regardless of input order (rows are sorted by date with id as
/// the tie-break before applying effects).
///
/// Credits raise an asset balance and lower a liability balance; debits do
/// the opposite. A non-finite amount contributes zero and marks the row
/// suspect instead of poisoning the whole statement.
pub fn reconcile(
    opening_balance: f64,
    transactions: &[TxnInput],
    polarity: Polarity,
    closing_balance: f64,
) -> ReconcileReport {
    let mut ordered: Vec<&TxnInput> = transactions.iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    let mut balance = opening_balance;
    let mut rows = Vec::with_capacity(ordered.len());
    let mut suspect_count = 0usize;

    for txn in ordered {
        let suspect = !txn.amount.is_finite();
        let effect = if suspect { 0.0 } else { txn.amount.abs() };
        let signed = match (polarity, txn.direction) {
            (Polarity::Asset, Direction::Credit) => effect,
            (Polarity::Asset, Direction::Debit) => -effect,
            (Polarity::Liability, Direction::Debit) => effect,
            (Polarity::Liability, Direction::Credit) => -effect,
        };
        balance += signed;
        if suspect {
            suspect_count += 1;
        }
        rows.push(RowBalance {
            transaction_id: txn.id,
            running_balance: round_cents(balance),
            suspect,
        });
    }

    // Tolerance is checked against the raw difference; the reported
    // discrepancy is rounded to the minor unit.
    let raw_discrepancy = closing_balance - balance;
    ReconcileReport {
        rows,
        calculated_closing: round_cents(balance),
        statement_closing: closing_balance,
        discrepancy: round_cents(raw_discrepancy),
        is_balanced: raw_discrepancy.abs() < BALANCE_TOLERANCE,
        suspect_count,
    }
}

/// Load a statement and its transactions, run the engine against the
/// statement's recorded balances, and append a reconciliations audit row.
pub fn load_statement(conn: &Connection, statement_id: i64) -> Result<Statement> {
    conn.query_row(
        "SELECT id, account_id, period_start, period_end, opening_balance, closing_balance, \
                total_credits, total_debits, transaction_count \
         FROM statements WHERE id = ?1",
        [statement_id],
        |row| {
            Ok(Statement {
                id: row.get(0)?,
                account_id: row.get(1)?,
                period_start: row.get(2)?,
                period_end: row.get(3)?,
                opening_balance: row.get(4)?,
                closing_balance: row.get(5)?,
                total_credits: row.get(6)?,
                total_debits: row.get(7)?,
                transaction_count: row.get(8)?,
            })
        },
    )
    .map_err(|_| ReckonError::UnknownStatement(statement_id))
}

pub fn reconcile_statement(conn: &Connection, statement_id: i64) -> Result<ReconcileReport> {
    let statement = load_statement(conn, statement_id)?;
    let (opening, closing) = (statement.opening_balance, statement.closing_balance);

    let account_type: String = conn.query_row(
        "SELECT account_type FROM accounts WHERE id = ?1",
        [statement.account_id],
        |row| row.get(0),
    )?;
    let polarity = Polarity::from_account_type(&account_type);

    let mut stmt = conn.prepare(
        "SELECT id, date, amount, direction FROM transactions \
         WHERE statement_id = ?1 ORDER BY date, id",
    )?;
    let txns: Vec<TxnInput> = stmt
        .query_map([statement_id], |row| {
            Ok(TxnInput {
                id: row.get(0)?,
                date: row.get(1)?,
                amount: row.get::<_, Option<f64>>(2)?.unwrap_or(f64::NAN),
                direction: Direction::from_column(&row.get::<_, String>(3)?),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let report = reconcile(opening, &txns, polarity, closing);

    conn.execute(
        "INSERT INTO reconciliations \
         (statement_id, statement_balance, calculated_balance, discrepancy, is_balanced, suspect_count) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            statement_id,
            closing,
            report.calculated_closing,
            report.discrepancy,
            report.is_balanced as i32,
            report.suspect_count as i64,
        ],
    )?;

    Ok(report)
}
