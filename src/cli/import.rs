use std::path::Path;

use colored::Colorize;

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::importer::import_statement;
use crate::settings::db_path;

pub fn run(
    file: &str,
    account: &str,
    opening: f64,
    closing: f64,
    period_start: Option<String>,
    period_end: Option<String>,
) -> Result<()> {
    let mut conn = get_connection(&db_path())?;
    let period = match (period_start, period_end) {
        (Some(start), Some(end)) => Some((start, end)),
        _ => None,
    };

    let outcome = import_statement(&mut conn, Path::new(file), account, opening, closing, period)?;

    println!(
        "Imported {} transactions into statement {} for {account}",
        outcome.imported, outcome.statement_id
    );
    println!(
        "  Credits: {}   Debits: {}",
        money(outcome.total_credits),
        money(outcome.total_debits)
    );
    if outcome.flagged > 0 {
        println!(
            "{}",
            format!("  {} row(s) flagged for review", outcome.flagged).yellow()
        );
    }
    println!(
        "Next: `reckon reconcile --statement {}` to verify the closing balance.",
        outcome.statement_id
    );
    Ok(())
}
