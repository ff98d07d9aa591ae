use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::query::{self, TransactionQuery};
use crate::reconciler;
use crate::settings::db_path;

pub fn run(statement_id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let report = reconciler::reconcile_statement(&conn, statement_id)?;

    let rows = query::fetch(
        &conn,
        &TransactionQuery {
            statement_id: Some(statement_id),
            ..Default::default()
        },
    )?;

    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Direction", "Amount", "Running Balance", ""]);
    for (txn, balance) in rows.iter().zip(report.rows.iter()) {
        table.add_row(vec![
            Cell::new(&txn.date),
            Cell::new(&txn.description),
            Cell::new(txn.direction.as_str()),
            Cell::new(money(txn.amount)),
            Cell::new(money(balance.running_balance)),
            Cell::new(if balance.suspect { "suspect" } else { "" }),
        ]);
    }
    println!("Statement {statement_id}\n{table}");

    if report.suspect_count > 0 {
        println!(
            "{}",
            format!(
                "{} transaction(s) had no usable amount and contributed zero",
                report.suspect_count
            )
            .yellow()
        );
    }

    if report.is_balanced {
        println!(
            "{} Calculated closing {} matches the statement.",
            "Reconciled!".green().bold(),
            money(report.calculated_closing)
        );
    } else {
        println!("{}", "DISCREPANCY".red().bold());
        println!("  Statement:  {}", money(report.statement_closing));
        println!("  Calculated: {}", money(report.calculated_closing));
        println!("  Difference: {}", money(report.discrepancy).red());
    }
    Ok(())
}
