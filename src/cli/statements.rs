use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::settings::db_path;

pub fn list(account: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path())?;

    let mut sql = String::from(
        "SELECT s.id, a.name, s.period_start, s.period_end, s.opening_balance, \
                s.closing_balance, s.transaction_count, \
                (SELECT r.is_balanced FROM reconciliations r \
                 WHERE r.statement_id = s.id ORDER BY r.id DESC LIMIT 1) \
         FROM statements s JOIN accounts a ON s.account_id = a.id",
    );
    let mut params: Vec<String> = Vec::new();
    if let Some(name) = account {
        sql.push_str(" WHERE a.name = ?1");
        params.push(name.to_string());
    }
    sql.push_str(" ORDER BY s.period_start, s.id");

    let mut stmt = conn.prepare(&sql)?;
    let rows: Vec<(i64, String, String, String, f64, f64, i64, Option<i64>)> = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Account", "Period", "Opening", "Closing", "Txns", "Reconciled",
    ]);
    for (id, account, start, end, opening, closing, count, verdict) in rows {
        let verdict = match verdict {
            None => "—".to_string(),
            Some(1) => "balanced".to_string(),
            Some(_) => "DISCREPANCY".to_string(),
        };
        table.add_row(vec![
            Cell::new(id),
            Cell::new(account),
            Cell::new(format!("{start} – {end}")),
            Cell::new(money(opening)),
            Cell::new(money(closing)),
            Cell::new(count),
            Cell::new(verdict),
        ]);
    }
    println!("Statements\n{table}");
    Ok(())
}
