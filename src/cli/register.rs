use comfy_table::{Cell, Table};

use crate::cli::accounts::account_id_by_name;
use crate::db::get_connection;
use crate::error::{ReckonError, Result};
use crate::fmt::money;
use crate::query::{QueryCache, TransactionQuery};
use crate::settings::db_path;

pub fn run(
    account: Option<&str>,
    from_date: Option<String>,
    to_date: Option<String>,
    needs_review: bool,
    unlinked: bool,
    limit: Option<i64>,
) -> Result<()> {
    let conn = get_connection(&db_path())?;

    let account_id = match account {
        Some(name) => Some(
            account_id_by_name(&conn, name)
                .ok_or_else(|| ReckonError::UnknownAccount(name.to_string()))?,
        ),
        None => None,
    };

    let query = TransactionQuery {
        account_id,
        from_date,
        to_date,
        needs_review: if needs_review { Some(true) } else { None },
        unlinked_only: unlinked,
        limit,
        ..Default::default()
    };

    let mut cache = QueryCache::new();
    let rows = cache.fetch(&conn, &query)?;

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Date", "Account", "Description", "Amount", "Category", "Link", "Review",
    ]);
    for row in rows {
        let category = row
            .category
            .clone()
            .or_else(|| row.suggested_category.as_ref().map(|s| format!("{s}?")))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(row.id),
            Cell::new(&row.date),
            Cell::new(&row.account_name),
            Cell::new(&row.description),
            Cell::new(money(row.amount)),
            Cell::new(category),
            Cell::new(row.link_type.map(|l| l.as_str()).unwrap_or("")),
            Cell::new(if row.needs_review { "yes" } else { "" }),
        ]);
    }
    println!("Register ({} transactions)\n{table}", rows.len());
    Ok(())
}
