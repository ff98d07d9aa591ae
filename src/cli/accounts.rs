use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::Result;
use crate::models::{Account, Polarity};
use crate::settings::{db_path, load_settings};

pub fn add(
    name: &str,
    account_type: &str,
    institution: Option<&str>,
    company: Option<&str>,
    currency: Option<&str>,
    last_four: Option<&str>,
) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let currency = match currency {
        Some(c) => c.to_uppercase(),
        None => load_settings().default_currency,
    };
    conn.execute(
        "INSERT INTO accounts (name, account_type, institution, company, currency, last_four) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            name,
            account_type,
            institution,
            company.unwrap_or(""),
            currency,
            last_four
        ],
    )?;
    let polarity = Polarity::from_account_type(account_type);
    println!("Added account: {name} ({} polarity)", polarity.as_str());
    Ok(())
}

pub fn load_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, account_type, institution, company, currency, last_four \
         FROM accounts ORDER BY company, name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Account {
                id: row.get(0)?,
                name: row.get(1)?,
                account_type: row.get(2)?,
                institution: row.get(3)?,
                company: row.get(4)?,
                currency: row.get(5)?,
                last_four: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let accounts = load_accounts(&conn)?;

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Name", "Type", "Polarity", "Institution", "Company", "Currency", "Last Four",
    ]);
    for account in accounts {
        table.add_row(vec![
            Cell::new(account.id),
            Cell::new(&account.name),
            Cell::new(&account.account_type),
            Cell::new(account.polarity().as_str()),
            Cell::new(account.institution.as_deref().unwrap_or_default()),
            Cell::new(&account.company),
            Cell::new(&account.currency),
            Cell::new(account.last_four.as_deref().unwrap_or_default()),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}

pub fn account_id_by_name(conn: &Connection, name: &str) -> Option<i64> {
    conn.query_row("SELECT id FROM accounts WHERE name = ?1", [name], |row| row.get(0))
        .ok()
}
