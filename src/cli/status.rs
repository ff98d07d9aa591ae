use crate::db::{get_connection, get_metadata};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::{get_data_dir, load_settings};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = get_data_dir();
    let db_path = data_dir.join("reckon.db");

    println!(
        "User:       {}",
        if settings.user_name.is_empty() { "(not set)" } else { &settings.user_name }
    );
    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;

        let company = get_metadata(&conn, "company_name");
        println!("Company:    {}", company.as_deref().unwrap_or("(not set)"));

        let accounts: i64 = conn.query_row("SELECT count(*) FROM accounts", [], |r| r.get(0))?;
        let statements: i64 = conn.query_row("SELECT count(*) FROM statements", [], |r| r.get(0))?;
        let transactions: i64 =
            conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?;
        let needs_review: i64 = conn.query_row(
            "SELECT count(*) FROM transactions WHERE needs_review = 1",
            [],
            |r| r.get(0),
        )?;
        let pending: i64 = conn.query_row(
            "SELECT count(*) FROM transfer_candidates WHERE status = 'pending'",
            [],
            |r| r.get(0),
        )?;
        let linked: i64 = conn.query_row(
            "SELECT count(*) FROM transactions WHERE linked_to IS NOT NULL",
            [],
            |r| r.get(0),
        )?;

        println!();
        println!("Accounts:            {accounts}");
        println!("Statements:          {statements}");
        println!("Transactions:        {transactions}");
        println!("Awaiting review:     {needs_review}");
        println!("Pending candidates:  {pending}");
        println!("Linked transfers:    {linked}");
    } else {
        println!();
        println!("Database not found. Run `reckon init` to set up.");
    }

    Ok(())
}
