use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    account_type TEXT NOT NULL,
    institution TEXT,
    company TEXT NOT NULL DEFAULT '',
    currency TEXT NOT NULL DEFAULT 'USD',
    last_four TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category_type TEXT NOT NULL,
    is_active INTEGER DEFAULT 1
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    account_id INTEGER NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    checksum TEXT,
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS statements (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    import_id INTEGER,
    period_start TEXT NOT NULL,
    period_end TEXT NOT NULL,
    opening_balance REAL NOT NULL,
    closing_balance REAL NOT NULL,
    total_credits REAL NOT NULL DEFAULT 0,
    total_debits REAL NOT NULL DEFAULT 0,
    transaction_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    statement_id INTEGER,
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    amount REAL,
    direction TEXT NOT NULL CHECK (direction IN ('credit', 'debit')),
    currency TEXT NOT NULL DEFAULT 'USD',
    category_id INTEGER,
    suggested_category_id INTEGER,
    needs_review INTEGER DEFAULT 0,
    review_reason TEXT,
    linked_to INTEGER,
    link_type TEXT CHECK (link_type IN ('transfer_out', 'transfer_in') OR link_type IS NULL),
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (statement_id) REFERENCES statements(id),
    FOREIGN KEY (category_id) REFERENCES categories(id),
    FOREIGN KEY (suggested_category_id) REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS transfer_candidates (
    id INTEGER PRIMARY KEY,
    from_transaction_id INTEGER NOT NULL,
    to_transaction_id INTEGER NOT NULL,
    from_amount REAL NOT NULL,
    to_amount REAL NOT NULL,
    from_currency TEXT NOT NULL,
    to_currency TEXT NOT NULL,
    exchange_rate_used REAL,
    exchange_rate_source TEXT,
    date_diff_days INTEGER NOT NULL,
    is_cross_company INTEGER NOT NULL DEFAULT 0,
    amount_match_type TEXT NOT NULL,
    has_transfer_keywords INTEGER NOT NULL DEFAULT 0,
    confidence INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'confirmed', 'rejected', 'auto_linked')),
    reject_reason TEXT,
    reviewed_at TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS reconciliations (
    id INTEGER PRIMARY KEY,
    statement_id INTEGER NOT NULL,
    statement_balance REAL NOT NULL,
    calculated_balance REAL NOT NULL,
    discrepancy REAL NOT NULL,
    is_balanced INTEGER NOT NULL,
    suspect_count INTEGER NOT NULL DEFAULT 0,
    reconciled_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (statement_id) REFERENCES statements(id)
);

CREATE TABLE IF NOT EXISTS fx_rates (
    from_currency TEXT NOT NULL,
    to_currency TEXT NOT NULL,
    rate REAL NOT NULL,
    source TEXT NOT NULL,
    PRIMARY KEY (from_currency, to_currency)
);

CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT
);
";

// (name, category_type)
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Client Revenue", "income"),
    ("Interest Income", "income"),
    ("Other Income", "income"),
    ("Software & Subscriptions", "expense"),
    ("Hosting & Infrastructure", "expense"),
    ("Office Expense", "expense"),
    ("Contract Labor", "expense"),
    ("Meals", "expense"),
    ("Travel", "expense"),
    ("Rent / Lease", "expense"),
    ("Utilities", "expense"),
    ("Bank & Merchant Fees", "expense"),
    ("Uncategorized", "expense"),
    ("Internal Transfer", "transfer"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |row| row.get(0))?;
    if count == 0 {
        for (name, category_type) in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO categories (name, category_type) VALUES (?1, ?2)",
                rusqlite::params![name, category_type],
            )?;
        }
    }
    Ok(())
}

pub fn get_metadata(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| row.get(0))
        .ok()
}

pub fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &[
            "accounts",
            "categories",
            "imports",
            "statements",
            "transactions",
            "transfer_candidates",
            "reconciliations",
            "fx_rates",
            "metadata",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |r| r.get(0)).unwrap();
        assert_eq!(count, DEFAULT_CATEGORIES.len() as i64);
    }

    #[test]
    fn test_seeds_canonical_transfer_category() {
        let (_dir, conn) = test_db();
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM categories WHERE category_type = 'transfer' AND is_active = 1",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_metadata_roundtrip() {
        let (_dir, conn) = test_db();
        assert_eq!(get_metadata(&conn, "company_name"), None);
        set_metadata(&conn, "company_name", "Harbor & Finch").unwrap();
        assert_eq!(get_metadata(&conn, "company_name").as_deref(), Some("Harbor & Finch"));
        set_metadata(&conn, "company_name", "Harbor Holdings").unwrap();
        assert_eq!(get_metadata(&conn, "company_name").as_deref(), Some("Harbor Holdings"));
    }

    #[test]
    fn test_direction_check_constraint() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO accounts (name, account_type) VALUES ('A', 'checking')", [])
            .unwrap();
        let res = conn.execute(
            "INSERT INTO transactions (account_id, date, description, amount, direction) \
             VALUES (1, '2025-01-01', 'x', 1.0, 'sideways')",
            [],
        );
        assert!(res.is_err());
    }
}
