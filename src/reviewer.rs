use rusqlite::{Connection, OptionalExtension};

use crate::error::{ReckonError, Result};
use crate::models::Category;
use crate::query::{self, TransactionQuery, TxnRow};

/// Transactions awaiting a categorization decision, oldest first. Linked
/// transfer legs are excluded: confirming the link already categorized them.
pub fn review_queue(conn: &Connection) -> Result<Vec<TxnRow>> {
    query::fetch(
        conn,
        &TransactionQuery {
            needs_review: Some(true),
            unlinked_only: true,
            ..Default::default()
        },
    )
}

pub fn get_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category_type FROM categories WHERE is_active = 1 \
         ORDER BY category_type, name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                category_type: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn apply_category(conn: &Connection, transaction_id: i64, category_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE transactions SET category_id = ?1, needs_review = 0, review_reason = NULL \
         WHERE id = ?2",
        rusqlite::params![category_id, transaction_id],
    )?;
    Ok(())
}

/// Accept the AI suggestion as the final category.
pub fn accept_suggestion(conn: &Connection, transaction_id: i64) -> Result<()> {
    let suggested: Option<i64> = conn
        .query_row(
            "SELECT suggested_category_id FROM transactions WHERE id = ?1",
            [transaction_id],
            |row| row.get(0),
        )
        .optional()?
        .flatten();
    match suggested {
        Some(category_id) => apply_category(conn, transaction_id, category_id),
        None => Err(ReckonError::Other(format!(
            "transaction {transaction_id} has no suggested category to accept"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        conn.execute(
            "INSERT INTO accounts (name, account_type) VALUES ('Checking', 'checking')",
            [],
        )
        .unwrap();
        (dir, conn)
    }

    fn category_id(conn: &Connection, name: &str) -> i64 {
        conn.query_row("SELECT id FROM categories WHERE name = ?1", [name], |r| r.get(0))
            .unwrap()
    }

    fn add_flagged(conn: &Connection, desc: &str, suggested: Option<i64>) -> i64 {
        conn.execute(
            "INSERT INTO transactions \
             (account_id, date, description, amount, direction, suggested_category_id, needs_review) \
             VALUES (1, '2025-06-05', ?1, -50.0, 'debit', ?2, 1)",
            rusqlite::params![desc, suggested],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    #[test]
    fn queue_lists_flagged_unlinked() {
        let (_dir, conn) = test_db();
        add_flagged(&conn, "ADOBE CREATIVE CLOUD", None);
        let linked = add_flagged(&conn, "TRANSFER OUT", None);
        conn.execute(
            "UPDATE transactions SET linked_to = 99, link_type = 'transfer_out' WHERE id = ?1",
            [linked],
        )
        .unwrap();

        let queue = review_queue(&conn).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].description, "ADOBE CREATIVE CLOUD");
    }

    #[test]
    fn accept_suggestion_applies_it() {
        let (_dir, conn) = test_db();
        let software = category_id(&conn, "Software & Subscriptions");
        let txn = add_flagged(&conn, "GITHUB INC", Some(software));

        accept_suggestion(&conn, txn).unwrap();

        let (cat, review): (Option<i64>, i64) = conn
            .query_row(
                "SELECT category_id, needs_review FROM transactions WHERE id = ?1",
                [txn],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(cat, Some(software));
        assert_eq!(review, 0);
    }

    #[test]
    fn accept_without_suggestion_errors() {
        let (_dir, conn) = test_db();
        let txn = add_flagged(&conn, "MYSTERY CHARGE", None);
        assert!(accept_suggestion(&conn, txn).is_err());
    }

    #[test]
    fn override_with_picked_category() {
        let (_dir, conn) = test_db();
        let software = category_id(&conn, "Software & Subscriptions");
        let meals = category_id(&conn, "Meals");
        let txn = add_flagged(&conn, "DOORDASH", Some(software));

        apply_category(&conn, txn, meals).unwrap();

        let cat: Option<i64> = conn
            .query_row("SELECT category_id FROM transactions WHERE id = ?1", [txn], |r| r.get(0))
            .unwrap();
        assert_eq!(cat, Some(meals));
    }

    #[test]
    fn categories_listing_groups_by_type() {
        let (_dir, conn) = test_db();
        let cats = get_categories(&conn).unwrap();
        assert!(cats.len() >= 10);
        let types: Vec<&str> = cats.iter().map(|c| c.category_type.as_str()).collect();
        let mut sorted = types.clone();
        sorted.sort();
        assert_eq!(types, sorted);
    }
}
