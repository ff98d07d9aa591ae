use std::collections::HashMap;

use rusqlite::types::Value;
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::{Direction, LinkType};

/// Immutable description of one transaction listing. Pages build one of
/// these and hand it to `fetch`; there is no mutable filter state living
/// anywhere else. Equal queries have equal fingerprints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    pub account_id: Option<i64>,
    pub statement_id: Option<i64>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub needs_review: Option<bool>,
    pub unlinked_only: bool,
    pub limit: Option<i64>,
}

impl TransactionQuery {
    pub fn fingerprint(&self) -> String {
        let canonical = format!(
            "account={:?};statement={:?};from={:?};to={:?};review={:?};unlinked={};limit={:?}",
            self.account_id,
            self.statement_id,
            self.from_date,
            self.to_date,
            self.needs_review,
            self.unlinked_only,
            self.limit,
        );
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct TxnRow {
    pub id: i64,
    pub account_name: String,
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub direction: Direction,
    pub currency: String,
    pub category: Option<String>,
    pub suggested_category: Option<String>,
    pub suggested_category_id: Option<i64>,
    pub needs_review: bool,
    pub review_reason: Option<String>,
    pub link_type: Option<LinkType>,
}

/// Pure fetch: the query struct fully determines the SQL. Ordering is always
/// the deterministic (date, id) so running balances and review sequences are
/// reproducible regardless of insert order.
pub fn fetch(conn: &Connection, query: &TransactionQuery) -> Result<Vec<TxnRow>> {
    let mut sql = String::from(
        "SELECT t.id, a.name, t.date, t.description, t.amount, t.direction, t.currency, \
                c.name, s.name, t.suggested_category_id, t.needs_review, t.review_reason, t.link_type \
         FROM transactions t \
         JOIN accounts a ON t.account_id = a.id \
         LEFT JOIN categories c ON t.category_id = c.id \
         LEFT JOIN categories s ON t.suggested_category_id = s.id \
         WHERE 1=1",
    );
    let mut params: Vec<Value> = Vec::new();

    if let Some(account_id) = query.account_id {
        sql.push_str(" AND t.account_id = ?");
        params.push(Value::Integer(account_id));
    }
    if let Some(statement_id) = query.statement_id {
        sql.push_str(" AND t.statement_id = ?");
        params.push(Value::Integer(statement_id));
    }
    if let Some(from) = &query.from_date {
        sql.push_str(" AND t.date >= ?");
        params.push(Value::Text(from.clone()));
    }
    if let Some(to) = &query.to_date {
        sql.push_str(" AND t.date <= ?");
        params.push(Value::Text(to.clone()));
    }
    if let Some(needs_review) = query.needs_review {
        sql.push_str(" AND t.needs_review = ?");
        params.push(Value::Integer(needs_review as i64));
    }
    if query.unlinked_only {
        sql.push_str(" AND t.linked_to IS NULL");
    }
    sql.push_str(" ORDER BY t.date, t.id");
    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(limit));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(TxnRow {
                id: row.get(0)?,
                account_name: row.get(1)?,
                date: row.get(2)?,
                description: row.get(3)?,
                amount: row.get::<_, Option<f64>>(4)?.unwrap_or(f64::NAN),
                direction: Direction::from_column(&row.get::<_, String>(5)?),
                currency: row.get(6)?,
                category: row.get(7)?,
                suggested_category: row.get(8)?,
                suggested_category_id: row.get(9)?,
                needs_review: row.get::<_, i64>(10)? != 0,
                review_reason: row.get(11)?,
                link_type: row
                    .get::<_, Option<String>>(12)?
                    .as_deref()
                    .and_then(LinkType::parse),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Fetch results keyed by query fingerprint. A page keeps one of these for
/// its lifetime; dropping it (navigation, refresh) is the invalidation.
#[derive(Default)]
pub struct QueryCache {
    entries: HashMap<String, Vec<TxnRow>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch(&mut self, conn: &Connection, query: &TransactionQuery) -> Result<&[TxnRow]> {
        let key = query.fingerprint();
        if !self.entries.contains_key(&key) {
            let rows = fetch(conn, query)?;
            self.entries.insert(key.clone(), rows);
        }
        Ok(self.entries.get(&key).map(|v| v.as_slice()).unwrap_or(&[]))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
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
        (dir, conn)
    }

    fn seed(conn: &Connection) -> i64 {
        conn.execute(
            "INSERT INTO accounts (name, account_type) VALUES ('Checking', 'checking')",
            [],
        )
        .unwrap();
        let account_id = conn.last_insert_rowid();
        for (date, desc, amount, review) in [
            ("2025-06-03", "STRIPE PAYOUT", 1200.0, 0),
            ("2025-06-05", "GITHUB INC", -21.0, 1),
            ("2025-06-05", "ADOBE CREATIVE CLOUD", -54.99, 1),
            ("2025-06-10", "RENT", -1800.0, 0),
        ] {
            conn.execute(
                "INSERT INTO transactions (account_id, date, description, amount, direction, needs_review) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![account_id, date, desc, amount, if amount < 0.0 { "debit" } else { "credit" }, review],
            )
            .unwrap();
        }
        account_id
    }

    #[test]
    fn fingerprint_is_stable_and_distinguishes() {
        let q1 = TransactionQuery {
            account_id: Some(1),
            ..Default::default()
        };
        let q2 = TransactionQuery {
            account_id: Some(1),
            ..Default::default()
        };
        let q3 = TransactionQuery {
            account_id: Some(2),
            ..Default::default()
        };
        assert_eq!(q1.fingerprint(), q2.fingerprint());
        assert_ne!(q1.fingerprint(), q3.fingerprint());
    }

    #[test]
    fn fetch_orders_by_date_then_id() {
        let (_dir, conn) = test_db();
        seed(&conn);
        let rows = fetch(&conn, &TransactionQuery::default()).unwrap();
        let dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-06-03", "2025-06-05", "2025-06-05", "2025-06-10"]);
        // same-date rows come back in id order
        assert!(rows[1].id < rows[2].id);
    }

    #[test]
    fn fetch_filters_compose() {
        let (_dir, conn) = test_db();
        let account_id = seed(&conn);
        let q = TransactionQuery {
            account_id: Some(account_id),
            from_date: Some("2025-06-04".into()),
            to_date: Some("2025-06-09".into()),
            needs_review: Some(true),
            ..Default::default()
        };
        let rows = fetch(&conn, &q).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.needs_review));
    }

    #[test]
    fn fetch_limit() {
        let (_dir, conn) = test_db();
        seed(&conn);
        let q = TransactionQuery {
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(fetch(&conn, &q).unwrap().len(), 2);
    }

    #[test]
    fn cache_reuses_by_fingerprint() {
        let (_dir, conn) = test_db();
        seed(&conn);
        let mut cache = QueryCache::new();
        let q = TransactionQuery::default();

        let first = cache.fetch(&conn, &q).unwrap().len();
        assert_eq!(first, 4);
        assert_eq!(cache.len(), 1);

        // New rows are invisible through the same fingerprint until cleared.
        conn.execute(
            "INSERT INTO transactions (account_id, date, description, amount, direction) \
             VALUES (1, '2025-06-11', 'LATE ROW', -1.0, 'debit')",
            [],
        )
        .unwrap();
        assert_eq!(cache.fetch(&conn, &q).unwrap().len(), 4);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert_eq!(cache.fetch(&conn, &q).unwrap().len(), 5);
    }

    #[test]
    fn distinct_queries_cache_separately() {
        let (_dir, conn) = test_db();
        let account_id = seed(&conn);
        let mut cache = QueryCache::new();
        cache.fetch(&conn, &TransactionQuery::default()).unwrap();
        cache
            .fetch(
                &conn,
                &TransactionQuery {
                    account_id: Some(account_id),
                    needs_review: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(cache.len(), 2);
    }
}
