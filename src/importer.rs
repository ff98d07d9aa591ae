use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{ReckonError, Result};
use crate::fmt::round_cents;
use crate::models::Direction;

/// One row of normalized parse output. The upstream parse step has already
/// dealt with bank-specific formats; this is its contract with us.
#[derive(Debug, Clone, Deserialize)]
pub struct ParsedRow {
    pub date: String,
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    /// AI categorization output, when the upstream interpreter ran.
    #[serde(default)]
    pub suggested_category: Option<String>,
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub statement_id: i64,
    pub imported: usize,
    pub flagged: usize,
    pub total_credits: f64,
    pub total_debits: f64,
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn parse_rows(file_path: &Path) -> Result<Vec<ParsedRow>> {
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "json" => {
            let content = std::fs::read_to_string(file_path)?;
            Ok(serde_json::from_str(&content)?)
        }
        "csv" => {
            let mut reader = csv::Reader::from_path(file_path)?;
            let mut rows = Vec::new();
            for record in reader.deserialize() {
                rows.push(record?);
            }
            Ok(rows)
        }
        other => Err(ReckonError::UnknownFormat(other.to_string())),
    }
}

struct NormalizedRow {
    date: String,
    description: String,
    amount: Option<f64>,
    direction: Direction,
    currency: String,
    suggested_category_id: Option<i64>,
    review_reason: Option<String>,
}

fn normalize_row(
    conn: &Connection,
    row: &ParsedRow,
    index: usize,
    account_currency: &str,
) -> Result<NormalizedRow> {
    if NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").is_err() {
        return Err(ReckonError::InvalidRow {
            row: index + 1,
            reason: format!("unparseable date '{}'", row.date),
        });
    }

    let direction = match &row.direction {
        Some(raw) => Direction::parse(raw).ok_or_else(|| ReckonError::InvalidRow {
            row: index + 1,
            reason: format!("unknown direction '{raw}'"),
        })?,
        // The parse step sometimes emits only the signed amount.
        None => {
            if row.amount < 0.0 {
                Direction::Debit
            } else {
                Direction::Credit
            }
        }
    };

    let mut review_reason = None;
    let amount = if row.amount.is_finite() {
        Some(row.amount)
    } else {
        review_reason = Some("non-finite amount in source".to_string());
        None
    };

    let suggested_category_id = match &row.suggested_category {
        Some(name) => {
            let id: Option<i64> = conn
                .query_row(
                    "SELECT id FROM categories WHERE name = ?1 COLLATE NOCASE AND is_active = 1",
                    [name],
                    |r| r.get(0),
                )
                .optional()?;
            if id.is_none() {
                review_reason
                    .get_or_insert_with(|| format!("unknown suggested category '{name}'"));
            }
            id
        }
        None => None,
    };

    Ok(NormalizedRow {
        date: row.date.clone(),
        description: row.description.clone(),
        amount,
        direction,
        currency: row
            .currency
            .clone()
            .unwrap_or_else(|| account_currency.to_string()),
        suggested_category_id,
        review_reason,
    })
}

/// Ingest one parsed statement file: an imports audit row, one immutable
/// statements row, and the transaction rows, all in a single database
/// transaction. Re-importing a byte-identical file into the same account is
/// refused via the checksum.
pub fn import_statement(
    conn: &mut Connection,
    file_path: &Path,
    account: &str,
    opening_balance: f64,
    closing_balance: f64,
    period: Option<(String, String)>,
) -> Result<ImportOutcome> {
    let (account_id, account_currency): (i64, String) = conn
        .query_row(
            "SELECT id, currency FROM accounts WHERE name = ?1",
            [account],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or_else(|| ReckonError::UnknownAccount(account.to_string()))?;

    let checksum = compute_checksum(file_path)?;
    let filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());

    let already: bool = conn
        .prepare("SELECT 1 FROM imports WHERE account_id = ?1 AND checksum = ?2")?
        .exists(rusqlite::params![account_id, checksum])?;
    if already {
        return Err(ReckonError::DuplicateImport(filename));
    }

    let raw_rows = parse_rows(file_path)?;
    let mut rows = Vec::with_capacity(raw_rows.len());
    for (index, raw) in raw_rows.iter().enumerate() {
        rows.push(normalize_row(conn, raw, index, &account_currency)?);
    }

    let (period_start, period_end) = match period {
        Some(p) => p,
        None => {
            let mut dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
            dates.sort();
            match (dates.first(), dates.last()) {
                (Some(first), Some(last)) => (first.to_string(), last.to_string()),
                _ => {
                    return Err(ReckonError::Other(
                        "empty statement file and no explicit period given".to_string(),
                    ))
                }
            }
        }
    };

    let mut total_credits = 0.0;
    let mut total_debits = 0.0;
    for row in &rows {
        if let Some(amount) = row.amount {
            match row.direction {
                Direction::Credit => total_credits += amount.abs(),
                Direction::Debit => total_debits += amount.abs(),
            }
        }
    }
    let total_credits = round_cents(total_credits);
    let total_debits = round_cents(total_debits);

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO imports (filename, account_id, record_count, checksum) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![filename, account_id, rows.len() as i64, checksum],
    )?;
    let import_id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO statements \
         (account_id, import_id, period_start, period_end, opening_balance, closing_balance, \
          total_credits, total_debits, transaction_count) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            account_id,
            import_id,
            period_start,
            period_end,
            opening_balance,
            closing_balance,
            total_credits,
            total_debits,
            rows.len() as i64,
        ],
    )?;
    let statement_id = tx.last_insert_rowid();

    let mut flagged = 0usize;
    for row in &rows {
        if row.review_reason.is_some() {
            flagged += 1;
        }
        tx.execute(
            "INSERT INTO transactions \
             (account_id, statement_id, date, description, amount, direction, currency, \
              suggested_category_id, needs_review, review_reason) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9)",
            rusqlite::params![
                account_id,
                statement_id,
                row.date,
                row.description,
                row.amount,
                row.direction.as_str(),
                row.currency,
                row.suggested_category_id,
                row.review_reason,
            ],
        )?;
    }
    tx.commit()?;

    Ok(ImportOutcome {
        statement_id,
        imported: rows.len(),
        flagged,
        total_credits,
        total_debits,
    })
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
            "INSERT INTO accounts (name, account_type, currency) VALUES ('Checking', 'checking', 'USD')",
            [],
        )
        .unwrap();
        (dir, conn)
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    const JSON_ROWS: &str = r#"[
        {"date": "2025-06-03", "description": "STRIPE PAYOUT", "amount": 1200.00, "direction": "credit", "suggested_category": "Client Revenue"},
        {"date": "2025-06-05", "description": "GITHUB INC", "amount": -21.00, "direction": "debit", "suggested_category": "Software & Subscriptions"},
        {"date": "2025-06-10", "description": "OFFICE RENT", "amount": -1800.00}
    ]"#;

    #[test]
    fn json_import_creates_statement_and_rows() {
        let (dir, mut conn) = test_db();
        let file = write_file(&dir, "june.json", JSON_ROWS);

        let outcome =
            import_statement(&mut conn, &file, "Checking", 1000.0, 379.0, None).unwrap();
        assert_eq!(outcome.imported, 3);
        assert_eq!(outcome.flagged, 0);
        assert_eq!(outcome.total_credits, 1200.0);
        assert_eq!(outcome.total_debits, 1821.0);

        let (start, end, count): (String, String, i64) = conn
            .query_row(
                "SELECT period_start, period_end, transaction_count FROM statements WHERE id = ?1",
                [outcome.statement_id],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(start, "2025-06-03");
        assert_eq!(end, "2025-06-10");
        assert_eq!(count, 3);

        // Sign-derived direction when the parse output omits it.
        let direction: String = conn
            .query_row(
                "SELECT direction FROM transactions WHERE description = 'OFFICE RENT'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(direction, "debit");

        // Suggested categories resolved, rows awaiting review.
        let (suggested, review): (Option<i64>, i64) = conn
            .query_row(
                "SELECT suggested_category_id, needs_review FROM transactions WHERE description = 'GITHUB INC'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert!(suggested.is_some());
        assert_eq!(review, 1);
    }

    #[test]
    fn duplicate_checksum_is_refused() {
        let (dir, mut conn) = test_db();
        let file = write_file(&dir, "june.json", JSON_ROWS);
        import_statement(&mut conn, &file, "Checking", 1000.0, 379.0, None).unwrap();
        let err = import_statement(&mut conn, &file, "Checking", 1000.0, 379.0, None).unwrap_err();
        assert!(matches!(err, ReckonError::DuplicateImport(_)));
    }

    #[test]
    fn csv_import_with_non_finite_amount_flags_row() {
        let (dir, mut conn) = test_db();
        let file = write_file(
            &dir,
            "june.csv",
            "date,description,amount,direction,currency,suggested_category\n\
             2025-06-03,STRIPE PAYOUT,1200.00,credit,,\n\
             2025-06-04,GARBLED ROW,NaN,debit,,\n",
        );

        let outcome =
            import_statement(&mut conn, &file, "Checking", 0.0, 1200.0, None).unwrap();
        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.flagged, 1);

        let (amount, reason): (Option<f64>, Option<String>) = conn
            .query_row(
                "SELECT amount, review_reason FROM transactions WHERE description = 'GARBLED ROW'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(amount, None);
        assert_eq!(reason.as_deref(), Some("non-finite amount in source"));

        // The statement still reconciles: the bad row contributes zero.
        let report = crate::reconciler::reconcile_statement(&conn, outcome.statement_id).unwrap();
        assert!(report.is_balanced);
        assert_eq!(report.suspect_count, 1);
    }

    #[test]
    fn unknown_account_and_format() {
        let (dir, mut conn) = test_db();
        let file = write_file(&dir, "june.json", JSON_ROWS);
        let err = import_statement(&mut conn, &file, "Nope", 0.0, 0.0, None).unwrap_err();
        assert!(matches!(err, ReckonError::UnknownAccount(_)));

        let odd = write_file(&dir, "june.xlsx", "not really");
        let err = import_statement(&mut conn, &odd, "Checking", 0.0, 0.0, None).unwrap_err();
        assert!(matches!(err, ReckonError::UnknownFormat(_)));
    }

    #[test]
    fn bad_date_rejects_file() {
        let (dir, mut conn) = test_db();
        let file = write_file(
            &dir,
            "bad.json",
            r#"[{"date": "06/03/2025", "description": "X", "amount": 1.0}]"#,
        );
        let err = import_statement(&mut conn, &file, "Checking", 0.0, 0.0, None).unwrap_err();
        assert!(matches!(err, ReckonError::InvalidRow { row: 1, .. }));
        // nothing was persisted
        let count: i64 = conn.query_row("SELECT count(*) FROM statements", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn explicit_period_overrides_row_dates() {
        let (dir, mut conn) = test_db();
        let file = write_file(&dir, "june.json", JSON_ROWS);
        let outcome = import_statement(
            &mut conn,
            &file,
            "Checking",
            1000.0,
            379.0,
            Some(("2025-06-01".to_string(), "2025-06-30".to_string())),
        )
        .unwrap();
        let (start, end): (String, String) = conn
            .query_row(
                "SELECT period_start, period_end FROM statements WHERE id = ?1",
                [outcome.statement_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(start, "2025-06-01");
        assert_eq!(end, "2025-06-30");
    }
}
