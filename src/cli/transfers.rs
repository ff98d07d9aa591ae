use colored::Colorize;
use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::detector;
use crate::error::Result;
use crate::fmt::money;
use crate::models::{AmountMatchType, CandidateStatus, TransferCandidate};
use crate::scorer::{self, CandidateWarning, ConfidenceBand};
use crate::settings::db_path;
use crate::transfers;

/// A candidate joined with both legs' display fields.
pub struct CandidateDetail {
    pub candidate: TransferCandidate,
    pub from_date: String,
    pub from_account: String,
    pub from_description: String,
    pub to_date: String,
    pub to_account: String,
    pub to_description: String,
}

pub fn load_details(conn: &Connection, status: Option<&str>) -> Result<Vec<CandidateDetail>> {
    let mut sql = String::from(
        "SELECT c.id, c.from_transaction_id, c.to_transaction_id, c.from_amount, c.to_amount, \
                c.from_currency, c.to_currency, c.exchange_rate_used, c.exchange_rate_source, \
                c.date_diff_days, c.is_cross_company, c.amount_match_type, \
                c.has_transfer_keywords, c.confidence, c.status, c.reject_reason, c.reviewed_at, \
                tf.date, af.name, tf.description, tt.date, at.name, tt.description \
         FROM transfer_candidates c \
         JOIN transactions tf ON c.from_transaction_id = tf.id \
         JOIN accounts af ON tf.account_id = af.id \
         JOIN transactions tt ON c.to_transaction_id = tt.id \
         JOIN accounts at ON tt.account_id = at.id",
    );
    let mut params: Vec<String> = Vec::new();
    if let Some(status) = status {
        sql.push_str(" WHERE c.status = ?1");
        params.push(status.to_string());
    }
    sql.push_str(" ORDER BY c.confidence DESC, c.id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(CandidateDetail {
                candidate: TransferCandidate {
                    id: row.get(0)?,
                    from_transaction_id: row.get(1)?,
                    to_transaction_id: row.get(2)?,
                    from_amount: row.get(3)?,
                    to_amount: row.get(4)?,
                    from_currency: row.get(5)?,
                    to_currency: row.get(6)?,
                    exchange_rate_used: row.get(7)?,
                    exchange_rate_source: row.get(8)?,
                    date_diff_days: row.get(9)?,
                    is_cross_company: row.get::<_, i64>(10)? != 0,
                    amount_match_type: AmountMatchType::from_column(&row.get::<_, String>(11)?),
                    has_transfer_keywords: row.get::<_, i64>(12)? != 0,
                    confidence: row.get(13)?,
                    status: CandidateStatus::from_column(&row.get::<_, String>(14)?),
                    reject_reason: row.get(15)?,
                    reviewed_at: row.get(16)?,
                },
                from_date: row.get(17)?,
                from_account: row.get(18)?,
                from_description: row.get(19)?,
                to_date: row.get(20)?,
                to_account: row.get(21)?,
                to_description: row.get(22)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn warning_markers(candidate: &TransferCandidate) -> String {
    scorer::validate(candidate)
        .iter()
        .map(|w| match w {
            CandidateWarning::MissingExchangeRate => "no-rate",
            CandidateWarning::CrossCompany => "cross-co",
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn detect() -> Result<()> {
    let mut conn = get_connection(&db_path())?;
    let outcome = detector::detect_candidates(&mut conn)?;
    println!(
        "Detected {} new candidate(s), auto-linked {}, skipped {} already-covered pair(s)",
        outcome.created, outcome.auto_linked, outcome.skipped_covered
    );
    if outcome.created > outcome.auto_linked {
        println!("Next: `reckon transfers review` to work through the pending queue.");
    }
    Ok(())
}

pub fn list(status: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let details = load_details(&conn, status)?;

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "From", "To", "Amount", "Days", "Match", "Score", "Band", "Status", "Warnings",
    ]);
    for detail in &details {
        let c = &detail.candidate;
        let amount = if c.is_cross_currency() {
            format!(
                "{} {} -> {} {}",
                money(c.from_amount.abs()),
                c.from_currency,
                money(c.to_amount.abs()),
                c.to_currency
            )
        } else {
            money(c.from_amount.abs())
        };
        table.add_row(vec![
            Cell::new(c.id),
            Cell::new(format!("{} {}", detail.from_date, detail.from_account)),
            Cell::new(format!("{} {}", detail.to_date, detail.to_account)),
            Cell::new(amount),
            Cell::new(c.date_diff_days),
            Cell::new(c.amount_match_type.as_str()),
            Cell::new(c.confidence),
            Cell::new(ConfidenceBand::of(c.confidence).as_str()),
            Cell::new(c.status.as_str()),
            Cell::new(warning_markers(c)),
        ]);
    }
    println!("Transfer candidates\n{table}");
    Ok(())
}

pub fn confirm(candidate_id: i64) -> Result<()> {
    let mut conn = get_connection(&db_path())?;
    transfers::confirm(&mut conn, candidate_id)?;
    let candidate = transfers::load_candidate(&conn, candidate_id)?;
    println!(
        "{} candidate {candidate_id}: transactions {} (out) and {} (in) are now linked.",
        "Confirmed".green(),
        candidate.from_transaction_id,
        candidate.to_transaction_id
    );
    Ok(())
}

pub fn reject(candidate_id: i64, reason: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path())?;
    transfers::reject(&conn, candidate_id, reason)?;
    println!("Rejected candidate {candidate_id}. Neither transaction was changed.");
    Ok(())
}
