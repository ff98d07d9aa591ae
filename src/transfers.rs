use rusqlite::{Connection, OptionalExtension};

use crate::error::{ReckonError, Result};
use crate::models::{AmountMatchType, CandidateStatus, TransferCandidate};

pub const DEFAULT_REJECT_REASON: &str = "not a transfer";

/// The canonical category applied to both legs of a confirmed transfer.
pub fn resolve_transfer_category(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT id FROM categories WHERE category_type = 'transfer' AND is_active = 1 \
         ORDER BY id LIMIT 1",
        [],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| ReckonError::UnknownCategory("Internal Transfer".to_string()))
}

pub fn load_candidate(conn: &Connection, candidate_id: i64) -> Result<TransferCandidate> {
    conn.query_row(
        "SELECT id, from_transaction_id, to_transaction_id, from_amount, to_amount, \
                from_currency, to_currency, exchange_rate_used, exchange_rate_source, \
                date_diff_days, is_cross_company, amount_match_type, has_transfer_keywords, \
                confidence, status, reject_reason, reviewed_at \
         FROM transfer_candidates WHERE id = ?1",
        [candidate_id],
        |row| {
            Ok(TransferCandidate {
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
            })
        },
    )
    .optional()?
    .ok_or(ReckonError::UnknownCandidate(candidate_id))
}

fn require_pending(candidate: &TransferCandidate) -> Result<()> {
    if candidate.status != CandidateStatus::Pending {
        return Err(ReckonError::CandidateNotPending {
            id: candidate.id,
            status: candidate.status.as_str().to_string(),
        });
    }
    Ok(())
}

/// Confirm a pending candidate: one database transaction marks the candidate
/// confirmed and links both legs with reciprocal link types and the canonical
/// transfer category. Every update's row count is verified; if either leg
/// fails to update, the whole operation rolls back and the caller gets the
/// distinct inconsistency error rather than a success or a half-linked pair.
pub fn confirm(conn: &mut Connection, candidate_id: i64) -> Result<()> {
    let candidate = load_candidate(conn, candidate_id)?;
    require_pending(&candidate)?;

    let tx = conn.transaction()?;
    let category_id = resolve_transfer_category(&tx)?;

    let updated = tx.execute(
        "UPDATE transfer_candidates SET status = 'confirmed', reviewed_at = datetime('now') \
         WHERE id = ?1 AND status = 'pending'",
        [candidate_id],
    )?;
    if updated != 1 {
        // Lost a race with another reviewer between the load and the update.
        return Err(ReckonError::CandidateNotPending {
            id: candidate_id,
            status: load_candidate(&tx, candidate_id)?.status.as_str().to_string(),
        });
    }

    let from_updated = tx.execute(
        "UPDATE transactions SET linked_to = ?1, link_type = 'transfer_out', \
                category_id = ?2, needs_review = 0, review_reason = NULL \
         WHERE id = ?3",
        rusqlite::params![candidate.to_transaction_id, category_id, candidate.from_transaction_id],
    )?;
    if from_updated != 1 {
        return Err(ReckonError::LinkInconsistency {
            candidate_id,
            side: "from",
            transaction_id: candidate.from_transaction_id,
        });
    }

    let to_updated = tx.execute(
        "UPDATE transactions SET linked_to = ?1, link_type = 'transfer_in', \
                category_id = ?2, needs_review = 0, review_reason = NULL \
         WHERE id = ?3",
        rusqlite::params![candidate.from_transaction_id, category_id, candidate.to_transaction_id],
    )?;
    if to_updated != 1 {
        return Err(ReckonError::LinkInconsistency {
            candidate_id,
            side: "to",
            transaction_id: candidate.to_transaction_id,
        });
    }

    tx.commit()?;
    Ok(())
}

/// Reject a pending candidate. Neither transaction is touched; the candidate
/// stays as an audit record with the reason.
pub fn reject(conn: &Connection, candidate_id: i64, reason: Option<&str>) -> Result<()> {
    let candidate = load_candidate(conn, candidate_id)?;
    require_pending(&candidate)?;

    let reason = match reason {
        Some(r) if !r.trim().is_empty() => r.trim(),
        _ => DEFAULT_REJECT_REASON,
    };
    conn.execute(
        "UPDATE transfer_candidates SET status = 'rejected', reject_reason = ?1, \
                reviewed_at = datetime('now') \
         WHERE id = ?2 AND status = 'pending'",
        rusqlite::params![reason, candidate_id],
    )?;
    Ok(())
}
