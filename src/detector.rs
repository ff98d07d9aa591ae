use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use regex::Regex;
use rusqlite::Connection;

use crate::error::{ReckonError, Result};
use crate::models::{AmountMatchType, Direction};
use crate::scorer::{self, FactorBreakdown};
use crate::transfers::resolve_transfer_category;

pub const MAX_DATE_DIFF_DAYS: i64 = 7;

/// Candidates at or above this score with exact same-company amounts are
/// linked directly; everything else waits for review.
pub const AUTO_LINK_THRESHOLD: i64 = 98;

/// Relative tolerance for "approximate" and fx-converted amount agreement.
const APPROX_RATIO: f64 = 0.01;

/// Vocabulary associated with internal fund movement. Word-bounded so that
/// e.g. "BEACH CAFE" does not trip the ACH keyword.
const KEYWORD_PATTERN: &str =
    r"(?i)\b(transfer|xfer|zelle|ach|wire|online payment|payment to|payment from)\b";

struct ScanTxn {
    id: i64,
    account_id: i64,
    company: String,
    currency: String,
    date: String,
    day: Option<NaiveDate>,
    description: String,
    amount: f64,
    direction: Direction,
}

pub struct DetectOutcome {
    pub created: usize,
    pub auto_linked: usize,
    pub skipped_covered: usize,
}

fn load_unlinked(conn: &Connection) -> Result<Vec<ScanTxn>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.account_id, a.company, t.currency, t.date, t.description, t.amount, t.direction \
         FROM transactions t JOIN accounts a ON t.account_id = a.id \
         WHERE t.linked_to IS NULL AND t.amount IS NOT NULL \
         ORDER BY t.date, t.id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            let date: String = row.get(4)?;
            Ok(ScanTxn {
                id: row.get(0)?,
                account_id: row.get(1)?,
                company: row.get(2)?,
                currency: row.get(3)?,
                day: NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok(),
                date,
                description: row.get(5)?,
                amount: row.get(6)?,
                direction: Direction::from_column(&row.get::<_, String>(7)?),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn load_fx_rates(conn: &Connection) -> Result<HashMap<(String, String), (f64, String)>> {
    let mut stmt = conn.prepare("SELECT from_currency, to_currency, rate, source FROM fx_rates")?;
    let mut rates = HashMap::new();
    let rows = stmt.query_map([], |row| {
        Ok((
            (row.get::<_, String>(0)?, row.get::<_, String>(1)?),
            (row.get::<_, f64>(2)?, row.get::<_, String>(3)?),
        ))
    })?;
    for row in rows {
        let (key, val) = row?;
        rates.insert(key, val);
    }
    Ok(rates)
}

fn load_covered_pairs(conn: &Connection) -> Result<HashSet<(i64, i64)>> {
    let mut stmt =
        conn.prepare("SELECT from_transaction_id, to_transaction_id FROM transfer_candidates")?;
    let mut covered = HashSet::new();
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (f, t) = row?;
        covered.insert((f, t));
        covered.insert((t, f));
    }
    Ok(covered)
}

struct AmountAgreement {
    match_type: AmountMatchType,
    rate: Option<f64>,
    rate_source: Option<String>,
}

fn amounts_agree(
    from: &ScanTxn,
    to: &ScanTxn,
    keywords: bool,
    date_diff: i64,
    rates: &HashMap<(String, String), (f64, String)>,
) -> Option<AmountAgreement> {
    let fa = from.amount.abs();
    let ta = to.amount.abs();
    if fa == 0.0 || ta == 0.0 {
        return None;
    }

    if from.currency == to.currency {
        if (fa - ta).abs() < 0.005 {
            return Some(AmountAgreement {
                match_type: AmountMatchType::Exact,
                rate: None,
                rate_source: None,
            });
        }
        if (fa - ta).abs() / ta <= APPROX_RATIO {
            return Some(AmountAgreement {
                match_type: AmountMatchType::Approximate,
                rate: None,
                rate_source: None,
            });
        }
        return None;
    }

    // Cross-currency: convert through a stored rate when one exists.
    let direct = rates.get(&(from.currency.clone(), to.currency.clone()));
    let inverse = rates.get(&(to.currency.clone(), from.currency.clone()));
    if let Some((rate, source)) = direct {
        if (fa * rate - ta).abs() / ta <= APPROX_RATIO {
            return Some(AmountAgreement {
                match_type: AmountMatchType::FxConverted,
                rate: Some(*rate),
                rate_source: Some(source.clone()),
            });
        }
        return None;
    }
    if let Some((rate, source)) = inverse {
        if *rate != 0.0 && (fa / rate - ta).abs() / ta <= APPROX_RATIO {
            return Some(AmountAgreement {
                match_type: AmountMatchType::FxConverted,
                rate: Some(1.0 / rate),
                rate_source: Some(source.clone()),
            });
        }
        return None;
    }

    // No rate on file. A tight pairing still becomes a candidate so the
    // missing rate is surfaced in review instead of silently dropped.
    if date_diff.abs() <= 1 && keywords {
        return Some(AmountAgreement {
            match_type: AmountMatchType::Approximate,
            rate: None,
            rate_source: None,
        });
    }
    None
}

/// Sweep unlinked transactions for plausible transfer pairs and record them
/// as candidates. The debit leg is the `from` side. Pairs already covered by
/// any prior candidate (including rejected ones) are not re-proposed.
pub fn detect_candidates(conn: &mut Connection) -> Result<DetectOutcome> {
    let keyword_re =
        Regex::new(KEYWORD_PATTERN).map_err(|e| ReckonError::Other(e.to_string()))?;
    let txns = load_unlinked(conn)?;
    let rates = load_fx_rates(conn)?;
    let covered = load_covered_pairs(conn)?;

    let tx = conn.transaction()?;
    let mut outcome = DetectOutcome {
        created: 0,
        auto_linked: 0,
        skipped_covered: 0,
    };
    let mut linked_now: HashSet<i64> = HashSet::new();

    for i in 0..txns.len() {
        for j in (i + 1)..txns.len() {
            let (a, b) = (&txns[i], &txns[j]);
            if a.direction == b.direction {
                continue;
            }
            let (from, to) = if a.direction == Direction::Debit { (a, b) } else { (b, a) };
            if linked_now.contains(&from.id) || linked_now.contains(&to.id) {
                continue;
            }

            let (from_day, to_day) = match (from.day, to.day) {
                (Some(f), Some(t)) => (f, t),
                _ => continue,
            };
            let date_diff = (to_day - from_day).num_days();
            if date_diff.abs() > MAX_DATE_DIFF_DAYS {
                continue;
            }

            let keywords = keyword_re.is_match(&from.description)
                || keyword_re.is_match(&to.description);
            let agreement = match amounts_agree(from, to, keywords, date_diff, &rates) {
                Some(a) => a,
                None => continue,
            };

            if covered.contains(&(from.id, to.id)) {
                outcome.skipped_covered += 1;
                continue;
            }

            let same_company = from.company == to.company;
            let factors = FactorBreakdown {
                amount_match_type: agreement.match_type,
                date_diff_days: date_diff,
                same_company,
                has_transfer_keywords: keywords,
            };
            let confidence = scorer::score(&factors);

            let auto_link = confidence >= AUTO_LINK_THRESHOLD
                && agreement.match_type == AmountMatchType::Exact
                && same_company;
            let status = if auto_link { "auto_linked" } else { "pending" };

            tx.execute(
                "INSERT INTO transfer_candidates \
                 (from_transaction_id, to_transaction_id, from_amount, to_amount, \
                  from_currency, to_currency, exchange_rate_used, exchange_rate_source, \
                  date_diff_days, is_cross_company, amount_match_type, has_transfer_keywords, \
                  confidence, status, reviewed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, \
                         CASE WHEN ?14 = 'auto_linked' THEN datetime('now') ELSE NULL END)",
                rusqlite::params![
                    from.id,
                    to.id,
                    from.amount,
                    to.amount,
                    from.currency,
                    to.currency,
                    agreement.rate,
                    agreement.rate_source,
                    date_diff,
                    !same_company as i32,
                    agreement.match_type.as_str(),
                    keywords as i32,
                    confidence,
                    status,
                ],
            )?;
            let candidate_id = tx.last_insert_rowid();
            outcome.created += 1;

            if auto_link {
                let category_id = resolve_transfer_category(&tx)?;
                let from_updated = tx.execute(
                    "UPDATE transactions SET linked_to = ?1, link_type = 'transfer_out', \
                            category_id = ?2, needs_review = 0, review_reason = NULL \
                     WHERE id = ?3",
                    rusqlite::params![to.id, category_id, from.id],
                )?;
                if from_updated != 1 {
                    return Err(ReckonError::LinkInconsistency {
                        candidate_id,
                        side: "from",
                        transaction_id: from.id,
                    });
                }
                let to_updated = tx.execute(
                    "UPDATE transactions SET linked_to = ?1, link_type = 'transfer_in', \
                            category_id = ?2, needs_review = 0, review_reason = NULL \
                     WHERE id = ?3",
                    rusqlite::params![from.id, category_id, to.id],
                )?;
                if to_updated != 1 {
                    return Err(ReckonError::LinkInconsistency {
                        candidate_id,
                        side: "to",
                        transaction_id: to.id,
                    });
                }
                linked_now.insert(from.id);
                linked_now.insert(to.id);
                outcome.auto_linked += 1;
            }
        }
    }

    tx.commit()?;
    Ok(outcome)
}
