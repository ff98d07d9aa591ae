use crate::models::{AmountMatchType, TransferCandidate};

/// Presentation bands over the stored 0-100 confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn of(score: i64) -> Self {
        if score >= 90 {
            Self::High
        } else if score >= 70 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// The independent heuristic signals behind one candidate's score.
#[derive(Debug, Clone, Copy)]
pub struct FactorBreakdown {
    pub amount_match_type: AmountMatchType,
    pub date_diff_days: i64,
    pub same_company: bool,
    pub has_transfer_keywords: bool,
}

pub fn amount_points(match_type: AmountMatchType) -> i64 {
    match match_type {
        AmountMatchType::Exact => 50,
        AmountMatchType::FxConverted => 40,
        AmountMatchType::Approximate => 30,
    }
}

/// Smaller date gaps are stronger evidence. The raw day count is reported
/// unclamped on the candidate; only the points taper off.
pub fn date_points(date_diff_days: i64) -> i64 {
    match date_diff_days.abs() {
        0 => 25,
        1 => 20,
        2..=3 => 15,
        4..=7 => 10,
        _ => 0,
    }
}

pub const SAME_COMPANY_POINTS: i64 = 15;
pub const KEYWORD_POINTS: i64 = 10;

pub fn score(factors: &FactorBreakdown) -> i64 {
    let mut total = amount_points(factors.amount_match_type) + date_points(factors.date_diff_days);
    if factors.same_company {
        total += SAME_COMPANY_POINTS;
    }
    if factors.has_transfer_keywords {
        total += KEYWORD_POINTS;
    }
    total.clamp(0, 100)
}

/// Data-quality and policy conditions the review surface must show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateWarning {
    /// Cross-currency pair stored without an exchange rate: the amounts
    /// cannot be trusted to correspond, so the match may not be real.
    MissingExchangeRate,
    /// Cross-company candidates require manual review regardless of score.
    CrossCompany,
}

impl CandidateWarning {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::MissingExchangeRate => "cross-currency pair has no exchange rate recorded",
            Self::CrossCompany => "cross-company pair: manual review required",
        }
    }
}

pub fn validate(candidate: &TransferCandidate) -> Vec<CandidateWarning> {
    let mut warnings = Vec::new();
    if candidate.is_cross_currency() && candidate.exchange_rate_used.is_none() {
        warnings.push(CandidateWarning::MissingExchangeRate);
    }
    if candidate.is_cross_company {
        warnings.push(CandidateWarning::CrossCompany);
    }
    warnings
}
