/// Whether credits or debits increase an account's reported balance.
/// Chequing/savings style accounts are `Asset` (credits add); credit cards
/// and lines of credit are `Liability` (debits add to the amount owed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Asset,
    Liability,
}

impl Polarity {
    /// Resolve polarity from the stored account type. Unknown or empty types
    /// default to `Asset` rather than failing the computation.
    pub fn from_account_type(account_type: &str) -> Self {
        let t = account_type.to_lowercase().replace([' ', '-'], "_");
        if t.contains("credit_card") || t.contains("line_of_credit") {
            Self::Liability
        } else {
            Self::Asset
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "credit" | "cr" => Some(Self::Credit),
            "debit" | "dr" => Some(Self::Debit),
            _ => None,
        }
    }

    /// Stored values are written through `as_str`, so anything else in the
    /// column is treated as a debit rather than aborting a read.
    pub fn from_column(s: &str) -> Self {
        Self::parse(s).unwrap_or(Self::Debit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    TransferOut,
    TransferIn,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransferOut => "transfer_out",
            Self::TransferIn => "transfer_in",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "transfer_out" => Some(Self::TransferOut),
            "transfer_in" => Some(Self::TransferIn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStatus {
    Pending,
    Confirmed,
    Rejected,
    /// Terminal state written only by the detection pass, never by review.
    AutoLinked,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::AutoLinked => "auto_linked",
        }
    }

    pub fn from_column(s: &str) -> Self {
        match s {
            "confirmed" => Self::Confirmed,
            "rejected" => Self::Rejected,
            "auto_linked" => Self::AutoLinked,
            _ => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountMatchType {
    Exact,
    FxConverted,
    Approximate,
}

impl AmountMatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::FxConverted => "fx_converted",
            Self::Approximate => "approximate",
        }
    }

    pub fn from_column(s: &str) -> Self {
        match s {
            "exact" => Self::Exact,
            "fx_converted" => Self::FxConverted,
            _ => Self::Approximate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub account_type: String,
    pub institution: Option<String>,
    pub company: String,
    pub currency: String,
    pub last_four: Option<String>,
}

impl Account {
    pub fn polarity(&self) -> Polarity {
        Polarity::from_account_type(&self.account_type)
    }
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub category_type: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Statement {
    pub id: i64,
    pub account_id: i64,
    pub period_start: String,
    pub period_end: String,
    pub opening_balance: f64,
    pub closing_balance: f64,
    pub total_credits: f64,
    pub total_debits: f64,
    pub transaction_count: i64,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct TransferCandidate {
    pub id: i64,
    pub from_transaction_id: i64,
    pub to_transaction_id: i64,
    pub from_amount: f64,
    pub to_amount: f64,
    pub from_currency: String,
    pub to_currency: String,
    pub exchange_rate_used: Option<f64>,
    pub exchange_rate_source: Option<String>,
    pub date_diff_days: i64,
    pub is_cross_company: bool,
    pub amount_match_type: AmountMatchType,
    pub has_transfer_keywords: bool,
    pub confidence: i64,
    pub status: CandidateStatus,
    pub reject_reason: Option<String>,
    pub reviewed_at: Option<String>,
}

impl TransferCandidate {
    pub fn is_cross_currency(&self) -> bool {
        self.from_currency != self.to_currency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarity_from_credit_card_variants() {
        assert_eq!(Polarity::from_account_type("credit_card"), Polarity::Liability);
        assert_eq!(Polarity::from_account_type("Credit Card"), Polarity::Liability);
        assert_eq!(Polarity::from_account_type("CREDIT-CARD"), Polarity::Liability);
        assert_eq!(Polarity::from_account_type("line_of_credit"), Polarity::Liability);
    }

    #[test]
    fn polarity_defaults_to_asset() {
        assert_eq!(Polarity::from_account_type("checking"), Polarity::Asset);
        assert_eq!(Polarity::from_account_type("savings"), Polarity::Asset);
        assert_eq!(Polarity::from_account_type(""), Polarity::Asset);
        assert_eq!(Polarity::from_account_type("something_new"), Polarity::Asset);
    }

    #[test]
    fn direction_parse_accepts_aliases() {
        assert_eq!(Direction::parse("Credit"), Some(Direction::Credit));
        assert_eq!(Direction::parse("DR"), Some(Direction::Debit));
        assert_eq!(Direction::parse("withdrawal"), None);
    }

    #[test]
    fn link_type_round_trips() {
        for lt in [LinkType::TransferOut, LinkType::TransferIn] {
            assert_eq!(LinkType::parse(lt.as_str()), Some(lt));
        }
    }

    #[test]
    fn candidate_status_round_trips() {
        for st in [
            CandidateStatus::Pending,
            CandidateStatus::Confirmed,
            CandidateStatus::Rejected,
            CandidateStatus::AutoLinked,
        ] {
            assert_eq!(CandidateStatus::from_column(st.as_str()), st);
        }
    }

    #[test]
    fn cross_currency_flag() {
        let mut c = TransferCandidate {
            id: 1,
            from_transaction_id: 1,
            to_transaction_id: 2,
            from_amount: -100.0,
            to_amount: 137.0,
            from_currency: "USD".into(),
            to_currency: "CAD".into(),
            exchange_rate_used: None,
            exchange_rate_source: None,
            date_diff_days: 0,
            is_cross_company: false,
            amount_match_type: AmountMatchType::FxConverted,
            has_transfer_keywords: false,
            confidence: 0,
            status: CandidateStatus::Pending,
            reject_reason: None,
            reviewed_at: None,
        };
        assert!(c.is_cross_currency());
        c.to_currency = "USD".into();
        assert!(!c.is_cross_currency());
    }
}
