use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReckonError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown statement: {0}")]
    UnknownStatement(i64),

    #[error("Unknown transfer candidate: {0}")]
    UnknownCandidate(i64),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Candidate {id} is {status}, not pending")]
    CandidateNotPending { id: i64, status: String },

    /// One leg of a transfer confirmation did not update. The surrounding
    /// transaction is rolled back, so neither transaction is left half-linked,
    /// but the caller must know this was a consistency failure and not a
    /// generic save error.
    #[error(
        "transfer link for candidate {candidate_id} is inconsistent: \
         {side} transaction {transaction_id} was not updated (rolled back)"
    )]
    LinkInconsistency {
        candidate_id: i64,
        side: &'static str,
        transaction_id: i64,
    },

    #[error("Duplicate import: {0} was already imported into this account")]
    DuplicateImport(String),

    #[error("Invalid row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ReckonError>;
