pub mod accounts;
pub mod backup;
pub mod demo;
pub mod import;
pub mod init;
pub mod reconcile;
pub mod register;
pub mod review;
pub mod statements;
pub mod status;
pub mod transfer_review;
pub mod transfers;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "reckon",
    about = "Back-office CLI for bank statement reconciliation and transfer review."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Reckon: choose a data directory and initialize the database.
    Init {
        /// Path for Reckon data (default: ~/Documents/reckon)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage bank accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Import a parsed statement file (JSON or normalized CSV).
    Import {
        /// Path to the parse-function output file
        file: String,
        /// Account name to import into
        #[arg(long)]
        account: String,
        /// Statement opening balance
        #[arg(long)]
        opening: f64,
        /// Statement closing balance as reported by the bank
        #[arg(long)]
        closing: f64,
        /// Period start: YYYY-MM-DD (default: earliest row date)
        #[arg(long = "period-start")]
        period_start: Option<String>,
        /// Period end: YYYY-MM-DD (default: latest row date)
        #[arg(long = "period-end")]
        period_end: Option<String>,
    },
    /// List imported statements with their latest reconciliation verdict.
    Statements {
        /// Filter by account name
        #[arg(long)]
        account: Option<String>,
    },
    /// Recompute running balances for a statement and check its closing balance.
    Reconcile {
        /// Statement ID (shown in `reckon statements`)
        #[arg(long)]
        statement: i64,
    },
    /// List transactions for a date period.
    Register {
        /// Filter by account name
        #[arg(long)]
        account: Option<String>,
        /// Start date: YYYY-MM-DD
        #[arg(long = "from")]
        from_date: Option<String>,
        /// End date: YYYY-MM-DD
        #[arg(long = "to")]
        to_date: Option<String>,
        /// Only transactions awaiting review
        #[arg(long = "needs-review")]
        needs_review: bool,
        /// Only transactions not linked as transfers
        #[arg(long)]
        unlinked: bool,
        /// Maximum rows to show
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Interactively review transactions awaiting categorization.
    Review,
    /// Detect and review inter-account transfer candidates.
    Transfers {
        #[command(subcommand)]
        command: TransfersCommands,
    },
    /// Show current database and summary statistics.
    Status,
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/reckon-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Load deterministic sample data to explore Reckon.
    Demo,
    /// Generate shell completions.
    Completions {
        /// Shell to generate for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account.
    Add {
        /// Account name, e.g. 'Operating Checking'
        name: String,
        /// Account type: checking, savings, credit_card, line_of_credit
        #[arg(long = "type")]
        account_type: String,
        /// Institution name
        #[arg(long)]
        institution: Option<String>,
        /// Owning company (drives cross-company transfer flags)
        #[arg(long)]
        company: Option<String>,
        /// ISO currency code (default: settings default)
        #[arg(long)]
        currency: Option<String>,
        /// Last 4 digits of account number
        #[arg(long = "last-four")]
        last_four: Option<String>,
    },
    /// List all accounts.
    List,
}

#[derive(Subcommand)]
pub enum TransfersCommands {
    /// Scan unlinked transactions for plausible transfer pairs.
    Detect,
    /// List transfer candidates.
    List {
        /// Filter by status: pending, confirmed, rejected, auto_linked
        #[arg(long)]
        status: Option<String>,
    },
    /// Confirm a pending candidate, linking both legs.
    Confirm {
        /// Candidate ID (shown in `reckon transfers list`)
        id: i64,
    },
    /// Reject a pending candidate.
    Reject {
        /// Candidate ID (shown in `reckon transfers list`)
        id: i64,
        /// Why this is not a transfer
        #[arg(long)]
        reason: Option<String>,
    },
    /// Interactively review pending candidates.
    Review,
}
