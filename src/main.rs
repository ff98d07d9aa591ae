mod cli;
mod db;
mod detector;
mod error;
mod fmt;
mod importer;
mod models;
mod query;
mod reconciler;
mod reviewer;
mod scorer;
mod settings;
mod transfers;
mod tui;

use clap::{CommandFactory, Parser};

use cli::{AccountsCommands, Cli, Commands, TransfersCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Accounts { command } => match command {
            AccountsCommands::Add {
                name,
                account_type,
                institution,
                company,
                currency,
                last_four,
            } => cli::accounts::add(
                &name,
                &account_type,
                institution.as_deref(),
                company.as_deref(),
                currency.as_deref(),
                last_four.as_deref(),
            ),
            AccountsCommands::List => cli::accounts::list(),
        },
        Commands::Import {
            file,
            account,
            opening,
            closing,
            period_start,
            period_end,
        } => cli::import::run(&file, &account, opening, closing, period_start, period_end),
        Commands::Statements { account } => cli::statements::list(account.as_deref()),
        Commands::Reconcile { statement } => cli::reconcile::run(statement),
        Commands::Register {
            account,
            from_date,
            to_date,
            needs_review,
            unlinked,
            limit,
        } => cli::register::run(
            account.as_deref(),
            from_date,
            to_date,
            needs_review,
            unlinked,
            limit,
        ),
        Commands::Review => cli::review::run(),
        Commands::Transfers { command } => match command {
            TransfersCommands::Detect => cli::transfers::detect(),
            TransfersCommands::List { status } => cli::transfers::list(status.as_deref()),
            TransfersCommands::Confirm { id } => cli::transfers::confirm(id),
            TransfersCommands::Reject { id, reason } => {
                cli::transfers::reject(id, reason.as_deref())
            }
            TransfersCommands::Review => cli::transfer_review::run(),
        },
        Commands::Status => cli::status::run(),
        Commands::Backup { output } => cli::backup::run(output),
        Commands::Demo => cli::demo::run(),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "reckon", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
