use budgettrackr_sync::args::{
    Args, BudgetCommand, CategoryCommand, Command, SettingsCommand, SyncCommand,
};
use budgettrackr_sync::{commands, Config, Mode, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let config = Config::open(args.common().budget_home().path()).await?;

    // When BUDGETTRACKR_IN_TEST_MODE is set and non-zero in length the remote service is replaced
    // by an in-memory one, otherwise HTTP is used.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Budget(budget_args) => match budget_args.command() {
            BudgetCommand::List(list) => commands::budget_list(config, mode, list).await?.print(),
            BudgetCommand::Add(add) => commands::budget_add(config, mode, add).await?.print(),
            BudgetCommand::Update(update) => {
                commands::budget_update(config, mode, update).await?.print()
            }
            BudgetCommand::Delete(id) => commands::budget_delete(config, mode, id).await?.print(),
        },

        Command::Category(category_args) => match category_args.command() {
            CategoryCommand::List => commands::category_list(config, mode).await?.print(),
            CategoryCommand::Add(name) => {
                commands::category_add(config, mode, name).await?.print()
            }
            CategoryCommand::Delete(name) => {
                commands::category_delete(config, mode, name).await?.print()
            }
        },

        Command::Settings(settings_args) => match settings_args.command() {
            SettingsCommand::Show => commands::settings_show(config, mode).await?.print(),
            SettingsCommand::Set(set) => commands::settings_set(config, mode, set).await?.print(),
        },

        Command::Sync(sync_args) => match sync_args.command() {
            SyncCommand::Status => commands::sync_status(config, mode).await?.print(),
            SyncCommand::Enable => commands::sync_enable(config, mode).await?.print(),
            SyncCommand::Disable => commands::sync_disable(config, mode).await?.print(),
            SyncCommand::Pull => commands::sync_pull(config, mode).await?.print(),
            SyncCommand::Url(url) => commands::sync_url(config, mode, url.url()).await?.print(),
        },

        Command::Stats(stats_args) => commands::stats(config, mode, stats_args).await?.print(),

        Command::Export(export_args) => {
            commands::export(config, mode, export_args).await?.print()
        }

        Command::Import(import_args) => {
            commands::import(config, mode, import_args).await?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the default log level for the library and this binary.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
