use clap::Parser;
use expense_engine::args::{
    Args, Command, DeleteSubcommand, InsertSubcommand, MappingsSubcommand, OwnerSubcommand,
    UpdateSubcommand,
};
use expense_engine::auth::AuthContext;
use expense_engine::{commands, find_pub_error, Config, Result};
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
            match find_pub_error(&e) {
                Some(p) => error!("Exiting with error {}: {}", p.status(), p.body()),
                None => error!("Exiting with error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    // Setup commands do not act on behalf of an owner.
    match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.top_n()).await?.print();
            return Ok(());
        }
        Command::Owner(OwnerSubcommand::Add(owner_args)) => {
            let config = Config::load(home).await?;
            commands::add_owner(config, owner_args.clone())
                .await?
                .print();
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load(home).await?;
    let auth = config.authenticate(args.common().token()).await?;
    debug!("Acting as owner '{}'", auth.owner_name());
    let engine = config.engine().clone();

    let result = run_owner_command(config, &auth, args.command()).await;

    // Sweeps started by the command run in the background; let them finish before exiting.
    engine.wait_for_sweeps().await;
    result
}

async fn run_owner_command(
    config: Config,
    auth: &AuthContext,
    command: &Command,
) -> Result<()> {
    let _: () = match command {
        // Handled in main_inner before authentication.
        Command::Init(_) | Command::Owner(_) => {}

        Command::Categories => commands::list_categories(config, auth).await?.print(),

        Command::Mappings(mappings) => match mappings {
            MappingsSubcommand::List => commands::list_mappings(config, auth).await?.print(),
            MappingsSubcommand::Add(args) => commands::add_mapping(config, auth, args.clone())
                .await?
                .print(),
        },

        Command::Insert(insert) => match insert {
            InsertSubcommand::Account(args) => commands::insert_account(config, auth, args.clone())
                .await?
                .print(),
            InsertSubcommand::Category(args) => {
                commands::insert_category(config, auth, args.clone())
                    .await?
                    .print()
            }
            InsertSubcommand::Transaction(args) => {
                commands::insert_transaction(config, auth, args.clone())
                    .await?
                    .print()
            }
        },

        Command::Delete(DeleteSubcommand::Category(args)) => {
            commands::delete_category(config, auth, args.clone())
                .await?
                .print()
        }

        Command::Update(UpdateSubcommand::Transaction(args)) => {
            commands::update_transaction(config, auth, args.clone())
                .await?
                .print()
        }

        Command::Accounts => commands::list_accounts(config, auth).await?.print(),

        Command::Transactions(args) => {
            commands::list_transactions(config, auth, args.clone())
                .await?
                .print()
        }

        Command::Summary(args) => commands::summary(config, auth, args.clone()).await?.print(),

        Command::Sweep => commands::sweep(config, auth).await?.print(),

        Command::Mcp => commands::mcp(config, auth.clone()).await?.print(),
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
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "expense_engine={},{}={}",
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
