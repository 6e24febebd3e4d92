use clap::Parser;
use directories::ProjectDirs;
use serde_json::Value;
use shelf::config::ShelfConfig;
use shelf::error::{Result, ShelfError};
use shelf::logging::{FileLogger, Logger, TracingLogger};
use shelf::model::Entity;
use shelf::schedule::{run_backups, spawn_backup_task, spawn_log_cycle_task};
use shelf::services::Services;
use shelf::store::repository::SharedStore;
use shelf::store::{Pagination, Store, DEFAULT_FILE_PAGE_SIZE, DEFAULT_PAGE_SIZE};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod args;
mod print;
use args::{Action, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose || matches!(cli.command, Commands::Run));

    if let Err(e) = run(cli) {
        if e.status_code() == 500 {
            tracing::error!("{}", e);
        }
        eprintln!("Error: {}", e.public_message());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = ShelfConfig::from_env();
    let scheduled = matches!(cli.command, Commands::Run);
    let logger = build_logger(&config, scheduled);
    for warning in &config.warnings {
        logger.add_warning_log(warning);
    }
    let services = Services::open(&config, logger.as_ref());

    match cli.command {
        Commands::Notes { action } => handle(&services.notes, action, DEFAULT_PAGE_SIZE),
        Commands::Blog { action } => handle(&services.blog, action, DEFAULT_PAGE_SIZE),
        Commands::Files { action } => handle(&services.files, action, DEFAULT_FILE_PAGE_SIZE),
        Commands::Users { action } => handle(&services.vice_bank_users, action, DEFAULT_PAGE_SIZE),
        Commands::Deposits { action } => handle(&services.deposits, action, DEFAULT_PAGE_SIZE),
        Commands::Purchases { action } => handle(&services.purchases, action, DEFAULT_PAGE_SIZE),
        Commands::Backup => handle_backup(&services, logger.as_ref()),
        Commands::Run => handle_run(&services, &config, logger),
    }
}

/// `SHELF_LOG_PATH` wins. Without it, only `run` writes a log file, in the
/// per-user data directory, so that log cycling has something to cycle.
fn build_logger(config: &ShelfConfig, scheduled: bool) -> Arc<dyn Logger> {
    let path = config
        .log
        .path
        .clone()
        .or_else(|| if scheduled { default_log_path() } else { None });

    match path {
        Some(path) => Arc::new(
            FileLogger::new(path).with_rotation(config.log.max_bytes, config.log.generations),
        ),
        None => Arc::new(TracingLogger),
    }
}

fn default_log_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "shelf", "shelf")
        .map(|dirs| dirs.data_local_dir().join("logs").join("shelf.log"))
}

fn handle<E: Entity>(store: &SharedStore<E>, action: Action, default_page_size: usize) -> Result<()> {
    let mut store = store.lock();
    match action {
        Action::List {
            page,
            page_size,
            sort,
        } => {
            let pagination = Pagination::new(page, page_size.unwrap_or(0), default_page_size);
            let page = store.list(pagination, sort.into())?;
            print::print_page(&page, pagination);
        }
        Action::Get { key } => print::print_entity(&store.get(&key)?),
        Action::Add { json } => {
            let added = store.add(parse_body(&json))?;
            print::print_entity(&added);
        }
        Action::Update { json } => {
            let entity = E::from_json(&parse_body(&json))?;
            let updated = store.update(entity)?;
            print::print_entity(&updated);
        }
        Action::Delete { key } => {
            let removed = store.delete(&key)?;
            print::print_success(&format!("Deleted {} '{}'", E::LABEL, removed.key()));
        }
    }
    Ok(())
}

// Text that is not JSON is rejected like any other non-object body.
fn parse_body(json: &str) -> Value {
    serde_json::from_str(json).unwrap_or(Value::Null)
}

fn handle_backup(services: &Services, logger: &dyn Logger) -> Result<()> {
    let report = run_backups(&services.backup_jobs(), logger);
    print::print_backup_report(&report);
    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(ShelfError::Store(format!(
            "backup failed for {}",
            report.failed.join(", ")
        )))
    }
}

fn handle_run(services: &Services, config: &ShelfConfig, logger: Arc<dyn Logger>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ShelfError::Io)?;

    runtime.block_on(async {
        let backups = spawn_backup_task(
            services.backup_jobs(),
            config.backup_schedule,
            Arc::clone(&logger),
        );
        let cycling = spawn_log_cycle_task(Arc::clone(&logger), config.log.cycle_schedule);
        logger.add_log(&format!(
            "Backups {}, log cycling {}. Press Ctrl-C to stop.",
            config.backup_schedule, config.log.cycle_schedule
        ));

        let signal = tokio::signal::ctrl_c().await;
        backups.abort();
        cycling.abort();
        logger.add_log("Scheduled tasks stopped");
        signal.map_err(ShelfError::Io)
    })
}
