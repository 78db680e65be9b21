use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use evsync::storage::Config;

mod cli;
use cli::{run, Cli};

#[tokio::main]
async fn main() {
    let guard = setup_logging();
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(err) = &result {
        eprintln!("Error: {:#}", err);
        tracing::error!("Command failed: {:#}", err);
    }

    // flush the log writer before exiting
    drop(guard);
    if result.is_err() {
        std::process::exit(1);
    }
}

fn setup_logging() -> WorkerGuard {
    let log_dir = Config::config_dir();

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "evsync.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env("EVSYNC_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .init();

    tracing::info!("evsync started");
    guard
}
