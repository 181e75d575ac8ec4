mod run;
mod telegram;

use clap::Parser;
use spoke_core::config::{self, Config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "spoke",
    about = "Conversational bicycle-inspection collection bot for Telegram",
    version
)]
struct Cli {
    /// CSV file backing the record store
    #[arg(long, env = "SPOKE_DATA_FILE", default_value = config::DEFAULT_DATA_FILE)]
    data_file: PathBuf,

    /// Long-poll window in seconds
    #[arg(long, default_value_t = config::DEFAULT_POLL_TIMEOUT_SECS)]
    poll_timeout: u64,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let result = Config::from_env(cli.data_file, cli.poll_timeout)
        .map_err(anyhow::Error::from)
        .and_then(run::run);

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
