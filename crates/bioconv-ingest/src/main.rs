//! bioconv - convert biological source files into warehouse items

use bioconv_common::logging::init_logging;
use bioconv_ingest::cli::{run_cli, Cli};
use clap::Parser;
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_config = cli.log_config();

    // Items may go to stdout, so logs stay on stderr or in files
    let guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {:#}", e);
            None
        },
    };

    match run_cli(&cli).await {
        Ok(report) => info!(items = report.total_items(), "bioconv finished"),
        Err(e) => {
            error!(error = %e, "Conversion failed");
            eprintln!("Error: {:#}", e);
            drop(guard);
            process::exit(1);
        },
    }
}
