//! cql-pager replay tool
//!
//! Pages through a recorded query result with a fetch coordinator.
//!
//! # Usage
//!
//! ```bash
//! # Read four rows, then the rest, three rows per page
//! cql-pager replay rows.jsonl --page-size 3 --op several:4 --op all
//! ```

use std::io;

use cql_pager::cli::CliInterface;
use cql_pager::error::Result;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Run the selected subcommand
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli.run(&mut out).await
}

/// Initialize logging based on verbosity and configuration
fn initialize_logging(cli: &CliInterface) {
    // Logs go to stderr so replayed rows can be piped
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_target(false)
        .with_writer(io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
