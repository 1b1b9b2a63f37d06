//! dataexport - browse backend objects and export selected rows
//!
//! # Usage
//!
//! ```bash
//! # List objects of a fixture
//! dataexport --data accounts.json objects
//!
//! # Load two pages, filter, export rows 0 and 3 as CSV
//! dataexport --data accounts.json --format csv export Account \
//!     --fields Name,Industry --pages 2 \
//!     --filter-on Industry --operator contains --expression Tech \
//!     --rows 0,3
//! ```

use dataexport::cli::CliInterface;
use dataexport::error::Result;

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
/// 3. Handle informational subcommands or drive the explorer
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_subcommand().await? {
        return Ok(());
    }

    cli.run().await
}

/// Initialize logging system based on verbosity level
///
/// `RUST_LOG` directives take precedence over the configured level.
fn initialize_logging(cli: &CliInterface) {
    let directives = std::env::var("RUST_LOG").ok();
    let filter = cli.config().logging.level.env_filter(directives.as_deref());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
