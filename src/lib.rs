//! Data export explorer library
//!
//! Pick an object from a backend, choose fields, load rows incrementally,
//! narrow them with a single LIKE-style filter, select rows and export them
//! as a spreadsheet or CSV document.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `explorer`: The stateful explorer controller
//! - `export`: Document rendering for selected rows
//! - `gateway`: Backend traits and the in-memory backend
//! - `model`: Identifiers, rows, values and filters
//! - `notify`: User-facing notifications
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use dataexport::{DataExplorer, InMemoryGateway, notify::TracingSink};
//!
//! #[tokio::main]
//! async fn main() -> dataexport::Result<()> {
//!     let gateway = InMemoryGateway::load(Path::new("accounts.json")).await?;
//!     let explorer = DataExplorer::from_gateway(gateway, Arc::new(TracingSink));
//!
//!     explorer.select_object("Account").await?;
//!     explorer.choose_fields(["Name", "Industry"]).await;
//!     explorer.fetch().await?;
//!     explorer.select_rows(&[0, 1]).await;
//!
//!     let document = explorer.export().await?;
//!     document.write_to(Path::new(".")).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod explorer;
pub mod export;
pub mod gateway;
pub mod model;
pub mod notify;

// Re-export commonly used types
pub use config::Config;
pub use error::{ExplorerError, Result};
pub use explorer::{DataExplorer, FilterOutcome, PageOutcome};
pub use export::{ExportDocument, ExportFormat, TableExporter};
pub use gateway::{InMemoryGateway, MetadataGateway, QueryGateway};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}
