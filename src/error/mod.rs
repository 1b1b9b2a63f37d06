//! Error handling module for dataexport.
//!
//! Errors fall into three families:
//! - Gateway errors raised by the metadata/query backend
//! - Export errors raised while rendering or writing a document
//! - Configuration errors raised while loading settings
//!
//! User-facing warnings (no fields selected, no records found) are not
//! errors; they travel as notifications. See [`crate::notify`].
//!
//! # Example
//!
//! ```rust
//! use dataexport::error::{ExportError, Result};
//!
//! fn export_nothing() -> Result<()> {
//!     Err(ExportError::EmptySelection.into())
//! }
//!
//! assert!(export_nothing().unwrap_err().is_empty_selection());
//! ```

pub mod kinds;

pub use kinds::{ConfigError, ExplorerError, ExportError, GatewayError, Result};
