//! Backend collaborators consumed by the explorer.
//!
//! The explorer never builds queries itself. It talks to two async traits:
//!
//! - [`MetadataGateway`]: object and field discovery
//! - [`QueryGateway`]: row counts and paged, optionally filtered, row fetches
//!
//! [`InMemoryGateway`] implements both over a JSON fixture and backs the
//! command-line front end.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::model::{FieldName, FilterSpec, ObjectName, Row};

pub mod memory;

pub use memory::InMemoryGateway;

/// Number of rows returned by one page fetch.
///
/// The page size is fixed and implied by both sides; it is never sent with
/// a request.
pub const PAGE_SIZE: usize = 20;

/// Result type for gateway calls.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Supplies object names and, per object, field names.
#[async_trait]
pub trait MetadataGateway: Send + Sync {
    /// List all objects the user may browse, in display order.
    async fn list_objects(&self) -> GatewayResult<Vec<ObjectName>>;

    /// List the fields of one object, in display order.
    async fn list_fields(&self, object: &ObjectName) -> GatewayResult<Vec<FieldName>>;
}

/// Supplies row counts and paged row data.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// Count the rows of `object` matching `filter` (all rows when `None`).
    async fn count_rows(
        &self,
        object: &ObjectName,
        filter: Option<&FilterSpec>,
    ) -> GatewayResult<u64>;

    /// Fetch at most [`PAGE_SIZE`] rows starting at `offset`, projected to `fields`.
    async fn fetch_rows(
        &self,
        object: &ObjectName,
        fields: &[FieldName],
        filter: Option<&FilterSpec>,
        offset: usize,
    ) -> GatewayResult<Vec<Row>>;
}
