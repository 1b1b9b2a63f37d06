//! Offset-based incremental loading.
//!
//! One fetch session counts the rows once, then serves fixed-size pages.
//! Load-more advances the offset *before* the page is requested, and a
//! failed request does not roll it back: the next load-more continues past
//! the page that failed.

use tracing::debug;

use crate::error::GatewayError;
use crate::gateway::{PAGE_SIZE, QueryGateway};
use crate::model::{FieldSelection, FilterSpec, ObjectName, Row};

/// Loading affordance shown under the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    NoMoreData,
}

impl LoadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LoadStatus::Idle => "",
            LoadStatus::Loading => "Loading...",
            LoadStatus::NoMoreData => "No more data to load",
        }
    }
}

/// What the next page request has to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    /// Total is unknown; count first
    Count,
    /// Fetch the page starting at `offset`
    Fetch { offset: usize },
    /// Nothing left to load
    Exhausted,
}

/// Outcome of one page request
#[derive(Debug, Clone, PartialEq)]
pub enum PageResult {
    /// The selection is empty or the backend holds no rows
    NoRecords,
    /// The offset is past the total, or the backend returned an empty page
    Exhausted,
    /// A page fetched at `offset`
    Page { offset: usize, rows: Vec<Row> },
}

/// Owns offset, page size, total count and termination for one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationController {
    page_size: usize,
    offset: usize,
    total_count: Option<u64>,
    exhausted: bool,
    status: LoadStatus,
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl PaginationController {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            offset: 0,
            total_count: None,
            exhausted: false,
            status: LoadStatus::Idle,
        }
    }

    /// Start a new fetch session at offset 0 with an unknown total.
    pub fn reset(&mut self) {
        *self = Self::new(self.page_size);
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    /// Load-more: move the offset one page forward.
    pub fn advance(&mut self) -> usize {
        self.offset += self.page_size;
        self.offset
    }

    pub fn next_step(&self) -> PageStep {
        match self.total_count {
            _ if self.exhausted => PageStep::Exhausted,
            None => PageStep::Count,
            Some(total) if self.offset as u64 > total => PageStep::Exhausted,
            Some(_) => PageStep::Fetch {
                offset: self.offset,
            },
        }
    }

    pub fn record_count(&mut self, total: u64) {
        self.total_count = Some(total);
    }

    pub fn mark_exhausted(&mut self) {
        self.exhausted = true;
        self.status = LoadStatus::NoMoreData;
    }

    /// Request the page at the current offset, counting first if needed.
    pub async fn request_next_page(
        &mut self,
        query: &dyn QueryGateway,
        object: &ObjectName,
        fields: &FieldSelection,
        filter: Option<&FilterSpec>,
    ) -> Result<PageResult, GatewayError> {
        if fields.is_empty() {
            return Ok(PageResult::NoRecords);
        }

        self.status = LoadStatus::Loading;
        let result = self.run_step(query, object, fields, filter).await;
        if self.status == LoadStatus::Loading {
            self.status = LoadStatus::Idle;
        }
        result
    }

    async fn run_step(
        &mut self,
        query: &dyn QueryGateway,
        object: &ObjectName,
        fields: &FieldSelection,
        filter: Option<&FilterSpec>,
    ) -> Result<PageResult, GatewayError> {
        if self.next_step() == PageStep::Count {
            let total = query.count_rows(object, filter).await?;
            debug!("{} has {} row(s) matching the current view", object, total);
            self.record_count(total);
        }

        if self.total_count == Some(0) {
            return Ok(PageResult::NoRecords);
        }

        match self.next_step() {
            PageStep::Fetch { offset } => {
                let rows = query
                    .fetch_rows(object, fields.as_slice(), filter, offset)
                    .await?;
                if rows.is_empty() {
                    self.mark_exhausted();
                    return Ok(PageResult::Exhausted);
                }
                debug!("Fetched {} row(s) at offset {}", rows.len(), offset);
                Ok(PageResult::Page { offset, rows })
            }
            _ => {
                self.mark_exhausted();
                Ok(PageResult::Exhausted)
            }
        }
    }
}
