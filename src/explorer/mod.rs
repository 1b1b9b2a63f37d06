//! Stateful data explorer.
//!
//! [`DataExplorer`] coordinates object/field discovery, incremental loading,
//! filtering with restore, row selection and export. It is a cheap `Clone`
//! handle over one [`SessionState`]; the session lock is never held while a
//! gateway call is awaited.
//!
//! State machine:
//!
//! ```text
//! Idle -> ObjectChosen -> FieldsChosen -> Loading -> Loaded (-> Filtering -> Filtered)* -> Exhausted
//! ```
//!
//! Choosing an object or fields starts a new generation. Requests issued by
//! an older generation are cancelled, and a response that still arrives is
//! discarded instead of being applied.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use dataexport::explorer::{DataExplorer, PageOutcome};
//! use dataexport::gateway::InMemoryGateway;
//! use dataexport::model::Row;
//! use dataexport::notify::TracingSink;
//!
//! # tokio_test::block_on(async {
//! let gateway = InMemoryGateway::new().with_object(
//!     "Account",
//!     ["Name"],
//!     vec![Row::from_iter([("Name", "Acme")])],
//! );
//! let explorer = DataExplorer::from_gateway(gateway, Arc::new(TracingSink));
//!
//! explorer.select_object("Account").await.unwrap();
//! explorer.choose_fields(["Name"]).await;
//! let outcome = explorer.fetch().await.unwrap();
//! assert!(matches!(outcome, PageOutcome::Loaded { appended: 1, .. }));
//!
//! explorer.select_rows(&[0]).await;
//! let doc = explorer.export().await.unwrap();
//! assert_eq!(doc.file_name, "Account.xls");
//! # });
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{GatewayError, Result};
use crate::export::{ExportDocument, ExportFormat, TableExporter};
use crate::gateway::{GatewayResult, MetadataGateway, PAGE_SIZE, QueryGateway};
use crate::model::{
    Column, Dataset, FieldName, FieldSelection, FilterSpec, ObjectName, Operator, Row,
};
use crate::notify::{Notification, NotificationKind, NotificationSink};

pub mod columns;
pub mod filter;
pub mod pagination;
pub mod selection;
pub mod session;

#[cfg(test)]
mod tests;

pub use columns::{ColumnModel, derive_columns};
pub use filter::{FilterController, ViewSnapshot};
pub use pagination::{LoadStatus, PageResult, PageStep, PaginationController};
pub use selection::SelectionTracker;
pub use session::{ExplorerState, RequestTag, SessionState};

/// Result of a fetch or load-more request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// A page was loaded; `total_rows` is the dataset size afterwards
    Loaded { appended: usize, total_rows: usize },
    /// No fields are chosen; nothing was requested
    NoFieldsSelected,
    /// The backend holds no rows for this view
    NoRecords,
    /// Every row has been loaded; the load-more control should be disabled
    Exhausted,
    /// Another request is in flight; nothing was requested
    Busy,
    /// The session changed while the request was in flight; its result was dropped
    Discarded,
}

/// Result of applying a filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// The dataset now holds exactly the filtered page
    Applied { rows: usize },
    /// Field or operator missing; nothing was requested
    Skipped,
    /// Another request is in flight; nothing was requested
    Busy,
    /// The session changed while the request was in flight; its result was dropped
    Discarded,
}

/// Read-only copy of the session for rendering
#[derive(Debug, Clone)]
pub struct SessionView {
    pub state: ExplorerState,
    pub generation: u64,
    pub objects: Vec<ObjectName>,
    pub object: Option<ObjectName>,
    pub field_options: Vec<FieldName>,
    pub fields: FieldSelection,
    pub columns: Vec<Column>,
    pub filter_fields: Vec<FieldName>,
    pub active_filter: Option<FilterSpec>,
    pub dataset: Dataset,
    pub offset: usize,
    pub total_count: Option<u64>,
    pub load_status: LoadStatus,
    pub selected: usize,
    pub loading: bool,
}

/// Orchestrates the explorer sub-controllers over one session
#[derive(Clone)]
pub struct DataExplorer {
    metadata: Arc<dyn MetadataGateway>,
    query: Arc<dyn QueryGateway>,
    notifier: Arc<dyn NotificationSink>,
    exporter: TableExporter,
    session: Arc<Mutex<SessionState>>,
}

impl DataExplorer {
    pub fn new(
        metadata: Arc<dyn MetadataGateway>,
        query: Arc<dyn QueryGateway>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            metadata,
            query,
            notifier,
            exporter: TableExporter::default(),
            session: Arc::new(Mutex::new(SessionState::new(PAGE_SIZE))),
        }
    }

    /// Build from one backend implementing both gateways.
    pub fn from_gateway<G>(gateway: G, notifier: Arc<dyn NotificationSink>) -> Self
    where
        G: MetadataGateway + QueryGateway + 'static,
    {
        let gateway = Arc::new(gateway);
        Self::new(gateway.clone(), gateway, notifier)
    }

    pub fn with_export_format(mut self, format: ExportFormat) -> Self {
        self.exporter = TableExporter::new(format);
        self
    }

    /// Load and cache the object list.
    pub async fn load_objects(&self) -> Result<Vec<ObjectName>> {
        let objects = self.metadata.list_objects().await.map_err(|e| {
            error!("Failed to list objects: {}", e);
            e
        })?;
        debug!("Backend offers {} object(s)", objects.len());
        self.session.lock().await.objects = objects.clone();
        Ok(objects)
    }

    /// Choose an object and look up its fields.
    ///
    /// The previous session is discarded before the lookup is issued.
    pub async fn select_object(&self, object: impl Into<ObjectName>) -> Result<Vec<FieldName>> {
        let object = object.into();
        let (tag, token) = {
            let mut session = self.session.lock().await;
            session.begin_object(object.clone());
            info!("Object selected: {}", object);
            (session.tag(), session.request_token())
        };

        let result = guarded(token, self.metadata.list_fields(&object)).await;

        let mut session = self.session.lock().await;
        if !session.is_current(&tag) {
            debug!("Discarding field list for {} from stale request {}", object, tag);
            return Err(GatewayError::Cancelled.into());
        }
        match result {
            Ok(fields) => {
                session.field_options = fields.clone();
                Ok(fields)
            }
            Err(e) => {
                error!("Failed to list fields of {}: {}", object, e);
                Err(e.into())
            }
        }
    }

    /// Choose the fields to display.
    ///
    /// Rebuilds the columns and the filterable field list; returns the columns.
    pub async fn choose_fields<I, F>(&self, fields: I) -> Vec<Column>
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldName>,
    {
        let selection = FieldSelection::new(fields);
        let mut session = self.session.lock().await;
        if session.object.is_none() {
            warn!("Fields chosen before any object; ignoring");
            return Vec::new();
        }
        session.begin_fields(selection);
        debug!("{} field(s) selected", session.fields.len());
        session.columns.columns().to_vec()
    }

    pub async fn choose_filter_field(&self, field: impl Into<FieldName>) -> bool {
        self.session.lock().await.filter.choose_field(field.into())
    }

    pub async fn choose_operator(&self, operator: Operator) {
        self.session.lock().await.filter.choose_operator(operator);
    }

    pub async fn set_filter_expression(&self, expression: impl Into<String>) {
        self.session.lock().await.filter.set_expression(expression);
    }

    /// Load the first page of the current object, unfiltered.
    ///
    /// Starts pagination over at offset 0 and drops any active filter.
    pub async fn fetch(&self) -> Result<PageOutcome> {
        self.request_page(PageRequest::Restart).await
    }

    /// Load the next page of the current view.
    ///
    /// The offset advances before the request and is not rolled back if the
    /// request fails. Falls back to [`fetch`](Self::fetch) when nothing has
    /// been loaded yet.
    pub async fn load_more(&self) -> Result<PageOutcome> {
        let started = {
            let session = self.session.lock().await;
            session.pagination.total_count().is_some() || session.filter.is_active()
        };
        if started {
            self.request_page(PageRequest::Advance).await
        } else {
            self.request_page(PageRequest::Restart).await
        }
    }

    async fn request_page(&self, request: PageRequest) -> Result<PageOutcome> {
        let (tag, token, object, fields, filter, mut pagination, previous) = {
            let mut session = self.session.lock().await;
            if session.loading {
                debug!("Page request ignored: another request is in flight");
                return Ok(PageOutcome::Busy);
            }
            let object = match session.object.clone() {
                Some(object) if !session.fields.is_empty() => object,
                _ => {
                    self.notifier
                        .notify(Notification::new(NotificationKind::NoFieldsSelected));
                    return Ok(PageOutcome::NoFieldsSelected);
                }
            };
            if request == PageRequest::Advance && session.pagination.is_exhausted() {
                return Ok(PageOutcome::Exhausted);
            }

            let mut pagination = session.pagination.clone();
            let filter = match request {
                PageRequest::Restart => {
                    pagination.reset();
                    None
                }
                PageRequest::Advance => {
                    pagination.advance();
                    session.filter.active().cloned()
                }
            };

            let previous = session.state;
            session.loading = true;
            session.state = ExplorerState::Loading;
            (
                session.tag(),
                session.request_token(),
                object,
                session.fields.clone(),
                filter,
                pagination,
                previous,
            )
        };

        debug!(
            "Requesting page at offset {} for {} ({})",
            pagination.offset(),
            object,
            tag
        );
        let result = guarded(
            token,
            pagination.request_next_page(self.query.as_ref(), &object, &fields, filter.as_ref()),
        )
        .await;

        let mut session = self.session.lock().await;
        if !session.is_current(&tag) {
            debug!("Discarding page for {} from stale request {}", object, tag);
            return Ok(PageOutcome::Discarded);
        }
        session.loading = false;

        match result {
            Ok(PageResult::Page { offset, rows }) => {
                let appended = rows.len();
                if offset == 0 {
                    session.dataset = Dataset::from(rows);
                } else {
                    session.dataset.append(rows);
                }
                session.pagination = pagination;
                if request == PageRequest::Restart {
                    session.filter.clear_results();
                }
                if filter.is_none() {
                    session.capture_unfiltered();
                    session.state = ExplorerState::Loaded;
                } else {
                    session.state = ExplorerState::Filtered;
                }
                let total_rows = session.dataset.len();
                info!("Loaded {} row(s) of {} ({} shown)", appended, object, total_rows);
                Ok(PageOutcome::Loaded {
                    appended,
                    total_rows,
                })
            }
            Ok(PageResult::NoRecords) => {
                if request == PageRequest::Restart {
                    session.dataset.clear();
                    session.filter.clear_results();
                }
                session.pagination = pagination;
                session.state = if filter.is_some() {
                    ExplorerState::Filtered
                } else {
                    ExplorerState::Loaded
                };
                self.notifier
                    .notify(Notification::new(NotificationKind::NoRecordsFound));
                Ok(PageOutcome::NoRecords)
            }
            Ok(PageResult::Exhausted) => {
                session.pagination = pagination;
                if request == PageRequest::Advance && filter.is_none() {
                    session.capture_unfiltered();
                }
                session.state = ExplorerState::Exhausted;
                info!("No more data to load for {}", object);
                Ok(PageOutcome::Exhausted)
            }
            Err(e) => {
                if request == PageRequest::Advance {
                    session.pagination = pagination;
                    if filter.is_none() {
                        session.capture_unfiltered();
                    }
                }
                session.state = previous;
                error!("Failed to load page of {}: {}", object, e);
                Err(e.into())
            }
        }
    }

    /// Apply the filter composed from the current filter inputs.
    ///
    /// Replaces the dataset with the first filtered page. Does nothing when
    /// the filter field or the operator is missing.
    pub async fn apply_filter(&self) -> Result<FilterOutcome> {
        let (tag, token, object, fields, spec, previous) = {
            let mut session = self.session.lock().await;
            if session.loading {
                debug!("Filter request ignored: another request is in flight");
                return Ok(FilterOutcome::Busy);
            }
            let (Some(spec), Some(object)) = (session.filter.pending_spec(), session.object.clone())
            else {
                debug!("Filter not applied: field or operator missing");
                return Ok(FilterOutcome::Skipped);
            };
            let previous = session.state;
            session.loading = true;
            session.state = ExplorerState::Filtering;
            (
                session.tag(),
                session.request_token(),
                object,
                session.fields.clone(),
                spec,
                previous,
            )
        };

        info!("Applying filter on {}: {}", object, spec);
        let result = guarded(
            token,
            FilterController::fetch_filtered(self.query.as_ref(), &object, &fields, &spec),
        )
        .await;

        let mut session = self.session.lock().await;
        if !session.is_current(&tag) {
            debug!("Discarding filtered page for {} from stale request {}", object, tag);
            return Ok(FilterOutcome::Discarded);
        }
        session.loading = false;

        match result {
            Ok(rows) => {
                let count = rows.len();
                session.dataset = Dataset::from(rows);
                session.pagination.reset();
                session.filter.activate(spec);
                session.state = ExplorerState::Filtered;
                Ok(FilterOutcome::Applied { rows: count })
            }
            Err(e) => {
                session.state = previous;
                error!("Failed to apply filter on {}: {}", object, e);
                Err(e.into())
            }
        }
    }

    /// Restore the unfiltered view captured before filtering.
    ///
    /// Never contacts the backend. Returns `false`, changing nothing, when no
    /// filter is active or a request is in flight. A filter applied before
    /// any unfiltered page was loaded has nothing to restore.
    pub async fn clear_filter(&self) -> bool {
        let mut session = self.session.lock().await;
        if session.loading {
            return false;
        }
        if !session.filter.is_active() {
            debug!("Clear filter ignored: no filter applied");
            return false;
        }
        let Some(snapshot) = session.filter.restore() else {
            debug!("Clear filter ignored: no unfiltered data captured");
            return false;
        };
        session.dataset = snapshot.dataset;
        session.pagination = snapshot.pagination;
        session.state = if session.pagination.is_exhausted() {
            ExplorerState::Exhausted
        } else {
            ExplorerState::Loaded
        };
        debug!("Filter cleared; {} row(s) restored", session.dataset.len());
        true
    }

    /// Replace the selection with the rows at the given table positions.
    ///
    /// Positions outside the dataset are skipped; returns how many rows are selected.
    pub async fn select_rows(&self, positions: &[usize]) -> usize {
        let mut session = self.session.lock().await;
        let rows: Vec<Arc<Row>> = positions
            .iter()
            .filter_map(|&i| session.dataset.get(i).cloned())
            .collect();
        session.selection.set_selection(rows);
        session.selection.len()
    }

    /// Replace the selection with the given row references.
    pub async fn set_selection(&self, rows: Vec<Arc<Row>>) {
        self.session.lock().await.selection.set_selection(rows);
    }

    pub async fn current_selection(&self) -> Vec<Arc<Row>> {
        self.session.lock().await.selection.current_selection().to_vec()
    }

    /// Export the selected rows that are still in the dataset.
    ///
    /// An empty selection notifies the user and fails with
    /// [`ExportError::EmptySelection`](crate::error::ExportError::EmptySelection).
    pub async fn export(&self) -> Result<ExportDocument> {
        let (object, columns, selected) = {
            let session = self.session.lock().await;
            (
                session.object.clone(),
                session.columns.columns().to_vec(),
                session.selection.retained_in(&session.dataset),
            )
        };

        let object = object.unwrap_or_else(|| ObjectName::from("export"));
        match self.exporter.export(&object, &columns, &selected) {
            Err(e) if e.is_empty_selection() => {
                self.notifier
                    .notify(Notification::new(NotificationKind::NoRowsSelectedForExport));
                Err(e)
            }
            other => other,
        }
    }

    pub async fn state(&self) -> ExplorerState {
        self.session.lock().await.state
    }

    pub async fn dataset(&self) -> Dataset {
        self.session.lock().await.dataset.clone()
    }

    pub async fn offset(&self) -> usize {
        self.session.lock().await.pagination.offset()
    }

    /// Copy out everything a renderer needs.
    pub async fn view(&self) -> SessionView {
        let session = self.session.lock().await;
        SessionView {
            state: session.state,
            generation: session.generation(),
            objects: session.objects.clone(),
            object: session.object.clone(),
            field_options: session.field_options.clone(),
            fields: session.fields.clone(),
            columns: session.columns.columns().to_vec(),
            filter_fields: session.filter.eligible_fields().to_vec(),
            active_filter: session.filter.active().cloned(),
            dataset: session.dataset.clone(),
            offset: session.pagination.offset(),
            total_count: session.pagination.total_count(),
            load_status: session.pagination.status(),
            selected: session.selection.len(),
            loading: session.loading,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageRequest {
    Restart,
    Advance,
}

/// Run a gateway call unless the session's token fires first.
async fn guarded<T, F>(token: CancellationToken, call: F) -> GatewayResult<T>
where
    F: Future<Output = GatewayResult<T>>,
{
    tokio::select! {
        result = call => result,
        _ = token.cancelled() => Err(GatewayError::Cancelled),
    }
}
