//! The explorer's single mutable aggregate.
//!
//! Every user action and every request completion goes through
//! [`SessionState`]. Object and field changes start a new *generation*:
//! the generation counter is bumped and the previous generation's
//! cancellation token fires, so in-flight requests either stop early or
//! have their response discarded when they come back.

use std::fmt;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::columns::ColumnModel;
use super::filter::FilterController;
use super::pagination::PaginationController;
use super::selection::SelectionTracker;
use crate::model::{Dataset, FieldName, FieldSelection, ObjectName};

/// Where the explorer is in its workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExplorerState {
    #[default]
    Idle,
    ObjectChosen,
    FieldsChosen,
    Loading,
    Loaded,
    Filtering,
    Filtered,
    Exhausted,
}

impl fmt::Display for ExplorerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExplorerState::Idle => "idle",
            ExplorerState::ObjectChosen => "object chosen",
            ExplorerState::FieldsChosen => "fields chosen",
            ExplorerState::Loading => "loading",
            ExplorerState::Loaded => "loaded",
            ExplorerState::Filtering => "filtering",
            ExplorerState::Filtered => "filtered",
            ExplorerState::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

/// Identifies one outstanding backend request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub generation: u64,
    pub id: Uuid,
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}-{}", self.generation, self.id)
    }
}

/// All explorer state, owned by one `DataExplorer` behind a mutex
#[derive(Debug)]
pub struct SessionState {
    generation: u64,
    cancel: CancellationToken,
    pub state: ExplorerState,
    pub objects: Vec<ObjectName>,
    pub object: Option<ObjectName>,
    pub field_options: Vec<FieldName>,
    pub fields: FieldSelection,
    pub columns: ColumnModel,
    pub pagination: PaginationController,
    pub filter: FilterController,
    pub selection: SelectionTracker,
    pub dataset: Dataset,
    /// A fetch, load-more or filter request is in flight
    pub loading: bool,
}

impl SessionState {
    pub fn new(page_size: usize) -> Self {
        Self {
            generation: 0,
            cancel: CancellationToken::new(),
            state: ExplorerState::Idle,
            objects: Vec::new(),
            object: None,
            field_options: Vec::new(),
            fields: FieldSelection::default(),
            columns: ColumnModel::new(),
            pagination: PaginationController::new(page_size),
            filter: FilterController::new(),
            selection: SelectionTracker::new(),
            dataset: Dataset::new(),
            loading: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidate everything in flight and start a new generation.
    fn next_generation(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.generation += 1;
        self.loading = false;
    }

    /// Choose an object: all downstream state is discarded.
    pub fn begin_object(&mut self, object: ObjectName) {
        self.next_generation();
        self.object = Some(object);
        self.field_options.clear();
        self.fields = FieldSelection::default();
        self.columns.clear();
        self.pagination.reset();
        self.filter = FilterController::new();
        self.selection.clear();
        self.dataset.clear();
        self.state = ExplorerState::ObjectChosen;
    }

    /// Choose fields: columns and filter options are rebuilt, the filter,
    /// the selection and the pagination session are discarded. Loaded rows
    /// stay visible until the next fetch replaces them.
    pub fn begin_fields(&mut self, fields: FieldSelection) {
        self.next_generation();
        self.columns.rebuild(&fields);
        self.filter = FilterController::new();
        self.filter.rebuild_options(&fields);
        self.fields = fields;
        self.pagination.reset();
        self.selection.clear();
        self.state = if self.fields.is_empty() {
            ExplorerState::ObjectChosen
        } else {
            ExplorerState::FieldsChosen
        };
    }

    /// Snapshot the current rows and pagination as the unfiltered view.
    pub fn capture_unfiltered(&mut self) {
        self.filter.capture(&self.dataset, &self.pagination);
    }

    /// Tag a new request with the current generation.
    pub fn tag(&self) -> RequestTag {
        RequestTag {
            generation: self.generation,
            id: Uuid::new_v4(),
        }
    }

    /// A token cancelled when this generation ends.
    pub fn request_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub fn is_current(&self, tag: &RequestTag) -> bool {
        tag.generation == self.generation
    }
}
