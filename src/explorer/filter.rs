//! Filter inputs, the active filter, and the unfiltered snapshot.

use tracing::{debug, warn};

use super::pagination::PaginationController;
use crate::error::GatewayError;
use crate::gateway::QueryGateway;
use crate::model::{Dataset, FieldName, FieldSelection, FilterSpec, ObjectName, Operator, Row};

/// The unfiltered view captured before a filter replaces it
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub dataset: Dataset,
    pub pagination: PaginationController,
}

/// Owns the filter inputs, the active [`FilterSpec`] and the snapshot used by
/// "clear filter".
#[derive(Debug, Clone, Default)]
pub struct FilterController {
    eligible: Vec<FieldName>,
    filter_on: Option<FieldName>,
    operator: Option<Operator>,
    expression: String,
    active: Option<FilterSpec>,
    snapshot: Option<ViewSnapshot>,
}

impl FilterController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the filterable field list from the selection.
    ///
    /// Any previously chosen filter field is dropped along with the old list.
    pub fn rebuild_options(&mut self, selection: &FieldSelection) {
        self.eligible = selection.iter().cloned().collect();
        self.filter_on = None;
    }

    pub fn eligible_fields(&self) -> &[FieldName] {
        &self.eligible
    }

    /// Pick the field to filter on. Fields outside the selection are ignored.
    pub fn choose_field(&mut self, field: FieldName) -> bool {
        if self.eligible.contains(&field) {
            self.filter_on = Some(field);
            true
        } else {
            warn!("Ignoring filter field '{}': not among selected fields", field);
            false
        }
    }

    pub fn choose_operator(&mut self, operator: Operator) {
        self.operator = Some(operator);
    }

    pub fn set_expression(&mut self, expression: impl Into<String>) {
        self.expression = expression.into();
    }

    /// Compose the filter from the current inputs.
    ///
    /// `None` unless both a field and an operator are chosen. The expression
    /// may be empty.
    pub fn pending_spec(&self) -> Option<FilterSpec> {
        let field = self.filter_on.as_ref()?;
        let operator = self.operator?;
        if !self.eligible.contains(field) {
            return None;
        }
        Some(FilterSpec::new(field.clone(), operator, self.expression.clone()))
    }

    pub fn active(&self) -> Option<&FilterSpec> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn activate(&mut self, spec: FilterSpec) {
        debug!("Filter applied: {}", spec);
        self.active = Some(spec);
    }

    /// Remember the current unfiltered view.
    pub fn capture(&mut self, dataset: &Dataset, pagination: &PaginationController) {
        self.snapshot = Some(ViewSnapshot {
            dataset: dataset.clone(),
            pagination: pagination.clone(),
        });
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Drop the active filter and hand back the unfiltered snapshot.
    ///
    /// Returns `None`, changing nothing, when no snapshot was ever captured.
    pub fn restore(&mut self) -> Option<ViewSnapshot> {
        let snapshot = self.snapshot.clone()?;
        self.active = None;
        Some(snapshot)
    }

    /// Forget the active filter and the snapshot, keeping the inputs.
    pub fn clear_results(&mut self) {
        self.active = None;
        self.snapshot = None;
    }

    /// Fetch the first filtered page.
    pub async fn fetch_filtered(
        query: &dyn QueryGateway,
        object: &ObjectName,
        fields: &FieldSelection,
        spec: &FilterSpec,
    ) -> Result<Vec<Row>, GatewayError> {
        query
            .fetch_rows(object, fields.as_slice(), Some(spec), 0)
            .await
    }
}
