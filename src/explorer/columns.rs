//! Column derivation from the field selection.

use crate::model::{Column, FieldSelection};

/// Derive one column per selected field, in selection order.
pub fn derive_columns(selection: &FieldSelection) -> Vec<Column> {
    selection.iter().map(Column::for_field).collect()
}

/// The displayed column set.
///
/// Always rebuilt wholesale from the selection, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnModel {
    columns: Vec<Column>,
}

impl ColumnModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(&mut self, selection: &FieldSelection) -> &[Column] {
        self.columns = derive_columns(selection);
        &self.columns
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }
}
