use std::sync::Arc;

use crate::model::{Dataset, Row};

/// Rows currently marked by the user.
///
/// Every selection event replaces the whole set; nothing is diffed.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    rows: Vec<Arc<Row>>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection. An empty iterator simply clears it.
    pub fn set_selection<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = Arc<Row>>,
    {
        self.rows.clear();
        self.rows.extend(rows);
    }

    pub fn current_selection(&self) -> &[Arc<Row>] {
        &self.rows
    }

    /// Selected rows that are still part of `dataset`, in selection order.
    pub fn retained_in(&self, dataset: &Dataset) -> Vec<Arc<Row>> {
        self.rows
            .iter()
            .filter(|row| dataset.contains_ref(row))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
