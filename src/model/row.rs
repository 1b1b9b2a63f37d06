//! Row payloads and the working dataset.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{FieldName, Value};

/// One record returned by the backend, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<FieldName, Value>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field; missing fields return `None`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<FieldName>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldName> {
        self.0.keys()
    }

    /// Keep only the given fields. Fields absent from the row are skipped.
    pub fn project(&self, fields: &[FieldName]) -> Row {
        fields
            .iter()
            .filter_map(|f| self.0.get(f).map(|v| (f.clone(), v.clone())))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<FieldName>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row(iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect())
    }
}

/// The rows currently shown to the user.
///
/// Rows are shared behind `Arc` so selection can refer to them by identity,
/// while equality between datasets compares row values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<Arc<Row>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Row>> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Row>> {
        self.rows.iter()
    }

    /// Append a page of rows, returning how many were added.
    pub fn append(&mut self, page: Vec<Row>) -> usize {
        let added = page.len();
        self.rows.extend(page.into_iter().map(Arc::new));
        added
    }

    /// Whether this exact row instance belongs to the dataset.
    pub fn contains_ref(&self, row: &Arc<Row>) -> bool {
        self.rows.iter().any(|r| Arc::ptr_eq(r, row))
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

impl From<Vec<Row>> for Dataset {
    fn from(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter().map(Arc::new).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Arc<Row>;
    type IntoIter = std::slice::Iter<'a, Arc<Row>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
