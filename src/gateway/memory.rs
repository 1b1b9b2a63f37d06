//! In-memory backend loaded from a JSON fixture.
//!
//! Fixture format:
//!
//! ```json
//! {
//!   "objects": [
//!     {
//!       "name": "Account",
//!       "fields": ["Name", "Industry"],
//!       "rows": [{ "Name": "Acme", "Industry": "Technology" }]
//!     }
//!   ]
//! }
//! ```
//!
//! `fields` may be omitted, in which case it is derived from the row keys.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{GatewayResult, MetadataGateway, PAGE_SIZE, QueryGateway};
use crate::error::{GatewayError, Result};
use crate::model::{FieldName, FilterSpec, ObjectName, Row};

/// One object table held by the in-memory backend
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectTable {
    pub name: ObjectName,
    #[serde(default)]
    pub fields: Vec<FieldName>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    objects: Vec<ObjectTable>,
}

/// Metadata and query gateway over in-memory tables
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    objects: Vec<ObjectTable>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object table; an empty `fields` list is derived from the rows.
    pub fn with_object<F>(mut self, name: impl Into<ObjectName>, fields: F, rows: Vec<Row>) -> Self
    where
        F: IntoIterator,
        F::Item: Into<FieldName>,
    {
        let table = ObjectTable {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            rows,
        };
        self.objects.push(Self::normalize(table));
        self
    }

    /// Parse a JSON fixture.
    pub fn from_json(text: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(text)?;
        Ok(Self {
            objects: fixture.objects.into_iter().map(Self::normalize).collect(),
        })
    }

    /// Read and parse a JSON fixture file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        let gateway = Self::from_json(&text)?;
        debug!(
            "Loaded fixture {} with {} object(s)",
            path.display(),
            gateway.objects.len()
        );
        Ok(gateway)
    }

    fn normalize(mut table: ObjectTable) -> ObjectTable {
        if table.fields.is_empty() {
            let derived: BTreeSet<&FieldName> = table.rows.iter().flat_map(Row::fields).collect();
            table.fields = derived.into_iter().cloned().collect();
        }
        table
    }

    fn table(&self, object: &ObjectName) -> GatewayResult<&ObjectTable> {
        self.objects
            .iter()
            .find(|t| &t.name == object)
            .ok_or_else(|| GatewayError::UnknownObject(object.to_string()))
    }

    fn matching_rows<'a>(
        table: &'a ObjectTable,
        filter: Option<&'a FilterSpec>,
    ) -> GatewayResult<impl Iterator<Item = &'a Row> + 'a> {
        if let Some(spec) = filter {
            Self::check_field(table, &spec.field_name)?;
        }
        let pattern = filter.map(FilterSpec::pattern);
        Ok(table.rows.iter().filter(move |row| match (filter, &pattern) {
            (Some(spec), Some(pattern)) => {
                let text = row
                    .get(spec.field_name.as_str())
                    .map(|v| v.to_plain_text())
                    .unwrap_or_default();
                like_match(pattern, &text)
            }
            _ => true,
        }))
    }

    fn check_field(table: &ObjectTable, field: &FieldName) -> GatewayResult<()> {
        if table.fields.contains(field) {
            Ok(())
        } else {
            Err(GatewayError::UnknownField {
                object: table.name.to_string(),
                field: field.to_string(),
            })
        }
    }
}

#[async_trait]
impl MetadataGateway for InMemoryGateway {
    async fn list_objects(&self) -> GatewayResult<Vec<ObjectName>> {
        Ok(self.objects.iter().map(|t| t.name.clone()).collect())
    }

    async fn list_fields(&self, object: &ObjectName) -> GatewayResult<Vec<FieldName>> {
        Ok(self.table(object)?.fields.clone())
    }
}

#[async_trait]
impl QueryGateway for InMemoryGateway {
    async fn count_rows(
        &self,
        object: &ObjectName,
        filter: Option<&FilterSpec>,
    ) -> GatewayResult<u64> {
        let table = self.table(object)?;
        Ok(Self::matching_rows(table, filter)?.count() as u64)
    }

    async fn fetch_rows(
        &self,
        object: &ObjectName,
        fields: &[FieldName],
        filter: Option<&FilterSpec>,
        offset: usize,
    ) -> GatewayResult<Vec<Row>> {
        let table = self.table(object)?;
        if fields.is_empty() {
            return Err(GatewayError::Rejected("no fields requested".to_string()));
        }
        for field in fields {
            Self::check_field(table, field)?;
        }
        Ok(Self::matching_rows(table, filter)?
            .skip(offset)
            .take(PAGE_SIZE)
            .map(|row| row.project(fields))
            .collect())
    }
}

/// Case-insensitive SQL `LIKE` match: `%` matches any run, `_` one character.
pub fn like_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();

    // matched[j]: pattern prefix consumed so far matches text[..j]
    let mut matched = vec![false; text.len() + 1];
    matched[0] = true;

    for p in &pattern {
        let mut next = vec![false; text.len() + 1];
        match p {
            '%' => {
                let mut reachable = false;
                for j in 0..=text.len() {
                    reachable |= matched[j];
                    next[j] = reachable;
                }
            }
            '_' => {
                for j in 1..=text.len() {
                    next[j] = matched[j - 1];
                }
            }
            c => {
                for j in 1..=text.len() {
                    next[j] = matched[j - 1] && text[j - 1] == *c;
                }
            }
        }
        matched = next;
    }

    matched[text.len()]
}
