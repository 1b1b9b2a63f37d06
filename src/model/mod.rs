//! Data model shared by the gateways, the explorer and the exporter.
//!
//! - [`ObjectName`] / [`FieldName`]: opaque identifiers handed out by the backend
//! - [`FieldSelection`]: ordered, duplicate-free set of chosen fields
//! - [`Column`]: one displayed column per selected field
//! - [`Row`] / [`Dataset`]: typed row payloads and the working row list
//! - [`FilterSpec`] / [`Operator`]: the single active filter predicate

pub mod filter;
pub mod row;
pub mod value;

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use filter::{FilterSpec, Operator};
pub use row::{Dataset, Row};
pub use value::Value;

/// Generates an opaque string identifier newtype.
macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

identifier!(
    /// Name of a data object (an entity or table exposed by the backend)
    ObjectName
);

identifier!(
    /// Name of a field on the current object
    FieldName
);

/// The fields the user picked for display, in pick order.
///
/// Duplicates are dropped on construction, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection {
    fields: Vec<FieldName>,
}

impl FieldSelection {
    pub fn new<I, F>(fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldName>,
    {
        let mut selection = Vec::new();
        for field in fields.into_iter().map(Into::into) {
            if !selection.contains(&field) {
                selection.push(field);
            }
        }
        Self { fields: selection }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldName> {
        self.fields.iter()
    }

    pub fn as_slice(&self) -> &[FieldName] {
        &self.fields
    }
}

impl<'a> IntoIterator for &'a FieldSelection {
    type Item = &'a FieldName;
    type IntoIter = std::slice::Iter<'a, FieldName>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// A displayed column, derived from one selected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub label: String,
    #[serde(rename = "fieldName")]
    pub field_name: FieldName,
}

impl Column {
    pub fn for_field(field: &FieldName) -> Self {
        Self {
            label: field.to_string(),
            field_name: field.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_selection_keeps_order_and_drops_duplicates() {
        let selection = FieldSelection::new(["Name", "Industry", "Name", "Phone"]);
        let names: Vec<&str> = selection.iter().map(FieldName::as_str).collect();
        assert_eq!(names, vec!["Name", "Industry", "Phone"]);
        assert!(selection.contains("Industry"));
        assert!(!selection.contains("Owner"));
    }

    #[test]
    fn test_empty_selection() {
        let selection = FieldSelection::new(Vec::<String>::new());
        assert!(selection.is_empty());
        assert_eq!(selection.len(), 0);
    }

    #[test]
    fn test_identifier_comparisons() {
        let object = ObjectName::from("Account");
        assert_eq!(object, "Account");
        assert_eq!(object.to_string(), "Account");
    }
}
