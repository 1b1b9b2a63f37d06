//! Filter predicates evaluated by the backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::FieldName;

/// Comparison applied between a field value and the filter expression.
///
/// Each operator maps to a SQL `LIKE` pattern; the backend decides how to
/// evaluate it. Serialized as its clause token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Operator {
    StartsWith,
    EndsWith,
    Contains,
    FirstLetterStartsWith,
}

impl Operator {
    /// Human-readable label shown in the operator picker
    pub fn label(&self) -> &'static str {
        match self {
            Operator::StartsWith => "Starts with",
            Operator::EndsWith => "Ends with",
            Operator::Contains => "Contains",
            Operator::FirstLetterStartsWith => "First Letter Starts with",
        }
    }

    /// Clause token sent to the backend
    pub fn clause(&self) -> &'static str {
        match self {
            Operator::StartsWith => "Like%",
            Operator::EndsWith => "%Like",
            Operator::Contains => "%Like%",
            Operator::FirstLetterStartsWith => "_Like",
        }
    }

    /// Build the `LIKE` pattern for an expression.
    pub fn like_pattern(&self, expression: &str) -> String {
        match self {
            Operator::StartsWith => format!("{expression}%"),
            Operator::EndsWith => format!("%{expression}"),
            Operator::Contains => format!("%{expression}%"),
            Operator::FirstLetterStartsWith => format!("_{expression}%"),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();

        match (s, normalized.as_str()) {
            ("Like%", _) | (_, "startswith") => Ok(Operator::StartsWith),
            ("%Like", _) | (_, "endswith") => Ok(Operator::EndsWith),
            ("%Like%", _) | (_, "contains") => Ok(Operator::Contains),
            ("_Like", _) | (_, "firstletterstartswith") | (_, "firstletter") => {
                Ok(Operator::FirstLetterStartsWith)
            }
            _ => Err(format!(
                "Unknown operator '{s}'. Expected one of: starts-with, ends-with, contains, first-letter"
            )),
        }
    }
}

impl From<Operator> for &'static str {
    fn from(operator: Operator) -> Self {
        operator.clause()
    }
}

impl TryFrom<String> for Operator {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// The single filter applied to the current object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(rename = "fieldName")]
    pub field_name: FieldName,
    #[serde(rename = "clause")]
    pub operator: Operator,
    pub expression: String,
}

impl FilterSpec {
    pub fn new(
        field_name: impl Into<FieldName>,
        operator: Operator,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            operator,
            expression: expression.into(),
        }
    }

    /// The `LIKE` pattern for this filter's expression.
    pub fn pattern(&self) -> String {
        self.operator.like_pattern(&self.expression)
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} '{}'",
            self.field_name,
            self.operator.label().to_lowercase(),
            self.expression
        )
    }
}
