//! CSV rendering with a header row of field names.

use std::sync::Arc;

use super::cell_text;
use crate::model::{Column, Row};

pub fn render_csv(columns: &[Column], rows: &[Arc<Row>]) -> String {
    let mut out = String::new();

    let header: Vec<String> = columns
        .iter()
        .map(|c| escape_csv_value(c.field_name.as_str()))
        .collect();
    out.push_str(&header.join(","));
    out.push_str("\r\n");

    for row in rows {
        let values: Vec<String> = columns
            .iter()
            .map(|column| escape_csv_value(&cell_text(row, column)))
            .collect();
        out.push_str(&values.join(","));
        out.push_str("\r\n");
    }

    out
}

/// Quote a value if it contains a comma, quote or line break.
fn escape_csv_value(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
