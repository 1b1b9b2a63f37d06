//! HTML table rendering.
//!
//! Spreadsheet applications open an HTML `<table>` saved with an `.xls`
//! extension as a worksheet: one `<tr>` of `<th>` headers, then one `<tr>`
//! per row.

use std::sync::Arc;

use super::cell_text;
use crate::model::{Column, Row};

pub fn render_table(columns: &[Column], rows: &[Arc<Row>]) -> String {
    let mut doc = String::from("<table>");

    doc.push_str("<tr>");
    for column in columns {
        doc.push_str("<th>");
        doc.push_str(&escape_html(column.field_name.as_str()));
        doc.push_str("</th>");
    }
    doc.push_str("</tr>");

    for row in rows {
        doc.push_str("<tr>");
        for column in columns {
            doc.push_str("<td>");
            doc.push_str(&escape_html(&cell_text(row, column)));
            doc.push_str("</td>");
        }
        doc.push_str("</tr>");
    }

    doc.push_str("</table>");
    doc
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
