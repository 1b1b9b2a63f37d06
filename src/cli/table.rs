//! Table rendering for loaded rows using tabled
//!
//! Rows are laid out under the selected columns, with a leading `#` column
//! holding the position used by `export --rows`.

use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Columns, object::Rows, width::Width},
};

use crate::model::{Column, Dataset, FieldName};

/// Maximum width for a single column (characters)
const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;

/// Available table styles
#[derive(Debug, Clone, Copy, Default)]
pub enum TableStyle {
    #[default]
    Modern,
    Ascii,
    Markdown,
    Psql,
}

/// Renders a dataset as a text table
#[derive(Debug, Clone)]
pub struct TableRenderer {
    max_column_width: usize,
    style: TableStyle,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    pub fn new() -> Self {
        Self {
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            style: TableStyle::Modern,
        }
    }

    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_max_column_width(mut self, width: usize) -> Self {
        self.max_column_width = width;
        self
    }

    /// Render `dataset` under `columns`; missing values are empty cells.
    pub fn render(&self, columns: &[Column], dataset: &Dataset) -> String {
        if columns.is_empty() {
            return "(no fields selected)".to_string();
        }
        if dataset.is_empty() {
            return "(no rows loaded)".to_string();
        }

        let mut builder = Builder::default();

        let mut header = vec!["#".to_string()];
        header.extend(columns.iter().map(|c| c.label.clone()));
        builder.push_record(header);

        for (index, row) in dataset.iter().enumerate() {
            let mut record = vec![index.to_string()];
            record.extend(columns.iter().map(|c| {
                row.get(c.field_name.as_str())
                    .map(|v| v.to_plain_text())
                    .unwrap_or_default()
            }));
            builder.push_record(record);
        }

        let mut table = builder.build();
        self.apply_style(&mut table);
        for i in 1..=columns.len() {
            table.with(Modify::new(Columns::new(i..=i)).with(Width::wrap(self.max_column_width)));
        }
        table.with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Render a single-column list such as object or field names.
    pub fn render_names<T: AsRef<str>>(&self, title: &str, names: &[T]) -> String {
        let mut builder = Builder::default();
        builder.push_record([title.to_string()]);
        for name in names {
            builder.push_record([name.as_ref().to_string()]);
        }
        let mut table = builder.build();
        self.apply_style(&mut table);
        table.to_string()
    }

    fn apply_style(&self, table: &mut Table) {
        match self.style {
            TableStyle::Modern => table.with(Style::modern()),
            TableStyle::Ascii => table.with(Style::ascii()),
            TableStyle::Markdown => table.with(Style::markdown()),
            TableStyle::Psql => table.with(Style::psql()),
        };
    }
}

/// Comma-separated field list, e.g. for status lines.
pub fn field_list(fields: &[FieldName]) -> String {
    fields
        .iter()
        .map(FieldName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;

    fn columns() -> Vec<Column> {
        vec![
            Column::for_field(&FieldName::from("Name")),
            Column::for_field(&FieldName::from("Phone")),
        ]
    }

    #[test]
    fn test_render_includes_positions_and_values() {
        let dataset = Dataset::from(vec![
            Row::from_iter([("Name", "Acme"), ("Phone", "555-0100")]),
            Row::from_iter([("Name", "Globex")]),
        ]);
        let output = TableRenderer::new()
            .with_style(TableStyle::Ascii)
            .render(&columns(), &dataset);

        assert!(output.contains("Name"));
        assert!(output.contains("Phone"));
        assert!(output.contains("Acme"));
        assert!(output.contains("555-0100"));
        assert!(output.contains("Globex"));
        assert!(output.contains(" 1 "));
    }

    #[test]
    fn test_render_empty_states() {
        let renderer = TableRenderer::new();
        assert_eq!(renderer.render(&[], &Dataset::new()), "(no fields selected)");
        assert_eq!(renderer.render(&columns(), &Dataset::new()), "(no rows loaded)");
    }

    #[test]
    fn test_render_names() {
        let output = TableRenderer::new()
            .with_style(TableStyle::Markdown)
            .render_names("Objects", &["Account", "Contact"]);
        assert!(output.contains("Objects"));
        assert!(output.contains("Account"));
        assert!(output.contains("Contact"));
    }

    #[test]
    fn test_field_list() {
        let fields = vec![FieldName::from("Name"), FieldName::from("Industry")];
        assert_eq!(field_list(&fields), "Name, Industry");
    }
}
