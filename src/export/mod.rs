//! Export of selected rows as a spreadsheet-compatible document.
//!
//! - [`TableExporter`]: turns columns + selected rows into an [`ExportDocument`]
//! - [`ExportFormat`]: HTML table saved as `.xls` (default) or plain CSV
//! - [`ExportDocument`]: in-memory artifact, downloadable as a data URI or
//!   written to a directory

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{ExportError, Result};
use crate::model::{Column, ObjectName, Row};

pub mod csv;
pub mod html;

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// HTML table with a spreadsheet MIME type and `.xls` extension
    #[default]
    Xls,
    /// Comma-separated values with a `.csv` extension
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xls => "xls",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Xls => "application/vnd.ms-excel",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "xls" | "excel" | "html" => Ok(ExportFormat::Xls),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("Unknown export format '{other}'. Expected xls or csv")),
        }
    }
}

/// A rendered export, ready to download or save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub file_name: String,
    pub format: ExportFormat,
    pub content: String,
    pub row_count: usize,
}

impl ExportDocument {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Self-contained `data:` URI for direct download.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            STANDARD.encode(self.content.as_bytes())
        )
    }

    /// Write the document into `dir` under its file name.
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        if !dir.as_os_str().is_empty() && !dir.is_dir() {
            return Err(ExportError::Write(format!(
                "Directory does not exist: {}",
                dir.display()
            ))
            .into());
        }

        let path = dir.join(&self.file_name);
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| ExportError::Write(format!("Failed to create file: {e}")))?;
        file.write_all(self.content.as_bytes())
            .await
            .map_err(|e| ExportError::Write(format!("Failed to write file: {e}")))?;
        file.flush()
            .await
            .map_err(|e| ExportError::Write(format!("Failed to flush file: {e}")))?;

        info!("Exported {} row(s) to {}", self.row_count, path.display());
        Ok(path)
    }
}

/// Serializes selected rows into an [`ExportDocument`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TableExporter {
    format: ExportFormat,
}

impl TableExporter {
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    /// File name for an object: `<object>.<extension>`.
    pub fn file_name(&self, object: &ObjectName) -> String {
        format!("{}.{}", object, self.format.extension())
    }

    /// Render the selected rows.
    ///
    /// Headers use each column's field name. A row missing a column's field
    /// yields an empty cell.
    pub fn export(
        &self,
        object: &ObjectName,
        columns: &[Column],
        selected: &[Arc<Row>],
    ) -> Result<ExportDocument> {
        if selected.is_empty() {
            return Err(ExportError::EmptySelection.into());
        }
        if columns.is_empty() {
            return Err(ExportError::NoColumns.into());
        }

        let content = match self.format {
            ExportFormat::Xls => html::render_table(columns, selected),
            ExportFormat::Csv => csv::render_csv(columns, selected),
        };
        debug!(
            "Rendered {} row(s) x {} column(s) as {}",
            selected.len(),
            columns.len(),
            self.format
        );

        Ok(ExportDocument {
            file_name: self.file_name(object),
            format: self.format,
            content,
            row_count: selected.len(),
        })
    }
}

/// Text of one cell; missing fields render empty.
pub(crate) fn cell_text(row: &Row, column: &Column) -> String {
    row.get(column.field_name.as_str())
        .map(|v| v.to_plain_text())
        .unwrap_or_default()
}
