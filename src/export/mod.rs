//! Export of the current (already filtered) list to PDF, XLSX or CSV.
//!
//! All three backends consume the same [`TableData`], built from the record
//! list and its [`Column`] definitions. An empty list is refused before any
//! document is built.

pub mod columns;
pub mod csv;
pub mod pdf;
pub mod xlsx;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::{DeskError, Result};
use crate::models::Record;
use crate::notify::Notifier;
use crate::summary::{self, CategorySummary};

pub use columns::{CellValue, Column, Exportable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Xlsx => "Excel",
            Self::Csv => "CSV",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExportFormat {
    type Err = DeskError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            other => Err(DeskError::Export(format!("unknown export format: {other}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportRequest<'a> {
    /// Resource name, used as the file name prefix.
    pub resource: &'a str,
    pub title: &'a str,
    pub format: ExportFormat,
    /// Generation date, printed in the document and the file name.
    pub date: NaiveDate,
    /// Category for the XLSX statistics sheet and the PDF metadata block.
    pub group_by: Option<&'a str>,
}

/// Header, rows and metadata shared by every backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub title: String,
    pub headers: Vec<String>,
    pub widths: Vec<f64>,
    pub rows: Vec<Vec<CellValue>>,
    pub metadata: Vec<(String, String)>,
}

impl TableData {
    pub fn build<T: Record>(records: &[T], columns: &[Column<T>], title: &str) -> Self {
        Self {
            title: title.to_string(),
            headers: columns.iter().map(|c| c.header.to_string()).collect(),
            widths: columns.iter().map(|c| c.width).collect(),
            rows: records
                .iter()
                .map(|record| columns.iter().map(|c| (c.value)(record)).collect())
                .collect(),
            metadata: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    /// Number of data rows (header excluded).
    pub row_count: usize,
}

impl ExportedDocument {
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "export written");
        Ok(path)
    }
}

/// `<resource>-<YYYY-MM-DD>.<ext>`
pub fn file_name(resource: &str, date: NaiveDate, format: ExportFormat) -> String {
    format!("{resource}-{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// Builds the requested document from `records`.
///
/// An empty list raises one error notice and returns [`DeskError::EmptyExport`]
/// without building anything.
pub fn export_table<T: Record>(
    records: &[T],
    columns: &[Column<T>],
    request: &ExportRequest<'_>,
    notifier: &dyn Notifier,
) -> Result<ExportedDocument> {
    if records.is_empty() {
        let err = DeskError::EmptyExport {
            resource: request.resource.to_string(),
        };
        notifier.error(&err.user_message());
        return Err(err);
    }

    notifier.info(&format!("Génération du fichier {} en cours…", request.format));

    let summaries = request.group_by.map(|key| summary::summarize_by(records, key));
    let mut table = TableData::build(records, columns, request.title);
    table.metadata = metadata(records, request, summaries.as_deref());

    let built = match request.format {
        ExportFormat::Csv => csv::render(&table),
        ExportFormat::Xlsx => xlsx::render(&table, summaries.as_deref()),
        ExportFormat::Pdf => pdf::render(&table),
    };

    let bytes = match built {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(resource = request.resource, format = %request.format, error = %err, "export failed");
            notifier.error(&err.user_message());
            return Err(err);
        }
    };

    let document = ExportedDocument {
        file_name: file_name(request.resource, request.date, request.format),
        format: request.format,
        bytes,
        row_count: records.len(),
    };
    tracing::info!(
        resource = request.resource,
        format = %request.format,
        rows = document.row_count,
        "export built"
    );
    notifier.success(&format!(
        "Export {} terminé : {} enregistrement(s)",
        request.format, document.row_count
    ));
    Ok(document)
}

fn metadata<T: Record>(
    records: &[T],
    request: &ExportRequest<'_>,
    summaries: Option<&[CategorySummary]>,
) -> Vec<(String, String)> {
    let mut lines = vec![
        ("Total".to_string(), records.len().to_string()),
        (
            "Généré le".to_string(),
            request.date.format("%d/%m/%Y").to_string(),
        ),
    ];
    if let Some(total) = summary::total_amount(records) {
        lines.push(("Montant total".to_string(), columns::format_amount(total)));
    }
    if let Some(summaries) = summaries {
        for entry in summaries {
            lines.push((entry.value.clone(), entry.count.to_string()));
        }
    }
    lines
}
