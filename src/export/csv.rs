use crate::error::{DeskError, Result};
use crate::export::TableData;

/// Header line plus one line per row. Every field is quoted so commas and
/// quotes in values survive a re-parse.
pub fn render(table: &TableData) -> Result<Vec<u8>> {
    let mut writer = ::csv::WriterBuilder::new()
        .quote_style(::csv::QuoteStyle::Always)
        .terminator(::csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| DeskError::Export(format!("csv: {}", e.error())))
}
