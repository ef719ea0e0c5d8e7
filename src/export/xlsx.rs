use rust_xlsxwriter::{Format, Workbook};

use crate::error::Result;
use crate::export::{CellValue, TableData};
use crate::summary::CategorySummary;

pub const DATA_SHEET: &str = "Données";
pub const STATS_SHEET: &str = "Statistiques";

const WHOLE_FORMAT: &str = "# ##0";
const DECIMAL_FORMAT: &str = "# ##0.00";

/// Number format for a cell: decimals are shown only when the value has some.
pub fn number_format(value: f64) -> &'static str {
    if value.fract() == 0.0 {
        WHOLE_FORMAT
    } else {
        DECIMAL_FORMAT
    }
}

/// One sheet of records, plus a statistics sheet when `summaries` is given.
pub fn render(table: &TableData, summaries: Option<&[CategorySummary]>) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let whole = Format::new().set_num_format(WHOLE_FORMAT);
    let decimal = Format::new().set_num_format(DECIMAL_FORMAT);
    let format_for = |value: f64| {
        if number_format(value) == WHOLE_FORMAT {
            &whole
        } else {
            &decimal
        }
    };

    let sheet = workbook.add_worksheet();
    sheet.set_name(DATA_SHEET)?;
    for (col, (title, width)) in table.headers.iter().zip(&table.widths).enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, title, &header)?;
        sheet.set_column_width(col, *width)?;
    }
    for (index, row) in table.rows.iter().enumerate() {
        let row_num = index as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                CellValue::Text(text) => {
                    sheet.write_string(row_num, col, text)?;
                }
                CellValue::Number(value) => {
                    sheet.write_number_with_format(row_num, col, *value, format_for(*value))?;
                }
            }
        }
    }

    if let Some(summaries) = summaries {
        let stats = workbook.add_worksheet();
        stats.set_name(STATS_SHEET)?;
        stats.write_string_with_format(0, 0, "Catégorie", &header)?;
        stats.write_string_with_format(0, 1, "Nombre", &header)?;
        stats.set_column_width(0, 24)?;
        stats.set_column_width(1, 10)?;

        let with_amounts = summaries.iter().any(|s| s.amount_total.is_some());
        if with_amounts {
            stats.write_string_with_format(0, 2, "Montant total", &header)?;
            stats.set_column_width(2, 16)?;
        }

        for (index, summary) in summaries.iter().enumerate() {
            let row_num = index as u32 + 1;
            stats.write_string(row_num, 0, &summary.value)?;
            stats.write_number(row_num, 1, summary.count as f64)?;
            if let Some(total) = summary.amount_total {
                stats.write_number_with_format(row_num, 2, total, format_for(total))?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_a_zip_container() {
        let table = TableData {
            title: "Paiements".into(),
            headers: vec!["Élève".into(), "Montant".into()],
            widths: vec![20.0, 12.0],
            rows: vec![vec![CellValue::text("Awa"), CellValue::Number(5000.0)]],
            metadata: vec![],
        };
        let summaries = vec![CategorySummary {
            value: "approuve".into(),
            count: 1,
            amount_total: Some(5000.0),
        }];
        let bytes = render(&table, Some(&summaries)).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn fractional_values_keep_their_decimals() {
        assert_eq!(number_format(5000.0), "# ##0");
        assert_eq!(number_format(14.5), "# ##0.00");
        assert_eq!(number_format(1250.25), "# ##0.00");

        let table = TableData {
            title: "Rapports".into(),
            headers: vec!["Note".into()],
            widths: vec![8.0],
            rows: vec![vec![CellValue::Number(14.5)], vec![CellValue::Number(12.0)]],
            metadata: vec![],
        };
        assert!(render(&table, None).is_ok());
    }
}
