//! A4 table report.
//!
//! Pagination is decided by [`PdfLayout`] before anything is drawn: the first
//! page carries the title and metadata block, every page repeats the header
//! row, and body rows alternate a light background.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};

use crate::error::{DeskError, Result};
use crate::export::TableData;

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 15.0;
pub const ROW_HEIGHT: f32 = 7.0;
const TITLE_HEIGHT: f32 = 12.0;
const META_LINE_HEIGHT: f32 = 5.5;
const BLOCK_GAP: f32 = 4.0;
const TITLE_SIZE: f32 = 16.0;
const META_SIZE: f32 = 9.0;
const CELL_SIZE: f32 = 8.0;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_RATIO: f32 = 0.5;
const PT_TO_MM: f32 = 0.3528;

#[derive(Debug, Clone, PartialEq)]
pub struct PdfPage {
    /// Indices into `TableData::rows`.
    pub rows: Vec<usize>,
    pub with_heading: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub pages: Vec<PdfPage>,
    /// Left edge of each column, in mm.
    pub column_x: Vec<f32>,
    pub column_width: Vec<f32>,
}

impl PdfLayout {
    pub fn plan(table: &TableData) -> Self {
        let content_width = PAGE_WIDTH - 2.0 * MARGIN;
        let total: f64 = table.widths.iter().sum();
        let column_width: Vec<f32> = if total > 0.0 {
            table
                .widths
                .iter()
                .map(|w| (*w / total) as f32 * content_width)
                .collect()
        } else {
            let count = table.headers.len().max(1) as f32;
            vec![content_width / count; table.headers.len()]
        };
        let mut column_x = Vec::with_capacity(column_width.len());
        let mut x = MARGIN;
        for width in &column_width {
            column_x.push(x);
            x += width;
        }

        let usable = PAGE_HEIGHT - 2.0 * MARGIN;
        let first_capacity = rows_fitting(usable - heading_height(table));
        let other_capacity = rows_fitting(usable);

        let mut pages = Vec::new();
        let mut next = 0usize;
        let total_rows = table.rows.len();
        loop {
            let with_heading = pages.is_empty();
            let capacity = if with_heading { first_capacity } else { other_capacity };
            let end = (next + capacity).min(total_rows);
            pages.push(PdfPage {
                rows: (next..end).collect(),
                with_heading,
            });
            next = end;
            if next >= total_rows {
                break;
            }
        }

        Self {
            pages,
            column_x,
            column_width,
        }
    }

    pub fn body_row_count(&self) -> usize {
        self.pages.iter().map(|page| page.rows.len()).sum()
    }
}

fn heading_height(table: &TableData) -> f32 {
    TITLE_HEIGHT + table.metadata.len() as f32 * META_LINE_HEIGHT + BLOCK_GAP
}

/// Body rows that fit under a header row in `height` mm (at least one).
fn rows_fitting(height: f32) -> usize {
    (((height - ROW_HEIGHT) / ROW_HEIGHT).floor() as usize).max(1)
}

/// Builtin PDF fonts only cover ASCII reliably: accents fold to their base
/// letter and anything else becomes `?`.
pub fn pdf_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        let mapped = match c {
            'à' | 'á' | 'â' | 'ä' | 'ã' => "a",
            'À' | 'Á' | 'Â' | 'Ä' | 'Ã' => "A",
            'ç' => "c",
            'Ç' => "C",
            'è' | 'é' | 'ê' | 'ë' => "e",
            'È' | 'É' | 'Ê' | 'Ë' => "E",
            'ì' | 'í' | 'î' | 'ï' => "i",
            'Ì' | 'Í' | 'Î' | 'Ï' => "I",
            'ò' | 'ó' | 'ô' | 'ö' | 'õ' => "o",
            'Ò' | 'Ó' | 'Ô' | 'Ö' | 'Õ' => "O",
            'ù' | 'ú' | 'û' | 'ü' => "u",
            'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
            'ÿ' => "y",
            'ñ' => "n",
            'œ' => "oe",
            'Œ' => "OE",
            '…' => "...",
            '«' | '»' | '“' | '”' => "\"",
            '’' | '‘' => "'",
            '\u{a0}' | '\u{202f}' => " ",
            c if c.is_ascii() && !c.is_ascii_control() => {
                out.push(c);
                continue;
            }
            _ => "?",
        };
        out.push_str(mapped);
    }
    out
}

/// Cuts `text` so it fits `width` mm at `size` pt.
fn fit(text: &str, width: f32, size: f32) -> String {
    let glyph = size * GLYPH_RATIO * PT_TO_MM;
    let max_chars = (((width - 2.0) / glyph).floor() as usize).max(1);
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3).max(1);
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str("...");
    cut
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn pdf_err(err: impl std::fmt::Display) -> DeskError {
    DeskError::Export(format!("pdf: {err}"))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

pub fn render(table: &TableData) -> Result<Vec<u8>> {
    let layout = PdfLayout::plan(table);
    let (doc, first_page, first_layer) = PdfDocument::new(
        pdf_text(&table.title),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        String::from("Table"),
    );
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?,
    };

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Table");
            doc.get_page(page_index).get_layer(layer_index)
        };
        draw_page(&layer, &fonts, table, &layout, page, index + 1, layout.pages.len());
    }

    doc.save_to_bytes().map_err(pdf_err)
}

fn draw_page(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    table: &TableData,
    layout: &PdfLayout,
    page: &PdfPage,
    number: usize,
    total: usize,
) {
    let mut y = PAGE_HEIGHT - MARGIN;

    if page.with_heading {
        layer.set_fill_color(rgb(0.1, 0.1, 0.1));
        layer.use_text(pdf_text(&table.title), TITLE_SIZE, Mm(MARGIN), Mm(y - 7.0), &fonts.bold);
        y -= TITLE_HEIGHT;
        for (label, value) in &table.metadata {
            layer.use_text(
                pdf_text(&format!("{label} : {value}")),
                META_SIZE,
                Mm(MARGIN),
                Mm(y - 4.0),
                &fonts.regular,
            );
            y -= META_LINE_HEIGHT;
        }
        y -= BLOCK_GAP;
    }

    let right = PAGE_WIDTH - MARGIN;

    // header row
    layer.set_fill_color(rgb(0.16, 0.38, 0.67));
    layer.add_rect(Rect::new(Mm(MARGIN), Mm(y - ROW_HEIGHT), Mm(right), Mm(y)));
    layer.set_fill_color(rgb(1.0, 1.0, 1.0));
    for (col, header) in table.headers.iter().enumerate() {
        let text = fit(&pdf_text(header), layout.column_width[col], CELL_SIZE);
        layer.use_text(text, CELL_SIZE, Mm(layout.column_x[col] + 1.0), Mm(y - 5.0), &fonts.bold);
    }
    y -= ROW_HEIGHT;

    for (position, row_index) in page.rows.iter().enumerate() {
        if position % 2 == 1 {
            layer.set_fill_color(rgb(0.94, 0.95, 0.97));
            layer.add_rect(Rect::new(Mm(MARGIN), Mm(y - ROW_HEIGHT), Mm(right), Mm(y)));
        }
        layer.set_fill_color(rgb(0.1, 0.1, 0.1));
        for (col, cell) in table.rows[*row_index].iter().enumerate() {
            let text = fit(&pdf_text(&cell.to_string()), layout.column_width[col], CELL_SIZE);
            layer.use_text(text, CELL_SIZE, Mm(layout.column_x[col] + 1.0), Mm(y - 5.0), &fonts.regular);
        }
        y -= ROW_HEIGHT;
    }

    layer.set_fill_color(rgb(0.4, 0.4, 0.4));
    layer.use_text(
        format!("Page {number} / {total}"),
        META_SIZE,
        Mm(right - 22.0),
        Mm(MARGIN - 8.0),
        &fonts.regular,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::CellValue;

    fn table(rows: usize) -> TableData {
        TableData {
            title: "Liste des élèves".into(),
            headers: vec!["Nom".into(), "Filière".into()],
            widths: vec![20.0, 20.0],
            rows: (0..rows)
                .map(|i| vec![CellValue::Text(format!("Élève {i}")), CellValue::text("Réseaux")])
                .collect(),
            metadata: vec![("Total".into(), rows.to_string())],
        }
    }

    #[test]
    fn layout_keeps_every_row_exactly_once() {
        let layout = PdfLayout::plan(&table(95));
        assert!(layout.pages.len() > 1);
        assert_eq!(layout.body_row_count(), 95);
        assert!(layout.pages[0].with_heading);
        assert!(!layout.pages[1].with_heading);
        let flattened: Vec<usize> = layout.pages.iter().flat_map(|p| p.rows.clone()).collect();
        assert_eq!(flattened, (0..95).collect::<Vec<_>>());
    }

    #[test]
    fn columns_fill_the_content_width() {
        let layout = PdfLayout::plan(&table(1));
        assert_eq!(layout.column_x[0], MARGIN);
        let total: f32 = layout.column_width.iter().sum();
        assert!((total - (PAGE_WIDTH - 2.0 * MARGIN)).abs() < 0.01);
    }

    #[test]
    fn text_is_folded_to_ascii() {
        assert_eq!(pdf_text("Élève – Réseaux"), "Eleve ? Reseaux");
        assert_eq!(pdf_text("« oui »"), "\" oui \"");
    }

    #[test]
    fn long_cells_are_truncated() {
        let cut = fit(&"x".repeat(200), 20.0, CELL_SIZE);
        assert!(cut.ends_with("..."));
        assert!(cut.len() < 200);
    }

    #[test]
    fn renders_a_pdf_document() {
        let bytes = render(&table(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
