//! Format-specific text extractors used by `StructuredDocumentExtractor`.
//!
//! Each extractor is a stateless unit struct with a synchronous
//! `extract(&[u8]) -> Result<String>`; callers run them on a blocking thread.

pub mod csv;
pub mod docx;
pub mod pptx;
pub mod text;
pub mod xlsx;

pub use csv::CsvExtractor;
pub use docx::DocxExtractor;
pub use pptx::PptxExtractor;
pub use text::PlainTextExtractor;
pub use xlsx::SpreadsheetExtractor;

/// Renders rows as a Markdown table. The first row is the header; short rows
/// are padded to the widest row.
pub(crate) fn markdown_table(rows: &[Vec<String>]) -> String {
    let Some(header) = rows.first() else {
        return String::new();
    };
    let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);

    let render_row = |cells: &[String]| {
        let mut line = String::from("|");
        for i in 0..width {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            line.push(' ');
            line.push_str(&cell.replace('|', "\\|").replace('\n', " "));
            line.push_str(" |");
        }
        line.push('\n');
        line
    };

    let mut table = render_row(header);
    table.push('|');
    for _ in 0..width {
        table.push_str(" --- |");
    }
    table.push('\n');
    for row in &rows[1..] {
        table.push_str(&render_row(row));
    }
    table
}
