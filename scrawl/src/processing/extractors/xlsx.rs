use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use super::markdown_table;
use crate::error::{Result, ScrawlError};

/// `xlsx`, `xlsm`, `xls` and `ods` workbooks. Each sheet becomes a
/// `## Sheet: <name>` section holding a Markdown table.
pub struct SpreadsheetExtractor;

impl SpreadsheetExtractor {
    const MAX_ROWS: usize = 100_000;

    pub fn extract(bytes: &[u8]) -> Result<String> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| ScrawlError::GenericExtraction(format!("Spreadsheet parse error: {e}")))?;

        let mut sections = Vec::new();
        for (name, range) in workbook.worksheets() {
            let mut section = format!("## Sheet: {name}\n\n");
            let (rows, cols) = range.get_size();

            if rows == 0 || cols == 0 {
                section.push_str("*(empty sheet)*\n");
                sections.push(section);
                continue;
            }

            let table: Vec<Vec<String>> = range
                .rows()
                .take(Self::MAX_ROWS)
                .map(|row| row.iter().map(format_cell).collect())
                .collect();
            section.push_str(&markdown_table(&table));

            if rows > Self::MAX_ROWS {
                section.push_str(&format!(
                    "\n*... truncated (showing {} of {rows} rows)*\n",
                    Self::MAX_ROWS
                ));
            }
            sections.push(section);
        }

        Ok(sections.join("\n"))
    }
}

fn format_cell(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // 2.50 -> "2.5", 3.0 -> "3"
        Data::Float(f) => {
            let s = f.to_string();
            if s.contains('.') {
                s.trim_end_matches('0').trim_end_matches('.').to_string()
            } else {
                s
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(dt) => dt.clone(),
        Data::DurationIso(d) => d.clone(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}
