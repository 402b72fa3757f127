use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent};

use super::markdown_table;
use crate::error::{Result, ScrawlError};

/// Word documents: paragraphs in body order, headings as `#` lines, list
/// items as `-` bullets and tables as Markdown tables.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn extract(bytes: &[u8]) -> Result<String> {
        let docx = docx_rs::read_docx(bytes)
            .map_err(|e| ScrawlError::GenericExtraction(format!("DOCX parse error: {e}")))?;

        let mut blocks: Vec<String> = Vec::new();
        for child in &docx.document.children {
            let block = match child {
                DocumentChild::Paragraph(paragraph) => render_paragraph(paragraph),
                DocumentChild::Table(table) => render_table(table),
                _ => continue,
            };
            if !block.trim().is_empty() {
                blocks.push(block.trim_end().to_string());
            }
        }

        Ok(blocks.join("\n"))
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut content = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let RunChild::Text(text) = run_child {
                    content.push_str(&text.text);
                }
            }
        }
    }
    content
}

/// `Title` and `Heading1`..`Heading6` map to Markdown heading levels.
fn heading_level(paragraph: &Paragraph) -> Option<usize> {
    let style = paragraph.property.style.as_ref()?;
    if style.val == "Title" {
        return Some(1);
    }
    style
        .val
        .strip_prefix("Heading")
        .and_then(|level| level.parse::<usize>().ok())
        .filter(|level| (1..=6).contains(level))
}

fn render_paragraph(paragraph: &Paragraph) -> String {
    let content = paragraph_text(paragraph);
    if content.trim().is_empty() {
        return String::new();
    }

    if let Some(level) = heading_level(paragraph) {
        return format!("{} {content}", "#".repeat(level));
    }

    match paragraph
        .property
        .numbering_property
        .as_ref()
        .and_then(|n| n.level.as_ref())
    {
        Some(level) => format!("{}- {content}", "  ".repeat(level.val)),
        None => content,
    }
}

fn render_table(table: &Table) -> String {
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|docx_rs::TableChild::TableRow(row)| {
            row.cells
                .iter()
                .map(|docx_rs::TableRowChild::TableCell(cell)| {
                    cell.children
                        .iter()
                        .filter_map(|c| match c {
                            TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                            _ => None,
                        })
                        .collect::<Vec<_>>()
                        .join(" ")
                        .trim()
                        .to_string()
                })
                .collect()
        })
        .filter(|cells: &Vec<String>| !cells.is_empty())
        .collect();

    markdown_table(&rows)
}
