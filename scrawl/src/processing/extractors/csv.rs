use super::markdown_table;
use crate::error::{Result, ScrawlError};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const DELIMITER_CANDIDATES: [u8; 3] = [b',', b';', b'\t'];
const SNIFF_RECORDS: usize = 5;

/// CSV to Markdown table, with delimiter sniffing.
pub struct CsvExtractor;

impl CsvExtractor {
    pub fn extract(bytes: &[u8]) -> Result<String> {
        let bytes = bytes.strip_prefix(&UTF8_BOM[..]).unwrap_or(bytes);
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ScrawlError::GenericExtraction("Empty CSV file".to_string()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(detect_delimiter(bytes))
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| {
                ScrawlError::GenericExtraction(format!("Failed to read CSV record: {e}"))
            })?;
            rows.push(record.iter().map(|f| f.trim().to_string()).collect());
        }

        Ok(markdown_table(&rows))
    }
}

/// Picks the candidate that yields the most columns with a consistent
/// count across the first few records. Falls back to comma.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    DELIMITER_CANDIDATES
        .iter()
        .copied()
        .map(|d| (d, score_delimiter(bytes, d)))
        .fold((b',', 0), |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        })
        .0
}

fn score_delimiter(bytes: &[u8], delimiter: u8) -> usize {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let counts: Vec<usize> = reader
        .records()
        .take(SNIFF_RECORDS)
        .filter_map(|r| r.ok())
        .map(|r| r.len())
        .collect();

    match counts.first() {
        Some(&first) if first > 1 => {
            if counts.iter().all(|&c| c == first) {
                first * 10
            } else {
                first
            }
        }
        _ => 0,
    }
}
