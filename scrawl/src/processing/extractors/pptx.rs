//! PPTX text via zip + quick-xml

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{Result, ScrawlError};

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// PowerPoint decks. Slides follow presentation order; each becomes a
/// `## Slide N` section with its speaker notes appended.
pub struct PptxExtractor;

impl PptxExtractor {
    pub fn extract(bytes: &[u8]) -> Result<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ScrawlError::GenericExtraction(format!("PPTX parse error: {e}")))?;

        let presentation = read_part(&mut archive, "ppt/presentation.xml").ok_or_else(|| {
            ScrawlError::GenericExtraction("PPTX has no ppt/presentation.xml".to_string())
        })?;
        let slide_ids = slide_order(&presentation)?;
        let targets = read_part(&mut archive, "ppt/_rels/presentation.xml.rels")
            .map(|rels| relationship_targets(&rels, "/slide", "ppt"))
            .unwrap_or_default();

        let mut sections = Vec::with_capacity(slide_ids.len());
        for (index, r_id) in slide_ids.iter().enumerate() {
            let number = index + 1;
            let slide_path = targets
                .get(r_id)
                .cloned()
                .unwrap_or_else(|| format!("ppt/slides/slide{number}.xml"));

            let mut section = format!("## Slide {number}");
            let body = read_part(&mut archive, &slide_path)
                .map(|xml| drawing_text(&xml))
                .unwrap_or_default();
            if !body.is_empty() {
                section.push_str("\n\n");
                section.push_str(&body);
            }

            if let Some(notes) = slide_notes(&mut archive, &slide_path) {
                section.push_str("\n\n[Notes]: ");
                section.push_str(&notes);
            }

            sections.push(section);
        }

        Ok(sections.join("\n\n"))
    }
}

fn read_part(archive: &mut Archive<'_>, path: &str) -> Option<String> {
    let mut file = archive.by_name(path).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    Some(content)
}

fn attr(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| std::str::from_utf8(&a.value).ok().map(String::from))
}

/// Relationship ids of `p:sldId` entries, in deck order.
fn slide_order(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut ids = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"p:sldId" => {
                ids.extend(attr(&e, b"r:id"));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ScrawlError::GenericExtraction(format!(
                    "Error parsing presentation.xml: {e}"
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(ids)
}

/// Notes linked from the slide's own relationships part, if any.
fn slide_notes(archive: &mut Archive<'_>, slide_path: &str) -> Option<String> {
    let (dir, file) = slide_path.rsplit_once('/')?;
    let rels = read_part(archive, &format!("{dir}/_rels/{file}.rels"))?;
    let notes_path = relationship_targets(&rels, "/notesSlide", dir)
        .into_values()
        .next()?;
    let notes = drawing_text(&read_part(archive, &notes_path)?);
    (!notes.is_empty()).then_some(notes)
}

/// Relationship id to archive path for relationships whose type ends with
/// `type_suffix`. Relative targets resolve against `base_dir`.
fn relationship_targets(xml: &str, type_suffix: &str, base_dir: &str) -> HashMap<String, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut targets = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"Relationship" => {
                let wanted = attr(&e, b"Type").is_some_and(|t| t.ends_with(type_suffix));
                if let (true, Some(id), Some(target)) = (wanted, attr(&e, b"Id"), attr(&e, b"Target")) {
                    targets.insert(id, resolve_part(base_dir, &target));
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    targets
}

/// Joins a relationship target onto its base directory, folding `..`.
fn resolve_part(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Text of every `a:p` paragraph, one per line.
fn drawing_text(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"a:t" => in_text = true,
            Ok(Event::Text(e)) if in_text => {
                if let Ok(text) = std::str::from_utf8(e.as_ref()) {
                    current.push_str(text);
                }
            }
            Ok(Event::GeneralRef(e)) if in_text => {
                if let Some(c) = std::str::from_utf8(&e).ok().and_then(resolve_entity) {
                    current.push(c);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" => {
                    let paragraph = current.trim();
                    if !paragraph.is_empty() {
                        paragraphs.push(paragraph.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    let tail = current.trim();
    if !tail.is_empty() {
        paragraphs.push(tail.to_string());
    }
    paragraphs.join("\n")
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
