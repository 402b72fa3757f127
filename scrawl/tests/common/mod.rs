#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use tempfile::TempDir;
use zip::write::{ExtendedFileOptions, FileOptions};
use zip::CompressionMethod;

/// Scratch directory removed when dropped.
pub fn scratch_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create scratch directory")
}

pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap_or_else(|e| panic!("Failed to write '{name}': {e}"));
    path
}

pub const SAMPLE_CSV: &str = "Student,Notebook,Pages
Alice,Chemistry,42
Bob,History,17
Chandra,Algebra,63
";

pub fn docx_bytes() -> Vec<u8> {
    use docx_rs::*;

    let docx = Docx::new()
        .add_paragraph(
            Paragraph::new()
                .style("Heading1")
                .add_run(Run::new().add_text("Lab Notes")),
        )
        .add_paragraph(
            Paragraph::new().add_run(Run::new().add_text("Titration of acetic acid.").bold()),
        )
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Endpoint reached at 24.3 ml.")))
        .add_table(Table::new(vec![
            TableRow::new(vec![
                TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("Trial"))),
                TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("Volume"))),
            ]),
            TableRow::new(vec![
                TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("1"))),
                TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("24.3"))),
            ]),
        ]));

    let mut buffer = Cursor::new(Vec::new());
    docx.build().pack(&mut buffer).expect("Failed to pack DOCX");
    buffer.into_inner()
}

/// Builds a zip archive from `(path, contents)` parts.
pub fn zip_package(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let options: FileOptions<ExtendedFileOptions> = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for (name, contents) in parts {
            zip.start_file(*name, options.clone()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer.into_inner()
}

const RELATIONSHIP_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub fn xlsx_bytes() -> Vec<u8> {
    let root_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="{RELATIONSHIP_NS}/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
    );
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{RELATIONSHIP_NS}">
    <sheets><sheet name="Grades" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#
    );
    let workbook_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="{RELATIONSHIP_NS}/worksheet" Target="worksheets/sheet1.xml"/>
    <Relationship Id="rId2" Type="{RELATIONSHIP_NS}/sharedStrings" Target="sharedStrings.xml"/>
</Relationships>"#
    );

    zip_package(&[
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
    <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
</Types>"#,
        ),
        ("_rels/.rels", root_rels.as_str()),
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", workbook_rels.as_str()),
        (
            "xl/worksheets/sheet1.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <sheetData>
        <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
        <row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>91.5</v></c></row>
        <row r="3"><c r="A3" t="s"><v>3</v></c><c r="B3"><v>78</v></c></row>
    </sheetData>
</worksheet>"#,
        ),
        (
            "xl/sharedStrings.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
    <si><t>Student</t></si>
    <si><t>Score</t></si>
    <si><t>Alice</t></si>
    <si><t>Bob</t></si>
</sst>"#,
        ),
    ])
}

fn slide_xml(paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{RELATIONSHIP_NS}" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:cSld><p:spTree><p:sp><p:txBody><a:bodyPr/>{body}</p:txBody></p:sp></p:spTree></p:cSld>
</p:sld>"#
    )
}

/// Two slides listed in reverse archive order. `slide1.xml`, shown second,
/// links speaker notes through its relationships part.
pub fn pptx_bytes() -> Vec<u8> {
    let presentation = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:r="{RELATIONSHIP_NS}" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:sldIdLst><p:sldId id="256" r:id="rId7"/><p:sldId id="257" r:id="rId3"/></p:sldIdLst>
</p:presentation>"#
    );
    let presentation_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId3" Type="{RELATIONSHIP_NS}/slide" Target="slides/slide1.xml"/>
    <Relationship Id="rId7" Type="{RELATIONSHIP_NS}/slide" Target="slides/slide2.xml"/>
    <Relationship Id="rId9" Type="{RELATIONSHIP_NS}/slideLayout" Target="slideLayouts/slideLayout1.xml"/>
</Relationships>"#
    );
    let slide_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="{RELATIONSHIP_NS}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
    <Relationship Id="rId2" Type="{RELATIONSHIP_NS}/notesSlide" Target="../notesSlides/notesSlide1.xml"/>
</Relationships>"#
    );

    zip_package(&[
        ("ppt/presentation.xml", presentation.as_str()),
        ("ppt/_rels/presentation.xml.rels", presentation_rels.as_str()),
        ("ppt/slides/slide1.xml", slide_xml(&["Results", "Yield was 82%"]).as_str()),
        ("ppt/slides/slide2.xml", slide_xml(&["Handwriting study"]).as_str()),
        ("ppt/slides/_rels/slide1.xml.rels", slide_rels.as_str()),
        ("ppt/notesSlides/notesSlide1.xml", slide_xml(&["Mention the control group"]).as_str()),
    ])
}

/// A white page with a few dark horizontal strokes, PNG encoded.
pub fn handwriting_png(width: u32, height: u32) -> Vec<u8> {
    let mut page = GrayImage::from_pixel(width, height, Luma([235]));
    for row in (height / 4..height).step_by((height / 4).max(1) as usize) {
        for x in width / 8..width - width / 8 {
            page.put_pixel(x, row, Luma([20]));
            if row + 1 < height {
                page.put_pixel(x, row + 1, Luma([20]));
            }
        }
    }

    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(page)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes
}

/// Minimal PDF with one Helvetica text line per page. An empty string makes
/// a page with an empty content stream.
pub fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];
    for (i, text) in pages.iter().enumerate() {
        let content = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 24 Tf 72 720 Td ({text}) Tj ET")
        };
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            5 + 2 * i
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}
