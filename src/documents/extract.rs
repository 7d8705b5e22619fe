//! Per-format text extraction.
//!
//! Every extractor takes raw bytes and returns plain UTF-8 text. Errors never
//! panic; the caller skips the file.

use super::DocumentFormat;
use crate::error::{HelperError, Result};
use regex::Regex;
use std::io::Read;
use std::sync::LazyLock;

/// Maximum decompressed bytes read from `word/document.xml` (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Column width used when rendering HTML to text.
const HTML_WIDTH: usize = 120;

/// Extract plain text from a file's bytes.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Text => extract_plain(bytes),
        DocumentFormat::Pdf => extract_pdf(bytes),
        DocumentFormat::Word => extract_docx(bytes),
        DocumentFormat::Html => extract_html(bytes),
        DocumentFormat::Json => extract_json(bytes),
    }
}

fn extract_plain(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| HelperError::Document(format!("not valid UTF-8: {}", e)))
}

fn extract_pdf(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed inputs.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| HelperError::Document("PDF parser panicked".to_string()))?
        .map(|text| collapse_blank_lines(&text))
        .map_err(|e| HelperError::Document(format!("PDF extraction failed: {}", e)))
}

fn extract_html(bytes: &[u8]) -> Result<String> {
    html2text::from_read(bytes, HTML_WIDTH)
        .map(|text| collapse_blank_lines(&text))
        .map_err(|e| HelperError::Document(format!("HTML extraction failed: {}", e)))
}

/// Runs of blank lines become a single paragraph break.
fn collapse_blank_lines(text: &str) -> String {
    static BLANK_RUNS: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?:[ \t]*\n){3,}").expect("valid blank-line pattern"));
    BLANK_RUNS.replace_all(text, "\n\n").into_owned()
}

/// The whole JSON document is the text, re-serialized compactly.
fn extract_json(bytes: &[u8]) -> Result<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(serde_json::to_string(&value)?)
}

fn extract_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| HelperError::Document(format!("not an OOXML document: {}", e)))?;

    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| HelperError::Document("word/document.xml not found".to_string()))?;

    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| HelperError::Document(e.to_string()))?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(HelperError::Document(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }

    extract_word_runs(&xml)
}

/// Collect `<w:t>` run text, one line per `<w:p>` paragraph.
fn extract_word_runs(xml: &[u8]) -> Result<String> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| HelperError::Document(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"tab" => out.push('\t'),
            Ok(Event::Eof) => break,
            Err(e) => return Err(HelperError::Document(format!("OOXML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("word/document.xml", options).unwrap();
            writer.write_all(document_xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(
            extract_text(b"library hours", DocumentFormat::Text).unwrap(),
            "library hours"
        );
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        assert!(extract_text(&[0xff, 0xfe, 0x00], DocumentFormat::Text).is_err());
    }

    #[test]
    fn test_json_is_compacted() {
        let text = extract_text(b"{ \"hall\" :  \"B\" }", DocumentFormat::Json).unwrap();
        assert_eq!(text, r#"{"hall":"B"}"#);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(extract_text(b"{ not json", DocumentFormat::Json).is_err());
    }

    #[test]
    fn test_html_drops_markup() {
        let text = extract_text(
            b"<html><body><h1>Admissions</h1><p>Apply by <b>May</b>.</p></body></html>",
            DocumentFormat::Html,
        )
        .unwrap();
        assert!(text.contains("Admissions"));
        assert!(text.contains("May"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n  \nb\n\nc"), "a\n\nb\n\nc");
    }

    #[test]
    fn test_invalid_pdf_is_an_error() {
        assert!(extract_text(b"not a pdf", DocumentFormat::Pdf).is_err());
    }

    #[test]
    fn test_docx_paragraphs() {
        let xml = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Hostel rules</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Quiet hours </w:t></w:r><w:r><w:t>start at 10pm.</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let text = extract_text(&docx_bytes(xml), DocumentFormat::Word).unwrap();
        assert_eq!(text, "Hostel rules\nQuiet hours start at 10pm.");
    }

    #[test]
    fn test_legacy_binary_doc_is_an_error() {
        let err = extract_text(b"\xd0\xcf\x11\xe0 legacy", DocumentFormat::Word).unwrap_err();
        assert!(matches!(err, HelperError::Document(_)));
    }
}
