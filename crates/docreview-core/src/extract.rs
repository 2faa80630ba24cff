//! Plain-text extraction from uploaded documents.
//!
//! DOCX files are read paragraph by paragraph from `word/document.xml`; PDF
//! files page by page. Whitespace-only blocks are dropped and the rest are
//! joined with newlines. Every failure is reported as a [`ReviewError`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::ReviewError;
use crate::types::{DocumentFormat, SourceDocument};

/// Extract text from `path` using the decoder for `format`.
pub fn extract(path: &Path, format: DocumentFormat) -> Result<String, ReviewError> {
    match format {
        DocumentFormat::Docx => extract_docx(path),
        DocumentFormat::Pdf => extract_pdf(path),
        DocumentFormat::Unsupported => Err(ReviewError::UnsupportedFormat),
    }
}

/// Load and extract a document, rejecting unsupported or text-less files.
///
/// Decoding runs on the blocking pool; a decoder panic is reported as an
/// unreadable file.
pub async fn load_document(path: &Path) -> Result<SourceDocument, ReviewError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = DocumentFormat::from_path(path);
    if format == DocumentFormat::Unsupported {
        return Err(ReviewError::UnsupportedFormat);
    }

    let owned = path.to_path_buf();
    let raw_text = tokio::task::spawn_blocking(move || extract(&owned, format))
        .await
        .map_err(|e| ReviewError::unreadable(format.extension(), e))??;

    if raw_text.trim().is_empty() {
        return Err(ReviewError::EmptyDocument);
    }

    info!(
        doc = %filename,
        format = format.extension(),
        chars = raw_text.len(),
        "extracted document text"
    );

    Ok(SourceDocument {
        filename,
        format,
        raw_text,
    })
}

pub fn extract_docx(path: &Path) -> Result<String, ReviewError> {
    let file = File::open(path).map_err(|e| ReviewError::unreadable("docx", e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| ReviewError::unreadable("docx", e))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ReviewError::unreadable("docx", e))?
        .read_to_string(&mut xml)
        .map_err(|e| ReviewError::unreadable("docx", e))?;

    let paragraphs = docx_paragraphs(&xml).map_err(|e| ReviewError::unreadable("docx", e))?;
    debug!(paragraphs = paragraphs.len(), "parsed docx body");
    Ok(paragraphs.join("\n"))
}

/// Non-empty paragraph texts of a WordprocessingML body, in document order.
pub fn docx_paragraphs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut paragraphs = Vec::new();
    // Paragraphs nest inside text boxes, so keep a stack.
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                if let Some(current) = open.last_mut() {
                    match e.name().as_ref() {
                        b"w:tab" => current.push('\t'),
                        b"w:br" | b"w:cr" => current.push('\n'),
                        _ => {}
                    }
                }
            }
            Event::Text(e) => {
                if in_text {
                    if let Some(current) = open.last_mut() {
                        current.push_str(&e.unescape()?);
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(text) = open.pop() {
                        if !text.trim().is_empty() {
                            paragraphs.push(text);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

pub fn extract_pdf(path: &Path) -> Result<String, ReviewError> {
    let bytes = std::fs::read(path).map_err(|e| ReviewError::unreadable("pdf", e))?;
    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .map_err(|e| ReviewError::unreadable("pdf", e))?;
    debug!(pages = pages.len(), "parsed pdf pages");
    Ok(join_blocks(pages))
}

/// Join text blocks with newlines, skipping whitespace-only ones.
pub fn join_blocks<I, S>(blocks: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    blocks
        .into_iter()
        .filter(|b| !b.as_ref().trim().is_empty())
        .map(|b| b.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p><w:r><w:t>ARTICLES OF ASSOCIATION</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t xml:space="preserve">   </w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Clause 1.</w:t></w:r><w:r><w:tab/><w:t>Name &amp; Seat</w:t></w:r></w:p>
<w:p><w:r><w:t>Line one</w:t><w:br/><w:t>Line two</w:t></w:r></w:p>
</w:body>
</w:document>"#;

    #[test]
    fn docx_paragraphs_drop_blank_ones() {
        let paragraphs = docx_paragraphs(BODY).unwrap();
        assert_eq!(
            paragraphs,
            vec![
                "ARTICLES OF ASSOCIATION".to_string(),
                "Clause 1.\tName & Seat".to_string(),
                "Line one\nLine two".to_string(),
            ]
        );
    }

    #[test]
    fn docx_text_outside_runs_is_ignored() {
        let xml = r#"<w:document xmlns:w="x"><w:body><w:p><w:pPr>junk</w:pPr><w:r><w:t>kept</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(docx_paragraphs(xml).unwrap(), vec!["kept".to_string()]);
    }

    #[test]
    fn join_blocks_skips_whitespace_pages() {
        let joined = join_blocks(vec!["page one", "  \n ", "", "page three"]);
        assert_eq!(joined, "page one\npage three");
    }

    #[test]
    fn unsupported_format_is_rejected_without_io() {
        let err = extract(Path::new("/does/not/exist.txt"), DocumentFormat::Unsupported).unwrap_err();
        assert!(matches!(err, ReviewError::UnsupportedFormat));
    }

    #[test]
    fn missing_docx_is_unreadable() {
        let err = extract_docx(Path::new("/does/not/exist.docx")).unwrap_err();
        assert!(err.to_string().starts_with("Error reading .docx file:"));
    }
}
