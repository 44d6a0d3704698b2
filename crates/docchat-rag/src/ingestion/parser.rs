//! Document text extraction for PDF, DOCX and plain text

use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::FileType;

/// How long pdf-extract may run before falling back to lopdf
const PDF_EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Retries for transient disk reads
const READ_RETRIES: u32 = 3;

/// Glyph artifacts left by some PDF fonts and their plain replacements
const PDF_GLYPH_REPLACEMENTS: &[(&str, &str)] = &[
    ("\u{0000}", ""),
    ("\u{00A0}", " "),
    ("\u{2010}", "-"),
    ("\u{2011}", "-"),
    ("\u{2013}", "-"),
    ("\u{2014}", "--"),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{201C}", "\""),
    ("\u{201D}", "\""),
    ("\u{2022}", "* "),
    ("\u{2026}", "..."),
    ("\u{FB00}", "ff"),
    ("\u{FB01}", "fi"),
    ("\u{FB02}", "fl"),
    ("\u{FB03}", "ffi"),
    ("\u{FB04}", "ffl"),
];

/// Normalise PDF glyph artifacts and drop blank lines
fn cleanup_pdf_text(text: &str) -> String {
    let mut result = text.to_string();
    for (glyph, replacement) in PDF_GLYPH_REPLACEMENTS {
        if result.contains(glyph) {
            result = result.replace(glyph, replacement);
        }
    }

    result
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extracted document text with metadata
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Declared format
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
    /// SHA-256 of the extracted text, for logging
    pub content_hash: String,
    /// Total pages (PDF only)
    pub total_pages: Option<u32>,
}

impl ParsedDocument {
    fn new(file_type: FileType, content: String, total_pages: Option<u32>) -> Self {
        Self {
            file_type,
            content_hash: hash_content(&content),
            content,
            total_pages,
        }
    }
}

/// Document text extractor
pub struct FileParser;

impl FileParser {
    /// Extract text from raw bytes of the declared format
    ///
    /// `filename` is only used in error messages.
    pub fn parse(file_type: FileType, filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Docx => Self::parse_docx(filename, data),
            FileType::Txt => Self::parse_text(filename, data),
        }
    }

    /// Read a document from disk, retrying transient I/O failures
    pub fn read_path(path: &Path) -> Result<(String, FileType, Vec<u8>)> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::config(format!("not a file path: {}", path.display())))?;
        let file_type = FileType::from_filename(&filename)?;

        let mut attempt = 0;
        loop {
            match std::fs::read(path) {
                Ok(data) => return Ok((filename, file_type, data)),
                Err(e) => {
                    let err = Error::from(e);
                    if !err.is_retryable() || attempt >= READ_RETRIES {
                        return Err(err);
                    }
                    attempt += 1;
                    let delay = Duration::from_millis(50 * 2u64.pow(attempt));
                    tracing::warn!(
                        "Read of {} failed (attempt {}), retrying in {:?}: {}",
                        path.display(),
                        attempt,
                        delay,
                        err
                    );
                    std::thread::sleep(delay);
                }
            }
        }
    }

    /// Parse PDF document
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let raw = Self::extract_pdf_with_timeout(filename, data)?;
        let content = cleanup_pdf_text(&raw);

        if content.trim().is_empty() {
            return Err(Error::extraction(
                filename,
                "No text content could be extracted from PDF",
            ));
        }

        let total_pages = lopdf::Document::load_mem(data)
            .ok()
            .map(|doc| doc.get_pages().len() as u32);

        Ok(ParsedDocument::new(FileType::Pdf, content, total_pages))
    }

    /// Run pdf-extract on a watchdog thread so problematic fonts cannot hang ingestion
    fn extract_pdf_with_timeout(filename: &str, data: &[u8]) -> Result<String> {
        use std::sync::mpsc;
        use std::thread;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(PDF_EXTRACT_TIMEOUT) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                if text.trim().is_empty() {
                    tracing::debug!("pdf-extract found no text in {}, trying fallback", filename);
                    Self::extract_pdf_text_fallback(filename, data)
                } else {
                    Ok(text)
                }
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                tracing::warn!("pdf-extract failed for {}: {}, trying fallback", filename, e);
                Self::extract_pdf_text_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The thread cannot be killed; it is left to finish on its own
                tracing::error!(
                    "PDF extraction of {} timed out after {:?}",
                    filename,
                    PDF_EXTRACT_TIMEOUT
                );
                Self::extract_pdf_text_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread for {} crashed", filename);
                Self::extract_pdf_text_fallback(filename, data)
            }
        }
    }

    /// Fallback PDF text extraction using lopdf directly
    fn extract_pdf_text_fallback(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::extraction(filename, format!("Failed to load PDF: {}", e)))?;

        let mut all_text = String::new();
        for page_num in doc.get_pages().keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(text) if !text.trim().is_empty() => {
                    all_text.push_str(&text);
                    all_text.push('\n');
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Could not extract text from page {} of {}: {}", page_num, filename, e);
                }
            }
        }

        if all_text.trim().is_empty() {
            return Err(Error::extraction(
                filename,
                "PDF appears to be image-based or has no extractable text",
            ));
        }

        Ok(all_text)
    }

    /// Parse DOCX document, one paragraph per line
    fn parse_docx(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc = docx_rs::read_docx(data)
            .map_err(|e| Error::extraction(filename, format!("Failed to read DOCX: {}", e)))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(ParsedDocument::new(FileType::Docx, content, None))
    }

    /// Parse strict UTF-8 text
    fn parse_text(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        let content = std::str::from_utf8(data)
            .map_err(|e| Error::extraction(filename, format!("Invalid UTF-8: {}", e)))?
            .to_string();

        Ok(ParsedDocument::new(FileType::Txt, content, None))
    }
}

/// Hash content for logging and duplicate detection
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
