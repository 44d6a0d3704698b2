//! Document and chunk types with source tracking

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Supported document formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain UTF-8 text
    Txt,
}

impl FileType {
    /// Resolve a declared format tag (`pdf`, `docx`, `txt`), case-insensitive
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.trim().to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" => Ok(Self::Txt),
            "" => Err(Error::UnsupportedFormat("missing file extension".to_string())),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    /// Resolve the format from a filename's last extension
    pub fn from_filename(filename: &str) -> Result<Self> {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::from_extension(""),
        }
    }

    /// Lowercase format tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document during ingestion: its source identifier and extracted text
#[derive(Debug, Clone)]
pub struct Document {
    /// Source identifier (the uploaded filename)
    pub source: String,
    /// Declared format
    pub file_type: FileType,
    /// Extracted plain text
    pub text: String,
}

impl Document {
    /// Create a new document
    pub fn new(source: impl Into<String>, file_type: FileType, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            file_type,
            text: text.into(),
        }
    }

    /// Number of whitespace-separated words
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// A contiguous word window of a source document; the retrieval unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text, words joined by single spaces
    pub text: String,
    /// Source document identifier
    pub source: String,
    /// Zero-based index of this chunk within its source
    pub position: usize,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(text: String, source: impl Into<String>, position: usize) -> Self {
        Self {
            text,
            source: source.into(),
            position,
        }
    }

    /// Index key of this chunk
    pub fn key(&self) -> ChunkKey {
        ChunkKey {
            source: self.source.clone(),
            position: self.position,
        }
    }

    /// Source reference used in answers
    pub fn source_ref(&self) -> ChunkSource {
        ChunkSource {
            source: self.source.clone(),
            position: self.position,
        }
    }
}

/// Unique key of an indexed chunk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub source: String,
    pub position: usize,
}

/// `{source, position}` metadata returned alongside answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Source document identifier
    pub source: String,
    /// Chunk position within the source
    pub position: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_extension("pdf").unwrap(), FileType::Pdf);
        assert_eq!(FileType::from_extension("DOCX").unwrap(), FileType::Docx);
        assert_eq!(FileType::from_extension("txt").unwrap(), FileType::Txt);

        assert!(matches!(
            FileType::from_extension("xlsx"),
            Err(Error::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn test_file_type_from_filename() {
        assert_eq!(FileType::from_filename("report.final.PDF").unwrap(), FileType::Pdf);
        assert_eq!(FileType::from_filename("notes.txt").unwrap(), FileType::Txt);
        assert!(matches!(
            FileType::from_filename("README"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(FileType::from_filename("legacy.doc").is_err());
    }

    #[test]
    fn test_chunk_key_and_source_ref() {
        let chunk = Chunk::new("some words".to_string(), "a.txt", 2);
        assert_eq!(
            chunk.key(),
            ChunkKey { source: "a.txt".to_string(), position: 2 }
        );
        assert_eq!(
            chunk.source_ref(),
            ChunkSource { source: "a.txt".to_string(), position: 2 }
        );
    }
}
