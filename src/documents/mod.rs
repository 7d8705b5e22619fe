//! Knowledge base loading.
//!
//! Walks the document directory, picks an extractor per file extension and
//! returns one [`RawDocument`] per readable file. Unsupported extensions are
//! ignored; files that fail to extract are skipped with a warning.

mod extract;

pub use extract::extract_text;

use crate::error::{HelperError, Result};
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Source formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Pdf,
    Word,
    Html,
    Json,
}

impl DocumentFormat {
    /// Map a file extension (without the dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "md" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "docx" | "doc" => Some(Self::Word),
            "html" | "htm" => Some(Self::Html),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Detect the format of a path from its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFormat::Text => write!(f, "text"),
            DocumentFormat::Pdf => write!(f, "pdf"),
            DocumentFormat::Word => write!(f, "word"),
            DocumentFormat::Html => write!(f, "html"),
            DocumentFormat::Json => write!(f, "json"),
        }
    }
}

/// Text extracted from one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Path relative to the knowledge base root, with `/` separators.
    pub source: String,
    pub format: DocumentFormat,
    pub text: String,
}

/// Per-run loading statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
    pub unsupported: usize,
}

/// Load every supported document under `root`, in file-name order.
///
/// A missing root is treated as an empty corpus.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn load_directory(root: &Path) -> Result<(Vec<RawDocument>, LoadReport)> {
    let mut documents = Vec::new();
    let mut report = LoadReport::default();

    if !root.exists() {
        warn!("Knowledge base directory {:?} does not exist", root);
        return Ok((documents, report));
    }

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                report.skipped += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(format) = DocumentFormat::from_path(path) else {
            debug!("Ignoring unsupported file {:?}", path);
            report.unsupported += 1;
            continue;
        };

        let source = relative_source(root, path);
        match std::fs::read(path)
            .map_err(HelperError::from)
            .and_then(|bytes| extract_text(&bytes, format))
        {
            Ok(text) => {
                debug!("Loaded {} ({}, {} chars)", source, format, text.chars().count());
                documents.push(RawDocument { source, format, text });
                report.loaded += 1;
            }
            Err(e) => {
                warn!("Failed to load {} file {}: {}", format, source, e);
                report.skipped += 1;
            }
        }
    }

    info!(
        "Loaded {} documents ({} skipped, {} unsupported)",
        report.loaded, report.skipped, report.unsupported
    );
    Ok((documents, report))
}

fn relative_source(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
