//! On-disk format for a [`VectorIndex`].
//!
//! The index directory holds one SQLite file with a key/value `manifest`
//! table and a `chunks` table. Saving writes a sibling temp file and renames
//! it over the live one, so a crash mid-save never leaves a half-written index.

use super::{IndexedChunk, VectorIndex};
use crate::chunking::DocumentChunk;
use crate::embedding::EmbeddingIdentity;
use crate::error::{HelperError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use tracing::{debug, info, instrument};

/// File name of the serialized index inside the index directory.
pub const INDEX_FILE_NAME: &str = "index.sqlite";

const FORMAT_VERSION: &str = "1";

const SCHEMA: &str = r#"
    CREATE TABLE manifest (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE chunks (
        position INTEGER PRIMARY KEY,
        source TEXT NOT NULL,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL
    );
"#;

/// Serialize embedding to bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from bytes.
fn bytes_to_embedding(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(HelperError::VectorStore(format!(
            "embedding blob of {} bytes is not a whole number of f32s",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Persist an index into `dir`, replacing any previous one.
#[instrument(skip(index), fields(chunks = index.len()))]
pub fn save_index(dir: &Path, index: &VectorIndex) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    let final_path = dir.join(INDEX_FILE_NAME);
    let tmp_path = dir.join(format!("{}.tmp", INDEX_FILE_NAME));
    if tmp_path.exists() {
        std::fs::remove_file(&tmp_path)?;
    }

    {
        let mut conn = Connection::open(&tmp_path)?;
        conn.execute_batch(SCHEMA)?;

        let tx = conn.transaction()?;
        {
            let mut manifest = tx.prepare("INSERT INTO manifest (key, value) VALUES (?1, ?2)")?;
            let identity = index.identity();
            manifest.execute(params!["format_version", FORMAT_VERSION])?;
            manifest.execute(params!["embedding_model", identity.model])?;
            manifest.execute(params![
                "embedding_dimensions",
                identity.dimensions.map(|d| d.to_string()).unwrap_or_default()
            ])?;
            manifest.execute(params!["built_at", index.built_at().to_rfc3339()])?;
            manifest.execute(params!["chunk_count", index.len().to_string()])?;

            let mut insert = tx.prepare(
                "INSERT INTO chunks (position, source, chunk_index, content, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for entry in index.entries() {
                insert.execute(params![
                    entry.chunk.position as i64,
                    entry.chunk.source,
                    entry.chunk.chunk_index as i64,
                    entry.chunk.content,
                    embedding_to_bytes(&entry.embedding),
                ])?;
            }
        }
        tx.commit()?;
    }

    std::fs::rename(&tmp_path, &final_path)?;
    info!("Saved vector index to {:?}", final_path);
    Ok(())
}

/// Load the index persisted in `dir`.
///
/// Returns `Ok(None)` when there is nothing to load. An index built with a
/// different embedding identity is an [`HelperError::EmbeddingMismatch`].
#[instrument(skip(expected))]
pub fn load_index(dir: &Path, expected: &EmbeddingIdentity) -> Result<Option<VectorIndex>> {
    let path = dir.join(INDEX_FILE_NAME);
    if !path.is_file() {
        debug!("No persisted index at {:?}", path);
        return Ok(None);
    }

    let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

    let manifest = |key: &str| -> Result<String> {
        conn.query_row("SELECT value FROM manifest WHERE key = ?1", [key], |row| row.get(0))
            .optional()?
            .ok_or_else(|| HelperError::VectorStore(format!("manifest is missing '{}'", key)))
    };

    let version = manifest("format_version")?;
    if version != FORMAT_VERSION {
        return Err(HelperError::VectorStore(format!(
            "unsupported index format version {}",
            version
        )));
    }

    let dimensions = manifest("embedding_dimensions")?;
    let found = EmbeddingIdentity {
        model: manifest("embedding_model")?,
        dimensions: if dimensions.is_empty() {
            None
        } else {
            Some(dimensions.parse().map_err(|_| {
                HelperError::VectorStore(format!("bad embedding_dimensions '{}'", dimensions))
            })?)
        },
    };
    if &found != expected {
        return Err(HelperError::EmbeddingMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }

    let built_at = manifest("built_at")?;
    let built_at = DateTime::parse_from_rfc3339(&built_at)
        .map_err(|e| HelperError::VectorStore(format!("bad built_at '{}': {}", built_at, e)))?
        .with_timezone(&Utc);

    let expected_count: usize = manifest("chunk_count")?
        .parse()
        .map_err(|_| HelperError::VectorStore("bad chunk_count".to_string()))?;

    let mut stmt = conn.prepare(
        "SELECT position, source, chunk_index, content, embedding FROM chunks ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Vec<u8>>(4)?,
        ))
    })?;

    let mut entries = Vec::with_capacity(expected_count);
    for row in rows {
        let (position, source, chunk_index, content, blob) = row?;
        entries.push(IndexedChunk {
            chunk: DocumentChunk {
                source,
                content,
                position: position as usize,
                chunk_index: chunk_index as usize,
            },
            embedding: bytes_to_embedding(&blob)?,
        });
    }

    if entries.len() != expected_count {
        return Err(HelperError::VectorStore(format!(
            "manifest lists {} chunks but {} were found",
            expected_count,
            entries.len()
        )));
    }

    info!("Loaded vector index with {} chunks from {:?}", entries.len(), path);
    Ok(Some(VectorIndex::from_parts(found, entries, built_at)))
}
