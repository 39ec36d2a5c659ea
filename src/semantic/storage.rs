//! Binary storage for the embedding cache.
//!
//! File format: embeddings.bin
//!
//! Header (47 bytes):
//! - version: u8 (1)
//! - model_id: [u8; 32] (SHA256 hash of model name)
//! - dimensions: u16 (little-endian)
//! - entry_count: u64 (little-endian)
//! - checksum: u32 (CRC32 of header fields before checksum)
//!
//! Entries (repeated):
//! - slug_len: u16 (little-endian)
//! - slug: [u8; slug_len] (UTF-8)
//! - modified: i64 (nanoseconds since the Unix epoch, little-endian)
//! - embedding: [f32; dimensions] (little-endian)

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Current file format version
const FORMAT_VERSION: u8 = 1;

/// Header size in bytes: version(1) + model_id(32) + dimensions(2) + entry_count(8) + checksum(4)
const HEADER_SIZE: usize = 47;

/// Upper bound on the map preallocation, whatever the header claims.
const MAX_PREALLOCATED_ENTRIES: usize = 1 << 16;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheStorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Version mismatch: file version {0}, supported version {1}")]
    VersionMismatch(u8, u8),

    #[error("Model mismatch: file uses different model")]
    ModelMismatch,

    #[error("Checksum mismatch: file may be corrupted")]
    ChecksumMismatch,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// A cached vector and the note timestamp it was computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEmbedding {
    pub modified: DateTime<Utc>,
    pub embedding: Vec<f32>,
}

impl CachedEmbedding {
    /// Valid for a note modified at `modified` unless the note changed since.
    pub fn is_fresh_for(&self, modified: DateTime<Utc>) -> bool {
        self.modified >= modified
    }
}

/// Storage manager for the embedding cache file.
pub struct CacheStorage {
    path: PathBuf,
}

impl CacheStorage {
    /// Create a new storage manager for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the storage file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the storage file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load every cached entry, keyed by slug.
    pub fn load(
        &self,
        expected_model_id: &[u8; 32],
    ) -> Result<HashMap<String, CachedEmbedding>, CacheStorageError> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);

        let header = Self::read_header(&mut reader)?;
        if header.model_id != *expected_model_id {
            return Err(CacheStorageError::ModelMismatch);
        }

        let capacity = usize::try_from(header.entry_count)
            .unwrap_or(usize::MAX)
            .min(MAX_PREALLOCATED_ENTRIES);
        let mut entries = HashMap::with_capacity(capacity);
        for _ in 0..header.entry_count {
            let (slug, entry) = Self::read_entry(&mut reader, header.dimensions as usize)?;
            entries.insert(slug, entry);
        }

        Ok(entries)
    }

    /// Save all entries, replacing the file.
    ///
    /// Uses atomic write: temp file -> fsync -> rename
    pub fn save(
        &self,
        entries: &HashMap<String, CachedEmbedding>,
        model_id: &[u8; 32],
    ) -> Result<(), CacheStorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("tmp");

        let result = Self::write_to_file(&temp_path, entries, model_id);

        if result.is_err() {
            // Clean up temp file on error
            let _ = std::fs::remove_file(&temp_path);
            return result;
        }

        std::fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    fn write_to_file(
        path: &Path,
        entries: &HashMap<String, CachedEmbedding>,
        model_id: &[u8; 32],
    ) -> Result<(), CacheStorageError> {
        let dimensions = entries
            .values()
            .next()
            .map(|e| e.embedding.len())
            .unwrap_or(0);

        if let Some(bad) = entries.values().find(|e| e.embedding.len() != dimensions) {
            return Err(CacheStorageError::DimensionMismatch {
                expected: dimensions,
                got: bad.embedding.len(),
            });
        }

        let dimensions = u16::try_from(dimensions).map_err(|_| {
            CacheStorageError::InvalidFormat(format!("{dimensions} dimensions do not fit the header"))
        })?;

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let header = Header {
            version: FORMAT_VERSION,
            model_id: *model_id,
            dimensions,
            entry_count: entries.len() as u64,
        };
        Self::write_header(&mut writer, &header)?;

        // Sorted so identical caches produce identical files
        let mut slugs: Vec<&String> = entries.keys().collect();
        slugs.sort();
        for slug in slugs {
            Self::write_entry(&mut writer, slug, &entries[slug])?;
        }

        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;

        Ok(())
    }

    fn read_header(reader: &mut impl Read) -> Result<Header, CacheStorageError> {
        let mut header_bytes = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header_bytes)?;

        let version = header_bytes[0];
        if version != FORMAT_VERSION {
            return Err(CacheStorageError::VersionMismatch(version, FORMAT_VERSION));
        }

        // Verify checksum (computed over header without checksum field)
        let stored_checksum = u32::from_le_bytes([
            header_bytes[43],
            header_bytes[44],
            header_bytes[45],
            header_bytes[46],
        ]);
        if stored_checksum != crc32fast::hash(&header_bytes[0..43]) {
            return Err(CacheStorageError::ChecksumMismatch);
        }

        let mut model_id = [0u8; 32];
        model_id.copy_from_slice(&header_bytes[1..33]);

        let dimensions = u16::from_le_bytes([header_bytes[33], header_bytes[34]]);
        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&header_bytes[35..43]);
        let entry_count = u64::from_le_bytes(count_bytes);

        Ok(Header {
            version,
            model_id,
            dimensions,
            entry_count,
        })
    }

    fn write_header(writer: &mut impl Write, header: &Header) -> Result<(), CacheStorageError> {
        let mut header_bytes = [0u8; HEADER_SIZE];

        header_bytes[0] = header.version;
        header_bytes[1..33].copy_from_slice(&header.model_id);
        header_bytes[33..35].copy_from_slice(&header.dimensions.to_le_bytes());
        header_bytes[35..43].copy_from_slice(&header.entry_count.to_le_bytes());

        let checksum = crc32fast::hash(&header_bytes[0..43]);
        header_bytes[43..47].copy_from_slice(&checksum.to_le_bytes());

        writer.write_all(&header_bytes)?;
        Ok(())
    }

    fn read_entry(
        reader: &mut impl Read,
        dimensions: usize,
    ) -> Result<(String, CachedEmbedding), CacheStorageError> {
        let mut len_bytes = [0u8; 2];
        reader.read_exact(&mut len_bytes)?;
        let mut slug_bytes = vec![0u8; u16::from_le_bytes(len_bytes) as usize];
        reader.read_exact(&mut slug_bytes)?;
        let slug = String::from_utf8(slug_bytes)
            .map_err(|e| CacheStorageError::InvalidFormat(format!("slug is not UTF-8: {e}")))?;

        let mut modified_bytes = [0u8; 8];
        reader.read_exact(&mut modified_bytes)?;
        let modified = DateTime::from_timestamp_nanos(i64::from_le_bytes(modified_bytes));

        let mut embedding = Vec::with_capacity(dimensions);
        for _ in 0..dimensions {
            let mut float_bytes = [0u8; 4];
            reader.read_exact(&mut float_bytes)?;
            embedding.push(f32::from_le_bytes(float_bytes));
        }

        Ok((slug, CachedEmbedding { modified, embedding }))
    }

    fn write_entry(
        writer: &mut impl Write,
        slug: &str,
        entry: &CachedEmbedding,
    ) -> Result<(), CacheStorageError> {
        let slug_len = u16::try_from(slug.len()).map_err(|_| {
            CacheStorageError::InvalidFormat(format!("slug too long: {} bytes", slug.len()))
        })?;
        writer.write_all(&slug_len.to_le_bytes())?;
        writer.write_all(slug.as_bytes())?;

        let modified = entry.modified.timestamp_nanos_opt().unwrap_or(i64::MAX);
        writer.write_all(&modified.to_le_bytes())?;

        for &value in &entry.embedding {
            writer.write_all(&value.to_le_bytes())?;
        }

        Ok(())
    }
}

/// File header structure.
#[derive(Debug)]
struct Header {
    version: u8,
    model_id: [u8; 32],
    dimensions: u16,
    entry_count: u64,
}
