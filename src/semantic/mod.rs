//! Embedding infrastructure for notes.
//!
//! This module provides local embeddings using fastembed-rs and a persistent
//! cache so each note is embedded once per modification.
//!
//! # Architecture
//!
//! - `embeddings`: Provider trait and the fastembed wrapper
//! - `storage`: Binary file I/O for embeddings.bin persistence
//! - `store`: Cache reconciliation against the current notes
//! - `vector`: Cosine similarity and centroid math

pub mod embeddings;
mod storage;
mod store;
pub mod vector;

pub use embeddings::{EmbeddingError, EmbeddingModel, EmbeddingProvider};
pub use store::{EmbeddingMap, EmbeddingStore, ProviderFactory, StoreError};

/// Default embedding model name, the one the note tooling has always used.
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Default cache file name inside the base directory.
pub const DEFAULT_CACHE_FILE: &str = "embeddings.bin";
