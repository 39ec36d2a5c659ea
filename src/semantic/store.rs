//! Embedding lifecycle for the note corpus.
//!
//! - Loads the persisted cache once at construction
//! - Lazily initializes the embedding provider on first need
//! - Recomputes only missing or stale entries, in one batch
//! - Rewrites the cache file once per run, only when something changed

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::notes::Note;
use crate::semantic::embeddings::{model_id_hash, EmbeddingError, EmbeddingProvider};
use crate::semantic::storage::{CacheStorage, CacheStorageError, CachedEmbedding};

/// Show a spinner when at least this many notes need embedding.
const SPINNER_MIN_TEXTS: usize = 10;

/// Deferred constructor for the embedding provider.
pub type ProviderFactory =
    Box<dyn FnOnce() -> Result<Box<dyn EmbeddingProvider>, EmbeddingError>>;

/// Embeddings keyed by slug.
pub type EmbeddingMap = HashMap<String, Vec<f32>>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Provider returned {got} embeddings for {expected} texts")]
    CountMismatch { expected: usize, got: usize },

    #[error("Provider was already consumed by a failed initialization")]
    ProviderUnavailable,
}

/// Owns the embedding cache and the deferred provider handle.
pub struct EmbeddingStore {
    storage: CacheStorage,
    model_id: [u8; 32],
    entries: HashMap<String, CachedEmbedding>,
    factory: Option<ProviderFactory>,
    provider: Option<Box<dyn EmbeddingProvider>>,
}

impl EmbeddingStore {
    /// Open the store, loading the cache at `cache_path` if it is usable.
    ///
    /// A missing, corrupt, or foreign-model cache is discarded; this never fails.
    pub fn open(cache_path: PathBuf, model_name: &str, factory: ProviderFactory) -> Self {
        let storage = CacheStorage::new(cache_path);
        let model_id = model_id_hash(model_name);
        let entries = Self::load_entries(&storage, &model_id);

        Self {
            storage,
            model_id,
            entries,
            factory: Some(factory),
            provider: None,
        }
    }

    fn load_entries(
        storage: &CacheStorage,
        model_id: &[u8; 32],
    ) -> HashMap<String, CachedEmbedding> {
        if !storage.exists() {
            log::info!("No embedding cache at {}, starting fresh", storage.path().display());
            return HashMap::new();
        }

        match storage.load(model_id) {
            Ok(entries) => {
                log::info!("Loaded {} cached embeddings", entries.len());
                entries
            }
            Err(CacheStorageError::ModelMismatch) => {
                log::warn!("Embedding model changed, discarding cache");
                HashMap::new()
            }
            Err(e) => {
                log::warn!("Could not load embedding cache, starting fresh: {e}");
                HashMap::new()
            }
        }
    }

    /// Drop every cached entry so the next `ensure_embeddings` recomputes all.
    pub fn rebuild(&mut self) {
        log::info!("Discarding {} cached embeddings", self.entries.len());
        self.entries.clear();
    }

    /// Return an embedding for every note, computing only missing or stale ones.
    pub fn ensure_embeddings<'a>(
        &mut self,
        notes: impl IntoIterator<Item = &'a Note>,
    ) -> Result<EmbeddingMap, StoreError> {
        let mut embeddings = EmbeddingMap::new();
        let mut stale: Vec<&Note> = Vec::new();

        for note in notes {
            match self.entries.get(&note.slug) {
                Some(cached) if cached.is_fresh_for(note.modified) => {
                    embeddings.insert(note.slug.clone(), cached.embedding.clone());
                }
                _ => stale.push(note),
            }
        }

        if stale.is_empty() {
            return Ok(embeddings);
        }

        let texts: Vec<String> = stale.iter().map(|n| n.text_for_embedding()).collect();
        let vectors = self.embed_batch(&texts)?;

        for (note, embedding) in stale.into_iter().zip(vectors) {
            self.entries.insert(
                note.slug.clone(),
                CachedEmbedding {
                    modified: note.modified,
                    embedding: embedding.clone(),
                },
            );
            embeddings.insert(note.slug.clone(), embedding);
        }

        self.save();

        Ok(embeddings)
    }

    fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, StoreError> {
        let provider = self.provider()?;

        log::info!("Generating embeddings for {} notes", texts.len());
        let spinner = (texts.len() >= SPINNER_MIN_TEXTS)
            .then(|| create_spinner(&format!("Embedding {} notes...", texts.len())));

        let result = match texts {
            [text] => provider.embed(text).map(|v| vec![v]),
            _ => provider.embed_batch(texts),
        };
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        let vectors = result?;
        if vectors.len() != texts.len() {
            return Err(StoreError::CountMismatch {
                expected: texts.len(),
                got: vectors.len(),
            });
        }

        Ok(vectors)
    }

    /// The provider, initializing it on first call.
    fn provider(&mut self) -> Result<&dyn EmbeddingProvider, StoreError> {
        if self.provider.is_none() {
            let factory = self.factory.take().ok_or(StoreError::ProviderUnavailable)?;
            let provider = factory()?;
            log::info!(
                "Embedding model '{}' ready ({} dimensions)",
                provider.name(),
                provider.dimensions()
            );
            self.provider = Some(provider);
        }

        self.provider
            .as_deref()
            .ok_or(StoreError::ProviderUnavailable)
    }

    fn save(&self) {
        match self.storage.save(&self.entries, &self.model_id) {
            Ok(()) => log::info!(
                "Saved {} embeddings to {}",
                self.entries.len(),
                self.storage.path().display()
            ),
            Err(e) => log::warn!("Could not save embedding cache: {e}"),
        }
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
