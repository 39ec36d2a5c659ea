//! Shared fixtures and cross-module tests.


use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, TimeZone, Utc};
use sha2::{Digest, Sha256};

use crate::notes::{MemberSource, Note, NoteRole, DEFAULT_KIND, INDEX_PAGE_KIND};
use crate::semantic::vector::normalized;
use crate::semantic::{EmbeddingError, EmbeddingProvider, ProviderFactory};

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Content note with no tags, authors or summary.
pub fn note(slug: &str, title: &str) -> Note {
    Note {
        slug: slug.to_string(),
        title: title.to_string(),
        kind: DEFAULT_KIND.to_string(),
        role: NoteRole::Content,
        tags: vec![],
        authors: vec![],
        summary: None,
        modified: fixed_time(),
        path: PathBuf::from(format!("{slug}.md")),
    }
}

/// Index page note.
pub fn map_page(slug: &str, title: &str) -> Note {
    Note {
        kind: INDEX_PAGE_KIND.to_string(),
        role: NoteRole::IndexPage,
        ..note(slug, title)
    }
}

/// Write a note file with frontmatter into `dir`.
pub fn write_note(dir: &Path, slug: &str, frontmatter: &str, body: &str) -> PathBuf {
    let path = dir.join(format!("{slug}.md"));
    std::fs::write(&path, format!("---\n{frontmatter}\n---\n{body}")).unwrap();
    path
}

/// In-memory index page membership.
pub struct StaticLinks {
    members: HashMap<String, BTreeSet<String>>,
}

impl StaticLinks {
    pub fn new(pages: &[(&str, &[&str])]) -> Self {
        Self {
            members: pages
                .iter()
                .map(|(page, slugs)| {
                    (
                        page.to_string(),
                        slugs.iter().map(|s| s.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl MemberSource for StaticLinks {
    fn members(&self, page: &Note) -> BTreeSet<String> {
        self.members.get(&page.slug).cloned().unwrap_or_default()
    }
}

/// Fake provider that records every text it embeds.
///
/// Texts listed in `fixed` get that vector; anything else gets a
/// deterministic pseudo-random unit vector.
#[derive(Clone)]
pub struct CountingProvider {
    pub calls: Rc<Cell<usize>>,
    pub texts: Rc<RefCell<Vec<String>>>,
    fixed: HashMap<String, Vec<f32>>,
    dimensions: usize,
    drop_last: bool,
}

impl CountingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            calls: Rc::new(Cell::new(0)),
            texts: Rc::new(RefCell::new(Vec::new())),
            fixed: HashMap::new(),
            dimensions,
            drop_last: false,
        }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        assert_eq!(vector.len(), self.dimensions);
        self.fixed.insert(text.to_string(), normalized(vector));
        self
    }

    /// Return one vector too few from batch calls.
    pub fn dropping_last(mut self) -> Self {
        self.drop_last = true;
        self
    }

    /// Factory handing out a clone that shares this provider's counters.
    pub fn factory(&self) -> ProviderFactory {
        let provider = self.clone();
        Box::new(move || Ok(Box::new(provider) as Box<dyn EmbeddingProvider>))
    }

    pub fn embedded_texts(&self) -> Vec<String> {
        self.texts.borrow().clone()
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(v) = self.fixed.get(text) {
            return v.clone();
        }
        let digest = Sha256::digest(text.as_bytes());
        let raw = (0..self.dimensions)
            .map(|i| digest[i % digest.len()] as f32 - 127.5)
            .collect();
        normalized(raw)
    }
}

impl EmbeddingProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.set(self.calls.get() + 1);
        self.texts.borrow_mut().push(text.to_string());
        Ok(self.vector_for(text))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.set(self.calls.get() + 1);
        self.texts.borrow_mut().extend(texts.iter().cloned());
        let mut vectors: Vec<Vec<f32>> = texts.iter().map(|t| self.vector_for(t)).collect();
        if self.drop_last {
            vectors.pop();
        }
        Ok(vectors)
    }
}
