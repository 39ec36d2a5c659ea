//! Note records loaded from a directory of markdown files.
//!
//! - `frontmatter`: fixed metadata schema parsed from the leading YAML block
//! - `links`: double-bracket link extraction and index-page membership

mod frontmatter;
pub mod links;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

pub use frontmatter::Frontmatter;
pub use links::{extract_links, normalize_slug, FileLinks, MemberSource};

/// Type value that marks a note as an index page (map of content).
pub const INDEX_PAGE_KIND: &str = "map";

/// Type assigned to notes whose frontmatter has no `type` field.
pub const DEFAULT_KIND: &str = "note";

/// Directory whose files describe authors rather than notes.
const AUTHORS_DIR: &str = "authors";

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not list content directory {path}: {source}")]
    ListDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no notes found in {0}")]
    NoNotes(PathBuf),
}

/// Role of a note in the corpus, derived once from its type at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteRole {
    IndexPage,
    Content,
}

impl NoteRole {
    pub fn from_kind(kind: &str) -> Self {
        if kind == INDEX_PAGE_KIND {
            NoteRole::IndexPage
        } else {
            NoteRole::Content
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub slug: String,
    pub title: String,
    pub kind: String,
    pub role: NoteRole,
    pub tags: Vec<String>,
    pub authors: Vec<String>,
    pub summary: Option<String>,
    pub modified: DateTime<Utc>,
    pub path: PathBuf,
}

impl Note {
    /// Build a note from parsed frontmatter, applying the schema defaults.
    ///
    /// The slug is `stem` in link form, so it matches what page links resolve to.
    pub fn from_frontmatter(
        stem: &str,
        path: PathBuf,
        frontmatter: Frontmatter,
        modified: DateTime<Utc>,
    ) -> Self {
        let kind = frontmatter
            .kind
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_KIND.to_string());
        let title = frontmatter
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| stem.to_string());
        let summary = frontmatter.summary.filter(|s| !s.trim().is_empty());

        Self {
            slug: normalize_slug(stem),
            title,
            role: NoteRole::from_kind(&kind),
            kind,
            tags: dedup(frontmatter.tags),
            authors: dedup(frontmatter.authors),
            summary,
            modified,
            path,
        }
    }

    pub fn is_index_page(&self) -> bool {
        self.role == NoteRole::IndexPage
    }

    /// Text handed to the embedding provider: title, then summary when present.
    pub fn text_for_embedding(&self) -> String {
        match &self.summary {
            Some(summary) => format!("{} {}", self.title, summary),
            None => self.title.clone(),
        }
    }

    /// Tags carried by both notes, in this note's tag order.
    pub fn shared_tags<'a>(&'a self, other: &Note) -> Vec<&'a str> {
        self.tags
            .iter()
            .filter(|tag| other.tags.contains(tag))
            .map(String::as_str)
            .collect()
    }

    pub fn shared_authors<'a>(&'a self, other: &Note) -> Vec<&'a str> {
        self.authors
            .iter()
            .filter(|author| other.authors.contains(author))
            .map(String::as_str)
            .collect()
    }
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

/// Look a loaded note up by slug.
pub fn find<'a>(notes: &'a [Note], slug: &str) -> Option<&'a Note> {
    notes.iter().find(|note| note.slug == slug)
}

/// Loads notes (metadata only) from a content directory.
pub struct NoteRepository {
    content_dir: PathBuf,
}

impl NoteRepository {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
        }
    }

    /// Load every `*.md` file directly inside the content directory.
    ///
    /// Unreadable files are skipped with a warning, files without a valid
    /// metadata block are skipped silently. Returns `NoteError::NoNotes` when
    /// nothing usable is left.
    pub fn load_all(&self) -> Result<Vec<Note>, NoteError> {
        let entries = std::fs::read_dir(&self.content_dir).map_err(|source| NoteError::ListDir {
            path: self.content_dir.clone(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
            .collect();
        paths.sort();

        let mut seen = HashSet::new();
        let mut notes = Vec::with_capacity(paths.len());

        for path in paths {
            match Self::load_note(&path) {
                Ok(Some(note)) => {
                    if seen.insert(note.slug.clone()) {
                        notes.push(note);
                    } else {
                        log::warn!("duplicate slug '{}' at {}, skipping", note.slug, path.display());
                    }
                }
                Ok(None) => log::debug!("{} is not a note, skipping", path.display()),
                Err(e) => log::warn!("{e}"),
            }
        }

        if notes.is_empty() {
            return Err(NoteError::NoNotes(self.content_dir.clone()));
        }

        log::debug!("loaded {} notes from {}", notes.len(), self.content_dir.display());
        Ok(notes)
    }

    /// Parse a single note file.
    ///
    /// `Ok(None)` means the file is not a note: it lives in the authors
    /// collection or has no well-formed metadata block.
    pub fn load_note(path: &Path) -> Result<Option<Note>, NoteError> {
        let in_authors_dir = path
            .parent()
            .and_then(|p| p.file_name())
            .is_some_and(|name| name == AUTHORS_DIR);
        if in_authors_dir {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| NoteError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let Some(frontmatter) = Frontmatter::parse(&content) else {
            return Ok(None);
        };

        let Some(stem) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !normalize_slug(s).is_empty())
        else {
            return Ok(None);
        };

        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .map_err(|source| NoteError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Some(Note::from_frontmatter(
            stem,
            path.to_path_buf(),
            frontmatter,
            modified,
        )))
    }
}
