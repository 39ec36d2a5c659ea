//! Double-bracket link extraction.
//!
//! Index-page membership is derived from these links on every request and
//! never cached, so edits to a page are picked up by the next run.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::Note;

/// Matches `[[target]]` and `[[target|display text]]`.
static WIKI_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([^\]|]+)(?:\|[^\]]*)?\]\]").expect("wiki-link pattern is valid")
});

/// Normalize a link target to slug form: trimmed, lowercase, whitespace runs
/// replaced with a single hyphen.
pub fn normalize_slug(target: &str) -> String {
    target
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Distinct note identities referenced from `content`.
pub fn extract_links(content: &str) -> BTreeSet<String> {
    WIKI_LINK
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| normalize_slug(m.as_str()))
        .filter(|slug| !slug.is_empty())
        .collect()
}

/// Resolves the member set of an index page.
pub trait MemberSource {
    fn members(&self, page: &Note) -> BTreeSet<String>;
}

/// Reads the page's file and extracts its links on every call.
pub struct FileLinks;

impl MemberSource for FileLinks {
    fn members(&self, page: &Note) -> BTreeSet<String> {
        match std::fs::read_to_string(&page.path) {
            Ok(content) => extract_links(&content),
            Err(e) => {
                log::debug!("could not read index page {}: {e}", page.path.display());
                BTreeSet::new()
            }
        }
    }
}
