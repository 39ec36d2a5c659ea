//! Human-readable names for note clusters.

use std::collections::HashMap;

use crate::notes::Note;

/// Theme used when neither tags nor titles yield anything.
pub const UNTITLED_THEME: &str = "Untitled Cluster";

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "in", "on", "at", "to", "for", "of", "with", "is", "are",
];

/// Title-token length a word must exceed to count.
const MIN_TOKEN_LEN: usize = 3;

/// Name a cluster from its common tags, falling back to title keywords.
///
/// `common_tags` must already be ordered by frequency, most frequent first.
pub fn infer_theme(members: &[&Note], common_tags: &[String]) -> String {
    if !common_tags.is_empty() {
        return common_tags
            .iter()
            .take(2)
            .map(|tag| title_case(&tag.replace('-', " ")))
            .collect::<Vec<_>>()
            .join(" & ");
    }

    let keywords = top_title_words(members, 2);
    if keywords.is_empty() {
        return UNTITLED_THEME.to_string();
    }

    title_case(&keywords.join(" "))
}

/// Most frequent title tokens across `members`. Ties keep first appearance.
fn top_title_words(members: &[&Note], n: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    for note in members {
        for raw in note.title.to_lowercase().split_whitespace() {
            let word: String = raw
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            if word.chars().count() <= MIN_TOKEN_LEN || STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            let order = counts.len();
            counts.entry(word).or_insert((0, order)).0 += 1;
        }
    }

    let mut words: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    words.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    words.into_iter().take(n).map(|(word, _)| word).collect()
}

/// Uppercase every letter that follows a non-letter and lowercase the rest,
/// so `node.js` becomes `Node.Js`.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut after_letter = false;
    for c in s.chars() {
        if after_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        after_letter = c.is_alphabetic();
    }
    out
}
