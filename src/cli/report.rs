//! Output of the `related` and `curate` commands.

use std::fmt;

use serde::Serialize;

use crate::analysis::{Cluster, GapReport, ScoredNote, Suggestion};
use crate::mentions::Mention;
use crate::notes::Note;

/// Mentions printed under the related notes.
const MAX_MENTIONS: usize = 5;
/// Characters of each mention snippet printed.
const SNIPPET_LEN: usize = 60;
const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone)]
pub struct RelatedEntry {
    pub slug: String,
    pub kind: String,
    pub authors: Vec<String>,
    pub tags: Vec<String>,
    pub score: f32,
    pub breakdown: Vec<String>,
}

impl From<&ScoredNote<'_>> for RelatedEntry {
    fn from(scored: &ScoredNote<'_>) -> Self {
        Self {
            slug: scored.note.slug.clone(),
            kind: scored.note.kind.clone(),
            authors: scored.note.authors.clone(),
            tags: scored.note.tags.clone(),
            score: scored.score,
            breakdown: scored.breakdown.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelatedReport {
    pub target_slug: String,
    pub target_title: String,
    pub entries: Vec<RelatedEntry>,
    pub mentions: Vec<Mention>,
}

impl RelatedReport {
    pub fn new(target: &Note, ranked: &[ScoredNote<'_>], mentions: Vec<Mention>) -> Self {
        Self {
            target_slug: target.slug.clone(),
            target_title: target.title.clone(),
            entries: ranked.iter().map(RelatedEntry::from).collect(),
            mentions,
        }
    }
}

impl fmt::Display for RelatedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        writeln!(f, "\n{heavy}\n RELATED NOTES for: {}\n{heavy}\n", self.target_slug)?;

        if self.entries.is_empty() {
            return writeln!(f, "No related notes found above the score threshold.\n");
        }

        writeln!(f, "Found {} related notes (sorted by relevance):\n", self.entries.len())?;

        for (i, entry) in self.entries.iter().enumerate() {
            writeln!(f, "{light}")?;
            writeln!(f, "{}. [[{}]] - score: {:.0}", i + 1, entry.slug, entry.score)?;
            writeln!(f, "{light}")?;
            writeln!(
                f,
                "   Type: {} | Authors: {}",
                entry.kind,
                join_or_none(&entry.authors)
            )?;
            writeln!(f, "   Tags: {}\n", join_or_none(&entry.tags))?;
            writeln!(f, "   Score breakdown:")?;
            for line in &entry.breakdown {
                writeln!(f, "     {line}")?;
            }
            writeln!(f)?;
        }

        if !self.mentions.is_empty() {
            writeln!(f, "\n{light}")?;
            writeln!(f, "MENTIONS (unlinked references to \"{}\"):", self.target_title)?;
            writeln!(f, "{light}")?;
            for mention in self.mentions.iter().take(MAX_MENTIONS) {
                let snippet: String = mention.snippet.chars().take(SNIPPET_LEN).collect();
                writeln!(f, "  [[{}]] - \"{snippet}...\"", mention.slug)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "{heavy}")
    }
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}

/// JSON document printed by `curate`. Only the sections the mode asked for
/// are present.
#[derive(Debug, Default, Serialize)]
pub struct CurationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moc_updates: Option<Vec<GapReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_clusters: Option<Vec<Cluster>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_note: Option<Vec<Suggestion>>,
}

impl CurationReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
