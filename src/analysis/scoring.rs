//! Hybrid relatedness score between two notes.
//!
//! The score adds up independent contributions:
//! - semantic similarity of the embeddings, scaled to roughly 0..50
//! - shared tags, each weighted by rarity: `tag_weight / ln(1 + frequency)`
//! - a flat bonus when at least one author is shared
//! - a small bonus for matching non-generic types
//!
//! Every contribution also produces a human-readable breakdown line.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analysis::sort_by_score_desc;
use crate::notes::Note;
use crate::semantic::{vector, EmbeddingMap};

/// Number of notes carrying each tag.
pub type TagFrequencies = HashMap<String, usize>;

/// Tunable weights. The defaults are empirically chosen, not invariants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Multiplier for cosine similarity
    pub semantic_weight: f32,
    /// Numerator of the per-tag rarity weight
    pub tag_weight: f32,
    /// Flat bonus for at least one shared author
    pub author_bonus: f32,
    /// Flat bonus for the same non-generic type
    pub type_bonus: f32,
    /// Types too common to earn the type bonus
    pub generic_types: Vec<String>,
    /// Tags used by at most this many notes are labelled rare
    pub rare_tag_max: usize,
    /// Tags used by at least this many notes are labelled common
    pub common_tag_min: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            semantic_weight: 50.0,
            tag_weight: 10.0,
            author_bonus: 15.0,
            type_bonus: 3.0,
            generic_types: vec!["note".to_string(), "evergreen".to_string()],
            rare_tag_max: 3,
            common_tag_min: 10,
        }
    }
}

/// A candidate with its total score and score breakdown.
#[derive(Debug, Clone)]
pub struct ScoredNote<'a> {
    pub note: &'a Note,
    pub score: f32,
    pub breakdown: Vec<String>,
}

/// Count how many notes carry each tag.
pub fn tag_frequencies(notes: &[Note]) -> TagFrequencies {
    let mut freq = TagFrequencies::new();
    for note in notes {
        for tag in &note.tags {
            *freq.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    freq
}

pub struct HybridScorer {
    weights: ScoringWeights,
}

impl HybridScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Score `candidate` against `target`.
    pub fn score(
        &self,
        target: &Note,
        candidate: &Note,
        target_vec: &[f32],
        candidate_vec: &[f32],
        tag_freq: &TagFrequencies,
    ) -> (f32, Vec<String>) {
        let w = &self.weights;
        let mut breakdown = Vec::new();

        let similarity = vector::cosine_similarity(target_vec, candidate_vec);
        let semantic = similarity * w.semantic_weight;
        let mut score = semantic;
        breakdown.push(format!(
            "{:+.0}  Semantic similarity ({:.2}%)",
            semantic,
            similarity * 100.0
        ));

        let shared_tags = target.shared_tags(candidate);
        if !shared_tags.is_empty() {
            let mut tag_score = 0.0;
            let mut details = Vec::with_capacity(shared_tags.len());
            for tag in shared_tags {
                let freq = tag_freq.get(tag).copied().unwrap_or(1).max(1);
                tag_score += self.tag_rarity_weight(freq);
                details.push(match self.rarity_label(freq) {
                    Some(label) => format!("{tag} ({label})"),
                    None => tag.to_string(),
                });
            }
            score += tag_score;
            breakdown.push(format!("{:+.0}  Shared tags: {}", tag_score, details.join(", ")));
        }

        let shared_authors = target.shared_authors(candidate);
        if !shared_authors.is_empty() {
            score += w.author_bonus;
            breakdown.push(format!(
                "{:+.0}  Same author: {}",
                w.author_bonus,
                shared_authors.join(", ")
            ));
        }

        if target.kind == candidate.kind && !w.generic_types.contains(&target.kind) {
            score += w.type_bonus;
            breakdown.push(format!("{:+.0}   Same type: {}", w.type_bonus, target.kind));
        }

        (score, breakdown)
    }

    /// Weight of one shared tag used by `freq` notes in the corpus.
    pub fn tag_rarity_weight(&self, freq: usize) -> f32 {
        self.weights.tag_weight / (1.0 + freq.max(1) as f32).ln()
    }

    fn rarity_label(&self, freq: usize) -> Option<&'static str> {
        if freq <= self.weights.rare_tag_max {
            Some("rare")
        } else if freq >= self.weights.common_tag_min {
            Some("common")
        } else {
            None
        }
    }

    /// Score every candidate against `target` and keep the best.
    ///
    /// Candidates without an embedding and the target itself are skipped.
    /// Results scoring below `min_score` are dropped; the rest are sorted by
    /// score descending (ties keep input order) and truncated to `limit`.
    pub fn rank<'a>(
        &self,
        target: &Note,
        candidates: &'a [Note],
        embeddings: &EmbeddingMap,
        tag_freq: &TagFrequencies,
        min_score: f32,
        limit: usize,
    ) -> Vec<ScoredNote<'a>> {
        let Some(target_vec) = embeddings.get(&target.slug) else {
            return Vec::new();
        };

        let mut scored: Vec<ScoredNote<'a>> = candidates
            .iter()
            .filter(|candidate| candidate.slug != target.slug)
            .filter_map(|candidate| {
                let candidate_vec = embeddings.get(&candidate.slug)?;
                let (score, breakdown) =
                    self.score(target, candidate, target_vec, candidate_vec, tag_freq);
                (score >= min_score).then_some(ScoredNote {
                    note: candidate,
                    score,
                    breakdown,
                })
            })
            .collect();

        sort_by_score_desc(&mut scored, |s| s.score);
        scored.truncate(limit);

        scored
    }
}
