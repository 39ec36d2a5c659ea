//! Analyses over embedded notes.
//!
//! - `scoring`: hybrid relatedness of one note to every other
//! - `gaps`: unlinked notes close to an index page's centroid
//! - `clusters`: density clusters of notes no index page links
//! - `suggest`: index pages a given note could join
//!
//! Everything here is pure computation over the loaded notes and their
//! embeddings. Nothing is persisted.

pub mod clusters;
#[cfg(feature = "clustering")]
mod dbscan;
pub mod gaps;
pub mod scoring;
pub mod suggest;
mod theme;

pub use clusters::{orphans, Cluster, OrphanClusterer};
pub use gaps::{CentroidGapDetector, GapReport};
pub use scoring::{tag_frequencies, HybridScorer, ScoredNote, ScoringWeights};
pub use suggest::{ForNoteSuggester, Suggestion};

/// Round a similarity to 3 decimal places for reporting.
pub(crate) fn round_score(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}

/// Stable sort, highest score first.
pub(crate) fn sort_by_score_desc<T>(items: &mut [T], score: impl Fn(&T) -> f32) {
    items.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
