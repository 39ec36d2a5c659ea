//! Notes that belong on an index page but are not linked from it.
//!
//! A page's topic is the normalized mean of its members' embeddings. Any
//! content note close enough to that centroid and not yet linked is a gap.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::analysis::{round_score, sort_by_score_desc};
use crate::notes::{MemberSource, Note};
use crate::semantic::{vector, EmbeddingMap};

#[derive(Debug, Clone, Serialize)]
pub struct MissingNote {
    pub slug: String,
    pub title: String,
    pub score: f32,
    pub shared_tags: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Gap candidates for one index page.
#[derive(Debug, Clone, Serialize)]
pub struct GapReport {
    #[serde(rename = "moc")]
    pub page: String,
    #[serde(rename = "moc_title")]
    pub page_title: String,
    pub current_members: usize,
    #[serde(rename = "missing_notes")]
    pub missing: Vec<MissingNote>,
}

/// Centroid of the members of a page that have an embedding.
pub(crate) fn member_centroid(
    members: &BTreeSet<String>,
    embeddings: &EmbeddingMap,
) -> Option<Vec<f32>> {
    vector::centroid(
        members
            .iter()
            .filter_map(|slug| embeddings.get(slug))
            .map(Vec::as_slice),
    )
}

pub struct CentroidGapDetector<'s> {
    members: &'s dyn MemberSource,
    threshold: f32,
}

impl<'s> CentroidGapDetector<'s> {
    pub fn new(members: &'s dyn MemberSource, threshold: f32) -> Self {
        Self { members, threshold }
    }

    /// One report per page with at least one candidate, in page order.
    pub fn find_gaps(
        &self,
        pages: &[&Note],
        all_notes: &[Note],
        embeddings: &EmbeddingMap,
    ) -> Vec<GapReport> {
        pages
            .iter()
            .filter_map(|page| self.page_gaps(page, all_notes, embeddings))
            .collect()
    }

    fn page_gaps(
        &self,
        page: &Note,
        all_notes: &[Note],
        embeddings: &EmbeddingMap,
    ) -> Option<GapReport> {
        let members = self.members.members(page);
        let Some(centroid) = member_centroid(&members, embeddings) else {
            log::debug!("Skipping {}: no embedded members", page.slug);
            return None;
        };

        let mut missing: Vec<MissingNote> = all_notes
            .iter()
            .filter(|note| {
                !note.is_index_page() && note.slug != page.slug && !members.contains(&note.slug)
            })
            .filter_map(|note| {
                let embedding = embeddings.get(&note.slug)?;
                let similarity = vector::cosine_similarity(&centroid, embedding);
                (similarity >= self.threshold).then(|| MissingNote {
                    slug: note.slug.clone(),
                    title: note.title.clone(),
                    score: round_score(similarity),
                    shared_tags: note.shared_tags(page).into_iter().map(String::from).collect(),
                    kind: note.kind.clone(),
                })
            })
            .collect();

        if missing.is_empty() {
            return None;
        }
        sort_by_score_desc(&mut missing, |m| m.score);

        Some(GapReport {
            page: page.slug.clone(),
            page_title: page.title.clone(),
            current_members: members.len(),
            missing,
        })
    }
}
