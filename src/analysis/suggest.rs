//! Index pages a single note could be added to.

use serde::Serialize;

use crate::analysis::gaps::member_centroid;
use crate::analysis::{round_score, sort_by_score_desc};
use crate::notes::{MemberSource, Note};
use crate::semantic::{vector, EmbeddingMap};

/// Shared tags listed in a suggestion reason.
const MAX_REASON_TAGS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    #[serde(rename = "moc")]
    pub page: String,
    #[serde(rename = "moc_title")]
    pub page_title: String,
    pub score: f32,
    pub reason: String,
}

pub struct ForNoteSuggester<'s> {
    members: &'s dyn MemberSource,
    threshold: f32,
}

impl<'s> ForNoteSuggester<'s> {
    pub fn new(members: &'s dyn MemberSource, threshold: f32) -> Self {
        Self { members, threshold }
    }

    /// Pages not yet linking `note` whose member centroid is close to it.
    pub fn suggest(
        &self,
        note: &Note,
        pages: &[&Note],
        embeddings: &EmbeddingMap,
    ) -> Vec<Suggestion> {
        let Some(embedding) = embeddings.get(&note.slug) else {
            log::warn!("No embedding for {}, cannot suggest pages", note.slug);
            return Vec::new();
        };

        let mut suggestions: Vec<Suggestion> = pages
            .iter()
            .filter(|page| page.slug != note.slug)
            .filter_map(|page| {
                let members = self.members.members(page);
                if members.contains(&note.slug) {
                    return None;
                }
                let centroid = member_centroid(&members, embeddings)?;
                let similarity = vector::cosine_similarity(embedding, &centroid);
                (similarity >= self.threshold).then(|| Suggestion {
                    page: page.slug.clone(),
                    page_title: page.title.clone(),
                    score: round_score(similarity),
                    reason: reason(note, page, similarity),
                })
            })
            .collect();

        sort_by_score_desc(&mut suggestions, |s| s.score);
        suggestions
    }
}

fn reason(note: &Note, page: &Note, similarity: f32) -> String {
    let shared = note.shared_tags(page);
    let semantic = format!("semantic similarity: {:.0}%", similarity * 100.0);
    if shared.is_empty() {
        return semantic;
    }

    let tags: Vec<&str> = shared.into_iter().take(MAX_REASON_TAGS).collect();
    format!("shares tags: {}; {}", tags.join(", "), semantic)
}
