//! Groups of orphan notes that could seed a new index page.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::analysis::theme::infer_theme;
use crate::notes::{MemberSource, Note};
use crate::semantic::EmbeddingMap;

/// Common tags kept per cluster.
const MAX_COMMON_TAGS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ClusterMember {
    pub slug: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    #[serde(rename = "cluster_id")]
    pub id: usize,
    pub theme: String,
    pub common_tags: Vec<String>,
    pub notes: Vec<ClusterMember>,
    pub size: usize,
}

/// Content notes linked from no index page.
pub fn orphans<'a>(
    all_notes: &'a [Note],
    pages: &[&Note],
    source: &dyn MemberSource,
) -> Vec<&'a Note> {
    let linked: BTreeSet<String> = pages.iter().flat_map(|page| source.members(page)).collect();

    all_notes
        .iter()
        .filter(|note| !note.is_index_page() && !linked.contains(&note.slug))
        .collect()
}

pub struct OrphanClusterer {
    #[cfg_attr(not(feature = "clustering"), allow(dead_code))]
    eps: f32,
    min_cluster_size: usize,
    common_tag_ratio: f32,
}

impl OrphanClusterer {
    pub fn new(eps: f32, min_cluster_size: usize, common_tag_ratio: f32) -> Self {
        Self {
            eps,
            min_cluster_size,
            common_tag_ratio,
        }
    }

    /// Cluster `orphans` by embedding density, largest cluster first.
    ///
    /// Orphans without an embedding are ignored. Noise points are dropped.
    pub fn cluster(&self, orphans: &[&Note], embeddings: &EmbeddingMap) -> Vec<Cluster> {
        let embedded: Vec<(&Note, &[f32])> = orphans
            .iter()
            .filter_map(|note| Some((*note, embeddings.get(&note.slug)?.as_slice())))
            .collect();

        if embedded.len() < self.min_cluster_size {
            log::info!(
                "Only {} orphan notes with embeddings, need {} to cluster",
                embedded.len(),
                self.min_cluster_size
            );
            return Vec::new();
        }

        let points: Vec<&[f32]> = embedded.iter().map(|(_, v)| *v).collect();
        let Some(labels) = self.assign_labels(&points) else {
            return Vec::new();
        };

        let mut groups: Vec<Vec<&Note>> = Vec::new();
        for ((note, _), label) in embedded.iter().zip(labels) {
            let Some(label) = label else { continue };
            if groups.len() <= label {
                groups.resize_with(label + 1, Vec::new);
            }
            groups[label].push(*note);
        }

        // A core point whose neighbors were all claimed by earlier clusters
        // forms an undersized group. Its members count as noise.
        let mut clusters: Vec<Cluster> = groups
            .into_iter()
            .filter(|members| members.len() >= self.min_cluster_size)
            .enumerate()
            .map(|(id, members)| self.describe(id, &members))
            .collect();
        clusters.sort_by(|a, b| b.size.cmp(&a.size));

        log::info!("Found {} clusters among {} orphans", clusters.len(), embedded.len());
        clusters
    }

    #[cfg(feature = "clustering")]
    fn assign_labels(&self, points: &[&[f32]]) -> Option<Vec<Option<usize>>> {
        Some(super::dbscan::dbscan(points, self.eps, self.min_cluster_size))
    }

    #[cfg(not(feature = "clustering"))]
    fn assign_labels(&self, _points: &[&[f32]]) -> Option<Vec<Option<usize>>> {
        log::warn!("Clustering not available (built without the `clustering` feature), skipping");
        None
    }

    fn describe(&self, id: usize, members: &[&Note]) -> Cluster {
        let common_tags = common_tags(members, self.common_tag_ratio);
        Cluster {
            id,
            theme: infer_theme(members, &common_tags),
            common_tags,
            notes: members
                .iter()
                .map(|note| ClusterMember {
                    slug: note.slug.clone(),
                    title: note.title.clone(),
                    kind: note.kind.clone(),
                })
                .collect(),
            size: members.len(),
        }
    }
}

/// Tags carried by at least `ratio` of `members`, most frequent first.
///
/// Only the top few tags by count are considered; ties keep first appearance.
fn common_tags(members: &[&Note], ratio: f32) -> Vec<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for note in members {
        for tag in &note.tags {
            let order = counts.len();
            counts.entry(tag.as_str()).or_insert((0, order)).0 += 1;
        }
    }

    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

    let min_count = members.len() as f32 * ratio;
    ranked
        .into_iter()
        .take(MAX_COMMON_TAGS)
        .filter(|(_, (count, _))| *count as f32 >= min_count)
        .map(|(tag, _)| tag.to_string())
        .collect()
}
