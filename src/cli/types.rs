use std::path::PathBuf;

use clap::{Args as ClapArgs, ValueEnum};

#[derive(ClapArgs, Debug, Clone)]
pub struct RelatedArgs {
    /// Path to the note file
    pub file: PathBuf,

    /// Max suggestions
    #[clap(short, long, default_value = "10")]
    pub limit: usize,

    /// Minimum score threshold
    #[clap(short, long, default_value = "5")]
    pub min_score: f32,

    /// Skip the unlinked mentions lookup
    #[clap(long, default_value = "false")]
    pub no_mentions: bool,

    /// Recompute every embedding instead of using the cache
    #[clap(long, default_value = "false")]
    pub rebuild_cache: bool,
}

/// Which curation analyses to run.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurateMode {
    /// Index page gaps and new clusters
    Full,
    /// Notes missing from existing index pages
    MocGaps,
    /// Clusters of notes no index page links
    NewClusters,
    /// Index pages a single note could join
    ForNote,
}

impl CurateMode {
    pub fn finds_gaps(self) -> bool {
        matches!(self, Self::Full | Self::MocGaps)
    }

    pub fn finds_clusters(self) -> bool {
        matches!(self, Self::Full | Self::NewClusters)
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CurateArgs {
    /// Analysis mode
    #[clap(short, long, value_enum, default_value_t = CurateMode::Full)]
    pub mode: CurateMode,

    /// Note slug for --mode=for-note
    #[clap(short, long)]
    pub note: Option<String>,

    /// Similarity threshold [0.0, 1.0] (default from config, 0.7)
    #[clap(short, long)]
    pub threshold: Option<f32>,

    /// Clustering radius in cosine distance (default from config, 0.3)
    #[clap(long)]
    pub eps: Option<f32>,

    /// Minimum cluster size (default from config, 3)
    #[clap(long)]
    pub min_cluster_size: Option<usize>,

    /// Recompute every embedding instead of using the cache
    #[clap(long, default_value = "false")]
    pub rebuild_cache: bool,
}
