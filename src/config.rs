use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::analysis::ScoringWeights;
use crate::mentions::{DEFAULT_MENTIONS_URL, DEFAULT_TIMEOUT_SECS};
use crate::semantic::{DEFAULT_CACHE_FILE, DEFAULT_MODEL};

const CONFIG_FILE: &str = "config.yaml";

/// Default content directory, relative to the working directory
const DEFAULT_CONTENT_DIR: &str = "content";
/// Default centroid similarity threshold for curation
const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;
/// Default DBSCAN neighborhood radius (cosine distance)
const DEFAULT_CLUSTER_EPS: f32 = 0.3;
const DEFAULT_MIN_CLUSTER_SIZE: usize = 3;
/// Share of cluster members that must carry a tag for it to count as common
const DEFAULT_COMMON_TAG_RATIO: f32 = 0.4;

/// Embedding model settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name (e.g., "all-MiniLM-L6-v2", "bge-small-en-v1.5")
    #[serde(default = "default_model")]
    pub model: String,

    /// Show a progress bar while model files download
    #[serde(default)]
    pub show_download_progress: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            show_download_progress: false,
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Index page curation defaults, overridable per run from the command line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurationConfig {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    #[serde(default = "default_cluster_eps")]
    pub cluster_eps: f32,

    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,

    #[serde(default = "default_common_tag_ratio")]
    pub common_tag_ratio: f32,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            cluster_eps: DEFAULT_CLUSTER_EPS,
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            common_tag_ratio: DEFAULT_COMMON_TAG_RATIO,
        }
    }
}

fn default_similarity_threshold() -> f32 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_cluster_eps() -> f32 {
    DEFAULT_CLUSTER_EPS
}

fn default_min_cluster_size() -> usize {
    DEFAULT_MIN_CLUSTER_SIZE
}

fn default_common_tag_ratio() -> f32 {
    DEFAULT_COMMON_TAG_RATIO
}

/// Unlinked mentions lookup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MentionsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_mentions_url")]
    pub url: String,

    #[serde(default = "default_mentions_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MentionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_mentions_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_mentions_url() -> String {
    DEFAULT_MENTIONS_URL.to_string()
}

fn default_mentions_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Embedding cache file, relative paths resolve against the base directory
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub scoring: ScoringWeights,

    #[serde(default)]
    pub curation: CurationConfig,

    #[serde(default)]
    pub mentions: MentionsConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            cache_file: default_cache_file(),
            embedding: EmbeddingConfig::default(),
            scoring: ScoringWeights::default(),
            curation: CurationConfig::default(),
            mentions: MentionsConfig::default(),
            base_path: PathBuf::new(),
        }
    }
}

fn default_content_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CONTENT_DIR)
}

fn default_cache_file() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_FILE)
}

impl Config {
    fn validate(&self) -> anyhow::Result<()> {
        let cur = &self.curation;
        if !(0.0..=1.0).contains(&cur.similarity_threshold) {
            bail!(
                "curation.similarity_threshold must be between 0.0 and 1.0, got {}",
                cur.similarity_threshold
            );
        }
        if !(cur.cluster_eps > 0.0 && cur.cluster_eps <= 2.0) {
            bail!(
                "curation.cluster_eps must be in (0.0, 2.0], got {}",
                cur.cluster_eps
            );
        }
        if cur.min_cluster_size == 0 {
            bail!("curation.min_cluster_size must be greater than 0");
        }
        if !(0.0..=1.0).contains(&cur.common_tag_ratio) {
            bail!(
                "curation.common_tag_ratio must be between 0.0 and 1.0, got {}",
                cur.common_tag_ratio
            );
        }

        let scoring = &self.scoring;
        if scoring.rare_tag_max >= scoring.common_tag_min {
            bail!(
                "scoring.rare_tag_max ({}) must be below scoring.common_tag_min ({})",
                scoring.rare_tag_max,
                scoring.common_tag_min
            );
        }

        if self.mentions.timeout_secs == 0 {
            bail!("mentions.timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Load `config.yaml` from `base_path`, writing the defaults first if the
    /// file does not exist yet.
    pub fn load_with(base_path: &Path) -> anyhow::Result<Self> {
        let path = base_path.join(CONFIG_FILE);

        // create new if does not exist
        if !path.exists() {
            std::fs::create_dir_all(base_path)
                .with_context(|| format!("could not create {}", base_path.display()))?;
            std::fs::write(&path, serde_yml::to_string(&Self::default())?)
                .with_context(|| format!("could not write {}", path.display()))?;
            log::info!("Created default config at {}", path.display());
        }

        let config_str = std::fs::read_to_string(&path)
            .with_context(|| format!("could not read {}", path.display()))?;
        let mut config: Self = serde_yml::from_str(&config_str)
            .with_context(|| format!("config {} is malformed", path.display()))?;

        config.base_path = base_path.to_path_buf();
        config.validate()?;

        Ok(config)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.base_path.join(&self.cache_file)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

/// Base directory: explicit value, else `~/.local/share/notegraph`.
pub fn resolve_base_path(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    let home = homedir::my_home()
        .context("could not determine home directory")?
        .context("home directory path is empty")?;
    Ok(home.join(".local/share/notegraph"))
}
