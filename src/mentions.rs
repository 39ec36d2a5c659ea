//! Unlinked mentions of a note, fetched from the site's dev server.
//!
//! Best effort only: every failure is logged at debug level and yields an
//! empty list.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MENTIONS_URL: &str = "http://localhost:3000/api/mentions";
pub const DEFAULT_TIMEOUT_SECS: u64 = 2;

/// Titles shorter than this are too ambiguous to search for.
const MIN_TITLE_LEN: usize = 3;

/// Text elsewhere in the corpus that names a note without linking it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub slug: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: String,
}

pub struct MentionsClient {
    url: String,
    timeout: Duration,
}

impl MentionsClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    /// Mentions of the note `slug` titled `title`, empty on any failure.
    pub fn fetch(&self, slug: &str, title: &str) -> Vec<Mention> {
        if title.chars().count() < MIN_TITLE_LEN {
            return Vec::new();
        }

        match self.request(slug, title) {
            Ok(mentions) => {
                log::debug!("{} mentions of {slug}", mentions.len());
                mentions
            }
            Err(e) => {
                log::debug!("Mentions lookup failed for {slug}: {e:#}");
                Vec::new()
            }
        }
    }

    fn request(&self, slug: &str, title: &str) -> anyhow::Result<Vec<Mention>> {
        let url = url::Url::parse_with_params(&self.url, &[("slug", slug), ("title", title)])?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let response = client.get(url).send()?;

        if !response.status().is_success() {
            anyhow::bail!("mentions endpoint returned status {}", response.status());
        }

        Ok(response.json()?)
    }
}
