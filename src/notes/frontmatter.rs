//! Fixed metadata schema for the YAML block at the top of a note.
//!
//! Every field has an explicit default. Scalars are accepted where a list is
//! expected (as a one-element list); any other shape mismatch rejects the
//! whole block.

use serde::{Deserialize, Deserializer};
use serde_yml::Value;

const DELIMITER: &str = "---";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Frontmatter {
    #[serde(deserialize_with = "scalar")]
    pub title: Option<String>,

    #[serde(rename = "type", deserialize_with = "scalar")]
    pub kind: Option<String>,

    #[serde(deserialize_with = "scalar")]
    pub summary: Option<String>,

    #[serde(deserialize_with = "string_list")]
    pub tags: Vec<String>,

    #[serde(deserialize_with = "string_list")]
    pub authors: Vec<String>,
}

impl Frontmatter {
    /// Parse the metadata block of a note. `None` when the block is missing
    /// or does not fit the schema.
    pub fn parse(content: &str) -> Option<Self> {
        let block = split_frontmatter(content)?;
        if block.trim().is_empty() {
            return Some(Self::default());
        }

        match serde_yml::from_str::<Self>(block) {
            Ok(frontmatter) => Some(frontmatter),
            Err(e) => {
                log::debug!("malformed frontmatter: {e}");
                None
            }
        }
    }
}

/// Return the raw text between the opening and closing `---` lines.
pub fn split_frontmatter(content: &str) -> Option<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let first_line_end = content.find('\n')?;
    if content[..first_line_end].trim_end() != DELIMITER {
        return None;
    }

    let body_start = first_line_end + 1;
    let mut offset = body_start;
    for line in content[body_start..].split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            return Some(&content[body_start..offset]);
        }
        offset += line.len();
    }

    None
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => scalar_to_string(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected a scalar value")),
    }
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(|item| {
                scalar_to_string(item)
                    .ok_or_else(|| serde::de::Error::custom("expected a list of scalars"))
            })
            .collect(),
        value => scalar_to_string(value)
            .map(|s| vec![s])
            .ok_or_else(|| serde::de::Error::custom("expected a list")),
    }
}
