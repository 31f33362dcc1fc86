//! Mapping of submitted form data onto an assembly request.
//!
//! Field names follow the upload form: `chapter_count`, `chapter_{i}`
//! (file), `chapter_{i}_title`, `author_image` (file), and any
//! [`BookConfig`] key.

use std::collections::BTreeMap;

use tracing::debug;

use crate::book_config::BookConfig;
use crate::error::{BindError, Result};

/// Everything needed to assemble one book.
#[derive(Debug, Clone, Default)]
pub struct BookRequest {
    pub config: BookConfig,
    /// Portrait for the back cover.
    pub author_image: Option<Vec<u8>>,
    /// One slot per chapter index; `None` where nothing was uploaded.
    pub chapter_files: Vec<Option<Vec<u8>>>,
    pub chapter_titles: BTreeMap<usize, String>,
}

impl BookRequest {
    /// Build a request from form fields and uploaded files.
    ///
    /// `chapter_count` is validated before anything else; files whose
    /// index is outside `0..chapter_count` are ignored.
    pub fn from_form(
        fields: &BTreeMap<String, String>,
        files: BTreeMap<String, Vec<u8>>,
    ) -> Result<Self> {
        let chapter_count = match fields.get("chapter_count") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| BindError::invalid("chapter_count", raw.as_str()))?,
            None => 0,
        };

        let config = BookConfig::from_fields(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;

        // slots come from the uploads present, never from the count alone
        let mut author_image = None;
        let mut uploads = BTreeMap::new();
        for (key, bytes) in files {
            if key == "author_image" {
                author_image = Some(bytes).filter(|bytes| !bytes.is_empty());
            } else if let Some(i) = chapter_index(&key, "").filter(|&i| i < chapter_count) {
                uploads.insert(i, bytes);
            }
        }
        let slots = uploads.last_key_value().map_or(0, |(&i, _)| i + 1);
        let mut chapter_files = vec![None; slots];
        for (i, bytes) in uploads {
            chapter_files[i] = Some(bytes);
        }

        let chapter_titles = fields
            .iter()
            .filter_map(|(key, title)| {
                chapter_index(key, "_title")
                    .filter(|&i| i < chapter_count)
                    .map(|i| (i, title.clone()))
            })
            .collect();

        debug!(chapter_count, has_image = author_image.is_some(), "form mapped");
        Ok(Self {
            config,
            author_image,
            chapter_files,
            chapter_titles,
        })
    }

    /// Display title for chapter `index`, `"Chapter {index + 1}"` when none was given.
    pub fn chapter_title(&self, index: usize) -> String {
        self.chapter_titles
            .get(&index)
            .cloned()
            .unwrap_or_else(|| format!("Chapter {}", index + 1))
    }
}

/// `i` for a `chapter_{i}{suffix}` key.
fn chapter_index(key: &str, suffix: &str) -> Option<usize> {
    let digits = key.strip_prefix("chapter_")?.strip_suffix(suffix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
