use anyhow::{Context, Result};

use crate::element::{Element, ElementCollection, ElementKey};

/// In-progress edit of a single element.
///
/// A session captures the element's JSON and annotation at open time and
/// accumulates draft text without touching the collection. Nothing is applied
/// until `commit`, which resolves the element by the key it was *opened* with,
/// so renaming identity fields in the draft still replaces the original entry.
#[derive(Debug, Clone)]
pub struct EditSession {
    key: ElementKey,
    draft_json: String,
    information: String,
    opened_json: String,
    opened_information: String,
}

impl EditSession {
    pub fn open(element: &Element) -> Result<Self> {
        let json = serde_json::to_string_pretty(element)
            .context("Failed to serialize element for editing")?;
        let information = element.information.clone().unwrap_or_default();
        Ok(Self {
            key: element.key(),
            draft_json: json.clone(),
            information: information.clone(),
            opened_json: json,
            opened_information: information,
        })
    }

    pub fn key(&self) -> &ElementKey {
        &self.key
    }

    pub fn draft_json(&self) -> &str {
        &self.draft_json
    }

    pub fn draft_json_mut(&mut self) -> &mut String {
        &mut self.draft_json
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn information_mut(&mut self) -> &mut String {
        &mut self.information
    }

    pub fn is_dirty(&self) -> bool {
        self.draft_json != self.opened_json || self.information != self.opened_information
    }

    /// Applies the draft to the collection.
    ///
    /// The draft JSON must parse as a single element; its `information` field
    /// is overwritten by the session's annotation text, trimmed, with blank
    /// annotations stored as absent rather than as empty strings. On success
    /// the session re-bases on the committed element so `is_dirty` drops back
    /// to false. On failure the collection and the session are both unchanged.
    pub fn commit(&mut self, collection: &mut ElementCollection) -> Result<Element> {
        let mut updated: Element = serde_json::from_str(&self.draft_json)
            .context("Draft is not a valid element object")?;
        let trimmed = self.information.trim();
        updated.information = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
        collection.replace(&self.key, updated.clone())?;
        *self = Self::open(&updated)?;
        Ok(updated)
    }
}
