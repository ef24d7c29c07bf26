use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One detected UI node from an accessibility dump.
///
/// Every descriptive field is optional and absence is distinct from an empty
/// string; the dump format never guarantees either. Fields the schema does not
/// know about are carried in `extra` verbatim so that exports round-trip the
/// source payload exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_clickable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    pub fn key(&self) -> ElementKey {
        ElementKey {
            bounds: self.bounds.clone(),
            text: self.text.clone(),
            resource_id: self.resource_id.clone(),
        }
    }

    pub fn clickable(&self) -> bool {
        self.is_clickable.unwrap_or(false)
    }

    /// True when the user has attached a non-blank annotation.
    pub fn labeled(&self) -> bool {
        self.information.as_deref().is_some_and(|info| !info.trim().is_empty())
    }
}

/// Composite natural key identifying an element.
///
/// The dump carries no stable id, so `(bounds, text, resource_id)` with strict
/// field equality stands in for identity. Two elements with equal keys are
/// indistinguishable; lookups resolve to the first match in collection order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementKey {
    pub bounds: Option<String>,
    pub text: Option<String>,
    pub resource_id: Option<String>,
}

/// Ordered, authoritative element list for the active screen.
///
/// Insertion order is preserved for export fidelity; render order is derived
/// elsewhere. All mutation goes through the keyed operations below so callers
/// can serialize "mutate" against "rebuild scene".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementCollection {
    elements: Vec<Element>,
}

impl ElementCollection {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Element list is not a valid JSON array")
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize element list")
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn position(&self, key: &ElementKey) -> Option<usize> {
        self.elements.iter().position(|element| element.key() == *key)
    }

    pub fn find_by_key(&self, key: &ElementKey) -> Option<&Element> {
        self.position(key).map(|index| &self.elements[index])
    }

    /// Replaces the first element matching `key`, keeping its position.
    pub fn replace(&mut self, key: &ElementKey, replacement: Element) -> Result<()> {
        match self.position(key) {
            Some(index) => {
                self.elements[index] = replacement;
                Ok(())
            }
            None => bail!("No element matches the given key"),
        }
    }

    /// Removes every element matching `key` (normally exactly one).
    /// Returns the number removed; zero leaves the collection untouched.
    pub fn remove(&mut self, key: &ElementKey) -> usize {
        let before = self.elements.len();
        self.elements.retain(|element| element.key() != *key);
        before - self.elements.len()
    }

    /// Wholesale swap, used when a new screen payload arrives.
    pub fn set_all(&mut self, elements: Vec<Element>) {
        self.elements = elements;
    }

    pub fn labeled_count(&self) -> usize {
        self.elements.iter().filter(|element| element.labeled()).count()
    }
}
