use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::editing::EditSession;
use crate::element::{Element, ElementCollection, ElementKey};
use crate::persist::ScreenStateStore;
use crate::screen::{self, ArchiveImport, Screen};

/// Seed elements shown before any archive is loaded, so the viewer is usable
/// standalone for trying out picking and labeling.
const SAMPLE_ELEMENTS: &str = r#"[
  {"bounds": "[0,0][1080,2400]", "class_name": "android.widget.FrameLayout"},
  {"bounds": "[0,66][1080,210]", "class_name": "android.widget.LinearLayout"},
  {"bounds": "[42,90][186,186]", "text": "Back", "resource_id": "nav_back", "is_clickable": true},
  {"bounds": "[186,90][894,186]", "text": "Settings", "resource_id": "title"},
  {"bounds": "[0,2190][1080,2400]", "class_name": "android.widget.LinearLayout"},
  {"bounds": "[90,2232][510,2358]", "text": "Cancel", "resource_id": "btn_cancel", "is_clickable": true},
  {"bounds": "[570,2232][990,2358]", "text": "Save", "resource_id": "btn_save", "is_clickable": true}
]"#;

/// Central mutable state: the loaded screens, the active element collection,
/// and the persistence hooks.
///
/// Every mutation funnels through `after_mutation`, which refreshes the JSON
/// mirror and the cached labeled count and autosaves the active screen. The
/// labeled count is therefore only recomputed when the collection actually
/// changes, never per frame.
pub struct Workspace {
    screens: Vec<Screen>,
    current: Option<usize>,
    screen_name: String,
    elements: ElementCollection,
    json_text: String,
    labeled: usize,
    store: ScreenStateStore,
    export_dir: PathBuf,
}

impl Workspace {
    pub fn new(state_dir: impl Into<PathBuf>, export_dir: impl Into<PathBuf>) -> Self {
        let elements = ElementCollection::from_json(SAMPLE_ELEMENTS).unwrap_or_default();
        let json_text = elements.to_json_pretty().unwrap_or_default();
        let labeled = elements.labeled_count();
        Self {
            screens: Vec::new(),
            current: None,
            screen_name: String::new(),
            elements,
            json_text,
            labeled,
            store: ScreenStateStore::new(state_dir),
            export_dir: export_dir.into(),
        }
    }

    pub fn elements(&self) -> &ElementCollection {
        &self.elements
    }

    pub fn json_text(&self) -> &str {
        &self.json_text
    }

    pub fn json_text_mut(&mut self) -> &mut String {
        &mut self.json_text
    }

    pub fn labeled_count(&self) -> usize {
        self.labeled
    }

    pub fn screen_name(&self) -> &str {
        &self.screen_name
    }

    pub fn set_screen_name(&mut self, name: String) {
        self.screen_name = name;
    }

    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_screen(&self) -> Option<&Screen> {
        self.current.and_then(|index| self.screens.get(index))
    }

    /// Replaces the loaded screen set with an archive's contents and opens
    /// the first screen.
    pub fn load_archive(&mut self, path: impl AsRef<Path>) -> Result<ArchiveImport> {
        let import = screen::import_archive(path)?;
        if import.screens.is_empty() {
            bail!("Archive contains no screen JSON entries");
        }
        self.screens = import.screens.clone();
        self.load_screen(0)?;
        Ok(import)
    }

    /// Opens the screen at `index`. A saved working copy takes precedence
    /// over the archived payload; first-time opens seed a saved copy so the
    /// timestamp reflects when the screen was first visited.
    pub fn load_screen(&mut self, index: usize) -> Result<()> {
        let screen = self
            .screens
            .get(index)
            .with_context(|| format!("No screen at index {index}"))?
            .clone();

        match self.store.load(screen.number) {
            Some(record) => {
                self.elements = ElementCollection::from_json(&record.json)
                    .with_context(|| format!("Saved state for screen {} is corrupt", screen.number))?;
            }
            None => {
                let payload = screen::parse_payload(&screen.json)
                    .with_context(|| format!("Screen {} payload is invalid", screen.number))?;
                self.elements = payload.elements;
                let seeded = self.elements.to_json_pretty()?;
                if let Err(err) = self.store.save(screen.number, &seeded) {
                    eprintln!("[workspace] Initial save failed: {err:?}");
                }
            }
        }

        self.screen_name = screen.name.clone().unwrap_or_else(|| format!("screen_{}", screen.number));
        self.current = Some(index);
        self.json_text = self.elements.to_json_pretty()?;
        self.labeled = self.elements.labeled_count();
        Ok(())
    }

    pub fn next_screen(&mut self) -> Result<bool> {
        match self.current {
            Some(index) if index + 1 < self.screens.len() => {
                self.load_screen(index + 1)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn previous_screen(&mut self) -> Result<bool> {
        match self.current {
            Some(index) if index > 0 => {
                self.load_screen(index - 1)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Applies edited JSON text as the new element collection.
    ///
    /// On parse failure the collection keeps its previous state and the text
    /// is left as typed so the user can fix it. On success the text is also
    /// kept as typed rather than reformatted, so an in-progress edit is not
    /// disturbed mid-keystroke.
    pub fn apply_json_text(&mut self) -> Result<()> {
        let parsed = ElementCollection::from_json(&self.json_text)?;
        self.elements = parsed;
        self.labeled = self.elements.labeled_count();
        self.autosave()
    }

    pub fn delete_element(&mut self, key: &ElementKey) -> Result<usize> {
        let removed = self.elements.remove(key);
        if removed > 0 {
            self.after_mutation()?;
        }
        Ok(removed)
    }

    pub fn commit_edit(&mut self, session: &mut EditSession) -> Result<Element> {
        let committed = session.commit(&mut self.elements)?;
        self.after_mutation()?;
        Ok(committed)
    }

    /// Writes the export payload, returning the file path.
    pub fn export(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.export_dir).with_context(|| {
            format!("Failed to create export dir {}", self.export_dir.display())
        })?;
        let name = (!self.screen_name.trim().is_empty()).then_some(self.screen_name.as_str());
        let payload = screen::export_payload(name, &self.elements)?;
        let path = self.export_dir.join(screen::export_file_name(name));
        fs::write(&path, payload)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    fn after_mutation(&mut self) -> Result<()> {
        self.json_text = self.elements.to_json_pretty()?;
        self.labeled = self.elements.labeled_count();
        self.autosave()
    }

    fn autosave(&mut self) -> Result<()> {
        if let Some(screen) = self.current_screen() {
            let number = screen.number;
            self.store.save(number, &self.json_text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn workspace(dir: &Path) -> Workspace {
        Workspace::new(dir.join("state"), dir.join("export"))
    }

    #[test]
    fn starts_with_sample_elements() {
        let dir = tempdir().expect("tempdir");
        let ws = workspace(dir.path());
        assert!(!ws.elements().is_empty());
        assert_eq!(ws.current_index(), None);
        assert_eq!(ws.labeled_count(), 0);
    }

    #[test]
    fn delete_updates_mirror_and_count() {
        let dir = tempdir().expect("tempdir");
        let mut ws = workspace(dir.path());
        let before = ws.elements().len();
        let key = ws.elements().elements()[2].key();
        let removed = ws.delete_element(&key).expect("delete");
        assert_eq!(removed, 1);
        assert_eq!(ws.elements().len(), before - 1);
        assert!(!ws.json_text().contains("nav_back"));
    }

    #[test]
    fn commit_edit_refreshes_labeled_count() {
        let dir = tempdir().expect("tempdir");
        let mut ws = workspace(dir.path());
        let mut session = EditSession::open(&ws.elements().elements()[0]).expect("open");
        session.information_mut().push_str("root container");
        ws.commit_edit(&mut session).expect("commit");
        assert_eq!(ws.labeled_count(), 1);
        assert!(ws.json_text().contains("root container"));
    }

    #[test]
    fn malformed_json_text_keeps_the_collection() {
        let dir = tempdir().expect("tempdir");
        let mut ws = workspace(dir.path());
        let before = ws.elements().clone();
        *ws.json_text_mut() = "{broken".to_string();
        assert!(ws.apply_json_text().is_err());
        assert_eq!(ws.elements(), &before);
        assert_eq!(ws.json_text(), "{broken");
    }

    #[test]
    fn export_writes_the_named_file() {
        let dir = tempdir().expect("tempdir");
        let mut ws = workspace(dir.path());
        ws.set_screen_name("checkout".to_string());
        let path = ws.export().expect("export");
        assert!(path.ends_with("checkout.json"));
        let written = fs::read_to_string(path).expect("read back");
        assert!(written.contains("\"screenId\": \"checkout\""));
    }
}
