use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

use crate::element::ElementCollection;

/// One captured screen: its element dump plus the paired screenshot.
#[derive(Debug, Clone)]
pub struct Screen {
    /// Numeric identifier taken from the archive file stem.
    pub number: u32,
    pub name: Option<String>,
    /// Raw JSON text exactly as it appeared in the archive.
    pub json: String,
    pub screenshot_png: Vec<u8>,
}

/// Result of decoding a screen JSON payload.
#[derive(Debug, Clone)]
pub struct ScreenPayload {
    pub name: Option<String>,
    pub elements: ElementCollection,
}

/// Decodes either payload shape: a wrapper `{"screenId": ..., "elements": [...]}`
/// or a bare element array.
pub fn parse_payload(text: &str) -> Result<ScreenPayload> {
    let value: Value = serde_json::from_str(text).context("Screen payload is not valid JSON")?;
    match value {
        Value::Array(_) => {
            let elements = serde_json::from_value(value)
                .context("Screen payload array is not a list of elements")?;
            Ok(ScreenPayload { name: None, elements })
        }
        Value::Object(ref map) if map.contains_key("elements") => {
            let name = map.get("screenId").and_then(Value::as_str).map(str::to_string);
            let elements = serde_json::from_value(map["elements"].clone())
                .context("'elements' is not a list of elements")?;
            Ok(ScreenPayload { name, elements })
        }
        _ => bail!("Screen payload must be an element array or an object with an 'elements' key"),
    }
}

#[derive(Serialize)]
struct ExportPayload<'a> {
    #[serde(rename = "screenId")]
    screen_id: &'a str,
    elements: &'a ElementCollection,
}

/// Wrapper payload written by the export action. Unnamed screens export
/// under a fixed placeholder id.
pub fn export_payload(name: Option<&str>, elements: &ElementCollection) -> Result<String> {
    let payload = ExportPayload {
        screen_id: name.filter(|n| !n.trim().is_empty()).unwrap_or("unnamed_screen"),
        elements,
    };
    serde_json::to_string_pretty(&payload).context("Failed to serialize export payload")
}

pub fn export_file_name(name: Option<&str>) -> String {
    let base = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("ui-elements");
    format!("{base}.json")
}

/// Outcome of reading a screen archive. `skipped` lists entries that did not
/// form a usable screen, for operator feedback.
#[derive(Debug)]
pub struct ArchiveImport {
    pub screens: Vec<Screen>,
    pub skipped: Vec<String>,
}

/// Reads a ZIP of paired `<n>.json`/`<n>.png` entries into screens, ordered
/// by ascending number. Pairing is strict: a JSON entry without its PNG
/// partner is reported as skipped, as is a PNG without JSON and any entry
/// whose stem is not a number.
pub fn import_archive(path: impl AsRef<Path>) -> Result<ArchiveImport> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open archive {}", path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("Failed to read archive {}", path.display()))?;

    let mut jsons: BTreeMap<u32, String> = BTreeMap::new();
    let mut pngs: BTreeMap<u32, Vec<u8>> = BTreeMap::new();
    let mut skipped = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("Failed to read archive entry {index}"))?;
        if entry.is_dir() {
            continue;
        }
        let entry_name = entry.name().to_string();
        let (stem, extension) = match split_name(&entry_name) {
            Some(parts) => parts,
            None => {
                skipped.push(entry_name);
                continue;
            }
        };
        let number: u32 = match stem.parse() {
            Ok(number) => number,
            Err(_) => {
                skipped.push(entry_name);
                continue;
            }
        };
        match extension {
            "json" => {
                let mut text = String::new();
                entry
                    .read_to_string(&mut text)
                    .with_context(|| format!("Failed to read {entry_name}"))?;
                jsons.insert(number, text);
            }
            "png" => {
                let mut bytes = Vec::new();
                entry
                    .read_to_end(&mut bytes)
                    .with_context(|| format!("Failed to read {entry_name}"))?;
                pngs.insert(number, bytes);
            }
            _ => skipped.push(entry_name),
        }
    }

    for number in pngs.keys() {
        if !jsons.contains_key(number) {
            skipped.push(format!("{number}.png"));
        }
    }

    let mut screens = Vec::new();
    for (number, json) in jsons {
        match pngs.remove(&number) {
            Some(png) => {
                let name = parse_payload(&json).ok().and_then(|payload| payload.name);
                screens.push(Screen { number, name, json, screenshot_png: png });
            }
            None => skipped.push(format!("{number}.json")),
        }
    }

    Ok(ArchiveImport { screens, skipped })
}

fn split_name(entry_name: &str) -> Option<(&str, &str)> {
    // Entries may carry directory prefixes inside the archive.
    let file_name = entry_name.rsplit('/').next()?;
    let (stem, extension) = file_name.rsplit_once('.')?;
    Some((stem, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_array_payload_has_no_name() {
        let payload = parse_payload(r#"[{"bounds":"[0,0][1,1]"}]"#).expect("parse");
        assert_eq!(payload.name, None);
        assert_eq!(payload.elements.len(), 1);
    }

    #[test]
    fn wrapper_payload_carries_the_screen_id() {
        let payload = parse_payload(r#"{"screenId":"login","elements":[{"text":"ok"}]}"#)
            .expect("parse");
        assert_eq!(payload.name.as_deref(), Some("login"));
        assert_eq!(payload.elements.len(), 1);
    }

    #[test]
    fn wrapper_without_elements_is_rejected() {
        assert!(parse_payload(r#"{"screenId":"login"}"#).is_err());
        assert!(parse_payload("42").is_err());
        assert!(parse_payload("{not json").is_err());
    }

    #[test]
    fn export_round_trips_through_parse() {
        let elements = ElementCollection::from_json(r#"[{"bounds":"[0,0][2,2]"}]"#).expect("parse");
        let exported = export_payload(Some("settings"), &elements).expect("export");
        let payload = parse_payload(&exported).expect("reparse");
        assert_eq!(payload.name.as_deref(), Some("settings"));
        assert_eq!(payload.elements, elements);
    }

    #[test]
    fn unnamed_export_uses_placeholders() {
        let elements = ElementCollection::default();
        let exported = export_payload(None, &elements).expect("export");
        assert!(exported.contains("unnamed_screen"));
        assert_eq!(export_file_name(None), "ui-elements.json");
        assert_eq!(export_file_name(Some("  ")), "ui-elements.json");
        assert_eq!(export_file_name(Some("home")), "home.json");
    }
}
