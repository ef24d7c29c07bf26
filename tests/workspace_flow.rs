use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tempfile::tempdir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use strata::editing::EditSession;
use strata::workspace::Workspace;

fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).expect("create archive");
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, bytes) in entries {
        writer.start_file(*name, options).expect("start entry");
        writer.write_all(bytes).expect("write entry");
    }
    writer.finish().expect("finish archive");
}

fn two_screen_archive(path: &Path) {
    write_archive(
        path,
        &[
            (
                "1.json",
                br#"{"screenId":"home","elements":[
                    {"bounds":"[0,0][1080,2400]","class_name":"android.widget.FrameLayout"},
                    {"bounds":"[90,200][990,320]","text":"Sign in","resource_id":"btn_sign_in","is_clickable":true}
                ]}"#,
            ),
            ("1.png", b"screenshot one"),
            ("2.json", br#"[{"bounds":"[0,0][540,540]","text":"Detail"}]"#),
            ("2.png", b"screenshot two"),
        ],
    );
}

#[test]
fn loading_an_archive_opens_the_first_screen() {
    let dir = tempdir().expect("tempdir");
    let archive = dir.path().join("screens.zip");
    two_screen_archive(&archive);

    let mut ws = Workspace::new(dir.path().join("state"), dir.path().join("export"));
    let import = ws.load_archive(&archive).expect("load");
    assert_eq!(import.screens.len(), 2);
    assert_eq!(ws.current_index(), Some(0));
    assert_eq!(ws.screen_name(), "home");
    assert_eq!(ws.elements().len(), 2);
    // Unnamed screens fall back to a number-derived name.
    ws.next_screen().expect("next");
    assert_eq!(ws.screen_name(), "screen_2");
}

#[test]
fn navigation_stops_at_the_ends() {
    let dir = tempdir().expect("tempdir");
    let archive = dir.path().join("screens.zip");
    two_screen_archive(&archive);

    let mut ws = Workspace::new(dir.path().join("state"), dir.path().join("export"));
    ws.load_archive(&archive).expect("load");

    assert!(!ws.previous_screen().expect("previous at start"));
    assert!(ws.next_screen().expect("next"));
    assert!(!ws.next_screen().expect("next at end"));
    assert!(ws.previous_screen().expect("previous"));
    assert_eq!(ws.current_index(), Some(0));
}

#[test]
fn edits_survive_navigation_and_reload() {
    let dir = tempdir().expect("tempdir");
    let archive = dir.path().join("screens.zip");
    two_screen_archive(&archive);

    let mut ws = Workspace::new(dir.path().join("state"), dir.path().join("export"));
    ws.load_archive(&archive).expect("load");

    let button = ws.elements().elements()[1].clone();
    let mut session = EditSession::open(&button).expect("open");
    session.information_mut().push_str("primary action");
    ws.commit_edit(&mut session).expect("commit");
    assert_eq!(ws.labeled_count(), 1);

    // Away and back: the saved working copy wins over the archive payload.
    ws.next_screen().expect("next");
    assert_eq!(ws.labeled_count(), 0);
    ws.previous_screen().expect("previous");
    assert_eq!(ws.labeled_count(), 1);
    assert!(ws.json_text().contains("primary action"));

    // A fresh session against the same state directory sees the edit too.
    let mut reopened = Workspace::new(dir.path().join("state"), dir.path().join("export"));
    reopened.load_archive(&archive).expect("reload");
    assert_eq!(reopened.labeled_count(), 1);
    assert!(reopened.json_text().contains("primary action"));
}

#[test]
fn deleting_an_element_autosaves() {
    let dir = tempdir().expect("tempdir");
    let archive = dir.path().join("screens.zip");
    two_screen_archive(&archive);

    let mut ws = Workspace::new(dir.path().join("state"), dir.path().join("export"));
    ws.load_archive(&archive).expect("load");
    let key = ws.elements().elements()[1].key();
    assert_eq!(ws.delete_element(&key).expect("delete"), 1);

    let mut reopened = Workspace::new(dir.path().join("state"), dir.path().join("export"));
    reopened.load_archive(&archive).expect("reload");
    assert_eq!(reopened.elements().len(), 1);
    assert!(!reopened.json_text().contains("btn_sign_in"));
}

#[test]
fn export_writes_the_wrapper_payload() {
    let dir = tempdir().expect("tempdir");
    let archive = dir.path().join("screens.zip");
    two_screen_archive(&archive);

    let mut ws = Workspace::new(dir.path().join("state"), dir.path().join("export"));
    ws.load_archive(&archive).expect("load");
    let path = ws.export().expect("export");
    assert!(path.ends_with("home.json"));

    let written = fs::read_to_string(path).expect("read back");
    assert!(written.contains("\"screenId\": \"home\""));
    assert!(written.contains("btn_sign_in"));
}

#[test]
fn archive_without_screens_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let archive = dir.path().join("screens.zip");
    write_archive(&archive, &[("readme.txt", b"nothing here")]);

    let mut ws = Workspace::new(dir.path().join("state"), dir.path().join("export"));
    assert!(ws.load_archive(&archive).is_err());
    // The sample elements stay in place after a failed load.
    assert!(!ws.elements().is_empty());
}
