//! End-to-end runs of the `lumen` binary against a temporary data directory

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn lumen(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lumen").unwrap();
    cmd.env("TZ", "UTC").arg("--data-dir").arg(data_dir);
    cmd
}

#[test]
fn test_fresh_history() {
    let dir = TempDir::new().unwrap();
    lumen(dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("entries: 1"))
        .stdout(predicate::str::contains("Key Light [scrim]"));

    assert!(dir.path().join("config.toml").exists());
    assert!(dir.path().join("lumen.db").exists());
}

#[test]
fn test_import_then_undo_redo() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("settings.json");
    fs::write(
        &settings,
        r##"{
            "version": 1,
            "lights": [{
                "type": "sky", "id": "sky-1", "name": "Dome", "intensity": 2.0,
                "topColor": "#aaccff", "bottomColor": "#223344"
            }],
            "cameras": [{ "id": "c1", "name": "Front", "selected": false,
                          "position": [0, 0, 5], "rotation": [0, 0, 0] }],
            "iblRotation": 1.5
        }"##,
    )
    .unwrap();

    lumen(dir.path())
        .arg("import")
        .arg(&settings)
        .assert()
        .success()
        .stdout(predicate::str::contains("index: 1/2"));

    lumen(dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dome [sky]"));

    lumen(dir.path())
        .arg("undo")
        .assert()
        .success()
        .stdout(predicate::str::contains("index: 0/2"));

    lumen(dir.path())
        .arg("undo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to undo"));

    lumen(dir.path())
        .arg("redo")
        .assert()
        .success()
        .stdout(predicate::str::contains("index: 1/2"));
}

#[test]
fn test_rejected_import_reports_and_keeps_history() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("bad.json");
    fs::write(&settings, r#"{"version": 3, "lights": [], "cameras": []}"#).unwrap();

    lumen(dir.path())
        .arg("import")
        .arg(&settings)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not import settings"));

    lumen(dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("entries: 1"));
}

#[test]
fn test_share_and_open_round_trip() {
    let source = TempDir::new().unwrap();
    let settings = source.path().join("settings.json");
    fs::write(
        &settings,
        r##"{"version": 1, "lights": [{"type": "texture", "id": "t", "name": "Softbox",
            "intensity": 1.0, "color": "#ffffff", "map": "box.png"}], "cameras": []}"##,
    )
    .unwrap();
    lumen(source.path()).arg("import").arg(&settings).assert().success();

    let output = lumen(source.path()).arg("share").assert().success();
    let query = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let query = query.trim();
    assert!(query.contains("lights="));

    let target = TempDir::new().unwrap();
    lumen(target.path())
        .arg("open")
        .arg(query)
        .assert()
        .success()
        .stdout(predicate::str::contains("Softbox [texture]"))
        .stdout(predicate::str::contains("entries: 2"));
}

#[test]
fn test_export_hdr_from_png() {
    let dir = TempDir::new().unwrap();
    let panorama = dir.path().join("pano.png");
    image::RgbImage::from_pixel(64, 32, image::Rgb([200, 180, 160]))
        .save(&panorama)
        .unwrap();
    let out = dir.path().join("exports");

    lumen(dir.path())
        .arg("export")
        .arg(&panorama)
        .args(["--format", "hdr", "--resolution", "1k", "--prefix", "shot"])
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains(".hdr"))
        .stderr(predicate::str::contains("Exported shot_"));

    let mut names: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert!(names[0].starts_with("shot_") && names[0].ends_with(".hdr"));
    assert!(names[1].ends_with(".json"));

    let bytes = fs::read(out.join(&names[0])).unwrap();
    let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Hdr).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1024, 512));
}

#[test]
fn test_export_of_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    lumen(dir.path())
        .arg("export")
        .arg(dir.path().join("nope.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot open panorama"));
}
