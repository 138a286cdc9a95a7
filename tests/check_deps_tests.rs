use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use acord_field_extract::{check_deps, ocr_document, ExtractorConfig, OcrError};

fn set_path(dir: &std::path::Path) {
    std::env::set_var("PATH", dir.display().to_string());
}

fn fake_bin(dir: &Path, name: &str) {
    let bin = dir.join(name);
    fs::write(&bin, "#!/bin/sh\nexit 0\n").unwrap();
    let mut perms = fs::metadata(&bin).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&bin, perms).unwrap();
}

// PATH is process-global, so the probe scenarios run inside one test.
#[test]
fn check_deps_tracks_required_and_optional_bins() {
    let td = tempfile::tempdir().unwrap();
    fake_bin(td.path(), "pdftoppm");
    fake_bin(td.path(), "tesseract");

    set_path(td.path());
    let res = check_deps();
    assert!(res.ok, "pdftoppm + tesseract present should yield ok");
    // pdfinfo is optional but still reported
    assert!(res.missing.iter().any(|m| m == "pdfinfo"));

    let empty = tempfile::tempdir().unwrap();
    set_path(empty.path());
    let res = check_deps();
    assert!(!res.ok, "missing required bins should not be ok");
    assert!(res.missing.iter().any(|m| m == "pdftoppm"));
    assert!(res.missing.iter().any(|m| m == "tesseract"));

    // with no engine on PATH, an existing document maps to EngineUnavailable
    let pdf = empty.path().join("form.pdf");
    fs::write(&pdf, b"%PDF-1.4\n").unwrap();
    let err = ocr_document(&pdf, &ExtractorConfig::default()).unwrap_err();
    match err {
        OcrError::EngineUnavailable(_) => {}
        other => panic!("expected EngineUnavailable, got {other:?}"),
    }
}

#[test]
fn ocr_document_missing_file_is_unreadable() {
    let p = Path::new("./this/does/not/exist.pdf");
    let err = ocr_document(p, &ExtractorConfig::default()).unwrap_err();
    match err {
        OcrError::DocumentUnreadable(_) => {}
        other => panic!("expected DocumentUnreadable, got {other:?}"),
    }
}
