use std::fs;

use acord_field_extract::{
    load_config, recognize_page, ConfigError, ExtractorConfig, PageText, PatternKind,
};

fn write_cfg(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let td = tempfile::tempdir().unwrap();
    let p = td.path().join("extractor.yaml");
    fs::write(&p, contents).unwrap();
    (td, p)
}

#[test]
fn partial_yaml_fills_defaults() {
    let (_td, p) = write_cfg("dpi: 400\ncheckbox_glyphs: [\"[x]\"]\n");
    let cfg = load_config(&p).unwrap();
    assert_eq!(cfg.dpi, 400);
    assert_eq!(cfg.checkbox_glyphs, vec!["[x]".to_string()]);
    assert_eq!(cfg.lang, "eng");
    assert_eq!(cfg.psm, 6);
    assert_eq!(cfg.max_label_len, 80);
}

#[test]
fn out_of_range_values_are_rejected() {
    let (_td, p) = write_cfg("dpi: 10\n");
    assert!(matches!(load_config(&p), Err(ConfigError::Invalid(_))));

    let (_td2, p2) = write_cfg("min_label_len: 1\n");
    assert!(matches!(load_config(&p2), Err(ConfigError::Invalid(_))));

    let (_td3, p3) = write_cfg("min_label_len: 10\nmax_label_len: 5\n");
    assert!(matches!(load_config(&p3), Err(ConfigError::Invalid(_))));
}

#[test]
fn unreadable_or_malformed_files_error() {
    let td = tempfile::tempdir().unwrap();
    let missing = td.path().join("nope.yaml");
    assert!(matches!(load_config(&missing), Err(ConfigError::Read(_))));

    let (_td2, bad) = write_cfg("dpi: [not a number\n");
    assert!(matches!(load_config(&bad), Err(ConfigError::Parse(_))));
}

#[test]
fn configured_glyphs_drive_checkbox_recognition() {
    let mut cfg = ExtractorConfig::default();
    cfg.checkbox_glyphs = vec!["[x]".to_string()];

    let page = PageText::from_raw(1, "[x] Flood Coverage\n☐ Yes\n");
    let cands = recognize_page(&page, &cfg);
    let checkbox: Vec<&str> = cands
        .iter()
        .filter(|c| c.kind == PatternKind::Checkbox)
        .map(|c| c.text.as_str())
        .collect();
    // the default glyph set no longer applies once overridden
    assert_eq!(checkbox, vec!["Flood Coverage"]);
}
