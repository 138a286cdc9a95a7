use acord_field_extract::normalize_candidate;

#[test]
fn collapses_whitespace_and_trims_edges() {
    let n = normalize_candidate("  Policy   Number ").unwrap();
    assert_eq!(n.key, "policy number");
    assert_eq!(n.display, "Policy Number");
}

#[test]
fn normalization_is_idempotent() {
    let first = normalize_candidate("NAMED   INSURED").unwrap();
    let again = normalize_candidate(&first.display).unwrap();
    assert_eq!(first.key, again.key);
    assert_eq!(first.display, again.display);
}

#[test]
fn shouted_all_caps_becomes_title_case() {
    let n = normalize_candidate("NAMED INSURED").unwrap();
    assert_eq!(n.display, "Named Insured");
    assert_eq!(n.key, "named insured");
}

#[test]
fn mixed_case_display_is_preserved() {
    let n = normalize_candidate("McDonald Coverage").unwrap();
    assert_eq!(n.display, "McDonald Coverage");
    assert_eq!(n.key, "mcdonald coverage");
}

#[test]
fn residual_edge_punctuation_is_stripped() {
    let n = normalize_candidate("(Mailing Address)").unwrap();
    assert_eq!(n.display, "Mailing Address");
}

#[test]
fn trailing_digits_survive() {
    let n = normalize_candidate("agent name2").unwrap();
    assert_eq!(n.display, "agent name2");
    assert_eq!(n.key, "agent name2");
}

#[test]
fn too_short_or_empty_is_discarded() {
    assert!(normalize_candidate("X").is_none());
    assert!(normalize_candidate("").is_none());
    assert!(normalize_candidate("  %% :: ").is_none());
}
