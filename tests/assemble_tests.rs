use acord_field_extract::{normalize_candidate, FieldSet, Occurrence, PatternKind};

fn set_with(names: &[&str]) -> FieldSet {
    let mut set = FieldSet::new();
    for (i, name) in names.iter().enumerate() {
        let norm = normalize_candidate(name).unwrap();
        set.merge(norm, Occurrence { page: i + 1, kind: PatternKind::Colon });
    }
    set
}

#[test]
fn sort_is_case_insensitive_with_case_tiebreak() {
    let sealed = set_with(&["Agent Name", "agent name2", "Additional Insured"]).seal();
    let list = sealed.assemble();

    let names: Vec<&str> = list.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Additional Insured", "Agent Name", "agent name2"]);
}

#[test]
fn entries_are_numbered_from_one() {
    let sealed = set_with(&["Zip Code", "City", "State"]).seal();
    let list = sealed.assemble();

    assert_eq!(list.total, 3);
    let indices: Vec<usize> = list.entries.iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert_eq!(list.entries[0].name, "City");
}

#[test]
fn empty_set_assembles_to_zero_count() {
    let sealed = FieldSet::new().seal();
    assert!(sealed.is_empty());
    let list = sealed.assemble();
    assert_eq!(list.total, 0);
    assert!(list.entries.is_empty());
}

#[test]
fn kind_totals_count_every_occurrence() {
    let mut set = FieldSet::new();
    let n = normalize_candidate("Policy Number").unwrap();
    set.merge(n.clone(), Occurrence { page: 1, kind: PatternKind::Colon });
    set.merge(n, Occurrence { page: 2, kind: PatternKind::Numbered });
    let m = normalize_candidate("Yes").unwrap();
    set.merge(m, Occurrence { page: 1, kind: PatternKind::Checkbox });

    let sealed = set.seal();
    let totals = sealed.kind_totals();
    assert_eq!(totals.get("colon"), Some(&1));
    assert_eq!(totals.get("numbered"), Some(&1));
    assert_eq!(totals.get("checkbox"), Some(&1));
    assert_eq!(sealed.occurrence_total(), 3);
}
