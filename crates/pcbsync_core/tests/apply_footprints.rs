use pcbsync_core::{
    ApplierConfig, ApplyError, BoardFootprint, Category, CategoryDiff, ChangedEntry, Diff,
    DiffApplier, Kiid, LookupSide, MemoryBoard, Point, ShadowModel,
};
use serde_json::{json, Map, Value};

const R1: &str = "/4c041385-b7cf-465f-91a3-bb2ce5efff01";
const U2: &str = "/9d7e61a2-38c1-4e5b-a0f3-1b2c3d4e5f60";

fn kiid(value: &str) -> Kiid {
    Kiid::new(value).unwrap()
}

fn change(id: &str, properties: Value) -> ChangedEntry {
    match properties {
        Value::Object(map) => ChangedEntry::new(kiid(id), map),
        other => panic!("expected object, got {other}"),
    }
}

fn fixture() -> (MemoryBoard, ShadowModel) {
    let mut shadow: ShadowModel = serde_json::from_value(json!({
        "footprints": [
            {
                "kiid": R1,
                "id": "Resistor_SMD:R_0603",
                "ref": "R1",
                "pos": [116500000, 74000000],
                "rot": 0.0,
                "layer": "Bot",
                "3d_models": []
            },
            {
                "kiid": U2,
                "id": "Package_SO:SOIC-8",
                "ref": "U2",
                "pos": [0, 0],
                "rot": 90.0,
                "layer": "Top",
                "3d_models": []
            }
        ]
    }))
    .unwrap();
    shadow.refresh_hashes();
    let board = MemoryBoard::from_shadow(&shadow, &ApplierConfig::default());
    (board, shadow)
}

fn apply(
    board: &mut MemoryBoard,
    shadow: &mut ShadowModel,
    changed: Vec<ChangedEntry>,
) -> Vec<ApplyError> {
    let diff = CategoryDiff {
        changed,
        ..CategoryDiff::default()
    };
    DiffApplier::new(board)
        .apply_footprints(shadow, &diff)
        .issues
        .into_iter()
        .map(|issue| issue.error)
        .collect()
}

#[test]
fn reference_position_and_rotation_are_applied() {
    let (mut board, mut shadow) = fixture();

    let issues = apply(
        &mut board,
        &mut shadow,
        vec![change(
            R1,
            json!({"ref": "R10", "pos": [120000000, 75000000], "rot": 45.5}),
        )],
    );

    assert!(issues.is_empty());
    let footprint = board.footprint(&kiid(R1)).unwrap();
    assert_eq!(footprint.reference(), "R10");
    assert_eq!(footprint.position(), Point::new(120_000_000, 75_000_000));
    assert_eq!(footprint.orientation_degrees(), 45.5);

    let entry = shadow.find(Category::Footprints, &kiid(R1)).unwrap();
    assert_eq!(entry.get("ref"), Some(&json!("R10")));
    assert_eq!(entry.get("pos"), Some(&json!([120000000, 75000000])));
    assert_eq!(entry.get("rot"), Some(&json!(45.5)));
    assert!(entry.hash_is_current());
}

#[test]
fn top_layer_maps_to_index_zero_and_is_applied() {
    let (mut board, mut shadow) = fixture();
    assert_eq!(board.footprint(&kiid(R1)).unwrap().layer(), 31);

    let issues = apply(&mut board, &mut shadow, vec![change(R1, json!({"layer": "Top"}))]);

    assert!(issues.is_empty());
    assert_eq!(board.footprint(&kiid(R1)).unwrap().layer(), 0);
    assert_eq!(
        shadow.find(Category::Footprints, &kiid(R1)).unwrap().get("layer"),
        Some(&json!("Top"))
    );
}

#[test]
fn bottom_layer_uses_configured_back_layer() {
    let (mut board, mut shadow) = fixture();
    let config = ApplierConfig {
        back_layer: 2,
        ..ApplierConfig::default()
    };
    let diff = CategoryDiff {
        changed: vec![change(U2, json!({"layer": "Bot"}))],
        ..CategoryDiff::default()
    };

    DiffApplier::with_config(&mut board, config).apply_footprints(&mut shadow, &diff);

    assert_eq!(board.footprint(&kiid(U2)).unwrap().layer(), 2);
}

#[test]
fn invalid_layer_skips_only_that_property() {
    let (mut board, mut shadow) = fixture();

    let issues = apply(
        &mut board,
        &mut shadow,
        vec![change(U2, json!({"layer": "Inner3", "ref": "U20"}))],
    );

    assert_eq!(issues.len(), 1);
    assert!(matches!(
        &issues[0],
        ApplyError::InvalidValue { property, .. } if property == "layer"
    ));
    let footprint = board.footprint(&kiid(U2)).unwrap();
    assert_eq!(footprint.layer(), 0);
    assert_eq!(footprint.reference(), "U20");
    let entry = shadow.find(Category::Footprints, &kiid(U2)).unwrap();
    assert_eq!(entry.get("layer"), Some(&json!("Top")));
    assert_eq!(entry.get("ref"), Some(&json!("U20")));
}

#[test]
fn model_updates_are_reported_as_gaps_and_not_mirrored() {
    let (mut board, mut shadow) = fixture();
    let models = json!([{"model_id": "000", "filename": "R_0603.wrl"}]);

    let issues = apply(
        &mut board,
        &mut shadow,
        vec![change(R1, json!({"3d_models": models}))],
    );

    assert_eq!(issues.len(), 1);
    assert!(issues[0].is_gap());
    let entry = shadow.find(Category::Footprints, &kiid(R1)).unwrap();
    assert_eq!(entry.get("3d_models"), Some(&json!([])));
    assert!(entry.hash_is_current());
}

#[test]
fn non_numeric_rotation_is_invalid() {
    let (mut board, mut shadow) = fixture();

    let issues = apply(&mut board, &mut shadow, vec![change(U2, json!({"rot": "ninety"}))]);

    assert!(matches!(&issues[0], ApplyError::InvalidValue { .. }));
    assert_eq!(board.footprint(&kiid(U2)).unwrap().orientation_degrees(), 90.0);
}

#[test]
fn unknown_footprint_is_skipped_and_others_apply() {
    let (mut board, mut shadow) = fixture();

    let issues = apply(
        &mut board,
        &mut shadow,
        vec![
            change("/00000000-0000-4000-8000-000000000000", json!({"ref": "X1"})),
            change(U2, json!({"ref": "U7"})),
        ],
    );

    assert_eq!(issues.len(), 1);
    assert!(matches!(
        &issues[0],
        ApplyError::Lookup {
            side: LookupSide::Shadow,
            ..
        }
    ));
    assert_eq!(board.footprint(&kiid(U2)).unwrap().reference(), "U7");
}

#[test]
fn full_diff_applies_both_categories() {
    let (mut board, mut shadow) = fixture();
    let diff: Diff = serde_json::from_value(json!({
        "drawings": {
            "added": [{"shape": "Line", "start": [0, 0], "end": [10, 0]}]
        },
        "footprints": {
            "changed": [{R1: {"pos": [1, 2]}}],
            "removed": [U2]
        }
    }))
    .unwrap();

    let report = DiffApplier::new(&mut board).apply(&mut shadow, &diff);

    assert_eq!(report.added.len(), 1);
    assert_eq!(report.updated, vec![kiid(R1)]);
    assert!(report.is_clean());
    assert_eq!(report.gaps().count(), 1);
    assert_eq!(shadow.drawings.len(), 1);
    assert_eq!(board.footprint(&kiid(R1)).unwrap().position(), Point::new(1, 2));
    assert!(board.footprint(&kiid(U2)).is_some());
}

#[test]
fn changing_one_footprint_leaves_siblings_untouched() {
    let (mut board, mut shadow) = fixture();
    let untouched: Map<String, Value> = shadow
        .find(Category::Footprints, &kiid(U2))
        .unwrap()
        .properties
        .clone();

    apply(&mut board, &mut shadow, vec![change(R1, json!({"ref": "R2"}))]);

    assert_eq!(
        shadow.find(Category::Footprints, &kiid(U2)).unwrap().properties,
        untouched
    );
}
