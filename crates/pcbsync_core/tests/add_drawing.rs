use pcbsync_core::{
    ApplierConfig, ApplyError, BoardDrawing, BoardHandle, Category, CategoryDiff, DiffApplier,
    Geometry, Kiid, LookupSide, MemoryBoard, MemoryDrawing, MemoryFootprint, NewShape, Point,
    ShadowEntry, ShadowModel, ShapeKind,
};
use serde_json::{json, Map, Value};

fn props(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn line_round_trips_through_board() {
    let mut board = MemoryBoard::new();
    let kiid = DiffApplier::new(&mut board)
        .add_drawing(&props(json!({"shape": "Line", "start": [1, 2], "end": [30, 40]})))
        .unwrap();

    assert_eq!(
        board.drawing(&kiid).unwrap().geometry(),
        Geometry::Line {
            start: Point::new(1, 2),
            end: Point::new(30, 40),
        }
    );
}

#[test]
fn circle_is_stored_as_center_and_boundary_point() {
    let mut board = MemoryBoard::new();
    let kiid = DiffApplier::new(&mut board)
        .add_drawing(&props(json!({
            "shape": "Circle",
            "center": [1000000, 1000000],
            "radius": 500000
        })))
        .unwrap();

    let drawing = board.drawing(&kiid).unwrap();
    assert_eq!(drawing.center(), Point::new(1_000_000, 1_000_000));
    assert_eq!(drawing.end(), Point::new(1_000_000, 1_500_000));
    assert_eq!(
        drawing.geometry(),
        Geometry::Circle {
            center: Point::new(1_000_000, 1_000_000),
            radius: 500_000,
        }
    );
}

#[test]
fn arc_round_trips_through_board() {
    let mut board = MemoryBoard::new();
    let kiid = DiffApplier::new(&mut board)
        .add_drawing(&props(json!({
            "shape": "Arc",
            "points": [[-10, 0], [0, 10], [10, 0]]
        })))
        .unwrap();

    let drawing = board.drawing(&kiid).unwrap();
    assert_eq!(drawing.shape_kind(), ShapeKind::Arc);
    assert_eq!(drawing.start(), Point::new(-10, 0));
    assert_eq!(drawing.arc_mid(), Point::new(0, 10));
    assert_eq!(drawing.end(), Point::new(10, 0));
    assert_eq!(drawing.center(), Point::new(0, 0));
    assert_eq!(drawing.radius(), 10);
}

#[test]
fn new_drawings_use_configured_layer_and_width() {
    let mut board = MemoryBoard::new();
    let config = ApplierConfig {
        edge_layer: 25,
        stroke_width: 150_000,
        ..ApplierConfig::default()
    };
    let kiid = DiffApplier::with_config(&mut board, config)
        .add_drawing(&props(json!({"shape": "Line", "start": [0, 0], "end": [1, 0]})))
        .unwrap();

    let drawing = board.drawing(&kiid).unwrap();
    assert_eq!(drawing.layer(), 25);
    assert_eq!(drawing.width(), 150_000);
}

#[test]
fn default_layer_is_edge_cuts() {
    let mut board = MemoryBoard::new();
    let kiid = DiffApplier::new(&mut board)
        .add_drawing(&props(json!({"shape": "Line", "start": [0, 0], "end": [1, 0]})))
        .unwrap();

    let drawing = board.drawing(&kiid).unwrap();
    assert_eq!(drawing.layer(), 44);
    assert_eq!(drawing.width(), 100_000);
}

#[test]
fn unknown_shape_leaves_board_and_shadow_unchanged() {
    let mut board = MemoryBoard::new();
    let mut shadow = ShadowModel::new();
    let diff = CategoryDiff {
        added: vec![props(json!({"shape": "Bezier", "points": [[0, 0], [1, 1]]}))],
        ..CategoryDiff::default()
    };

    let report = DiffApplier::new(&mut board).apply_drawings(&mut shadow, &diff);

    assert!(board.list_drawings().is_empty());
    assert!(shadow.drawings.is_empty());
    assert_eq!(report.errors().count(), 1);
    assert!(matches!(
        report.issues[0].error,
        ApplyError::UnsupportedShape(ref reason) if reason.contains("Bezier")
    ));
}

#[test]
fn malformed_geometry_is_unsupported() {
    let mut board = MemoryBoard::new();
    let err = DiffApplier::new(&mut board)
        .add_drawing(&props(json!({"shape": "Circle", "center": [0, 0]})))
        .unwrap_err();

    assert!(matches!(err, ApplyError::UnsupportedShape(_)));
    assert!(board.list_drawings().is_empty());
}

#[test]
fn non_positive_circle_radius_is_unsupported() {
    for radius in [0, -500] {
        let mut board = MemoryBoard::new();
        let mut shadow = ShadowModel::new();
        let diff = CategoryDiff {
            added: vec![props(json!({"shape": "Circle", "center": [0, 0], "radius": radius}))],
            ..CategoryDiff::default()
        };

        let report = DiffApplier::new(&mut board).apply_drawings(&mut shadow, &diff);

        assert!(matches!(report.issues[0].error, ApplyError::UnsupportedShape(_)));
        assert!(board.list_drawings().is_empty());
        assert!(shadow.drawings.is_empty());
    }
}

#[test]
fn coordinates_outside_host_range_are_unsupported() {
    let descriptors = [
        json!({"shape": "Circle", "center": [0, i64::MAX - 1], "radius": 10}),
        json!({"shape": "Circle", "center": [0, i32::MAX - 5], "radius": 10}),
        json!({"shape": "Line", "start": [0, 0], "end": [i64::MIN, 0]}),
    ];

    for descriptor in descriptors {
        let mut board = MemoryBoard::new();
        let err = DiffApplier::new(&mut board)
            .add_drawing(&props(descriptor))
            .unwrap_err();
        assert!(matches!(err, ApplyError::UnsupportedShape(_)));
        assert!(board.list_drawings().is_empty());
    }
}

/// Host that hands out the same kiid for every new shape.
struct ReusingBoard {
    inner: MemoryBoard,
    kiid: Kiid,
}

impl BoardHandle for ReusingBoard {
    type Drawing = MemoryDrawing;
    type Footprint = MemoryFootprint;

    fn add_shape(&mut self, shape: NewShape) -> Kiid {
        self.inner.insert_drawing(self.kiid.clone(), shape);
        self.kiid.clone()
    }

    fn find_drawing_by_id(&mut self, kiid: &Kiid) -> Option<&mut MemoryDrawing> {
        self.inner.find_drawing_by_id(kiid)
    }

    fn find_footprint_by_id(&mut self, kiid: &Kiid) -> Option<&mut MemoryFootprint> {
        self.inner.find_footprint_by_id(kiid)
    }

    fn list_drawings(&self) -> Vec<Kiid> {
        self.inner.list_drawings()
    }

    fn list_footprints(&self) -> Vec<Kiid> {
        self.inner.list_footprints()
    }

    fn list_tracks(&self) -> Vec<Kiid> {
        self.inner.list_tracks()
    }
}

#[test]
fn reused_host_kiid_keeps_existing_shadow_entry() {
    let kiid = Kiid::new("reused").unwrap();
    let mut board = ReusingBoard {
        inner: MemoryBoard::new(),
        kiid: kiid.clone(),
    };
    let mut shadow = ShadowModel::new();
    let existing = ShadowEntry::new(
        kiid.clone(),
        props(json!({"shape": "Line", "start": [0, 0], "end": [1, 0]})),
    );
    shadow.drawings.push(existing.clone());
    let diff = CategoryDiff {
        added: vec![props(json!({"shape": "Circle", "center": [0, 0], "radius": 5}))],
        ..CategoryDiff::default()
    };

    let report = DiffApplier::new(&mut board).apply_drawings(&mut shadow, &diff);

    assert!(report.added.is_empty());
    assert!(matches!(
        report.issues[0].error,
        ApplyError::Lookup {
            side: LookupSide::Duplicate,
            ..
        }
    ));
    assert_eq!(shadow.drawings, vec![existing]);
    assert_eq!(board.list_drawings(), vec![kiid]);
}

#[test]
fn added_drawings_enter_shadow_with_host_kiid_and_fresh_hash() {
    let mut board = MemoryBoard::new();
    let mut shadow = ShadowModel::new();
    let diff = CategoryDiff {
        added: vec![
            props(json!({"shape": "Line", "start": [0, 0], "end": [5, 0], "ID": 1})),
            props(json!({"shape": "Triangle"})),
            props(json!({"shape": "Polygon", "points": [[0, 0], [4, 0], [2, 3]]})),
        ],
        ..CategoryDiff::default()
    };

    let report = DiffApplier::new(&mut board).apply_drawings(&mut shadow, &diff);

    assert_eq!(report.added.len(), 2);
    assert_eq!(report.errors().count(), 1);
    assert_eq!(board.list_drawings(), report.added);
    assert_eq!(shadow.drawings.len(), 2);
    for kiid in &report.added {
        let entry = shadow.find(Category::Drawings, kiid).unwrap();
        assert_eq!(&entry.kiid, kiid);
        assert!(entry.hash_is_current());
    }
    assert_eq!(shadow.drawings[0].get("ID"), Some(&json!(1)));
    assert!(shadow.validate().is_ok());
}

#[test]
fn rect_descriptor_is_created_from_bounds() {
    let mut board = MemoryBoard::new();
    let kiid = DiffApplier::new(&mut board)
        .add_drawing(&props(json!({
            "shape": "Rect",
            "points": [[100, 50], [0, 0], [100, 0], [0, 50]]
        })))
        .unwrap();

    let sides = board.drawing(&kiid).unwrap().rect_sides();
    assert_eq!((sides.top, sides.bottom, sides.left, sides.right), (0, 50, 0, 100));
}
