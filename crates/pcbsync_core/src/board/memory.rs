//! In-memory board adapter.
//!
//! # Responsibility
//! - Implement the board capabilities without a host process.
//! - Follow host conventions: circles are center + boundary point,
//!   rectangles are edited by sides, moving a circle keeps its radius.
//! - Mirror a shadow model into live objects for manual testing.
//!
//! # Invariants
//! - Kiids are unique per object list.
//! - Mutators that do not apply to a shape kind leave it unchanged.

use crate::board::{BoardDrawing, BoardFootprint, BoardHandle, LayerId, NewShape, ShapeSpec};
use crate::config::ApplierConfig;
use crate::model::geometry::{
    parse_point, radius_from_boundary, Geometry, Point, RectSides, ShapeKind,
};
use crate::model::kiid::Kiid;
use crate::model::shadow::ShadowModel;
use log::{debug, warn};

/// Drawing stored by `MemoryBoard`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDrawing {
    kiid: Kiid,
    layer: LayerId,
    width: i64,
    spec: ShapeSpec,
}

impl MemoryDrawing {
    pub fn new(kiid: Kiid, shape: NewShape) -> Self {
        Self {
            kiid,
            layer: shape.layer,
            width: shape.width,
            spec: shape.spec,
        }
    }

    pub fn spec(&self) -> &ShapeSpec {
        &self.spec
    }

    /// Shape moved by `(dx, dy)`, or `None` when any point would leave the
    /// board coordinate range.
    fn translated(&self, dx: i64, dy: i64) -> Option<ShapeSpec> {
        let shift = |point: &Point| point.offset(dx, dy);
        let spec = match &self.spec {
            ShapeSpec::Segment { start, end } => ShapeSpec::Segment {
                start: shift(start)?,
                end: shift(end)?,
            },
            ShapeSpec::Circle { center, end } => ShapeSpec::Circle {
                center: shift(center)?,
                end: shift(end)?,
            },
            ShapeSpec::Rect(sides) => {
                let top_left = shift(&Point::new(sides.left, sides.top))?;
                let bottom_right = shift(&Point::new(sides.right, sides.bottom))?;
                ShapeSpec::Rect(RectSides {
                    top: top_left.y,
                    bottom: bottom_right.y,
                    left: top_left.x,
                    right: bottom_right.x,
                })
            }
            ShapeSpec::Poly(points) => {
                ShapeSpec::Poly(points.iter().map(shift).collect::<Option<Vec<_>>>()?)
            }
            ShapeSpec::Arc { start, mid, end } => ShapeSpec::Arc {
                start: shift(start)?,
                mid: shift(mid)?,
                end: shift(end)?,
            },
        };
        Some(spec)
    }
}

impl BoardDrawing for MemoryDrawing {
    fn kiid(&self) -> &Kiid {
        &self.kiid
    }

    fn shape_kind(&self) -> ShapeKind {
        self.spec.kind()
    }

    fn layer(&self) -> LayerId {
        self.layer
    }

    fn width(&self) -> i64 {
        self.width
    }

    fn start(&self) -> Point {
        match &self.spec {
            ShapeSpec::Segment { start, .. } | ShapeSpec::Arc { start, .. } => *start,
            ShapeSpec::Circle { center, .. } => *center,
            ShapeSpec::Rect(sides) => Point::new(sides.left, sides.top),
            ShapeSpec::Poly(points) => points.first().copied().unwrap_or_default(),
        }
    }

    fn end(&self) -> Point {
        match &self.spec {
            ShapeSpec::Segment { end, .. }
            | ShapeSpec::Arc { end, .. }
            | ShapeSpec::Circle { end, .. } => *end,
            ShapeSpec::Rect(sides) => Point::new(sides.right, sides.bottom),
            ShapeSpec::Poly(points) => points.last().copied().unwrap_or_default(),
        }
    }

    fn center(&self) -> Point {
        match &self.spec {
            ShapeSpec::Circle { center, .. } => *center,
            ShapeSpec::Arc { start, mid, end } => arc_center(*start, *mid, *end).unwrap_or(*mid),
            _ => {
                let sides = self.rect_sides();
                Point::new(
                    sides.left + (sides.right - sides.left) / 2,
                    sides.top + (sides.bottom - sides.top) / 2,
                )
            }
        }
    }

    fn radius(&self) -> i64 {
        match &self.spec {
            ShapeSpec::Circle { center, end } => radius_from_boundary(*center, *end),
            ShapeSpec::Arc { start, .. } => radius_from_boundary(self.center(), *start),
            _ => 0,
        }
    }

    fn arc_mid(&self) -> Point {
        match &self.spec {
            ShapeSpec::Arc { mid, .. } => *mid,
            _ => self.start(),
        }
    }

    fn poly_points(&self) -> Vec<Point> {
        match &self.spec {
            ShapeSpec::Poly(points) => points.clone(),
            _ => Vec::new(),
        }
    }

    fn rect_sides(&self) -> RectSides {
        let points = match &self.spec {
            ShapeSpec::Rect(sides) => return *sides,
            ShapeSpec::Poly(points) => points.clone(),
            _ => vec![self.start(), self.end()],
        };
        RectSides::from_points(&points).unwrap_or(RectSides {
            top: 0,
            bottom: 0,
            left: 0,
            right: 0,
        })
    }

    fn set_start(&mut self, point: Point) {
        match &mut self.spec {
            ShapeSpec::Segment { start, .. }
            | ShapeSpec::Arc { start, .. }
            | ShapeSpec::Circle { center: start, .. } => *start = point,
            ShapeSpec::Rect(sides) => {
                sides.left = point.x;
                sides.top = point.y;
            }
            ShapeSpec::Poly(points) => {
                if let Some(first) = points.first_mut() {
                    *first = point;
                }
            }
        }
    }

    fn set_end(&mut self, point: Point) {
        match &mut self.spec {
            ShapeSpec::Segment { end, .. }
            | ShapeSpec::Arc { end, .. }
            | ShapeSpec::Circle { end, .. } => *end = point,
            ShapeSpec::Rect(sides) => {
                sides.right = point.x;
                sides.bottom = point.y;
            }
            ShapeSpec::Poly(points) => {
                if let Some(last) = points.last_mut() {
                    *last = point;
                }
            }
        }
    }

    /// Out-of-range moves leave the shape where it is.
    fn set_position(&mut self, point: Point) {
        let current = self.start();
        let moved = point
            .x
            .checked_sub(current.x)
            .zip(point.y.checked_sub(current.y))
            .and_then(|(dx, dy)| self.translated(dx, dy));
        match moved {
            Some(spec) => self.spec = spec,
            None => warn!(
                "event=drawing_move module=board status=skip kiid={} target=({},{})",
                self.kiid, point.x, point.y
            ),
        }
    }

    fn set_top(&mut self, value: i64) {
        if let ShapeSpec::Rect(sides) = &mut self.spec {
            sides.top = value;
        }
    }

    fn set_bottom(&mut self, value: i64) {
        if let ShapeSpec::Rect(sides) = &mut self.spec {
            sides.bottom = value;
        }
    }

    fn set_left(&mut self, value: i64) {
        if let ShapeSpec::Rect(sides) = &mut self.spec {
            sides.left = value;
        }
    }

    fn set_right(&mut self, value: i64) {
        if let ShapeSpec::Rect(sides) = &mut self.spec {
            sides.right = value;
        }
    }

    fn set_poly_points(&mut self, new_points: Vec<Point>) {
        if let ShapeSpec::Poly(points) = &mut self.spec {
            *points = new_points;
        }
    }

    fn set_arc_geometry(&mut self, new_start: Point, new_mid: Point, new_end: Point) {
        if let ShapeSpec::Arc { start, mid, end } = &mut self.spec {
            *start = new_start;
            *mid = new_mid;
            *end = new_end;
        }
    }
}

/// Circumcenter of the arc's three points; `None` when they are collinear.
fn arc_center(start: Point, mid: Point, end: Point) -> Option<Point> {
    let (ax, ay) = (start.x as f64, start.y as f64);
    let (bx, by) = (mid.x as f64, mid.y as f64);
    let (cx, cy) = (end.x as f64, end.y as f64);
    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d == 0.0 {
        return None;
    }
    let a2 = ax * ax + ay * ay;
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
    let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;
    Some(Point::new(ux.round() as i64, uy.round() as i64))
}

/// Footprint stored by `MemoryBoard`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryFootprint {
    kiid: Kiid,
    reference: String,
    position: Point,
    orientation_degrees: f64,
    layer: LayerId,
}

impl MemoryFootprint {
    pub fn new(kiid: Kiid, reference: impl Into<String>, position: Point) -> Self {
        Self {
            kiid,
            reference: reference.into(),
            position,
            orientation_degrees: 0.0,
            layer: 0,
        }
    }

    pub fn with_layer(mut self, layer: LayerId) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_orientation(mut self, degrees: f64) -> Self {
        self.orientation_degrees = degrees;
        self
    }
}

impl BoardFootprint for MemoryFootprint {
    fn kiid(&self) -> &Kiid {
        &self.kiid
    }

    fn reference(&self) -> &str {
        &self.reference
    }

    fn position(&self) -> Point {
        self.position
    }

    fn orientation_degrees(&self) -> f64 {
        self.orientation_degrees
    }

    fn layer(&self) -> LayerId {
        self.layer
    }

    fn set_reference(&mut self, reference: &str) {
        self.reference = reference.to_string();
    }

    fn set_position(&mut self, point: Point) {
        self.position = point;
    }

    fn set_orientation_degrees(&mut self, degrees: f64) {
        self.orientation_degrees = degrees;
    }

    fn set_layer(&mut self, layer: LayerId) {
        self.layer = layer;
    }
}

/// Track or via stored by `MemoryBoard`. Only listed, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryTrack {
    pub kiid: Kiid,
    pub start: Point,
    pub end: Point,
    pub width: i64,
}

/// Board held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryBoard {
    drawings: Vec<MemoryDrawing>,
    footprints: Vec<MemoryFootprint>,
    tracks: Vec<MemoryTrack>,
}

impl MemoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds live objects mirroring `shadow`.
    ///
    /// Drawings whose geometry cannot be read are skipped and logged.
    pub fn from_shadow(shadow: &ShadowModel, config: &ApplierConfig) -> Self {
        let mut board = Self::new();

        for entry in &shadow.drawings {
            let spec = Geometry::from_properties(&entry.properties)
                .map_err(|err| err.to_string())
                .and_then(|geometry| {
                    ShapeSpec::from_geometry(&geometry)
                        .ok_or_else(|| "drawing has no host encoding".to_string())
                });
            match spec {
                Ok(spec) => board.insert_drawing(
                    entry.kiid.clone(),
                    NewShape {
                        layer: config.edge_layer,
                        width: config.stroke_width,
                        spec,
                    },
                ),
                Err(err) => warn!(
                    "event=board_mirror module=board status=skip kiid={} error={}",
                    entry.kiid, err
                ),
            }
        }

        for entry in &shadow.footprints {
            let reference = entry.get("ref").and_then(|v| v.as_str()).unwrap_or_default();
            let position = entry
                .get("pos")
                .and_then(|v| parse_point(v).ok())
                .unwrap_or_default();
            let orientation = entry.get("rot").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let layer = entry
                .get("layer")
                .and_then(|v| v.as_str())
                .and_then(|side| config.layer_for_side(side))
                .unwrap_or(config.front_layer);
            board.insert_footprint(
                MemoryFootprint::new(entry.kiid.clone(), reference, position)
                    .with_orientation(orientation)
                    .with_layer(layer),
            );
        }

        debug!(
            "event=board_mirror module=board status=ok drawings={} footprints={}",
            board.drawings.len(),
            board.footprints.len()
        );
        board
    }

    /// Inserts a drawing under a known kiid, replacing any previous one.
    pub fn insert_drawing(&mut self, kiid: Kiid, shape: NewShape) {
        self.drawings.retain(|drawing| drawing.kiid != kiid);
        self.drawings.push(MemoryDrawing::new(kiid, shape));
    }

    /// Inserts a footprint, replacing any previous one with the same kiid.
    pub fn insert_footprint(&mut self, footprint: MemoryFootprint) {
        self.footprints.retain(|existing| existing.kiid != footprint.kiid);
        self.footprints.push(footprint);
    }

    pub fn insert_track(&mut self, track: MemoryTrack) {
        self.tracks.retain(|existing| existing.kiid != track.kiid);
        self.tracks.push(track);
    }

    pub fn drawing(&self, kiid: &Kiid) -> Option<&MemoryDrawing> {
        self.drawings.iter().find(|drawing| &drawing.kiid == kiid)
    }

    pub fn footprint(&self, kiid: &Kiid) -> Option<&MemoryFootprint> {
        self.footprints.iter().find(|footprint| &footprint.kiid == kiid)
    }

    pub fn drawings(&self) -> &[MemoryDrawing] {
        &self.drawings
    }

    pub fn footprints(&self) -> &[MemoryFootprint] {
        &self.footprints
    }
}

impl BoardHandle for MemoryBoard {
    type Drawing = MemoryDrawing;
    type Footprint = MemoryFootprint;

    fn add_shape(&mut self, shape: NewShape) -> Kiid {
        let kiid = Kiid::generate();
        self.drawings.push(MemoryDrawing::new(kiid.clone(), shape));
        kiid
    }

    fn find_drawing_by_id(&mut self, kiid: &Kiid) -> Option<&mut MemoryDrawing> {
        self.drawings.iter_mut().find(|drawing| &drawing.kiid == kiid)
    }

    fn find_footprint_by_id(&mut self, kiid: &Kiid) -> Option<&mut MemoryFootprint> {
        self.footprints
            .iter_mut()
            .find(|footprint| &footprint.kiid == kiid)
    }

    fn list_drawings(&self) -> Vec<Kiid> {
        self.drawings.iter().map(|d| d.kiid.clone()).collect()
    }

    fn list_footprints(&self) -> Vec<Kiid> {
        self.footprints.iter().map(|f| f.kiid.clone()).collect()
    }

    fn list_tracks(&self) -> Vec<Kiid> {
        self.tracks.iter().map(|t| t.kiid.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{arc_center, MemoryBoard, MemoryDrawing, MemoryFootprint, MemoryTrack};
    use crate::board::{BoardDrawing, BoardHandle, NewShape, ShapeSpec};
    use crate::model::geometry::Point;
    use crate::model::kiid::Kiid;

    #[test]
    fn moving_a_circle_keeps_its_radius() {
        let mut circle = MemoryDrawing::new(
            Kiid::generate(),
            NewShape {
                layer: 44,
                width: 100_000,
                spec: ShapeSpec::Circle {
                    center: Point::new(0, 0),
                    end: Point::new(0, 250),
                },
            },
        );
        circle.set_position(Point::new(1_000, 2_000));
        assert_eq!(circle.center(), Point::new(1_000, 2_000));
        assert_eq!(circle.end(), Point::new(1_000, 2_250));
        assert_eq!(circle.radius(), 250);
    }

    #[test]
    fn arc_center_of_half_circle() {
        let center = arc_center(Point::new(-10, 0), Point::new(0, 10), Point::new(10, 0));
        assert_eq!(center, Some(Point::new(0, 0)));
        assert_eq!(
            arc_center(Point::new(0, 0), Point::new(1, 1), Point::new(2, 2)),
            None
        );
    }

    #[test]
    fn listings_follow_insertion_and_replace_by_kiid() {
        let mut board = MemoryBoard::new();
        let track = Kiid::generate();
        let footprint = Kiid::generate();
        board.insert_track(MemoryTrack {
            kiid: track.clone(),
            start: Point::new(0, 0),
            end: Point::new(10, 0),
            width: 250_000,
        });
        board.insert_footprint(MemoryFootprint::new(footprint.clone(), "R1", Point::new(0, 0)));
        board.insert_footprint(MemoryFootprint::new(footprint.clone(), "R2", Point::new(5, 5)));
        let drawing = board.add_shape(NewShape {
            layer: 44,
            width: 100_000,
            spec: ShapeSpec::Segment {
                start: Point::new(0, 0),
                end: Point::new(1, 1),
            },
        });

        assert_eq!(board.list_tracks(), vec![track]);
        assert_eq!(board.list_footprints(), vec![footprint.clone()]);
        assert_eq!(board.list_drawings(), vec![drawing]);
        assert_eq!(board.footprint(&footprint).map(|f| f.reference.as_str()), Some("R2"));
    }

    #[test]
    fn out_of_range_move_leaves_shape_in_place() {
        let mut line = MemoryDrawing::new(
            Kiid::generate(),
            NewShape {
                layer: 44,
                width: 100_000,
                spec: ShapeSpec::Segment {
                    start: Point::new(0, 0),
                    end: Point::new(0, 1_000),
                },
            },
        );
        line.set_position(Point::new(0, i32::MAX as i64 - 10));
        assert_eq!(line.start(), Point::new(0, 0));
        assert_eq!(line.end(), Point::new(0, 1_000));
    }
}
