//! Host board capability contracts.
//!
//! # Responsibility
//! - Describe the subset of the host object model the applier mutates.
//! - Keep host encodings (circle boundary point, rectangle sides) explicit.
//!
//! # Invariants
//! - Objects are resolved by `Kiid` on every call; callers never keep
//!   handles across calls.
//! - A drawing's `shape_kind` never changes after insertion.

pub mod memory;

use crate::model::geometry::{
    circle_boundary_point, radius_from_boundary, Geometry, Point, RectSides, ShapeKind,
};
use crate::model::kiid::Kiid;

/// Host layer index.
pub type LayerId = i32;

/// Geometry in the host's own encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeSpec {
    Segment { start: Point, end: Point },
    Rect(RectSides),
    Poly(Vec<Point>),
    Arc { start: Point, mid: Point, end: Point },
    /// Center plus one point on the circumference.
    Circle { center: Point, end: Point },
}

impl ShapeSpec {
    /// Converts a descriptor into host encoding.
    ///
    /// Returns `None` when a rectangle or polygon has no points, or when a
    /// circle's boundary point falls outside the board coordinate range.
    pub fn from_geometry(geometry: &Geometry) -> Option<Self> {
        let spec = match geometry {
            Geometry::Line { start, end } => Self::Segment {
                start: *start,
                end: *end,
            },
            Geometry::Rect { points } => Self::Rect(RectSides::from_points(points)?),
            Geometry::Poly { points } if points.is_empty() => return None,
            Geometry::Poly { points } => Self::Poly(points.clone()),
            Geometry::Arc { start, mid, end } => Self::Arc {
                start: *start,
                mid: *mid,
                end: *end,
            },
            Geometry::Circle { center, radius } => Self::Circle {
                center: *center,
                end: circle_boundary_point(*center, *radius)?,
            },
        };
        Some(spec)
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Segment { .. } => ShapeKind::Line,
            Self::Rect(_) => ShapeKind::Rect,
            Self::Poly(_) => ShapeKind::Polygon,
            Self::Arc { .. } => ShapeKind::Arc,
            Self::Circle { .. } => ShapeKind::Circle,
        }
    }
}

/// A new board shape, not yet inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShape {
    pub layer: LayerId,
    pub width: i64,
    pub spec: ShapeSpec,
}

/// Live drawing capability.
pub trait BoardDrawing {
    fn kiid(&self) -> &Kiid;
    fn shape_kind(&self) -> ShapeKind;
    fn layer(&self) -> LayerId;
    fn width(&self) -> i64;

    fn start(&self) -> Point;
    fn end(&self) -> Point;
    fn center(&self) -> Point;
    fn radius(&self) -> i64;
    fn arc_mid(&self) -> Point;
    fn poly_points(&self) -> Vec<Point>;
    fn rect_sides(&self) -> RectSides;

    fn set_start(&mut self, point: Point);
    fn set_end(&mut self, point: Point);
    /// Moves the whole shape; for circles this keeps the radius.
    fn set_position(&mut self, point: Point);
    fn set_top(&mut self, value: i64);
    fn set_bottom(&mut self, value: i64);
    fn set_left(&mut self, value: i64);
    fn set_right(&mut self, value: i64);
    fn set_poly_points(&mut self, points: Vec<Point>);
    fn set_arc_geometry(&mut self, start: Point, mid: Point, end: Point);

    /// Reads the drawing back as a descriptor.
    fn geometry(&self) -> Geometry {
        match self.shape_kind() {
            ShapeKind::Line => Geometry::Line {
                start: self.start(),
                end: self.end(),
            },
            ShapeKind::Rect => Geometry::Rect {
                points: self.rect_sides().corners(),
            },
            ShapeKind::Polygon => Geometry::Poly {
                points: self.poly_points(),
            },
            ShapeKind::Arc => Geometry::Arc {
                start: self.start(),
                mid: self.arc_mid(),
                end: self.end(),
            },
            ShapeKind::Circle => Geometry::Circle {
                center: self.center(),
                radius: radius_from_boundary(self.center(), self.end()),
            },
        }
    }
}

/// Live footprint capability.
pub trait BoardFootprint {
    fn kiid(&self) -> &Kiid;
    fn reference(&self) -> &str;
    fn position(&self) -> Point;
    fn orientation_degrees(&self) -> f64;
    fn layer(&self) -> LayerId;

    fn set_reference(&mut self, reference: &str);
    fn set_position(&mut self, point: Point);
    fn set_orientation_degrees(&mut self, degrees: f64);
    fn set_layer(&mut self, layer: LayerId);
}

/// Board owned by the host; outlives any single diff application.
pub trait BoardHandle {
    type Drawing: BoardDrawing;
    type Footprint: BoardFootprint;

    /// Inserts a shape and returns the host-assigned identifier.
    fn add_shape(&mut self, shape: NewShape) -> Kiid;
    fn find_drawing_by_id(&mut self, kiid: &Kiid) -> Option<&mut Self::Drawing>;
    fn find_footprint_by_id(&mut self, kiid: &Kiid) -> Option<&mut Self::Footprint>;
    fn list_drawings(&self) -> Vec<Kiid>;
    fn list_footprints(&self) -> Vec<Kiid>;
    fn list_tracks(&self) -> Vec<Kiid>;
}
