//! Drawing geometry descriptors.
//!
//! # Responsibility
//! - Provide typed shapes for board drawings (`Geometry`, `ShapeKind`).
//! - Parse and emit the JSON property layout used by the shadow model.
//! - Host encoding helpers (circle boundary point, rectangle sides).
//!
//! # Invariants
//! - Coordinates are integer board units; no rounding beyond integer math,
//!   except radius read-back from a boundary point.
//! - `Arc` always carries exactly three points.
//! - Parsed coordinates and lengths fit the host's 32-bit range, and
//!   `Point::offset` refuses results outside it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const PROP_SHAPE: &str = "shape";
pub const PROP_START: &str = "start";
pub const PROP_END: &str = "end";
pub const PROP_POINTS: &str = "points";
pub const PROP_CENTER: &str = "center";
pub const PROP_RADIUS: &str = "radius";

/// Host coordinates are signed 32-bit board units.
pub const COORD_MIN: i64 = i32::MIN as i64;
pub const COORD_MAX: i64 = i32::MAX as i64;

pub fn in_board_range(value: i64) -> bool {
    (COORD_MIN..=COORD_MAX).contains(&value)
}

/// 2D point in integer board units, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Moved point, or `None` when the result leaves the board coordinate range.
    pub fn offset(self, dx: i64, dy: i64) -> Option<Self> {
        let x = self.x.checked_add(dx).filter(|x| in_board_range(*x))?;
        let y = self.y.checked_add(dy).filter(|y| in_board_range(*y))?;
        Some(Self::new(x, y))
    }
}

impl From<[i64; 2]> for Point {
    fn from(value: [i64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<Point> for [i64; 2] {
    fn from(value: Point) -> Self {
        [value.x, value.y]
    }
}

impl From<Point> for Value {
    fn from(value: Point) -> Self {
        Value::Array(vec![Value::from(value.x), Value::from(value.y)])
    }
}

/// Shape classification of a board drawing.
///
/// Wire names follow the host's display names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Line,
    Rect,
    Polygon,
    Arc,
    Circle,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Line => "Line",
            Self::Rect => "Rect",
            Self::Polygon => "Polygon",
            Self::Arc => "Arc",
            Self::Circle => "Circle",
        }
    }

    /// Parses a wire name, accepting the `Poly` and `Segment` aliases.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Line" | "Segment" => Some(Self::Line),
            "Rect" => Some(Self::Rect),
            "Polygon" | "Poly" => Some(Self::Polygon),
            "Arc" => Some(Self::Arc),
            "Circle" => Some(Self::Circle),
            _ => None,
        }
    }
}

impl Display for ShapeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ShapeKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ShapeKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ShapeKind::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown shape kind `{raw}`")))
    }
}

/// Axis-aligned rectangle expressed by its sides, as the host edits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectSides {
    pub top: i64,
    pub bottom: i64,
    pub left: i64,
    pub right: i64,
}

impl RectSides {
    /// Bounding sides of `points`; `None` when `points` is empty.
    ///
    /// Always yields `top <= bottom` and `left <= right`.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut sides = Self {
            top: first.y,
            bottom: first.y,
            left: first.x,
            right: first.x,
        };
        for point in &points[1..] {
            sides.top = sides.top.min(point.y);
            sides.bottom = sides.bottom.max(point.y);
            sides.left = sides.left.min(point.x);
            sides.right = sides.right.max(point.x);
        }
        Some(sides)
    }

    /// Corners in host order: start, top-right, end, bottom-left.
    pub fn corners(&self) -> Vec<Point> {
        vec![
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
            Point::new(self.left, self.bottom),
        ]
    }
}

/// Typed geometry of one drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Geometry {
    Line { start: Point, end: Point },
    Rect { points: Vec<Point> },
    Poly { points: Vec<Point> },
    Arc { start: Point, mid: Point, end: Point },
    Circle { center: Point, radius: i64 },
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Line { .. } => ShapeKind::Line,
            Self::Rect { .. } => ShapeKind::Rect,
            Self::Poly { .. } => ShapeKind::Polygon,
            Self::Arc { .. } => ShapeKind::Arc,
            Self::Circle { .. } => ShapeKind::Circle,
        }
    }

    /// Reads geometry from a shadow-model property map.
    ///
    /// # Errors
    /// - `MissingShape` / `UnknownShape` when the `shape` tag is absent or unrecognized.
    /// - `MissingField` / `InvalidField` when a required geometry field is malformed.
    pub fn from_properties(properties: &Map<String, Value>) -> Result<Self, GeometryError> {
        let raw_shape = properties
            .get(PROP_SHAPE)
            .ok_or(GeometryError::MissingShape)?;
        let shape_name = raw_shape
            .as_str()
            .ok_or_else(|| GeometryError::UnknownShape(raw_shape.to_string()))?;
        let kind = ShapeKind::parse(shape_name)
            .ok_or_else(|| GeometryError::UnknownShape(shape_name.to_string()))?;

        let field = |name: &'static str| {
            properties
                .get(name)
                .ok_or(GeometryError::MissingField { shape: kind, field: name })
        };
        let invalid = |name: &'static str| {
            move |reason: String| GeometryError::InvalidField { field: name, reason }
        };

        let geometry = match kind {
            ShapeKind::Line => Self::Line {
                start: parse_point(field(PROP_START)?).map_err(invalid(PROP_START))?,
                end: parse_point(field(PROP_END)?).map_err(invalid(PROP_END))?,
            },
            ShapeKind::Rect => Self::Rect {
                points: parse_points(field(PROP_POINTS)?).map_err(invalid(PROP_POINTS))?,
            },
            ShapeKind::Polygon => Self::Poly {
                points: parse_points(field(PROP_POINTS)?).map_err(invalid(PROP_POINTS))?,
            },
            ShapeKind::Arc => {
                let [start, mid, end] =
                    parse_arc_points(field(PROP_POINTS)?).map_err(invalid(PROP_POINTS))?;
                Self::Arc { start, mid, end }
            }
            ShapeKind::Circle => {
                let center = parse_point(field(PROP_CENTER)?).map_err(invalid(PROP_CENTER))?;
                let radius = parse_length(field(PROP_RADIUS)?).map_err(invalid(PROP_RADIUS))?;
                if radius <= 0 {
                    return Err(invalid(PROP_RADIUS)(format!(
                        "radius must be positive, got {radius}"
                    )));
                }
                if circle_boundary_point(center, radius).is_none() {
                    return Err(invalid(PROP_RADIUS)(format!(
                        "circle of radius {radius} leaves the board coordinate range"
                    )));
                }
                Self::Circle { center, radius }
            }
        };
        Ok(geometry)
    }

    /// Emits the property layout the shadow model stores for this geometry.
    pub fn to_properties(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        properties.insert(PROP_SHAPE.to_string(), Value::from(self.kind().as_str()));
        match self {
            Self::Line { start, end } => {
                properties.insert(PROP_START.to_string(), Value::from(*start));
                properties.insert(PROP_END.to_string(), Value::from(*end));
            }
            Self::Rect { points } | Self::Poly { points } => {
                properties.insert(PROP_POINTS.to_string(), points_value(points));
            }
            Self::Arc { start, mid, end } => {
                properties.insert(PROP_POINTS.to_string(), points_value(&[*start, *mid, *end]));
            }
            Self::Circle { center, radius } => {
                properties.insert(PROP_CENTER.to_string(), Value::from(*center));
                properties.insert(PROP_RADIUS.to_string(), Value::from(*radius));
            }
        }
        properties
    }
}

/// Geometry parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    MissingShape,
    UnknownShape(String),
    MissingField {
        shape: ShapeKind,
        field: &'static str,
    },
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

impl Display for GeometryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingShape => write!(f, "drawing has no `shape` tag"),
            Self::UnknownShape(value) => write!(f, "unknown drawing shape `{value}`"),
            Self::MissingField { shape, field } => {
                write!(f, "{shape} drawing is missing `{field}`")
            }
            Self::InvalidField { field, reason } => write!(f, "invalid `{field}`: {reason}"),
        }
    }
}

impl Error for GeometryError {}

/// Circle boundary point as the host stores it: straight below the center.
pub fn circle_boundary_point(center: Point, radius: i64) -> Option<Point> {
    center.offset(0, radius)
}

/// Radius implied by a center and a boundary point, rounded to board units.
pub fn radius_from_boundary(center: Point, boundary: Point) -> i64 {
    let dx = (boundary.x - center.x) as f64;
    let dy = (boundary.y - center.y) as f64;
    dx.hypot(dy).round() as i64
}

pub fn points_value(points: &[Point]) -> Value {
    Value::Array(points.iter().copied().map(Value::from).collect())
}

/// Parses `[x, y]`.
pub fn parse_point(value: &Value) -> Result<Point, String> {
    let items = value
        .as_array()
        .ok_or_else(|| format!("expected [x, y], got {value}"))?;
    if items.len() != 2 {
        return Err(format!("expected 2 coordinates, got {}", items.len()));
    }
    Ok(Point::new(parse_length(&items[0])?, parse_length(&items[1])?))
}

/// Parses a non-empty list of `[x, y]` points.
pub fn parse_points(value: &Value) -> Result<Vec<Point>, String> {
    let items = value
        .as_array()
        .ok_or_else(|| format!("expected a list of points, got {value}"))?;
    if items.is_empty() {
        return Err("point list must not be empty".to_string());
    }
    items.iter().map(parse_point).collect()
}

/// Parses exactly three arc points: start, mid, end.
pub fn parse_arc_points(value: &Value) -> Result<[Point; 3], String> {
    let points = parse_points(value)?;
    match points.as_slice() {
        [start, mid, end] => Ok([*start, *mid, *end]),
        other => Err(format!("arc needs 3 points, got {}", other.len())),
    }
}

/// Parses an integer board length. Integral floats are accepted.
pub fn parse_length(value: &Value) -> Result<i64, String> {
    let number = match (value.as_i64(), value.as_f64()) {
        (Some(number), _) => number,
        (None, Some(number)) if number.fract() == 0.0 && number.abs() <= COORD_MAX as f64 => {
            number as i64
        }
        _ => return Err(format!("expected integer board units, got {value}")),
    };
    if !in_board_range(number) {
        return Err(format!(
            "{number} is outside the board coordinate range [{COORD_MIN}, {COORD_MAX}]"
        ));
    }
    Ok(number)
}
