//! Shared types for the contour extraction pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contour::Contour;
use crate::coord::{Coord, QuantizeError};
use crate::figure::FigureSet;

/// A point in the drawing plane with exact decimal coordinates.
///
/// Points order lexicographically by `(x, y)`; the smallest point of a
/// component is its leftmost-lowest node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (drawing units, x grows to the right).
    pub x: Coord,
    /// Vertical position (drawing units, y grows upward).
    pub y: Coord,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Create a point from whole drawing units.
    #[must_use]
    pub fn from_int(x: i32, y: i32) -> Self {
        Self::new(Coord::from_int(x), Coord::from_int(y))
    }

    /// Quantize a floating-point pair.
    ///
    /// # Errors
    ///
    /// Propagates the [`QuantizeError`] of either coordinate.
    pub fn from_f64(x: f64, y: f64) -> Result<Self, QuantizeError> {
        Ok(Self::new(Coord::from_f64(x)?, Coord::from_f64(y)?))
    }

    /// Exact vector `other - self` in thousandths.
    #[must_use]
    pub fn delta_to(self, other: Self) -> (i128, i128) {
        (
            i128::from(other.x.units()) - i128::from(self.x.units()),
            i128::from(other.y.units()) - i128::from(self.y.units()),
        )
    }

    /// Exact squared distance in thousandths squared.
    #[must_use]
    pub fn distance_squared_units(self, other: Self) -> i128 {
        let (dx, dy) = self.delta_to(other);
        dx * dx + dy * dy
    }

    /// Euclidean distance in drawing units.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = other.x.to_f64() - self.x.to_f64();
        let dy = other.y.to_f64() - self.y.to_f64();
        dx.hypot(dy)
    }

    /// Absolute angle of the vector `other - self`, in radians in `(-π, π]`,
    /// measured counterclockwise from the positive x axis.
    ///
    /// Informational only: ordering decisions use the exact comparator
    /// [`compare_angles`](crate::contour::compare_angles).
    #[must_use]
    pub fn angle_to(self, other: Self) -> f64 {
        let dx = other.x.to_f64() - self.x.to_f64();
        let dy = other.y.to_f64() - self.y.to_f64();
        dy.atan2(dx)
    }

    /// Coordinates as floats, for measurement and rendering.
    #[must_use]
    pub fn to_f64(self) -> (f64, f64) {
        (self.x.to_f64(), self.y.to_f64())
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A line segment between two points, in the direction it was given.
///
/// `(a, b)` and `(b, a)` describe the same undirected edge; use
/// [`key`](Self::key) to compare segments regardless of direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    /// First endpoint as stored.
    pub a: Point,
    /// Second endpoint as stored.
    pub b: Point,
}

impl Segment {
    /// Create a new segment. Degeneracy is checked at ingestion.
    #[must_use]
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Direction-free identity of this segment.
    #[must_use]
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.a, self.b)
    }

    /// Both endpoints are the same point.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.a == self.b
    }

    /// The same segment stored in the opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self::new(self.b, self.a)
    }
}

/// Unordered endpoint pair identifying an undirected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    low: Point,
    high: Point,
}

impl EdgeKey {
    /// Normalize an endpoint pair so that `(a, b)` and `(b, a)` are equal.
    #[must_use]
    pub fn new(a: Point, b: Point) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// The endpoints, smaller point first.
    #[must_use]
    pub const fn endpoints(&self) -> (Point, Point) {
        (self.low, self.high)
    }
}

/// A coordinate as it arrives from an upstream producer.
///
/// Numbers are quantized; text is parsed exactly as a decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCoord {
    /// A JSON number or a float extracted from a CAD entity.
    Number(f64),
    /// Decimal text such as `"10.125"`.
    Text(String),
}

impl RawCoord {
    /// Convert to an exact [`Coord`].
    ///
    /// # Errors
    ///
    /// Returns the [`QuantizeError`] describing why the value is unusable.
    pub fn to_coord(&self) -> Result<Coord, QuantizeError> {
        match self {
            Self::Number(v) => Coord::from_f64(*v),
            Self::Text(s) => s.parse(),
        }
    }
}

impl From<f64> for RawCoord {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawCoord {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// An unvalidated point: expected to hold exactly two coordinates.
pub type RawPoint = Vec<RawCoord>;

/// An unvalidated segment: expected to hold exactly two points.
pub type RawSegment = Vec<RawPoint>;

/// An unvalidated polyline: any number of points.
pub type RawPolyline = Vec<RawPoint>;

/// Line geometry extracted from one drawing.
///
/// `segments` are loose lines (DXF `LINE` entities and arc
/// approximations). `polylines` are already-ordered point chains; closed
/// ones are taken as contours directly, open ones are split into
/// segments and ingested with the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    /// Loose line segments.
    #[serde(default)]
    pub segments: Vec<RawSegment>,
    /// Ordered point chains.
    #[serde(default)]
    pub polylines: Vec<RawPolyline>,
}

/// How the clockwise walk picks its first node in each component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartRule {
    /// Lexicographically smallest `(x, y)` point of the component.
    ///
    /// This node lies on the convex hull, so a simple polygon is always
    /// walked clockwise from it.
    #[default]
    LowestPoint,

    /// First endpoint of the component's earliest ingested edge.
    FirstEdge,
}

/// Configuration for the contour extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    /// Start node selection for every component walk.
    pub start_rule: StartRule,

    /// Fail with [`GeometryError::UnclosedFigure`] when a contour cannot
    /// become a figure. When `false`, such contours are skipped.
    pub require_closed: bool,

    /// Minimum number of distinct vertices a closed contour needs to
    /// count as a figure.
    pub min_figure_vertices: usize,
}

impl ContourConfig {
    /// Default start rule.
    pub const DEFAULT_START_RULE: StartRule = StartRule::LowestPoint;
    /// Default closure requirement.
    pub const DEFAULT_REQUIRE_CLOSED: bool = true;
    /// Default minimum figure size (a triangle).
    pub const DEFAULT_MIN_FIGURE_VERTICES: usize = 3;
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            start_rule: Self::DEFAULT_START_RULE,
            require_closed: Self::DEFAULT_REQUIRE_CLOSED,
            min_figure_vertices: Self::DEFAULT_MIN_FIGURE_VERTICES,
        }
    }
}

/// Output of the full pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// One contour per component, plus one per closed input polyline.
    pub contours: Vec<Contour>,
    /// Closed contours promoted to cuttable figures.
    pub figures: FigureSet,
}

/// Errors that can occur while extracting contours.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// A segment is not two points of two numeric coordinates.
    #[error("segment {index} is malformed: {reason}")]
    MalformedSegment {
        /// Position of the segment in the input.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A segment starts and ends at the same point.
    #[error("segment {index} is degenerate: both endpoints are {point}")]
    DegenerateSegment {
        /// Position of the segment in the input.
        index: usize,
        /// The repeated endpoint.
        point: Point,
    },

    /// A polyline contains a malformed point.
    #[error("polyline {index} is malformed: {reason}")]
    MalformedPolyline {
        /// Position of the polyline in the input.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A contour is open or too small to be cut as a figure.
    #[error("figure starting at {start} is not closed ({vertex_count} vertices)")]
    UnclosedFigure {
        /// First point of the offending contour.
        start: Point,
        /// Number of distinct vertices it has.
        vertex_count: usize,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn point_ordering_is_lexicographic() {
        assert!(Point::from_int(0, 10) < Point::from_int(1, 0));
        assert!(Point::from_int(1, 0) < Point::from_int(1, 1));
    }

    #[test]
    fn point_distance() {
        let a = Point::from_int(0, 0);
        let b = Point::from_int(3, 4);
        assert_eq!(a.distance_squared_units(b), 25_000_000);
        assert!((a.distance(b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn point_display() {
        let p = Point::from_f64(1.5, -2.0).unwrap();
        assert_eq!(p.to_string(), "(1.500, -2.000)");
    }

    #[test]
    fn edge_key_ignores_direction() {
        let a = Point::from_int(15, 5);
        let b = Point::from_int(10, 0);
        assert_eq!(Segment::new(a, b).key(), Segment::new(b, a).key());
        assert_eq!(EdgeKey::new(a, b).endpoints(), (b, a));
    }

    #[test]
    fn segment_degeneracy() {
        let p = Point::from_int(1, 1);
        assert!(Segment::new(p, p).is_degenerate());
        assert!(!Segment::new(p, Point::from_int(1, 2)).is_degenerate());
    }

    #[test]
    fn raw_coord_conversion() {
        assert_eq!(
            RawCoord::from(2.5).to_coord().unwrap(),
            Coord::from_units(2_500)
        );
        assert_eq!(
            RawCoord::from("2.5").to_coord().unwrap(),
            Coord::from_units(2_500)
        );
        assert_eq!(
            RawCoord::from("two").to_coord(),
            Err(QuantizeError::Unparseable)
        );
    }

    #[test]
    fn drawing_deserializes_mixed_coordinates() {
        let json = r#"{"segments": [[[0, 0], ["10.5", 0]]]}"#;
        let drawing: Drawing = serde_json::from_str(json).unwrap();
        assert_eq!(drawing.segments.len(), 1);
        assert!(drawing.polylines.is_empty());
        assert_eq!(drawing.segments[0][1][0], RawCoord::Text("10.5".into()));
    }

    #[test]
    fn config_defaults() {
        let config = ContourConfig::default();
        assert_eq!(config.start_rule, StartRule::LowestPoint);
        assert!(config.require_closed);
        assert_eq!(config.min_figure_vertices, 3);
    }

    #[test]
    fn config_partial_json_uses_defaults() {
        let config: ContourConfig =
            serde_json::from_str(r#"{"start_rule": "first-edge"}"#).unwrap();
        assert_eq!(config.start_rule, StartRule::FirstEdge);
        assert!(config.require_closed);
    }

    #[test]
    fn error_display() {
        let err = GeometryError::DegenerateSegment {
            index: 3,
            point: Point::from_int(1, 1),
        };
        assert_eq!(
            err.to_string(),
            "segment 3 is degenerate: both endpoints are (1.000, 1.000)",
        );
        let err = GeometryError::MalformedSegment {
            index: 0,
            reason: "expected 2 points, found 3".into(),
        };
        assert_eq!(
            err.to_string(),
            "segment 0 is malformed: expected 2 points, found 3",
        );
    }
}
