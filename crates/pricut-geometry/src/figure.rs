//! Figures: closed contours promoted to measurable, cuttable outlines.
//!
//! A figure's area is computed exactly from its integer ring. Perimeter
//! and containment go through `geo` on float coordinates, which is exact
//! enough for quoting and nesting.

use geo::line_measures::Distance;
use geo::{Contains, Euclidean, LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::contour::{Contour, Winding, double_signed_area};
use crate::coord::SCALE_F64;
use crate::types::{ContourConfig, GeometryError, Point};

/// A closed outline with its measurements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figure {
    /// Vertices in walk order, start point not repeated.
    ring: Vec<Point>,
    /// Twice the signed area, thousandths squared.
    double_signed_area: i128,
    /// Number of other figures enclosing this one.
    depth: usize,
}

impl Figure {
    /// Build a figure from a vertex ring (start point not repeated).
    #[must_use]
    pub fn from_ring(ring: Vec<Point>) -> Self {
        let double_signed_area = double_signed_area(&ring);
        Self {
            ring,
            double_signed_area,
            depth: 0,
        }
    }

    /// The vertex ring.
    #[must_use]
    pub fn ring(&self) -> &[Point] {
        &self.ring
    }

    /// Twice the signed area in thousandths squared. Negative for a
    /// clockwise ring.
    #[must_use]
    pub const fn double_signed_area(&self) -> i128 {
        self.double_signed_area
    }

    /// Enclosed area in square drawing units.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn area(&self) -> f64 {
        self.double_signed_area.unsigned_abs() as f64 / 2.0 / (SCALE_F64 * SCALE_F64)
    }

    /// Length of the closed outline in drawing units.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        let n = self.ring.len();
        (0..n)
            .map(|i| {
                let a = self.ring[i].to_f64();
                let b = self.ring[(i + 1) % n].to_f64();
                Euclidean.distance(&geo::Point::from(a), &geo::Point::from(b))
            })
            .sum()
    }

    /// Rotational sense of the ring.
    #[must_use]
    pub fn winding(&self) -> Winding {
        match self.double_signed_area.signum() {
            -1 => Winding::Clockwise,
            1 => Winding::CounterClockwise,
            _ => Winding::Degenerate,
        }
    }

    /// Number of other figures that enclose this one.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// The figure sits at odd depth: material inside it is removed.
    #[must_use]
    pub const fn is_hole(&self) -> bool {
        self.depth % 2 == 1
    }

    /// The ring as a `geo` polygon.
    #[must_use]
    pub fn to_polygon(&self) -> Polygon<f64> {
        let exterior: LineString<f64> = self.ring.iter().map(|p| p.to_f64()).collect();
        Polygon::new(exterior, vec![])
    }
}

/// All figures of a drawing, in contour order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureSet {
    figures: Vec<Figure>,
}

impl FigureSet {
    /// Group figures and compute how deeply each one is nested.
    ///
    /// A figure's depth is the number of other figures whose interior
    /// contains one of its vertices. Vertices on another figure's
    /// boundary do not count, so a hole touching its outline is still
    /// nested.
    #[must_use]
    pub fn new(mut figures: Vec<Figure>) -> Self {
        let polygons: Vec<Polygon<f64>> = figures.iter().map(Figure::to_polygon).collect();
        for (i, figure) in figures.iter_mut().enumerate() {
            let vertices: Vec<geo::Point<f64>> = figure
                .ring
                .iter()
                .map(|p| geo::Point::from(p.to_f64()))
                .collect();
            figure.depth = polygons
                .iter()
                .enumerate()
                .filter(|&(j, polygon)| j != i && vertices.iter().any(|v| polygon.contains(v)))
                .count();
        }
        Self { figures }
    }

    /// The figures.
    #[must_use]
    pub fn figures(&self) -> &[Figure] {
        &self.figures
    }

    /// Number of figures.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.figures.len()
    }

    /// Returns `true` if there are no figures.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    /// Figures that are holes in another figure.
    pub fn holes(&self) -> impl Iterator<Item = &Figure> + '_ {
        self.figures.iter().filter(|f| f.is_hole())
    }

    /// Material area: outer figures minus holes, in square units.
    #[must_use]
    pub fn net_area(&self) -> f64 {
        self.figures
            .iter()
            .map(|f| if f.is_hole() { -f.area() } else { f.area() })
            .sum()
    }

    /// Total outline length the cutter travels, in drawing units.
    #[must_use]
    pub fn cut_length(&self) -> f64 {
        self.figures.iter().map(Figure::perimeter).sum()
    }
}

/// Promote closed contours to figures.
///
/// # Errors
///
/// Returns [`GeometryError::UnclosedFigure`] for the first contour that
/// is open or has fewer than `config.min_figure_vertices` vertices, when
/// `config.require_closed` is set. Otherwise such contours are skipped.
pub fn build_figures(
    contours: &[Contour],
    config: &ContourConfig,
) -> Result<FigureSet, GeometryError> {
    let mut figures = Vec::with_capacity(contours.len());
    for contour in contours {
        let Some(start) = contour.start() else {
            continue;
        };
        let vertices = contour.vertices();
        if !contour.is_closed() || vertices.len() < config.min_figure_vertices {
            if config.require_closed {
                return Err(GeometryError::UnclosedFigure {
                    start,
                    vertex_count: vertices.len(),
                });
            }
            tracing::warn!(
                %start,
                vertices = vertices.len(),
                closed = contour.is_closed(),
                "contour skipped, not a closed figure",
            );
            continue;
        }
        figures.push(Figure::from_ring(vertices.to_vec()));
    }
    Ok(FigureSet::new(figures))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Point {
        Point::from_int(x, y)
    }

    fn closed(points: &[(i32, i32)]) -> Contour {
        let mut ring: Vec<Point> = points.iter().map(|&(x, y)| p(x, y)).collect();
        ring.push(ring[0]);
        Contour::new(ring, true)
    }

    fn clockwise_square(x: i32, y: i32, size: i32) -> Contour {
        closed(&[(x, y), (x, y + size), (x + size, y + size), (x + size, y)])
    }

    #[test]
    fn square_measurements() {
        let set = build_figures(&[clockwise_square(0, 0, 10)], &ContourConfig::default()).unwrap();
        let square = &set.figures()[0];
        assert_eq!(square.ring().len(), 4);
        assert!((square.area() - 100.0).abs() < 1e-9);
        assert!((square.perimeter() - 40.0).abs() < 1e-9);
        assert_eq!(square.winding(), Winding::Clockwise);
        assert!(!square.is_hole());
    }

    #[test]
    fn pentagon_area_is_exact() {
        let pentagon = closed(&[(0, 0), (0, 10), (10, 10), (15, 5), (10, 0)]);
        let set = build_figures(&[pentagon], &ContourConfig::default()).unwrap();
        assert_eq!(set.figures()[0].double_signed_area(), -250_000_000);
        assert!((set.figures()[0].area() - 125.0).abs() < 1e-9);
    }

    #[test]
    fn open_contour_fails_when_closure_required() {
        let open = Contour::new(vec![p(0, 0), p(0, 5), p(5, 5)], false);
        let err = build_figures(&[open], &ContourConfig::default()).unwrap_err();
        assert_eq!(
            err,
            GeometryError::UnclosedFigure {
                start: p(0, 0),
                vertex_count: 3,
            }
        );
    }

    #[test]
    fn open_contour_is_skipped_when_allowed() {
        let config = ContourConfig {
            require_closed: false,
            ..ContourConfig::default()
        };
        let open = Contour::new(vec![p(0, 0), p(0, 5)], false);
        let set = build_figures(&[open, clockwise_square(0, 0, 1)], &config).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn minimum_vertex_count_is_enforced() {
        let config = ContourConfig {
            min_figure_vertices: 5,
            ..ContourConfig::default()
        };
        let err = build_figures(&[clockwise_square(0, 0, 1)], &config).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::UnclosedFigure { vertex_count: 4, .. }
        ));
    }

    #[test]
    fn nested_square_is_a_hole() {
        let set = build_figures(
            &[clockwise_square(0, 0, 10), clockwise_square(3, 3, 4)],
            &ContourConfig::default(),
        )
        .unwrap();
        assert_eq!(set.figures()[0].depth(), 0);
        assert_eq!(set.figures()[1].depth(), 1);
        assert_eq!(set.holes().count(), 1);
        assert!((set.net_area() - 84.0).abs() < 1e-9);
        assert!((set.cut_length() - 56.0).abs() < 1e-9);
    }

    #[test]
    fn hole_touching_outline_is_still_nested() {
        // The notch starts on the outline's left edge.
        let notch = closed(&[(0, 5), (5, 8), (5, 2)]);
        let set = build_figures(
            &[clockwise_square(0, 0, 10), notch],
            &ContourConfig::default(),
        )
        .unwrap();
        assert_eq!(set.figures()[0].depth(), 0);
        assert_eq!(set.figures()[1].depth(), 1);
        assert!(set.figures()[1].is_hole());
    }

    #[test]
    fn neighbours_sharing_a_corner_are_not_nested() {
        let set = build_figures(
            &[clockwise_square(0, 0, 5), clockwise_square(5, 5, 5)],
            &ContourConfig::default(),
        )
        .unwrap();
        assert_eq!(set.holes().count(), 0);
    }

    #[test]
    fn island_inside_hole_is_material_again() {
        let set = build_figures(
            &[
                clockwise_square(0, 0, 20),
                clockwise_square(5, 5, 10),
                clockwise_square(8, 8, 4),
            ],
            &ContourConfig::default(),
        )
        .unwrap();
        let depths: Vec<usize> = set.figures().iter().map(Figure::depth).collect();
        assert_eq!(depths, vec![0, 1, 2]);
        assert!((set.net_area() - (400.0 - 100.0 + 16.0)).abs() < 1e-9);
    }

    #[test]
    fn disjoint_figures_are_not_nested() {
        let set = build_figures(
            &[clockwise_square(0, 0, 5), clockwise_square(10, 0, 5)],
            &ContourConfig::default(),
        )
        .unwrap();
        assert_eq!(set.holes().count(), 0);
        assert!((set.net_area() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_gives_empty_set() {
        let set = build_figures(&[], &ContourConfig::default()).unwrap();
        assert!(set.is_empty());
        assert!(set.net_area().abs() < f64::EPSILON);
    }

    #[test]
    fn figure_set_serializes() {
        let set = build_figures(&[clockwise_square(0, 0, 1)], &ContourConfig::default()).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        let back: FigureSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
