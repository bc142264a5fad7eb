//! Clockwise contour ordering: walk a component into an ordered outline.
//!
//! From the start node the walk repeatedly takes the unvisited edge whose
//! absolute direction angle (`atan2(dy, dx)`, in `(-π, π]`) is largest,
//! i.e. the most clockwise choice when scanning down from `π`. Each edge
//! is used at most once, in either direction. The walk ends when it
//! returns to the start (closed) or runs out of edges (open).
//!
//! Angles are compared exactly on integer direction vectors, so collinear
//! and near-collinear candidates never produce spurious ties. Truly equal
//! angles (two neighbours on the same ray) prefer the nearer neighbour,
//! then the smaller point.
//!
//! # Strategy pattern
//!
//! The start node is chosen through the [`StartSelector`] trait, which
//! [`StartRule`] implements, so callers can plug in their own choice.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::partition::Component;
use crate::types::{EdgeKey, Point, StartRule};

/// Picks the node a component walk starts from.
pub trait StartSelector {
    /// Choose the start node, or `None` for an empty component.
    fn select_start(&self, component: &Component) -> Option<Point>;
}

impl StartSelector for StartRule {
    fn select_start(&self, component: &Component) -> Option<Point> {
        match *self {
            Self::LowestPoint => component.lowest_point(),
            Self::FirstEdge => component.edges().first().map(|s| s.a),
        }
    }
}

/// Rotational sense of a closed outline in a y-up plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winding {
    /// Negative signed area.
    Clockwise,
    /// Positive signed area.
    CounterClockwise,
    /// Zero signed area (collinear or back-and-forth outline).
    Degenerate,
}

/// An ordered walk through a component.
///
/// A closed contour repeats its start point as the last point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour {
    points: Vec<Point>,
    closed: bool,
}

impl Contour {
    /// Create a contour from an ordered point sequence.
    #[must_use]
    pub const fn new(points: Vec<Point>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// The walked points, in order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Consumes the contour and returns its points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// The walk returned to its start.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// First point of the walk.
    #[must_use]
    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// Points without the repeated start of a closed walk.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        match self.points.split_last() {
            Some((_, rest)) if self.closed => rest,
            _ => &self.points,
        }
    }

    /// Number of edges walked.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Edges walked, direction-free, in walk order.
    #[must_use]
    pub fn edge_keys(&self) -> Vec<EdgeKey> {
        self.points
            .windows(2)
            .map(|w| EdgeKey::new(w[0], w[1]))
            .collect()
    }

    /// Twice the signed shoelace area of the vertex ring, in thousandths
    /// squared. An open walk is measured as if closed by a chord.
    #[must_use]
    pub fn double_signed_area(&self) -> i128 {
        double_signed_area(self.vertices())
    }

    /// Rotational sense of the vertex ring.
    #[must_use]
    pub fn winding(&self) -> Winding {
        match self.double_signed_area().cmp(&0) {
            Ordering::Less => Winding::Clockwise,
            Ordering::Greater => Winding::CounterClockwise,
            Ordering::Equal => Winding::Degenerate,
        }
    }
}

/// Twice the signed area of a ring of points (shoelace formula).
#[must_use]
pub fn double_signed_area(ring: &[Point]) -> i128 {
    let n = ring.len();
    if n < 3 {
        return 0;
    }
    (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            i128::from(a.x.units()) * i128::from(b.y.units())
                - i128::from(b.x.units()) * i128::from(a.y.units())
        })
        .sum()
}

/// Compare the absolute angles of `a - from` and `b - from`.
///
/// Equivalent to comparing `atan2(dy, dx)` of both vectors, with the
/// angle of a vector pointing along the negative x axis taken as `π`.
/// `a` and `b` must differ from `from`.
#[must_use]
pub fn compare_angles(from: Point, a: Point, b: Point) -> Ordering {
    let va = from.delta_to(a);
    let vb = from.delta_to(b);
    half_plane(va).cmp(&half_plane(vb)).then_with(|| {
        // Within one half-plane the two angles differ by less than π,
        // so the cross product sign orders them.
        let cross = va.0 * vb.1 - va.1 * vb.0;
        0.cmp(&cross)
    })
}

/// Which part of `(-π, π]` a direction falls in: `(-π, 0)`, `[0, π)`, `{π}`.
const fn half_plane((dx, dy): (i128, i128)) -> u8 {
    if dy < 0 {
        0
    } else if dy > 0 || dx > 0 {
        1
    } else {
        2
    }
}

/// Order two candidate next nodes: `Greater` means `a` is preferred.
fn compare_candidates(from: Point, a: Point, b: Point) -> Ordering {
    compare_angles(from, a, b)
        .then_with(|| {
            from.distance_squared_units(b)
                .cmp(&from.distance_squared_units(a))
        })
        .then_with(|| b.cmp(&a))
}

/// The most clockwise neighbour reachable over an unvisited edge.
fn most_clockwise(current: Point, neighbors: &[Point], visited: &HashSet<EdgeKey>) -> Option<Point> {
    neighbors
        .iter()
        .copied()
        .filter(|&n| !visited.contains(&EdgeKey::new(current, n)))
        .max_by(|&a, &b| compare_candidates(current, a, b))
}

/// Walk states. `Start` and `Walking` loop; `Closed` and `Open` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    Start,
    Walking,
    Closed,
    Open,
}

/// Walk from `start` over `adjacency`, always taking the most clockwise
/// unvisited edge.
#[must_use]
pub fn walk_clockwise(adjacency: &BTreeMap<Point, Vec<Point>>, start: Point) -> Contour {
    let mut visited: HashSet<EdgeKey> = HashSet::new();
    let mut path = vec![start];
    let mut current = start;
    let mut state = WalkState::Start;

    while matches!(state, WalkState::Start | WalkState::Walking) {
        let next = adjacency
            .get(&current)
            .and_then(|neighbors| most_clockwise(current, neighbors, &visited));

        state = match next {
            None => WalkState::Open,
            Some(next) => {
                visited.insert(EdgeKey::new(current, next));
                path.push(next);
                current = next;
                if next == start {
                    WalkState::Closed
                } else {
                    WalkState::Walking
                }
            }
        };
    }

    Contour::new(path, state == WalkState::Closed)
}

/// Order one component into a contour.
///
/// Returns `None` only when the selector finds no start node (an empty
/// component).
#[must_use]
pub fn order_component(component: &Component, selector: &impl StartSelector) -> Option<Contour> {
    let start = selector.select_start(component)?;
    let contour = walk_clockwise(&component.adjacency(), start);
    if !contour.is_closed() {
        tracing::debug!(
            %start,
            walked = contour.edge_count(),
            edges = component.edge_count(),
            "component walk ended open",
        );
    }
    Some(contour)
}

/// Order every component, keeping the component order.
#[must_use]
pub fn order_components(components: &[Component], selector: &impl StartSelector) -> Vec<Contour> {
    components
        .iter()
        .filter_map(|c| order_component(c, selector))
        .collect()
}
