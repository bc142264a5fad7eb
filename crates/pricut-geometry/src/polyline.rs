//! Ordered point chains from polyline-like drawing entities.
//!
//! Polylines, splines and circles arrive already ordered. A chain whose
//! last point returns to its first is a closed outline by itself and
//! skips graph ordering; an open chain is split into segments and merged
//! with the loose lines.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{Point, Segment};

/// A sequence of connected points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a polyline, dropping consecutive duplicate points.
    ///
    /// Quantization can collapse neighbouring vertices of a dense
    /// approximation onto the same thousandth; those repeats carry no
    /// geometry.
    #[must_use]
    pub fn new(mut points: Vec<Point>) -> Self {
        points.dedup();
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns its points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// The chain returns to its start through at least three distinct
    /// points.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match self.0.split_last() {
            Some((last, ring)) if ring.first() == Some(last) => {
                ring.iter().collect::<HashSet<_>>().len() >= 3
            }
            _ => false,
        }
    }

    /// Consecutive point pairs as segments.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.0.windows(2).map(|w| Segment::new(w[0], w[1]))
    }
}
