//! Segment ingestion: build an undirected graph from loose segments.
//!
//! Nodes are segment endpoints, edges are segments deduplicated by their
//! unordered endpoint pair. The first occurrence of an edge keeps its
//! stored direction; later occurrences in either direction are dropped.
//! Ingestion validates every input and stops at the first bad one, so
//! the caller learns exactly which entry to fix.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};

use crate::polyline::Polyline;
use crate::types::{EdgeKey, GeometryError, Point, RawPoint, RawSegment, Segment};

/// Undirected simple graph of ingested segments.
///
/// Every node has at least one incident edge: nodes are only created as
/// segment endpoints.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    inner: UnGraph<Point, Segment>,
    nodes: HashMap<Point, NodeIndex>,
    keys: HashSet<EdgeKey>,
    duplicates: usize,
}

impl Graph {
    /// Insert a non-degenerate segment. Returns `false` if an equal edge
    /// (in either direction) is already present.
    fn insert(&mut self, segment: Segment) -> bool {
        debug_assert!(!segment.is_degenerate(), "degenerate segment reached graph");
        if !self.keys.insert(segment.key()) {
            self.duplicates += 1;
            return false;
        }
        let a = self.node_for(segment.a);
        let b = self.node_for(segment.b);
        self.inner.add_edge(a, b, segment);
        true
    }

    fn node_for(&mut self, point: Point) -> NodeIndex {
        *self
            .nodes
            .entry(point)
            .or_insert_with(|| self.inner.add_node(point))
    }

    /// Insert every segment of an open polyline.
    pub(crate) fn insert_chain(&mut self, polyline: &Polyline) {
        for segment in polyline.segments() {
            self.insert(segment);
        }
    }

    /// Number of distinct endpoints.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Number of input segments dropped as duplicates.
    #[must_use]
    pub const fn duplicate_count(&self) -> usize {
        self.duplicates
    }

    /// Returns `true` if nothing was ingested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// All nodes, in order of first appearance.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.inner.node_weights().copied()
    }

    /// All edges as first stored, in ingestion order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.inner.edge_weights()
    }

    /// The direction-free edge set, sorted.
    #[must_use]
    pub fn edge_keys(&self) -> BTreeSet<EdgeKey> {
        self.keys.iter().copied().collect()
    }

    /// Returns `true` if `a` and `b` are joined by an edge.
    #[must_use]
    pub fn contains_edge(&self, a: Point, b: Point) -> bool {
        self.keys.contains(&EdgeKey::new(a, b))
    }

    /// Points adjacent to `point`, sorted. Empty for unknown points.
    #[must_use]
    pub fn neighbors(&self, point: Point) -> Vec<Point> {
        let mut out: Vec<Point> = self
            .nodes
            .get(&point)
            .map(|&n| self.inner.neighbors(n).map(|m| self.inner[m]).collect())
            .unwrap_or_default();
        out.sort_unstable();
        out
    }

    pub(crate) const fn inner(&self) -> &UnGraph<Point, Segment> {
        &self.inner
    }
}

/// Build a graph from typed segments.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateSegment`] for the first segment
/// whose endpoints are equal.
pub fn ingest(segments: &[Segment]) -> Result<Graph, GeometryError> {
    let mut graph = Graph::default();
    for (index, segment) in segments.iter().enumerate() {
        add_checked(&mut graph, index, *segment)?;
    }
    log_ingested(&graph);
    Ok(graph)
}

/// Validate untyped segments and build a graph from them.
///
/// # Errors
///
/// Returns [`GeometryError::MalformedSegment`] for the first entry that
/// is not two points of two usable coordinates, or
/// [`GeometryError::DegenerateSegment`] for the first zero-length one,
/// whichever comes first in input order.
pub fn ingest_raw(segments: &[RawSegment]) -> Result<Graph, GeometryError> {
    let mut graph = Graph::default();
    for (index, raw) in segments.iter().enumerate() {
        let segment = parse_segment(raw)
            .map_err(|reason| GeometryError::MalformedSegment { index, reason })?;
        add_checked(&mut graph, index, segment)?;
    }
    log_ingested(&graph);
    Ok(graph)
}

fn add_checked(graph: &mut Graph, index: usize, segment: Segment) -> Result<(), GeometryError> {
    if segment.is_degenerate() {
        return Err(GeometryError::DegenerateSegment {
            index,
            point: segment.a,
        });
    }
    if !graph.insert(segment) {
        tracing::trace!(index, a = %segment.a, b = %segment.b, "duplicate segment dropped");
    }
    Ok(())
}

fn log_ingested(graph: &Graph) {
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        duplicates = graph.duplicate_count(),
        "segments ingested",
    );
}

/// Validate one untyped segment.
///
/// # Errors
///
/// Returns a human-readable reason when the segment does not hold
/// exactly two valid points.
pub fn parse_segment(raw: &RawSegment) -> Result<Segment, String> {
    match raw.as_slice() {
        [a, b] => Ok(Segment::new(parse_point(a)?, parse_point(b)?)),
        other => Err(format!("expected 2 points, found {}", other.len())),
    }
}

/// Validate one untyped point.
///
/// # Errors
///
/// Returns a human-readable reason when the point does not hold exactly
/// two usable coordinates.
pub fn parse_point(raw: &RawPoint) -> Result<Point, String> {
    match raw.as_slice() {
        [x, y] => {
            let x = x.to_coord().map_err(|e| format!("x: {e}"))?;
            let y = y.to_coord().map_err(|e| format!("y: {e}"))?;
            Ok(Point::new(x, y))
        }
        other => Err(format!("expected 2 coordinates, found {}", other.len())),
    }
}
