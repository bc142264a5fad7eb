//! Connected-component partitioning of the segment graph.
//!
//! Each component is one candidate outline. Components are found with a
//! union-find over the graph's edges, then reported sorted by their
//! smallest point so the output order does not depend on input order.

use std::collections::{BTreeMap, HashMap};

use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::ingest::Graph;
use crate::types::{Point, Segment};

/// A maximal connected subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Nodes, sorted.
    nodes: Vec<Point>,
    /// Edges in ingestion order, as first stored.
    edges: Vec<Segment>,
}

impl Component {
    /// Nodes of the component, sorted lexicographically.
    #[must_use]
    pub fn nodes(&self) -> &[Point] {
        &self.nodes
    }

    /// Edges of the component in ingestion order.
    #[must_use]
    pub fn edges(&self) -> &[Segment] {
        &self.edges
    }

    /// Number of nodes.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The lexicographically smallest node.
    #[must_use]
    pub fn lowest_point(&self) -> Option<Point> {
        self.nodes.first().copied()
    }

    /// Returns `true` if `point` is a node of this component.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.nodes.binary_search(&point).is_ok()
    }

    /// Neighbour lists for every node, each list sorted.
    #[must_use]
    pub fn adjacency(&self) -> BTreeMap<Point, Vec<Point>> {
        let mut adjacency: BTreeMap<Point, Vec<Point>> = BTreeMap::new();
        for segment in &self.edges {
            adjacency.entry(segment.a).or_default().push(segment.b);
            adjacency.entry(segment.b).or_default().push(segment.a);
        }
        for neighbors in adjacency.values_mut() {
            neighbors.sort_unstable();
        }
        adjacency
    }
}

/// Split a graph into its connected components.
///
/// Every node lands in exactly one component. An empty graph yields no
/// components.
#[must_use]
pub fn partition(graph: &Graph) -> Vec<Component> {
    let inner = graph.inner();
    let mut sets = UnionFind::<usize>::new(inner.node_count());
    for edge in inner.edge_references() {
        sets.union(edge.source().index(), edge.target().index());
    }

    let mut groups: HashMap<usize, Component> = HashMap::new();
    for node in inner.node_indices() {
        groups
            .entry(sets.find(node.index()))
            .or_insert_with(empty_component)
            .nodes
            .push(inner[node]);
    }
    for edge in inner.edge_references() {
        groups
            .entry(sets.find(edge.source().index()))
            .or_insert_with(empty_component)
            .edges
            .push(*edge.weight());
    }

    let mut components: Vec<Component> = groups
        .into_values()
        .map(|mut c| {
            c.nodes.sort_unstable();
            c
        })
        .collect();
    components.sort_unstable_by_key(Component::lowest_point);

    tracing::debug!(components = components.len(), "graph partitioned");
    components
}

const fn empty_component() -> Component {
    Component {
        nodes: Vec::new(),
        edges: Vec::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ingest::ingest;

    fn p(x: i32, y: i32) -> Point {
        Point::from_int(x, y)
    }

    fn seg(a: (i32, i32), b: (i32, i32)) -> Segment {
        Segment::new(p(a.0, a.1), p(b.0, b.1))
    }

    fn square(x: i32, y: i32, size: i32) -> Vec<Segment> {
        vec![
            seg((x, y), (x + size, y)),
            seg((x + size, y), (x + size, y + size)),
            seg((x + size, y + size), (x, y + size)),
            seg((x, y + size), (x, y)),
        ]
    }

    #[test]
    fn empty_graph_has_no_components() {
        let graph = ingest(&[]).unwrap();
        assert!(partition(&graph).is_empty());
    }

    #[test]
    fn single_pentagon_is_one_component() {
        let graph = ingest(&[
            seg((15, 5), (10, 0)),
            seg((0, 0), (10, 0)),
            seg((15, 5), (10, 10)),
            seg((0, 0), (0, 10)),
            seg((10, 10), (0, 10)),
        ])
        .unwrap();
        let components = partition(&graph);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].node_count(), 5);
        assert_eq!(components[0].edge_count(), 5);
    }

    #[test]
    fn disjoint_squares_are_separate_and_sorted() {
        let mut segments = square(100, 100, 5);
        segments.extend(square(0, 0, 10));
        let graph = ingest(&segments).unwrap();
        let components = partition(&graph);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].lowest_point(), Some(p(0, 0)));
        assert_eq!(components[1].lowest_point(), Some(p(100, 100)));
        assert!(components[0].contains(p(10, 10)));
        assert!(!components[0].contains(p(105, 105)));
    }

    #[test]
    fn component_keeps_ingestion_order_of_edges() {
        let graph = ingest(&[seg((5, 0), (0, 0)), seg((0, 0), (0, 5))]).unwrap();
        let components = partition(&graph);
        assert_eq!(
            components[0].edges(),
            &[seg((5, 0), (0, 0)), seg((0, 0), (0, 5))]
        );
    }

    #[test]
    fn adjacency_is_symmetric_and_sorted() {
        let graph = ingest(&square(0, 0, 1)).unwrap();
        let adjacency = partition(&graph)[0].adjacency();
        assert_eq!(adjacency[&p(0, 0)], vec![p(0, 1), p(1, 0)]);
        for (node, neighbors) in &adjacency {
            for n in neighbors {
                assert!(adjacency[n].contains(node));
            }
        }
    }

    #[test]
    fn partition_ignores_input_order() {
        let mut segments = square(0, 0, 10);
        segments.extend(square(20, 0, 3));
        let forward = partition(&ingest(&segments).unwrap());
        segments.reverse();
        let backward = partition(&ingest(&segments).unwrap());
        let nodes = |cs: &[Component]| cs.iter().map(|c| c.nodes().to_vec()).collect::<Vec<_>>();
        assert_eq!(nodes(&forward), nodes(&backward));
    }
}
