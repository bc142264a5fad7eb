#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::{BTreeSet, HashSet};

use pricut_geometry::contour::order_components;
use pricut_geometry::{
    EdgeKey, Point, Segment, StartRule, Winding, extract_contours, ingest, partition,
};
use proptest::prelude::*;

fn grid_point() -> impl Strategy<Value = Point> {
    (0..8_i32, 0..8_i32).prop_map(|(x, y)| Point::from_int(x, y))
}

fn segments() -> impl Strategy<Value = Vec<Segment>> {
    prop::collection::vec(
        (grid_point(), grid_point())
            .prop_filter("non-degenerate", |(a, b)| a != b)
            .prop_map(|(a, b)| Segment::new(a, b)),
        0..40,
    )
}

/// Axis-aligned rectangle outline with each side split at extra
/// collinear points, in scrambled order and direction.
fn split_rectangle() -> impl Strategy<Value = (Vec<Segment>, usize)> {
    (0..20_i32, 0..20_i32, 2..15_i32, 2..15_i32)
        .prop_flat_map(|(x, y, w, h)| {
            let cuts = (
                prop::collection::vec(1..w, 0..3),
                prop::collection::vec(1..h, 0..3),
            );
            (Just((x, y, w, h)), cuts)
        })
        .prop_flat_map(|((x, y, w, h), (xs, ys))| {
            let xs: BTreeSet<i32> = xs.into_iter().collect();
            let ys: BTreeSet<i32> = ys.into_iter().collect();
            let mut ring = vec![Point::from_int(x, y)];
            ring.extend(ys.iter().map(|&d| Point::from_int(x, y + d)));
            ring.push(Point::from_int(x, y + h));
            ring.extend(xs.iter().map(|&d| Point::from_int(x + d, y + h)));
            ring.push(Point::from_int(x + w, y + h));
            ring.extend(ys.iter().rev().map(|&d| Point::from_int(x + w, y + d)));
            ring.push(Point::from_int(x + w, y));
            ring.extend(xs.iter().rev().map(|&d| Point::from_int(x + d, y)));
            let n = ring.len();
            let segs: Vec<Segment> = (0..n)
                .map(|i| Segment::new(ring[i], ring[(i + 1) % n]))
                .collect();
            (
                Just(segs).prop_shuffle(),
                prop::collection::vec(any::<bool>(), n),
                Just(n),
            )
        })
        .prop_map(|(segs, flips, n)| {
            let segs = segs
                .into_iter()
                .zip(flips)
                .map(|(s, flip)| if flip { s.reversed() } else { s })
                .collect();
            (segs, n)
        })
}

proptest! {
    #[test]
    fn dedup_is_idempotent(segs in segments()) {
        let once = ingest(&segs).unwrap();
        let mut doubled = segs.clone();
        doubled.extend(segs.iter().copied());
        let twice = ingest(&doubled).unwrap();
        prop_assert_eq!(once.edge_keys(), twice.edge_keys());
        prop_assert_eq!(once.node_count(), twice.node_count());
    }

    #[test]
    fn direction_does_not_matter(segs in segments()) {
        let reversed: Vec<Segment> = segs.iter().map(|s| s.reversed()).collect();
        prop_assert_eq!(
            ingest(&segs).unwrap().edge_keys(),
            ingest(&reversed).unwrap().edge_keys()
        );
    }

    #[test]
    fn partition_is_complete_and_disjoint(segs in segments()) {
        let graph = ingest(&segs).unwrap();
        let components = partition(&graph);

        let mut seen_nodes: HashSet<Point> = HashSet::new();
        let mut seen_edges: BTreeSet<EdgeKey> = BTreeSet::new();
        for component in &components {
            prop_assert!(component.node_count() > 0);
            for &node in component.nodes() {
                prop_assert!(seen_nodes.insert(node), "node {} in two components", node);
            }
            for edge in component.edges() {
                prop_assert!(component.contains(edge.a) && component.contains(edge.b));
                prop_assert!(seen_edges.insert(edge.key()));
            }
        }
        let all_nodes: HashSet<Point> = graph.points().collect();
        prop_assert_eq!(seen_nodes, all_nodes);
        prop_assert_eq!(seen_edges, graph.edge_keys());
    }

    #[test]
    fn walks_use_each_edge_at_most_once(segs in segments()) {
        let components = partition(&ingest(&segs).unwrap());
        let contours = order_components(&components, &StartRule::LowestPoint);
        prop_assert_eq!(contours.len(), components.len());
        for (contour, component) in contours.iter().zip(&components) {
            let keys = contour.edge_keys();
            let unique: HashSet<EdgeKey> = keys.iter().copied().collect();
            prop_assert_eq!(keys.len(), unique.len());
            let allowed: HashSet<EdgeKey> = component.edges().iter().map(Segment::key).collect();
            prop_assert!(unique.is_subset(&allowed));
            if contour.is_closed() {
                prop_assert_eq!(contour.points().first(), contour.points().last());
            }
        }
    }

    #[test]
    fn ordering_ignores_input_order(segs in segments().prop_flat_map(|s| {
        let shuffled = Just(s.clone()).prop_shuffle();
        (Just(s), shuffled)
    })) {
        let (original, shuffled) = segs;
        let a = extract_contours(&original, StartRule::LowestPoint).unwrap();
        let b = extract_contours(&shuffled, StartRule::LowestPoint).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn simple_outline_closes_clockwise((segs, n) in split_rectangle()) {
        let contours = extract_contours(&segs, StartRule::LowestPoint).unwrap();
        prop_assert_eq!(contours.len(), 1);
        let contour = &contours[0];
        prop_assert!(contour.is_closed());
        prop_assert_eq!(contour.edge_count(), n);
        prop_assert_eq!(contour.winding(), Winding::Clockwise);

        let walked: BTreeSet<EdgeKey> = contour.edge_keys().into_iter().collect();
        let input: BTreeSet<EdgeKey> = segs.iter().map(Segment::key).collect();
        prop_assert_eq!(walked, input);
    }
}
