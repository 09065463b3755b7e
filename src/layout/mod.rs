//! Layout helpers
//!
//! Deterministic one-shot arrangements for a set of nodes, typically the
//! current selection. All helpers sort the set by alias so the same nodes
//! always land in the same order, and reposition through the container so the
//! usual persistence and edge recomputation apply. An empty id slice targets
//! every node.

use crate::graph::GraphView;
use crate::value_objects::{NodeId, Vector};

fn targets(graph: &GraphView, ids: &[NodeId]) -> Vec<NodeId> {
    let mut ids: Vec<NodeId> = if ids.is_empty() {
        graph.node_ids()
    } else {
        ids.iter()
            .filter(|id| graph.node(id).is_some())
            .cloned()
            .collect()
    };
    ids.sort_by(|a, b| {
        let a = graph.node(a).map(|n| n.alias().to_string()).unwrap_or_default();
        let b = graph.node(b).map(|n| n.alias().to_string()).unwrap_or_default();
        a.cmp(&b)
    });
    ids
}

fn centroid(graph: &GraphView, ids: &[NodeId]) -> Vector {
    let sum = ids
        .iter()
        .filter_map(|id| graph.node(id))
        .fold(Vector::origin(), |acc, node| acc.plus(node.position()));
    sum.scaled(1.0 / ids.len() as f64)
}

/// Arrange nodes on a square-ish grid centered on their centroid.
pub fn grid_nodes(graph: &mut GraphView, ids: &[NodeId]) {
    let ids = targets(graph, ids);
    if ids.is_empty() {
        return;
    }
    let step = graph.config().layout_step;
    let center = centroid(graph, &ids);
    let columns = (ids.len() as f64).sqrt().ceil() as usize;
    let rows = ids.len().div_ceil(columns);

    let offset = center.minus(
        Vector::new((columns - 1) as f64, (rows - 1) as f64).scaled(step / 2.0),
    );
    for (index, id) in ids.iter().enumerate() {
        let cell = Vector::new((index % columns) as f64, (index / columns) as f64);
        graph.move_node(id, offset.plus(cell.scaled(step)));
    }
}

/// Arrange nodes evenly on a circle around their centroid. The radius grows
/// with the node count so neighbors stay one step apart; the first node sits
/// at twelve o'clock and the rest follow clockwise.
pub fn circle_nodes(graph: &mut GraphView, ids: &[NodeId]) {
    let ids = targets(graph, ids);
    if ids.is_empty() {
        return;
    }
    let step = graph.config().layout_step;
    let center = centroid(graph, &ids);
    let radius = ids.len() as f64 * step / (2.0 * std::f64::consts::PI);
    let angle_step = 2.0 * std::f64::consts::PI / ids.len() as f64;

    for (index, id) in ids.iter().enumerate() {
        let angle = index as f64 * angle_step - std::f64::consts::FRAC_PI_2;
        graph.move_node(id, center.plus(Vector::polar(angle, radius)));
    }
}

/// Line nodes up from the one closest to the origin. The line is vertical
/// unless some node already sits more than a pixel below the anchor, in which
/// case it runs horizontally.
pub fn lineup_nodes(graph: &mut GraphView, ids: &[NodeId]) {
    let ids = targets(graph, ids);
    if ids.is_empty() {
        return;
    }
    let step = graph.config().layout_step;

    let mut anchor = graph.node(&ids[0]).unwrap().position();
    let mut vertical = true;
    for id in &ids {
        let position = graph.node(id).unwrap().position();
        if position.norm_squared() < anchor.norm_squared() {
            anchor = position;
        }
        if position.y - anchor.y > 1.0 {
            vertical = false;
        }
    }

    let direction = if vertical {
        Vector::new(0.0, step)
    } else {
        Vector::new(step, 0.0)
    };
    for (index, id) in ids.iter().enumerate() {
        graph.move_node(id, anchor.plus(direction.scaled(index as f64)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphConfig, GraphView};
    use crate::scene::MemoryScene;
    use crate::state::{MemoryBackend, StateStore};

    fn graph_with(nodes: &[(&str, f64, f64)]) -> GraphView {
        let scene = MemoryScene::new().into_handle();
        let scheduler = crate::scheduler::Scheduler::new();
        let store = StateStore::restore("layout", Box::new(MemoryBackend::new()));
        let mut graph = GraphView::new(
            store,
            scene,
            scheduler,
            GraphConfig {
                rng_seed: Some(3),
                ..GraphConfig::default()
            },
        );
        for (id, x, y) in nodes {
            graph.get_or_create_node(&NodeId::from(*id), None);
            graph.move_node(&NodeId::from(*id), Vector::new(*x, *y));
        }
        graph
    }

    fn position(graph: &GraphView, id: &str) -> Vector {
        graph.node(&NodeId::from(id)).unwrap().position()
    }

    #[test]
    fn test_grid_fills_rows_in_alias_order() {
        let mut graph = graph_with(&[
            ("c", 100.0, 100.0),
            ("a", 140.0, 100.0),
            ("b", 120.0, 140.0),
            ("d", 120.0, 60.0),
        ]);
        grid_nodes(&mut graph, &[]);

        // 4 nodes -> 2x2 grid around the centroid (120, 100)
        assert_eq!(position(&graph, "a"), Vector::new(80.0, 60.0));
        assert_eq!(position(&graph, "b"), Vector::new(160.0, 60.0));
        assert_eq!(position(&graph, "c"), Vector::new(80.0, 140.0));
        assert_eq!(position(&graph, "d"), Vector::new(160.0, 140.0));
    }

    #[test]
    fn test_circle_starts_at_twelve_oclock() {
        let mut graph = graph_with(&[
            ("a", 0.0, 0.0),
            ("b", 200.0, 0.0),
            ("c", 200.0, 200.0),
            ("d", 0.0, 200.0),
        ]);
        circle_nodes(&mut graph, &[]);

        let radius = 4.0 * 80.0 / (2.0 * std::f64::consts::PI);
        let a = position(&graph, "a");
        assert!((a.x - 100.0).abs() < 1e-9);
        assert!((a.y - (100.0 - radius)).abs() < 1e-9);

        // clockwise: second node is due east of the centroid
        let b = position(&graph, "b");
        assert!((b.x - (100.0 + radius)).abs() < 1e-9);
        assert!((b.y - 100.0).abs() < 1e-9);

        // equal spacing between neighbors
        let ab = a.distance_to(b);
        let bc = b.distance_to(position(&graph, "c"));
        assert!((ab - bc).abs() < 1e-9);
    }

    #[test]
    fn test_lineup_vertical_from_origin_anchor() {
        let mut graph = graph_with(&[
            ("b", 50.0, 40.0),
            ("a", 300.0, 40.0),
        ]);
        lineup_nodes(&mut graph, &[]);

        // anchor is the node closest to the origin; same y means vertical
        assert_eq!(position(&graph, "a"), Vector::new(50.0, 40.0));
        assert_eq!(position(&graph, "b"), Vector::new(50.0, 120.0));
    }

    #[test]
    fn test_lineup_horizontal_when_spread_vertically() {
        let mut graph = graph_with(&[
            ("a", 50.0, 40.0),
            ("b", 50.0, 300.0),
        ]);
        lineup_nodes(&mut graph, &[]);

        assert_eq!(position(&graph, "a"), Vector::new(50.0, 40.0));
        assert_eq!(position(&graph, "b"), Vector::new(130.0, 40.0));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let mut first = graph_with(&[("a", 10.0, 10.0), ("b", 90.0, 10.0), ("c", 50.0, 90.0)]);
        let mut second = graph_with(&[("a", 10.0, 10.0), ("b", 90.0, 10.0), ("c", 50.0, 90.0)]);
        grid_nodes(&mut first, &[]);
        grid_nodes(&mut second, &[]);

        for id in ["a", "b", "c"] {
            assert_eq!(position(&first, id), position(&second, id));
        }
    }

    #[test]
    fn test_subset_layout_ignores_unknown_ids() {
        let mut graph = graph_with(&[("a", 10.0, 10.0), ("b", 90.0, 10.0)]);
        let before = position(&graph, "b");
        lineup_nodes(
            &mut graph,
            &[NodeId::from("a"), NodeId::from("ghost")],
        );
        assert_eq!(position(&graph, "b"), before);
    }
}
