use eframe::egui::Vec2;

use super::quadtree::QuadNode;
use crate::graph::Node;
use crate::util::stable_direction;

const COLLIDE_PADDING: f32 = 0.1;
pub(super) const COLLIDE_ITERATIONS: usize = 3;

/// Buffers reused across ticks so the broad phase does not allocate per frame.
#[derive(Default)]
pub(super) struct CollideScratch {
    predicted: Vec<Vec2>,
    radii: Vec<f32>,
}

/// Pushes overlapping circles apart through their velocities. Overlap is
/// judged on predicted positions (`pos + vel`); the smaller node takes the
/// larger share of the correction.
pub(super) fn resolve_collisions(
    nodes: &mut [Node],
    iterations: usize,
    scratch: &mut CollideScratch,
) {
    if nodes.len() < 2 {
        return;
    }

    for _ in 0..iterations {
        scratch.predicted.clear();
        scratch.radii.clear();
        let mut max_radius = 0.0_f32;
        for node in nodes.iter() {
            let radius = node.radius() + COLLIDE_PADDING;
            max_radius = max_radius.max(radius);
            scratch.predicted.push(node.pos + node.vel);
            scratch.radii.push(radius);
        }

        let Some(tree) = QuadNode::build(&scratch.predicted) else {
            return;
        };

        let reach = max_radius * 2.0;
        let predicted = &scratch.predicted;
        let radii = &scratch.radii;
        tree.for_each_near_pair(reach * reach, &mut |a, b| {
            separate_pair(nodes, predicted, radii, a, b);
        });
    }
}

fn separate_pair(nodes: &mut [Node], predicted: &[Vec2], radii: &[f32], a: usize, b: usize) {
    let reach = radii[a] + radii[b];
    let mut delta = predicted[a] - predicted[b];
    let mut distance_sq = delta.length_sq();
    if distance_sq >= reach * reach {
        return;
    }

    if distance_sq <= 1e-12 {
        delta = stable_direction(&nodes[a].id, b) * 1e-3;
        distance_sq = delta.length_sq();
    }

    let distance = distance_sq.sqrt();
    let correction = delta * ((reach - distance) / distance);

    let (area_a, area_b) = (radii[a] * radii[a], radii[b] * radii[b]);
    let share = area_b / (area_a + area_b);
    nodes[a].vel += correction * share;
    nodes[b].vel -= correction * (1.0 - share);
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::graph::ScanGraph;

    fn overlapping_pair(ids: &[&str], gap: f32) -> ScanGraph {
        let mut graph = ScanGraph::new();
        for id in ids {
            graph.apply_scan(id, Vec2::ZERO);
        }
        if let Some(node) = graph.node_mut(1) {
            node.pos = vec2(gap, 0.0);
        }
        graph
    }

    #[test]
    fn overlapping_nodes_are_pushed_apart() {
        let mut graph = overlapping_pair(&["a", "b"], 2.0);
        let (nodes, _) = graph.physics_parts_mut();
        resolve_collisions(nodes, COLLIDE_ITERATIONS, &mut CollideScratch::default());

        assert!(nodes[0].vel.x < 0.0);
        assert!(nodes[1].vel.x > 0.0);
        let predicted_gap = (nodes[1].pos + nodes[1].vel) - (nodes[0].pos + nodes[0].vel);
        let reach = nodes[0].radius() + nodes[1].radius() + 2.0 * COLLIDE_PADDING;
        assert!(predicted_gap.length() >= reach - 1e-3);
    }

    #[test]
    fn smaller_node_moves_further() {
        let mut graph = overlapping_pair(&["big", "small", "big", "big", "big", "big"], 5.0);
        let (nodes, _) = graph.physics_parts_mut();
        resolve_collisions(nodes, 1, &mut CollideScratch::default());

        assert!(nodes[0].radius() > nodes[1].radius());
        assert!(nodes[1].vel.length() > nodes[0].vel.length());
    }

    #[test]
    fn coincident_nodes_separate_without_nan() {
        let mut graph = overlapping_pair(&["a", "b"], 0.0);
        let (nodes, _) = graph.physics_parts_mut();
        resolve_collisions(nodes, COLLIDE_ITERATIONS, &mut CollideScratch::default());

        for node in nodes.iter() {
            assert!(node.vel.x.is_finite() && node.vel.y.is_finite());
        }
        assert!((nodes[0].vel - nodes[1].vel).length() > 1.0);
    }

    #[test]
    fn distant_nodes_are_untouched() {
        let mut graph = overlapping_pair(&["a", "b"], 500.0);
        let (nodes, _) = graph.physics_parts_mut();
        resolve_collisions(nodes, COLLIDE_ITERATIONS, &mut CollideScratch::default());

        assert_eq!(nodes[0].vel, Vec2::ZERO);
        assert_eq!(nodes[1].vel, Vec2::ZERO);
    }
}
