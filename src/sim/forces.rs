use eframe::egui::{Vec2, vec2};

use crate::graph::{Link, Node};
use crate::util::stable_direction;

const GRAVITY: f32 = 1.0;
const ORBIT_BASE: f32 = 0.05;
const RADIAL_STRENGTH: f32 = 0.01;
const ORBIT_GAP: f32 = 20.0;
pub(super) const LINK_STRENGTH: f32 = 0.05;
pub(super) const MAX_VELOCITY: f32 = 2.0;
const DAMPING_FACTOR: f32 = 0.9;

fn is_finite(value: Vec2) -> bool {
    value.x.is_finite() && value.y.is_finite()
}

/// Resets non-finite positions to `home` and non-finite velocities to zero.
/// Returns how many nodes needed repair.
pub(super) fn sanitize(nodes: &mut [Node], home: Vec2) -> usize {
    let home = if is_finite(home) { home } else { Vec2::ZERO };
    let mut repaired = 0;
    for node in nodes.iter_mut() {
        let mut touched = false;
        if !is_finite(node.pos) {
            node.pos = home;
            touched = true;
        }
        if !is_finite(node.vel) {
            node.vel = Vec2::ZERO;
            touched = true;
        }
        if node.pin.is_some_and(|pin| !is_finite(pin)) {
            node.pin = Some(node.pos);
            touched = true;
        }
        repaired += usize::from(touched);
    }
    repaired
}

/// Pairwise attraction `G·m_a·m_b / d²`, with `d` floored at the combined
/// radius. A non-zero `charge` adds an inverse-square many-body term
/// (negative values repel).
pub(super) fn apply_gravity(nodes: &mut [Node], alpha: f32, charge: f32) {
    let count = nodes.len();
    for i in 0..count {
        for j in (i + 1)..count {
            let delta = nodes[j].pos - nodes[i].pos;
            let (mass_a, mass_b) = (nodes[i].mass(), nodes[j].mass());
            let min_distance = nodes[i].radius() + nodes[j].radius();
            let distance = delta.length().max(min_distance);
            if distance <= 0.0 {
                continue;
            }

            let direction = delta / distance;
            let distance_sq = distance * distance;
            let force = (GRAVITY * mass_a * mass_b) / distance_sq;
            nodes[i].vel += direction * (force / mass_a) * alpha;
            nodes[j].vel -= direction * (force / mass_b) * alpha;

            if charge != 0.0 {
                let push = delta * (charge * alpha / distance_sq);
                nodes[i].vel += push;
                nodes[j].vel -= push;
            }
        }
    }
}

/// Tangential nudge of each satellite around its hub plus a weak radial
/// spring toward `hub.r + sat.r + ORBIT_GAP`.
pub(super) fn apply_orbit(nodes: &mut [Node], links: &[Link], alpha: f32) {
    for link in links {
        let (hub, sat) = if nodes[link.source].mass() > nodes[link.target].mass() {
            (link.source, link.target)
        } else {
            (link.target, link.source)
        };

        let delta = nodes[sat].pos - nodes[hub].pos;
        let mut distance = delta.length();
        if distance <= f32::EPSILON {
            distance = 1.0;
        }

        let hub_mass = nodes[hub].mass();
        let relative = (hub_mass - nodes[sat].mass()) / hub_mass;
        let tangent = vec2(-delta.y, delta.x) / distance;
        nodes[sat].vel += tangent * (ORBIT_BASE * relative * alpha);

        let desired = nodes[hub].radius() + nodes[sat].radius() + ORBIT_GAP;
        let stretch = distance - desired;
        nodes[sat].vel -= (delta / distance) * (stretch * RADIAL_STRENGTH * alpha);
    }
}

/// Spring toward `distance` between linked nodes, split by degree so that
/// well-connected nodes move less.
pub(super) fn apply_link_springs(
    nodes: &mut [Node],
    links: &[Link],
    degrees: &[u32],
    distance: f32,
    strength: f32,
    alpha: f32,
) {
    for link in links {
        let (source, target) = (link.source, link.target);
        let mut delta =
            (nodes[target].pos + nodes[target].vel) - (nodes[source].pos + nodes[source].vel);
        if delta.length_sq() <= 1e-12 {
            delta = stable_direction(&nodes[target].id, source) * 1e-6;
        }

        let length = delta.length();
        let correction = delta * ((length - distance) / length * alpha * strength);

        let source_degree = degrees.get(source).copied().unwrap_or(1) as f32;
        let target_degree = degrees.get(target).copied().unwrap_or(1) as f32;
        let bias = source_degree / (source_degree + target_degree).max(1.0);

        nodes[target].vel -= correction * bias;
        nodes[source].vel += correction * (1.0 - bias);
    }
}

fn clamp_components(velocity: Vec2) -> Vec2 {
    vec2(
        velocity.x.clamp(-MAX_VELOCITY, MAX_VELOCITY),
        velocity.y.clamp(-MAX_VELOCITY, MAX_VELOCITY),
    )
}

/// Damps and clamps velocities, then advances positions. Pinned nodes jump to
/// their pin and carry the pin's motion as velocity.
pub(super) fn integrate(nodes: &mut [Node], velocity_decay: f32) {
    let retain = (1.0 - velocity_decay).clamp(0.0, 1.0) * DAMPING_FACTOR;
    for node in nodes.iter_mut() {
        if let Some(pin) = node.pin {
            node.vel = clamp_components(pin - node.pos);
            node.pos = pin;
            continue;
        }

        node.vel = clamp_components(node.vel * retain);
        node.pos += node.vel;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ScanGraph;

    fn graph_with(ids: &[&str], positions: &[Vec2]) -> ScanGraph {
        let mut graph = ScanGraph::new();
        for id in ids {
            graph.apply_scan(id, Vec2::ZERO);
        }
        for (index, position) in positions.iter().enumerate() {
            if let Some(node) = graph.node_mut(index) {
                node.pos = *position;
            }
        }
        graph
    }

    #[test]
    fn gravity_pulls_pairs_together_with_equal_momentum() {
        let mut graph = graph_with(&["a", "a", "a", "b"], &[vec2(-100.0, 0.0), vec2(100.0, 0.0)]);
        let (nodes, _) = graph.physics_parts_mut();
        apply_gravity(nodes, 1.0, 0.0);

        assert!(nodes[0].vel.x > 0.0);
        assert!(nodes[1].vel.x < 0.0);
        let momentum = nodes[0].vel * nodes[0].mass() + nodes[1].vel * nodes[1].mass();
        assert!(momentum.length() < 1e-2, "{momentum:?}");
    }

    #[test]
    fn coincident_nodes_do_not_produce_nan() {
        let mut graph = graph_with(&["a", "b"], &[vec2(5.0, 5.0), vec2(5.0, 5.0)]);
        let (nodes, links) = graph.physics_parts_mut();
        apply_gravity(nodes, 1.0, -30.0);
        apply_orbit(nodes, links, 1.0);
        apply_link_springs(nodes, links, &[1, 1], 300.0, LINK_STRENGTH, 1.0);

        for node in nodes.iter() {
            assert!(node.vel.x.is_finite() && node.vel.y.is_finite());
        }
    }

    #[test]
    fn negative_charge_pushes_apart() {
        let mut graph = graph_with(&["a", "b"], &[vec2(0.0, 0.0), vec2(50.0, 0.0)]);
        let (nodes, _) = graph.physics_parts_mut();
        apply_gravity(nodes, 1.0, -5_000.0);

        assert!(nodes[0].vel.x < 0.0);
        assert!(nodes[1].vel.x > 0.0);
    }

    #[test]
    fn orbit_spins_satellite_around_heavier_hub() {
        let mut graph = graph_with(&["hub", "hub", "hub", "hub", "sat"], &[
            Vec2::ZERO,
            vec2(100.0, 0.0),
        ]);
        let (nodes, links) = graph.physics_parts_mut();
        assert_eq!(links.len(), 1);
        apply_orbit(nodes, links, 1.0);

        assert_eq!(nodes[0].vel, Vec2::ZERO, "hub is not moved by the orbit force");
        assert!(nodes[1].vel.y > 0.0, "tangential push");
        assert!(nodes[1].vel.x < 0.0, "radial spring pulls toward the hub");
    }

    #[test]
    fn link_spring_contracts_long_links() {
        let mut graph = graph_with(&["a", "b"], &[vec2(0.0, 0.0), vec2(900.0, 0.0)]);
        let degrees = graph.degrees();
        let (nodes, links) = graph.physics_parts_mut();
        apply_link_springs(nodes, links, &degrees, 300.0, LINK_STRENGTH, 1.0);

        assert!(nodes[0].vel.x > 0.0);
        assert!(nodes[1].vel.x < 0.0);
    }

    #[test]
    fn integrate_clamps_and_moves() {
        let mut graph = graph_with(&["a", "b"], &[Vec2::ZERO, vec2(10.0, 10.0)]);
        let (nodes, _) = graph.physics_parts_mut();
        nodes[0].vel = vec2(50.0, -50.0);
        nodes[1].vel = vec2(1.0, 0.0);
        integrate(nodes, 0.1);

        assert_eq!(nodes[0].vel, vec2(MAX_VELOCITY, -MAX_VELOCITY));
        assert_eq!(nodes[0].pos, vec2(MAX_VELOCITY, -MAX_VELOCITY));
        assert!((nodes[1].vel.x - 0.81).abs() < 1e-6);
        assert!((nodes[1].pos.x - 10.81).abs() < 1e-5);
    }

    #[test]
    fn integrate_follows_pin_and_keeps_motion() {
        let mut graph = graph_with(&["a"], &[vec2(0.0, 0.0)]);
        let (nodes, _) = graph.physics_parts_mut();
        nodes[0].pin = Some(vec2(1.5, -1.0));
        integrate(nodes, 0.1);

        assert_eq!(nodes[0].pos, vec2(1.5, -1.0));
        assert_eq!(nodes[0].vel, vec2(1.5, -1.0));
    }

    #[test]
    fn sanitize_repairs_non_finite_state() {
        let mut graph = graph_with(&["a", "b"], &[vec2(f32::NAN, 1.0), vec2(3.0, 4.0)]);
        let (nodes, _) = graph.physics_parts_mut();
        nodes[1].vel = vec2(f32::INFINITY, 0.0);

        let repaired = sanitize(nodes, vec2(7.0, 8.0));
        assert_eq!(repaired, 2);
        assert_eq!(nodes[0].pos, vec2(7.0, 8.0));
        assert_eq!(nodes[1].pos, vec2(3.0, 4.0));
        assert_eq!(nodes[1].vel, Vec2::ZERO);
    }
}
