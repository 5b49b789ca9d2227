use eframe::egui::vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Node, ScanGraph};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub saved_nodes: Vec<SavedNode>,
    #[serde(default)]
    pub saved_links: Vec<SavedLink>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedNode {
    pub id: String,
    pub count: u32,
    /// Informational only; the radius is recomputed from `count` on load.
    #[serde(default)]
    pub r: f32,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedLink {
    pub source: String,
    pub target: String,
    pub weight: u32,
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

impl ScanGraph {
    pub fn snapshot(&self) -> Snapshot {
        let saved_nodes = self
            .nodes
            .iter()
            .map(|node| SavedNode {
                id: node.id.clone(),
                count: node.count,
                r: node.radius,
                x: finite_or_zero(node.pos.x),
                y: finite_or_zero(node.pos.y),
                display_name: node.display_name.clone(),
            })
            .collect();

        let saved_links = self
            .links
            .iter()
            .map(|link| SavedLink {
                source: self.nodes[link.source].id.clone(),
                target: self.nodes[link.target].id.clone(),
                weight: link.weight,
            })
            .collect();

        Snapshot {
            saved_nodes,
            saved_links,
        }
    }

    /// Rebuilds a graph from a snapshot. Duplicate node ids keep their first
    /// entry, links with unknown or identical endpoints are dropped, and
    /// repeated pairs merge their weights.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut graph = Self::new();

        for saved in snapshot.saved_nodes {
            if graph.index_by_id.contains_key(&saved.id) {
                debug!(id = %saved.id, "skipping duplicate saved node");
                continue;
            }

            let position = vec2(finite_or_zero(saved.x), finite_or_zero(saved.y));
            let mut node = Node::new(saved.id, saved.count, position);
            node.display_name = saved
                .display_name
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty());
            node.claim_milestones();
            graph.insert_node(node);
        }

        for saved in snapshot.saved_links {
            let endpoints = (graph.index_of(&saved.source), graph.index_of(&saved.target));
            let (Some(source), Some(target)) = endpoints else {
                debug!(
                    source = %saved.source,
                    target = %saved.target,
                    "dropping saved link with missing endpoint"
                );
                continue;
            };
            if source == target {
                continue;
            }
            graph.add_link_weight(source, target, saved.weight.max(1));
        }

        graph.revision = graph.revision.wrapping_add(1);
        graph
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::Vec2;

    use super::*;
    use crate::graph::Milestone;

    fn sample_graph() -> ScanGraph {
        let mut graph = ScanGraph::new();
        for id in ["A", "B", "A", "C", "B", "A"] {
            graph.apply_scan(id, Vec2::ZERO);
        }
        for (index, node) in graph.nodes.iter_mut().enumerate() {
            node.pos = vec2(index as f32 * 10.0, -(index as f32) * 3.5);
        }
        let index = graph.index_of("B").expect("node exists");
        graph.rename(index, "Bea");
        graph
    }

    #[test]
    fn round_trip_preserves_nodes_and_links() {
        let graph = sample_graph();
        let json = serde_json::to_string(&graph.snapshot()).expect("serializes");
        let restored =
            ScanGraph::from_snapshot(serde_json::from_str(&json).expect("deserializes"));

        assert_eq!(restored.node_count(), graph.node_count());
        for node in graph.nodes() {
            let other = restored.find(&node.id).expect("node restored");
            assert_eq!(other.count(), node.count());
            assert_eq!(other.pos, node.pos);
            assert_eq!(other.display_name, node.display_name);
            assert_eq!(other.radius(), node.radius());
        }

        assert_eq!(restored.link_count(), graph.link_count());
        for link in graph.links() {
            let a = &graph.nodes()[link.source].id;
            let b = &graph.nodes()[link.target].id;
            assert_eq!(
                restored.link_between(a, b).map(|link| link.weight()),
                Some(link.weight())
            );
        }
    }

    #[test]
    fn serialized_form_uses_saved_field_names() {
        let value = serde_json::to_value(sample_graph().snapshot()).expect("serializes");

        assert!(value.get("savedNodes").is_some());
        assert!(value.get("savedLinks").is_some());
        let first = &value["savedNodes"][1];
        assert_eq!(first["id"], "B");
        assert_eq!(first["displayName"], "Bea");
        assert!(first.get("r").is_some());
        assert_eq!(value["savedLinks"][0]["source"], "A");
    }

    #[test]
    fn links_to_missing_nodes_are_dropped() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{
                "savedNodes": [
                    {"id": "A", "count": 3, "r": 9.1, "x": 1.0, "y": 2.0, "displayName": null},
                    {"id": "B", "count": 1, "r": 4.0, "x": 0.0, "y": 0.0}
                ],
                "savedLinks": [
                    {"source": "A", "target": "B", "weight": 2},
                    {"source": "A", "target": "ghost", "weight": 7},
                    {"source": "B", "target": "B", "weight": 1}
                ]
            }"#,
        )
        .expect("parses");

        let graph = ScanGraph::from_snapshot(snapshot);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.link_between("A", "B").map(|link| link.weight()), Some(2));
        assert_eq!(graph.last_scanned(), None);
    }

    #[test]
    fn restore_recomputes_radius_and_marks_milestones() {
        let snapshot = Snapshot {
            saved_nodes: vec![SavedNode {
                id: "big".to_owned(),
                count: 100,
                r: 1.0,
                x: 0.0,
                y: 0.0,
                display_name: Some("   ".to_owned()),
            }],
            saved_links: Vec::new(),
        };

        let graph = ScanGraph::from_snapshot(snapshot);
        let node = graph.find("big").expect("node restored");
        assert_eq!(node.radius(), crate::graph::size_scale(100));
        assert!(node.milestone_reached(Milestone::Radius50));
        assert_eq!(node.display_name, None);
    }

    #[test]
    fn duplicate_saved_ids_keep_first_entry() {
        let node = |count| SavedNode {
            id: "A".to_owned(),
            count,
            r: 0.0,
            x: 0.0,
            y: 0.0,
            display_name: None,
        };
        let graph = ScanGraph::from_snapshot(Snapshot {
            saved_nodes: vec![node(4), node(9)],
            saved_links: Vec::new(),
        });

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.find("A").map(|node| node.count()), Some(4));
    }
}
