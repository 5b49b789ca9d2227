//! Node/link arena fed by scan events.
//!
//! Nodes live in a `Vec` and are addressed by index; indices are stable for the
//! lifetime of the graph because nodes are only ever removed all at once by
//! [`ScanGraph::reset`]. Links refer to their endpoints by index, never by
//! reference.

use std::collections::HashMap;

use eframe::egui::Vec2;

mod size;
mod snapshot;

pub use size::{link_opacity, mass_for_radius, size_scale};
pub use snapshot::{SavedLink, SavedNode, Snapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Milestone {
    Radius25,
    Radius50,
    Radius100,
    Radius200,
}

impl Milestone {
    pub const ALL: [Milestone; 4] = [
        Self::Radius25,
        Self::Radius50,
        Self::Radius100,
        Self::Radius200,
    ];

    pub fn radius(self) -> f32 {
        match self {
            Self::Radius25 => 25.0,
            Self::Radius50 => 50.0,
            Self::Radius100 => 100.0,
            Self::Radius200 => 200.0,
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Radius25 => 0,
            Self::Radius50 => 1,
            Self::Radius100 => 2,
            Self::Radius200 => 3,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: String,
    pub display_name: Option<String>,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Position override while the node is being dragged.
    pub pin: Option<Vec2>,
    count: u32,
    radius: f32,
    mass: f32,
    milestones: [bool; 4],
}

impl Node {
    fn new(id: String, count: u32, pos: Vec2) -> Self {
        let mut node = Self {
            id,
            display_name: None,
            pos,
            vel: Vec2::ZERO,
            pin: None,
            count: 0,
            radius: 0.0,
            mass: 0.0,
            milestones: [false; 4],
        };
        node.set_count(count);
        node
    }

    fn set_count(&mut self, count: u32) {
        self.count = count.max(1);
        self.radius = size_scale(self.count);
        self.mass = mass_for_radius(self.radius);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }

    pub fn milestone_reached(&self, milestone: Milestone) -> bool {
        self.milestones[milestone.slot()]
    }

    /// Marks every milestone the current radius has crossed and returns the
    /// ones that were not marked before.
    fn claim_milestones(&mut self) -> Vec<Milestone> {
        let mut crossed = Vec::new();
        for milestone in Milestone::ALL {
            let slot = milestone.slot();
            if !self.milestones[slot] && self.radius >= milestone.radius() {
                self.milestones[slot] = true;
                crossed.push(milestone);
            }
        }
        crossed
    }
}

#[derive(Clone, Debug)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    weight: u32,
    opacity: f32,
}

impl Link {
    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn other(&self, index: usize) -> Option<usize> {
        if self.source == index {
            Some(self.target)
        } else if self.target == index {
            Some(self.source)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkChange {
    Created(usize),
    Strengthened(usize),
}

#[derive(Clone, Debug)]
pub struct ScanOutcome {
    pub index: usize,
    pub created: bool,
    pub link: Option<LinkChange>,
    pub milestones: Vec<Milestone>,
}

#[derive(Clone, Debug, Default)]
pub struct ScanGraph {
    nodes: Vec<Node>,
    links: Vec<Link>,
    index_by_id: HashMap<String, usize>,
    link_by_pair: HashMap<(usize, usize), usize>,
    last_scanned: Option<usize>,
    revision: u64,
}

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

impl ScanGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        self.index_of(id).and_then(|index| self.nodes.get(index))
    }

    pub fn link_between(&self, a: &str, b: &str) -> Option<&Link> {
        let a = self.index_of(a)?;
        let b = self.index_of(b)?;
        self.link_by_pair
            .get(&pair_key(a, b))
            .and_then(|&link| self.links.get(link))
    }

    pub fn last_scanned(&self) -> Option<usize> {
        self.last_scanned
    }

    /// Bumped on every structural or label change; renderers use it to
    /// invalidate derived views.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Split borrow for the physics step: positions and velocities are mutable,
    /// topology is not.
    pub fn physics_parts_mut(&mut self) -> (&mut [Node], &[Link]) {
        (&mut self.nodes, &self.links)
    }

    /// Applies one scan event: creates or grows the node, links it to the
    /// previously scanned identifier, and records it as the last scan.
    pub fn apply_scan(&mut self, id: &str, spawn: Vec2) -> ScanOutcome {
        let (index, created) = match self.index_of(id) {
            Some(index) => {
                let node = &mut self.nodes[index];
                node.set_count(node.count.saturating_add(1));
                (index, false)
            }
            None => (self.insert_node(Node::new(id.to_owned(), 1, spawn)), true),
        };

        let milestones = self.nodes[index].claim_milestones();

        let link = match self.last_scanned {
            Some(previous) if previous != index => Some(self.connect(previous, index)),
            _ => None,
        };

        self.last_scanned = Some(index);
        self.revision = self.revision.wrapping_add(1);

        ScanOutcome {
            index,
            created,
            link,
            milestones,
        }
    }

    pub fn rename(&mut self, index: usize, name: &str) -> bool {
        let Some(node) = self.nodes.get_mut(index) else {
            return false;
        };

        let trimmed = name.trim();
        if trimmed.is_empty() {
            return false;
        }

        node.display_name = Some(trimmed.to_owned());
        self.revision = self.revision.wrapping_add(1);
        true
    }

    pub fn reset(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.index_by_id.clear();
        self.link_by_pair.clear();
        self.last_scanned = None;
        self.revision = self.revision.wrapping_add(1);
    }

    /// Number of links touching each node, indexed like [`ScanGraph::nodes`].
    pub fn degrees(&self) -> Vec<u32> {
        let mut degrees = vec![0u32; self.nodes.len()];
        for link in &self.links {
            degrees[link.source] += 1;
            degrees[link.target] += 1;
        }
        degrees
    }

    pub fn top_by_size(&self, limit: usize) -> Vec<usize> {
        let mut indices = (0..self.nodes.len()).collect::<Vec<_>>();
        indices.sort_by(|&a, &b| self.nodes[b].radius.total_cmp(&self.nodes[a].radius));
        indices.truncate(limit);
        indices
    }

    pub fn top_by_links(&self, limit: usize) -> Vec<(usize, u32)> {
        let degrees = self.degrees();
        let mut ranked = degrees.into_iter().enumerate().collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(limit);
        ranked
    }

    fn insert_node(&mut self, node: Node) -> usize {
        let index = self.nodes.len();
        self.index_by_id.insert(node.id.clone(), index);
        self.nodes.push(node);
        index
    }

    fn connect(&mut self, a: usize, b: usize) -> LinkChange {
        self.add_link_weight(a, b, 1)
    }

    fn add_link_weight(&mut self, source: usize, target: usize, weight: u32) -> LinkChange {
        let change = match self.link_by_pair.get(&pair_key(source, target)) {
            Some(&link) => {
                let entry = &mut self.links[link];
                entry.weight = entry.weight.saturating_add(weight);
                LinkChange::Strengthened(link)
            }
            None => {
                let link = self.links.len();
                self.links.push(Link {
                    source,
                    target,
                    weight: weight.max(1),
                    opacity: 0.0,
                });
                self.link_by_pair.insert(pair_key(source, target), link);
                LinkChange::Created(link)
            }
        };
        self.refresh_link_opacity();
        change
    }

    fn refresh_link_opacity(&mut self) {
        let max_weight = self.links.iter().map(|link| link.weight).max().unwrap_or(1);
        for link in &mut self.links {
            link.opacity = link_opacity(link.weight, max_weight);
        }
    }
}
