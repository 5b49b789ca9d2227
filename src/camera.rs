//! Viewport transform and the auto-centering focus controller.
//!
//! Screen position of a world point is `viewport_center + pan + world * zoom`,
//! so centering a node only ever touches `pan`.

use eframe::egui::{Pos2, Vec2};

use crate::graph::ScanGraph;
use crate::sim::TickObserver;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 10.0;

/// Index of the node with the largest radius; ties keep the earliest node.
pub fn largest_node(graph: &ScanGraph) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, node) in graph.nodes().iter().enumerate() {
        match best {
            Some((_, radius)) if node.radius() <= radius => {}
            _ => best = Some((index, node.radius())),
        }
    }
    best.map(|(index, _)| index)
}

#[derive(Clone, Debug)]
pub struct Camera {
    pan: Vec2,
    zoom: f32,
    auto_center: bool,
    center_target: Option<usize>,
}

impl Camera {
    pub fn new(auto_center: bool) -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            auto_center,
            center_target: None,
        }
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn auto_center(&self) -> bool {
        self.auto_center
    }

    pub fn center_target(&self) -> Option<usize> {
        self.center_target
    }

    pub fn world_to_screen(&self, viewport_center: Pos2, world: Vec2) -> Pos2 {
        viewport_center + self.pan + world * self.zoom
    }

    pub fn screen_to_world(&self, viewport_center: Pos2, screen: Pos2) -> Vec2 {
        (screen - viewport_center - self.pan) / self.zoom
    }

    /// World point currently drawn at the middle of the viewport.
    pub fn world_center(&self) -> Vec2 {
        -self.pan / self.zoom
    }

    /// Puts `world` at the viewport midpoint, keeping the zoom.
    pub fn focus_on(&mut self, world: Vec2) {
        if world.x.is_finite() && world.y.is_finite() {
            self.pan = -world * self.zoom;
        }
    }

    pub fn update_center_target(&mut self, graph: &ScanGraph) {
        self.center_target = largest_node(graph);
    }

    /// Re-targets the largest node and centers on it, if auto-centering is on.
    pub fn follow(&mut self, graph: &ScanGraph) {
        if !self.auto_center {
            return;
        }
        self.update_center_target(graph);
        if let Some(node) = self.center_target.and_then(|index| graph.node(index)) {
            self.focus_on(node.pos);
        }
    }

    /// Turning auto-centering back on recenters immediately.
    pub fn set_auto_center(&mut self, enabled: bool, graph: &ScanGraph) {
        self.auto_center = enabled;
        self.follow(graph);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Scales by `factor` while keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, viewport_center: Pos2, anchor: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let world_before = self.screen_to_world(viewport_center, anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor - viewport_center - world_before * self.zoom;
    }

    pub fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;
        self.center_target = None;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TickObserver for Camera {
    fn on_tick(&mut self, graph: &ScanGraph) {
        self.follow(graph);
    }

    fn on_end(&mut self, graph: &ScanGraph) {
        self.follow(graph);
    }
}
