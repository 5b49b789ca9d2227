//! Simulation driver: owns alpha, eases the tunable parameters and runs the
//! force passes over a [`ScanGraph`] once per frame.

use std::time::{Duration, Instant};

use eframe::egui::Vec2;
use tracing::debug;

use crate::graph::ScanGraph;

mod collide;
mod forces;
mod quadtree;

use collide::{COLLIDE_ITERATIONS, CollideScratch};

pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

const ALPHA_START: f32 = 1.0;
const ALPHA_MIN: f32 = 0.01;
const ALPHA_DECAY: f32 = 0.1;
const REHEAT_THRESHOLD: f32 = 0.03;
const IDLE_REHEAT_ALPHA: f32 = 0.08;
const SCAN_REHEAT_ALPHA: f32 = 0.3;
const DRAG_ALPHA_TARGET: f32 = 0.3;
const PARAM_EASING: f32 = 0.1;
const MIN_SPEED_FACTOR: f32 = 0.01;
const MAX_SPEED_FACTOR: f32 = 0.99;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsParams {
    pub link_distance: f32,
    /// Many-body charge; zero disables it, negative values repel.
    pub repulsion: f32,
    /// `1 - velocity_decay`; higher keeps more momentum between ticks.
    pub speed_factor: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            link_distance: 300.0,
            repulsion: 0.0,
            speed_factor: 0.9,
        }
    }
}

/// Hooks invoked by [`Simulation::tick`].
pub trait TickObserver {
    fn on_tick(&mut self, _graph: &ScanGraph) {}

    /// Called once when alpha drops below the cooling threshold.
    fn on_end(&mut self, _graph: &ScanGraph) {}
}

impl TickObserver for () {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickStatus {
    /// Called again before [`FRAME_INTERVAL`] elapsed.
    Throttled,
    /// Nothing to do: the graph is empty or the driver is cooled down.
    Idle,
    Ticked,
    /// This tick cooled the simulation below its minimum alpha.
    Ended,
}

pub struct Simulation {
    alpha: f32,
    alpha_target: f32,
    running: bool,
    velocity_decay: f32,
    velocity_decay_goal: f32,
    repulsion: f32,
    repulsion_goal: f32,
    link_distance: f32,
    dragging: Option<usize>,
    last_frame: Option<Instant>,
    collide_scratch: CollideScratch,
}

fn speed_to_decay(speed_factor: f32) -> f32 {
    1.0 - speed_factor.clamp(MIN_SPEED_FACTOR, MAX_SPEED_FACTOR)
}

impl Simulation {
    pub fn new(params: PhysicsParams) -> Self {
        let velocity_decay = speed_to_decay(params.speed_factor);
        Self {
            alpha: ALPHA_START,
            alpha_target: 0.0,
            running: true,
            velocity_decay,
            velocity_decay_goal: velocity_decay,
            repulsion: params.repulsion,
            repulsion_goal: params.repulsion,
            link_distance: params.link_distance.max(0.0),
            dragging: None,
            last_frame: None,
            collide_scratch: CollideScratch::default(),
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Requested parameter values; repulsion and speed may still be easing.
    pub fn params(&self) -> PhysicsParams {
        PhysicsParams {
            link_distance: self.link_distance,
            repulsion: self.repulsion_goal,
            speed_factor: 1.0 - self.velocity_decay_goal,
        }
    }

    pub fn velocity_decay(&self) -> f32 {
        self.velocity_decay
    }

    pub fn repulsion(&self) -> f32 {
        self.repulsion
    }

    pub fn set_link_distance(&mut self, distance: f32) {
        if distance.is_finite() {
            self.link_distance = distance.max(0.0);
            self.running = true;
        }
    }

    pub fn set_repulsion(&mut self, repulsion: f32) {
        if repulsion.is_finite() {
            self.repulsion_goal = repulsion;
            self.running = true;
        }
    }

    pub fn set_speed_factor(&mut self, speed_factor: f32) {
        if speed_factor.is_finite() {
            self.velocity_decay_goal = speed_to_decay(speed_factor);
            self.running = true;
        }
    }

    /// Raises alpha to at least `alpha` and resumes ticking.
    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
        self.running = true;
    }

    pub fn reheat_for_scan(&mut self) {
        self.reheat(SCAN_REHEAT_ALPHA);
    }

    /// Full restart after the graph was replaced or cleared.
    pub fn restart(&mut self) {
        self.alpha = ALPHA_START;
        self.alpha_target = 0.0;
        self.dragging = None;
        self.running = true;
    }

    /// Periodic keep-alive: a cooled layout is nudged back to a low heat.
    pub fn maintain(&mut self) {
        if self.alpha < REHEAT_THRESHOLD {
            self.alpha = IDLE_REHEAT_ALPHA;
            self.running = true;
        }
    }

    /// Frame entry point: throttled to [`FRAME_INTERVAL`], runs the keep-alive
    /// check and then one tick.
    pub fn frame(
        &mut self,
        graph: &mut ScanGraph,
        home: Vec2,
        now: Instant,
        observer: &mut dyn TickObserver,
    ) -> TickStatus {
        if let Some(last) = self.last_frame
            && now.saturating_duration_since(last) < FRAME_INTERVAL
        {
            return TickStatus::Throttled;
        }
        self.last_frame = Some(now);

        self.maintain();
        self.tick(graph, home, observer)
    }

    /// One simulation step. `home` is where nodes with invalid coordinates are
    /// put back.
    pub fn tick(
        &mut self,
        graph: &mut ScanGraph,
        home: Vec2,
        observer: &mut dyn TickObserver,
    ) -> TickStatus {
        if !self.running || graph.is_empty() {
            return TickStatus::Idle;
        }

        self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
        self.velocity_decay += (self.velocity_decay_goal - self.velocity_decay) * PARAM_EASING;
        self.repulsion += (self.repulsion_goal - self.repulsion) * PARAM_EASING;

        let alpha = self.alpha;
        let degrees = graph.degrees();
        let (nodes, links) = graph.physics_parts_mut();

        let repaired = forces::sanitize(nodes, home);
        if repaired > 0 {
            debug!(repaired, "reset nodes with non-finite coordinates");
        }

        forces::apply_gravity(nodes, alpha, self.repulsion);
        forces::apply_orbit(nodes, links, alpha);
        forces::apply_link_springs(
            nodes,
            links,
            &degrees,
            self.link_distance,
            forces::LINK_STRENGTH,
            alpha,
        );
        collide::resolve_collisions(nodes, COLLIDE_ITERATIONS, &mut self.collide_scratch);
        forces::integrate(nodes, self.velocity_decay);

        observer.on_tick(graph);

        if self.alpha < ALPHA_MIN {
            self.alpha = ALPHA_MIN;
            self.running = false;
            observer.on_end(graph);
            return TickStatus::Ended;
        }
        TickStatus::Ticked
    }

    /// Pins `index` at its current position and keeps the layout warm while
    /// the pointer holds it.
    pub fn drag_start(&mut self, graph: &mut ScanGraph, index: usize) -> bool {
        let Some(node) = graph.node_mut(index) else {
            return false;
        };
        node.pin = Some(node.pos);
        self.alpha_target = DRAG_ALPHA_TARGET;
        self.dragging = Some(index);
        self.running = true;
        true
    }

    pub fn drag_to(&mut self, graph: &mut ScanGraph, index: usize, world_pos: Vec2) {
        if !world_pos.x.is_finite() || !world_pos.y.is_finite() {
            return;
        }
        if let Some(node) = graph.node_mut(index) {
            node.pin = Some(world_pos);
        }
    }

    /// Releases the pin. The node keeps whatever velocity it picked up while
    /// following the pointer.
    pub fn drag_end(&mut self, graph: &mut ScanGraph, index: usize) {
        if let Some(node) = graph.node_mut(index) {
            node.pin = None;
        }
        if self.dragging == Some(index) {
            self.dragging = None;
        }
        self.alpha_target = 0.0;
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(PhysicsParams::default())
    }
}
