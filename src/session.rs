//! The simulation context: one owner for the graph, the driver, the camera
//! and the two outward collaborators (store and notifier).

use std::time::Instant;

use eframe::egui::Vec2;
use tracing::{debug, info, warn};

use crate::camera::Camera;
use crate::cue::Notifier;
use crate::graph::{ScanGraph, ScanOutcome};
use crate::persist::{self, PersistResult, Store};
use crate::sim::{PhysicsParams, Simulation, TickStatus};

#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    pub auto_center: bool,
    pub params: PhysicsParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_center: true,
            params: PhysicsParams::default(),
        }
    }
}

pub struct Session {
    graph: ScanGraph,
    sim: Simulation,
    camera: Camera,
    store: Box<dyn Store>,
    notifier: Box<dyn Notifier>,
    closed: bool,
}

impl Session {
    pub fn new(store: Box<dyn Store>, notifier: Box<dyn Notifier>, config: SessionConfig) -> Self {
        Self {
            graph: ScanGraph::new(),
            sim: Simulation::new(config.params),
            camera: Camera::new(config.auto_center),
            store,
            notifier,
            closed: false,
        }
    }

    pub fn graph(&self) -> &ScanGraph {
        &self.graph
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Startup load. Failures are logged and leave the graph empty.
    pub fn restore(&mut self) -> bool {
        match self.load() {
            Ok(loaded) => loaded,
            Err(error) => {
                warn!(%error, "failed to restore saved graph");
                false
            }
        }
    }

    /// Applies one scan: mutate, cue, reheat, recenter, persist.
    pub fn apply_scan(&mut self, id: &str, now: Instant) -> ScanOutcome {
        let spawn = self.camera.world_center();
        let outcome = self.graph.apply_scan(id, spawn);

        let label = self
            .graph
            .find(id)
            .map(|node| node.label().to_owned())
            .unwrap_or_else(|| id.to_owned());
        debug!(
            id,
            created = outcome.created,
            link = ?outcome.link,
            "applied scan"
        );

        for &milestone in &outcome.milestones {
            self.notifier.milestone_crossed(&label, milestone, now);
        }
        self.notifier.scan_occurred(&label, now);

        self.sim.reheat_for_scan();
        self.camera.follow(&self.graph);
        self.persist();
        outcome
    }

    pub fn frame(&mut self, now: Instant) -> TickStatus {
        let home = self.camera.world_center();
        self.sim.frame(&mut self.graph, home, now, &mut self.camera)
    }

    pub fn drag_start(&mut self, index: usize) -> bool {
        self.sim.drag_start(&mut self.graph, index)
    }

    pub fn drag_to(&mut self, index: usize, world_pos: Vec2) {
        self.sim.drag_to(&mut self.graph, index, world_pos);
    }

    pub fn drag_end(&mut self, index: usize) {
        self.sim.drag_end(&mut self.graph, index);
    }

    pub fn rename(&mut self, index: usize, name: &str) -> bool {
        if !self.graph.rename(index, name) {
            return false;
        }
        self.persist();
        true
    }

    pub fn set_auto_center(&mut self, enabled: bool) {
        self.camera.set_auto_center(enabled, &self.graph);
    }

    pub fn reset(&mut self) {
        self.graph.reset();
        self.camera.reset();
        self.sim.restart();
        info!("graph reset");
        self.persist();
    }

    pub fn save(&mut self) -> PersistResult<()> {
        persist::save_graph(self.store.as_ref(), &self.graph)?;
        info!(nodes = self.graph.node_count(), "graph saved");
        Ok(())
    }

    /// Replaces the in-memory graph with the stored one. `Ok(false)` when
    /// nothing was stored; the current graph is kept in that case.
    pub fn load(&mut self) -> PersistResult<bool> {
        let Some(graph) = persist::load_graph(self.store.as_ref())? else {
            return Ok(false);
        };

        info!(
            nodes = graph.node_count(),
            links = graph.link_count(),
            "graph loaded"
        );
        self.graph = graph;
        self.sim.restart();
        self.camera.follow(&self.graph);
        Ok(true)
    }

    /// Final flush. Later calls are no-ops.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.persist();
        debug!("session closed");
    }

    fn persist(&self) {
        if let Err(error) = persist::save_graph(self.store.as_ref(), &self.graph) {
            warn!(%error, "failed to persist graph");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use eframe::egui::vec2;

    use super::*;
    use crate::cue::Cue;
    use crate::cue::tests::RecordingNotifier;
    use crate::graph::Milestone;
    use crate::persist::tests::MemoryStore;

    type Played = Rc<RefCell<Vec<(Cue, String)>>>;

    fn session_with(store: &Rc<MemoryStore>) -> (Session, Played) {
        let notifier = RecordingNotifier::default();
        let played = Rc::clone(&notifier.played);
        let session = Session::new(
            Box::new(Rc::clone(store)),
            Box::new(notifier),
            SessionConfig::default(),
        );
        (session, played)
    }

    #[test]
    fn every_scan_is_persisted() {
        let store = Rc::new(MemoryStore::default());
        let (mut session, _) = session_with(&store);
        let now = Instant::now();

        for id in ["A", "B", "A"] {
            session.apply_scan(id, now);
        }

        assert_eq!(store.saves.get(), 3);
        let restored = persist::load_graph(&*store)
            .expect("loads")
            .expect("present");
        assert_eq!(restored.find("A").map(|node| node.count()), Some(2));
        assert_eq!(restored.link_between("A", "B").map(|link| link.weight()), Some(2));
    }

    #[test]
    fn store_failures_do_not_stop_scanning() {
        let store = Rc::new(MemoryStore::default());
        store.failing.set(true);
        let (mut session, _) = session_with(&store);

        session.apply_scan("A", Instant::now());
        session.apply_scan("B", Instant::now());

        assert_eq!(session.graph().node_count(), 2);
        assert!(session.save().is_err());
        assert!(!session.restore());
        assert_eq!(session.graph().node_count(), 2);
    }

    #[test]
    fn restore_replaces_graph_with_saved_state() {
        let store = Rc::new(MemoryStore::default());
        {
            let (mut session, _) = session_with(&store);
            session.apply_scan("A", Instant::now());
            session.apply_scan("B", Instant::now());
            let index = session.graph().index_of("B").expect("node exists");
            assert!(session.rename(index, "Bob"));
        }

        let (mut session, played) = session_with(&store);
        store.failing.set(true);
        session.apply_scan("Z", Instant::now());
        store.failing.set(false);
        assert!(session.restore());

        assert_eq!(session.graph().node_count(), 2);
        assert!(session.graph().find("Z").is_none());
        assert_eq!(session.graph().find("B").map(|node| node.label()), Some("Bob"));
        assert_eq!(played.borrow().len(), 1, "restoring plays no cues");
    }

    #[test]
    fn scans_play_milestone_then_scan_cues() {
        let store = Rc::new(MemoryStore::default());
        let (mut session, played) = session_with(&store);
        let now = Instant::now();

        let mut first_milestone_at = None;
        for step in 0..40 {
            let outcome = session.apply_scan("A", now);
            if first_milestone_at.is_none() && !outcome.milestones.is_empty() {
                first_milestone_at = Some(step);
            }
        }

        let played = played.borrow();
        let milestones = played
            .iter()
            .filter(|(cue, _)| matches!(cue, Cue::Milestone(_)))
            .collect::<Vec<_>>();
        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].0, Cue::Milestone(Milestone::Radius25));

        let position = first_milestone_at.expect("milestone reached");
        assert_eq!(played[position - 1].0, Cue::Scan);
        assert_eq!(played[position].0, Cue::Milestone(Milestone::Radius25));
        assert_eq!(played[position + 1].0, Cue::Scan);
    }

    #[test]
    fn new_nodes_spawn_at_camera_center() {
        let store = Rc::new(MemoryStore::default());
        let (mut session, _) = session_with(&store);
        session.set_auto_center(false);
        session.camera_mut().focus_on(vec2(120.0, -80.0));

        let outcome = session.apply_scan("A", Instant::now());
        assert_eq!(session.graph().nodes()[outcome.index].pos, vec2(120.0, -80.0));
    }

    #[test]
    fn auto_center_scenario() {
        let store = Rc::new(MemoryStore::default());
        let (mut session, _) = session_with(&store);
        let start = Instant::now();

        session.apply_scan("small", start);
        let frozen = session.camera().pan();

        session.set_auto_center(false);
        for _ in 0..3 {
            session.apply_scan("big", start);
        }
        let big = session.graph().index_of("big").expect("node exists");
        for step in 1..=20 {
            session.frame(start + Duration::from_millis(20 * step));
        }
        assert_eq!(session.camera().pan(), frozen);

        session.set_auto_center(true);
        let big_pos = session.graph().nodes()[big].pos;
        assert!((session.camera().world_center() - big_pos).length() < 1e-3);
    }

    #[test]
    fn reset_clears_and_persists_empty_graph() {
        let store = Rc::new(MemoryStore::default());
        let (mut session, _) = session_with(&store);
        session.apply_scan("A", Instant::now());
        session.apply_scan("B", Instant::now());

        session.reset();

        assert!(session.graph().is_empty());
        let restored = persist::load_graph(&*store)
            .expect("loads")
            .expect("present");
        assert!(restored.is_empty());
    }

    #[test]
    fn shutdown_flushes_once() {
        let store = Rc::new(MemoryStore::default());
        let (mut session, _) = session_with(&store);
        session.apply_scan("A", Instant::now());
        let before = store.saves.get();

        session.shutdown();
        session.shutdown();

        assert_eq!(store.saves.get(), before + 1);
    }

    #[test]
    fn drag_moves_node_through_frames() {
        let store = Rc::new(MemoryStore::default());
        let (mut session, _) = session_with(&store);
        let start = Instant::now();
        let index = session.apply_scan("A", start).index;

        assert!(session.drag_start(index));
        session.drag_to(index, vec2(55.0, 5.0));
        session.frame(start);
        assert_eq!(session.graph().nodes()[index].pos, vec2(55.0, 5.0));

        session.drag_end(index);
        assert_eq!(session.graph().nodes()[index].pin, None);
    }
}
