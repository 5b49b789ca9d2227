use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

use eframe::egui::{Context, Key, Pos2};
use tracing::warn;

use crate::scan::{InputEvent, InputSource, ReaderStatus, spawn_reader};
use crate::session::Session;
use crate::sim::FRAME_INTERVAL;

mod graph;
mod render_utils;
mod ui;

pub struct MemonetApp {
    model: ViewModel,
    input_rx: Option<Receiver<InputEvent>>,
    reader_status: ReaderStatus,
}

struct ViewModel {
    session: Session,
    device_path: String,
    search: String,
    selected: Option<usize>,
    rename_target: Option<usize>,
    rename_buffer: String,
    show_controls: bool,
    show_nodes: bool,
    drag: Option<usize>,
    link_distance: f32,
    repulsion: f32,
    speed_factor: f32,
    status_message: Option<String>,
    leaderboard_cache: Option<LeaderboardCache>,
    search_match_cache: Option<SearchMatchCache>,
    view_scratch: ViewScratch,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

struct LeaderboardCache {
    graph_revision: u64,
    by_size: Vec<usize>,
    by_links: Vec<(usize, u32)>,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
    visible_mask: Vec<bool>,
}

/// Actions requested by panels that need the app shell (the reader lives
/// outside the view model).
#[derive(Default)]
struct ShellRequests {
    connect: bool,
}

impl MemonetApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        session: Session,
        input: Option<InputSource>,
    ) -> Self {
        let device_path = input.as_ref().map(InputSource::label).unwrap_or_default();
        let mut app = Self {
            model: ViewModel::new(session, device_path),
            input_rx: None,
            reader_status: ReaderStatus::default(),
        };

        if let Some(source) = input {
            app.connect(&cc.egui_ctx, source);
        }
        app
    }

    fn connect(&mut self, ctx: &Context, source: InputSource) {
        let repaint = ctx.clone();
        self.input_rx = Some(spawn_reader(source, move || repaint.request_repaint()));
    }

    /// Applies every pending reader event in arrival order.
    fn drain_input(&mut self) {
        let Some(rx) = self.input_rx.take() else {
            return;
        };

        loop {
            match rx.try_recv() {
                Ok(event) => {
                    self.reader_status.observe(&event);
                    match event {
                        InputEvent::Scan(id) => self.model.on_scan(&id, Instant::now()),
                        InputEvent::Disconnected(_) => return,
                        InputEvent::Connected(_) => {}
                    }
                }
                Err(TryRecvError::Empty) => {
                    self.input_rx = Some(rx);
                    return;
                }
                Err(TryRecvError::Disconnected) => {
                    if self.reader_status.is_connected() {
                        warn!("input reader stopped without reporting");
                        self.reader_status =
                            ReaderStatus::Disconnected(Some("reader stopped".to_owned()));
                    }
                    return;
                }
            }
        }
    }
}

impl ViewModel {
    fn on_scan(&mut self, id: &str, now: Instant) {
        self.session.apply_scan(id, now);
    }

    fn handle_hotkeys(&mut self, ctx: &Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        let (toggle_controls, toggle_nodes, reset) = ctx.input(|input| {
            (
                input.key_pressed(Key::Num0),
                input.key_pressed(Key::Num1),
                input.key_pressed(Key::Num2),
            )
        });

        if toggle_controls {
            self.show_controls = !self.show_controls;
        }
        if toggle_nodes {
            self.show_nodes = !self.show_nodes;
        }
        if reset {
            self.reset_graph();
        }
    }

    fn reset_graph(&mut self) {
        self.session.reset();
        self.selected = None;
        self.rename_target = None;
        self.rename_buffer.clear();
        self.drag = None;
        self.forget_graph_caches();
        self.status_message = Some("Graph reset".to_owned());
    }
}

impl eframe::App for MemonetApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.drain_input();
        self.model.handle_hotkeys(ctx);
        self.model.session.frame(Instant::now());

        let mut requests = ShellRequests::default();
        self.model.show(ctx, &self.reader_status, &mut requests);

        if requests.connect && !self.reader_status.is_connected() {
            let path = self.model.device_path.trim();
            if path.is_empty() {
                self.model.status_message = Some("Enter a device path first".to_owned());
            } else {
                let source = InputSource::from_arg(path);
                self.connect(ctx, source);
            }
        }

        ctx.request_repaint_after(FRAME_INTERVAL);
    }
}

impl Drop for MemonetApp {
    fn drop(&mut self) {
        self.model.session.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::cue::LogNotifier;
    use crate::persist::tests::MemoryStore;
    use crate::session::SessionConfig;

    pub(in crate::app) fn model() -> (ViewModel, Rc<MemoryStore>) {
        let store = Rc::new(MemoryStore::default());
        let session = Session::new(
            Box::new(Rc::clone(&store)),
            Box::new(LogNotifier::default()),
            SessionConfig::default(),
        );
        (ViewModel::new(session, String::new()), store)
    }

    #[test]
    fn draining_applies_scans_in_order() {
        let (tx, rx) = std::sync::mpsc::channel();
        let (model, _) = model();
        let mut app = MemonetApp {
            model,
            input_rx: Some(rx),
            reader_status: ReaderStatus::default(),
        };

        for event in [
            InputEvent::Connected("fixture".to_owned()),
            InputEvent::Scan("A".to_owned()),
            InputEvent::Scan("B".to_owned()),
            InputEvent::Scan("A".to_owned()),
        ] {
            tx.send(event).expect("channel open");
        }
        app.drain_input();

        let graph = app.model.session.graph();
        assert!(app.reader_status.is_connected());
        assert_eq!(graph.find("A").map(|node| node.count()), Some(2));
        assert_eq!(graph.link_between("A", "B").map(|link| link.weight()), Some(2));
        assert!(app.input_rx.is_some());

        tx.send(InputEvent::Disconnected(None)).expect("channel open");
        app.drain_input();
        assert!(app.input_rx.is_none());
        assert_eq!(app.reader_status, ReaderStatus::Disconnected(None));
    }

    #[test]
    fn dropped_reader_is_reported() {
        let (tx, rx) = std::sync::mpsc::channel();
        let (model, _) = model();
        let mut app = MemonetApp {
            model,
            input_rx: Some(rx),
            reader_status: ReaderStatus::default(),
        };
        tx.send(InputEvent::Connected("fixture".to_owned()))
            .expect("channel open");
        drop(tx);

        app.drain_input();
        assert!(!app.reader_status.is_connected());
        assert!(app.input_rx.is_none());
    }

    #[test]
    fn dropping_the_app_flushes_state() {
        let (model, store) = model();
        let app = MemonetApp {
            model,
            input_rx: None,
            reader_status: ReaderStatus::default(),
        };
        let before = store.saves.get();

        drop(app);
        assert_eq!(store.saves.get(), before + 1);
    }
}
