use std::collections::VecDeque;

use eframe::egui::{self, Align, Context, Layout};

use crate::scan::ReaderStatus;
use crate::session::Session;

use super::super::{ShellRequests, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(session: Session, device_path: String) -> Self {
        let params = session.simulation().params();
        Self {
            session,
            device_path,
            search: String::new(),
            selected: None,
            rename_target: None,
            rename_buffer: String::new(),
            show_controls: true,
            show_nodes: true,
            drag: None,
            link_distance: params.link_distance,
            repulsion: params.repulsion,
            speed_factor: params.speed_factor,
            status_message: None,
            leaderboard_cache: None,
            search_match_cache: None,
            view_scratch: Default::default(),
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reader_status: &ReaderStatus,
        requests: &mut ShellRequests,
    ) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("memonet");
                    ui.separator();
                    ui.label(reader_status.describe());
                    let graph = self.session.graph();
                    ui.label(format!("nodes: {}", graph.node_count()));
                    ui.label(format!("links: {}", graph.link_count()));
                    let sim = self.session.simulation();
                    let state = if sim.is_running() { "running" } else { "settled" };
                    ui.label(format!("alpha: {:.3} ({state})", sim.alpha()));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        if self.show_controls {
            egui::SidePanel::left("controls")
                .resizable(true)
                .default_width(300.0)
                .show(ctx, |ui| self.draw_controls(ui, reader_status, requests));
        }

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_details(ui);
                    ui.separator();
                    self.draw_leaderboards(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.session.graph().is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Waiting for the first scan...");
                });
            }
            self.draw_graph(ui);
        });
    }

    /// Drops caches keyed by graph revision; needed when the graph is
    /// replaced wholesale and its revision counter starts over.
    pub(in crate::app) fn forget_graph_caches(&mut self) {
        self.leaderboard_cache = None;
        self.search_match_cache = None;
    }
}
