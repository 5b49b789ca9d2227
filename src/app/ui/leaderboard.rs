use eframe::egui::{self, Color32, RichText, Ui};

use crate::util::truncate_label;

use super::super::{LeaderboardCache, ViewModel};

const LEADERBOARD_ROWS: usize = 10;
const ROW_LABEL_CHARS: usize = 24;
const MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

impl ViewModel {
    fn refresh_leaderboards(&mut self) -> &LeaderboardCache {
        let graph = self.session.graph();
        if self
            .leaderboard_cache
            .as_ref()
            .is_some_and(|cache| cache.graph_revision != graph.revision())
        {
            self.leaderboard_cache = None;
        }

        self.leaderboard_cache
            .get_or_insert_with(|| LeaderboardCache {
                graph_revision: graph.revision(),
                by_size: graph.top_by_size(LEADERBOARD_ROWS),
                by_links: graph.top_by_links(LEADERBOARD_ROWS),
            })
    }

    pub(in crate::app) fn draw_leaderboards(&mut self, ui: &mut Ui) {
        let matches = self.cached_search_matches();
        let row_text = |index: usize, label: &str| {
            let text = RichText::new(truncate_label(label, ROW_LABEL_CHARS));
            if matches.as_ref().is_some_and(|matches| matches.contains(&index)) {
                text.color(MATCH_COLOR)
            } else {
                text
            }
        };

        let cache = self.refresh_leaderboards();
        let by_size = cache.by_size.clone();
        let by_links = cache.by_links.clone();
        let mut clicked = None;

        let graph = self.session.graph();
        ui.label(RichText::new("Largest nodes").strong());
        egui::Grid::new("leaderboard_size")
            .num_columns(3)
            .striped(true)
            .show(ui, |ui| {
                for (rank, &index) in by_size.iter().enumerate() {
                    let Some(node) = graph.node(index) else {
                        continue;
                    };
                    ui.label(format!("{}.", rank + 1));
                    let row = ui.selectable_label(
                        self.selected == Some(index),
                        row_text(index, node.label()),
                    );
                    if row.clicked() {
                        clicked = Some(index);
                    }
                    ui.label(format!("{:.0}", node.radius()));
                    ui.end_row();
                }
            });

        ui.add_space(8.0);
        ui.label(RichText::new("Most connected").strong());
        egui::Grid::new("leaderboard_links")
            .num_columns(3)
            .striped(true)
            .show(ui, |ui| {
                for (rank, &(index, degree)) in by_links.iter().enumerate() {
                    let Some(node) = graph.node(index) else {
                        continue;
                    };
                    ui.label(format!("{}.", rank + 1));
                    let row = ui.selectable_label(
                        self.selected == Some(index),
                        row_text(index, node.label()),
                    );
                    if row.clicked() {
                        clicked = Some(index);
                    }
                    ui.label(degree.to_string());
                    ui.end_row();
                }
            });

        if by_size.is_empty() {
            ui.small("Rankings fill in as tags are scanned.");
        }
        if clicked.is_some() {
            self.set_selected(clicked);
        }
    }
}
