use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::truncate_label;

use super::super::render_utils::{
    blend_color, dim_color, draw_background, edge_visible, link_color, node_fill,
};
use super::super::{SearchMatchCache, ViewModel};

const LABEL_MAX_CHARS: usize = 28;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    /// Nodes whose label or identifier fuzzy-matches the search box.
    pub(in crate::app) fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let graph = self.session.graph();
        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == graph.revision()
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = graph
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                fuzzy_match_score(&matcher, node.label(), query).is_some()
                    || fuzzy_match_score(&matcher, &node.id, query).is_some()
            })
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision: graph.revision(),
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    fn update_screen_space(&mut self, rect: egui::Rect) {
        let camera = self.session.camera();
        let zoom = camera.zoom();
        let scratch = &mut self.view_scratch;

        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for node in self.session.graph().nodes() {
            scratch
                .screen_positions
                .push(camera.world_to_screen(rect.center(), node.pos));
            scratch.screen_radii.push((node.radius() * zoom).max(1.0));
        }

        Self::visible_indices_into(
            rect,
            &scratch.screen_positions,
            &scratch.screen_radii,
            &mut scratch.visible_indices,
        );
        scratch.visible_mask.clear();
        scratch
            .visible_mask
            .resize(scratch.screen_positions.len(), false);
        for &index in &scratch.visible_indices {
            scratch.visible_mask[index] = true;
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        draw_background(&painter, rect, self.session.camera());

        let search_matches = self.cached_search_matches();
        self.update_screen_space(rect);

        let hovered = Self::hovered_index(
            ui,
            &self.view_scratch.visible_indices,
            &self.view_scratch.screen_positions,
            &self.view_scratch.screen_radii,
        )
        .filter(|_| self.show_nodes);

        self.handle_node_drag(rect, &response, hovered);
        if response.clicked_by(egui::PointerButton::Primary) {
            self.set_selected(hovered);
        }
        if hovered.is_some() || self.drag.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = if self.drag.is_some() {
                    egui::CursorIcon::Grabbing
                } else {
                    egui::CursorIcon::PointingHand
                };
            });
        }

        let graph = self.session.graph();
        let zoom = self.session.camera().zoom();
        let scratch = &self.view_scratch;
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        let link_width = zoom.sqrt().clamp(0.6, 2.4);
        for link in graph.links() {
            let start = scratch.screen_positions[link.source];
            let end = scratch.screen_positions[link.target];
            if !scratch.visible_mask[link.source]
                && !scratch.visible_mask[link.target]
                && !edge_visible(rect, start, end, 2.0)
            {
                continue;
            }

            let mut color = link_color(link.opacity());
            if search_active {
                color = dim_color(color, 0.5);
            }
            painter.line_segment([start, end], Stroke::new(link_width, color));
        }

        if !self.show_nodes {
            return;
        }

        let last_scanned = graph.last_scanned();
        let highlight = Color32::from_rgb(103, 196, 255);
        let selected_color = Color32::from_rgb(245, 206, 93);

        for &index in &scratch.visible_indices {
            let node = &graph.nodes()[index];
            let position = scratch.screen_positions[index];
            let radius = scratch.screen_radii[index];
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));
            let is_selected = self.selected == Some(index);
            let is_hovered = hovered == Some(index);

            let base = node_fill(last_scanned == Some(index));
            let fill = if is_match {
                blend_color(base, highlight, 0.6)
            } else if search_active {
                dim_color(base, 0.4)
            } else {
                base
            };
            painter.circle_filled(position, radius, fill);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );
            if is_selected || is_hovered {
                let color = if is_selected { selected_color } else { highlight };
                painter.circle_stroke(position, radius + 3.0, Stroke::new(1.6, color));
            }

            if radius >= 3.0 || is_selected || is_hovered || is_match {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    truncate_label(node.label(), LABEL_MAX_CHARS),
                    FontId::proportional(12.0),
                    Color32::from_gray(225),
                );
            }
        }

        if let Some(index) = hovered
            && let Some(node) = graph.node(index)
        {
            let degree = graph
                .links()
                .iter()
                .filter(|link| link.other(index).is_some())
                .count();
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  scans {}  |  links {}",
                    node.label(),
                    node.count(),
                    degree
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
