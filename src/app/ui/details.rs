use eframe::egui::{self, RichText, Ui};

use crate::graph::{Milestone, Node};

use super::super::ViewModel;

fn node_summary(ui: &mut Ui, node: &Node, degree: u32) {
    ui.label(RichText::new(node.label()).strong());
    ui.small(node.id.as_str());
    ui.label(format!(
        "Name: {}",
        node.display_name.as_deref().unwrap_or("Unnamed")
    ));
    ui.label(format!("Scans: {}", node.count()));
    ui.label(format!("Radius: {:.1}", node.radius()));
    ui.label(format!("Links: {degree}"));
    let reached = Milestone::ALL
        .iter()
        .filter(|&&milestone| node.milestone_reached(milestone))
        .count();
    ui.label(format!("Milestones: {reached}/{}", Milestone::ALL.len()));
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        let graph = self.session.graph();
        let degrees = graph.degrees();

        ui.heading("Last scan");
        ui.add_space(4.0);
        let last = graph
            .last_scanned()
            .and_then(|index| graph.node(index).map(|node| (index, node)));
        match last {
            Some((index, node)) => {
                node_summary(ui, node, degrees.get(index).copied().unwrap_or(0));
            }
            None => {
                ui.label("No scans yet.");
            }
        }

        if let Some(index) = self.selected
            && graph.last_scanned() != Some(index)
            && let Some(node) = graph.node(index)
        {
            ui.separator();
            ui.heading("Selection");
            ui.add_space(4.0);
            node_summary(ui, node, degrees.get(index).copied().unwrap_or(0));
            if let Some(last) = graph.last_scanned().and_then(|last| graph.node(last))
                && let Some(link) = graph.link_between(&node.id, &last.id)
            {
                ui.label(format!("Co-scans with last: {}", link.weight()));
            }
            if ui.small_button("Clear selection").clicked() {
                self.set_selected(None);
            }
        }

        if let Some(node) = self
            .session
            .camera()
            .center_target()
            .and_then(|index| self.session.graph().node(index))
        {
            ui.separator();
            ui.small(format!("Camera following {}", node.label()));
        }

        self.draw_rename(ui);
    }

    /// Editing applies to the selected node, or the last scanned one when
    /// nothing is selected.
    fn rename_candidate(&self) -> Option<usize> {
        self.selected.or(self.session.graph().last_scanned())
    }

    fn draw_rename(&mut self, ui: &mut Ui) {
        let Some(index) = self.rename_candidate() else {
            self.rename_target = None;
            return;
        };

        if self.rename_target != Some(index) {
            self.rename_target = Some(index);
            self.rename_buffer = self
                .session
                .graph()
                .node(index)
                .and_then(|node| node.display_name.clone())
                .unwrap_or_default();
        }

        ui.separator();
        ui.label(RichText::new("Rename").strong());
        let mut submit = false;
        ui.horizontal(|ui| {
            let field = ui.add(
                egui::TextEdit::singleline(&mut self.rename_buffer)
                    .hint_text("Display name")
                    .desired_width(180.0),
            );
            submit |= field.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
            submit |= ui.button("Save name").clicked();
        });

        if submit {
            self.status_message = Some(if self.session.rename(index, &self.rename_buffer) {
                format!("Renamed to {}", self.rename_buffer.trim())
            } else {
                "Names cannot be empty".to_owned()
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use crate::app::tests::model;

    #[test]
    fn rename_targets_last_scan_without_selection() {
        let (mut model, _) = model();
        model.on_scan("A", Instant::now());
        model.on_scan("B", Instant::now());

        assert_eq!(model.rename_candidate(), model.session.graph().index_of("B"));

        model.set_selected(model.session.graph().index_of("A"));
        assert_eq!(model.rename_candidate(), model.session.graph().index_of("A"));

        model.reset_graph();
        assert_eq!(model.rename_candidate(), None);
    }
}
