use std::ops::RangeInclusive;

use eframe::egui::{self, Key, Response, RichText, Ui};

use crate::scan::ReaderStatus;

use super::super::{ShellRequests, ViewModel};

const ARROW_BASE_RATE: f32 = 10.0;
const ARROW_ACCEL_PER_SEC: f32 = 6.0;
const ARROW_ACCEL_MAX: f32 = 30.0;

const LINK_DISTANCE_RANGE: RangeInclusive<f32> = 10.0..=600.0;
const REPULSION_RANGE: RangeInclusive<f32> = -400.0..=100.0;
const SPEED_FACTOR_RANGE: RangeInclusive<f32> = 0.01..=0.99;

/// Seconds an arrow key has been held over a focused slider.
#[derive(Clone, Copy, Default)]
struct ArrowHold {
    secs: f32,
}

/// Lets a focused slider be nudged with the arrow keys, speeding up the
/// longer a key is held.
fn nudge_with_arrows(ui: &Ui, response: &Response, value: &mut f32, range: &RangeInclusive<f32>) -> bool {
    let state_id = response.id.with("arrow_hold");
    if !response.has_focus() {
        ui.ctx().data_mut(|data| data.remove::<ArrowHold>(state_id));
        return false;
    }

    let (dt, up, down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });
    let direction = f32::from(i8::from(up) - i8::from(down));
    let mut hold = ui
        .ctx()
        .data(|data| data.get_temp::<ArrowHold>(state_id))
        .unwrap_or_default();

    if direction == 0.0 {
        ui.ctx().data_mut(|data| data.remove::<ArrowHold>(state_id));
        return false;
    }

    hold.secs += dt;
    let ramp = hold.secs * ARROW_ACCEL_PER_SEC;
    let speed = ARROW_BASE_RATE * (1.0 + ramp + ramp * ramp * 0.15).min(ARROW_ACCEL_MAX);
    let step = ((range.end() - range.start()) / 200.0).max(0.0005);

    let before = *value;
    *value = (*value + direction * step * speed * dt).clamp(*range.start(), *range.end());
    ui.ctx().data_mut(|data| data.insert_temp(state_id, hold));
    ui.ctx().request_repaint();
    (*value - before).abs() > f32::EPSILON
}

fn tuning_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    text: &str,
    hover: &str,
) -> bool {
    let response = ui
        .add(
            egui::Slider::new(&mut *value, range.clone())
                .text(text)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hover);
    if response.hovered() {
        response.request_focus();
    }
    let dragged = response.changed();
    dragged | nudge_with_arrows(ui, &response, value, &range)
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(
        &mut self,
        ui: &mut Ui,
        reader_status: &ReaderStatus,
        requests: &mut ShellRequests,
    ) {
        ui.heading("Controls");
        ui.separator();

        ui.label(RichText::new("Reader").strong());
        ui.label(reader_status.describe());
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.device_path)
                    .hint_text("/dev/ttyACM0 or -")
                    .desired_width(180.0),
            )
            .on_hover_text("Serial device, capture file, or - for stdin.");
            let connect = ui.add_enabled(
                !reader_status.is_connected(),
                egui::Button::new("Connect"),
            );
            if connect.clicked() {
                requests.connect = true;
            }
        });

        ui.separator();
        ui.label("Search").on_hover_text("Fuzzy-highlight nodes by name or identifier.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();
        let mut auto_center = self.session.camera().auto_center();
        if ui
            .checkbox(&mut auto_center, "Auto-center on largest node")
            .changed()
        {
            self.session.set_auto_center(auto_center);
        }
        ui.checkbox(&mut self.show_nodes, "Show nodes");
        ui.checkbox(&mut self.show_fps_bar, "FPS display");

        ui.collapsing("Physics tuning", |ui| {
            if tuning_slider(
                ui,
                &mut self.link_distance,
                LINK_DISTANCE_RANGE,
                "Link distance",
                "Rest length of the spring between linked nodes.",
            ) {
                self.session
                    .simulation_mut()
                    .set_link_distance(self.link_distance);
            }

            if tuning_slider(
                ui,
                &mut self.repulsion,
                REPULSION_RANGE,
                "Repulsion",
                "Extra many-body charge; negative values push nodes apart.",
            ) {
                self.session.simulation_mut().set_repulsion(self.repulsion);
            }

            if tuning_slider(
                ui,
                &mut self.speed_factor,
                SPEED_FACTOR_RANGE,
                "Speed factor",
                "How much velocity survives each tick.",
            ) {
                self.session
                    .simulation_mut()
                    .set_speed_factor(self.speed_factor);
            }

            let sim = self.session.simulation();
            ui.small(format!(
                "alpha {:.3} -> {:.2}  |  decay {:.3}  |  charge {:.1}",
                sim.alpha(),
                sim.alpha_target(),
                sim.velocity_decay(),
                sim.repulsion()
            ));
            if let Some(index) = sim.dragging()
                && let Some(node) = self.session.graph().node(index)
            {
                ui.small(format!("pinned: {}", node.label()));
            }
        });

        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                self.status_message = Some(match self.session.save() {
                    Ok(()) => "Graph saved".to_owned(),
                    Err(error) => format!("Save failed: {error}"),
                });
            }
            if ui.button("Load").clicked() {
                self.status_message = Some(match self.session.load() {
                    Ok(true) => {
                        self.set_selected(None);
                        self.drag = None;
                        self.forget_graph_caches();
                        "Graph loaded".to_owned()
                    }
                    Ok(false) => "Nothing saved yet".to_owned(),
                    Err(error) => format!("Load failed: {error}"),
                });
            }
            if ui.button("Reset").clicked() {
                self.reset_graph();
            }
        });
        if let Some(message) = &self.status_message {
            ui.small(message.as_str());
        }

        ui.add_space(8.0);
        ui.small("Keys: 0 controls  ·  1 nodes  ·  2 reset");
    }
}
