use eframe::egui::Context;

use super::super::ViewModel;

const FPS_SAMPLE_WINDOW: usize = 180;

impl ViewModel {
    pub(in crate::app) fn update_fps_counter(&mut self, ctx: &Context) {
        let dt = ctx.input(|input| input.stable_dt);
        self.record_frame_time(dt);
    }

    fn record_frame_time(&mut self, dt: f32) {
        if dt <= f32::EPSILON {
            return;
        }

        self.fps_current = (1.0 / dt).clamp(0.0, 1000.0);
        self.fps_samples.push_back(self.fps_current);
        while self.fps_samples.len() > FPS_SAMPLE_WINDOW {
            self.fps_samples.pop_front();
        }
    }

    pub(in crate::app) fn fps_display_text(&self) -> Option<String> {
        if !self.show_fps_bar {
            return None;
        }

        let mut parts = vec![format!("FPS {:.0}", self.fps_current)];
        if !self.fps_samples.is_empty() {
            let avg = self.fps_samples.iter().sum::<f32>() / self.fps_samples.len() as f32;
            parts.push(format!("avg {avg:.1}"));
        }
        if self.fps_current > f32::EPSILON {
            parts.push(format!("{:.1} ms", 1000.0 / self.fps_current));
        }
        Some(parts.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use crate::app::tests::model;

    #[test]
    fn fps_window_is_bounded() {
        let (mut model, _) = model();
        for _ in 0..(super::FPS_SAMPLE_WINDOW + 20) {
            model.record_frame_time(1.0 / 60.0);
        }
        model.record_frame_time(0.0);

        assert_eq!(model.fps_samples.len(), super::FPS_SAMPLE_WINDOW);
        assert!((model.fps_current - 60.0).abs() < 0.01);
    }

    #[test]
    fn hidden_bar_has_no_text() {
        let (mut model, _) = model();
        model.record_frame_time(0.02);
        assert_eq!(model.fps_display_text().as_deref(), Some("FPS 50 | avg 50.0 | 20.0 ms"));

        model.show_fps_bar = false;
        assert!(model.fps_display_text().is_none());
    }
}
