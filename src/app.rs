use std::time::Duration;

use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

/// Seconds between frames of the genre animation.
const FRAME_SECONDS: f64 = 1.0;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
    /// `egui` time of the last animation step.
    last_step: f64,
}

impl DashboardApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            last_step: 0.0,
        }
    }

    fn tick_animation(&mut self, ctx: &egui::Context) {
        if !self.state.animation_playing {
            return;
        }
        let now = ctx.input(|i| i.time);
        if now - self.last_step >= FRAME_SECONDS {
            self.state.step_animation();
            self.last_step = now;
        }
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.tick_animation(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: metrics and charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::dashboard(ui, &mut self.state);
        });
    }
}
