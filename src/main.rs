mod app;
mod chart;
mod color;
mod config;
mod data;
mod state;
mod ui;

use anyhow::{Context, Result};
use app::DashboardApp;
use clap::Parser;
use eframe::egui;

use config::Args;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut state = AppState::default();
    if let Some(path) = &args.data {
        // A named startup dataset must load; there is no retry.
        let dataset = match data::loader::load_file(path) {
            Ok(ds) => ds,
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                return Err(e).with_context(|| format!("loading {}", path.display()));
            }
        };
        state.set_dataset(dataset, Some(path.clone()));
        args.apply_to(&mut state);
    } else {
        state.region = args.region;
    }

    if let Some(out) = &args.export {
        ui::panels::write_snapshot(&state, out)?;
        log::info!("Wrote {} charts to {}", state.charts.len(), out.display());
        return Ok(());
    }

    let title = match &state.source {
        Some(path) => format!("Video Games Sales Dashboard – {}", path.display()),
        None => "Video Games Sales Dashboard".to_string(),
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard window: {e}"))
}
