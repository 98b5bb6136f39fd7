use std::path::Path;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::filter;
use crate::data::model::Region;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    // Clone what we need so we can mutate state inside the loop.
    let platforms: Vec<String> = dataset.platforms.iter().cloned().collect();
    let publishers: Vec<String> = dataset.publishers.iter().cloned().collect();
    let (min_year, max_year) = dataset.year_bounds.unwrap_or(filter::DEFAULT_YEARS);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Region selector ----
            ui.strong("Region");
            let current = state.region;
            egui::ComboBox::from_id_salt("region")
                .selected_text(current.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for region in Region::ALL {
                        if ui.selectable_label(current == region, region.label()).clicked() {
                            state.set_region(region);
                        }
                    }
                });
            ui.separator();

            // ---- Year range ----
            ui.strong("Publishing Year Range");
            let (mut from, mut to) = state.filters.years;
            let from_changed = ui
                .add(egui::Slider::new(&mut from, min_year..=max_year).text("from"))
                .changed();
            let to_changed = ui
                .add(egui::Slider::new(&mut to, min_year..=max_year).text("to"))
                .changed();
            if from_changed || to_changed {
                // Dragging one handle past the other pushes it along.
                if from_changed && from > to {
                    to = from;
                } else if to_changed && to < from {
                    from = to;
                }
                state.set_years(from, to);
            }
            ui.separator();

            // ---- Platform / publisher multi-selects ----
            multi_select(ui, "Platforms", &platforms, state, Dimension::Platform);
            multi_select(ui, "Publishers", &publishers, state, Dimension::Publisher);
        });
}

#[derive(Clone, Copy)]
enum Dimension {
    Platform,
    Publisher,
}

fn multi_select(ui: &mut Ui, title: &str, values: &[String], state: &mut AppState, dim: Dimension) {
    let n_selected = match dim {
        Dimension::Platform => state.filters.platforms.len(),
        Dimension::Publisher => state.filters.publishers.len(),
    };
    let header_text = if n_selected == 0 {
        format!("{title}  (all {})", values.len())
    } else {
        format!("{title}  ({n_selected}/{})", values.len())
    };

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("Clear").clicked() {
                match dim {
                    Dimension::Platform => state.clear_platforms(),
                    Dimension::Publisher => state.clear_publishers(),
                }
            }

            ScrollArea::vertical()
                .id_salt(title)
                .max_height(260.0)
                .show(ui, |ui: &mut Ui| {
                    for value in values {
                        let mut checked = match dim {
                            Dimension::Platform => state.filters.platforms.contains(value),
                            Dimension::Publisher => state.filters.publishers.contains(value),
                        };
                        let color = match dim {
                            Dimension::Platform => state.platform_colors.color_for(value),
                            Dimension::Publisher => state.publisher_colors.color_for(value),
                        };
                        if ui.checkbox(&mut checked, RichText::new(value).color(color)).changed() {
                            match dim {
                                Dimension::Platform => state.toggle_platform(value),
                                Dimension::Publisher => state.toggle_publisher(value),
                            }
                        }
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.dataset.is_some(), egui::Button::new("Export charts…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records loaded ({} dropped), {} after filters",
                ds.len(),
                ds.dropped,
                state.results.metrics.games
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Metrics and records table
// ---------------------------------------------------------------------------

/// The two headline numbers.
pub fn metrics_row(ui: &mut Ui, state: &AppState) {
    let metrics = &state.results.metrics;
    ui.columns(2, |cols| {
        metric(&mut cols[0], "Total Game Copies Sold", &metrics.total_display());
        metric(&mut cols[1], "Games Published", &metrics.games_display());
    });
}

fn metric(ui: &mut Ui, label: &str, value: &str) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(28.0).strong());
    });
}

/// Scrollable table of the filtered records.
pub fn records_table(ui: &mut Ui, state: &AppState) {
    let Some(ds) = &state.dataset else {
        return;
    };
    let view = filter::apply(ds, &state.filters);
    let region = state.region;

    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(320.0)
        .column(Column::auto().at_least(220.0).clip(true))
        .column(Column::auto().at_least(60.0))
        .column(Column::auto().at_least(50.0))
        .column(Column::auto().at_least(90.0))
        .column(Column::auto().at_least(160.0).clip(true))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in ["Name", "Platform", "Year", "Genre", "Publisher", region.label()] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, view.len(), |mut row| {
                let rec = view.rows[row.index()];
                row.col(|ui| {
                    ui.label(rec.name.as_str());
                });
                row.col(|ui| {
                    ui.label(rec.platform.as_str());
                });
                row.col(|ui| {
                    ui.label(rec.year.to_string());
                });
                row.col(|ui| {
                    ui.label(rec.genre.as_str());
                });
                row.col(|ui| {
                    ui.label(rec.publisher.as_str());
                });
                row.col(|ui| {
                    ui.label(format!("{:.0}", rec.sales_for(region)));
                });
            });
        });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales table")
        .add_filter(
            "Supported files",
            &["csv", "json", "parquet", "pq", "xlsx", "xlsm", "xlsb", "xls", "ods"],
        )
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("Spreadsheet", &["xlsx", "xlsm", "xlsb", "xls", "ods"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => state.set_dataset(dataset, Some(path)),
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export charts")
        .set_file_name("vgsales_charts.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = file {
        match write_snapshot(state, &path) {
            Ok(()) => {
                log::info!("Exported charts to {}", path.display());
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to export charts: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

/// Write the current snapshot as pretty JSON.
pub fn write_snapshot(state: &AppState, path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;

    let snapshot = state.snapshot().context("no dataset loaded")?;
    let json = snapshot.to_json().context("serialising charts")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
