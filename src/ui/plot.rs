use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::hash::{Hash, Hasher};

use eframe::egui::{self, Color32, Pos2, Rect, RichText, Sense, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, GridMark, Legend, MarkerShape, Plot, PlotPoint, PlotPoints, Points};

use crate::chart::{ChartData, ChartKind, ChartSpec};
use crate::color::{viridis, ColorMap};
use crate::data::aggregate::{
    GroupTotal, PublisherPoint, PublisherStats, SalesMatrix, ScatterPoint, YearCount, YearGenreSales,
};
use crate::state::AppState;
use crate::ui::panels;

const CHART_HEIGHT: f32 = 320.0;

/// Category colours shared across charts.
struct Palettes<'a> {
    platform: &'a ColorMap,
    genre: &'a ColorMap,
    publisher: &'a ColorMap,
}

/// Animation controls of the genre chart.
struct Animation<'a> {
    frame: &'a mut usize,
    playing: &'a mut bool,
}

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render metrics, the nine charts and the records table.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a sales table to begin  (File → Open…)");
        });
        return;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Video Games Sales Dashboard");
            panels::metrics_row(ui, state);
            ui.separator();

            {
                let AppState {
                    charts,
                    platform_colors,
                    genre_colors,
                    publisher_colors,
                    animation_frame,
                    animation_playing,
                    ..
                } = &mut *state;
                let palettes = Palettes {
                    platform: platform_colors,
                    genre: genre_colors,
                    publisher: publisher_colors,
                };
                let mut animation = Animation {
                    frame: animation_frame,
                    playing: animation_playing,
                };
                for spec in charts.iter() {
                    chart(ui, spec, &palettes, &mut animation);
                    ui.add_space(12.0);
                }
            }

            egui::CollapsingHeader::new(RichText::new("Filtered records").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| panels::records_table(ui, state));
        });
}

fn chart(ui: &mut Ui, spec: &ChartSpec, palettes: &Palettes, animation: &mut Animation) {
    ui.heading(spec.title.as_str());
    if spec.data.is_empty() {
        ui.label(RichText::new("No records match the current filters.").weak());
        return;
    }

    match (&spec.kind, &spec.data) {
        (ChartKind::Treemap, ChartData::Totals(rows)) => treemap(ui, rows, palettes.platform),
        (ChartKind::Bar, ChartData::Totals(rows)) => category_bars(ui, spec, rows, palettes.genre),
        (ChartKind::Donut, ChartData::Totals(rows)) => donut(ui, spec, rows),
        (ChartKind::Bubble, ChartData::Publishers(rows)) => {
            publisher_bubbles(ui, spec, rows, palettes.publisher)
        }
        (ChartKind::Bar, ChartData::YearCounts(rows)) => year_bars(ui, spec, rows),
        (ChartKind::Bubble, ChartData::Scatter(rows)) => sales_scatter(ui, spec, rows, palettes.platform),
        (ChartKind::Heatmap, ChartData::Matrix(matrix)) => heatmap(ui, matrix),
        (ChartKind::AnimatedScatter, ChartData::GenreYears(rows)) => {
            animated_genres(ui, spec, rows, palettes.genre, animation)
        }
        (ChartKind::Strip, ChartData::Distribution(rows)) => {
            strip(ui, spec, rows, palettes.publisher)
        }
        (kind, _) => {
            log::warn!("No renderer for {:?} chart '{}'", kind, spec.id);
        }
    }
}

/// Format raw copies with an M/K suffix for axes and labels.
pub fn format_copies(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.0}K", value / 1e3)
    } else {
        format!("{value:.0}")
    }
}

/// Marker radius for a size-encoded value; `size_max` is the largest
/// diameter in points.
pub fn marker_radius(value: f64, max: f64, size_max: f32) -> f32 {
    if max <= 0.0 || value <= 0.0 {
        return 1.5;
    }
    let r = size_max / 2.0 * (value / max).sqrt() as f32;
    r.max(1.5)
}

fn base_plot(spec: &ChartSpec) -> Plot<'static> {
    Plot::new(spec.id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .y_axis_formatter(|mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            format_copies(mark.value)
        })
}

/// Per-record hover text, looked up by series name and plotted position.
#[derive(Default)]
struct HoverIndex {
    entries: Vec<(String, [f64; 2], String)>,
}

impl HoverIndex {
    fn insert(&mut self, series: &str, at: [f64; 2], text: String) {
        self.entries.push((series.to_string(), at, text));
    }

    /// Text for every record drawn at `at` in `series`; empty off the markers.
    fn label(&self, series: &str, at: &PlotPoint) -> String {
        self.entries
            .iter()
            .filter(|(s, p, _)| s == series && p[0] == at.x && p[1] == at.y)
            .map(|(_, _, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Attach the index as the plot's hover label when the chart asks for
    /// per-record names.
    fn attach(self, plot: Plot<'static>, spec: &ChartSpec) -> Plot<'static> {
        if spec.encoding.hover != Some("name") {
            return plot;
        }
        plot.label_formatter(move |series: &str, at: &PlotPoint| self.label(series, at))
    }
}

// ---------------------------------------------------------------------------
// Treemap
// ---------------------------------------------------------------------------

/// Slice-and-dice layout: recursively split the items into two groups of
/// similar weight along the longer side of the rectangle.  `values` should
/// be sorted descending; output rectangles follow input order.
pub fn treemap_layout(values: &[f64], rect: Rect) -> Vec<Rect> {
    let mut out = vec![Rect::NOTHING; values.len()];
    let items: Vec<(usize, f64)> = values.iter().map(|v| v.max(0.0)).enumerate().collect();
    split(&items, rect, &mut out);
    out
}

fn split(items: &[(usize, f64)], rect: Rect, out: &mut [Rect]) {
    match items {
        [] => {}
        [(i, _)] => out[*i] = rect,
        _ => {
            let total: f64 = items.iter().map(|(_, v)| v).sum();
            let mut k = 1;
            let mut acc = items[0].1;
            while k < items.len() - 1 && acc + items[k].1 <= total / 2.0 {
                acc += items[k].1;
                k += 1;
            }
            let frac = if total > 0.0 {
                (acc / total) as f32
            } else {
                k as f32 / items.len() as f32
            };

            let (first, second) = if rect.width() >= rect.height() {
                let x = rect.left() + rect.width() * frac;
                (
                    Rect::from_min_max(rect.min, Pos2::new(x, rect.bottom())),
                    Rect::from_min_max(Pos2::new(x, rect.top()), rect.max),
                )
            } else {
                let y = rect.top() + rect.height() * frac;
                (
                    Rect::from_min_max(rect.min, Pos2::new(rect.right(), y)),
                    Rect::from_min_max(Pos2::new(rect.left(), y), rect.max),
                )
            };
            split(&items[..k], first, out);
            split(&items[k..], second, out);
        }
    }
}

fn treemap(ui: &mut Ui, rows: &[GroupTotal], colors: &ColorMap) {
    let size = Vec2::new(ui.available_width(), CHART_HEIGHT);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let values: Vec<f64> = rows.iter().map(|r| r.sales).collect();
    let rects = treemap_layout(&values, response.rect);

    let mut hovered = None;
    for (row, rect) in rows.iter().zip(&rects) {
        let rect = rect.shrink(1.0);
        painter.rect_filled(rect, 2.0, colors.color_for(&row.key));
        if rect.width() > 40.0 && rect.height() > 30.0 {
            painter.text(
                rect.left_top() + Vec2::new(6.0, 4.0),
                egui::Align2::LEFT_TOP,
                format!("{}\n{}", row.key, format_copies(row.sales)),
                egui::FontId::proportional(13.0),
                Color32::WHITE,
            );
        }
        if response.hover_pos().is_some_and(|p| rect.contains(p)) {
            hovered = Some(row);
        }
    }
    if let Some(row) = hovered {
        response.on_hover_text_at_pointer(format!("{}: {:.0}", row.key, row.sales));
    }
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

fn category_bars(ui: &mut Ui, spec: &ChartSpec, rows: &[GroupTotal], colors: &ColorMap) {
    let labels: Vec<String> = rows.iter().map(|r| r.key.clone()).collect();
    base_plot(spec)
        .x_axis_formatter(move |mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            category_label(&labels, mark.value)
        })
        .show(ui, |plot_ui| {
            for (i, row) in rows.iter().enumerate() {
                let color = colors.color_for(&row.key);
                let bar = Bar::new(i as f64, row.sales).name(&row.key).fill(color).width(0.8);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(&row.key).color(color));
            }
        });
}

/// Axis label for an integer tick on a categorical axis.
fn category_label(labels: &[String], value: f64) -> String {
    if value < 0.0 || value.fract() != 0.0 {
        return String::new();
    }
    labels.get(value as usize).cloned().unwrap_or_default()
}

fn year_bars(ui: &mut Ui, spec: &ChartSpec, rows: &[YearCount]) {
    let max = rows.iter().map(|r| r.releases).max().unwrap_or(0).max(1) as f32;
    let bars: Vec<Bar> = rows
        .iter()
        .map(|r| {
            Bar::new(r.year as f64, r.releases as f64)
                .name(r.year)
                .fill(viridis(r.releases as f32 / max))
                .width(0.8)
        })
        .collect();
    Plot::new(spec.id)
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .x_axis_label("Year")
        .y_axis_label("Games")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Games published"));
        });
}

// ---------------------------------------------------------------------------
// Donut
// ---------------------------------------------------------------------------

fn donut(ui: &mut Ui, spec: &ChartSpec, rows: &[GroupTotal]) {
    let colors = ColorMap::new(rows.iter().map(|r| r.key.as_str()));
    let total: f64 = rows.iter().map(|r| r.sales).sum();
    let hole = spec.encoding.hole.unwrap_or(0.0);

    ui.horizontal(|ui: &mut Ui| {
        let side = CHART_HEIGHT;
        let (response, painter) = ui.allocate_painter(Vec2::splat(side), Sense::hover());
        let center = response.rect.center();
        let outer = side / 2.0 - 8.0;
        let inner = outer * hole;

        let mut start = -TAU / 4.0;
        for row in rows {
            let share = if total > 0.0 { (row.sales / total) as f32 } else { 0.0 };
            let sweep = share * TAU;
            let color = colors.color_for(&row.key);
            // Convex quads along the arc.
            let steps = ((sweep / 0.05).ceil() as usize).max(1);
            for s in 0..steps {
                let a0 = start + sweep * s as f32 / steps as f32;
                let a1 = start + sweep * (s + 1) as f32 / steps as f32;
                let at = |r: f32, a: f32| center + Vec2::angled(a) * r;
                painter.add(egui::Shape::convex_polygon(
                    vec![at(outer, a0), at(outer, a1), at(inner, a1), at(inner, a0)],
                    color,
                    Stroke::NONE,
                ));
            }
            start += sweep;
        }

        ui.vertical(|ui: &mut Ui| {
            for row in rows {
                let pct = if total > 0.0 { row.sales / total * 100.0 } else { 0.0 };
                ui.horizontal(|ui: &mut Ui| {
                    ui.label(RichText::new("■").color(colors.color_for(&row.key)));
                    ui.label(format!("{}  {} ({pct:.1}%)", row.key, format_copies(row.sales)));
                });
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Scatter / bubble charts
// ---------------------------------------------------------------------------

fn publisher_bubbles(ui: &mut Ui, spec: &ChartSpec, rows: &[PublisherStats], colors: &ColorMap) {
    let max = rows.iter().map(|r| r.sales).fold(0.0, f64::max);
    let size_max = spec.encoding.size_max.unwrap_or(30.0);
    base_plot(spec)
        .x_axis_label("Games published")
        .show(ui, |plot_ui| {
            for row in rows {
                let points = Points::new(vec![[row.releases as f64, row.sales]])
                    .name(&row.publisher)
                    .color(colors.color_for(&row.publisher))
                    .shape(MarkerShape::Circle)
                    .filled(true)
                    .radius(marker_radius(row.sales, max, size_max));
                plot_ui.points(points);
            }
        });
}

/// Number of distinct marker sizes per series in the per-record scatter.
const SIZE_BUCKETS: usize = 6;

fn sales_scatter(ui: &mut Ui, spec: &ChartSpec, rows: &[ScatterPoint], colors: &ColorMap) {
    let max = rows.iter().map(|r| r.sales).fold(0.0, f64::max);
    let size_max = spec.encoding.size_max.unwrap_or(30.0);
    let opacity = spec.encoding.opacity.unwrap_or(1.0);

    // One series per (platform, size bucket); the legend merges equal names.
    let mut series: BTreeMap<(&str, usize), Vec<[f64; 2]>> = BTreeMap::new();
    let mut hover = HoverIndex::default();
    for p in rows {
        let bucket = if max > 0.0 {
            (((p.sales / max).sqrt() * SIZE_BUCKETS as f64).ceil() as usize).clamp(1, SIZE_BUCKETS)
        } else {
            1
        };
        let at = [p.year as f64, p.sales];
        series.entry((p.platform.as_str(), bucket)).or_default().push(at);
        hover.insert(
            &p.platform,
            at,
            format!("{} ({}, {})\n{}", p.name, p.platform, p.year, format_copies(p.sales)),
        );
    }

    hover
        .attach(base_plot(spec), spec)
        .x_axis_label("Year")
        .show(ui, |plot_ui| {
            for ((platform, bucket), pts) in series {
                let value = max * (bucket as f64 / SIZE_BUCKETS as f64).powi(2);
                plot_ui.points(
                    Points::new(PlotPoints::from(pts))
                        .name(platform)
                        .color(colors.color_for(platform).gamma_multiply(opacity))
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(marker_radius(value, max, size_max)),
                );
            }
        });
}

/// Distinct years of the animation, ascending.
fn frame_years(rows: &[YearGenreSales]) -> Vec<i32> {
    let mut years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    years.dedup();
    years
}

fn animated_genres(
    ui: &mut Ui,
    spec: &ChartSpec,
    rows: &[YearGenreSales],
    colors: &ColorMap,
    animation: &mut Animation,
) {
    let years = frame_years(rows);
    let last = years.len().saturating_sub(1);
    *animation.frame = (*animation.frame).min(last);

    ui.horizontal(|ui: &mut Ui| {
        let label = if *animation.playing { "⏸ Pause" } else { "▶ Play" };
        if ui.button(label).clicked() {
            *animation.playing = !*animation.playing;
        }
        let caption = format!("Year {}", years.get(*animation.frame).copied().unwrap_or_default());
        ui.add(
            egui::Slider::new(&mut *animation.frame, 0..=last)
                .show_value(false)
                .text(caption),
        );
    });

    let Some(&year) = years.get(*animation.frame) else {
        return;
    };
    // Size against every frame so markers are comparable across years.
    let max = rows.iter().map(|r| r.sales).fold(0.0, f64::max);
    let size_max = spec.encoding.size_max.unwrap_or(30.0);
    let max_y = max * 1.1;

    let mut plot = base_plot(spec).x_axis_label("Year").include_y(0.0).include_y(max_y);
    if let Some((lo, hi)) = spec.encoding.x_range {
        plot = plot.include_x(lo as f64).include_x(hi as f64);
    }
    plot.show(ui, |plot_ui| {
        for row in rows.iter().filter(|r| r.year == year) {
            plot_ui.points(
                Points::new(vec![[row.year as f64, row.sales]])
                    .name(&row.genre)
                    .color(colors.color_for(&row.genre))
                    .shape(MarkerShape::Circle)
                    .filled(true)
                    .radius(marker_radius(row.sales, max, size_max)),
            );
        }
    });
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

const CELL_MIN: f32 = 6.0;
const ROW_HEIGHT: f32 = 16.0;
const LABEL_WIDTH: f32 = 70.0;

fn heatmap(ui: &mut Ui, matrix: &SalesMatrix) {
    let max = matrix.max();
    let cols = matrix.publishers.len().max(1) as f32;
    let cell_w = ((ui.available_width() - LABEL_WIDTH) / cols).max(CELL_MIN);
    let size = Vec2::new(LABEL_WIDTH + cell_w * cols, ROW_HEIGHT * matrix.platforms.len() as f32);

    egui::ScrollArea::both()
        .id_salt("heatmap")
        .max_height(CHART_HEIGHT + 80.0)
        .show(ui, |ui: &mut Ui| {
            let (response, painter) = ui.allocate_painter(size, Sense::hover());
            let origin = response.rect.min;
            let mut hovered = None;

            for (r, platform) in matrix.platforms.iter().enumerate() {
                let y = origin.y + r as f32 * ROW_HEIGHT;
                painter.text(
                    Pos2::new(origin.x + LABEL_WIDTH - 4.0, y + ROW_HEIGHT / 2.0),
                    egui::Align2::RIGHT_CENTER,
                    platform,
                    egui::FontId::proportional(11.0),
                    ui.visuals().text_color(),
                );
                for (c, value) in matrix.values[r].iter().enumerate() {
                    let min = Pos2::new(origin.x + LABEL_WIDTH + c as f32 * cell_w, y);
                    let cell = Rect::from_min_size(min, Vec2::new(cell_w, ROW_HEIGHT));
                    let t = if max > 0.0 { (value / max) as f32 } else { 0.0 };
                    painter.rect_filled(cell, 0.0, viridis(t));
                    if response.hover_pos().is_some_and(|p| cell.contains(p)) {
                        hovered = Some((platform, &matrix.publishers[c], *value));
                    }
                }
            }

            if let Some((platform, publisher, value)) = hovered {
                response.on_hover_text_at_pointer(format!("{platform} × {publisher}: {value:.0}"));
            }
        });
}

// ---------------------------------------------------------------------------
// Strip plot
// ---------------------------------------------------------------------------

/// Deterministic horizontal offset in `[-width/2, width/2]` for a point.
pub fn jitter(name: &str, index: usize, width: f64) -> f64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    name.hash(&mut hasher);
    index.hash(&mut hasher);
    let unit = (hasher.finish() % 10_000) as f64 / 9_999.0;
    (unit - 0.5) * width
}

fn strip(ui: &mut Ui, spec: &ChartSpec, rows: &[PublisherPoint], colors: &ColorMap) {
    let publishers: Vec<String> = {
        let mut seen: Vec<String> = Vec::new();
        for r in rows {
            if !seen.contains(&r.publisher) {
                seen.push(r.publisher.clone());
            }
        }
        seen.sort();
        seen
    };
    let width = spec.encoding.jitter.unwrap_or(0.0) as f64;
    let log_y = spec.encoding.log_y;

    let mut series: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    let mut hover = HoverIndex::default();
    for (i, r) in rows.iter().enumerate() {
        // Zero sales have no place on a log axis.
        if log_y && r.sales <= 0.0 {
            continue;
        }
        let Some(x) = publishers.iter().position(|p| *p == r.publisher) else {
            continue;
        };
        let y = if log_y { r.sales.log10() } else { r.sales };
        let at = [x as f64 + jitter(&r.name, i, width), y];
        series.entry(r.publisher.as_str()).or_default().push(at);
        hover.insert(&r.publisher, at, format!("{}\n{}", r.name, format_copies(r.sales)));
    }

    let labels = publishers.clone();
    let plot = Plot::new(spec.id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false);
    hover
        .attach(plot, spec)
        .x_axis_formatter(move |mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            category_label(&labels, mark.value)
        })
        .y_axis_formatter(move |mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            if log_y {
                format_copies(10f64.powf(mark.value))
            } else {
                format_copies(mark.value)
            }
        })
        .show(ui, |plot_ui| {
            for (publisher, pts) in series {
                plot_ui.points(
                    Points::new(PlotPoints::from(pts))
                        .name(publisher)
                        .color(colors.color_for(publisher))
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(2.5),
                );
            }
        });
}
