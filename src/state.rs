use std::path::PathBuf;

use crate::chart::{build_charts, ChartSpec, DashboardSnapshot};
use crate::color::ColorMap;
use crate::data::aggregate::{self, AggregateResults};
use crate::data::filter::FilterState;
use crate::data::model::{Region, SalesDataset};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<SalesDataset>,

    /// Where the dataset came from, for the title bar.
    pub source: Option<PathBuf>,

    /// Year window and platform/publisher selections.
    pub filters: FilterState,

    /// Region whose sales column is aggregated.
    pub region: Region,

    /// Aggregates for the current selections (recomputed on every change).
    pub results: AggregateResults,

    /// Chart specs built from `results`.
    pub charts: Vec<ChartSpec>,

    pub platform_colors: ColorMap,
    pub genre_colors: ColorMap,
    pub publisher_colors: ColorMap,

    /// Index into the animated chart's year frames.
    pub animation_frame: usize,
    pub animation_playing: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Ingest a newly loaded dataset, reset filters and colours.
    pub fn set_dataset(&mut self, dataset: SalesDataset, source: Option<PathBuf>) {
        if dataset.is_empty() {
            log::warn!("Dataset has no complete records; every chart will be empty");
        }
        self.filters = FilterState::for_dataset(&dataset);
        self.platform_colors = ColorMap::new(dataset.platforms.iter().map(String::as_str));
        self.genre_colors = ColorMap::new(dataset.genres.iter().map(String::as_str));
        self.publisher_colors = ColorMap::new(dataset.publishers.iter().map(String::as_str));

        self.dataset = Some(dataset);
        self.source = source;
        self.status_message = None;
        self.recompute();
    }

    /// Rerun the whole pipeline for the current selections.
    pub fn recompute(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        self.results = aggregate::run(ds, &self.filters, self.region);
        self.charts = build_charts(&self.results, self.filters.years);

        let frames = self.animation_years().len();
        if self.animation_frame >= frames {
            self.animation_frame = frames.saturating_sub(1);
        }
    }

    pub fn set_region(&mut self, region: Region) {
        if self.region != region {
            self.region = region;
            self.recompute();
        }
    }

    /// Set the year window, clamped to the dataset's observed years.
    pub fn set_years(&mut self, from: i32, to: i32) {
        self.filters.years = (from, to);
        if let Some(bounds) = self.dataset.as_ref().and_then(|ds| ds.year_bounds) {
            self.filters.clamp_years(bounds);
        }
        self.recompute();
    }

    pub fn toggle_platform(&mut self, platform: &str) {
        self.filters.toggle_platform(platform);
        self.recompute();
    }

    pub fn toggle_publisher(&mut self, publisher: &str) {
        self.filters.toggle_publisher(publisher);
        self.recompute();
    }

    pub fn clear_platforms(&mut self) {
        self.filters.platforms.clear();
        self.recompute();
    }

    pub fn clear_publishers(&mut self) {
        self.filters.publishers.clear();
        self.recompute();
    }

    /// Distinct years of the animated genre chart, ascending.
    pub fn animation_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.results.genre_by_year.iter().map(|r| r.year).collect();
        years.dedup();
        years
    }

    /// Advance the animation one frame, wrapping at the end.
    pub fn step_animation(&mut self) {
        let frames = self.animation_years().len();
        if frames > 0 {
            self.animation_frame = (self.animation_frame + 1) % frames;
        }
    }

    /// Current metrics and charts for export; `None` without a dataset.
    pub fn snapshot(&self) -> Option<DashboardSnapshot> {
        self.dataset
            .as_ref()
            .map(|_| DashboardSnapshot::new(&self.results, self.filters.years))
    }
}
