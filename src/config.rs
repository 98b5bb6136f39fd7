use std::path::PathBuf;

use clap::Parser;

use crate::data::model::Region;
use crate::state::AppState;

/// Interactive video-game sales dashboard
#[derive(Debug, Parser)]
#[command(name = "vgsales-dashboard", version, about, long_about = None)]
pub struct Args {
    /// Sales table to load at startup (.csv, .json, .parquet or a workbook)
    pub data: Option<PathBuf>,

    /// Initial region: Global_Sales, NA_Sales, EU_Sales, JP_Sales or Other_Sales
    #[arg(short, long, default_value = "Global_Sales")]
    pub region: Region,

    /// First year of the initial range
    #[arg(long)]
    pub from_year: Option<i32>,

    /// Last year of the initial range
    #[arg(long)]
    pub to_year: Option<i32>,

    /// Preselect a platform (repeatable)
    #[arg(long = "platform")]
    pub platforms: Vec<String>,

    /// Preselect a publisher (repeatable)
    #[arg(long = "publisher")]
    pub publishers: Vec<String>,

    /// Write metrics and chart specs as JSON to this file and exit
    #[arg(long, requires = "data")]
    pub export: Option<PathBuf>,
}

impl Args {
    /// Apply the initial selections to a state that already holds the
    /// dataset.
    pub fn apply_to(&self, state: &mut AppState) {
        state.region = self.region;
        for platform in &self.platforms {
            state.filters.platforms.insert(platform.clone());
        }
        for publisher in &self.publishers {
            state.filters.publishers.insert(publisher.clone());
        }
        let (from, to) = state.filters.years;
        // set_years clamps and recomputes.
        state.set_years(self.from_year.unwrap_or(from), self.to_year.unwrap_or(to));
    }
}
