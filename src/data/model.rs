use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Source sales columns are stored in millions of copies.
pub const SALES_SCALE: f64 = 1_000_000.0;

// ---------------------------------------------------------------------------
// Region – which sales column the dashboard aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown region label '{label}' (expected one of Global_Sales, NA_Sales, EU_Sales, JP_Sales, Other_Sales)")]
pub struct UnknownRegionError {
    pub label: String,
}

/// A user-facing region selection.
///
/// The dataset names its worldwide column `Total_Sales` while the selector
/// shows `Global_Sales`, so label and column are kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Region {
    #[default]
    Global,
    NorthAmerica,
    Europe,
    Japan,
    Other,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::Global,
        Region::NorthAmerica,
        Region::Europe,
        Region::Japan,
        Region::Other,
    ];

    /// Label shown in the region selector and chart titles.
    pub fn label(self) -> &'static str {
        match self {
            Region::Global => "Global_Sales",
            Region::NorthAmerica => "NA_Sales",
            Region::Europe => "EU_Sales",
            Region::Japan => "JP_Sales",
            Region::Other => "Other_Sales",
        }
    }

    /// Dataset column read for this region.
    pub fn column(self) -> &'static str {
        match self {
            Region::Global => "Total_Sales",
            Region::NorthAmerica => "NA_Sales",
            Region::Europe => "EU_Sales",
            Region::Japan => "JP_Sales",
            Region::Other => "Other_Sales",
        }
    }

    pub fn resolve(label: &str) -> Result<Region, UnknownRegionError> {
        Region::ALL
            .into_iter()
            .find(|r| r.label() == label)
            .ok_or_else(|| UnknownRegionError {
                label: label.to_string(),
            })
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Region {
    type Err = UnknownRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::resolve(s)
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the sales table
// ---------------------------------------------------------------------------

/// Per-region sales in raw copies.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegionSales {
    pub na: f64,
    pub eu: f64,
    pub jp: f64,
    pub other: f64,
    pub total: f64,
}

/// One game-platform release.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub platform: String,
    pub year: i32,
    pub genre: String,
    pub publisher: String,
    pub sales: RegionSales,
}

impl Record {
    pub fn sales_for(&self, region: Region) -> f64 {
        match region {
            Region::Global => self.sales.total,
            Region::NorthAmerica => self.sales.na,
            Region::Europe => self.sales.eu,
            Region::Japan => self.sales.jp,
            Region::Other => self.sales.other,
        }
    }
}

// ---------------------------------------------------------------------------
// SalesDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The cleaned dataset with the value sets the filter widgets offer.
#[derive(Debug, Clone, Default)]
pub struct SalesDataset {
    pub records: Vec<Record>,
    pub platforms: BTreeSet<String>,
    pub publishers: BTreeSet<String>,
    pub genres: BTreeSet<String>,
    /// Observed (min, max) year; `None` when there are no records.
    pub year_bounds: Option<(i32, i32)>,
    /// Source rows removed because a required field was missing.
    pub dropped: usize,
}

impl SalesDataset {
    /// Build value indices from the cleaned records.
    pub fn from_records(records: Vec<Record>, dropped: usize) -> Self {
        let mut platforms = BTreeSet::new();
        let mut publishers = BTreeSet::new();
        let mut genres = BTreeSet::new();
        let mut year_bounds: Option<(i32, i32)> = None;

        for rec in &records {
            platforms.insert(rec.platform.clone());
            publishers.insert(rec.publisher.clone());
            genres.insert(rec.genre.clone());
            year_bounds = Some(match year_bounds {
                Some((lo, hi)) => (lo.min(rec.year), hi.max(rec.year)),
                None => (rec.year, rec.year),
            });
        }

        SalesDataset {
            records,
            platforms,
            publishers,
            genres,
            year_bounds,
            dropped,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn record(
    name: &str,
    platform: &str,
    year: i32,
    genre: &str,
    publisher: &str,
    total_millions: f64,
) -> Record {
    let total = total_millions * SALES_SCALE;
    Record {
        name: name.to_string(),
        platform: platform.to_string(),
        year,
        genre: genre.to_string(),
        publisher: publisher.to_string(),
        sales: RegionSales {
            na: total * 0.5,
            eu: total * 0.25,
            jp: total * 0.125,
            other: total * 0.125,
            total,
        },
    }
}
