use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::filter::{self, FilterState, FilteredView};
use super::model::{Record, Region, SalesDataset};

pub const TOP_PLATFORMS: usize = 10;
pub const TOP_GAMES: usize = 10;
pub const TOP_PUBLISHERS: usize = 10;
pub const DISTRIBUTION_PUBLISHERS: usize = 5;

// ---------------------------------------------------------------------------
// Aggregate tables
// ---------------------------------------------------------------------------

/// A group key with its summed sales.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublisherStats {
    pub publisher: String,
    pub sales: f64,
    pub releases: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub releases: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub year: i32,
    pub sales: f64,
    pub platform: String,
    pub name: String,
}

/// Dense platform × publisher sales table.  Rows follow `platforms`,
/// columns follow `publishers`; combinations without records hold 0.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesMatrix {
    pub platforms: Vec<String>,
    pub publishers: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl SalesMatrix {
    #[cfg(test)]
    pub fn get(&self, platform: &str, publisher: &str) -> Option<f64> {
        let row = self.platforms.iter().position(|p| p == platform)?;
        let col = self.publishers.iter().position(|p| p == publisher)?;
        Some(self.values[row][col])
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// Largest cell, 0.0 for an empty matrix.
    pub fn max(&self) -> f64 {
        self.values
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearGenreSales {
    pub year: i32,
    pub genre: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublisherPoint {
    pub publisher: String,
    pub name: String,
    pub sales: f64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    /// Copies sold in the region across the filtered records.
    pub total_sales: f64,
    pub games: usize,
}

impl Metrics {
    pub fn compute(view: &FilteredView, region: Region) -> Self {
        Metrics {
            total_sales: view.iter().map(|r| r.sales_for(region)).sum(),
            games: view.len(),
        }
    }

    /// Total copies in billions, e.g. `"1.23 Bn"`.
    pub fn total_display(&self) -> String {
        format!("{:.2} Bn", self.total_sales / 1e9)
    }

    /// Game count with thousands separators, e.g. `"16,291"`.
    pub fn games_display(&self) -> String {
        let digits = self.games.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Grouping helpers
// ---------------------------------------------------------------------------

/// Sum the region column per key.  Keys come back in ascending order.
fn sum_by<'a, K, F>(view: &FilteredView<'a>, region: Region, key: F) -> BTreeMap<K, f64>
where
    K: Ord,
    F: Fn(&'a Record) -> K,
{
    let mut groups = BTreeMap::new();
    for rec in view.iter() {
        *groups.entry(key(rec)).or_insert(0.0) += rec.sales_for(region);
    }
    groups
}

/// Group → sum → sort descending → take `n`.
///
/// The sort is stable over ascending keys, so equal sums keep key order.
pub fn top_n_by_sum<'a, F>(view: &FilteredView<'a>, region: Region, n: usize, key: F) -> Vec<GroupTotal>
where
    F: Fn(&'a Record) -> &'a str,
{
    let mut totals: Vec<GroupTotal> = sum_by(view, region, key)
        .into_iter()
        .map(|(k, sales)| GroupTotal {
            key: k.to_string(),
            sales,
        })
        .collect();
    totals.sort_by(|a, b| b.sales.total_cmp(&a.sales));
    totals.truncate(n);
    totals
}

// ---------------------------------------------------------------------------
// The nine aggregations
// ---------------------------------------------------------------------------

pub fn top_platforms(view: &FilteredView, region: Region, n: usize) -> Vec<GroupTotal> {
    top_n_by_sum(view, region, n, |r| r.platform.as_str())
}

/// Sales per genre, every genre, in genre order.
pub fn genre_totals(view: &FilteredView, region: Region) -> Vec<GroupTotal> {
    sum_by(view, region, |r| r.genre.as_str())
        .into_iter()
        .map(|(k, sales)| GroupTotal {
            key: k.to_string(),
            sales,
        })
        .collect()
}

/// Top games by name; a title released on several platforms is summed.
pub fn top_games(view: &FilteredView, region: Region, n: usize) -> Vec<GroupTotal> {
    top_n_by_sum(view, region, n, |r| r.name.as_str())
}

pub fn top_publishers(view: &FilteredView, region: Region, n: usize) -> Vec<PublisherStats> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for rec in view.iter() {
        let entry = groups.entry(rec.publisher.as_str()).or_insert((0.0, 0));
        entry.0 += rec.sales_for(region);
        entry.1 += 1;
    }
    let mut stats: Vec<PublisherStats> = groups
        .into_iter()
        .map(|(publisher, (sales, releases))| PublisherStats {
            publisher: publisher.to_string(),
            sales,
            releases,
        })
        .collect();
    stats.sort_by(|a, b| b.sales.total_cmp(&a.sales));
    stats.truncate(n);
    stats
}

pub fn releases_by_year(view: &FilteredView) -> Vec<YearCount> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for rec in view.iter() {
        *counts.entry(rec.year).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(year, releases)| YearCount { year, releases })
        .collect()
}

/// One point per filtered record, no aggregation.
pub fn sales_scatter(view: &FilteredView, region: Region) -> Vec<ScatterPoint> {
    view.iter()
        .map(|r| ScatterPoint {
            year: r.year,
            sales: r.sales_for(region),
            platform: r.platform.clone(),
            name: r.name.clone(),
        })
        .collect()
}

pub fn platform_publisher_matrix(view: &FilteredView, region: Region) -> SalesMatrix {
    let platforms: BTreeSet<&str> = view.iter().map(|r| r.platform.as_str()).collect();
    let publishers: BTreeSet<&str> = view.iter().map(|r| r.publisher.as_str()).collect();

    let row_of: HashMap<&str, usize> = platforms.iter().enumerate().map(|(i, p)| (*p, i)).collect();
    let col_of: HashMap<&str, usize> = publishers.iter().enumerate().map(|(i, p)| (*p, i)).collect();

    let mut values = vec![vec![0.0; publishers.len()]; platforms.len()];
    for rec in view.iter() {
        let row = row_of[rec.platform.as_str()];
        let col = col_of[rec.publisher.as_str()];
        values[row][col] += rec.sales_for(region);
    }

    SalesMatrix {
        platforms: platforms.into_iter().map(str::to_string).collect(),
        publishers: publishers.into_iter().map(str::to_string).collect(),
        values,
    }
}

/// Sales per (year, genre), ordered by year then genre.
pub fn genre_by_year(view: &FilteredView, region: Region) -> Vec<YearGenreSales> {
    sum_by(view, region, |r| (r.year, r.genre.as_str()))
        .into_iter()
        .map(|((year, genre), sales)| YearGenreSales {
            year,
            genre: genre.to_string(),
            sales,
        })
        .collect()
}

/// Individual records of the top `n` publishers, in dataset order.
pub fn top_publisher_distribution(
    view: &FilteredView,
    region: Region,
    n: usize,
) -> Vec<PublisherPoint> {
    let top: BTreeSet<String> = top_n_by_sum(view, region, n, |r| r.publisher.as_str())
        .into_iter()
        .map(|g| g.key)
        .collect();

    view.iter()
        .filter(|r| top.contains(&r.publisher))
        .map(|r| PublisherPoint {
            publisher: r.publisher.clone(),
            name: r.name.clone(),
            sales: r.sales_for(region),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Everything the dashboard shows for one filter selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateResults {
    pub region: Region,
    pub metrics: Metrics,
    pub top_platforms: Vec<GroupTotal>,
    pub genre_totals: Vec<GroupTotal>,
    pub top_games: Vec<GroupTotal>,
    pub top_publishers: Vec<PublisherStats>,
    pub releases_by_year: Vec<YearCount>,
    pub sales_scatter: Vec<ScatterPoint>,
    pub platform_publisher: SalesMatrix,
    pub genre_by_year: Vec<YearGenreSales>,
    pub publisher_distribution: Vec<PublisherPoint>,
}

/// Filter the dataset and compute every aggregate from scratch.
pub fn run(dataset: &SalesDataset, filter: &FilterState, region: Region) -> AggregateResults {
    let view = filter::apply(dataset, filter);
    log::debug!(
        "Recomputing {} over {}/{} records (years {:?}, {} platforms, {} publishers)",
        region,
        view.len(),
        dataset.len(),
        filter.years,
        filter.platforms.len(),
        filter.publishers.len()
    );
    if view.is_empty() {
        log::debug!("No records match the current filters");
    }

    AggregateResults {
        region,
        metrics: Metrics::compute(&view, region),
        top_platforms: top_platforms(&view, region, TOP_PLATFORMS),
        genre_totals: genre_totals(&view, region),
        top_games: top_games(&view, region, TOP_GAMES),
        top_publishers: top_publishers(&view, region, TOP_PUBLISHERS),
        releases_by_year: releases_by_year(&view),
        sales_scatter: sales_scatter(&view, region),
        platform_publisher: platform_publisher_matrix(&view, region),
        genre_by_year: genre_by_year(&view, region),
        publisher_distribution: top_publisher_distribution(&view, region, DISTRIBUTION_PUBLISHERS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::record;

    fn view_of(ds: &SalesDataset) -> FilteredView<'_> {
        FilteredView {
            rows: ds.records.iter().collect(),
        }
    }

    /// 40 records over 12 platforms and 8 publishers with uneven sales.
    fn wide_dataset() -> SalesDataset {
        let records = (0..40)
            .map(|i| {
                record(
                    &format!("Game {}", i % 15),
                    &format!("P{:02}", i % 12),
                    2000 + (i % 7),
                    &format!("G{}", i % 4),
                    &format!("Pub{}", i % 8),
                    ((i * 37) % 11) as f64 + 0.5,
                )
            })
            .collect();
        SalesDataset::from_records(records, 0)
    }

    fn assert_top_n_invariant(top: &[GroupTotal], all: &[GroupTotal], n: usize) {
        assert!(top.len() <= n);
        assert!(top.windows(2).all(|w| w[0].sales >= w[1].sales));
        if let Some(min) = top.last().map(|g| g.sales) {
            for g in all.iter().filter(|g| !top.iter().any(|t| t.key == g.key)) {
                assert!(g.sales <= min, "{} ({}) excluded above {}", g.key, g.sales, min);
            }
        }
    }

    #[test]
    fn test_scenario_year_window() {
        let ds = SalesDataset::from_records(
            vec![
                record("First", "A", 1999, "X", "P", 2.0),
                record("Second", "B", 2005, "Y", "Q", 5.0),
            ],
            0,
        );
        let filter = FilterState {
            years: (2000, 2010),
            ..Default::default()
        };
        let view = filter::apply(&ds, &filter);
        assert_eq!(view.len(), 1);
        assert_eq!(view.rows[0].name, "Second");
        assert_eq!(
            genre_totals(&view, Region::Global),
            vec![GroupTotal { key: "Y".into(), sales: 5_000_000.0 }]
        );
        assert_eq!(
            top_platforms(&view, Region::Global, 10),
            vec![GroupTotal { key: "B".into(), sales: 5_000_000.0 }]
        );
    }

    #[test]
    fn test_top_n_invariants() {
        let ds = wide_dataset();
        let view = view_of(&ds);
        for region in Region::ALL {
            let all_platforms = top_platforms(&view, region, usize::MAX);
            assert_eq!(all_platforms.len(), 12);
            let top = top_platforms(&view, region, 10);
            assert_eq!(top.len(), 10);
            assert_top_n_invariant(&top, &all_platforms, 10);

            let all_games = top_games(&view, region, usize::MAX);
            assert_top_n_invariant(&top_games(&view, region, 10), &all_games, 10);
        }
    }

    #[test]
    fn test_ties_broken_by_key() {
        let ds = SalesDataset::from_records(
            vec![
                record("g1", "Wii", 2006, "Sports", "N", 3.0),
                record("g2", "DS", 2006, "Sports", "N", 3.0),
                record("g3", "PS3", 2006, "Sports", "S", 3.0),
                record("g4", "GBA", 2006, "Sports", "N", 1.0),
            ],
            0,
        );
        let keys: Vec<String> = top_platforms(&view_of(&ds), Region::Global, 2)
            .into_iter()
            .map(|g| g.key)
            .collect();
        assert_eq!(keys, vec!["DS", "PS3"]);
    }

    #[test]
    fn test_games_summed_across_platforms() {
        let ds = SalesDataset::from_records(
            vec![
                record("GTA V", "PS3", 2013, "Action", "Take-Two", 21.0),
                record("GTA V", "X360", 2013, "Action", "Take-Two", 16.0),
                record("Halo 3", "X360", 2007, "Shooter", "Microsoft", 12.0),
            ],
            0,
        );
        let top = top_games(&view_of(&ds), Region::Global, 10);
        assert_eq!(top[0].key, "GTA V");
        assert_eq!(top[0].sales, 37_000_000.0);
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_publisher_stats_count_releases() {
        let ds = wide_dataset();
        let view = view_of(&ds);
        let stats = top_publishers(&view, Region::Global, 10);
        assert_eq!(stats.len(), 8);
        assert_eq!(stats.iter().map(|s| s.releases).sum::<usize>(), 40);
        assert!(stats.windows(2).all(|w| w[0].sales >= w[1].sales));

        let top3 = top_publishers(&view, Region::Global, 3);
        assert_eq!(top3, stats[..3].to_vec());
    }

    #[test]
    fn test_releases_by_year_ascending() {
        let ds = wide_dataset();
        let counts = releases_by_year(&view_of(&ds));
        assert_eq!(counts.len(), 7);
        assert_eq!(counts[0], YearCount { year: 2000, releases: 6 });
        assert!(counts.windows(2).all(|w| w[0].year < w[1].year));
        assert_eq!(counts.iter().map(|c| c.releases).sum::<usize>(), 40);
    }

    #[test]
    fn test_scatter_reads_region_column() {
        let ds = SalesDataset::from_records(vec![record("Pokemon", "GB", 1996, "RPG", "Nintendo", 8.0)], 0);
        let points = sales_scatter(&view_of(&ds), Region::Japan);
        assert_eq!(
            points,
            vec![ScatterPoint {
                year: 1996,
                sales: 1_000_000.0,
                platform: "GB".into(),
                name: "Pokemon".into(),
            }]
        );
    }

    #[test]
    fn test_matrix_missing_cell_is_zero() {
        let ds = SalesDataset::from_records(
            vec![
                record("a", "PS2", 2004, "Action", "Sony", 1.0),
                record("b", "PS2", 2004, "Action", "EA", 2.0),
                record("c", "Wii", 2007, "Sports", "EA", 4.0),
                record("d", "Wii", 2008, "Sports", "EA", 0.5),
            ],
            0,
        );
        let m = platform_publisher_matrix(&view_of(&ds), Region::Global);
        assert_eq!(m.platforms, vec!["PS2", "Wii"]);
        assert_eq!(m.publishers, vec!["EA", "Sony"]);
        assert_eq!(m.get("Wii", "Sony"), Some(0.0));
        assert_eq!(m.get("Wii", "EA"), Some(4_500_000.0));
        assert_eq!(m.get("PS2", "Sony"), Some(1_000_000.0));
        assert_eq!(m.get("DS", "EA"), None);
        assert_eq!(m.max(), 4_500_000.0);
        assert!(m.values.iter().all(|row| row.len() == 2));
    }

    #[test]
    fn test_genre_by_year_ordered() {
        let ds = wide_dataset();
        let rows = genre_by_year(&view_of(&ds), Region::Europe);
        assert!(rows
            .windows(2)
            .all(|w| (w[0].year, &w[0].genre) < (w[1].year, &w[1].genre)));
        let total: f64 = rows.iter().map(|r| r.sales).sum();
        let expected: f64 = ds.records.iter().map(|r| r.sales.eu).sum();
        assert!((total - expected).abs() < 1e-6);
    }

    #[test]
    fn test_distribution_limited_to_top_publishers() {
        let ds = wide_dataset();
        let view = view_of(&ds);
        let top5: Vec<String> = top_publishers(&view, Region::Global, 5)
            .into_iter()
            .map(|s| s.publisher)
            .collect();
        let points = top_publisher_distribution(&view, Region::Global, 5);
        assert!(points.iter().all(|p| top5.contains(&p.publisher)));
        let expected = ds.records.iter().filter(|r| top5.contains(&r.publisher)).count();
        assert_eq!(points.len(), expected);
    }

    #[test]
    fn test_empty_filter_result_gives_empty_aggregates() {
        let ds = wide_dataset();
        let filter = FilterState {
            years: (1970, 1975),
            ..Default::default()
        };
        let results = run(&ds, &filter, Region::Global);
        assert_eq!(results.metrics.total_display(), "0.00 Bn");
        assert_eq!(results.metrics.games_display(), "0");
        assert!(results.top_platforms.is_empty());
        assert!(results.genre_totals.is_empty());
        assert!(results.top_games.is_empty());
        assert!(results.top_publishers.is_empty());
        assert!(results.releases_by_year.is_empty());
        assert!(results.sales_scatter.is_empty());
        assert!(results.platform_publisher.is_empty());
        assert!(results.platform_publisher.values.is_empty());
        assert!(results.genre_by_year.is_empty());
        assert!(results.publisher_distribution.is_empty());
    }

    #[test]
    fn test_run_is_deterministic() {
        let ds = wide_dataset();
        let mut filter = FilterState::for_dataset(&ds);
        filter.toggle_publisher("Pub3");
        filter.toggle_publisher("Pub5");
        let a = run(&ds, &filter, Region::NorthAmerica);
        let b = run(&ds, &filter, Region::NorthAmerica);
        assert_eq!(a, b);
        assert_eq!(a.region, Region::NorthAmerica);
        assert_eq!(a.metrics.games, 10);
    }

    #[test]
    fn test_metrics_display() {
        let m = Metrics {
            total_sales: 8_920_000_000.0,
            games: 16_291,
        };
        assert_eq!(m.total_display(), "8.92 Bn");
        assert_eq!(m.games_display(), "16,291");
        assert_eq!(Metrics { total_sales: 0.0, games: 999 }.games_display(), "999");
        assert_eq!(Metrics { total_sales: 0.0, games: 1_234_567 }.games_display(), "1,234,567");
    }
}
