use serde::Serialize;

use crate::data::aggregate::{
    AggregateResults, GroupTotal, PublisherPoint, PublisherStats, SalesMatrix, ScatterPoint,
    YearCount, YearGenreSales,
};
use crate::data::model::Region;

// ---------------------------------------------------------------------------
// Chart specifications handed to the renderer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Treemap,
    Bar,
    Donut,
    Bubble,
    Heatmap,
    AnimatedScatter,
    Strip,
}

/// Which data field drives each visual channel.  Field names match the
/// serialized names of the rows in [`ChartData`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Encoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation_frame: Option<&'static str>,
    /// Fixed x axis range, used by the animation so frames do not rescale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_range: Option<(i32, i32)>,
    pub log_y: bool,
    /// Donut hole as a fraction of the radius.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole: Option<f32>,
    /// Largest marker radius in points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_max: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "table", content = "rows", rename_all = "snake_case")]
pub enum ChartData {
    Totals(Vec<GroupTotal>),
    Publishers(Vec<PublisherStats>),
    YearCounts(Vec<YearCount>),
    Scatter(Vec<ScatterPoint>),
    Matrix(SalesMatrix),
    GenreYears(Vec<YearGenreSales>),
    Distribution(Vec<PublisherPoint>),
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Totals(rows) => rows.is_empty(),
            ChartData::Publishers(rows) => rows.is_empty(),
            ChartData::YearCounts(rows) => rows.is_empty(),
            ChartData::Scatter(rows) => rows.is_empty(),
            ChartData::Matrix(m) => m.is_empty(),
            ChartData::GenreYears(rows) => rows.is_empty(),
            ChartData::Distribution(rows) => rows.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: &'static str,
    pub kind: ChartKind,
    pub title: String,
    pub encoding: Encoding,
    pub data: ChartData,
}

fn titled(base: &str, region: Region) -> String {
    format!("{base} ({})", region.label())
}

/// Bind each aggregate table to its chart, in dashboard order.
///
/// `years` is the selected window; the animated chart pads it by one year
/// on each side.
pub fn build_charts(results: &AggregateResults, years: (i32, i32)) -> Vec<ChartSpec> {
    let region = results.region;
    vec![
        ChartSpec {
            id: "top_platforms",
            kind: ChartKind::Treemap,
            title: titled("Top 10 Platforms", region),
            encoding: Encoding {
                color: Some("key"),
                size: Some("sales"),
                ..Default::default()
            },
            data: ChartData::Totals(results.top_platforms.clone()),
        },
        ChartSpec {
            id: "genre_totals",
            kind: ChartKind::Bar,
            title: titled("Games Sold by Genre", region),
            encoding: Encoding {
                x: Some("key"),
                y: Some("sales"),
                color: Some("key"),
                ..Default::default()
            },
            data: ChartData::Totals(results.genre_totals.clone()),
        },
        ChartSpec {
            id: "top_games",
            kind: ChartKind::Donut,
            title: titled("Top 10 Games by Copies Sold", region),
            encoding: Encoding {
                color: Some("key"),
                size: Some("sales"),
                hole: Some(0.4),
                ..Default::default()
            },
            data: ChartData::Totals(results.top_games.clone()),
        },
        ChartSpec {
            id: "top_publishers",
            kind: ChartKind::Bubble,
            title: titled("Top Publishers by Sales & Games Published", region),
            encoding: Encoding {
                x: Some("releases"),
                y: Some("sales"),
                size: Some("sales"),
                color: Some("publisher"),
                hover: Some("publisher"),
                size_max: Some(60.0),
                ..Default::default()
            },
            data: ChartData::Publishers(results.top_publishers.clone()),
        },
        ChartSpec {
            id: "releases_by_year",
            kind: ChartKind::Bar,
            title: titled("Games Published by Year", region),
            encoding: Encoding {
                x: Some("year"),
                y: Some("releases"),
                color: Some("releases"),
                ..Default::default()
            },
            data: ChartData::YearCounts(results.releases_by_year.clone()),
        },
        ChartSpec {
            id: "sales_by_year",
            kind: ChartKind::Bubble,
            title: titled("Sales Distribution by Year", region),
            encoding: Encoding {
                x: Some("year"),
                y: Some("sales"),
                size: Some("sales"),
                color: Some("platform"),
                hover: Some("name"),
                size_max: Some(30.0),
                opacity: Some(0.7),
                ..Default::default()
            },
            data: ChartData::Scatter(results.sales_scatter.clone()),
        },
        ChartSpec {
            id: "platform_publisher",
            kind: ChartKind::Heatmap,
            title: titled("Sales Heatmap: Platform vs Publisher", region),
            encoding: Encoding {
                x: Some("publishers"),
                y: Some("platforms"),
                color: Some("values"),
                ..Default::default()
            },
            data: ChartData::Matrix(results.platform_publisher.clone()),
        },
        ChartSpec {
            id: "genre_by_year",
            kind: ChartKind::AnimatedScatter,
            title: titled("Genre Popularity Over Time", region),
            encoding: Encoding {
                x: Some("year"),
                y: Some("sales"),
                size: Some("sales"),
                color: Some("genre"),
                hover: Some("genre"),
                animation_frame: Some("year"),
                x_range: Some((years.0 - 1, years.1 + 1)),
                size_max: Some(45.0),
                ..Default::default()
            },
            data: ChartData::GenreYears(results.genre_by_year.clone()),
        },
        ChartSpec {
            id: "publisher_distribution",
            kind: ChartKind::Strip,
            title: titled("Game Sales Distribution by Top Publishers", region),
            encoding: Encoding {
                x: Some("publisher"),
                y: Some("sales"),
                color: Some("publisher"),
                hover: Some("name"),
                log_y: true,
                jitter: Some(0.4),
                ..Default::default()
            },
            data: ChartData::Distribution(results.publisher_distribution.clone()),
        },
    ]
}

// ---------------------------------------------------------------------------
// Export snapshot
// ---------------------------------------------------------------------------

/// Metrics and chart specs for one filter selection, as written by
/// `--export` and File → Export charts….
#[derive(Debug, Serialize)]
pub struct DashboardSnapshot {
    pub region: &'static str,
    pub column: &'static str,
    pub years: (i32, i32),
    pub total_copies: String,
    pub games: String,
    pub charts: Vec<ChartSpec>,
}

impl DashboardSnapshot {
    pub fn new(results: &AggregateResults, years: (i32, i32)) -> Self {
        DashboardSnapshot {
            region: results.region.label(),
            column: results.region.column(),
            years,
            total_copies: results.metrics.total_display(),
            games: results.metrics.games_display(),
            charts: build_charts(results, years),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::run;
    use crate::data::filter::FilterState;
    use crate::data::model::{record, SalesDataset};

    fn results(region: Region, years: (i32, i32)) -> AggregateResults {
        let ds = SalesDataset::from_records(
            vec![
                record("Mario Kart", "Wii", 2008, "Racing", "Nintendo", 35.0),
                record("Halo", "X360", 2007, "Shooter", "Microsoft", 12.0),
                record("Gran Turismo", "PS2", 2001, "Racing", "Sony", 14.0),
            ],
            0,
        );
        let filter = FilterState {
            years,
            ..Default::default()
        };
        run(&ds, &filter, region)
    }

    #[test]
    fn test_nine_charts_in_order() {
        let charts = build_charts(&results(Region::Global, (2000, 2010)), (2000, 2010));
        let kinds: Vec<ChartKind> = charts.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChartKind::Treemap,
                ChartKind::Bar,
                ChartKind::Donut,
                ChartKind::Bubble,
                ChartKind::Bar,
                ChartKind::Bubble,
                ChartKind::Heatmap,
                ChartKind::AnimatedScatter,
                ChartKind::Strip,
            ]
        );
        assert!(charts.iter().all(|c| !c.data.is_empty()));
    }

    #[test]
    fn test_titles_embed_region_label() {
        for region in Region::ALL {
            let charts = build_charts(&results(region, (2000, 2010)), (2000, 2010));
            for chart in &charts {
                assert!(chart.title.ends_with(&format!("({})", region.label())), "{}", chart.title);
            }
        }
    }

    #[test]
    fn test_encoding_details() {
        let charts = build_charts(&results(Region::Europe, (2003, 2008)), (2003, 2008));
        let by_id = |id: &str| charts.iter().find(|c| c.id == id).unwrap();

        assert_eq!(by_id("genre_by_year").encoding.x_range, Some((2002, 2009)));
        assert_eq!(by_id("genre_by_year").encoding.animation_frame, Some("year"));
        assert!(by_id("publisher_distribution").encoding.log_y);
        assert_eq!(by_id("top_games").encoding.hole, Some(0.4));
        assert_eq!(by_id("top_publishers").encoding.x, Some("releases"));
        assert_eq!(by_id("sales_by_year").encoding.hover, Some("name"));
    }

    #[test]
    fn test_empty_results_give_empty_charts() {
        let charts = build_charts(&results(Region::Global, (1980, 1990)), (1980, 1990));
        assert_eq!(charts.len(), 9);
        assert!(charts.iter().all(|c| c.data.is_empty()));
    }

    #[test]
    fn test_snapshot_json() {
        let snapshot = DashboardSnapshot::new(&results(Region::Global, (2000, 2010)), (2000, 2010));
        assert_eq!(snapshot.total_copies, "0.06 Bn");
        assert_eq!(snapshot.games, "3");

        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(json["region"], "Global_Sales");
        assert_eq!(json["column"], "Total_Sales");
        assert_eq!(json["charts"][0]["kind"], "treemap");
        assert_eq!(json["charts"][0]["data"]["table"], "totals");
        assert_eq!(json["charts"][0]["data"]["rows"][0]["key"], "Wii");
        assert_eq!(json["charts"][6]["data"]["rows"]["platforms"][0], "PS2");
        assert_eq!(json["charts"][7]["kind"], "animated_scatter");
        assert!(json["charts"][1]["encoding"].get("hole").is_none());
    }
}
