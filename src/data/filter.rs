use std::collections::BTreeSet;

use super::model::{Record, SalesDataset};

/// Year range the dashboard opens with before clamping to the dataset.
pub const DEFAULT_YEARS: (i32, i32) = (2000, 2010);

// ---------------------------------------------------------------------------
// Filter predicate: year window plus optional inclusion sets
// ---------------------------------------------------------------------------

/// Current filter selections.
///
/// An empty platform or publisher set means "no filter" on that dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    /// Inclusive (from, to) year bounds.
    pub years: (i32, i32),
    pub platforms: BTreeSet<String>,
    pub publishers: BTreeSet<String>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            years: DEFAULT_YEARS,
            platforms: BTreeSet::new(),
            publishers: BTreeSet::new(),
        }
    }
}

impl FilterState {
    /// Initial state for a freshly loaded dataset.
    pub fn for_dataset(dataset: &SalesDataset) -> Self {
        let mut state = FilterState::default();
        if let Some(bounds) = dataset.year_bounds {
            state.clamp_years(bounds);
        }
        state
    }

    /// Clamp the year window into the observed `(min, max)` range and keep
    /// it ordered.
    pub fn clamp_years(&mut self, (min, max): (i32, i32)) {
        let lo = self.years.0.clamp(min, max);
        let hi = self.years.1.clamp(min, max);
        self.years = (lo.min(hi), lo.max(hi));
    }

    pub fn toggle_platform(&mut self, platform: &str) {
        toggle(&mut self.platforms, platform);
    }

    pub fn toggle_publisher(&mut self, publisher: &str) {
        toggle(&mut self.publishers, publisher);
    }

    /// Whether a record passes all active predicates.
    pub fn matches(&self, rec: &Record) -> bool {
        // Year window always applies; the sets only when non-empty.
        if rec.year < self.years.0 || rec.year > self.years.1 {
            return false;
        }
        if !self.platforms.is_empty() && !self.platforms.contains(&rec.platform) {
            return false;
        }
        if !self.publishers.is_empty() && !self.publishers.contains(&rec.publisher) {
            return false;
        }
        true
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

// ---------------------------------------------------------------------------
// FilteredView – records passing the filter, in dataset order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    pub rows: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.rows.iter().copied()
    }
}

/// Return the records that pass `filter`.  An empty result is valid.
pub fn apply<'a>(dataset: &'a SalesDataset, filter: &FilterState) -> FilteredView<'a> {
    FilteredView {
        rows: dataset.records.iter().filter(|r| filter.matches(r)).collect(),
    }
}
