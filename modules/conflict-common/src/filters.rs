//! Sidebar filter selection and its application to the event table.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::types::{ClusterId, EventRecord, SeverityCategory};

/// Inclusive calendar-year interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    /// Bounds given in either order are normalized so `start <= end`.
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            start: i32::MIN,
            end: i32::MAX,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }

    /// Narrow both ends into `bounds`, as a slider would.
    pub fn clamp_to(self, bounds: YearRange) -> Self {
        Self::new(
            self.start.clamp(bounds.start, bounds.end),
            self.end.clamp(bounds.start, bounds.end),
        )
    }
}

/// The user's current filter choices.
///
/// An empty set means that dimension is not filtered at all. The year range
/// always applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub event_types: BTreeSet<String>,
    pub regions: BTreeSet<String>,
    pub clusters: BTreeSet<ClusterId>,
    pub severities: BTreeSet<SeverityCategory>,
    pub years: YearRange,
}

impl FilterSelection {
    /// Every set dimension empty and the year range unbounded.
    pub fn unrestricted() -> Self {
        Self {
            event_types: BTreeSet::new(),
            regions: BTreeSet::new(),
            clusters: BTreeSet::new(),
            severities: BTreeSet::new(),
            years: YearRange::unbounded(),
        }
    }

    /// The sidebar defaults: every option selected, full year span.
    pub fn defaults(dataset: &Dataset) -> Self {
        Self {
            event_types: dataset.event_types().into_iter().collect(),
            regions: dataset.regions().into_iter().collect(),
            clusters: dataset.top_clusters().iter().copied().collect(),
            severities: SeverityCategory::ALL.into_iter().collect(),
            years: year_span(dataset),
        }
    }

    pub fn matches(&self, event: &EventRecord) -> bool {
        member_or_unfiltered(&self.event_types, &event.event_type)
            && member_or_unfiltered(&self.regions, &event.region)
            && member_or_unfiltered(&self.clusters, &event.cluster)
            && member_or_unfiltered(&self.severities, &event.severity)
            && self.years.contains(event.year())
    }
}

/// Full `[min_year, max_year]` of the dataset, unbounded when it is empty.
pub fn year_span(dataset: &Dataset) -> YearRange {
    dataset
        .year_bounds()
        .map(|(lo, hi)| YearRange::new(lo, hi))
        .unwrap_or_else(YearRange::unbounded)
}

fn member_or_unfiltered<T: Ord>(selected: &BTreeSet<T>, value: &T) -> bool {
    selected.is_empty() || selected.contains(value)
}

/// Keep the rows that satisfy every dimension of `selection`.
pub fn apply_filters<'a, I>(rows: I, selection: &FilterSelection) -> Vec<&'a EventRecord>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    rows.into_iter().filter(|e| selection.matches(e)).collect()
}

/// A borrowed projection of the dataset for one interaction cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    rows: Vec<&'a EventRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn new(dataset: &'a Dataset, selection: &FilterSelection) -> Self {
        Self {
            rows: apply_filters(dataset.events(), selection),
        }
    }

    pub fn from_rows(rows: Vec<&'a EventRecord>) -> Self {
        Self { rows }
    }

    /// Filter this view again. Refining with the selection that produced it
    /// returns an identical view.
    pub fn refine(&self, selection: &FilterSelection) -> FilteredView<'a> {
        Self {
            rows: apply_filters(self.rows.iter().copied(), selection),
        }
    }

    /// Narrow to a single cluster.
    pub fn for_cluster(&self, cluster: ClusterId) -> FilteredView<'a> {
        Self {
            rows: self
                .rows
                .iter()
                .copied()
                .filter(|e| e.cluster == cluster)
                .collect(),
        }
    }

    pub fn rows(&self) -> &[&'a EventRecord] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a EventRecord> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains_cluster(&self, cluster: ClusterId) -> bool {
        self.rows.iter().any(|e| e.cluster == cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dataset, event, event_in};

    fn sample() -> Dataset {
        dataset(vec![
            event_in(0, "2018-05-01", 1, 0, "Battles", "Africa"),
            event_in(1, "2019-05-01", 1, 12, "Riots", "Africa"),
            event_in(2, "2020-05-01", 2, 60, "Battles", "Middle East"),
            event_in(3, "2021-05-01", 3, 4, "Protests", "Europe"),
            event_in(4, "2022-05-01", 2, 51, "Riots", "Middle East"),
        ])
    }

    fn indices(rows: &[&EventRecord]) -> Vec<u64> {
        rows.iter().map(|e| e.index).collect()
    }

    #[test]
    fn defaults_keep_everything() {
        let ds = sample();
        let selection = FilterSelection::defaults(&ds);
        assert_eq!(selection.years, YearRange::new(2018, 2022));
        assert_eq!(apply_filters(ds.events(), &selection).len(), ds.len());
    }

    #[test]
    fn and_across_or_within() {
        let ds = sample();
        let mut selection = FilterSelection::defaults(&ds);
        selection.event_types = ["Battles", "Riots"].iter().map(|s| s.to_string()).collect();
        selection.regions = ["Middle East".to_string()].into_iter().collect();
        let kept = apply_filters(ds.events(), &selection);
        assert_eq!(indices(&kept), vec![2, 4]);
    }

    #[test]
    fn empty_set_is_no_filter() {
        let ds = sample();
        let mut with_empty = FilterSelection::defaults(&ds);
        with_empty.regions = ["Africa".to_string()].into_iter().collect();
        with_empty.event_types.clear();

        let mut omitted = FilterSelection::unrestricted();
        omitted.regions = with_empty.regions.clone();
        omitted.years = with_empty.years;

        let a = apply_filters(ds.events(), &with_empty);
        let b = apply_filters(ds.events(), &omitted);
        assert_eq!(a, b);
        assert_eq!(indices(&a), vec![0, 1]);
    }

    #[test]
    fn year_bounds_are_inclusive() {
        let ds = sample();
        let mut selection = FilterSelection::unrestricted();
        selection.years = YearRange::new(2019, 2021);
        let kept = apply_filters(ds.events(), &selection);
        assert_eq!(indices(&kept), vec![1, 2, 3]);
    }

    #[test]
    fn year_range_always_applies() {
        let ds = sample();
        let mut selection = FilterSelection::unrestricted();
        selection.years = YearRange::new(2030, 2040);
        assert!(apply_filters(ds.events(), &selection).is_empty());
    }

    #[test]
    fn severity_filter_uses_derived_category() {
        let ds = sample();
        let mut selection = FilterSelection::defaults(&ds);
        selection.severities = [SeverityCategory::Extreme].into_iter().collect();
        let kept = apply_filters(ds.events(), &selection);
        assert_eq!(indices(&kept), vec![2, 4]);
        assert!(kept.iter().all(|e| e.fatalities > 50));
    }

    #[test]
    fn refine_is_idempotent() {
        let ds = sample();
        let mut selection = FilterSelection::defaults(&ds);
        selection.clusters = [1, 2].into_iter().collect();
        selection.years = YearRange::new(2019, 2022);
        let once = FilteredView::new(&ds, &selection);
        let twice = once.refine(&selection);
        assert_eq!(once, twice);
    }

    #[test]
    fn filtering_leaves_the_table_untouched() {
        let ds = sample();
        let before: Vec<EventRecord> = ds.events().to_vec();
        let mut selection = FilterSelection::unrestricted();
        selection.regions = ["Europe".to_string()].into_iter().collect();
        let view = FilteredView::new(&ds, &selection);
        assert_eq!(view.len(), 1);
        assert_eq!(ds.events(), before.as_slice());
    }

    #[test]
    fn for_cluster_narrows_view() {
        let ds = sample();
        let view = FilteredView::new(&ds, &FilterSelection::unrestricted());
        let two = view.for_cluster(2);
        assert_eq!(indices(two.rows()), vec![2, 4]);
        assert!(view.for_cluster(99).is_empty());
        assert!(view.contains_cluster(3));
    }

    #[test]
    fn year_range_normalizes_and_clamps() {
        assert_eq!(YearRange::new(2022, 2018), YearRange::new(2018, 2022));
        let clamped = YearRange::new(1990, 2050).clamp_to(YearRange::new(2018, 2022));
        assert_eq!(clamped, YearRange::new(2018, 2022));
        assert!(YearRange::unbounded().contains(1));
    }

    #[test]
    fn matches_single_event() {
        let e = event(0, "2020-02-02", 5, 7);
        let mut selection = FilterSelection::unrestricted();
        assert!(selection.matches(&e));
        selection.clusters = [4].into_iter().collect();
        assert!(!selection.matches(&e));
    }
}
