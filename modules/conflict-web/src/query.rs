//! Sidebar state carried in the query string.
//!
//! The sidebar is a GET form, so every page request re-derives the filter
//! selection from its URL. Set-valued keys repeat (`region=Africa&region=Europe`).

use tracing::debug;
use url::form_urlencoded;

use conflict_common::filters::year_span;
use conflict_common::{ClusterId, Dataset, FilterSelection, SeverityCategory, YearRange};

/// Raw sidebar values as they arrived.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DashboardQuery {
    /// Set once the sidebar form has been submitted at least once.
    pub applied: bool,
    pub event_types: Vec<String>,
    pub regions: Vec<String>,
    pub clusters: Vec<ClusterId>,
    pub severities: Vec<SeverityCategory>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    /// Cluster picked on the profile tab.
    pub profile: Option<ClusterId>,
}

impl DashboardQuery {
    /// Unknown keys and unparseable values are skipped.
    pub fn parse(raw: &str) -> Self {
        let mut query = Self::default();

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "applied" => query.applied = true,
                "event_type" => {
                    query.applied = true;
                    query.event_types.push(value.to_string());
                }
                "region" => {
                    query.applied = true;
                    query.regions.push(value.to_string());
                }
                "cluster" => {
                    query.applied = true;
                    match value.parse() {
                        Ok(id) => query.clusters.push(id),
                        Err(_) => debug!(value, "Ignoring unparseable cluster id"),
                    }
                }
                "severity" => {
                    query.applied = true;
                    match SeverityCategory::from_label(value) {
                        Some(category) => query.severities.push(category),
                        None => debug!(value, "Ignoring unknown severity"),
                    }
                }
                "year_min" => query.year_min = parse_year(value),
                "year_max" => query.year_max = parse_year(value),
                "profile" => query.profile = value.parse().ok(),
                _ => {}
            }
        }

        query
    }

    /// Resolve against the dataset into the selection the filters run with.
    ///
    /// Before the form is submitted every set defaults to all options. After
    /// that the submitted sets are used as-is, including empty ones. Cluster
    /// ids outside the global top list are dropped, and the year range is
    /// clamped to the dataset's span.
    pub fn selection(&self, dataset: &Dataset) -> FilterSelection {
        let span = year_span(dataset);
        let years = YearRange::new(
            self.year_min.unwrap_or(span.start),
            self.year_max.unwrap_or(span.end),
        )
        .clamp_to(span);

        if !self.applied {
            return FilterSelection {
                years,
                ..FilterSelection::defaults(dataset)
            };
        }

        let top = dataset.top_clusters();
        FilterSelection {
            event_types: self.event_types.iter().cloned().collect(),
            regions: self.regions.iter().cloned().collect(),
            clusters: self
                .clusters
                .iter()
                .copied()
                .filter(|id| top.contains(id))
                .collect(),
            severities: self.severities.iter().copied().collect(),
            years,
        }
    }
}

fn parse_year(value: &str) -> Option<i32> {
    match value.parse() {
        Ok(year) => Some(year),
        Err(_) => {
            debug!(value, "Ignoring unparseable year");
            None
        }
    }
}

/// Key/value pairs that reproduce `selection` when submitted back.
pub fn selection_pairs(selection: &FilterSelection) -> Vec<(&'static str, String)> {
    let mut pairs = vec![("applied", "1".to_string())];
    pairs.extend(selection.event_types.iter().map(|v| ("event_type", v.clone())));
    pairs.extend(selection.regions.iter().map(|v| ("region", v.clone())));
    pairs.extend(selection.clusters.iter().map(|v| ("cluster", v.to_string())));
    pairs.extend(selection.severities.iter().map(|v| ("severity", v.label().to_string())));
    pairs.push(("year_min", selection.years.start.to_string()));
    pairs.push(("year_max", selection.years.end.to_string()));
    pairs
}

/// URL-encoded form of `selection`, without a leading `?`.
pub fn encode_selection(selection: &FilterSelection) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in selection_pairs(selection) {
        serializer.append_pair(key, &value);
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflict_common::testing::{dataset, event_in};

    fn sample() -> Dataset {
        dataset(vec![
            event_in(0, "2018-01-01", 1, 0, "Battles", "Africa"),
            event_in(1, "2020-01-01", 2, 5, "Riots", "Europe"),
            event_in(2, "2022-01-01", 1, 70, "Battles", "Middle East"),
        ])
    }

    #[test]
    fn repeated_keys_collect() {
        let q = DashboardQuery::parse("region=Africa&region=Middle+East&severity=Extreme+%2850%2B%29");
        assert!(q.applied);
        assert_eq!(q.regions, vec!["Africa", "Middle East"]);
        assert_eq!(q.severities, vec![SeverityCategory::Extreme]);
    }

    #[test]
    fn bad_values_are_skipped() {
        let q = DashboardQuery::parse("cluster=abc&cluster=2&year_min=soon&severity=Huge&profile=x");
        assert_eq!(q.clusters, vec![2]);
        assert_eq!(q.year_min, None);
        assert!(q.severities.is_empty());
        assert_eq!(q.profile, None);
    }

    #[test]
    fn fresh_visit_selects_everything() {
        let ds = sample();
        let selection = DashboardQuery::parse("").selection(&ds);
        assert_eq!(selection, FilterSelection::defaults(&ds));
    }

    #[test]
    fn submitted_empty_sets_stay_empty() {
        let ds = sample();
        let selection = DashboardQuery::parse("applied=1&year_min=2018&year_max=2022").selection(&ds);
        assert!(selection.event_types.is_empty());
        assert!(selection.regions.is_empty());
        assert!(selection.clusters.is_empty());
        assert!(selection.severities.is_empty());
    }

    #[test]
    fn clusters_outside_top_list_are_dropped() {
        let ds = sample();
        let selection = DashboardQuery::parse("cluster=1&cluster=99").selection(&ds);
        assert_eq!(selection.clusters.into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn years_are_clamped_to_dataset_span() {
        let ds = sample();
        let selection = DashboardQuery::parse("year_min=1900&year_max=2019").selection(&ds);
        assert_eq!(selection.years, YearRange::new(2018, 2019));
    }

    #[test]
    fn encoded_selection_parses_back() {
        let ds = sample();
        let mut selection = FilterSelection::defaults(&ds);
        selection.regions = ["Middle East".to_string()].into_iter().collect();
        selection.years = YearRange::new(2019, 2022);

        let encoded = encode_selection(&selection);
        let parsed = DashboardQuery::parse(&encoded).selection(&ds);
        assert_eq!(parsed, selection);
    }
}
