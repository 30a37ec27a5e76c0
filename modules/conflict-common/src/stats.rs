//! Page-local reductions over a filtered view.
//!
//! Everything here is total over empty input: counts come back as zero and
//! averages, medians and modes as `None`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{ClusterId, EventRecord, SeverityCategory, SeverityColorMap};

// --- Overview ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewKpis {
    pub total_events: usize,
    pub total_fatalities: u64,
    pub avg_fatalities: Option<f64>,
    pub clusters_represented: usize,
}

pub fn overview_kpis(rows: &[&EventRecord]) -> OverviewKpis {
    let total_fatalities: u64 = rows.iter().map(|e| u64::from(e.fatalities)).sum();
    let avg_fatalities = if rows.is_empty() {
        None
    } else {
        Some(total_fatalities as f64 / rows.len() as f64)
    };

    OverviewKpis {
        total_events: rows.len(),
        total_fatalities,
        avg_fatalities,
        clusters_represented: rows.iter().map(|e| e.cluster).collect::<BTreeSet<_>>().len(),
    }
}

/// Event counts per calendar year, ascending by year. Years with no events are absent.
pub fn events_per_year(rows: &[&EventRecord]) -> Vec<(i32, u64)> {
    let mut by_year: BTreeMap<i32, u64> = BTreeMap::new();
    for e in rows {
        *by_year.entry(e.year()).or_default() += 1;
    }
    by_year.into_iter().collect()
}

/// Counts per severity in color-map order, zero-filled.
pub fn severity_counts(
    rows: &[&EventRecord],
    colors: &SeverityColorMap,
) -> Vec<(SeverityCategory, u64)> {
    colors
        .categories()
        .map(|category| {
            let n = rows.iter().filter(|e| e.severity == category).count() as u64;
            (category, n)
        })
        .collect()
}

// --- Cluster activity ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterYearCount {
    pub cluster: ClusterId,
    pub year: i32,
    pub events: u64,
}

/// Events per (cluster, year) for the given clusters, sorted by cluster then year.
pub fn cluster_year_counts(rows: &[&EventRecord], clusters: &[ClusterId]) -> Vec<ClusterYearCount> {
    let wanted: BTreeSet<ClusterId> = clusters.iter().copied().collect();
    let mut counts: BTreeMap<(ClusterId, i32), u64> = BTreeMap::new();
    for e in rows.iter().filter(|e| wanted.contains(&e.cluster)) {
        *counts.entry((e.cluster, e.year())).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((cluster, year), events)| ClusterYearCount {
            cluster,
            year,
            events,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterTotals {
    pub cluster: ClusterId,
    pub events: u64,
    pub fatalities: u64,
}

/// Event and fatality totals per cluster, highest fatalities first, then lowest id.
pub fn cluster_totals(rows: &[&EventRecord]) -> Vec<ClusterTotals> {
    let mut by_cluster: BTreeMap<ClusterId, (u64, u64)> = BTreeMap::new();
    for e in rows {
        let entry = by_cluster.entry(e.cluster).or_default();
        entry.0 += 1;
        entry.1 += u64::from(e.fatalities);
    }
    let mut totals: Vec<ClusterTotals> = by_cluster
        .into_iter()
        .map(|(cluster, (events, fatalities))| ClusterTotals {
            cluster,
            events,
            fatalities,
        })
        .collect();
    totals.sort_by(|a, b| b.fatalities.cmp(&a.fatalities));
    totals
}

/// Fraction of all fatalities that occurred in events of `category`.
pub fn fatality_share(rows: &[&EventRecord], category: SeverityCategory) -> Option<f64> {
    let total: u64 = rows.iter().map(|e| u64::from(e.fatalities)).sum();
    if total == 0 {
        return None;
    }
    let part: u64 = rows
        .iter()
        .filter(|e| e.severity == category)
        .map(|e| u64::from(e.fatalities))
        .sum();
    Some(part as f64 / total as f64)
}

/// `[lat, lng]` pairs for rows with both coordinates.
pub fn heat_points(rows: &[&EventRecord]) -> Vec<[f64; 2]> {
    rows.iter()
        .filter_map(|e| e.location())
        .map(|(lat, lng)| [lat, lng])
        .collect()
}

/// Mean coordinate over rows with a location.
pub fn mean_location(rows: &[&EventRecord]) -> Option<(f64, f64)> {
    let points = heat_points(rows);
    let lats: Vec<f64> = points.iter().map(|p| p[0]).collect();
    let lngs: Vec<f64> = points.iter().map(|p| p[1]).collect();
    Some((mean(&lats)?, mean(&lngs)?))
}

// --- Cluster profile ---

/// Descriptive statistics for one cluster within the filtered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterProfile {
    pub cluster: ClusterId,
    pub events: usize,
    pub mean_fatalities: Option<f64>,
    pub median_fatalities: Option<f64>,
    pub dominant_event_type: Option<String>,
    pub dominant_sub_event_type: Option<String>,
    pub dominant_interaction: Option<String>,
    pub dominant_region: Option<String>,
    pub dominant_country: Option<String>,
    pub median_population: Option<i64>,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

/// Profile `cluster` using only the rows of `rows` that belong to it.
pub fn cluster_profile(rows: &[&EventRecord], cluster: ClusterId) -> ClusterProfile {
    let members: Vec<&EventRecord> = rows.iter().copied().filter(|e| e.cluster == cluster).collect();
    let fatalities: Vec<f64> = members.iter().map(|e| f64::from(e.fatalities)).collect();
    let population: Vec<f64> = members
        .iter()
        .filter_map(|e| e.population_best)
        .filter(|p| p.is_finite())
        .collect();

    ClusterProfile {
        cluster,
        events: members.len(),
        mean_fatalities: mean(&fatalities),
        median_fatalities: median(&fatalities),
        dominant_event_type: mode(members.iter().map(|e| Some(e.event_type.as_str()))),
        dominant_sub_event_type: mode(members.iter().map(|e| e.sub_event_type.as_deref())),
        dominant_interaction: mode(members.iter().map(|e| e.interaction.as_deref())),
        dominant_region: mode(members.iter().map(|e| Some(e.region.as_str()))),
        dominant_country: mode(members.iter().map(|e| e.country.as_deref())),
        median_population: median(&population).map(|m| m.trunc() as i64),
        earliest: members.iter().map(|e| e.event_date).min(),
        latest: members.iter().map(|e| e.event_date).max(),
    }
}

// --- Reductions ---

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median with the midpoint of the two central values for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Most frequent non-empty value. Ties go to the lexicographically smallest.
pub fn mode<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values.flatten().filter(|v| !v.trim().is_empty()) {
        *counts.entry(v).or_default() += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (value, n) in counts {
        if best.map_or(true, |(_, top)| n > top) {
            best = Some((value, n));
        }
    }
    best.map(|(v, _)| v.to_string())
}
