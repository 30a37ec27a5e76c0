//! Loading the clustered event table.
//!
//! The table is read once per process through [`DatasetCache`] and shared
//! read-only as an `Arc<Dataset>`. Every filtered view borrows from it.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use serde::Deserialize;
use tracing::{debug, info};

use crate::derive::{categorize, top_n_clusters, TOP_CLUSTER_COUNT};
use crate::error::ConflictError;
use crate::types::{ClusterId, EventRecord};

/// Columns the sidebar filters depend on. Loading fails without them.
pub const REQUIRED_COLUMNS: [&str; 5] = ["event_date", "event_type", "region", "fatalities", "cluster"];

/// Columns only some page sections use. Missing ones load as `None`.
pub const OPTIONAL_COLUMNS: [&str; 6] = [
    "sub_event_type",
    "interaction",
    "country",
    "latitude",
    "longitude",
    "population_best",
];

#[derive(Debug, Deserialize)]
struct RawEvent {
    event_date: String,
    event_type: String,
    region: String,
    fatalities: u32,
    cluster: ClusterId,
    #[serde(default)]
    sub_event_type: Option<String>,
    #[serde(default)]
    interaction: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    population_best: Option<f64>,
}

/// The full, immutable event table plus what was derived from it at load.
#[derive(Debug)]
pub struct Dataset {
    events: Vec<EventRecord>,
    columns: Vec<String>,
    top_clusters: Vec<ClusterId>,
}

impl Dataset {
    /// Build a dataset from already-parsed events that came from a file with `columns`.
    pub fn new(events: Vec<EventRecord>, columns: Vec<String>) -> Self {
        let top_clusters = top_n_clusters(&events, TOP_CLUSTER_COUNT);
        Self {
            events,
            columns,
            top_clusters,
        }
    }

    /// Build a dataset whose source carried every known column.
    pub fn from_events(events: Vec<EventRecord>) -> Self {
        let columns = REQUIRED_COLUMNS
            .iter()
            .chain(OPTIONAL_COLUMNS.iter())
            .map(|c| c.to_string())
            .collect();
        Self::new(events, columns)
    }

    pub fn load(path: &Path) -> Result<Self, ConflictError> {
        let started = Instant::now();
        let file = File::open(path).map_err(|source| ConflictError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            columns = dataset.columns.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Parse CSV with a header row. The first column is the row index.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConflictError> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers: StringRecord = rdr.headers()?.iter().map(str::trim).collect();
        let columns: Vec<String> = headers.iter().map(str::to_string).collect();

        for required in REQUIRED_COLUMNS {
            if !columns.iter().any(|c| c == required) {
                return Err(ConflictError::MissingColumn(required.to_string()));
            }
        }
        for optional in OPTIONAL_COLUMNS {
            if !columns.iter().any(|c| c == optional) {
                debug!(column = optional, "Optional column absent from dataset");
            }
        }

        let mut events = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let row = i + 1;
            let record = record?;
            let raw: RawEvent = record
                .deserialize(Some(&headers))
                .map_err(|e| ConflictError::InvalidRow {
                    row,
                    reason: e.to_string(),
                })?;
            let event_date =
                parse_event_date(&raw.event_date).ok_or_else(|| ConflictError::InvalidRow {
                    row,
                    reason: format!("unparseable event_date {:?}", raw.event_date),
                })?;
            let index = record
                .get(0)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(i as u64);

            events.push(EventRecord {
                index,
                event_date,
                event_type: raw.event_type,
                sub_event_type: raw.sub_event_type,
                interaction: raw.interaction,
                region: raw.region,
                country: raw.country,
                latitude: raw.latitude,
                longitude: raw.longitude,
                population_best: raw.population_best,
                fatalities: raw.fatalities,
                cluster: raw.cluster,
                severity: categorize(raw.fatalities),
            });
        }

        Ok(Self::new(events, columns))
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// The most frequent clusters over the whole table, computed at load.
    pub fn top_clusters(&self) -> &[ClusterId] {
        &self.top_clusters
    }

    /// Sorted distinct event types, empty values dropped.
    pub fn event_types(&self) -> Vec<String> {
        distinct(self.events.iter().map(|e| e.event_type.as_str()))
    }

    /// Sorted distinct regions, empty values dropped.
    pub fn regions(&self) -> Vec<String> {
        distinct(self.events.iter().map(|e| e.region.as_str()))
    }

    /// `(min_year, max_year)` over all event dates.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let mut years = self.events.iter().map(EventRecord::year);
        let first = years.next()?;
        Some(years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y))))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and RFC 3339 timestamps.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
}

/// Load-once handle to the dataset file.
///
/// The first successful `get_or_load` reads the file; later calls return the
/// same `Arc` without touching disk. A failed load leaves the cache empty.
pub struct DatasetCache {
    path: PathBuf,
    slot: Mutex<Option<Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            slot: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn get_or_load(&self) -> Result<Arc<Dataset>, ConflictError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dataset) = slot.as_ref() {
            return Ok(Arc::clone(dataset));
        }
        let dataset = Arc::new(Dataset::load(&self.path)?);
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeverityCategory;

    const HEADER: &str = ",event_date,event_type,sub_event_type,interaction,region,country,latitude,longitude,population_best,fatalities,cluster";

    fn csv(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn parses_rows_and_derives_severity() {
        let data = csv(&[
            "10,2019-03-02,Battles,Armed clash,13,Middle East,Syria,35.1,36.7,1200.0,12,4",
            "11,2021-07-15,Riots,Mob violence,55,Africa,Nigeria,9.0,8.6,,0,-1",
        ]);
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);

        let first = &dataset.events()[0];
        assert_eq!(first.index, 10);
        assert_eq!(first.event_date, NaiveDate::from_ymd_opt(2019, 3, 2).unwrap());
        assert_eq!(first.interaction.as_deref(), Some("13"));
        assert_eq!(first.severity, SeverityCategory::High);

        let second = &dataset.events()[1];
        assert_eq!(second.population_best, None);
        assert_eq!(second.cluster, -1);
        assert_eq!(second.severity, SeverityCategory::Low);

        assert_eq!(dataset.year_bounds(), Some((2019, 2021)));
    }

    #[test]
    fn quoted_fields_with_commas_parse() {
        let data = csv(&[
            "0,2020-01-01,\"Violence against civilians\",\"Attack, remote\",27,Asia,\"Korea, South\",37.5,127.0,5000,2,1",
        ]);
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();
        assert_eq!(dataset.events()[0].sub_event_type.as_deref(), Some("Attack, remote"));
        assert_eq!(dataset.events()[0].country.as_deref(), Some("Korea, South"));
    }

    #[test]
    fn missing_required_column_fails() {
        let data = ",event_date,event_type,region,fatalities\n0,2020-01-01,Battles,Asia,3";
        let err = Dataset::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ConflictError::MissingColumn(ref c) if c == "cluster"));
    }

    #[test]
    fn missing_optional_columns_load_as_none() {
        let data = ",event_date,event_type,region,fatalities,cluster\n0,2020-01-01,Battles,Asia,3,2";
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();
        assert!(!dataset.has_column("latitude"));
        assert!(dataset.has_column("cluster"));
        let event = &dataset.events()[0];
        assert_eq!(event.latitude, None);
        assert_eq!(event.country, None);
    }

    #[test]
    fn malformed_date_is_an_invalid_row() {
        let data = csv(&["0,not-a-date,Battles,,,Asia,,,,,3,2"]);
        let err = Dataset::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ConflictError::InvalidRow { row: 1, .. }));
    }

    #[test]
    fn negative_fatalities_are_rejected() {
        let data = csv(&["0,2020-01-01,Battles,,,Asia,,,,,-3,2"]);
        assert!(Dataset::from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn date_formats() {
        let expected = NaiveDate::from_ymd_opt(2022, 11, 5);
        assert_eq!(parse_event_date("2022-11-05"), expected);
        assert_eq!(parse_event_date("2022-11-05 00:00:00"), expected);
        assert_eq!(parse_event_date("2022-11-05T10:00:00+00:00"), expected);
        assert_eq!(parse_event_date("05/11/2022"), None);
    }

    #[test]
    fn sidebar_options_are_sorted_and_distinct() {
        let data = csv(&[
            "0,2020-01-01,Riots,,,Europe,,,,,0,1",
            "1,2020-01-01,Battles,,,Africa,,,,,0,1",
            "2,2020-01-01,Riots,,,Africa,,,,,0,1",
        ]);
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();
        assert_eq!(dataset.event_types(), vec!["Battles", "Riots"]);
        assert_eq!(dataset.regions(), vec!["Africa", "Europe"]);
    }

    #[test]
    fn empty_table_has_no_year_bounds() {
        let dataset = Dataset::from_reader(HEADER.as_bytes()).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.year_bounds(), None);
        assert!(dataset.top_clusters().is_empty());
    }

    #[test]
    fn cache_reports_missing_file() {
        let cache = DatasetCache::new("/definitely/not/here.csv");
        let err = cache.get_or_load().unwrap_err();
        assert!(matches!(err, ConflictError::Io { .. }));
        assert!(!cache.is_loaded());
    }
}
