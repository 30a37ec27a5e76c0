use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Cluster label assigned by the offline model. DBSCAN noise is `-1`.
pub type ClusterId = i64;

// --- Severity ---

/// Fatality-count bucket. Ordering follows severity, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeverityCategory {
    #[serde(rename = "Low (0-3)")]
    Low,
    #[serde(rename = "Moderate (4-10)")]
    Moderate,
    #[serde(rename = "High (11-50)")]
    High,
    #[serde(rename = "Extreme (50+)")]
    Extreme,
}

impl SeverityCategory {
    pub const ALL: [SeverityCategory; 4] = [
        SeverityCategory::Low,
        SeverityCategory::Moderate,
        SeverityCategory::High,
        SeverityCategory::Extreme,
    ];

    /// Display label, also used as the filter value on the wire.
    pub fn label(self) -> &'static str {
        match self {
            SeverityCategory::Low => "Low (0-3)",
            SeverityCategory::Moderate => "Moderate (4-10)",
            SeverityCategory::High => "High (11-50)",
            SeverityCategory::Extreme => "Extreme (50+)",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label.trim())
    }
}

impl fmt::Display for SeverityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed category → display color mapping, in severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityColorMap {
    entries: [(SeverityCategory, &'static str); 4],
}

pub const SEVERITY_COLORS: SeverityColorMap = SeverityColorMap {
    entries: [
        (SeverityCategory::Low, "#91cfff"),
        (SeverityCategory::Moderate, "#36a2eb"),
        (SeverityCategory::High, "#ff6384"),
        (SeverityCategory::Extreme, "#8b0000"),
    ],
};

impl SeverityColorMap {
    pub fn color(&self, category: SeverityCategory) -> &'static str {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, color)| *color)
            .unwrap_or("#999999")
    }

    pub fn categories(&self) -> impl Iterator<Item = SeverityCategory> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SeverityCategory, &'static str)> + '_ {
        self.entries.iter().copied()
    }
}

impl Default for SeverityColorMap {
    fn default() -> Self {
        SEVERITY_COLORS
    }
}

// --- Event ---

/// One conflict event as loaded from the clustered dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    /// Value of the file's row-index column.
    pub index: u64,
    pub event_date: NaiveDate,
    pub event_type: String,
    pub sub_event_type: Option<String>,
    pub interaction: Option<String>,
    pub region: String,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Best population estimate around the event location.
    pub population_best: Option<f64>,
    pub fatalities: u32,
    pub cluster: ClusterId,
    /// Derived from `fatalities` at load time.
    pub severity: SeverityCategory,
}

impl EventRecord {
    pub fn year(&self) -> i32 {
        self.event_date.year()
    }

    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
            _ => None,
        }
    }
}
