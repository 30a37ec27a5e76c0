// Fixtures for building events and datasets in tests.

use chrono::NaiveDate;

use crate::dataset::Dataset;
use crate::derive::categorize;
use crate::types::{ClusterId, EventRecord};

/// An event with neutral defaults for every column not given.
/// `date` is `YYYY-MM-DD`; panics on anything else.
pub fn event(index: u64, date: &str, cluster: ClusterId, fatalities: u32) -> EventRecord {
    event_in(index, date, cluster, fatalities, "Battles", "Middle East")
}

pub fn event_in(
    index: u64,
    date: &str,
    cluster: ClusterId,
    fatalities: u32,
    event_type: &str,
    region: &str,
) -> EventRecord {
    EventRecord {
        index,
        event_date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("bad fixture date {date:?}")),
        event_type: event_type.to_string(),
        sub_event_type: Some("Armed clash".to_string()),
        interaction: Some("12".to_string()),
        region: region.to_string(),
        country: Some("Syria".to_string()),
        latitude: Some(35.0),
        longitude: Some(38.0),
        population_best: Some(1000.0),
        fatalities,
        cluster,
        severity: categorize(fatalities),
    }
}

pub fn dataset(events: Vec<EventRecord>) -> Dataset {
    Dataset::from_events(events)
}

/// A small CSV in the on-disk layout, index column first.
pub const SAMPLE_CSV: &str = "\
,event_date,event_type,sub_event_type,interaction,region,country,latitude,longitude,population_best,fatalities,cluster
0,2018-02-11,Battles,Armed clash,12,Middle East,Syria,35.93,36.63,15000.0,14,3
1,2018-07-30,Explosions/Remote violence,Air/drone strike,18,Middle East,Syria,36.2,37.1,220000.0,60,3
2,2019-04-02,Riots,Mob violence,55,Africa,Nigeria,9.06,7.49,3100.0,2,5
3,2020-10-19,Protests,Peaceful protest,60,Europe,France,48.85,2.35,,0,-1
4,2021-01-05,Battles,Armed clash,12,Africa,Sudan,13.1,30.2,800.0,7,5
5,2022-06-12,Violence against civilians,Attack,27,Africa,Sudan,12.9,30.0,650.0,51,3
";
