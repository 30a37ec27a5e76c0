//! Fields derived from the raw event columns.

use std::collections::HashMap;

use crate::types::{ClusterId, EventRecord, SeverityCategory};

/// Size of the cluster list offered by the sidebar filter.
pub const TOP_CLUSTER_COUNT: usize = 15;

/// Bucket a fatality count. Lower bounds are inclusive: 0-3, 4-10, 11-50, 51+.
pub fn categorize(fatalities: u32) -> SeverityCategory {
    match fatalities {
        0..=3 => SeverityCategory::Low,
        4..=10 => SeverityCategory::Moderate,
        11..=50 => SeverityCategory::High,
        _ => SeverityCategory::Extreme,
    }
}

/// The `n` cluster ids with the most events, most frequent first.
///
/// Equal counts keep the order in which each cluster first appears in `rows`.
pub fn top_n_clusters<'a, I>(rows: I, n: usize) -> Vec<ClusterId>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let mut slot: HashMap<ClusterId, usize> = HashMap::new();
    let mut counts: Vec<(ClusterId, usize)> = Vec::new();

    for event in rows {
        match slot.get(&event.cluster) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slot.insert(event.cluster, counts.len());
                counts.push((event.cluster, 1));
            }
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(n).map(|(id, _)| id).collect()
}
