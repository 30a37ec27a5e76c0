use crate::dataset::Dataset;
use crate::filters::{FilterSelection, FilteredView};
use crate::types::{ClusterId, SeverityColorMap, SEVERITY_COLORS};

/// Everything a page renderer may read during one interaction cycle.
///
/// Built once by the request entry point and handed to the renderer by
/// shared reference, so every section of a page sees the same filtered view.
#[derive(Debug, Clone)]
pub struct FilterState<'a> {
    pub filtered_view: FilteredView<'a>,
    pub selection: FilterSelection,
    pub color_map: SeverityColorMap,
    /// Global top clusters, independent of the current filters.
    pub top_clusters: &'a [ClusterId],
}

impl<'a> FilterState<'a> {
    pub fn build(dataset: &'a Dataset, selection: FilterSelection) -> Self {
        let filtered_view = FilteredView::new(dataset, &selection);
        tracing::debug!(
            rows = filtered_view.len(),
            total = dataset.len(),
            "Filter state built"
        );
        Self {
            filtered_view,
            selection,
            color_map: SEVERITY_COLORS,
            top_clusters: dataset.top_clusters(),
        }
    }

    /// Shown in the sidebar as "Events after filtering".
    pub fn event_count(&self) -> usize {
        self.filtered_view.len()
    }

    /// Top clusters that still have events after filtering, in rank order.
    pub fn available_clusters(&self) -> Vec<ClusterId> {
        self.top_clusters
            .iter()
            .copied()
            .filter(|c| self.filtered_view.contains_cluster(*c))
            .collect()
    }
}
