pub mod config;
pub mod dataset;
pub mod derive;
pub mod error;
pub mod filters;
pub mod pareto;
pub mod state;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod types;

pub use config::Config;
pub use dataset::{Dataset, DatasetCache};
pub use derive::{categorize, top_n_clusters, TOP_CLUSTER_COUNT};
pub use error::ConflictError;
pub use filters::{apply_filters, FilterSelection, FilteredView, YearRange};
pub use state::FilterState;
pub use types::*;
