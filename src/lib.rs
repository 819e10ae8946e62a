//! Period-over-period sales comparison.
//!
//! Takes decoded period exports (prior-year `同期`, prior-period `上期`,
//! current `当期`), folds rows by product identifier and builds one table with
//! each period's amounts and rates side by side, followed by year-over-year
//! and period-over-period deltas. The table can then be enriched with columns
//! from a secondary lookup sheet.
pub mod aggregate;
pub mod compare;
pub mod config;
pub mod error;
pub mod extract;
pub mod loader;
pub mod lookup;
pub mod output;
pub mod period;
pub mod pipeline;
pub mod table;
pub mod types;
pub mod util;

pub use aggregate::aggregate;
pub use error::{ReportError, Result};
pub use extract::extract_fields;
pub use lookup::{apply_lookup, LookupDataset};
pub use period::classify_period;
pub use table::build_comparison_table;
