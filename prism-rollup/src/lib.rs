//! Rollup job capability matching for Prism
//!
//! Rollup jobs store pre-aggregated summaries of raw data at a fixed
//! grouping and granularity. This crate decides whether, and from which
//! rollup job, an aggregation query can be answered.
//!
//! # Planning
//!
//! 1. Every node of the query tree is checked against every job's
//!    capabilities, narrowing a running candidate set ([`matcher`]).
//! 2. The surviving jobs are deduplicated by rollup index and ranked by
//!    date histogram interval, coarsest first ([`selector`]).
//!
//! Matches that are accepted but not exact (e.g. a `1000s` query over `300s`
//! buckets) carry [`CompatibilityWarning`]s in the returned [`RollupPlan`].
//!
//! # Supported aggregations
//!
//! - `date_histogram` (fixed and calendar intervals, time zone)
//! - `histogram`
//! - `terms`
//! - `min` / `max` / `sum` / `avg` / `value_count`
//!
//! ```
//! use prism_rollup::{AggregationTranslator, RollupJobCaps, RollupPlanner};
//!
//! let job = RollupJobCaps::from_json(r#"{
//!     "id": "hourly",
//!     "rollup_index": "metrics_rollup",
//!     "groups": { "date_histogram": { "field": "ts", "interval": "1h" } },
//!     "metrics": [{ "field": "bytes", "metrics": ["max"] }]
//! }"#).unwrap();
//!
//! let roots = AggregationTranslator::translate_json(r#"{
//!     "aggs": {
//!         "per_day": {
//!             "date_histogram": { "field": "ts", "calendar_interval": "day" },
//!             "aggs": { "peak": { "max": { "field": "bytes" } } }
//!         }
//!     }
//! }"#).unwrap();
//!
//! let plan = RollupPlanner::default().plan_all(&roots, [&job]).unwrap();
//! assert_eq!(plan.job().job_id(), "hourly");
//! ```

pub mod caps;
pub mod catalog;
pub mod config;
pub mod error;
pub mod interval;
pub mod matcher;
pub mod planner;
pub mod query;
pub mod selector;

pub use caps::{MetricKind, RollupJobCaps, RollupJobConfig};
pub use catalog::{CatalogSnapshot, RollupCatalog};
pub use config::PlannerConfig;
pub use error::{FailedNode, RollupError};
pub use interval::{CalendarUnit, CompatibilityWarning, Interval, IntervalMatch};
pub use planner::{RollupPlan, RollupPlanner};
pub use query::{AggregationKind, AggregationNode, AggregationTranslator};

/// Result type for rollup operations
pub type Result<T> = std::result::Result<T, RollupError>;
