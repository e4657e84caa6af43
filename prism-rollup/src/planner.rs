//! Rollup search planning
//!
//! Combines tree matching and best-job selection: given the aggregations of
//! a search and the available rollup jobs, decide which job to search and
//! which compatibility warnings to report.

use crate::caps::RollupJobCaps;
use crate::catalog::CatalogSnapshot;
use crate::config::PlannerConfig;
use crate::error::RollupError;
use crate::interval::{CompatibilityWarning, Interval};
use crate::matcher::{failed_node, MatchEngine};
use crate::query::{AggregationKind, AggregationNode};
use crate::selector;
use crate::Result;

/// Job chosen to answer a rollup search
#[derive(Debug, Clone, PartialEq)]
pub struct RollupPlan<'a> {
    job: &'a RollupJobCaps,
    warnings: Vec<CompatibilityWarning>,
}

impl<'a> RollupPlan<'a> {
    /// The job to search
    pub fn job(&self) -> &'a RollupJobCaps {
        self.job
    }

    /// Jobs to search; always exactly one
    pub fn jobs(&self) -> &[&'a RollupJobCaps] {
        std::slice::from_ref(&self.job)
    }

    pub fn warnings(&self) -> &[CompatibilityWarning] {
        &self.warnings
    }

    pub fn warning_messages(&self) -> Vec<&'static str> {
        self.warnings.iter().map(|w| w.message()).collect()
    }
}

/// Stateless rollup planner
#[derive(Debug, Clone, Default)]
pub struct RollupPlanner {
    config: PlannerConfig,
}

impl RollupPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan a search with a single root aggregation
    pub fn plan<'a>(
        &self,
        root: &AggregationNode,
        jobs: impl IntoIterator<Item = &'a RollupJobCaps>,
    ) -> Result<RollupPlan<'a>> {
        self.plan_all(std::slice::from_ref(root), jobs)
    }

    /// Plan a search whose root aggregations are siblings
    pub fn plan_all<'a>(
        &self,
        roots: &[AggregationNode],
        jobs: impl IntoIterator<Item = &'a RollupJobCaps>,
    ) -> Result<RollupPlan<'a>> {
        let outcome = MatchEngine::new(&self.config).find_candidates(roots, jobs)?;
        let candidates: Vec<&'a RollupJobCaps> = outcome.jobs().collect();

        let date_histogram = roots.iter().find_map(|root| root.find_date_histogram());
        let requested = date_histogram.and_then(date_histogram_interval);

        let job = selector::select_best(&candidates, requested).ok_or_else(|| {
            match date_histogram {
                Some(node) => RollupError::NoMatchingJob {
                    node: failed_node(node),
                },
                None => RollupError::InvalidAggregation(
                    "no rollup job candidates to select from".to_string(),
                ),
            }
        })?;

        Ok(RollupPlan {
            job,
            warnings: outcome.warnings,
        })
    }

    /// Plan against a published catalog snapshot
    pub fn plan_snapshot<'s>(
        &self,
        roots: &[AggregationNode],
        snapshot: &'s CatalogSnapshot,
    ) -> Result<RollupPlan<'s>> {
        self.plan_all(roots, snapshot.jobs())
    }
}

fn date_histogram_interval(node: &AggregationNode) -> Option<Interval> {
    match node.kind() {
        AggregationKind::DateHistogram { interval, .. } => Some(*interval),
        _ => None,
    }
}
