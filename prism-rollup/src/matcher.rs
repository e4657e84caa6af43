//! Aggregation tree matching
//!
//! Walks the query tree in pre-order and narrows the set of rollup jobs to
//! those that can answer every node. The first node that leaves no job
//! standing is reported in the error.

use crate::caps::RollupJobCaps;
use crate::config::PlannerConfig;
use crate::error::{FailedNode, RollupError};
use crate::interval::{CompatibilityWarning, IntervalMatch};
use crate::query::{AggregationKind, AggregationNode};
use crate::Result;

/// A job that survived matching, with the warnings its own matches produced
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub caps: &'a RollupJobCaps,
    pub warnings: Vec<CompatibilityWarning>,
}

/// Jobs able to answer the whole tree
#[derive(Debug, Clone)]
pub struct MatchOutcome<'a> {
    /// Surviving jobs, in catalog order
    pub candidates: Vec<Candidate<'a>>,
    /// Every warning raised by an accepted node check, whether or not the
    /// job survived later nodes; deduplicated, in first-seen order
    pub warnings: Vec<CompatibilityWarning>,
}

impl<'a> MatchOutcome<'a> {
    pub fn jobs(&self) -> impl Iterator<Item = &'a RollupJobCaps> + '_ {
        self.candidates.iter().map(|c| c.caps)
    }
}

fn push_unique(warnings: &mut Vec<CompatibilityWarning>, warning: CompatibilityWarning) {
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}

/// Filters rollup jobs against an aggregation tree
pub struct MatchEngine<'c> {
    config: &'c PlannerConfig,
}

impl<'c> MatchEngine<'c> {
    pub fn new(config: &'c PlannerConfig) -> Self {
        Self { config }
    }

    /// Match sibling root aggregations against `jobs`.
    ///
    /// Nodes are visited root by root, each in pre-order. Every node is
    /// checked against all of `jobs`; the running candidate set is the
    /// intersection of the per-node candidate sets.
    pub fn find_candidates<'a>(
        &self,
        roots: &[AggregationNode],
        jobs: impl IntoIterator<Item = &'a RollupJobCaps>,
    ) -> Result<MatchOutcome<'a>> {
        if roots.is_empty() {
            return Err(RollupError::InvalidAggregation(
                "rollup search requires at least one aggregation".to_string(),
            ));
        }

        let jobs: Vec<&'a RollupJobCaps> = jobs.into_iter().collect();
        let mut alive = vec![true; jobs.len()];
        let mut job_warnings: Vec<Vec<CompatibilityWarning>> = vec![Vec::new(); jobs.len()];
        let mut warnings = Vec::new();

        for node in roots.iter().flat_map(|root| root.iter()) {
            let mut node_candidates = 0;
            for (i, caps) in jobs.iter().enumerate() {
                let Some(found) = self.node_matches(node, caps) else {
                    alive[i] = false;
                    continue;
                };
                node_candidates += 1;
                for warning in found {
                    push_unique(&mut warnings, warning);
                    if alive[i] {
                        push_unique(&mut job_warnings[i], warning);
                    }
                }
            }

            let remaining = alive.iter().filter(|a| **a).count();
            tracing::trace!(
                "Rollup match on [{}] '{}': {} of {} jobs match, {} remain",
                node.kind().type_name(),
                node.name(),
                node_candidates,
                jobs.len(),
                remaining
            );

            if remaining == 0 {
                return Err(RollupError::NoMatchingJob {
                    node: failed_node(node),
                });
            }
        }

        for warning in &warnings {
            tracing::debug!("Rollup interval compatibility warning: {}", warning);
        }

        let candidates = jobs
            .into_iter()
            .zip(alive)
            .zip(job_warnings)
            .filter(|((_, alive), _)| *alive)
            .map(|((caps, _), warnings)| Candidate { caps, warnings })
            .collect();

        Ok(MatchOutcome {
            candidates,
            warnings,
        })
    }

    /// `Some(warnings)` if `caps` can answer `node`, `None` otherwise
    fn node_matches(
        &self,
        node: &AggregationNode,
        caps: &RollupJobCaps,
    ) -> Option<Vec<CompatibilityWarning>> {
        match node.kind() {
            AggregationKind::DateHistogram {
                field,
                interval,
                time_zone,
            } => {
                let time_zone = time_zone
                    .as_deref()
                    .unwrap_or(&self.config.default_time_zone);
                self.accept(caps.matches_date_histogram(field, *interval, time_zone))
            }
            AggregationKind::Histogram { field, interval } => {
                self.accept(caps.matches_histogram(field, *interval))
            }
            AggregationKind::Terms { field } => caps.matches_terms(field).then(Vec::new),
            AggregationKind::Metric { field, metric } => {
                caps.matches_metric(field, *metric).then(Vec::new)
            }
        }
    }

    fn accept(&self, interval_match: IntervalMatch) -> Option<Vec<CompatibilityWarning>> {
        match interval_match {
            IntervalMatch::NoMatch => None,
            IntervalMatch::Match { warnings } => {
                if self.config.strict_intervals && !warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                }
            }
        }
    }
}

pub(crate) fn failed_node(node: &AggregationNode) -> FailedNode {
    match node.kind() {
        AggregationKind::Metric { metric, .. } => FailedNode::Metric {
            metric: metric.to_string(),
            name: node.name().to_string(),
        },
        kind => FailedNode::Bucket {
            kind: kind.type_name(),
            field: kind.field().to_string(),
        },
    }
}
