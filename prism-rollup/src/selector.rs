//! Best-job selection
//!
//! Picks the single rollup job to search among those that answered the
//! whole aggregation tree. Coarser date histograms win since they hold
//! fewer documents for the same time range.

use crate::caps::RollupJobCaps;
use crate::interval::Interval;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Nominal date histogram interval of a job, 0 when it has none
fn resolution(caps: &RollupJobCaps) -> u64 {
    caps.date_histogram()
        .map(|dh| dh.interval.nominal_millis())
        .unwrap_or(0)
}

/// Ranking order: coarsest date histogram first, then job id ascending
pub fn compare_by_resolution(a: &RollupJobCaps, b: &RollupJobCaps) -> Ordering {
    resolution(b)
        .cmp(&resolution(a))
        .then_with(|| a.job_id().cmp(b.job_id()))
}

/// Rank `candidates` and keep the best job of each rollup index
pub fn dedupe_by_index<'a>(candidates: &[&'a RollupJobCaps]) -> Vec<&'a RollupJobCaps> {
    let mut ranked = candidates.to_vec();
    ranked.sort_by(|a, b| compare_by_resolution(a, b));

    let mut seen = BTreeSet::new();
    ranked.retain(|&caps| seen.insert(caps.rollup_index()));
    ranked
}

/// Select the best job for a query whose date histogram requests
/// `requested`, or `None` if nothing qualifies.
///
/// Candidates coarser than the requested interval are dropped. Without a
/// requested interval the pick falls back to the lowest job id among the
/// coarsest jobs.
pub fn select_best<'a>(
    candidates: &[&'a RollupJobCaps],
    requested: Option<Interval>,
) -> Option<&'a RollupJobCaps> {
    let eligible: Vec<&'a RollupJobCaps> = match requested {
        Some(interval) => {
            let limit = interval.nominal_millis();
            candidates
                .iter()
                .copied()
                .filter(|caps| {
                    let keep = resolution(caps) <= limit;
                    if !keep {
                        tracing::debug!(
                            "Dropping rollup job '{}': interval coarser than requested [{}]",
                            caps.job_id(),
                            interval
                        );
                    }
                    keep
                })
                .collect()
        }
        None => candidates.to_vec(),
    };

    let ranked = dedupe_by_index(&eligible);
    if ranked.len() < eligible.len() {
        tracing::debug!(
            "Deduplicated {} rollup candidates to {} indices",
            eligible.len(),
            ranked.len()
        );
    }

    let best = ranked.first().copied();
    if let Some(caps) = best {
        tracing::debug!(
            "Selected rollup job '{}' on index '{}' out of {} candidates",
            caps.job_id(),
            caps.rollup_index(),
            candidates.len()
        );
    }
    best
}
