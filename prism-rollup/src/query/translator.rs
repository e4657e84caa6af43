//! Aggregation DSL translator from Elasticsearch format to rollup query trees

use crate::caps::MetricKind;
use crate::error::RollupError;
use crate::interval::{CalendarUnit, Interval};
use crate::query::node::{AggregationKind, AggregationNode};
use crate::query::types::*;
use crate::Result;

/// Translates Elasticsearch aggregations into [`AggregationNode`] trees
pub struct AggregationTranslator;

impl AggregationTranslator {
    /// Parse a JSON search body (`{"aggs": {...}}`) and translate its aggregations
    pub fn translate_json(body: &str) -> Result<Vec<AggregationNode>> {
        let request: EsAggregationRequest = serde_json::from_str(body)?;
        match &request.aggs {
            Some(aggs) if !aggs.is_empty() => Self::translate_aggregations(aggs),
            _ => Err(RollupError::InvalidAggregation(
                "rollup search requires at least one aggregation".to_string(),
            )),
        }
    }

    /// Translate named aggregations; roots come back in name order
    pub fn translate_aggregations(aggs: &EsAggregations) -> Result<Vec<AggregationNode>> {
        aggs.iter()
            .map(|(name, agg)| Self::translate_single_aggregation(name, agg))
            .collect()
    }

    fn translate_single_aggregation(name: &str, agg: &EsAggregation) -> Result<AggregationNode> {
        if let Some(agg_type) = agg.other.keys().next() {
            return Err(RollupError::UnsupportedAggregation(format!(
                "aggregation [{}] is of type [{}] which is currently unsupported",
                name, agg_type
            )));
        }
        if agg.meta.as_ref().is_some_and(|meta| !meta.is_object()) {
            return Err(RollupError::InvalidAggregation(format!(
                "aggregation [{}] meta must be an object",
                name
            )));
        }

        let mut kinds = Vec::with_capacity(1);

        let metrics = [
            (&agg.avg, MetricKind::Avg),
            (&agg.sum, MetricKind::Sum),
            (&agg.min, MetricKind::Min),
            (&agg.max, MetricKind::Max),
            (&agg.value_count, MetricKind::ValueCount),
        ];
        for (field_agg, metric) in metrics {
            if let Some(f) = field_agg {
                kinds.push(AggregationKind::Metric {
                    field: f.field.clone(),
                    metric,
                });
            }
        }

        if let Some(terms) = &agg.terms {
            kinds.push(AggregationKind::Terms {
                field: terms.field.clone(),
            });
        }

        if let Some(histogram) = &agg.histogram {
            kinds.push(AggregationKind::Histogram {
                field: histogram.field.clone(),
                interval: Self::histogram_interval(name, histogram.interval)?,
            });
        }

        if let Some(date_histogram) = &agg.date_histogram {
            kinds.push(AggregationKind::DateHistogram {
                field: date_histogram.field.clone(),
                interval: Self::date_histogram_interval(name, date_histogram)?,
                time_zone: date_histogram.time_zone.clone(),
            });
        }

        if kinds.len() > 1 {
            return Err(RollupError::InvalidAggregation(format!(
                "aggregation [{}] defines more than one type",
                name
            )));
        }
        let kind = kinds.pop().ok_or_else(|| {
            RollupError::InvalidAggregation(format!("aggregation [{}] has no type", name))
        })?;

        let children = match &agg.aggs {
            Some(sub_aggs) => Self::translate_aggregations(sub_aggs)?,
            None => vec![],
        };

        Ok(AggregationNode::new(name, kind)?.with_sub_aggregations(children))
    }

    fn histogram_interval(name: &str, interval: f64) -> Result<u64> {
        if interval >= 1.0 && interval.fract() == 0.0 && interval <= u64::MAX as f64 {
            Ok(interval as u64)
        } else {
            Err(RollupError::InvalidAggregation(format!(
                "histogram [{}] interval [{}] must be a positive whole number",
                name, interval
            )))
        }
    }

    fn date_histogram_interval(name: &str, agg: &DateHistogramAgg) -> Result<Interval> {
        match (&agg.calendar_interval, &agg.fixed_interval, &agg.interval) {
            (Some(calendar), None, None) => CalendarUnit::parse_interval(calendar)
                .map(Interval::Calendar)
                .ok_or_else(|| {
                    RollupError::InvalidAggregation(format!(
                        "date_histogram [{}] calendar_interval [{}] is not a calendar unit",
                        name, calendar
                    ))
                }),
            (None, Some(fixed), None) => Interval::classify_fixed(fixed),
            (None, None, Some(LegacyInterval::Expression(expr))) => Interval::classify(expr),
            (None, None, Some(LegacyInterval::Millis(millis))) => Interval::fixed(*millis),
            (None, None, None) => Err(RollupError::InvalidAggregation(format!(
                "date_histogram [{}] requires an interval",
                name
            ))),
            _ => Err(RollupError::InvalidAggregation(format!(
                "date_histogram [{}] must set only one of calendar_interval, fixed_interval or interval",
                name
            ))),
        }
    }
}
