//! Elasticsearch aggregation DSL types
//!
//! The subset of the aggregation DSL that rollup data can answer. Any other
//! aggregation type is captured in [`EsAggregation::other`] so the translator
//! can reject it by name.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named aggregations, iterated in name order
pub type EsAggregations = BTreeMap<String, EsAggregation>;

/// Search body carrying aggregations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EsAggregationRequest {
    #[serde(default, alias = "aggregations")]
    pub aggs: Option<EsAggregations>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EsAggregation {
    // Metric aggregations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<FieldAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<FieldAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<FieldAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<FieldAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_count: Option<FieldAgg>,

    // Bucket aggregations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<TermsAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram: Option<HistogramAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_histogram: Option<DateHistogramAgg>,

    // Nested aggregations
    #[serde(default, alias = "aggregations", skip_serializing_if = "Option::is_none")]
    pub aggs: Option<EsAggregations>,

    /// Opaque metadata echoed back in responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    /// Aggregation types rollup search cannot serve
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldAgg {
    pub field: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TermsAgg {
    pub field: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistogramAgg {
    pub field: String,
    pub interval: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DateHistogramAgg {
    pub field: String,
    #[serde(default)]
    pub calendar_interval: Option<String>,
    #[serde(default)]
    pub fixed_interval: Option<String>,
    /// Pre-7.2 interval: an expression or a raw number of milliseconds
    #[serde(default)]
    pub interval: Option<LegacyInterval>,
    #[serde(default)]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LegacyInterval {
    Millis(u64),
    Expression(String),
}
