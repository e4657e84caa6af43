//! Aggregation tree as seen by the rollup planner

use crate::caps::MetricKind;
use crate::error::RollupError;
use crate::interval::Interval;
use crate::Result;

/// What a node aggregates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationKind {
    DateHistogram {
        field: String,
        interval: Interval,
        /// `None` means the planner's default time zone
        time_zone: Option<String>,
    },
    Histogram {
        field: String,
        interval: u64,
    },
    Terms {
        field: String,
    },
    Metric {
        field: String,
        metric: MetricKind,
    },
}

impl AggregationKind {
    /// Aggregation type name as used in query DSL and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            AggregationKind::DateHistogram { .. } => "date_histogram",
            AggregationKind::Histogram { .. } => "histogram",
            AggregationKind::Terms { .. } => "terms",
            AggregationKind::Metric { metric, .. } => metric.as_str(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            AggregationKind::DateHistogram { field, .. }
            | AggregationKind::Histogram { field, .. }
            | AggregationKind::Terms { field }
            | AggregationKind::Metric { field, .. } => field,
        }
    }
}

/// A named aggregation with its sub-aggregations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationNode {
    name: String,
    kind: AggregationKind,
    children: Vec<AggregationNode>,
}

impl AggregationNode {
    pub fn new(name: impl Into<String>, kind: AggregationKind) -> Result<Self> {
        if let AggregationKind::Histogram { interval: 0, field } = &kind {
            return Err(RollupError::InvalidAggregation(format!(
                "histogram interval on field [{}] must be > 0",
                field
            )));
        }
        Ok(Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        })
    }

    /// Date histogram with an interval expression (`1h`, `month`, `90m`, ...)
    pub fn date_histogram(
        name: impl Into<String>,
        field: impl Into<String>,
        interval: &str,
    ) -> Result<Self> {
        Self::new(
            name,
            AggregationKind::DateHistogram {
                field: field.into(),
                interval: Interval::classify(interval)?,
                time_zone: None,
            },
        )
    }

    /// Date histogram with a raw fixed interval in milliseconds
    pub fn date_histogram_millis(
        name: impl Into<String>,
        field: impl Into<String>,
        millis: u64,
    ) -> Result<Self> {
        Self::new(
            name,
            AggregationKind::DateHistogram {
                field: field.into(),
                interval: Interval::fixed(millis)?,
                time_zone: None,
            },
        )
    }

    pub fn histogram(
        name: impl Into<String>,
        field: impl Into<String>,
        interval: u64,
    ) -> Result<Self> {
        Self::new(
            name,
            AggregationKind::Histogram {
                field: field.into(),
                interval,
            },
        )
    }

    pub fn terms(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AggregationKind::Terms {
                field: field.into(),
            },
            children: Vec::new(),
        }
    }

    pub fn metric(name: impl Into<String>, field: impl Into<String>, metric: MetricKind) -> Self {
        Self {
            name: name.into(),
            kind: AggregationKind::Metric {
                field: field.into(),
                metric,
            },
            children: Vec::new(),
        }
    }

    /// Set the time zone of a date histogram; other kinds are returned unchanged
    pub fn with_time_zone(mut self, tz: impl Into<String>) -> Self {
        if let AggregationKind::DateHistogram { time_zone, .. } = &mut self.kind {
            *time_zone = Some(tz.into());
        }
        self
    }

    pub fn with_sub_aggregation(mut self, child: AggregationNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_sub_aggregations(mut self, children: impl IntoIterator<Item = AggregationNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AggregationKind {
        &self.kind
    }

    pub fn children(&self) -> &[AggregationNode] {
        &self.children
    }

    /// Pre-order iterator: parent first, children left to right
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// First date histogram in pre-order, if any
    pub fn find_date_histogram(&self) -> Option<&AggregationNode> {
        self.iter()
            .find(|n| matches!(n.kind, AggregationKind::DateHistogram { .. }))
    }
}

/// Pre-order walk over an aggregation tree
pub struct PreOrder<'a> {
    stack: Vec<&'a AggregationNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a AggregationNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
