//! Rollup job capabilities
//!
//! A [`RollupJobCaps`] is the matchable surface of one rollup job: which
//! fields it groups on, at which intervals, and which metrics it stores.
//! It is built once from a [`RollupJobConfig`] and never mutated.

use crate::error::RollupError;
use crate::interval::{check_date_interval, fixed_compatible, Interval, IntervalMatch};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Time zone assumed when neither side names one
pub const DEFAULT_TIME_ZONE: &str = "UTC";

/// Metric kinds a rollup job can store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Min,
    Max,
    Sum,
    Avg,
    ValueCount,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Min => "min",
            MetricKind::Max => "max",
            MetricKind::Sum => "sum",
            MetricKind::Avg => "avg",
            MetricKind::ValueCount => "value_count",
        }
    }
}

impl FromStr for MetricKind {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "min" => Ok(MetricKind::Min),
            "max" => Ok(MetricKind::Max),
            "sum" => Ok(MetricKind::Sum),
            "avg" => Ok(MetricKind::Avg),
            "value_count" => Ok(MetricKind::ValueCount),
            other => Err(RollupError::InvalidJobConfig(format!(
                "unsupported metric [{}]",
                other
            ))),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job configuration (as stored by the job management layer)
// ---------------------------------------------------------------------------

/// Rollup job configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RollupJobConfig {
    pub id: String,
    pub rollup_index: String,
    #[serde(default)]
    pub groups: GroupConfig,
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GroupConfig {
    #[serde(default)]
    pub date_histogram: Option<DateHistogramGroupConfig>,
    #[serde(default)]
    pub histogram: Option<HistogramGroupConfig>,
    #[serde(default)]
    pub terms: Option<TermsGroupConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DateHistogramGroupConfig {
    pub field: String,
    pub interval: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistogramGroupConfig {
    pub fields: Vec<String>,
    pub interval: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TermsGroupConfig {
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricConfig {
    pub field: String,
    pub metrics: Vec<String>,
}

impl RollupJobConfig {
    /// Parse a job configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateHistogramCaps {
    pub field: String,
    pub interval: Interval,
    pub time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramCaps {
    pub fields: BTreeSet<String>,
    pub interval: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsCaps {
    pub fields: BTreeSet<String>,
}

/// The matchable surface of a single rollup job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupJobCaps {
    job_id: String,
    rollup_index: String,
    date_histogram: Option<DateHistogramCaps>,
    histogram: Option<HistogramCaps>,
    terms: Option<TermsCaps>,
    metrics: BTreeMap<String, BTreeSet<MetricKind>>,
}

impl RollupJobCaps {
    /// Validate a job configuration and derive its capabilities
    pub fn from_config(config: &RollupJobConfig) -> Result<Self> {
        if config.id.trim().is_empty() {
            return Err(RollupError::InvalidJobConfig("id must be set".to_string()));
        }
        if config.rollup_index.trim().is_empty() {
            return Err(RollupError::InvalidJobConfig(format!(
                "rollup_index must be set for job [{}]",
                config.id
            )));
        }

        let date_histogram = match &config.groups.date_histogram {
            Some(dh) => Some(DateHistogramCaps {
                field: dh.field.clone(),
                interval: Interval::classify(&dh.interval)?,
                time_zone: dh.time_zone.clone(),
            }),
            None => None,
        };

        let histogram = match &config.groups.histogram {
            Some(h) => {
                if h.interval == 0 {
                    return Err(RollupError::InvalidJobConfig(format!(
                        "histogram interval must be > 0 for job [{}]",
                        config.id
                    )));
                }
                Some(HistogramCaps {
                    fields: h.fields.iter().cloned().collect(),
                    interval: h.interval,
                })
            }
            None => None,
        };

        let terms = config.groups.terms.as_ref().map(|t| TermsCaps {
            fields: t.fields.iter().cloned().collect(),
        });

        let mut metrics: BTreeMap<String, BTreeSet<MetricKind>> = BTreeMap::new();
        for metric in &config.metrics {
            let kinds = metrics.entry(metric.field.clone()).or_default();
            for name in &metric.metrics {
                kinds.insert(name.parse()?);
            }
        }

        Ok(Self {
            job_id: config.id.clone(),
            rollup_index: config.rollup_index.clone(),
            date_histogram,
            histogram,
            terms,
            metrics,
        })
    }

    /// Parse and validate a job configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_config(&RollupJobConfig::from_json(json)?)
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn rollup_index(&self) -> &str {
        &self.rollup_index
    }

    pub fn date_histogram(&self) -> Option<&DateHistogramCaps> {
        self.date_histogram.as_ref()
    }

    pub fn histogram(&self) -> Option<&HistogramCaps> {
        self.histogram.as_ref()
    }

    pub fn terms(&self) -> Option<&TermsCaps> {
        self.terms.as_ref()
    }

    pub fn metrics(&self) -> &BTreeMap<String, BTreeSet<MetricKind>> {
        &self.metrics
    }

    /// Can this job answer a date histogram on `field` at `interval` in `time_zone`?
    pub fn matches_date_histogram(
        &self,
        field: &str,
        interval: Interval,
        time_zone: &str,
    ) -> IntervalMatch {
        match &self.date_histogram {
            Some(dh) if dh.field == field && dh.time_zone == time_zone => {
                check_date_interval(interval, dh.interval)
            }
            _ => IntervalMatch::NoMatch,
        }
    }

    /// Can this job answer a numeric histogram on `field` at `interval`?
    pub fn matches_histogram(&self, field: &str, interval: u64) -> IntervalMatch {
        match &self.histogram {
            Some(h) if h.fields.contains(field) => {
                IntervalMatch::from_compatibility(fixed_compatible(interval, h.interval), false)
            }
            _ => IntervalMatch::NoMatch,
        }
    }

    pub fn matches_terms(&self, field: &str) -> bool {
        self.terms
            .as_ref()
            .is_some_and(|t| t.fields.contains(field))
    }

    pub fn matches_metric(&self, field: &str, kind: MetricKind) -> bool {
        self.metrics
            .get(field)
            .is_some_and(|kinds| kinds.contains(&kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::{CalendarUnit, CompatibilityWarning};

    fn job(interval: &str) -> RollupJobConfig {
        RollupJobConfig {
            id: "foo".to_string(),
            rollup_index: "foo_rollup".to_string(),
            groups: GroupConfig {
                date_histogram: Some(DateHistogramGroupConfig {
                    field: "ts".to_string(),
                    interval: interval.to_string(),
                    time_zone: "UTC".to_string(),
                }),
                histogram: Some(HistogramGroupConfig {
                    fields: vec!["bytes".to_string()],
                    interval: 3,
                }),
                terms: Some(TermsGroupConfig {
                    fields: vec!["host".to_string()],
                }),
            },
            metrics: vec![
                MetricConfig {
                    field: "bytes".to_string(),
                    metrics: vec!["max".to_string()],
                },
                MetricConfig {
                    field: "bytes".to_string(),
                    metrics: vec!["min".to_string(), "avg".to_string()],
                },
            ],
        }
    }

    #[test]
    fn test_from_config() {
        let caps = RollupJobCaps::from_config(&job("1h")).unwrap();
        assert_eq!(caps.job_id(), "foo");
        assert_eq!(caps.rollup_index(), "foo_rollup");
        assert_eq!(
            caps.date_histogram().unwrap().interval,
            Interval::Calendar(CalendarUnit::Hour)
        );
        // duplicate metric entries are merged
        assert_eq!(caps.metrics()["bytes"].len(), 3);
    }

    #[test]
    fn test_from_config_rejects_bad_input() {
        assert!(matches!(
            RollupJobCaps::from_config(&job("1x")),
            Err(RollupError::MalformedInterval(_))
        ));

        let mut config = job("1h");
        config.metrics[0].metrics.push("median".to_string());
        assert!(matches!(
            RollupJobCaps::from_config(&config),
            Err(RollupError::InvalidJobConfig(_))
        ));

        let mut config = job("1h");
        config.rollup_index = String::new();
        assert!(RollupJobCaps::from_config(&config).is_err());

        let mut config = job("1h");
        config.groups.histogram.as_mut().unwrap().interval = 0;
        assert!(RollupJobCaps::from_config(&config).is_err());
    }

    #[test]
    fn test_from_json() {
        let caps = RollupJobCaps::from_json(
            r#"{
                "id": "sensor",
                "rollup_index": "sensor_rollup",
                "groups": {
                    "date_histogram": { "field": "timestamp", "interval": "60m" },
                    "terms": { "fields": ["node"] }
                },
                "metrics": [ { "field": "temperature", "metrics": ["min", "max", "sum"] } ]
            }"#,
        )
        .unwrap();

        let dh = caps.date_histogram().unwrap();
        assert_eq!(dh.interval, Interval::Fixed(3_600_000));
        assert_eq!(dh.time_zone, DEFAULT_TIME_ZONE);
        assert!(caps.histogram().is_none());
        assert!(caps.matches_terms("node"));
        assert!(caps.matches_metric("temperature", MetricKind::Sum));
        assert!(!caps.matches_metric("temperature", MetricKind::Avg));
    }

    #[test]
    fn test_matches_date_histogram() {
        let caps = RollupJobCaps::from_config(&job("1h")).unwrap();
        let day = Interval::classify("1d").unwrap();

        assert!(caps.matches_date_histogram("ts", day, "UTC").is_match());
        assert!(!caps.matches_date_histogram("other", day, "UTC").is_match());
        assert!(!caps.matches_date_histogram("ts", day, "EST").is_match());
        assert!(!caps
            .matches_date_histogram("ts", Interval::Fixed(60_000), "UTC")
            .is_match());
    }

    #[test]
    fn test_matches_histogram() {
        let caps = RollupJobCaps::from_config(&job("1h")).unwrap();
        assert_eq!(caps.matches_histogram("bytes", 9), IntervalMatch::exact());
        assert_eq!(
            caps.matches_histogram("bytes", 10).warnings(),
            &[CompatibilityWarning::NotMultiple]
        );
        assert!(!caps.matches_histogram("bytes", 1).is_match());
        assert!(!caps.matches_histogram("host", 9).is_match());
    }

    #[test]
    fn test_group_types_are_independent() {
        let caps = RollupJobCaps::from_config(&job("1h")).unwrap();
        // "ts" is only a date histogram field
        assert!(!caps.matches_histogram("ts", 100).is_match());
        assert!(!caps.matches_terms("ts"));
        // "bytes" is a histogram field, not a terms field
        assert!(!caps.matches_terms("bytes"));
    }

    #[test]
    fn test_metric_kind_roundtrip() {
        for kind in [
            MetricKind::Min,
            MetricKind::Max,
            MetricKind::Sum,
            MetricKind::Avg,
            MetricKind::ValueCount,
        ] {
            assert_eq!(kind.as_str().parse::<MetricKind>().unwrap(), kind);
        }
    }
}
