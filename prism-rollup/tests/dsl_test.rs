//! End-to-end tests: Elasticsearch aggregation JSON and job config JSON in,
//! rollup plan out

use prism_rollup::{
    AggregationTranslator, CatalogSnapshot, RollupCatalog, RollupError, RollupJobCaps,
    RollupPlanner,
};
use serde_json::json;

fn hourly_job() -> RollupJobCaps {
    RollupJobCaps::from_json(
        &json!({
            "id": "sensor_hourly",
            "rollup_index": "sensor_rollup",
            "groups": {
                "date_histogram": { "field": "timestamp", "interval": "1h", "time_zone": "UTC" },
                "terms": { "fields": ["node"] },
                "histogram": { "fields": ["temperature"], "interval": 5 }
            },
            "metrics": [
                { "field": "temperature", "metrics": ["min", "max", "sum"] },
                { "field": "voltage", "metrics": ["avg"] }
            ]
        })
        .to_string(),
    )
    .unwrap()
}

fn daily_job() -> RollupJobCaps {
    RollupJobCaps::from_json(
        &json!({
            "id": "sensor_daily",
            "rollup_index": "sensor_rollup_daily",
            "groups": {
                "date_histogram": { "field": "timestamp", "interval": "1d" },
                "terms": { "fields": ["node"] }
            },
            "metrics": [{ "field": "temperature", "metrics": ["max"] }]
        })
        .to_string(),
    )
    .unwrap()
}

fn snapshot() -> CatalogSnapshot {
    CatalogSnapshot::new(vec![hourly_job(), daily_job()])
}

fn plan_job_id(body: serde_json::Value, snapshot: &CatalogSnapshot) -> Result<String, RollupError> {
    let roots = AggregationTranslator::translate_json(&body.to_string())?;
    let plan = RollupPlanner::default().plan_snapshot(&roots, snapshot)?;
    Ok(plan.job().job_id().to_string())
}

#[test]
fn test_daily_query_uses_daily_job() {
    let body = json!({
        "size": 0,
        "aggs": {
            "per_day": {
                "date_histogram": { "field": "timestamp", "calendar_interval": "1d" },
                "aggs": {
                    "by_node": {
                        "terms": { "field": "node" },
                        "aggs": { "hottest": { "max": { "field": "temperature" } } }
                    }
                }
            }
        }
    });
    assert_eq!(plan_job_id(body, &snapshot()).unwrap(), "sensor_daily");
}

#[test]
fn test_finer_query_falls_back_to_hourly_job() {
    let body = json!({
        "aggs": {
            "per_hour": {
                "date_histogram": { "field": "timestamp", "calendar_interval": "hour" },
                "aggs": { "hottest": { "max": { "field": "temperature" } } }
            }
        }
    });
    assert_eq!(plan_job_id(body, &snapshot()).unwrap(), "sensor_hourly");

    // only the hourly job keeps average voltage
    let body = json!({
        "aggs": {
            "per_week": {
                "date_histogram": { "field": "timestamp", "calendar_interval": "week" },
                "aggs": { "voltage": { "avg": { "field": "voltage" } } }
            }
        }
    });
    assert_eq!(plan_job_id(body, &snapshot()).unwrap(), "sensor_hourly");
}

#[test]
fn test_sibling_roots_must_share_a_job() {
    let body = json!({
        "aggs": {
            "per_day": { "date_histogram": { "field": "timestamp", "calendar_interval": "day" } },
            "temps": { "histogram": { "field": "temperature", "interval": 10 } }
        }
    });
    assert_eq!(plan_job_id(body, &snapshot()).unwrap(), "sensor_hourly");
}

#[test]
fn test_legacy_and_fixed_intervals() {
    let fixed = json!({
        "aggs": {
            "every_2h": {
                "date_histogram": { "field": "timestamp", "fixed_interval": "2h" },
                "aggs": { "hottest": { "max": { "field": "temperature" } } }
            }
        }
    });
    let roots = AggregationTranslator::translate_json(&fixed.to_string()).unwrap();
    let snapshot = snapshot();
    let plan = RollupPlanner::default().plan_snapshot(&roots, &snapshot).unwrap();
    assert_eq!(plan.job().job_id(), "sensor_hourly");
    assert_eq!(
        plan.warning_messages(),
        vec![
            "query and config interval types must match (e.g. fixed-time config can only be \
             queried with fixed-time aggregations, and calendar-time config can only be \
             queried with calendar-time aggregations)"
        ]
    );

    let legacy_millis = json!({
        "aggs": { "t": { "date_histogram": { "field": "timestamp", "interval": 60_000 } } }
    });
    let err = plan_job_id(legacy_millis, &snapshot).unwrap_err();
    assert_eq!(
        err.to_string(),
        "no rollup job has a [date_histogram] agg on field [timestamp] satisfying all query requirements"
    );
}

#[test]
fn test_unsupported_and_unmatched_aggregations() {
    let body = json!({
        "aggs": {
            "per_day": {
                "date_histogram": { "field": "timestamp", "calendar_interval": "day" },
                "aggs": { "p99": { "percentiles": { "field": "temperature" } } }
            }
        }
    });
    let err = plan_job_id(body, &snapshot()).unwrap_err();
    assert!(matches!(err, RollupError::UnsupportedAggregation(_)));
    assert_eq!(err.error_type(), "parsing_exception");

    let body = json!({
        "aggs": { "coldest": { "min": { "field": "voltage" } } }
    });
    let err = plan_job_id(body, &snapshot()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "no rollup job has a [min] agg with name [coldest] satisfying all query requirements"
    );
    assert_eq!(err.error_type(), "illegal_argument_exception");
}

#[test]
fn test_catalog_updates() {
    let catalog = RollupCatalog::new();
    assert!(catalog.is_empty());

    catalog.put_job(hourly_job());
    catalog.put_job(daily_job());
    assert_eq!(catalog.len(), 2);

    let body = json!({
        "aggs": { "per_day": { "date_histogram": { "field": "timestamp", "calendar_interval": "day" } } }
    });
    let before = catalog.snapshot();
    assert_eq!(plan_job_id(body.clone(), &before).unwrap(), "sensor_daily");

    assert!(catalog.remove_job("sensor_daily").is_some());
    assert!(catalog.remove_job("sensor_daily").is_none());

    // the old snapshot is unaffected
    assert_eq!(plan_job_id(body.clone(), &before).unwrap(), "sensor_daily");
    assert_eq!(plan_job_id(body, &catalog.snapshot()).unwrap(), "sensor_hourly");
}

#[test]
fn test_invalid_job_configs() {
    for config in [
        json!({ "id": "", "rollup_index": "idx" }),
        json!({ "id": "a", "rollup_index": " " }),
        json!({ "id": "a", "rollup_index": "idx",
                "groups": { "histogram": { "fields": ["x"], "interval": 0 } } }),
        json!({ "id": "a", "rollup_index": "idx",
                "metrics": [{ "field": "x", "metrics": ["median"] }] }),
    ] {
        assert!(
            matches!(
                RollupJobCaps::from_json(&config.to_string()),
                Err(RollupError::InvalidJobConfig(_))
            ),
            "expected InvalidJobConfig for {}",
            config
        );
    }

    let bad_interval = json!({ "id": "a", "rollup_index": "idx",
        "groups": { "date_histogram": { "field": "ts", "interval": "soon" } } });
    assert!(matches!(
        RollupJobCaps::from_json(&bad_interval.to_string()),
        Err(RollupError::MalformedInterval(_))
    ));
}
