//! Manager reconcile: fetched monitors land in the scheduler, and a
//! second refresh replaces rather than duplicates the jobs.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use vigil_catalog::client::{CatalogError, GraphApi};
use vigil_catalog::MonitorFetcher;
use vigil_core::config::MonitorConfig;
use vigil_engine::{AssertionEngine, AssertionScheduler, MonitorManager};

struct CannedGraph {
    payload: Value,
}

#[async_trait]
impl GraphApi for CannedGraph {
    async fn execute(&self, _query: &str, _variables: Value) -> Result<Value, CatalogError> {
        Ok(self.payload.clone())
    }
}

fn search_payload() -> Value {
    json!({
        "searchAcrossEntities": {
            "searchResults": [
                {
                    "entity": {
                        "urn": "urn:li:monitor:test",
                        "type": "MONITOR",
                        "info": {
                            "type": "ASSERTION",
                            "assertionMonitor": {
                                "assertions": [
                                    {
                                        "assertion": {
                                            "urn": "urn:li:assertion:test",
                                            "info": {
                                                "type": "FRESHNESS",
                                                "freshnessAssertion": {
                                                    "type": "DATASET_CHANGE",
                                                    "schedule": {
                                                        "type": "CRON",
                                                        "cron": {
                                                            "cron": "0 * * * *",
                                                            "timezone": "America/Los_Angeles"
                                                        }
                                                    }
                                                }
                                            },
                                            "relationships": {
                                                "relationships": [
                                                    {
                                                        "entity": {
                                                            "urn": "urn:li:dataset:(urn:li:dataPlatform:snowflake,db.sch.tbl,PROD)",
                                                            "type": "DATASET",
                                                            "platform": {
                                                                "urn": "urn:li:dataPlatform:snowflake"
                                                            }
                                                        }
                                                    }
                                                ]
                                            }
                                        },
                                        "schedule": {
                                            "cron": "30 * * * *",
                                            "timezone": "UTC"
                                        }
                                    }
                                ]
                            }
                        }
                    }
                }
            ]
        }
    })
}

fn test_config() -> MonitorConfig {
    MonitorConfig {
        refresh_interval_minutes: 1,
        worker_pool_size: 4,
        evaluation_timeout_secs: 30,
        default_schedule: "0 * * * *".to_string(),
        default_timezone: "America/Los_Angeles".to_string(),
        list_monitors_batch_size: 1000,
    }
}

#[tokio::test]
async fn refresh_schedules_fetched_assertions() {
    let fetcher = MonitorFetcher::new(Arc::new(CannedGraph {
        payload: search_payload(),
    }));
    let engine = Arc::new(AssertionEngine::new(Vec::new(), Vec::new()));
    let scheduler = Arc::new(AssertionScheduler::new(engine, &test_config()));
    let manager = MonitorManager::new(
        fetcher,
        scheduler.clone(),
        std::time::Duration::from_secs(60),
    );

    manager.refresh_monitors().await;

    let jobs = scheduler.jobs_for_assertion("urn:li:assertion:test").await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].cron, "30 * * * *");
    assert_eq!(jobs[0].timezone, "UTC");

    // A second refresh replaces the binding instead of duplicating it.
    manager.refresh_monitors().await;
    assert_eq!(scheduler.job_count().await, 1);

    scheduler.shutdown().await;
}
