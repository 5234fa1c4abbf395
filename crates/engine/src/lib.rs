//! Assertion evaluation engine.
//!
//! This crate provides:
//! - The [`AssertionEvaluator`] trait and the freshness evaluator with
//!   its validation-window math
//! - The [`AssertionEngine`]: an evaluator registry that fans results to
//!   result handlers
//! - The run-event result handler emitting outcomes back to the catalog
//! - The cron scheduler with its bounded worker pool
//! - The monitor manager reconciling the scheduled set with the catalog

pub mod engine;
pub mod evaluator;
pub mod manager;
pub mod result;
pub mod scheduler;

pub use engine::AssertionEngine;
pub use evaluator::{AssertionEvaluator, FreshnessEvaluator};
pub use manager::MonitorManager;
pub use result::{ResultHandler, RunEventResultHandler};
pub use scheduler::{AssertionScheduler, ScheduledJob, WorkerPool};
