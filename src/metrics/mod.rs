//! Metrics for the league engine
//!
//! This module provides Prometheus metrics collection for the match
//! pipeline, the rating engine and the standings engine.

pub mod collector;

pub use collector::{
    MetricsCollector, MetricsTimer, PipelineMetrics, RatingMetrics, StandingsMetrics,
};
