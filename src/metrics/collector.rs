//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the league engine using
//! Prometheus metrics.

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the league engine
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Match pipeline metrics
    pipeline_metrics: PipelineMetrics,

    /// Rating engine metrics
    rating_metrics: RatingMetrics,

    /// Standings engine metrics
    standings_metrics: StandingsMetrics,
}

/// Match completion pipeline metrics
#[derive(Clone)]
pub struct PipelineMetrics {
    /// Completed matches handled, by outcome
    pub matches_processed_total: IntCounterVec,

    /// Result records written
    pub results_materialized_total: IntCounter,

    /// Rejected score submissions
    pub validation_failures_total: IntCounter,

    /// Matches voided
    pub matches_voided_total: IntCounter,
}

/// Rating engine metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Rated matches by game mode
    pub rating_updates_total: IntCounterVec,

    /// Reversed matches
    pub rating_reversals_total: IntCounter,

    /// Ratings widened by inactivity decay
    pub decay_applied_total: IntCounter,

    /// Absolute rating change per player per match
    pub rating_delta: Histogram,
}

/// Standings engine metrics
#[derive(Clone)]
pub struct StandingsMetrics {
    /// Division rebuilds by status
    pub rebuilds_total: IntCounterVec,

    /// Duration of rebuild operations
    pub rebuild_duration: HistogramVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let pipeline_metrics = PipelineMetrics::new(&registry)?;
        let rating_metrics = RatingMetrics::new(&registry)?;
        let standings_metrics = StandingsMetrics::new(&registry)?;

        Ok(Self {
            registry,
            pipeline_metrics,
            rating_metrics,
            standings_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn pipeline(&self) -> &PipelineMetrics {
        &self.pipeline_metrics
    }

    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    pub fn standings(&self) -> &StandingsMetrics {
        &self.standings_metrics
    }

    /// Record a completed match passing through the pipeline
    pub fn record_match_processed(&self, outcome: &str, results_written: usize) {
        self.pipeline_metrics
            .matches_processed_total
            .with_label_values(&[outcome])
            .inc();
        self.pipeline_metrics
            .results_materialized_total
            .inc_by(results_written as u64);
    }

    pub fn record_validation_failure(&self) {
        self.pipeline_metrics.validation_failures_total.inc();
    }

    pub fn record_match_voided(&self) {
        self.pipeline_metrics.matches_voided_total.inc();
    }

    /// Record a rated match and the size of each player's change
    pub fn record_rating_update(&self, mode: &str, deltas: &[f64]) {
        self.rating_metrics
            .rating_updates_total
            .with_label_values(&[mode])
            .inc();
        for delta in deltas {
            self.rating_metrics.rating_delta.observe(delta.abs());
        }
    }

    pub fn record_rating_reversal(&self) {
        self.rating_metrics.rating_reversals_total.inc();
    }

    pub fn record_decay(&self, decayed: usize) {
        self.rating_metrics.decay_applied_total.inc_by(decayed as u64);
    }

    /// Record a standings rebuild
    pub fn record_standings_rebuild(&self, operation: &str, success: bool, duration: Duration) {
        let status = if success { "success" } else { "error" };

        self.standings_metrics
            .rebuilds_total
            .with_label_values(&[status])
            .inc();

        self.standings_metrics
            .rebuild_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }

    /// Prometheus text exposition of every registered metric
    pub fn gather_text(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl PipelineMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_processed_total = IntCounterVec::new(
            Opts::new(
                "league_engine_matches_processed_total",
                "Completed matches handled by the pipeline",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(matches_processed_total.clone()))?;

        let results_materialized_total = IntCounter::new(
            "league_engine_results_materialized_total",
            "Match result records written",
        )?;
        registry.register(Box::new(results_materialized_total.clone()))?;

        let validation_failures_total = IntCounter::new(
            "league_engine_validation_failures_total",
            "Rejected score submissions",
        )?;
        registry.register(Box::new(validation_failures_total.clone()))?;

        let matches_voided_total =
            IntCounter::new("league_engine_matches_voided_total", "Matches voided")?;
        registry.register(Box::new(matches_voided_total.clone()))?;

        Ok(Self {
            matches_processed_total,
            results_materialized_total,
            validation_failures_total,
            matches_voided_total,
        })
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let rating_updates_total = IntCounterVec::new(
            Opts::new("league_engine_rating_updates_total", "Rated matches"),
            &["mode"],
        )?;
        registry.register(Box::new(rating_updates_total.clone()))?;

        let rating_reversals_total = IntCounter::new(
            "league_engine_rating_reversals_total",
            "Rated matches reversed",
        )?;
        registry.register(Box::new(rating_reversals_total.clone()))?;

        let decay_applied_total = IntCounter::new(
            "league_engine_decay_applied_total",
            "Ratings widened by inactivity decay",
        )?;
        registry.register(Box::new(decay_applied_total.clone()))?;

        let rating_delta = Histogram::with_opts(
            HistogramOpts::new(
                "league_engine_rating_delta",
                "Absolute rating change per player per match",
            )
            .buckets(vec![1.0, 2.5, 5.0, 10.0, 15.0, 20.0, 28.0, 50.0, 75.0]),
        )?;
        registry.register(Box::new(rating_delta.clone()))?;

        Ok(Self {
            rating_updates_total,
            rating_reversals_total,
            decay_applied_total,
            rating_delta,
        })
    }
}

impl StandingsMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let rebuilds_total = IntCounterVec::new(
            Opts::new(
                "league_engine_standings_rebuilds_total",
                "Division standings rebuilds",
            ),
            &["status"],
        )?;
        registry.register(Box::new(rebuilds_total.clone()))?;

        let rebuild_duration = HistogramVec::new(
            HistogramOpts::new(
                "league_engine_standings_rebuild_duration_seconds",
                "Duration of standings operations",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(rebuild_duration.clone()))?;

        Ok(Self {
            rebuilds_total,
            rebuild_duration,
        })
    }
}
