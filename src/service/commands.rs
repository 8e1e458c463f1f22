//! Admin commands
//!
//! Manual recalculation entry points. Each command reports through a
//! completion signal as well as its return value.

use crate::error::{LeagueError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::{DecaySummary, RatingEngine};
use crate::service::signals::{CompletionSignal, SignalKind, SignalPublisher};
use crate::standings::{DivisionStanding, SelectionSummary, StandingsEngine, SweepReport};
use crate::types::{DivisionId, PlayerId, SeasonId};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

pub struct AdminCommands {
    ratings: Arc<RatingEngine>,
    standings: Arc<StandingsEngine>,
    publisher: Arc<dyn SignalPublisher>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl AdminCommands {
    pub fn new(
        ratings: Arc<RatingEngine>,
        standings: Arc<StandingsEngine>,
        publisher: Arc<dyn SignalPublisher>,
    ) -> Self {
        Self {
            ratings,
            standings,
            publisher,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Recalculate one player's best-N selection and standings row
    pub async fn recalculate_player(
        &self,
        player_id: &PlayerId,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<DivisionStanding> {
        let result = self
            .standings
            .recalculate_player(player_id, division_id, season_id);
        self.report(SignalKind::PlayerRecalculated, player_id, &result, |row| {
            format!("{} points in division {}", row.total_points, division_id)
        })
        .await;
        result
    }

    /// Rebuild and rank a division from its current selection
    pub async fn recalculate_division(
        &self,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<Vec<DivisionStanding>> {
        let timer = self.metrics.as_ref().map(|metrics| metrics.start_timer());
        let result = self.standings.recalculate_division(division_id, season_id);
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            metrics.record_standings_rebuild("recalculate_division", result.is_ok(), timer.stop());
        }
        self.report(SignalKind::DivisionRecalculated, division_id, &result, |rows| {
            format!("{} standing(s) ranked", rows.len())
        })
        .await;
        result
    }

    /// Redo best-N selection for every player of a division
    pub async fn recalculate_division_best_n(
        &self,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<SelectionSummary> {
        let result = self
            .standings
            .recalculate_division_best_n(division_id, season_id);
        self.report(SignalKind::DivisionBestNRecalculated, division_id, &result, |summary| {
            format!(
                "{} player(s), {} result(s) selected, {} flag(s) changed",
                summary.players, summary.selected, summary.changed
            )
        })
        .await;
        result
    }

    /// Widen the deviation of every inactive player
    pub async fn apply_inactivity_decay(&self, now: DateTime<Utc>) -> Result<DecaySummary> {
        let result = self.ratings.apply_inactivity_decay(now);
        if let (Some(metrics), Ok(summary)) = (&self.metrics, &result) {
            metrics.record_decay(summary.decayed);
        }
        self.report(SignalKind::InactivityDecay, "all players", &result, |summary| {
            format!(
                "scanned {}, decayed {}, failed {}",
                summary.scanned, summary.decayed, summary.failed
            )
        })
        .await;
        result
    }

    /// Refresh the given divisions in parallel on blocking worker tasks
    ///
    /// One failing division never stops the others; failures are collected
    /// in the report.
    pub async fn sweep_divisions(&self, targets: Vec<(DivisionId, SeasonId)>) -> SweepReport {
        let mut pending: HashSet<DivisionId> = targets.iter().map(|(division_id, _)| *division_id).collect();
        let mut tasks = JoinSet::new();
        for (division_id, season_id) in targets {
            let engine = self.standings.clone();
            tasks.spawn_blocking(move || {
                (division_id, engine.refresh_division(&division_id, &season_id))
            });
        }

        let mut report = SweepReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((division_id, Ok(rows))) => {
                    info!("Refreshed division {} ({} rows)", division_id, rows.len());
                    pending.remove(&division_id);
                    report.refreshed.push(division_id);
                }
                Ok((division_id, Err(err))) => {
                    error!("Failed to refresh division {}: {}", division_id, err);
                    pending.remove(&division_id);
                    report.failed.push((division_id, err.to_string()));
                }
                Err(join_err) => error!("Sweep task did not finish: {}", join_err),
            }
        }
        for division_id in pending {
            report.failed.push((division_id, "sweep task aborted".to_string()));
        }
        report.refreshed.sort();
        report.failed.sort();

        let message = format!(
            "{} refreshed, {} failed",
            report.refreshed.len(),
            report.failed.len()
        );
        let signal = if report.is_clean() {
            CompletionSignal::success(SignalKind::DivisionSweep, "divisions", message)
        } else {
            CompletionSignal::failure(SignalKind::DivisionSweep, "divisions", message)
        };
        self.emit(signal).await;
        report
    }

    /// Sweep every division the roster provider knows about
    pub async fn sweep_all_divisions(&self) -> Result<SweepReport> {
        let targets: Vec<(DivisionId, SeasonId)> = self
            .standings
            .divisions()
            .divisions()?
            .into_iter()
            .map(|division| (division.division_id, division.season_id))
            .collect();
        if targets.is_empty() {
            warn!("No divisions to sweep");
        }
        Ok(self.sweep_divisions(targets).await)
    }

    async fn report<T, F>(
        &self,
        kind: SignalKind,
        subject: impl Display,
        result: &Result<T>,
        describe: F,
    ) where
        F: FnOnce(&T) -> String,
    {
        let signal = match result {
            Ok(value) => CompletionSignal::success(kind, subject.to_string(), describe(value)),
            Err(err) => {
                if matches!(
                    err.downcast_ref::<LeagueError>(),
                    Some(LeagueError::DivisionNotFound { .. } | LeagueError::PlayerNotFound { .. })
                ) {
                    warn!("{} for {}: {}", kind, subject, err);
                } else {
                    error!("{} for {} failed: {}", kind, subject, err);
                }
                CompletionSignal::failure(kind, subject.to_string(), err.to_string())
            }
        };
        self.emit(signal).await;
    }

    async fn emit(&self, signal: CompletionSignal) {
        if let Err(err) = self.publisher.publish(signal).await {
            warn!("Failed to publish completion signal: {}", err);
        }
    }
}
