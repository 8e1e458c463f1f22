//! Match completion pipeline
//!
//! Ties the engines together for a match leaving the match workflow:
//! results are materialized, the rating is applied when the match belongs to
//! a season, best-N and the division table are refreshed, and a completion
//! signal goes out either way.

use crate::error::{is_invalid_match_data, LeagueError, Result};
use crate::metrics::MetricsCollector;
use crate::outcome::MatchOutcome;
use crate::rating::{MatchRatingUpdate, RatedMatch, RatedSet, RatingEngine, ReversalSummary};
use crate::results::{
    assign_sides, ensure_completed, MaterializeOutcome, ResultMaterializer, SideAssignment,
};
use crate::service::signals::{CompletionSignal, SignalKind, SignalPublisher};
use crate::standings::{DivisionStanding, StandingsEngine};
use crate::types::{CompletedMatch, MatchId, PlayerId, ScoreSheet, Side};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What processing one completed match did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchProcessingReport {
    pub match_id: MatchId,
    pub results_created: usize,
    pub already_materialized: bool,
    /// Reason results were not written, for matches outside a division
    pub skipped: Option<String>,
    /// Rating movement, absent without a season or when already rated
    pub rating: Option<MatchRatingUpdate>,
    /// Division table after the refresh
    pub standings: Vec<DivisionStanding>,
}

impl MatchProcessingReport {
    fn outcome_label(&self) -> &'static str {
        if self.skipped.is_some() {
            "skipped"
        } else if self.already_materialized {
            "already_materialized"
        } else {
            "created"
        }
    }
}

/// What voiding one match undid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoidReport {
    pub match_id: MatchId,
    pub results_removed: usize,
    pub reversal: ReversalSummary,
    pub standings: Vec<DivisionStanding>,
}

pub struct MatchCompletionPipeline {
    materializer: Arc<ResultMaterializer>,
    ratings: Arc<RatingEngine>,
    standings: Arc<StandingsEngine>,
    publisher: Arc<dyn SignalPublisher>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl MatchCompletionPipeline {
    pub fn new(
        materializer: Arc<ResultMaterializer>,
        ratings: Arc<RatingEngine>,
        standings: Arc<StandingsEngine>,
        publisher: Arc<dyn SignalPublisher>,
    ) -> Self {
        Self {
            materializer,
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

    /// Run a completed match through results, ratings and standings
    pub async fn on_match_completed(&self, completed: &CompletedMatch) -> Result<MatchProcessingReport> {
        let subject = completed.id.to_string();
        match self.process(completed) {
            Ok(report) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_match_processed(report.outcome_label(), report.results_created);
                }
                let message = match (&report.skipped, &report.rating) {
                    (Some(reason), _) => format!("results skipped: {}", reason),
                    (None, Some(update)) => format!(
                        "{} result(s) written, {} rating(s) updated",
                        report.results_created,
                        update.changes.len()
                    ),
                    (None, None) => format!("{} result(s) written", report.results_created),
                };
                self.emit(CompletionSignal::success(SignalKind::MatchProcessed, subject, message))
                    .await;
                Ok(report)
            }
            Err(err) => {
                if let Some(metrics) = &self.metrics {
                    if is_invalid_match_data(&err) {
                        metrics.record_validation_failure();
                    }
                    metrics.record_match_processed("failed", 0);
                }
                error!("Processing match {} failed: {}", completed.id, err);
                self.emit(CompletionSignal::failure(
                    SignalKind::MatchProcessed,
                    subject,
                    err.to_string(),
                ))
                .await;
                Err(err)
            }
        }
    }

    /// Undo a voided match: results, rating and standings
    pub async fn on_match_voided(&self, match_id: &MatchId) -> Result<VoidReport> {
        match self.void(match_id) {
            Ok(report) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_match_voided();
                    if report.reversal.entries_reversed > 0 {
                        metrics.record_rating_reversal();
                    }
                }
                let message = format!(
                    "{} result(s) removed, {} rating(s) restored",
                    report.results_removed, report.reversal.players_restored
                );
                self.emit(CompletionSignal::success(
                    SignalKind::MatchVoided,
                    match_id.to_string(),
                    message,
                ))
                .await;
                Ok(report)
            }
            Err(err) => {
                error!("Voiding match {} failed: {}", match_id, err);
                self.emit(CompletionSignal::failure(
                    SignalKind::MatchVoided,
                    match_id.to_string(),
                    err.to_string(),
                ))
                .await;
                Err(err)
            }
        }
    }

    fn process(&self, completed: &CompletedMatch) -> Result<MatchProcessingReport> {
        ensure_completed(completed)?;

        // Everything below is checked before the first write
        let sides = assign_sides(completed)?;
        let outcome = self.materializer.outcome_for(completed)?;
        let rated = rated_match(completed, &sides, &outcome);
        if let Some(rated) = &rated {
            self.ratings.validate(rated)?;
        }

        let mut report = MatchProcessingReport {
            match_id: completed.id,
            ..Default::default()
        };
        match self.materializer.materialize(completed)? {
            MaterializeOutcome::Created(results) => report.results_created = results.len(),
            MaterializeOutcome::AlreadyMaterialized { .. } => report.already_materialized = true,
            MaterializeOutcome::Skipped { reason } => report.skipped = Some(reason),
        }

        match rated {
            Some(rated) => report.rating = self.rate(&rated)?,
            None => info!("Match {} has no season, rating skipped", completed.id),
        }

        if let Some((division_id, season_id)) = completed.ranking_context() {
            let players: Vec<PlayerId> = sides
                .side_a
                .iter()
                .chain(&sides.side_b)
                .cloned()
                .collect();
            let timer = self.metrics.as_ref().map(|metrics| metrics.start_timer());
            let refreshed = self
                .standings
                .refresh_players(&players, &division_id, &season_id);
            if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
                metrics.record_standings_rebuild("refresh_players", refreshed.is_ok(), timer.stop());
            }
            report.standings = refreshed?;
        }

        Ok(report)
    }

    /// Apply the rating, treating an already rated match as done
    fn rate(&self, rated: &RatedMatch) -> Result<Option<MatchRatingUpdate>> {
        match self.ratings.process_match(rated) {
            Ok(update) => {
                if let Some(metrics) = &self.metrics {
                    let deltas: Vec<f64> = update.changes.iter().map(|change| change.delta).collect();
                    metrics.record_rating_update(&rated.mode().to_string(), &deltas);
                }
                Ok(Some(update))
            }
            Err(err)
                if matches!(
                    err.downcast_ref::<LeagueError>(),
                    Some(LeagueError::MatchAlreadyRated { .. })
                ) =>
            {
                debug!("Match {} already rated, skipping", rated.match_id);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn void(&self, match_id: &MatchId) -> Result<VoidReport> {
        let context = self
            .materializer
            .results_for(match_id)?
            .first()
            .map(|result| (result.division_id, result.season_id));

        let results_removed = self.materializer.remove_results(match_id)?;
        let reversal = self.ratings.reverse_match(match_id)?;

        let standings = match context {
            Some((division_id, season_id)) => {
                self.standings.refresh_division(&division_id, &season_id)?
            }
            None => {
                debug!("Voided match {} had no division results", match_id);
                Vec::new()
            }
        };

        Ok(VoidReport {
            match_id: *match_id,
            results_removed,
            reversal,
            standings,
        })
    }

    async fn emit(&self, signal: CompletionSignal) {
        if let Err(err) = self.publisher.publish(signal).await {
            warn!("Failed to publish completion signal: {}", err);
        }
    }
}

/// Rating input for a match, or `None` when it has no season
///
/// Sets are oriented to the winning side. Match tiebreaks rate on their
/// points, a level set decided by tiebreak rates as 7-6 for the tiebreak
/// winner, and pickleball games rate on points.
pub fn rated_match(
    completed: &CompletedMatch,
    sides: &SideAssignment,
    outcome: &MatchOutcome,
) -> Option<RatedMatch> {
    let season_id = completed.season_id?;
    let winner = outcome.winner;
    let orient = |a: i32, b: i32| match winner {
        Side::A => RatedSet::new(a, b),
        Side::B => RatedSet::new(b, a),
    };

    let sets = if completed.is_walkover {
        Vec::new()
    } else {
        match &completed.scores {
            ScoreSheet::Sets(sets) => sets
                .iter()
                .map(|set| match (set.is_match_tiebreak, set.a_tiebreak, set.b_tiebreak) {
                    (true, Some(a), Some(b)) => orient(a, b),
                    // Level games decided by tiebreak rate as one game up
                    (false, Some(a), Some(b)) if set.a_games == set.b_games && a != b => {
                        let games = set.a_games;
                        if a > b {
                            orient(games + 1, games)
                        } else {
                            orient(games, games + 1)
                        }
                    }
                    _ => orient(set.a_games, set.b_games),
                })
                .collect(),
            ScoreSheet::Games(games) => games
                .iter()
                .map(|game| orient(game.a_points, game.b_points))
                .collect(),
        }
    };

    Some(RatedMatch {
        match_id: completed.id,
        season_id,
        sport: completed.sport,
        winners: sides.players(winner).to_vec(),
        losers: sides.players(winner.opponent()).to_vec(),
        sets,
        is_walkover: completed.is_walkover,
        played_at: completed.played_at,
    })
}
