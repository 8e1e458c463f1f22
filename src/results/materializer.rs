//! Result materialization
//!
//! Creates one [`MatchResult`] per participant once a match reaches the
//! completed state. Best-N fields are left unset for the standings engine.

use crate::error::{LeagueError, Result};
use crate::outcome::{MatchOutcome, OutcomeParser};
use crate::points::PointsCalculator;
use crate::results::models::MatchResult;
use crate::results::storage::ResultStorage;
use crate::types::{CompletedMatch, GameMode, MatchId, MatchStatus, Participant, PlayerId, Side};
use crate::utils::{current_timestamp, generate_id};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Players on each side of a match, in creation order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideAssignment {
    pub side_a: Vec<PlayerId>,
    pub side_b: Vec<PlayerId>,
}

impl SideAssignment {
    pub fn players(&self, side: Side) -> &[PlayerId] {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }
}

/// What a materialization call did
#[derive(Debug, Clone, PartialEq)]
pub enum MaterializeOutcome {
    /// Fresh results were written
    Created(Vec<MatchResult>),
    /// Results already existed; nothing was written
    AlreadyMaterialized { existing: usize },
    /// The match has no division/season and never enters standings
    Skipped { reason: String },
}

impl MaterializeOutcome {
    pub fn created_count(&self) -> usize {
        match self {
            MaterializeOutcome::Created(results) => results.len(),
            _ => 0,
        }
    }
}

/// Turns completed matches into stored per-participant results
pub struct ResultMaterializer {
    parser: OutcomeParser,
    points: PointsCalculator,
    storage: Arc<dyn ResultStorage>,
}

impl ResultMaterializer {
    pub fn new(points: PointsCalculator, storage: Arc<dyn ResultStorage>) -> Self {
        Self {
            parser: OutcomeParser::new(),
            points,
            storage,
        }
    }

    /// Materialize the results of a completed match
    pub fn materialize(&self, completed: &CompletedMatch) -> Result<MaterializeOutcome> {
        ensure_completed(completed)?;

        let Some((division_id, season_id)) = completed.ranking_context() else {
            info!(
                "Skipping result materialization for match {}: no division/season",
                completed.id
            );
            return Ok(MaterializeOutcome::Skipped {
                reason: "match has no division or season".to_string(),
            });
        };

        let existing = self.storage.results_for_match(&completed.id)?;
        if !existing.is_empty() {
            debug!(
                "Match {} already has {} results, nothing to do",
                completed.id,
                existing.len()
            );
            return Ok(MaterializeOutcome::AlreadyMaterialized {
                existing: existing.len(),
            });
        }

        let sides = assign_sides(completed)?;
        let outcome = self.outcome_for(completed)?;
        let points = self.points.calculate(&outcome, completed.is_walkover);
        let now = current_timestamp();

        let mut results = Vec::with_capacity(completed.participants.len());
        for side in [Side::A, Side::B] {
            let side_points = points.side(side);
            let teammates = sides.players(side);
            let opponent_id = sides.players(side.opponent())[0].clone();

            for player_id in teammates {
                let partner_id = teammates.iter().find(|id| *id != player_id).cloned();
                results.push(MatchResult {
                    id: generate_id(),
                    match_id: completed.id,
                    player_id: player_id.clone(),
                    opponent_id: opponent_id.clone(),
                    partner_id,
                    division_id,
                    season_id,
                    sport: completed.sport,
                    mode: completed.mode,
                    side,
                    is_winner: side_points.is_winner,
                    points: side_points.award,
                    margin: side_points.margin,
                    sets_won: side_points.sets_won,
                    sets_lost: side_points.sets_lost,
                    games_won: side_points.games_won,
                    games_lost: side_points.games_lost,
                    is_walkover: completed.is_walkover,
                    played_at: completed.played_at,
                    created_at: now,
                    counts_for_standings: false,
                    result_sequence: None,
                });
            }
        }

        if !self
            .storage
            .insert_match_results(&completed.id, results.clone())?
        {
            // Lost a race with a concurrent call for the same match
            let existing = self.storage.results_for_match(&completed.id)?.len();
            return Ok(MaterializeOutcome::AlreadyMaterialized { existing });
        }

        info!(
            "Materialized {} results for {} {} match {} (winner side {:?})",
            results.len(),
            completed.sport,
            completed.mode,
            completed.id,
            outcome.winner
        );
        Ok(MaterializeOutcome::Created(results))
    }

    /// Stored results of a match
    pub fn results_for(&self, match_id: &MatchId) -> Result<Vec<MatchResult>> {
        self.storage.results_for_match(match_id)
    }

    /// Remove all results of a voided or reopened match
    pub fn remove_results(&self, match_id: &MatchId) -> Result<usize> {
        let removed = self.storage.delete_match_results(match_id)?;
        info!("Removed {} results for match {}", removed, match_id);
        Ok(removed)
    }

    /// Normalized outcome of a match, synthesized for walkovers
    pub fn outcome_for(&self, completed: &CompletedMatch) -> Result<MatchOutcome> {
        if completed.is_walkover {
            let winner = completed.walkover_winner.ok_or_else(|| {
                LeagueError::invalid(format!(
                    "walkover match {} does not name a winning side",
                    completed.id
                ))
            })?;
            return Ok(MatchOutcome::walkover(winner));
        }

        self.parser.parse(completed.sport, &completed.scores)
    }
}

/// Reject matches that have not reached the completed state
pub fn ensure_completed(completed: &CompletedMatch) -> Result<()> {
    if completed.status != MatchStatus::Completed {
        return Err(LeagueError::precondition(format!(
            "match {} is {}, results require a completed match",
            completed.id, completed.status
        ))
        .into());
    }
    Ok(())
}

/// Split participants into sides.
///
/// Singles use creation order. Doubles use team tags when they form two
/// teams of two, otherwise the first two created players form side A.
pub fn assign_sides(completed: &CompletedMatch) -> Result<SideAssignment> {
    let expected = completed.mode.players_per_side() * 2;
    if completed.participants.len() != expected {
        return Err(LeagueError::precondition(format!(
            "{} match {} has {} participants, expected {}",
            completed.mode,
            completed.id,
            completed.participants.len(),
            expected
        ))
        .into());
    }

    let mut unique = HashSet::new();
    if !completed
        .participants
        .iter()
        .all(|participant| unique.insert(participant.player_id.as_str()))
    {
        return Err(LeagueError::invalid(format!(
            "match {} lists the same player more than once",
            completed.id
        ))
        .into());
    }

    let mut ordered: Vec<&Participant> = completed.participants.iter().collect();
    ordered.sort_by_key(|participant| participant.joined_at);

    let by_order = |ordered: &[&Participant]| {
        let half = ordered.len() / 2;
        SideAssignment {
            side_a: ordered[..half].iter().map(|p| p.player_id.clone()).collect(),
            side_b: ordered[half..].iter().map(|p| p.player_id.clone()).collect(),
        }
    };

    match completed.mode {
        GameMode::Singles => Ok(by_order(&ordered)),
        GameMode::Doubles => {
            let tagged = |side: Side| -> Vec<PlayerId> {
                ordered
                    .iter()
                    .filter(|participant| participant.team == Some(side))
                    .map(|participant| participant.player_id.clone())
                    .collect()
            };
            let (side_a, side_b) = (tagged(Side::A), tagged(Side::B));

            if side_a.len() == 2 && side_b.len() == 2 {
                Ok(SideAssignment { side_a, side_b })
            } else {
                warn!(
                    "Inconsistent team tags on doubles match {} ({} on A, {} on B); \
                     falling back to creation order",
                    completed.id,
                    side_a.len(),
                    side_b.len()
                );
                Ok(by_order(&ordered))
            }
        }
    }
}
