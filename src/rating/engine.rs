//! Rating engine
//!
//! Applies the DMR model to finished matches and owns every write to the
//! rating store: match processing, reversal, inactivity decay and manual
//! placement. Writes are serialized through one lock and land through a
//! single [`RatingCommit`], so a rejected match never leaves partial state.

use crate::config::RatingConfig;
use crate::error::{LeagueError, Result};
use crate::rating::calculator::{RatingAdjustment, RatingCalculator};
use crate::rating::dmr::DmrRatingCalculator;
use crate::rating::models::{
    DecaySummary, MatchRatingUpdate, PlayerRatingChange, PlayerRatingRecord, RatedMatch,
    RatingChangeReason, RatingHistoryEntry, RatingKey, RatingSnapshot, RatingState,
    ReversalSummary,
};
use crate::rating::storage::{RatingCommit, RatingStorage};
use crate::rating::validation::{validate_majority, validate_sets, ScoreRules};
use crate::types::{GameMode, MatchId, SeasonId, Sport};
use crate::utils::{current_timestamp, generate_id};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Planned movement for one participant before it is written
struct PlannedChange {
    won: bool,
    expected_score: f64,
    delta: f64,
    new_deviation: f64,
}

impl PlannedChange {
    fn from_adjustment(adjustment: &RatingAdjustment, won: bool) -> Self {
        Self {
            won,
            expected_score: adjustment.expected_score,
            delta: adjustment.delta,
            new_deviation: adjustment.new_deviation,
        }
    }
}

pub struct RatingEngine {
    config: RatingConfig,
    calculator: Arc<dyn RatingCalculator>,
    storage: Arc<dyn RatingStorage>,
    write_lock: Mutex<()>,
}

impl RatingEngine {
    /// Create an engine backed by the DMR calculator
    pub fn new(config: RatingConfig, storage: Arc<dyn RatingStorage>) -> Result<Self> {
        let calculator = DmrRatingCalculator::new(config.clone())?;
        Ok(Self::with_calculator(config, Arc::new(calculator), storage))
    }

    pub fn with_calculator(
        config: RatingConfig,
        calculator: Arc<dyn RatingCalculator>,
        storage: Arc<dyn RatingStorage>,
    ) -> Self {
        Self {
            config,
            calculator,
            storage,
            write_lock: Mutex::new(()),
        }
    }

    pub fn calculator(&self) -> &dyn RatingCalculator {
        self.calculator.as_ref()
    }

    pub fn storage(&self) -> &Arc<dyn RatingStorage> {
        &self.storage
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| LeagueError::lock_poisoned("rating write").into())
    }

    /// Stored record, or a fresh default one for a player without history
    pub fn rating_for(&self, key: &RatingKey) -> Result<PlayerRatingRecord> {
        Ok(self
            .storage
            .get_rating(key)?
            .unwrap_or_else(|| PlayerRatingRecord::new(key.clone(), &self.config)))
    }

    pub fn snapshot(&self, key: &RatingKey) -> Result<RatingSnapshot> {
        Ok(self.rating_for(key)?.snapshot())
    }

    pub fn history(&self, key: &RatingKey) -> Result<Vec<RatingHistoryEntry>> {
        self.storage.history_for_player(key)
    }

    /// Probability that `player` beats `opponent` at their current ratings
    pub fn win_probability(&self, player: &RatingKey, opponent: &RatingKey) -> Result<f64> {
        let player = self.rating_for(player)?.state();
        let opponent = self.rating_for(opponent)?.state();
        Ok(self.calculator.win_probability(&player, &opponent))
    }

    /// Ranked snapshots of one rating pool
    pub fn leaderboard(
        &self,
        season_id: &SeasonId,
        sport: Sport,
        mode: GameMode,
        limit: Option<usize>,
    ) -> Result<Vec<RatingSnapshot>> {
        Ok(self
            .storage
            .ratings_for_pool(season_id, sport, mode, limit)?
            .iter()
            .map(PlayerRatingRecord::snapshot)
            .collect())
    }

    /// Seed a player who has not played a rated match yet
    pub fn place_player(
        &self,
        key: &RatingKey,
        rating: f64,
        deviation: Option<f64>,
    ) -> Result<PlayerRatingRecord> {
        let deviation = deviation.unwrap_or(self.config.initial_deviation);
        if !rating.is_finite() || rating <= 0.0 {
            return Err(LeagueError::invalid(format!("placement rating {} is not valid", rating)).into());
        }
        if !deviation.is_finite()
            || deviation < self.config.min_deviation
            || deviation > self.config.max_deviation
        {
            return Err(LeagueError::invalid(format!(
                "placement deviation {} outside [{}, {}]",
                deviation, self.config.min_deviation, self.config.max_deviation
            ))
            .into());
        }

        let _guard = self.lock()?;
        let mut record = self.rating_for(key)?;
        if record.matches_played > 0 {
            return Err(LeagueError::precondition(format!(
                "player {} already has {} rated matches",
                key.player_id, record.matches_played
            ))
            .into());
        }

        let now = current_timestamp();
        let entry = RatingHistoryEntry {
            id: generate_id(),
            key: key.clone(),
            match_id: None,
            reason: RatingChangeReason::InitialPlacement,
            rating_before: record.rating,
            rating_after: rating,
            deviation_before: record.deviation,
            deviation_after: deviation,
            matches_played_before: 0,
            matches_played_after: 0,
            delta: rating - record.rating,
            score_factor: None,
            reversed: false,
            reversed_at: None,
            created_at: now,
        };

        record.rating = rating;
        record.peak_rating = rating;
        record.lowest_rating = rating;
        record.deviation = deviation;
        record.last_updated = now;

        self.storage.commit(RatingCommit {
            ratings: vec![record.clone()],
            history: vec![entry],
            ..Default::default()
        })?;

        info!(
            "Placed player {} at {:.1} (RD {:.1}) for {} {}",
            key.player_id, rating, deviation, key.sport, key.mode
        );
        Ok(record)
    }

    /// Check a match's players and scores without touching storage
    pub fn validate(&self, rated: &RatedMatch) -> Result<()> {
        match rated.winners.len() {
            per_side @ (1 | 2) => self.validate_match(rated, per_side),
            other => Err(LeagueError::invalid(format!(
                "unsupported team size {}",
                other
            ))
            .into()),
        }
    }

    /// Rate a finished match, dispatching on team size
    pub fn process_match(&self, rated: &RatedMatch) -> Result<MatchRatingUpdate> {
        match (rated.winners.len(), rated.losers.len()) {
            (1, 1) => self.process_singles(rated),
            (2, 2) => self.process_doubles(rated),
            (winners, losers) => Err(LeagueError::invalid(format!(
                "unsupported team sizes {} vs {}",
                winners, losers
            ))
            .into()),
        }
    }

    pub fn process_singles(&self, rated: &RatedMatch) -> Result<MatchRatingUpdate> {
        self.validate_match(rated, 1)?;
        let factor = self.calculator.score_factor(&rated.sets, rated.is_walkover);

        let _guard = self.lock()?;
        let records = self.load_participants(rated, GameMode::Singles)?;
        let (winner, loser) = (records[0].state(), records[1].state());

        let win = self.calculator.adjust(&winner, &loser, true, factor);
        let loss = self.calculator.adjust(&loser, &winner, false, factor);
        let planned = vec![
            PlannedChange::from_adjustment(&win, true),
            PlannedChange::from_adjustment(&loss, false),
        ];

        self.commit_match(rated, factor, records, planned)
    }

    /// Rate a doubles match
    ///
    /// Each team is rated as one entity (mean rating, RMS deviation). The team
    /// delta is then split by deviation: a player carrying more uncertainty
    /// than their partner absorbs a larger share, capped per player.
    pub fn process_doubles(&self, rated: &RatedMatch) -> Result<MatchRatingUpdate> {
        self.validate_match(rated, 2)?;
        let factor = self.calculator.score_factor(&rated.sets, rated.is_walkover);

        let _guard = self.lock()?;
        let records = self.load_participants(rated, GameMode::Doubles)?;
        let (winners, losers) = records.split_at(2);
        let winning_team = team_state(winners);
        let losing_team = team_state(losers);

        let team_win = self
            .calculator
            .adjust(&winning_team, &losing_team, true, factor);
        let team_loss = self
            .calculator
            .adjust(&losing_team, &winning_team, false, factor);

        let mut planned = Vec::with_capacity(records.len());
        for (team, opponents, adjustment, won) in [
            (winners, &losing_team, &team_win, true),
            (losers, &winning_team, &team_loss, false),
        ] {
            for player in team {
                let individual = self
                    .calculator
                    .adjust(&player.state(), opponents, won, factor);
                planned.push(PlannedChange {
                    won,
                    expected_score: adjustment.expected_score,
                    delta: self.team_share(player, team, adjustment.delta),
                    new_deviation: individual.new_deviation,
                });
            }
        }

        self.commit_match(rated, factor, records, planned)
    }

    fn team_share(&self, player: &PlayerRatingRecord, team: &[PlayerRatingRecord], team_delta: f64) -> f64 {
        let total: f64 = team.iter().map(|member| member.deviation).sum();
        let weight = if total > 0.0 {
            player.deviation * team.len() as f64 / total
        } else {
            1.0
        };
        let cap = self.calculator.max_delta(player.deviation);
        (team_delta * weight).clamp(-cap, cap)
    }

    fn validate_match(&self, rated: &RatedMatch, per_side: usize) -> Result<()> {
        if rated.winners.len() != per_side || rated.losers.len() != per_side {
            return Err(LeagueError::invalid(format!(
                "expected {} player(s) per side, got {} vs {}",
                per_side,
                rated.winners.len(),
                rated.losers.len()
            ))
            .into());
        }

        if let Some(player) = rated.winners.iter().find(|id| rated.losers.contains(*id)) {
            return Err(LeagueError::invalid(format!(
                "player {} cannot play against themselves",
                player
            ))
            .into());
        }

        let mut seen = HashSet::new();
        if let Some(player) = rated
            .winners
            .iter()
            .chain(&rated.losers)
            .find(|id| !seen.insert(id.as_str()))
        {
            return Err(LeagueError::invalid(format!("player {} is listed twice", player)).into());
        }

        if !rated.is_walkover {
            validate_sets(&ScoreRules::for_sport(rated.sport), &rated.sets)?;
            validate_majority(&rated.sets)?;
        }

        Ok(())
    }

    /// Records for winners then losers, defaults for unseen players
    fn load_participants(&self, rated: &RatedMatch, mode: GameMode) -> Result<Vec<PlayerRatingRecord>> {
        let keys: Vec<RatingKey> = rated
            .winners
            .iter()
            .chain(&rated.losers)
            .map(|player| RatingKey::new(player.clone(), rated.season_id, rated.sport, mode))
            .collect();

        let existing = self.storage.get_ratings(&keys)?;
        Ok(keys
            .into_iter()
            .map(|key| match existing.get(&key) {
                Some(record) => record.clone(),
                None => PlayerRatingRecord::new(key, &self.config),
            })
            .collect())
    }

    fn commit_match(
        &self,
        rated: &RatedMatch,
        score_factor: f64,
        records: Vec<PlayerRatingRecord>,
        planned: Vec<PlannedChange>,
    ) -> Result<MatchRatingUpdate> {
        let now = current_timestamp();
        let mut ratings = Vec::with_capacity(records.len());
        let mut history = Vec::with_capacity(records.len());
        let mut changes = Vec::with_capacity(records.len());

        for (mut record, plan) in records.into_iter().zip(planned) {
            let (rating_before, deviation_before, played_before) =
                (record.rating, record.deviation, record.matches_played);

            record.set_rating(rating_before + plan.delta);
            record.deviation = plan.new_deviation;
            record.matches_played += 1;
            if record.is_provisional
                && record.matches_played >= self.config.provisional_match_threshold
            {
                record.is_provisional = false;
            }
            record.last_updated = now;

            history.push(RatingHistoryEntry {
                id: generate_id(),
                key: record.key.clone(),
                match_id: Some(rated.match_id),
                reason: if plan.won {
                    RatingChangeReason::MatchWin
                } else {
                    RatingChangeReason::MatchLoss
                },
                rating_before,
                rating_after: record.rating,
                deviation_before,
                deviation_after: record.deviation,
                matches_played_before: played_before,
                matches_played_after: record.matches_played,
                delta: plan.delta,
                score_factor: Some(score_factor),
                reversed: false,
                reversed_at: None,
                created_at: now,
            });

            changes.push(PlayerRatingChange {
                player_id: record.key.player_id.clone(),
                won: plan.won,
                expected_score: plan.expected_score,
                rating_before,
                rating_after: record.rating,
                deviation_before,
                deviation_after: record.deviation,
                delta: plan.delta,
            });

            ratings.push(record);
        }

        self.storage.commit(RatingCommit {
            guard_match: Some(rated.match_id),
            ratings,
            history,
            ..Default::default()
        })?;

        info!(
            "Rated {} {} match {} (score factor {:.3})",
            rated.sport,
            rated.mode(),
            rated.match_id,
            score_factor
        );
        for change in &changes {
            debug!(
                "  {}: {:.1} -> {:.1} (RD {:.1} -> {:.1})",
                change.player_id,
                change.rating_before,
                change.rating_after,
                change.deviation_before,
                change.deviation_after
            );
        }

        Ok(MatchRatingUpdate {
            match_id: rated.match_id,
            score_factor,
            changes,
        })
    }

    /// Undo a processed match from its history snapshots
    ///
    /// Ledger rows are marked reversed, never deleted. A match without live
    /// history is a no-op.
    pub fn reverse_match(&self, match_id: &MatchId) -> Result<ReversalSummary> {
        let _guard = self.lock()?;

        let live: Vec<RatingHistoryEntry> = self
            .storage
            .history_for_match(match_id)?
            .into_iter()
            .filter(|entry| !entry.reversed)
            .collect();
        if live.is_empty() {
            debug!("No rating history to reverse for match {}", match_id);
            return Ok(ReversalSummary::default());
        }

        let keys: Vec<RatingKey> = live.iter().map(|entry| entry.key.clone()).collect();
        let mut current = self.storage.get_ratings(&keys)?;
        let now = current_timestamp();

        let mut restored = Vec::with_capacity(live.len());
        let mut rewound = 0;
        for entry in &live {
            let Some(mut record) = current.remove(&entry.key) else {
                warn!(
                    "Rating record for {} missing while reversing match {}",
                    entry.key.player_id, match_id
                );
                continue;
            };
            let last_change = record
                .last_decayed_at
                .map_or(record.last_updated, |decayed| decayed.max(record.last_updated));
            if last_change > entry.created_at {
                warn!(
                    "Reversing match {} rewinds {} past changes made at {} (entry from {})",
                    match_id, entry.key.player_id, last_change, entry.created_at
                );
                rewound += 1;
            }
            record.rating = entry.rating_before;
            record.deviation = entry.deviation_before;
            record.matches_played = entry.matches_played_before;
            record.last_updated = now;
            restored.push(record);
        }

        let summary = ReversalSummary {
            players_restored: restored.len(),
            entries_reversed: live.len(),
            rewound,
        };

        self.storage.commit(RatingCommit {
            ratings: restored,
            reverse_entries: live.iter().map(|entry| entry.id).collect(),
            reversed_at: Some(now),
            ..Default::default()
        })?;

        info!(
            "Reversed match {}: restored {} rating(s)",
            match_id, summary.players_restored
        );
        Ok(summary)
    }

    /// Grow the deviation of every player inactive beyond the threshold
    ///
    /// Growth is measured from the later of the last match and the last
    /// decay, so repeated sweeps do not compound. Per-player failures are
    /// logged and counted.
    pub fn apply_inactivity_decay(&self, now: DateTime<Utc>) -> Result<DecaySummary> {
        let _guard = self.lock()?;
        let threshold = Duration::days(self.config.inactivity_threshold_days);
        let mut summary = DecaySummary::default();

        for mut record in self.storage.all_ratings()? {
            summary.scanned += 1;
            if now - record.last_updated <= threshold {
                continue;
            }

            let since = record
                .last_decayed_at
                .map_or(record.last_updated, |decayed| decayed.max(record.last_updated));
            let inactive_days = (now - since).num_seconds() as f64 / 86_400.0;
            let deviation = self
                .calculator
                .decayed_deviation(record.deviation, inactive_days);
            if deviation <= record.deviation {
                continue;
            }

            let entry = RatingHistoryEntry {
                id: generate_id(),
                key: record.key.clone(),
                match_id: None,
                reason: RatingChangeReason::InactivityDecay,
                rating_before: record.rating,
                rating_after: record.rating,
                deviation_before: record.deviation,
                deviation_after: deviation,
                matches_played_before: record.matches_played,
                matches_played_after: record.matches_played,
                delta: 0.0,
                score_factor: None,
                reversed: false,
                reversed_at: None,
                created_at: now,
            };
            let player_id = record.key.player_id.clone();
            record.deviation = deviation;
            record.last_decayed_at = Some(now);

            match self.storage.commit(RatingCommit {
                ratings: vec![record],
                history: vec![entry],
                ..Default::default()
            }) {
                Ok(()) => summary.decayed += 1,
                Err(err) => {
                    summary.failed += 1;
                    error!("Inactivity decay failed for {}: {}", player_id, err);
                }
            }
        }

        info!(
            "Inactivity decay: scanned {}, decayed {}, failed {}",
            summary.scanned, summary.decayed, summary.failed
        );
        Ok(summary)
    }
}

/// A doubles team as one rated entity: mean rating, RMS deviation
fn team_state(team: &[PlayerRatingRecord]) -> RatingState {
    let n = team.len().max(1) as f64;
    let rating = team.iter().map(|member| member.rating).sum::<f64>() / n;
    let variance = team
        .iter()
        .map(|member| member.deviation * member.deviation)
        .sum::<f64>()
        / n;
    RatingState::new(rating, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_invalid_match_data;
    use crate::rating::models::RatedSet;
    use crate::rating::storage::InMemoryRatingStorage;
    use proptest::prelude::*;

    fn engine() -> RatingEngine {
        RatingEngine::new(
            RatingConfig::default(),
            Arc::new(InMemoryRatingStorage::new()),
        )
        .unwrap()
    }

    fn singles(season_id: SeasonId, winner: &str, loser: &str, sets: Vec<RatedSet>) -> RatedMatch {
        RatedMatch {
            match_id: generate_id(),
            season_id,
            sport: Sport::Pickleball,
            winners: vec![winner.to_string()],
            losers: vec![loser.to_string()],
            sets,
            is_walkover: false,
            played_at: current_timestamp(),
        }
    }

    fn doubles(season_id: SeasonId, winners: [&str; 2], losers: [&str; 2]) -> RatedMatch {
        RatedMatch {
            match_id: generate_id(),
            season_id,
            sport: Sport::Padel,
            winners: winners.iter().map(|p| p.to_string()).collect(),
            losers: losers.iter().map(|p| p.to_string()).collect(),
            sets: vec![RatedSet::new(6, 3), RatedSet::new(6, 4)],
            is_walkover: false,
            played_at: current_timestamp(),
        }
    }

    fn key(player: &str, season_id: SeasonId) -> RatingKey {
        RatingKey::new(player, season_id, Sport::Pickleball, GameMode::Singles)
    }

    #[test]
    fn test_singles_moves_ratings() {
        let engine = engine();
        let season = generate_id();
        let update = engine
            .process_match(&singles(season, "alice", "bob", vec![RatedSet::new(11, 7), RatedSet::new(11, 8)]))
            .unwrap();

        let alice = engine.rating_for(&key("alice", season)).unwrap();
        let bob = engine.rating_for(&key("bob", season)).unwrap();

        assert!(alice.rating > 1500.0);
        assert!(bob.rating < 1500.0);
        assert!(alice.deviation < 350.0);
        assert!(bob.deviation < 350.0);
        assert_eq!(alice.matches_played, 1);
        assert_eq!(alice.peak_rating, alice.rating);
        assert_eq!(bob.lowest_rating, bob.rating);
        assert_eq!(update.change_for("alice").unwrap().expected_score, 0.5);
    }

    #[test]
    fn test_rejected_match_writes_nothing() {
        let engine = engine();
        let season = generate_id();

        let cases = vec![
            singles(season, "alice", "alice", vec![RatedSet::new(11, 3)]),
            singles(season, "alice", "bob", vec![RatedSet::new(11, 10)]),
            singles(season, "alice", "bob", vec![]),
            singles(season, "alice", "bob", vec![RatedSet::new(3, 11), RatedSet::new(11, 9)]),
            singles(season, "alice", "bob", vec![RatedSet::new(11, 0); 6]),
        ];
        for rated in cases {
            let err = engine.process_match(&rated).unwrap_err();
            assert!(is_invalid_match_data(&err), "accepted: {:?}", rated.sets);
        }

        assert_eq!(engine.storage().player_count().unwrap(), 0);
    }

    #[test]
    fn test_walkover_skips_score_validation() {
        let engine = engine();
        let season = generate_id();
        let mut rated = singles(season, "alice", "bob", vec![]);
        rated.is_walkover = true;

        let update = engine.process_match(&rated).unwrap();
        assert_eq!(update.score_factor, 1.0);
        assert!(update.change_for("alice").unwrap().delta > 0.0);
    }

    #[test]
    fn test_same_match_cannot_be_rated_twice() {
        let engine = engine();
        let season = generate_id();
        let rated = singles(season, "alice", "bob", vec![RatedSet::new(11, 5)]);

        engine.process_match(&rated).unwrap();
        let err = engine.process_match(&rated).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LeagueError>(),
            Some(LeagueError::MatchAlreadyRated { .. })
        ));
        assert_eq!(engine.rating_for(&key("alice", season)).unwrap().matches_played, 1);
    }

    #[test]
    fn test_reversal_restores_exact_state() {
        let engine = engine();
        let season = generate_id();

        engine
            .process_match(&singles(season, "alice", "bob", vec![RatedSet::new(11, 4)]))
            .unwrap();
        let alice_before = engine.rating_for(&key("alice", season)).unwrap();
        let bob_before = engine.rating_for(&key("bob", season)).unwrap();

        let second = singles(season, "bob", "alice", vec![RatedSet::new(11, 9), RatedSet::new(12, 10)]);
        engine.process_match(&second).unwrap();

        let summary = engine.reverse_match(&second.match_id).unwrap();
        assert_eq!(summary.players_restored, 2);
        assert_eq!(summary.rewound, 0);

        let alice = engine.rating_for(&key("alice", season)).unwrap();
        let bob = engine.rating_for(&key("bob", season)).unwrap();
        assert_eq!(alice.rating, alice_before.rating);
        assert_eq!(alice.deviation, alice_before.deviation);
        assert_eq!(alice.matches_played, 1);
        assert_eq!(bob.rating, bob_before.rating);
        assert_eq!(bob.deviation, bob_before.deviation);
        assert_eq!(bob.matches_played, 1);

        let rows = engine.storage().history_for_match(&second.match_id).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.reversed));

        // Reversal is idempotent, and the match may be rated again afterwards
        assert_eq!(engine.reverse_match(&second.match_id).unwrap(), ReversalSummary::default());
        engine.process_match(&second).unwrap();
    }

    #[test]
    fn test_reversal_after_decay_reports_rewound_players() {
        let engine = engine();
        let season = generate_id();
        let first = singles(season, "alice", "bob", vec![RatedSet::new(11, 4)]);
        engine.process_match(&first).unwrap();

        let later = current_timestamp() + Duration::days(60);
        assert_eq!(engine.apply_inactivity_decay(later).unwrap().decayed, 2);

        let summary = engine.reverse_match(&first.match_id).unwrap();
        assert_eq!(summary.players_restored, 2);
        assert_eq!(summary.rewound, 2);
        let alice = engine.rating_for(&key("alice", season)).unwrap();
        assert_eq!(alice.deviation, 350.0);
    }

    #[test]
    fn test_reversing_unknown_match_is_noop() {
        let engine = engine();
        let summary = engine.reverse_match(&generate_id()).unwrap();
        assert_eq!(summary, ReversalSummary::default());
    }

    #[test]
    fn test_provisional_flips_at_threshold() {
        let engine = engine();
        let season = generate_id();

        for played in 1..=12u32 {
            engine
                .process_match(&singles(season, "alice", "bob", vec![RatedSet::new(11, 6)]))
                .unwrap();
            let alice = engine.rating_for(&key("alice", season)).unwrap();
            assert_eq!(alice.is_provisional, played < 10, "after {} matches", played);
        }
    }

    #[test]
    fn test_doubles_updates_all_four() {
        let engine = engine();
        let season = generate_id();
        let doubles_key = |p: &str| RatingKey::new(p, season, Sport::Padel, GameMode::Doubles);

        engine
            .place_player(&doubles_key("veteran"), 1600.0, Some(60.0))
            .unwrap();

        let update = engine
            .process_match(&doubles(season, ["veteran", "rookie"], ["c", "d"]))
            .unwrap();
        assert_eq!(update.changes.len(), 4);

        let veteran = update.change_for("veteran").unwrap();
        let rookie = update.change_for("rookie").unwrap();
        assert!(veteran.delta > 0.0);
        assert!(rookie.delta > veteran.delta);
        assert!(update.change_for("c").unwrap().delta < 0.0);
        assert!(update.change_for("d").unwrap().delta < 0.0);

        for change in &update.changes {
            let cap = engine.calculator().max_delta(change.deviation_before);
            assert!(change.delta.abs() <= cap + 1e-9);
            assert!(change.deviation_after < change.deviation_before);
        }
    }

    #[test]
    fn test_placement_only_before_first_match() {
        let engine = engine();
        let season = generate_id();

        let placed = engine.place_player(&key("alice", season), 1720.0, Some(200.0)).unwrap();
        assert_eq!(placed.rating, 1720.0);
        assert_eq!(placed.peak_rating, 1720.0);
        assert!(placed.is_provisional);

        assert!(engine.place_player(&key("alice", season), 1800.0, Some(1000.0)).is_err());

        engine
            .process_match(&singles(season, "alice", "bob", vec![RatedSet::new(11, 2)]))
            .unwrap();
        assert!(engine.place_player(&key("alice", season), 1800.0, None).is_err());
    }

    #[test]
    fn test_inactivity_decay() {
        let storage = Arc::new(InMemoryRatingStorage::new());
        let engine = RatingEngine::new(RatingConfig::default(), storage.clone()).unwrap();
        let season = generate_id();
        let now = current_timestamp();

        let mut idle = PlayerRatingRecord::new(key("idle", season), &RatingConfig::default());
        idle.deviation = 80.0;
        idle.last_updated = now - Duration::days(60);
        let mut active = PlayerRatingRecord::new(key("active", season), &RatingConfig::default());
        active.deviation = 80.0;
        active.last_updated = now - Duration::days(5);
        storage
            .commit(RatingCommit {
                ratings: vec![idle.clone(), active.clone()],
                ..Default::default()
            })
            .unwrap();

        let summary = engine.apply_inactivity_decay(now).unwrap();
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.decayed, 1);

        let idle_after = engine.rating_for(&idle.key).unwrap();
        assert!(idle_after.deviation > 80.0);
        assert!(idle_after.deviation <= 350.0);
        assert_eq!(idle_after.rating, idle.rating);
        assert_eq!(engine.rating_for(&active.key).unwrap().deviation, 80.0);

        // A second sweep at the same instant does not compound
        let again = engine.apply_inactivity_decay(now).unwrap();
        assert_eq!(again.decayed, 0);
        assert_eq!(engine.rating_for(&idle.key).unwrap().deviation, idle_after.deviation);

        let history = engine.history(&idle.key).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reason, RatingChangeReason::InactivityDecay);
    }

    #[test]
    fn test_leaderboard_orders_by_rating() {
        let engine = engine();
        let season = generate_id();
        engine
            .process_match(&singles(season, "alice", "bob", vec![RatedSet::new(11, 1)]))
            .unwrap();

        let board = engine
            .leaderboard(&season, Sport::Pickleball, GameMode::Singles, None)
            .unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].player_id, "alice");
        assert_eq!(board[0].confidence_low, board[0].rating - 2.0 * board[0].deviation);
    }

    proptest! {
        #[test]
        fn prop_delta_never_exceeds_cap(
            winner_rating in 800.0f64..2400.0,
            loser_rating in 800.0f64..2400.0,
            winner_rd in 30.0f64..350.0,
            loser_rd in 30.0f64..350.0,
            loser_points in 0i32..10,
        ) {
            let engine = engine();
            let season = generate_id();
            engine.place_player(&key("w", season), winner_rating, Some(winner_rd)).unwrap();
            engine.place_player(&key("l", season), loser_rating, Some(loser_rd)).unwrap();

            let update = engine
                .process_match(&singles(season, "w", "l", vec![RatedSet::new(11, loser_points)]))
                .unwrap();

            for change in &update.changes {
                let cap = (0.08 * change.deviation_before).min(75.0);
                prop_assert!(change.delta.abs() <= cap + 1e-9);
                prop_assert!(change.deviation_after <= change.deviation_before);
            }
            prop_assert!(update.change_for("w").unwrap().delta >= 0.0);
            prop_assert!(update.change_for("l").unwrap().delta <= 0.0);
        }
    }
}
