//! Standings engine
//!
//! Owns the division tables and the best-N flags on materialized results.
//! Every rebuild works from the stored results alone, so any division can be
//! recomputed at any time. Work on one (division, season) is serialized by
//! a per-division lock; distinct divisions proceed in parallel.

use crate::config::StandingsConfig;
use crate::error::{LeagueError, Result};
use crate::results::{MatchResult, ResultStorage, SelectionUpdate};
use crate::standings::best_n::{is_change, plan_selection, policy_for, BestNPolicy};
use crate::standings::models::{DivisionStanding, SelectionSummary};
use crate::standings::points::aggregate;
use crate::standings::provider::{DivisionInfo, DivisionProvider};
use crate::standings::ranking::rank_standings;
use crate::standings::storage::StandingsStorage;
use crate::types::{DivisionId, PlayerId, SeasonId};
use crate::utils::current_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Outcome of a multi-division sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub refreshed: Vec<DivisionId>,
    pub failed: Vec<(DivisionId, String)>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct StandingsEngine {
    config: StandingsConfig,
    policy: Box<dyn BestNPolicy>,
    results: Arc<dyn ResultStorage>,
    standings: Arc<dyn StandingsStorage>,
    divisions: Arc<dyn DivisionProvider>,
    division_locks: Mutex<HashMap<(DivisionId, SeasonId), Arc<Mutex<()>>>>,
}

impl StandingsEngine {
    pub fn new(
        config: StandingsConfig,
        results: Arc<dyn ResultStorage>,
        standings: Arc<dyn StandingsStorage>,
        divisions: Arc<dyn DivisionProvider>,
    ) -> Result<Self> {
        config.validate()?;
        let policy = policy_for(config.best_n_policy);
        Ok(Self {
            config,
            policy,
            results,
            standings,
            divisions,
            division_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Replace the best-N policy chosen by configuration
    pub fn with_policy(mut self, policy: Box<dyn BestNPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &StandingsConfig {
        &self.config
    }

    pub fn divisions(&self) -> &Arc<dyn DivisionProvider> {
        &self.divisions
    }

    fn division_lock(&self, division_id: &DivisionId, season_id: &SeasonId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .division_locks
            .lock()
            .map_err(|_| LeagueError::lock_poisoned("division lock table"))?;
        Ok(locks
            .entry((*division_id, *season_id))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// Ranked table as last stored
    pub fn standings(&self, division_id: &DivisionId, season_id: &SeasonId) -> Result<Vec<DivisionStanding>> {
        self.standings.standings_for_division(division_id, season_id)
    }

    /// Redo best-N selection for one player
    pub fn recalculate_best_n(
        &self,
        player_id: &PlayerId,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<SelectionSummary> {
        let lock = self.division_lock(division_id, season_id)?;
        let _guard = lock.lock().map_err(|_| LeagueError::lock_poisoned("division"))?;
        self.select_for_player(player_id, division_id, season_id)
    }

    /// Redo best-N selection for every player of a division
    pub fn recalculate_division_best_n(
        &self,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<SelectionSummary> {
        let lock = self.division_lock(division_id, season_id)?;
        let _guard = lock.lock().map_err(|_| LeagueError::lock_poisoned("division"))?;
        self.select_for_division(division_id, season_id)
    }

    /// Recompute one player's row; the stored rank is kept until the next
    /// division rebuild
    pub fn recalculate_player(
        &self,
        player_id: &PlayerId,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<DivisionStanding> {
        let lock = self.division_lock(division_id, season_id)?;
        let _guard = lock.lock().map_err(|_| LeagueError::lock_poisoned("division"))?;

        let roster = self.roster(division_id, season_id)?;
        self.select_for_player(player_id, division_id, season_id)?;

        let results = self
            .results
            .results_for_player(player_id, division_id, season_id)?;
        if results.is_empty() && roster.member(player_id).is_none() {
            return Err(LeagueError::PlayerNotFound {
                player_id: player_id.clone(),
            }
            .into());
        }

        let mut row = self.build_row(&roster, player_id, &results);
        row.rank = self
            .standings
            .get_standing(division_id, season_id, player_id)?
            .and_then(|existing| existing.rank);
        self.standings.upsert_standing(row.clone())?;

        debug!(
            "Recalculated {} in division {}: {} points",
            player_id, roster.name, row.total_points
        );
        Ok(row)
    }

    /// Rebuild and rank the whole division from the current selection
    pub fn recalculate_division(
        &self,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<Vec<DivisionStanding>> {
        let lock = self.division_lock(division_id, season_id)?;
        let _guard = lock.lock().map_err(|_| LeagueError::lock_poisoned("division"))?;
        self.rebuild_division(division_id, season_id)
    }

    /// Best-N for every player, then a full rebuild
    pub fn refresh_division(
        &self,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<Vec<DivisionStanding>> {
        let lock = self.division_lock(division_id, season_id)?;
        let _guard = lock.lock().map_err(|_| LeagueError::lock_poisoned("division"))?;
        self.select_for_division(division_id, season_id)?;
        self.rebuild_division(division_id, season_id)
    }

    /// Best-N for the given players, then a full rebuild
    pub fn refresh_players(
        &self,
        player_ids: &[PlayerId],
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<Vec<DivisionStanding>> {
        let lock = self.division_lock(division_id, season_id)?;
        let _guard = lock.lock().map_err(|_| LeagueError::lock_poisoned("division"))?;
        for player_id in player_ids {
            self.select_for_player(player_id, division_id, season_id)?;
        }
        self.rebuild_division(division_id, season_id)
    }

    /// Refresh each target in turn, logging and collecting failures
    pub fn sweep(&self, targets: &[(DivisionId, SeasonId)]) -> SweepReport {
        let mut report = SweepReport::default();
        for (division_id, season_id) in targets {
            match self.refresh_division(division_id, season_id) {
                Ok(rows) => {
                    debug!("Refreshed division {} ({} rows)", division_id, rows.len());
                    report.refreshed.push(*division_id);
                }
                Err(err) => {
                    error!("Failed to refresh division {}: {}", division_id, err);
                    report.failed.push((*division_id, err.to_string()));
                }
            }
        }
        info!(
            "Standings sweep: {} refreshed, {} failed",
            report.refreshed.len(),
            report.failed.len()
        );
        report
    }

    fn roster(&self, division_id: &DivisionId, season_id: &SeasonId) -> Result<DivisionInfo> {
        match self.divisions.division(division_id)? {
            Some(info) if &info.season_id == season_id => Ok(info),
            Some(info) => {
                warn!(
                    "Division {} belongs to season {}, not {}",
                    info.name, info.season_id, season_id
                );
                Err(LeagueError::DivisionNotFound {
                    division_id: division_id.to_string(),
                }
                .into())
            }
            None => Err(LeagueError::DivisionNotFound {
                division_id: division_id.to_string(),
            }
            .into()),
        }
    }

    fn select_for_player(
        &self,
        player_id: &PlayerId,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<SelectionSummary> {
        let results = self
            .results
            .results_for_player(player_id, division_id, season_id)?;
        let mut summary = SelectionSummary::default();
        let changes = self.plan(&results, &mut summary);
        if !changes.is_empty() {
            self.results.apply_selection(&changes)?;
        }
        Ok(summary)
    }

    fn select_for_division(&self, division_id: &DivisionId, season_id: &SeasonId) -> Result<SelectionSummary> {
        let results = self.results.results_for_division(division_id, season_id)?;
        let mut summary = SelectionSummary::default();
        let mut changes = Vec::new();
        for player_results in group_by_player(results).values() {
            changes.extend(self.plan(player_results, &mut summary));
        }
        if !changes.is_empty() {
            self.results.apply_selection(&changes)?;
        }
        debug!(
            "Best-{} ({}) for division {}: {} players, {} selected, {} changed",
            self.config
                .best_n
                .map_or_else(|| "all".to_string(), |n| n.to_string()),
            self.policy.name(),
            division_id,
            summary.players,
            summary.selected,
            summary.changed
        );
        Ok(summary)
    }

    /// Changed selection flags for one player's results
    fn plan(&self, results: &[MatchResult], summary: &mut SelectionSummary) -> Vec<SelectionUpdate> {
        if results.is_empty() {
            return Vec::new();
        }
        let updates = plan_selection(self.policy.as_ref(), results, self.config.best_n);
        let by_id: HashMap<_, _> = results.iter().map(|result| (result.id, result)).collect();

        summary.players += 1;
        summary.selected += updates.iter().filter(|u| u.counts_for_standings).count();
        let changes: Vec<SelectionUpdate> = updates
            .into_iter()
            .filter(|update| {
                by_id
                    .get(&update.result_id)
                    .is_some_and(|result| is_change(result, update))
            })
            .collect();
        summary.changed += changes.len();
        changes
    }

    fn rebuild_division(&self, division_id: &DivisionId, season_id: &SeasonId) -> Result<Vec<DivisionStanding>> {
        let roster = self.roster(division_id, season_id)?;
        let mut by_player = group_by_player(self.results.results_for_division(division_id, season_id)?);

        let mut rows = Vec::with_capacity(roster.members.len());
        for member in &roster.members {
            let results = by_player.remove(&member.player_id).unwrap_or_default();
            rows.push(self.build_row(&roster, &member.player_id, &results));
        }
        for (player_id, results) in &by_player {
            warn!(
                "Player {} has results in division {} but is not on its roster",
                player_id, roster.name
            );
            rows.push(self.build_row(&roster, player_id, results));
        }

        rank_standings(&mut rows);
        self.standings
            .replace_division(division_id, season_id, rows.clone())?;

        info!(
            "Rebuilt division {} standings ({} players)",
            roster.name,
            rows.len()
        );
        Ok(rows)
    }

    fn build_row(&self, roster: &DivisionInfo, player_id: &PlayerId, results: &[MatchResult]) -> DivisionStanding {
        let (display_name, scheduled) = match roster.member(player_id) {
            Some(member) => (member.display_name.clone(), member.matches_scheduled),
            None => (player_id.clone(), 0),
        };

        let mut row = DivisionStanding::new(
            player_id.clone(),
            roster.division_id,
            roster.season_id,
            display_name,
            scheduled,
        );
        aggregate(
            &self.config,
            &mut row,
            results.iter().filter(|result| result.counts_for_standings),
            results.len() as u32,
        );
        row.updated_at = current_timestamp();
        row
    }
}

fn group_by_player(results: Vec<MatchResult>) -> BTreeMap<PlayerId, Vec<MatchResult>> {
    let mut grouped: BTreeMap<PlayerId, Vec<MatchResult>> = BTreeMap::new();
    for result in results {
        grouped.entry(result.player_id.clone()).or_default().push(result);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BestNPolicyKind;
    use crate::points::PointAward;
    use crate::results::InMemoryResultStorage;
    use crate::standings::provider::{DivisionMember, StaticDivisionProvider};
    use crate::standings::storage::InMemoryStandingsStorage;
    use crate::types::{GameMode, Side, Sport};
    use crate::utils::generate_id;
    use chrono::Duration;

    struct Harness {
        engine: StandingsEngine,
        results: Arc<InMemoryResultStorage>,
        division_id: DivisionId,
        season_id: SeasonId,
    }

    fn harness(config: StandingsConfig) -> Harness {
        let division_id = generate_id();
        let season_id = generate_id();
        let provider = StaticDivisionProvider::with_divisions(vec![DivisionInfo {
            division_id,
            season_id,
            name: "Division 1".to_string(),
            sport: Sport::Pickleball,
            mode: GameMode::Singles,
            members: vec![
                DivisionMember::new("ann", "Ann", 10),
                DivisionMember::new("bea", "Bea", 10),
                DivisionMember::new("cal", "Cal", 10),
            ],
        }])
        .unwrap();

        let results = Arc::new(InMemoryResultStorage::new());
        let engine = StandingsEngine::new(
            config,
            results.clone(),
            Arc::new(InMemoryStandingsStorage::new()),
            Arc::new(provider),
        )
        .unwrap();

        Harness {
            engine,
            results,
            division_id,
            season_id,
        }
    }

    impl Harness {
        /// Record a 2-0 win of `winner` over `loser`, `days_ago` days back
        fn play(&self, winner: &str, loser: &str, days_ago: i64) {
            let match_id = generate_id();
            let played_at = current_timestamp() - Duration::days(days_ago);
            let row = |player: &str, opponent: &str, won: bool| MatchResult {
                id: generate_id(),
                match_id,
                player_id: player.to_string(),
                opponent_id: opponent.to_string(),
                partner_id: None,
                division_id: self.division_id,
                season_id: self.season_id,
                sport: Sport::Pickleball,
                mode: GameMode::Singles,
                side: if won { Side::A } else { Side::B },
                is_winner: won,
                points: if won {
                    PointAward {
                        participation: 1,
                        sets_won_points: 2,
                        win_bonus: 2,
                        total: 5,
                    }
                } else {
                    PointAward {
                        participation: 1,
                        sets_won_points: 0,
                        win_bonus: 0,
                        total: 1,
                    }
                },
                margin: if won { 12 } else { -12 },
                sets_won: if won { 2 } else { 0 },
                sets_lost: if won { 0 } else { 2 },
                games_won: if won { 22 } else { 10 },
                games_lost: if won { 10 } else { 22 },
                is_walkover: false,
                played_at,
                created_at: played_at,
                counts_for_standings: false,
                result_sequence: None,
            };
            self.results
                .insert_match_results(&match_id, vec![row(winner, loser, true), row(loser, winner, false)])
                .unwrap();
        }
    }

    #[test]
    fn test_refresh_division_ranks_everyone() {
        let h = harness(StandingsConfig::default());
        h.play("ann", "bea", 3);
        h.play("ann", "cal", 2);
        h.play("bea", "cal", 1);

        let table = h.engine.refresh_division(&h.division_id, &h.season_id).unwrap();
        let order: Vec<&str> = table.iter().map(|s| s.player_id.as_str()).collect();
        assert_eq!(order, vec!["ann", "bea", "cal"]);

        let ann = &table[0];
        assert_eq!(ann.rank, Some(1));
        assert_eq!(ann.wins, 2);
        assert_eq!(ann.win_points, 6);
        assert_eq!(ann.completion_bonus, 2);
        assert_eq!(ann.total_points, 8);
        assert_eq!(ann.matches_remaining, 8);
        assert_eq!(ann.head_to_head["bea"].wins, 1);

        assert_eq!(h.engine.standings(&h.division_id, &h.season_id).unwrap(), table);
    }

    #[test]
    fn test_roster_players_without_results_are_listed() {
        let h = harness(StandingsConfig::default());
        h.play("ann", "bea", 1);

        let table = h.engine.refresh_division(&h.division_id, &h.season_id).unwrap();
        let cal = table.iter().find(|s| s.player_id == "cal").unwrap();
        assert_eq!(cal.total_points, 0);
        assert_eq!(cal.rank, Some(3));
        assert_eq!(cal.matches_remaining, 10);
    }

    #[test]
    fn test_best_n_limits_counted_results() {
        let config = StandingsConfig {
            best_n: Some(2),
            best_n_policy: BestNPolicyKind::HighestScoring,
            ..Default::default()
        };
        let h = harness(config);
        h.play("ann", "bea", 4);
        h.play("bea", "ann", 3);
        h.play("ann", "cal", 2);

        let summary = h
            .engine
            .recalculate_division_best_n(&h.division_id, &h.season_id)
            .unwrap();
        assert_eq!(summary.players, 3);

        let ann_results = h
            .results
            .results_for_player(&"ann".to_string(), &h.division_id, &h.season_id)
            .unwrap();
        assert_eq!(ann_results.len(), 3);
        let counted: Vec<bool> = ann_results.iter().map(|r| r.counts_for_standings).collect();
        assert_eq!(counted, vec![true, false, true]);

        let table = h.engine.recalculate_division(&h.division_id, &h.season_id).unwrap();
        let ann = table.iter().find(|s| s.player_id == "ann").unwrap();
        assert_eq!(ann.matches_counted, 2);
        assert_eq!(ann.matches_played, 3);
        assert_eq!(ann.completion_bonus, 3);
        assert_eq!(ann.wins, 2);
        assert_eq!(ann.losses, 0);
        assert_eq!(ann.matches_remaining, 7);

        // Second run changes nothing
        let again = h
            .engine
            .recalculate_division_best_n(&h.division_id, &h.season_id)
            .unwrap();
        assert_eq!(again.changed, 0);
        assert_eq!(h.results.result_count().unwrap(), 6);
    }

    #[test]
    fn test_recalculate_player_keeps_rank() {
        let h = harness(StandingsConfig::default());
        h.play("bea", "ann", 2);
        h.engine.refresh_division(&h.division_id, &h.season_id).unwrap();

        h.play("ann", "cal", 1);
        let ann = h
            .engine
            .recalculate_player(&"ann".to_string(), &h.division_id, &h.season_id)
            .unwrap();
        assert_eq!(ann.wins, 1);
        assert_eq!(ann.losses, 1);
        assert_eq!(ann.rank, Some(2));

        let err = h
            .engine
            .recalculate_player(&"nobody".to_string(), &h.division_id, &h.season_id)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LeagueError>(),
            Some(LeagueError::PlayerNotFound { .. })
        ));
    }

    #[test]
    fn test_sweep_collects_failures() {
        let h = harness(StandingsConfig::default());
        h.play("ann", "bea", 1);

        let unknown = generate_id();
        let report = h
            .engine
            .sweep(&[(unknown, h.season_id), (h.division_id, h.season_id)]);

        assert_eq!(report.refreshed, vec![h.division_id]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, unknown);
        assert!(!report.is_clean());
    }
}
