//! Result storage interface and implementations
//!
//! This module defines the interface for persisting materialized match
//! results, with an in-memory implementation that keeps every multi-row
//! write under a single lock.

use crate::error::{LeagueError, Result};
use crate::results::models::{MatchResult, SelectionUpdate};
use crate::types::{DivisionId, MatchId, PlayerId, ResultId, SeasonId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for match result storage operations
pub trait ResultStorage: Send + Sync {
    /// All results recorded for a match
    fn results_for_match(&self, match_id: &MatchId) -> Result<Vec<MatchResult>>;

    /// Store all results of a match in one unit of work.
    ///
    /// Returns `false` and writes nothing when the match already has results.
    fn insert_match_results(&self, match_id: &MatchId, results: Vec<MatchResult>) -> Result<bool>;

    /// Remove every result of a match, returning how many were removed
    fn delete_match_results(&self, match_id: &MatchId) -> Result<usize>;

    /// A player's results in one division and season, oldest first
    fn results_for_player(
        &self,
        player_id: &PlayerId,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<Vec<MatchResult>>;

    /// Every result in one division and season, oldest first
    fn results_for_division(
        &self,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<Vec<MatchResult>>;

    /// Apply best-N flags atomically; unknown result ids are an error
    fn apply_selection(&self, updates: &[SelectionUpdate]) -> Result<()>;

    /// Total number of stored results
    fn result_count(&self) -> Result<usize>;
}

#[derive(Debug, Default)]
struct ResultTables {
    results: HashMap<ResultId, MatchResult>,
    by_match: HashMap<MatchId, Vec<ResultId>>,
}

/// In-memory result storage implementation
#[derive(Debug, Default)]
pub struct InMemoryResultStorage {
    tables: RwLock<ResultTables>,
}

impl InMemoryResultStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_sorted<F>(&self, filter: F) -> Result<Vec<MatchResult>>
    where
        F: Fn(&MatchResult) -> bool,
    {
        let tables = self
            .tables
            .read()
            .map_err(|_| LeagueError::lock_poisoned("results read"))?;

        let mut results: Vec<MatchResult> = tables
            .results
            .values()
            .filter(|result| filter(result))
            .cloned()
            .collect();
        results.sort_by(|a, b| a.played_at.cmp(&b.played_at).then(a.id.cmp(&b.id)));
        Ok(results)
    }
}

impl ResultStorage for InMemoryResultStorage {
    fn results_for_match(&self, match_id: &MatchId) -> Result<Vec<MatchResult>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| LeagueError::lock_poisoned("results read"))?;

        Ok(tables
            .by_match
            .get(match_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| tables.results.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn insert_match_results(&self, match_id: &MatchId, results: Vec<MatchResult>) -> Result<bool> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| LeagueError::lock_poisoned("results write"))?;

        if tables.by_match.get(match_id).is_some_and(|ids| !ids.is_empty()) {
            return Ok(false);
        }

        let ids: Vec<ResultId> = results.iter().map(|result| result.id).collect();
        for result in results {
            tables.results.insert(result.id, result);
        }
        tables.by_match.insert(*match_id, ids);

        Ok(true)
    }

    fn delete_match_results(&self, match_id: &MatchId) -> Result<usize> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| LeagueError::lock_poisoned("results write"))?;

        let ids = tables.by_match.remove(match_id).unwrap_or_default();
        let mut removed = 0;
        for id in &ids {
            if tables.results.remove(id).is_some() {
                removed += 1;
            }
        }

        Ok(removed)
    }

    fn results_for_player(
        &self,
        player_id: &PlayerId,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<Vec<MatchResult>> {
        self.collect_sorted(|result| {
            &result.player_id == player_id
                && &result.division_id == division_id
                && &result.season_id == season_id
        })
    }

    fn results_for_division(
        &self,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<Vec<MatchResult>> {
        self.collect_sorted(|result| {
            &result.division_id == division_id && &result.season_id == season_id
        })
    }

    fn apply_selection(&self, updates: &[SelectionUpdate]) -> Result<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| LeagueError::lock_poisoned("results write"))?;

        if let Some(missing) = updates
            .iter()
            .find(|update| !tables.results.contains_key(&update.result_id))
        {
            return Err(LeagueError::InternalError {
                message: format!("Result {} no longer exists", missing.result_id),
            }
            .into());
        }

        for update in updates {
            if let Some(result) = tables.results.get_mut(&update.result_id) {
                result.counts_for_standings = update.counts_for_standings;
                result.result_sequence = update.result_sequence;
            }
        }

        Ok(())
    }

    fn result_count(&self) -> Result<usize> {
        let tables = self
            .tables
            .read()
            .map_err(|_| LeagueError::lock_poisoned("results read"))?;

        Ok(tables.results.len())
    }
}
