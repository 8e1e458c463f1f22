//! Rating storage interface and implementations
//!
//! Ratings and their history ledger are written together through
//! [`RatingCommit`], so a processed match, a reversal or a decay step either
//! lands completely or not at all.

use crate::error::{LeagueError, Result};
use crate::rating::models::{PlayerRatingRecord, RatingHistoryEntry, RatingKey};
use crate::types::{GameMode, MatchId, SeasonId, Sport};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// One unit of work against the rating store
#[derive(Debug, Clone, Default)]
pub struct RatingCommit {
    /// Rejects the commit when this match already has unreversed history
    pub guard_match: Option<MatchId>,
    /// Records to insert or replace
    pub ratings: Vec<PlayerRatingRecord>,
    /// New ledger rows
    pub history: Vec<RatingHistoryEntry>,
    /// Ledger rows to mark reversed; each must exist and be live
    pub reverse_entries: Vec<Uuid>,
    pub reversed_at: Option<DateTime<Utc>>,
}

/// Trait for rating storage operations
pub trait RatingStorage: Send + Sync {
    /// Get one rating record
    fn get_rating(&self, key: &RatingKey) -> Result<Option<PlayerRatingRecord>>;

    /// Get the records that exist among `keys`
    fn get_ratings(&self, keys: &[RatingKey]) -> Result<HashMap<RatingKey, PlayerRatingRecord>>;

    /// Apply a unit of work atomically
    fn commit(&self, commit: RatingCommit) -> Result<()>;

    /// Ledger rows written for a match, reversed ones included
    fn history_for_match(&self, match_id: &MatchId) -> Result<Vec<RatingHistoryEntry>>;

    /// Ledger rows of one rating pool entry, oldest first
    fn history_for_player(&self, key: &RatingKey) -> Result<Vec<RatingHistoryEntry>>;

    /// Every stored record (for sweeps)
    fn all_ratings(&self) -> Result<Vec<PlayerRatingRecord>>;

    /// Records of one rating pool, highest rating first
    fn ratings_for_pool(
        &self,
        season_id: &SeasonId,
        sport: Sport,
        mode: GameMode,
        limit: Option<usize>,
    ) -> Result<Vec<PlayerRatingRecord>>;

    /// Number of stored rating records
    fn player_count(&self) -> Result<usize>;
}

#[derive(Debug, Default)]
struct RatingTables {
    ratings: HashMap<RatingKey, PlayerRatingRecord>,
    history: Vec<RatingHistoryEntry>,
}

/// In-memory rating storage implementation
#[derive(Debug, Default)]
pub struct InMemoryRatingStorage {
    tables: RwLock<RatingTables>,
}

impl InMemoryRatingStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RatingStorage for InMemoryRatingStorage {
    fn get_rating(&self, key: &RatingKey) -> Result<Option<PlayerRatingRecord>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| LeagueError::lock_poisoned("ratings read"))?;

        Ok(tables.ratings.get(key).cloned())
    }

    fn get_ratings(&self, keys: &[RatingKey]) -> Result<HashMap<RatingKey, PlayerRatingRecord>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| LeagueError::lock_poisoned("ratings read"))?;

        let mut result = HashMap::new();
        for key in keys {
            if let Some(record) = tables.ratings.get(key) {
                result.insert(key.clone(), record.clone());
            }
        }

        Ok(result)
    }

    fn commit(&self, commit: RatingCommit) -> Result<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| LeagueError::lock_poisoned("ratings write"))?;

        if let Some(match_id) = commit.guard_match {
            let already_rated = tables
                .history
                .iter()
                .any(|entry| entry.match_id == Some(match_id) && !entry.reversed);
            if already_rated {
                return Err(LeagueError::MatchAlreadyRated {
                    match_id: match_id.to_string(),
                }
                .into());
            }
        }

        for id in &commit.reverse_entries {
            match tables.history.iter().find(|entry| &entry.id == id) {
                Some(entry) if !entry.reversed => {}
                Some(_) => {
                    return Err(LeagueError::InternalError {
                        message: format!("History entry {} is already reversed", id),
                    }
                    .into())
                }
                None => {
                    return Err(LeagueError::InternalError {
                        message: format!("History entry {} does not exist", id),
                    }
                    .into())
                }
            }
        }

        let reversed_at = commit.reversed_at.unwrap_or_else(Utc::now);
        for entry in tables.history.iter_mut() {
            if commit.reverse_entries.contains(&entry.id) {
                entry.reversed = true;
                entry.reversed_at = Some(reversed_at);
            }
        }

        for record in commit.ratings {
            tables.ratings.insert(record.key.clone(), record);
        }
        tables.history.extend(commit.history);

        Ok(())
    }

    fn history_for_match(&self, match_id: &MatchId) -> Result<Vec<RatingHistoryEntry>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| LeagueError::lock_poisoned("ratings read"))?;

        Ok(tables
            .history
            .iter()
            .filter(|entry| entry.match_id.as_ref() == Some(match_id))
            .cloned()
            .collect())
    }

    fn history_for_player(&self, key: &RatingKey) -> Result<Vec<RatingHistoryEntry>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| LeagueError::lock_poisoned("ratings read"))?;

        Ok(tables
            .history
            .iter()
            .filter(|entry| &entry.key == key)
            .cloned()
            .collect())
    }

    fn all_ratings(&self) -> Result<Vec<PlayerRatingRecord>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| LeagueError::lock_poisoned("ratings read"))?;

        Ok(tables.ratings.values().cloned().collect())
    }

    fn ratings_for_pool(
        &self,
        season_id: &SeasonId,
        sport: Sport,
        mode: GameMode,
        limit: Option<usize>,
    ) -> Result<Vec<PlayerRatingRecord>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| LeagueError::lock_poisoned("ratings read"))?;

        let mut matching: Vec<PlayerRatingRecord> = tables
            .ratings
            .values()
            .filter(|record| {
                &record.key.season_id == season_id
                    && record.key.sport == sport
                    && record.key.mode == mode
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| a.key.player_id.cmp(&b.key.player_id))
        });

        if let Some(limit) = limit {
            matching.truncate(limit);
        }

        Ok(matching)
    }

    fn player_count(&self) -> Result<usize> {
        let tables = self
            .tables
            .read()
            .map_err(|_| LeagueError::lock_poisoned("ratings read"))?;

        Ok(tables.ratings.len())
    }
}
