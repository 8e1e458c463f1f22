//! Standings storage interface and implementations

use crate::error::{LeagueError, Result};
use crate::standings::models::DivisionStanding;
use crate::types::{DivisionId, PlayerId, SeasonId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for division standing storage operations
pub trait StandingsStorage: Send + Sync {
    fn get_standing(
        &self,
        division_id: &DivisionId,
        season_id: &SeasonId,
        player_id: &PlayerId,
    ) -> Result<Option<DivisionStanding>>;

    /// Rows of one division, ranked rows first in rank order
    fn standings_for_division(
        &self,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<Vec<DivisionStanding>>;

    /// Replace every row of a division in one unit of work
    fn replace_division(
        &self,
        division_id: &DivisionId,
        season_id: &SeasonId,
        standings: Vec<DivisionStanding>,
    ) -> Result<()>;

    /// Insert or replace a single row
    fn upsert_standing(&self, standing: DivisionStanding) -> Result<()>;
}

type DivisionKey = (DivisionId, SeasonId);

/// In-memory standings storage implementation
#[derive(Debug, Default)]
pub struct InMemoryStandingsStorage {
    divisions: RwLock<HashMap<DivisionKey, HashMap<PlayerId, DivisionStanding>>>,
}

impl InMemoryStandingsStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StandingsStorage for InMemoryStandingsStorage {
    fn get_standing(
        &self,
        division_id: &DivisionId,
        season_id: &SeasonId,
        player_id: &PlayerId,
    ) -> Result<Option<DivisionStanding>> {
        let divisions = self
            .divisions
            .read()
            .map_err(|_| LeagueError::lock_poisoned("standings read"))?;

        Ok(divisions
            .get(&(*division_id, *season_id))
            .and_then(|rows| rows.get(player_id))
            .cloned())
    }

    fn standings_for_division(
        &self,
        division_id: &DivisionId,
        season_id: &SeasonId,
    ) -> Result<Vec<DivisionStanding>> {
        let divisions = self
            .divisions
            .read()
            .map_err(|_| LeagueError::lock_poisoned("standings read"))?;

        let mut rows: Vec<DivisionStanding> = divisions
            .get(&(*division_id, *season_id))
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| {
            a.rank
                .unwrap_or(u32::MAX)
                .cmp(&b.rank.unwrap_or(u32::MAX))
                .then_with(|| a.display_name.cmp(&b.display_name))
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        Ok(rows)
    }

    fn replace_division(
        &self,
        division_id: &DivisionId,
        season_id: &SeasonId,
        standings: Vec<DivisionStanding>,
    ) -> Result<()> {
        if let Some(stray) = standings
            .iter()
            .find(|s| &s.division_id != division_id || &s.season_id != season_id)
        {
            return Err(LeagueError::InternalError {
                message: format!(
                    "Standing for {} belongs to another division or season",
                    stray.player_id
                ),
            }
            .into());
        }

        let mut divisions = self
            .divisions
            .write()
            .map_err(|_| LeagueError::lock_poisoned("standings write"))?;

        let rows = standings
            .into_iter()
            .map(|standing| (standing.player_id.clone(), standing))
            .collect();
        divisions.insert((*division_id, *season_id), rows);
        Ok(())
    }

    fn upsert_standing(&self, standing: DivisionStanding) -> Result<()> {
        let mut divisions = self
            .divisions
            .write()
            .map_err(|_| LeagueError::lock_poisoned("standings write"))?;

        divisions
            .entry((standing.division_id, standing.season_id))
            .or_default()
            .insert(standing.player_id.clone(), standing);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generate_id;

    #[test]
    fn test_replace_and_list_division() {
        let storage = InMemoryStandingsStorage::new();
        let (division, season) = (generate_id(), generate_id());

        let mut first = DivisionStanding::new("a", division, season, "Ann", 8);
        first.rank = Some(2);
        let mut second = DivisionStanding::new("b", division, season, "Bea", 8);
        second.rank = Some(1);
        storage
            .replace_division(&division, &season, vec![first, second])
            .unwrap();

        let rows = storage.standings_for_division(&division, &season).unwrap();
        assert_eq!(rows[0].player_id, "b");
        assert_eq!(rows[1].player_id, "a");

        // Replacement drops rows that are no longer present
        storage
            .replace_division(
                &division,
                &season,
                vec![DivisionStanding::new("c", division, season, "Cal", 8)],
            )
            .unwrap();
        let rows = storage.standings_for_division(&division, &season).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(storage
            .get_standing(&division, &season, &"a".to_string())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_replace_rejects_foreign_rows() {
        let storage = InMemoryStandingsStorage::new();
        let (division, season) = (generate_id(), generate_id());
        let foreign = DivisionStanding::new("a", generate_id(), season, "Ann", 8);

        assert!(storage
            .replace_division(&division, &season, vec![foreign])
            .is_err());
    }

    #[test]
    fn test_upsert_standing() {
        let storage = InMemoryStandingsStorage::new();
        let (division, season) = (generate_id(), generate_id());
        let mut standing = DivisionStanding::new("a", division, season, "Ann", 8);
        storage.upsert_standing(standing.clone()).unwrap();

        standing.wins = 3;
        storage.upsert_standing(standing).unwrap();
        let stored = storage
            .get_standing(&division, &season, &"a".to_string())
            .unwrap()
            .unwrap();
        assert_eq!(stored.wins, 3);
    }
}
