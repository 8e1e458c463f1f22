//! Division roster providers
//!
//! This module defines where the standings engine learns who belongs to a
//! division, along with a static in-memory implementation.

use crate::error::{LeagueError, Result};
use crate::types::{DivisionId, GameMode, PlayerId, SeasonId, Sport};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// One member of a division roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionMember {
    pub player_id: PlayerId,
    pub display_name: String,
    /// Matches this player is scheduled to play in the season
    pub matches_scheduled: u32,
}

impl DivisionMember {
    pub fn new(player_id: impl Into<PlayerId>, display_name: impl Into<String>, matches_scheduled: u32) -> Self {
        Self {
            player_id: player_id.into(),
            display_name: display_name.into(),
            matches_scheduled,
        }
    }
}

/// A division of one season with its roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionInfo {
    pub division_id: DivisionId,
    pub season_id: SeasonId,
    pub name: String,
    pub sport: Sport,
    pub mode: GameMode,
    pub members: Vec<DivisionMember>,
}

impl DivisionInfo {
    pub fn member(&self, player_id: &str) -> Option<&DivisionMember> {
        self.members.iter().find(|member| member.player_id == player_id)
    }
}

/// Trait for looking up division rosters
pub trait DivisionProvider: Send + Sync {
    /// Get a division by id
    fn division(&self, division_id: &DivisionId) -> Result<Option<DivisionInfo>>;

    /// Every known division (for sweeps)
    fn divisions(&self) -> Result<Vec<DivisionInfo>>;
}

/// Static division provider backed by an in-memory map
#[derive(Debug, Default)]
pub struct StaticDivisionProvider {
    divisions: RwLock<HashMap<DivisionId, DivisionInfo>>,
}

impl StaticDivisionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider preloaded with `divisions`
    pub fn with_divisions(divisions: Vec<DivisionInfo>) -> Result<Self> {
        let provider = Self::new();
        for division in divisions {
            provider.upsert_division(division)?;
        }
        Ok(provider)
    }

    /// Add or replace a division, rejecting rosters with duplicate players
    pub fn upsert_division(&self, division: DivisionInfo) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        if let Some(duplicate) = division
            .members
            .iter()
            .find(|member| !seen.insert(member.player_id.as_str()))
        {
            return Err(LeagueError::ConfigurationError {
                message: format!(
                    "Player {} listed twice in division {}",
                    duplicate.player_id, division.name
                ),
            }
            .into());
        }

        let mut divisions = self
            .divisions
            .write()
            .map_err(|_| LeagueError::lock_poisoned("divisions write"))?;
        divisions.insert(division.division_id, division);
        Ok(())
    }
}

impl DivisionProvider for StaticDivisionProvider {
    fn division(&self, division_id: &DivisionId) -> Result<Option<DivisionInfo>> {
        let divisions = self
            .divisions
            .read()
            .map_err(|_| LeagueError::lock_poisoned("divisions read"))?;
        Ok(divisions.get(division_id).cloned())
    }

    fn divisions(&self) -> Result<Vec<DivisionInfo>> {
        let divisions = self
            .divisions
            .read()
            .map_err(|_| LeagueError::lock_poisoned("divisions read"))?;
        let mut all: Vec<DivisionInfo> = divisions.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.division_id.cmp(&b.division_id)));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generate_id;

    fn division(name: &str, members: Vec<DivisionMember>) -> DivisionInfo {
        DivisionInfo {
            division_id: generate_id(),
            season_id: generate_id(),
            name: name.to_string(),
            sport: Sport::Tennis,
            mode: GameMode::Singles,
            members,
        }
    }

    #[test]
    fn test_lookup_and_listing() {
        let a = division("Division A", vec![DivisionMember::new("p1", "Pat", 9)]);
        let b = division("Division B", vec![]);
        let provider = StaticDivisionProvider::with_divisions(vec![b.clone(), a.clone()]).unwrap();

        let found = provider.division(&a.division_id).unwrap().unwrap();
        assert_eq!(found.member("p1").unwrap().matches_scheduled, 9);
        assert!(provider.division(&generate_id()).unwrap().is_none());

        let names: Vec<String> = provider.divisions().unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Division A", "Division B"]);
    }

    #[test]
    fn test_duplicate_members_rejected() {
        let provider = StaticDivisionProvider::new();
        let bad = division(
            "Division A",
            vec![DivisionMember::new("p1", "Pat", 9), DivisionMember::new("p1", "Pat", 9)],
        );
        assert!(provider.upsert_division(bad).is_err());
    }
}
