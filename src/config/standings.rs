//! Standings and points configuration

use crate::error::{LeagueError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which results count toward a player's standing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestNPolicyKind {
    /// Highest total points first, margin as the secondary key
    HighestScoring,
    /// Latest results first
    MostRecent,
    /// Earliest results first
    FirstChronological,
}

impl FromStr for BestNPolicyKind {
    type Err = LeagueError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "highest_scoring" => Ok(Self::HighestScoring),
            "most_recent" => Ok(Self::MostRecent),
            "first_chronological" => Ok(Self::FirstChronological),
            other => Err(LeagueError::ConfigurationError {
                message: format!("Unknown best-N policy: {}", other),
            }),
        }
    }
}

/// Division table rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StandingsConfig {
    pub points_per_win: u32,
    /// Wins beyond this count earn no further win points
    pub max_counted_wins: u32,
    /// Win count from which every set won scores a point
    pub set_points_unlock_wins: u32,
    /// Matches-played counts that award a one-off +1 bonus
    pub completion_milestones: Vec<u32>,
    /// Results counted per player; `None` counts everything
    pub best_n: Option<usize>,
    pub best_n_policy: BestNPolicyKind,
}

impl Default for StandingsConfig {
    fn default() -> Self {
        Self {
            points_per_win: 3,
            max_counted_wins: 7,
            set_points_unlock_wins: 7,
            completion_milestones: vec![4, 9],
            best_n: Some(6),
            best_n_policy: BestNPolicyKind::HighestScoring,
        }
    }
}

impl StandingsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.best_n == Some(0) {
            return Err(LeagueError::ConfigurationError {
                message: "Best-N must count at least one result".to_string(),
            }
            .into());
        }
        if self.completion_milestones.contains(&0) {
            return Err(LeagueError::ConfigurationError {
                message: "Completion milestones must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Per-match point award rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    pub participation_points: u32,
    pub win_bonus: u32,
    /// Sets-won points are capped here (best of three)
    pub max_sets_points: u32,
    /// Synthetic games margin credited to a walkover winner
    pub walkover_margin: i32,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            participation_points: 1,
            win_bonus: 2,
            max_sets_points: 2,
            walkover_margin: 12,
        }
    }
}

impl PointsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.walkover_margin <= 0 {
            return Err(LeagueError::ConfigurationError {
                message: "Walkover margin must be positive".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "most_recent".parse::<BestNPolicyKind>().unwrap(),
            BestNPolicyKind::MostRecent
        );
        assert_eq!(
            "HIGHEST_SCORING".parse::<BestNPolicyKind>().unwrap(),
            BestNPolicyKind::HighestScoring
        );
        assert!("random".parse::<BestNPolicyKind>().is_err());
    }

    #[test]
    fn test_defaults_validate() {
        assert!(StandingsConfig::default().validate().is_ok());
        assert!(PointsConfig::default().validate().is_ok());

        let config = StandingsConfig {
            best_n: Some(0),
            ..StandingsConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
