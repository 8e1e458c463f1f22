//! Score validation ahead of rating updates
//!
//! A rejected score sheet raises `InvalidMatchData` before any rating is
//! read or written.

use crate::error::{LeagueError, Result};
use crate::rating::models::RatedSet;
use crate::types::Sport;

/// Per-sport rules a submitted set has to satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRules {
    /// Score from which the win-by margin is enforced
    pub winning_threshold: i32,
    pub win_by: i32,
    /// Score that may win by a single point (tennis 7-6)
    pub tiebreak_score: Option<i32>,
    pub max_sets: usize,
}

impl ScoreRules {
    pub fn for_sport(sport: Sport) -> Self {
        match sport {
            Sport::Pickleball => Self {
                winning_threshold: 11,
                win_by: 2,
                tiebreak_score: None,
                max_sets: 5,
            },
            Sport::Tennis | Sport::Padel => Self {
                winning_threshold: 6,
                win_by: 2,
                tiebreak_score: Some(7),
                max_sets: 5,
            },
        }
    }
}

/// Check every set against the rules and the set count bounds
pub fn validate_sets(rules: &ScoreRules, sets: &[RatedSet]) -> Result<()> {
    if sets.is_empty() {
        return Err(LeagueError::invalid("no set scores submitted").into());
    }
    if sets.len() > rules.max_sets {
        return Err(LeagueError::invalid(format!(
            "{} sets submitted, at most {} allowed",
            sets.len(),
            rules.max_sets
        ))
        .into());
    }

    for (index, set) in sets.iter().enumerate() {
        validate_set(rules, set, index + 1)?;
    }

    Ok(())
}

fn validate_set(rules: &ScoreRules, set: &RatedSet, set_no: usize) -> Result<()> {
    if set.winner_score < 0 || set.loser_score < 0 {
        return Err(LeagueError::invalid(format!(
            "set {} has a negative score ({}-{})",
            set_no, set.winner_score, set.loser_score
        ))
        .into());
    }
    if set.winner_score == set.loser_score {
        return Err(LeagueError::invalid(format!(
            "set {} has no winner ({}-{})",
            set_no, set.winner_score, set.loser_score
        ))
        .into());
    }

    let high = set.winner_score.max(set.loser_score);
    let low = set.winner_score.min(set.loser_score);
    let tiebreak_set = rules
        .tiebreak_score
        .is_some_and(|score| high == score && low == score - 1);

    if high >= rules.winning_threshold && high - low < rules.win_by && !tiebreak_set {
        return Err(LeagueError::invalid(format!(
            "set {} must be won by {} ({}-{})",
            set_no, rules.win_by, set.winner_score, set.loser_score
        ))
        .into());
    }

    Ok(())
}

/// The declared winner must have taken a strict majority of the sets
pub fn validate_majority(sets: &[RatedSet]) -> Result<()> {
    let won = sets
        .iter()
        .filter(|set| set.winner_score > set.loser_score)
        .count();

    if won * 2 <= sets.len() {
        return Err(LeagueError::invalid(format!(
            "declared winner took only {} of {} sets",
            won,
            sets.len()
        ))
        .into());
    }
    Ok(())
}
