//! Score sheet normalization
//!
//! Turns sport-specific raw scores into a sport-agnostic [`MatchOutcome`]:
//! tennis and padel sets (with tiebreaks and an optional final match
//! tiebreak) and pickleball games.

use crate::error::{LeagueError, Result};
use crate::types::{GameScore, ScoreSheet, SetScore, Side, Sport};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sets (or pickleball games) and games (or points) won by one side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideTally {
    /// Sets won; games won for pickleball
    pub sets: u32,
    /// Games won; points won for pickleball
    pub games: u32,
}

/// Normalized outcome of a finished match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner: Side,
    pub side_a: SideTally,
    pub side_b: SideTally,
    pub is_walkover: bool,
}

impl MatchOutcome {
    /// Outcome of a match decided by default; no scores exist
    pub fn walkover(winner: Side) -> Self {
        Self {
            winner,
            side_a: SideTally::default(),
            side_b: SideTally::default(),
            is_walkover: true,
        }
    }

    pub fn tally(&self, side: Side) -> SideTally {
        match side {
            Side::A => self.side_a,
            Side::B => self.side_b,
        }
    }

    pub fn is_winner(&self, side: Side) -> bool {
        self.winner == side
    }

    /// Games (points) won by `side` minus games won by the other side
    pub fn margin(&self, side: Side) -> i32 {
        self.tally(side).games as i32 - self.tally(side.opponent()).games as i32
    }
}

/// Parses score sheets into match outcomes
#[derive(Debug, Clone, Default)]
pub struct OutcomeParser;

impl OutcomeParser {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a score sheet for the given sport
    pub fn parse(&self, sport: Sport, sheet: &ScoreSheet) -> Result<MatchOutcome> {
        match (sport, sheet) {
            (Sport::Tennis | Sport::Padel, ScoreSheet::Sets(sets)) => self.parse_sets(sets),
            (Sport::Pickleball, ScoreSheet::Games(games)) => self.parse_games(games),
            (sport, _) => Err(LeagueError::invalid(format!(
                "score sheet kind does not match sport {}",
                sport
            ))
            .into()),
        }
    }

    fn parse_sets(&self, sets: &[SetScore]) -> Result<MatchOutcome> {
        if sets.is_empty() {
            return Err(LeagueError::invalid("no set scores submitted").into());
        }

        let last = sets.len() - 1;
        let mut side_a = SideTally::default();
        let mut side_b = SideTally::default();

        for (index, set) in sets.iter().enumerate() {
            let set_no = index + 1;
            check_non_negative(set.a_games, set.b_games, set_no)?;
            if set.a_tiebreak.unwrap_or(0) < 0 || set.b_tiebreak.unwrap_or(0) < 0 {
                return Err(LeagueError::invalid(format!(
                    "set {} has a negative tiebreak score",
                    set_no
                ))
                .into());
            }
            if set.is_match_tiebreak && index != last {
                return Err(LeagueError::invalid(format!(
                    "set {} is flagged as a match tiebreak but is not the final set",
                    set_no
                ))
                .into());
            }

            let winner = set_winner(set).ok_or_else(|| {
                LeagueError::invalid(format!("set {} has no winner", set_no))
            })?;

            // A match tiebreak is scored in points; those points stand in for
            // the set's games so the deciding set still contributes to margin.
            let (a_games, b_games) = if set.is_match_tiebreak {
                match (set.a_tiebreak, set.b_tiebreak) {
                    (Some(a), Some(b)) => (a, b),
                    _ => {
                        return Err(LeagueError::invalid(format!(
                            "match tiebreak in set {} is missing its points",
                            set_no
                        ))
                        .into())
                    }
                }
            } else {
                (set.a_games, set.b_games)
            };

            side_a.games += a_games as u32;
            side_b.games += b_games as u32;
            match winner {
                Side::A => side_a.sets += 1,
                Side::B => side_b.sets += 1,
            }
        }

        finish(side_a, side_b)
    }

    fn parse_games(&self, games: &[GameScore]) -> Result<MatchOutcome> {
        if games.is_empty() {
            return Err(LeagueError::invalid("no game scores submitted").into());
        }

        let mut side_a = SideTally::default();
        let mut side_b = SideTally::default();

        for (index, game) in games.iter().enumerate() {
            let game_no = index + 1;
            check_non_negative(game.a_points, game.b_points, game_no)?;

            match game.a_points.cmp(&game.b_points) {
                Ordering::Greater => side_a.sets += 1,
                Ordering::Less => side_b.sets += 1,
                Ordering::Equal => {
                    return Err(LeagueError::invalid(format!(
                        "game {} is tied at {}",
                        game_no, game.a_points
                    ))
                    .into())
                }
            }
            side_a.games += game.a_points as u32;
            side_b.games += game.b_points as u32;
        }

        finish(side_a, side_b)
    }
}

fn check_non_negative(a: i32, b: i32, set_no: usize) -> Result<()> {
    if a < 0 || b < 0 {
        return Err(LeagueError::invalid(format!("set {} has a negative score", set_no)).into());
    }
    Ok(())
}

/// More games wins; equal games fall back to tiebreak points
fn set_winner(set: &SetScore) -> Option<Side> {
    match set.a_games.cmp(&set.b_games) {
        Ordering::Greater => Some(Side::A),
        Ordering::Less => Some(Side::B),
        Ordering::Equal => match (set.a_tiebreak, set.b_tiebreak) {
            (Some(a), Some(b)) if a > b => Some(Side::A),
            (Some(a), Some(b)) if b > a => Some(Side::B),
            _ => None,
        },
    }
}

fn finish(side_a: SideTally, side_b: SideTally) -> Result<MatchOutcome> {
    let winner = match side_a.sets.cmp(&side_b.sets) {
        Ordering::Greater => Side::A,
        Ordering::Less => Side::B,
        Ordering::Equal => {
            return Err(LeagueError::invalid(format!(
                "no side won a majority of sets ({}-{})",
                side_a.sets, side_b.sets
            ))
            .into())
        }
    };

    Ok(MatchOutcome {
        winner,
        side_a,
        side_b,
        is_walkover: false,
    })
}
