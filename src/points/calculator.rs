//! Per-match point awards
//!
//! Every participant earns one participation point, one point per set won
//! (capped at two) and a two point bonus for winning, so a single match is
//! worth between 1 and 5 points.

use crate::config::PointsConfig;
use crate::outcome::MatchOutcome;
use crate::types::Side;
use serde::{Deserialize, Serialize};

/// Breakdown of the points a player earned from one match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointAward {
    pub participation: u32,
    pub sets_won_points: u32,
    pub win_bonus: u32,
    pub total: u32,
}

/// Points and score statistics for one side of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidePoints {
    pub side: Side,
    pub is_winner: bool,
    pub award: PointAward,
    pub margin: i32,
    pub sets_won: u32,
    pub sets_lost: u32,
    pub games_won: u32,
    pub games_lost: u32,
}

/// Points for both sides of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPoints {
    pub side_a: SidePoints,
    pub side_b: SidePoints,
}

impl MatchPoints {
    pub fn side(&self, side: Side) -> &SidePoints {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }
}

/// Converts match outcomes into point awards
#[derive(Debug, Clone, Default)]
pub struct PointsCalculator {
    config: PointsConfig,
}

impl PointsCalculator {
    pub fn new(config: PointsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PointsConfig {
        &self.config
    }

    /// Calculate awards for both sides of a match
    pub fn calculate(&self, outcome: &MatchOutcome, is_walkover: bool) -> MatchPoints {
        if is_walkover || outcome.is_walkover {
            return self.walkover_points(outcome.winner);
        }

        MatchPoints {
            side_a: self.side_points(outcome, Side::A),
            side_b: self.side_points(outcome, Side::B),
        }
    }

    fn side_points(&self, outcome: &MatchOutcome, side: Side) -> SidePoints {
        let own = outcome.tally(side);
        let other = outcome.tally(side.opponent());
        let is_winner = outcome.is_winner(side);

        SidePoints {
            side,
            is_winner,
            award: self.award(own.sets, is_winner),
            margin: outcome.margin(side),
            sets_won: own.sets,
            sets_lost: other.sets,
            games_won: own.games,
            games_lost: other.games,
        }
    }

    /// No scores exist for a walkover: the winner is credited the maximum
    /// sets and the configured margin, the defaulting side the mirror image.
    fn walkover_points(&self, winner: Side) -> MatchPoints {
        let max_sets = self.config.max_sets_points;
        let margin = self.config.walkover_margin;
        let games = margin.max(0) as u32;

        let winning = |side: Side| SidePoints {
            side,
            is_winner: true,
            award: self.award(max_sets, true),
            margin,
            sets_won: max_sets,
            sets_lost: 0,
            games_won: games,
            games_lost: 0,
        };
        let losing = |side: Side| SidePoints {
            side,
            is_winner: false,
            award: self.award(0, false),
            margin: -margin,
            sets_won: 0,
            sets_lost: max_sets,
            games_won: 0,
            games_lost: games,
        };

        match winner {
            Side::A => MatchPoints {
                side_a: winning(Side::A),
                side_b: losing(Side::B),
            },
            Side::B => MatchPoints {
                side_a: losing(Side::A),
                side_b: winning(Side::B),
            },
        }
    }

    fn award(&self, sets_won: u32, is_winner: bool) -> PointAward {
        let participation = self.config.participation_points;
        let sets_won_points = sets_won.min(self.config.max_sets_points);
        let win_bonus = if is_winner { self.config.win_bonus } else { 0 };

        PointAward {
            participation,
            sets_won_points,
            win_bonus,
            total: participation + sets_won_points + win_bonus,
        }
    }
}
