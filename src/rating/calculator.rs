//! Rating calculator trait
//!
//! This module defines the interface the rating engine uses for its rating
//! math, so the model behind it can be swapped without touching persistence.

use crate::rating::models::{RatedSet, RatingState};
use serde::{Deserialize, Serialize};

/// Outcome of rating one side against another
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingAdjustment {
    /// Win probability of the rated side before the match
    pub expected_score: f64,
    /// Rating change before score scaling and capping
    pub raw_delta: f64,
    /// Applied rating change
    pub delta: f64,
    pub new_deviation: f64,
}

/// Trait for the rating model behind the engine
pub trait RatingCalculator: Send + Sync {
    /// Rating and deviation given to players without history
    fn initial_state(&self) -> RatingState;

    /// Probability that `player` beats `opponent`
    fn win_probability(&self, player: &RatingState, opponent: &RatingState) -> f64;

    /// Multiplier (>= 1.0) rewarding a dominant scoreline
    fn score_factor(&self, sets: &[RatedSet], is_walkover: bool) -> f64;

    /// Largest rating change allowed for a player with this deviation
    fn max_delta(&self, deviation: f64) -> f64;

    /// Rate `player` against `opponent` for one result
    fn adjust(
        &self,
        player: &RatingState,
        opponent: &RatingState,
        won: bool,
        score_factor: f64,
    ) -> RatingAdjustment;

    /// Deviation after `inactive_days` without play
    fn decayed_deviation(&self, deviation: f64, inactive_days: f64) -> f64;
}
