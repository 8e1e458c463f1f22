//! Materialized per-participant match results

use crate::points::PointAward;
use crate::types::{DivisionId, GameMode, MatchId, PlayerId, ResultId, SeasonId, Side, Sport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One participant's immutable record of a completed match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: ResultId,
    pub match_id: MatchId,
    pub player_id: PlayerId,
    /// First opposing player (doubles have two opponents)
    pub opponent_id: PlayerId,
    pub partner_id: Option<PlayerId>,
    pub division_id: DivisionId,
    pub season_id: SeasonId,
    pub sport: Sport,
    pub mode: GameMode,
    pub side: Side,
    pub is_winner: bool,
    pub points: PointAward,
    pub margin: i32,
    pub sets_won: u32,
    pub sets_lost: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub is_walkover: bool,
    pub played_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Set only by best-N selection
    pub counts_for_standings: bool,
    /// Set only by best-N selection
    pub result_sequence: Option<u32>,
}

/// Best-N selection flags for a single result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionUpdate {
    pub result_id: ResultId,
    pub counts_for_standings: bool,
    pub result_sequence: Option<u32>,
}
