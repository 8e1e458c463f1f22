//! Rating records, history ledger and engine inputs/outputs

use crate::config::RatingConfig;
use crate::types::{GameMode, MatchId, PlayerId, SeasonId, Sport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rating and its deviation, the two numbers the DMR model works on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingState {
    pub rating: f64,
    pub deviation: f64,
}

impl RatingState {
    pub fn new(rating: f64, deviation: f64) -> Self {
        Self { rating, deviation }
    }

    /// 95% band: rating ± 2·RD
    pub fn confidence_interval(&self) -> (f64, f64) {
        (
            self.rating - 2.0 * self.deviation,
            self.rating + 2.0 * self.deviation,
        )
    }
}

/// Ratings are tracked separately per season, sport and game mode
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatingKey {
    pub player_id: PlayerId,
    pub season_id: SeasonId,
    pub sport: Sport,
    pub mode: GameMode,
}

impl RatingKey {
    pub fn new(player_id: impl Into<PlayerId>, season_id: SeasonId, sport: Sport, mode: GameMode) -> Self {
        Self {
            player_id: player_id.into(),
            season_id,
            sport,
            mode,
        }
    }
}

/// Stored rating of one player in one rating pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRatingRecord {
    pub key: RatingKey,
    pub rating: f64,
    pub deviation: f64,
    pub is_provisional: bool,
    pub matches_played: u32,
    pub peak_rating: f64,
    pub lowest_rating: f64,
    pub last_updated: DateTime<Utc>,
    pub last_decayed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PlayerRatingRecord {
    /// Create a fresh record for a player without history
    pub fn new(key: RatingKey, config: &RatingConfig) -> Self {
        let now = Utc::now();
        Self {
            key,
            rating: config.initial_rating,
            deviation: config.initial_deviation,
            is_provisional: true,
            matches_played: 0,
            peak_rating: config.initial_rating,
            lowest_rating: config.initial_rating,
            last_updated: now,
            last_decayed_at: None,
            created_at: now,
        }
    }

    pub fn state(&self) -> RatingState {
        RatingState::new(self.rating, self.deviation)
    }

    /// Move to a new rating, keeping peak and lowest current
    pub fn set_rating(&mut self, rating: f64) {
        self.rating = rating;
        if rating > self.peak_rating {
            self.peak_rating = rating;
        }
        if rating < self.lowest_rating {
            self.lowest_rating = rating;
        }
    }

    pub fn snapshot(&self) -> RatingSnapshot {
        let (confidence_low, confidence_high) = self.state().confidence_interval();
        RatingSnapshot {
            player_id: self.key.player_id.clone(),
            season_id: self.key.season_id,
            sport: self.key.sport,
            mode: self.key.mode,
            rating: self.rating,
            deviation: self.deviation,
            confidence_low,
            confidence_high,
            is_provisional: self.is_provisional,
            matches_played: self.matches_played,
            peak_rating: self.peak_rating,
            lowest_rating: self.lowest_rating,
        }
    }
}

/// Read-only view of a rating handed to collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    pub player_id: PlayerId,
    pub season_id: SeasonId,
    pub sport: Sport,
    pub mode: GameMode,
    pub rating: f64,
    pub deviation: f64,
    pub confidence_low: f64,
    pub confidence_high: f64,
    pub is_provisional: bool,
    pub matches_played: u32,
    pub peak_rating: f64,
    pub lowest_rating: f64,
}

/// Why a rating changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingChangeReason {
    MatchWin,
    MatchLoss,
    InitialPlacement,
    InactivityDecay,
}

/// One row of the append-only rating ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingHistoryEntry {
    pub id: Uuid,
    pub key: RatingKey,
    pub match_id: Option<MatchId>,
    pub reason: RatingChangeReason,
    pub rating_before: f64,
    pub rating_after: f64,
    pub deviation_before: f64,
    pub deviation_after: f64,
    pub matches_played_before: u32,
    pub matches_played_after: u32,
    pub delta: f64,
    pub score_factor: Option<f64>,
    pub reversed: bool,
    pub reversed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Scores of one set from the declared match winner's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatedSet {
    pub winner_score: i32,
    pub loser_score: i32,
}

impl RatedSet {
    pub fn new(winner_score: i32, loser_score: i32) -> Self {
        Self {
            winner_score,
            loser_score,
        }
    }
}

/// A finished match as the rating engine consumes it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatedMatch {
    pub match_id: MatchId,
    pub season_id: SeasonId,
    pub sport: Sport,
    pub winners: Vec<PlayerId>,
    pub losers: Vec<PlayerId>,
    pub sets: Vec<RatedSet>,
    pub is_walkover: bool,
    pub played_at: DateTime<Utc>,
}

impl RatedMatch {
    pub fn mode(&self) -> GameMode {
        if self.winners.len() > 1 {
            GameMode::Doubles
        } else {
            GameMode::Singles
        }
    }
}

/// Rating movement of one player in one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRatingChange {
    pub player_id: PlayerId,
    pub won: bool,
    pub expected_score: f64,
    pub rating_before: f64,
    pub rating_after: f64,
    pub deviation_before: f64,
    pub deviation_after: f64,
    pub delta: f64,
}

/// Everything a processed match changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRatingUpdate {
    pub match_id: MatchId,
    pub score_factor: f64,
    pub changes: Vec<PlayerRatingChange>,
}

impl MatchRatingUpdate {
    pub fn change_for(&self, player_id: &str) -> Option<&PlayerRatingChange> {
        self.changes.iter().find(|change| change.player_id == player_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalSummary {
    pub players_restored: usize,
    pub entries_reversed: usize,
    /// Players whose rating had moved on after the reversed match
    pub rewound: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecaySummary {
    pub scanned: usize,
    pub decayed: usize,
    pub failed: usize,
}
