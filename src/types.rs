//! Common types used throughout the league engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for matches
pub type MatchId = Uuid;

/// Unique identifier for divisions
pub type DivisionId = Uuid;

/// Unique identifier for seasons
pub type SeasonId = Uuid;

/// Unique identifier for materialized results
pub type ResultId = Uuid;

/// Sport played in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Tennis,
    Padel,
    Pickleball,
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sport::Tennis => write!(f, "tennis"),
            Sport::Padel => write!(f, "padel"),
            Sport::Pickleball => write!(f, "pickleball"),
        }
    }
}

/// Singles or doubles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Singles,
    Doubles,
}

impl GameMode {
    /// Number of players on each side
    pub fn players_per_side(&self) -> usize {
        match self {
            GameMode::Singles => 1,
            GameMode::Doubles => 2,
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameMode::Singles => write!(f, "singles"),
            GameMode::Doubles => write!(f, "doubles"),
        }
    }
}

/// One of the two sides of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Lifecycle state of a match as owned by the match workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
    Void,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Ongoing => "ongoing",
            MatchStatus::Completed => "completed",
            MatchStatus::Cancelled => "cancelled",
            MatchStatus::Void => "void",
        };
        write!(f, "{}", label)
    }
}

/// A player taking part in a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub player_id: PlayerId,
    /// Team tag for doubles; ignored for singles
    #[serde(default)]
    pub team: Option<Side>,
    /// Creation time of the participant row, used for side assignment order
    pub joined_at: DateTime<Utc>,
}

/// Tennis/padel set score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScore {
    pub a_games: i32,
    pub b_games: i32,
    #[serde(default)]
    pub a_tiebreak: Option<i32>,
    #[serde(default)]
    pub b_tiebreak: Option<i32>,
    /// Final set played as a single match tiebreak
    #[serde(default)]
    pub is_match_tiebreak: bool,
}

impl SetScore {
    pub fn new(a_games: i32, b_games: i32) -> Self {
        Self {
            a_games,
            b_games,
            a_tiebreak: None,
            b_tiebreak: None,
            is_match_tiebreak: false,
        }
    }

    pub fn with_tiebreak(a_games: i32, b_games: i32, a_points: i32, b_points: i32) -> Self {
        Self {
            a_tiebreak: Some(a_points),
            b_tiebreak: Some(b_points),
            ..Self::new(a_games, b_games)
        }
    }

    /// A match tiebreak in lieu of a final set, scored in points
    pub fn match_tiebreak(a_points: i32, b_points: i32) -> Self {
        Self {
            is_match_tiebreak: true,
            ..Self::with_tiebreak(0, 0, a_points, b_points)
        }
    }
}

/// Pickleball game score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameScore {
    pub a_points: i32,
    pub b_points: i32,
}

impl GameScore {
    pub fn new(a_points: i32, b_points: i32) -> Self {
        Self { a_points, b_points }
    }
}

/// Raw scores recorded for a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "scores", rename_all = "snake_case")]
pub enum ScoreSheet {
    Sets(Vec<SetScore>),
    Games(Vec<GameScore>),
}

impl ScoreSheet {
    pub fn is_empty(&self) -> bool {
        match self {
            ScoreSheet::Sets(sets) => sets.is_empty(),
            ScoreSheet::Games(games) => games.is_empty(),
        }
    }
}

/// A match as handed over by the match workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedMatch {
    pub id: MatchId,
    pub sport: Sport,
    pub mode: GameMode,
    pub status: MatchStatus,
    #[serde(default)]
    pub division_id: Option<DivisionId>,
    #[serde(default)]
    pub season_id: Option<SeasonId>,
    pub participants: Vec<Participant>,
    pub scores: ScoreSheet,
    #[serde(default)]
    pub is_walkover: bool,
    /// Side that received the walkover
    #[serde(default)]
    pub walkover_winner: Option<Side>,
    pub played_at: DateTime<Utc>,
}

impl CompletedMatch {
    /// Division and season, when the match belongs to a ranking context
    pub fn ranking_context(&self) -> Option<(DivisionId, SeasonId)> {
        match (self.division_id, self.season_id) {
            (Some(division), Some(season)) => Some((division, season)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::A.opponent(), Side::B);
        assert_eq!(Side::B.opponent(), Side::A);
    }

    #[test]
    fn test_score_sheet_serde_shape() {
        let sheet = ScoreSheet::Games(vec![GameScore::new(11, 7)]);
        let json = serde_json::to_value(&sheet).unwrap();
        assert_eq!(json["kind"], "games");
        assert_eq!(json["scores"][0]["a_points"], 11);

        let parsed: ScoreSheet = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, sheet);
    }

    #[test]
    fn test_match_tiebreak_constructor() {
        let set = SetScore::match_tiebreak(10, 8);
        assert!(set.is_match_tiebreak);
        assert_eq!((set.a_games, set.b_games), (0, 0));
        assert_eq!(set.a_tiebreak, Some(10));
    }
}
