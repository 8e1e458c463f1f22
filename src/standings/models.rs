//! Division standing rows

use crate::types::{DivisionId, PlayerId, SeasonId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Record against a single opponent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub wins: u32,
    pub losses: u32,
    pub sets_won: u32,
    pub sets_lost: u32,
}

/// A player's aggregated record in one division of one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionStanding {
    pub player_id: PlayerId,
    pub division_id: DivisionId,
    pub season_id: SeasonId,
    pub display_name: String,
    pub wins: u32,
    pub losses: u32,
    /// Every materialized result, counted or not
    pub matches_played: u32,
    /// Results selected by Best-N
    pub matches_counted: u32,
    pub matches_scheduled: u32,
    pub matches_remaining: u32,
    pub win_points: u32,
    pub set_points: u32,
    pub completion_bonus: u32,
    pub total_points: u32,
    pub sets_won: u32,
    pub sets_lost: u32,
    pub set_differential: i64,
    pub games_won: u32,
    pub games_lost: u32,
    pub head_to_head: HashMap<PlayerId, HeadToHead>,
    pub rank: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

impl DivisionStanding {
    /// Empty row for a player with no counted results
    pub fn new(
        player_id: impl Into<PlayerId>,
        division_id: DivisionId,
        season_id: SeasonId,
        display_name: impl Into<String>,
        matches_scheduled: u32,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            division_id,
            season_id,
            display_name: display_name.into(),
            wins: 0,
            losses: 0,
            matches_played: 0,
            matches_counted: 0,
            matches_scheduled,
            matches_remaining: matches_scheduled,
            win_points: 0,
            set_points: 0,
            completion_bonus: 0,
            total_points: 0,
            sets_won: 0,
            sets_lost: 0,
            set_differential: 0,
            games_won: 0,
            games_lost: 0,
            head_to_head: HashMap::new(),
            rank: None,
            updated_at: Utc::now(),
        }
    }

    /// Wins against every other player in `group`
    pub fn head_to_head_wins_within<'a, I>(&self, group: I) -> u32
    where
        I: IntoIterator<Item = &'a PlayerId>,
    {
        group
            .into_iter()
            .filter(|opponent| **opponent != self.player_id)
            .filter_map(|opponent| self.head_to_head.get(opponent))
            .map(|record| record.wins)
            .sum()
    }
}

/// Best-N selection totals for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub players: usize,
    pub selected: usize,
    pub changed: usize,
}

impl SelectionSummary {
    pub fn merge(&mut self, other: SelectionSummary) {
        self.players += other.players;
        self.selected += other.selected;
        self.changed += other.changed;
    }
}
