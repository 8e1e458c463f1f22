//! Test fixtures and builders for integration testing

#![allow(dead_code)]

use chrono::Duration;
use league_engine::config::AppConfig;
use league_engine::rating::RatingKey;
use league_engine::service::{AppState, InMemorySignalPublisher};
use league_engine::standings::{DivisionInfo, DivisionMember};
use league_engine::types::{
    CompletedMatch, GameMode, GameScore, MatchStatus, Participant, ScoreSheet, SetScore, Side,
    Sport,
};
use league_engine::utils::{current_timestamp, generate_id};
use std::sync::Arc;

/// A wired application with one division and a capturing signal publisher
pub struct TestLeague {
    pub app: AppState,
    pub publisher: Arc<InMemorySignalPublisher>,
    pub division: DivisionInfo,
}

impl TestLeague {
    pub fn new(division: DivisionInfo) -> Self {
        Self::with_config(AppConfig::default(), division)
    }

    pub fn with_config(config: AppConfig, division: DivisionInfo) -> Self {
        let publisher = Arc::new(InMemorySignalPublisher::new());
        let app = AppState::new(config, vec![division.clone()], publisher.clone())
            .expect("Failed to build application state");
        Self {
            app,
            publisher,
            division,
        }
    }

    /// Rating key of a player in this division's pool
    pub fn key(&self, player_id: &str) -> RatingKey {
        RatingKey::new(
            player_id,
            self.division.season_id,
            self.division.sport,
            self.division.mode,
        )
    }

    /// Singles match in this division, `days_ago` days in the past
    pub fn singles(&self, a: &str, b: &str, sets: &[(i32, i32)], days_ago: i64) -> CompletedMatch {
        let mut m = singles_match(self.division.sport, a, b, sets, days_ago);
        m.division_id = Some(self.division.division_id);
        m.season_id = Some(self.division.season_id);
        m
    }

    /// Doubles match in this division between two tagged teams
    pub fn doubles(
        &self,
        team_a: [&str; 2],
        team_b: [&str; 2],
        sets: &[(i32, i32)],
        days_ago: i64,
    ) -> CompletedMatch {
        let mut m = doubles_match(self.division.sport, team_a, team_b, sets, days_ago);
        m.division_id = Some(self.division.division_id);
        m.season_id = Some(self.division.season_id);
        m
    }
}

/// Division whose members are listed as (player id, display name)
pub fn division(sport: Sport, mode: GameMode, members: &[(&str, &str)], scheduled: u32) -> DivisionInfo {
    DivisionInfo {
        division_id: generate_id(),
        season_id: generate_id(),
        name: format!("{} {} division", sport, mode),
        sport,
        mode,
        members: members
            .iter()
            .map(|(id, name)| DivisionMember::new(*id, *name, scheduled))
            .collect(),
    }
}

fn score_sheet(sport: Sport, sets: &[(i32, i32)]) -> ScoreSheet {
    match sport {
        Sport::Pickleball => ScoreSheet::Games(
            sets.iter()
                .map(|(a, b)| GameScore::new(*a, *b))
                .collect(),
        ),
        Sport::Tennis | Sport::Padel => ScoreSheet::Sets(
            sets.iter()
                .map(|(a, b)| SetScore::new(*a, *b))
                .collect(),
        ),
    }
}

/// Singles match outside any division; `a` joined first and plays side A
pub fn singles_match(sport: Sport, a: &str, b: &str, sets: &[(i32, i32)], days_ago: i64) -> CompletedMatch {
    let played_at = current_timestamp() - Duration::days(days_ago);
    CompletedMatch {
        id: generate_id(),
        sport,
        mode: GameMode::Singles,
        status: MatchStatus::Completed,
        division_id: None,
        season_id: None,
        participants: vec![
            Participant {
                player_id: a.to_string(),
                team: None,
                joined_at: played_at - Duration::minutes(2),
            },
            Participant {
                player_id: b.to_string(),
                team: None,
                joined_at: played_at - Duration::minutes(1),
            },
        ],
        scores: score_sheet(sport, sets),
        is_walkover: false,
        walkover_winner: None,
        played_at,
    }
}

/// Doubles match outside any division with team tags set
pub fn doubles_match(
    sport: Sport,
    team_a: [&str; 2],
    team_b: [&str; 2],
    sets: &[(i32, i32)],
    days_ago: i64,
) -> CompletedMatch {
    let played_at = current_timestamp() - Duration::days(days_ago);
    let participants = team_a
        .iter()
        .map(|id| (id, Side::A))
        .chain(team_b.iter().map(|id| (id, Side::B)))
        .enumerate()
        .map(|(i, (id, side))| Participant {
            player_id: id.to_string(),
            team: Some(side),
            joined_at: played_at - Duration::minutes(10 - i as i64),
        })
        .collect();

    CompletedMatch {
        id: generate_id(),
        sport,
        mode: GameMode::Doubles,
        status: MatchStatus::Completed,
        division_id: None,
        season_id: None,
        participants,
        scores: score_sheet(sport, sets),
        is_walkover: false,
        walkover_winner: None,
        played_at,
    }
}
