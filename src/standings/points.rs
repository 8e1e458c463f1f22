//! Standings points and result aggregation

use crate::config::StandingsConfig;
use crate::results::MatchResult;
use crate::standings::models::DivisionStanding;
use serde::{Deserialize, Serialize};

/// Points breakdown of one standing row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsPoints {
    pub win_points: u32,
    pub set_points: u32,
    pub completion_bonus: u32,
    pub total: u32,
}

/// Win points are capped at `max_counted_wins`; set points switch on in full
/// once a player reaches `set_points_unlock_wins`; completion earns one
/// point per match plus one for each milestone reached.
pub fn standings_points(
    config: &StandingsConfig,
    wins: u32,
    sets_won: u32,
    matches_played: u32,
) -> StandingsPoints {
    let win_points = wins.min(config.max_counted_wins) * config.points_per_win;
    let set_points = if wins >= config.set_points_unlock_wins {
        sets_won
    } else {
        0
    };
    let milestones = config
        .completion_milestones
        .iter()
        .filter(|milestone| matches_played >= **milestone)
        .count() as u32;
    let completion_bonus = matches_played + milestones;

    StandingsPoints {
        win_points,
        set_points,
        completion_bonus,
        total: win_points + set_points + completion_bonus,
    }
}

/// Fold counted results into a standing row and recompute its points.
///
/// Best-N gates wins, sets, games and head-to-head. Matches played and the
/// completion bonus follow `recorded`, the player's full result count.
pub fn aggregate<'a, I>(
    config: &StandingsConfig,
    standing: &mut DivisionStanding,
    counted: I,
    recorded: u32,
) where
    I: IntoIterator<Item = &'a MatchResult>,
{
    for result in counted {
        standing.matches_counted += 1;
        if result.is_winner {
            standing.wins += 1;
        } else {
            standing.losses += 1;
        }
        standing.sets_won += result.sets_won;
        standing.sets_lost += result.sets_lost;
        standing.games_won += result.games_won;
        standing.games_lost += result.games_lost;

        let h2h = standing
            .head_to_head
            .entry(result.opponent_id.clone())
            .or_default();
        if result.is_winner {
            h2h.wins += 1;
        } else {
            h2h.losses += 1;
        }
        h2h.sets_won += result.sets_won;
        h2h.sets_lost += result.sets_lost;
    }

    standing.set_differential = i64::from(standing.sets_won) - i64::from(standing.sets_lost);
    standing.matches_played = recorded;
    standing.matches_remaining = standing.matches_scheduled.saturating_sub(recorded);

    let points = standings_points(
        config,
        standing.wins,
        standing.sets_won,
        standing.matches_played,
    );
    standing.win_points = points.win_points;
    standing.set_points = points.set_points;
    standing.completion_bonus = points.completion_bonus;
    standing.total_points = points.total;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(wins: u32, sets_won: u32, played: u32) -> StandingsPoints {
        standings_points(&StandingsConfig::default(), wins, sets_won, played)
    }

    #[test]
    fn test_empty_record_scores_nothing() {
        assert_eq!(points(0, 0, 0), StandingsPoints::default());
    }

    #[test]
    fn test_win_points_cap() {
        assert_eq!(points(1, 2, 1).win_points, 3);
        assert_eq!(points(6, 12, 6).win_points, 18);
        assert_eq!(points(7, 14, 7).win_points, 21);
        assert_eq!(points(9, 18, 9).win_points, 21);
    }

    #[test]
    fn test_set_points_unlock_at_seven_wins() {
        assert_eq!(points(6, 13, 8).set_points, 0);
        assert_eq!(points(7, 15, 8).set_points, 15);
        assert_eq!(points(8, 17, 9).set_points, 17);
    }

    #[test]
    fn test_completion_milestones() {
        assert_eq!(points(0, 0, 3).completion_bonus, 3);
        assert_eq!(points(0, 0, 4).completion_bonus, 5);
        assert_eq!(points(0, 0, 8).completion_bonus, 9);
        assert_eq!(points(0, 0, 9).completion_bonus, 11);
        assert_eq!(points(0, 0, 12).completion_bonus, 14);
    }

    #[test]
    fn test_total_points() {
        let breakdown = points(7, 15, 9);
        assert_eq!(breakdown.total, 21 + 15 + 11);
    }
}
