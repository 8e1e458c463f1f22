//! Best-N result selection
//!
//! A policy orders a player's results by preference; the first N are marked
//! as counting toward standings and numbered chronologically, every other
//! result has both flags cleared. Selection only reads the results
//! themselves, so it can be recomputed from scratch at any time.

use crate::config::BestNPolicyKind;
use crate::results::{MatchResult, SelectionUpdate};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Trait for ordering a player's results by selection preference
pub trait BestNPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Compare two results; `Less` means `a` is preferred
    fn compare(&self, a: &MatchResult, b: &MatchResult) -> Ordering;
}

fn chronological(a: &MatchResult, b: &MatchResult) -> Ordering {
    a.played_at.cmp(&b.played_at).then(a.id.cmp(&b.id))
}

/// Highest total points first, then larger margin, then earlier
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestScoringPolicy;

impl BestNPolicy for HighestScoringPolicy {
    fn name(&self) -> &'static str {
        "highest_scoring"
    }

    fn compare(&self, a: &MatchResult, b: &MatchResult) -> Ordering {
        b.points
            .total
            .cmp(&a.points.total)
            .then(b.margin.cmp(&a.margin))
            .then_with(|| chronological(a, b))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MostRecentPolicy;

impl BestNPolicy for MostRecentPolicy {
    fn name(&self) -> &'static str {
        "most_recent"
    }

    fn compare(&self, a: &MatchResult, b: &MatchResult) -> Ordering {
        chronological(b, a)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FirstChronologicalPolicy;

impl BestNPolicy for FirstChronologicalPolicy {
    fn name(&self) -> &'static str {
        "first_chronological"
    }

    fn compare(&self, a: &MatchResult, b: &MatchResult) -> Ordering {
        chronological(a, b)
    }
}

pub fn policy_for(kind: BestNPolicyKind) -> Box<dyn BestNPolicy> {
    match kind {
        BestNPolicyKind::HighestScoring => Box::new(HighestScoringPolicy),
        BestNPolicyKind::MostRecent => Box::new(MostRecentPolicy),
        BestNPolicyKind::FirstChronological => Box::new(FirstChronologicalPolicy),
    }
}

/// Selection flags for every one of a player's results.
///
/// `limit = None` selects everything.
pub fn plan_selection(
    policy: &dyn BestNPolicy,
    results: &[MatchResult],
    limit: Option<usize>,
) -> Vec<SelectionUpdate> {
    let mut preferred: Vec<&MatchResult> = results.iter().collect();
    preferred.sort_by(|a, b| policy.compare(a, b));
    let take = limit.unwrap_or(preferred.len());
    let selected: HashSet<_> = preferred.iter().take(take).map(|result| result.id).collect();

    let mut ordered: Vec<&MatchResult> = results.iter().collect();
    ordered.sort_by(|a, b| chronological(a, b));

    let mut sequence = 0;
    ordered
        .into_iter()
        .map(|result| {
            if selected.contains(&result.id) {
                sequence += 1;
                SelectionUpdate {
                    result_id: result.id,
                    counts_for_standings: true,
                    result_sequence: Some(sequence),
                }
            } else {
                SelectionUpdate {
                    result_id: result.id,
                    counts_for_standings: false,
                    result_sequence: None,
                }
            }
        })
        .collect()
}

/// Whether applying `update` would change the stored result
pub fn is_change(result: &MatchResult, update: &SelectionUpdate) -> bool {
    result.counts_for_standings != update.counts_for_standings
        || result.result_sequence != update.result_sequence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::PointAward;
    use crate::types::{GameMode, Side, Sport};
    use crate::utils::{current_timestamp, generate_id};
    use chrono::Duration;

    fn result(days_ago: i64, total: u32, margin: i32) -> MatchResult {
        let played_at = current_timestamp() - Duration::days(days_ago);
        MatchResult {
            id: generate_id(),
            match_id: generate_id(),
            player_id: "p1".to_string(),
            opponent_id: "p2".to_string(),
            partner_id: None,
            division_id: generate_id(),
            season_id: generate_id(),
            sport: Sport::Pickleball,
            mode: GameMode::Singles,
            side: Side::A,
            is_winner: total >= 3,
            points: PointAward {
                participation: 1,
                sets_won_points: total.saturating_sub(1).min(2),
                win_bonus: if total >= 3 { 2 } else { 0 },
                total,
            },
            margin,
            sets_won: 2,
            sets_lost: 0,
            games_won: 22,
            games_lost: 10,
            is_walkover: false,
            played_at,
            created_at: played_at,
            counts_for_standings: false,
            result_sequence: None,
        }
    }

    fn selected_ids(updates: &[SelectionUpdate]) -> Vec<uuid::Uuid> {
        updates
            .iter()
            .filter(|u| u.counts_for_standings)
            .map(|u| u.result_id)
            .collect()
    }

    #[test]
    fn test_highest_scoring_selection() {
        let results = vec![
            result(8, 5, 10),
            result(7, 1, -6),
            result(6, 5, 4),
            result(5, 2, -1),
            result(4, 4, 3),
        ];
        let updates = plan_selection(&HighestScoringPolicy, &results, Some(3));

        assert_eq!(updates.len(), 5);
        assert_eq!(
            selected_ids(&updates),
            vec![results[0].id, results[2].id, results[4].id]
        );

        let sequences: Vec<Option<u32>> = updates.iter().map(|u| u.result_sequence).collect();
        assert_eq!(sequences, vec![Some(1), None, Some(2), None, Some(3)]);
    }

    #[test]
    fn test_most_recent_and_first_chronological() {
        let results: Vec<MatchResult> = (1..=8).rev().map(|d| result(d, 3, 1)).collect();

        let recent = plan_selection(&MostRecentPolicy, &results, Some(6));
        assert_eq!(
            selected_ids(&recent),
            results[2..].iter().map(|r| r.id).collect::<Vec<_>>()
        );

        let first = plan_selection(&FirstChronologicalPolicy, &results, Some(6));
        assert_eq!(
            selected_ids(&first),
            results[..6].iter().map(|r| r.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_selection_is_idempotent() {
        let mut results = vec![result(3, 5, 2), result(2, 1, -4), result(1, 3, 1)];
        let first = plan_selection(&HighestScoringPolicy, &results, Some(2));

        for result in results.iter_mut() {
            let update = first.iter().find(|u| u.result_id == result.id).unwrap();
            result.counts_for_standings = update.counts_for_standings;
            result.result_sequence = update.result_sequence;
        }

        let second = plan_selection(&HighestScoringPolicy, &results, Some(2));
        assert_eq!(first, second);
        assert!(results
            .iter()
            .zip(&second)
            .all(|(result, update)| !is_change(result, update)));
    }

    #[test]
    fn test_no_limit_selects_everything() {
        let results = vec![result(3, 1, -5), result(2, 1, -5), result(1, 1, -5)];
        let updates = plan_selection(&HighestScoringPolicy, &results, None);
        assert!(updates.iter().all(|u| u.counts_for_standings));
        assert_eq!(updates[2].result_sequence, Some(3));
    }

    #[test]
    fn test_policy_lookup() {
        assert_eq!(policy_for(BestNPolicyKind::MostRecent).name(), "most_recent");
        assert_eq!(
            policy_for(BestNPolicyKind::HighestScoring).name(),
            "highest_scoring"
        );
    }
}
