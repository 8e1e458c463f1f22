//! Division rank ordering
//!
//! Cascade: total points, head-to-head wins inside the group tied on
//! points, set-win share, game-win share, display name, player id.

use crate::standings::models::DivisionStanding;
use crate::types::PlayerId;
use crate::utils::compare_win_shares;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Sort `standings` into rank order and assign ranks 1..=n
pub fn rank_standings(standings: &mut [DivisionStanding]) {
    standings.sort_by(|a, b| b.total_points.cmp(&a.total_points));

    let mut start = 0;
    while start < standings.len() {
        let points = standings[start].total_points;
        let end = standings[start..]
            .iter()
            .position(|standing| standing.total_points != points)
            .map_or(standings.len(), |offset| start + offset);

        order_tied_group(&mut standings[start..end]);
        start = end;
    }

    for (index, standing) in standings.iter_mut().enumerate() {
        standing.rank = Some(index as u32 + 1);
    }
}

fn order_tied_group(group: &mut [DivisionStanding]) {
    let members: Vec<PlayerId> = group.iter().map(|s| s.player_id.clone()).collect();
    let h2h: HashMap<PlayerId, u32> = group
        .iter()
        .map(|standing| {
            (
                standing.player_id.clone(),
                standing.head_to_head_wins_within(&members),
            )
        })
        .collect();

    group.sort_by(|a, b| {
        let a_h2h = h2h.get(&a.player_id).copied().unwrap_or(0);
        let b_h2h = h2h.get(&b.player_id).copied().unwrap_or(0);
        b_h2h
            .cmp(&a_h2h)
            .then_with(|| tail_order(a, b))
    });
}

/// Steps after head-to-head: set share, game share, name, id
fn tail_order(a: &DivisionStanding, b: &DivisionStanding) -> Ordering {
    compare_win_shares((b.sets_won, b.sets_lost), (a.sets_won, a.sets_lost))
        .then_with(|| compare_win_shares((b.games_won, b.games_lost), (a.games_won, a.games_lost)))
        .then_with(|| a.display_name.cmp(&b.display_name))
        .then_with(|| a.player_id.cmp(&b.player_id))
}
