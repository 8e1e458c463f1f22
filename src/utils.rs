//! Utility functions for the league engine

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

/// Generate a new unique record ID
pub fn generate_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Share of `won` in `won + lost`, 0.0 when nothing was played
pub fn win_percentage(won: u32, lost: u32) -> f64 {
    let total = won + lost;
    if total == 0 {
        0.0
    } else {
        won as f64 / total as f64
    }
}

/// Compare two win shares exactly, without going through floats.
///
/// An empty record (`won + lost == 0`) compares as 0/1.
pub fn compare_win_shares(a: (u32, u32), b: (u32, u32)) -> Ordering {
    let (a_won, a_total) = share_terms(a);
    let (b_won, b_total) = share_terms(b);
    (a_won * b_total).cmp(&(b_won * a_total))
}

fn share_terms((won, lost): (u32, u32)) -> (u64, u64) {
    let total = won as u64 + lost as u64;
    if total == 0 {
        (0, 1)
    } else {
        (won as u64, total)
    }
}
