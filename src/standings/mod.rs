//! Division standings
//!
//! This module aggregates materialized results into ranked division tables,
//! including best-N result selection and the tie-break cascade.

pub mod best_n;
pub mod engine;
pub mod models;
pub mod points;
pub mod provider;
pub mod ranking;
pub mod storage;

// Re-export commonly used types
pub use best_n::{
    plan_selection, policy_for, BestNPolicy, FirstChronologicalPolicy, HighestScoringPolicy,
    MostRecentPolicy,
};
pub use engine::{StandingsEngine, SweepReport};
pub use models::{DivisionStanding, HeadToHead, SelectionSummary};
pub use points::{standings_points, StandingsPoints};
pub use provider::{DivisionInfo, DivisionMember, DivisionProvider, StaticDivisionProvider};
pub use ranking::rank_standings;
pub use storage::{InMemoryStandingsStorage, StandingsStorage};
