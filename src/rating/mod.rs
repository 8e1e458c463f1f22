//! DMR skill ratings
//!
//! This module provides the rating model, score validation, the rating
//! store with its history ledger, and the engine that ties them together.

pub mod calculator;
pub mod dmr;
pub mod engine;
pub mod models;
pub mod storage;
pub mod validation;

// Re-export commonly used types
pub use calculator::{RatingAdjustment, RatingCalculator};
pub use dmr::DmrRatingCalculator;
pub use engine::RatingEngine;
pub use models::{
    DecaySummary, MatchRatingUpdate, PlayerRatingChange, PlayerRatingRecord, RatedMatch, RatedSet,
    RatingChangeReason, RatingHistoryEntry, RatingKey, RatingSnapshot, RatingState,
    ReversalSummary,
};
pub use storage::{InMemoryRatingStorage, RatingCommit, RatingStorage};
pub use validation::{validate_majority, validate_sets, ScoreRules};
