//! Materialized match results
//!
//! This module turns completed matches into per-participant result records
//! and defines the storage interface those records live behind.

pub mod materializer;
pub mod models;
pub mod storage;

// Re-export commonly used types
pub use materializer::{
    assign_sides, ensure_completed, MaterializeOutcome, ResultMaterializer, SideAssignment,
};
pub use models::{MatchResult, SelectionUpdate};
pub use storage::{InMemoryResultStorage, ResultStorage};
