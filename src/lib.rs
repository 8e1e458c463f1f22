//! League Engine - Rating, scoring and standings for racket-sport leagues
//!
//! This crate turns completed tennis, padel and pickleball matches into
//! point awards, DMR skill ratings and ranked division tables with best-N
//! result selection.

pub mod config;
pub mod error;
pub mod metrics;
pub mod outcome;
pub mod points;
pub mod rating;
pub mod results;
pub mod service;
pub mod standings;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LeagueError, Result};
pub use types::*;

// Re-export key components
pub use rating::RatingEngine;
pub use service::{AppState, MatchCompletionPipeline, SignalPublisher};
pub use standings::StandingsEngine;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
