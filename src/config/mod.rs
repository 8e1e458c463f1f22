//! Configuration management for the league engine
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values for the rating and standings
//! rules.

pub mod app;
pub mod rating;
pub mod standings;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use rating::RatingConfig;
pub use standings::{BestNPolicyKind, PointsConfig, StandingsConfig};
