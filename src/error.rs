//! Error types for the league engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific league scenarios
#[derive(Debug, thiserror::Error)]
pub enum LeagueError {
    /// Rejected numeric input: malformed or tied scores, negative values,
    /// win-by violations, too many sets, self-play, false winner.
    #[error("Invalid match data: {reason}")]
    InvalidMatchData { reason: String },

    #[error("Precondition failed: {reason}")]
    PreconditionFailed { reason: String },

    #[error("Match already rated: {match_id}")]
    MatchAlreadyRated { match_id: String },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: String },

    #[error("Division not found: {division_id}")]
    DivisionNotFound { division_id: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl LeagueError {
    /// Shorthand for an `InvalidMatchData` error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidMatchData {
            reason: reason.into(),
        }
    }

    /// Shorthand for a `PreconditionFailed` error
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            reason: reason.into(),
        }
    }

    pub(crate) fn lock_poisoned(what: &str) -> Self {
        Self::InternalError {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}

/// Whether an error is a caller-side `InvalidMatchData` rejection
pub fn is_invalid_match_data(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<LeagueError>(),
        Some(LeagueError::InvalidMatchData { .. })
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_match_data_classification() {
        let err: anyhow::Error = LeagueError::invalid("tied set").into();
        assert!(is_invalid_match_data(&err));
        assert_eq!(err.to_string(), "Invalid match data: tied set");

        let err: anyhow::Error = LeagueError::precondition("not completed").into();
        assert!(!is_invalid_match_data(&err));
    }
}
