//! DMR rating configuration

use crate::error::{LeagueError, Result};
use serde::{Deserialize, Serialize};

/// Parameters of the DMR rating model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Rating assigned to a player without history
    pub initial_rating: f64,
    /// Rating deviation assigned to a player without history
    pub initial_deviation: f64,
    /// Lower bound for the rating deviation
    pub min_deviation: f64,
    /// Upper bound for the rating deviation
    pub max_deviation: f64,
    /// Glicko-2 volatility used when converting to skillratings types
    pub volatility: f64,
    /// Matches after which a rating stops being provisional
    pub provisional_match_threshold: u32,
    /// Per-match delta cap as a fraction of the pre-match deviation
    pub max_delta_deviation_fraction: f64,
    /// Absolute per-match delta cap
    pub max_delta_absolute: f64,
    /// How strongly score dominance scales a delta (factor = 1 + weight * dominance)
    pub score_factor_weight: f64,
    /// Days without a rated match before inactivity decay applies
    pub inactivity_threshold_days: i64,
    /// Deviation growth per inactivity period (Glicko `c`)
    pub inactivity_deviation_growth: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            initial_rating: 1500.0,
            initial_deviation: 350.0,
            min_deviation: 30.0,
            max_deviation: 350.0,
            volatility: 0.06,
            provisional_match_threshold: 10,
            max_delta_deviation_fraction: 0.08,
            max_delta_absolute: 75.0,
            score_factor_weight: 0.5,
            inactivity_threshold_days: 30,
            inactivity_deviation_growth: 35.0,
        }
    }
}

impl RatingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.min_deviation <= 0.0 {
            return Err(LeagueError::ConfigurationError {
                message: "Minimum deviation must be positive".to_string(),
            }
            .into());
        }

        if self.max_deviation < self.min_deviation {
            return Err(LeagueError::ConfigurationError {
                message: "Maximum deviation must not be below the minimum".to_string(),
            }
            .into());
        }

        if self.initial_deviation < self.min_deviation
            || self.initial_deviation > self.max_deviation
        {
            return Err(LeagueError::ConfigurationError {
                message: "Initial deviation must lie within the deviation bounds".to_string(),
            }
            .into());
        }

        if self.max_delta_deviation_fraction <= 0.0 || self.max_delta_absolute <= 0.0 {
            return Err(LeagueError::ConfigurationError {
                message: "Delta caps must be positive".to_string(),
            }
            .into());
        }

        if self.score_factor_weight < 0.0 {
            return Err(LeagueError::ConfigurationError {
                message: "Score factor weight must be non-negative".to_string(),
            }
            .into());
        }

        if self.provisional_match_threshold == 0 {
            return Err(LeagueError::ConfigurationError {
                message: "Provisional match threshold must be greater than 0".to_string(),
            }
            .into());
        }

        if self.inactivity_threshold_days <= 0 {
            return Err(LeagueError::ConfigurationError {
                message: "Inactivity threshold must be greater than 0 days".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RatingConfig::default();
        assert_eq!(config.initial_rating, 1500.0);
        assert_eq!(config.initial_deviation, 350.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_bounds() {
        let mut config = RatingConfig::default();
        config.min_deviation = 400.0;
        assert!(config.validate().is_err());

        let mut config = RatingConfig::default();
        config.max_delta_absolute = 0.0;
        assert!(config.validate().is_err());

        let mut config = RatingConfig::default();
        config.provisional_match_threshold = 0;
        assert!(config.validate().is_err());
    }
}
