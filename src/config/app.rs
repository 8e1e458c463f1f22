//! Main application configuration
//!
//! This module defines the primary configuration structures for the league
//! engine, including environment variable loading, TOML files and validation.

use crate::config::rating::RatingConfig;
use crate::config::standings::{BestNPolicyKind, PointsConfig, StandingsConfig};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub standings: StandingsConfig,
    pub points: PointsConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "league-engine".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Rating settings
        if let Ok(rating) = env::var("DMR_INITIAL_RATING") {
            self.rating.initial_rating = rating
                .parse()
                .map_err(|_| anyhow!("Invalid DMR_INITIAL_RATING value: {}", rating))?;
        }
        if let Ok(deviation) = env::var("DMR_INITIAL_DEVIATION") {
            self.rating.initial_deviation = deviation
                .parse()
                .map_err(|_| anyhow!("Invalid DMR_INITIAL_DEVIATION value: {}", deviation))?;
        }
        if let Ok(threshold) = env::var("DMR_PROVISIONAL_MATCHES") {
            self.rating.provisional_match_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("Invalid DMR_PROVISIONAL_MATCHES value: {}", threshold))?;
        }
        if let Ok(days) = env::var("INACTIVITY_THRESHOLD_DAYS") {
            self.rating.inactivity_threshold_days = days
                .parse()
                .map_err(|_| anyhow!("Invalid INACTIVITY_THRESHOLD_DAYS value: {}", days))?;
        }

        // Standings settings
        if let Ok(best_n) = env::var("BEST_N") {
            self.standings.best_n = if best_n.eq_ignore_ascii_case("all") {
                None
            } else {
                Some(
                    best_n
                        .parse()
                        .map_err(|_| anyhow!("Invalid BEST_N value: {}", best_n))?,
                )
            };
        }
        if let Ok(policy) = env::var("BEST_N_POLICY") {
            self.standings.best_n_policy = policy.parse::<BestNPolicyKind>()?;
        }

        // Points settings
        if let Ok(margin) = env::var("WALKOVER_MARGIN") {
            self.points.walkover_margin = margin
                .parse()
                .map_err(|_| anyhow!("Invalid WALKOVER_MARGIN value: {}", margin))?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    config.rating.validate()?;
    config.standings.validate()?;
    config.points.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.standings.best_n, Some(6));
        assert_eq!(config.points.walkover_margin, 12);
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let raw = r#"
            [standings]
            best_n = 8
            best_n_policy = "most_recent"

            [rating]
            inactivity_threshold_days = 45
        "#;
        let config: AppConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.standings.best_n, Some(8));
        assert_eq!(config.standings.best_n_policy, BestNPolicyKind::MostRecent);
        assert_eq!(config.standings.points_per_win, 3);
        assert_eq!(config.rating.inactivity_threshold_days, 45);
        assert_eq!(config.rating.initial_rating, 1500.0);
        assert_eq!(config.service.log_level, "info");
        assert!(validate_config(&config).is_ok());
    }
}
