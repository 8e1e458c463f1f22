//! Main application state and service wiring
//!
//! This module builds every engine from an [`AppConfig`] over in-memory
//! storage and hands out the pipeline and admin command surfaces.

use crate::config::AppConfig;
use crate::metrics::MetricsCollector;
use crate::points::PointsCalculator;
use crate::rating::{InMemoryRatingStorage, RatingEngine, RatingStorage};
use crate::results::{InMemoryResultStorage, ResultMaterializer, ResultStorage};
use crate::service::commands::AdminCommands;
use crate::service::pipeline::MatchCompletionPipeline;
use crate::service::signals::SignalPublisher;
use crate::standings::{
    DivisionInfo, DivisionProvider, InMemoryStandingsStorage, StandingsEngine, StandingsStorage,
    StaticDivisionProvider,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Division rosters
    divisions: Arc<StaticDivisionProvider>,

    /// Storage handles
    result_storage: Arc<dyn ResultStorage>,
    rating_storage: Arc<dyn RatingStorage>,
    standings_storage: Arc<dyn StandingsStorage>,

    /// Engines
    ratings: Arc<RatingEngine>,
    standings: Arc<StandingsEngine>,

    /// Entry points
    pipeline: Arc<MatchCompletionPipeline>,
    commands: Arc<AdminCommands>,

    /// Metrics collector shared by the pipeline and commands
    metrics: Arc<MetricsCollector>,
}

impl AppState {
    /// Initialize the application with all dependencies
    pub fn new(
        config: AppConfig,
        divisions: Vec<DivisionInfo>,
        publisher: Arc<dyn SignalPublisher>,
    ) -> Result<Self, ServiceError> {
        info!("Initializing {}", config.service.name);
        info!(
            "Configuration: best_n={:?}, policy={:?}, walkover_margin={}",
            config.standings.best_n, config.standings.best_n_policy, config.points.walkover_margin
        );

        let divisions = Arc::new(StaticDivisionProvider::with_divisions(divisions).map_err(
            |e| ServiceError::Configuration {
                message: format!("Invalid division roster: {}", e),
            },
        )?);

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        let result_storage: Arc<dyn ResultStorage> = Arc::new(InMemoryResultStorage::new());
        let rating_storage: Arc<dyn RatingStorage> = Arc::new(InMemoryRatingStorage::new());
        let standings_storage: Arc<dyn StandingsStorage> =
            Arc::new(InMemoryStandingsStorage::new());

        let materializer = Arc::new(ResultMaterializer::new(
            PointsCalculator::new(config.points.clone()),
            result_storage.clone(),
        ));

        let ratings = Arc::new(
            RatingEngine::new(config.rating.clone(), rating_storage.clone()).map_err(|e| {
                ServiceError::Configuration {
                    message: format!("Invalid rating configuration: {}", e),
                }
            })?,
        );

        let provider: Arc<dyn DivisionProvider> = divisions.clone();
        let standings = Arc::new(
            StandingsEngine::new(
                config.standings.clone(),
                result_storage.clone(),
                standings_storage.clone(),
                provider,
            )
            .map_err(|e| ServiceError::Configuration {
                message: format!("Invalid standings configuration: {}", e),
            })?,
        );

        let pipeline = Arc::new(
            MatchCompletionPipeline::new(
                materializer,
                ratings.clone(),
                standings.clone(),
                publisher.clone(),
            )
            .with_metrics(metrics.clone()),
        );
        let commands = Arc::new(
            AdminCommands::new(ratings.clone(), standings.clone(), publisher)
                .with_metrics(metrics.clone()),
        );

        Ok(Self {
            config,
            divisions,
            result_storage,
            rating_storage,
            standings_storage,
            ratings,
            standings,
            pipeline,
            commands,
            metrics,
        })
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn divisions(&self) -> Arc<StaticDivisionProvider> {
        self.divisions.clone()
    }

    pub fn result_storage(&self) -> Arc<dyn ResultStorage> {
        self.result_storage.clone()
    }

    pub fn rating_storage(&self) -> Arc<dyn RatingStorage> {
        self.rating_storage.clone()
    }

    pub fn standings_storage(&self) -> Arc<dyn StandingsStorage> {
        self.standings_storage.clone()
    }

    pub fn ratings(&self) -> Arc<RatingEngine> {
        self.ratings.clone()
    }

    pub fn standings(&self) -> Arc<StandingsEngine> {
        self.standings.clone()
    }

    pub fn pipeline(&self) -> Arc<MatchCompletionPipeline> {
        self.pipeline.clone()
    }

    pub fn commands(&self) -> Arc<AdminCommands> {
        self.commands.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }
}
