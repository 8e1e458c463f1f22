//! Main entry point for the league engine
//!
//! Loads configuration, initializes logging and replays recorded league
//! activity through the match completion pipeline, printing the resulting
//! division tables and rating leaderboards.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use league_engine::config::AppConfig;
use league_engine::rating::RatingSnapshot;
use league_engine::service::{AppState, LoggingSignalPublisher};
use league_engine::standings::{DivisionInfo, DivisionProvider, DivisionStanding};
use league_engine::types::{CompletedMatch, GameMode, MatchId, SeasonId, Sport};
use league_engine::utils::current_timestamp;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// League Engine - ratings, points and standings for racket-sport leagues
#[derive(Parser)]
#[command(
    name = "league-engine",
    version,
    about = "Rating, scoring and standings engine for racket-sport leagues",
    long_about = "League Engine turns completed tennis, padel and pickleball matches into point \
                 awards, DMR skill ratings and ranked division tables with head-to-head \
                 tie-breaks and best-N result selection."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without processing anything")]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a JSON fixture of divisions and matches through the pipeline
    Replay {
        /// Fixture file
        #[arg(value_name = "FILE")]
        fixture: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Run the inactivity decay sweep after the replay
        #[arg(long)]
        decay: bool,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

/// Recorded league activity
#[derive(Debug, Deserialize)]
struct ReplayFixture {
    #[serde(default)]
    divisions: Vec<DivisionInfo>,
    #[serde(default)]
    matches: Vec<CompletedMatch>,
    /// Matches voided after all completions were processed
    #[serde(default)]
    voided: Vec<MatchId>,
}

#[derive(Debug, Serialize)]
struct DivisionOutput {
    name: String,
    standings: Vec<DivisionStanding>,
}

#[derive(Debug, Serialize)]
struct LeaderboardOutput {
    season_id: SeasonId,
    sport: Sport,
    mode: GameMode,
    ratings: Vec<RatingSnapshot>,
}

#[derive(Debug, Serialize)]
struct ReplayOutput {
    processed: usize,
    failed: usize,
    voided: usize,
    divisions: Vec<DivisionOutput>,
    leaderboards: Vec<LeaderboardOutput>,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    league_engine::config::validate_config(&config)?;
    Ok(config)
}

fn load_fixture(path: &Path) -> Result<ReplayFixture> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse fixture {}", path.display()))
}

async fn replay(config: AppConfig, fixture: ReplayFixture, decay: bool) -> Result<ReplayOutput> {
    let app = AppState::new(config, fixture.divisions, Arc::new(LoggingSignalPublisher::new()))?;
    let pipeline = app.pipeline();

    let mut matches = fixture.matches;
    matches.sort_by_key(|m| m.played_at);

    let (mut processed, mut failed) = (0, 0);
    for completed in &matches {
        match pipeline.on_match_completed(completed).await {
            Ok(_) => processed += 1,
            Err(err) => {
                warn!("Match {} rejected: {}", completed.id, err);
                failed += 1;
            }
        }
    }

    for match_id in &fixture.voided {
        pipeline.on_match_voided(match_id).await?;
    }

    if decay {
        app.commands()
            .apply_inactivity_decay(current_timestamp())
            .await?;
    }

    let sweep = app.commands().sweep_all_divisions().await?;
    if !sweep.is_clean() {
        warn!("{} division(s) failed to refresh", sweep.failed.len());
    }

    let standings = app.standings();
    let mut divisions = Vec::new();
    for division in app.divisions().divisions()? {
        divisions.push(DivisionOutput {
            standings: standings.standings(&division.division_id, &division.season_id)?,
            name: division.name,
        });
    }

    let mut pools: Vec<(SeasonId, Sport, GameMode)> = Vec::new();
    for m in &matches {
        if let Some(season_id) = m.season_id {
            let pool = (season_id, m.sport, m.mode);
            if !pools.contains(&pool) {
                pools.push(pool);
            }
        }
    }

    let ratings = app.ratings();
    let mut leaderboards = Vec::with_capacity(pools.len());
    for (season_id, sport, mode) in pools {
        leaderboards.push(LeaderboardOutput {
            season_id,
            sport,
            mode,
            ratings: ratings.leaderboard(&season_id, sport, mode, None)?,
        });
    }

    debug!("Metrics after replay:\n{}", app.metrics().gather_text()?);
    Ok(ReplayOutput {
        processed,
        failed,
        voided: fixture.voided.len(),
        divisions,
        leaderboards,
    })
}

fn print_table(output: &ReplayOutput) {
    println!(
        "Processed {} match(es), {} rejected, {} voided",
        output.processed, output.failed, output.voided
    );

    for division in &output.divisions {
        println!();
        println!("{}", division.name);
        println!(
            "{:>4}  {:<20} {:>3} {:>3} {:>5} {:>5} {:>4} {:>4} {:>4} {:>6}",
            "Rank", "Player", "W", "L", "Pld", "Left", "Win", "Set", "Bon", "Total"
        );
        for row in &division.standings {
            let rank = row.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
            println!(
                "{:>4}  {:<20} {:>3} {:>3} {:>5} {:>5} {:>4} {:>4} {:>4} {:>6}",
                rank,
                row.display_name,
                row.wins,
                row.losses,
                row.matches_played,
                row.matches_remaining,
                row.win_points,
                row.set_points,
                row.completion_bonus,
                row.total_points
            );
        }
    }

    for board in &output.leaderboards {
        println!();
        println!("Ratings: {} {} (season {})", board.sport, board.mode, board.season_id);
        println!(
            "{:<20} {:>8} {:>6} {:>17} {:>6} {:>4}",
            "Player", "Rating", "RD", "95% interval", "Prov", "MP"
        );
        for snapshot in &board.ratings {
            println!(
                "{:<20} {:>8.1} {:>6.1} {:>8.1}-{:<8.1} {:>6} {:>4}",
                snapshot.player_id,
                snapshot.rating,
                snapshot.deviation,
                snapshot.confidence_low,
                snapshot.confidence_high,
                if snapshot.is_provisional { "yes" } else { "no" },
                snapshot.matches_played
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        return Ok(());
    }

    match args.command {
        Some(Command::Replay {
            fixture,
            format,
            decay,
        }) => {
            let fixture = load_fixture(&fixture)?;
            info!(
                "Replaying {} match(es) across {} division(s)",
                fixture.matches.len(),
                fixture.divisions.len()
            );

            let output = match replay(config, fixture, decay).await {
                Ok(output) => output,
                Err(e) => {
                    error!("Replay failed: {}", e);
                    std::process::exit(1);
                }
            };

            match format {
                OutputFormat::Table => print_table(&output),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
            }
        }
        Some(Command::ShowConfig) => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        None => {
            info!("Nothing to do; see --help for available commands");
        }
    }

    Ok(())
}
