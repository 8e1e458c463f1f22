//! Service layer for the league engine
//!
//! This module wires the engines into the application state, runs completed
//! and voided matches through them, and exposes the admin commands. Every
//! operation reports through completion signals.

pub mod app;
pub mod commands;
pub mod pipeline;
pub mod signals;

pub use app::{AppState, ServiceError};
pub use commands::AdminCommands;
pub use pipeline::{rated_match, MatchCompletionPipeline, MatchProcessingReport, VoidReport};
pub use signals::{
    CompletionSignal, InMemorySignalPublisher, LoggingSignalPublisher, SignalKind,
    SignalPublisher,
};
