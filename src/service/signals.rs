//! Completion signals
//!
//! Every pipeline step and admin command finishes by publishing a
//! [`CompletionSignal`] so the surrounding platform can notify admins or
//! retry. Delivery is behind the [`SignalPublisher`] trait.

use crate::error::Result;
use crate::utils::current_timestamp;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Operation a signal reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    MatchProcessed,
    MatchVoided,
    PlayerRecalculated,
    DivisionRecalculated,
    DivisionBestNRecalculated,
    InactivityDecay,
    DivisionSweep,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignalKind::MatchProcessed => "match_processed",
            SignalKind::MatchVoided => "match_voided",
            SignalKind::PlayerRecalculated => "player_recalculated",
            SignalKind::DivisionRecalculated => "division_recalculated",
            SignalKind::DivisionBestNRecalculated => "division_best_n_recalculated",
            SignalKind::InactivityDecay => "inactivity_decay",
            SignalKind::DivisionSweep => "division_sweep",
        };
        write!(f, "{}", label)
    }
}

/// Success or failure of one operation, with a human readable message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSignal {
    pub kind: SignalKind,
    /// Match, player or division the operation ran against
    pub subject: String,
    pub success: bool,
    pub message: String,
    pub emitted_at: DateTime<Utc>,
}

impl CompletionSignal {
    pub fn success(kind: SignalKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            success: true,
            message: message.into(),
            emitted_at: current_timestamp(),
        }
    }

    pub fn failure(kind: SignalKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::success(kind, subject, message)
        }
    }
}

/// Trait for publishing completion signals
#[async_trait]
pub trait SignalPublisher: Send + Sync {
    async fn publish(&self, signal: CompletionSignal) -> Result<()>;
}

/// Publisher that only writes signals to the log
#[derive(Debug, Default)]
pub struct LoggingSignalPublisher;

impl LoggingSignalPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SignalPublisher for LoggingSignalPublisher {
    async fn publish(&self, signal: CompletionSignal) -> Result<()> {
        if signal.success {
            info!("[{}] {}: {}", signal.kind, signal.subject, signal.message);
        } else {
            warn!(
                "[{}] {} failed: {}",
                signal.kind, signal.subject, signal.message
            );
        }
        Ok(())
    }
}

/// Publisher that keeps every signal in memory (for testing and replay)
#[derive(Debug, Default)]
pub struct InMemorySignalPublisher {
    published: std::sync::Mutex<Vec<CompletionSignal>>,
}

impl InMemorySignalPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All signals published so far, oldest first
    pub fn signals(&self) -> Vec<CompletionSignal> {
        self.published
            .lock()
            .map(|signals| signals.clone())
            .unwrap_or_default()
    }

    /// Signals of one kind
    pub fn signals_of(&self, kind: SignalKind) -> Vec<CompletionSignal> {
        self.signals()
            .into_iter()
            .filter(|signal| signal.kind == kind)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut signals) = self.published.lock() {
            signals.clear();
        }
    }
}

#[async_trait]
impl SignalPublisher for InMemorySignalPublisher {
    async fn publish(&self, signal: CompletionSignal) -> Result<()> {
        if let Ok(mut signals) = self.published.lock() {
            signals.push(signal);
        }
        Ok(())
    }
}
