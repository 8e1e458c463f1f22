//! Sport-specific score normalization

pub mod parser;

pub use parser::{MatchOutcome, OutcomeParser, SideTally};
