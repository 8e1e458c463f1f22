//! Match point awards

pub mod calculator;

pub use calculator::{MatchPoints, PointAward, PointsCalculator, SidePoints};
