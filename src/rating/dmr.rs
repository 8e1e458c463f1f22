//! DMR rating model
//!
//! Glicko-style ratings with a deviation, a score-dominance multiplier and a
//! per-match delta cap. Win probabilities come from the skillratings Glicko-2
//! implementation; the update step is computed here so the cap and the score
//! factor can be applied to it.

use crate::config::RatingConfig;
use crate::error::Result;
use crate::rating::calculator::{RatingAdjustment, RatingCalculator};
use crate::rating::models::{RatedSet, RatingState};
use skillratings::glicko2::{expected_score, Glicko2Rating};
use std::f64::consts::{LN_10, PI};

/// Glicko scale constant, ln(10) / 400
const Q: f64 = LN_10 / 400.0;

/// Attenuation of an opponent's influence by their deviation
fn g(deviation: f64) -> f64 {
    1.0 / (1.0 + 3.0 * Q * Q * deviation * deviation / (PI * PI)).sqrt()
}

/// DMR rating calculator implementation
#[derive(Debug, Clone)]
pub struct DmrRatingCalculator {
    config: RatingConfig,
}

impl DmrRatingCalculator {
    pub fn new(config: RatingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    fn glicko2(&self, state: &RatingState) -> Glicko2Rating {
        Glicko2Rating {
            rating: state.rating,
            deviation: state.deviation,
            volatility: self.config.volatility,
        }
    }

    fn clamp_deviation(&self, deviation: f64) -> f64 {
        deviation.clamp(self.config.min_deviation, self.config.max_deviation)
    }
}

impl Default for DmrRatingCalculator {
    fn default() -> Self {
        Self {
            config: RatingConfig::default(),
        }
    }
}

impl RatingCalculator for DmrRatingCalculator {
    fn initial_state(&self) -> RatingState {
        RatingState::new(self.config.initial_rating, self.config.initial_deviation)
    }

    fn win_probability(&self, player: &RatingState, opponent: &RatingState) -> f64 {
        let (player_expected, _) = expected_score(&self.glicko2(player), &self.glicko2(opponent));
        player_expected
    }

    fn score_factor(&self, sets: &[RatedSet], is_walkover: bool) -> f64 {
        if is_walkover {
            return 1.0;
        }

        let won: i64 = sets.iter().map(|set| i64::from(set.winner_score)).sum();
        let lost: i64 = sets.iter().map(|set| i64::from(set.loser_score)).sum();
        let total = won + lost;
        if total <= 0 {
            return 1.0;
        }

        let dominance = ((won - lost) as f64 / total as f64).clamp(0.0, 1.0);
        1.0 + self.config.score_factor_weight * dominance
    }

    fn max_delta(&self, deviation: f64) -> f64 {
        (self.config.max_delta_deviation_fraction * deviation).min(self.config.max_delta_absolute)
    }

    fn adjust(
        &self,
        player: &RatingState,
        opponent: &RatingState,
        won: bool,
        score_factor: f64,
    ) -> RatingAdjustment {
        let expected = self.win_probability(player, opponent);
        let actual = if won { 1.0 } else { 0.0 };

        let g_opponent = g(opponent.deviation);
        let information = Q * Q * g_opponent * g_opponent * expected * (1.0 - expected);
        let precision = 1.0 / (player.deviation * player.deviation) + information;

        let raw_delta = Q / precision * g_opponent * (actual - expected);
        let cap = self.max_delta(player.deviation);
        let delta = (raw_delta * score_factor.max(1.0)).clamp(-cap, cap);

        RatingAdjustment {
            expected_score: expected,
            raw_delta,
            delta,
            new_deviation: self.clamp_deviation((1.0 / precision).sqrt()),
        }
    }

    fn decayed_deviation(&self, deviation: f64, inactive_days: f64) -> f64 {
        if inactive_days <= 0.0 {
            return deviation;
        }
        let periods = inactive_days / self.config.inactivity_threshold_days as f64;
        let growth = self.config.inactivity_deviation_growth;
        (deviation * deviation + growth * growth * periods)
            .sqrt()
            .min(self.config.max_deviation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> DmrRatingCalculator {
        DmrRatingCalculator::new(RatingConfig::default()).unwrap()
    }

    #[test]
    fn test_equal_ratings_are_even() {
        let calc = calculator();
        let a = RatingState::new(1500.0, 350.0);
        assert_eq!(calc.win_probability(&a, &a), 0.5);

        let b = RatingState::new(1720.0, 80.0);
        assert_eq!(calc.win_probability(&b, &b), 0.5);
    }

    #[test]
    fn test_win_probability_grows_with_gap() {
        let calc = calculator();
        let opponent = RatingState::new(1500.0, 100.0);
        let mut previous = 0.5;
        for gap in [50.0, 100.0, 200.0, 400.0] {
            let player = RatingState::new(1500.0 + gap, 100.0);
            let p = calc.win_probability(&player, &opponent);
            assert!(p > previous, "gap {} gave {}", gap, p);
            assert!(p < 1.0);
            previous = p;
        }
    }

    #[test]
    fn test_uncertainty_pulls_toward_even() {
        let calc = calculator();
        let opponent_sure = RatingState::new(1500.0, 50.0);
        let opponent_unsure = RatingState::new(1500.0, 300.0);
        let player = RatingState::new(1700.0, 50.0);

        let confident = calc.win_probability(&player, &opponent_sure);
        let dampened = calc.win_probability(&player, &opponent_unsure);
        assert!(confident > dampened);
        assert!(dampened > 0.5);
    }

    #[test]
    fn test_winner_gains_loser_drops() {
        let calc = calculator();
        let winner = RatingState::new(1500.0, 350.0);
        let loser = RatingState::new(1500.0, 350.0);

        let up = calc.adjust(&winner, &loser, true, 1.0);
        let down = calc.adjust(&loser, &winner, false, 1.0);

        assert!(up.delta > 0.0);
        assert!(down.delta < 0.0);
        assert!(up.new_deviation < winner.deviation);
        assert!(down.new_deviation < loser.deviation);
    }

    #[test]
    fn test_score_factor_rewards_dominance() {
        let calc = calculator();
        let blowout = calc.score_factor(&[RatedSet::new(11, 0)], false);
        let close = calc.score_factor(&[RatedSet::new(11, 9)], false);

        assert!(blowout > close);
        assert!(close > 1.0);
        assert_eq!(blowout, 1.5);
        assert_eq!(calc.score_factor(&[RatedSet::new(11, 0)], true), 1.0);
    }

    #[test]
    fn test_score_factor_scales_uncapped_delta() {
        let calc = calculator();
        // Heavy favourite winning: the raw delta stays below the cap
        let favourite = RatingState::new(1900.0, 120.0);
        let underdog = RatingState::new(1300.0, 120.0);

        let close = calc.adjust(&favourite, &underdog, true, 1.05);
        let blowout = calc.adjust(&favourite, &underdog, true, 1.5);

        assert!(blowout.delta < calc.max_delta(favourite.deviation));
        assert!(blowout.delta > close.delta);
    }

    #[test]
    fn test_delta_cap() {
        let calc = calculator();
        assert!((calc.max_delta(350.0) - 28.0).abs() < 1e-9);
        assert_eq!(calc.max_delta(2000.0), 75.0);

        let newcomer = RatingState::new(1500.0, 350.0);
        let veteran = RatingState::new(1900.0, 40.0);
        let upset = calc.adjust(&newcomer, &veteran, true, 1.5);
        assert!(upset.raw_delta > upset.delta);
        assert!((upset.delta - 28.0).abs() < 1e-9);
    }

    #[test]
    fn test_deviation_floor() {
        let calc = calculator();
        let settled = RatingState::new(1500.0, 30.0);
        let adjustment = calc.adjust(&settled, &settled, true, 1.0);
        assert_eq!(adjustment.new_deviation, 30.0);
    }

    #[test]
    fn test_decayed_deviation() {
        let calc = calculator();
        let grown = calc.decayed_deviation(100.0, 60.0);
        assert!((grown - (100.0f64 * 100.0 + 2.0 * 35.0 * 35.0).sqrt()).abs() < 1e-9);

        assert_eq!(calc.decayed_deviation(340.0, 3650.0), 350.0);
        assert_eq!(calc.decayed_deviation(100.0, 0.0), 100.0);
    }
}
