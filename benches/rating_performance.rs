//! Performance benchmarks for rating calculations and standings ranking

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use league_engine::config::RatingConfig;
use league_engine::rating::{
    DmrRatingCalculator, InMemoryRatingStorage, RatedMatch, RatedSet, RatingCalculator,
    RatingEngine, RatingState,
};
use league_engine::standings::{rank_standings, DivisionStanding};
use league_engine::types::Sport;
use league_engine::utils::{current_timestamp, generate_id};
use std::sync::Arc;

fn bench_dmr_adjustment(c: &mut Criterion) {
    let calculator = DmrRatingCalculator::new(RatingConfig::default()).unwrap();
    let player = RatingState::new(1540.0, 180.0);
    let opponent = RatingState::new(1490.0, 220.0);
    let sets = vec![RatedSet::new(6, 3), RatedSet::new(4, 6), RatedSet::new(6, 2)];

    c.bench_function("dmr_adjust_singles", |b| {
        b.iter(|| {
            let factor = calculator.score_factor(black_box(&sets), false);
            black_box(calculator.adjust(black_box(&player), black_box(&opponent), true, factor))
        })
    });
}

fn bench_process_doubles(c: &mut Criterion) {
    let engine = RatingEngine::new(
        RatingConfig::default(),
        Arc::new(InMemoryRatingStorage::new()),
    )
    .unwrap();
    let season_id = generate_id();

    c.bench_function("engine_process_doubles", |b| {
        b.iter(|| {
            let rated = RatedMatch {
                match_id: generate_id(),
                season_id,
                sport: Sport::Padel,
                winners: vec!["p1".to_string(), "p2".to_string()],
                losers: vec!["p3".to_string(), "p4".to_string()],
                sets: vec![RatedSet::new(6, 4), RatedSet::new(7, 5)],
                is_walkover: false,
                played_at: current_timestamp(),
            };
            black_box(engine.process_match(&rated).unwrap())
        })
    });
}

fn bench_rank_division(c: &mut Criterion) {
    let division_id = generate_id();
    let season_id = generate_id();
    let rows: Vec<DivisionStanding> = (0..24)
        .map(|i| {
            let mut row = DivisionStanding::new(
                format!("player_{:02}", i),
                division_id,
                season_id,
                format!("Player {:02}", i),
                10,
            );
            // Coarse point buckets so the tie-break cascade does real work
            row.total_points = (i % 6) * 4;
            row.sets_won = i % 5;
            row.sets_lost = 3;
            row.games_won = 20 + i % 7;
            row.games_lost = 18;
            row
        })
        .collect();

    c.bench_function("rank_division_24_players", |b| {
        b.iter(|| {
            let mut table = rows.clone();
            rank_standings(black_box(&mut table));
            black_box(table)
        })
    });
}

criterion_group!(
    benches,
    bench_dmr_adjustment,
    bench_process_doubles,
    bench_rank_division
);
criterion_main!(benches);
