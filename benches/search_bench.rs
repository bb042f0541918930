//! 搜索与评估性能基准

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use xiangqi_engine::engine::Evaluator;
use xiangqi_engine::{Board, Engine, SearchLimits};

fn bench_movegen(c: &mut Criterion) {
    let mut group = c.benchmark_group("movegen");

    let startpos = Board::new();
    group.bench_function("startpos", |b| {
        b.iter(|| black_box(startpos.legal_moves(startpos.current_turn())))
    });

    let endgame =
        Board::from_fen(xiangqi_engine::test_positions::END_ROOK_PAWN).expect("valid fen");
    group.bench_function("endgame", |b| {
        b.iter(|| black_box(endgame.legal_moves(endgame.current_turn())))
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let board = Board::new();
    let evaluator = Evaluator::new();

    c.bench_function("evaluate/startpos", |b| {
        b.iter(|| black_box(evaluator.evaluate(&board, board.current_turn())))
    });
    c.bench_function("evaluate/classical", |b| {
        b.iter(|| black_box(Evaluator::classical(&board, board.current_turn())))
    });
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    for depth in 1..=4u32 {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut board = Board::new();
                let mut engine = Engine::new(16);
                black_box(engine.search(&mut board, &SearchLimits::depth(depth)))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_movegen, bench_evaluate, bench_search);
criterion_main!(benches);
