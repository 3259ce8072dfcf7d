use std::hint::black_box;

use arcade_core::minesweeper::{
    Board, Difficulty, MineGenerator, MineLayout, Minesweeper, MinesMove, SafeOpeningGenerator,
};
use arcade_core::snake::{Snake, SnakeConfig};
use arcade_core::Game;
use criterion::{Criterion, criterion_group, criterion_main};

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    for (name, difficulty) in [
        ("easy", Difficulty::EASY),
        ("medium", Difficulty::MEDIUM),
        ("hard", Difficulty::HARD),
    ] {
        let mut seed = 0u64;
        group.bench_function(name, |b| {
            b.iter(|| {
                seed += 1;
                let generator = SafeOpeningGenerator::new(seed, (difficulty.rows / 2, difficulty.cols / 2));
                black_box(generator.generate(difficulty))
            })
        });
    }
    group.finish();
}

fn bench_flood_reveal(c: &mut Criterion) {
    // a single mine in the corner, the opening floods almost the whole board
    let layout = MineLayout::from_mine_coords((16, 30), &[(0, 0)]).unwrap();

    c.bench_function("flood_reveal_16x30", |b| {
        b.iter(|| {
            let mut board = Board::with_layout(layout.clone());
            black_box(board.reveal(black_box((15, 29))))
        })
    });
}

fn bench_first_click(c: &mut Criterion) {
    c.bench_function("first_click_hard", |b| {
        b.iter(|| {
            let mut game = Minesweeper::new(Difficulty::HARD, 99).unwrap();
            black_box(game.apply_move(MinesMove::Reveal((8, 15))))
        })
    });
}

fn bench_snake_tick(c: &mut Criterion) {
    let mut game = Snake::new(SnakeConfig::default(), 1).unwrap();

    c.bench_function("snake_tick", |b| {
        b.iter(|| {
            if game.outcome().is_some() {
                game.restart();
            }
            black_box(game.tick())
        })
    });
}

criterion_group!(
    benches,
    bench_generate,
    bench_flood_reveal,
    bench_first_click,
    bench_snake_tick
);
criterion_main!(benches);
