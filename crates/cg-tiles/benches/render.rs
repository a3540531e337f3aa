//! Frame render benchmarks: single frame and pooled batch.
//! Run: cargo bench -p cg-tiles

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use cg_core::frame::{Channels, RawFrame};
use cg_core::geometry::{COLUMNS, GridGeometry};
use cg_core::palette::{PIXEL_SIZE, STEPS, Palette, Tile, default_levels};
use cg_tiles::compositor::render_frame;
use cg_tiles::scheduler::RenderScheduler;

fn grey_palette() -> Palette {
    let tiles = (0..STEPS)
        .map(|i| {
            let v = (i * 60) as u8;
            Tile::solid(PIXEL_SIZE, (v, v, v))
        })
        .collect();
    Palette::build("bench", tiles, default_levels()).expect("palette")
}

fn gradient_frame(width: u32, height: u32) -> RawFrame {
    let data = (0..width * height)
        .flat_map(|i| {
            let v = (i % width * 255 / width) as u8;
            [v, v / 2, 255 - v]
        })
        .collect();
    RawFrame::new(data, width, height, Channels::Rgb)
}

fn bench_render(c: &mut Criterion) {
    let palette = grey_palette();
    let frame = gradient_frame(1280, 720);
    let geometry = GridGeometry::compute(1280, 720, COLUMNS).expect("geometry");

    let mut group = c.benchmark_group("render_frame");
    group.sample_size(50);

    group.bench_function("rgb_720p", |b| {
        b.iter(|| black_box(render_frame(black_box(&frame), &palette, &geometry).expect("render")));
    });

    let frames: Vec<RawFrame> = (0..32).map(|_| frame.clone()).collect();
    let scheduler = RenderScheduler::new(0).expect("pool");
    group.bench_function("batch_32_pooled", |b| {
        b.iter(|| black_box(scheduler.render_all(&frames, &palette, &geometry).expect("render")));
    });

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
