use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mosaic_figure::config::{Config, PlotSpec};
use mosaic_figure::mosaic::Mosaic;
use mosaic_figure::pipeline::build_figure;
use mosaic_figure::render::render_svg;
use mosaic_figure::text_metrics::DeterministicMeasurer;
use mosaic_figure::workbook::{Sheet, Workbook};
use std::hint::black_box;
use std::sync::Arc;

const TOKENS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz123456789";

/// A `side` x `side` mosaic of 2x2 blocks, every panel mapped to its own sheet.
fn square_mosaic(side: usize) -> (PlotSpec, Workbook) {
    let tokens: Vec<char> = TOKENS.chars().collect();
    let blocks = side / 2;
    let mut rows = Vec::new();
    for r in 0..side {
        let mut row = String::new();
        for c in 0..side {
            row.push(tokens[(r / 2) * blocks + c / 2]);
        }
        rows.push(row);
    }

    let mut spec = PlotSpec {
        layout_rows: rows,
        ..PlotSpec::default()
    };
    let mut workbook = Workbook::default();
    for token in tokens.iter().take(blocks * blocks) {
        let name = format!("sheet_{token}");
        let xs: Vec<f64> = (0..200).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|x| (x / 10.0).sin() * 100.0).collect();
        let mut sheet = Sheet::default();
        sheet.columns.insert("x".to_string(), xs);
        sheet.columns.insert("y".to_string(), ys);
        workbook.sheets.insert(name.clone(), sheet);
        spec.sheet2panel.insert(name, token.to_string());
    }
    (spec, workbook)
}

fn bench_mosaic_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("mosaic_parse");
    for side in [4usize, 8, 14] {
        let (spec, _) = square_mosaic(side);
        group.bench_with_input(BenchmarkId::from_parameter(side), &spec.layout_rows, |b, rows| {
            b.iter(|| Mosaic::parse(black_box(rows.as_slice())).map(|m| m.n_rows()))
        });
    }
    group.finish();
}

fn bench_build_figure(c: &mut Criterion) {
    let config = Config::default();
    let mut group = c.benchmark_group("build_figure");
    for side in [4usize, 8, 14] {
        let (spec, workbook) = square_mosaic(side);
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
            b.iter(|| {
                let layout = build_figure(
                    black_box(&spec),
                    &workbook,
                    &config,
                    Arc::new(DeterministicMeasurer::default()),
                );
                layout.map(|l| l.panels.len())
            })
        });
    }
    group.finish();
}

fn bench_render_svg(c: &mut Criterion) {
    let config = Config::default();
    let (spec, workbook) = square_mosaic(8);
    let Ok(layout) = build_figure(
        &spec,
        &workbook,
        &config,
        Arc::new(DeterministicMeasurer::default()),
    ) else {
        return;
    };
    c.bench_function("render_svg/8", |b| {
        b.iter(|| render_svg(black_box(&layout.figure)).map(|svg| svg.len()))
    });
}

criterion_group!(benches, bench_mosaic_parse, bench_build_figure, bench_render_svg);
criterion_main!(benches);
