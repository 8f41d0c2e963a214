use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tag_arranger::arrange::arrange;
use tag_arranger::config::PlacementConfig;
use tag_arranger::document::{Extent, Scene};
use tag_arranger::layout::Point;
use tag_arranger::model::{Element, Label, LabelId, PlacementStrategy, SortAxis};
use std::hint::black_box;

/// `count` labels scattered over a grid of anchors below the origin, boxes of
/// varying width.
fn scattered_scene(count: usize) -> (Scene, Vec<LabelId>) {
    let mut scene = Scene::new();
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let id = i as u64 + 1;
        let x = ((i * 37) % 400) as f64 * 2.5;
        let y = -50.0 - ((i * 53) % 120) as f64 * 4.0;
        scene.add_element(Element::at(id, Point::xy(x, y)));
        scene.add_label(
            Label::new(id, Point::xy(x + 10.0, y + 30.0))
                .tagging(id)
                .with_leader(),
            Some(Extent::centered(20.0 + (i % 7) as f64 * 6.0, 8.0)),
        );
        ids.push(LabelId(id));
    }
    (scene, ids)
}

fn bench_arrange(c: &mut Criterion) {
    let mut group = c.benchmark_group("arrange");
    for count in [50usize, 500, 2000] {
        let (scene, ids) = scattered_scene(count);
        for axis in [SortAxis::Horizontal, SortAxis::Vertical] {
            let config = PlacementConfig::for_axis(axis);
            group.bench_with_input(
                BenchmarkId::new(format!("{axis:?}"), count),
                &scene,
                |b, scene| {
                    b.iter(|| {
                        let mut doc = scene.clone();
                        let report = arrange(
                            &mut doc,
                            black_box(&ids),
                            Some(Point::xy(0.0, 0.0)),
                            &config,
                        )
                        .expect("arrange failed");
                        black_box(report.placed());
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_overlap_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("arrange_overlap_repair");
    for (count, step) in [(200usize, 10.0), (1000, 10.0), (1000, 0.0)] {
        let (scene, ids) = scattered_scene(count);
        let config = PlacementConfig {
            strategy: PlacementStrategy::OverlapRepair,
            step,
            ..PlacementConfig::default()
        };
        group.bench_with_input(
            BenchmarkId::new(format!("step_{step}"), count),
            &scene,
            |b, scene| {
                b.iter(|| {
                    let mut doc = scene.clone();
                    let report = arrange(
                        &mut doc,
                        black_box(&ids),
                        Some(Point::xy(0.0, 0.0)),
                        &config,
                    )
                    .expect("arrange failed");
                    black_box(report.placements.len());
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_arrange, bench_overlap_repair);
criterion_main!(benches);
