use criterion::{criterion_group, criterion_main, Criterion};
use printer_plate::{
    combine::Combiner,
    geo::{get_bounds, Triangle3d},
    scene::PlacementScene,
    stl::{decode, encode},
    store::MeshFile,
};
use rayon::prelude::*;
use std::sync::Arc;
use ultraviolet::Vec3;

// fan of thin triangles, enough to make merging measurable
fn mesh(count: usize) -> Vec<Triangle3d> {
    (0..count)
        .map(|i| {
            let a = i as f32 * 0.01;
            Triangle3d::new((0., 0., 0.), (20. * a.cos(), 20. * a.sin(), 5.), (20. * a.cos(), 20. * a.sin(), 10.))
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let bytes = encode(&mesh(50_000));
    let triangles = decode(&bytes).unwrap();

    c.bench_function("decode binary", |b| {
        b.iter(|| {
            let _tris = decode(&bytes).unwrap();
        })
    });
    c.bench_function("iter bounds", |b| {
        b.iter(|| {
            let _bboxes: Vec<_> = triangles.iter().map(|x| x.bbox()).collect();
        })
    });
    c.bench_function("par_iter bounds", |b| {
        b.iter(|| {
            let _bounds = get_bounds(&triangles);
        })
    });

    let mut scene = PlacementScene::default();
    for name in &["a.stl", "b.stl", "c.stl", "d.stl"] {
        scene.add(Arc::new(MeshFile::new(*name, bytes.clone()))).unwrap();
    }
    c.bench_function("combine full", |b| {
        b.iter(|| {
            let _combined = Combiner::new().combine(&scene);
        })
    });

    let mut combiner = Combiner::new();
    combiner.combine(&scene);
    let id = scene.instances()[0].id.clone();
    let start = scene.instances()[0].transform;
    let mut step = 0;
    c.bench_function("combine one moved", |b| {
        b.iter(|| {
            step += 1;
            let moved = start.with_position(start.position + Vec3::new(step as f32 % 10., 0., 0.));
            scene.set_transform(&id, moved).unwrap();
            let _combined = combiner.combine(&scene);
        })
    });

    c.bench_function("par_iter transform", |b| {
        let affine = start.to_affine();
        b.iter(|| {
            let _moved: Vec<Triangle3d> = triangles.par_iter().map(|t| t.transformed(&affine)).collect();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
