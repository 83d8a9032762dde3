//! Benchmarks for mesh operations.

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::{Point3, Vector3};
use tessellate::algo::march::extract_raw;
use tessellate::prelude::*;

fn create_ball_grid(n: usize) -> VoxelGrid {
    let mut grid = VoxelGrid::new(n, n, n).unwrap();
    let c = (n as f64 - 1.0) / 2.0;
    let r = n as f64 / 3.0;

    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let d = Vector3::new(x as f64 - c, y as f64 - c, z as f64 - c);
                if d.norm() <= r {
                    grid.set(x, y, z, true).unwrap();
                }
            }
        }
    }
    grid
}

fn bench_surface_extraction(c: &mut Criterion) {
    let grid = create_ball_grid(32);

    c.bench_function("marching_cubes_32", |b| {
        b.iter(|| marching_cubes(&grid, &MarchOptions::default()).unwrap());
    });

    let faces = MarchOptions::default().with_extraction(Extraction::VoxelFaces);
    c.bench_function("voxel_faces_32", |b| {
        b.iter(|| marching_cubes(&grid, &faces).unwrap());
    });
}

fn bench_weld(c: &mut Criterion) {
    let raw = extract_raw(&create_ball_grid(32), &MarchOptions::default());

    c.bench_function("weld_soup_32", |b| {
        b.iter(|| {
            let mut mesh = raw.clone();
            mesh.merge_verts(&WeldOptions::default()).unwrap()
        });
    });
}

fn bench_containment(c: &mut Criterion) {
    let mesh = marching_cubes(&create_ball_grid(24), &MarchOptions::default()).unwrap();
    let mut fast = mesh.clone();
    fast.set_config(MeshConfig::default().with_sphere_accel(true));

    let points: Vec<Point3<f64>> = (0..64)
        .map(|i| Point3::new(4.0 + (i % 8) as f64 * 2.1, 4.0 + (i / 8) as f64 * 2.1, 12.3))
        .collect();

    c.bench_function("containment_brute_force", |b| {
        b.iter(|| points.iter().filter(|p| mesh.point_containment(p)).count());
    });

    c.bench_function("containment_sphere_accel", |b| {
        b.iter(|| points.iter().filter(|p| fast.point_containment(p)).count());
    });
}

fn bench_smoothing(c: &mut Criterion) {
    let mesh = marching_cubes(&create_ball_grid(32), &MarchOptions::default()).unwrap();

    for parallel in [false, true] {
        let name = if parallel { "laplacian_5_parallel" } else { "laplacian_5_sequential" };
        let options = SmoothOptions::default().with_iterations(5).with_parallel(parallel);
        c.bench_function(name, |b| {
            b.iter(|| {
                let mut m = mesh.clone();
                let _ = laplacian_smooth(&mut m, &options);
                m
            });
        });
    }
}

criterion_group!(
    benches,
    bench_surface_extraction,
    bench_weld,
    bench_containment,
    bench_smoothing
);
criterion_main!(benches);
