//! Benchmarks for pairing and linearization

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scl_linearizer::prelude::*;

/// Square `n x n` surfaces of a wall with a linear stress gradient
fn wall(n: usize) -> (Geometry, NodalResult) {
    let mut first = Vec::with_capacity(n * n);
    let mut second = Vec::with_capacity(n * n);
    for j in 0..n {
        for i in 0..n {
            let id = (j * n + i) as NodeId;
            // slightly perturbed second surface so pairing has work to do
            let jitter = 0.01 * ((i * 7 + j * 3) % 5) as f64;
            first.push(Node::new(id, i as f64, j as f64, 0.0));
            second.push(Node::new(id + 100_000, i as f64 + jitter, j as f64 - jitter, 5.0));
        }
    }
    let first: NodeSet = first.into_iter().collect();
    let second: NodeSet = second.into_iter().collect();
    let locations: NodeLocations = first.iter().chain(second.iter()).copied().collect();

    let mut result = NodalResult::new();
    for node in locations.iter() {
        let sxx = 200.0 - 20.0 * node.z + node.x;
        result.insert(
            node.id,
            NodalValues {
                coords: None,
                stress: [sxx, 0.3 * sxx, 0.0, 10.0, 0.0, 0.0],
                elastic_strain: StrainRecord {
                    components: [sxx / 2e5, -0.3 * sxx / 2e5, -0.3 * sxx / 2e5, 0.0, 0.0, 0.0],
                    eqv: sxx / 2e5,
                },
                plastic_strain: None,
            },
        );
    }
    (Geometry::new(first, second, locations), result)
}

fn bench_pairing(c: &mut Criterion) {
    let mut group = c.benchmark_group("assignment_pairing");
    for n in [10, 20, 30] {
        let (geometry, _) = wall(n);
        group.bench_with_input(BenchmarkId::from_parameter(n * n), &geometry, |b, g| {
            b.iter(|| pair_nodes(black_box(&g.first), black_box(&g.second), PairingStrategy::Assignment, None))
        });
    }
    group.finish();
}

fn bench_linearize(c: &mut Criterion) {
    let (geometry, result) = wall(20);
    let linearizer = Linearizer::new(geometry, LinearizationOptions::default().without_cache()).unwrap();
    let params = CaseParameters::new();

    c.bench_function("linearize_400_lines_47_points", |b| {
        b.iter(|| linearizer.linearize("bench", &params, black_box(&result)))
    });
}

criterion_group!(benches, bench_pairing, bench_linearize);
criterion_main!(benches);
