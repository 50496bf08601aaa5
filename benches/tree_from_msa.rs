use std::hint::black_box;

use bio::io::fasta::Record;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use mitophylo::alignment::Alignment;
use mitophylo::distances::{compute_distance_matrix, DistanceMatrix, Identity};
use mitophylo::tree::TreeMethod;

// (taxa, columns)
const SIZES: [(usize, usize); 4] = [(6, 1000), (16, 16000), (64, 2000), (200, 500)];

fn random_alignment(n: usize, len: usize) -> Alignment {
    let mut rng = StdRng::seed_from_u64(n as u64);
    let ancestor: Vec<u8> = (0..len)
        .map(|_| *b"ACGT".choose(&mut rng).unwrap())
        .collect();
    let records = (0..n)
        .map(|i| {
            let seq: Vec<u8> = ancestor
                .iter()
                .map(|&c| {
                    if rng.gen_bool(0.1) {
                        *b"ACGT-".choose(&mut rng).unwrap()
                    } else {
                        c
                    }
                })
                .collect();
            Record::with_attrs(&format!("taxon{}", i), None, &seq)
        })
        .collect();
    Alignment::new(records).expect("random sequences should form an alignment")
}

fn identity_distances(criterion: &mut Criterion) {
    let mut bench_group = criterion.benchmark_group("identity distances");
    for (n, len) in SIZES {
        let msa = random_alignment(n, len);
        bench_group.bench_function(format!("{}X{}", n, len), |bench| {
            bench.iter(|| compute_distance_matrix(black_box(&msa), &Identity))
        });
    }
    bench_group.finish();
}

fn tree_building(criterion: &mut Criterion) {
    for method in [TreeMethod::Upgma, TreeMethod::NJ] {
        let mut bench_group = criterion.benchmark_group(format!("{} tree", method));
        for (n, len) in SIZES {
            let distances: DistanceMatrix =
                compute_distance_matrix(&random_alignment(n, len), &Identity)
                    .expect("random sequences should overlap");
            let builder = method.builder();
            bench_group.bench_function(format!("{}X{}", n, len), |bench| {
                bench.iter_batched(
                    || distances.clone(),
                    |distances| builder.build_tree(&distances),
                    BatchSize::SmallInput,
                );
            });
        }
        bench_group.finish();
    }
}

criterion_group! {
name = distances;
config = Criterion::default().sample_size(10);
targets = identity_distances
}
criterion_group! {
name = trees;
config = Criterion::default().sample_size(10);
targets = tree_building,
}
criterion_main!(distances, trees);
