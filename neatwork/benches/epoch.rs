//! Benchmarks for neatwork.

use std::collections::HashMap;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use neatwork::genomics::{GeneticConfig, Genome, History};
use neatwork::networks::Network;
use neatwork::populations::{Population, PopulationConfig};

fn bench_genome_creation(c: &mut Criterion) {
    let config = GeneticConfig {
        input_count: 4,
        output_count: 2,
        bias: true,
        hidden_layers: vec![3],
        ..GeneticConfig::default()
    };
    let mut history = History::new(&config);

    c.bench_function("genome_creation", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        b.iter(|| {
            black_box(Genome::new(&config, &mut history, &mut rng));
        });
    });
}

fn bench_mutation(c: &mut Criterion) {
    let config = GeneticConfig::minimal(4, 2);
    let mut history = History::new(&config);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let genome = Genome::new(&config, &mut history, &mut rng);

    c.bench_function("genome_mutation", |b| {
        let mut g = genome.clone();
        b.iter(|| {
            g.mutate_weights(&config, 0.5, &mut rng);
            g.mutate_add_connection(&mut history, &mut rng, 20);
            g.mutate_add_node(&mut history, &mut rng);
            black_box(&g);
        });
    });
}

fn bench_genetic_distance(c: &mut Criterion) {
    let config = GeneticConfig::minimal(4, 2);
    let mut history = History::new(&config);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut first = Genome::new(&config, &mut history, &mut rng);
    let mut second = Genome::new(&config, &mut history, &mut rng);
    for _ in 0..10 {
        first.mutate_add_node(&mut history, &mut rng);
        second.mutate_add_connection(&mut history, &mut rng, 20);
    }

    c.bench_function("genetic_distance", |b| {
        b.iter(|| {
            black_box(Genome::genetic_distance(&first, &second, &config));
        });
    });
}

fn bench_network_evaluation(c: &mut Criterion) {
    let config = GeneticConfig {
        input_count: 4,
        output_count: 2,
        bias: true,
        hidden_layers: vec![4, 4],
        ..GeneticConfig::default()
    };
    let mut history = History::new(&config);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let genome = Genome::new(&config, &mut history, &mut rng);
    let mut network = Network::new(&genome);
    let inputs: HashMap<usize, f32> = genome
        .input_ids()
        .into_iter()
        .zip([0.5, -0.5, 1.0, 0.0])
        .collect();

    c.bench_function("network_evaluate", |b| {
        b.iter(|| {
            black_box(network.evaluate(&inputs));
        });
    });
}

fn bench_epoch(c: &mut Criterion) {
    c.bench_function("population_epoch_100", |b| {
        b.iter_with_setup(
            || {
                let mut population = Population::new(
                    PopulationConfig {
                        population_size: 100,
                        rng_seed: Some(42),
                        ..PopulationConfig::default()
                    },
                    GeneticConfig::default(),
                );
                population.evaluate_fitness(|_, network| {
                    network.evaluate(&HashMap::from([(1, 1.0), (2, -1.0)]))[0].1
                });
                population
            },
            |mut population| {
                population.epoch();
                black_box(&population);
            },
        );
    });
}

criterion_group!(
    benches,
    bench_genome_creation,
    bench_mutation,
    bench_genetic_distance,
    bench_network_evaluation,
    bench_epoch,
);
criterion_main!(benches);
