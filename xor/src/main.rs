use neatwork::genomics::{GeneticConfig, Genome};
use neatwork::networks::Network;
use neatwork::populations::{Population, PopulationConfig, Stats};

use rayon::prelude::*;

use std::collections::HashMap;

/// Allowed error margin for neural net answers.
const ERROR_MARGIN: f32 = 0.3;
/// Fitness of a genome answering all four cases within the margin.
const SOLVED: f32 = 16.0;

const XOR: [([f32; 2], f32); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

fn evaluate_xor(genome: &Genome, network: &mut Network) -> f32 {
    let ids = genome.input_ids();
    let mut error_sum = 0.0;
    for (inputs, expected) in XOR {
        let inputs = HashMap::from([(ids[0], inputs[0]), (ids[1], inputs[1])]);
        let mut error = (network.evaluate(&inputs)[0].1 - expected).abs();
        if error < ERROR_MARGIN {
            error = 0.0;
        }
        error_sum += error;
    }
    (4.0 - error_sum).powf(2.0)
}

fn configs() -> (PopulationConfig, GeneticConfig) {
    (
        PopulationConfig {
            population_size: 150,
            ..PopulationConfig::default()
        },
        GeneticConfig {
            input_count: 2,
            output_count: 1,
            bias: true,
            ..GeneticConfig::default()
        },
    )
}

/// Builds every phenotype, evaluates them in parallel, and writes
/// the fitness back genome by genome.
fn evaluate_generation(population: &mut Population) {
    let mut networks = population.build_networks();
    let fitnesses: Vec<f32> = networks
        .par_iter_mut()
        .zip(population.genomes().par_iter())
        .map(|(network, genome)| evaluate_xor(genome, network))
        .collect();
    for (genome, fitness) in population.genomes_mut().iter_mut().zip(fitnesses) {
        genome.set_fitness(fitness);
    }
}

fn main() {
    if std::env::args().any(|arg| arg == "--stress") {
        stress_test(25);
    } else {
        single_run();
    }
}

fn single_run() {
    let (population_config, genetic_config) = configs();
    let mut population = Population::new(population_config, genetic_config);

    for _ in 0..200 {
        evaluate_generation(&mut population);
        population.epoch();

        let stats = population.stats();
        if stats.generation % 10 == 0 {
            println!(
                "generation {:>3}: best {:>6.3}, {} species, threshold {:.2}",
                stats.generation, stats.best_fitness, stats.species, stats.compat_threshold
            );
        }
        if (stats.best_fitness - SOLVED).abs() < f32::EPSILON {
            break;
        }
    }

    match population.best() {
        Some(best) if (best.fitness() - SOLVED).abs() < f32::EPSILON => {
            println!("solution found in generation {}:", population.generation());
            println!("{}", ron::to_string(best).unwrap());
        }
        _ => println!(
            "no solution within 200 generations (best: {:.3})",
            population.stats().best_fitness
        ),
    }
}

fn stress_test(iterations: usize) {
    let mut generations: Vec<Option<usize>> = Vec::with_capacity(iterations);

    for _ in 0..iterations {
        let (population_config, genetic_config) = configs();
        let mut population = Population::new(population_config, genetic_config);
        let mut solved = None;
        for _ in 0..200 {
            evaluate_generation(&mut population);
            population.epoch();
            if (population.stats().best_fitness - SOLVED).abs() < f32::EPSILON {
                solved = Some(population.generation());
                break;
            }
        }
        generations.push(solved);
    }

    let failures = generations.iter().filter(|g| g.is_none()).count();
    println!(
        "successful run generation count {:?}, {}% failure rate over {} iterations",
        Stats::from(generations.iter().filter_map(|g| g.map(|g| g as f32))),
        failures as f32 * 100.0 / iterations as f32,
        iterations
    );
}
