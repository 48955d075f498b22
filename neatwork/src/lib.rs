//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Both the weights and the topology of each network co-evolve: a
//! [`Population`] carries a generation of [`Genome`]s, clustered into
//! species by genetic distance, and advances one generation per
//! [`epoch`] call. Structural mutations draw their identifiers from a
//! run-wide innovation [`History`], which keeps crossover between
//! topologically different genomes meaningful. Each genome
//! instantiates as a feedforward [`Network`] phenotype.
//!
//! The host owns fitness: build the phenotypes, evaluate them against
//! the task, write each genome's fitness, and call `epoch`.
//!
//! [`Population`]: populations::Population
//! [`Genome`]: genomics::Genome
//! [`History`]: genomics::History
//! [`Network`]: networks::Network
//! [`epoch`]: populations::Population::epoch
//!
//! # Example usage: evolving an XOR function approximator
//! ```
//! use neatwork::genomics::GeneticConfig;
//! use neatwork::populations::{Population, PopulationConfig};
//! use std::collections::HashMap;
//!
//! const XOR: [([f32; 2], f32); 4] = [
//!     ([0.0, 0.0], 0.0),
//!     ([0.0, 1.0], 1.0),
//!     ([1.0, 0.0], 1.0),
//!     ([1.0, 1.0], 0.0),
//! ];
//!
//! let mut population = Population::new(
//!     PopulationConfig {
//!         population_size: 30,
//!         rng_seed: Some(42),
//!         ..PopulationConfig::default()
//!     },
//!     GeneticConfig {
//!         input_count: 2,
//!         output_count: 1,
//!         bias: true,
//!         ..GeneticConfig::default()
//!     },
//! );
//!
//! for _ in 0..10 {
//!     population.evaluate_fitness(|genome, network| {
//!         let ids = genome.input_ids();
//!         let mut error = 0.0;
//!         for (inputs, expected) in XOR {
//!             let inputs = HashMap::from([(ids[0], inputs[0]), (ids[1], inputs[1])]);
//!             error += (network.evaluate(&inputs)[0].1 - expected).abs();
//!         }
//!         4.0 - error
//!     });
//!     population.epoch();
//! }
//!
//! println!("best fitness so far: {}", population.stats().best_fitness);
//! ```

pub mod genomics;
pub mod networks;
pub mod populations;

/// Identifier type used to designate historically
/// identical structural mutations for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;

/// Identifier type for nodes, unique within a run.
/// Kept in a separate number space from [`Innovation`].
pub type NodeId = usize;
