//! A Population is a collection of genomes grouped into species
//! that can be evolved one generation at a time, using host-assigned
//! genome fitness as the source of selective pressure.
//!
//! The host loop is: build the phenotypes, evaluate them, write each
//! genome's fitness, then call [`Population::epoch`].

mod config;
mod log;
mod species;

pub use config::PopulationConfig;
pub use log::{EvolutionLogger, GenerationSample, Log, ReportingLevel, Stats};
pub use species::Species;

use crate::genomics::{GeneticConfig, Genome, History};
use crate::networks::Network;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Node-addition amplification at the start of the schedule horizon.
const NODE_AMPLIFIER_START: f32 = 20.0;
/// Node-addition amplification at the end of the schedule horizon.
const NODE_AMPLIFIER_END: f32 = 0.5;
/// Connection add/remove amplification inside the configured window.
const CONNECTION_AMPLIFIER: f32 = 4.0;

/// Live mutation-rate state, kept apart from the base configuration.
/// The stagnation ratchet and the threshold homeostasis modify these
/// copies; the configs themselves stay pure inputs.
#[derive(Clone, Debug)]
struct MutationRates {
    add_node_rate: f32,
    add_conn_rate: f32,
    remove_conn_rate: f32,
    weight_perturb_strength: f32,
    compat_threshold: f32,
}

/// A point-in-time view of the population's state and controllers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PopulationStats {
    /// Completed generation count.
    pub generation: usize,
    /// Best fitness ever observed; `NEG_INFINITY` before the first epoch.
    pub best_fitness: f32,
    /// Current species count.
    pub species: usize,
    /// Generations since the best fitness last improved.
    pub stagnation: usize,
    /// The live, adapted compatibility threshold.
    pub compat_threshold: f32,
}

/// A population of genomes.
///
/// The population owns every genome of the current generation, the
/// run-wide innovation [`History`], the species list, and a deep copy
/// of the best genome ever observed. A seeded random source drives
/// every random decision; see [`PopulationConfig::rng_seed`].
pub struct Population {
    genomes: Vec<Genome>,
    species: Vec<Species>,
    history: History,
    rates: MutationRates,
    generation: usize,
    best: Option<Genome>,
    best_fitness_ever: f32,
    generations_without_improvement: usize,
    species_counter: usize,
    rng: ChaCha8Rng,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
}

impl Population {
    /// Creates a new population using the passed configurations.
    ///
    /// These configurations shouldn't be modified once evolution
    /// begins, thus they are copied and kept by the population for
    /// the duration of its lifetime.
    pub fn new(population_config: PopulationConfig, genetic_config: GeneticConfig) -> Population {
        let mut rng = match population_config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut history = History::new(&genetic_config);
        let genomes = (0..population_config.population_size)
            .map(|_| Genome::new(&genetic_config, &mut history, &mut rng))
            .collect();
        Population {
            genomes,
            species: Vec::new(),
            history,
            rates: MutationRates {
                add_node_rate: genetic_config.add_node_rate,
                add_conn_rate: genetic_config.add_conn_rate,
                remove_conn_rate: genetic_config.remove_conn_rate,
                weight_perturb_strength: genetic_config.weight_perturb_strength,
                compat_threshold: population_config.compat_threshold,
            },
            generation: 0,
            best: None,
            best_fitness_ever: f32::NEG_INFINITY,
            generations_without_improvement: 0,
            species_counter: 0,
            rng,
            population_config,
            genetic_config,
        }
    }

    /// Returns one freshly built phenotype per current genome, in the
    /// current genome order. Pair them with [`genomes_mut`] by index
    /// to write fitness back.
    ///
    /// [`genomes_mut`]: Population::genomes_mut
    pub fn build_networks(&self) -> Vec<Network> {
        self.genomes.iter().map(Network::new).collect()
    }

    /// Evaluates the fitness of each genome in the population using
    /// the passed evaluator. Higher is better.
    ///
    /// This is a convenience over [`build_networks`] +
    /// [`genomes_mut`] for hosts that evaluate sequentially.
    ///
    /// [`build_networks`]: Population::build_networks
    /// [`genomes_mut`]: Population::genomes_mut
    pub fn evaluate_fitness<E>(&mut self, mut evaluator: E)
    where
        E: FnMut(&Genome, &mut Network) -> f32,
    {
        for genome in &mut self.genomes {
            let mut network = Network::new(genome);
            genome.fitness = evaluator(genome, &mut network);
        }
    }

    /// Advances the population one generation.
    ///
    /// In order: genomes are sorted by fitness, the best-ever record
    /// is updated, the stagnation ratchet inflates the live mutation
    /// rates if the run has been stuck, genomes are re-speciated
    /// under the adapted compatibility threshold, stagnated species
    /// are culled, fitness sharing assigns per-species offspring
    /// quotas, and the next generation is produced from elites,
    /// crossover and mutation, backfilling from the old generation's
    /// top performers if quotas fall short.
    ///
    /// The host is expected to have assigned every genome's fitness
    /// beforehand; fitness is carried over, not reset, so stale
    /// values are the host's responsibility.
    pub fn epoch(&mut self) {
        self.sort_genomes_by_decreasing_fitness();
        self.update_best();
        if self.generations_without_improvement > 5 {
            self.inflate_mutation_rates();
        }
        self.speciate();
        self.cull_stagnated_species();
        self.genomes = self.reproduce();
        self.generation += 1;
        for genome in &mut self.genomes {
            genome.adjusted_fitness = 0.0;
        }
        // Member indices referred to the generation just replaced;
        // they are rebuilt from scratch at the next speciation.
        for species in &mut self.species {
            species.clear_members();
        }
    }

    fn sort_genomes_by_decreasing_fitness(&mut self) {
        self.genomes.sort_by(|a, b| {
            b.fitness
                .partial_cmp(&a.fitness)
                .unwrap_or_else(|| panic!("invalid genome fitnesses detected (NaN)"))
        });
    }

    /// Updates the best-ever watermark and its deep-copied genome.
    /// Only a strict improvement resets the improvement counter.
    fn update_best(&mut self) {
        let top_fitness = match self.genomes.first() {
            Some(genome) => genome.fitness,
            None => return,
        };
        if top_fitness > self.best_fitness_ever {
            self.best_fitness_ever = top_fitness;
            self.best = Some(self.genomes[0].clone());
            self.generations_without_improvement = 0;
        } else {
            self.generations_without_improvement += 1;
        }
    }

    /// Permanently inflates the live structural rates after prolonged
    /// stagnation. The inflation is a deliberate ratchet: rates stay
    /// inflated after the run recovers.
    fn inflate_mutation_rates(&mut self) {
        let rates = &mut self.rates;
        rates.add_node_rate = (rates.add_node_rate * 1.1).min(0.2);
        rates.add_conn_rate = (rates.add_conn_rate * 1.1).min(0.3);
        rates.remove_conn_rate = (rates.remove_conn_rate * 1.1).min(0.3);
        rates.weight_perturb_strength = (rates.weight_perturb_strength * 1.1).min(3.0);
    }

    /// Species-count homeostasis: nudges the live compatibility
    /// threshold towards a target of `population_size / 10` species,
    /// with the target clamped to [5, 20] and the threshold to
    /// [0.5, 5.0].
    fn adapt_compat_threshold(&mut self) {
        let target = (self.population_config.population_size / 10).clamp(5, 20);
        if self.species.len() > target {
            self.rates.compat_threshold *= 1.05;
        } else {
            self.rates.compat_threshold *= 0.95;
        }
        self.rates.compat_threshold = self.rates.compat_threshold.clamp(0.5, 5.0);
    }

    /// Reassigns every genome to the first species whose
    /// representative lies within the compatibility threshold,
    /// creating a new species when none does. Emptied species are
    /// dropped and every survivor's representative becomes its
    /// current fittest member.
    fn speciate(&mut self) {
        self.adapt_compat_threshold();
        for species in &mut self.species {
            species.clear_members();
        }

        let threshold = self.rates.compat_threshold;
        let genetic_config = &self.genetic_config;
        let species_list = &mut self.species;
        let species_counter = &mut self.species_counter;
        for (index, genome) in self.genomes.iter().enumerate() {
            match species_list.iter_mut().find(|s| {
                Genome::genetic_distance(genome, s.representative(), genetic_config) < threshold
            }) {
                Some(species) => species.add_member(index),
                None => {
                    let mut species = Species::new(*species_counter, genome.clone());
                    *species_counter += 1;
                    species.add_member(index);
                    species_list.push(species);
                }
            }
        }

        self.species.retain(|s| !s.is_empty());
        for species in &mut self.species {
            let fittest = species.members()[0];
            species.set_representative(self.genomes[fittest].clone());
        }
    }

    /// Updates every species' staleness and drops those past the
    /// stagnation threshold, unless they house the run's best genome.
    fn cull_stagnated_species(&mut self) {
        let genomes = &self.genomes;
        for species in &mut self.species {
            species.update_stagnation(genomes);
        }
        let threshold = self.population_config.stagnation_threshold;
        let best_fitness = self.best_fitness_ever;
        let have_best = self.best.is_some();
        self.species.retain(|s| {
            s.time_stagnated() < threshold || (have_best && s.contains_best(genomes, best_fitness))
        });
    }

    /// Produces the next generation: per-species elites first, then
    /// quota-allotted offspring, then backfill from the old
    /// generation's top 10 until the population is full.
    fn reproduce(&mut self) -> Vec<Genome> {
        let population_size = self.population_config.population_size;
        let mut next = Vec::with_capacity(population_size);

        let mut shares = Vec::with_capacity(self.species.len());
        let mut total_adjusted = 0.0f32;
        for species in &mut self.species {
            let share = species.share_fitness(&mut self.genomes);
            total_adjusted += share;
            shares.push(share);
        }

        for species in &self.species {
            for &member in species.members().iter().take(self.population_config.elitism) {
                if next.len() == population_size {
                    break;
                }
                next.push(self.genomes[member].clone());
            }
        }

        let slots = population_size - next.len();
        let quotas = offspring_quotas(&shares, total_adjusted, slots, self.species.len());
        let (node_rate, conn_rate, removal_rate) = self.amplified_rates();

        let plans: Vec<(Vec<usize>, usize, usize)> = self
            .species
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let eligible =
                    s.members()[..s.survivor_count(self.population_config.survival_threshold)]
                        .to_vec();
                (eligible, s.members()[0], quotas[i])
            })
            .collect();

        'fill: for (eligible, champion, quota) in plans {
            for _ in 0..quota {
                if next.len() == population_size {
                    break 'fill;
                }
                let child =
                    self.spawn_offspring(&eligible, champion, node_rate, conn_rate, removal_rate);
                next.push(child);
            }
        }

        let pool = self.genomes.len().min(10);
        while next.len() < population_size && pool > 0 {
            let mut child = self.genomes[self.rng.gen_range(0..pool)].clone();
            self.mutate_offspring(&mut child, node_rate, conn_rate, removal_rate, 1);
            next.push(child);
        }

        next
    }

    /// Produces one child for a species: crossover between two
    /// uniformly drawn eligible parents (the fitter parent leading),
    /// or a clone of the species' best, then mutation.
    fn spawn_offspring(
        &mut self,
        eligible: &[usize],
        champion: usize,
        node_rate: f32,
        conn_rate: f32,
        removal_rate: f32,
    ) -> Genome {
        let mut child = if self.rng.gen::<f32>() < self.population_config.crossover_rate {
            let first = eligible[self.rng.gen_range(0..eligible.len())];
            let second = eligible[self.rng.gen_range(0..eligible.len())];
            let (fitter, other) = if self.genomes[first].fitness >= self.genomes[second].fitness {
                (first, second)
            } else {
                (second, first)
            };
            self.genomes[fitter].crossover(&self.genomes[other], &mut self.rng)
        } else {
            self.genomes[champion].clone()
        };
        self.mutate_offspring(
            &mut child,
            node_rate,
            conn_rate,
            removal_rate,
            self.genetic_config.max_mutation_attempts,
        );
        child
    }

    /// Runs the compound mutation cycle over a child `cycles` times.
    /// Each pass gates the weight pass and the three structural
    /// mutations behind their own Bernoulli draws.
    fn mutate_offspring(
        &mut self,
        child: &mut Genome,
        node_rate: f32,
        conn_rate: f32,
        removal_rate: f32,
        cycles: usize,
    ) {
        for _ in 0..cycles {
            if self.rng.gen::<f32>() < self.genetic_config.weight_mutation_rate {
                child.mutate_weights(
                    &self.genetic_config,
                    self.rates.weight_perturb_strength,
                    &mut self.rng,
                );
            }
            if self.rng.gen::<f32>() < conn_rate {
                child.mutate_add_connection(
                    &mut self.history,
                    &mut self.rng,
                    self.genetic_config.max_connection_attempts,
                );
            }
            if self.rng.gen::<f32>() < removal_rate {
                child.mutate_remove_connection(&mut self.rng);
            }
            if self.rng.gen::<f32>() < node_rate {
                child.mutate_add_node(&mut self.history, &mut self.rng);
            }
        }
    }

    /// Returns the effective structural rates for this generation:
    /// the live rates scaled by the early-exploration schedules.
    /// While the generation lies within the amplifier horizon the
    /// node-addition rate decays linearly from strong topology
    /// exploration down to conservative growth; the connection rates
    /// are multiplied by a constant inside their configured window.
    fn amplified_rates(&self) -> (f32, f32, f32) {
        let mut add_node = self.rates.add_node_rate;
        let mut add_conn = self.rates.add_conn_rate;
        let mut remove_conn = self.rates.remove_conn_rate;

        let horizon = self.population_config.mutation_amplifier_horizon;
        if horizon > 0 && self.generation <= horizon {
            let progress = self.generation as f32 / horizon as f32;
            add_node *= NODE_AMPLIFIER_START * (1.0 - progress) + NODE_AMPLIFIER_END * progress;
        }

        let (from, to) = self.population_config.connection_amplifier_range;
        if (from..to).contains(&self.generation) {
            add_conn *= CONNECTION_AMPLIFIER;
            remove_conn *= CONNECTION_AMPLIFIER;
        }

        (add_node, add_conn, remove_conn)
    }

    /// Returns the best genome ever observed, a deep copy unaffected
    /// by later mutation or species culling. `None` before the first
    /// epoch.
    pub fn best(&self) -> Option<&Genome> {
        self.best.as_ref()
    }

    /// Returns a view of all current genomes.
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Returns a mutable view of all current genomes, for fitness
    /// assignment.
    pub fn genomes_mut(&mut self) -> &mut [Genome] {
        &mut self.genomes
    }

    /// Returns an iterator over all current species.
    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the run-wide innovation history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Returns a point-in-time view of the population's state.
    pub fn stats(&self) -> PopulationStats {
        PopulationStats {
            generation: self.generation,
            best_fitness: self.best_fitness_ever,
            species: self.species.len(),
            stagnation: self.generations_without_improvement,
            compat_threshold: self.rates.compat_threshold,
        }
    }
}

/// Allots offspring per species proportionally to adjusted-fitness
/// share, rounded per species. A non-positive total (every fitness
/// zero, or negative) degenerates into an even split; the caller's
/// capacity cap and backfill absorb rounding drift in either
/// direction.
fn offspring_quotas(shares: &[f32], total: f32, slots: usize, species_count: usize) -> Vec<usize> {
    if species_count == 0 {
        return Vec::new();
    }
    if total > 0.0 {
        shares
            .iter()
            .map(|share| (share / total * slots as f32).round().max(0.0) as usize)
            .collect()
    } else {
        vec![(slots + species_count - 1) / species_count; species_count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::NodeKind;

    fn test_population(size: usize) -> Population {
        Population::new(
            PopulationConfig {
                population_size: size,
                rng_seed: Some(42),
                ..PopulationConfig::default()
            },
            GeneticConfig::default(),
        )
    }

    fn assign_fitness(population: &mut Population) {
        // Arbitrary but deterministic: connection-weight magnitude,
        // summed in innovation order.
        for genome in population.genomes_mut() {
            let mut weights: Vec<(usize, f32)> = genome
                .connections()
                .map(|c| (c.innovation(), c.weight().abs()))
                .collect();
            weights.sort_by_key(|(id, _)| *id);
            let fitness = weights.iter().map(|(_, w)| w).sum();
            genome.set_fitness(fitness);
        }
    }

    #[test]
    fn population_size_is_invariant() {
        let mut population = test_population(37);
        assert_eq!(population.genomes().len(), 37);
        for _ in 0..10 {
            assign_fitness(&mut population);
            population.epoch();
            assert_eq!(population.genomes().len(), 37);
        }
    }

    #[test]
    fn best_fitness_is_monotone() {
        let mut population = test_population(30);
        let mut previous = f32::NEG_INFINITY;
        for _ in 0..10 {
            assign_fitness(&mut population);
            population.epoch();
            let stats = population.stats();
            assert!(stats.best_fitness >= previous);
            previous = stats.best_fitness;
        }
    }

    #[test]
    fn best_is_a_deep_copy() {
        let mut population = test_population(20);
        assign_fitness(&mut population);
        population.epoch();

        let snapshot = population.best().unwrap().clone();
        for _ in 0..5 {
            assign_fitness(&mut population);
            population.epoch();
        }
        // Either untouched, or replaced by a strictly better genome.
        assert!(population.best().unwrap().fitness() >= snapshot.fitness());
        assert!(population
            .best()
            .unwrap()
            .connections()
            .all(|c| c.weight().is_finite()));
    }

    #[test]
    fn elites_survive_bit_identical() {
        let mut population = test_population(25);
        assign_fitness(&mut population);

        let mut top = population
            .genomes()
            .iter()
            .cloned()
            .max_by(|a, b| a.fitness().partial_cmp(&b.fitness()).unwrap())
            .unwrap();
        top.adjusted_fitness = 0.0;

        population.epoch();
        assert!(
            population.genomes().iter().any(|g| *g == top),
            "per-species elite lost across the generation boundary"
        );
    }

    #[test]
    fn epoch_counts_generations() {
        let mut population = test_population(10);
        assert_eq!(population.generation(), 0);
        for expected in 1..=5 {
            assign_fitness(&mut population);
            population.epoch();
            assert_eq!(population.generation(), expected);
        }
    }

    #[test]
    fn adjusted_fitness_reset_after_epoch() {
        let mut population = test_population(15);
        assign_fitness(&mut population);
        population.epoch();
        assert!(population
            .genomes()
            .iter()
            .all(|g| g.adjusted_fitness() == 0.0));
    }

    #[test]
    fn compat_threshold_adapts_and_stays_clamped() {
        let mut population = test_population(30);
        let start = population.stats().compat_threshold;
        assign_fitness(&mut population);
        population.epoch();
        // One species at most a handful of generations in: the
        // threshold should have been nudged downwards.
        assert!(population.stats().compat_threshold < start);

        for _ in 0..60 {
            assign_fitness(&mut population);
            population.epoch();
            let threshold = population.stats().compat_threshold;
            assert!((0.5..=5.0).contains(&threshold));
        }
    }

    #[test]
    fn stagnated_species_are_culled_unless_best() {
        let mut population = test_population(20);
        assign_fitness(&mut population);
        population.epoch();
        let genome = population.genomes()[0].clone();
        let threshold = population.population_config.stagnation_threshold;

        // A species stalled past the threshold, without the best genome.
        let mut stalled = Species::new(900, genome.clone());
        stalled.add_member(population.genomes().len() - 1);
        for _ in 0..=threshold {
            stalled.update_stagnation(population.genomes());
        }
        assert!(stalled.time_stagnated() >= threshold);

        // A species housing the run's best, equally stalled.
        let mut sheltered = Species::new(901, genome);
        sheltered.add_member(0);
        for _ in 0..=threshold {
            sheltered.update_stagnation(population.genomes());
        }

        population.sort_genomes_by_decreasing_fitness();
        population.update_best();
        population.species = vec![stalled, sheltered];
        population.cull_stagnated_species();

        let surviving: Vec<usize> = population.species().map(|s| s.id()).collect();
        assert_eq!(surviving, vec![901]);
    }

    #[test]
    fn mutation_rate_ratchet_is_capped() {
        let mut population = test_population(10);
        // Identical zero fitness every generation: permanent stagnation.
        for _ in 0..100 {
            population.epoch();
        }
        assert!(population.rates.add_node_rate <= 0.2);
        assert!(population.rates.add_conn_rate <= 0.3);
        assert!(population.rates.remove_conn_rate <= 0.3);
        assert!(population.rates.weight_perturb_strength <= 3.0);
        // And the ratchet did engage.
        assert!(population.rates.add_node_rate > population.genetic_config.add_node_rate);
    }

    #[test]
    fn offspring_quotas_are_proportional() {
        let quotas = offspring_quotas(&[6.0, 3.0, 1.0], 10.0, 100, 3);
        assert_eq!(quotas, vec![60, 30, 10]);
    }

    #[test]
    fn offspring_quotas_degenerate_total() {
        let quotas = offspring_quotas(&[0.0, 0.0], 0.0, 10, 2);
        assert_eq!(quotas, vec![5, 5]);
        let quotas = offspring_quotas(&[-1.0, -2.0], -3.0, 10, 2);
        assert_eq!(quotas, vec![5, 5]);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = || {
            let mut population = test_population(20);
            for _ in 0..5 {
                assign_fitness(&mut population);
                population.epoch();
            }
            population.stats()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn initial_genomes_share_io_scaffold() {
        let population = test_population(10);
        let first = population.genomes()[0].input_ids();
        for genome in population.genomes() {
            assert_eq!(genome.input_ids(), first);
            assert_eq!(
                genome
                    .nodes()
                    .filter(|n| n.kind() == NodeKind::Output)
                    .count(),
                1
            );
        }
    }
}
