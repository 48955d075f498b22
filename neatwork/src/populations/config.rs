use serde::{Deserialize, Serialize};

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of genomes carried each generation.
    pub population_size: usize,
    /// Genetic distance threshold, beyond which genomes are
    /// considered as belonging to different species. This is the
    /// starting point; the population adapts the live threshold each
    /// generation to steer the species count towards
    /// `population_size / 10`, clamped to [5, 20].
    pub compat_threshold: f32,
    /// Top n of each species which is copied
    /// as-is to the next generation.
    pub elitism: usize,
    /// Top fraction of each species which can participate
    /// in mating.
    pub survival_threshold: f32,
    /// Number of generations without a fitness increase
    /// before a species is culled, unless it houses the
    /// run's best genome.
    pub stagnation_threshold: usize,
    /// Chance that offspring is produced by crossover;
    /// otherwise the species' best member is cloned.
    pub crossover_rate: f32,
    /// Horizon (in generations) over which the node-addition rate is
    /// amplified, decaying linearly from ~20x down to ~0.5x.
    pub mutation_amplifier_horizon: usize,
    /// Generation window `[from, to)` during which the
    /// connection-addition and -removal rates are multiplied.
    pub connection_amplifier_range: (usize, usize),
    /// Seed for the population's random source. `None` seeds from
    /// entropy; a fixed seed reproduces the run.
    pub rng_seed: Option<u64>,
}

impl Default for PopulationConfig {
    fn default() -> PopulationConfig {
        PopulationConfig {
            population_size: 150,
            compat_threshold: 3.0,
            elitism: 2,
            survival_threshold: 0.2,
            stagnation_threshold: 15,
            crossover_rate: 0.75,
            mutation_amplifier_horizon: 20,
            connection_amplifier_range: (0, 10),
            rng_seed: None,
        }
    }
}
