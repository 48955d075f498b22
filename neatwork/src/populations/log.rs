use super::Population;
use crate::genomics::Genome;

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug)]
pub enum ReportingLevel {
    /// Clones the entire generation.
    AllGenomes,
    /// Clones each species' representative.
    SpeciesChampions,
    /// Clones only the run's best genome.
    BestGenome,
    /// Clones no genomes.
    NoGenomes,
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// Returns `None` for an empty sequence.
    ///
    /// # Examples
    /// ```
    /// use neatwork::populations::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied()).unwrap();
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Option<Stats> {
        let mut data: Vec<f32> = data.collect();
        if data.is_empty() {
            return None;
        }
        let (mut max, mut min, mut sum) = (f32::MIN, f32::MAX, 0.0);
        for d in &data {
            max = d.max(max);
            min = d.min(min);
            sum += d;
        }
        let mean = sum / data.len() as f32;
        data.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap());
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Some(Stats {
            maximum: max,
            minimum: min,
            mean,
            median,
        })
    }
}

/// A reporting-level dependant store
/// of genomes from a population.
#[derive(Clone, Debug)]
pub enum GenerationSample {
    /// Every genome of the current generation.
    AllGenomes(Vec<Genome>),
    /// Species ids, their representatives (each species' fittest
    /// member at the last speciation), and staleness.
    SpeciesChampions(Vec<(usize, Genome, usize)>),
    /// Only the run's best genome.
    BestGenome(Option<Genome>),
    /// Empty.
    None,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation: usize,
    pub species_count: usize,
    pub sample: GenerationSample,
    pub fitness: Option<Stats>,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration: {:?}\n\
            \tspecies_count: {:?}\n\
            \tfitness: {:?}\n\
            }}",
            &self.generation, &self.species_count, &self.fitness,
        )
    }
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Stores a snapshot of a population.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::GeneticConfig;
    /// use neatwork::populations::{
    ///     EvolutionLogger, Population, PopulationConfig, ReportingLevel,
    /// };
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    /// let population = Population::new(
    ///     PopulationConfig {
    ///         population_size: 10,
    ///         rng_seed: Some(42),
    ///         ..PopulationConfig::default()
    ///     },
    ///     GeneticConfig::default(),
    /// );
    ///
    /// // Do something with the population... then log a snapshot.
    /// logger.log(&population);
    /// ```
    pub fn log(&mut self, population: &Population) {
        let genomes = population.genomes();
        self.logs.push(Log {
            generation: population.generation(),
            species_count: population.species().count(),
            sample: match self.reporting_level {
                ReportingLevel::AllGenomes => {
                    GenerationSample::AllGenomes(genomes.to_vec())
                }
                ReportingLevel::SpeciesChampions => GenerationSample::SpeciesChampions(
                    population
                        .species()
                        .map(|s| (s.id(), s.representative().clone(), s.time_stagnated()))
                        .collect(),
                ),
                ReportingLevel::BestGenome => {
                    GenerationSample::BestGenome(population.best().cloned())
                }
                ReportingLevel::NoGenomes => GenerationSample::None,
            },
            fitness: Stats::from(genomes.iter().map(|g| g.fitness())),
        })
    }

    /// Iterates over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_even_length() {
        let stats = Stats::from([4.0, 1.0, 2.0, 3.0].iter().copied()).unwrap();
        assert_eq!(stats.minimum, 1.0);
        assert_eq!(stats.maximum, 4.0);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
    }

    #[test]
    fn stats_empty() {
        assert_eq!(Stats::from(std::iter::empty()), None);
    }
}
