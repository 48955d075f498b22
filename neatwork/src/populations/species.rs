use crate::genomics::Genome;

use serde::{Deserialize, Serialize};

/// Species are collections of reproductively compatible (within a
/// certain [genetic distance]) genomes. Membership is determined by
/// calculating the genetic distance to a _representative_, re-chosen
/// each generation as the species' fittest member.
///
/// Members are held as indices into the population's current genome
/// list; the population owns every genome, a species only points at
/// them. The indices are only valid for the generation in which they
/// were assigned, so the population clears every member list when a
/// generation is replaced and rebuilds them at the next speciation.
///
/// A species goes _stale_ one generation at a time while its best
/// member fitness fails to improve on the species' watermark, and is
/// culled once staleness reaches the [stagnation threshold], unless
/// it houses the run's best genome.
///
/// [genetic distance]: crate::populations::PopulationConfig::compat_threshold
/// [stagnation threshold]: crate::populations::PopulationConfig::stagnation_threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    id: usize,
    representative: Genome,
    members: Vec<usize>,
    best_fitness: f32,
    stale: usize,
    average: f32,
}

impl Species {
    /// Creates a new species with the specified id and
    /// representative. The caller is expected to also add the
    /// representative's index to the member list.
    pub fn new(id: usize, representative: Genome) -> Species {
        Species {
            id,
            representative,
            members: Vec::new(),
            best_fitness: f32::NEG_INFINITY,
            stale: 0,
            average: 0.0,
        }
    }

    /// Returns the species' id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the genome used for compatibility comparisons
    /// this generation.
    pub fn representative(&self) -> &Genome {
        &self.representative
    }

    pub(super) fn set_representative(&mut self, representative: Genome) {
        self.representative = representative;
    }

    /// Returns the indices of the species' members, in the order they
    /// were assigned. Since the population sorts genomes by fitness
    /// before speciating, members are ordered fittest first.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Adds a genome index to the species. Members are never
    /// deduplicated.
    pub fn add_member(&mut self, index: usize) {
        self.members.push(index);
    }

    /// Empties the member list for re-speciation.
    pub fn clear_members(&mut self) {
        self.members.clear();
    }

    /// Returns whether the species has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Applies explicit fitness sharing: every member's adjusted
    /// fitness becomes its fitness divided by the species size.
    /// Records the species' average adjusted fitness and returns the
    /// species' total adjusted fitness.
    ///
    /// This is the only place fitness sharing is applied.
    pub(super) fn share_fitness(&mut self, genomes: &mut [Genome]) -> f32 {
        let size = self.members.len() as f32;
        let mut total = 0.0;
        for &m in &self.members {
            let adjusted = genomes[m].fitness / size;
            genomes[m].adjusted_fitness = adjusted;
            total += adjusted;
        }
        self.average = if self.members.is_empty() {
            0.0
        } else {
            total / size
        };
        total
    }

    /// Updates the species' best-fitness watermark. A strict
    /// improvement resets staleness; anything else increments it.
    pub(super) fn update_stagnation(&mut self, genomes: &[Genome]) {
        let best = self
            .members
            .iter()
            .map(|&m| genomes[m].fitness)
            .fold(f32::NEG_INFINITY, f32::max);
        if best > self.best_fitness {
            self.best_fitness = best;
            self.stale = 0;
        } else {
            self.stale += 1;
        }
    }

    /// Returns whether any member performs at least as well as the
    /// run's best fitness. Comparison is behavioural, not by
    /// identity; matching the best's fitness suffices to exempt the
    /// species from stagnation culling.
    pub fn contains_best(&self, genomes: &[Genome], best_fitness: f32) -> bool {
        self.members.iter().any(|&m| genomes[m].fitness >= best_fitness)
    }

    /// Returns the species' best-fitness watermark.
    pub fn best_fitness(&self) -> f32 {
        self.best_fitness
    }

    /// Returns the number of generations the species has gone
    /// without improving its watermark.
    pub fn time_stagnated(&self) -> usize {
        self.stale
    }

    /// Returns the species' average adjusted fitness, as recorded by
    /// the last epoch's fitness sharing.
    pub fn average_fitness(&self) -> f32 {
        self.average
    }

    /// Number of members eligible as parents under the passed
    /// survival threshold, never less than one.
    pub(super) fn survivor_count(&self, survival_threshold: f32) -> usize {
        ((self.members.len() as f32 * survival_threshold) as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{Connection, Genome, Node, NodeKind};

    fn genome_with_fitness(fitness: f32) -> Genome {
        let mut genome = Genome::empty();
        genome.add_node(Node::new(1, NodeKind::Input));
        genome.add_node(Node::new(2, NodeKind::Output));
        genome.add_connection(Connection::new(1, 1, 2, 1.0));
        genome.set_fitness(fitness);
        genome
    }

    fn species_over(genomes: &[Genome]) -> Species {
        let mut species = Species::new(0, genomes[0].clone());
        for i in 0..genomes.len() {
            species.add_member(i);
        }
        species
    }

    #[test]
    fn fitness_sharing_divides_by_size() {
        let mut genomes: Vec<Genome> =
            [12.0, 6.0, 3.0].iter().map(|f| genome_with_fitness(*f)).collect();
        let mut species = species_over(&genomes);

        let total = species.share_fitness(&mut genomes);

        assert_eq!(genomes[0].adjusted_fitness(), 4.0);
        assert_eq!(genomes[1].adjusted_fitness(), 2.0);
        assert_eq!(genomes[2].adjusted_fitness(), 1.0);
        assert_eq!(total, 7.0);
        assert_eq!(species.average_fitness(), 7.0 / 3.0);

        // Σ adjusted == Σ fitness / |members|.
        let adjusted_sum: f32 = genomes.iter().map(|g| g.adjusted_fitness()).sum();
        let fitness_sum: f32 = genomes.iter().map(|g| g.fitness()).sum();
        assert_eq!(adjusted_sum, fitness_sum / 3.0);
    }

    #[test]
    fn stagnation_counts_non_improving_generations() {
        let mut genomes = vec![genome_with_fitness(5.0)];
        let mut species = species_over(&genomes);

        species.update_stagnation(&genomes);
        assert_eq!(species.time_stagnated(), 0);
        assert_eq!(species.best_fitness(), 5.0);

        // Equal fitness is not an improvement.
        species.update_stagnation(&genomes);
        species.update_stagnation(&genomes);
        assert_eq!(species.time_stagnated(), 2);

        genomes[0].set_fitness(6.0);
        species.update_stagnation(&genomes);
        assert_eq!(species.time_stagnated(), 0);
        assert_eq!(species.best_fitness(), 6.0);
    }

    #[test]
    fn contains_best_compares_fitness_not_identity() {
        let genomes = vec![genome_with_fitness(5.0), genome_with_fitness(9.0)];
        let species = species_over(&genomes);

        assert!(species.contains_best(&genomes, 9.0));
        assert!(!species.contains_best(&genomes, 9.5));
    }

    #[test]
    fn survivor_count_floors_at_one() {
        let genomes = vec![genome_with_fitness(1.0)];
        let species = species_over(&genomes);
        assert_eq!(species.survivor_count(0.2), 1);

        let genomes: Vec<Genome> = (0..10).map(|_| genome_with_fitness(1.0)).collect();
        let species = species_over(&genomes);
        assert_eq!(species.survivor_count(0.2), 2);
    }
}
