use serde::{Deserialize, Serialize};

/// Configuration data for genome generation
/// and inter-genome operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of input nodes in a genome.
    pub input_count: usize,
    /// Number of output nodes in a genome.
    pub output_count: usize,
    /// Whether genomes carry a bias node pinned to 1.
    pub bias: bool,
    /// Sizes of the initial hidden layers, in order.
    /// Empty means no hidden nodes at birth. Ignored when
    /// [`randomize_hidden_layers`] is set.
    ///
    /// [`randomize_hidden_layers`]: GeneticConfig::randomize_hidden_layers
    pub hidden_layers: Vec<usize>,
    /// Draw the initial hidden topology per genome instead of
    /// using the fixed [`hidden_layers`] sizes.
    ///
    /// [`hidden_layers`]: GeneticConfig::hidden_layers
    pub randomize_hidden_layers: bool,
    /// Minimum number of hidden layers drawn per genome.
    pub min_hidden_layers: usize,
    /// Maximum number of hidden layers drawn per genome.
    pub max_hidden_layers: usize,
    /// Minimum nodes per drawn hidden layer.
    pub min_nodes_per_layer: usize,
    /// Maximum nodes per drawn hidden layer.
    pub max_nodes_per_layer: usize,
    /// Draw each initial inter-layer connection with
    /// [`connection_probability`] instead of wiring densely.
    ///
    /// [`connection_probability`]: GeneticConfig::connection_probability
    pub sparse_connectivity: bool,
    /// Chance of each candidate edge existing at birth when
    /// sparse connectivity is enabled.
    pub connection_probability: f32,
    /// Also draw candidate edges that skip over intermediate
    /// layers. Only meaningful with sparse connectivity.
    pub skip_connections: bool,
    /// Guarantee every output at least one incoming edge after
    /// sparse wiring.
    pub guaranteed_output_connections: bool,
    /// Magnitude of bound on birth weights and on fully-random
    /// weight resets.
    pub weight_init_range: f32,
    /// Chance of running the weight pass over a child genome.
    pub weight_mutation_rate: f32,
    /// Per-connection chance of a weight being perturbed during
    /// the weight pass.
    pub weight_perturb_rate: f32,
    /// Magnitude of bound on the perturbation uniform distribution.
    pub weight_perturb_strength: f32,
    /// Per-connection chance of a fully-random weight reset when
    /// the connection was not perturbed.
    pub uniform_weight_rate: f32,
    /// Base chance of a node-addition mutation per mutation cycle.
    pub add_node_rate: f32,
    /// Base chance of a connection-addition mutation per mutation cycle.
    pub add_conn_rate: f32,
    /// Base chance of a connection-removal mutation per mutation cycle.
    pub remove_conn_rate: f32,
    /// Number of times the compound mutation cycle is run per offspring.
    pub max_mutation_attempts: usize,
    /// Maximum number of node-pair draws before a connection-addition
    /// mutation returns with failure.
    pub max_connection_attempts: usize,
    /// Weight of excess genes in genetic distance.
    pub c1: f32,
    /// Weight of disjoint genes in genetic distance.
    pub c2: f32,
    /// Weight of the mean matching-gene weight difference in
    /// genetic distance.
    pub c3: f32,
}

impl Default for GeneticConfig {
    fn default() -> GeneticConfig {
        GeneticConfig {
            input_count: 2,
            output_count: 1,
            bias: true,
            hidden_layers: vec![],
            randomize_hidden_layers: false,
            min_hidden_layers: 1,
            max_hidden_layers: 2,
            min_nodes_per_layer: 1,
            max_nodes_per_layer: 3,
            sparse_connectivity: false,
            connection_probability: 0.5,
            skip_connections: false,
            guaranteed_output_connections: true,
            weight_init_range: 2.0,
            weight_mutation_rate: 0.8,
            weight_perturb_rate: 0.9,
            weight_perturb_strength: 0.5,
            uniform_weight_rate: 1.0,
            add_node_rate: 0.03,
            add_conn_rate: 0.05,
            remove_conn_rate: 0.02,
            max_mutation_attempts: 1,
            max_connection_attempts: 20,
            c1: 1.0,
            c2: 1.0,
            c3: 0.4,
        }
    }
}

impl GeneticConfig {
    /// Returns a configuration for a minimal dense topology:
    /// no bias, no hidden nodes, every input wired to every output.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::GeneticConfig;
    ///
    /// let config = GeneticConfig::minimal(3, 2);
    ///
    /// assert_eq!(config.input_count, 3);
    /// assert!(!config.bias);
    /// ```
    pub fn minimal(input_count: usize, output_count: usize) -> GeneticConfig {
        GeneticConfig {
            input_count,
            output_count,
            bias: false,
            ..GeneticConfig::default()
        }
    }
}
