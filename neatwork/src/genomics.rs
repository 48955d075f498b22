//! Genomes are the focus of evolution in NEAT.
//! They are a collection of nodes and connections that can be
//! instantiated as a phenotype (a feedforward neural network).
//! Genomes can be progressively mutated, thus adding complexity
//! and functionality.
//!
//! All random draws run over id-sorted views of the genome's maps,
//! so a seeded random source reproduces the same run.

mod config;
mod errors;
mod genes;
mod history;
mod nodes;

pub use config::GeneticConfig;
use errors::*;
pub use genes::Connection;
pub use history::{History, SplitRecord};
pub use nodes::{Node, NodeKind};

use crate::{Innovation, NodeId};

use ahash::RandomState;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A mutable collection of nodes and connections.
///
/// The induced directed graph over enabled connections is always
/// acyclic: mutations reject cycle-closing edges and crossover
/// disables any gene whose inheritance would close one.
///
/// Supports Serde for convenient genome saving and loading.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Genome {
    nodes: HashMap<NodeId, Node, RandomState>,
    connections: HashMap<Innovation, Connection, RandomState>,
    pub(crate) fitness: f32,
    pub(crate) adjusted_fitness: f32,
}

impl Genome {
    /// Creates a new genome with the specified configuration,
    /// drawing ids from the shared `history`.
    ///
    /// Input, bias and output nodes take the fixed ids pre-allocated
    /// by [`History::new`], so every genome of a population shares
    /// the same I/O scaffold. Hidden nodes, if the configuration asks
    /// for any, draw fresh ids per genome.
    ///
    /// The layered graph is wired densely (every node of one layer to
    /// every node of the next), or sparsely with
    /// [`connection_probability`] per edge when
    /// [`sparse_connectivity`] is set. Birth weights are uniform in
    /// `[-weight_init_range, weight_init_range]`.
    ///
    /// [`connection_probability`]: GeneticConfig::connection_probability
    /// [`sparse_connectivity`]: GeneticConfig::sparse_connectivity
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::{GeneticConfig, Genome, History};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig {
    ///     input_count: 3,
    ///     output_count: 2,
    ///     bias: false,
    ///     ..GeneticConfig::default()
    /// };
    /// let mut history = History::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(42);
    ///
    /// let genome = Genome::new(&config, &mut history, &mut rng);
    ///
    /// // As configured, the genome has 3 inputs + 2 outputs,
    /// // wired densely.
    /// assert_eq!(genome.nodes().count(), 3 + 2);
    /// assert_eq!(genome.connections().count(), 3 * 2);
    /// assert!(genome
    ///     .connections()
    ///     .all(|c| c.weight().abs() <= config.weight_init_range));
    /// ```
    pub fn new(config: &GeneticConfig, history: &mut History, rng: &mut impl Rng) -> Genome {
        let mut genome = Genome::empty();

        let input_ids: Vec<NodeId> = (1..=config.input_count).collect();
        let bias_id = config.bias.then(|| config.input_count + 1);
        let output_start = config.input_count + config.bias as usize + 1;
        let output_ids: Vec<NodeId> = (output_start..output_start + config.output_count).collect();

        for &id in &input_ids {
            genome.add_node(Node::new(id, NodeKind::Input));
        }
        if let Some(id) = bias_id {
            genome.add_node(Node::new(id, NodeKind::Bias));
        }
        for &id in &output_ids {
            genome.add_node(Node::new(id, NodeKind::Output));
        }

        let mut layers: Vec<Vec<NodeId>> = Vec::new();
        let mut sources = input_ids;
        sources.extend(bias_id);
        layers.push(sources);
        for size in Self::hidden_layer_sizes(config, rng) {
            let layer: Vec<NodeId> = (0..size).map(|_| history.next_node()).collect();
            for &id in &layer {
                genome.add_node(Node::new(id, NodeKind::Hidden));
            }
            layers.push(layer);
        }
        layers.push(output_ids.clone());

        genome.wire_layers(&layers, config, history, rng);

        if config.sparse_connectivity && config.guaranteed_output_connections {
            genome.connect_orphan_outputs(&layers, &output_ids, config, history, rng);
        }

        genome
    }

    /// Returns a genome with no nodes and no connections.
    ///
    /// Useful as a starting point when assembling a genome by hand
    /// through [`add_node`] and [`add_connection`].
    ///
    /// [`add_node`]: Genome::add_node
    /// [`add_connection`]: Genome::add_connection
    pub fn empty() -> Genome {
        Genome {
            nodes: HashMap::default(),
            connections: HashMap::default(),
            fitness: 0.0,
            adjusted_fitness: 0.0,
        }
    }

    fn hidden_layer_sizes(config: &GeneticConfig, rng: &mut impl Rng) -> Vec<usize> {
        if config.randomize_hidden_layers {
            let count = rng.gen_range(config.min_hidden_layers..=config.max_hidden_layers);
            (0..count)
                .map(|_| rng.gen_range(config.min_nodes_per_layer..=config.max_nodes_per_layer))
                .collect()
        } else {
            config.hidden_layers.clone()
        }
    }

    fn wire_layers(
        &mut self,
        layers: &[Vec<NodeId>],
        config: &GeneticConfig,
        history: &mut History,
        rng: &mut impl Rng,
    ) {
        for i in 0..layers.len() - 1 {
            let reach = if config.sparse_connectivity && config.skip_connections {
                layers.len()
            } else {
                i + 2
            };
            for j in (i + 1)..reach {
                for &source in &layers[i] {
                    for &target in &layers[j] {
                        if config.sparse_connectivity
                            && rng.gen::<f32>() >= config.connection_probability
                        {
                            continue;
                        }
                        let innovation = history.next_connection(source, target);
                        let weight =
                            rng.gen_range(-config.weight_init_range..=config.weight_init_range);
                        self.add_connection(Connection::new(innovation, source, target, weight));
                    }
                }
            }
        }
    }

    /// Gives every output left without incoming edges by the sparse
    /// Bernoulli draws one edge from a random earlier-layer node.
    fn connect_orphan_outputs(
        &mut self,
        layers: &[Vec<NodeId>],
        output_ids: &[NodeId],
        config: &GeneticConfig,
        history: &mut History,
        rng: &mut impl Rng,
    ) {
        let earlier: Vec<NodeId> = layers[..layers.len() - 1]
            .iter()
            .flatten()
            .copied()
            .collect();
        if earlier.is_empty() {
            return;
        }
        for &output in output_ids {
            if self.connections.values().any(|c| c.output() == output) {
                continue;
            }
            let source = earlier[rng.gen_range(0..earlier.len())];
            let innovation = history.next_connection(source, output);
            let weight = rng.gen_range(-config.weight_init_range..=config.weight_init_range);
            self.add_connection(Connection::new(innovation, source, output, weight));
        }
    }

    /// Adds a new node to the genome.
    /// Returns a reference to the new node.
    ///
    /// # Panics
    ///
    /// Panics if a node with the same id already
    /// exists in the genome.
    pub fn add_node(&mut self, node: Node) -> &mut Node {
        self.check_node_viability(&node)
            .unwrap_or_else(|e| panic!("{} in {}", e, self));
        self.nodes.entry(node.id()).or_insert(node)
    }

    fn check_node_viability(&self, node: &Node) -> Result<(), NodeViabilityError> {
        if self.nodes.contains_key(&node.id()) {
            Err(NodeViabilityError::DuplicateID(node.id()))
        } else {
            Ok(())
        }
    }

    /// Adds a new connection to the genome.
    /// Returns a reference to the new connection.
    ///
    /// # Panics
    ///
    /// Panics if a connection with the same innovation number or the
    /// same endpoints already exists, if either endpoint is absent
    /// from the genome, if the connection is a self-loop, or if the
    /// target is an input or bias node.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::{Connection, Genome, Node, NodeKind};
    ///
    /// let mut genome = Genome::empty();
    /// genome.add_node(Node::new(1, NodeKind::Input));
    /// genome.add_node(Node::new(2, NodeKind::Output));
    ///
    /// let conn = genome.add_connection(Connection::new(1, 1, 2, 0.5));
    ///
    /// assert_eq!(conn.endpoints(), (1, 2));
    /// assert_eq!(genome.connections().count(), 1);
    /// ```
    pub fn add_connection(&mut self, connection: Connection) -> &mut Connection {
        self.check_connection_viability(&connection)
            .unwrap_or_else(|e| panic!("{} in {}", e, self));
        self.connections
            .entry(connection.innovation())
            .or_insert(connection)
    }

    fn check_connection_viability(
        &self,
        connection: &Connection,
    ) -> Result<(), ConnectionViabilityError> {
        use ConnectionViabilityError::*;
        let (input, output) = connection.endpoints();
        if self.connections.contains_key(&connection.innovation()) {
            Err(DuplicateInnovation(connection.innovation()))
        } else if input == output {
            Err(SelfLoop(input))
        } else if !(self.nodes.contains_key(&input) && self.nodes.contains_key(&output)) {
            Err(MissingEndpoint(if self.nodes.contains_key(&input) {
                output
            } else {
                input
            }))
        } else if self.has_connection(input, output) {
            Err(DuplicateEndpoints(input, output))
        } else if matches!(self.nodes[&output].kind(), NodeKind::Input | NodeKind::Bias) {
            Err(SensorTarget(output))
        } else {
            Ok(())
        }
    }

    /// Returns whether a connection between the passed node
    /// pair exists in the genome, enabled or not.
    pub fn has_connection(&self, input: NodeId, output: NodeId) -> bool {
        self.connections
            .values()
            .any(|c| c.endpoints() == (input, output))
    }

    /// Returns whether adding a connection between the passed node
    /// pair would close a directed cycle over the genome's enabled
    /// connections.
    pub fn would_create_cycle(&self, input: NodeId, output: NodeId) -> bool {
        if input == output {
            return true;
        }
        // A path from `output` back to `input` means the new edge
        // closes a cycle.
        let mut visited: HashSet<NodeId, RandomState> = HashSet::default();
        let mut frontier = vec![output];
        while let Some(current) = frontier.pop() {
            if current == input {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for connection in self.connections.values() {
                if connection.enabled() && connection.input() == current {
                    frontier.push(connection.output());
                }
            }
        }
        false
    }

    /// Induces a _connection mutation_ in the genome: up to
    /// `max_attempts` node pairs are drawn uniformly at random, and
    /// the first viable pair receives a new enabled connection with a
    /// weight uniform in `[-1, 1]` and an innovation number from the
    /// shared history.
    ///
    /// A drawn pair is discarded if it is a self-pairing, runs from an
    /// output into an input, targets an input or bias node, already
    /// has a connection, or would close a directed cycle over the
    /// enabled connections.
    ///
    /// Returns whether a connection was added.
    pub fn mutate_add_connection(
        &mut self,
        history: &mut History,
        rng: &mut impl Rng,
        max_attempts: usize,
    ) -> bool {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        if ids.len() < 2 {
            return false;
        }
        ids.sort_unstable();

        for _ in 0..max_attempts {
            let input = ids[rng.gen_range(0..ids.len())];
            let output = ids[rng.gen_range(0..ids.len())];
            if input == output {
                continue;
            }
            let (input_kind, output_kind) = (self.nodes[&input].kind(), self.nodes[&output].kind());
            if input_kind == NodeKind::Output && output_kind == NodeKind::Input {
                continue;
            }
            if matches!(output_kind, NodeKind::Input | NodeKind::Bias) {
                continue;
            }
            if self.has_connection(input, output) {
                continue;
            }
            if self.would_create_cycle(input, output) {
                continue;
            }
            let innovation = history.next_connection(input, output);
            let weight = rng.gen_range(-1.0..=1.0);
            self.add_connection(Connection::new(innovation, input, output, weight));
            return true;
        }
        false
    }

    /// Induces a _node mutation_ in the genome: a uniformly chosen
    /// enabled connection is disabled and replaced by a new hidden
    /// node `N` with two enabled connections, `input -> N` with
    /// weight 1 and `N -> output` with the split connection's weight.
    /// This preserves the sub-network's behaviour at the moment of
    /// the split.
    ///
    /// Ids come from the shared history, so any genome that later
    /// splits the same connection receives the same node id and
    /// connection innovations.
    ///
    /// Returns `false` iff the genome has no enabled connections.
    pub fn mutate_add_node(&mut self, history: &mut History, rng: &mut impl Rng) -> bool {
        let mut enabled: Vec<Innovation> = self
            .connections
            .values()
            .filter(|c| c.enabled())
            .map(|c| c.innovation())
            .collect();
        if enabled.is_empty() {
            return false;
        }
        enabled.sort_unstable();
        let split = enabled[rng.gen_range(0..enabled.len())];
        let (input, output) = self.connections[&split].endpoints();
        let weight = self.connections[&split].weight();

        let mut record = history.split(split, input, output, false);
        if self.nodes.contains_key(&record.node)
            || self.connections.contains_key(&record.incoming)
            || self.connections.contains_key(&record.outgoing)
        {
            // This genome re-split a connection it inherited re-enabled;
            // the recorded ids are already taken here.
            record = history.split(split, input, output, true);
        }

        self.connections.get_mut(&split).unwrap().set_enabled(false);
        self.add_node(Node::new(record.node, NodeKind::Hidden));
        self.add_connection(Connection::new(record.incoming, input, record.node, 1.0));
        self.add_connection(Connection::new(record.outgoing, record.node, output, weight));
        true
    }

    /// Deletes a uniformly chosen connection from the genome
    /// (removal, not disabling).
    ///
    /// Returns `false` iff the genome has no connections.
    pub fn mutate_remove_connection(&mut self, rng: &mut impl Rng) -> bool {
        let mut ids: Vec<Innovation> = self.connections.keys().copied().collect();
        if ids.is_empty() {
            return false;
        }
        ids.sort_unstable();
        let chosen = ids[rng.gen_range(0..ids.len())];
        self.connections.remove(&chosen);
        true
    }

    /// Induces a _weight mutation_ in the genome.
    ///
    /// Each connection is perturbed by a value uniform in
    /// `[-perturb_strength, perturb_strength]` with probability
    /// [`weight_perturb_rate`]; otherwise, with probability
    /// [`uniform_weight_rate`], its weight is replaced by a fresh
    /// value uniform in `[-weight_init_range, weight_init_range]`.
    ///
    /// `perturb_strength` is passed separately from `config` because
    /// the population inflates it over time.
    ///
    /// [`weight_perturb_rate`]: GeneticConfig::weight_perturb_rate
    /// [`uniform_weight_rate`]: GeneticConfig::uniform_weight_rate
    pub fn mutate_weights(
        &mut self,
        config: &GeneticConfig,
        perturb_strength: f32,
        rng: &mut impl Rng,
    ) {
        let mut ids: Vec<Innovation> = self.connections.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let perturb = rng.gen::<f32>() < config.weight_perturb_rate;
            let reset = !perturb && rng.gen::<f32>() < config.uniform_weight_rate;
            let connection = self.connections.get_mut(&id).unwrap();
            if perturb {
                connection.nudge_weight(rng.gen_range(-perturb_strength..=perturb_strength));
            } else if reset {
                connection
                    .set_weight(rng.gen_range(-config.weight_init_range..=config.weight_init_range));
            }
        }
    }

    /// Combines the genome with a less fit `other` genome and returns
    /// their _child_ genome. The caller must be the fitter parent;
    /// the population enforces this at every call site.
    ///
    /// The child inherits the caller's node set. For every connection
    /// of the caller: if `other` carries a connection with the same
    /// innovation number, one of the two is copied uniformly at
    /// random; otherwise (disjoint or excess) the caller's gene is
    /// copied. Genes unique to `other` are discarded. Nodes
    /// referenced only through an inherited gene are carried over as
    /// plain hidden nodes.
    ///
    /// A gene whose expression flags differ between the parents can
    /// close a cycle neither parent had; such a gene is inherited
    /// disabled.
    pub fn crossover(&self, other: &Genome, rng: &mut impl Rng) -> Genome {
        let mut child = Genome::empty();
        for node in self.nodes.values() {
            child.nodes.insert(node.id(), *node);
        }

        let mut ids: Vec<Innovation> = self.connections.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let own = &self.connections[&id];
            let mut gene = match other.connections.get(&id) {
                Some(theirs) if rng.gen::<bool>() => theirs.clone(),
                _ => own.clone(),
            };
            for endpoint in [gene.input(), gene.output()] {
                child
                    .nodes
                    .entry(endpoint)
                    .or_insert_with(|| Node::new(endpoint, NodeKind::Hidden));
            }
            if gene.enabled() && child.would_create_cycle(gene.input(), gene.output()) {
                gene.set_enabled(false);
            }
            child.connections.insert(id, gene);
        }
        child
    }

    /// Calculates the _genetic distance_ between two genomes,
    /// weighting excess genes, disjoint genes and matching-weight
    /// differences as specified in `config`.
    ///
    /// The union of innovation numbers is partitioned into _matching_
    /// (present in both), _disjoint_ (present in one, within the
    /// other's innovation range) and _excess_ (present in one, beyond
    /// the other's range). With `E` and `D` the excess and disjoint
    /// counts, `W` the mean absolute weight difference over matching
    /// genes and `N` the larger connection count floored at 1:
    ///
    /// `distance = c1·E/N + c2·D/N + c3·W`
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::{Connection, GeneticConfig, Genome, Node, NodeKind};
    ///
    /// let config = GeneticConfig {
    ///     c1: 1.0,
    ///     c2: 1.0,
    ///     c3: 0.4,
    ///     ..GeneticConfig::default()
    /// };
    ///
    /// let mut first = Genome::empty();
    /// let mut second = Genome::empty();
    /// for genome in [&mut first, &mut second] {
    ///     genome.add_node(Node::new(1, NodeKind::Input));
    ///     genome.add_node(Node::new(2, NodeKind::Output));
    /// }
    ///
    /// // One matching gene with a weight difference of 1.
    /// first.add_connection(Connection::new(1, 1, 2, 2.0));
    /// second.add_connection(Connection::new(1, 1, 2, 1.0));
    ///
    /// assert_eq!(Genome::genetic_distance(&first, &second, &config), 0.4);
    /// ```
    pub fn genetic_distance(first: &Genome, second: &Genome, config: &GeneticConfig) -> f32 {
        let max_first = first.connections.keys().copied().max().unwrap_or(0);
        let max_second = second.connections.keys().copied().max().unwrap_or(0);

        let mut matching = 0usize;
        let mut weight_diff = 0.0f32;
        let mut disjoint = 0usize;
        let mut excess = 0usize;

        let mut ids: Vec<Innovation> = first.connections.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            match second.connections.get(&id) {
                Some(other) => {
                    matching += 1;
                    weight_diff += (first.connections[&id].weight() - other.weight()).abs();
                }
                None if id > max_second => excess += 1,
                None => disjoint += 1,
            }
        }
        for id in second.connections.keys() {
            if !first.connections.contains_key(id) {
                if *id > max_first {
                    excess += 1;
                } else {
                    disjoint += 1;
                }
            }
        }

        let mean_weight_diff = if matching > 0 {
            weight_diff / matching as f32
        } else {
            0.0
        };
        let n = first
            .connections
            .len()
            .max(second.connections.len())
            .max(1) as f32;

        config.c1 * excess as f32 / n + config.c2 * disjoint as f32 / n
            + config.c3 * mean_weight_diff
    }

    /// Returns an iterator over the genome's nodes.
    /// No ordering is guaranteed.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns an iterator over the genome's connections.
    /// No ordering is guaranteed.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Returns the node with the passed id, if present.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns the connection with the passed innovation number,
    /// if present.
    pub fn connection(&self, innovation: Innovation) -> Option<&Connection> {
        self.connections.get(&innovation)
    }

    /// Returns the ids of the genome's input nodes, ascending.
    pub fn input_ids(&self) -> Vec<NodeId> {
        self.ids_of_kind(NodeKind::Input)
    }

    /// Returns the ids of the genome's output nodes, ascending.
    pub fn output_ids(&self) -> Vec<NodeId> {
        self.ids_of_kind(NodeKind::Output)
    }

    fn ids_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.kind() == kind)
            .map(|n| n.id())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Sets the genome's fitness to the value passed.
    /// Higher is better.
    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    /// Returns the genome's current fitness.
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    /// Returns the genome's species-size-adjusted fitness, as set
    /// by the last epoch's fitness sharing.
    pub fn adjusted_fitness(&self) -> f32 {
        self.adjusted_fitness
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut connections: Vec<&Connection> = self.connections.values().collect();
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        connections.sort_unstable_by_key(|c| c.innovation());
        nodes.sort_unstable_by_key(|n| n.id());
        f.debug_struct("Genome")
            .field("Nodes", &nodes)
            .field("Connections", &connections)
            .field("Fitness", &self.fitness)
            .finish()
    }
}
