//! A Network is the phenotype of a Genome, with disabled
//! connections being ignored. It is built once from a genome
//! snapshot and thereafter immutable, apart from the per-evaluation
//! activation levels.
//!
//! Nodes are evaluated in a topological order over the enabled
//! connection graph, computed with Kahn's algorithm at construction.
//! Incoming edges are stored in innovation order and the queue is
//! seeded in node-id order, so evaluation is bit-deterministic for a
//! given genome and input.

use crate::genomics::{Connection, Genome, NodeKind};
use crate::NodeId;

use ahash::RandomState;

use std::collections::{HashMap, VecDeque};
use std::fmt;

/// An arbitrarily-structured feedforward neural network.
#[derive(Clone, Debug)]
pub struct Network {
    node_ids: Vec<NodeId>,
    kinds: Vec<NodeKind>,
    incoming: Vec<Vec<(usize, f32)>>,
    order: Vec<usize>,
    activations: Vec<f32>,
    inputs: Vec<usize>,
    biases: Vec<usize>,
    outputs: Vec<usize>,
}

impl Network {
    /// Generates a new network from the passed genome.
    ///
    /// # Panics
    ///
    /// Panics if the genome's enabled connection graph contains a
    /// cycle, which would leave nodes unreachable by the topological
    /// order. Mutation and crossover never produce such a genome.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::{GeneticConfig, Genome, History};
    /// use neatwork::networks::Network;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::minimal(3, 2);
    /// let mut history = History::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(42);
    /// let genome = Genome::new(&config, &mut history, &mut rng);
    ///
    /// let network = Network::new(&genome);
    /// ```
    pub fn new(genome: &Genome) -> Network {
        let mut node_ids: Vec<NodeId> = genome.nodes().map(|n| n.id()).collect();
        node_ids.sort_unstable();
        let index_of: HashMap<NodeId, usize, RandomState> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();
        let kinds: Vec<NodeKind> = node_ids
            .iter()
            .map(|id| genome.node(*id).unwrap().kind())
            .collect();

        let mut edges: Vec<&Connection> = genome
            .connections()
            .filter(|c| {
                c.enabled()
                    && index_of.contains_key(&c.input())
                    && index_of.contains_key(&c.output())
            })
            .collect();
        edges.sort_unstable_by_key(|c| c.innovation());

        let mut incoming: Vec<Vec<(usize, f32)>> = vec![Vec::new(); node_ids.len()];
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); node_ids.len()];
        for edge in edges {
            let source = index_of[&edge.input()];
            let target = index_of[&edge.output()];
            incoming[target].push((source, edge.weight()));
            outgoing[source].push(target);
        }

        let order = topological_order(&incoming, &outgoing);
        assert_eq!(
            order.len(),
            node_ids.len(),
            "enabled connection graph contains a cycle"
        );

        let index_list = |kind: NodeKind| -> Vec<usize> {
            kinds
                .iter()
                .enumerate()
                .filter(|(_, k)| **k == kind)
                .map(|(i, _)| i)
                .collect()
        };

        Network {
            activations: vec![0.0; node_ids.len()],
            inputs: index_list(NodeKind::Input),
            biases: index_list(NodeKind::Bias),
            outputs: index_list(NodeKind::Output),
            node_ids,
            kinds,
            incoming,
            order,
        }
    }

    /// Computes the network's outputs for the passed inputs.
    ///
    /// Inputs are addressed by *input-node id*, not by positional
    /// index; an absent id reads as 0. Bias nodes read as 1. Every
    /// other node sums `activation × weight` over its incoming edges
    /// and applies the steepened sigmoid `1 / (1 + e^(-4.9x))`.
    ///
    /// Outputs are returned as `(node id, activation)` pairs sorted
    /// by node id ascending. Given the same genome and the same
    /// inputs, the outputs are bit-identical on every call.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::{GeneticConfig, Genome, History};
    /// use neatwork::networks::Network;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use std::collections::HashMap;
    ///
    /// let config = GeneticConfig::minimal(2, 1);
    /// let mut history = History::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(42);
    /// let genome = Genome::new(&config, &mut history, &mut rng);
    ///
    /// let mut network = Network::new(&genome);
    /// let inputs = HashMap::from([(1, 0.5), (2, -0.5)]);
    /// let outputs = network.evaluate(&inputs);
    ///
    /// assert_eq!(outputs.len(), 1);
    /// ```
    pub fn evaluate(&mut self, inputs: &HashMap<NodeId, f32>) -> Vec<(NodeId, f32)> {
        for activation in &mut self.activations {
            *activation = 0.0;
        }
        for &i in &self.inputs {
            self.activations[i] = inputs.get(&self.node_ids[i]).copied().unwrap_or(0.0);
        }
        for &b in &self.biases {
            self.activations[b] = 1.0;
        }
        for &n in &self.order {
            if matches!(self.kinds[n], NodeKind::Input | NodeKind::Bias) {
                continue;
            }
            let sum: f32 = self.incoming[n]
                .iter()
                .map(|(source, weight)| self.activations[*source] * weight)
                .sum();
            self.activations[n] = sigmoid(sum);
        }
        self.outputs
            .iter()
            .map(|&o| (self.node_ids[o], self.activations[o]))
            .collect()
    }

    /// Returns the ids of the network's input nodes, ascending.
    pub fn input_ids(&self) -> Vec<NodeId> {
        self.inputs.iter().map(|&i| self.node_ids[i]).collect()
    }

    /// Returns the ids of the network's output nodes, ascending.
    pub fn output_ids(&self) -> Vec<NodeId> {
        self.outputs.iter().map(|&o| self.node_ids[o]).collect()
    }

    /// Returns the number of nodes in the network.
    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }
}

/// Kahn's algorithm over the enabled connection graph. The queue is
/// seeded in ascending node-index order and drained FIFO, so the
/// order is a pure function of the graph.
fn topological_order(incoming: &[Vec<(usize, f32)>], outgoing: &[Vec<usize>]) -> Vec<usize> {
    let mut in_degree: Vec<usize> = incoming.iter().map(|edges| edges.len()).collect();
    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(incoming.len());
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &target in &outgoing[node] {
            in_degree[target] -= 1;
            if in_degree[target] == 0 {
                queue.push_back(target);
            }
        }
    }
    order
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-4.9 * x).exp())
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Debug).fmt(f)
    }
}
