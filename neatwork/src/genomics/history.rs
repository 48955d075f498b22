use crate::genomics::GeneticConfig;
use crate::{Innovation, NodeId};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// The innovation ids handed out for one node-addition mutation:
/// the new hidden node and the two connections replacing the
/// split connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRecord {
    /// The hidden node inserted in the middle of the split connection.
    pub node: NodeId,
    /// The connection from the split connection's source into the new node.
    pub incoming: Innovation,
    /// The connection from the new node to the split connection's target.
    pub outgoing: Innovation,
}

/// A `History` keeps track of structural innovations across the
/// whole evolutionary run, so that identical mutations are assigned
/// the same innovation numbers in every genome that performs them.
/// This alignment is what makes crossover between topologically
/// different genomes meaningful.
///
/// For connection innovations the source and target node ids identify
/// identical mutations. For node innovations the split connection's
/// innovation number is used, and the ids of the new node and its two
/// replacement connections are recorded together.
///
/// Both counters are monotone and never reset; the history lives as
/// long as the population that owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    next_innovation: Innovation,
    next_node_id: NodeId,
    connections: HashMap<(NodeId, NodeId), Innovation, RandomState>,
    splits: HashMap<Innovation, SplitRecord, RandomState>,
}

impl History {
    /// Creates a new `History` using the specified configuration.
    ///
    /// Node ids for the fixed input, bias and output nodes of every
    /// genome are pre-allocated: inputs take ids `1..=input_count`,
    /// the bias node (if any) comes next, then the outputs. The node
    /// counter starts just past them, so ids issued to hidden nodes
    /// never collide with the fixed scaffold shared by all genomes.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::{GeneticConfig, History};
    ///
    /// let history = History::new(&GeneticConfig::default());
    /// ```
    pub fn new(config: &GeneticConfig) -> History {
        History {
            next_innovation: 1,
            next_node_id: 1 + config.input_count + config.bias as usize + config.output_count,
            connections: HashMap::default(),
            splits: HashMap::default(),
        }
    }

    /// Returns the innovation number for a connection between the
    /// passed node pair.
    ///
    /// The first request for a pair allocates a fresh number; every
    /// subsequent request for the same pair, in any genome and any
    /// generation, returns the same number.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::{GeneticConfig, History};
    ///
    /// let mut history = History::new(&GeneticConfig::default());
    ///
    /// let a = history.next_connection(1, 4);
    /// let b = history.next_connection(2, 4);
    ///
    /// assert_ne!(a, b);
    /// assert_eq!(history.next_connection(1, 4), a);
    /// ```
    pub fn next_connection(&mut self, input: NodeId, output: NodeId) -> Innovation {
        match self.connections.entry((input, output)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = self.next_innovation;
                entry.insert(id);
                self.next_innovation += 1;
                id
            }
        }
    }

    /// Returns a fresh node id.
    ///
    /// Each call yields a new id; calls are never deduplicated.
    pub fn next_node(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    /// Returns the ids for a node-addition mutation splitting the
    /// connection with innovation number `split`, whose endpoints
    /// are `input` and `output`.
    ///
    /// The first split of a connection allocates a fresh node and
    /// registers its two replacement connections; later splits of the
    /// same connection, by any genome, replay the recorded ids.
    ///
    /// If `duplicate` is `true` the recorded ids are bypassed and a
    /// fresh, unrecorded triplet is allocated instead. This is needed
    /// when the mutating genome already contains the recorded node,
    /// which can happen when a once-split connection is re-enabled by
    /// crossover and split again.
    pub fn split(
        &mut self,
        split: Innovation,
        input: NodeId,
        output: NodeId,
        duplicate: bool,
    ) -> SplitRecord {
        if !duplicate {
            if let Some(record) = self.splits.get(&split) {
                return *record;
            }
        }
        let node = self.next_node();
        let record = SplitRecord {
            node,
            incoming: self.next_connection(input, node),
            outgoing: self.next_connection(node, output),
        };
        if !duplicate {
            self.splits.insert(split, record);
        }
        record
    }

    /// Returns the highest innovation number issued so far,
    /// or 0 if none have been.
    pub fn max_innovation(&self) -> Innovation {
        self.next_innovation - 1
    }

    /// Returns the highest node id issued or pre-allocated so far.
    pub fn max_node_id(&self) -> NodeId {
        self.next_node_id - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> History {
        History::new(&GeneticConfig {
            input_count: 2,
            output_count: 1,
            bias: true,
            ..GeneticConfig::default()
        })
    }

    #[test]
    fn connection_innovations_are_stable() {
        let mut history = history();
        let first = history.next_connection(1, 4);
        let second = history.next_connection(2, 4);
        assert_ne!(first, second);
        for _ in 0..3 {
            assert_eq!(history.next_connection(1, 4), first);
            assert_eq!(history.next_connection(2, 4), second);
        }
    }

    #[test]
    fn node_ids_are_fresh_and_monotone() {
        let mut history = history();
        // 2 inputs + bias + 1 output pre-allocated.
        assert_eq!(history.max_node_id(), 4);
        let mut previous = history.max_node_id();
        for _ in 0..10 {
            let id = history.next_node();
            assert!(id > previous);
            previous = id;
        }
    }

    #[test]
    fn splits_replay_recorded_ids() {
        let mut history = history();
        let split = history.next_connection(1, 4);
        let first = history.split(split, 1, 4, false);
        let replay = history.split(split, 1, 4, false);
        assert_eq!(first, replay);
    }

    #[test]
    fn duplicate_split_allocates_fresh_ids() {
        let mut history = history();
        let split = history.next_connection(1, 4);
        let first = history.split(split, 1, 4, false);
        let fresh = history.split(split, 1, 4, true);
        assert_ne!(first.node, fresh.node);
        assert_ne!(first.incoming, fresh.incoming);
        assert_ne!(first.outgoing, fresh.outgoing);
        // The recorded triplet is unchanged.
        assert_eq!(history.split(split, 1, 4, false), first);
    }
}
