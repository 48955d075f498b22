use crate::{Innovation, NodeId};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Connections are the principal components of genomes.
/// They are created between two nodes, and become
/// weighted network edges in the genome's phenotype.
///
/// A disabled connection still takes part in crossover and
/// genetic distance, but contributes nothing to the phenotype.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Connection {
    innovation: Innovation,
    input: NodeId,
    output: NodeId,
    weight: f32,
    enabled: bool,
}

impl Connection {
    /// Returns a new _enabled_ connection with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::Connection;
    ///
    /// let conn = Connection::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(conn.innovation(), 42);
    /// assert!(conn.enabled());
    /// ```
    pub fn new(innovation: Innovation, input: NodeId, output: NodeId, weight: f32) -> Connection {
        Connection {
            innovation,
            input,
            output,
            weight,
            enabled: true,
        }
    }

    /// Returns the connection's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the id of the connection's source node.
    pub fn input(&self) -> NodeId {
        self.input
    }

    /// Returns the id of the connection's target node.
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Returns the connection's source and target node ids.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.input, self.output)
    }

    /// Returns the connection's weight.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Sets the connection's weight.
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    /// Adds `delta` to the connection's weight.
    pub fn nudge_weight(&mut self, delta: f32) {
        self.weight += delta;
    }

    /// Returns whether the connection is expressed in the phenotype.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the connection's expression status.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.input,
            self.output,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

#[cfg(test)]
mod tests {}
