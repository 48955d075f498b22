use crate::NodeId;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A NodeKind indicates the function of
/// the node's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Input nodes. Activation is set by the host on evaluation.
    Input,
    /// Bias nodes. Activation is pinned to 1.
    Bias,
    /// Hidden nodes. Only ever created by the add-node mutation.
    Hidden,
    /// Output nodes.
    Output,
}

/// Nodes are the structural elements of genomes
/// between which connections are created.
///
/// A node's kind is immutable once set: input, bias and
/// output nodes exist from genome birth, hidden nodes
/// appear only through the add-node mutation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
}

impl Node {
    /// Generate a new node with the passed parameters.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::{Node, NodeKind};
    ///
    /// let node = Node::new(5, NodeKind::Hidden);
    ///
    /// assert_eq!(node.id(), 5);
    /// assert_eq!(node.kind(), NodeKind::Hidden);
    /// ```
    pub fn new(id: NodeId, kind: NodeKind) -> Node {
        Node { id, kind }
    }

    /// Returns the node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node's kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{:?}]", self.id, self.kind)
    }
}

#[cfg(test)]
mod tests {}
