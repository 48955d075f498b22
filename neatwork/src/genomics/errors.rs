use crate::{Innovation, NodeId};

use std::error::Error;
use std::fmt;

/// An error type indicating that a connection
/// would be invalid for the genome it is added to.
#[derive(Debug)]
pub(super) enum ConnectionViabilityError {
    /// A connection with the same innovation number exists.
    DuplicateInnovation(Innovation),
    /// A connection with the same endpoints exists.
    DuplicateEndpoints(NodeId, NodeId),
    /// An endpoint references a node absent from the genome.
    MissingEndpoint(NodeId),
    /// Source and target are the same node.
    SelfLoop(NodeId),
    /// The target is an input or bias node.
    SensorTarget(NodeId),
}

impl fmt::Display for ConnectionViabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ConnectionViabilityError::*;
        match self {
            DuplicateInnovation(id) => {
                write!(f, "connection with duplicate innovation number {}", id)
            }
            DuplicateEndpoints(input, output) => {
                write!(f, "duplicate connection between nodes {} and {}", input, output)
            }
            MissingEndpoint(id) => write!(f, "connection references nonexistant node {}", id),
            SelfLoop(id) => write!(f, "connection from node {} to itself", id),
            SensorTarget(id) => write!(f, "connection into non-activating node {}", id),
        }
    }
}

impl Error for ConnectionViabilityError {}

/// An error type indicating that a node
/// would be invalid for the genome it is added to.
#[derive(Debug)]
pub(super) enum NodeViabilityError {
    /// A node with the same id exists.
    DuplicateID(NodeId),
}

impl fmt::Display for NodeViabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeViabilityError::DuplicateID(id) => write!(f, "duplicate node id {}", id),
        }
    }
}

impl Error for NodeViabilityError {}
