//! Error types for zwave-state

use thiserror::Error;

use crate::value_id::{NodeId, ValueCriteria, ValueId};

/// Result type for zwave-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors raised by the value store and device session
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    /// The driver announced a node the store already tracks
    #[error("Node {0} already exists")]
    NodeAlreadyExists(NodeId),

    /// Operation referenced a node the store does not track
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    /// The driver announced a value the node already holds
    #[error("Value {0} already exists")]
    ValueAlreadyExists(ValueId),

    /// No value on the node satisfies the lookup
    #[error("No value matching {criteria} on node {node_id}")]
    ValueNotFound {
        node_id: NodeId,
        criteria: ValueCriteria,
    },

    /// More than one value on the node satisfies the lookup
    #[error("{matches} values match {criteria} on node {node_id}")]
    AmbiguousCriteria {
        node_id: NodeId,
        criteria: ValueCriteria,
        matches: usize,
    },

    /// A string could not be parsed as a value id
    #[error("Invalid value id: {0}")]
    InvalidValueId(String),
}
