use std::path::PathBuf;

use thiserror::Error;
use zwave_state::{NodeId, StateError, ValueCriteria};

/// Result type for characteristic get/set hooks
pub type Result<T> = std::result::Result<T, BindingError>;

/// Failures surfaced to the caller of a characteristic get or set
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    #[error("Accessory {accessory} is not ready")]
    NotReady { accessory: String },

    #[error("No value matching {criteria} on ready node {node_id}")]
    ValueNotFound {
        node_id: NodeId,
        criteria: ValueCriteria,
    },

    #[error("{matches} values match {criteria} on node {node_id}")]
    AmbiguousCriteria {
        node_id: NodeId,
        criteria: ValueCriteria,
        matches: usize,
    },

    #[error("{characteristic} cannot use {found} value: expected {expected}")]
    UnexpectedValue {
        characteristic: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0} is read-only")]
    ReadOnly(&'static str),

    #[error("{0} has no binding")]
    Unbound(&'static str),

    #[error("State error: {0}")]
    State(StateError),
}

impl From<StateError> for BindingError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::ValueNotFound { node_id, criteria } => {
                BindingError::ValueNotFound { node_id, criteria }
            }
            StateError::AmbiguousCriteria {
                node_id,
                criteria,
                matches,
            } => BindingError::AmbiguousCriteria {
                node_id,
                criteria,
                matches,
            },
            other => BindingError::State(other),
        }
    }
}

/// Errors loading or validating bridge configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Accessory {accessory}: {reason}")]
    InvalidAccessory { accessory: String, reason: String },

    #[error("Duplicate accessory name: {0}")]
    DuplicateAccessory(String),
}
