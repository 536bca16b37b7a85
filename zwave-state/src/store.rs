//! Node and value cache
//!
//! The [`ValueStore`] is the single source of truth for the current known
//! state of the network. It exclusively owns every [`Node`] record; the only
//! writer is the device session applying driver events.
//!
//! # Architecture
//!
//! ```text
//! ValueStore
//! └── nodes: HashMap<NodeId, Node>
//!     ├── info: NodeInfo        (merged on node ready)
//!     ├── ready: bool
//!     └── values: BTreeMap<ValueId, Value>
//! ```

use std::collections::HashMap;

use crate::error::{Result, StateError};
use crate::model::{Node, NodeInfo, RawValue, Value};
use crate::value_id::{CommandClass, NodeId, ValueCriteria, ValueId};

/// Outcome of an in-place value update
#[derive(Debug, Clone, PartialEq)]
pub struct ValueUpdate {
    pub value_id: ValueId,
    pub previous: RawValue,
    pub current: RawValue,
}

impl ValueUpdate {
    /// Whether the raw value actually changed
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// In-memory cache of nodes and their values
#[derive(Debug, Default)]
pub struct ValueStore {
    nodes: HashMap<NodeId, Node>,
}

impl ValueStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    // ========================================================================
    // Node lifecycle
    // ========================================================================

    /// Create an empty record for a newly announced node
    pub fn add_node(&mut self, node_id: NodeId) -> Result<()> {
        if self.nodes.contains_key(&node_id) {
            return Err(StateError::NodeAlreadyExists(node_id));
        }
        self.nodes.insert(node_id, Node::new(node_id));
        Ok(())
    }

    /// Discard a node and all of its values
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        self.nodes.remove(&node_id)
    }

    /// Merge descriptive attributes and mark the node ready
    pub fn mark_node_ready(&mut self, node_id: NodeId, info: NodeInfo) -> Result<&Node> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(StateError::NodeNotFound(node_id))?;
        node.info.merge(info);
        node.ready = true;
        Ok(node)
    }

    // ========================================================================
    // Value lifecycle
    // ========================================================================

    /// Add a value reported by the driver
    pub fn add_value(&mut self, node_id: NodeId, value: Value) -> Result<ValueId> {
        let node = self.node_mut(node_id)?;
        let id = value.id(node_id);
        if node.values.contains_key(&id) {
            return Err(StateError::ValueAlreadyExists(id));
        }
        node.values.insert(id, value);
        Ok(id)
    }

    /// Replace the raw value of an existing value, returning the prior one
    ///
    /// Only the `value` field changes; label and addressing are kept.
    pub fn update_value(&mut self, node_id: NodeId, value: Value) -> Result<ValueUpdate> {
        let node = self.node_mut(node_id)?;
        let id = value.id(node_id);
        let stored = node.values.get_mut(&id).ok_or(StateError::ValueNotFound {
            node_id,
            criteria: ValueCriteria::new(id.command_class)
                .instance(id.instance)
                .index(id.index),
        })?;

        let previous = std::mem::replace(&mut stored.value, value.value);
        Ok(ValueUpdate {
            value_id: id,
            previous,
            current: stored.value.clone(),
        })
    }

    /// Remove one value from a node
    pub fn remove_value(
        &mut self,
        node_id: NodeId,
        command_class: CommandClass,
        instance: u8,
        index: u16,
    ) -> Result<Value> {
        let node = self.node_mut(node_id)?;
        let id = ValueId::new(node_id, command_class, instance, index);
        node.values.remove(&id).ok_or(StateError::ValueNotFound {
            node_id,
            criteria: ValueCriteria::new(command_class).instance(instance).index(index),
        })
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Find the unique value on a node matching `criteria`
    ///
    /// Fails with [`StateError::AmbiguousCriteria`] when more than one value
    /// matches rather than picking one.
    pub fn find_value(&self, node_id: NodeId, criteria: &ValueCriteria) -> Result<&Value> {
        let node = self.node(node_id).ok_or(StateError::NodeNotFound(node_id))?;

        let mut matching = node.values().filter(|v| criteria.matches(v));
        let first = matching.next().ok_or(StateError::ValueNotFound {
            node_id,
            criteria: *criteria,
        })?;

        let extra = matching.count();
        if extra > 0 {
            return Err(StateError::AmbiguousCriteria {
                node_id,
                criteria: *criteria,
                matches: extra + 1,
            });
        }
        Ok(first)
    }

    /// Exact lookup by composite id
    pub fn get_value(&self, id: &ValueId) -> Option<&Value> {
        self.nodes.get(&id.node_id)?.value(id)
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Whether the node exists and has been reported ready
    pub fn is_node_ready(&self, node_id: NodeId) -> bool {
        self.nodes.get(&node_id).is_some_and(Node::is_ready)
    }

    /// Get all node ids
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node_mut(&mut self, node_id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(&node_id)
            .ok_or(StateError::NodeNotFound(node_id))
    }
}
