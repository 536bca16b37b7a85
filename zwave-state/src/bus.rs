//! Synchronous publish/subscribe for readiness and value changes
//!
//! Listeners are keyed by typed identities ([`NodeId`] for readiness,
//! [`ValueId`] for value changes) and fire on the publishing thread in
//! subscription order. Nothing is queued: a publish returns once every
//! listener has run.
//!
//! Node-wide value listeners see every value change of one node and fire
//! after the exact-id listeners of the same change.
//!
//! The listener table is snapshotted before dispatch, so a listener may
//! subscribe further listeners (they fire from the next publish on).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::model::{Node, RawValue};
use crate::value_id::{NodeId, ValueId};

/// Payload delivered to value-changed listeners
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    pub value_id: ValueId,
    /// Raw value before the update, if the value existed before
    pub previous: Option<RawValue>,
    pub current: RawValue,
}

type ReadyListener = Arc<dyn Fn(&Node) + Send + Sync>;
type ValueListener = Arc<dyn Fn(&ValueChange) + Send + Sync>;

/// Typed dispatch table for node-ready and value-changed events
#[derive(Default)]
pub struct EventBus {
    ready: RwLock<HashMap<NodeId, Vec<ReadyListener>>>,
    values: RwLock<HashMap<ValueId, Vec<ValueListener>>>,
    node_values: RwLock<HashMap<NodeId, Vec<ValueListener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the ready event of one node
    pub fn on_node_ready<F>(&self, node_id: NodeId, listener: F)
    where
        F: Fn(&Node) + Send + Sync + 'static,
    {
        self.ready
            .write()
            .entry(node_id)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Subscribe to changes of one exact value
    pub fn on_value_changed<F>(&self, value_id: ValueId, listener: F)
    where
        F: Fn(&ValueChange) + Send + Sync + 'static,
    {
        self.values
            .write()
            .entry(value_id)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Subscribe to changes of every value on one node
    pub fn on_node_value_changed<F>(&self, node_id: NodeId, listener: F)
    where
        F: Fn(&ValueChange) + Send + Sync + 'static,
    {
        self.node_values
            .write()
            .entry(node_id)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Invoke every ready listener for `node`, returning how many ran
    pub fn publish_node_ready(&self, node: &Node) -> usize {
        let listeners = self.ready.read().get(&node.id).cloned().unwrap_or_default();
        for listener in &listeners {
            listener(node);
        }
        listeners.len()
    }

    /// Invoke every listener for `change.value_id`, returning how many ran
    pub fn publish_value_changed(&self, change: &ValueChange) -> usize {
        let mut listeners = self
            .values
            .read()
            .get(&change.value_id)
            .cloned()
            .unwrap_or_default();
        if let Some(node_listeners) = self.node_values.read().get(&change.value_id.node_id) {
            listeners.extend(node_listeners.iter().cloned());
        }
        for listener in &listeners {
            listener(change);
        }
        listeners.len()
    }

    /// Drop every listener registered for a node
    pub fn clear_node(&self, node_id: NodeId) {
        self.ready.write().remove(&node_id);
        self.values.write().retain(|id, _| id.node_id != node_id);
        self.node_values.write().remove(&node_id);
    }

    pub fn ready_listener_count(&self, node_id: NodeId) -> usize {
        self.ready.read().get(&node_id).map_or(0, Vec::len)
    }

    pub fn value_listener_count(&self, value_id: &ValueId) -> usize {
        self.values.read().get(value_id).map_or(0, Vec::len)
    }

    pub fn node_value_listener_count(&self, node_id: NodeId) -> usize {
        self.node_values.read().get(&node_id).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("ready_topics", &self.ready.read().len())
            .field("value_topics", &self.values.read().len())
            .field("node_value_topics", &self.node_values.read().len())
            .finish()
    }
}
