//! Device session: the store and the bus as one unit
//!
//! A [`DeviceSession`] owns the [`ValueStore`] and [`EventBus`] for one
//! driver connection. Driver events are applied through
//! [`DeviceSession::handle_event`], which mutates the store and then
//! dispatches the resulting notification while holding a single dispatch
//! lock, so events from concurrent driver threads are absorbed and delivered
//! one at a time.
//!
//! ```text
//! DriverEvent ──► handle_event ──► ValueStore (write, released)
//!                      │
//!                      └────────► EventBus ──► listeners (may re-query store)
//! ```
//!
//! The store sits behind an `RwLock` that is released before dispatch, so
//! listeners and getters on other threads can read it but never observe a
//! half-applied update.

use parking_lot::{RwLock, RwLockReadGuard, ReentrantMutex};

use crate::bus::{EventBus, ValueChange};
use crate::driver_event::DriverEvent;
use crate::error::{Result, StateError};
use crate::model::Value;
use crate::store::ValueStore;
use crate::value_id::{NodeId, ValueCriteria};

/// Store, bus and dispatch lock for one driver connection
#[derive(Debug, Default)]
pub struct DeviceSession {
    store: RwLock<ValueStore>,
    bus: EventBus,
    dispatch: ReentrantMutex<()>,
}

impl DeviceSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Read access to the store
    pub fn store(&self) -> RwLockReadGuard<'_, ValueStore> {
        self.store.read()
    }

    /// Resolve the unique value matching `criteria`, cloned out of the store
    pub fn find_value(&self, node_id: NodeId, criteria: &ValueCriteria) -> Result<Value> {
        self.store.read().find_value(node_id, criteria).cloned()
    }

    pub fn is_node_ready(&self, node_id: NodeId) -> bool {
        self.store.read().is_node_ready(node_id)
    }

    /// Apply one driver event and dispatch its notification
    ///
    /// A value change for a value the store has never seen is absorbed as an
    /// add and dispatched with no previous value. A duplicate value add is
    /// absorbed as a change.
    pub fn handle_event(&self, event: DriverEvent) -> Result<()> {
        let _dispatch = self.dispatch.lock();
        tracing::debug!(
            "Driver event {} for node {}",
            event.kind(),
            event.node_id()
        );

        match event {
            DriverEvent::NodeAdded { node_id } => {
                self.store.write().add_node(node_id)?;
            }
            DriverEvent::NodeRemoved { node_id } => {
                if self.store.write().remove_node(node_id).is_none() {
                    return Err(StateError::NodeNotFound(node_id));
                }
            }
            DriverEvent::NodeReady { node_id, info } => {
                let node = {
                    let mut store = self.store.write();
                    store.mark_node_ready(node_id, info)?.clone()
                };
                tracing::info!(
                    "Node {} ready: {} {} ({})",
                    node_id,
                    node.info.manufacturer,
                    node.info.product,
                    node.info.product_type
                );
                self.bus.publish_node_ready(&node);
            }
            DriverEvent::ValueAdded { node_id, value } => {
                let added = self.store.write().add_value(node_id, value.clone());
                match added {
                    Ok(_) => {}
                    Err(StateError::ValueAlreadyExists(id)) => {
                        tracing::warn!("Value {} added twice, treating as a change", id);
                        self.apply_change(node_id, value)?;
                    }
                    Err(e) => return Err(e),
                }
            }
            DriverEvent::ValueChanged { node_id, value } => {
                self.apply_change(node_id, value)?;
            }
            DriverEvent::ValueRemoved {
                node_id,
                command_class,
                instance,
                index,
            } => {
                self.store
                    .write()
                    .remove_value(node_id, command_class, instance, index)?;
            }
        }

        Ok(())
    }

    fn apply_change(&self, node_id: NodeId, value: Value) -> Result<()> {
        let change = {
            let mut store = self.store.write();
            match store.update_value(node_id, value.clone()) {
                Ok(update) => ValueChange {
                    value_id: update.value_id,
                    previous: Some(update.previous),
                    current: update.current,
                },
                Err(StateError::ValueNotFound { .. }) => {
                    let value_id = store.add_value(node_id, value.clone())?;
                    tracing::debug!("Value {} changed before it was added", value_id);
                    ValueChange {
                        value_id,
                        previous: None,
                        current: value.value,
                    }
                }
                Err(e) => return Err(e),
            }
        };

        let delivered = self.bus.publish_value_changed(&change);
        tracing::debug!(
            "Value {} -> {} delivered to {} listener(s)",
            change.value_id,
            change.current,
            delivered
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::model::{NodeInfo, RawValue};
    use crate::value_id::{CommandClass, ValueId};

    fn node(id: u8) -> NodeId {
        NodeId::new(id)
    }

    fn switch(value: bool) -> Value {
        Value::root(CommandClass::SWITCH_BINARY, "Switch", value)
    }

    fn session_with_switch() -> DeviceSession {
        let session = DeviceSession::new();
        session.handle_event(DriverEvent::NodeAdded { node_id: node(2) }).unwrap();
        session
            .handle_event(DriverEvent::ValueAdded {
                node_id: node(2),
                value: switch(false),
            })
            .unwrap();
        session
    }

    #[test]
    fn test_value_change_dispatches_previous() {
        let session = session_with_switch();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let id = ValueId::new(node(2), CommandClass::SWITCH_BINARY, 1, 0);
        session.bus().on_value_changed(id, move |change| sink.lock().push(change.clone()));

        session
            .handle_event(DriverEvent::ValueChanged {
                node_id: node(2),
                value: switch(true),
            })
            .unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].previous, Some(RawValue::Bool(false)));
        assert_eq!(seen[0].current, RawValue::Bool(true));
    }

    #[test]
    fn test_listener_sees_updated_store() {
        let session = Arc::new(session_with_switch());
        let observed = Arc::new(Mutex::new(None));

        let reader = Arc::clone(&session);
        let sink = Arc::clone(&observed);
        let id = ValueId::new(node(2), CommandClass::SWITCH_BINARY, 1, 0);
        session.bus().on_value_changed(id, move |_| {
            let criteria = ValueCriteria::new(CommandClass::SWITCH_BINARY);
            *sink.lock() = reader.find_value(node(2), &criteria).ok().map(|v| v.value);
        });

        session
            .handle_event(DriverEvent::ValueChanged {
                node_id: node(2),
                value: switch(true),
            })
            .unwrap();

        assert_eq!(*observed.lock(), Some(RawValue::Bool(true)));
    }

    #[test]
    fn test_change_before_add_is_absorbed() {
        let session = DeviceSession::new();
        session.handle_event(DriverEvent::NodeAdded { node_id: node(2) }).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = ValueId::new(node(2), CommandClass::SWITCH_BINARY, 1, 0);
        session.bus().on_value_changed(id, move |change| sink.lock().push(change.previous.clone()));

        session
            .handle_event(DriverEvent::ValueChanged {
                node_id: node(2),
                value: switch(true),
            })
            .unwrap();

        assert_eq!(*seen.lock(), vec![None]);
        assert!(session.store().get_value(&id).is_some());
    }

    #[test]
    fn test_node_ready_publishes_merged_node() {
        let session = session_with_switch();
        let seen = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        session
            .bus()
            .on_node_ready(node(2), move |n| *sink.lock() = Some(n.info.product.clone()));

        session
            .handle_event(DriverEvent::NodeReady {
                node_id: node(2),
                info: NodeInfo {
                    manufacturer: "Aeotec".to_string(),
                    product: "Smart Switch 6".to_string(),
                    product_type: String::new(),
                },
            })
            .unwrap();

        assert!(session.is_node_ready(node(2)));
        assert_eq!(seen.lock().as_deref(), Some("Smart Switch 6"));
    }

    #[test]
    fn test_unknown_node_is_reported() {
        let session = DeviceSession::new();
        assert_eq!(
            session.handle_event(DriverEvent::NodeReady {
                node_id: node(9),
                info: NodeInfo::default(),
            }),
            Err(StateError::NodeNotFound(node(9)))
        );
        assert_eq!(
            session.handle_event(DriverEvent::NodeRemoved { node_id: node(9) }),
            Err(StateError::NodeNotFound(node(9)))
        );
    }

    #[test]
    fn test_value_removed() {
        let session = session_with_switch();
        session
            .handle_event(DriverEvent::ValueRemoved {
                node_id: node(2),
                command_class: CommandClass::SWITCH_BINARY,
                instance: 1,
                index: 0,
            })
            .unwrap();
        assert_eq!(session.store().node(node(2)).unwrap().value_count(), 0);
    }

    #[test]
    fn test_listener_may_feed_events_back() {
        let session = Arc::new(session_with_switch());
        let id = ValueId::new(node(2), CommandClass::SWITCH_BINARY, 1, 0);

        let inner = Arc::clone(&session);
        session.bus().on_value_changed(id, move |change| {
            // Same-thread re-entry must not deadlock
            if change.current == RawValue::Bool(true) {
                let _ = inner.handle_event(DriverEvent::ValueChanged {
                    node_id: NodeId::new(2),
                    value: Value::root(CommandClass::SWITCH_BINARY, "Switch", false),
                });
            }
        });

        session
            .handle_event(DriverEvent::ValueChanged {
                node_id: node(2),
                value: switch(true),
            })
            .unwrap();

        assert_eq!(session.store().get_value(&id).unwrap().value, RawValue::Bool(false));
    }
}
