//! Inbound notifications from the device driver
//!
//! The driver that owns the serial/radio link reports node and value
//! lifecycle as [`DriverEvent`]s. They deserialize from the tagged JSON form
//! drivers commonly emit:
//!
//! ```json
//! {"event": "value_changed", "node_id": 4,
//!  "value": {"command_class": 49, "index": 1, "label": "Temperature", "value": 22.0}}
//! ```

use serde::{Deserialize, Serialize};

use crate::model::{NodeInfo, Value};
use crate::value_id::{CommandClass, NodeId, ValueId, DEFAULT_INSTANCE};

fn default_instance() -> u8 {
    DEFAULT_INSTANCE
}

/// One node or value lifecycle notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DriverEvent {
    NodeAdded {
        node_id: NodeId,
    },
    NodeRemoved {
        node_id: NodeId,
    },
    NodeReady {
        node_id: NodeId,
        #[serde(default)]
        info: NodeInfo,
    },
    ValueAdded {
        node_id: NodeId,
        value: Value,
    },
    ValueChanged {
        node_id: NodeId,
        value: Value,
    },
    ValueRemoved {
        node_id: NodeId,
        command_class: CommandClass,
        #[serde(default = "default_instance")]
        instance: u8,
        #[serde(default)]
        index: u16,
    },
}

impl DriverEvent {
    /// The node this event concerns
    pub fn node_id(&self) -> NodeId {
        match self {
            DriverEvent::NodeAdded { node_id }
            | DriverEvent::NodeRemoved { node_id }
            | DriverEvent::NodeReady { node_id, .. }
            | DriverEvent::ValueAdded { node_id, .. }
            | DriverEvent::ValueChanged { node_id, .. }
            | DriverEvent::ValueRemoved { node_id, .. } => *node_id,
        }
    }

    /// The value this event concerns, for value events
    pub fn value_id(&self) -> Option<ValueId> {
        match self {
            DriverEvent::ValueAdded { node_id, value } | DriverEvent::ValueChanged { node_id, value } => {
                Some(value.id(*node_id))
            }
            DriverEvent::ValueRemoved {
                node_id,
                command_class,
                instance,
                index,
            } => Some(ValueId::new(*node_id, *command_class, *instance, *index)),
            _ => None,
        }
    }

    /// Short name of the event kind, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            DriverEvent::NodeAdded { .. } => "node_added",
            DriverEvent::NodeRemoved { .. } => "node_removed",
            DriverEvent::NodeReady { .. } => "node_ready",
            DriverEvent::ValueAdded { .. } => "value_added",
            DriverEvent::ValueChanged { .. } => "value_changed",
            DriverEvent::ValueRemoved { .. } => "value_removed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawValue;

    #[test]
    fn test_deserialize_value_changed() {
        let json = r#"{"event": "value_changed", "node_id": 4,
            "value": {"command_class": 49, "index": 1, "label": "Temperature", "value": 22.0}}"#;
        let event: DriverEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.kind(), "value_changed");
        assert_eq!(event.node_id(), NodeId::new(4));
        assert_eq!(event.value_id().unwrap().to_string(), "4-49-1-1");
        match event {
            DriverEvent::ValueChanged { value, .. } => assert_eq!(value.value, RawValue::Number(22.0)),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_node_ready_with_info() {
        let json = r#"{"event": "node_ready", "node_id": 2,
            "info": {"manufacturer": "Aeotec", "product": "Smart Switch 6", "type": "Binary Power Switch"}}"#;
        let event: DriverEvent = serde_json::from_str(json).unwrap();

        match event {
            DriverEvent::NodeReady { info, .. } => {
                assert_eq!(info.product, "Smart Switch 6");
                assert_eq!(info.product_type, "Binary Power Switch");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_value_removed_defaults() {
        let json = r#"{"event": "value_removed", "node_id": 2, "command_class": 37}"#;
        let event: DriverEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.value_id().unwrap().to_string(), "2-37-1-0");
    }

    #[test]
    fn test_node_events_have_no_value_id() {
        let event = DriverEvent::NodeAdded {
            node_id: NodeId::new(2),
        };
        assert!(event.value_id().is_none());
    }
}
