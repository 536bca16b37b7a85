//! Z-Wave Device State
//!
//! Node/value cache and event dispatch for one Z-Wave driver session.
//!
//! # Features
//!
//! - **Value Store**: Nodes and their values keyed by composite [`ValueId`]
//! - **Strict Lookup**: Criteria lookups fail on ambiguity instead of picking
//!   the first match
//! - **Event Bus**: Typed, synchronous node-ready and value-changed dispatch
//!   in subscription order
//! - **Device Session**: Applies driver events and dispatches their
//!   notifications as one atomic unit
//!
//! # Architecture
//!
//! ```text
//! DriverEvent → DeviceSession → ValueStore
//!                    │
//!                    └────────→ EventBus → listeners
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use zwave_state::{CommandClass, DeviceSession, DriverEvent, NodeId, Value, ValueCriteria};
//!
//! let session = DeviceSession::new();
//! let node = NodeId::new(4);
//!
//! session.handle_event(DriverEvent::NodeAdded { node_id: node }).unwrap();
//! session
//!     .handle_event(DriverEvent::ValueAdded {
//!         node_id: node,
//!         value: Value::new(CommandClass::SENSOR_MULTILEVEL, 1, 1, "Temperature", 21.5),
//!     })
//!     .unwrap();
//!
//! let criteria = ValueCriteria::new(CommandClass::SENSOR_MULTILEVEL).index(1);
//! if let Some(value_id) = criteria.exact_id(node) {
//!     session.bus().on_value_changed(value_id, |change| {
//!         println!("temperature is now {}", change.current);
//!     });
//! }
//!
//! let value = session.find_value(node, &criteria).unwrap();
//! assert_eq!(value.value.as_number(), Some(21.5));
//! ```

pub mod bus;
pub mod driver_event;
pub mod error;
pub mod logging;
pub mod model;
pub mod session;
pub mod store;
pub mod value_id;

// ============================================================================
// Re-exports
// ============================================================================

pub use bus::{EventBus, ValueChange};
pub use driver_event::DriverEvent;
pub use error::{Result, StateError};
pub use logging::{init_logging, init_logging_from_env, init_silent, LoggingError, LoggingMode};
pub use model::{Node, NodeInfo, RawValue, Value};
pub use session::DeviceSession;
pub use store::{ValueStore, ValueUpdate};
pub use value_id::{CommandClass, NodeId, ValueCriteria, ValueId, DEFAULT_INDEX, DEFAULT_INSTANCE};

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::bus::{EventBus, ValueChange};
    pub use crate::driver_event::DriverEvent;
    pub use crate::model::{Node, NodeInfo, RawValue, Value};
    pub use crate::session::DeviceSession;
    pub use crate::store::ValueStore;
    pub use crate::value_id::{CommandClass, NodeId, ValueCriteria, ValueId};
}
