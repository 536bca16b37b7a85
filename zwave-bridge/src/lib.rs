//! Z-Wave Accessory Bridge
//!
//! Keeps Z-Wave device values and home-automation accessory characteristics
//! consistent in both directions.
//!
//! # Architecture
//!
//! ```text
//! DriverEvent → DeviceSession → ValueStore
//!                    │
//!                    └→ EventBus → AccessorySync → Characteristic::update_value
//!
//! Characteristic::set → Setter → DeviceDriver::set_value
//!                                   ⋮ (device confirms)
//!                              DriverEvent::ValueChanged → … (echo suppressed)
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use zwave_bridge::{Bridge, BridgeConfig, CharacteristicKind, CharacteristicValue, RecordingDriver};
//! use zwave_state::{CommandClass, DriverEvent, NodeId, NodeInfo, Value};
//!
//! let config = BridgeConfig::from_json(
//!     r#"{"accessories": [{"name": "Desk Lamp", "node_id": 2, "capabilities": [{"type": "switch"}]}]}"#,
//! )
//! .unwrap();
//! let driver = Arc::new(RecordingDriver::new());
//! let bridge = Bridge::new(config, driver.clone()).unwrap();
//!
//! let node_id = NodeId::new(2);
//! bridge.handle_event(DriverEvent::NodeAdded { node_id }).unwrap();
//! bridge
//!     .handle_event(DriverEvent::ValueAdded {
//!         node_id,
//!         value: Value::root(CommandClass::SWITCH_BINARY, "Switch", false),
//!     })
//!     .unwrap();
//! bridge
//!     .handle_event(DriverEvent::NodeReady { node_id, info: NodeInfo::default() })
//!     .unwrap();
//!
//! let on = bridge.accessory("Desk Lamp").unwrap().characteristic(CharacteristicKind::On).unwrap();
//! assert_eq!(on.get().unwrap(), CharacteristicValue::Bool(false));
//! on.set(CharacteristicValue::Bool(true)).unwrap();
//! assert_eq!(driver.commands().len(), 1);
//! ```

pub mod accessory;
pub mod binding;
pub mod bridge;
pub mod capability;
pub mod characteristic;
pub mod config;
pub mod derived;
pub mod driver;
pub mod error;
pub mod readiness;
pub mod transform;

pub use accessory::AccessorySync;
pub use binding::{
    bind, bind_change_notification, make_getter, make_resolver, make_setter, BindingContext, Getter, Resolver,
    Setter, ValueBinding,
};
pub use bridge::Bridge;
pub use capability::{Capability, PlannedBinding};
pub use characteristic::{
    Characteristic, CharacteristicKind, CharacteristicValue, ChargingState, ValueSink, ValueSource,
};
pub use config::{AccessoryConfig, BridgeConfig};
pub use derived::{bind_derived, BatteryInputs, DerivedBinding, DerivedRule, ThresholdSource};
pub use driver::{DeviceDriver, RecordingDriver, SetValueCommand};
pub use error::{BindingError, ConfigError, Result};
pub use readiness::Readiness;
pub use transform::{GetFilter, SetFilter};
