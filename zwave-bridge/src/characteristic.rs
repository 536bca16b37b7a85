//! Minimal accessory characteristic model
//!
//! A [`Characteristic`] is one typed property of an accessory. The accessory
//! host reads it through [`Characteristic::get`], writes it through
//! [`Characteristic::set`], and observes out-of-band changes by subscribing
//! to pushes made with [`Characteristic::update_value`].
//!
//! The characteristic remembers its last-known value. Gets and sets update
//! it silently; only `update_value` notifies subscribers.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{BindingError, Result};

/// Characteristic types the bridge can expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CharacteristicKind {
    On,
    Brightness,
    OutletInUse,
    CurrentTemperature,
    CurrentAmbientLightLevel,
    CurrentRelativeHumidity,
    ContactSensorState,
    MotionDetected,
    StatusTampered,
    SmokeDetected,
    LeakDetected,
    BatteryLevel,
    ChargingState,
    StatusLowBattery,
}

impl CharacteristicKind {
    pub fn name(self) -> &'static str {
        match self {
            CharacteristicKind::On => "On",
            CharacteristicKind::Brightness => "Brightness",
            CharacteristicKind::OutletInUse => "Outlet In Use",
            CharacteristicKind::CurrentTemperature => "Current Temperature",
            CharacteristicKind::CurrentAmbientLightLevel => "Current Ambient Light Level",
            CharacteristicKind::CurrentRelativeHumidity => "Current Relative Humidity",
            CharacteristicKind::ContactSensorState => "Contact Sensor State",
            CharacteristicKind::MotionDetected => "Motion Detected",
            CharacteristicKind::StatusTampered => "Status Tampered",
            CharacteristicKind::SmokeDetected => "Smoke Detected",
            CharacteristicKind::LeakDetected => "Leak Detected",
            CharacteristicKind::BatteryLevel => "Battery Level",
            CharacteristicKind::ChargingState => "Charging State",
            CharacteristicKind::StatusLowBattery => "Status Low Battery",
        }
    }
}

impl fmt::Display for CharacteristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value as seen by the accessory model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl CharacteristicValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CharacteristicValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CharacteristicValue::Int(i) => Some(*i as f64),
            CharacteristicValue::Float(f) => Some(*f),
            CharacteristicValue::Bool(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CharacteristicValue::Bool(_) => "bool",
            CharacteristicValue::Int(_) => "int",
            CharacteristicValue::Float(_) => "float",
        }
    }
}

impl fmt::Display for CharacteristicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacteristicValue::Bool(b) => write!(f, "{}", b),
            CharacteristicValue::Int(i) => write!(f, "{}", i),
            CharacteristicValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for CharacteristicValue {
    fn from(b: bool) -> Self {
        CharacteristicValue::Bool(b)
    }
}

impl From<i64> for CharacteristicValue {
    fn from(i: i64) -> Self {
        CharacteristicValue::Int(i)
    }
}

impl From<f64> for CharacteristicValue {
    fn from(f: f64) -> Self {
        CharacteristicValue::Float(f)
    }
}

/// Charging State values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargingState {
    NotCharging = 0,
    Charging = 1,
    NotChargeable = 2,
}

impl From<ChargingState> for CharacteristicValue {
    fn from(state: ChargingState) -> Self {
        CharacteristicValue::Int(state as i64)
    }
}

/// Read side of a characteristic binding
pub trait ValueSource: Send + Sync {
    fn read(&self) -> Result<CharacteristicValue>;
}

/// Write side of a characteristic binding
pub trait ValueSink: Send + Sync {
    fn write(&self, value: &CharacteristicValue) -> Result<()>;
}

type Subscriber = Arc<dyn Fn(&CharacteristicValue) + Send + Sync>;

/// One accessory characteristic with get/set hooks and change pushes
pub struct Characteristic {
    kind: CharacteristicKind,
    last: RwLock<Option<CharacteristicValue>>,
    source: RwLock<Option<Arc<dyn ValueSource>>>,
    sink: RwLock<Option<Arc<dyn ValueSink>>>,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl Characteristic {
    pub fn new(kind: CharacteristicKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            last: RwLock::new(None),
            source: RwLock::new(None),
            sink: RwLock::new(None),
            subscribers: RwLock::new(Vec::new()),
        })
    }

    pub fn kind(&self) -> CharacteristicKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Install the get hook
    pub fn set_source(&self, source: Arc<dyn ValueSource>) {
        *self.source.write() = Some(source);
    }

    /// Install the set hook
    pub fn set_sink(&self, sink: Arc<dyn ValueSink>) {
        *self.sink.write() = Some(sink);
    }

    pub fn is_writable(&self) -> bool {
        self.sink.read().is_some()
    }

    /// Register an observer for pushed updates
    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: Fn(&CharacteristicValue) + Send + Sync + 'static,
    {
        self.subscribers.write().push(Arc::new(subscriber));
    }

    /// Last-known value, without consulting the device
    pub fn value(&self) -> Option<CharacteristicValue> {
        self.last.read().clone()
    }

    /// Run the get hook
    pub fn get(&self) -> Result<CharacteristicValue> {
        let source = self
            .source
            .read()
            .clone()
            .ok_or(BindingError::Unbound(self.name()))?;
        let value = source.read()?;
        *self.last.write() = Some(value.clone());
        Ok(value)
    }

    /// Run the set hook
    ///
    /// On success the written value becomes the last-known value, so the
    /// device confirming it does not echo back as a push.
    pub fn set(&self, value: CharacteristicValue) -> Result<()> {
        let sink = self
            .sink
            .read()
            .clone()
            .ok_or(BindingError::ReadOnly(self.name()))?;
        sink.write(&value)?;
        *self.last.write() = Some(value);
        Ok(())
    }

    /// Push an out-of-band change to subscribers
    pub fn update_value(&self, value: CharacteristicValue) {
        *self.last.write() = Some(value.clone());
        let subscribers = self.subscribers.read().clone();
        for subscriber in &subscribers {
            subscriber(&value);
        }
    }
}

impl fmt::Debug for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Characteristic")
            .field("kind", &self.kind)
            .field("value", &*self.last.read())
            .field("writable", &self.is_writable())
            .finish()
    }
}
