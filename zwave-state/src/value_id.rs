//! Composite value identity and lookup criteria
//!
//! Every value on the network is addressed by the 4-tuple
//! `(node, command class, instance, index)`. [`ValueId`] is the single source
//! of truth for that key shape: the store indexes values by it and the event
//! bus dispatches on it, so a value written by one side and subscribed to by
//! the other always meet on the same key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::model::Value;

/// Instance used when a caller does not name one (the protocol's root endpoint)
pub const DEFAULT_INSTANCE: u8 = 1;

/// Index used when a caller does not name one
pub const DEFAULT_INDEX: u16 = 0;

/// Network-assigned node identifier, stable for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u8);

impl NodeId {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for NodeId {
    fn from(id: u8) -> Self {
        NodeId(id)
    }
}

/// Numeric command class identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandClass(u8);

impl CommandClass {
    pub const SWITCH_BINARY: CommandClass = CommandClass(37);
    pub const SWITCH_MULTILEVEL: CommandClass = CommandClass(38);
    pub const SENSOR_BINARY: CommandClass = CommandClass(48);
    pub const SENSOR_MULTILEVEL: CommandClass = CommandClass(49);
    pub const METER: CommandClass = CommandClass(50);
    pub const CONFIGURATION: CommandClass = CommandClass(112);
    pub const ALARM: CommandClass = CommandClass(113);
    pub const BATTERY: CommandClass = CommandClass(128);

    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Human-readable name for the classes the bridge knows about
    pub fn name(self) -> Option<&'static str> {
        match self.0 {
            37 => Some("switch-binary"),
            38 => Some("switch-multilevel"),
            48 => Some("sensor-binary"),
            49 => Some("sensor-multilevel"),
            50 => Some("meter"),
            112 => Some("configuration"),
            113 => Some("alarm"),
            128 => Some("battery"),
            _ => None,
        }
    }
}

impl fmt::Display for CommandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", self.0, name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<u8> for CommandClass {
    fn from(id: u8) -> Self {
        CommandClass(id)
    }
}

/// Composite identity of one value on one node
///
/// The display form `node-class-instance-index` (e.g. `4-49-1-1`) is stable
/// and parses back with [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId {
    pub node_id: NodeId,
    pub command_class: CommandClass,
    pub instance: u8,
    pub index: u16,
}

impl ValueId {
    pub fn new(node_id: NodeId, command_class: CommandClass, instance: u8, index: u16) -> Self {
        Self {
            node_id,
            command_class,
            instance,
            index,
        }
    }

    /// Build a value id, filling in the protocol defaults for omitted parts
    pub fn encode(
        node_id: NodeId,
        command_class: CommandClass,
        instance: Option<u8>,
        index: Option<u16>,
    ) -> Self {
        Self::new(
            node_id,
            command_class,
            instance.unwrap_or(DEFAULT_INSTANCE),
            index.unwrap_or(DEFAULT_INDEX),
        )
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.node_id.0, self.command_class.0, self.instance, self.index
        )
    }
}

impl FromStr for ValueId {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StateError::InvalidValueId(s.to_string());
        let mut parts = s.split('-');

        let node_id = parts.next().and_then(|p| p.parse::<u8>().ok()).ok_or_else(invalid)?;
        let class = parts.next().and_then(|p| p.parse::<u8>().ok()).ok_or_else(invalid)?;
        let instance = parts.next().and_then(|p| p.parse::<u8>().ok()).ok_or_else(invalid)?;
        let index = parts.next().and_then(|p| p.parse::<u16>().ok()).ok_or_else(invalid)?;

        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(ValueId::new(NodeId(node_id), CommandClass(class), instance, index))
    }
}

/// Partial-match predicate over a node's values
///
/// An omitted `instance` means [`DEFAULT_INSTANCE`]. An omitted `index`
/// matches every index of the class, which is how ambiguous lookups arise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueCriteria {
    pub command_class: CommandClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u16>,
}

impl ValueCriteria {
    pub fn new(command_class: CommandClass) -> Self {
        Self {
            command_class,
            instance: None,
            index: None,
        }
    }

    pub fn instance(mut self, instance: u8) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn index(mut self, index: u16) -> Self {
        self.index = Some(index);
        self
    }

    /// Check whether a stored value satisfies this criteria
    pub fn matches(&self, value: &Value) -> bool {
        self.matches_parts(value.command_class, value.instance, value.index)
    }

    /// Check whether a value id satisfies this criteria, ignoring its node
    pub fn matches_id(&self, value_id: &ValueId) -> bool {
        self.matches_parts(value_id.command_class, value_id.instance, value_id.index)
    }

    fn matches_parts(&self, command_class: CommandClass, instance: u8, index: u16) -> bool {
        command_class == self.command_class
            && instance == self.instance.unwrap_or(DEFAULT_INSTANCE)
            && self.index.map_or(true, |i| index == i)
    }

    /// Whether this criteria names exactly one value id
    pub fn is_exact(&self) -> bool {
        self.index.is_some()
    }

    /// The value id this criteria addresses on a node
    ///
    /// `None` when the index is a wildcard: such criteria only identify a
    /// value once it is resolved against the store.
    pub fn exact_id(&self, node_id: NodeId) -> Option<ValueId> {
        self.index
            .map(|index| ValueId::encode(node_id, self.command_class, self.instance, Some(index)))
    }
}

impl fmt::Display for ValueCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class {} instance {}",
            self.command_class,
            self.instance.unwrap_or(DEFAULT_INSTANCE)
        )?;
        match self.index {
            Some(index) => write!(f, " index {}", index),
            None => write!(f, " index *"),
        }
    }
}
