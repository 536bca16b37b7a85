//! Values exposed by a node's command classes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value_id::{CommandClass, NodeId, ValueId, DEFAULT_INDEX, DEFAULT_INSTANCE};

/// Raw value as reported by the protocol
///
/// The driver reports booleans, numbers or descriptive strings (list items,
/// alarm labels). The representation is kept as-is until a characteristic
/// filter narrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            RawValue::Bool(_) => "bool",
            RawValue::Number(_) => "number",
            RawValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Bool(b) => write!(f, "{}", b),
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

fn default_instance() -> u8 {
    DEFAULT_INSTANCE
}

/// One named, indexed datum exposed under a command class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub command_class: CommandClass,
    #[serde(default = "default_instance")]
    pub instance: u8,
    #[serde(default)]
    pub index: u16,
    #[serde(default)]
    pub label: String,
    pub value: RawValue,
}

impl Value {
    pub fn new(
        command_class: CommandClass,
        instance: u8,
        index: u16,
        label: impl Into<String>,
        value: impl Into<RawValue>,
    ) -> Self {
        Self {
            command_class,
            instance,
            index,
            label: label.into(),
            value: value.into(),
        }
    }

    /// Value at the default instance and index of a class
    pub fn root(command_class: CommandClass, label: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self::new(command_class, DEFAULT_INSTANCE, DEFAULT_INDEX, label, value)
    }

    /// Composite id of this value on the given node
    pub fn id(&self, node_id: NodeId) -> ValueId {
        ValueId::new(node_id, self.command_class, self.instance, self.index)
    }
}
