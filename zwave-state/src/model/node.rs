//! Node records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Value;
use crate::value_id::{NodeId, ValueId};

/// Descriptive attributes reported once a node finishes discovery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub product: String,
    #[serde(default, rename = "type")]
    pub product_type: String,
}

impl NodeInfo {
    /// Merge reported attributes, keeping existing ones the driver left blank
    pub fn merge(&mut self, other: NodeInfo) {
        if !other.manufacturer.is_empty() {
            self.manufacturer = other.manufacturer;
        }
        if !other.product.is_empty() {
            self.product = other.product;
        }
        if !other.product_type.is_empty() {
            self.product_type = other.product_type;
        }
    }
}

/// One physical device and the values it exposes
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub info: NodeInfo,
    pub(crate) ready: bool,
    pub(crate) values: BTreeMap<ValueId, Value>,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            info: NodeInfo::default(),
            ready: false,
            values: BTreeMap::new(),
        }
    }

    /// Whether the driver has reported this node ready
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn value(&self, id: &ValueId) -> Option<&Value> {
        self.values.get(id)
    }

    /// Values in value-id order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.values()
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }
}
