//! Bridge configuration
//!
//! ```json
//! {
//!   "accessories": [
//!     {"name": "Desk Lamp", "node_id": 2, "capabilities": [{"type": "switch"}]},
//!     {"name": "Hallway Sensor", "node_id": 4, "capabilities": [
//!       {"type": "temperature"}, {"type": "motion"}, {"type": "battery"}
//!     ]}
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use zwave_state::NodeId;

use crate::capability::Capability;
use crate::error::ConfigError;

/// One accessory backed by one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessoryConfig {
    pub name: String,
    pub node_id: NodeId,
    pub capabilities: Vec<Capability>,
}

impl AccessoryConfig {
    pub fn new(name: impl Into<String>, node_id: NodeId, capabilities: Vec<Capability>) -> Self {
        Self {
            name: name.into(),
            node_id,
            capabilities,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidAccessory {
            accessory: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }
        if self.node_id.get() == 0 {
            return Err(invalid("node id 0 is not a valid node".to_string()));
        }
        if self.capabilities.is_empty() {
            return Err(invalid("no capabilities configured".to_string()));
        }

        let mut kinds = HashSet::new();
        for capability in &self.capabilities {
            if capability.keywords().iter().any(|k| k.trim().is_empty()) {
                return Err(invalid(format!("{} has an empty keyword", capability.name())));
            }
            for planned in capability.plan() {
                if !kinds.insert(planned.kind()) {
                    return Err(invalid(format!(
                        "{} is provided by more than one capability",
                        planned.kind()
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Top-level bridge configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub accessories: Vec<AccessoryConfig>,
}

impl BridgeConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for accessory in &self.accessories {
            accessory.validate()?;
            if !names.insert(accessory.name.as_str()) {
                return Err(ConfigError::DuplicateAccessory(accessory.name.clone()));
            }
        }
        Ok(())
    }
}
