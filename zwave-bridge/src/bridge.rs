//! Bridge platform: one device session, many accessories
//!
//! The [`Bridge`] owns the [`DeviceSession`] for a driver connection and one
//! [`AccessorySync`] per configured accessory. Hosts feed it driver events
//! and hand its characteristics to the accessory model.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use zwave_state::{DeviceSession, DriverEvent, NodeId, StateError};

use crate::accessory::AccessorySync;
use crate::config::{AccessoryConfig, BridgeConfig};
use crate::driver::DeviceDriver;
use crate::error::ConfigError;

pub struct Bridge {
    session: Arc<DeviceSession>,
    driver: Arc<dyn DeviceDriver>,
    config: BridgeConfig,
    accessories: RwLock<HashMap<String, Arc<AccessorySync>>>,
}

impl Bridge {
    /// Validate the configuration and build every accessory
    pub fn new(config: BridgeConfig, driver: Arc<dyn DeviceDriver>) -> Result<Self, ConfigError> {
        Self::with_session(config, Arc::new(DeviceSession::new()), driver)
    }

    /// Like [`Bridge::new`], on an existing session
    pub fn with_session(
        config: BridgeConfig,
        session: Arc<DeviceSession>,
        driver: Arc<dyn DeviceDriver>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let bridge = Self {
            session,
            driver,
            config,
            accessories: RwLock::new(HashMap::new()),
        };
        for accessory in &bridge.config.accessories {
            bridge.build(accessory);
        }
        tracing::info!("Bridge created with {} accessories", bridge.config.accessories.len());
        Ok(bridge)
    }

    pub fn session(&self) -> &Arc<DeviceSession> {
        &self.session
    }

    pub fn accessory(&self, name: &str) -> Option<Arc<AccessorySync>> {
        self.accessories.read().get(name).cloned()
    }

    /// Live accessories sorted by name
    pub fn accessories(&self) -> Vec<Arc<AccessorySync>> {
        let mut accessories: Vec<_> = self.accessories.read().values().cloned().collect();
        accessories.sort_by(|a, b| a.name().cmp(b.name()));
        accessories
    }

    /// Apply one driver event
    ///
    /// A removed node takes its accessories and their listeners with it.
    /// When the node joins again, fresh accessories are built for it.
    pub fn handle_event(&self, event: DriverEvent) -> Result<(), StateError> {
        match event {
            DriverEvent::NodeRemoved { node_id } => {
                self.session.handle_event(event)?;
                self.session.bus().clear_node(node_id);
                let removed = self.drop_accessories(node_id);
                if removed > 0 {
                    tracing::warn!("Node {} removed, {} accessory(ies) offline", node_id, removed);
                }
                Ok(())
            }
            DriverEvent::NodeAdded { node_id } => {
                self.session.handle_event(event)?;
                for accessory in self.configs_for(node_id) {
                    if self.accessory(&accessory.name).is_none() {
                        tracing::info!("Node {} rejoined, rebuilding {}", node_id, accessory.name);
                        self.build(&accessory);
                    }
                }
                Ok(())
            }
            other => self.session.handle_event(other),
        }
    }

    fn build(&self, config: &AccessoryConfig) {
        let accessory = AccessorySync::new(config, Arc::clone(&self.session), Arc::clone(&self.driver));
        self.accessories.write().insert(config.name.clone(), accessory);
    }

    fn configs_for(&self, node_id: NodeId) -> Vec<AccessoryConfig> {
        self.config
            .accessories
            .iter()
            .filter(|a| a.node_id == node_id)
            .cloned()
            .collect()
    }

    fn drop_accessories(&self, node_id: NodeId) -> usize {
        let mut accessories = self.accessories.write();
        let before = accessories.len();
        accessories.retain(|_, a| a.node_id() != node_id);
        before - accessories.len()
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("accessories", &self.accessories.read().len())
            .field("nodes", &self.session.store().node_count())
            .finish()
    }
}
