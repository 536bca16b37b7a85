//! Accessory synchronizer
//!
//! An [`AccessorySync`] wires every characteristic one configured accessory
//! needs onto its backing node and tracks the accessory's readiness:
//!
//! ```text
//! UNREADY ──(node ready)──► READY
//! ```
//!
//! READY is terminal. A node that leaves and rejoins the network gets a new
//! synchronizer; the old one is never revived.

use std::collections::BTreeMap;
use std::sync::Arc;

use zwave_state::{DeviceSession, NodeId};

use crate::binding::{bind, BindingContext};
use crate::capability::PlannedBinding;
use crate::characteristic::{Characteristic, CharacteristicKind};
use crate::config::AccessoryConfig;
use crate::derived::bind_derived;
use crate::driver::DeviceDriver;
use crate::readiness::Readiness;

/// Live bindings for one accessory
pub struct AccessorySync {
    name: String,
    context: Arc<BindingContext>,
    characteristics: BTreeMap<CharacteristicKind, Arc<Characteristic>>,
}

impl AccessorySync {
    /// Build characteristics for every configured capability and bind them
    ///
    /// If the node is already ready when the synchronizer is built (the
    /// bridge rebuilding after a re-add, for instance) the accessory starts
    /// ready; otherwise it waits for the node's ready event.
    pub fn new(
        config: &AccessoryConfig,
        session: Arc<DeviceSession>,
        driver: Arc<dyn DeviceDriver>,
    ) -> Arc<Self> {
        let readiness = Arc::new(Readiness::new(config.name.clone()));
        let context = BindingContext::new(config.node_id, Arc::clone(&readiness), Arc::clone(&session), driver);

        let mut characteristics = BTreeMap::new();
        for capability in &config.capabilities {
            for planned in capability.plan() {
                let characteristic = Characteristic::new(planned.kind());
                match &planned {
                    PlannedBinding::Value(binding) => bind(&context, &characteristic, binding),
                    PlannedBinding::Derived(binding) => bind_derived(&context, &characteristic, binding),
                }
                tracing::debug!(
                    "Bound {} on {} ({})",
                    characteristic.name(),
                    config.name,
                    capability.name()
                );
                characteristics.insert(planned.kind(), characteristic);
            }
        }

        let name = config.name.clone();
        let ready_flag = Arc::clone(&readiness);
        session.bus().on_node_ready(config.node_id, move |node| {
            if ready_flag.mark_ready() {
                tracing::info!(
                    "Accessory {} ready ({} {})",
                    name,
                    node.info.manufacturer,
                    node.info.product
                );
            }
        });

        if session.is_node_ready(config.node_id) && readiness.mark_ready() {
            tracing::info!("Accessory {} ready (node already ready)", config.name);
        }

        Arc::new(Self {
            name: config.name.clone(),
            context,
            characteristics,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_id(&self) -> NodeId {
        self.context.node_id()
    }

    pub fn is_ready(&self) -> bool {
        self.context.is_ready()
    }

    pub fn characteristic(&self, kind: CharacteristicKind) -> Option<Arc<Characteristic>> {
        self.characteristics.get(&kind).cloned()
    }

    /// Characteristics in kind order
    pub fn characteristics(&self) -> impl Iterator<Item = &Arc<Characteristic>> {
        self.characteristics.values()
    }
}

impl std::fmt::Debug for AccessorySync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessorySync")
            .field("name", &self.name)
            .field("node_id", &self.node_id())
            .field("ready", &self.is_ready())
            .field("characteristics", &self.characteristics.keys().collect::<Vec<_>>())
            .finish()
    }
}
