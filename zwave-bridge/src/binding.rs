//! Binding factory: characteristic get/set/push wired to device values
//!
//! A [`ValueBinding`] describes how one characteristic maps onto one device
//! value: which value (criteria), and how to translate each way (filters).
//! [`bind`] turns that description into a live binding:
//!
//! - a [`Getter`] installed as the characteristic's get hook
//! - a [`Setter`] installed as its set hook (writable bindings only)
//! - a value-changed listener that pushes device-originated changes
//!
//! ```text
//! get ──► readiness ──► Resolver ──► ValueStore ──► GetFilter ──► value
//! set ──► readiness ──► SetFilter ──► DeviceDriver::set_value
//! bus ──► GetFilter ──► differs from last-known? ──► update_value
//! ```
//!
//! Criteria without an index are only meaningful once resolved: the setter
//! addresses the uniquely matching value and change notification listens to
//! the whole node, pushing only changes of that value.
//!
//! Setters never touch the store. The device confirms a set by sending an
//! ordinary value-changed event, which closes the loop through the bus.

use std::sync::{Arc, Weak};

use zwave_state::{DeviceSession, NodeId, RawValue, ValueChange, ValueCriteria, ValueId};

use crate::characteristic::{Characteristic, CharacteristicKind, CharacteristicValue, ValueSink, ValueSource};
use crate::driver::DeviceDriver;
use crate::error::Result;
use crate::readiness::Readiness;
use crate::transform::{GetFilter, SetFilter};

/// Shared context for every binding of one accessory
pub struct BindingContext {
    pub(crate) node_id: NodeId,
    pub(crate) readiness: Arc<Readiness>,
    pub(crate) session: Arc<DeviceSession>,
    pub(crate) driver: Arc<dyn DeviceDriver>,
}

impl BindingContext {
    pub fn new(
        node_id: NodeId,
        readiness: Arc<Readiness>,
        session: Arc<DeviceSession>,
        driver: Arc<dyn DeviceDriver>,
    ) -> Arc<Self> {
        Arc::new(Self {
            node_id,
            readiness,
            session,
            driver,
        })
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }
}

/// Description of a one-to-one characteristic/value binding
#[derive(Debug, Clone, PartialEq)]
pub struct ValueBinding {
    pub kind: CharacteristicKind,
    pub criteria: ValueCriteria,
    pub get: GetFilter,
    /// `None` for read-only characteristics
    pub set: Option<SetFilter>,
}

impl ValueBinding {
    pub fn read_only(kind: CharacteristicKind, criteria: ValueCriteria, get: GetFilter) -> Self {
        Self {
            kind,
            criteria,
            get,
            set: None,
        }
    }

    pub fn writable(kind: CharacteristicKind, criteria: ValueCriteria, get: GetFilter, set: SetFilter) -> Self {
        Self {
            kind,
            criteria,
            get,
            set: Some(set),
        }
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Looks up the current raw value for one criteria on one node
///
/// Resolves against the store on every call; the store may have replaced the
/// record since the last one.
#[derive(Clone)]
pub struct Resolver {
    context: Arc<BindingContext>,
    criteria: ValueCriteria,
}

impl Resolver {
    pub fn resolve(&self) -> Result<RawValue> {
        let value = self
            .context
            .session
            .find_value(self.context.node_id, &self.criteria)?;
        Ok(value.value)
    }

    pub fn criteria(&self) -> &ValueCriteria {
        &self.criteria
    }
}

pub fn make_resolver(context: &Arc<BindingContext>, criteria: ValueCriteria) -> Resolver {
    Resolver {
        context: Arc::clone(context),
        criteria,
    }
}

// ============================================================================
// Getter / Setter
// ============================================================================

/// Get hook: readiness gate, resolve, filter
pub struct Getter {
    name: &'static str,
    resolver: Resolver,
    filter: GetFilter,
}

pub fn make_getter(name: &'static str, resolver: Resolver, filter: GetFilter) -> Getter {
    Getter {
        name,
        resolver,
        filter,
    }
}

impl ValueSource for Getter {
    fn read(&self) -> Result<CharacteristicValue> {
        self.resolver.context.readiness.check()?;

        let raw = self.resolver.resolve().map_err(|e| {
            // The node is ready, so a missing or ambiguous value is a mapping
            // mistake rather than a transient state
            tracing::error!("{} on node {}: {}", self.name, self.resolver.context.node_id, e);
            e
        })?;

        let value = self.filter.apply(self.name, &raw)?;
        tracing::debug!("Get {} on node {}: {} -> {}", self.name, self.resolver.context.node_id, raw, value);
        Ok(value)
    }
}

/// Set hook: readiness gate, filter, outbound command
pub struct Setter {
    name: &'static str,
    context: Arc<BindingContext>,
    criteria: ValueCriteria,
    filter: SetFilter,
}

pub fn make_setter(
    context: &Arc<BindingContext>,
    name: &'static str,
    criteria: ValueCriteria,
    filter: SetFilter,
) -> Setter {
    Setter {
        name,
        context: Arc::clone(context),
        criteria,
        filter,
    }
}

impl Setter {
    fn target(&self) -> Result<ValueId> {
        let node_id = self.context.node_id;
        match self.criteria.exact_id(node_id) {
            Some(value_id) => Ok(value_id),
            None => Ok(self.context.session.find_value(node_id, &self.criteria)?.id(node_id)),
        }
    }
}

impl ValueSink for Setter {
    fn write(&self, value: &CharacteristicValue) -> Result<()> {
        self.context.readiness.check()?;

        let raw = self.filter.apply(self.name, value)?;
        let value_id = self.target()?;
        tracing::debug!("Set {}: {} -> {} = {}", self.name, value, value_id, raw);
        self.context.driver.set_value(value_id, raw);
        Ok(())
    }
}

// ============================================================================
// Change notification
// ============================================================================

/// Push `value` unless the characteristic already shows it
pub(crate) fn push_if_changed(characteristic: &Characteristic, value: CharacteristicValue) -> bool {
    if characteristic.value().as_ref() == Some(&value) {
        tracing::trace!("{} unchanged at {}, not pushing", characteristic.name(), value);
        return false;
    }
    tracing::info!("{} changed from outside: {}", characteristic.name(), value);
    characteristic.update_value(value);
    true
}

/// Push filtered device changes of one value into a characteristic
///
/// Only values that differ from the characteristic's last-known value are
/// pushed, which absorbs the device's confirmation of a local set and raw
/// changes that filter to the same result.
pub fn bind_change_notification(
    context: &Arc<BindingContext>,
    characteristic: &Arc<Characteristic>,
    criteria: ValueCriteria,
    filter: GetFilter,
) {
    let target: Weak<Characteristic> = Arc::downgrade(characteristic);

    if let Some(value_id) = criteria.exact_id(context.node_id) {
        context.session.bus().on_value_changed(value_id, move |change| {
            if let Some(characteristic) = target.upgrade() {
                push_filtered(&characteristic, &filter, change);
            }
        });
        return;
    }

    let context_ref: Weak<BindingContext> = Arc::downgrade(context);
    context.session.bus().on_node_value_changed(context.node_id, move |change| {
        if !criteria.matches_id(&change.value_id) {
            return;
        }
        let (Some(characteristic), Some(context)) = (target.upgrade(), context_ref.upgrade()) else {
            return;
        };
        match context.session.find_value(context.node_id, &criteria) {
            Ok(value) if value.id(context.node_id) == change.value_id => {
                push_filtered(&characteristic, &filter, change);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(
                "Dropping change of {} for {}: {}",
                change.value_id,
                characteristic.name(),
                e
            ),
        }
    });
}

fn push_filtered(characteristic: &Characteristic, filter: &GetFilter, change: &ValueChange) {
    match filter.apply(characteristic.name(), &change.current) {
        Ok(value) => {
            push_if_changed(characteristic, value);
        }
        Err(e) => tracing::warn!("Dropping change of {}: {}", change.value_id, e),
    }
}

/// Wire get, set and change notification for one binding
pub fn bind(context: &Arc<BindingContext>, characteristic: &Arc<Characteristic>, binding: &ValueBinding) {
    let name = characteristic.name();

    let resolver = make_resolver(context, binding.criteria);
    characteristic.set_source(Arc::new(make_getter(name, resolver, binding.get.clone())));

    if let Some(set) = &binding.set {
        characteristic.set_sink(Arc::new(make_setter(context, name, binding.criteria, set.clone())));
    }

    bind_change_notification(context, characteristic, binding.criteria, binding.get.clone());
}

impl std::fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingContext")
            .field("node_id", &self.node_id)
            .field("ready", &self.readiness.is_ready())
            .finish()
    }
}
