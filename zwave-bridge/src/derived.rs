//! Characteristics computed from more than one device value
//!
//! Battery state is the case that needs this: "low battery" depends on the
//! battery level, the device's low-battery threshold and whether the device
//! currently runs on battery at all. A [`DerivedBinding`] listens to its
//! node, recomputes once per change of any contributing value, and pushes
//! only when the computed result differs from the characteristic's
//! last-known value.

use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use zwave_state::{RawValue, ValueCriteria, ValueId};

use crate::binding::{make_resolver, push_if_changed, BindingContext};
use crate::characteristic::{Characteristic, CharacteristicKind, CharacteristicValue, ChargingState, ValueSource};
use crate::error::{BindingError, Result};

/// Where the low-battery threshold comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdSource {
    /// A fixed percentage
    Fixed(f64),
    /// A device value, usually a configuration parameter
    Value(ValueCriteria),
}

/// Device values feeding the battery characteristics
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryInputs {
    pub level: ValueCriteria,
    /// `None` for devices that only ever run on battery
    pub power_mode: Option<ValueCriteria>,
    pub threshold: ThresholdSource,
    /// Power-mode text containing this means "running on battery"
    pub battery_keyword: String,
    /// Percentage points above the threshold at which to start warning
    pub warning_margin: f64,
}

/// How a derived characteristic is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedRule {
    LowBattery,
    Charging,
}

/// Description of a many-to-one characteristic binding
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedBinding {
    pub kind: CharacteristicKind,
    pub rule: DerivedRule,
    pub inputs: BatteryInputs,
}

impl DerivedBinding {
    /// Whether a change of `value_id` affects this binding
    pub fn depends_on(&self, value_id: &ValueId) -> bool {
        self.contributing().iter().any(|criteria| criteria.matches_id(value_id))
    }

    /// Criteria whose changes trigger a recomputation
    pub fn contributing(&self) -> Vec<ValueCriteria> {
        let mut criteria = Vec::new();
        match self.rule {
            DerivedRule::LowBattery => {
                criteria.push(self.inputs.level);
                if let ThresholdSource::Value(threshold) = &self.inputs.threshold {
                    criteria.push(*threshold);
                }
                criteria.extend(self.inputs.power_mode);
            }
            DerivedRule::Charging => criteria.extend(self.inputs.power_mode),
        }
        criteria
    }

    fn compute(&self, context: &Arc<BindingContext>) -> Result<CharacteristicValue> {
        let name = self.kind.name();
        match self.rule {
            DerivedRule::LowBattery => {
                let level = number(name, make_resolver(context, self.inputs.level).resolve()?)?;
                let threshold = match &self.inputs.threshold {
                    ThresholdSource::Fixed(threshold) => *threshold,
                    ThresholdSource::Value(criteria) => {
                        number(name, make_resolver(context, *criteria).resolve()?)?
                    }
                };
                let on_battery = self.on_battery(context)?.unwrap_or(true);
                let low = on_battery && level <= threshold + self.inputs.warning_margin;
                Ok(CharacteristicValue::Bool(low))
            }
            DerivedRule::Charging => {
                let state = match self.on_battery(context)? {
                    None => ChargingState::NotChargeable,
                    Some(true) => ChargingState::NotCharging,
                    Some(false) => ChargingState::Charging,
                };
                Ok(state.into())
            }
        }
    }

    fn on_battery(&self, context: &Arc<BindingContext>) -> Result<Option<bool>> {
        let Some(criteria) = self.inputs.power_mode else {
            return Ok(None);
        };
        let mode = make_resolver(context, criteria).resolve()?;
        let text = mode.as_text().ok_or(BindingError::UnexpectedValue {
            characteristic: self.kind.name(),
            expected: "text",
            found: mode.kind(),
        })?;
        Ok(Some(
            text.to_lowercase()
                .contains(&self.inputs.battery_keyword.to_lowercase()),
        ))
    }
}

fn number(characteristic: &'static str, raw: RawValue) -> Result<f64> {
    raw.as_number().ok_or(BindingError::UnexpectedValue {
        characteristic,
        expected: "number",
        found: raw.kind(),
    })
}

/// Get hook for a derived characteristic
struct DerivedGetter {
    context: Arc<BindingContext>,
    binding: DerivedBinding,
}

impl ValueSource for DerivedGetter {
    fn read(&self) -> Result<CharacteristicValue> {
        self.context.readiness.check()?;
        self.binding.compute(&self.context)
    }
}

/// Wire a derived characteristic: get hook plus one node listener that
/// recomputes when a contributing value changes
pub fn bind_derived(context: &Arc<BindingContext>, characteristic: &Arc<Characteristic>, binding: &DerivedBinding) {
    characteristic.set_source(Arc::new(DerivedGetter {
        context: Arc::clone(context),
        binding: binding.clone(),
    }));

    let target: Weak<Characteristic> = Arc::downgrade(characteristic);
    let context_for_listener = Arc::downgrade(context);
    let binding = binding.clone();

    context.session.bus().on_node_value_changed(context.node_id, move |change| {
        if !binding.depends_on(&change.value_id) {
            return;
        }
        let (Some(characteristic), Some(context)) = (target.upgrade(), context_for_listener.upgrade()) else {
            return;
        };
        match binding.compute(&context) {
            Ok(value) => {
                push_if_changed(&characteristic, value);
            }
            Err(e) if context.is_ready() => tracing::warn!(
                "Cannot recompute {} after change of {}: {}",
                characteristic.name(),
                change.value_id,
                e
            ),
            // Inputs may still be arriving while the node is discovered
            Err(e) => tracing::debug!(
                "Cannot recompute {} after change of {}: {}",
                characteristic.name(),
                change.value_id,
                e
            ),
        }
    });
}
