//! Capability catalogue
//!
//! A capability is a feature an accessory offers (a switch, a temperature
//! sensor, a battery). Each one expands into the characteristic bindings it
//! needs, with protocol defaults for the device values that can be
//! overridden per accessory in the configuration.

use serde::{Deserialize, Serialize};
use zwave_state::{CommandClass, ValueCriteria};

use crate::binding::ValueBinding;
use crate::characteristic::CharacteristicKind;
use crate::derived::{BatteryInputs, DerivedBinding, DerivedRule, ThresholdSource};
use crate::transform::{GetFilter, SetFilter};

/// Lower bound for ambient light level characteristics
pub const MIN_LIGHT_LEVEL: f64 = 0.0001;

fn default_true() -> bool {
    true
}

fn default_warning_margin() -> f64 {
    10.0
}

/// One capability of an accessory, as configured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Capability {
    Switch {
        #[serde(default)]
        value: Option<ValueCriteria>,
    },
    Dimmer {
        #[serde(default)]
        value: Option<ValueCriteria>,
    },
    PowerInUse {
        #[serde(default)]
        value: Option<ValueCriteria>,
        /// Watts above which the outlet counts as in use
        #[serde(default)]
        threshold: f64,
    },
    Temperature {
        #[serde(default)]
        value: Option<ValueCriteria>,
    },
    LightLevel {
        #[serde(default)]
        value: Option<ValueCriteria>,
    },
    Humidity {
        #[serde(default)]
        value: Option<ValueCriteria>,
    },
    Contact {
        #[serde(default)]
        value: Option<ValueCriteria>,
    },
    Motion {
        #[serde(default)]
        value: Option<ValueCriteria>,
        #[serde(default)]
        tamper: Option<ValueCriteria>,
        #[serde(default)]
        tamper_keyword: Option<String>,
    },
    Smoke {
        #[serde(default)]
        value: Option<ValueCriteria>,
        #[serde(default)]
        keyword: Option<String>,
    },
    Leak {
        #[serde(default)]
        value: Option<ValueCriteria>,
        #[serde(default)]
        keyword: Option<String>,
    },
    Battery {
        #[serde(default)]
        level: Option<ValueCriteria>,
        /// Devices that cannot be plugged in have no power-mode value
        #[serde(default = "default_true")]
        rechargeable: bool,
        #[serde(default)]
        power_mode: Option<ValueCriteria>,
        #[serde(default)]
        threshold: Option<ThresholdSource>,
        #[serde(default)]
        battery_keyword: Option<String>,
        #[serde(default = "default_warning_margin")]
        warning_margin: f64,
    },
}

/// A characteristic binding a capability needs
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedBinding {
    Value(ValueBinding),
    Derived(DerivedBinding),
}

impl PlannedBinding {
    pub fn kind(&self) -> CharacteristicKind {
        match self {
            PlannedBinding::Value(binding) => binding.kind,
            PlannedBinding::Derived(binding) => binding.kind,
        }
    }
}

fn at(class: CommandClass, index: u16) -> ValueCriteria {
    ValueCriteria::new(class).index(index)
}

fn keyword(configured: &Option<String>, default: &str) -> String {
    configured.clone().unwrap_or_else(|| default.to_string())
}

impl Capability {
    /// Short name used in logs and validation messages
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Switch { .. } => "switch",
            Capability::Dimmer { .. } => "dimmer",
            Capability::PowerInUse { .. } => "power_in_use",
            Capability::Temperature { .. } => "temperature",
            Capability::LightLevel { .. } => "light_level",
            Capability::Humidity { .. } => "humidity",
            Capability::Contact { .. } => "contact",
            Capability::Motion { .. } => "motion",
            Capability::Smoke { .. } => "smoke",
            Capability::Leak { .. } => "leak",
            Capability::Battery { .. } => "battery",
        }
    }

    /// Keywords this capability matches against, for validation
    pub fn keywords(&self) -> Vec<&str> {
        match self {
            Capability::Motion { tamper_keyword, .. } => tamper_keyword.as_deref().into_iter().collect(),
            Capability::Smoke { keyword, .. } | Capability::Leak { keyword, .. } => {
                keyword.as_deref().into_iter().collect()
            }
            Capability::Battery { battery_keyword, .. } => battery_keyword.as_deref().into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Expand into characteristic bindings
    pub fn plan(&self) -> Vec<PlannedBinding> {
        use CharacteristicKind as K;
        use PlannedBinding::Value as V;

        match self {
            Capability::Switch { value } => vec![V(ValueBinding::writable(
                K::On,
                value.unwrap_or(at(CommandClass::SWITCH_BINARY, 0)),
                GetFilter::Boolean,
                SetFilter::Boolean,
            ))],
            Capability::Dimmer { value } => {
                let criteria = value.unwrap_or(at(CommandClass::SWITCH_MULTILEVEL, 0));
                vec![
                    V(ValueBinding::writable(
                        K::On,
                        criteria,
                        GetFilter::Above { threshold: 0.0 },
                        SetFilter::OnLevel,
                    )),
                    V(ValueBinding::writable(K::Brightness, criteria, GetFilter::Level, SetFilter::Level)),
                ]
            }
            Capability::PowerInUse { value, threshold } => vec![V(ValueBinding::read_only(
                K::OutletInUse,
                value.unwrap_or(at(CommandClass::METER, 2)),
                GetFilter::Above {
                    threshold: *threshold,
                },
            ))],
            Capability::Temperature { value } => vec![V(ValueBinding::read_only(
                K::CurrentTemperature,
                value.unwrap_or(at(CommandClass::SENSOR_MULTILEVEL, 1)),
                GetFilter::Number,
            ))],
            Capability::LightLevel { value } => vec![V(ValueBinding::read_only(
                K::CurrentAmbientLightLevel,
                value.unwrap_or(at(CommandClass::SENSOR_MULTILEVEL, 3)),
                GetFilter::AtLeast { min: MIN_LIGHT_LEVEL },
            ))],
            Capability::Humidity { value } => vec![V(ValueBinding::read_only(
                K::CurrentRelativeHumidity,
                value.unwrap_or(at(CommandClass::SENSOR_MULTILEVEL, 5)),
                GetFilter::Number,
            ))],
            Capability::Contact { value } => vec![V(ValueBinding::read_only(
                K::ContactSensorState,
                value.unwrap_or(at(CommandClass::SENSOR_BINARY, 0)),
                GetFilter::Boolean,
            ))],
            Capability::Motion {
                value,
                tamper,
                tamper_keyword,
            } => vec![
                V(ValueBinding::read_only(
                    K::MotionDetected,
                    value.unwrap_or(at(CommandClass::SENSOR_BINARY, 0)),
                    GetFilter::Boolean,
                )),
                V(ValueBinding::read_only(
                    K::StatusTampered,
                    tamper.unwrap_or(at(CommandClass::ALARM, 10)),
                    GetFilter::Contains {
                        keyword: keyword(tamper_keyword, "Tamper"),
                    },
                )),
            ],
            Capability::Smoke { value, keyword: kw } => vec![V(ValueBinding::read_only(
                K::SmokeDetected,
                value.unwrap_or(at(CommandClass::ALARM, 1)),
                GetFilter::Contains {
                    keyword: keyword(kw, "Smoke"),
                },
            ))],
            Capability::Leak { value, keyword: kw } => vec![V(ValueBinding::read_only(
                K::LeakDetected,
                value.unwrap_or(at(CommandClass::ALARM, 5)),
                GetFilter::Contains {
                    keyword: keyword(kw, "Water"),
                },
            ))],
            Capability::Battery {
                level,
                rechargeable,
                power_mode,
                threshold,
                battery_keyword,
                warning_margin,
            } => {
                let inputs = BatteryInputs {
                    level: level.unwrap_or(at(CommandClass::BATTERY, 0)),
                    power_mode: rechargeable.then(|| power_mode.unwrap_or(at(CommandClass::CONFIGURATION, 9))),
                    threshold: threshold
                        .clone()
                        .unwrap_or(ThresholdSource::Value(at(CommandClass::CONFIGURATION, 39))),
                    battery_keyword: keyword(battery_keyword, "Battery"),
                    warning_margin: *warning_margin,
                };
                vec![
                    V(ValueBinding::read_only(K::BatteryLevel, inputs.level, GetFilter::Integer)),
                    PlannedBinding::Derived(DerivedBinding {
                        kind: K::ChargingState,
                        rule: DerivedRule::Charging,
                        inputs: inputs.clone(),
                    }),
                    PlannedBinding::Derived(DerivedBinding {
                        kind: K::StatusLowBattery,
                        rule: DerivedRule::LowBattery,
                        inputs,
                    }),
                ]
            }
        }
    }
}
