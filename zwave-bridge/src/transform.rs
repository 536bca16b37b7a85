//! Value transforms between device and accessory representations
//!
//! Each binding carries one [`GetFilter`] (raw device value → characteristic
//! value) and optionally one [`SetFilter`] (characteristic value → raw device
//! value). The variants are data, so a binding can be inspected, logged and
//! tested without running it.

use serde::{Deserialize, Serialize};
use zwave_state::RawValue;

use crate::characteristic::CharacteristicValue;
use crate::error::{BindingError, Result};

/// Highest level a multilevel switch reports
pub const MAX_LEVEL: f64 = 99.0;

/// Level a multilevel switch treats as "restore the previous level"
pub const RESTORE_LEVEL: f64 = 255.0;

/// Device → characteristic transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum GetFilter {
    /// Booleans stay booleans, numbers become floats
    Identity,
    /// Booleans, or numbers as non-zero
    Boolean,
    /// Numbers as floats
    Number,
    /// Numbers rounded to integers
    Integer,
    /// Numbers clamped to a lower bound
    AtLeast { min: f64 },
    /// Numbers strictly above a threshold, as a boolean
    Above { threshold: f64 },
    /// Text containing a keyword (case-insensitive), as a boolean
    Contains { keyword: String },
    /// Multilevel switch level 0–99 as a 0–100 percentage
    Level,
}

/// Characteristic → device transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum SetFilter {
    Identity,
    Boolean,
    /// Percentage 0–100 as multilevel switch level 0–99
    Level,
    /// On/off as "restore previous level" or 0
    OnLevel,
}

impl GetFilter {
    pub fn apply(&self, characteristic: &'static str, raw: &RawValue) -> Result<CharacteristicValue> {
        let unexpected = |expected: &'static str| BindingError::UnexpectedValue {
            characteristic,
            expected,
            found: raw.kind(),
        };

        let value = match (self, raw) {
            (GetFilter::Identity, RawValue::Bool(b)) => CharacteristicValue::Bool(*b),
            (GetFilter::Identity, RawValue::Number(n)) => CharacteristicValue::Float(*n),
            (GetFilter::Identity, _) => return Err(unexpected("bool or number")),

            (GetFilter::Boolean, RawValue::Bool(b)) => CharacteristicValue::Bool(*b),
            (GetFilter::Boolean, RawValue::Number(n)) => CharacteristicValue::Bool(*n != 0.0),
            (GetFilter::Boolean, _) => return Err(unexpected("bool or number")),

            (GetFilter::Number, RawValue::Number(n)) => CharacteristicValue::Float(*n),
            (GetFilter::Number, RawValue::Bool(b)) => CharacteristicValue::Float(if *b { 1.0 } else { 0.0 }),
            (GetFilter::Number, _) => return Err(unexpected("number")),

            (GetFilter::Integer, RawValue::Number(n)) => CharacteristicValue::Int(n.round() as i64),
            (GetFilter::Integer, _) => return Err(unexpected("number")),

            (GetFilter::AtLeast { min }, RawValue::Number(n)) => CharacteristicValue::Float(n.max(*min)),
            (GetFilter::AtLeast { .. }, _) => return Err(unexpected("number")),

            (GetFilter::Above { threshold }, RawValue::Number(n)) => CharacteristicValue::Bool(*n > *threshold),
            (GetFilter::Above { .. }, _) => return Err(unexpected("number")),

            (GetFilter::Contains { keyword }, RawValue::Text(text)) => {
                CharacteristicValue::Bool(contains_ignore_case(text, keyword))
            }
            (GetFilter::Contains { .. }, RawValue::Bool(b)) => CharacteristicValue::Bool(*b),
            (GetFilter::Contains { .. }, RawValue::Number(n)) => CharacteristicValue::Bool(*n != 0.0),

            (GetFilter::Level, RawValue::Number(n)) => CharacteristicValue::Int(level_to_percent(*n)),
            (GetFilter::Level, _) => return Err(unexpected("number")),
        };

        Ok(value)
    }
}

impl SetFilter {
    pub fn apply(&self, characteristic: &'static str, value: &CharacteristicValue) -> Result<RawValue> {
        let unexpected = |expected: &'static str| BindingError::UnexpectedValue {
            characteristic,
            expected,
            found: value.kind(),
        };

        let raw = match (self, value) {
            (SetFilter::Identity, CharacteristicValue::Bool(b)) => RawValue::Bool(*b),
            (SetFilter::Identity, other) => RawValue::Number(other.as_f64().ok_or_else(|| unexpected("number"))?),

            (SetFilter::Boolean, CharacteristicValue::Bool(b)) => RawValue::Bool(*b),
            (SetFilter::Boolean, other) => {
                RawValue::Bool(other.as_f64().ok_or_else(|| unexpected("bool"))? != 0.0)
            }

            (SetFilter::Level, CharacteristicValue::Bool(_)) => return Err(unexpected("percentage")),
            (SetFilter::Level, other) => {
                let percent = other.as_f64().ok_or_else(|| unexpected("percentage"))?;
                RawValue::Number(percent_to_level(percent))
            }

            (SetFilter::OnLevel, CharacteristicValue::Bool(true)) => RawValue::Number(RESTORE_LEVEL),
            (SetFilter::OnLevel, CharacteristicValue::Bool(false)) => RawValue::Number(0.0),
            (SetFilter::OnLevel, _) => return Err(unexpected("bool")),
        };

        Ok(raw)
    }
}

fn contains_ignore_case(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(&keyword.to_lowercase())
}

// 0–98 map straight through; the top level 99 is reported as 100%
fn level_to_percent(level: f64) -> i64 {
    let level = level.round().clamp(0.0, MAX_LEVEL);
    if level >= MAX_LEVEL {
        100
    } else {
        level as i64
    }
}

fn percent_to_level(percent: f64) -> f64 {
    percent.round().clamp(0.0, MAX_LEVEL)
}
