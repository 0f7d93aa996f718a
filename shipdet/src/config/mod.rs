//! Named-property configuration surface for CLI and GUI glue.
//!
//! Properties are plain scalars addressed by name. A handler either accepts a
//! name, rejects its value with a [`ConfigError`], or reports it as
//! [`PropertyOutcome::Unhandled`] so an outer layer can try it. Semantic
//! validation happens once, when the immutable detection structs are built.


mod properties;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub use properties::DetectionProperties;

/// Scalar property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Int(i64),
    Real(f64),
    Text(String),
}

impl PropertyValue {
    /// Parses user text: integer first, then real, otherwise text.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            Self::Int(value)
        } else if let Ok(value) = trimmed.parse::<f64>() {
            Self::Real(value)
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    pub fn as_int(&self, name: &'static str) -> Result<i64, ConfigError> {
        match self {
            Self::Int(value) => Ok(*value),
            _ => Err(ConfigError::TypeMismatch {
                name,
                expected: "an integer",
            }),
        }
    }

    /// Integers widen to reals.
    pub fn as_real(&self, name: &'static str) -> Result<f64, ConfigError> {
        match self {
            Self::Int(value) => Ok(*value as f64),
            Self::Real(value) => Ok(*value),
            Self::Text(_) => Err(ConfigError::TypeMismatch {
                name,
                expected: "a number",
            }),
        }
    }

    pub fn as_bool(&self, name: &'static str) -> Result<bool, ConfigError> {
        match self {
            Self::Int(0) => Ok(false),
            Self::Int(1) => Ok(true),
            Self::Text(text) if text.eq_ignore_ascii_case("true") => Ok(true),
            Self::Text(text) if text.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(ConfigError::TypeMismatch {
                name,
                expected: "a boolean",
            }),
        }
    }

    /// Non-negative integer that fits in `T`.
    pub(crate) fn as_unsigned<T: TryFrom<i64>>(&self, name: &'static str) -> Result<T, ConfigError> {
        let value = self.as_int(name)?;
        T::try_from(value).map_err(|_| ConfigError::OutOfRange { name, value })
    }

    /// Enum selector given by name or by its index in `variants`.
    pub(crate) fn as_variant<T: FromStr + Copy>(
        &self,
        name: &'static str,
        variants: &[T],
    ) -> Result<T, ConfigError> {
        match self {
            Self::Text(text) => T::from_str(text).map_err(|_| ConfigError::UnknownVariant {
                name,
                value: text.clone(),
            }),
            Self::Int(index) => usize::try_from(*index)
                .ok()
                .and_then(|i| variants.get(i).copied())
                .ok_or(ConfigError::OutOfRange {
                    name,
                    value: *index,
                }),
            Self::Real(_) => Err(ConfigError::TypeMismatch {
                name,
                expected: "a variant name or index",
            }),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Whether a handler recognised a property name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyOutcome {
    Handled,
    Unhandled,
}

/// Settable, gettable, enumerable named properties.
pub trait PropertyHandler {
    /// Stores `value` under `name`. Unknown names are [`PropertyOutcome::Unhandled`].
    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<PropertyOutcome, ConfigError>;

    fn property(&self, name: &str) -> Option<PropertyValue>;

    fn property_names(&self) -> Vec<&'static str>;
}

/// Properties every filter stage carries regardless of its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseProperties {
    /// When false the stage passes upstream tiles through untouched.
    pub enabled: bool,
}

impl Default for BaseProperties {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl PropertyHandler for BaseProperties {
    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<PropertyOutcome, ConfigError> {
        match name {
            "enabled" => {
                self.enabled = value.as_bool("enabled")?;
                Ok(PropertyOutcome::Handled)
            }
            _ => Ok(PropertyOutcome::Unhandled),
        }
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "enabled" => Some(PropertyValue::Int(self.enabled as i64)),
            _ => None,
        }
    }

    fn property_names(&self) -> Vec<&'static str> {
        vec!["enabled"]
    }
}
