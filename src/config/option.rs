//! Typed configuration options.
//!
//! This module defines the tagged value and descriptor types that make up a
//! single configuration option. Each datatype carries only the constraint
//! fields it supports: numeric options carry bounds, rounding precision and
//! the fixed flag; string options carry an optional choice set; boolean
//! options carry nothing beyond their default.
//!
//! The invariant maintained throughout: an option's current value always
//! matches its descriptor's datatype, always satisfies the bounds when
//! present, and always belongs to the choice set when one is declared.
//! Values are only ever mutated through [`ConfigOption::set`], which
//! enforces all three.

use serde::{Deserialize, Serialize};

/// A runtime configuration value, tagged by datatype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptionValue {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A double-precision float.
    Float(f64),
    /// A free-form or choice-constrained string.
    Str(String),
}

impl OptionValue {
    /// Returns the datatype name of this value.
    pub fn datatype(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "bool",
            OptionValue::Int(_) => "int",
            OptionValue::Float(_) => "float",
            OptionValue::Str(_) => "str",
        }
    }

    /// Returns the boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float payload, if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            OptionValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for OptionValue {
    /// Formats the value in its persisted `key = value` text form.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionValue::Bool(v) => write!(f, "{}", v),
            OptionValue::Int(v) => write!(f, "{}", v),
            OptionValue::Float(v) => write!(f, "{}", v),
            OptionValue::Str(v) => write!(f, "{}", v),
        }
    }
}

/// The descriptor for one configuration option: its datatype tag, default
/// value, and the per-datatype constraint payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptionKind {
    /// A boolean flag.
    Bool {
        /// Default value.
        default: bool,
    },
    /// A signed integer, optionally bounded.
    Int {
        /// Default value.
        default: i64,
        /// Inclusive (min, max) bounds, if constrained.
        bounds: Option<(i64, i64)>,
        /// Step size hint for slider-style editors; not used in validation.
        rounding: Option<i64>,
        /// Whether the value is fixed once a model has been created.
        fixed: bool,
    },
    /// A double-precision float, optionally bounded and rounded.
    Float {
        /// Default value.
        default: f64,
        /// Inclusive (min, max) bounds, if constrained.
        bounds: Option<(f64, f64)>,
        /// Number of decimal digits values are rounded to on assignment.
        rounding: Option<u32>,
        /// Whether the value is fixed once a model has been created.
        fixed: bool,
    },
    /// A string, optionally restricted to a choice set.
    Str {
        /// Default value.
        default: String,
        /// Permitted values; empty means unrestricted.
        choices: Vec<String>,
    },
}

impl OptionKind {
    /// Returns the datatype name of this descriptor.
    pub fn datatype(&self) -> &'static str {
        match self {
            OptionKind::Bool { .. } => "bool",
            OptionKind::Int { .. } => "int",
            OptionKind::Float { .. } => "float",
            OptionKind::Str { .. } => "str",
        }
    }

    /// Returns the default as a runtime value.
    pub fn default_value(&self) -> OptionValue {
        match self {
            OptionKind::Bool { default } => OptionValue::Bool(*default),
            OptionKind::Int { default, .. } => OptionValue::Int(*default),
            OptionKind::Float { default, .. } => OptionValue::Float(*default),
            OptionKind::Str { default, .. } => OptionValue::Str(default.clone()),
        }
    }

    /// Returns whether this option is fixed once a model has been created.
    ///
    /// Non-numeric options are never fixed.
    pub fn is_fixed(&self) -> bool {
        match self {
            OptionKind::Int { fixed, .. } | OptionKind::Float { fixed, .. } => *fixed,
            _ => false,
        }
    }

    /// Validates a value against this descriptor and returns the normalized
    /// form (float rounding applied). Out-of-bounds numerics and strings
    /// outside the choice set are rejected, never clamped.
    ///
    /// # Errors
    ///
    /// Returns a human-readable constraint message on failure; the caller
    /// wraps it with the section/title context.
    pub fn check(&self, value: &OptionValue) -> Result<OptionValue, String> {
        match (self, value) {
            (OptionKind::Bool { .. }, OptionValue::Bool(v)) => Ok(OptionValue::Bool(*v)),
            (OptionKind::Int { bounds, .. }, OptionValue::Int(v)) => {
                if let Some((min, max)) = bounds {
                    if v < min {
                        return Err(format!("value {} below minimum {}", v, min));
                    }
                    if v > max {
                        return Err(format!("value {} above maximum {}", v, max));
                    }
                }
                Ok(OptionValue::Int(*v))
            }
            (OptionKind::Float {
                bounds, rounding, ..
            }, OptionValue::Float(v)) => {
                if !v.is_finite() {
                    return Err(format!("value must be finite, got: {}", v));
                }
                let v = match rounding {
                    Some(digits) => {
                        let factor = 10f64.powi(*digits as i32);
                        (v * factor).round() / factor
                    }
                    None => *v,
                };
                if let Some((min, max)) = bounds {
                    if v < *min {
                        return Err(format!("value {} below minimum {}", v, min));
                    }
                    if v > *max {
                        return Err(format!("value {} above maximum {}", v, max));
                    }
                }
                Ok(OptionValue::Float(v))
            }
            (OptionKind::Str { choices, .. }, OptionValue::Str(v)) => {
                if !choices.is_empty() && !choices.iter().any(|c| c == v) {
                    return Err(format!(
                        "'{}' is not one of [{}]",
                        v,
                        choices.join(", ")
                    ));
                }
                Ok(OptionValue::Str(v.clone()))
            }
            (kind, value) => Err(format!(
                "expected {}, got {}",
                kind.datatype(),
                value.datatype()
            )),
        }
    }

    /// Parses a value from its persisted text form and validates it.
    ///
    /// Booleans accept `true`/`false` case-insensitively; floats accept
    /// scientific notation. The parsed value goes through the same
    /// validation as [`OptionKind::check`].
    pub fn coerce(&self, raw: &str) -> Result<OptionValue, String> {
        let raw = raw.trim();
        let value = match self {
            OptionKind::Bool { .. } => match raw.to_ascii_lowercase().as_str() {
                "true" => OptionValue::Bool(true),
                "false" => OptionValue::Bool(false),
                _ => return Err(format!("'{}' is not a bool (expected true/false)", raw)),
            },
            OptionKind::Int { .. } => OptionValue::Int(
                raw.parse::<i64>()
                    .map_err(|_| format!("'{}' is not an int", raw))?,
            ),
            OptionKind::Float { .. } => OptionValue::Float(
                raw.parse::<f64>()
                    .map_err(|_| format!("'{}' is not a float", raw))?,
            ),
            OptionKind::Str { .. } => OptionValue::Str(raw.to_string()),
        };
        self.check(&value)
    }
}

/// A single configuration option: title, descriptor, current value, and the
/// help text shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigOption {
    title: String,
    kind: OptionKind,
    value: OptionValue,
    info: String,
}

impl ConfigOption {
    /// Creates a new option with its current value set to the default.
    ///
    /// The default itself is validated against the descriptor's own
    /// constraints, so a plugin cannot declare an out-of-bounds default.
    pub fn new(
        title: impl Into<String>,
        kind: OptionKind,
        info: impl Into<String>,
    ) -> Result<Self, String> {
        let value = kind.check(&kind.default_value())?;
        Ok(Self {
            title: title.into(),
            kind,
            value,
            info: info.into(),
        })
    }

    /// Returns the option title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the descriptor.
    pub fn kind(&self) -> &OptionKind {
        &self.kind
    }

    /// Returns the current value.
    pub fn value(&self) -> &OptionValue {
        &self.value
    }

    /// Returns the help text.
    pub fn info(&self) -> &str {
        &self.info
    }

    /// Validates and stores a new value, returning the normalized form.
    ///
    /// On error the stored value is left unchanged.
    pub fn set(&mut self, value: OptionValue) -> Result<OptionValue, String> {
        let value = self.kind.check(&value)?;
        self.value = value.clone();
        Ok(value)
    }

    /// Parses, validates and stores a value from its persisted text form.
    pub fn set_from_str(&mut self, raw: &str) -> Result<OptionValue, String> {
        let value = self.kind.coerce(raw)?;
        self.value = value.clone();
        Ok(value)
    }

    /// Resets the current value to the descriptor default.
    pub fn reset(&mut self) {
        self.value = self.kind.default_value();
    }

    /// Returns whether the current value differs from the default.
    pub fn is_modified(&self) -> bool {
        self.value != self.kind.default_value()
    }
}
