//! Resolved configuration snapshots.
//!
//! The model composition engine does not read the live registry; it
//! consumes an immutable `section -> title -> value` snapshot taken once
//! before graph construction. This keeps composition independent of any
//! later (caller-serialized) edits to the registry.

use std::collections::BTreeMap;

use crate::config::option::OptionValue;
use crate::config::registry::ConfigRegistry;
use crate::core::{SwapError, SwapResult};

/// An immutable snapshot of every section's current option values.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    sections: BTreeMap<String, BTreeMap<String, OptionValue>>,
}

impl ResolvedConfig {
    /// Snapshots the current values of a registry.
    pub fn from_registry(registry: &ConfigRegistry) -> Self {
        let sections = registry
            .sections()
            .map(|section| {
                let values = section
                    .iter()
                    .map(|opt| (opt.title().to_string(), opt.value().clone()))
                    .collect();
                (section.title().to_string(), values)
            })
            .collect();
        Self { sections }
    }

    /// Returns the value of an option.
    pub fn get(&self, section: &str, title: &str) -> SwapResult<&OptionValue> {
        let values = self
            .sections
            .get(section)
            .ok_or_else(|| SwapError::UnknownSection {
                title: section.to_string(),
            })?;
        values.get(title).ok_or_else(|| SwapError::UnknownOption {
            section: section.to_string(),
            title: title.to_string(),
        })
    }

    /// Returns a boolean option value.
    pub fn get_bool(&self, section: &str, title: &str) -> SwapResult<bool> {
        let value = self.get(section, title)?;
        value.as_bool().ok_or_else(|| {
            SwapError::invalid_value(section, title, mismatch("bool", value))
        })
    }

    /// Returns an integer option value.
    pub fn get_int(&self, section: &str, title: &str) -> SwapResult<i64> {
        let value = self.get(section, title)?;
        value.as_int().ok_or_else(|| {
            SwapError::invalid_value(section, title, mismatch("int", value))
        })
    }

    /// Returns a float option value.
    pub fn get_float(&self, section: &str, title: &str) -> SwapResult<f64> {
        let value = self.get(section, title)?;
        value.as_float().ok_or_else(|| {
            SwapError::invalid_value(section, title, mismatch("float", value))
        })
    }

    /// Returns a string option value.
    pub fn get_str(&self, section: &str, title: &str) -> SwapResult<&str> {
        let value = self.get(section, title)?;
        value.as_str().ok_or_else(|| {
            SwapError::invalid_value(section, title, mismatch("str", value))
        })
    }
}

fn mismatch(datatype: &str, value: &OptionValue) -> String {
    format!("expected {}, got {}", datatype, value.datatype())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_registry_values() {
        let mut registry = ConfigRegistry::build().unwrap();
        registry
            .set("global", "mask_type", OptionValue::Str("dfl_full".to_string()))
            .unwrap();
        let resolved = registry.resolve();
        assert_eq!(resolved.get_str("global", "mask_type").unwrap(), "dfl_full");
        assert!(!resolved.get_bool("model.dfl_h128", "lowmem").unwrap());
    }

    #[test]
    fn test_snapshot_is_immutable_across_later_edits() {
        let mut registry = ConfigRegistry::build().unwrap();
        let resolved = registry.resolve();
        registry
            .set("global", "coverage", OptionValue::Float(100.0))
            .unwrap();
        assert_eq!(resolved.get_float("global", "coverage").unwrap(), 68.75);
    }

    #[test]
    fn test_typed_getter_mismatch_is_reported() {
        let registry = ConfigRegistry::build().unwrap();
        let resolved = registry.resolve();
        let err = resolved.get_bool("global", "coverage").unwrap_err();
        assert!(err.to_string().contains("expected bool"));
    }
}
