//! Facial-region mask conventions.
//!
//! The mask type selects which facial-region convention rasterizes the
//! mask channel during training. The registry's `mask_type` choice list is
//! derived from [`available_masks`], so an unrecognized identifier is
//! rejected long before model composition runs.

use serde::{Deserialize, Serialize};

use crate::core::{SwapError, SwapResult};

/// A facial-region mask convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskType {
    /// Face hull built from eight facial parts.
    Components,
    /// Face hull built from three facial parts.
    DflFull,
    /// Components mask with the eyebrow points extended up the forehead.
    Extended,
    /// Face cutout based on landmarks.
    Facehull,
}

impl MaskType {
    /// Returns the configuration identifier for this mask type.
    pub fn identifier(&self) -> &'static str {
        match self {
            MaskType::Components => "components",
            MaskType::DflFull => "dfl_full",
            MaskType::Extended => "extended",
            MaskType::Facehull => "facehull",
        }
    }

    /// Parses a configuration identifier.
    ///
    /// `"none"` resolves to `None` (no mask output in the decoder graph).
    /// The registry validates `mask_type` against [`available_masks`], so
    /// this only fails on values that bypassed the registry.
    pub fn from_identifier(identifier: &str) -> SwapResult<Option<MaskType>> {
        match identifier {
            "none" => Ok(None),
            "components" => Ok(Some(MaskType::Components)),
            "dfl_full" => Ok(Some(MaskType::DflFull)),
            "extended" => Ok(Some(MaskType::Extended)),
            "facehull" => Ok(Some(MaskType::Facehull)),
            other => Err(SwapError::invalid_input(format!(
                "unknown mask type '{}'",
                other
            ))),
        }
    }
}

/// Returns the identifiers of the available mask conventions, `"none"`
/// included. This is the choice set for the global `mask_type` option.
pub fn available_masks() -> Vec<&'static str> {
    vec!["none", "components", "dfl_full", "extended", "facehull"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_available_mask_parses() {
        for identifier in available_masks() {
            let parsed = MaskType::from_identifier(identifier).unwrap();
            match identifier {
                "none" => assert!(parsed.is_none()),
                other => assert_eq!(parsed.unwrap().identifier(), other),
            }
        }
    }

    #[test]
    fn test_unknown_identifier_rejected() {
        assert!(MaskType::from_identifier("blurred").is_err());
    }
}
