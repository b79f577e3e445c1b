//! # idswap
//!
//! Building blocks for identity-swapping image pipelines: a typed plugin
//! configuration registry, dual-identity autoencoder composition with a
//! shared encoder, and post-swap color adjustment.
//!
//! ## Components
//!
//! - **Configuration registry**: typed, validated plugin options with a
//!   human-editable persisted form
//! - **Model composition**: encoder/decoder graph descriptions assembled
//!   into two predictor paths sharing one encoder
//! - **Processors**: masked color distribution matching for swapped faces
//!
//! ## Modules
//!
//! * [`config`] - Option types, plugin defaults, and the registry
//! * [`core`] - Error types and validation helpers
//! * [`model`] - Sub-network graphs and dual-identity composition
//! * [`processors`] - Post-swap frame processors
//! * [`utils`] - Image/tensor boundary conversions
//!
//! ## Quick Start
//!
//! ```rust
//! use idswap::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Build the registry with every built-in plugin registered.
//! let mut registry = ConfigRegistry::build()?;
//! registry.set("global", "mask_type", OptionValue::Str("components".into()))?;
//!
//! // Snapshot the configuration and compose a model from it.
//! let config = registry.resolve();
//! let model = DflH128::from_config(&config)?;
//! let composed = compose(&model)?;
//! assert_eq!(composed.predictor_a().output_shapes().len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod model;
pub mod processors;
pub mod utils;

/// Commonly used types, re-exported for convenient glob import.
pub mod prelude {
    pub use crate::config::{
        ConfigOption, ConfigRegistry, ConfigSection, OptionKind, OptionValue, PluginType,
        ResolvedConfig,
    };
    pub use crate::core::{SwapError, SwapResult};
    pub use crate::model::{
        compose, ComposedModel, DflH128, Identity, MaskType, ModelDefinition, Original,
        PredictorGraph, SubNetwork, TensorShape, TrainingDataDescriptor,
    };
    pub use crate::processors::match_color_distribution;
    pub use crate::utils::{array_to_image, image_to_array};
}
