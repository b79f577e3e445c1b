//! The `dfl_h128` model: 128x128 faces through an 8x8 latent bottleneck.
//!
//! When a mask type is configured, each decoder carries a second sigmoid
//! head producing a single-channel mask alongside the face.

use crate::config::ResolvedConfig;
use crate::core::SwapResult;
use crate::model::compose::{Identity, ModelDefinition, TrainingDataDescriptor};
use crate::model::graph::{Initializer, Layer, SubNetwork, TensorShape};
use crate::model::masks::MaskType;

/// Architecture parameters for the `dfl_h128` model, read from the
/// resolved configuration snapshot.
#[derive(Debug, Clone)]
pub struct DflH128 {
    lowmem: bool,
    initializer: Initializer,
    mask_type: Option<MaskType>,
    preview_images: usize,
}

impl DflH128 {
    /// Reads the model parameters from a resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a required option is missing or of the wrong
    /// type, or if the configured mask type identifier is unknown.
    pub fn from_config(config: &ResolvedConfig) -> SwapResult<Self> {
        let lowmem = config.get_bool("model.dfl_h128", "lowmem")?;
        let icnr_init = config.get_bool("global", "icnr_init")?;
        let conv_aware_init = config.get_bool("global", "conv_aware_init")?;
        let mask_type = MaskType::from_identifier(config.get_str("global", "mask_type")?)?;
        let preview_images = config.get_int("trainer.original", "preview_images")? as usize;
        Ok(Self {
            lowmem,
            initializer: Initializer::from_flags(icnr_init, conv_aware_init),
            mask_type,
            preview_images,
        })
    }

    fn encoder_dim(&self) -> usize {
        if self.lowmem {
            256
        } else {
            512
        }
    }
}

impl ModelDefinition for DflH128 {
    fn name(&self) -> &str {
        "dfl_h128"
    }

    fn input_shape(&self) -> TensorShape {
        TensorShape::new(128, 128, 3)
    }

    fn build_encoder(&self) -> SwapResult<SubNetwork> {
        let dim = self.encoder_dim();
        SubNetwork::build(
            "dfl_h128_encoder",
            self.input_shape(),
            vec![
                Layer::Conv { filters: 128 },
                Layer::Conv { filters: 256 },
                Layer::Conv { filters: 512 },
                Layer::Conv { filters: 1024 },
                Layer::Flatten,
                Layer::Dense { units: dim },
                Layer::Dense { units: 8 * 8 * dim },
                Layer::Reshape {
                    shape: TensorShape::new(8, 8, dim),
                },
                Layer::Upscale { filters: dim },
            ],
            vec![],
            self.initializer,
        )
    }

    fn build_decoder(&self, identity: Identity) -> SwapResult<SubNetwork> {
        let dim = self.encoder_dim();
        let mut heads = vec![Layer::ConvOut { channels: 3 }];
        if self.mask_type.is_some() {
            heads.push(Layer::ConvOut { channels: 1 });
        }
        SubNetwork::build(
            format!("dfl_h128_decoder_{}", identity.label()),
            TensorShape::new(16, 16, dim),
            vec![
                Layer::Upscale { filters: dim },
                Layer::Upscale { filters: dim / 2 },
                Layer::Upscale { filters: dim / 4 },
            ],
            heads,
            self.initializer,
        )
    }

    fn training_data(&self) -> TrainingDataDescriptor {
        TrainingDataDescriptor {
            mask_type: self.mask_type,
            preview_images: self.preview_images,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigRegistry, OptionValue};
    use crate::model::compose::compose;
    use std::sync::Arc;

    #[test]
    fn test_dfl_h128_composes_with_defaults() {
        let registry = ConfigRegistry::build().unwrap();
        let model = DflH128::from_config(&registry.resolve()).unwrap();
        let composed = compose(&model).unwrap();
        assert_eq!(
            composed.encoder().input_shape(),
            TensorShape::new(128, 128, 3)
        );
        assert_eq!(
            composed.encoder().output_shapes(),
            &[TensorShape::new(16, 16, 512)]
        );
        assert_eq!(
            composed.predictor_a().output_shapes(),
            &[TensorShape::new(128, 128, 3)]
        );
    }

    #[test]
    fn test_encoder_is_shared_between_identities() {
        let registry = ConfigRegistry::build().unwrap();
        let model = DflH128::from_config(&registry.resolve()).unwrap();
        let composed = compose(&model).unwrap();
        assert!(Arc::ptr_eq(
            composed.predictor_a().encoder(),
            composed.predictor_b().encoder()
        ));
    }

    #[test]
    fn test_lowmem_and_mask_variant() {
        let mut registry = ConfigRegistry::build().unwrap();
        registry
            .set("model.dfl_h128", "lowmem", OptionValue::Bool(true))
            .unwrap();
        registry
            .set("global", "mask_type", OptionValue::Str("dfl_full".to_string()))
            .unwrap();
        let model = DflH128::from_config(&registry.resolve()).unwrap();
        let composed = compose(&model).unwrap();
        assert_eq!(
            composed.encoder().output_shapes(),
            &[TensorShape::new(16, 16, 256)]
        );
        assert_eq!(
            composed.predictor_a().output_shapes(),
            &[TensorShape::new(128, 128, 3), TensorShape::new(128, 128, 1)]
        );
        assert_eq!(composed.training_data().mask_type, Some(MaskType::DflFull));
    }

    #[test]
    fn test_preview_count_follows_trainer_config() {
        let mut registry = ConfigRegistry::build().unwrap();
        registry
            .set("trainer.original", "preview_images", OptionValue::Int(6))
            .unwrap();
        let model = DflH128::from_config(&registry.resolve()).unwrap();
        assert_eq!(model.training_data().preview_images, 6);
    }
}
