//! The `original` model: 64x64 faces through a 4x4 latent bottleneck.

use crate::config::ResolvedConfig;
use crate::core::SwapResult;
use crate::model::compose::{Identity, ModelDefinition, TrainingDataDescriptor};
use crate::model::graph::{Initializer, Layer, SubNetwork, TensorShape};
use crate::model::masks::MaskType;

/// Architecture parameters for the `original` model, read from the
/// resolved configuration snapshot.
#[derive(Debug, Clone)]
pub struct Original {
    lowmem: bool,
    initializer: Initializer,
    mask_type: Option<MaskType>,
    preview_images: usize,
}

impl Original {
    /// Reads the model parameters from a resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a required option is missing or of the wrong
    /// type, or if the configured mask type identifier is unknown.
    pub fn from_config(config: &ResolvedConfig) -> SwapResult<Self> {
        let lowmem = config.get_bool("model.original", "lowmem")?;
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

    /// Latent dense width: halved when `lowmem` is set.
    fn encoder_dim(&self) -> usize {
        if self.lowmem {
            512
        } else {
            1024
        }
    }
}

impl ModelDefinition for Original {
    fn name(&self) -> &str {
        "original"
    }

    fn input_shape(&self) -> TensorShape {
        TensorShape::new(64, 64, 3)
    }

    fn build_encoder(&self) -> SwapResult<SubNetwork> {
        let dim = self.encoder_dim();
        SubNetwork::build(
            "original_encoder",
            self.input_shape(),
            vec![
                Layer::Conv { filters: 128 },
                Layer::Conv { filters: 256 },
                Layer::Conv { filters: 512 },
                Layer::Conv { filters: 1024 },
                Layer::Flatten,
                Layer::Dense { units: dim },
                Layer::Dense { units: 4 * 4 * dim },
                Layer::Reshape {
                    shape: TensorShape::new(4, 4, dim),
                },
                Layer::Upscale { filters: dim / 2 },
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
            format!("original_decoder_{}", identity.label()),
            TensorShape::new(8, 8, dim / 2),
            vec![
                Layer::Upscale { filters: dim / 4 },
                Layer::Upscale { filters: dim / 8 },
                Layer::Upscale { filters: dim / 16 },
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
