//! Dual-identity model composition.
//!
//! A swapping model is assembled from a single shared encoder and two
//! per-identity decoders. [`compose`] builds the encoder exactly once,
//! wraps it in an [`Arc`], and hands a clone of that same handle to both
//! [`PredictorGraph`]s, so the two identities train against one set of
//! encoder weights. Structural mirror checks run at composition time and
//! reject any definition whose decoder cannot reconstruct the encoder's
//! input resolution.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{SwapError, SwapResult};
use crate::model::graph::{SubNetwork, TensorShape};
use crate::model::masks::MaskType;

/// Which face identity a predictor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// The identity being learned from the "A" face set.
    A,
    /// The identity being learned from the "B" face set.
    B,
}

impl Identity {
    /// Lowercase label used in network names and log output.
    pub fn label(&self) -> &'static str {
        match self {
            Identity::A => "a",
            Identity::B => "b",
        }
    }
}

/// What the training feed must supply for a composed model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingDataDescriptor {
    /// Mask variant the feed must produce alongside each face, or `None`
    /// for mask-free training.
    pub mask_type: Option<MaskType>,
    /// Number of sample images shown in the training preview.
    pub preview_images: usize,
}

/// A model definition: how to build the encoder and a decoder, and what
/// training data the result consumes.
///
/// Implementations read their architecture parameters from the resolved
/// configuration snapshot at construction time, so a definition is
/// immutable once created.
pub trait ModelDefinition {
    /// The plugin name, e.g. `"original"` or `"dfl_h128"`.
    fn name(&self) -> &str;

    /// Face input resolution and channel count.
    fn input_shape(&self) -> TensorShape;

    /// Builds a fresh encoder network.
    fn build_encoder(&self) -> SwapResult<SubNetwork>;

    /// Builds a fresh decoder network for one identity.
    fn build_decoder(&self, identity: Identity) -> SwapResult<SubNetwork>;

    /// Describes the training data the composed model consumes.
    fn training_data(&self) -> TrainingDataDescriptor;
}

/// One identity's full face-in to face-out path: the shared encoder
/// followed by an identity-owned decoder.
#[derive(Debug)]
pub struct PredictorGraph {
    identity: Identity,
    encoder: Arc<SubNetwork>,
    decoder: SubNetwork,
}

impl PredictorGraph {
    /// The identity this predictor reconstructs.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Handle to the shared encoder. Every predictor of one composed model
    /// returns the same allocation here.
    pub fn encoder(&self) -> &Arc<SubNetwork> {
        &self.encoder
    }

    /// This identity's decoder.
    pub fn decoder(&self) -> &SubNetwork {
        &self.decoder
    }

    /// Output shapes of the full path, face first, mask second when the
    /// model is mask-conditioned.
    pub fn output_shapes(&self) -> &[TensorShape] {
        self.decoder.output_shapes()
    }
}

/// A fully composed dual-identity model.
#[derive(Debug)]
pub struct ComposedModel {
    name: String,
    encoder: Arc<SubNetwork>,
    predictor_a: PredictorGraph,
    predictor_b: PredictorGraph,
    training_data: TrainingDataDescriptor,
}

impl ComposedModel {
    /// The plugin name this model was composed from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared encoder.
    pub fn encoder(&self) -> &Arc<SubNetwork> {
        &self.encoder
    }

    /// The "A" identity predictor.
    pub fn predictor_a(&self) -> &PredictorGraph {
        &self.predictor_a
    }

    /// The "B" identity predictor.
    pub fn predictor_b(&self) -> &PredictorGraph {
        &self.predictor_b
    }

    /// What the training feed must supply.
    pub fn training_data(&self) -> &TrainingDataDescriptor {
        &self.training_data
    }

    /// Total trainable parameter count across the encoder and both
    /// decoders. The encoder is counted once.
    pub fn parameter_count(&self) -> usize {
        self.encoder.parameter_count()
            + self.predictor_a.decoder.parameter_count()
            + self.predictor_b.decoder.parameter_count()
    }
}

/// Composes a dual-identity model from a definition.
///
/// The encoder is built once and shared by reference between both
/// predictors; each decoder is built and owned independently. The
/// following structural checks run before any predictor is assembled:
///
/// - the encoder produces exactly one output, and its shape equals the
///   decoder input shape
/// - every decoder output restores the encoder's input resolution
/// - the encoder's downscaling convolutions double their channel count at
///   each step, and the decoder's upscaling stages halve theirs
/// - the total number of resolution-changing stages round-trips: the
///   decoder's upscales plus the encoder's own upscales equal the
///   encoder's downscaling convolutions
/// - both decoders are structurally identical
///
/// # Errors
///
/// Returns `GraphConstruction` naming the offending network when any
/// check fails, or propagates the failure from building a sub-network.
pub fn compose(definition: &dyn ModelDefinition) -> SwapResult<ComposedModel> {
    let name = definition.name().to_string();
    let encoder = Arc::new(definition.build_encoder()?);
    let decoder_a = definition.build_decoder(Identity::A)?;
    let decoder_b = definition.build_decoder(Identity::B)?;

    if encoder.num_outputs() != 1 {
        return Err(SwapError::graph_construction(
            encoder.name(),
            format!("encoder must have one output, found {}", encoder.num_outputs()),
        ));
    }

    if !decoder_a.same_structure(&decoder_b) {
        return Err(SwapError::graph_construction(
            decoder_b.name(),
            "decoders of the two identities differ in structure",
        ));
    }

    verify_mirror(&encoder, &decoder_a)?;

    let training_data = definition.training_data();
    debug!(
        model = %name,
        input = %encoder.input_shape(),
        latent = %encoder.output_shapes()[0],
        outputs = decoder_a.num_outputs(),
        "composed dual-identity model"
    );

    let predictor_a = PredictorGraph {
        identity: Identity::A,
        encoder: Arc::clone(&encoder),
        decoder: decoder_a,
    };
    let predictor_b = PredictorGraph {
        identity: Identity::B,
        encoder: Arc::clone(&encoder),
        decoder: decoder_b,
    };

    Ok(ComposedModel {
        name,
        encoder,
        predictor_a,
        predictor_b,
        training_data,
    })
}

/// Checks that a decoder structurally mirrors the encoder.
fn verify_mirror(encoder: &SubNetwork, decoder: &SubNetwork) -> SwapResult<()> {
    let latent = encoder.output_shapes()[0];
    if decoder.input_shape() != latent {
        return Err(SwapError::graph_construction(
            decoder.name(),
            format!(
                "decoder input {} does not match encoder output {}",
                decoder.input_shape(),
                latent
            ),
        ));
    }

    let face = encoder.input_shape();
    for output in decoder.output_shapes() {
        if output.height != face.height || output.width != face.width {
            return Err(SwapError::graph_construction(
                decoder.name(),
                format!(
                    "decoder output {} does not restore the input resolution {}",
                    output, face
                ),
            ));
        }
    }

    let convs = encoder.conv_filters();
    for pair in convs.windows(2) {
        if pair[1] != pair[0] * 2 {
            return Err(SwapError::graph_construction(
                encoder.name(),
                format!(
                    "downscaling channels must double per step, found {} after {}",
                    pair[1], pair[0]
                ),
            ));
        }
    }

    let upscales = decoder.upscale_filters();
    for pair in upscales.windows(2) {
        if pair[0] != pair[1] * 2 {
            return Err(SwapError::graph_construction(
                decoder.name(),
                format!(
                    "upscaling channels must halve per step, found {} after {}",
                    pair[1], pair[0]
                ),
            ));
        }
    }

    let total_upscales = upscales.len() + encoder.upscale_filters().len();
    if total_upscales != convs.len() {
        return Err(SwapError::graph_construction(
            decoder.name(),
            format!(
                "{} downscaling steps are not restored by {} upscaling steps",
                convs.len(),
                total_upscales
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::{Initializer, Layer};

    /// Minimal mirrored definition for exercising the composition checks.
    struct Toy {
        mask: bool,
        broken_reshape: bool,
    }

    impl Toy {
        fn new() -> Self {
            Self {
                mask: false,
                broken_reshape: false,
            }
        }
    }

    impl ModelDefinition for Toy {
        fn name(&self) -> &str {
            "toy"
        }

        fn input_shape(&self) -> TensorShape {
            TensorShape::new(64, 64, 3)
        }

        fn build_encoder(&self) -> SwapResult<SubNetwork> {
            let dense = if self.broken_reshape { 100 } else { 4 * 4 * 64 };
            SubNetwork::build(
                "toy_encoder",
                self.input_shape(),
                vec![
                    Layer::Conv { filters: 16 },
                    Layer::Conv { filters: 32 },
                    Layer::Conv { filters: 64 },
                    Layer::Conv { filters: 128 },
                    Layer::Flatten,
                    Layer::Dense { units: dense },
                    Layer::Reshape {
                        shape: TensorShape::new(4, 4, 64),
                    },
                    Layer::Upscale { filters: 32 },
                ],
                vec![],
                Initializer::HeUniform,
            )
        }

        fn build_decoder(&self, identity: Identity) -> SwapResult<SubNetwork> {
            let mut heads = vec![Layer::ConvOut { channels: 3 }];
            if self.mask {
                heads.push(Layer::ConvOut { channels: 1 });
            }
            SubNetwork::build(
                format!("toy_decoder_{}", identity.label()),
                TensorShape::new(8, 8, 32),
                vec![
                    Layer::Upscale { filters: 32 },
                    Layer::Upscale { filters: 16 },
                    Layer::Upscale { filters: 8 },
                ],
                heads,
                Initializer::HeUniform,
            )
        }

        fn training_data(&self) -> TrainingDataDescriptor {
            TrainingDataDescriptor {
                mask_type: None,
                preview_images: 14,
            }
        }
    }

    #[test]
    fn test_encoder_is_shared_by_handle() {
        let model = compose(&Toy::new()).unwrap();
        assert!(Arc::ptr_eq(
            model.predictor_a().encoder(),
            model.predictor_b().encoder()
        ));
        assert!(Arc::ptr_eq(model.encoder(), model.predictor_a().encoder()));
    }

    #[test]
    fn test_decoders_are_independent_storage() {
        let model = compose(&Toy::new()).unwrap();
        assert!(!std::ptr::eq(
            model.predictor_a().decoder(),
            model.predictor_b().decoder()
        ));
        assert!(model
            .predictor_a()
            .decoder()
            .same_structure(model.predictor_b().decoder()));
    }

    #[test]
    fn test_mask_head_adds_second_output() {
        let mut toy = Toy::new();
        toy.mask = true;
        let model = compose(&toy).unwrap();
        assert_eq!(
            model.predictor_a().output_shapes(),
            &[TensorShape::new(64, 64, 3), TensorShape::new(64, 64, 1)]
        );
    }

    #[test]
    fn test_broken_reshape_fails_composition() {
        let mut toy = Toy::new();
        toy.broken_reshape = true;
        let err = compose(&toy).unwrap_err();
        assert!(matches!(err, SwapError::GraphConstruction { .. }));
    }

    #[test]
    fn test_training_data_descriptor_is_serializable() {
        fn assert_serde<T: serde::Serialize + serde::de::DeserializeOwned>() {}
        assert_serde::<TrainingDataDescriptor>();
    }

    #[test]
    fn test_parameter_count_counts_encoder_once() {
        let model = compose(&Toy::new()).unwrap();
        let expected = model.encoder().parameter_count()
            + model.predictor_a().decoder().parameter_count()
            + model.predictor_b().decoder().parameter_count();
        assert_eq!(model.parameter_count(), expected);
    }
}
