//! Sub-network graph descriptions.
//!
//! A [`SubNetwork`] is an owned computation-graph description: a declared
//! input shape, an ordered list of layers, the output shape(s) propagated
//! through them, and independent per-layer weight storage. Shape
//! propagation happens entirely at construction time, so a reshape with a
//! mismatched element count or a dense layer fed a spatial tensor is a
//! construction error, never a runtime numeric failure.
//!
//! Execution of the graph on an accelerator is owned by the surrounding
//! training/conversion loop and is out of scope here.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Uniform};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{SwapError, SwapResult};

/// The spatial shape of a feature tensor: height, width, channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorShape {
    /// Height in pixels/cells.
    pub height: usize,
    /// Width in pixels/cells.
    pub width: usize,
    /// Channel count.
    pub channels: usize,
}

impl TensorShape {
    /// Creates a new shape.
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Total element count.
    pub fn elements(&self) -> usize {
        self.height * self.width * self.channels
    }
}

impl std::fmt::Display for TensorShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.height, self.width, self.channels)
    }
}

/// One layer in a sub-network.
///
/// The variants correspond to the building blocks the swapping models are
/// assembled from; their shape arithmetic is fixed by convention
/// (stride-2 5x5 convolutions on the way down, 3x3 conv plus pixel
/// shuffler on the way up).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    /// 5x5 stride-2 convolution: halves the spatial dims, sets channels.
    Conv {
        /// Output channel count.
        filters: usize,
    },
    /// Fully-connected layer over a flattened tensor.
    Dense {
        /// Output unit count.
        units: usize,
    },
    /// Flattens a spatial tensor to a vector.
    Flatten,
    /// Reshapes a flat vector to a spatial tensor of equal element count.
    Reshape {
        /// Target shape.
        shape: TensorShape,
    },
    /// 3x3 convolution to `4 * filters` channels followed by a x2 pixel
    /// shuffler: doubles the spatial dims, sets channels.
    Upscale {
        /// Output channel count after the shuffle.
        filters: usize,
    },
    /// 5x5 same-padding sigmoid head producing an output tensor.
    ConvOut {
        /// Output channel count (3 for the image head, 1 for the mask head).
        channels: usize,
    },
}

/// Weight initialization strategy, selected from the global configuration
/// (`icnr_init` / `conv_aware_init`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Initializer {
    /// He-uniform sampling.
    #[default]
    HeUniform,
    /// He-uniform, tiled in a repeating pattern across the four pixel
    /// shuffler groups of upscale layers.
    Icnr,
    /// Convolution-aware: normal sampling scaled by fan-in.
    ConvAware,
}

impl Initializer {
    /// Selects the initializer from the global configuration flags.
    ///
    /// `icnr_init` takes precedence when both flags are set, matching the
    /// order the options are consulted during model construction.
    pub fn from_flags(icnr_init: bool, conv_aware_init: bool) -> Self {
        if icnr_init {
            Initializer::Icnr
        } else if conv_aware_init {
            Initializer::ConvAware
        } else {
            Initializer::HeUniform
        }
    }
}

/// Shape of the data flowing between layers: spatial or flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeatureShape {
    Spatial(TensorShape),
    Flat(usize),
}

impl std::fmt::Display for FeatureShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureShape::Spatial(shape) => write!(f, "{}", shape),
            FeatureShape::Flat(n) => write!(f, "flat({})", n),
        }
    }
}

/// Everything needed to allocate one layer's weights.
#[derive(Debug, Clone, Copy)]
struct WeightSpec {
    /// Total parameter count (kernel plus bias).
    count: usize,
    /// Fan-in used to scale the sampling distribution.
    fan_in: usize,
    /// Whether ICNR tiling applies (upscale layers only).
    shuffled: bool,
}

impl Layer {
    /// Propagates a feature shape through this layer.
    ///
    /// Returns the output shape and the weight allocation spec, or a
    /// message describing the structural problem.
    fn propagate(&self, input: FeatureShape) -> Result<(FeatureShape, WeightSpec), String> {
        match (self, input) {
            (Layer::Conv { filters }, FeatureShape::Spatial(shape)) => {
                if *filters == 0 {
                    return Err("conv layer with zero filters".to_string());
                }
                let out = TensorShape::new(
                    shape.height.div_ceil(2),
                    shape.width.div_ceil(2),
                    *filters,
                );
                let fan_in = 5 * 5 * shape.channels;
                Ok((
                    FeatureShape::Spatial(out),
                    WeightSpec {
                        count: fan_in * filters + filters,
                        fan_in,
                        shuffled: false,
                    },
                ))
            }
            (Layer::Dense { units }, FeatureShape::Flat(n)) => {
                if *units == 0 {
                    return Err("dense layer with zero units".to_string());
                }
                Ok((
                    FeatureShape::Flat(*units),
                    WeightSpec {
                        count: n * units + units,
                        fan_in: n,
                        shuffled: false,
                    },
                ))
            }
            (Layer::Flatten, FeatureShape::Spatial(shape)) => Ok((
                FeatureShape::Flat(shape.elements()),
                WeightSpec {
                    count: 0,
                    fan_in: 0,
                    shuffled: false,
                },
            )),
            (Layer::Reshape { shape }, FeatureShape::Flat(n)) => {
                if shape.elements() != n {
                    return Err(format!(
                        "reshape to {} requires {} elements, got {}",
                        shape,
                        shape.elements(),
                        n
                    ));
                }
                Ok((
                    FeatureShape::Spatial(*shape),
                    WeightSpec {
                        count: 0,
                        fan_in: 0,
                        shuffled: false,
                    },
                ))
            }
            (Layer::Upscale { filters }, FeatureShape::Spatial(shape)) => {
                if *filters == 0 {
                    return Err("upscale layer with zero filters".to_string());
                }
                let out = TensorShape::new(shape.height * 2, shape.width * 2, *filters);
                let fan_in = 3 * 3 * shape.channels;
                Ok((
                    FeatureShape::Spatial(out),
                    WeightSpec {
                        count: fan_in * filters * 4 + filters * 4,
                        fan_in,
                        shuffled: true,
                    },
                ))
            }
            (Layer::ConvOut { channels }, FeatureShape::Spatial(shape)) => {
                if *channels == 0 {
                    return Err("output head with zero channels".to_string());
                }
                let out = TensorShape::new(shape.height, shape.width, *channels);
                let fan_in = 5 * 5 * shape.channels;
                Ok((
                    FeatureShape::Spatial(out),
                    WeightSpec {
                        count: fan_in * channels + channels,
                        fan_in,
                        shuffled: false,
                    },
                ))
            }
            (layer, input) => Err(format!(
                "layer {:?} cannot be applied to input of shape {}",
                layer, input
            )),
        }
    }
}

/// An opaque computation-graph description with independent weight storage.
///
/// A sub-network is a trunk of layers followed by zero or more output
/// heads, all branching off the trunk output. A network without heads has
/// exactly one output: the trunk output itself.
#[derive(Debug)]
pub struct SubNetwork {
    name: String,
    input_shape: TensorShape,
    trunk: Vec<Layer>,
    heads: Vec<Layer>,
    output_shapes: Vec<TensorShape>,
    weights: Vec<Array1<f32>>,
}

impl SubNetwork {
    /// Builds a sub-network: propagates shapes through every layer, then
    /// allocates independent weight storage.
    ///
    /// # Errors
    ///
    /// Returns `GraphConstruction` if any layer is structurally invalid for
    /// its input (reshape element-count mismatch, dense applied to a
    /// spatial tensor, zero-sized dims), or if the trunk output is not
    /// spatial while heads are attached.
    pub fn build(
        name: impl Into<String>,
        input_shape: TensorShape,
        trunk: Vec<Layer>,
        heads: Vec<Layer>,
        initializer: Initializer,
    ) -> SwapResult<Self> {
        let name = name.into();
        if input_shape.elements() == 0 {
            return Err(SwapError::graph_construction(
                &name,
                format!("input shape {} has zero elements", input_shape),
            ));
        }

        let mut specs: Vec<WeightSpec> = Vec::with_capacity(trunk.len() + heads.len());
        let mut current = FeatureShape::Spatial(input_shape);
        for layer in &trunk {
            let (next, spec) = layer
                .propagate(current)
                .map_err(|message| SwapError::graph_construction(&name, message))?;
            specs.push(spec);
            current = next;
        }

        let mut output_shapes = Vec::new();
        if heads.is_empty() {
            match current {
                FeatureShape::Spatial(shape) => output_shapes.push(shape),
                FeatureShape::Flat(_) => {
                    return Err(SwapError::graph_construction(
                        &name,
                        "trunk output must be spatial",
                    ));
                }
            }
        } else {
            for head in &heads {
                let (out, spec) = head
                    .propagate(current)
                    .map_err(|message| SwapError::graph_construction(&name, message))?;
                match out {
                    FeatureShape::Spatial(shape) => output_shapes.push(shape),
                    FeatureShape::Flat(_) => {
                        return Err(SwapError::graph_construction(
                            &name,
                            "output heads must produce spatial tensors",
                        ));
                    }
                }
                specs.push(spec);
            }
        }

        let weights: Vec<Array1<f32>> = specs
            .par_iter()
            .map(|spec| initialize_weights(spec, initializer))
            .collect();

        let parameter_count: usize = specs.iter().map(|spec| spec.count).sum();
        debug!(
            network = %name,
            input = %input_shape,
            outputs = output_shapes.len(),
            parameters = parameter_count,
            "built sub-network"
        );

        Ok(Self {
            name,
            input_shape,
            trunk,
            heads,
            output_shapes,
            weights,
        })
    }

    /// Returns the network name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared input shape.
    pub fn input_shape(&self) -> TensorShape {
        self.input_shape
    }

    /// Returns the propagated output shape(s).
    pub fn output_shapes(&self) -> &[TensorShape] {
        &self.output_shapes
    }

    /// Returns the number of output tensors this network produces.
    pub fn num_outputs(&self) -> usize {
        self.output_shapes.len()
    }

    /// Returns the trunk layers.
    pub fn trunk(&self) -> &[Layer] {
        &self.trunk
    }

    /// Returns the output head layers.
    pub fn heads(&self) -> &[Layer] {
        &self.heads
    }

    /// Returns the per-layer weight storage (trunk layers, then heads).
    pub fn weights(&self) -> &[Array1<f32>] {
        &self.weights
    }

    /// Total trainable parameter count.
    pub fn parameter_count(&self) -> usize {
        self.weights.iter().map(|w| w.len()).sum()
    }

    /// The channel schedule of the trunk's downscaling convolutions.
    pub fn conv_filters(&self) -> Vec<usize> {
        self.trunk
            .iter()
            .filter_map(|layer| match layer {
                Layer::Conv { filters } => Some(*filters),
                _ => None,
            })
            .collect()
    }

    /// The channel schedule of the trunk's upscaling stages.
    pub fn upscale_filters(&self) -> Vec<usize> {
        self.trunk
            .iter()
            .filter_map(|layer| match layer {
                Layer::Upscale { filters } => Some(*filters),
                _ => None,
            })
            .collect()
    }

    /// Returns whether another network has the identical layer schedule and
    /// shapes. Weight storage is not compared.
    pub fn same_structure(&self, other: &SubNetwork) -> bool {
        self.input_shape == other.input_shape
            && self.trunk == other.trunk
            && self.heads == other.heads
            && self.output_shapes == other.output_shapes
    }
}

/// Allocates and fills one layer's weight storage.
fn initialize_weights(spec: &WeightSpec, initializer: Initializer) -> Array1<f32> {
    if spec.count == 0 {
        return Array1::zeros(0);
    }
    let mut rng = StdRng::from_entropy();
    match initializer {
        Initializer::Icnr if spec.shuffled => {
            // Tile one shuffle group's worth of weights across all four.
            let group = spec.count / 4;
            let base = sample_he_uniform(group, spec.fan_in, &mut rng);
            let mut tiled = Vec::with_capacity(spec.count);
            for _ in 0..4 {
                tiled.extend_from_slice(&base);
            }
            Array1::from_vec(tiled)
        }
        Initializer::ConvAware => {
            let std_dev = (2.0 / spec.fan_in.max(1) as f32).sqrt();
            match Normal::new(0.0, std_dev) {
                Ok(dist) => Array1::from_iter((0..spec.count).map(|_| dist.sample(&mut rng))),
                Err(_) => Array1::from_vec(sample_he_uniform(spec.count, spec.fan_in, &mut rng)),
            }
        }
        _ => Array1::from_vec(sample_he_uniform(spec.count, spec.fan_in, &mut rng)),
    }
}

fn sample_he_uniform(count: usize, fan_in: usize, rng: &mut impl Rng) -> Vec<f32> {
    let limit = (6.0 / fan_in.max(1) as f32).sqrt();
    let dist = Uniform::new_inclusive(-limit, limit);
    (0..count).map(|_| dist.sample(rng)).collect()
}
