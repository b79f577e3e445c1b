//! Model composition: sub-network graphs, dual-identity assembly, and the
//! built-in model definitions.

pub mod compose;
pub mod dfl_h128;
pub mod graph;
pub mod masks;
pub mod original;

pub use compose::{
    compose, ComposedModel, Identity, ModelDefinition, PredictorGraph, TrainingDataDescriptor,
};
pub use dfl_h128::DflH128;
pub use graph::{Initializer, Layer, SubNetwork, TensorShape};
pub use masks::{available_masks, MaskType};
pub use original::Original;
