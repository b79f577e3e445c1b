//! Shared utilities: image/tensor conversion at the crate boundary.

pub mod image;

pub use image::{array_to_image, image_to_array};
