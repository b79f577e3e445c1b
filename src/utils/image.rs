//! Conversion between `image` buffers and `ndarray` tensors.
//!
//! Faces cross this boundary twice: decoded frames become `(H, W, 3)`
//! float tensors for the processors, and adjusted tensors become RGB
//! buffers for encoding. The float side is deliberately unclamped; the
//! clamp to the displayable range happens here, on the way out.

use image::RgbImage;
use ndarray::{Array3, ArrayView3};

use crate::core::{SwapError, SwapResult};

/// Converts an RGB image to an `(H, W, 3)` float tensor.
///
/// Channel values keep the `0..=255` range; no normalization is applied.
pub fn image_to_array(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut array = Array3::zeros((height as usize, width as usize, 3));
    for (x, y, pixel) in image.enumerate_pixels() {
        for channel in 0..3 {
            array[[y as usize, x as usize, channel]] = f32::from(pixel.0[channel]);
        }
    }
    array
}

/// Converts an `(H, W, 3)` float tensor back to an RGB image, clamping
/// each value to the displayable `0..=255` range.
///
/// # Errors
///
/// Returns `InvalidInput` if the tensor does not have exactly three
/// channels or has a zero spatial dimension.
pub fn array_to_image(array: ArrayView3<f32>) -> SwapResult<RgbImage> {
    let (height, width, channels) = array.dim();
    if channels != 3 {
        return Err(SwapError::invalid_input(format!(
            "expected 3 channels, got {}",
            channels
        )));
    }
    if height == 0 || width == 0 {
        return Err(SwapError::invalid_input("image dimensions cannot be zero"));
    }
    let mut image = RgbImage::new(width as u32, height as u32);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        for channel in 0..3 {
            let value = array[[y as usize, x as usize, channel]];
            pixel.0[channel] = value.clamp(0.0, 255.0) as u8;
        }
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_round_trip_preserves_pixels() {
        let mut image = RgbImage::new(2, 3);
        image.put_pixel(0, 0, Rgb([10, 20, 30]));
        image.put_pixel(1, 2, Rgb([250, 0, 128]));
        let array = image_to_array(&image);
        assert_eq!(array.dim(), (3, 2, 3));
        assert_eq!(array[[0, 0, 1]], 20.0);
        let restored = array_to_image(array.view()).unwrap();
        assert_eq!(restored, image);
    }

    #[test]
    fn test_array_to_image_clamps() {
        let mut array = Array3::<f32>::zeros((1, 1, 3));
        array[[0, 0, 0]] = -12.0;
        array[[0, 0, 1]] = 300.0;
        array[[0, 0, 2]] = 127.4;
        let image = array_to_image(array.view()).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 255, 127]));
    }

    #[test]
    fn test_wrong_channel_count_is_rejected() {
        let array = Array3::<f32>::zeros((4, 4, 1));
        assert!(array_to_image(array.view()).is_err());
    }
}
