//! Masked color distribution matching.

use ndarray::{Array3, ArrayView2, ArrayView3, Axis};
use tracing::debug;

use crate::core::{validate_same_shape, SwapError, SwapResult};

/// Shifts each channel of `new_face` so its mask-weighted mean matches the
/// mask-weighted mean of `old_face`.
///
/// The mask weights every pixel's contribution to the channel means;
/// pixels with zero weight are ignored for the statistics but still shifted
/// in the output. The result is not clamped, so values may leave the
/// displayable range and the caller clamps before encoding (see
/// [`crate::utils::image::array_to_image`]).
///
/// # Arguments
///
/// * `old_face` - The original face region, `(H, W, C)`.
/// * `new_face` - The swapped face to adjust, same shape as `old_face`.
/// * `mask` - Per-pixel weights, `(H, W)` matching the face spatial dims.
///
/// # Errors
///
/// Returns `InvalidInput` if the faces differ in shape, the mask does not
/// match the face spatial dimensions, or any input is empty. An all-zero
/// mask is a caller precondition violation and is not checked.
pub fn match_color_distribution(
    old_face: ArrayView3<f32>,
    new_face: ArrayView3<f32>,
    mask: ArrayView2<f32>,
) -> SwapResult<Array3<f32>> {
    validate_same_shape(old_face.shape(), new_face.shape(), "old_face", "new_face")?;
    if old_face.is_empty() {
        return Err(SwapError::invalid_input("face tensors are empty"));
    }
    let (height, width, channels) = old_face.dim();
    if mask.dim() != (height, width) {
        return Err(SwapError::invalid_input(format!(
            "mask shape ({}, {}) does not match face spatial dims ({}, {})",
            mask.dim().0,
            mask.dim().1,
            height,
            width
        )));
    }

    let weight_total: f32 = mask.sum();
    let mut adjusted = new_face.to_owned();
    for channel in 0..channels {
        let old_channel = old_face.index_axis(Axis(2), channel);
        let new_channel = new_face.index_axis(Axis(2), channel);
        let old_mean = weighted_mean(&old_channel, &mask, weight_total);
        let new_mean = weighted_mean(&new_channel, &mask, weight_total);
        let shift = old_mean - new_mean;
        adjusted
            .index_axis_mut(Axis(2), channel)
            .mapv_inplace(|v| v + shift);
        debug!(channel, old_mean, new_mean, shift, "matched channel mean");
    }
    Ok(adjusted)
}

fn weighted_mean(values: &ArrayView2<f32>, mask: &ArrayView2<f32>, weight_total: f32) -> f32 {
    let weighted: f32 = values
        .iter()
        .zip(mask.iter())
        .map(|(v, w)| v * w)
        .sum();
    weighted / weight_total
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2, Array3};

    #[test]
    fn test_uniform_shift_matches_means() {
        let old_face = array![[[100.0_f32, 100.0, 100.0]]];
        let new_face = array![[[50.0_f32, 50.0, 50.0]]];
        let mask = array![[1.0_f32]];
        let adjusted =
            match_color_distribution(old_face.view(), new_face.view(), mask.view()).unwrap();
        assert_eq!(adjusted, array![[[150.0_f32, 150.0, 150.0]]]);
    }

    #[test]
    fn test_only_masked_pixels_drive_the_statistics() {
        // Two pixels, only the first carries weight: the shift is computed
        // from pixel 0 but applied everywhere.
        let old_face = array![[[200.0_f32], [0.0]]];
        let new_face = array![[[100.0_f32], [40.0]]];
        let mask = array![[1.0_f32, 0.0]];
        let adjusted =
            match_color_distribution(old_face.view(), new_face.view(), mask.view()).unwrap();
        assert_eq!(adjusted, array![[[200.0_f32], [140.0]]]);
    }

    #[test]
    fn test_output_is_not_clamped() {
        let old_face = array![[[250.0_f32]]];
        let new_face = array![[[10.0_f32]]];
        let mask = array![[1.0_f32]];
        let adjusted =
            match_color_distribution(old_face.view(), new_face.view(), mask.view()).unwrap();
        assert_eq!(adjusted[[0, 0, 0]], 250.0);

        let inverse =
            match_color_distribution(new_face.view(), old_face.view(), mask.view()).unwrap();
        assert_eq!(inverse[[0, 0, 0]], 10.0);
    }

    #[test]
    fn test_fractional_weights() {
        let old_face = array![[[10.0_f32], [30.0]]];
        let new_face = array![[[0.0_f32], [0.0]]];
        let mask = array![[0.25_f32, 0.75]];
        let adjusted =
            match_color_distribution(old_face.view(), new_face.view(), mask.view()).unwrap();
        // Weighted old mean is (10*0.25 + 30*0.75) / 1.0 = 25.
        assert_eq!(adjusted, array![[[25.0_f32], [25.0]]]);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let old_face = Array3::<f32>::zeros((4, 4, 3));
        let new_face = Array3::<f32>::zeros((4, 5, 3));
        let mask = Array2::<f32>::ones((4, 4));
        let err = match_color_distribution(old_face.view(), new_face.view(), mask.view())
            .unwrap_err();
        assert!(matches!(err, SwapError::InvalidInput { .. }));
    }

    #[test]
    fn test_mask_spatial_mismatch_is_rejected() {
        let old_face = Array3::<f32>::zeros((4, 4, 3));
        let new_face = Array3::<f32>::zeros((4, 4, 3));
        let mask = Array2::<f32>::ones((8, 8));
        let err = match_color_distribution(old_face.view(), new_face.view(), mask.view())
            .unwrap_err();
        assert!(matches!(err, SwapError::InvalidInput { .. }));
    }

    #[test]
    fn test_preserves_shape() {
        let old_face = Array3::<f32>::from_elem((16, 12, 3), 128.0);
        let new_face = Array3::<f32>::from_elem((16, 12, 3), 64.0);
        let mask = Array2::<f32>::ones((16, 12));
        let adjusted =
            match_color_distribution(old_face.view(), new_face.view(), mask.view()).unwrap();
        assert_eq!(adjusted.dim(), (16, 12, 3));
    }
}
