//! Input validation utilities.
//!
//! Validation at the pixel-processor boundary: the original crop, the
//! swapped crop, and the weight mask must agree in shape before any
//! arithmetic happens, so a mismatch surfaces as a useful message instead
//! of a numeric failure deep inside a computation.

use crate::core::SwapError;

/// Validates that two arrays have identical shapes.
#[inline]
pub fn validate_same_shape(
    shape1: &[usize],
    shape2: &[usize],
    name1: &str,
    name2: &str,
) -> Result<(), SwapError> {
    if shape1 != shape2 {
        return Err(SwapError::InvalidInput {
            message: format!(
                "shape mismatch: {} has shape {:?}, but {} has shape {:?}",
                name1, shape1, name2, shape2
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_same_shape() {
        assert!(validate_same_shape(&[2, 3, 3], &[2, 3, 3], "a", "b").is_ok());
        assert!(validate_same_shape(&[2, 3, 3], &[2, 3], "a", "b").is_err());
        assert!(validate_same_shape(&[2, 3, 3], &[3, 2, 3], "a", "b").is_err());
    }
}
