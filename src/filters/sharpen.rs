//! Sharpen filters: Unsharp Mask.
//!
//! The channel is blurred with the moving-average filter from
//! [`blur`](super::blur), and the positive part of the difference between
//! the original and the blurred copy is scaled and added back:
//!
//! ```text
//! out = clip(I + clip(I - blur(I), 0, 255) * factor, 0, 255)
//! ```
//!
//! Only the bright side of an edge is boosted; pixels darker than their
//! neighbourhood are left as they are.

use ndarray::{Array2, ArrayView2, Zip};

use super::blur::BoxFilter;
use super::core::check_window;
use crate::error::{FilterError, FilterResult};
use crate::raster::{PlaneOp, Raster, Sample};

/// Smallest accepted sharpening factor.
pub const FACTOR_MIN: f64 = 0.0;

/// Largest accepted sharpening factor.
pub const FACTOR_MAX: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Unsharp {
    size: usize,
    factor: f64,
}

impl PlaneOp for Unsharp {
    fn apply<T: Sample>(&self, plane: ArrayView2<'_, T>) -> FilterResult<Array2<T>> {
        let mut output = BoxFilter {
            width: self.size,
            height: self.size,
        }
        .apply(plane)?;

        // The blurred plane is overwritten with the result
        Zip::from(&mut output).and(&plane).for_each(|o, &v| {
            let original = v.to_f64();
            let residual = (original - o.to_f64()).clamp(0.0, 255.0);
            *o = T::from_f64((original + residual * self.factor).clamp(0.0, 255.0));
        });
        Ok(output)
    }
}

pub(crate) fn validate(size: usize, factor: f64) -> FilterResult<usize> {
    let size = check_window("size", size)?;
    if !factor.is_finite() || !(FACTOR_MIN..=FACTOR_MAX).contains(&factor) {
        return Err(FilterError::InvalidParameter {
            name: "factor",
            value: factor.to_string(),
            range: "0.0..=5.0",
        });
    }
    Ok(size)
}

/// Sharpen every channel with an unsharp mask.
///
/// # Arguments
/// * `input` - Image with any number of u8 or f32 channels
/// * `size` - Blur window size (1-99, even values are rounded up)
/// * `factor` - Weight of the added detail (0.0-5.0, 0.0 = no change)
///
/// # Returns
/// Sharpened image with the same header as `input`. A window of 1, or one
/// larger than the image, returns a copy.
pub fn unsharp(input: &Raster, size: usize, factor: f64) -> FilterResult<Raster> {
    let size = validate(size, factor)?;
    if size <= 1 || size > input.width() || size > input.height() {
        log::debug!(
            "unsharp window {size} is degenerate for {}x{}, copying",
            input.width(),
            input.height()
        );
        return input.try_clone();
    }
    input.map_channels(&Unsharp { size, factor })
}

/// In-place variant of [`unsharp`].
pub fn unsharp_in_place(image: &mut Raster, size: usize, factor: f64) -> FilterResult<()> {
    let size = validate(size, factor)?;
    if size <= 1 || size > image.width() || size > image.height() {
        return Ok(());
    }
    image.map_channels_in_place(&Unsharp { size, factor })
}
