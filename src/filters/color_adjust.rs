//! Color adjustment filters: Brightness and Contrast.
//!
//! A single lookup table pivots intensities around mid-gray (128): contrast
//! scales the distance from the pivot and brightness shifts the result.
//! The table is built once per call and applied to every channel.

use super::core::{check_range, Lut};
use crate::error::FilterResult;
use crate::raster::Raster;

/// Lowest accepted brightness or contrast value.
pub const ADJUST_MIN: i32 = -100;

/// Highest accepted brightness or contrast value.
pub const ADJUST_MAX: i32 = 100;

/// Intensity left unchanged by any contrast factor.
const PIVOT: f64 = 128.0;

/// Contrast multiplier for a raw contrast control value.
///
/// Positive values use a steeper scale (`c / 25 + 1`, up to 5x) than
/// negative ones (`c / 133 + 1`, down to about 0.25x).
pub fn contrast_factor(contrast: i32) -> f64 {
    let c = contrast as f64;
    if contrast >= 0 {
        c / 25.0 + 1.0
    } else {
        c / 133.0 + 1.0
    }
}

/// Table for `clip((i - 128) * factor + 128 + brightness, 0, 255)`.
pub fn brightness_contrast_lut(brightness: i32, contrast: i32) -> Lut {
    let factor = contrast_factor(contrast);
    let offset = brightness as f64;
    Lut::from_fn(|i| (i as f64 - PIVOT) * factor + PIVOT + offset)
}

pub(crate) fn validate(brightness: i32, contrast: i32) -> FilterResult<()> {
    check_range("brightness", brightness, ADJUST_MIN, ADJUST_MAX, "-100..=100")?;
    check_range("contrast", contrast, ADJUST_MIN, ADJUST_MAX, "-100..=100")
}

/// Adjust brightness and contrast of every channel.
///
/// # Arguments
/// * `input` - Image with any number of u8 or f32 channels
/// * `brightness` - Offset added after contrast: -100 to 100, 0 = no change
/// * `contrast` - Contrast control: -100 to 100, 0 = no change
///
/// # Returns
/// Adjusted image with the same header as `input`
pub fn brightness_contrast(input: &Raster, brightness: i32, contrast: i32) -> FilterResult<Raster> {
    validate(brightness, contrast)?;
    brightness_contrast_lut(brightness, contrast).remap(input)
}

/// In-place variant of [`brightness_contrast`].
pub fn brightness_contrast_in_place(image: &mut Raster, brightness: i32, contrast: i32) -> FilterResult<()> {
    validate(brightness, contrast)?;
    brightness_contrast_lut(brightness, contrast).remap_in_place(image)
}
