//! Filter modules for pixel-level image transforms.
//!
//! ## Supported Formats
//!
//! Every filter accepts a [`Raster`] with any number of channels, each
//! either 8-bit or floating point:
//!
//! | Kind | Type | Range |
//! |------|------|-------|
//! | U8 | u8 | 0-255 |
//! | F32 | f32 | 0.0-255.0 |
//!
//! The output always has the header of the input: same size, same channel
//! count, same kind per channel.
//!
//! ## Architecture
//!
//! - **Channel independent** - Each channel is transformed on its own
//! - **Dual precision** - One generic algorithm per filter serves both kinds
//! - **Validated entry** - Parameters are range checked before any pixel is written
//! - **Fallible allocation** - Out-of-memory is returned as an error, never an abort
//!
//! ## Filter Categories
//!
//! - **Windowed**: smooth, unsharp, median
//! - **Point (lookup table)**: brightness_contrast, histogram_stretch, quantize
//! - **Histogram**: histogram_match
//!
//! [`Adjustment`] bundles one transform with its parameters, for hosts that
//! build a request from their controls and run it later.

pub mod core;
pub mod blur;
pub mod noise;
pub mod sharpen;
pub mod color_adjust;
pub mod levels_curves;
pub mod histogram;
pub mod stylize;

use crate::error::FilterResult;
use crate::raster::Raster;
use levels_curves::StretchBound;

/// One transform and its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// Moving-average blur.
    Smooth { width: usize, height: usize },
    /// Unsharp mask.
    Sharpen { size: usize, factor: f64 },
    /// Sliding-window median.
    Median { size: usize, avg_neighbors: usize },
    BrightnessContrast { brightness: i32, contrast: i32 },
    /// Linear stretch of `[min, max]` onto the full range.
    Stretch { min: StretchBound, max: StretchBound },
    /// Histogram matching to shape `n`.
    Match { n: i32 },
    /// Quantization, dithered when a seed is given.
    Quantize { levels: usize, dither_seed: Option<u64> },
}

impl Adjustment {
    /// Check the parameters without touching any pixels.
    pub fn validate(&self) -> FilterResult<()> {
        match *self {
            Adjustment::Smooth { width, height } => {
                self::core::check_window("width", width)?;
                self::core::check_window("height", height)?;
            }
            Adjustment::Sharpen { size, factor } => {
                sharpen::validate(size, factor)?;
            }
            Adjustment::Median { size, avg_neighbors } => {
                noise::validate(size, avg_neighbors)?;
            }
            Adjustment::BrightnessContrast { brightness, contrast } => {
                color_adjust::validate(brightness, contrast)?;
            }
            // Fixed bounds are u8, and min >= max is corrected rather than rejected
            Adjustment::Stretch { .. } => {}
            Adjustment::Match { n } => histogram::validate(n)?,
            Adjustment::Quantize { levels, .. } => stylize::validate(levels)?,
        }
        Ok(())
    }

    /// Run the transform, producing a new image.
    pub fn apply(&self, input: &Raster) -> FilterResult<Raster> {
        log::debug!("applying {self:?} to {}x{} image", input.width(), input.height());
        match *self {
            Adjustment::Smooth { width, height } => blur::smooth(input, width, height),
            Adjustment::Sharpen { size, factor } => sharpen::unsharp(input, size, factor),
            Adjustment::Median { size, avg_neighbors } => noise::median(input, size, avg_neighbors),
            Adjustment::BrightnessContrast { brightness, contrast } => {
                color_adjust::brightness_contrast(input, brightness, contrast)
            }
            Adjustment::Stretch { min, max } => {
                levels_curves::histogram_stretch(input, min, max).map(|(output, _)| output)
            }
            Adjustment::Match { n } => histogram::histogram_match(input, n),
            Adjustment::Quantize { levels, dither_seed } => stylize::quantize(input, levels, dither_seed),
        }
    }

    /// Run the transform, overwriting `image`.
    pub fn apply_in_place(&self, image: &mut Raster) -> FilterResult<()> {
        log::debug!("applying {self:?} in place to {}x{} image", image.width(), image.height());
        match *self {
            Adjustment::Smooth { width, height } => blur::smooth_in_place(image, width, height),
            Adjustment::Sharpen { size, factor } => sharpen::unsharp_in_place(image, size, factor),
            Adjustment::Median { size, avg_neighbors } => noise::median_in_place(image, size, avg_neighbors),
            Adjustment::BrightnessContrast { brightness, contrast } => {
                color_adjust::brightness_contrast_in_place(image, brightness, contrast)
            }
            Adjustment::Stretch { min, max } => {
                levels_curves::histogram_stretch_in_place(image, min, max).map(|_| ())
            }
            Adjustment::Match { n } => histogram::histogram_match_in_place(image, n),
            Adjustment::Quantize { levels, dither_seed } => stylize::quantize_in_place(image, levels, dither_seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use crate::raster::Channel;
    use ndarray::Array2;

    fn sample_image() -> Raster {
        Raster::from_channels(vec![
            Channel::U8(Array2::from_shape_fn((12, 10), |(y, x)| ((x * 23 + y * 11) % 200 + 20) as u8)),
            Channel::F32(Array2::from_shape_fn((12, 10), |(y, x)| (x * y) as f32 * 1.5)),
        ])
        .unwrap()
    }

    fn every_adjustment() -> Vec<Adjustment> {
        vec![
            Adjustment::Smooth { width: 3, height: 5 },
            Adjustment::Sharpen { size: 3, factor: 1.5 },
            Adjustment::Median { size: 3, avg_neighbors: 1 },
            Adjustment::BrightnessContrast { brightness: 10, contrast: -20 },
            Adjustment::Stretch {
                min: StretchBound::Auto,
                max: StretchBound::Fixed(200),
            },
            Adjustment::Match { n: 2 },
            Adjustment::Quantize {
                levels: 6,
                dither_seed: Some(5),
            },
        ]
    }

    #[test]
    fn test_every_adjustment_keeps_header() {
        let image = sample_image();
        for adjustment in every_adjustment() {
            adjustment.validate().unwrap();
            let result = adjustment.apply(&image).unwrap();
            assert_eq!(result.header(), image.header(), "{adjustment:?}");
        }
    }

    #[test]
    fn test_in_place_matches_copy_for_every_adjustment() {
        let image = sample_image();
        for adjustment in every_adjustment() {
            let copied = adjustment.apply(&image).unwrap();
            let mut in_place = image.clone();
            adjustment.apply_in_place(&mut in_place).unwrap();
            assert_eq!(copied, in_place, "{adjustment:?}");
        }
    }

    #[test]
    fn test_apply_matches_direct_call() {
        let image = sample_image();
        let direct = blur::smooth(&image, 3, 3).unwrap();
        let via = Adjustment::Smooth { width: 3, height: 3 }.apply(&image).unwrap();
        assert_eq!(direct, via);
    }

    #[test]
    fn test_validate_rejects_without_running() {
        let bad = [
            Adjustment::Smooth { width: 0, height: 3 },
            Adjustment::Sharpen { size: 3, factor: 9.0 },
            Adjustment::Median { size: 3, avg_neighbors: 5 },
            Adjustment::BrightnessContrast { brightness: 0, contrast: 150 },
            Adjustment::Match { n: -200 },
            Adjustment::Quantize {
                levels: 0,
                dither_seed: None,
            },
        ];
        let mut image = sample_image();
        let before = image.clone();
        for adjustment in bad {
            assert!(
                matches!(adjustment.validate(), Err(FilterError::InvalidParameter { .. })),
                "{adjustment:?}"
            );
            assert!(adjustment.apply(&image).is_err());
            assert!(adjustment.apply_in_place(&mut image).is_err());
        }
        assert_eq!(image, before);
    }
}
