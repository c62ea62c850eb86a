//! Levels: histogram stretching.
//!
//! Maps the intensity range `[min, max]` linearly onto `[0, 255]`. Either
//! bound can be fixed by the caller or detected from the image, in which
//! case it is the lowest or highest level occupied in any channel. One
//! table is shared by all channels.

use super::core::{Histogram, Lut};
use crate::error::FilterResult;
use crate::raster::Raster;

/// Where a stretch bound comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StretchBound {
    /// Detect from the image histogram.
    Auto,
    /// Use the given level.
    Fixed(u8),
}

/// Resolved stretch range.
///
/// `max` is always greater than `min`, so it can reach 256 when `min` is 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StretchRange {
    pub min: u8,
    pub max: u16,
}

/// Resolve both bounds against the image, forcing `max > min`.
pub fn resolve_stretch_range(input: &Raster, min: StretchBound, max: StretchBound) -> StretchRange {
    let hist = match (min, max) {
        (StretchBound::Fixed(_), StretchBound::Fixed(_)) => None,
        _ => Some(Histogram::from_raster(input)),
    };

    let lo = match min {
        StretchBound::Fixed(v) => v,
        StretchBound::Auto => hist.as_ref().and_then(Histogram::min_level).unwrap_or(0),
    };
    let hi = match max {
        StretchBound::Fixed(v) => v as u16,
        StretchBound::Auto => hist.as_ref().and_then(Histogram::max_level).unwrap_or(u8::MAX) as u16,
    };

    if lo as u16 >= hi {
        log::debug!("stretch min {lo} >= max {hi}, using max {}", lo as u16 + 1);
        return StretchRange {
            min: lo,
            max: lo as u16 + 1,
        };
    }
    StretchRange { min: lo, max: hi }
}

/// Table for `clip(255 * (i - min) / (max - min), 0, 255)` in integer arithmetic.
pub fn stretch_lut(range: StretchRange) -> Lut {
    let min = range.min as i32;
    let span = (range.max as i32 - min).max(1);
    Lut::from_fn(|i| ((255 * (i as i32 - min)) / span) as f64)
}

/// Stretch every channel so `[min, max]` covers the full intensity range.
///
/// # Arguments
/// * `input` - Image with any number of u8 or f32 channels
/// * `min` - Level mapped to 0, fixed or detected
/// * `max` - Level mapped to 255, fixed or detected
///
/// # Returns
/// The stretched image and the range that was actually used
pub fn histogram_stretch(
    input: &Raster,
    min: StretchBound,
    max: StretchBound,
) -> FilterResult<(Raster, StretchRange)> {
    let range = resolve_stretch_range(input, min, max);
    let output = stretch_lut(range).remap(input)?;
    Ok((output, range))
}

/// In-place variant of [`histogram_stretch`].
pub fn histogram_stretch_in_place(
    image: &mut Raster,
    min: StretchBound,
    max: StretchBound,
) -> FilterResult<StretchRange> {
    let range = resolve_stretch_range(image, min, max);
    stretch_lut(range).remap_in_place(image)?;
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Channel;
    use ndarray::{array, Array2};

    #[test]
    fn test_full_range_is_identity() {
        let lut = stretch_lut(StretchRange { min: 0, max: 255 });
        for i in 0..=255u8 {
            assert_eq!(lut.map(i), i);
        }
    }

    #[test]
    fn test_stretch_fixed_range() {
        let lut = stretch_lut(StretchRange { min: 64, max: 192 });
        assert_eq!(lut.map(0), 0);
        assert_eq!(lut.map(64), 0);
        // 255 * 64 / 128
        assert_eq!(lut.map(128), 127);
        assert_eq!(lut.map(192), 255);
        assert_eq!(lut.map(250), 255);
    }

    #[test]
    fn test_auto_bounds_span_all_channels() {
        let image = Raster::from_channels(vec![
            Channel::U8(array![[64u8, 128], [160, 100]]),
            Channel::U8(array![[90u8, 192], [80, 100]]),
        ])
        .unwrap();

        let (result, range) = histogram_stretch(&image, StretchBound::Auto, StretchBound::Auto).unwrap();
        assert_eq!(range, StretchRange { min: 64, max: 192 });

        let first = result.channel(0).unwrap().as_u8().unwrap();
        let second = result.channel(1).unwrap().as_u8().unwrap();
        assert_eq!(first[[0, 0]], 0);
        assert_eq!(second[[0, 1]], 255);
    }

    #[test]
    fn test_mixed_fixed_and_auto() {
        let image = Raster::from_plane(array![[10u8, 50, 90]]).unwrap();
        let range = resolve_stretch_range(&image, StretchBound::Fixed(0), StretchBound::Auto);
        assert_eq!(range, StretchRange { min: 0, max: 90 });
        let range = resolve_stretch_range(&image, StretchBound::Auto, StretchBound::Fixed(200));
        assert_eq!(range, StretchRange { min: 10, max: 200 });
    }

    #[test]
    fn test_min_not_below_max_is_forced_apart() {
        let image = Raster::from_plane(Array2::from_elem((2, 2), 40u8)).unwrap();

        let range = resolve_stretch_range(&image, StretchBound::Fixed(120), StretchBound::Fixed(100));
        assert_eq!(range, StretchRange { min: 120, max: 121 });

        // Constant image: detected min == max
        let (result, range) = histogram_stretch(&image, StretchBound::Auto, StretchBound::Auto).unwrap();
        assert_eq!(range, StretchRange { min: 40, max: 41 });
        assert!(result.channel(0).unwrap().as_u8().unwrap().iter().all(|&v| v == 0));

        let range = resolve_stretch_range(&image, StretchBound::Fixed(255), StretchBound::Fixed(255));
        assert_eq!(range.max, 256);
        assert_eq!(stretch_lut(range).map(255), 0);
    }

    #[test]
    fn test_in_place_reports_range() {
        let mut image = Raster::from_plane(array![[20u8, 30], [40, 120]]).unwrap();
        let expected = histogram_stretch(&image, StretchBound::Auto, StretchBound::Auto).unwrap();
        let range = histogram_stretch_in_place(&mut image, StretchBound::Auto, StretchBound::Auto).unwrap();
        assert_eq!(range, expected.1);
        assert_eq!(image, expected.0);
    }
}
