//! Stylize filters: Quantize, with optional ordered dithering.
//!
//! Quantization reduces each channel to `levels` evenly spaced output
//! levels, each at the midpoint of its bucket. With dithering, bounded
//! pseudo-random noise is added to every sample before the table lookup,
//! subtracted where `x + y` is even and added where it is odd.

use std::cell::RefCell;

use ndarray::{Array2, ArrayView2, ArrayViewMut2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::core::{check_range, Lut};
use crate::error::FilterResult;
use crate::raster::{alloc_plane, PlaneOp, Raster, Sample};

/// Fewest accepted output levels.
pub const LEVELS_MIN: usize = 1;

/// Most accepted output levels.
pub const LEVELS_MAX: usize = 256;

/// Bucket width and half-width for `levels` output levels.
fn bucket(levels: usize) -> (usize, f64) {
    let scale = LEVELS_MAX / levels;
    (scale, scale as f64 / 2.0)
}

/// Table mapping every level to the midpoint of its bucket.
pub fn quantize_lut(levels: usize) -> Lut {
    let (scale, bias) = bucket(levels);
    Lut::from_fn(|i| (scale * (i as usize / scale)) as f64 + bias)
}

/// Dithered table lookup. One noise stream runs through all channels in order.
struct Dither {
    lut: Lut,
    bias: f64,
    rng: RefCell<StdRng>,
}

impl Dither {
    #[inline]
    fn sample(&self, rng: &mut StdRng, y: usize, x: usize, level: u8) -> u8 {
        let noise = (rng.random::<f64>() * self.bias) as i32;
        let pixel = if (x + y) % 2 == 0 {
            level as i32 - noise
        } else {
            level as i32 + noise
        };
        self.lut.map(pixel.clamp(0, 255) as u8)
    }
}

impl PlaneOp for Dither {
    fn apply<T: Sample>(&self, plane: ArrayView2<'_, T>) -> FilterResult<Array2<T>> {
        let (h, w) = plane.dim();
        let mut output = alloc_plane::<T>(h, w)?;
        let mut rng = self.rng.borrow_mut();
        for ((y, x), out) in output.indexed_iter_mut() {
            *out = T::from_level(self.sample(&mut rng, y, x, plane[[y, x]].level()));
        }
        Ok(output)
    }

    fn apply_in_place<T: Sample>(&self, mut plane: ArrayViewMut2<'_, T>) -> FilterResult<()> {
        let mut rng = self.rng.borrow_mut();
        for ((y, x), v) in plane.indexed_iter_mut() {
            *v = T::from_level(self.sample(&mut rng, y, x, v.level()));
        }
        Ok(())
    }
}

fn dither(levels: usize, seed: u64) -> Dither {
    let (_, bias) = bucket(levels);
    Dither {
        lut: quantize_lut(levels),
        bias,
        rng: RefCell::new(StdRng::seed_from_u64(seed)),
    }
}

pub(crate) fn validate(levels: usize) -> FilterResult<()> {
    check_range("levels", levels, LEVELS_MIN, LEVELS_MAX, "1..=256")
}

/// Quantize every channel to `levels` output levels.
///
/// # Arguments
/// * `input` - Image with any number of u8 or f32 channels
/// * `levels` - Number of output levels (1-256, 256 = no change)
/// * `dither_seed` - Seed for dither noise, or `None` for a plain table lookup
///
/// # Returns
/// Quantized image with the same header as `input`. The same seed always
/// produces the same output.
pub fn quantize(input: &Raster, levels: usize, dither_seed: Option<u64>) -> FilterResult<Raster> {
    validate(levels)?;
    match dither_seed {
        None => quantize_lut(levels).remap(input),
        Some(seed) => input.map_channels(&dither(levels, seed)),
    }
}

/// In-place variant of [`quantize`].
pub fn quantize_in_place(image: &mut Raster, levels: usize, dither_seed: Option<u64>) -> FilterResult<()> {
    validate(levels)?;
    match dither_seed {
        None => quantize_lut(levels).remap_in_place(image),
        Some(seed) => image.map_channels_in_place(&dither(levels, seed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use crate::raster::Channel;
    use ndarray::array;

    fn gradient() -> Raster {
        Raster::from_plane(Array2::from_shape_fn((16, 16), |(y, x)| (y * 16 + x) as u8)).unwrap()
    }

    #[test]
    fn test_256_levels_is_identity() {
        let lut = quantize_lut(256);
        for i in 0..=255u8 {
            assert_eq!(lut.map(i), i);
        }

        // Noise below one level rounds away
        let image = gradient();
        assert_eq!(quantize(&image, 256, Some(9)).unwrap(), image);
    }

    #[test]
    fn test_bucket_midpoints() {
        let lut = quantize_lut(4);
        assert_eq!(lut.map(0), 32);
        assert_eq!(lut.map(63), 32);
        assert_eq!(lut.map(64), 96);
        assert_eq!(lut.map(200), 224);

        let lut = quantize_lut(1);
        assert!(lut.table().iter().all(|&v| v == 128));

        // 85 * 3 + 42.5 clamps
        assert_eq!(quantize_lut(3).map(255), 255);
    }

    #[test]
    fn test_quantize_is_idempotent() {
        let image = gradient();
        for levels in [1, 2, 3, 4, 7, 16, 100, 255] {
            let once = quantize(&image, levels, None).unwrap();
            let twice = quantize(&once, levels, None).unwrap();
            assert_eq!(once, twice, "levels {levels}");
        }
    }

    #[test]
    fn test_dither_is_deterministic_per_seed() {
        let image = gradient();
        let a = quantize(&image, 5, Some(42)).unwrap();
        let b = quantize(&image, 5, Some(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dither_outputs_are_table_levels() {
        let image = gradient();
        let lut = quantize_lut(6);
        let result = quantize(&image, 6, Some(3)).unwrap();
        for &v in result.channel(0).unwrap().as_u8().unwrap().iter() {
            assert!(lut.table().contains(&v), "{v} is not an output level");
        }
    }

    #[test]
    fn test_dither_checkerboard_sign() {
        // Two levels split at 128; noise is below 64
        let image = Raster::from_plane(Array2::from_elem((8, 8), 128u8)).unwrap();
        let result = quantize(&image, 2, Some(7)).unwrap();
        let out = result.channel(0).unwrap().as_u8().unwrap();

        let mut lowered = 0;
        for ((y, x), &v) in out.indexed_iter() {
            if (x + y) % 2 == 1 {
                assert_eq!(v, 192, "added noise at ({x}, {y})");
            } else if v == 64 {
                lowered += 1;
            }
        }
        assert!(lowered > 0);
    }

    #[test]
    fn test_float_channel_keeps_kind() {
        let image = Raster::from_channels(vec![Channel::F32(array![[10.0f32, 70.4, 250.0]])]).unwrap();
        let result = quantize(&image, 4, None).unwrap();
        assert_eq!(result.channel(0).unwrap().as_f32().unwrap(), &array![[32.0f32, 96.0, 224.0]]);
    }

    #[test]
    fn test_in_place_matches_copy() {
        let image = gradient();
        for seed in [None, Some(11)] {
            let copied = quantize(&image, 8, seed).unwrap();
            let mut in_place = image.clone();
            quantize_in_place(&mut in_place, 8, seed).unwrap();
            assert_eq!(copied, in_place);
        }
    }

    #[test]
    fn test_rejects_out_of_range_levels() {
        let image = gradient();
        assert!(matches!(
            quantize(&image, 0, None),
            Err(FilterError::InvalidParameter { name: "levels", .. })
        ));
        assert!(quantize(&image, 257, Some(1)).is_err());
    }
}
