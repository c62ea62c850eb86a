//! Noise removal: sliding-window median.
//!
//! The median of a square `size x size` window is read from a running
//! 256-bin histogram. Each output row seeds the histogram once, then every
//! step right removes the column leaving the window and adds the one
//! entering it, so a step costs `O(size)` histogram updates plus a 256-bin
//! scan, independent of the window area.
//!
//! The window is centred on the output pixel. Rows and columns outside the
//! image replicate the nearest edge, as in [`smooth`](super::blur::smooth).
//!
//! Float channels are binned to their nearest 8-bit level.

use ndarray::{Array2, ArrayView2};

use super::core::{check_range, check_window, Histogram};
use crate::error::FilterResult;
use crate::raster::{alloc_plane, try_alloc, PlaneOp, Raster, Sample};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MedianFilter {
    size: usize,
    avg_neighbors: usize,
}

impl MedianFilter {
    /// Output level for the current window contents.
    #[inline]
    fn select(&self, hist: &Histogram) -> u8 {
        let area = (self.size * self.size) as u64;
        let mid = area / 2 + 1;
        let k = self.avg_neighbors as u64;
        if k == 0 {
            hist.rank_level(mid)
        } else {
            (hist.rank_sum(mid - k, mid + k) / (2 * k + 1)) as u8
        }
    }
}

impl PlaneOp for MedianFilter {
    fn apply<T: Sample>(&self, plane: ArrayView2<'_, T>) -> FilterResult<Array2<T>> {
        let (h, w) = plane.dim();
        let r = self.size / 2;
        let mut output = alloc_plane::<T>(h, w)?;
        let mut rows = try_alloc(self.size, 0usize)?;
        let mut hist = Histogram::new();

        for y in 0..h {
            for (i, row) in rows.iter_mut().enumerate() {
                *row = (y + i).saturating_sub(r).min(h - 1);
            }

            // Seed with the window centred on column 0
            hist.clear();
            for dx in 0..self.size {
                let sx = dx.saturating_sub(r).min(w - 1);
                for &sy in rows.iter() {
                    hist.increment(plane[[sy, sx]].level());
                }
            }

            for x in 0..w {
                output[[y, x]] = T::from_level(self.select(&hist));

                if x + 1 < w {
                    let leaving = x.saturating_sub(r);
                    let entering = (x + r + 1).min(w - 1);
                    for &sy in rows.iter() {
                        hist.decrement(plane[[sy, leaving]].level());
                        hist.increment(plane[[sy, entering]].level());
                    }
                }
            }
        }

        Ok(output)
    }
}

/// Apply a median filter to every channel.
///
/// # Arguments
/// * `input` - Image with any number of u8 or f32 channels
/// * `size` - Window size (1-99, even values are rounded up)
/// * `avg_neighbors` - Number of ranks on each side of the median averaged
///   into the output (0 = plain median, at most `(size * size - 1) / 2`)
///
/// # Returns
/// Median-filtered image with the same header as `input`. A window of 1, or
/// one larger than the image, returns a copy.
pub fn median(input: &Raster, size: usize, avg_neighbors: usize) -> FilterResult<Raster> {
    let size = validate(size, avg_neighbors)?;
    if size <= 1 || size > input.width() || size > input.height() {
        log::debug!(
            "median window {size} is degenerate for {}x{}, copying",
            input.width(),
            input.height()
        );
        return input.try_clone();
    }

    input.map_channels(&MedianFilter {
        size,
        avg_neighbors,
    })
}

/// In-place variant of [`median`].
pub fn median_in_place(image: &mut Raster, size: usize, avg_neighbors: usize) -> FilterResult<()> {
    let size = validate(size, avg_neighbors)?;
    if size <= 1 || size > image.width() || size > image.height() {
        return Ok(());
    }
    image.map_channels_in_place(&MedianFilter {
        size,
        avg_neighbors,
    })
}

/// Check median parameters, returning the normalised window size.
pub(crate) fn validate(size: usize, avg_neighbors: usize) -> FilterResult<usize> {
    let size = check_window("size", size)?;
    check_range(
        "avg_neighbors",
        avg_neighbors,
        0,
        (size * size - 1) / 2,
        "0..=(size*size-1)/2",
    )?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use ndarray::array;

    /// Sort-based centred median with replicated borders.
    fn naive_median(plane: &Array2<u8>, size: usize) -> Array2<u8> {
        let (h, w) = plane.dim();
        let r = (size / 2) as isize;
        Array2::from_shape_fn((h, w), |(y, x)| {
            let mut values = Vec::with_capacity(size * size);
            for dy in -r..=r {
                let sy = (y as isize + dy).clamp(0, h as isize - 1) as usize;
                for dx in -r..=r {
                    let sx = (x as isize + dx).clamp(0, w as isize - 1) as usize;
                    values.push(plane[[sy, sx]]);
                }
            }
            values.sort_unstable();
            values[values.len() / 2]
        })
    }

    #[test]
    fn test_median_constant_image_any_size() {
        let image = Raster::from_plane(Array2::from_elem((11, 13), 77u8)).unwrap();
        for size in [1, 3, 5, 7, 9, 11] {
            let result = median(&image, size, 0).unwrap();
            assert!(
                result.channel(0).unwrap().as_u8().unwrap().iter().all(|&v| v == 77),
                "size {size}"
            );
        }
    }

    #[test]
    fn test_median_removes_salt_pepper() {
        let mut plane = Array2::from_elem((5, 5), 128u8);
        plane[[2, 2]] = 255;
        plane[[0, 4]] = 0;
        let image = Raster::from_plane(plane).unwrap();

        let result = median(&image, 3, 0).unwrap();
        let out = result.channel(0).unwrap().as_u8().unwrap();
        assert_eq!(out[[2, 2]], 128);
        assert_eq!(out[[0, 4]], 128);
    }

    #[test]
    fn test_median_matches_sorted_reference() {
        let plane = Array2::from_shape_fn((9, 14), |(y, x)| ((x * 73 + y * 29 + x * y) % 256) as u8);
        let image = Raster::from_plane(plane.clone()).unwrap();

        for size in [3, 5, 7] {
            let result = median(&image, size, 0).unwrap();
            assert_eq!(
                result.channel(0).unwrap().as_u8().unwrap(),
                &naive_median(&plane, size),
                "size {size}"
            );
        }
    }

    #[test]
    fn test_median_preserves_edge() {
        let plane = Array2::from_shape_fn((5, 6), |(_, x)| if x < 3 { 10u8 } else { 200 });
        let image = Raster::from_plane(plane.clone()).unwrap();
        let result = median(&image, 3, 0).unwrap();
        assert_eq!(result.channel(0).unwrap().as_u8().unwrap(), &plane);
    }

    #[test]
    fn test_averaged_neighbors() {
        // Window at the centre holds 0..=8 once each: median 4
        let plane = array![[0u8, 1, 2], [3, 4, 5], [6, 7, 8]];
        let image = Raster::from_plane(plane).unwrap();

        let plain = median(&image, 3, 0).unwrap();
        assert_eq!(plain.channel(0).unwrap().as_u8().unwrap()[[1, 1]], 4);

        // Ranks 4..=6 -> (3 + 4 + 5) / 3
        let averaged = median(&image, 3, 1).unwrap();
        assert_eq!(averaged.channel(0).unwrap().as_u8().unwrap()[[1, 1]], 4);

        // All nine ranks -> 36 / 9
        let full = median(&image, 3, 4).unwrap();
        assert_eq!(full.channel(0).unwrap().as_u8().unwrap()[[1, 1]], 4);
    }

    #[test]
    fn test_averaged_neighbors_skewed_window() {
        // Centre window sorted: 0 0 0 0 10 10 10 90 90
        let plane = array![[0u8, 0, 10], [0, 10, 90], [0, 10, 90]];
        let image = Raster::from_plane(plane).unwrap();

        let plain = median(&image, 3, 0).unwrap();
        assert_eq!(plain.channel(0).unwrap().as_u8().unwrap()[[1, 1]], 10);

        // Ranks 3..=7: 0 0 10 10 10 -> 30 / 5
        let averaged = median(&image, 3, 2).unwrap();
        assert_eq!(averaged.channel(0).unwrap().as_u8().unwrap()[[1, 1]], 6);
    }

    #[test]
    fn test_median_float_channel() {
        let mut plane = Array2::from_elem((4, 4), 20.2f32);
        plane[[1, 1]] = 250.0;
        let image = Raster::from_plane(plane).unwrap();

        let result = median(&image, 3, 0).unwrap();
        let out = result.channel(0).unwrap().as_f32().unwrap();
        assert!(out.iter().all(|&v| v == 20.0));
    }

    #[test]
    fn test_median_degenerate_windows_copy() {
        let plane = Array2::from_shape_fn((3, 8), |(y, x)| (x * 30 + y) as u8);
        let image = Raster::from_plane(plane).unwrap();
        assert_eq!(median(&image, 1, 0).unwrap(), image);
        assert_eq!(median(&image, 5, 0).unwrap(), image);
    }

    #[test]
    fn test_median_in_place_matches_copy() {
        let plane = Array2::from_shape_fn((8, 10), |(y, x)| ((x * 41 + y * 17) % 256) as u8);
        let image = Raster::from_plane(plane).unwrap();
        let copied = median(&image, 5, 1).unwrap();
        let mut in_place = image.clone();
        median_in_place(&mut in_place, 5, 1).unwrap();
        assert_eq!(copied, in_place);
    }

    #[test]
    fn test_median_rejects_bad_parameters() {
        let image = Raster::from_plane(Array2::from_elem((5, 5), 1u8)).unwrap();
        assert!(matches!(
            median(&image, 3, 5),
            Err(FilterError::InvalidParameter { name: "avg_neighbors", .. })
        ));
        assert!(matches!(
            median(&image, 0, 0),
            Err(FilterError::InvalidParameter { name: "size", .. })
        ));
        assert!(median(&image, 1, 1).is_err());
    }
}
