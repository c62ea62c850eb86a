//! Core utilities shared by multiple filters.
//!
//! This module provides:
//! - 256-bin intensity histograms
//! - Lookup-table point transforms
//! - Window size and parameter range validation

use std::fmt::Display;

use ndarray::{Array2, ArrayView2, ArrayViewMut2, Zip};

use crate::error::{FilterError, FilterResult};
use crate::raster::{alloc_plane, Channel, PlaneOp, Raster, Sample};

/// Number of 8-bit intensity levels.
pub const LEVELS: usize = 256;

/// Smallest accepted window size for windowed filters.
pub const WINDOW_MIN: usize = 1;

/// Largest accepted window size for windowed filters.
pub const WINDOW_MAX: usize = 99;

// ============================================================================
// Histogram
// ============================================================================

/// Occupancy count per intensity level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    bins: [u32; LEVELS],
}

impl Default for Histogram {
    fn default() -> Self {
        Histogram { bins: [0; LEVELS] }
    }
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Histogram of one plane.
    pub fn from_plane<T: Sample>(plane: ArrayView2<'_, T>) -> Self {
        let mut hist = Self::new();
        hist.accumulate(plane);
        hist
    }

    /// Histogram accumulated over every channel of an image.
    pub fn from_raster(image: &Raster) -> Self {
        let mut hist = Self::new();
        for channel in image.channels() {
            match channel {
                Channel::U8(plane) => hist.accumulate(plane.view()),
                Channel::F32(plane) => hist.accumulate(plane.view()),
            }
        }
        hist
    }

    pub fn accumulate<T: Sample>(&mut self, plane: ArrayView2<'_, T>) {
        for &v in plane.iter() {
            self.bins[v.level() as usize] += 1;
        }
    }

    #[inline]
    pub fn increment(&mut self, level: u8) {
        self.bins[level as usize] += 1;
    }

    #[inline]
    pub fn decrement(&mut self, level: u8) {
        self.bins[level as usize] -= 1;
    }

    #[inline]
    pub fn count(&self, level: u8) -> u32 {
        self.bins[level as usize]
    }

    pub fn bins(&self) -> &[u32; LEVELS] {
        &self.bins
    }

    pub fn clear(&mut self) {
        self.bins = [0; LEVELS];
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().map(|&c| c as u64).sum()
    }

    /// Lowest occupied level.
    pub fn min_level(&self) -> Option<u8> {
        self.bins.iter().position(|&c| c > 0).map(|i| i as u8)
    }

    /// Highest occupied level.
    pub fn max_level(&self) -> Option<u8> {
        self.bins.iter().rposition(|&c| c > 0).map(|i| i as u8)
    }

    /// Level holding the sample of 1-based `rank` in sorted order.
    pub fn rank_level(&self, rank: u64) -> u8 {
        let mut sum = 0u64;
        for (level, &count) in self.bins.iter().enumerate() {
            sum += count as u64;
            if sum >= rank {
                return level as u8;
            }
        }
        u8::MAX
    }

    /// Sum of the samples ranked `first..=last` (1-based) in sorted order.
    pub fn rank_sum(&self, first: u64, last: u64) -> u64 {
        let mut sum = 0u64;
        let mut seen = 0u64;
        for (level, &count) in self.bins.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let lo = seen + 1;
            let hi = seen + count as u64;
            seen = hi;
            let overlap_lo = lo.max(first);
            let overlap_hi = hi.min(last);
            if overlap_lo <= overlap_hi {
                sum += (overlap_hi - overlap_lo + 1) * level as u64;
            }
            if seen >= last {
                break;
            }
        }
        sum
    }
}

// ============================================================================
// Lookup table
// ============================================================================

/// 256-entry intensity remapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lut {
    table: [u8; LEVELS],
}

impl Lut {
    /// Build a table from a closed-form level function.
    ///
    /// Each value is clamped to 0-255 and truncated.
    pub fn from_fn<F: Fn(u8) -> f64>(f: F) -> Self {
        let mut table = [0u8; LEVELS];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = f(i as u8).clamp(0.0, 255.0) as u8;
        }
        Lut { table }
    }

    pub fn identity() -> Self {
        Self::from_fn(|i| i as f64)
    }

    #[inline]
    pub fn map(&self, level: u8) -> u8 {
        self.table[level as usize]
    }

    pub fn table(&self) -> &[u8; LEVELS] {
        &self.table
    }

    /// Remap every sample of every channel into a new image.
    pub fn remap(&self, input: &Raster) -> FilterResult<Raster> {
        input.map_channels(self)
    }

    /// Remap every sample of every channel in place.
    pub fn remap_in_place(&self, image: &mut Raster) -> FilterResult<()> {
        image.map_channels_in_place(self)
    }
}

impl PlaneOp for Lut {
    fn apply<T: Sample>(&self, plane: ArrayView2<'_, T>) -> FilterResult<Array2<T>> {
        let (height, width) = plane.dim();
        let mut output = alloc_plane::<T>(height, width)?;
        Zip::from(&mut output)
            .and(&plane)
            .for_each(|o, &v| *o = T::from_level(self.map(v.level())));
        Ok(output)
    }

    fn apply_in_place<T: Sample>(&self, mut plane: ArrayViewMut2<'_, T>) -> FilterResult<()> {
        plane.mapv_inplace(|v| T::from_level(self.map(v.level())));
        Ok(())
    }
}

// ============================================================================
// Parameter validation
// ============================================================================

/// Force a window size odd by incrementing even values.
pub fn odd_window(size: usize) -> usize {
    if size % 2 == 0 {
        size + 1
    } else {
        size
    }
}

/// Reject `value` unless it lies in `min..=max`.
pub(crate) fn check_range<T: PartialOrd + Display>(
    name: &'static str,
    value: T,
    min: T,
    max: T,
    range: &'static str,
) -> FilterResult<()> {
    if value < min || value > max {
        return Err(FilterError::InvalidParameter {
            name,
            value: value.to_string(),
            range,
        });
    }
    Ok(())
}

/// Validate a window size and normalise it to the next odd value.
pub(crate) fn check_window(name: &'static str, size: usize) -> FilterResult<usize> {
    check_range(name, size, WINDOW_MIN, WINDOW_MAX, "1..=99")?;
    let odd = odd_window(size);
    if odd != size {
        log::debug!("{name} {size} is even, using {odd}");
    }
    Ok(odd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_histogram_counts_and_bounds() {
        let plane = array![[3u8, 3, 7], [200, 3, 7]];
        let hist = Histogram::from_plane(plane.view());

        assert_eq!(hist.count(3), 3);
        assert_eq!(hist.count(7), 2);
        assert_eq!(hist.total(), 6);
        assert_eq!(hist.min_level(), Some(3));
        assert_eq!(hist.max_level(), Some(200));
        assert_eq!(Histogram::new().min_level(), None);
    }

    #[test]
    fn test_histogram_rank_queries() {
        // Sorted: 1 1 4 4 4 9
        let plane = array![[4u8, 1, 9], [4, 1, 4]];
        let hist = Histogram::from_plane(plane.view());

        assert_eq!(hist.rank_level(1), 1);
        assert_eq!(hist.rank_level(3), 4);
        assert_eq!(hist.rank_level(6), 9);
        assert_eq!(hist.rank_sum(2, 4), 1 + 4 + 4);
        assert_eq!(hist.rank_sum(1, 6), 23);
    }

    #[test]
    fn test_histogram_float_plane_uses_levels() {
        let plane = array![[0.4f32, 1.6, 254.9]];
        let hist = Histogram::from_plane(plane.view());
        assert_eq!(hist.count(0), 1);
        assert_eq!(hist.count(2), 1);
        assert_eq!(hist.count(255), 1);
    }

    #[test]
    fn test_lut_from_fn_clamps_and_truncates() {
        let lut = Lut::from_fn(|i| i as f64 * 1.5 - 10.0);
        assert_eq!(lut.map(0), 0);
        assert_eq!(lut.map(9), 3);
        assert_eq!(lut.map(255), 255);
    }

    #[test]
    fn test_lut_remap_and_in_place_agree() {
        let lut = Lut::from_fn(|i| 255.0 - i as f64);
        let image = Raster::from_plane(array![[0u8, 10], [128, 255]]).unwrap();

        let remapped = lut.remap(&image).unwrap();
        let mut in_place = image.clone();
        lut.remap_in_place(&mut in_place).unwrap();

        assert_eq!(remapped, in_place);
        assert_eq!(
            remapped.channel(0).unwrap().as_u8().unwrap(),
            &array![[255u8, 245], [127, 0]]
        );
    }

    #[test]
    fn test_lut_on_float_channel_keeps_kind() {
        let lut = Lut::identity();
        let image = Raster::from_plane(array![[3.2f32, 99.7]]).unwrap();
        let result = lut.remap(&image).unwrap();
        assert_eq!(result.channel(0).unwrap().as_f32().unwrap(), &array![[3.0f32, 100.0]]);
    }

    #[test]
    fn test_check_window_normalises_even() {
        assert_eq!(check_window("size", 1).unwrap(), 1);
        assert_eq!(check_window("size", 4).unwrap(), 5);
        assert_eq!(check_window("size", 99).unwrap(), 99);
        assert!(check_window("size", 0).is_err());
        assert!(check_window("size", 100).is_err());
    }
}
