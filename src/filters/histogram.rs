//! Histogram matching.
//!
//! Redistributes the intensities of each channel so that its histogram
//! approaches a synthesized target shape:
//!
//! | `n` | Target |
//! |-----|--------|
//! | 0 | flat (equalization) |
//! | > 0 | `256 * (i / 256)^n`, skewed toward bright levels |
//! | < 0 | `256 * (1 - i / 256)^|n|`, skewed toward dark levels |
//!
//! Every source level owns an interval of destination levels. Pixels fill
//! the destination levels of their interval in order, moving to the next
//! level once the current one holds its target count. The mapping is
//! monotonic: a darker input never becomes brighter than a brighter one.
//!
//! Each channel is matched on its own histogram, not on one shared across
//! channels.

use ndarray::{Array2, ArrayView2, Zip};

use super::core::{check_range, Histogram, LEVELS};
use crate::error::FilterResult;
use crate::raster::{alloc_plane, PlaneOp, Raster, Sample};

/// Lowest accepted shape parameter.
pub const MATCH_MIN: i32 = -100;

/// Highest accepted shape parameter.
pub const MATCH_MAX: i32 = 100;

/// Target bin counts for shape `n`, summing exactly to `total`.
pub fn target_histogram(n: i32, total: u64) -> [u64; LEVELS] {
    let mut target = [0u64; LEVELS];
    let bins = LEVELS as u64;

    if n == 0 {
        let average = total / bins;
        target.iter_mut().for_each(|t| *t = average);
        target[LEVELS - 1] = total - average * (bins - 1);
        return target;
    }

    let exponent = n.abs();
    for (i, t) in target.iter_mut().enumerate() {
        let x = i as f64 / LEVELS as f64;
        let base = if n > 0 { x } else { 1.0 - x };
        *t = (base.powi(exponent) * LEVELS as f64 + 0.5) as u64;
    }

    let sum: u64 = target.iter().sum();
    let scale = total as f64 / sum as f64;
    target.iter_mut().for_each(|t| *t = (*t as f64 * scale) as u64);

    // Truncation leftovers go to the tallest bin
    let peak = if n > 0 { LEVELS - 1 } else { 0 };
    let sum: u64 = target.iter().sum();
    if sum < total {
        target[peak] += total - sum;
    } else {
        target[peak] = target[peak].saturating_sub(sum - total);
    }
    target
}

/// Destination intervals for every source level.
#[derive(Debug, Clone)]
pub struct IntervalMapping {
    left: [u8; LEVELS],
    right: [u8; LEVELS],
    target: [u64; LEVELS],
    fill: [u64; LEVELS],
}

impl IntervalMapping {
    /// Sweep the source histogram against the target, assigning each source
    /// level the destination levels its accumulated mass spans.
    pub fn build(source: &Histogram, target: [u64; LEVELS]) -> Self {
        let mut left = [0u8; LEVELS];
        let mut right = [0u8; LEVELS];
        let mut r = 0usize;
        let mut sum = 0u64;

        for (i, &count) in source.bins().iter().enumerate() {
            left[i] = r as u8;
            sum += count as u64;
            while sum > target[r] && r < LEVELS - 1 {
                sum -= target[r];
                r += 1;
            }
            right[i] = r as u8;
        }

        IntervalMapping {
            left,
            right,
            target,
            fill: [0; LEVELS],
        }
    }

    /// Interval `(left, right)` currently assigned to `level`.
    pub fn interval(&self, level: u8) -> (u8, u8) {
        (self.left[level as usize], self.right[level as usize])
    }

    /// Destination level for the next pixel of source `level`.
    ///
    /// Once the current destination level is full the source level moves
    /// one step right, never past the end of its interval.
    pub fn map(&mut self, level: u8) -> u8 {
        let v = level as usize;
        let mut p = self.left[v];
        if self.fill[p as usize] >= self.target[p as usize] {
            p = p.saturating_add(1).min(self.right[v]);
            self.left[v] = p;
        }
        self.fill[p as usize] += 1;
        p
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HistogramMatch {
    n: i32,
}

impl PlaneOp for HistogramMatch {
    fn apply<T: Sample>(&self, plane: ArrayView2<'_, T>) -> FilterResult<Array2<T>> {
        let (h, w) = plane.dim();
        let source = Histogram::from_plane(plane);
        let mut mapping = IntervalMapping::build(&source, target_histogram(self.n, source.total()));

        let mut output = alloc_plane::<T>(h, w)?;
        Zip::from(&mut output)
            .and(&plane)
            .for_each(|o, &v| *o = T::from_level(mapping.map(v.level())));
        Ok(output)
    }
}

pub(crate) fn validate(n: i32) -> FilterResult<()> {
    check_range("n", n, MATCH_MIN, MATCH_MAX, "-100..=100")
}

/// Match every channel's histogram to the target shape `n`.
///
/// # Arguments
/// * `input` - Image with any number of u8 or f32 channels
/// * `n` - Shape parameter: -100 to 100, 0 = flat
///
/// # Returns
/// Image with the same header as `input`; each channel is matched on its
/// own histogram.
pub fn histogram_match(input: &Raster, n: i32) -> FilterResult<Raster> {
    validate(n)?;
    input.map_channels(&HistogramMatch { n })
}

/// In-place variant of [`histogram_match`].
pub fn histogram_match_in_place(image: &mut Raster, n: i32) -> FilterResult<()> {
    validate(n)?;
    image.map_channels_in_place(&HistogramMatch { n })
}
