//! Separable moving-average smoothing.
//!
//! A box window of `width x height` is applied as two 1-D passes, rows
//! first and then columns, each keeping a running sum so the cost per
//! pixel does not depend on the window size. Borders replicate the edge
//! sample of each line.
//!
//! The same filter provides the blurred copy used by
//! [`unsharp`](super::sharpen::unsharp).

use ndarray::{Array2, ArrayView2, ArrayViewMut1, ArrayViewMut2};

use super::core::check_window;
use crate::error::{FilterError, FilterResult};
use crate::raster::{copy_plane, PlaneOp, Raster, Sample};

/// Replace every sample of `line` with the mean of the `ww` samples centred on it.
///
/// The line is first copied into `buffer` padded on both sides with copies
/// of the edge samples, so reading and writing the same lane is safe. A
/// window of 1 or less, or one longer than the line, leaves it untouched.
/// `buffer` is grown as needed; failing to grow it is an error.
pub fn box_filter_line<T: Sample>(
    mut line: ArrayViewMut1<'_, T>,
    ww: usize,
    buffer: &mut Vec<f64>,
) -> FilterResult<()> {
    let len = line.len();
    if ww <= 1 || ww > len {
        return Ok(());
    }

    let left = (ww - 1) / 2;
    let right = ww - 1 - left;
    let first = line[0].to_f64();
    let last = line[len - 1].to_f64();

    let padded = len + ww - 1;
    buffer.clear();
    buffer
        .try_reserve_exact(padded)
        .map_err(|_| FilterError::AllocationFailed {
            bytes: padded.saturating_mul(std::mem::size_of::<f64>()),
        })?;
    buffer.extend(std::iter::repeat(first).take(left));
    buffer.extend(line.iter().map(|v| v.to_f64()));
    buffer.extend(std::iter::repeat(last).take(right));

    let size = ww as f64;
    let mut sum: f64 = buffer[..ww].iter().sum();
    line[0] = T::from_f64(sum / size);

    // Slide: drop the sample leaving on the left, add the one entering on the right
    for (x, out) in line.iter_mut().enumerate().skip(1) {
        sum += buffer[x + ww - 1] - buffer[x - 1];
        *out = T::from_f64(sum / size);
    }
    Ok(())
}

/// Separable box filter over one plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BoxFilter {
    pub width: usize,
    pub height: usize,
}

impl PlaneOp for BoxFilter {
    fn apply<T: Sample>(&self, plane: ArrayView2<'_, T>) -> FilterResult<Array2<T>> {
        let mut output = copy_plane(plane)?;
        self.apply_in_place(output.view_mut())?;
        Ok(output)
    }

    fn apply_in_place<T: Sample>(&self, mut plane: ArrayViewMut2<'_, T>) -> FilterResult<()> {
        // Horizontal pass
        if self.width > 1 {
            let mut buffer = Vec::new();
            for row in plane.rows_mut() {
                box_filter_line(row, self.width, &mut buffer)?;
            }
        }

        // Vertical pass, on the output of the horizontal one
        if self.height > 1 {
            let mut buffer = Vec::new();
            for column in plane.columns_mut() {
                box_filter_line(column, self.height, &mut buffer)?;
            }
        }

        Ok(())
    }
}

/// Box filter with already validated odd window sizes.
///
/// Windows larger than the image along either axis, or 1x1 windows,
/// produce an identity copy.
pub(crate) fn box_filter(input: &Raster, xsz: usize, ysz: usize) -> FilterResult<Raster> {
    if xsz > input.width() || ysz > input.height() {
        log::debug!(
            "window {xsz}x{ysz} exceeds image {}x{}, copying",
            input.width(),
            input.height()
        );
        return input.try_clone();
    }
    if xsz <= 1 && ysz <= 1 {
        return input.try_clone();
    }
    input.map_channels(&BoxFilter {
        width: xsz,
        height: ysz,
    })
}

/// Smooth every channel with a `width x height` moving average.
///
/// # Arguments
/// * `input` - Image with any number of u8 or f32 channels
/// * `width` - Window width (1-99, even values are rounded up; 1 skips the horizontal pass)
/// * `height` - Window height (1-99, even values are rounded up; 1 skips the vertical pass)
///
/// # Returns
/// Smoothed image with the same header as `input`
pub fn smooth(input: &Raster, width: usize, height: usize) -> FilterResult<Raster> {
    let xsz = check_window("width", width)?;
    let ysz = check_window("height", height)?;
    box_filter(input, xsz, ysz)
}

/// In-place variant of [`smooth`].
pub fn smooth_in_place(image: &mut Raster, width: usize, height: usize) -> FilterResult<()> {
    let xsz = check_window("width", width)?;
    let ysz = check_window("height", height)?;
    if xsz > image.width() || ysz > image.height() || (xsz <= 1 && ysz <= 1) {
        return Ok(());
    }
    image.map_channels_in_place(&BoxFilter {
        width: xsz,
        height: ysz,
    })
}
