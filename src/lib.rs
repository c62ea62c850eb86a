//! RasterKit Rust Extensions
//!
//! Pixel-level image transforms for an interactive editor, implemented in
//! Rust with Python bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Image Format
//! Images are [`raster::Raster`] values: a width, a height and any number of
//! equally sized channel planes. Each plane holds one of:
//! - `u8`: 8-bit samples (0-255)
//! - `f32`: float samples on the same scale (0.0-255.0)
//!
//! Hosts pass interleaved `(height, width, channels)` arrays, which are
//! split into planes on the way in and interleaved again on the way out.
//!
//! ## Filter Architecture
//! Every transform keeps the header of its input: output dimensions,
//! channel count and channel kinds always match. Parameters are validated
//! before any pixel is written and failures come back as
//! [`error::FilterError`].
//!
//! ```
//! use rasterkit_rust::filters::blur::smooth;
//! use rasterkit_rust::raster::Raster;
//!
//! let data: Vec<u8> = (0..48).collect();
//! let image = Raster::from_interleaved(4, 4, 3, &data).unwrap();
//! let smoothed = smooth(&image, 3, 3).unwrap();
//! assert_eq!(smoothed.header(), image.header());
//! ```

pub mod error;
pub mod filters;
pub mod raster;

#[cfg(feature = "wasm")]
pub mod wasm;

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{Element, IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::{PyMemoryError, PyValueError};
    use pyo3::prelude::*;

    use crate::error::FilterError;
    use crate::filters::levels_curves::{self, StretchBound};
    use crate::filters::Adjustment;
    use crate::raster::{Raster, Sample};

    impl From<FilterError> for PyErr {
        fn from(err: FilterError) -> PyErr {
            match err {
                FilterError::AllocationFailed { .. } => PyMemoryError::new_err(err.to_string()),
                _ => PyValueError::new_err(err.to_string()),
            }
        }
    }

    /// Split a numpy image into planes, run one transform, interleave again.
    fn run<'py, T: Sample + Element>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, T>,
        adjustment: Adjustment,
    ) -> PyResult<Bound<'py, PyArray3<T>>> {
        let input = Raster::from_hwc(image.as_array())?;
        let output = adjustment.apply(&input)?;
        Ok(output.to_hwc::<T>()?.into_pyarray(py))
    }

    fn bound(value: Option<u8>) -> StretchBound {
        value.map_or(StretchBound::Auto, StretchBound::Fixed)
    }

    // ========================================================================
    // Windowed Filters
    // ========================================================================

    /// Moving-average blur (u8). Even window sizes are rounded up.
    #[pyfunction]
    #[pyo3(signature = (image, width=3, height=3))]
    pub fn smooth<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        width: usize,
        height: usize,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, Adjustment::Smooth { width, height })
    }

    #[pyfunction]
    #[pyo3(signature = (image, width=3, height=3))]
    pub fn smooth_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        width: usize,
        height: usize,
    ) -> PyResult<Bound<'py, PyArray3<f32>>> {
        run(py, image, Adjustment::Smooth { width, height })
    }

    /// Unsharp mask (u8).
    ///
    /// # Arguments
    /// * `image` - Input image (any channel count)
    /// * `size` - Blur window size (1-99)
    /// * `factor` - Detail weight (0.0-5.0)
    #[pyfunction]
    #[pyo3(signature = (image, size=3, factor=1.0))]
    pub fn unsharp<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        size: usize,
        factor: f64,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, Adjustment::Sharpen { size, factor })
    }

    #[pyfunction]
    #[pyo3(signature = (image, size=3, factor=1.0))]
    pub fn unsharp_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        size: usize,
        factor: f64,
    ) -> PyResult<Bound<'py, PyArray3<f32>>> {
        run(py, image, Adjustment::Sharpen { size, factor })
    }

    #[pyfunction]
    #[pyo3(signature = (image, size=3, avg_neighbors=0))]
    pub fn median<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        size: usize,
        avg_neighbors: usize,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, Adjustment::Median { size, avg_neighbors })
    }

    #[pyfunction]
    #[pyo3(signature = (image, size=3, avg_neighbors=0))]
    pub fn median_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        size: usize,
        avg_neighbors: usize,
    ) -> PyResult<Bound<'py, PyArray3<f32>>> {
        run(py, image, Adjustment::Median { size, avg_neighbors })
    }

    // ========================================================================
    // Point Filters
    // ========================================================================

    #[pyfunction]
    #[pyo3(signature = (image, brightness=0, contrast=0))]
    pub fn brightness_contrast<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        brightness: i32,
        contrast: i32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, Adjustment::BrightnessContrast { brightness, contrast })
    }

    #[pyfunction]
    #[pyo3(signature = (image, brightness=0, contrast=0))]
    pub fn brightness_contrast_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        brightness: i32,
        contrast: i32,
    ) -> PyResult<Bound<'py, PyArray3<f32>>> {
        run(py, image, Adjustment::BrightnessContrast { brightness, contrast })
    }

    /// Histogram stretch (u8). `None` bounds are detected from the image.
    ///
    /// Returns `(image, min, max)` with the range actually used.
    #[pyfunction]
    #[pyo3(signature = (image, min=None, max=None))]
    pub fn histogram_stretch<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        min: Option<u8>,
        max: Option<u8>,
    ) -> PyResult<(Bound<'py, PyArray3<u8>>, u8, u16)> {
        let input = Raster::from_hwc(image.as_array())?;
        let (output, range) = levels_curves::histogram_stretch(&input, bound(min), bound(max))?;
        Ok((output.to_hwc::<u8>()?.into_pyarray(py), range.min, range.max))
    }

    #[pyfunction]
    #[pyo3(signature = (image, min=None, max=None))]
    pub fn histogram_stretch_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        min: Option<u8>,
        max: Option<u8>,
    ) -> PyResult<(Bound<'py, PyArray3<f32>>, u8, u16)> {
        let input = Raster::from_hwc(image.as_array())?;
        let (output, range) = levels_curves::histogram_stretch(&input, bound(min), bound(max))?;
        Ok((output.to_hwc::<f32>()?.into_pyarray(py), range.min, range.max))
    }

    #[pyfunction]
    #[pyo3(signature = (image, levels=8, dither_seed=None))]
    pub fn quantize<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        levels: usize,
        dither_seed: Option<u64>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, Adjustment::Quantize { levels, dither_seed })
    }

    #[pyfunction]
    #[pyo3(signature = (image, levels=8, dither_seed=None))]
    pub fn quantize_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        levels: usize,
        dither_seed: Option<u64>,
    ) -> PyResult<Bound<'py, PyArray3<f32>>> {
        run(py, image, Adjustment::Quantize { levels, dither_seed })
    }

    // ========================================================================
    // Histogram Filters
    // ========================================================================

    /// Histogram matching (u8): 0 = flat, > 0 brighter, < 0 darker.
    #[pyfunction]
    #[pyo3(signature = (image, n=0))]
    pub fn histogram_match<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        n: i32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, Adjustment::Match { n })
    }

    #[pyfunction]
    #[pyo3(signature = (image, n=0))]
    pub fn histogram_match_f32<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, f32>,
        n: i32,
    ) -> PyResult<Bound<'py, PyArray3<f32>>> {
        run(py, image, Adjustment::Match { n })
    }

    #[pymodule]
    pub fn rasterkit_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Windowed filters
        m.add_function(wrap_pyfunction!(smooth, m)?)?;
        m.add_function(wrap_pyfunction!(smooth_f32, m)?)?;
        m.add_function(wrap_pyfunction!(unsharp, m)?)?;
        m.add_function(wrap_pyfunction!(unsharp_f32, m)?)?;
        m.add_function(wrap_pyfunction!(median, m)?)?;
        m.add_function(wrap_pyfunction!(median_f32, m)?)?;

        // Point filters
        m.add_function(wrap_pyfunction!(brightness_contrast, m)?)?;
        m.add_function(wrap_pyfunction!(brightness_contrast_f32, m)?)?;
        m.add_function(wrap_pyfunction!(histogram_stretch, m)?)?;
        m.add_function(wrap_pyfunction!(histogram_stretch_f32, m)?)?;
        m.add_function(wrap_pyfunction!(quantize, m)?)?;
        m.add_function(wrap_pyfunction!(quantize_f32, m)?)?;

        // Histogram filters
        m.add_function(wrap_pyfunction!(histogram_match, m)?)?;
        m.add_function(wrap_pyfunction!(histogram_match_f32, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::rasterkit_rust;
