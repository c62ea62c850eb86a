//! WebAssembly exports for RasterKit filters.
//!
//! These functions are exposed to JavaScript via wasm-bindgen.
//!
//! ## Bit Depth Support
//!
//! All filters have two versions:
//! - **u8**: 8-bit per channel (0-255), standard for web/display
//! - **f32**: Float per channel (0.0-255.0)
//!
//! Pixels are passed as flat interleaved arrays of length
//! `width * height * channels`. Invalid parameters or a length that does not
//! match the dimensions are thrown as JavaScript errors.

use wasm_bindgen::prelude::*;

use crate::error::FilterError;
use crate::filters::levels_curves::StretchBound;
use crate::filters::Adjustment;
use crate::raster::{Raster, Sample};

fn to_js(err: FilterError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn run<T: Sample>(
    data: &[T],
    width: usize,
    height: usize,
    channels: usize,
    adjustment: Adjustment,
) -> Result<Vec<T>, JsValue> {
    let input = Raster::from_interleaved(width, height, channels, data).map_err(to_js)?;
    let output = adjustment.apply(&input).map_err(to_js)?;
    output.to_interleaved::<T>().map_err(to_js)
}

fn bound(value: Option<u8>) -> StretchBound {
    value.map_or(StretchBound::Auto, StretchBound::Fixed)
}

// ============================================================================
// Windowed Filters
// ============================================================================

/// Moving-average blur.
///
/// # Arguments
/// * `data` - Flat array of interleaved samples (length = width * height * channels)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `channels` - Samples per pixel
/// * `window_width` - Horizontal window (1-99)
/// * `window_height` - Vertical window (1-99)
#[wasm_bindgen]
pub fn smooth_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    window_width: usize,
    window_height: usize,
) -> Result<Vec<u8>, JsValue> {
    run(data, width, height, channels, Adjustment::Smooth {
        width: window_width,
        height: window_height,
    })
}

#[wasm_bindgen]
pub fn smooth_f32_wasm(
    data: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    window_width: usize,
    window_height: usize,
) -> Result<Vec<f32>, JsValue> {
    run(data, width, height, channels, Adjustment::Smooth {
        width: window_width,
        height: window_height,
    })
}

#[wasm_bindgen]
pub fn unsharp_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    size: usize,
    factor: f64,
) -> Result<Vec<u8>, JsValue> {
    run(data, width, height, channels, Adjustment::Sharpen { size, factor })
}

#[wasm_bindgen]
pub fn unsharp_f32_wasm(
    data: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    size: usize,
    factor: f64,
) -> Result<Vec<f32>, JsValue> {
    run(data, width, height, channels, Adjustment::Sharpen { size, factor })
}

#[wasm_bindgen]
pub fn median_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    size: usize,
    avg_neighbors: usize,
) -> Result<Vec<u8>, JsValue> {
    run(data, width, height, channels, Adjustment::Median { size, avg_neighbors })
}

#[wasm_bindgen]
pub fn median_f32_wasm(
    data: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    size: usize,
    avg_neighbors: usize,
) -> Result<Vec<f32>, JsValue> {
    run(data, width, height, channels, Adjustment::Median { size, avg_neighbors })
}

// ============================================================================
// Point Filters
// ============================================================================

#[wasm_bindgen]
pub fn brightness_contrast_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    brightness: i32,
    contrast: i32,
) -> Result<Vec<u8>, JsValue> {
    run(data, width, height, channels, Adjustment::BrightnessContrast { brightness, contrast })
}

#[wasm_bindgen]
pub fn brightness_contrast_f32_wasm(
    data: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    brightness: i32,
    contrast: i32,
) -> Result<Vec<f32>, JsValue> {
    run(data, width, height, channels, Adjustment::BrightnessContrast { brightness, contrast })
}

/// Histogram stretch. `undefined` bounds are detected from the image.
#[wasm_bindgen]
pub fn histogram_stretch_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    min: Option<u8>,
    max: Option<u8>,
) -> Result<Vec<u8>, JsValue> {
    run(data, width, height, channels, Adjustment::Stretch {
        min: bound(min),
        max: bound(max),
    })
}

#[wasm_bindgen]
pub fn histogram_stretch_f32_wasm(
    data: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    min: Option<u8>,
    max: Option<u8>,
) -> Result<Vec<f32>, JsValue> {
    run(data, width, height, channels, Adjustment::Stretch {
        min: bound(min),
        max: bound(max),
    })
}

/// Quantize to `levels` output levels, dithered when a seed is given.
#[wasm_bindgen]
pub fn quantize_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    levels: usize,
    dither_seed: Option<u64>,
) -> Result<Vec<u8>, JsValue> {
    run(data, width, height, channels, Adjustment::Quantize { levels, dither_seed })
}

#[wasm_bindgen]
pub fn quantize_f32_wasm(
    data: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    levels: usize,
    dither_seed: Option<u64>,
) -> Result<Vec<f32>, JsValue> {
    run(data, width, height, channels, Adjustment::Quantize { levels, dither_seed })
}

// ============================================================================
// Histogram Filters
// ============================================================================

#[wasm_bindgen]
pub fn histogram_match_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    n: i32,
) -> Result<Vec<u8>, JsValue> {
    run(data, width, height, channels, Adjustment::Match { n })
}

#[wasm_bindgen]
pub fn histogram_match_f32_wasm(
    data: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    n: i32,
) -> Result<Vec<f32>, JsValue> {
    run(data, width, height, channels, Adjustment::Match { n })
}
