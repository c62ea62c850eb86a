//! Error types for raster transforms.
//!
//! Every transform validates its input and parameters before producing any
//! output. Degenerate but valid requests (a window of size 1, or one larger
//! than the image) are not errors: they return an identity copy.

use thiserror::Error;

use crate::raster::SampleKind;

/// Errors that can occur while running a transform.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Width or height is zero, or the plane length does not match them.
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// The image has no channels to process.
    #[error("image has no channels")]
    NoChannels,

    /// A channel does not share the dimensions of the first channel.
    #[error("channel {index} is {}x{}, expected {}x{}", .actual.0, .actual.1, .expected.0, .expected.1)]
    ChannelMismatch {
        index: usize,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// A channel holds a different element kind than the caller asked for.
    #[error("channel {index} holds {actual:?} samples, expected {expected:?}")]
    KindMismatch {
        index: usize,
        expected: SampleKind,
        actual: SampleKind,
    },

    /// A parameter lies outside its documented range.
    #[error("invalid parameter {name} = {value}, expected {range}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        range: &'static str,
    },

    /// A scratch buffer or output plane could not be allocated.
    #[error("failed to allocate {bytes} bytes")]
    AllocationFailed { bytes: usize },

    /// Plane construction from raw samples failed.
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Result type for transform operations
pub type FilterResult<T> = Result<T, FilterError>;
