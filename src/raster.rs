//! Raster images made of independent channel planes.
//!
//! A [`Raster`] is a width, a height and an ordered list of [`Channel`]s.
//! Each channel is a row-major `(height, width)` plane of one element kind:
//!
//! | Kind | Storage | Range |
//! |------|---------|-------|
//! | [`SampleKind::U8`] | `Array2<u8>` | 0-255 |
//! | [`SampleKind::F32`] | `Array2<f32>` | 0.0-255.0 |
//!
//! Float planes share the 8-bit intensity scale, so casting a `u8` plane to
//! `f32` preserves every value. Algorithms are written once against the
//! [`Sample`] trait and run over either variant through [`PlaneOp`].

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut2, Axis};

use crate::error::{FilterError, FilterResult};

/// Element kind of a channel plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    U8,
    F32,
}

/// Arithmetic contract shared by both element kinds.
pub trait Sample: Copy + Default + PartialEq + std::fmt::Debug + 'static {
    const KIND: SampleKind;

    fn to_f64(self) -> f64;

    /// Convert back from real arithmetic. Integer samples clamp and truncate.
    fn from_f64(value: f64) -> Self;

    /// Nearest 8-bit intensity level, used to index histograms and tables.
    fn level(self) -> u8;

    fn from_level(level: u8) -> Self;

    fn wrap(plane: Array2<Self>) -> Channel;

    fn plane(channel: &Channel) -> Option<ArrayView2<'_, Self>>;
}

impl Sample for u8 {
    const KIND: SampleKind = SampleKind::U8;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value.clamp(0.0, 255.0) as u8
    }

    #[inline]
    fn level(self) -> u8 {
        self
    }

    #[inline]
    fn from_level(level: u8) -> Self {
        level
    }

    fn wrap(plane: Array2<Self>) -> Channel {
        Channel::U8(plane)
    }

    fn plane(channel: &Channel) -> Option<ArrayView2<'_, Self>> {
        match channel {
            Channel::U8(plane) => Some(plane.view()),
            Channel::F32(_) => None,
        }
    }
}

impl Sample for f32 {
    const KIND: SampleKind = SampleKind::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn level(self) -> u8 {
        // NaN casts to 0
        self.round().clamp(0.0, 255.0) as u8
    }

    #[inline]
    fn from_level(level: u8) -> Self {
        level as f32
    }

    fn wrap(plane: Array2<Self>) -> Channel {
        Channel::F32(plane)
    }

    fn plane(channel: &Channel) -> Option<ArrayView2<'_, Self>> {
        match channel {
            Channel::F32(plane) => Some(plane.view()),
            Channel::U8(_) => None,
        }
    }
}

/// A per-plane algorithm written once for every [`Sample`] type.
pub trait PlaneOp {
    fn apply<T: Sample>(&self, plane: ArrayView2<'_, T>) -> FilterResult<Array2<T>>;

    /// Overwrite `plane` with the result of [`PlaneOp::apply`].
    fn apply_in_place<T: Sample>(&self, mut plane: ArrayViewMut2<'_, T>) -> FilterResult<()> {
        let result = self.apply(plane.view())?;
        plane.assign(&result);
        Ok(())
    }
}

/// Allocate a buffer of `len` copies of `value`, reporting failure instead of aborting.
pub(crate) fn try_alloc<T: Clone>(len: usize, value: T) -> FilterResult<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| FilterError::AllocationFailed {
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    buffer.resize(len, value);
    Ok(buffer)
}

/// Allocate a zeroed `(height, width)` plane.
pub(crate) fn alloc_plane<T: Sample>(height: usize, width: usize) -> FilterResult<Array2<T>> {
    let len = height
        .checked_mul(width)
        .ok_or(FilterError::InvalidDimensions { width, height })?;
    Ok(Array2::from_shape_vec((height, width), try_alloc(len, T::default())?)?)
}

/// Copy a plane into freshly allocated storage.
pub(crate) fn copy_plane<T: Sample>(plane: ArrayView2<'_, T>) -> FilterResult<Array2<T>> {
    let (height, width) = plane.dim();
    let mut copy = alloc_plane(height, width)?;
    copy.assign(&plane);
    Ok(copy)
}

fn cast_plane<S: Sample, D: Sample>(plane: ArrayView2<'_, S>) -> FilterResult<Array2<D>> {
    let (height, width) = plane.dim();
    let mut result = alloc_plane::<D>(height, width)?;
    result
        .iter_mut()
        .zip(plane.iter())
        .for_each(|(d, &s)| *d = D::from_f64(s.to_f64()));
    Ok(result)
}

/// One scalar plane of a raster image.
#[derive(Debug, Clone, PartialEq)]
pub enum Channel {
    U8(Array2<u8>),
    F32(Array2<f32>),
}

impl Channel {
    /// Allocate a zeroed plane of the given kind.
    pub fn zeros(kind: SampleKind, height: usize, width: usize) -> FilterResult<Self> {
        Ok(match kind {
            SampleKind::U8 => Channel::U8(alloc_plane(height, width)?),
            SampleKind::F32 => Channel::F32(alloc_plane(height, width)?),
        })
    }

    pub fn kind(&self) -> SampleKind {
        match self {
            Channel::U8(_) => SampleKind::U8,
            Channel::F32(_) => SampleKind::F32,
        }
    }

    /// Plane dimensions as `(height, width)`.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Channel::U8(plane) => plane.dim(),
            Channel::F32(plane) => plane.dim(),
        }
    }

    pub fn as_u8(&self) -> Option<&Array2<u8>> {
        match self {
            Channel::U8(plane) => Some(plane),
            Channel::F32(_) => None,
        }
    }

    pub fn as_f32(&self) -> Option<&Array2<f32>> {
        match self {
            Channel::F32(plane) => Some(plane),
            Channel::U8(_) => None,
        }
    }

    /// Cast to another element kind, producing a new plane.
    ///
    /// Float to 8-bit clamps to 0-255 and truncates.
    pub fn cast(&self, kind: SampleKind) -> FilterResult<Channel> {
        Ok(match (self, kind) {
            (Channel::U8(plane), SampleKind::U8) => Channel::U8(copy_plane(plane.view())?),
            (Channel::U8(plane), SampleKind::F32) => Channel::F32(cast_plane(plane.view())?),
            (Channel::F32(plane), SampleKind::U8) => Channel::U8(cast_plane(plane.view())?),
            (Channel::F32(plane), SampleKind::F32) => Channel::F32(copy_plane(plane.view())?),
        })
    }

    /// Run a generic plane algorithm on whichever kind this channel holds.
    pub fn apply<O: PlaneOp>(&self, op: &O) -> FilterResult<Channel> {
        Ok(match self {
            Channel::U8(plane) => Channel::U8(op.apply(plane.view())?),
            Channel::F32(plane) => Channel::F32(op.apply(plane.view())?),
        })
    }

    pub fn apply_in_place<O: PlaneOp>(&mut self, op: &O) -> FilterResult<()> {
        match self {
            Channel::U8(plane) => op.apply_in_place(plane.view_mut()),
            Channel::F32(plane) => op.apply_in_place(plane.view_mut()),
        }
    }
}

/// Dimensions and channel layout of a raster, without pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterHeader {
    pub width: usize,
    pub height: usize,
    pub kinds: Vec<SampleKind>,
}

/// A raster image: equally sized channel planes.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    channels: Vec<Channel>,
}

impl Raster {
    /// Build a raster from channel planes, which must all share one size.
    pub fn from_channels(channels: Vec<Channel>) -> FilterResult<Self> {
        let first = channels.first().ok_or(FilterError::NoChannels)?;
        let (height, width) = first.dim();
        if width == 0 || height == 0 {
            return Err(FilterError::InvalidDimensions { width, height });
        }
        for (index, channel) in channels.iter().enumerate().skip(1) {
            if channel.dim() != (height, width) {
                return Err(FilterError::ChannelMismatch {
                    index,
                    expected: (height, width),
                    actual: channel.dim(),
                });
            }
        }
        Ok(Raster {
            width,
            height,
            channels,
        })
    }

    /// Single-channel raster from one plane.
    pub fn from_plane<T: Sample>(plane: Array2<T>) -> FilterResult<Self> {
        Self::from_channels(vec![T::wrap(plane)])
    }

    /// Split interleaved samples (`height * width * channels`) into planes.
    pub fn from_interleaved<T: Sample>(
        width: usize,
        height: usize,
        channels: usize,
        data: &[T],
    ) -> FilterResult<Self> {
        if width == 0 || height == 0 {
            return Err(FilterError::InvalidDimensions { width, height });
        }
        let image = ArrayView3::from_shape((height, width, channels), data)?;
        Self::from_hwc(image)
    }

    /// Split an `(height, width, channels)` array into planes.
    pub fn from_hwc<T: Sample>(image: ArrayView3<'_, T>) -> FilterResult<Self> {
        let (_, _, count) = image.dim();
        let mut channels = Vec::with_capacity(count);
        for c in 0..count {
            channels.push(T::wrap(copy_plane(image.index_axis(Axis(2), c))?));
        }
        Self::from_channels(channels)
    }

    /// Allocate a zeroed raster with the given layout.
    pub fn with_header(header: &RasterHeader) -> FilterResult<Self> {
        let channels = header
            .kinds
            .iter()
            .map(|&kind| Channel::zeros(kind, header.height, header.width))
            .collect::<FilterResult<Vec<_>>>()?;
        Self::from_channels(channels)
    }

    pub fn header(&self) -> RasterHeader {
        RasterHeader {
            width: self.width,
            height: self.height,
            kinds: self.channels.iter().map(Channel::kind).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Apply one plane algorithm to every channel independently.
    pub fn map_channels<O: PlaneOp>(&self, op: &O) -> FilterResult<Raster> {
        let mut channels = Vec::with_capacity(self.channels.len());
        for (index, channel) in self.channels.iter().enumerate() {
            log::trace!("processing channel {index} ({:?})", channel.kind());
            channels.push(channel.apply(op)?);
        }
        Ok(Raster {
            width: self.width,
            height: self.height,
            channels,
        })
    }

    pub fn map_channels_in_place<O: PlaneOp>(&mut self, op: &O) -> FilterResult<()> {
        for (index, channel) in self.channels.iter_mut().enumerate() {
            log::trace!("processing channel {index} in place ({:?})", channel.kind());
            channel.apply_in_place(op)?;
        }
        Ok(())
    }

    /// Deep copy through the fallible allocator.
    pub fn try_clone(&self) -> FilterResult<Raster> {
        let channels = self
            .channels
            .iter()
            .map(|channel| channel.cast(channel.kind()))
            .collect::<FilterResult<Vec<_>>>()?;
        Ok(Raster {
            width: self.width,
            height: self.height,
            channels,
        })
    }

    /// Interleave all channels into an `(height, width, channels)` array.
    ///
    /// Every channel must hold samples of type `T`.
    pub fn to_hwc<T: Sample>(&self) -> FilterResult<Array3<T>> {
        let count = self.channels.len();
        let len = self.height * self.width * count;
        let mut image =
            Array3::from_shape_vec((self.height, self.width, count), try_alloc(len, T::default())?)?;
        for (index, channel) in self.channels.iter().enumerate() {
            let plane = T::plane(channel).ok_or(FilterError::KindMismatch {
                index,
                expected: T::KIND,
                actual: channel.kind(),
            })?;
            image.index_axis_mut(Axis(2), index).assign(&plane);
        }
        Ok(image)
    }

    pub fn to_interleaved<T: Sample>(&self) -> FilterResult<Vec<T>> {
        Ok(self.to_hwc::<T>()?.into_raw_vec_and_offset().0)
    }
}
