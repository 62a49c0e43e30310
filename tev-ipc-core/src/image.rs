//! Pixel-buffer views handed to the tiler.
//!
//! An [`ImageView`] describes a logical `height × width [× channels]` array
//! on top of a borrowed slice with arbitrary element strides, so interleaved,
//! planar and sub-windowed buffers can all be sent without first copying them
//! into one particular layout. Elements of any [`Sample`] type are converted
//! to `f32` when a tile is materialized.

use std::ops::Range;

use crate::error::TevError;

// ── Sample ───────────────────────────────────────────────────────

/// Numeric element types that can be sent as pixel values.
pub trait Sample: Copy {
    fn to_f32(self) -> f32;
}

macro_rules! impl_sample {
    ($($ty:ty),*) => {
        $(
            impl Sample for $ty {
                #[inline]
                fn to_f32(self) -> f32 {
                    self as f32
                }
            }
        )*
    };
}

impl_sample!(f32, f64, u8, u16, u32, i8, i16, i32);

// ── ImageView ────────────────────────────────────────────────────

/// Borrowed, strided view of a pixel buffer.
///
/// `channels` is `None` when the buffer has no channel axis (a single
/// scalar plane); [`channel_count`](Self::channel_count) then reports 1.
/// Strides are in elements, not bytes.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    offset: usize,
    height: usize,
    width: usize,
    channels: Option<usize>,
    row_stride: usize,
    col_stride: usize,
    channel_stride: usize,
}

impl<'a, T: Sample> ImageView<'a, T> {
    /// Row-major `[row][col][channel]` buffer.
    pub fn interleaved(
        data: &'a [T],
        height: usize,
        width: usize,
        channels: usize,
    ) -> Result<Self, TevError> {
        Self::with_strides(
            data,
            0,
            (height, width, Some(channels)),
            (width * channels, channels, 1),
        )
    }

    /// Channel-major `[channel][row][col]` buffer.
    pub fn planar(
        data: &'a [T],
        height: usize,
        width: usize,
        channels: usize,
    ) -> Result<Self, TevError> {
        Self::with_strides(
            data,
            0,
            (height, width, Some(channels)),
            (width, 1, height * width),
        )
    }

    /// Row-major `[row][col]` buffer without a channel axis.
    pub fn single_channel(data: &'a [T], height: usize, width: usize) -> Result<Self, TevError> {
        Self::with_strides(data, 0, (height, width, None), (width, 1, 0))
    }

    /// Arbitrary layout: element `(r, c, ch)` lives at
    /// `offset + r * row_stride + c * col_stride + ch * channel_stride`.
    pub fn with_strides(
        data: &'a [T],
        offset: usize,
        (height, width, channels): (usize, usize, Option<usize>),
        (row_stride, col_stride, channel_stride): (usize, usize, usize),
    ) -> Result<Self, TevError> {
        if channels == Some(0) {
            return Err(TevError::InvalidLayout("channel axis has length zero".into()));
        }

        let view = Self {
            data,
            offset,
            height,
            width,
            channels,
            row_stride,
            col_stride,
            channel_stride,
        };

        if let Some(last) = view.last_index()? {
            if last >= data.len() {
                return Err(TevError::InvalidLayout(format!(
                    "{height}x{width}x{} view reaches element {last} of a {}-element buffer",
                    view.channel_count(),
                    data.len()
                )));
            }
        }
        Ok(view)
    }

    /// Highest element index the view touches, `None` for an empty view.
    fn last_index(&self) -> Result<Option<usize>, TevError> {
        if self.is_empty() {
            return Ok(None);
        }
        let extent = |len: usize, stride: usize| (len - 1).checked_mul(stride);
        let last = || -> Option<usize> {
            self.offset
                .checked_add(extent(self.height, self.row_stride)?)?
                .checked_add(extent(self.width, self.col_stride)?)?
                .checked_add(extent(self.channel_count(), self.channel_stride)?)
        };
        last()
            .map(Some)
            .ok_or_else(|| {
                TevError::InvalidLayout(format!(
                    "{}x{} view with strides ({}, {}, {}) addresses beyond memory",
                    self.height, self.width, self.row_stride, self.col_stride, self.channel_stride
                ))
            })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Length of the channel axis, or 1 if the view has none.
    pub fn channel_count(&self) -> usize {
        self.channels.unwrap_or(1)
    }

    pub fn has_channel_axis(&self) -> bool {
        self.channels.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    /// Element at `(row, col, channel)`, or `None` outside the view.
    pub fn get(&self, row: usize, col: usize, channel: usize) -> Option<T> {
        if row >= self.height || col >= self.width || channel >= self.channel_count() {
            return None;
        }
        Some(
            self.data[self.offset
                + row * self.row_stride
                + col * self.col_stride
                + channel * self.channel_stride],
        )
    }

    /// Rectangular sub-view, keeping the channel axis.
    pub fn window(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Self, TevError> {
        if rows.start > rows.end
            || cols.start > cols.end
            || rows.end > self.height
            || cols.end > self.width
        {
            return Err(TevError::InvalidLayout(format!(
                "window {rows:?}x{cols:?} outside {}x{} view",
                self.height, self.width
            )));
        }
        Ok(Self {
            offset: self.offset + rows.start * self.row_stride + cols.start * self.col_stride,
            height: rows.len(),
            width: cols.len(),
            ..*self
        })
    }

    /// Single channel as a view without a channel axis.
    pub fn channel(&self, channel: usize) -> Result<Self, TevError> {
        if channel >= self.channel_count() {
            return Err(TevError::InvalidLayout(format!(
                "channel {channel} outside {}-channel view",
                self.channel_count()
            )));
        }
        Ok(Self {
            offset: self.offset + channel * self.channel_stride,
            channels: None,
            channel_stride: 0,
            ..*self
        })
    }

    /// Dense `f32` copy in `[row][col][channel]` order, whatever the
    /// source layout or element type.
    pub fn to_dense_f32(&self) -> Vec<f32> {
        let n_channels = self.channel_count();
        let mut out = Vec::with_capacity(self.height * self.width * n_channels);
        for row in 0..self.height {
            let row_base = self.offset + row * self.row_stride;
            for col in 0..self.width {
                let px = row_base + col * self.col_stride;
                for ch in 0..n_channels {
                    out.push(self.data[px + ch * self.channel_stride].to_f32());
                }
            }
        }
        out
    }
}

// ── Tests ────────────────────────────────────────────────────────
