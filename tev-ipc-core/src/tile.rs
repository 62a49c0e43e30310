//! Splitting pixel updates into bounded tiles.
//!
//! The viewer receives pixel data as one `UpdateImage` packet per tile so
//! that no single packet grows with the image. [`TileGrid`] walks the region
//! in `tile_height × tile_width` steps, row-major (every column of a tile row
//! before the next row). Boundary tiles are clipped to what remains, never
//! padded, so the tiles cover the region exactly once.

use std::cmp;

use crate::error::TevError;
use crate::image::{ImageView, Sample};

/// Tile edge used when the caller does not pick one.
pub const DEFAULT_TILE_SIZE: usize = 128;

// ── TileSize ─────────────────────────────────────────────────────

/// Upper bound on the extent of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSize {
    width: usize,
    height: usize,
}

impl TileSize {
    pub fn new(width: usize, height: usize) -> Result<Self, TevError> {
        if width == 0 || height == 0 {
            return Err(TevError::InvalidTileSize { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn square(edge: usize) -> Result<Self, TevError> {
        Self::new(edge, edge)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_TILE_SIZE,
            height: DEFAULT_TILE_SIZE,
        }
    }
}

// ── TileRect ─────────────────────────────────────────────────────

/// A tile's rectangle relative to the top-left of the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    /// Left edge in pixels.
    pub x: usize,
    /// Top edge in pixels.
    pub y: usize,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

// ── TileGrid ─────────────────────────────────────────────────────

/// Row-major tiling of a `height × width` region.
#[derive(Debug, Clone, Copy)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile: TileSize,
}

impl TileGrid {
    pub fn new(height: usize, width: usize, tile: TileSize) -> Self {
        Self {
            width,
            height,
            tile,
        }
    }

    /// A grid with one tile spanning the whole region (tiling disabled).
    pub fn whole(height: usize, width: usize) -> Self {
        Self {
            width,
            height,
            tile: TileSize {
                width: width.max(1),
                height: height.max(1),
            },
        }
    }

    pub fn columns(&self) -> usize {
        self.width.div_ceil(self.tile.width)
    }

    pub fn rows(&self) -> usize {
        self.height.div_ceil(self.tile.height)
    }

    /// Total number of tiles; zero for an empty region.
    pub fn len(&self) -> usize {
        self.rows() * self.columns()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tile rectangles in transmission order.
    pub fn rects(&self) -> impl Iterator<Item = TileRect> + use<> {
        let TileGrid {
            width,
            height,
            tile,
        } = *self;
        (0..height).step_by(tile.height).flat_map(move |y| {
            (0..width).step_by(tile.width).map(move |x| TileRect {
                x,
                y,
                width: cmp::min(tile.width, width - x),
                height: cmp::min(tile.height, height - y),
            })
        })
    }
}

// ── Tile ─────────────────────────────────────────────────────────

/// One materialized tile, ready to be encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Placement within the source buffer.
    pub rect: TileRect,
    /// Number of interleaved channels in `data`.
    pub channels: usize,
    /// Dense `[row][col][channel]` pixel values.
    pub data: Vec<f32>,
}

/// Lazily cuts tiles out of an [`ImageView`].
///
/// Each tile is copied into a dense `f32` buffer only when the iterator
/// reaches it, so at most one tile is materialized at a time.
pub fn tiles<'a, T: Sample>(
    image: ImageView<'a, T>,
    grid: TileGrid,
) -> impl Iterator<Item = Result<Tile, TevError>> {
    let channels = image.channel_count();
    grid.rects().map(move |rect| {
        let window = image.window(rect.y..rect.y + rect.height, rect.x..rect.x + rect.width)?;
        Ok(Tile {
            rect,
            channels,
            data: window.to_dense_f32(),
        })
    })
}

// ── Tests ────────────────────────────────────────────────────────
