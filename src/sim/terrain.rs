//! Height field terrain
//!
//! Each unit cell of the level stores the height of its top surface. Cell
//! `(x, y)` covers world space `[x, x + 1) × [y, y + 1)`. Everything outside the
//! grid is open ground at height 0, so levels need no boundary walls.

use std::ops::RangeInclusive;

use thiserror::Error;

/// Rejected height field input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    #[error("height field expects {expected} cells, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("height at cell {index} is not finite")]
    NonFiniteHeight { index: usize },
}

/// Immutable grid of cell top-surface heights
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeightField {
    size_x: usize,
    size_y: usize,
    origin_x: i32,
    origin_y: i32,
    /// Row-major: `index = gx + gy * size_x`
    heights: Vec<f32>,
}

impl HeightField {
    pub fn new(
        size_x: usize,
        size_y: usize,
        origin_x: i32,
        origin_y: i32,
        heights: Vec<f32>,
    ) -> Result<Self, TerrainError> {
        let expected = size_x.checked_mul(size_y);
        if expected != Some(heights.len()) {
            return Err(TerrainError::DimensionMismatch {
                expected: expected.unwrap_or(usize::MAX),
                found: heights.len(),
            });
        }
        if let Some(index) = heights.iter().position(|h| !h.is_finite()) {
            return Err(TerrainError::NonFiniteHeight { index });
        }
        Ok(Self {
            size_x,
            size_y,
            origin_x,
            origin_y,
            heights,
        })
    }

    /// A field with no cells; every query is open ground
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from a set of occupied tiles: listed tiles get `height`, the rest of
    /// the bounding box stays at 0
    pub fn from_tiles(tiles: &[(i32, i32)], height: f32) -> Self {
        let Some(min_x) = tiles.iter().map(|t| t.0).min() else {
            return Self::empty();
        };
        let min_y = tiles.iter().map(|t| t.1).min().unwrap_or(0);
        let max_x = tiles.iter().map(|t| t.0).max().unwrap_or(min_x);
        let max_y = tiles.iter().map(|t| t.1).max().unwrap_or(min_y);
        let size_x = (max_x - min_x + 1) as usize;
        let size_y = (max_y - min_y + 1) as usize;
        let mut heights = vec![0.0; size_x * size_y];
        for &(x, y) in tiles {
            heights[(x - min_x) as usize + (y - min_y) as usize * size_x] = height;
        }
        Self {
            size_x,
            size_y,
            origin_x: min_x,
            origin_y: min_y,
            heights,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.size_x, self.size_y)
    }

    pub fn origin(&self) -> (i32, i32) {
        (self.origin_x, self.origin_y)
    }

    /// Cells on x worth visiting: the grid plus one open-ground cell each side
    pub fn span_x(&self) -> RangeInclusive<i32> {
        span(self.origin_x, self.size_x)
    }

    /// Cells on y worth visiting: the grid plus one open-ground cell each side
    pub fn span_y(&self) -> RangeInclusive<i32> {
        span(self.origin_y, self.size_y)
    }

    /// Height of the cell containing world cell coordinates `(x, y)`
    ///
    /// Cells outside the grid report 0.0.
    #[inline]
    pub fn height_at(&self, x: i32, y: i32) -> f32 {
        let gx = i64::from(x) - i64::from(self.origin_x);
        let gy = i64::from(y) - i64::from(self.origin_y);
        if gx < 0 || gy < 0 || gx >= self.size_x as i64 || gy >= self.size_y as i64 {
            return 0.0;
        }
        self.heights[gx as usize + gy as usize * self.size_x]
    }

    /// Height of the cell under a world-space point
    #[inline]
    pub fn height_below(&self, x: f32, y: f32) -> f32 {
        self.height_at(cell_of(x), cell_of(y))
    }
}

fn span(origin: i32, size: usize) -> RangeInclusive<i32> {
    let hi = i64::from(origin) + i64::try_from(size).unwrap_or(i64::MAX);
    origin.saturating_sub(1)..=saturate(hi)
}

/// Narrow an i64 cell index to the i32 cell space
#[inline]
pub(crate) fn saturate(cell: i64) -> i32 {
    cell.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Cell index containing a world coordinate
#[inline]
pub fn cell_of(coord: f32) -> i32 {
    coord.floor() as i32
}

/// Inclusive range of cells overlapped by the open interval `(lo, hi)`
#[inline]
pub fn cells_covering(lo: f32, hi: f32) -> RangeInclusive<i32> {
    let first = lo.floor() as i64;
    let last = (hi.ceil() as i64).saturating_sub(1).max(first);
    saturate(first)..=saturate(last)
}

/// Clamp both ends of `cells` into `span`
///
/// Cells outside a field's span all read as open ground, so the clipped range
/// samples the same set of heights.
#[inline]
pub fn clip_cells(cells: RangeInclusive<i32>, span: RangeInclusive<i32>) -> RangeInclusive<i32> {
    let (lo, hi) = (*span.start(), *span.end());
    (*cells.start()).clamp(lo, hi)..=(*cells.end()).clamp(lo, hi)
}
