//! Tile grids and assembly of per-tile masks into one raster-sized mask.

#[cfg(test)]
mod tests;

use common::Buffer2;
use common::parallel::try_par_map_limited;

use crate::error::TileError;
use crate::source::TileSource;
use crate::tile::{IRect, SampleType, Tile};

/// Regular grid of tile rectangles covering a raster. Edge tiles are clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    bounds: IRect,
    tile_width: u32,
    tile_height: u32,
}

impl TileGrid {
    /// # Panics
    ///
    /// Panics if either tile dimension is 0. Use [`TileGrid::for_source`] for
    /// sizes reported by a source.
    pub fn new(bounds: IRect, tile_width: u32, tile_height: u32) -> Self {
        assert!(tile_width > 0 && tile_height > 0, "tile size must be non-zero");
        Self {
            bounds,
            tile_width,
            tile_height,
        }
    }

    /// Grid over `bounds` using the source's nominal tile size.
    pub fn for_source(source: &impl TileSource, bounds: IRect) -> Result<Self, TileError> {
        let (width, height) = (source.tile_width(), source.tile_height());
        if width == 0 || height == 0 {
            return Err(TileError::ZeroTileSize { width, height });
        }
        Ok(Self::new(bounds, width, height))
    }

    #[inline]
    pub fn bounds(&self) -> IRect {
        self.bounds
    }

    #[inline]
    pub fn tiles_x(&self) -> usize {
        self.bounds.width().div_ceil(self.tile_width as usize)
    }

    #[inline]
    pub fn tiles_y(&self) -> usize {
        self.bounds.height().div_ceil(self.tile_height as usize)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tiles_x() * self.tiles_y()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tile_rect(&self, tx: usize, ty: usize) -> IRect {
        debug_assert!(tx < self.tiles_x() && ty < self.tiles_y());
        let x0 = tx as u32 * self.tile_width;
        let y0 = ty as u32 * self.tile_height;
        let w = self.tile_width.min(self.bounds.size.x - x0);
        let h = self.tile_height.min(self.bounds.size.y - y0);
        IRect::new(
            self.bounds.x() + x0 as i32,
            self.bounds.y() + y0 as i32,
            w,
            h,
        )
    }

    /// Tiles of row `ty`, left to right.
    pub fn row(&self, ty: usize) -> impl Iterator<Item = IRect> + '_ {
        (0..self.tiles_x()).map(move |tx| self.tile_rect(tx, ty))
    }

    /// All tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = IRect> + '_ {
        (0..self.tiles_y()).flat_map(move |ty| self.row(ty))
    }
}

/// Raster-sized mask plus the tiles that had no data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mosaic {
    mask: Buffer2<u8>,
    missing: Vec<IRect>,
}

impl Mosaic {
    fn new(bounds: IRect) -> Self {
        Self {
            mask: Buffer2::new_default(bounds.width(), bounds.height()),
            missing: Vec::new(),
        }
    }

    #[inline]
    pub fn mask(&self) -> &Buffer2<u8> {
        &self.mask
    }

    pub fn into_mask(self) -> Buffer2<u8> {
        self.mask
    }

    /// Tiles the source reported as null. Their pixels are not background.
    #[inline]
    pub fn missing(&self) -> &[IRect] {
        &self.missing
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    fn paste(&mut self, bounds: IRect, rect: IRect, band: &Buffer2<u8>) {
        let Some(clipped) = bounds.intersect(&rect) else {
            return;
        };
        let src_x = (clipped.x() - rect.x()) as usize;
        let src_y = (clipped.y() - rect.y()) as usize;
        let dst_x = (clipped.x() - bounds.x()) as usize;
        let dst_y = (clipped.y() - bounds.y()) as usize;
        for row in 0..clipped.height() {
            let src = &band.row(src_y + row)[src_x..src_x + clipped.width()];
            self.mask.row_mut(dst_y + row)[dst_x..dst_x + clipped.width()].copy_from_slice(src);
        }
    }
}

fn mask_band(tile: &Tile, band: usize) -> Result<Buffer2<u8>, TileError> {
    if band >= tile.num_bands() {
        return Err(TileError::MissingBand {
            band,
            bands: tile.num_bands(),
        });
    }
    tile.check_bands()?;
    tile.band(band)
        .as_u8()
        .cloned()
        .ok_or(TileError::SampleTypeMismatch {
            band,
            expected: SampleType::U8,
            actual: tile.sample_type(),
        })
}

/// One fetched tile: the rectangle it covers and its mask band, or `None` for no data.
type Fetched = (IRect, Option<(IRect, Buffer2<u8>)>);

fn fetch<S: TileSource>(
    source: &mut S,
    rect: IRect,
    band: usize,
    level: u32,
) -> Result<Fetched, TileError> {
    match source.tile(rect, level)? {
        Some(tile) => Ok((rect, Some((tile.rect(), mask_band(tile, band)?)))),
        None => Ok((rect, None)),
    }
}

/// Pulls every tile of `grid` from `source` and stitches band `band` into one mask.
///
/// The source must produce 8-bit tiles, e.g. a [`crate::TileFilter`].
pub fn assemble_mask<S: TileSource>(
    source: &mut S,
    grid: &TileGrid,
    band: usize,
    level: u32,
) -> Result<Mosaic, TileError> {
    let bounds = grid.bounds();
    let mut mosaic = Mosaic::new(bounds);
    for rect in grid.iter() {
        match fetch(source, rect, band, level)? {
            (_, Some((actual, data))) => mosaic.paste(bounds, actual, &data),
            (requested, None) => mosaic.missing.push(requested),
        }
    }
    tracing::debug!(
        tiles = grid.len(),
        missing = mosaic.missing.len(),
        "Assembled mask"
    );
    Ok(mosaic)
}

/// Parallel [`assemble_mask`]: each tile row is processed by a fresh source
/// built with `make_source`, with at most `workers` rows in flight.
pub fn assemble_mask_parallel<S, F>(
    make_source: F,
    grid: &TileGrid,
    band: usize,
    level: u32,
    workers: usize,
) -> Result<Mosaic, TileError>
where
    S: TileSource,
    F: Fn() -> S + Sync,
{
    let rows: Vec<usize> = (0..grid.tiles_y()).collect();
    let fetched = try_par_map_limited(&rows, workers.max(1), |&ty| {
        let mut source = make_source();
        grid.row(ty)
            .map(|rect| fetch(&mut source, rect, band, level))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let bounds = grid.bounds();
    let mut mosaic = Mosaic::new(bounds);
    for (requested, data) in fetched.into_iter().flatten() {
        match data {
            Some((actual, data)) => mosaic.paste(bounds, actual, &data),
            None => mosaic.missing.push(requested),
        }
    }
    tracing::debug!(
        tiles = grid.len(),
        missing = mosaic.missing.len(),
        workers,
        "Assembled mask in parallel"
    );
    Ok(mosaic)
}
