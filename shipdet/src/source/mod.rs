//! Tile source contract and an in-memory raster implementation.


use crate::error::TileError;
use crate::tile::{BandBuffer, IRect, SampleType, Tile};

/// Producer of raster tiles on demand.
///
/// `Ok(None)` means no data is available for the request yet. Callers must
/// retry or skip such tiles and never read them as background.
pub trait TileSource {
    /// Tile covering `rect` at resolution `level`. The returned tile is owned
    /// by the source and stays valid until the next request.
    fn tile(&mut self, rect: IRect, level: u32) -> Result<Option<&Tile>, TileError>;

    fn num_output_bands(&self) -> usize;

    fn tile_width(&self) -> u32;

    fn tile_height(&self) -> u32;

    fn output_sample_type(&self) -> SampleType;
}

impl<S: TileSource + ?Sized> TileSource for &mut S {
    fn tile(&mut self, rect: IRect, level: u32) -> Result<Option<&Tile>, TileError> {
        (**self).tile(rect, level)
    }

    fn num_output_bands(&self) -> usize {
        (**self).num_output_bands()
    }

    fn tile_width(&self) -> u32 {
        (**self).tile_width()
    }

    fn tile_height(&self) -> u32 {
        (**self).tile_height()
    }

    fn output_sample_type(&self) -> SampleType {
        (**self).output_sample_type()
    }
}

impl<S: TileSource + ?Sized> TileSource for Box<S> {
    fn tile(&mut self, rect: IRect, level: u32) -> Result<Option<&Tile>, TileError> {
        (**self).tile(rect, level)
    }

    fn num_output_bands(&self) -> usize {
        (**self).num_output_bands()
    }

    fn tile_width(&self) -> u32 {
        (**self).tile_width()
    }

    fn tile_height(&self) -> u32 {
        (**self).tile_height()
    }

    fn output_sample_type(&self) -> SampleType {
        (**self).output_sample_type()
    }
}

/// Full raster held in memory, served in tiles.
///
/// Requests are clipped to the raster bounds. Requests entirely outside the
/// raster, or touching a registered hole, return no data.
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    bounds: IRect,
    bands: Vec<BandBuffer>,
    sample_type: SampleType,
    tile_size: (u32, u32),
    holes: Vec<IRect>,
    current: Option<Tile>,
}

impl MemoryRaster {
    /// All bands must share one shape and depth.
    pub fn new(bands: Vec<BandBuffer>, tile_width: u32, tile_height: u32) -> Result<Self, TileError> {
        let first = bands.first().ok_or(TileError::NoBands)?;
        let bounds = IRect::new(0, 0, first.width() as u32, first.height() as u32);
        // Reuse the tile constructor for shape and depth checks.
        let tile = Tile::from_bands(bounds, bands)?;
        let sample_type = tile.sample_type();
        let bands = tile.into_bands();
        Ok(Self {
            bounds,
            bands,
            sample_type,
            tile_size: (tile_width, tile_height),
            holes: Vec::new(),
            current: None,
        })
    }

    /// Marks a region whose tiles report no data.
    pub fn with_hole(mut self, hole: IRect) -> Self {
        self.holes.push(hole);
        self
    }

    #[inline]
    pub fn bounds(&self) -> IRect {
        self.bounds
    }
}

impl TileSource for MemoryRaster {
    fn tile(&mut self, rect: IRect, _level: u32) -> Result<Option<&Tile>, TileError> {
        let Some(clipped) = self.bounds.intersect(&rect) else {
            return Ok(None);
        };
        if self.holes.iter().any(|hole| hole.intersect(&clipped).is_some()) {
            return Ok(None);
        }

        let x = clipped.x() as usize;
        let y = clipped.y() as usize;
        let bands = self
            .bands
            .iter()
            .map(|band| band.crop(x, y, clipped.width(), clipped.height()))
            .collect();
        let tile = Tile::from_bands(clipped, bands)?;
        Ok(Some(&*self.current.insert(tile)))
    }

    fn num_output_bands(&self) -> usize {
        self.bands.len()
    }

    fn tile_width(&self) -> u32 {
        self.tile_size.0
    }

    fn tile_height(&self) -> u32 {
        self.tile_size.1
    }

    fn output_sample_type(&self) -> SampleType {
        self.sample_type
    }
}
