use super::*;

use crate::adapter::{FilterConfig, TileFilter};
use crate::scale::ScaleFactor;
use crate::source::MemoryRaster;
use crate::strategy::{CellAveragingCfar, CfarMethod, GlobalThreshold, MASK_ON, ThresholdStrategy};
use crate::tile::BandBuffer;

fn u8_raster(width: usize, height: usize, tile: u32, value: impl FnMut(usize, usize) -> u8) -> MemoryRaster {
    let band: BandBuffer = Buffer2::from_fn(width, height, value).into();
    MemoryRaster::new(vec![band], tile, tile).unwrap()
}

#[test]
fn test_grid_counts_partial_tiles() {
    let grid = TileGrid::new(IRect::new(0, 0, 100, 50), 32, 32);
    assert_eq!(grid.tiles_x(), 4);
    assert_eq!(grid.tiles_y(), 2);
    assert_eq!(grid.len(), 8);
    assert_eq!(grid.tile_rect(3, 1), IRect::new(96, 32, 4, 18));
}

#[test]
fn test_grid_covers_bounds_exactly_once() {
    let bounds = IRect::new(10, -5, 37, 23);
    let grid = TileGrid::new(bounds, 8, 6);
    let mut hits = Buffer2::<u8>::new_default(bounds.width(), bounds.height());
    for rect in grid.iter() {
        assert!(bounds.contains_rect(&rect));
        for y in 0..rect.height() {
            for x in 0..rect.width() {
                let gx = (rect.x() - bounds.x()) as usize + x;
                let gy = (rect.y() - bounds.y()) as usize + y;
                hits[(gx, gy)] += 1u8;
            }
        }
    }
    assert!(hits.iter().all(|&h| h == 1));
}

#[test]
fn test_empty_bounds_have_no_tiles() {
    let grid = TileGrid::new(IRect::new(0, 0, 0, 10), 4, 4);
    assert!(grid.is_empty());
    assert_eq!(grid.iter().count(), 0);
}

#[test]
#[should_panic(expected = "tile size must be non-zero")]
fn test_zero_tile_size_panics() {
    TileGrid::new(IRect::new(0, 0, 10, 10), 0, 4);
}

#[test]
fn test_assemble_reproduces_source_mask() {
    let mut raster = u8_raster(45, 30, 16, |x, y| if (x + y) % 3 == 0 { MASK_ON } else { 0 });
    let expected = Buffer2::from_fn(45, 30, |x, y| if (x + y) % 3 == 0 { MASK_ON } else { 0u8 });
    let grid = TileGrid::for_source(&raster, raster.bounds()).unwrap();

    let mosaic = assemble_mask(&mut raster, &grid, 0, 0).unwrap();
    assert!(mosaic.is_complete());
    assert_eq!(mosaic.mask(), &expected);
}

#[test]
fn test_holes_are_reported_missing() {
    let hole = IRect::new(20, 0, 4, 4);
    let mut raster = u8_raster(40, 20, 10, |_, _| MASK_ON).with_hole(hole);
    let grid = TileGrid::for_source(&raster, raster.bounds()).unwrap();

    let mosaic = assemble_mask(&mut raster, &grid, 0, 0).unwrap();
    assert_eq!(mosaic.missing(), &[IRect::new(20, 0, 10, 10)]);
    assert_eq!(mosaic.mask()[(25, 5)], 0);
    assert_eq!(mosaic.mask()[(35, 5)], MASK_ON);
}

#[test]
fn test_non_mask_source_is_rejected() {
    let band: BandBuffer = Buffer2::new_filled(8, 8, 7u16).into();
    let mut raster = MemoryRaster::new(vec![band], 8, 8).unwrap();
    let grid = TileGrid::for_source(&raster, raster.bounds()).unwrap();

    let err = assemble_mask(&mut raster, &grid, 0, 0).unwrap_err();
    assert_eq!(
        err,
        TileError::SampleTypeMismatch {
            band: 0,
            expected: SampleType::U8,
            actual: SampleType::U16,
        }
    );
}

#[test]
fn test_missing_band_is_rejected() {
    let mut raster = u8_raster(8, 8, 8, |_, _| 0);
    let grid = TileGrid::for_source(&raster, raster.bounds()).unwrap();
    let err = assemble_mask(&mut raster, &grid, 2, 0).unwrap_err();
    assert_eq!(err, TileError::MissingBand { band: 2, bands: 1 });
}

#[test]
fn test_filtered_mosaic_matches_whole_image_global_threshold() {
    let band = Buffer2::from_fn(50, 40, |x, y| ((x * 13 + y * 7) % 90) as u16 * 10);
    let raster = MemoryRaster::new(vec![band.clone().into()], 16, 16).unwrap();
    let scale = ScaleFactor::new(4).unwrap();
    let config = FilterConfig::new(scale, GlobalThreshold::new(120).unwrap());
    let mut filter = TileFilter::new(raster, config.clone());
    let grid = TileGrid::for_source(&filter, IRect::new(0, 0, 50, 40)).unwrap();

    let mosaic = assemble_mask(&mut filter, &grid, 0, 0).unwrap();

    let mut scaled = Buffer2::new_default(50, 40);
    scale.scale_into(&band, &mut scaled);
    assert_eq!(mosaic.mask(), &config.strategy.threshold(&scaled));
}

#[test]
fn test_parallel_assembly_matches_sequential() {
    let band = Buffer2::from_fn(64, 48, |x, y| ((x * 31 + y * 17) % 150) as u16 * 40);
    let cfar = CellAveragingCfar::new(3, 7, 1.3, CfarMethod::RunningSum).unwrap();
    let config = FilterConfig::new(ScaleFactor::new(35).unwrap(), ThresholdStrategy::from(cfar));
    let make = || {
        let raster = MemoryRaster::new(vec![band.clone().into()], 16, 16).unwrap();
        TileFilter::new(raster, config.clone())
    };

    let mut sequential_source = make();
    let grid = TileGrid::for_source(&sequential_source, IRect::new(0, 0, 64, 48)).unwrap();
    let sequential = assemble_mask(&mut sequential_source, &grid, 0, 0).unwrap();

    for workers in [1, 2, 5] {
        let parallel = assemble_mask_parallel(make, &grid, 0, 0, workers).unwrap();
        assert_eq!(parallel, sequential, "workers = {workers}");
    }
}

#[test]
fn test_parallel_assembly_propagates_errors() {
    let make = || {
        let band: BandBuffer = Buffer2::new_filled(16, 16, 1u16).into();
        MemoryRaster::new(vec![band], 8, 8).unwrap()
    };
    let grid = TileGrid::new(IRect::new(0, 0, 16, 16), 8, 8);
    assert!(assemble_mask_parallel(make, &grid, 0, 0, 2).is_err());
}

/// Source that reports a fixed nominal tile size and never has data.
struct SizedSource(u32, u32);

impl TileSource for SizedSource {
    fn tile(&mut self, _rect: IRect, _level: u32) -> Result<Option<&Tile>, TileError> {
        Ok(None)
    }

    fn num_output_bands(&self) -> usize {
        1
    }

    fn tile_width(&self) -> u32 {
        self.0
    }

    fn tile_height(&self) -> u32 {
        self.1
    }

    fn output_sample_type(&self) -> SampleType {
        SampleType::U8
    }
}

#[test]
fn test_source_with_zero_tile_size_is_an_error() {
    let bounds = IRect::new(0, 0, 10, 10);
    assert_eq!(
        TileGrid::for_source(&SizedSource(0, 16), bounds).unwrap_err(),
        TileError::ZeroTileSize {
            width: 0,
            height: 16
        }
    );
    let grid = TileGrid::for_source(&SizedSource(4, 4), bounds).unwrap();
    assert_eq!(grid.len(), 9);
}

#[test]
fn test_mask_band_rejects_band_smaller_than_rect() {
    let rect = IRect::new(0, 0, 6, 6);
    let mut tile = Tile::from_bands(rect, vec![Buffer2::<u8>::new_default(6, 6).into()]).unwrap();
    *tile.band_mut(0) = Buffer2::<u8>::new_default(3, 6).into();

    assert_eq!(
        mask_band(&tile, 0).unwrap_err(),
        TileError::BandSizeMismatch {
            band: 0,
            rect,
            expected: 36,
            actual: 18
        }
    );
}
