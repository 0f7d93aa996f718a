use super::*;

use std::collections::VecDeque;

use crate::source::MemoryRaster;
use crate::strategy::{CellAveragingCfar, CfarMethod, GlobalThreshold, MASK_ON};
use crate::tile::{BandBuffer, TileStatus};

/// Replays a fixed sequence of upstream responses.
struct ScriptedSource {
    responses: VecDeque<Option<Tile>>,
    current: Option<Tile>,
    bands: usize,
}

impl ScriptedSource {
    fn new(bands: usize, responses: Vec<Option<Tile>>) -> Self {
        Self {
            responses: responses.into(),
            current: None,
            bands,
        }
    }
}

impl TileSource for ScriptedSource {
    fn tile(&mut self, _rect: IRect, _level: u32) -> Result<Option<&Tile>, TileError> {
        self.current = self.responses.pop_front().flatten();
        Ok(self.current.as_ref())
    }

    fn num_output_bands(&self) -> usize {
        self.bands
    }

    fn tile_width(&self) -> u32 {
        8
    }

    fn tile_height(&self) -> u32 {
        8
    }

    fn output_sample_type(&self) -> SampleType {
        SampleType::U16
    }
}

fn u16_tile(rect: IRect, bands: usize, value: impl Fn(usize, usize, usize) -> u16) -> Tile {
    let bands = (0..bands)
        .map(|b| BandBuffer::from(Buffer2::from_fn(rect.width(), rect.height(), |x, y| value(b, x, y))))
        .collect();
    Tile::from_bands(rect, bands).unwrap()
}

fn global_config(scale: u32, threshold: i64) -> FilterConfig {
    FilterConfig::new(
        ScaleFactor::new(scale).unwrap(),
        GlobalThreshold::new(threshold).unwrap(),
    )
}

fn mask_of(tile: &Tile, band: usize) -> Buffer2<u8> {
    tile.band(band).as_u8().unwrap().clone()
}

#[test]
fn test_null_upstream_returns_none_without_allocating() {
    let source = ScriptedSource::new(1, vec![None]);
    let mut filter = TileFilter::new(source, global_config(1, 0));
    let result = filter.tile(IRect::new(0, 0, 8, 8), 0).unwrap();
    assert!(result.is_none());
    assert!(!filter.is_initialized());
}

#[test]
fn test_empty_upstream_returns_none() {
    let mut blank = Tile::new(IRect::new(0, 0, 8, 8), 1, SampleType::U16);
    blank.make_blank();
    let source = ScriptedSource::new(1, vec![Some(blank)]);
    let mut filter = TileFilter::new(source, global_config(1, 0));
    assert!(filter.tile(IRect::new(0, 0, 8, 8), 0).unwrap().is_none());
    assert!(!filter.is_initialized());
}

#[test]
fn test_null_upstream_leaves_previous_output_untouched() {
    let rect = IRect::new(0, 0, 8, 8);
    let tile = u16_tile(rect, 1, |_, x, _| if x < 4 { 100 } else { 0 });
    let source = ScriptedSource::new(1, vec![Some(tile), None]);
    let mut filter = TileFilter::new(source, global_config(1, 50));

    filter.tile(rect, 0).unwrap().unwrap();
    let before = filter.output_tile().unwrap().clone();

    assert!(filter.tile(IRect::new(8, 0, 8, 8), 0).unwrap().is_none());
    let after = filter.output_tile().unwrap();
    assert_eq!(after.rect(), before.rect());
    assert_eq!(after.status(), TileStatus::Valid);
    assert_eq!(mask_of(after, 0), mask_of(&before, 0));
}

#[test]
fn test_processes_every_band() {
    let rect = IRect::new(0, 0, 8, 8);
    // Band 0 is bright on the left half, band 1 on the top half.
    let tile = u16_tile(rect, 2, |b, x, y| {
        let bright = if b == 0 { x < 4 } else { y < 4 };
        if bright { 3500 } else { 350 }
    });
    let source = ScriptedSource::new(2, vec![Some(tile)]);
    let mut filter = TileFilter::new(source, global_config(35, 50));

    let out = filter.tile(rect, 0).unwrap().unwrap();
    assert_eq!(out.status(), TileStatus::Valid);
    assert_eq!(out.sample_type(), SampleType::U8);
    assert_eq!(out.num_bands(), 2);
    let left = mask_of(out, 0);
    let top = mask_of(out, 1);
    assert_eq!(left[(0, 7)], MASK_ON);
    assert_eq!(left[(7, 0)], 0);
    assert_eq!(top[(7, 0)], MASK_ON);
    assert_eq!(top[(0, 7)], 0);
}

#[test]
fn test_matches_direct_strategy_call() {
    let band = Buffer2::from_fn(32, 32, |x, y| ((x * 37 + y * 91) % 200) as u16 * 20);
    let mut raster = MemoryRaster::new(vec![band.clone().into()], 32, 32).unwrap();
    let cfar = CellAveragingCfar::new(3, 7, 1.5, CfarMethod::RunningSum).unwrap();
    let scale = ScaleFactor::new(20).unwrap();

    let mut scaled = Buffer2::new_default(32, 32);
    scale.scale_into(&band, &mut scaled);
    let expected = ThresholdStrategy::from(cfar.clone()).threshold(&scaled);

    let mut filter = TileFilter::new(&mut raster, FilterConfig::new(scale, cfar));
    let out = filter.tile(IRect::new(0, 0, 32, 32), 0).unwrap().unwrap();
    assert_eq!(mask_of(out, 0), expected);
}

#[test]
fn test_edge_tile_resizes_output() {
    let band = Buffer2::new_filled(12, 10, 1000u16);
    let raster = MemoryRaster::new(vec![band.into()], 8, 8).unwrap();
    let mut filter = TileFilter::new(raster, global_config(10, 50));

    let out = filter.tile(IRect::new(8, 8, 8, 8), 0).unwrap().unwrap();
    assert_eq!(out.rect(), IRect::new(8, 8, 4, 2));
    assert_eq!(out.band(0).width(), 4);
    assert!(mask_of(out, 0).iter().all(|&v| v == MASK_ON));

    let out = filter.tile(IRect::new(0, 0, 8, 8), 0).unwrap().unwrap();
    assert_eq!(out.band(0).len(), 64);
}

#[test]
fn test_disabled_filter_passes_upstream_through() {
    let rect = IRect::new(0, 0, 8, 8);
    let tile = u16_tile(rect, 1, |_, x, y| (x * 10 + y) as u16);
    let expected = tile.band(0).clone();
    let source = ScriptedSource::new(1, vec![Some(tile)]);
    let mut config = global_config(1, 0);
    config.enabled = false;
    let mut filter = TileFilter::new(source, config);

    assert_eq!(filter.output_sample_type(), SampleType::U16);
    let out = filter.tile(rect, 0).unwrap().unwrap();
    assert_eq!(out.sample_type(), SampleType::U16);
    assert_eq!(out.band(0), &expected);
    assert!(!filter.is_initialized());
}

#[test]
fn test_reports_upstream_layout() {
    let mut filter = TileFilter::new(ScriptedSource::new(3, Vec::new()), global_config(1, 0));
    assert_eq!(filter.num_output_bands(), 3);
    assert_eq!((filter.tile_width(), filter.tile_height()), (8, 8));
    assert_eq!(filter.output_sample_type(), SampleType::U8);
    filter.set_enabled(false);
    assert_eq!(filter.output_sample_type(), SampleType::U16);
}

#[test]
fn test_explicit_initialize_allocates_nominal_tile() {
    let mut filter = TileFilter::new(ScriptedSource::new(2, Vec::new()), global_config(1, 0));
    filter.initialize();
    let out = filter.output_tile().unwrap();
    assert_eq!(out.num_bands(), 2);
    assert_eq!(out.rect(), IRect::new(0, 0, 8, 8));
    assert_eq!(out.status(), TileStatus::Null);
}

#[test]
fn test_band_count_change_fails_one_request_only() {
    common::log_setup::setup_test_logging();
    let rect = IRect::new(0, 0, 8, 8);
    let responses = vec![
        Some(u16_tile(rect, 2, |_, _, _| 100)),
        Some(u16_tile(rect, 1, |_, _, _| 100)),
        Some(u16_tile(rect, 2, |_, _, _| 100)),
    ];
    let mut filter = TileFilter::new(ScriptedSource::new(2, responses), global_config(1, 50));

    assert!(filter.tile(rect, 0).unwrap().is_some());
    let err = filter.tile(rect, 0).unwrap_err();
    assert_eq!(
        err,
        TileError::BandCountMismatch {
            expected: 2,
            actual: 1
        }
    );
    assert_eq!(filter.output_tile().unwrap().status(), TileStatus::Null);

    let out = filter.tile(rect, 0).unwrap().unwrap();
    assert_eq!(out.status(), TileStatus::Valid);
}

#[test]
fn test_band_shape_mismatch_fails_one_request_only() {
    let rect = IRect::new(0, 0, 8, 8);
    let mut broken = u16_tile(rect, 1, |_, _, _| 100);
    *broken.band_mut(0) = BandBuffer::from(Buffer2::<u16>::new_default(4, 4));
    let responses = vec![Some(broken), Some(u16_tile(rect, 1, |_, _, _| 100))];
    let mut filter = TileFilter::new(ScriptedSource::new(1, responses), global_config(1, 50));

    assert_eq!(
        filter.tile(rect, 0).unwrap_err(),
        TileError::BandSizeMismatch {
            band: 0,
            rect,
            expected: 64,
            actual: 16
        }
    );
    assert_eq!(filter.output_tile().unwrap().status(), TileStatus::Null);

    let out = filter.tile(rect, 0).unwrap().unwrap();
    assert_eq!(out.status(), TileStatus::Valid);
    assert!(mask_of(out, 0).iter().all(|&v| v == MASK_ON));
}

#[test]
fn test_band_depth_mismatch_is_an_error() {
    let rect = IRect::new(0, 0, 8, 8);
    let mut mixed = u16_tile(rect, 2, |_, _, _| 100);
    *mixed.band_mut(1) = BandBuffer::from(Buffer2::<i32>::new_default(8, 8));
    let mut filter = TileFilter::new(ScriptedSource::new(2, vec![Some(mixed)]), global_config(1, 50));

    assert_eq!(
        filter.tile(rect, 0).unwrap_err(),
        TileError::SampleTypeMismatch {
            band: 1,
            expected: SampleType::U16,
            actual: SampleType::I32
        }
    );
}

#[test]
fn test_scale_mode_outputs_scaled_bands() {
    let rect = IRect::new(0, 0, 8, 8);
    let tile = u16_tile(rect, 3, |b, x, y| (b * 5000 + x * 200 + y * 35) as u16);
    let inputs: Vec<BandBuffer> = tile.bands().to_vec();
    let scale = ScaleFactor::new(35).unwrap();
    let mut filter = TileFilter::new(
        ScriptedSource::new(3, vec![Some(tile)]),
        FilterConfig::new(scale, ThresholdStrategy::Scale),
    );

    let out = filter.tile(rect, 0).unwrap().unwrap();
    assert_eq!(out.sample_type(), SampleType::U8);
    for (band, input) in inputs.iter().enumerate() {
        let mut expected = Buffer2::new_default(8, 8);
        scale.scale_band(input, &mut expected);
        assert_eq!(mask_of(out, band), expected, "band {band}");
    }
    assert_eq!(mask_of(out, 1)[(0, 0)], 142);
    // 10000 / 35 saturates.
    assert_eq!(mask_of(out, 2)[(0, 0)], 255);
}
