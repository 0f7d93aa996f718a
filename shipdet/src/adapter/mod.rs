//! Tile filter: runs a thresholding strategy over every band of upstream tiles.
//!
//! The filter is itself a [`TileSource`], so it can stand wherever its
//! upstream could. It owns one output tile that is overwritten by each
//! request, so a single instance must not serve concurrent requests. Use one
//! filter per worker instead.

#[cfg(test)]
mod tests;

use common::Buffer2;

use crate::error::TileError;
use crate::scale::ScaleFactor;
use crate::source::TileSource;
use crate::strategy::ThresholdStrategy;
use crate::tile::{IRect, SampleType, Tile};

/// Tiles whose upper-left corner is aligned to this many pixels log at info level.
const PROGRESS_ALIGNMENT: i32 = 1024;

/// Immutable filter configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub scale: ScaleFactor,
    pub strategy: ThresholdStrategy,
    /// When false the filter forwards upstream tiles untouched.
    pub enabled: bool,
}

impl FilterConfig {
    pub fn new(scale: ScaleFactor, strategy: impl Into<ThresholdStrategy>) -> Self {
        Self {
            scale,
            strategy: strategy.into(),
            enabled: true,
        }
    }
}

#[derive(Debug)]
pub struct TileFilter<S> {
    upstream: S,
    config: FilterConfig,
    /// Allocated on the first request that has data.
    output: Option<Tile>,
    scaled: Buffer2<u8>,
}

impl<S: TileSource> TileFilter<S> {
    pub fn new(upstream: S, config: FilterConfig) -> Self {
        Self {
            upstream,
            config,
            output: None,
            scaled: Buffer2::new_default(0, 0),
        }
    }

    #[inline]
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.output.is_some()
    }

    /// Last produced tile, if any.
    #[inline]
    pub fn output_tile(&self) -> Option<&Tile> {
        self.output.as_ref()
    }

    #[inline]
    pub fn upstream(&self) -> &S {
        &self.upstream
    }

    pub fn into_upstream(self) -> S {
        self.upstream
    }

    /// Allocates the output tile from the upstream layout. Called lazily by
    /// [`TileSource::tile`] and a no-op once initialized.
    pub fn initialize(&mut self) {
        if self.output.is_none() {
            self.output = Some(OutputLayout::of(&self.upstream).allocate());
        }
    }
}

/// Band count and nominal tile size reported by the upstream.
#[derive(Debug, Clone, Copy)]
struct OutputLayout {
    bands: usize,
    width: u32,
    height: u32,
}

impl OutputLayout {
    fn of(upstream: &impl TileSource) -> Self {
        Self {
            bands: upstream.num_output_bands(),
            width: upstream.tile_width(),
            height: upstream.tile_height(),
        }
    }

    fn allocate(self) -> Tile {
        tracing::debug!(
            bands = self.bands,
            width = self.width,
            height = self.height,
            "Allocating output tile"
        );
        Tile::new(
            IRect::new(0, 0, self.width, self.height),
            self.bands,
            SampleType::U8,
        )
    }
}

impl<S: TileSource> TileSource for TileFilter<S> {
    fn tile(&mut self, rect: IRect, level: u32) -> Result<Option<&Tile>, TileError> {
        if !self.config.enabled {
            return self.upstream.tile(rect, level);
        }

        // Read before the request borrows the upstream.
        let layout = OutputLayout::of(&self.upstream);

        let Some(input) = self.upstream.tile(rect, level)? else {
            tracing::debug!(x = rect.x(), y = rect.y(), "Upstream tile is null");
            return Ok(None);
        };
        if input.is_no_data() {
            tracing::debug!(x = rect.x(), y = rect.y(), "Upstream tile is empty");
            return Ok(None);
        }

        let output = self.output.get_or_insert_with(|| layout.allocate());
        run_filter(&self.config, &mut self.scaled, input, output, rect).map(Some)
    }

    fn num_output_bands(&self) -> usize {
        self.upstream.num_output_bands()
    }

    fn tile_width(&self) -> u32 {
        self.upstream.tile_width()
    }

    fn tile_height(&self) -> u32 {
        self.upstream.tile_height()
    }

    fn output_sample_type(&self) -> SampleType {
        if self.config.enabled {
            SampleType::U8
        } else {
            self.upstream.output_sample_type()
        }
    }
}

/// Processes one upstream tile into `output`, leaving it null on failure.
fn run_filter<'a>(
    config: &FilterConfig,
    scaled: &mut Buffer2<u8>,
    input: &Tile,
    output: &'a mut Tile,
    requested: IRect,
) -> Result<&'a Tile, TileError> {
    if requested.x().rem_euclid(PROGRESS_ALIGNMENT) == 0
        && requested.y().rem_euclid(PROGRESS_ALIGNMENT) == 0
    {
        tracing::info!(x = requested.x(), y = requested.y(), "Processing tile");
    } else {
        tracing::debug!(x = requested.x(), y = requested.y(), "Processing tile");
    }

    match filter_bands(config, scaled, input, output) {
        Ok(()) => {
            output.validate();
            Ok(output)
        }
        Err(err) => {
            output.invalidate();
            tracing::warn!(x = requested.x(), y = requested.y(), %err, "Tile processing failed");
            Err(err)
        }
    }
}

fn filter_bands(
    config: &FilterConfig,
    scaled: &mut Buffer2<u8>,
    input: &Tile,
    output: &mut Tile,
) -> Result<(), TileError> {
    if input.num_bands() != output.num_bands() {
        return Err(TileError::BandCountMismatch {
            expected: output.num_bands(),
            actual: input.num_bands(),
        });
    }

    input.check_bands()?;

    let rect = input.rect();
    output.set_rect(rect);
    output.make_blank();

    if scaled.width() != rect.width() || scaled.height() != rect.height() {
        *scaled = Buffer2::new_default(rect.width(), rect.height());
    }

    for band in 0..input.num_bands() {
        config.scale.scale_band(input.band(band), scaled);
        let actual = output.band(band).sample_type();
        let mask = output
            .band_mut(band)
            .as_u8_mut()
            .ok_or(TileError::SampleTypeMismatch {
                band,
                expected: SampleType::U8,
                actual,
            })?;
        config.strategy.apply(scaled, mask);
    }
    Ok(())
}
