//! Raster tiles: an integer rectangle plus one row-major buffer per band.


use glam::{IVec2, UVec2};
use num_traits::AsPrimitive;

use common::Buffer2;

use crate::error::TileError;

/// Axis-aligned integer rectangle in raster pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IRect {
    /// Upper-left corner.
    pub origin: IVec2,
    pub size: UVec2,
}

impl IRect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            origin: IVec2::new(x, y),
            size: UVec2::new(width, height),
        }
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.origin.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.origin.y
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.size.x as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.size.y as usize
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.x == 0 || self.size.y == 0
    }

    /// Exclusive lower-right corner.
    #[inline]
    pub fn end(&self) -> IVec2 {
        self.origin + self.size.as_ivec2()
    }

    /// Overlapping region, or `None` when the rectangles do not overlap.
    pub fn intersect(&self, other: &IRect) -> Option<IRect> {
        let start = self.origin.max(other.origin);
        let end = self.end().min(other.end());
        if end.x <= start.x || end.y <= start.y {
            return None;
        }
        Some(IRect {
            origin: start,
            size: (end - start).as_uvec2(),
        })
    }

    pub fn contains_rect(&self, other: &IRect) -> bool {
        other.origin.cmpge(self.origin).all() && other.end().cmple(self.end()).all()
    }
}

/// Sample depth of a band buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SampleType {
    U8,
    U16,
    I16,
    U32,
    I32,
}

/// Integer sample that can live in a [`BandBuffer`].
pub trait Sample: Copy + Default + Send + Sync + AsPrimitive<i64> + 'static {
    const TYPE: SampleType;

    fn into_band(buffer: Buffer2<Self>) -> BandBuffer;
}

macro_rules! impl_sample {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Sample for $ty {
                const TYPE: SampleType = SampleType::$variant;

                #[inline]
                fn into_band(buffer: Buffer2<Self>) -> BandBuffer {
                    BandBuffer::$variant(buffer)
                }
            }
        )*
    };
}

impl_sample!(u8 => U8, u16 => U16, i16 => I16, u32 => U32, i32 => I32);

/// One band of a tile, tagged with its sample depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BandBuffer {
    U8(Buffer2<u8>),
    U16(Buffer2<u16>),
    I16(Buffer2<i16>),
    U32(Buffer2<u32>),
    I32(Buffer2<i32>),
}

/// Runs `$body` with `$buf` bound to the typed buffer inside a [`BandBuffer`].
#[macro_export]
macro_rules! with_band {
    ($band:expr, $buf:ident => $body:expr) => {
        match $band {
            $crate::tile::BandBuffer::U8($buf) => $body,
            $crate::tile::BandBuffer::U16($buf) => $body,
            $crate::tile::BandBuffer::I16($buf) => $body,
            $crate::tile::BandBuffer::U32($buf) => $body,
            $crate::tile::BandBuffer::I32($buf) => $body,
        }
    };
}

impl BandBuffer {
    /// Zero-filled band of the given depth.
    pub fn zeroed(sample_type: SampleType, width: usize, height: usize) -> Self {
        match sample_type {
            SampleType::U8 => Self::U8(Buffer2::new_default(width, height)),
            SampleType::U16 => Self::U16(Buffer2::new_default(width, height)),
            SampleType::I16 => Self::I16(Buffer2::new_default(width, height)),
            SampleType::U32 => Self::U32(Buffer2::new_default(width, height)),
            SampleType::I32 => Self::I32(Buffer2::new_default(width, height)),
        }
    }

    pub fn sample_type(&self) -> SampleType {
        match self {
            Self::U8(_) => SampleType::U8,
            Self::U16(_) => SampleType::U16,
            Self::I16(_) => SampleType::I16,
            Self::U32(_) => SampleType::U32,
            Self::I32(_) => SampleType::I32,
        }
    }

    pub fn width(&self) -> usize {
        with_band!(self, buf => buf.width())
    }

    pub fn height(&self) -> usize {
        with_band!(self, buf => buf.height())
    }

    pub fn len(&self) -> usize {
        with_band!(self, buf => buf.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        with_band!(self, buf => buf.fill(Default::default()))
    }

    /// Copies the window `(x, y, width, height)` into a new band of the same depth.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Self {
        with_band!(self, buf => BandBuffer::from(buf.crop(x, y, width, height)))
    }

    pub fn as_u8(&self) -> Option<&Buffer2<u8>> {
        match self {
            Self::U8(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn as_u8_mut(&mut self) -> Option<&mut Buffer2<u8>> {
        match self {
            Self::U8(buf) => Some(buf),
            _ => None,
        }
    }

    /// Sample at `(x, y)` widened to `i64`.
    pub fn sample_i64(&self, x: usize, y: usize) -> i64 {
        with_band!(self, buf => AsPrimitive::<i64>::as_(*buf.get(x, y)))
    }
}

impl<T: Sample> From<Buffer2<T>> for BandBuffer {
    fn from(buffer: Buffer2<T>) -> Self {
        T::into_band(buffer)
    }
}

/// Data state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileStatus {
    /// Contents undefined; must not be read.
    #[default]
    Null,
    /// Zero-filled, no data written yet.
    Empty,
    /// Contents hold computed or loaded data.
    Valid,
}

/// A rectangular multi-band raster region.
#[derive(Debug, Clone)]
pub struct Tile {
    rect: IRect,
    sample_type: SampleType,
    bands: Vec<BandBuffer>,
    status: TileStatus,
}

impl Tile {
    /// Allocates zeroed bands for `rect`. The tile starts out [`TileStatus::Null`].
    pub fn new(rect: IRect, num_bands: usize, sample_type: SampleType) -> Self {
        let bands = (0..num_bands)
            .map(|_| BandBuffer::zeroed(sample_type, rect.width(), rect.height()))
            .collect();
        Self {
            rect,
            sample_type,
            bands,
            status: TileStatus::Null,
        }
    }

    /// Wraps existing band buffers as a valid tile.
    pub fn from_bands(rect: IRect, bands: Vec<BandBuffer>) -> Result<Self, TileError> {
        let sample_type = bands.first().ok_or(TileError::NoBands)?.sample_type();
        let tile = Self {
            rect,
            sample_type,
            bands,
            status: TileStatus::Valid,
        };
        tile.check_bands()?;
        Ok(tile)
    }

    /// Checks that every band covers the tile rectangle with the tile's sample depth.
    ///
    /// [`Tile::band_mut`] can swap in any buffer, so consumers of foreign tiles
    /// call this before indexing bands by the rectangle.
    pub fn check_bands(&self) -> Result<(), TileError> {
        for (band, buffer) in self.bands.iter().enumerate() {
            if buffer.width() != self.rect.width() || buffer.height() != self.rect.height() {
                return Err(TileError::BandSizeMismatch {
                    band,
                    rect: self.rect,
                    expected: self.rect.area(),
                    actual: buffer.len(),
                });
            }
            if buffer.sample_type() != self.sample_type {
                return Err(TileError::SampleTypeMismatch {
                    band,
                    expected: self.sample_type,
                    actual: buffer.sample_type(),
                });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn rect(&self) -> IRect {
        self.rect
    }

    #[inline]
    pub fn status(&self) -> TileStatus {
        self.status
    }

    #[inline]
    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    #[inline]
    pub fn num_bands(&self) -> usize {
        self.bands.len()
    }

    #[inline]
    pub fn band(&self, index: usize) -> &BandBuffer {
        &self.bands[index]
    }

    #[inline]
    pub fn band_mut(&mut self, index: usize) -> &mut BandBuffer {
        &mut self.bands[index]
    }

    #[inline]
    pub fn bands(&self) -> &[BandBuffer] {
        &self.bands
    }

    pub fn into_bands(self) -> Vec<BandBuffer> {
        self.bands
    }

    /// True when the tile carries no usable data.
    pub fn is_no_data(&self) -> bool {
        matches!(self.status, TileStatus::Null | TileStatus::Empty)
            || self.rect.is_empty()
            || self.bands.is_empty()
    }

    /// Moves the tile to `rect`, reallocating bands when the size changes.
    /// Contents become undefined.
    pub fn set_rect(&mut self, rect: IRect) {
        if rect.size != self.rect.size {
            for band in &mut self.bands {
                *band = BandBuffer::zeroed(self.sample_type, rect.width(), rect.height());
            }
        }
        self.rect = rect;
        self.status = TileStatus::Null;
    }

    /// Zero-fills every band.
    pub fn make_blank(&mut self) {
        for band in &mut self.bands {
            band.clear();
        }
        self.status = TileStatus::Empty;
    }

    pub fn validate(&mut self) {
        self.status = TileStatus::Valid;
    }

    pub fn invalidate(&mut self) {
        self.status = TileStatus::Null;
    }
}
