//! Intensity compression of wide-depth bands into 8-bit working buffers.

#[cfg(test)]
mod tests;

use std::num::NonZeroU32;

use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

use common::Buffer2;

use crate::error::ConfigError;
use crate::tile::{BandBuffer, Sample};
use crate::with_band;

/// Positive integer divisor applied to every input sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleFactor(NonZeroU32);

impl ScaleFactor {
    pub fn new(scale: u32) -> Result<Self, ConfigError> {
        NonZeroU32::new(scale)
            .map(Self)
            .ok_or(ConfigError::ZeroScale)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// `clamp(v / scale, 0, 255)` with truncating integer division.
    #[inline]
    pub fn apply<T: Sample>(self, value: T) -> u8 {
        let v: i64 = value.as_();
        (v / i64::from(self.get())).clamp(0, 255) as u8
    }

    /// Scales a whole band into `out`, which must have the same shape.
    pub fn scale_into<T: Sample>(self, input: &Buffer2<T>, out: &mut Buffer2<u8>) {
        assert_eq!(input.width(), out.width(), "width mismatch");
        assert_eq!(input.height(), out.height(), "height mismatch");
        for (dst, &src) in out.iter_mut().zip(input.iter()) {
            *dst = self.apply(src);
        }
    }

    /// Scales any band depth into `out`.
    pub fn scale_band(self, input: &BandBuffer, out: &mut Buffer2<u8>) {
        with_band!(input, buf => self.scale_into(buf, out))
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(NonZeroU32::new(35).unwrap_or(NonZeroU32::MIN))
    }
}
