use common::Buffer2;

use crate::error::ConfigError;

use super::{MASK_OFF, MASK_ON};

/// Fixed intensity cut: `mask = 255` where `scaled > threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlobalThreshold {
    threshold: u8,
}

impl GlobalThreshold {
    pub fn new(threshold: i64) -> Result<Self, ConfigError> {
        let threshold = u8::try_from(threshold).map_err(|_| ConfigError::OutOfRange {
            name: "threshold",
            value: threshold,
        })?;
        Ok(Self { threshold })
    }

    #[inline]
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn apply(&self, scaled: &Buffer2<u8>, mask: &mut Buffer2<u8>) {
        for (out, &v) in mask.iter_mut().zip(scaled.iter()) {
            *out = if v > self.threshold { MASK_ON } else { MASK_OFF };
        }
    }
}
