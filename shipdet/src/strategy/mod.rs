//! Per-band strategies over a scaled 8-bit band. Every strategy except
//! [`ThresholdStrategy::Scale`] produces a 0/255 mask.


pub mod cfar;
mod global;
pub mod wavelet;

use common::Buffer2;

pub use cfar::{CellAveragingCfar, CfarMethod};
pub use global::GlobalThreshold;
pub use wavelet::WaveletAnomaly;

/// Mask value for a detected pixel.
pub const MASK_ON: u8 = 255;
/// Mask value for background.
pub const MASK_OFF: u8 = 0;

/// Selector for the thresholding family, as exposed by `filter_type`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Global,
    #[default]
    Cfar,
    Wavelet,
    /// No thresholding: the scaled band itself.
    Scale,
}

/// Validated thresholding strategy, chosen once at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdStrategy {
    Global(GlobalThreshold),
    Cfar(CellAveragingCfar),
    Wavelet(WaveletAnomaly),
    /// Emits the scaled band unchanged, for inspecting the 8-bit view.
    Scale,
}

impl ThresholdStrategy {
    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Global(_) => FilterKind::Global,
            Self::Cfar(_) => FilterKind::Cfar,
            Self::Wavelet(_) => FilterKind::Wavelet,
            Self::Scale => FilterKind::Scale,
        }
    }

    /// Writes the output for `scaled` into `mask`. Both buffers share one shape.
    pub fn apply(&self, scaled: &Buffer2<u8>, mask: &mut Buffer2<u8>) {
        assert_eq!(scaled.width(), mask.width(), "width mismatch");
        assert_eq!(scaled.height(), mask.height(), "height mismatch");
        match self {
            Self::Global(global) => global.apply(scaled, mask),
            Self::Cfar(cfar) => cfar.apply(scaled, mask),
            Self::Wavelet(wavelet) => wavelet.apply(scaled, mask),
            Self::Scale => mask.copy_from_slice(scaled),
        }
    }

    /// Allocating variant of [`ThresholdStrategy::apply`].
    pub fn threshold(&self, scaled: &Buffer2<u8>) -> Buffer2<u8> {
        let mut mask = Buffer2::new_default(scaled.width(), scaled.height());
        self.apply(scaled, &mut mask);
        mask
    }
}

impl From<GlobalThreshold> for ThresholdStrategy {
    fn from(value: GlobalThreshold) -> Self {
        Self::Global(value)
    }
}

impl From<CellAveragingCfar> for ThresholdStrategy {
    fn from(value: CellAveragingCfar) -> Self {
        Self::Cfar(value)
    }
}

impl From<WaveletAnomaly> for ThresholdStrategy {
    fn from(value: WaveletAnomaly) -> Self {
        Self::Wavelet(value)
    }
}
