//! Cell-averaging CFAR (constant false alarm rate) detector.
//!
//! A pixel is a detection when its value exceeds `factor` times the mean of
//! its background ring: the `neighbour_size` square window minus the concentric
//! `guard_size` square. Zero pixels are no-data. They are never detected and
//! never count towards a ring mean.
//!
//! Two evaluation methods produce identical masks:
//! - [`CfarMethod::Mask`] walks every window sample through a precomputed
//!   ring mask, `O(neighbour_size²)` per pixel.
//! - [`CfarMethod::RunningSum`] reads window and guard sums from summed-area
//!   tables, `O(1)` per pixel after one pass over the tile.
//!
//! The tile is zero-padded by `neighbour_size / 2` on every side, so windows
//! reaching past the tile edge see no-data rather than clamped samples.


use common::Buffer2;
use common::parallel::par_rows_mut;

use crate::error::ConfigError;
use crate::padded::PaddedBuffer;

use super::{MASK_OFF, MASK_ON};

/// How the ring mean is evaluated.
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
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CfarMethod {
    /// Window samples multiplied by a binary ring mask.
    #[default]
    Mask,
    /// Window sum minus guard sum from summed-area tables.
    RunningSum,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellAveragingCfar {
    guard_size: usize,
    neighbour_size: usize,
    factor: f64,
    method: CfarMethod,
}

/// Sum and count of the valid samples in one background ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RingStats {
    sum: u64,
    count: u64,
}

impl CellAveragingCfar {
    pub fn new(
        guard_size: usize,
        neighbour_size: usize,
        factor: f64,
        method: CfarMethod,
    ) -> Result<Self, ConfigError> {
        if guard_size % 2 == 0 {
            return Err(ConfigError::EvenWindow {
                name: "guard_size",
                value: guard_size,
            });
        }
        if neighbour_size % 2 == 0 {
            return Err(ConfigError::EvenWindow {
                name: "neighbour_size",
                value: neighbour_size,
            });
        }
        if guard_size > neighbour_size {
            return Err(ConfigError::GuardExceedsNeighbourhood {
                guard: guard_size,
                neighbour: neighbour_size,
            });
        }
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ConfigError::NotPositive {
                name: "cfar_threshold",
                value: factor,
            });
        }
        Ok(Self {
            guard_size,
            neighbour_size,
            factor,
            method,
        })
    }

    #[inline]
    pub fn guard_size(&self) -> usize {
        self.guard_size
    }

    #[inline]
    pub fn neighbour_size(&self) -> usize {
        self.neighbour_size
    }

    #[inline]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    #[inline]
    pub fn method(&self) -> CfarMethod {
        self.method
    }

    /// Same detector evaluated with a different method.
    pub fn with_method(&self, method: CfarMethod) -> Self {
        Self {
            method,
            ..self.clone()
        }
    }

    pub fn apply(&self, scaled: &Buffer2<u8>, mask: &mut Buffer2<u8>) {
        let width = scaled.width();
        let padded = PaddedBuffer::from_buffer(scaled, self.neighbour_size / 2);
        match self.method {
            CfarMethod::Mask => {
                let ring = self.ring_mask();
                par_rows_mut(mask.pixels_mut(), width, |y, out| {
                    for (x, dst) in out.iter_mut().enumerate() {
                        let v = *padded.at(x, y, 0, 0);
                        *dst = self.decide(v, || self.ring_stats_masked(&padded, &ring, x, y));
                    }
                });
            }
            CfarMethod::RunningSum => {
                let table = SummedArea::build(padded.padded());
                par_rows_mut(mask.pixels_mut(), width, |y, out| {
                    for (x, dst) in out.iter_mut().enumerate() {
                        let v = *padded.at(x, y, 0, 0);
                        *dst = self.decide(v, || self.ring_stats_summed(&table, &padded, x, y));
                    }
                });
            }
        }
    }

    #[inline]
    fn decide(&self, value: u8, ring: impl FnOnce() -> RingStats) -> u8 {
        if value == 0 {
            return MASK_OFF;
        }
        let stats = ring();
        // An empty ring has no defined mean.
        if stats.count == 0 {
            return MASK_OFF;
        }
        let mean = stats.sum as f64 / stats.count as f64;
        if f64::from(value) > self.factor * mean {
            MASK_ON
        } else {
            MASK_OFF
        }
    }

    /// Row-major `neighbour_size²` mask: 1 in the ring, 0 inside the guard.
    fn ring_mask(&self) -> Vec<u8> {
        let n = self.neighbour_size;
        let lo = (n - self.guard_size) / 2;
        let hi = lo + self.guard_size;
        let mut ring = vec![1u8; n * n];
        for row in ring.chunks_exact_mut(n).take(hi).skip(lo) {
            row[lo..hi].fill(0);
        }
        ring
    }

    fn ring_stats_masked(
        &self,
        padded: &PaddedBuffer<u8>,
        ring: &[u8],
        x: usize,
        y: usize,
    ) -> RingStats {
        let n = self.neighbour_size;
        let r = (n / 2) as isize;
        let mut stats = RingStats::default();
        // Padded column of the window's left edge equals the interior x.
        for (row_idx, ring_row) in ring.chunks_exact(n).enumerate() {
            let window_row = &padded.padded_row(y, row_idx as isize - r)[x..x + n];
            for (&sample, &keep) in window_row.iter().zip(ring_row) {
                let masked = sample * keep;
                if masked != 0 {
                    stats.sum += u64::from(masked);
                    stats.count += 1;
                }
            }
        }
        stats
    }

    fn ring_stats_summed(
        &self,
        table: &SummedArea,
        padded: &PaddedBuffer<u8>,
        x: usize,
        y: usize,
    ) -> RingStats {
        let margin = padded.margin();
        let cx = x + margin;
        let cy = y + margin;
        let r = self.neighbour_size / 2;
        let g = self.guard_size / 2;
        // The centre sits in both squares, so it cancels out of the difference.
        let window = table.window(cx - r, cy - r, self.neighbour_size);
        let guard = table.window(cx - g, cy - g, self.guard_size);
        RingStats {
            sum: window.sum - guard.sum,
            count: window.count - guard.count,
        }
    }
}

/// Inclusive prefix sums of sample values and nonzero counts.
#[derive(Debug)]
struct SummedArea {
    stride: usize,
    sums: Vec<u64>,
    counts: Vec<u64>,
}

impl SummedArea {
    fn build(src: &Buffer2<u8>) -> Self {
        let stride = src.width() + 1;
        let rows = src.height() + 1;
        let mut sums = vec![0u64; stride * rows];
        let mut counts = vec![0u64; stride * rows];
        for y in 0..src.height() {
            let mut row_sum = 0u64;
            let mut row_count = 0u64;
            for (x, &v) in src.row(y).iter().enumerate() {
                row_sum += u64::from(v);
                row_count += u64::from(v != 0);
                let idx = (y + 1) * stride + x + 1;
                sums[idx] = sums[idx - stride] + row_sum;
                counts[idx] = counts[idx - stride] + row_count;
            }
        }
        Self {
            stride,
            sums,
            counts,
        }
    }

    /// Stats of the `size x size` square with upper-left corner `(x, y)`.
    #[inline]
    fn window(&self, x: usize, y: usize, size: usize) -> RingStats {
        let s = self.stride;
        let a = y * s + x;
        let b = y * s + x + size;
        let c = (y + size) * s + x;
        let d = (y + size) * s + x + size;
        RingStats {
            sum: self.sums[d] + self.sums[a] - self.sums[b] - self.sums[c],
            count: self.counts[d] + self.counts[a] - self.counts[b] - self.counts[c],
        }
    }
}
