//! Haar wavelet energy anomaly detector.
//!
//! One Haar level splits the band into half-resolution average, horizontal,
//! vertical and diagonal coefficient images. Each is stretched to [0, 1] by its
//! own min and max, and their product forms the response. Pixels whose response
//! exceeds `mean + c * stddev` are detections, upsampled back to full size.


use common::Buffer2;

use crate::error::ConfigError;

use super::{MASK_OFF, MASK_ON};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveletAnomaly {
    threshold_constant: f64,
}

/// Single-level Haar decomposition of a band.
#[derive(Debug, Clone)]
pub(crate) struct HaarCoefficients {
    pub average: Buffer2<f64>,
    pub horizontal: Buffer2<f64>,
    pub vertical: Buffer2<f64>,
    pub diagonal: Buffer2<f64>,
}

impl HaarCoefficients {
    /// Decomposes non-overlapping 2x2 blocks. A trailing odd row or column is dropped.
    pub fn decompose(src: &Buffer2<u8>) -> Self {
        let w = src.width() / 2;
        let h = src.height() / 2;
        let mut average = Buffer2::new_default(w, h);
        let mut horizontal = Buffer2::new_default(w, h);
        let mut vertical = Buffer2::new_default(w, h);
        let mut diagonal = Buffer2::new_default(w, h);

        for y in 0..h {
            let top = src.row(2 * y);
            let bottom = src.row(2 * y + 1);
            for x in 0..w {
                let tl = f64::from(top[2 * x]);
                let tr = f64::from(top[2 * x + 1]);
                let bl = f64::from(bottom[2 * x]);
                let br = f64::from(bottom[2 * x + 1]);
                average[(x, y)] = (tl + tr + bl + br) * 0.5;
                horizontal[(x, y)] = (tl + bl - tr - br) * 0.5;
                vertical[(x, y)] = (tl + tr - bl - br) * 0.5;
                diagonal[(x, y)] = (tl - tr - bl + br) * 0.5;
            }
        }

        Self {
            average,
            horizontal,
            vertical,
            diagonal,
        }
    }
}

/// Stretches `image` to [0, 1]. A flat image is left untouched.
pub(crate) fn normalize_min_max(image: &mut Buffer2<f64>) {
    let (min, max) = image
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if range > 0.0 {
        for v in image.iter_mut() {
            *v = (*v - min) / range;
        }
    }
}

/// Population mean and standard deviation.
pub(crate) fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

impl WaveletAnomaly {
    pub fn new(threshold_constant: f64) -> Result<Self, ConfigError> {
        if !threshold_constant.is_finite() {
            return Err(ConfigError::NotFinite {
                name: "wavelet_threshold",
                value: threshold_constant,
            });
        }
        Ok(Self { threshold_constant })
    }

    #[inline]
    pub fn threshold_constant(&self) -> f64 {
        self.threshold_constant
    }

    /// Fused `A * V * H * D` response at half resolution.
    pub(crate) fn response(scaled: &Buffer2<u8>) -> Buffer2<f64> {
        let mut coeffs = HaarCoefficients::decompose(scaled);
        normalize_min_max(&mut coeffs.average);
        normalize_min_max(&mut coeffs.vertical);
        normalize_min_max(&mut coeffs.horizontal);
        normalize_min_max(&mut coeffs.diagonal);

        let mut response = coeffs.average;
        for (((r, &v), &h), &d) in response
            .iter_mut()
            .zip(coeffs.vertical.iter())
            .zip(coeffs.horizontal.iter())
            .zip(coeffs.diagonal.iter())
        {
            *r *= v * h * d;
        }
        response
    }

    pub fn apply(&self, scaled: &Buffer2<u8>, mask: &mut Buffer2<u8>) {
        let response = Self::response(scaled);
        let half_w = response.width();
        let half_h = response.height();
        if half_w == 0 || half_h == 0 {
            mask.fill(MASK_OFF);
            return;
        }

        let (mean, std) = mean_std(response.pixels());
        let threshold = mean + self.threshold_constant * std;
        let half_mask = response.map(|&r| if r > threshold { MASK_ON } else { MASK_OFF });

        // Nearest-neighbour upsampling keeps the mask binary.
        let width = mask.width();
        let height = mask.height();
        for y in 0..height {
            let sy = (y * half_h / height).min(half_h - 1);
            let src_row = half_mask.row(sy);
            for (x, dst) in mask.row_mut(y).iter_mut().enumerate() {
                let sx = (x * half_w / width).min(half_w - 1);
                *dst = src_row[sx];
            }
        }
    }
}

impl Default for WaveletAnomaly {
    fn default() -> Self {
        Self {
            threshold_constant: 3.0,
        }
    }
}
