//! Blob clustering: collapses a full binary mask into one centroid per target.
//!
//! Two clusterers are available:
//! - [`ConnectedComponentsConfig`]: optional morphological closing followed by
//!   run-length union-find labeling. One centroid per connected region.
//! - [`MeanShiftConfig`]: flat-kernel mode seeking over the "on" pixel
//!   coordinates. One centroid per merged mode.
//!
//! Both are deterministic for a given mask and configuration.


mod kdtree;
mod labeling;
mod mean_shift;
mod morphology;

use common::{BitBuffer2, Buffer2};
use glam::{DVec2, IVec2};

use crate::strategy::MASK_ON;

pub use labeling::LabelMap;
pub use mean_shift::MeanShiftConfig;
pub use morphology::{close, dilate, erode};

/// Pixel connectivity for connected component labeling.
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
pub enum Connectivity {
    /// Only horizontal and vertical neighbours touch.
    Four,
    /// Diagonal neighbours touch too.
    #[default]
    Eight,
}

/// Selector for the clustering family, as exposed by `sd_type`.
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
pub enum SdType {
    #[default]
    ConnectedComponents,
    MeanShift,
}

/// Representative point of one detected blob or cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Centroid {
    /// Pixel position, rounded half-up.
    pub position: IVec2,
    /// Mask pixels that contributed to this centroid.
    pub members: usize,
}

impl Centroid {
    /// Rounds `mean` to the nearest pixel, halves going up.
    pub(crate) fn from_mean(mean: DVec2, members: usize) -> Self {
        Self {
            position: (mean + DVec2::splat(0.5)).floor().as_ivec2(),
            members,
        }
    }
}

/// Connected component clustering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConnectedComponentsConfig {
    /// Side of the square closing element. 0 disables closing.
    pub spacing: usize,
    pub connectivity: Connectivity,
}

impl Default for ConnectedComponentsConfig {
    fn default() -> Self {
        Self {
            spacing: 2,
            connectivity: Connectivity::Eight,
        }
    }
}

impl ConnectedComponentsConfig {
    pub fn detect(&self, mask: &BitBuffer2) -> Vec<Centroid> {
        let labels = if self.spacing > 0 {
            LabelMap::from_mask(&close(mask, self.spacing), self.connectivity)
        } else {
            LabelMap::from_mask(mask, self.connectivity)
        };
        labels.centroids()
    }
}

/// Validated clusterer, chosen once at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum BlobClusterer {
    ConnectedComponents(ConnectedComponentsConfig),
    MeanShift(MeanShiftConfig),
}

impl Default for BlobClusterer {
    fn default() -> Self {
        Self::ConnectedComponents(ConnectedComponentsConfig::default())
    }
}

impl From<ConnectedComponentsConfig> for BlobClusterer {
    fn from(value: ConnectedComponentsConfig) -> Self {
        Self::ConnectedComponents(value)
    }
}

impl From<MeanShiftConfig> for BlobClusterer {
    fn from(value: MeanShiftConfig) -> Self {
        Self::MeanShift(value)
    }
}

impl BlobClusterer {
    pub fn sd_type(&self) -> SdType {
        match self {
            Self::ConnectedComponents(_) => SdType::ConnectedComponents,
            Self::MeanShift(_) => SdType::MeanShift,
        }
    }

    /// Centroids of the "on" (nonzero) pixels of a fully assembled mask.
    pub fn detect(&self, mask: &Buffer2<u8>) -> Vec<Centroid> {
        let bits = BitBuffer2::from_bytes(mask.width(), mask.height(), mask.pixels(), |v| v > 0);
        let centroids = match self {
            Self::ConnectedComponents(config) => config.detect(&bits),
            Self::MeanShift(config) => {
                let points: Vec<DVec2> = bits
                    .iter_ones()
                    .map(|(x, y)| DVec2::new(x as f64, y as f64))
                    .collect();
                config.detect(&points)
            }
        };
        tracing::debug!(
            sd_type = %self.sd_type(),
            points = bits.count_ones(),
            clusters = centroids.len(),
            "Clustered mask"
        );
        centroids
    }
}

/// Paints every centroid inside `width` x `height` as a [`MASK_ON`] pixel on a blank mask.
pub fn render_centroids(centroids: &[Centroid], width: usize, height: usize) -> Buffer2<u8> {
    let mut mask = Buffer2::new_default(width, height);
    for centroid in centroids {
        let IVec2 { x, y } = centroid.position;
        if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
            continue;
        }
        mask[(x as usize, y as usize)] = MASK_ON;
    }
    mask
}
