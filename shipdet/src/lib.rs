//! Shipdet - tile-based target detection for SAR imagery.
//!
//! The pipeline turns large single-band rasters into point detections:
//! - Per tile: scale the band to 8 bits and threshold it into a 0/255 mask
//!   with a global threshold, cell-averaging CFAR or a wavelet anomaly score,
//!   or emit the scaled band as is.
//! - Per raster: assemble the tile masks and collapse each blob into one
//!   centroid with connected components or mean shift.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use shipdet::{DetectionProperties, MemoryRaster, TileFilter, TileGrid, assemble_mask};
//!
//! let props = DetectionProperties::default();
//! let raster = MemoryRaster::new(bands, 256, 256)?;
//! let bounds = raster.bounds();
//! let mut filter = TileFilter::new(raster, props.filter_config()?);
//! let grid = TileGrid::for_source(&filter, bounds)?;
//! let mosaic = assemble_mask(&mut filter, &grid, 0, 0)?;
//! let targets = props.clusterer()?.detect(mosaic.mask());
//! ```

pub mod adapter;
pub mod cluster;
pub mod config;
pub mod error;
pub mod mosaic;
pub(crate) mod padded;
pub mod scale;
pub mod source;
pub mod strategy;
pub mod tile;

pub use adapter::{FilterConfig, TileFilter};
pub use cluster::{
    BlobClusterer, Centroid, ConnectedComponentsConfig, Connectivity, MeanShiftConfig, SdType,
    render_centroids,
};
pub use config::{DetectionProperties, PropertyHandler, PropertyOutcome, PropertyValue};
pub use error::{ConfigError, TileError};
pub use mosaic::{Mosaic, TileGrid, assemble_mask, assemble_mask_parallel};
pub use scale::ScaleFactor;
pub use source::{MemoryRaster, TileSource};
pub use strategy::{
    CellAveragingCfar, CfarMethod, FilterKind, GlobalThreshold, MASK_OFF, MASK_ON,
    ThresholdStrategy, WaveletAnomaly,
};
pub use tile::{BandBuffer, IRect, SampleType, Tile, TileStatus};
