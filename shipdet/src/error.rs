//! Error types for detection configuration and tile processing.

use thiserror::Error;

use crate::tile::{IRect, SampleType};

/// Rejected configuration. Raised before any tile is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("scale factor must be greater than zero")]
    ZeroScale,

    #[error("{name} must be an odd positive integer, got {value}")]
    EvenWindow { name: &'static str, value: usize },

    #[error("guard size {guard} exceeds neighbourhood size {neighbour}")]
    GuardExceedsNeighbourhood { guard: usize, neighbour: usize },

    #[error("{name} must be finite and greater than zero, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("rate must lie in (0, 1], got {0}")]
    RateOutOfRange(f64),

    #[error("max_iterations must be at least 1")]
    ZeroIterations,

    #[error("{name} value '{value}' is out of range")]
    OutOfRange { name: &'static str, value: i64 },

    #[error("unknown value '{value}' for property '{name}'")]
    UnknownVariant { name: &'static str, value: String },

    #[error("property '{name}' expects {expected}")]
    TypeMismatch {
        name: &'static str,
        expected: &'static str,
    },
}

/// Internal fault while producing one tile. Aborts only the current request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileError {
    #[error("band {band} holds {actual} samples, rectangle {rect:?} needs {expected}")]
    BandSizeMismatch {
        band: usize,
        rect: IRect,
        expected: usize,
        actual: usize,
    },

    #[error("upstream returned {actual} bands, expected {expected}")]
    BandCountMismatch { expected: usize, actual: usize },

    #[error("band {band} has sample type {actual}, expected {expected}")]
    SampleTypeMismatch {
        band: usize,
        expected: SampleType,
        actual: SampleType,
    },

    #[error("tile has no bands")]
    NoBands,

    #[error("band {band} requested from a tile with {bands} bands")]
    MissingBand { band: usize, bands: usize },

    #[error("source reports a {width}x{height} tile size")]
    ZeroTileSize { width: u32, height: u32 },
}
