//! Example: detect bright targets in a synthetic SAR-like scene.
//!
//! Builds a speckled 16-bit background with a handful of bright targets,
//! runs the tile filter over it in parallel, clusters the assembled mask and
//! logs every detection next to the planted target positions.
//!
//! Settings can be overridden as `name=value` arguments, using the same
//! property names the detection stage exposes:
//!
//! ```bash
//! cargo run --example detect_synthetic -- filter_type=cfar cfar_method=running-sum sd_type=mean-shift
//! ```

use std::time::Instant;

use anyhow::{Context, bail};
use common::Buffer2;
use common::log_setup::setup_logging;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shipdet::{
    BandBuffer, DetectionProperties, MemoryRaster, PropertyHandler, PropertyOutcome, PropertyValue,
    TileFilter, TileGrid, assemble_mask_parallel, render_centroids,
};

const WIDTH: usize = 1024;
const HEIGHT: usize = 768;
const TILE_SIZE: u32 = 256;
const WORKERS: usize = 4;
const SEED: u64 = 0x5A12;

/// Planted targets as (x, y, side).
const TARGETS: [(usize, usize, usize); 6] = [
    (100, 80, 3),
    (254, 300, 5),
    (511, 511, 4),
    (700, 120, 3),
    (900, 650, 6),
    (380, 700, 3),
];

fn synthetic_scene() -> Buffer2<u16> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut band = Buffer2::from_fn(WIDTH, HEIGHT, |_, _| {
        // Exponential-ish speckle around a mean of ~500.
        let u: f64 = rng.random_range(0.001..1.0);
        (-u.ln() * 500.0).min(4000.0) as u16 + 1
    });
    for &(tx, ty, side) in &TARGETS {
        for y in ty..ty + side {
            for x in tx..tx + side {
                band[(x, y)] = 8000;
            }
        }
    }
    band
}

fn apply_overrides(props: &mut DetectionProperties) -> anyhow::Result<()> {
    for arg in std::env::args().skip(1) {
        let Some((name, value)) = arg.split_once('=') else {
            bail!("expected name=value, got '{arg}'");
        };
        let outcome = props
            .set_property(name, PropertyValue::parse(value))
            .with_context(|| format!("setting '{name}'"))?;
        if outcome == PropertyOutcome::Unhandled {
            bail!("unknown property '{name}'");
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    setup_logging("info", "shipdet");

    let mut props = DetectionProperties::default();
    apply_overrides(&mut props)?;
    for name in props.property_names() {
        if let Some(value) = props.property(name) {
            tracing::info!(name, %value, "Property");
        }
    }

    let filter_config = props.filter_config()?;
    let clusterer = props.clusterer()?;

    let scene: BandBuffer = synthetic_scene().into();
    let raster = MemoryRaster::new(vec![scene], TILE_SIZE, TILE_SIZE)?;
    let grid = TileGrid::for_source(&raster, raster.bounds())?;

    let start = Instant::now();
    let mosaic = assemble_mask_parallel(
        || TileFilter::new(raster.clone(), filter_config.clone()),
        &grid,
        0,
        0,
        WORKERS,
    )?;
    tracing::info!(
        tiles = grid.len(),
        missing = mosaic.missing().len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Mask assembled"
    );

    let start = Instant::now();
    let centroids = clusterer.detect(mosaic.mask());
    tracing::info!(
        detections = centroids.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Clustering done"
    );

    for centroid in &centroids {
        tracing::info!(
            x = centroid.position.x,
            y = centroid.position.y,
            members = centroid.members,
            "Detection"
        );
    }
    for &(tx, ty, side) in &TARGETS {
        tracing::info!(x = tx + side / 2, y = ty + side / 2, "Planted target");
    }

    let points = render_centroids(&centroids, WIDTH, HEIGHT);
    let painted = points.iter().filter(|&&v| v > 0).count();
    tracing::info!(painted, "Rendered detection points");
    Ok(())
}
