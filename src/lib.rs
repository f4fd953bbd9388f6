//! This crate provides routines for demosaicing raw Bayer sample grids.
//!
//! Samples are 16-bit and laid out in a fixed 2x2 colour filter array:
//!
//! ```text
//!   G R G R ...
//!   B G B G ...
//! ```
//!
//! A grid is ingested from a raw stream (or simulated from an 8-bit
//! image), normalised with a left shift, and demosaiced into a packed
//! `0xAARRGGBB` image with a right "tone" shift.  [`ComputeWorker`] runs
//! that pipeline on a background thread.
//!
//! # Example
//!
//! ```
//! use rawbayer::{decode, DemosaicEngine, DemosaicMode, RawSource};
//!
//! let mut bytes = vec![4, 0, 0, 0, 4, 0, 0, 0];
//! bytes.extend_from_slice(&[0; 32]);
//!
//! let grid = decode(&bytes, RawSource::Embedded).unwrap();
//! let image = DemosaicEngine::new(DemosaicMode::Gray).compute(&grid).unwrap();
//! assert!(image.as_slice().iter().all(|&px| px == 0xff00_0000));
//! ```

pub use bayer::{color_at, Channel, CFA_TILE};
pub use demosaic::{DemosaicEngine, DemosaicMode};
pub use errcode::{DemosaicError, DemosaicResult};
pub use grid::SampleGrid;
pub use ingest::{decode, encode, from_image, load_image, read_file, RawSource};
pub use levels::LevelNormalizer;
pub use raster::{FlatImage, OutputImage};
pub use worker::{ComputeWorker, LoadRequest, WorkerConfig};

pub mod demosaic;
pub mod ingest;
pub mod worker;

mod bayer;
mod errcode;
mod grid;
mod levels;
mod raster;

/// Run the whole synchronous pipeline: normalise with `left_shift`, then
/// demosaic.
pub fn run_demosaic(
    grid: SampleGrid,
    left_shift: i32,
    engine: &DemosaicEngine,
) -> DemosaicResult<OutputImage> {
    let mut levels = LevelNormalizer::new();
    levels.set_left_shift(left_shift)?;
    levels.load(grid);
    engine.compute(levels.grid())
}
