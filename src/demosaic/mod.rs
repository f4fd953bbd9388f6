//! Collection of demosaicing algorithms.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::{DemosaicError, DemosaicResult, OutputImage, SampleGrid};

/// The demosaicing algorithm to use to fill in the missing data.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DemosaicMode {
    /// Each sample becomes a grey pixel.
    #[default]
    Gray,
    /// Per-pixel neighbour averages; the outermost ring is left unset.
    NearestReconstruct,
    /// Tiled bilinear interpolation in four ordered passes.
    BilinearReconstruct,
}

/// Default right shift mapping accumulated samples to 8 bits.
pub const DEFAULT_OUTPUT_SHIFT: u32 = 4;

pub mod gray;
pub mod linear;
pub mod nearestneighbour;

/// Branch-free `min(a, b)` for values whose difference fits in an `i32`.
#[inline]
pub fn min_fast(a: i32, b: i32) -> i32 {
    let z = a - b;
    let i = (!(z >> 31)) & 0x1;
    a - i * z
}

/// Map an accumulated value to the 8-bit range.
#[inline]
pub fn clamp_shift(v: u32, shift: u32) -> u32 {
    min_fast(255, (v >> shift) as i32) as u32
}

/// Demosaicing configuration: strategy plus output tone shift.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DemosaicEngine {
    mode: DemosaicMode,
    shift: u32,
}

impl Default for DemosaicEngine {
    fn default() -> Self {
        DemosaicEngine {
            mode: DemosaicMode::default(),
            shift: DEFAULT_OUTPUT_SHIFT,
        }
    }
}

impl DemosaicEngine {
    pub fn new(mode: DemosaicMode) -> Self {
        DemosaicEngine {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> DemosaicMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DemosaicMode) {
        self.mode = mode;
    }

    pub fn output_shift(&self) -> u32 {
        self.shift
    }

    /// Set the output right shift.  Must be positive; anything else keeps
    /// the previous shift.
    pub fn set_output_shift(&mut self, shift: i32) -> DemosaicResult<()> {
        if !(1..32).contains(&shift) {
            return Err(DemosaicError::InvalidParameter("output shift", shift));
        }
        self.shift = shift as u32;
        Ok(())
    }

    /// Demosaic `grid` into a freshly allocated image.
    pub fn compute(&self, grid: &SampleGrid) -> DemosaicResult<OutputImage> {
        let mut dst = OutputImage::new(grid.cols(), grid.rows());
        self.compute_into(grid, &mut dst)?;
        Ok(dst)
    }

    /// Demosaic `grid` into an existing image of the same dimensions.
    ///
    /// Every pixel a strategy writes is replaced whole.  Pixels it does not
    /// reach keep their previous value.
    pub fn compute_into(&self, grid: &SampleGrid, dst: &mut OutputImage) -> DemosaicResult<()> {
        if grid.is_empty() {
            return Err(DemosaicError::EmptySource);
        }
        if dst.width() != grid.cols() || dst.height() != grid.rows() {
            return Err(DemosaicError::WrongResolution);
        }

        debug!(mode = %self.mode, shift = self.shift, "demosaic");
        match self.mode {
            DemosaicMode::Gray => gray::run(grid, self.shift, dst),
            DemosaicMode::NearestReconstruct => nearestneighbour::run(grid, self.shift, dst),
            DemosaicMode::BilinearReconstruct => linear::run(grid, self.shift, dst),
        }
        Ok(())
    }
}

impl fmt::Display for DemosaicMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemosaicMode::Gray => f.write_str("gray"),
            DemosaicMode::NearestReconstruct => f.write_str("nearest"),
            DemosaicMode::BilinearReconstruct => f.write_str("bilinear"),
        }
    }
}

impl FromStr for DemosaicMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gray" | "grey" => Ok(DemosaicMode::Gray),
            "nearest" | "simple" => Ok(DemosaicMode::NearestReconstruct),
            "bilinear" | "linear" => Ok(DemosaicMode::BilinearReconstruct),
            _ => Err(format!("invalid demosaic mode: {}", s)),
        }
    }
}
