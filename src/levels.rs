//! Sample level normalisation.

use crate::{DemosaicError, DemosaicResult, SampleGrid};

/// Keeps the ingested grid untouched and derives the working grid from it,
/// so changing the left shift never compounds.
#[derive(Clone, Debug, Default)]
pub struct LevelNormalizer {
    initial: SampleGrid,
    bayer: SampleGrid,
    shift: u32,
}

impl LevelNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the original grid and regenerate the working grid with the
    /// current shift.
    pub fn load(&mut self, grid: SampleGrid) {
        self.initial = grid;
        self.apply();
    }

    /// Set the left shift applied to every original sample.
    ///
    /// Negative shifts leave the previous state in place.  Shifts of 16 or
    /// more move every bit out of a sample and yield an all-zero grid.
    pub fn set_left_shift(&mut self, shift: i32) -> DemosaicResult<()> {
        self.shift = check_left_shift(shift)?;
        self.apply();
        Ok(())
    }

    pub fn left_shift(&self) -> u32 {
        self.shift
    }

    /// The normalised working grid.
    pub fn grid(&self) -> &SampleGrid {
        &self.bayer
    }

    /// The grid as it was ingested.
    pub fn initial(&self) -> &SampleGrid {
        &self.initial
    }

    pub fn clear(&mut self) {
        self.initial.clear();
        self.bayer.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.initial.is_empty()
    }

    fn apply(&mut self) {
        let shift = self.shift;
        if self.bayer.rows() != self.initial.rows() || self.bayer.cols() != self.initial.cols() {
            self.bayer = SampleGrid::new(self.initial.rows(), self.initial.cols());
        }
        for (dst, &src) in self.bayer.data_mut().iter_mut().zip(self.initial.data()) {
            *dst = (src as u32).checked_shl(shift).unwrap_or(0) as u16;
        }
    }
}

/// Validate a left shift; any non-negative amount is accepted.
pub fn check_left_shift(shift: i32) -> DemosaicResult<u32> {
    if shift < 0 {
        return Err(DemosaicError::InvalidParameter("left shift", shift));
    }
    Ok(shift as u32)
}
