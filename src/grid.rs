//! Sample grid implementation.

use std::ops::{Index, IndexMut};

use crate::{DemosaicError, DemosaicResult};

/// Dense row-major grid of 16-bit sensor samples.
///
/// The backing store always holds exactly `rows * cols` samples.  An
/// empty grid has zero rows and zero columns.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SampleGrid {
    rows: usize,
    cols: usize,
    data: Vec<u16>,
}

impl SampleGrid {
    /// Allocate a zero-filled grid.  A zero dimension yields the empty
    /// 0x0 grid.
    ///
    /// # Examples
    ///
    /// ```
    /// let grid = rawbayer::SampleGrid::new(2, 4);
    /// assert_eq!(grid.at(1, 3), 0);
    /// ```
    pub fn new(rows: usize, cols: usize) -> Self {
        if rows == 0 || cols == 0 {
            return SampleGrid::default();
        }
        let len = rows.checked_mul(cols).expect("overflow");
        SampleGrid {
            rows,
            cols,
            data: vec![0; len],
        }
    }

    /// Wrap existing row-major samples.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<u16>) -> DemosaicResult<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(DemosaicError::WrongResolution);
        }
        if data.is_empty() {
            return Ok(SampleGrid::default());
        }
        Ok(SampleGrid { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Sample at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= rows` or `col >= cols`.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> u16 {
        assert!(col < self.cols);
        self.data[row * self.cols + col]
    }

    /// Mutable sample at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= rows` or `col >= cols`.
    #[inline]
    pub fn at_mut(&mut self, row: usize, col: usize) -> &mut u16 {
        assert!(col < self.cols);
        &mut self.data[row * self.cols + col]
    }

    /// Borrow a row slice.
    pub fn row(&self, row: usize) -> &[u16] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Borrow a mutable row slice.
    pub fn row_mut(&mut self, row: usize) -> &mut [u16] {
        let start = row * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Borrow two consecutive mutable rows, `row` and `row + 1`.
    pub fn row_pair_mut(&mut self, row: usize) -> (&mut [u16], &mut [u16]) {
        assert!(row + 1 < self.rows);
        let c = self.cols;
        self.data[row * c..(row + 2) * c].split_at_mut(c)
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u16] {
        &mut self.data
    }

    /// Reset to the empty grid, releasing the storage.
    pub fn clear(&mut self) {
        self.rows = 0;
        self.cols = 0;
        self.data = Vec::new();
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Index<(usize, usize)> for SampleGrid {
    type Output = u16;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &u16 {
        assert!(col < self.cols);
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for SampleGrid {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut u16 {
        self.at_mut(row, col)
    }
}
