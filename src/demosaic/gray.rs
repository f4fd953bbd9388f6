//! Demosaicing without any interpolation: every sample becomes a grey
//! pixel, borders included.

use crate::demosaic::clamp_shift;
use crate::raster::argb;
use crate::{OutputImage, SampleGrid};

pub fn run(grid: &SampleGrid, shift: u32, dst: &mut OutputImage) {
    for y in 0..grid.rows() {
        let src = grid.row(y);
        let row = dst.row_mut(y);
        for (px, &s) in row.iter_mut().zip(src) {
            let v = clamp_shift(s as u32, shift);
            *px = argb(v, v, v);
        }
    }
}
