//! Demosaicing by averaging the nearest samples of each colour.
//!
//! Only the interior `[1, rows-2] x [1, cols-2]` is computed; the
//! outermost row and column on each side are neither read past nor
//! written.
//!
//! ```text
//!   green at R/B = (1 / 4) *      green at G = (1 / 5) *
//!       [ 0 1 0                       [ 1 0 1
//!       ; 1 0 1                       ; 0 1 0
//!       ; 0 1 0 ];                    ; 1 0 1 ];
//! ```

use crate::bayer::{color_at, Channel};
use crate::demosaic::clamp_shift;
use crate::raster::argb;
use crate::{OutputImage, SampleGrid};

pub fn run(grid: &SampleGrid, shift: u32, dst: &mut OutputImage) {
    let (h, w) = (grid.rows(), grid.cols());
    if h < 3 || w < 3 {
        return;
    }

    for y in 1..(h - 1) {
        let prev = grid.row(y - 1);
        let curr = grid.row(y);
        let next = grid.row(y + 1);
        let row = dst.row_mut(y);

        for x in 1..(w - 1) {
            let (r, g, b) = match color_at(y, x) {
                Channel::Green => apply_kernel_g(prev, curr, next, y, x),
                c => apply_kernel_c(prev, curr, next, c, x),
            };
            row[x] = argb(
                clamp_shift(r, shift),
                clamp_shift(g, shift),
                clamp_shift(b, shift),
            );
        }
    }
}

/// Red or blue site: the other of the two sits on the diagonals.
#[inline]
fn apply_kernel_c(
    prev: &[u16],
    curr: &[u16],
    next: &[u16],
    c: Channel,
    j: usize,
) -> (u32, u32, u32) {
    let own = curr[j] as u32;
    let cross = (prev[j] as u32 + curr[j - 1] as u32 + curr[j + 1] as u32 + next[j] as u32) >> 2;
    let diagonal =
        (prev[j - 1] as u32 + prev[j + 1] as u32 + next[j - 1] as u32 + next[j + 1] as u32) >> 2;

    if c == Channel::Red {
        (own, cross, diagonal)
    } else {
        (diagonal, cross, own)
    }
}

/// Green site: red and blue sit on the horizontal and vertical pairs,
/// whichever way round the tile row dictates.
#[inline]
fn apply_kernel_g(prev: &[u16], curr: &[u16], next: &[u16], i: usize, j: usize) -> (u32, u32, u32) {
    let green = (curr[j] as u32
        + prev[j - 1] as u32
        + prev[j + 1] as u32
        + next[j - 1] as u32
        + next[j + 1] as u32)
        / 5;
    let horizontal = (curr[j - 1] as u32 + curr[j + 1] as u32) >> 1;
    let vertical = (prev[j] as u32 + next[j] as u32) >> 1;

    if color_at(i, j + 1) == Channel::Red {
        (horizontal, green, vertical)
    } else {
        (vertical, green, horizontal)
    }
}
