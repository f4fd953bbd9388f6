//! Demosaicing using tiled bilinear interpolation.
//!
//! The image is built in four passes that must run in order:
//!
//! 1. green over 2x2 tiles anchored at odd rows and columns;
//! 2. the top two rows and the bottom row, which the tiles cannot reach;
//! 3. red and blue pre-interpolated in place in a scratch copy;
//! 4. red and blue merged from the scratch copy into the green words.
//!
//! ```text
//!   green at G = (1 / 5) *        green at R/B = (1 / 4) *
//!       [ 1 0 1                       [ 0 1 0
//!       ; 0 1 0                       ; 1 0 1
//!       ; 1 0 1 ];                    ; 0 1 0 ];
//! ```
//!
//! Column 0 and the last column are never written, and the edge pass
//! stops short of column `cols - 2`.  Rows below the last full tile pair
//! only get green.

use crate::bayer::{color_at, Channel};
use crate::demosaic::clamp_shift;
use crate::raster::{argb, OPAQUE};
use crate::{OutputImage, SampleGrid};

const GREEN_BITS: u32 = 0x0000_ff00;

pub fn run(grid: &SampleGrid, shift: u32, dst: &mut OutputImage) {
    let mut scratch = grid.clone();

    clear_merge_region(dst, grid.rows(), grid.cols());
    debayer_green(grid, shift, dst);
    debayer_edges(grid, shift, dst);

    // Pass 4 reads cells pass 3 rewrites; keep them separate and ordered.
    interpolate_red_blue(&mut scratch);
    merge_red_blue(&scratch, shift, dst);
}

/// Green at `(i, j)` from the rows above and below.
#[inline]
fn green_kernel(prev: &[u16], curr: &[u16], next: &[u16], c: Channel, j: usize) -> u32 {
    if c == Channel::Green {
        (curr[j] as u32
            + prev[j - 1] as u32
            + prev[j + 1] as u32
            + next[j - 1] as u32
            + next[j + 1] as u32)
            / 5
    } else {
        (prev[j] as u32 + curr[j - 1] as u32 + curr[j + 1] as u32 + next[j] as u32) >> 2
    }
}

/*--------------------------------------------------------------*/
/* Pass 1: green                                                */
/*--------------------------------------------------------------*/

fn debayer_green(grid: &SampleGrid, shift: u32, dst: &mut OutputImage) {
    let (h, w) = (grid.rows(), grid.cols());

    for i in (1..h.saturating_sub(2)).step_by(2) {
        let dm1 = grid.row(i - 1);
        let d0 = grid.row(i);
        let dp1 = grid.row(i + 1);
        let dp2 = grid.row(i + 2);
        let (sl0, sl1) = dst.row_pair_mut(i);

        for j in (1..w.saturating_sub(2)).step_by(2) {
            let g00 = green_kernel(dm1, d0, dp1, color_at(i, j), j);
            let g01 = green_kernel(dm1, d0, dp1, color_at(i, j + 1), j + 1);
            let g10 = green_kernel(d0, dp1, dp2, color_at(i + 1, j), j);
            let g11 = green_kernel(d0, dp1, dp2, color_at(i + 1, j + 1), j + 1);

            sl0[j] = OPAQUE | (clamp_shift(g00, shift) << 8);
            sl0[j + 1] = OPAQUE | (clamp_shift(g01, shift) << 8);
            sl1[j] = OPAQUE | (clamp_shift(g10, shift) << 8);
            sl1[j + 1] = OPAQUE | (clamp_shift(g11, shift) << 8);
        }
    }
}

/*--------------------------------------------------------------*/
/* Pass 2: edge rows                                            */
/*--------------------------------------------------------------*/

/// Green from the pixel's own row and one neighbouring row only.
#[inline]
fn edge_green(curr: &[u16], other: &[u16], c: Channel, j: usize) -> u32 {
    if c == Channel::Green {
        (curr[j] as u32 + other[j - 1] as u32 + other[j + 1] as u32) / 3
    } else {
        (curr[j - 1] as u32 + curr[j + 1] as u32 + other[j] as u32) / 3
    }
}

/// Red or blue from the pixel's own row and one neighbouring row only.
#[inline]
fn edge_colour(curr: &[u16], other: &[u16], y: usize, oy: usize, want: Channel, j: usize) -> u32 {
    if color_at(y, j) == want {
        curr[j] as u32
    } else if color_at(y, j + 1) == want {
        (curr[j - 1] as u32 + curr[j + 1] as u32) >> 1
    } else if color_at(oy, j) == want {
        other[j] as u32
    } else {
        (other[j - 1] as u32 + other[j + 1] as u32) >> 1
    }
}

fn debayer_edges(grid: &SampleGrid, shift: u32, dst: &mut OutputImage) {
    let (h, w) = (grid.rows(), grid.cols());
    if h < 2 || w < 4 {
        return;
    }

    // Rows 0 and 1 lean on each other.
    for (y, oy) in [(0, 1), (1, 0)] {
        let curr = grid.row(y);
        let other = grid.row(oy);
        let row = dst.row_mut(y);

        for j in 1..(w - 2) {
            let g = edge_green(curr, other, color_at(y, j), j);
            let r = edge_colour(curr, other, y, oy, Channel::Red, j);
            let b = edge_colour(curr, other, y, oy, Channel::Blue, j);
            row[j] = argb(
                clamp_shift(r, shift),
                clamp_shift(g, shift),
                clamp_shift(b, shift),
            );
        }
    }

    // The bottom row only gets green.
    let y = h - 1;
    if y > 1 {
        let curr = grid.row(y);
        let other = grid.row(y - 1);
        let row = dst.row_mut(y);

        for j in 1..(w - 2) {
            let g = edge_green(curr, other, color_at(y, j), j);
            row[j] = OPAQUE | (clamp_shift(g, shift) << 8);
        }
    }
}

/*--------------------------------------------------------------*/
/* Pass 3: red/blue pre-interpolation                           */
/*--------------------------------------------------------------*/

/// Over the half-resolution interior, fill the green cells of each red
/// row with the horizontal red average, and the green cells of each blue
/// row with the horizontal blue average.  Only cells of the opposite
/// column parity are read, so the in-place update never reads its own
/// output.
fn interpolate_red_blue(scratch: &mut SampleGrid) {
    let (h, w) = (scratch.rows(), scratch.cols());

    for i in 1..(h / 2).saturating_sub(1) {
        let (d1, d2) = scratch.row_pair_mut(i << 1);
        for j in 1..(w / 2).saturating_sub(1) {
            let red = (d1[(j << 1) - 1] as u32 + d1[(j << 1) + 1] as u32) >> 1;
            let blue = (d2[j << 1] as u32 + d2[(j << 1) - 2] as u32) >> 1;
            d1[j << 1] = red as u16;
            d2[(j << 1) - 1] = blue as u16;
        }
    }
}

/*--------------------------------------------------------------*/
/* Pass 4: red/blue merge                                       */
/*--------------------------------------------------------------*/

/// Zero every pixel pass 4 ORs into, so columns pass 1 skips carry no
/// green from a previous image.
fn clear_merge_region(dst: &mut OutputImage, h: usize, w: usize) {
    if w < 3 {
        return;
    }

    for i in 1..(h / 2).saturating_sub(1) {
        let (sl0, sl1) = dst.row_pair_mut(i << 1);
        sl0[1..w - 1].fill(0);
        sl1[1..w - 1].fill(0);
    }
}

fn merge_red_blue(scratch: &SampleGrid, shift: u32, dst: &mut OutputImage) {
    let (h, w) = (scratch.rows(), scratch.cols());
    if w < 3 {
        return;
    }

    for i in 1..(h / 2).saturating_sub(1) {
        let dm1 = scratch.row((i << 1) - 1);
        let d0 = scratch.row(i << 1);
        let dp1 = scratch.row((i << 1) + 1);
        let dp2 = scratch.row((i << 1) + 2);
        let (sl0, sl1) = dst.row_pair_mut(i << 1);

        for j in 1..(w - 1) {
            // Red row: red is in place, blue sits above and below.
            let red = clamp_shift(d0[j] as u32, shift);
            let blue = clamp_shift((dm1[j] as u32 + dp1[j] as u32) >> 1, shift);
            sl0[j] = (sl0[j] & GREEN_BITS) | OPAQUE | (red << 16) | blue;

            // Blue row: blue is in place, red sits above and below.
            let red = clamp_shift((d0[j] as u32 + dp2[j] as u32) >> 1, shift);
            let blue = clamp_shift(dp1[j] as u32, shift);
            sl1[j] = (sl1[j] & GREEN_BITS) | OPAQUE | (red << 16) | blue;
        }
    }
}
