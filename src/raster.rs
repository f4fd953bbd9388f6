//! Packed 32-bit rasters.

use crate::bayer::Channel;

/// Alpha bits of a fully opaque pixel.
pub const OPAQUE: u32 = 0xff00_0000;

/// Pack 8-bit channels into an opaque `0xAARRGGBB` word.
#[inline]
pub fn argb(red: u32, green: u32, blue: u32) -> u32 {
    OPAQUE | (red << 16) | (green << 8) | blue
}

/// Extract one 8-bit channel from a packed word.
#[inline]
pub fn channel_of(word: u32, channel: Channel) -> u8 {
    (word >> channel.shift()) as u8
}

/// Demosaiced output image, one `0xAARRGGBB` word per pixel.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OutputImage {
    width: usize,
    height: usize,
    buf: Vec<u32>,
}

/// An 8-bit per channel source image in the same packing as
/// [`OutputImage`], used to simulate sensor data.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FlatImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl OutputImage {
    /// Allocate a zeroed (fully transparent black) image.
    pub fn new(width: usize, height: usize) -> Self {
        let len = width.checked_mul(height).expect("overflow");
        OutputImage {
            width,
            height,
            buf: vec![0; len],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel word at `(row, col)`.
    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> u32 {
        assert!(col < self.width);
        self.buf[row * self.width + col]
    }

    /// Borrow a row slice.
    pub fn row(&self, y: usize) -> &[u32] {
        assert!(y < self.height);
        let start = y * self.width;
        &self.buf[start..start + self.width]
    }

    /// Borrow a mutable row slice.
    pub fn row_mut(&mut self, y: usize) -> &mut [u32] {
        assert!(y < self.height);
        let start = y * self.width;
        &mut self.buf[start..start + self.width]
    }

    /// Borrow two consecutive mutable rows, `y` and `y + 1`.
    pub fn row_pair_mut(&mut self, y: usize) -> (&mut [u32], &mut [u32]) {
        assert!(y + 1 < self.height);
        let w = self.width;
        let (top, bottom) = self.buf[y * w..(y + 2) * w].split_at_mut(w);
        (top, bottom)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.buf
    }

    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        &mut self.buf
    }

    /// Interleaved 8-bit RGB bytes, dropping alpha.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3 * self.buf.len());
        for &px in &self.buf {
            out.push(channel_of(px, Channel::Red));
            out.push(channel_of(px, Channel::Green));
            out.push(channel_of(px, Channel::Blue));
        }
        out
    }
}

impl FlatImage {
    /// Pack interleaved RGBA bytes (as produced by the `image` crate).
    pub fn from_rgba8(width: usize, height: usize, rgba: &[u8]) -> Self {
        let pixels = rgba
            .chunks_exact(4)
            .map(|p| {
                ((p[3] as u32) << 24) | ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32
            })
            .collect();

        FlatImage {
            width,
            height,
            pixels,
        }
    }
}
