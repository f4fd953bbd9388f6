//! Raw stream ingest.
//!
//! The embedded format is a little-endian header followed by the samples:
//!
//! ```text
//!   0..4   i32 width
//!   4..8   i32 height
//!   8..    width * height u16 samples, row-major, low byte first
//! ```

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use image::DynamicImage;
use tracing::debug;

use crate::bayer::{color_at, read_exact_u16le, write_u16le};
use crate::raster::{channel_of, FlatImage};
use crate::{DemosaicError, DemosaicResult, SampleGrid};

/// Largest accepted width or height.
pub const MAX_DIMENSION: i64 = 0xFF_FFFF;

const HEADER_LEN: usize = 8;

/// How a byte stream becomes a sample grid.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RawSource {
    /// Width and height lead the stream.
    Embedded,
    /// Width and height are supplied by the caller.
    External { width: i64, height: i64 },
    /// The stream is an encoded image (PNG, JPEG) sampled through the
    /// colour filter array; see [`from_image`].
    FromImage,
}

/// Decode a raw byte stream into a sample grid.
///
/// # Examples
///
/// ```
/// use rawbayer::{decode, RawSource};
///
/// let bytes = [2, 0, 0, 0, 1, 0, 0, 0, 0x34, 0x12, 0x01, 0x00];
/// let grid = decode(&bytes, RawSource::Embedded).unwrap();
/// assert_eq!(grid.at(0, 0), 0x1234);
/// assert_eq!(grid.at(0, 1), 1);
/// ```
pub fn decode(bytes: &[u8], source: RawSource) -> DemosaicResult<SampleGrid> {
    let mut r = Cursor::new(bytes);

    let (width, height) = match source {
        RawSource::FromImage => {
            if bytes.is_empty() {
                return Err(DemosaicError::EmptySource);
            }
            let image = image::load_from_memory(bytes)?;
            return from_image(&flatten(image));
        }
        RawSource::Embedded => {
            if bytes.len() < HEADER_LEN {
                return Err(DemosaicError::Truncated(HEADER_LEN, bytes.len()));
            }
            let w = r.read_i32::<LittleEndian>()?;
            let h = r.read_i32::<LittleEndian>()?;
            (w as i64, h as i64)
        }
        RawSource::External { width, height } => (width, height),
    };
    let (w, h) = check_dimensions(width, height)?;

    let offset = r.position() as usize;
    let expected = w
        .checked_mul(h)
        .and_then(|n| n.checked_mul(2))
        .ok_or(DemosaicError::MalformedHeader(width, height))?;
    let available = bytes.len() - offset;
    if available < expected {
        return Err(DemosaicError::Truncated(offset + expected, bytes.len()));
    }

    let mut grid = SampleGrid::new(h, w);
    read_exact_u16le(&mut r, grid.data_mut())?;

    debug!(width = w, height = h, ?source, "decoded raw stream");
    Ok(grid)
}

/// Read a whole file and decode it.
pub fn read_file<P: AsRef<Path>>(path: P, source: RawSource) -> DemosaicResult<SampleGrid> {
    let bytes = fs::read(path)?;
    decode(&bytes, source)
}

/// Simulate sensor data from a flat image.
///
/// Each pixel keeps only the channel the colour filter array places at its
/// position, promoted to a 16-bit sample.
pub fn from_image(image: &FlatImage) -> DemosaicResult<SampleGrid> {
    if image.width == 0 || image.height == 0 || image.pixels.is_empty() {
        return Err(DemosaicError::EmptySource);
    }
    if image.width.checked_mul(image.height) != Some(image.pixels.len()) {
        return Err(DemosaicError::WrongResolution);
    }

    let mut grid = SampleGrid::new(image.height, image.width);
    for (y, src) in image.pixels.chunks_exact(image.width).enumerate() {
        let row = grid.row_mut(y);
        for (x, &px) in src.iter().enumerate() {
            row[x] = channel_of(px, color_at(y, x)) as u16;
        }
    }

    Ok(grid)
}

/// Decode an image file (PNG, JPEG) into a flat 8-bit image.
pub fn load_image<P: AsRef<Path>>(path: P) -> DemosaicResult<FlatImage> {
    Ok(flatten(image::open(path)?))
}

fn flatten(image: DynamicImage) -> FlatImage {
    let rgba = image.to_rgba8();
    let (w, h) = rgba.dimensions();
    FlatImage::from_rgba8(w as usize, h as usize, rgba.as_raw())
}

/// Write a grid in the embedded format.
pub fn encode(grid: &SampleGrid, w: &mut dyn Write) -> DemosaicResult<()> {
    w.write_i32::<LittleEndian>(grid.cols() as i32)?;
    w.write_i32::<LittleEndian>(grid.rows() as i32)?;
    write_u16le(w, grid.data())
}

fn check_dimensions(width: i64, height: i64) -> DemosaicResult<(usize, usize)> {
    let valid = |v: i64| v > 0 && v <= MAX_DIMENSION;
    if !valid(width) || !valid(height) {
        return Err(DemosaicError::MalformedHeader(width, height));
    }
    Ok((width as usize, height as usize))
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, from_image, RawSource};
    use crate::raster::FlatImage;
    use std::io::Cursor;
    use crate::{DemosaicError, SampleGrid};

    fn header(w: i32, h: i32) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&w.to_le_bytes());
        v.extend_from_slice(&h.to_le_bytes());
        v
    }

    #[test]
    fn test_embedded() {
        let samples: [u16; 8] = [0, 1, 255, 256, 4095, 4096, 0x8000, 0xffff];
        let mut src = header(4, 2);
        for s in &samples {
            src.extend_from_slice(&s.to_le_bytes());
        }

        let grid = decode(&src, RawSource::Embedded).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (2, 4));

        let mut got = Vec::new();
        for row in 0..2 {
            for col in 0..4 {
                got.push(grid.at(row, col));
            }
        }
        assert_eq!(&got[..], &samples[..]);
    }

    #[test]
    fn test_external() {
        let src = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x01];
        let grid = decode(&src, RawSource::External { width: 2, height: 2 }).unwrap();
        assert_eq!(grid.data(), &[1, 2, 3, 0x0104]);
    }

    #[test]
    fn test_malformed_header() {
        let mut src = header(-1, 2);
        src.extend_from_slice(&[0; 16]);
        match decode(&src, RawSource::Embedded) {
            Err(DemosaicError::MalformedHeader(-1, 2)) => {}
            other => panic!("unexpected {:?}", other),
        }

        let src = header(0x100_0000, 1);
        assert!(matches!(
            decode(&src, RawSource::Embedded),
            Err(DemosaicError::MalformedHeader(..))
        ));

        assert!(matches!(
            decode(&[], RawSource::External { width: 0, height: 4 }),
            Err(DemosaicError::MalformedHeader(0, 4))
        ));
    }

    #[test]
    fn test_truncated() {
        let mut src = header(4, 4);
        src.extend_from_slice(&[0; 31]);
        match decode(&src, RawSource::Embedded) {
            Err(DemosaicError::Truncated(40, 39)) => {}
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            decode(&[4, 0, 0], RawSource::Embedded),
            Err(DemosaicError::Truncated(8, 3))
        ));

        // Huge declared payload is rejected before allocating.
        let src = header(0xFF_FFFF, 0xFF_FFFF);
        assert!(matches!(
            decode(&src, RawSource::Embedded),
            Err(DemosaicError::Truncated(..))
        ));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut src = header(1, 1);
        src.extend_from_slice(&[0x07, 0x00, 0xaa, 0xbb]);
        let grid = decode(&src, RawSource::Embedded).unwrap();
        assert_eq!(grid.data(), &[7]);
    }

    #[test]
    fn test_encode() {
        let grid = SampleGrid::from_vec(2, 3, vec![1, 2, 3, 4, 5, 0xfffe]).unwrap();
        let mut out = Vec::new();
        encode(&grid, &mut out).unwrap();

        let mut expected = header(3, 2);
        for s in grid.data() {
            expected.extend_from_slice(&s.to_le_bytes());
        }
        assert_eq!(out, expected);
        assert_eq!(decode(&out, RawSource::Embedded).unwrap(), grid);
    }

    #[test]
    fn test_from_image() {
        // Every pixel carries distinct R, G, B so the chosen channel is visible.
        let image = FlatImage {
            width: 2,
            height: 2,
            pixels: vec![0xff10_2030, 0xff11_2131, 0xff12_2232, 0xff13_2333],
        };

        let grid = from_image(&image).unwrap();
        // G R
        // B G
        assert_eq!(grid.data(), &[0x20, 0x11, 0x32, 0x23]);
    }

    #[test]
    fn test_from_image_empty() {
        let image = FlatImage::default();
        assert!(matches!(from_image(&image), Err(DemosaicError::EmptySource)));

        let image = FlatImage {
            width: 3,
            height: 2,
            pixels: vec![0; 4],
        };
        assert!(matches!(from_image(&image), Err(DemosaicError::WrongResolution)));
    }

    #[test]
    fn test_from_encoded_image() {
        let rgba: Vec<u8> = vec![
            0x10, 0x20, 0x30, 0xff, 0x11, 0x21, 0x31, 0xff, //
            0x12, 0x22, 0x32, 0xff, 0x13, 0x23, 0x33, 0xff,
        ];
        let buf = image::RgbaImage::from_raw(2, 2, rgba).unwrap();
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(buf)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let grid = decode(&png, RawSource::FromImage).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (2, 2));
        assert_eq!(grid.data(), &[0x20, 0x11, 0x32, 0x23]);

        assert!(matches!(
            decode(&[], RawSource::FromImage),
            Err(DemosaicError::EmptySource)
        ));
        assert!(matches!(
            decode(&[1, 2, 3, 4], RawSource::FromImage),
            Err(DemosaicError::Image(..))
        ));
    }
}
