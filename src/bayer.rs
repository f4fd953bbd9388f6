//! Bayer layout definitions.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::DemosaicResult;

/// Colour of a single photosite.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

/// The fixed 2x2 colour filter array tile, indexed by `[row % 2][col % 2]`.
///
/// ```text
///   G R
///   B G
/// ```
pub const CFA_TILE: [[Channel; 2]; 2] = [
    [Channel::Green, Channel::Red],
    [Channel::Blue, Channel::Green],
];

/// The colour sampled at `(row, col)`.
#[inline]
pub fn color_at(row: usize, col: usize) -> Channel {
    CFA_TILE[row & 1][col & 1]
}

impl Channel {
    /// Bit offset of this channel inside a packed `0xAARRGGBB` word.
    pub fn shift(self) -> u32 {
        match self {
            Channel::Red => 16,
            Channel::Green => 8,
            Channel::Blue => 0,
        }
    }
}

/// Read the exact number of little-endian samples required to fill buf.
pub fn read_exact_u16le(r: &mut dyn Read, buf: &mut [u16]) -> DemosaicResult<()> {
    r.read_u16_into::<LittleEndian>(buf)?;
    Ok(())
}

/// Write every sample in buf, low byte first.
pub fn write_u16le(w: &mut dyn Write, buf: &[u16]) -> DemosaicResult<()> {
    for &v in buf {
        w.write_u16::<LittleEndian>(v)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{color_at, read_exact_u16le, write_u16le, Channel};
    use std::io::Cursor;

    #[test]
    fn test_tile() {
        assert_eq!(color_at(0, 0), Channel::Green);
        assert_eq!(color_at(0, 1), Channel::Red);
        assert_eq!(color_at(1, 0), Channel::Blue);
        assert_eq!(color_at(1, 1), Channel::Green);
        assert_eq!(color_at(6, 3), Channel::Red);
        assert_eq!(color_at(5, 8), Channel::Blue);
    }

    #[test]
    fn test_read_low_byte_first() {
        let src = [0x34, 0x12, 0xff, 0x00];
        let mut buf = [0u16; 2];

        let res = read_exact_u16le(&mut Cursor::new(&src[..]), &mut buf);
        assert!(res.is_ok());
        assert_eq!(buf, [0x1234, 0x00ff]);
    }

    #[test]
    fn test_read_short() {
        let src = [0x34, 0x12, 0xff];
        let mut buf = [0u16; 2];
        assert!(read_exact_u16le(&mut Cursor::new(&src[..]), &mut buf).is_err());
    }

    #[test]
    fn test_write() {
        let mut out = Vec::new();
        assert!(write_u16le(&mut out, &[0x1234, 0x0001]).is_ok());
        assert_eq!(out, [0x34, 0x12, 0x01, 0x00]);
    }
}
