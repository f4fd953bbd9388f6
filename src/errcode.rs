//! Demosaic error codes.

use quick_error::quick_error;
use std::io;

pub type DemosaicResult<T> = Result<T, DemosaicError>;

quick_error! {
    #[derive(Debug)]
    pub enum DemosaicError {
        MalformedHeader(width: i64, height: i64) {
            display("Malformed header: {}x{}", width, height)
        }
        Truncated(expected: usize, actual: usize) {
            display("Truncated stream: expected {} bytes, got {}", expected, actual)
        }
        EmptySource {
            display("Empty source")
        }
        InvalidParameter(name: &'static str, value: i32) {
            display("Invalid {}: {}", name, value)
        }

        WrongResolution {
            display("Wrong resolution")
        }

        Io(err: io::Error) {
            from()
            display("IO error: {}", err)
        }
        Image(err: image::ImageError) {
            from()
            display("Image error: {}", err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DemosaicError;

    #[test]
    fn test_display() {
        let e = DemosaicError::MalformedHeader(-1, 2);
        assert_eq!(e.to_string(), "Malformed header: -1x2");

        let e = DemosaicError::Truncated(24, 10);
        assert_eq!(e.to_string(), "Truncated stream: expected 24 bytes, got 10");

        let e = DemosaicError::InvalidParameter("output shift", 0);
        assert_eq!(e.to_string(), "Invalid output shift: 0");
    }
}
