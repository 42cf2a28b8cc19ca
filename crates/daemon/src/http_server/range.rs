//! Byte-range grammar for resumable downloads
//!
//! Exactly two forms are accepted, matching what download clients send for
//! resume: `bytes=<start>-<end>` and `bytes=<start>-`. Anything else
//! (suffix ranges, multiple ranges, other units) is malformed.

/// An inclusive byte range, already clamped to the file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes the range covers
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("malformed range header: {0:?}")]
    Malformed(String),
    #[error("unsatisfiable range: start {start} past end {end}")]
    Unsatisfiable { start: u64, end: u64 },
}

/// Parse a `Range` header value against a file of `size` bytes.
///
/// An open-ended `bytes=<start>-` means "through the last byte". A closed
/// end past the last byte is clamped to it; a start past the last byte is
/// unsatisfiable. The caller must still answer the request on error.
pub fn parse(header: &str, size: u64) -> Result<ByteRange, RangeError> {
    let malformed = || RangeError::Malformed(header.to_string());

    let spec = header.strip_prefix("bytes=").ok_or_else(malformed)?;
    let (start, end) = spec.split_once('-').ok_or_else(malformed)?;

    let start: u64 = start.parse().map_err(|_| malformed())?;
    if size == 0 {
        // no byte of an empty file is addressable
        return Err(RangeError::Unsatisfiable { start, end: 0 });
    }

    let end: u64 = match end {
        "" => size - 1,
        explicit => {
            let end: u64 = explicit.parse().map_err(|_| malformed())?;
            end.min(size - 1)
        }
    };

    if start > end {
        return Err(RangeError::Unsatisfiable { start, end });
    }

    Ok(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_range() {
        let range = parse("bytes=2-5", 10).unwrap();
        assert_eq!(range, ByteRange { start: 2, end: 5 });
        assert_eq!(range.len(), 4);
    }

    #[test]
    fn test_open_range_runs_to_last_byte() {
        let range = parse("bytes=5-", 10).unwrap();
        assert_eq!(range, ByteRange { start: 5, end: 9 });
        assert_eq!(range.len(), 5);
    }

    #[test]
    fn test_full_file_as_range() {
        let range = parse("bytes=0-", 10).unwrap();
        assert_eq!(range.len(), 10);
    }

    #[test]
    fn test_end_clamped_to_file_size() {
        let range = parse("bytes=2-999", 10).unwrap();
        assert_eq!(range, ByteRange { start: 2, end: 9 });
    }

    #[test]
    fn test_start_past_end_is_unsatisfiable() {
        assert_eq!(
            parse("bytes=7-3", 10),
            Err(RangeError::Unsatisfiable { start: 7, end: 3 })
        );
    }

    #[test]
    fn test_start_past_eof_is_unsatisfiable() {
        assert!(matches!(
            parse("bytes=12-", 10),
            Err(RangeError::Unsatisfiable { .. })
        ));
    }

    #[test]
    fn test_empty_file_has_no_satisfiable_range() {
        assert!(matches!(
            parse("bytes=0-", 0),
            Err(RangeError::Unsatisfiable { .. })
        ));
    }

    #[test]
    fn test_malformed_forms() {
        for header in [
            "bits=0-5",
            "bytes=-5",
            "bytes=0-5,7-9",
            "bytes=a-b",
            "bytes=5",
            "0-5",
            "",
        ] {
            assert!(
                matches!(parse(header, 10), Err(RangeError::Malformed(_))),
                "expected malformed: {:?}",
                header
            );
        }
    }
}
