//! `Range` request header parsing.
//!
//! Deliberately lenient: only the first range of a `bytes=` header is read,
//! and fragments that are not numbers fall back to "from the start" /
//! "to the end" instead of failing the request.

use ferry_blob::ByteRange;

const BYTES_UNIT: &str = "bytes=";

/// True when the header asks for a byte range at all.
pub fn is_byte_range(header: Option<&str>) -> bool {
    header.is_some_and(|h| h.trim_start().starts_with(BYTES_UNIT))
}

/// Parse `bytes=<start>-<end>` into a [`ByteRange`].
///
/// Absent or non-`bytes=` headers yield the whole object. A missing or
/// non-numeric start is `0`; a missing or non-numeric end is open.
pub fn parse_range_header(header: Option<&str>) -> ByteRange {
    let Some(spec) = header.and_then(|h| h.trim_start().strip_prefix(BYTES_UNIT)) else {
        return ByteRange::full();
    };

    // multi-range requests are not supported; read the first one
    let first = spec.split(',').next().unwrap_or_default();
    let (start, end) = first.split_once('-').unwrap_or((first, ""));

    let start = start.trim().parse::<u64>().unwrap_or(0);
    let end = end.trim().parse::<u64>().ok();

    ByteRange::new(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_or_foreign_units_mean_whole_object() {
        assert_eq!(parse_range_header(None), ByteRange::full());
        assert_eq!(parse_range_header(Some("items=0-5")), ByteRange::full());
        assert_eq!(parse_range_header(Some("")), ByteRange::full());
        assert!(!is_byte_range(None));
        assert!(!is_byte_range(Some("items=0-5")));
        assert!(is_byte_range(Some("bytes=0-5")));
    }

    #[test]
    fn closed_and_open_ranges() {
        assert_eq!(parse_range_header(Some("bytes=0-499")), ByteRange::new(0, Some(499)));
        assert_eq!(parse_range_header(Some("bytes=1000-")), ByteRange::from_start(1000));
        assert_eq!(parse_range_header(Some("bytes=0-0")), ByteRange::new(0, Some(0)));
    }

    #[test]
    fn missing_start_is_zero() {
        assert_eq!(parse_range_header(Some("bytes=-500")), ByteRange::new(0, Some(500)));
        assert_eq!(parse_range_header(Some("bytes=-")), ByteRange::full());
    }

    #[test]
    fn junk_fragments_are_lenient() {
        assert_eq!(parse_range_header(Some("bytes=abc-def")), ByteRange::full());
        assert_eq!(parse_range_header(Some("bytes=10-xyz")), ByteRange::from_start(10));
        assert_eq!(parse_range_header(Some("bytes=7")), ByteRange::from_start(7));
    }

    #[test]
    fn only_the_first_of_several_ranges_is_read() {
        assert_eq!(
            parse_range_header(Some("bytes=0-9, 20-29")),
            ByteRange::new(0, Some(9))
        );
    }

    #[test]
    fn inverted_ranges_parse_as_given() {
        // validation against the object size rejects these later
        assert!(parse_range_header(Some("bytes=9-3")).is_inverted());
    }
}
