use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;

use crate::StorageResult;

/// Stream of bytes for object content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Lazily produced object listing; dropping it stops the enumeration.
pub type ObjectStream<'a> = Pin<Box<dyn Stream<Item = StorageResult<ObjectEntry>> + Send + 'a>>;

/// Inclusive byte span of an object.
///
/// `end: None` means "to the end of the object".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end }
    }

    /// The whole object.
    pub fn full() -> Self {
        Self {
            start: 0,
            end: None,
        }
    }

    pub fn from_start(start: u64) -> Self {
        Self { start, end: None }
    }

    pub fn is_full(&self) -> bool {
        self.start == 0 && self.end.is_none()
    }

    /// True when the bounds are inverted (`start > end`).
    pub fn is_inverted(&self) -> bool {
        matches!(self.end, Some(end) if self.start > end)
    }

    /// Resolve an open end against the object size and check the bounds.
    ///
    /// Returns `None` when the span is not satisfiable: `start` or the
    /// resolved `end` falls outside `[0, size - 1]`, or `start > end`.
    pub fn resolve(&self, size: u64) -> Option<ResolvedRange> {
        let last = size.checked_sub(1)?;
        let end = self.end.unwrap_or(last);
        if self.start > last || end > last || self.start > end {
            return None;
        }
        Some(ResolvedRange {
            start: self.start,
            end,
            total_size: size,
        })
    }

    /// Value for an HTTP `Range` request header, `None` for the whole object.
    pub fn to_header(&self) -> Option<String> {
        if self.is_full() {
            return None;
        }
        Some(match self.end {
            Some(end) => format!("bytes={}-{}", self.start, end),
            None => format!("bytes={}-", self.start),
        })
    }
}

impl Default for ByteRange {
    fn default() -> Self {
        Self::full()
    }
}

/// A byte span validated against a concrete object size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub total_size: u64,
}

impl ResolvedRange {
    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_full_content(&self) -> bool {
        self.start == 0 && self.end + 1 == self.total_size
    }

    /// The bounds as handed to [`Datasource::get`](crate::Datasource::get).
    pub fn as_byte_range(&self) -> ByteRange {
        ByteRange::new(self.start, Some(self.end))
    }
}

/// One object seen while listing a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size_bytes: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// A key that could not be removed during a bulk delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedKey {
    pub key: String,
    pub reason: String,
}

impl FailedKey {
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_end_resolves_to_last_byte() {
        let resolved = ByteRange::from_start(10).resolve(100).unwrap();
        assert_eq!(resolved.end, 99);
        assert_eq!(resolved.content_length(), 90);
        assert!(!resolved.is_full_content());
    }

    #[test]
    fn out_of_bounds_spans_do_not_resolve() {
        assert_eq!(ByteRange::from_start(1000).resolve(1000), None);
        assert_eq!(ByteRange::new(0, Some(1000)).resolve(1000), None);
        assert_eq!(ByteRange::new(5, Some(4)).resolve(1000), None);
        assert_eq!(ByteRange::full().resolve(0), None);
    }

    #[test]
    fn whole_object_resolves_as_full_content() {
        let resolved = ByteRange::full().resolve(1).unwrap();
        assert_eq!((resolved.start, resolved.end), (0, 0));
        assert!(resolved.is_full_content());
    }

    #[test]
    fn header_formatting() {
        assert_eq!(ByteRange::full().to_header(), None);
        assert_eq!(ByteRange::from_start(7).to_header().as_deref(), Some("bytes=7-"));
        assert_eq!(
            ByteRange::new(0, Some(499)).to_header().as_deref(),
            Some("bytes=0-499")
        );
        assert!(ByteRange::new(9, Some(3)).is_inverted());
    }
}
