//! # Delivery pipeline
//!
//! Turns one file request into one [`DeliveryDecision`]:
//!
//! ```text
//! size(key) ──None──────────────────────────────▶ 404
//!    │
//! Range? ──yes── resolve against size ──invalid─▶ 416  (get is never called)
//!    │                    │
//!    │                 get(start..=end) ──None──▶ 404
//!    │                    └─────────────────────▶ 206 + Content-Range
//!    └──no── get(whole) ──None──────────────────▶ 404
//!                 └── negotiate ── compress? ───▶ 200
//! ```
//!
//! Only a [`StorageError`] escapes as `Err`; every other outcome is a decision.

mod compress;
mod mime;
mod negotiate;
mod range;

pub use compress::compress;
pub use mime::{extension_of, ExtensionGuesser, MimeGuesser};
pub use negotiate::{is_compressible, negotiate, preferred_encoding, CompressionChoice};
pub use range::{is_byte_range, parse_range_header};

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{
    ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE,
};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use ferry_blob::{ByteRange, ByteStream, Datasource, ResolvedRange, StorageError, StorageResult};
use tracing::debug;

use crate::{CompressionConfig, StoredObject};

const OCTET_STREAM: &str = "application/octet-stream";

/// Inputs of one delivery, as handed over by the request handler.
#[derive(Debug, Clone, Default)]
pub struct DeliveryRequest {
    pub identifier: String,
    pub object: Option<StoredObject>,
    pub range: Option<String>,
    pub accept_encoding: Option<String>,
    pub download: bool,
    pub no_compress: bool,
}

impl DeliveryRequest {
    pub fn new<S: Into<String>>(identifier: S) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    pub fn with_object(mut self, object: Option<StoredObject>) -> Self {
        self.object = object;
        self
    }

    pub fn with_range<S: Into<String>>(mut self, range: Option<S>) -> Self {
        self.range = range.map(Into::into);
        self
    }

    pub fn with_accept_encoding<S: Into<String>>(mut self, accept_encoding: Option<S>) -> Self {
        self.accept_encoding = accept_encoding.map(Into::into);
        self
    }

    pub fn with_download(mut self, download: bool) -> Self {
        self.download = download;
        self
    }

    pub fn with_no_compress(mut self, no_compress: bool) -> Self {
        self.no_compress = no_compress;
        self
    }

    /// Datasource key: the record's name when there is one, else the identifier.
    pub fn key(&self) -> &str {
        self.object
            .as_ref()
            .map(|o| o.name.as_str())
            .unwrap_or(&self.identifier)
    }
}

/// Status, headers and body of one file response. Built once, never mutated.
pub struct DeliveryDecision {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<ByteStream>,
}

impl DeliveryDecision {
    fn new(status: StatusCode, headers: HeaderMap, body: Option<ByteStream>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, HeaderMap::new(), None)
    }

    pub fn range_not_satisfiable(size: u64) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        headers.insert(CONTENT_RANGE, header_value(format!("bytes */{size}")));
        Self::new(StatusCode::RANGE_NOT_SATISFIABLE, headers, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Option<ByteStream>) {
        (self.status, self.headers, self.body)
    }
}

impl std::fmt::Debug for DeliveryDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryDecision")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}

impl IntoResponse for DeliveryDecision {
    fn into_response(self) -> Response {
        let body = match self.body {
            Some(stream) => Body::from_stream(stream),
            None => Body::empty(),
        };
        (self.status, self.headers, body).into_response()
    }
}

/// Which part of the object a response carries.
enum Span {
    Whole,
    Partial(ResolvedRange),
}

/// The file delivery pipeline, shared by every request.
pub struct Delivery {
    datasource: Arc<dyn Datasource>,
    compression: CompressionConfig,
    mime: Arc<dyn MimeGuesser>,
}

impl Delivery {
    pub fn new(datasource: Arc<dyn Datasource>, compression: CompressionConfig) -> Self {
        Self {
            datasource,
            compression,
            mime: Arc::new(ExtensionGuesser),
        }
    }

    pub fn with_mime_guesser<M: MimeGuesser + 'static>(mut self, mime: M) -> Self {
        self.mime = Arc::new(mime);
        self
    }

    pub fn datasource(&self) -> &Arc<dyn Datasource> {
        &self.datasource
    }

    /// Build the response for one request.
    pub async fn deliver(&self, request: DeliveryRequest) -> StorageResult<DeliveryDecision> {
        let key = request.key();

        let Some(size) = absent_if_unaddressable(key, self.datasource.size(key).await)? else {
            debug!(key, backend = self.datasource.name(), "object not found");
            return Ok(DeliveryDecision::not_found());
        };
        if let Some(declared) = request.object.as_ref().and_then(|o| o.declared_size) {
            if declared != size {
                debug!(key, declared, size, "declared size differs from stored size");
            }
        }

        let range_header = request.range.as_deref().filter(|h| is_byte_range(Some(h)));
        let span = match range_header {
            None => Span::Whole,
            Some(header) => match parse_range_header(Some(header)).resolve(size) {
                Some(resolved) => Span::Partial(resolved),
                None => {
                    debug!(key, range = header, size, "range not satisfiable");
                    return Ok(DeliveryDecision::range_not_satisfiable(size));
                }
            },
        };

        let fetch = match &span {
            Span::Whole => ByteRange::full(),
            Span::Partial(resolved) => resolved.as_byte_range(),
        };
        let Some(stream) = absent_if_unaddressable(key, self.datasource.get(key, fetch).await)? else {
            // deleted between size() and get()
            debug!(key, "object vanished before it could be read");
            return Ok(DeliveryDecision::not_found());
        };

        let mimetype = self.mimetype(&request);
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        headers.insert(
            CONTENT_TYPE,
            if request.download {
                HeaderValue::from_static(OCTET_STREAM)
            } else {
                HeaderValue::from_str(&mimetype)
                    .unwrap_or_else(|_| HeaderValue::from_static(OCTET_STREAM))
            },
        );
        headers.insert(
            CONTENT_DISPOSITION,
            content_disposition(
                request.download,
                request.object.as_ref().and_then(|o| o.original_name.as_deref()),
            ),
        );

        match span {
            Span::Partial(resolved) => {
                headers.insert(
                    CONTENT_RANGE,
                    header_value(format!("bytes {}-{}/{}", resolved.start, resolved.end, size)),
                );
                headers.insert(CONTENT_LENGTH, HeaderValue::from(resolved.content_length()));
                debug!(key, start = resolved.start, end = resolved.end, size, "partial content");
                Ok(DeliveryDecision::new(StatusCode::PARTIAL_CONTENT, headers, Some(stream)))
            }
            Span::Whole => {
                let choice = negotiate(
                    &self.compression,
                    request.accept_encoding.as_deref(),
                    &mimetype,
                    size,
                    request.no_compress,
                );
                let body = match choice.content_encoding() {
                    Some(encoding) => {
                        headers.insert(CONTENT_ENCODING, HeaderValue::from_static(encoding));
                        compress(stream, choice, self.compression.drain_timeout)
                    }
                    None => {
                        headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
                        stream
                    }
                };
                debug!(key, size, compression = ?choice, "full content");
                Ok(DeliveryDecision::new(StatusCode::OK, headers, Some(body)))
            }
        }
    }

    /// Declared mimetype, else a guess from the key or original name, else octet-stream.
    fn mimetype(&self, request: &DeliveryRequest) -> String {
        let declared = request
            .object
            .as_ref()
            .and_then(|o| o.mimetype.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty());
        if let Some(declared) = declared {
            return declared.to_string();
        }

        let original = request.object.as_ref().and_then(|o| o.original_name.as_deref());
        [Some(request.key()), original]
            .into_iter()
            .flatten()
            .filter_map(extension_of)
            .find_map(|ext| self.mime.guess(ext))
            .unwrap_or_else(|| OCTET_STREAM.to_string())
    }
}

fn content_disposition(download: bool, filename: Option<&str>) -> HeaderValue {
    let kind = if download { "attachment" } else { "inline" };
    match filename {
        Some(name) => HeaderValue::from_str(&format!(
            "{kind}; filename=\"{}\"",
            urlencoding::encode(name)
        ))
        .unwrap_or_else(|_| HeaderValue::from_static(kind)),
        None => HeaderValue::from_static(kind),
    }
}

/// A key the backend refuses to address (`..`, empty segments) names no object.
fn absent_if_unaddressable<T>(key: &str, result: StorageResult<Option<T>>) -> StorageResult<Option<T>> {
    match result {
        Err(StorageError::Invalid { message }) => {
            debug!(key, reason = %message, "key rejected by datasource");
            Ok(None)
        }
        other => other,
    }
}

// Only ever called with ASCII built from numbers.
fn header_value(value: String) -> HeaderValue {
    HeaderValue::try_from(value).unwrap_or_else(|_| HeaderValue::from_static(""))
}
