use axum::http::header::{ACCEPT_ENCODING, RANGE};
use axum::http::HeaderMap;
use serde::Deserialize;

use crate::DeliveryRequest;

/// Header that asks for an uncompressed response.
pub const NO_COMPRESS_HEADER: &str = "x-no-compress";

/// Query string of a file request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryParams {
    /// Present (and not `false`/`0`) forces an attachment download.
    pub download: Option<String>,
    /// `true` overrides the `x-no-compress` header.
    pub compress: Option<String>,
}

impl DeliveryParams {
    pub fn download(&self) -> bool {
        self.download.as_deref().is_some_and(|v| {
            let v = v.trim();
            !(v.eq_ignore_ascii_case("false") || v == "0")
        })
    }

    pub fn no_compress(&self, headers: &HeaderMap) -> bool {
        let forced = self
            .compress
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
        headers.contains_key(NO_COMPRESS_HEADER) && !forced
    }

    /// Collect everything the pipeline needs from the query and headers.
    pub fn into_request(self, identifier: &str, headers: &HeaderMap) -> DeliveryRequest {
        DeliveryRequest::new(identifier)
            .with_range(header_str(headers, RANGE.as_str()))
            .with_accept_encoding(header_str(headers, ACCEPT_ENCODING.as_str()))
            .with_download(self.download())
            .with_no_compress(self.no_compress(headers))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn params(download: Option<&str>, compress: Option<&str>) -> DeliveryParams {
        DeliveryParams {
            download: download.map(String::from),
            compress: compress.map(String::from),
        }
    }

    #[test]
    fn download_flag() {
        assert!(!params(None, None).download());
        assert!(params(Some(""), None).download());
        assert!(params(Some("1"), None).download());
        assert!(params(Some("true"), None).download());
        assert!(!params(Some("false"), None).download());
        assert!(!params(Some("FALSE"), None).download());
        assert!(!params(Some("0"), None).download());
    }

    #[test]
    fn no_compress_header_and_override() {
        let mut headers = HeaderMap::new();
        assert!(!params(None, None).no_compress(&headers));

        headers.insert(NO_COMPRESS_HEADER, HeaderValue::from_static("1"));
        assert!(params(None, None).no_compress(&headers));
        assert!(params(None, Some("yes")).no_compress(&headers));
        assert!(!params(None, Some("True")).no_compress(&headers));
    }

    #[test]
    fn request_carries_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(RANGE, HeaderValue::from_static("bytes=0-9"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        let request = params(Some(""), None).into_request("abc", &headers);
        assert_eq!(request.identifier, "abc");
        assert_eq!(request.range.as_deref(), Some("bytes=0-9"));
        assert_eq!(request.accept_encoding.as_deref(), Some("gzip"));
        assert!(request.download);
        assert!(!request.no_compress);
    }
}
