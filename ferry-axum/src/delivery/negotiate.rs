//! Picks a response compression algorithm, if any.

use tracing::debug;

use crate::CompressionConfig;

/// Compression applied to one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionChoice {
    None,
    Gzip,
    Deflate,
    Brotli,
}

impl CompressionChoice {
    /// Map one `Accept-Encoding` coding onto a supported algorithm.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("gzip") || token.eq_ignore_ascii_case("x-gzip") {
            Some(Self::Gzip)
        } else if token.eq_ignore_ascii_case("deflate") {
            Some(Self::Deflate)
        } else if token.eq_ignore_ascii_case("br") {
            Some(Self::Brotli)
        } else {
            None
        }
    }

    /// `Content-Encoding` value, `None` for identity.
    pub fn content_encoding(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Gzip => Some("gzip"),
            Self::Deflate => Some("deflate"),
            Self::Brotli => Some("br"),
        }
    }
}

/// Mimetype families worth compressing: text, plus images and video other
/// than formats that are already compressed.
pub fn is_compressible(mimetype: &str) -> bool {
    let essence = mimetype
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence.starts_with("text") {
        return true;
    }
    if essence.starts_with("image") {
        return essence != "image/webp";
    }
    if essence.starts_with("video") {
        return essence != "video/webm";
    }
    false
}

/// First coding in the client's list that the server can produce.
///
/// Codings explicitly refused with `q=0` are skipped.
pub fn preferred_encoding(accept_encoding: &str) -> Option<CompressionChoice> {
    accept_encoding.split(',').find_map(|item| {
        let mut parts = item.split(';');
        let coding = parts.next()?;
        let refused = parts.any(|param| {
            param
                .trim()
                .strip_prefix("q=")
                .and_then(|q| q.trim().parse::<f32>().ok())
                .is_some_and(|q| q <= 0.0)
        });
        if refused {
            return None;
        }
        CompressionChoice::from_token(coding)
    })
}

/// Decide whether to compress a response.
///
/// Requires compression to be enabled, no per-request opt-out, a size above
/// the threshold, a compressible mimetype and an `Accept-Encoding` header.
/// A header that offers nothing supported is not an error: the body goes
/// out uncompressed.
pub fn negotiate(
    config: &CompressionConfig,
    accept_encoding: Option<&str>,
    mimetype: &str,
    size: u64,
    opt_out: bool,
) -> CompressionChoice {
    if !config.enabled || opt_out || size <= config.threshold || !is_compressible(mimetype) {
        return CompressionChoice::None;
    }
    let Some(header) = accept_encoding.filter(|h| !h.trim().is_empty()) else {
        return CompressionChoice::None;
    };

    match preferred_encoding(header) {
        Some(choice) => choice,
        None => {
            debug!(accept_encoding = header, "no supported encoding offered, sending identity");
            CompressionChoice::None
        }
    }
}
