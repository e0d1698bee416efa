use std::time::Duration;

/// Server-side compression policy.
#[derive(Debug, Clone)]
pub struct CompressionConfig {
    /// Global switch; off means identity responses only.
    pub enabled: bool,
    /// Objects must be strictly larger than this many bytes to be compressed.
    pub threshold: u64,
    /// Absolute lifetime cap on one compression stream, counted from the
    /// start of the response rather than from the last chunk sent. A body
    /// still sending when it elapses ends in an I/O error, so size it for the
    /// largest compressible object at the slowest expected client speed.
    pub drain_timeout: Duration,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 200 * 1024, // 200KB
            drain_timeout: Duration::from_millis(2000),
        }
    }
}

impl CompressionConfig {
    /// Compression on, with the default threshold and drain window.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, bytes: u64) -> Self {
        self.threshold = bytes;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }
}
