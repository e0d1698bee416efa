//! Streaming response compression with a hard drain deadline.
//!
//! The encoder runs in its own task and feeds the response body through a
//! small bounded channel, so a slow client throttles the backend read. The
//! task is dropped once the drain window elapses, taking the encoder and the
//! backend stream with it; the body then ends with a `TimedOut` error.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_compression::tokio::bufread::{BrotliEncoder, GzipEncoder, ZlibEncoder};
use bytes::Bytes;
use ferry_blob::{ByteStream, READ_CHUNK_SIZE};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, warn};

use super::CompressionChoice;

/// Chunks buffered between the encoder task and the response body.
const CHANNEL_DEPTH: usize = 2;

/// Wrap `stream` in the encoder for `choice`.
///
/// `CompressionChoice::None` returns the stream untouched. `drain_window`
/// runs from this call, not from the last chunk.
pub fn compress(stream: ByteStream, choice: CompressionChoice, drain_window: Duration) -> ByteStream {
    let encoded: ByteStream = match choice {
        CompressionChoice::None => return stream,
        CompressionChoice::Gzip => Box::pin(ReaderStream::with_capacity(
            GzipEncoder::new(StreamReader::new(stream)),
            READ_CHUNK_SIZE,
        )),
        // HTTP "deflate" is the zlib format
        CompressionChoice::Deflate => Box::pin(ReaderStream::with_capacity(
            ZlibEncoder::new(StreamReader::new(stream)),
            READ_CHUNK_SIZE,
        )),
        CompressionChoice::Brotli => Box::pin(ReaderStream::with_capacity(
            BrotliEncoder::new(StreamReader::new(stream)),
            READ_CHUNK_SIZE,
        )),
    };

    with_drain_deadline(encoded, drain_window)
}

fn with_drain_deadline(mut encoded: ByteStream, window: Duration) -> ByteStream {
    let (tx, mut rx) = mpsc::channel::<io::Result<Bytes>>(CHANNEL_DEPTH);
    let expired = Arc::new(AtomicBool::new(false));

    let task_expired = Arc::clone(&expired);
    tokio::spawn(async move {
        // held until `expired` is settled so the body cannot see the channel close first
        let guard = tx.clone();
        let pump = async move {
            while let Some(chunk) = encoded.next().await {
                if tx.send(chunk).await.is_err() {
                    debug!("client went away, dropping compression stream");
                    return;
                }
            }
        };

        if tokio::time::timeout(window, pump).await.is_err() {
            warn!(?window, "compression stream not drained in time, destroying it");
            task_expired.store(true, Ordering::Release);
        }
        drop(guard);
    });

    Box::pin(async_stream::stream! {
        while let Some(chunk) = rx.recv().await {
            yield chunk;
        }
        if expired.load(Ordering::Acquire) {
            yield Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "compression stream exceeded its drain window",
            ));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_compression::tokio::bufread::{BrotliDecoder, GzipDecoder, ZlibDecoder};
    use futures::TryStreamExt;
    use tokio::io::AsyncReadExt;

    fn source(data: &'static [u8]) -> ByteStream {
        Box::pin(futures::stream::iter(
            data.chunks(7).map(|c| Ok(Bytes::from_static(c))).collect::<Vec<_>>(),
        ))
    }

    async fn collect(stream: ByteStream) -> Vec<u8> {
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        chunks.concat()
    }

    const TEXT: &[u8] = b"the quick brown fox jumps over the lazy dog, again and again and again";

    #[tokio::test]
    async fn gzip_round_trip() {
        let compressed = collect(compress(source(TEXT), CompressionChoice::Gzip, Duration::from_secs(5))).await;
        let mut decoded = Vec::new();
        GzipDecoder::new(compressed.as_slice()).read_to_end(&mut decoded).await.unwrap();
        assert_eq!(decoded, TEXT);
    }

    #[tokio::test]
    async fn deflate_is_zlib_wrapped() {
        let compressed = collect(compress(source(TEXT), CompressionChoice::Deflate, Duration::from_secs(5))).await;
        let mut decoded = Vec::new();
        ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut decoded).await.unwrap();
        assert_eq!(decoded, TEXT);
    }

    #[tokio::test]
    async fn brotli_round_trip() {
        let compressed = collect(compress(source(TEXT), CompressionChoice::Brotli, Duration::from_secs(5))).await;
        let mut decoded = Vec::new();
        BrotliDecoder::new(compressed.as_slice()).read_to_end(&mut decoded).await.unwrap();
        assert_eq!(decoded, TEXT);
    }

    #[tokio::test]
    async fn identity_passes_bytes_through() {
        let out = collect(compress(source(TEXT), CompressionChoice::None, Duration::from_secs(5))).await;
        assert_eq!(out, TEXT);
    }

    #[tokio::test]
    async fn stalled_stream_is_destroyed_after_the_window() {
        let never_ends: ByteStream = Box::pin(
            futures::stream::iter(vec![Ok(Bytes::from_static(b"partial"))]).chain(futures::stream::pending()),
        );
        let result: Result<Vec<Bytes>, io::Error> =
            compress(never_ends, CompressionChoice::Gzip, Duration::from_millis(50))
                .try_collect()
                .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
