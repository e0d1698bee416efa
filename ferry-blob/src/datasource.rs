use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tracing::warn;

use crate::{ByteRange, ByteStream, FailedKey, ObjectStream, StorageError, StorageResult};

/// Byte-level storage operations - implemented by every backend.
///
/// Absence is a value, not an error: `size` and `get` return `None` for a
/// missing key and `delete` succeeds on one.
#[async_trait]
pub trait Datasource: Send + Sync {
    /// Short backend name used in logs (`"local"`, `"s3"`).
    fn name(&self) -> &'static str;

    /// Store or overwrite an object. Durable once this returns `Ok`.
    async fn save(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StorageResult<()>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Size of an object in bytes, `None` if it does not exist.
    async fn size(&self, key: &str) -> StorageResult<Option<u64>>;

    /// Stream the bytes of `range` (inclusive), `None` if the object does not exist.
    ///
    /// Callers never pass an inverted range; backends reject one with
    /// [`StorageError::Invalid`].
    async fn get(&self, key: &str, range: ByteRange) -> StorageResult<Option<ByteStream>>;

    /// Enumerate stored objects lazily. Each call starts a fresh listing.
    fn list(&self) -> ObjectStream<'_>;

    /// Delete every object, continuing past individual failures.
    ///
    /// Keys that could not be removed come back together in
    /// [`StorageError::PartialClear`]. A listing error stops the sweep and is
    /// returned as [`StorageError::InterruptedClear`] with those keys attached.
    async fn clear(&self) -> StorageResult<()> {
        let mut listing = self.list();
        let mut failed = Vec::new();

        while let Some(entry) = listing.next().await {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(backend = self.name(), error = %err, "listing failed during clear");
                    return StorageError::from_clear(Some(err), failed);
                }
            };
            if let Err(err) = self.delete(&entry.key).await {
                warn!(backend = self.name(), key = %entry.key, error = %err, "failed to delete object during clear");
                failed.push(FailedKey::new(entry.key, err.to_string()));
            }
        }

        StorageError::from_clear(None, failed)
    }

    /// Sum of all object sizes. Listing and sizing are not atomic, so the
    /// figure is approximate while writes are in flight.
    async fn total_size(&self) -> StorageResult<u64> {
        let mut listing = self.list();
        let mut total = 0u64;
        while let Some(entry) = listing.next().await {
            total = total.saturating_add(entry?.size_bytes);
        }
        Ok(total)
    }
}

/// Guard shared by backends: inverted bounds never reach storage.
pub(crate) fn ensure_ordered(key: &str, range: &ByteRange) -> StorageResult<()> {
    if range.is_inverted() {
        return Err(StorageError::invalid(format!(
            "inverted range {}-{} for {}",
            range.start,
            range.end.unwrap_or_default(),
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectEntry;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory store that refuses to delete one key and can break its listing.
    struct Flaky {
        objects: Mutex<BTreeMap<String, Bytes>>,
        undeletable: &'static str,
        listing_breaks_after: Option<usize>,
    }

    impl Flaky {
        fn new(keys: &[&str], undeletable: &'static str) -> Self {
            let objects = keys
                .iter()
                .map(|k| (k.to_string(), Bytes::from_static(b"xy")))
                .collect();
            Self {
                objects: Mutex::new(objects),
                undeletable,
                listing_breaks_after: None,
            }
        }

        fn keys(&self) -> Vec<String> {
            self.objects.lock().unwrap().keys().cloned().collect()
        }
    }

    #[async_trait]
    impl Datasource for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn save(&self, key: &str, data: Bytes, _content_type: Option<&str>) -> StorageResult<()> {
            self.objects.lock().unwrap().insert(key.to_string(), data);
            Ok(())
        }

        async fn delete(&self, key: &str) -> StorageResult<()> {
            if key == self.undeletable {
                return Err(StorageError::backend(std::io::Error::other("permission denied")));
            }
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }

        async fn size(&self, key: &str) -> StorageResult<Option<u64>> {
            Ok(self.objects.lock().unwrap().get(key).map(|b| b.len() as u64))
        }

        async fn get(&self, _key: &str, _range: ByteRange) -> StorageResult<Option<ByteStream>> {
            Ok(None)
        }

        fn list(&self) -> ObjectStream<'_> {
            let mut entries: Vec<StorageResult<ObjectEntry>> = self
                .objects
                .lock()
                .unwrap()
                .iter()
                .map(|(key, data)| {
                    Ok(ObjectEntry {
                        key: key.clone(),
                        size_bytes: data.len() as u64,
                        last_modified: None,
                    })
                })
                .collect();
            if let Some(at) = self.listing_breaks_after {
                entries.insert(at, Err(StorageError::invalid("listing page failed")));
            }
            Box::pin(futures::stream::iter(entries))
        }
    }

    #[tokio::test]
    async fn clear_keeps_going_past_a_refused_delete() {
        let ds = Flaky::new(&["a", "b", "c"], "b");

        let err = ds.clear().await.unwrap_err();
        assert!(matches!(err, StorageError::PartialClear { .. }));
        let failed: Vec<&str> = err.failed_keys().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(failed, vec!["b"]);
        assert!(err.failed_keys()[0].reason.contains("permission denied"));
        assert_eq!(ds.keys(), vec!["b"]);
    }

    #[tokio::test]
    async fn listing_error_during_clear_keeps_earlier_failures() {
        let mut ds = Flaky::new(&["a", "b", "c"], "a");
        ds.listing_breaks_after = Some(1);

        let err = ds.clear().await.unwrap_err();
        match &err {
            StorageError::InterruptedClear { source, .. } => {
                assert!(matches!(**source, StorageError::Invalid { .. }))
            }
            other => panic!("expected an interrupted clear, got {other:?}"),
        }
        let failed: Vec<&str> = err.failed_keys().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(failed, vec!["a"]);
    }

    #[tokio::test]
    async fn clear_and_total_size_on_a_healthy_store() {
        let ds = Flaky::new(&["a", "b"], "none");
        assert_eq!(ds.total_size().await.unwrap(), 4);
        ds.clear().await.unwrap();
        assert!(ds.keys().is_empty());
        assert_eq!(ds.total_size().await.unwrap(), 0);
    }
}
