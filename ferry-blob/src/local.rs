//! Local file system datasource.
//!
//! Keys are `/`-separated relative paths under a root directory. Range reads
//! seek the file descriptor and cap the reader, so a sub-range never pulls
//! the rest of the file into memory.

use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use async_stream::try_stream;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

use crate::datasource::ensure_ordered;
use crate::{
    ByteRange, ByteStream, Datasource, LocalConfig, ObjectEntry, ObjectStream, StorageError,
    StorageResult, READ_CHUNK_SIZE,
};

/// Prefix of in-flight temporary files; never listed as objects.
const TEMP_PREFIX: &str = ".ferry-tmp-";

/// Datasource rooted in a local directory.
#[derive(Debug, Clone)]
pub struct LocalDatasource {
    root: PathBuf,
}

impl LocalDatasource {
    /// Open (and create if needed) the root directory.
    pub async fn open(config: LocalConfig) -> StorageResult<Self> {
        let root = config.directory;
        fs::create_dir_all(&root).await?;

        let metadata = fs::metadata(&root).await?;
        if !metadata.is_dir() {
            return Err(StorageError::config(format!(
                "local datasource root is not a directory: {}",
                root.display()
            )));
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key onto a path below the root, rejecting anything that could escape it.
    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::invalid("empty object key"));
        }

        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(StorageError::invalid(format!("invalid object key: {key}")));
            }
            path.push(segment);
        }
        Ok(path)
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(segments.join("/"))
    }

    fn walk(&self) -> impl Stream<Item = StorageResult<ObjectEntry>> + Send + '_ {
        try_stream! {
            let mut pending = vec![self.root.clone()];

            while let Some(dir) = pending.pop() {
                let mut entries = fs::read_dir(&dir).await?;

                while let Some(entry) = entries.next_entry().await? {
                    let file_type = entry.file_type().await?;
                    if file_type.is_dir() {
                        pending.push(entry.path());
                        continue;
                    }
                    if !file_type.is_file()
                        || entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX)
                    {
                        continue;
                    }

                    let Some(key) = self.key_for(&entry.path()) else {
                        continue;
                    };
                    let metadata = entry.metadata().await?;

                    yield ObjectEntry {
                        key,
                        size_bytes: metadata.len(),
                        last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                    };
                }
            }
        }
    }
}

fn is_missing(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

#[async_trait]
impl Datasource for LocalDatasource {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn save(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StorageResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write a sibling then rename so readers never observe a half-written object.
        let temp = path.with_file_name(format!("{TEMP_PREFIX}{}", Uuid::new_v4().simple()));
        let written = async {
            let mut file = fs::File::create(&temp).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            fs::rename(&temp, &path).await
        }
        .await;

        if let Err(err) = written {
            let _ = fs::remove_file(&temp).await;
            return Err(err.into());
        }

        debug!(key, bytes = data.len(), content_type, "saved local object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if is_missing(&err) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn size(&self, key: &str) -> StorageResult<Option<u64>> {
        let path = self.path_for(key)?;
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(Some(metadata.len())),
            Ok(_) => Ok(None),
            Err(err) if is_missing(&err) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn get(&self, key: &str, range: ByteRange) -> StorageResult<Option<ByteStream>> {
        ensure_ordered(key, &range)?;
        let path = self.path_for(key)?;

        let mut file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(err) if is_missing(&err) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if !file.metadata().await?.is_file() {
            return Ok(None);
        }

        if range.start > 0 {
            file.seek(SeekFrom::Start(range.start)).await?;
        }
        let limit = match range.end {
            Some(end) => end - range.start + 1,
            None => u64::MAX,
        };

        let reader = file.take(limit);
        Ok(Some(Box::pin(ReaderStream::with_capacity(reader, READ_CHUNK_SIZE))))
    }

    fn list(&self) -> ObjectStream<'_> {
        Box::pin(self.walk())
    }
}
