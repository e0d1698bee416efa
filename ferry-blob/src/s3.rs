//! S3-compatible object store datasource.
//!
//! Range reads map onto a ranged `GetObject`; the response body is streamed
//! straight through. "Not found" answers from the service become `None`,
//! every other failure stays a [`StorageError::Backend`].

use async_stream::try_stream;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream as AwsByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::DateTime;
use futures::{Stream, StreamExt};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::datasource::ensure_ordered;
use crate::{
    ByteRange, ByteStream, Datasource, FailedKey, ObjectEntry, ObjectStream, S3Config,
    StorageError, StorageResult, READ_CHUNK_SIZE,
};

/// `DeleteObjects` accepts at most this many keys per call.
const DELETE_BATCH_SIZE: usize = 1000;

/// Datasource backed by one bucket of an S3-compatible store.
#[derive(Clone)]
pub struct S3Datasource {
    client: Client,
    bucket: String,
}

impl S3Datasource {
    pub async fn connect(config: S3Config) -> StorageResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::config("s3 bucket name is required"));
        }
        if config.access_key_id.is_empty() || config.secret_access_key.is_empty() {
            return Err(StorageError::config("s3 access key id and secret are required"));
        }

        let client = Self::create_client(&config).await;
        Ok(Self {
            client,
            bucket: config.bucket,
        })
    }

    async fn create_client(config: &S3Config) -> Client {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "ferry",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        if let Some(url) = config.endpoint_url() {
            loader = loader.endpoint_url(url);
        }
        let sdk_config = loader.load().await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(config.force_path_style)
                .build(),
        )
    }

    fn objects(&self) -> impl Stream<Item = StorageResult<ObjectEntry>> + Send + '_ {
        try_stream! {
            let mut pages = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .into_paginator()
                .send();

            while let Some(page) = pages.next().await {
                let page = page.map_err(StorageError::backend)?;
                for object in page.contents() {
                    let Some(key) = object.key() else {
                        continue;
                    };
                    yield ObjectEntry {
                        key: key.to_string(),
                        size_bytes: object.size().unwrap_or(0).max(0) as u64,
                        last_modified: object
                            .last_modified()
                            .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())),
                    };
                }
            }
        }
    }

    /// Remove one batch of keys, returning the ones the store refused.
    async fn delete_batch(&self, keys: Vec<String>) -> Vec<FailedKey> {
        let identifiers: Result<Vec<_>, _> = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect();
        let delete = identifiers.and_then(|objects| {
            Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
        });
        let delete = match delete {
            Ok(delete) => delete,
            Err(err) => return fail_all(keys, &err),
        };

        match self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
        {
            Ok(output) => output
                .errors()
                .iter()
                .map(|err| {
                    FailedKey::new(
                        err.key().unwrap_or_default(),
                        err.message().or(err.code()).unwrap_or("delete refused"),
                    )
                })
                .collect(),
            Err(err) => fail_all(keys, &err),
        }
    }
}

fn fail_all(keys: Vec<String>, err: &dyn std::error::Error) -> Vec<FailedKey> {
    let reason = err.to_string();
    keys.into_iter()
        .map(|key| FailedKey::new(key, reason.clone()))
        .collect()
}

fn has_status<E>(err: &SdkError<E, HttpResponse>, status: u16) -> bool {
    err.raw_response()
        .is_some_and(|response| response.status().as_u16() == status)
}

#[async_trait]
impl Datasource for S3Datasource {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn save(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StorageResult<()> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(AwsByteStream::from(data))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(StorageError::backend)?;

        debug!(key, bytes = size, "saved s3 object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if has_status(&err, 404) => Ok(()),
            Err(err) => Err(StorageError::backend(err)),
        }
    }

    async fn size(&self, key: &str) -> StorageResult<Option<u64>> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(head) => Ok(Some(head.content_length().unwrap_or(0).max(0) as u64)),
            Err(err)
                if err.as_service_error().is_some_and(|e| e.is_not_found())
                    || has_status(&err, 404) =>
            {
                Ok(None)
            }
            Err(err) => Err(StorageError::backend(err)),
        }
    }

    async fn get(&self, key: &str, range: ByteRange) -> StorageResult<Option<ByteStream>> {
        ensure_ordered(key, &range)?;

        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .set_range(range.to_header())
            .send()
            .await
        {
            Ok(output) => output,
            Err(err)
                if err.as_service_error().is_some_and(|e| e.is_no_such_key())
                    || has_status(&err, 404) =>
            {
                return Ok(None)
            }
            Err(err) => return Err(StorageError::backend(err)),
        };

        let reader = output.body.into_async_read();
        Ok(Some(Box::pin(ReaderStream::with_capacity(reader, READ_CHUNK_SIZE))))
    }

    fn list(&self) -> ObjectStream<'_> {
        Box::pin(self.objects())
    }

    async fn clear(&self) -> StorageResult<()> {
        let mut batches = self.list().chunks(DELETE_BATCH_SIZE);
        let mut failed = Vec::new();
        let mut listing_error = None;

        while let Some(batch) = batches.next().await {
            let mut keys = Vec::with_capacity(batch.len());
            for entry in batch {
                match entry {
                    Ok(entry) => keys.push(entry.key),
                    Err(err) => {
                        listing_error = Some(err);
                        break;
                    }
                }
            }

            if !keys.is_empty() {
                let refused = self.delete_batch(keys).await;
                for key in &refused {
                    warn!(bucket = %self.bucket, key = %key.key, reason = %key.reason, "failed to delete object during clear");
                }
                failed.extend(refused);
            }
            if let Some(err) = &listing_error {
                warn!(bucket = %self.bucket, error = %err, "listing failed during clear");
                break;
            }
        }

        StorageError::from_clear(listing_error, failed)
    }
}
