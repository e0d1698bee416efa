use std::collections::HashMap;

use async_trait::async_trait;

/// Metadata record for an uploaded file, owned by the metadata store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredObject {
    /// Datasource key.
    pub name: String,
    /// Name the file was uploaded with, used for `Content-Disposition`.
    pub original_name: Option<String>,
    pub mimetype: Option<String>,
    /// Size recorded at upload time; the datasource stays authoritative.
    pub declared_size: Option<u64>,
}

impl StoredObject {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_original_name<S: Into<String>>(mut self, original_name: S) -> Self {
        self.original_name = Some(original_name.into());
        self
    }

    pub fn with_mimetype<S: Into<String>>(mut self, mimetype: S) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }
}

/// Looks up the metadata record behind a public identifier.
///
/// `Ok(None)` means "no record"; the identifier is then served as a raw key.
#[async_trait]
pub trait ObjectResolver: Send + Sync {
    async fn resolve(&self, identifier: &str) -> anyhow::Result<Option<StoredObject>>;
}

/// Resolver without a metadata store: every identifier is a raw key.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawResolver;

#[async_trait]
impl ObjectResolver for RawResolver {
    async fn resolve(&self, _identifier: &str) -> anyhow::Result<Option<StoredObject>> {
        Ok(None)
    }
}

/// Fixed in-memory identifier → record map.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    objects: HashMap<String, StoredObject>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object<S: Into<String>>(mut self, identifier: S, object: StoredObject) -> Self {
        self.objects.insert(identifier.into(), object);
        self
    }
}

#[async_trait]
impl ObjectResolver for StaticResolver {
    async fn resolve(&self, identifier: &str) -> anyhow::Result<Option<StoredObject>> {
        Ok(self.objects.get(identifier).cloned())
    }
}
