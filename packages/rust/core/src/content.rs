//! Lazily-materialized document content.
//!
//! A [`ContentSource`] is an opaque, cheaply-cloneable handle that yields a
//! document's payload on demand. Content is immutable once bound: two
//! documents may share one source by reference, and producing new content
//! always means constructing a new source. Materialization is cached with
//! at-most-once semantics under concurrent first access: late callers wait
//! for the in-flight materializer instead of racing it.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;

use docmill_shared::path::PathValue;
use docmill_shared::{DocmillError, Result};

/// Async producer backing a transform-result content source (e.g. a
/// compiled artifact). Invoked at most once per source.
#[async_trait]
pub trait MaterializeContent: Send + Sync {
    async fn materialize(&self) -> Result<Vec<u8>>;
}

enum Backing {
    Empty,
    Memory(Arc<[u8]>),
    File(PathValue),
    Transform(Arc<dyn MaterializeContent>),
}

struct Inner {
    backing: Backing,
    cache: OnceCell<Arc<[u8]>>,
}

/// Lazy, cacheable handle to a document's payload.
#[derive(Clone)]
pub struct ContentSource {
    inner: Arc<Inner>,
}

impl ContentSource {
    fn from_backing(backing: Backing) -> Self {
        Self {
            inner: Arc::new(Inner {
                backing,
                cache: OnceCell::new(),
            }),
        }
    }

    /// A source with no content; `bytes()` yields an empty buffer.
    pub fn empty() -> Self {
        Self::from_backing(Backing::Empty)
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_backing(Backing::Memory(Arc::from(bytes.into())))
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_bytes(text.into().into_bytes())
    }

    /// A source backed by a file, read lazily on first access.
    pub fn from_file(path: PathValue) -> Self {
        Self::from_backing(Backing::File(path))
    }

    /// A source backed by an async transformation result.
    pub fn from_transform(transform: impl MaterializeContent + 'static) -> Self {
        Self::from_backing(Backing::Transform(Arc::new(transform)))
    }

    /// True when both handles refer to the same underlying source.
    pub fn same_source(&self, other: &ContentSource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The content bytes. Idempotent; concurrent first calls materialize
    /// exactly once and share the result.
    pub async fn bytes(&self) -> Result<Arc<[u8]>> {
        let cached = self
            .inner
            .cache
            .get_or_try_init(|| async { materialize(&self.inner.backing).await })
            .await?;
        Ok(cached.clone())
    }

    /// The content as UTF-8 text.
    pub async fn text(&self) -> Result<String> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| DocmillError::conversion("content", "non-UTF-8 bytes", "string"))
    }

    /// SHA-256 of the materialized bytes, as lowercase hex.
    pub async fn content_hash(&self) -> Result<String> {
        let bytes = self.bytes().await?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

impl Default for ContentSource {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.inner.backing {
            Backing::Empty => "empty",
            Backing::Memory(_) => "memory",
            Backing::File(_) => "file",
            Backing::Transform(_) => "transform",
        };
        f.debug_struct("ContentSource")
            .field("backing", &kind)
            .field("materialized", &self.inner.cache.initialized())
            .finish()
    }
}

async fn materialize(backing: &Backing) -> Result<Arc<[u8]>> {
    match backing {
        Backing::Empty => Ok(Arc::from(Vec::new())),
        Backing::Memory(bytes) => Ok(bytes.clone()),
        Backing::File(path) => {
            let Some(full) = path.full_path() else {
                return Err(DocmillError::argument(
                    "cannot read content from a null path",
                ));
            };
            let native = PathBuf::from(full);
            let bytes = tokio::fs::read(&native)
                .await
                .map_err(|e| DocmillError::io(&native, e))?;
            tracing::debug!(path = %path, len = bytes.len(), "materialized file content");
            Ok(Arc::from(bytes))
        }
        Backing::Transform(transform) => {
            let bytes = transform.materialize().await?;
            tracing::debug!(len = bytes.len(), "materialized transform content");
            Ok(Arc::from(bytes))
        }
    }
}
