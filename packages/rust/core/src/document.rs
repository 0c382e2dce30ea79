//! Immutable documents and the factory that creates them.
//!
//! A document is a unit of (source path, destination path, metadata
//! snapshot, content source), immutable after construction. New documents
//! are produced only through a [`DocumentFactory`], which is bound to one
//! concrete document subtype per factory instance: subtypes are expressed
//! as a construction closure fixed at factory creation plus a per-instance
//! clone primitive, instead of virtual clone dispatch.

use std::sync::Arc;

use docmill_shared::path::PathValue;
use docmill_shared::{DocmillError, Result};

use crate::content::ContentSource;
use crate::metadata::{MetaValue, Metadata};

/// The fully-resolved core fields handed to a subtype's constructor or
/// clone primitive.
#[derive(Debug, Clone)]
pub struct DocumentParts {
    pub source_path: PathValue,
    pub destination_path: PathValue,
    pub metadata: Metadata,
    pub content: ContentSource,
}

impl DocumentParts {
    fn empty(metadata: Metadata) -> Self {
        Self {
            source_path: PathValue::empty(),
            destination_path: PathValue::empty(),
            metadata,
            content: ContentSource::empty(),
        }
    }
}

/// An immutable document.
///
/// `with_parts` is the clone primitive: build a new instance of the same
/// subtype around the given core fields, carrying any subtype-specific
/// fields across. Returning `None` or the receiver itself violates the
/// factory's clone invariant and fails construction.
pub trait Document: Send + Sync {
    /// Where the document came from; empty for generated documents.
    fn source_path(&self) -> &PathValue;

    /// Where the document is headed.
    fn destination_path(&self) -> &PathValue;

    fn metadata(&self) -> &Metadata;

    fn content(&self) -> &ContentSource;

    fn with_parts(&self, parts: DocumentParts) -> Option<Arc<dyn Document>>;
}

/// A readable identity for error attribution: destination path, else source
/// path, else a placeholder.
pub fn document_identity(document: &dyn Document) -> String {
    if !document.destination_path().is_empty() && !document.destination_path().is_null() {
        return document.destination_path().to_string();
    }
    if !document.source_path().is_empty() && !document.source_path().is_null() {
        return document.source_path().to_string();
    }
    "<document>".to_string()
}

// ---------------------------------------------------------------------------
// PipelineDocument
// ---------------------------------------------------------------------------

/// The default document subtype: exactly the four core fields.
#[derive(Debug)]
pub struct PipelineDocument {
    source_path: PathValue,
    destination_path: PathValue,
    metadata: Metadata,
    content: ContentSource,
}

impl PipelineDocument {
    pub fn new(parts: DocumentParts) -> Self {
        Self {
            source_path: parts.source_path,
            destination_path: parts.destination_path,
            metadata: parts.metadata,
            content: parts.content,
        }
    }
}

impl Document for PipelineDocument {
    fn source_path(&self) -> &PathValue {
        &self.source_path
    }

    fn destination_path(&self) -> &PathValue {
        &self.destination_path
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn content(&self) -> &ContentSource {
        &self.content
    }

    fn with_parts(&self, parts: DocumentParts) -> Option<Arc<dyn Document>> {
        Some(Arc::new(Self::new(parts)))
    }
}

// ---------------------------------------------------------------------------
// DocumentFactory
// ---------------------------------------------------------------------------

/// Subtype constructor held by a factory.
pub type ConstructFn = Arc<dyn Fn(DocumentParts) -> Arc<dyn Document> + Send + Sync>;

/// Pending changes for [`DocumentFactory::clone_or_create`]; `None` fields
/// carry the source document's value forward unchanged.
#[derive(Default)]
pub struct DocumentUpdate {
    pub source_path: Option<PathValue>,
    pub destination_path: Option<PathValue>,
    pub metadata_changes: Vec<(String, MetaValue)>,
    pub content: Option<ContentSource>,
}

impl DocumentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_path(mut self, path: PathValue) -> Self {
        self.source_path = Some(path);
        self
    }

    pub fn destination_path(mut self, path: PathValue) -> Self {
        self.destination_path = Some(path);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata_changes.push((key.into(), value.into()));
        self
    }

    pub fn content(mut self, content: ContentSource) -> Self {
        self.content = Some(content);
        self
    }
}

/// Creates and clones documents of one bound subtype.
///
/// The subtype is fixed once at factory construction; the engine builds one
/// factory per run, seeded with the run's default metadata layer.
#[derive(Clone)]
pub struct DocumentFactory {
    defaults: Arc<Metadata>,
    construct: ConstructFn,
}

impl DocumentFactory {
    /// A factory producing [`PipelineDocument`]s.
    pub fn new(defaults: Arc<Metadata>) -> Self {
        Self::for_subtype(defaults, |parts| Arc::new(PipelineDocument::new(parts)))
    }

    /// A factory bound to a custom document subtype.
    pub fn for_subtype(
        defaults: Arc<Metadata>,
        construct: impl Fn(DocumentParts) -> Arc<dyn Document> + Send + Sync + 'static,
    ) -> Self {
        Self {
            defaults,
            construct: Arc::new(construct),
        }
    }

    /// A factory from an already-shared constructor.
    pub fn from_construct_fn(defaults: Arc<Metadata>, construct: ConstructFn) -> Self {
        Self {
            defaults,
            construct,
        }
    }

    /// The active default metadata layer.
    pub fn defaults(&self) -> &Arc<Metadata> {
        &self.defaults
    }

    /// Build a fresh zero-content document: the default metadata layer
    /// merged under `initial`.
    pub fn create<K, V>(&self, initial: impl IntoIterator<Item = (K, V)>) -> Arc<dyn Document>
    where
        K: Into<String>,
        V: Into<MetaValue>,
    {
        let mut metadata = Metadata::with_parent(self.defaults.clone());
        for (key, value) in initial {
            metadata.set(key, value);
        }
        (self.construct)(DocumentParts::empty(metadata))
    }

    /// Clone `source` with `update` applied, or create from scratch when
    /// `source` is `None`.
    ///
    /// The subtype clone primitive must return a new, distinct instance;
    /// `None` or the source instance itself is a construction error.
    pub fn clone_or_create(
        &self,
        source: Option<&Arc<dyn Document>>,
        update: DocumentUpdate,
    ) -> Result<Arc<dyn Document>> {
        let Some(source) = source else {
            let mut metadata = Metadata::with_parent(self.defaults.clone());
            for (key, value) in update.metadata_changes {
                metadata.set(key, value);
            }
            let parts = DocumentParts {
                source_path: update.source_path.unwrap_or_else(PathValue::empty),
                destination_path: update.destination_path.unwrap_or_else(PathValue::empty),
                metadata,
                content: update.content.unwrap_or_else(ContentSource::empty),
            };
            return Ok((self.construct)(parts));
        };

        let parts = DocumentParts {
            source_path: update
                .source_path
                .unwrap_or_else(|| source.source_path().clone()),
            destination_path: update
                .destination_path
                .unwrap_or_else(|| source.destination_path().clone()),
            metadata: source.metadata().with_changes(update.metadata_changes),
            content: update.content.unwrap_or_else(|| source.content().clone()),
        };

        let cloned = source.with_parts(parts).ok_or_else(|| {
            DocmillError::construction("document clone primitive produced no instance")
        })?;
        if std::ptr::eq(
            Arc::as_ptr(source) as *const (),
            Arc::as_ptr(&cloned) as *const (),
        ) {
            return Err(DocmillError::construction(
                "document clone primitive returned the source instance",
            ));
        }
        Ok(cloned)
    }
}
