//! Small generic modules shipped with the engine.
//!
//! These are engine-level utilities, not renderers: enough to wire useful
//! pipelines and to exercise both module shapes (per-document map and
//! whole-collection transform). Anything domain-specific, such as
//! templating or markdown, lives outside the core as a [`Module`]
//! implementation.

use std::sync::Arc;

use async_trait::async_trait;

use docmill_shared::Result;

use crate::content::ContentSource;
use crate::context::ExecutionContext;
use crate::document::{Document, DocumentUpdate};
use crate::metadata::MetaValue;
use crate::module::{MapModule, Module, ModuleOutput};

// ---------------------------------------------------------------------------
// AddMetadata
// ---------------------------------------------------------------------------

/// Per-document map that merges fixed metadata entries into every input.
pub struct AddMetadata {
    entries: Vec<(String, MetaValue)>,
}

impl AddMetadata {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<MetaValue>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl MapModule for AddMetadata {
    fn name(&self) -> &str {
        "AddMetadata"
    }

    async fn map(
        &self,
        input: Arc<dyn Document>,
        ctx: Arc<ExecutionContext>,
    ) -> Result<Vec<Arc<dyn Document>>> {
        let mut update = DocumentUpdate::new();
        for (key, value) in &self.entries {
            update = update.metadata(key.clone(), value.clone());
        }
        Ok(vec![ctx.documents().clone_or_create(Some(&input), update)?])
    }
}

// ---------------------------------------------------------------------------
// SetContent
// ---------------------------------------------------------------------------

/// Per-document map that rebinds every input to one shared content source.
pub struct SetContent {
    content: ContentSource,
}

impl SetContent {
    pub fn new(content: ContentSource) -> Self {
        Self { content }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ContentSource::from_text(text))
    }
}

#[async_trait]
impl MapModule for SetContent {
    fn name(&self) -> &str {
        "SetContent"
    }

    async fn map(
        &self,
        input: Arc<dyn Document>,
        ctx: Arc<ExecutionContext>,
    ) -> Result<Vec<Arc<dyn Document>>> {
        Ok(vec![ctx.documents().clone_or_create(
            Some(&input),
            DocumentUpdate::new().content(self.content.clone()),
        )?])
    }
}

// ---------------------------------------------------------------------------
// FilterDocuments
// ---------------------------------------------------------------------------

/// Whole-collection transform that keeps only documents matching a
/// predicate.
pub struct FilterDocuments {
    predicate: Arc<dyn Fn(&dyn Document) -> bool + Send + Sync>,
}

impl FilterDocuments {
    pub fn new(predicate: impl Fn(&dyn Document) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Arc::new(predicate),
        }
    }
}

#[async_trait]
impl Module for FilterDocuments {
    fn name(&self) -> &str {
        "FilterDocuments"
    }

    async fn execute(
        &self,
        inputs: &[Arc<dyn Document>],
        _ctx: &Arc<ExecutionContext>,
    ) -> Result<ModuleOutput> {
        let kept: Vec<Arc<dyn Document>> = inputs
            .iter()
            .filter(|doc| (self.predicate)(&***doc))
            .cloned()
            .collect();
        Ok(kept.into())
    }
}
