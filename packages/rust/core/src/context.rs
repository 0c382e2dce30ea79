//! Per-run execution context.
//!
//! One context value is constructed for each pipeline run and passed
//! explicitly through every module and factory call; there is no
//! process-wide mutable state. Everything reachable through the context
//! (settings, dependency outputs, options) is read-only to modules.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use docmill_shared::ExecutionOptions;
use docmill_shared::path::PathValue;

use crate::content::ContentSource;
use crate::document::{Document, DocumentFactory};
use crate::metadata::Metadata;

/// Services exposed to executing modules: typed settings access, the bound
/// document factory, completed dependency outputs, and cancellation.
pub struct ExecutionContext {
    execution_id: Uuid,
    pipeline: Option<String>,
    settings: Arc<Metadata>,
    documents: DocumentFactory,
    options: ExecutionOptions,
    outputs: Arc<HashMap<String, Vec<Arc<dyn Document>>>>,
    cancellation: CancellationToken,
}

impl ExecutionContext {
    /// A standalone context, outside any engine run. Useful for driving
    /// modules and factories directly.
    pub fn new(settings: Metadata, options: ExecutionOptions) -> Self {
        let settings = Arc::new(settings);
        Self {
            execution_id: Uuid::now_v7(),
            pipeline: None,
            documents: DocumentFactory::new(settings.clone()),
            settings,
            options,
            outputs: Arc::new(HashMap::new()),
            cancellation: CancellationToken::new(),
        }
    }

    pub(crate) fn for_pipeline(
        execution_id: Uuid,
        pipeline: &str,
        settings: Arc<Metadata>,
        documents: DocumentFactory,
        options: ExecutionOptions,
        outputs: Arc<HashMap<String, Vec<Arc<dyn Document>>>>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            execution_id,
            pipeline: Some(pipeline.to_string()),
            settings,
            documents,
            options,
            outputs,
            cancellation,
        }
    }

    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// The pipeline currently executing, when inside an engine run.
    pub fn pipeline(&self) -> Option<&str> {
        self.pipeline.as_deref()
    }

    /// Engine-wide settings and default metadata, read-only for the whole
    /// run.
    pub fn settings(&self) -> &Metadata {
        &self.settings
    }

    /// The document factory bound to the active document subtype.
    pub fn documents(&self) -> &DocumentFactory {
        &self.documents
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Completed output collection of a dependency pipeline, read-only.
    pub fn pipeline_outputs(&self, name: &str) -> Option<&[Arc<dyn Document>]> {
        self.outputs.get(name).map(Vec::as_slice)
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    // -----------------------------------------------------------------------
    // Content-source factory
    // -----------------------------------------------------------------------

    pub fn content_from_text(&self, text: impl Into<String>) -> ContentSource {
        ContentSource::from_text(text)
    }

    pub fn content_from_bytes(&self, bytes: impl Into<Vec<u8>>) -> ContentSource {
        ContentSource::from_bytes(bytes)
    }

    pub fn content_from_file(&self, path: PathValue) -> ContentSource {
        ContentSource::from_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standalone_context_has_no_pipeline() {
        let ctx = ExecutionContext::new(Metadata::new(), ExecutionOptions::default());
        assert!(ctx.pipeline().is_none());
        assert!(!ctx.is_cancelled());
        assert!(ctx.pipeline_outputs("anything").is_none());
    }

    #[test]
    fn settings_are_shared_with_the_factory_defaults() {
        let settings = Metadata::from_pairs([("site", "docmill")]);
        let ctx = ExecutionContext::new(settings, ExecutionOptions::default());
        assert!(ctx.documents().defaults().contains_key("site"));
    }
}
