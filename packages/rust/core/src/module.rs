//! Module contracts and parallel per-document execution.
//!
//! A module is a stateless transformation from a document collection to a
//! document collection. Two shapes exist: whole-collection transforms
//! implement [`Module`] directly; per-document maps implement [`MapModule`]
//! and are lifted by [`ParallelMap`], which evaluates inputs concurrently
//! but reassembles outputs keyed by input order, so the flattened result is
//! indistinguishable from a sequential run.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::debug;

use docmill_shared::{DocmillError, ErrorPolicy, Result};

use crate::context::ExecutionContext;
use crate::document::{Document, document_identity};

/// Result of one module invocation.
///
/// Under the `Continue` error policy a module reports partial output plus
/// the per-document errors it absorbed; under `FailFast` the invocation
/// itself fails and `errors` stays empty.
#[derive(Default)]
pub struct ModuleOutput {
    pub documents: Vec<Arc<dyn Document>>,
    pub errors: Vec<DocmillError>,
}

impl std::fmt::Debug for ModuleOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleOutput")
            .field("documents", &self.documents.len())
            .field("errors", &self.errors)
            .finish()
    }
}

impl From<Vec<Arc<dyn Document>>> for ModuleOutput {
    fn from(documents: Vec<Arc<dyn Document>>) -> Self {
        Self {
            documents,
            errors: Vec::new(),
        }
    }
}

/// A whole-collection transformation.
///
/// Each invocation re-runs the transformation; outputs are finite and owned
/// by the caller. Modules never mutate their inputs: documents are
/// immutable and new ones come from the context's document factory.
#[async_trait]
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(
        &self,
        inputs: &[Arc<dyn Document>],
        ctx: &Arc<ExecutionContext>,
    ) -> Result<ModuleOutput>;
}

/// A per-document transformation: one logical output group per input
/// document (possibly empty, possibly several documents).
///
/// The engine may evaluate `map` for different inputs concurrently;
/// implementations must not rely on evaluation order across inputs.
#[async_trait]
pub trait MapModule: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn map(
        &self,
        input: Arc<dyn Document>,
        ctx: Arc<ExecutionContext>,
    ) -> Result<Vec<Arc<dyn Document>>>;
}

/// Lifts a [`MapModule`] into a [`Module`] with bounded concurrent dispatch.
///
/// One task per input, bounded by a semaphore sized from
/// `ExecutionOptions::parallelism`. Results land in an input-indexed buffer
/// and flatten in index order after all units finish, which keeps the output
/// reproducible regardless of completion order. A failing unit never
/// disturbs its siblings; in-flight units always run to completion.
pub struct ParallelMap<M> {
    inner: Arc<M>,
}

impl<M: MapModule> ParallelMap<M> {
    pub fn new(module: M) -> Self {
        Self {
            inner: Arc::new(module),
        }
    }
}

#[async_trait]
impl<M: MapModule> Module for ParallelMap<M> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn execute(
        &self,
        inputs: &[Arc<dyn Document>],
        ctx: &Arc<ExecutionContext>,
    ) -> Result<ModuleOutput> {
        let parallelism = ctx.options().parallelism.max(1);
        let semaphore = Arc::new(Semaphore::new(parallelism));

        let mut handles = Vec::with_capacity(inputs.len());
        for input in inputs {
            let module = self.inner.clone();
            let ctx = ctx.clone();
            let input = input.clone();
            let semaphore = semaphore.clone();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                module.map(input, ctx).await
            }));
        }

        // reassemble keyed by input order, whatever order tasks finished in
        let mut documents = Vec::new();
        let mut errors = Vec::new();
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(group)) => documents.extend(group),
                Ok(Err(error)) => {
                    let identity = document_identity(&*inputs[index]);
                    debug!(module = self.name(), document = %identity, %error, "map unit failed");
                    errors.push(DocmillError::module(
                        self.name(),
                        identity,
                        error.to_string(),
                    ));
                }
                Err(join_error) => {
                    let identity = document_identity(&*inputs[index]);
                    errors.push(DocmillError::module(
                        self.name(),
                        identity,
                        format!("map unit panicked: {join_error}"),
                    ));
                }
            }
        }

        match ctx.options().error_policy {
            ErrorPolicy::FailFast => match errors.into_iter().next() {
                Some(first) => Err(first),
                None => Ok(ModuleOutput {
                    documents,
                    errors: Vec::new(),
                }),
            },
            ErrorPolicy::Continue => Ok(ModuleOutput { documents, errors }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use docmill_shared::ExecutionOptions;
    use docmill_shared::path::PathValue;

    use crate::document::DocumentUpdate;
    use crate::metadata::Metadata;

    use super::*;

    fn ctx_with_policy(policy: ErrorPolicy) -> Arc<ExecutionContext> {
        let mut options = ExecutionOptions::default();
        options.error_policy = policy;
        Arc::new(ExecutionContext::new(Metadata::new(), options))
    }

    fn documents(ctx: &ExecutionContext, count: usize) -> Vec<Arc<dyn Document>> {
        (0..count)
            .map(|i| {
                ctx.documents()
                    .clone_or_create(
                        None,
                        DocumentUpdate::new()
                            .destination_path(PathValue::new(&format!("doc-{i}.html"))),
                    )
                    .expect("create document")
            })
            .collect()
    }

    /// Sleeps longer for earlier inputs so completion order reverses input
    /// order, then emits one renamed document per input.
    struct StaggeredRename;

    #[async_trait]
    impl MapModule for StaggeredRename {
        fn name(&self) -> &str {
            "StaggeredRename"
        }

        async fn map(
            &self,
            input: Arc<dyn Document>,
            ctx: Arc<ExecutionContext>,
        ) -> Result<Vec<Arc<dyn Document>>> {
            let name = input.destination_path().to_string();
            let index: u64 = name
                .trim_start_matches("doc-")
                .trim_end_matches(".html")
                .parse()
                .expect("index");
            tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(index * 10))).await;
            let renamed = ctx.documents().clone_or_create(
                Some(&input),
                DocumentUpdate::new()
                    .destination_path(input.destination_path().insert_prefix("mapped-")),
            )?;
            Ok(vec![renamed])
        }
    }

    #[tokio::test]
    async fn parallel_map_preserves_input_order() {
        let ctx = ctx_with_policy(ErrorPolicy::FailFast);
        let inputs = documents(&ctx, 4);

        let module = ParallelMap::new(StaggeredRename);
        let output = module.execute(&inputs, &ctx).await.unwrap();

        let names: Vec<String> = output
            .documents
            .iter()
            .map(|d| d.destination_path().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "mapped-doc-0.html",
                "mapped-doc-1.html",
                "mapped-doc-2.html",
                "mapped-doc-3.html"
            ]
        );
    }

    /// Fails on one specific document, passes the rest through.
    struct FailOn {
        target: &'static str,
    }

    #[async_trait]
    impl MapModule for FailOn {
        fn name(&self) -> &str {
            "FailOn"
        }

        async fn map(
            &self,
            input: Arc<dyn Document>,
            _ctx: Arc<ExecutionContext>,
        ) -> Result<Vec<Arc<dyn Document>>> {
            if input.destination_path().to_string() == self.target {
                return Err(DocmillError::argument("synthetic failure"));
            }
            Ok(vec![input])
        }
    }

    #[tokio::test]
    async fn continue_policy_keeps_partial_output_and_records_the_error() {
        let ctx = ctx_with_policy(ErrorPolicy::Continue);
        let inputs = documents(&ctx, 5);

        let module = ParallelMap::new(FailOn {
            target: "doc-2.html",
        });
        let output = module.execute(&inputs, &ctx).await.unwrap();

        assert_eq!(output.documents.len(), 4);
        assert_eq!(output.errors.len(), 1);
        match &output.errors[0] {
            DocmillError::Module {
                module, document, ..
            } => {
                assert_eq!(module, "FailOn");
                assert_eq!(document, "doc-2.html");
            }
            other => panic!("expected module error, got {other:?}"),
        }
        // siblings unaffected, order kept
        let names: Vec<String> = output
            .documents
            .iter()
            .map(|d| d.destination_path().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["doc-0.html", "doc-1.html", "doc-3.html", "doc-4.html"]
        );
    }

    #[tokio::test]
    async fn fail_fast_policy_fails_the_module_with_no_output() {
        let ctx = ctx_with_policy(ErrorPolicy::FailFast);
        let inputs = documents(&ctx, 5);

        let module = ParallelMap::new(FailOn {
            target: "doc-2.html",
        });
        let result = module.execute(&inputs, &ctx).await;

        match result {
            Err(DocmillError::Module { document, .. }) => assert_eq!(document, "doc-2.html"),
            other => panic!("expected module error, got {other:?}"),
        }
    }

    /// A map unit may produce zero or several documents per input.
    struct Explode;

    #[async_trait]
    impl MapModule for Explode {
        fn name(&self) -> &str {
            "Explode"
        }

        async fn map(
            &self,
            input: Arc<dyn Document>,
            ctx: Arc<ExecutionContext>,
        ) -> Result<Vec<Arc<dyn Document>>> {
            let name = input.destination_path().to_string();
            if name == "doc-1.html" {
                return Ok(vec![]);
            }
            let copy = ctx.documents().clone_or_create(
                Some(&input),
                DocumentUpdate::new()
                    .destination_path(input.destination_path().insert_suffix("-copy")),
            )?;
            Ok(vec![input, copy])
        }
    }

    #[tokio::test]
    async fn output_groups_flatten_in_input_order() {
        let ctx = ctx_with_policy(ErrorPolicy::FailFast);
        let inputs = documents(&ctx, 3);

        let module = ParallelMap::new(Explode);
        let output = module.execute(&inputs, &ctx).await.unwrap();

        let names: Vec<String> = output
            .documents
            .iter()
            .map(|d| d.destination_path().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "doc-0.html",
                "doc-0-copy.html",
                "doc-2.html",
                "doc-2-copy.html"
            ]
        );
    }
}
