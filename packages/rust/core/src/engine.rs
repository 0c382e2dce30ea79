//! The execution engine: pipeline registration, dependency ordering, and
//! phased concurrent execution.
//!
//! Registration closes when a run starts: the dependency graph is validated
//! and topologically sorted into phases before any module executes, so a
//! cyclic or unresolved reference is a configuration error distinct from
//! any runtime module failure. Pipelines inside one phase have no remaining
//! unmet dependencies and run concurrently; modules inside one pipeline run
//! strictly in declared order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use docmill_shared::{DocmillError, EngineConfig, ExecutionOptions, Result};

use crate::context::ExecutionContext;
use crate::document::{ConstructFn, Document, DocumentFactory};
use crate::metadata::{MetaValue, Metadata};
use crate::pipeline::{Pipeline, PipelineInput, PipelineState};

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// Everything observable about one engine run.
pub struct RunReport {
    pub execution_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Completed output collections, keyed by pipeline name.
    pub outputs: HashMap<String, Vec<Arc<dyn Document>>>,
    pub pipelines: HashMap<String, PipelineSummary>,
    /// Every error surfaced during the run, including per-document module
    /// errors absorbed under the `Continue` policy.
    pub errors: Vec<DocmillError>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
            && self
                .pipelines
                .values()
                .all(|summary| summary.state == PipelineState::Completed)
    }

    pub fn output(&self, pipeline: &str) -> Option<&[Arc<dyn Document>]> {
        self.outputs.get(pipeline).map(Vec::as_slice)
    }
}

/// Final state of one pipeline within a run.
#[derive(Debug)]
pub struct PipelineSummary {
    pub state: PipelineState,
    pub duration: Duration,
    pub errors: Vec<String>,
}

impl PipelineSummary {
    fn pending() -> Self {
        Self {
            state: PipelineState::Pending,
            duration: Duration::ZERO,
            errors: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Registers pipelines and executes them in dependency order.
pub struct Engine {
    pipelines: Vec<Arc<Pipeline>>,
    by_name: HashMap<String, usize>,
    settings: Arc<Metadata>,
    options: ExecutionOptions,
    construct: Option<ConstructFn>,
    cancellation: CancellationToken,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_settings(Metadata::new(), ExecutionOptions::default())
    }

    /// An engine with explicit global settings (the engine default metadata
    /// layer) and execution options.
    pub fn with_settings(settings: Metadata, options: ExecutionOptions) -> Self {
        Self {
            pipelines: Vec::new(),
            by_name: HashMap::new(),
            settings: Arc::new(settings),
            options,
            construct: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// An engine seeded from a TOML [`EngineConfig`]: the `[settings]` table
    /// becomes the default metadata layer, `[execution]` the options.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut settings = Metadata::new();
        for (key, value) in &config.settings {
            let json = serde_json::to_value(value).map_err(|e| {
                DocmillError::configuration(format!("setting {key:?} is not representable: {e}"))
            })?;
            settings.set(key.clone(), MetaValue::Concrete(json));
        }
        Ok(Self::with_settings(settings, ExecutionOptions::from(config)))
    }

    /// Bind the run's document factory to a custom document subtype.
    pub fn set_document_subtype(
        &mut self,
        construct: impl Fn(crate::document::DocumentParts) -> Arc<dyn Document>
        + Send
        + Sync
        + 'static,
    ) {
        self.construct = Some(Arc::new(construct));
    }

    /// Register a pipeline. Names are unique; the full graph is validated
    /// when registration closes at the start of a run.
    pub fn add_pipeline(&mut self, pipeline: Pipeline) -> Result<()> {
        let name = pipeline.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(DocmillError::configuration(format!(
                "pipeline {name:?} is already registered"
            )));
        }
        debug!(pipeline = %name, modules = pipeline.modules().len(), "registered pipeline");
        self.by_name.insert(name, self.pipelines.len());
        self.pipelines.push(Arc::new(pipeline));
        Ok(())
    }

    /// A token that cancels the run when triggered. Observed at module and
    /// pipeline boundaries; in-flight per-document units finish.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Validate the dependency graph without running anything.
    pub fn validate(&self) -> Result<()> {
        self.execution_phases().map(|_| ())
    }

    /// Topological phases over the dependency DAG: each phase holds the
    /// pipelines whose dependencies are all satisfied by earlier phases.
    fn execution_phases(&self) -> Result<Vec<Vec<String>>> {
        for pipeline in &self.pipelines {
            for reference in pipeline.references() {
                if !self.by_name.contains_key(reference) {
                    return Err(DocmillError::configuration(format!(
                        "pipeline {:?} depends on unknown pipeline {reference:?}",
                        pipeline.name()
                    )));
                }
            }
        }

        let mut in_degree: HashMap<&str, usize> = self
            .pipelines
            .iter()
            .map(|p| (p.name(), p.references().len()))
            .collect();

        let mut phases: Vec<Vec<String>> = Vec::new();
        let mut resolved: HashSet<&str> = HashSet::new();

        while resolved.len() < self.pipelines.len() {
            let mut ready: Vec<&str> = in_degree
                .iter()
                .filter(|(name, degree)| **degree == 0 && !resolved.contains(*name))
                .map(|(&name, _)| name)
                .collect();

            if ready.is_empty() {
                let mut remaining: Vec<&str> = in_degree.keys().copied().collect();
                remaining.sort_unstable();
                return Err(DocmillError::configuration(format!(
                    "cyclic pipeline dependencies among: {}",
                    remaining.join(", ")
                )));
            }
            ready.sort_unstable();

            for &name in &ready {
                resolved.insert(name);
                in_degree.remove(name);
                for dependent in &self.pipelines {
                    if dependent.references().contains(&name) {
                        if let Some(degree) = in_degree.get_mut(dependent.name()) {
                            *degree -= 1;
                        }
                    }
                }
            }
            phases.push(ready.into_iter().map(String::from).collect());
        }

        Ok(phases)
    }

    /// Run every registered pipeline in dependency order.
    ///
    /// Configuration errors surface as `Err` before anything runs; runtime
    /// failures are recorded in the returned report, which always covers
    /// every registered pipeline.
    #[instrument(skip(self), fields(pipelines = self.pipelines.len()))]
    pub async fn execute(&self) -> Result<RunReport> {
        let phases = self.execution_phases()?;
        let execution_id = Uuid::now_v7();
        let started_at = Utc::now();
        info!(%execution_id, phases = phases.len(), "starting execution");

        let factory = match &self.construct {
            Some(construct) => {
                DocumentFactory::from_construct_fn(self.settings.clone(), construct.clone())
            }
            None => DocumentFactory::new(self.settings.clone()),
        };

        let mut outputs: HashMap<String, Vec<Arc<dyn Document>>> = HashMap::new();
        let mut summaries: HashMap<String, PipelineSummary> = self
            .pipelines
            .iter()
            .map(|p| (p.name().to_string(), PipelineSummary::pending()))
            .collect();
        let mut run_errors: Vec<DocmillError> = Vec::new();
        let mut failed: HashSet<String> = HashSet::new();
        let mut cancelled = false;

        for (phase_index, phase) in phases.iter().enumerate() {
            if self.cancellation.is_cancelled() {
                cancelled = true;
                break;
            }
            debug!(
                phase = phase_index + 1,
                pipelines = phase.len(),
                "starting phase"
            );

            // dependency outputs visible to this phase, read-only
            let snapshot = Arc::new(outputs.clone());
            let mut running = Vec::new();

            for name in phase {
                let pipeline = self.pipelines[self.by_name[name]].clone();

                if let Some(dependency) = pipeline
                    .references()
                    .into_iter()
                    .find(|r| failed.contains(*r))
                {
                    warn!(pipeline = %name, %dependency, "dependency failed, pipeline will not run");
                    let summary = summaries.get_mut(name).expect("registered pipeline");
                    summary.state = PipelineState::Failed;
                    summary
                        .errors
                        .push(format!("dependency {dependency:?} failed"));
                    failed.insert(name.clone());
                    continue;
                }

                let summary = summaries.get_mut(name).expect("registered pipeline");
                summary.state = PipelineState::Ready;

                let ctx = Arc::new(ExecutionContext::for_pipeline(
                    execution_id,
                    name,
                    self.settings.clone(),
                    factory.clone(),
                    self.options.clone(),
                    snapshot.clone(),
                    self.cancellation.child_token(),
                ));

                summary.state = PipelineState::Running;
                info!(pipeline = %name, "pipeline running");
                running.push((name.clone(), tokio::spawn(run_pipeline(pipeline, ctx))));
            }

            let (names, handles): (Vec<String>, Vec<_>) = running.into_iter().unzip();
            let results = futures::future::join_all(handles).await;

            for (name, task_result) in names.into_iter().zip(results) {
                let summary = summaries.get_mut(&name).expect("registered pipeline");
                match task_result {
                    Ok(outcome) => {
                        summary.duration = outcome.duration;
                        for error in &outcome.errors {
                            summary.errors.push(error.to_string());
                        }
                        run_errors.extend(outcome.errors);

                        match outcome.failure {
                            None => {
                                info!(
                                    pipeline = %name,
                                    documents = outcome.documents.len(),
                                    duration_ms = outcome.duration.as_millis() as u64,
                                    "pipeline completed"
                                );
                                summary.state = PipelineState::Completed;
                                outputs.insert(name, outcome.documents);
                            }
                            Some(failure) => {
                                error!(pipeline = %name, %failure, "pipeline failed");
                                summary.state = PipelineState::Failed;
                                summary.errors.push(failure.to_string());
                                run_errors.push(failure);
                                failed.insert(name);
                            }
                        }
                    }
                    Err(join_error) => {
                        error!(pipeline = %name, %join_error, "pipeline task panicked");
                        summary.state = PipelineState::Failed;
                        let failure = DocmillError::module(
                            "<pipeline>",
                            &name,
                            format!("pipeline task panicked: {join_error}"),
                        );
                        summary.errors.push(failure.to_string());
                        run_errors.push(failure);
                        failed.insert(name);
                    }
                }
            }
        }

        if cancelled {
            warn!(%execution_id, "execution cancelled");
            run_errors.push(DocmillError::Cancelled);
        }

        let finished_at = Utc::now();
        info!(
            %execution_id,
            completed = outputs.len(),
            errors = run_errors.len(),
            "execution finished"
        );

        Ok(RunReport {
            execution_id,
            started_at,
            finished_at,
            outputs,
            pipelines: summaries,
            errors: run_errors,
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Pipeline execution
// ---------------------------------------------------------------------------

struct PipelineOutcome {
    documents: Vec<Arc<dyn Document>>,
    /// Per-document errors absorbed under the `Continue` policy.
    errors: Vec<DocmillError>,
    duration: Duration,
    failure: Option<DocmillError>,
}

async fn run_pipeline(pipeline: Arc<Pipeline>, ctx: Arc<ExecutionContext>) -> PipelineOutcome {
    let start = Instant::now();
    let mut errors = Vec::new();

    let mut documents = match pipeline.input() {
        PipelineInput::Empty => Vec::new(),
        PipelineInput::Documents(seed) => seed.clone(),
        PipelineInput::Pipelines(names) => {
            let mut seed = Vec::new();
            for name in names {
                if let Some(dependency_outputs) = ctx.pipeline_outputs(name) {
                    seed.extend(dependency_outputs.iter().cloned());
                }
            }
            seed
        }
    };

    for module in pipeline.modules() {
        if ctx.is_cancelled() {
            return PipelineOutcome {
                documents: Vec::new(),
                errors,
                duration: start.elapsed(),
                failure: Some(DocmillError::Cancelled),
            };
        }
        debug!(
            pipeline = pipeline.name(),
            module = module.name(),
            inputs = documents.len(),
            "executing module"
        );
        match module.execute(&documents, &ctx).await {
            Ok(output) => {
                errors.extend(output.errors);
                documents = output.documents;
            }
            Err(failure) => {
                return PipelineOutcome {
                    documents: Vec::new(),
                    errors,
                    duration: start.elapsed(),
                    failure: Some(failure),
                };
            }
        }
    }

    PipelineOutcome {
        documents,
        errors,
        duration: start.elapsed(),
        failure: None,
    }
}
