//! Named pipelines: ordered module chains with declared dependencies.

use std::fmt;
use std::sync::Arc;

use crate::document::Document;
use crate::module::Module;

/// Where a pipeline's first module gets its input collection.
#[derive(Default)]
pub enum PipelineInput {
    /// Start from nothing; the first module generates documents.
    #[default]
    Empty,
    /// A fixed seed collection.
    Documents(Vec<Arc<dyn Document>>),
    /// The completed outputs of other pipelines, concatenated in the listed
    /// order and read-only. Listing a pipeline here implies a dependency on
    /// it.
    Pipelines(Vec<String>),
}

impl fmt::Debug for PipelineInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Documents(docs) => write!(f, "Documents({})", docs.len()),
            Self::Pipelines(names) => f.debug_tuple("Pipelines").field(names).finish(),
        }
    }
}

/// Lifecycle of a pipeline within one engine run.
///
/// `Pending -> Ready -> Running -> Completed`, or `Running -> Failed`. A
/// pipeline becomes `Ready` only once every dependency has `Completed`; a
/// failed dependency fails its dependents without running them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Pending,
    Ready,
    Running,
    Completed,
    Failed,
}

/// A named, ordered chain of modules plus its declared dependencies.
pub struct Pipeline {
    name: String,
    modules: Vec<Arc<dyn Module>>,
    depends_on: Vec<String>,
    input: PipelineInput,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: Vec::new(),
            depends_on: Vec::new(),
            input: PipelineInput::Empty,
        }
    }

    /// Append a module; modules run strictly in the order added.
    pub fn with_module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Arc::new(module));
        self
    }

    pub fn with_input(mut self, input: PipelineInput) -> Self {
        self.input = input;
        self
    }

    /// Declare an ordering dependency on another pipeline.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    pub fn input(&self) -> &PipelineInput {
        &self.input
    }

    /// All pipelines this one must wait for: explicit dependencies plus any
    /// pipelines referenced as input, deduplicated.
    pub(crate) fn references(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = Vec::new();
        for dep in &self.depends_on {
            if !refs.contains(&dep.as_str()) {
                refs.push(dep);
            }
        }
        if let PipelineInput::Pipelines(names) = &self.input {
            for name in names {
                if !refs.contains(&name.as_str()) {
                    refs.push(name);
                }
            }
        }
        refs
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field(
                "modules",
                &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("depends_on", &self.depends_on)
            .field("input", &self.input)
            .finish()
    }
}
