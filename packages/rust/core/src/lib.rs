//! Core content-transformation engine for Docmill.
//!
//! Documents flow through a dependency-ordered graph of named pipelines,
//! each an ordered chain of modules that consume and produce immutable
//! document collections. This crate ties together metadata, content
//! sources, documents, modules, and the engine that orchestrates them.

pub mod content;
pub mod context;
pub mod document;
pub mod engine;
pub mod metadata;
pub mod module;
pub mod modules;
pub mod pipeline;

pub use content::{ContentSource, MaterializeContent};
pub use context::ExecutionContext;
pub use document::{
    ConstructFn, Document, DocumentFactory, DocumentParts, DocumentUpdate, PipelineDocument,
    document_identity,
};
pub use engine::{Engine, PipelineSummary, RunReport};
pub use metadata::{FromMetaValue, MetaValue, Metadata};
pub use module::{MapModule, Module, ModuleOutput, ParallelMap};
pub use modules::{AddMetadata, FilterDocuments, SetContent};
pub use pipeline::{Pipeline, PipelineInput, PipelineState};
