//! Shared types, error model, and configuration for Docmill.
//!
//! This crate is the foundation depended on by the engine crate. It provides:
//! - [`DocmillError`] — the unified error type
//! - [`PathValue`] — the normalized path value used as the canonical
//!   addressing scheme throughout the engine
//! - Configuration ([`EngineConfig`], [`ExecutionOptions`], config loading)

pub mod config;
pub mod error;
pub mod path;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    EngineConfig, ErrorPolicy, ExecutionConfig, ExecutionOptions, load_config_from, parse_config,
};
pub use error::{DocmillError, Result};
pub use path::{
    OPTIMIZE_RESERVED_CHARS, PathComparison, PathKind, PathValue, optimize_file_name,
    optimize_file_name_with,
};
