//! Generate Lua language-server annotation stubs from a structured host API
//! description, and validate generated stubs.
//!
//! Pipeline, leaves first:
//!
//! ```text
//! loader ─> normalize (types + overload) ─> codegen ─> files ─> validate
//! ```
//!
//! Each stage is a pure function of its input plus the immutable
//! [`config::GeneratorConfig`]; findings come back as values.
pub mod cli;
pub mod codegen;
pub mod config;
pub mod error;
pub mod ir;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod overload;
pub mod path_de;
pub mod pipeline;
pub mod report;
pub mod validate;

pub use config::{GeneratorConfig, TypeTable};
pub use error::{Diagnostic, EmitError, LoadError};
pub use pipeline::{GenerationReport, generate};
pub use validate::{ValidationReport, Validator};
