#![forbid(unsafe_code)]

//! Core library for the liftc workout program compiler.
//!
//! This crate provides:
//! - The shorthand expression language (tokenizer, parser, evaluator)
//! - Shorthand prescriptions such as `225:3:5@8`
//! - Program documents and the loader that validates them
//! - Rendering of templates and schedules into concrete prescriptions
//! - Export of rendered programs (JSON, YAML, CSV)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod shorthand;
pub mod document;
pub mod loader;
pub mod render;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use export::OutputFormat;
pub use loader::{load_program, load_program_with};
pub use render::{render, render_document};
pub use shorthand::{resolve_definition, resolve_expression, Binding};
