//! Shared foundation types for the Tarn compiler.
//!
//! Everything in this crate is consumed by more than one compiler stage:
//! source spans and the line index used to render them, and the wire-level
//! diagnostic shape handed to the CLI/IDE layer.

pub mod diag;
pub mod span;

pub use diag::{has_errors, Diagnostic, Severity};
pub use span::{LineIndex, Span};
