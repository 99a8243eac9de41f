//! Semantic core of the Tarn compiler front-end.
//!
//! Everything between parsing and code generation lives here: the nominal
//! type model with overloads, generics, and variant (sum) types; the
//! scope/symbol tables; the module/package namespace with cross-package
//! imports; per-package variant-type registries; generic resolution and
//! call-site inference; and the multi-pass semantic analyzer.
//!
//! The intended flow mirrors the driver's:
//!
//! 1. Build a [`GlobalNamespace`], optionally seed it with
//!    [`builtins::install_prelude`], and create the unit's packages and
//!    [`ImportContext`].
//! 2. While the (external) parser builds the [`Ast`], resolve every
//!    written type through [`GlobalNamespace::resolve_type`], register
//!    `data` definitions with [`GlobalNamespace::define_types`], and bind
//!    symbols into arena scopes.
//! 3. Run [`analyze`] over the finished tree and gate code generation on
//!    [`has_errors`].
//!
//! Analysis is deliberately multi-error: every pass appends to one flat
//! diagnostic list and keeps going, so a single compile surfaces as many
//! independent defects as possible.

pub mod analyze;
pub mod ast;
pub mod builtins;
pub mod error;
pub mod generics;
pub mod imports;
pub mod namespace;
pub mod registry;
pub mod scope;
pub mod ty;

pub use analyze::analyze;
pub use ast::{Ast, NodeId, NodeKind};
pub use error::{Diagnostic, DiagnosticKind};
pub use imports::{ImportContext, ImportRequest};
pub use namespace::{GlobalNamespace, PackageDescriptor, ResolveEnv};
pub use ty::Type;

/// Whether any diagnostic blocks later compiler stages. The single
/// downstream gate: code generation runs iff this is false.
pub fn has_errors(diags: &[Diagnostic]) -> bool {
    diags
        .iter()
        .any(|d| d.severity() == tarn_common::Severity::Error)
}
