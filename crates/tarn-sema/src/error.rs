//! Semantic diagnostics.
//!
//! Every defect the analyzer can report, as a closed enum with enough
//! structure for tests and tooling to match on, plus the lowering into the
//! wire shape (`{severity, message, span?}`) the CLI/IDE layer consumes.
//! Everything here is severity ERROR today; the severity channel exists so
//! warnings can be added without changing the wire shape.

use std::fmt;

use serde::{Serialize, Serializer};

use tarn_common::{Severity, Span};

use crate::ty::{FunctionType, Type};

/// The kinds of semantic defect.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// A variable or callee name absent from scope and imports.
    UnrecognizedName { name: String },
    /// Plain function called with the wrong number of arguments.
    FunctionArityError {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// No overload candidate matches the call's argument types.
    NoCandidatesForFunction {
        name: String,
        supplied: Vec<Type>,
        candidates: Vec<FunctionType>,
    },
    /// Two or more overload candidates match the call exactly.
    AmbiguousOverload {
        name: String,
        candidates: Vec<FunctionType>,
    },
    /// A non-function value in call position.
    NotAFunction { callee: String, found: Type },
    /// Explicit type-argument count disagrees with the declaration.
    GenericTypeArityError {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// Conflicting bindings for one type parameter (inferred vs inferred,
    /// or explicit vs inferred).
    GenericTypeMismatch {
        param: String,
        expected: Type,
        found: Type,
    },
    /// Non-unit return type on a function with an empty body.
    MissingReturnValue { function: String, declared: Type },
    /// Expected and actual types are neither equal nor related by widening.
    TypeMismatch { expected: Type, found: Type },
    /// Both if/else branches present with differing types.
    IfElseBranchesTypeMismatch { then_ty: Type, else_ty: Type },
    /// Assignment to a `val` binding.
    CannotChangeImmutableVariable { name: String },
    /// Member access names a field the narrowed variant does not have.
    MemberDoesNotExist { ty: Type, member: String },
    /// Member access on something that is not a narrowed variant value.
    ExpectedVariantType { found: Type },
    InvalidModuleName { name: String },
    InvalidPackageName { name: String },
    /// Imported name absent from (or private in) the target package.
    InvalidImport {
        module: String,
        package: String,
        name: String,
    },
    /// An internal defect surfaced as a diagnostic instead of a crash.
    UnsupportedConstruct { detail: String },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::UnrecognizedName { name } => {
                write!(f, "unrecognized name `{name}`")
            }
            DiagnosticKind::FunctionArityError { name, expected, actual } => {
                write!(
                    f,
                    "function `{name}` expects {expected} arguments, found {actual}"
                )
            }
            DiagnosticKind::NoCandidatesForFunction { name, supplied, candidates } => {
                write!(f, "no candidates of `{name}` match arguments (")?;
                for (i, ty) in supplied.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                write!(f, "); known candidates: ")?;
                for (i, c) in candidates.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{c}")?;
                }
                Ok(())
            }
            DiagnosticKind::AmbiguousOverload { name, candidates } => {
                write!(
                    f,
                    "ambiguous call to `{name}`: {} candidates match: ",
                    candidates.len()
                )?;
                for (i, c) in candidates.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{c}")?;
                }
                Ok(())
            }
            DiagnosticKind::NotAFunction { callee, found } => {
                write!(f, "cannot call `{callee}`: type `{found}` is not a function")
            }
            DiagnosticKind::GenericTypeArityError { name, expected, actual } => {
                write!(
                    f,
                    "wrong number of type arguments for `{name}`: expected {expected}, found {actual}"
                )
            }
            DiagnosticKind::GenericTypeMismatch { param, expected, found } => {
                write!(
                    f,
                    "conflicting types for type parameter `{param}`: `{expected}` vs `{found}`"
                )
            }
            DiagnosticKind::MissingReturnValue { function, declared } => {
                write!(
                    f,
                    "function `{function}` declares return type `{declared}` but has an empty body"
                )
            }
            DiagnosticKind::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected `{expected}`, found `{found}`")
            }
            DiagnosticKind::IfElseBranchesTypeMismatch { then_ty, else_ty } => {
                write!(f, "if and else branches disagree: `{then_ty}` vs `{else_ty}`")
            }
            DiagnosticKind::CannotChangeImmutableVariable { name } => {
                write!(f, "cannot assign to immutable binding `{name}`")
            }
            DiagnosticKind::MemberDoesNotExist { ty, member } => {
                write!(f, "type `{ty}` has no member `{member}`")
            }
            DiagnosticKind::ExpectedVariantType { found } => {
                write!(
                    f,
                    "member access requires a narrowed variant type, found `{found}`"
                )
            }
            DiagnosticKind::InvalidModuleName { name } => {
                write!(f, "invalid module name `{name}`")
            }
            DiagnosticKind::InvalidPackageName { name } => {
                write!(f, "invalid package name `{name}`")
            }
            DiagnosticKind::InvalidImport { module, package, name } => {
                write!(f, "`{name}` is not importable from `{module}.{package}`")
            }
            DiagnosticKind::UnsupportedConstruct { detail } => {
                write!(f, "unsupported construct: {detail}")
            }
        }
    }
}

/// One reported semantic defect: a kind plus where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span) -> Self {
        Self { kind, span: Some(span) }
    }

    /// A defect with no single source position (import-table and
    /// namespace-level checks).
    pub fn unspanned(kind: DiagnosticKind) -> Self {
        Self { kind, span: None }
    }

    /// Every semantic diagnostic is an error today.
    pub fn severity(&self) -> Severity {
        Severity::Error
    }

    /// Lower into the wire shape handed to the CLI/IDE layer.
    pub fn to_wire(&self) -> tarn_common::Diagnostic {
        tarn_common::Diagnostic {
            severity: self.severity(),
            message: self.kind.to_string(),
            span: self.span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}
