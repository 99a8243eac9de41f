//! Type representation for the Tarn type system.
//!
//! Defines the closed [`Type`] enum -- primitives, function types, overload
//! sets, variant (sum) types, and generic parameters -- plus the small
//! widening relation the analyzer consults where exact equality fails.
//! Adding a variant here must break every `match` in the crate; that is the
//! point of the closed enum.

use std::collections::BTreeMap;
use std::fmt;

/// A Tarn type.
///
/// Equality is structural. Function types compare by parameter/return
/// shape; variant types compare by their defining identity (module,
/// package, name) plus concrete parameters and selection. `Undefined` is
/// the type of anything the front-end could not resolve; analyzer passes
/// must tolerate it without cascading.
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    /// Resolution failed; suppresses follow-on diagnostics.
    Undefined,
    /// Compatible with every type. Used by a handful of prelude signatures.
    Any,
    Int,
    Float,
    Bool,
    String,
    Unit,
    /// A single function signature.
    Function(FunctionType),
    /// One name bound to several shape-distinct signatures.
    Overloaded(OverloadedFunctionType),
    /// A variant (closed sum) type, whole family or narrowed to one tag.
    Variant(VariantType),
    /// A generic type parameter, alive only between declaration and
    /// instantiation. None may reach the code generator.
    Param(String),
}

/// A function signature: optional generic parameters, parameter types, and
/// a return type.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionType {
    /// Generic parameter names, in declaration order. Empty for
    /// monomorphic functions.
    pub generic_params: Vec<String>,
    pub params: Vec<Type>,
    pub ret: Box<Type>,
}

impl FunctionType {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self {
            generic_params: Vec::new(),
            params,
            ret: Box::new(ret),
        }
    }

    pub fn generic(
        generic_params: Vec<String>,
        params: Vec<Type>,
        ret: Type,
    ) -> Self {
        Self {
            generic_params,
            params,
            ret: Box::new(ret),
        }
    }

    /// Whether two signatures bind the same overload slot.
    ///
    /// Overloads are keyed by parameter tuple only; a rebinding with equal
    /// parameters replaces rather than extends.
    pub fn same_shape(&self, other: &FunctionType) -> bool {
        self.params == other.params
    }
}

/// The candidate set behind one overloaded name.
///
/// Invariant: at least two candidates, pairwise shape-distinct.
#[derive(Clone, Debug, PartialEq)]
pub struct OverloadedFunctionType {
    pub candidates: Vec<FunctionType>,
}

impl OverloadedFunctionType {
    /// Merge `next` into the set: replace the shape-equal candidate if one
    /// exists, otherwise extend.
    pub fn merge(&mut self, next: FunctionType) {
        match self.candidates.iter_mut().find(|c| c.same_shape(&next)) {
            Some(slot) => *slot = next,
            None => self.candidates.push(next),
        }
    }

    /// Candidates whose parameter tuple equals `args` exactly.
    pub fn matching(&self, args: &[Type]) -> Vec<&FunctionType> {
        self.candidates
            .iter()
            .filter(|c| c.params.as_slice() == args)
            .collect()
    }
}

/// A reference to a variant (sum) type family, optionally narrowed.
///
/// The family's variant/field shapes live in the owning package's type
/// registry; this value only carries the identity, the generic-parameter
/// bindings, and which variant (if any) the value is currently known to be.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantType {
    pub module: String,
    pub package: String,
    pub name: String,
    /// Generic parameter names, in declaration order.
    pub generic_params: Vec<String>,
    /// Bindings for the generic parameters, keyed by parameter name.
    pub concrete_params: BTreeMap<String, Type>,
    /// `None` denotes the whole family: field layout is ambiguous and
    /// member access is rejected until an `is` check narrows the value.
    pub selected: Option<String>,
}

impl VariantType {
    /// The un-narrowed, unparameterized family reference.
    pub fn family(
        module: impl Into<String>,
        package: impl Into<String>,
        name: impl Into<String>,
        generic_params: Vec<String>,
    ) -> Self {
        Self {
            module: module.into(),
            package: package.into(),
            name: name.into(),
            generic_params,
            concrete_params: BTreeMap::new(),
            selected: None,
        }
    }

    /// Bind the family's generic parameters positionally to `args`.
    pub fn applied(mut self, args: Vec<Type>) -> Self {
        self.concrete_params = self
            .generic_params
            .iter()
            .cloned()
            .zip(args)
            .collect();
        self
    }

    /// The same reference narrowed to a single variant tag.
    pub fn narrowed(&self, tag: impl Into<String>) -> Self {
        Self {
            selected: Some(tag.into()),
            ..self.clone()
        }
    }
}

impl Type {
    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function(FunctionType::new(params, ret))
    }

    /// The primitive named `name`, if there is one.
    pub fn primitive(name: &str) -> Option<Type> {
        match name {
            "int" => Some(Type::Int),
            "float" => Some(Type::Float),
            "bool" => Some(Type::Bool),
            "string" => Some(Type::String),
            "unit" => Some(Type::Unit),
            "any" => Some(Type::Any),
            _ => None,
        }
    }

    /// Whether any generic parameter survives in this type. The code
    /// generator rejects such types; the analyzer reports them first.
    pub fn mentions_param(&self) -> bool {
        match self {
            Type::Param(_) => true,
            Type::Function(f) => {
                f.params.iter().any(Type::mentions_param) || f.ret.mentions_param()
            }
            Type::Overloaded(o) => o.candidates.iter().any(|c| {
                c.params.iter().any(Type::mentions_param) || c.ret.mentions_param()
            }),
            Type::Variant(v) => v.concrete_params.values().any(Type::mentions_param),
            _ => false,
        }
    }
}

// ── Widening ───────────────────────────────────────────────────────────

/// The implicit widening digraph. These three edges are the whole relation;
/// `int -> unit` and `float -> unit` are the discard coercions the rest of
/// the compiler depends on.
fn widens_directly(from: &Type, to: &Type) -> bool {
    matches!(
        (from, to),
        (Type::Int, Type::Float) | (Type::Int, Type::Unit) | (Type::Float, Type::Unit)
    )
}

/// Whether `from` reaches `to` in the widening digraph.
///
/// A reachability query, not lattice arithmetic: the relation is neither
/// reflexive nor symmetric.
pub fn is_subtype(from: &Type, to: &Type) -> bool {
    if widens_directly(from, to) {
        return true;
    }
    // One transitive hop covers the current graph; written as a search so
    // the edge table stays the single source of truth.
    let steps: [Type; 3] = [Type::Float, Type::Unit, Type::Int];
    steps
        .iter()
        .any(|mid| widens_directly(from, mid) && is_subtype(mid, to))
}

// ── Display ────────────────────────────────────────────────────────────

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.generic_params.is_empty() {
            write!(f, "[{}]", self.generic_params.join(", "))?;
        }
        write!(f, "(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.concrete_params.is_empty() {
            write!(f, "[")?;
            // Declaration order, not map order.
            let mut first = true;
            for param in &self.generic_params {
                if let Some(ty) = self.concrete_params.get(param) {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{ty}")?;
                }
            }
            write!(f, "]")?;
        }
        if let Some(tag) = &self.selected {
            write!(f, "/{tag}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Undefined => write!(f, "undefined"),
            Type::Any => write!(f, "any"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "string"),
            Type::Unit => write!(f, "unit"),
            Type::Function(ft) => write!(f, "{ft}"),
            Type::Overloaded(o) => {
                for (i, c) in o.candidates.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{c}")?;
                }
                Ok(())
            }
            Type::Variant(v) => write!(f, "{v}"),
            Type::Param(name) => write!(f, "{name}"),
        }
    }
}
