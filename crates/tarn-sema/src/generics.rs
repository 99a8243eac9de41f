//! Generic type resolution.
//!
//! Three related jobs live here:
//!
//! 1. [`GenericResolver::resolve`] turns the parser's unresolved [`TypeRef`]
//!    trees into concrete [`Type`]s while the AST is being built, consulting
//!    an ambient stack of currently-visible generic parameter names. A bare
//!    name that matches an ambient parameter always resolves to
//!    [`Type::Param`], never to a registry lookup.
//! 2. [`match_call_types`] unifies declared parameter types against
//!    call-site argument types, producing a parameter→type substitution.
//!    Discovering two different bindings for one parameter is an error
//!    carrying both -- never last-write-wins.
//! 3. [`instantiate`] applies a substitution through every position a
//!    parameter can hide in.

use rustc_hash::FxHashMap;

use crate::namespace::{GlobalNamespace, ResolveEnv};
use crate::ty::{FunctionType, Type, VariantType};

/// An unresolved type reference as produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// A bare name: primitive, ambient generic parameter, variant family,
    /// or variant tag.
    Name(String),
    /// A generic application, `Option[int]`. The head may be a family name
    /// or a variant tag.
    Apply { name: String, args: Vec<TypeRef> },
    /// An alias-qualified name, `opt.Option[int]`.
    Qualified {
        alias: String,
        name: String,
        args: Vec<TypeRef>,
    },
    /// A function shape, `(int, T) -> bool`.
    Function {
        params: Vec<TypeRef>,
        ret: Box<TypeRef>,
    },
}

impl TypeRef {
    pub fn name(n: impl Into<String>) -> TypeRef {
        TypeRef::Name(n.into())
    }

    pub fn apply(n: impl Into<String>, args: Vec<TypeRef>) -> TypeRef {
        TypeRef::Apply { name: n.into(), args }
    }

    pub fn function(params: Vec<TypeRef>, ret: TypeRef) -> TypeRef {
        TypeRef::Function {
            params,
            ret: Box::new(ret),
        }
    }
}

/// Resolver state: the stack of generic-parameter frames currently in
/// scope. One instance lives in the [`GlobalNamespace`]; frames are pushed
/// around each generic declaration's signature and body.
#[derive(Debug, Default)]
pub struct GenericResolver {
    frames: Vec<Vec<String>>,
}

impl GenericResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self, names: &[String]) {
        self.frames.push(names.to_vec());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Whether `name` is a generic parameter visible here.
    pub fn is_ambient(&self, name: &str) -> bool {
        self.frames.iter().any(|f| f.iter().any(|n| n == name))
    }

    /// Resolve a type reference to a concrete type.
    ///
    /// Anything that fails to resolve becomes [`Type::Undefined`]; the
    /// analyzer reports the defect at the use site.
    pub fn resolve(&self, ns: &GlobalNamespace, env: &ResolveEnv<'_>, re: &TypeRef) -> Type {
        match re {
            TypeRef::Name(name) => {
                if self.is_ambient(name) {
                    return Type::Param(name.clone());
                }
                if let Some(prim) = Type::primitive(name) {
                    return prim;
                }
                // A bare reference to a generic family leaves its
                // parameters unbound; inference or narrowing fills them in
                // later.
                match self.lookup_named(ns, env, name) {
                    Some(vt) => Type::Variant(vt),
                    None => Type::Undefined,
                }
            }
            TypeRef::Apply { name, args } => {
                // Parameters take no type arguments.
                if self.is_ambient(name) {
                    return Type::Undefined;
                }
                let args: Vec<Type> = args.iter().map(|a| self.resolve(ns, env, a)).collect();
                match self.lookup_named(ns, env, name) {
                    Some(vt) if vt.generic_params.len() == args.len() => {
                        Type::Variant(vt.applied(args))
                    }
                    _ => Type::Undefined,
                }
            }
            TypeRef::Qualified { alias, name, args } => {
                let args: Vec<Type> = args.iter().map(|a| self.resolve(ns, env, a)).collect();
                let Some((module, package)) = env.imports.and_then(|i| i.alias(alias)) else {
                    return Type::Undefined;
                };
                let Some(pkg) = ns.package(module, package) else {
                    return Type::Undefined;
                };
                match pkg.types.reference(name) {
                    Some(vt) if vt.generic_params.len() == args.len() => {
                        Type::Variant(vt.applied(args))
                    }
                    Some(vt) if args.is_empty() => Type::Variant(vt),
                    _ => Type::Undefined,
                }
            }
            TypeRef::Function { params, ret } => {
                let params = params.iter().map(|p| self.resolve(ns, env, p)).collect();
                let ret = self.resolve(ns, env, ret);
                Type::Function(FunctionType::new(params, ret))
            }
        }
    }

    /// A named family or tag: home package registry first, then the
    /// unit's imported type names.
    fn lookup_named(
        &self,
        ns: &GlobalNamespace,
        env: &ResolveEnv<'_>,
        name: &str,
    ) -> Option<VariantType> {
        if let Some(pkg) = ns.package(env.module, env.package) {
            if let Some(vt) = pkg.types.reference(name) {
                return Some(vt);
            }
        }
        let imp = env.imports?.imported(name)?;
        ns.package(&imp.module, &imp.package)?
            .types
            .reference(&imp.original)
    }
}

// ── Call-site unification ──────────────────────────────────────────────

/// A generic-parameter substitution inferred at a call site.
pub type Substitution = FxHashMap<String, Type>;

/// Two different concrete bindings were discovered for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConflict {
    pub param: String,
    pub first: Type,
    pub second: Type,
}

/// Structurally match declared parameter types against supplied argument
/// types, inferring bindings for every generic parameter encountered.
///
/// Positions that disagree without involving a parameter are ignored here;
/// plain type mismatches are the type-equality pass's job.
pub fn match_call_types(declared: &[Type], supplied: &[Type]) -> Result<Substitution, MatchConflict> {
    let mut subst = Substitution::default();
    for (d, s) in declared.iter().zip(supplied.iter()) {
        match_into(d, s, &mut subst)?;
    }
    Ok(subst)
}

fn match_into(declared: &Type, supplied: &Type, subst: &mut Substitution) -> Result<(), MatchConflict> {
    match (declared, supplied) {
        // Unresolved arguments must not poison the substitution.
        (_, Type::Undefined) => Ok(()),
        (Type::Param(name), concrete) => match subst.get(name) {
            Some(bound) if bound != concrete => Err(MatchConflict {
                param: name.clone(),
                first: bound.clone(),
                second: concrete.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                subst.insert(name.clone(), concrete.clone());
                Ok(())
            }
        },
        (Type::Function(d), Type::Function(s)) if d.params.len() == s.params.len() => {
            for (dp, sp) in d.params.iter().zip(s.params.iter()) {
                match_into(dp, sp, subst)?;
            }
            match_into(&d.ret, &s.ret, subst)
        }
        (Type::Variant(d), Type::Variant(s)) if d.name == s.name => {
            for (param, dty) in &d.concrete_params {
                if let Some(sty) = s.concrete_params.get(param) {
                    match_into(dty, sty, subst)?;
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Replace every [`Type::Param`] occurrence bound in `subst`, recursing
/// through function parameter/return positions and nested variant
/// parameter maps. Unbound parameters survive unchanged; the analyzer
/// reports them if they reach a use site.
pub fn instantiate(ty: &Type, subst: &Substitution) -> Type {
    match ty {
        Type::Param(name) => subst.get(name).cloned().unwrap_or_else(|| ty.clone()),
        Type::Function(f) => Type::Function(FunctionType {
            generic_params: f
                .generic_params
                .iter()
                .filter(|p| !subst.contains_key(*p))
                .cloned()
                .collect(),
            params: f.params.iter().map(|p| instantiate(p, subst)).collect(),
            ret: Box::new(instantiate(&f.ret, subst)),
        }),
        Type::Overloaded(set) => Type::Overloaded(crate::ty::OverloadedFunctionType {
            candidates: set
                .candidates
                .iter()
                .map(|c| match instantiate(&Type::Function(c.clone()), subst) {
                    Type::Function(f) => f,
                    _ => unreachable!("instantiating a function yields a function"),
                })
                .collect(),
        }),
        Type::Variant(v) => {
            let mut v = v.clone();
            v.concrete_params = v
                .concrete_params
                .into_iter()
                .map(|(k, t)| {
                    let t = instantiate(&t, subst);
                    (k, t)
                })
                .collect();
            Type::Variant(v)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::VariantType;

    fn list_of(inner: Type) -> Type {
        Type::Variant(
            VariantType::family("std", "core", "List", vec!["T".into()])
                .applied(vec![inner]),
        )
    }

    #[test]
    fn flat_parameter_binds_to_argument() {
        let subst =
            match_call_types(&[Type::Param("T".into())], &[Type::Int]).unwrap();
        assert_eq!(subst.get("T"), Some(&Type::Int));
    }

    #[test]
    fn container_application_recurses() {
        let declared = list_of(Type::Param("T".into()));
        let supplied = list_of(Type::Int);
        let subst = match_call_types(&[declared], &[supplied]).unwrap();
        assert_eq!(subst.get("T"), Some(&Type::Int));
    }

    #[test]
    fn conflicting_bindings_are_an_error() {
        let err = match_call_types(
            &[Type::Param("T".into()), Type::Param("T".into())],
            &[Type::Int, Type::String],
        )
        .unwrap_err();
        assert_eq!(err.param, "T");
        assert_eq!(err.first, Type::Int);
        assert_eq!(err.second, Type::String);
    }

    #[test]
    fn agreeing_rebinding_is_fine() {
        let subst = match_call_types(
            &[Type::Param("T".into()), Type::Param("T".into())],
            &[Type::Int, Type::Int],
        )
        .unwrap();
        assert_eq!(subst.len(), 1);
    }

    #[test]
    fn undefined_arguments_do_not_bind() {
        let subst =
            match_call_types(&[Type::Param("T".into())], &[Type::Undefined]).unwrap();
        assert!(subst.is_empty());
    }

    #[test]
    fn instantiate_reaches_nested_positions() {
        let mut subst = Substitution::default();
        subst.insert("T".into(), Type::Int);
        let ty = Type::function(
            vec![list_of(Type::Param("T".into()))],
            Type::Param("T".into()),
        );
        let inst = instantiate(&ty, &subst);
        assert_eq!(inst, Type::function(vec![list_of(Type::Int)], Type::Int));
        assert!(!inst.mentions_param());
    }

    #[test]
    fn instantiate_consumes_bound_generic_params() {
        let mut subst = Substitution::default();
        subst.insert("T".into(), Type::Int);
        let f = Type::Function(FunctionType::generic(
            vec!["T".into()],
            vec![Type::Param("T".into())],
            Type::Param("T".into()),
        ));
        match instantiate(&f, &subst) {
            Type::Function(f) => {
                assert!(f.generic_params.is_empty());
                assert_eq!(f.params, vec![Type::Int]);
            }
            other => panic!("expected function, got {other:?}"),
        }
    }
}
