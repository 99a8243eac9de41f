//! The module/package namespace.
//!
//! A [`GlobalNamespace`] is the registry of everything a compilation can
//! see: modules, their packages, each package's root scope and type
//! registry, the scope arena itself, and the generic resolver's ambient
//! parameter stack. It is an explicitly constructed value handed to every
//! stage -- never a process-wide singleton -- and it may outlive a single
//! compiled unit so that later units see earlier definitions.
//!
//! Concurrency: the namespace is mutated in place while ASTs are built and
//! read-only during analysis, with no interior locking. Compile independent
//! units on separate threads with separate namespaces; sharing one across
//! threads needs external synchronization.

use rustc_hash::FxHashMap;

use crate::generics::{GenericResolver, TypeRef};
use crate::imports::ImportContext;
use crate::registry::{TypeDef, TypeRegistry, Variant, VariantField};
use crate::scope::{ScopeArena, ScopeId, SymbolKind, Visibility};
use crate::ty::{FunctionType, Type, VariantType};

/// What a package owns: its root scope and its variant-type registry.
#[derive(Debug)]
pub struct PackageDescriptor {
    pub scope: ScopeId,
    pub types: TypeRegistry,
}

#[derive(Debug)]
struct Module {
    packages: FxHashMap<String, PackageDescriptor>,
}

/// Where a type reference is being resolved from: the unit's home package
/// and its import table.
#[derive(Debug, Clone, Copy)]
pub struct ResolveEnv<'a> {
    pub module: &'a str,
    pub package: &'a str,
    pub imports: Option<&'a ImportContext>,
}

/// The registry of modules for one (possibly multi-unit) compilation.
#[derive(Debug, Default)]
pub struct GlobalNamespace {
    modules: FxHashMap<String, Module>,
    pub scopes: ScopeArena,
    resolver: GenericResolver,
}

impl GlobalNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a package, creating the module and the package (with a
    /// fresh root scope and empty type registry) on first reference.
    pub fn get_or_create_package(&mut self, module: &str, package: &str) -> &PackageDescriptor {
        let entry = self
            .modules
            .entry(module.to_owned())
            .or_insert_with(|| Module {
                packages: FxHashMap::default(),
            });
        if !entry.packages.contains_key(package) {
            let scope = self.scopes.alloc(None);
            self.modules
                .get_mut(module)
                .expect("module inserted above")
                .packages
                .insert(
                    package.to_owned(),
                    PackageDescriptor {
                        scope,
                        types: TypeRegistry::new(module, package),
                    },
                );
        }
        &self.modules[module].packages[package]
    }

    pub fn package(&self, module: &str, package: &str) -> Option<&PackageDescriptor> {
        self.modules.get(module)?.packages.get(package)
    }

    /// Make `names` visible as generic parameters for the duration of `f`.
    ///
    /// The AST builder wraps the resolution of each generic declaration's
    /// signature and body in one of these frames.
    pub fn with_type_parameters<R>(
        &mut self,
        names: &[String],
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.resolver.push_frame(names);
        let result = f(self);
        self.resolver.pop_frame();
        result
    }

    /// Resolve a type reference against this namespace and the ambient
    /// generic parameters.
    pub fn resolve_type(&self, re: &TypeRef, env: &ResolveEnv<'_>) -> Type {
        self.resolver.resolve(self, env, re)
    }

    /// Define a batch of variant types in `module.package`.
    ///
    /// Two passes: first every definition is registered as a bare shell
    /// (claiming its family name and tags), then each constructor's field
    /// types are resolved with the family's own generic parameters in
    /// scope -- so definitions in one batch may be mutually recursive. A
    /// constructor function symbol is synthesized into the package scope
    /// per variant.
    pub fn define_types(
        &mut self,
        module: &str,
        package: &str,
        defs: &[TypeDef],
        imports: Option<&ImportContext>,
    ) {
        self.get_or_create_package(module, package);

        let pkg = self.package_mut(module, package);
        for def in defs {
            pkg.types.insert_shell(def);
        }

        for def in defs {
            self.resolver.push_frame(&def.generic_params);
            let env = ResolveEnv { module, package, imports };
            let variants: Vec<Variant> = def
                .constructors
                .iter()
                .map(|ctor| Variant {
                    tag: ctor.tag.clone(),
                    fields: ctor
                        .fields
                        .iter()
                        .map(|(name, re)| VariantField {
                            name: name.clone(),
                            ty: self.resolver.resolve(self, &env, re),
                        })
                        .collect(),
                })
                .collect();
            self.resolver.pop_frame();

            let pkg = self.package_mut(module, package);
            pkg.types.attach_variants(&def.name, variants.clone());
            let pkg_scope = pkg.scope;

            for variant in &variants {
                let constructed = VariantType {
                    module: module.to_owned(),
                    package: package.to_owned(),
                    name: def.name.clone(),
                    generic_params: def.generic_params.clone(),
                    concrete_params: def
                        .generic_params
                        .iter()
                        .map(|p| (p.clone(), Type::Param(p.clone())))
                        .collect(),
                    selected: Some(variant.tag.clone()),
                };
                let ctor = FunctionType::generic(
                    def.generic_params.clone(),
                    variant.fields.iter().map(|f| f.ty.clone()).collect(),
                    Type::Variant(constructed),
                );
                self.scopes.add_symbol(
                    pkg_scope,
                    variant.tag.clone(),
                    Type::Function(ctor),
                    SymbolKind::Package,
                    Visibility::Public,
                    false,
                );
            }
        }
    }

    fn package_mut(&mut self, module: &str, package: &str) -> &mut PackageDescriptor {
        self.modules
            .get_mut(module)
            .and_then(|m| m.packages.get_mut(package))
            .expect("package created before mutation")
    }
}

/// The identifier-dot-identifier grammar module and package names must
/// satisfy.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_identifier)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ConstructorDef;

    #[test]
    fn packages_are_created_lazily_and_reused() {
        let mut ns = GlobalNamespace::new();
        assert!(ns.package("demo", "geometry").is_none());
        let scope = ns.get_or_create_package("demo", "geometry").scope;
        assert_eq!(ns.get_or_create_package("demo", "geometry").scope, scope);
        assert!(ns.scopes.is_top_level(scope));
    }

    #[test]
    fn name_grammar() {
        assert!(is_valid_name("std"));
        assert!(is_valid_name("acme.collections"));
        assert!(is_valid_name("_private"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1st"));
        assert!(!is_valid_name("a..b"));
        assert!(!is_valid_name("a.b."));
        assert!(!is_valid_name("has space"));
    }

    #[test]
    fn define_types_allows_mutual_recursion_across_siblings() {
        let mut ns = GlobalNamespace::new();
        let defs = vec![
            TypeDef {
                name: "Expr".into(),
                generic_params: vec![],
                constructors: vec![
                    ConstructorDef {
                        tag: "Lit".into(),
                        fields: vec![("value".into(), TypeRef::name("int"))],
                    },
                    ConstructorDef {
                        tag: "Grouped".into(),
                        fields: vec![("inner".into(), TypeRef::name("Block"))],
                    },
                ],
            },
            TypeDef {
                name: "Block".into(),
                generic_params: vec![],
                constructors: vec![ConstructorDef {
                    tag: "Block".into(),
                    fields: vec![("last".into(), TypeRef::name("Expr"))],
                }],
            },
        ];
        ns.define_types("demo", "lang", &defs, None);
        let pkg = ns.package("demo", "lang").unwrap();
        let grouped = pkg.types.def("Expr").unwrap().variant("Grouped").unwrap();
        match &grouped.fields[0].ty {
            Type::Variant(vt) => assert_eq!(vt.name, "Block"),
            other => panic!("expected variant type, got {other:?}"),
        }
    }

    #[test]
    fn constructors_become_package_symbols() {
        let mut ns = GlobalNamespace::new();
        let defs = vec![TypeDef {
            name: "Option".into(),
            generic_params: vec!["T".into()],
            constructors: vec![
                ConstructorDef {
                    tag: "Some".into(),
                    fields: vec![("value".into(), TypeRef::name("T"))],
                },
                ConstructorDef { tag: "None".into(), fields: vec![] },
            ],
        }];
        ns.define_types("std", "core", &defs, None);
        let scope = ns.package("std", "core").unwrap().scope;
        let some = ns.scopes.symbol(scope, "Some").unwrap();
        match &some.ty {
            Type::Function(f) => {
                assert_eq!(f.generic_params, vec!["T".to_owned()]);
                assert_eq!(f.params, vec![Type::Param("T".into())]);
                assert_eq!(f.ret.to_string(), "Option[T]/Some");
            }
            other => panic!("expected constructor function, got {other:?}"),
        }
        assert!(ns.scopes.symbol(scope, "None").is_some());
    }

    #[test]
    fn resolve_prefers_ambient_parameters_over_registry() {
        let mut ns = GlobalNamespace::new();
        // A package type named `T` must lose to an ambient parameter `T`.
        ns.define_types(
            "demo",
            "lang",
            &[TypeDef {
                name: "T".into(),
                generic_params: vec![],
                constructors: vec![ConstructorDef { tag: "T".into(), fields: vec![] }],
            }],
            None,
        );
        let env = ResolveEnv { module: "demo", package: "lang", imports: None };
        let outside = ns.resolve_type(&TypeRef::name("T"), &env);
        assert!(matches!(outside, Type::Variant(_)));
        ns.with_type_parameters(&["T".into()], |ns| {
            let inside = ns.resolve_type(&TypeRef::name("T"), &env);
            assert_eq!(inside, Type::Param("T".into()));
        });
        // Popped: back to the registry type.
        let after = ns.resolve_type(&TypeRef::name("T"), &env);
        assert!(matches!(after, Type::Variant(_)));
    }
}
