//! Scenario tests for variant (sum) types.
//!
//! These exercise:
//! - Two-pass definition and constructor synthesis through the namespace
//! - Construction via synthesized constructors with inference
//! - `is`-narrowing: member access allowed inside the guarded branch only
//! - Field lookup against narrowed instances, with generic instantiation
//! - Single-variant families being field-addressable by default

use tarn_common::Span;
use tarn_sema::ast::{Ast, NodeId, NodeKind};
use tarn_sema::generics::TypeRef;
use tarn_sema::registry::{ConstructorDef, TypeDef};
use tarn_sema::scope::{ScopeId, SymbolKind, Visibility};
use tarn_sema::{
    analyze, Diagnostic, DiagnosticKind, GlobalNamespace, ImportContext, ResolveEnv, Type,
};

// ── Helpers ────────────────────────────────────────────────────────────

struct Unit {
    ns: GlobalNamespace,
    imports: ImportContext,
    ast: Ast,
    root: ScopeId,
    items: Vec<NodeId>,
    cursor: u32,
}

impl Unit {
    fn new() -> Self {
        let mut ns = GlobalNamespace::new();
        let root = ns.get_or_create_package("app", "main").scope;
        Unit {
            ns,
            imports: ImportContext::new("app", "main"),
            ast: Ast::new(),
            root,
            items: Vec::new(),
            cursor: 0,
        }
    }

    /// `data Option[T] = Some(value: T) | None` in the home package.
    fn with_option(mut self) -> Self {
        self.ns.define_types(
            "app",
            "main",
            &[TypeDef {
                name: "Option".into(),
                generic_params: vec!["T".into()],
                constructors: vec![
                    ConstructorDef {
                        tag: "Some".into(),
                        fields: vec![("value".into(), TypeRef::name("T"))],
                    },
                    ConstructorDef { tag: "None".into(), fields: vec![] },
                ],
            }],
            None,
        );
        self
    }

    fn resolve(&self, re: &TypeRef) -> Type {
        let env = ResolveEnv {
            module: "app",
            package: "main",
            imports: Some(&self.imports),
        };
        self.ns.resolve_type(re, &env)
    }

    fn span(&mut self) -> Span {
        self.cursor += 2;
        Span::new(self.cursor - 2, self.cursor - 1)
    }

    fn push_in(&mut self, kind: NodeKind, scope: ScopeId) -> NodeId {
        let span = self.span();
        self.ast.push(kind, span, scope)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let root = self.root;
        self.push_in(kind, root)
    }

    fn declare(&mut self, name: &str, ty: Type, mutable: bool) {
        self.ns
            .scopes
            .add_symbol(self.root, name, ty, SymbolKind::Local, Visibility::Private, mutable);
    }

    fn call(&mut self, name: &str, type_args: Vec<Type>, args: Vec<NodeId>) -> NodeId {
        let callee = self.push(NodeKind::Name(name.into()));
        self.push(NodeKind::Call { callee, type_args, args })
    }

    fn finish(mut self) -> Vec<Diagnostic> {
        let items = std::mem::take(&mut self.items);
        let root = self.push(NodeKind::Block { items });
        analyze(&self.ast, root, &self.ns, &self.imports)
    }
}

// ── Construction ───────────────────────────────────────────────────────

/// `val x: Option[int] = Some(5)`: constructor inference produces the
/// narrowed instance, which widens to the annotated family.
#[test]
fn constructor_call_widens_to_the_family() {
    let mut unit = Unit::new().with_option();
    let option_int = unit.resolve(&TypeRef::apply("Option", vec![TypeRef::name("int")]));
    let five = unit.push(NodeKind::IntLit(5));
    let call = unit.call("Some", Vec::new(), vec![five]);
    let node = unit.push(NodeKind::Let {
        name: "x".into(),
        mutable: false,
        declared: Some(option_int),
        value: call,
    });
    unit.items.push(node);
    assert_eq!(unit.finish(), Vec::new());
}

/// The constructor's field type participates in checking: a wrongly
/// parameterized annotation is a single mismatch.
#[test]
fn constructor_inference_is_checked_against_the_annotation() {
    let mut unit = Unit::new().with_option();
    let option_string =
        unit.resolve(&TypeRef::apply("Option", vec![TypeRef::name("string")]));
    let five = unit.push(NodeKind::IntLit(5));
    let call = unit.call("Some", Vec::new(), vec![five]);
    let node = unit.push(NodeKind::Let {
        name: "x".into(),
        mutable: false,
        declared: Some(option_string),
        value: call,
    });
    unit.items.push(node);
    let diags = unit.finish();
    assert_eq!(diags.len(), 1, "got: {diags:?}");
    assert!(matches!(diags[0].kind, DiagnosticKind::TypeMismatch { .. }));
}

/// A nullary constructor needs an explicit type argument; with one it is
/// clean, without one the unresolved parameter is surfaced.
#[test]
fn nullary_constructor_needs_explicit_argument() {
    let mut unit = Unit::new().with_option();
    let option_int = unit.resolve(&TypeRef::apply("Option", vec![TypeRef::name("int")]));
    let call = unit.call("None", vec![Type::Int], Vec::new());
    let node = unit.push(NodeKind::Let {
        name: "x".into(),
        mutable: false,
        declared: Some(option_int),
        value: call,
    });
    unit.items.push(node);
    assert_eq!(unit.finish(), Vec::new());

    let mut unit = Unit::new().with_option();
    let call = unit.call("None", Vec::new(), Vec::new());
    unit.items.push(call);
    let diags = unit.finish();
    assert_eq!(diags.len(), 1, "got: {diags:?}");
    assert!(matches!(
        diags[0].kind,
        DiagnosticKind::UnsupportedConstruct { .. }
    ));
}

// ── Narrowing & member access ──────────────────────────────────────────

/// `x.value` on the un-narrowed family is rejected; the same access
/// inside an `x is Some` branch (whose scope carries the narrowed fact)
/// is clean and instantiates the field to int.
#[test]
fn member_access_requires_narrowing() {
    // Outside any narrowing branch.
    let mut unit = Unit::new().with_option();
    let option_int = unit.resolve(&TypeRef::apply("Option", vec![TypeRef::name("int")]));
    unit.declare("x", option_int.clone(), false);
    let xref = unit.push(NodeKind::Name("x".into()));
    let access = unit.push(NodeKind::Field { receiver: xref, member: "value".into() });
    unit.items.push(access);
    let diags = unit.finish();
    assert_eq!(diags.len(), 1, "got: {diags:?}");
    match &diags[0].kind {
        DiagnosticKind::ExpectedVariantType { found } => {
            assert_eq!(found.to_string(), "Option[int]");
        }
        other => panic!("expected ExpectedVariantType, got {other:?}"),
    }

    // Inside the guarded branch, with the builder-attached fact.
    let mut unit = Unit::new().with_option();
    let option_int = unit.resolve(&TypeRef::apply("Option", vec![TypeRef::name("int")]));
    unit.declare("x", option_int.clone(), false);
    let branch = unit.ns.scopes.alloc(Some(unit.root));
    let Type::Variant(family) = &option_int else {
        panic!("expected a variant type");
    };
    unit.ns
        .scopes
        .add_fact(branch, "x", Type::Variant(family.narrowed("Some")));
    let cond = unit.push(NodeKind::Is { name: "x".into(), tag: "Some".into() });
    let xref = unit.push_in(NodeKind::Name("x".into()), branch);
    let access =
        unit.push_in(NodeKind::Field { receiver: xref, member: "value".into() }, branch);
    let bind = unit.push_in(
        NodeKind::Let {
            name: "v".into(),
            mutable: false,
            declared: Some(Type::Int),
            value: access,
        },
        branch,
    );
    let body = unit.push_in(NodeKind::Block { items: vec![bind] }, branch);
    let guarded = unit.push(NodeKind::If { cond, then_branch: body, else_branch: None });
    unit.items.push(guarded);
    assert_eq!(unit.finish(), Vec::new());
}

/// A field the narrowed variant does not have is reported by name.
#[test]
fn unknown_member_on_narrowed_variant() {
    let mut unit = Unit::new().with_option();
    let option_int = unit.resolve(&TypeRef::apply("Option", vec![TypeRef::name("int")]));
    let Type::Variant(family) = &option_int else {
        panic!("expected a variant type");
    };
    unit.declare("x", Type::Variant(family.narrowed("Some")), false);
    let xref = unit.push(NodeKind::Name("x".into()));
    let access = unit.push(NodeKind::Field { receiver: xref, member: "contents".into() });
    unit.items.push(access);
    let diags = unit.finish();
    assert_eq!(diags.len(), 1, "got: {diags:?}");
    match &diags[0].kind {
        DiagnosticKind::MemberDoesNotExist { ty, member } => {
            assert_eq!(ty.to_string(), "Option[int]/Some");
            assert_eq!(member, "contents");
        }
        other => panic!("expected MemberDoesNotExist, got {other:?}"),
    }
}

/// Member access on a non-variant receiver is a capability error.
#[test]
fn member_access_on_primitive_receiver() {
    let mut unit = Unit::new();
    unit.declare("n", Type::Int, false);
    let nref = unit.push(NodeKind::Name("n".into()));
    let access = unit.push(NodeKind::Field { receiver: nref, member: "value".into() });
    unit.items.push(access);
    let diags = unit.finish();
    assert_eq!(diags.len(), 1, "got: {diags:?}");
    assert!(matches!(
        diags[0].kind,
        DiagnosticKind::ExpectedVariantType { found: Type::Int }
    ));
}

// ── Single-variant families ────────────────────────────────────────────

/// `data Point = Point(x: int, y: int)` is field-addressable without any
/// narrowing: the lone variant is selected by default.
#[test]
fn single_variant_family_is_field_addressable() {
    let mut unit = Unit::new();
    unit.ns.define_types(
        "app",
        "main",
        &[TypeDef {
            name: "Point".into(),
            generic_params: vec![],
            constructors: vec![ConstructorDef {
                tag: "Point".into(),
                fields: vec![
                    ("x".into(), TypeRef::name("int")),
                    ("y".into(), TypeRef::name("int")),
                ],
            }],
        }],
        None,
    );
    let point = unit.resolve(&TypeRef::name("Point"));
    let one = unit.push(NodeKind::IntLit(1));
    let two = unit.push(NodeKind::IntLit(2));
    let ctor = unit.call("Point", Vec::new(), vec![one, two]);
    let bind = unit.push(NodeKind::Let {
        name: "p".into(),
        mutable: false,
        declared: Some(point.clone()),
        value: ctor,
    });
    unit.items.push(bind);
    unit.declare("p", point, false);
    let pref = unit.push(NodeKind::Name("p".into()));
    let access = unit.push(NodeKind::Field { receiver: pref, member: "x".into() });
    let use_it = unit.push(NodeKind::Let {
        name: "x0".into(),
        mutable: false,
        declared: Some(Type::Int),
        value: access,
    });
    unit.items.push(use_it);
    assert_eq!(unit.finish(), Vec::new());
}
