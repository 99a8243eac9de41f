//! The semantic analyzer.
//!
//! Analysis happens after the AST is fully built: a typing walk first
//! computes every node's static type into a side table (emitting nothing),
//! then each diagnostic pass runs independently over every node in
//! post-order, appending to one flat list. A later pass still runs on nodes
//! an earlier pass flagged, so every pass tolerates `Undefined` and
//! partially-resolved types; user input never panics the analyzer --
//! internal defects surface as `UnsupportedConstruct` diagnostics.

use rustc_hash::FxHashMap;

use crate::ast::{Ast, NodeId, NodeKind, PrefixOp};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::generics::{instantiate, match_call_types, Substitution};
use crate::imports::{ImportContext, ImportRequest};
use crate::namespace::{is_valid_name, GlobalNamespace};
use crate::scope::ScopeId;
use crate::ty::{is_subtype, FunctionType, Type};

/// Run every analysis pass over the tree rooted at `root`.
///
/// Pure apart from reading scopes and the namespace; always returns the
/// full (possibly empty) diagnostic list.
pub fn analyze(
    ast: &Ast,
    root: NodeId,
    ns: &GlobalNamespace,
    imports: &ImportContext,
) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    check_unit(ns, imports, &mut diags);

    let ctx = Context::build(ast, root, ns, imports);
    for pass in PASSES {
        for &id in &ctx.order {
            pass(&ctx, id, &mut diags);
        }
    }
    diags
}

// ── Shared pass context ────────────────────────────────────────────────

struct Context<'a> {
    ast: &'a Ast,
    ns: &'a GlobalNamespace,
    imports: &'a ImportContext,
    /// Post-order over the analyzed tree; every pass iterates this.
    order: Vec<NodeId>,
    /// The typing walk's result: each node's static type.
    types: FxHashMap<NodeId, Type>,
}

impl<'a> Context<'a> {
    fn build(
        ast: &'a Ast,
        root: NodeId,
        ns: &'a GlobalNamespace,
        imports: &'a ImportContext,
    ) -> Self {
        let order = ast.post_order(root);
        let mut ctx = Context {
            ast,
            ns,
            imports,
            order: Vec::new(),
            types: FxHashMap::default(),
        };
        // Children precede parents in `order`, so each node can read its
        // children's types from the table.
        for &id in &order {
            let ty = ctx.type_of_node(id);
            ctx.types.insert(id, ty);
        }
        ctx.order = order;
        ctx
    }

    fn ty(&self, id: NodeId) -> &Type {
        self.types.get(&id).unwrap_or(&Type::Undefined)
    }

    /// Resolve a value name seen from `scope`: enclosing local frames
    /// first, then the import table, then the unit's package root scope.
    fn lookup_value(&self, scope: ScopeId, name: &str) -> Option<Type> {
        let scopes = &self.ns.scopes;
        let mut cursor = Some(scope);
        let mut root_frame = None;
        while let Some(sid) = cursor {
            if scopes.is_top_level(sid) {
                root_frame = Some(sid);
                break;
            }
            if let Some(ty) = scopes.type_in_frame(sid, name) {
                return Some(ty);
            }
            cursor = scopes.parent(sid);
        }
        self.imports
            .resolve_value(self.ns, name)
            .or_else(|| root_frame.and_then(|sid| scopes.type_in_frame(sid, name)))
    }

    /// Dotted access through a package alias.
    fn lookup_aliased(&self, alias: &str, name: &str) -> Option<Type> {
        let (module, package) = self.imports.alias(alias)?;
        let pkg = self.ns.package(module, package)?;
        let sym = self.ns.scopes.symbol_directly(pkg.scope, name)?;
        (sym.visibility == crate::scope::Visibility::Public).then(|| sym.ty.clone())
    }

    // ── Typing walk ────────────────────────────────────────────────────

    fn type_of_node(&self, id: NodeId) -> Type {
        let node = self.ast.node(id);
        match &node.kind {
            NodeKind::UnitLit => Type::Unit,
            NodeKind::IntLit(_) => Type::Int,
            NodeKind::FloatLit(_) => Type::Float,
            NodeKind::BoolLit(_) => Type::Bool,
            NodeKind::StringLit(_) => Type::String,
            NodeKind::Name(name) => {
                self.lookup_value(node.scope, name).unwrap_or(Type::Undefined)
            }
            NodeKind::PackageAccess { alias, name } => {
                self.lookup_aliased(alias, name).unwrap_or(Type::Undefined)
            }
            NodeKind::Let { .. } | NodeKind::Assign { .. } => Type::Unit,
            NodeKind::Block { items } => items
                .last()
                .map(|last| self.ty(*last).clone())
                .unwrap_or(Type::Unit),
            NodeKind::If { then_branch, else_branch, .. } => match else_branch {
                // Branch disagreement is the branch pass's business; the
                // joined type follows the then branch.
                Some(_) => self.ty(*then_branch).clone(),
                None => Type::Unit,
            },
            NodeKind::Is { .. } => Type::Bool,
            NodeKind::Call { callee, type_args, args } => {
                self.call_result(*callee, type_args, args)
            }
            NodeKind::Field { receiver, member } => self
                .member_type(self.ty(*receiver), member)
                .unwrap_or(Type::Undefined),
            NodeKind::Infix { op, lhs, .. } => {
                if op.yields_bool() {
                    Type::Bool
                } else {
                    self.ty(*lhs).clone()
                }
            }
            NodeKind::Prefix { op, operand } => match op {
                PrefixOp::Not => Type::Bool,
                PrefixOp::Neg => self.ty(*operand).clone(),
            },
            NodeKind::Cast { target, .. } => target.clone(),
            NodeKind::FnDef { ty, .. } => Type::Function(ty.clone()),
        }
    }

    fn call_result(&self, callee: NodeId, type_args: &[Type], args: &[NodeId]) -> Type {
        let arg_tys: Vec<Type> = args.iter().map(|a| self.ty(*a).clone()).collect();
        match self.ty(callee) {
            Type::Function(f) => {
                let (subst, _) = generic_binding(f, type_args, &arg_tys);
                instantiate(&f.ret, &subst)
            }
            Type::Overloaded(set) => match set.matching(&arg_tys).as_slice() {
                [only] => (*only.ret).clone(),
                _ => Type::Undefined,
            },
            _ => Type::Undefined,
        }
    }

    /// A member's type on a narrowed variant receiver, instantiated with
    /// the receiver's concrete parameters.
    fn member_type(&self, receiver: &Type, member: &str) -> Option<Type> {
        let Type::Variant(vt) = receiver else {
            return None;
        };
        let pkg = self.ns.package(&vt.module, &vt.package)?;
        let field = pkg.types.field_type(vt, member)?;
        let subst: Substitution = vt
            .concrete_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(instantiate(field, &subst))
    }
}

/// A human-usable label for a call's callee, for diagnostics.
fn callee_label(ast: &Ast, callee: NodeId) -> String {
    match &ast.node(callee).kind {
        NodeKind::Name(name) => name.clone(),
        NodeKind::PackageAccess { alias, name } => format!("{alias}.{name}"),
        NodeKind::Field { member, .. } => member.clone(),
        _ => "<expression>".to_owned(),
    }
}

/// Merge explicit type arguments with argument-driven inference.
///
/// Explicit arguments always win; a disagreement with an inferred binding,
/// like two conflicting inferred bindings, produces a
/// [`DiagnosticKind::GenericTypeMismatch`] naming the parameter.
fn generic_binding(
    f: &FunctionType,
    type_args: &[Type],
    arg_tys: &[Type],
) -> (Substitution, Vec<DiagnosticKind>) {
    let mut issues = Vec::new();

    let inferred = match match_call_types(&f.params, arg_tys) {
        Ok(subst) => subst,
        Err(conflict) => {
            issues.push(DiagnosticKind::GenericTypeMismatch {
                param: conflict.param,
                expected: conflict.first,
                found: conflict.second,
            });
            Substitution::default()
        }
    };

    let mut subst = inferred.clone();
    if type_args.len() == f.generic_params.len() {
        for (param, explicit) in f.generic_params.iter().zip(type_args.iter()) {
            if let Some(inferred_ty) = inferred.get(param) {
                if inferred_ty != explicit {
                    issues.push(DiagnosticKind::GenericTypeMismatch {
                        param: param.clone(),
                        expected: explicit.clone(),
                        found: inferred_ty.clone(),
                    });
                }
            }
            subst.insert(param.clone(), explicit.clone());
        }
    }
    (subst, issues)
}

// ── Unit-level checks ──────────────────────────────────────────────────

/// Validate the unit's own identity and every user-written import clause.
fn check_unit(ns: &GlobalNamespace, imports: &ImportContext, diags: &mut Vec<Diagnostic>) {
    if !is_valid_name(&imports.module) {
        diags.push(Diagnostic::unspanned(DiagnosticKind::InvalidModuleName {
            name: imports.module.clone(),
        }));
    }
    if !is_valid_name(&imports.package) {
        diags.push(Diagnostic::unspanned(DiagnosticKind::InvalidPackageName {
            name: imports.package.clone(),
        }));
    }
    for request in imports.requests() {
        match request {
            ImportRequest::Names { module, package, names, span } => {
                let mut target_ok = true;
                if !is_valid_name(module) {
                    target_ok = false;
                    push_at(diags, DiagnosticKind::InvalidModuleName { name: module.clone() }, *span);
                }
                if !is_valid_name(package) {
                    target_ok = false;
                    push_at(diags, DiagnosticKind::InvalidPackageName { name: package.clone() }, *span);
                }
                if !target_ok {
                    continue;
                }
                for name in names {
                    if !package_exports(ns, module, package, name) {
                        push_at(
                            diags,
                            DiagnosticKind::InvalidImport {
                                module: module.clone(),
                                package: package.clone(),
                                name: name.clone(),
                            },
                            *span,
                        );
                    }
                }
            }
            ImportRequest::Alias { module, package, span, .. } => {
                if !is_valid_name(module) {
                    push_at(diags, DiagnosticKind::InvalidModuleName { name: module.clone() }, *span);
                }
                if !is_valid_name(package) {
                    push_at(diags, DiagnosticKind::InvalidPackageName { name: package.clone() }, *span);
                }
            }
        }
    }
}

fn push_at(diags: &mut Vec<Diagnostic>, kind: DiagnosticKind, span: Option<tarn_common::Span>) {
    diags.push(match span {
        Some(span) => Diagnostic::new(kind, span),
        None => Diagnostic::unspanned(kind),
    });
}

/// Whether `name` is importable from `module.package`: a registered
/// variant family, or a public symbol in the package root scope.
fn package_exports(ns: &GlobalNamespace, module: &str, package: &str, name: &str) -> bool {
    let Some(pkg) = ns.package(module, package) else {
        return false;
    };
    if pkg.types.contains(name) {
        return true;
    }
    match ns.scopes.symbol_directly(pkg.scope, name) {
        Some(sym) => sym.visibility == crate::scope::Visibility::Public,
        None => false,
    }
}

// ── Node passes ────────────────────────────────────────────────────────

type Pass = fn(&Context<'_>, NodeId, &mut Vec<Diagnostic>);

/// Every node pass, in reporting order. Each is independent: it reads the
/// shared typing table and appends diagnostics, nothing else.
const PASSES: &[Pass] = &[
    pass_names,
    pass_arity,
    pass_overloads,
    pass_callability,
    pass_generics,
    pass_return_presence,
    pass_type_equality,
    pass_branches,
    pass_mutability,
    pass_members,
];

/// Name resolution: every referenced name must be visible.
fn pass_names(ctx: &Context<'_>, id: NodeId, diags: &mut Vec<Diagnostic>) {
    let node = ctx.ast.node(id);
    let missing = match &node.kind {
        NodeKind::Name(name) if ctx.lookup_value(node.scope, name).is_none() => {
            Some(name.clone())
        }
        NodeKind::PackageAccess { alias, name }
            if ctx.lookup_aliased(alias, name).is_none() =>
        {
            Some(format!("{alias}.{name}"))
        }
        NodeKind::Assign { name, .. } | NodeKind::Is { name, .. }
            if ctx.lookup_value(node.scope, name).is_none() =>
        {
            Some(name.clone())
        }
        _ => None,
    };
    if let Some(name) = missing {
        diags.push(Diagnostic::new(
            DiagnosticKind::UnrecognizedName { name },
            node.span,
        ));
    }
}

/// Arity of plain (non-overloaded) calls.
fn pass_arity(ctx: &Context<'_>, id: NodeId, diags: &mut Vec<Diagnostic>) {
    let node = ctx.ast.node(id);
    let NodeKind::Call { callee, args, .. } = &node.kind else {
        return;
    };
    let Type::Function(f) = ctx.ty(*callee) else {
        return;
    };
    if f.params.len() != args.len() {
        diags.push(Diagnostic::new(
            DiagnosticKind::FunctionArityError {
                name: callee_label(ctx.ast, *callee),
                expected: f.params.len(),
                actual: args.len(),
            },
            node.span,
        ));
    }
}

/// Overload resolution: exactly one candidate must match the argument
/// tuple. Zero and two-plus matches are both reported, listing the
/// candidate shapes.
fn pass_overloads(ctx: &Context<'_>, id: NodeId, diags: &mut Vec<Diagnostic>) {
    let node = ctx.ast.node(id);
    let NodeKind::Call { callee, args, .. } = &node.kind else {
        return;
    };
    let Type::Overloaded(set) = ctx.ty(*callee) else {
        return;
    };
    let arg_tys: Vec<Type> = args.iter().map(|a| ctx.ty(*a).clone()).collect();
    // An unresolved argument would mis-blame the overload set.
    if arg_tys.iter().any(|t| *t == Type::Undefined) {
        return;
    }
    let matching = set.matching(&arg_tys);
    let kind = match matching.len() {
        1 => return,
        0 => DiagnosticKind::NoCandidatesForFunction {
            name: callee_label(ctx.ast, *callee),
            supplied: arg_tys,
            candidates: set.candidates.clone(),
        },
        _ => DiagnosticKind::AmbiguousOverload {
            name: callee_label(ctx.ast, *callee),
            candidates: matching.into_iter().cloned().collect(),
        },
    };
    diags.push(Diagnostic::new(kind, node.span));
}

/// Callability: only function-typed values may be called.
fn pass_callability(ctx: &Context<'_>, id: NodeId, diags: &mut Vec<Diagnostic>) {
    let node = ctx.ast.node(id);
    let NodeKind::Call { callee, .. } = &node.kind else {
        return;
    };
    match ctx.ty(*callee) {
        Type::Function(_) | Type::Overloaded(_) => {}
        // An unresolved callee was already reported by name resolution.
        Type::Undefined => {}
        found => diags.push(Diagnostic::new(
            DiagnosticKind::NotAFunction {
                callee: callee_label(ctx.ast, *callee),
                found: found.clone(),
            },
            node.span,
        )),
    }
}

/// Generic arity and substitution agreement at call sites.
fn pass_generics(ctx: &Context<'_>, id: NodeId, diags: &mut Vec<Diagnostic>) {
    let node = ctx.ast.node(id);
    let NodeKind::Call { callee, type_args, args } = &node.kind else {
        return;
    };
    let Type::Function(f) = ctx.ty(*callee) else {
        return;
    };
    if !type_args.is_empty() && type_args.len() != f.generic_params.len() {
        diags.push(Diagnostic::new(
            DiagnosticKind::GenericTypeArityError {
                name: callee_label(ctx.ast, *callee),
                expected: f.generic_params.len(),
                actual: type_args.len(),
            },
            node.span,
        ));
        return;
    }
    if f.generic_params.is_empty() {
        return;
    }
    let arg_tys: Vec<Type> = args.iter().map(|a| ctx.ty(*a).clone()).collect();
    let (subst, issues) = generic_binding(f, type_args, &arg_tys);
    let conflicted = !issues.is_empty();
    for kind in issues {
        diags.push(Diagnostic::new(kind, node.span));
    }
    // A parameter no binding reached would cross the code-generator
    // boundary unresolved; surface it instead of crashing later. A call
    // whose bindings already conflicted is reported once, above.
    if !conflicted
        && arg_tys.iter().all(|t| *t != Type::Undefined)
        && instantiate(&f.ret, &subst).mentions_param()
    {
        diags.push(Diagnostic::new(
            DiagnosticKind::UnsupportedConstruct {
                detail: format!(
                    "cannot resolve the type parameters of `{}` at this call",
                    callee_label(ctx.ast, *callee)
                ),
            },
            node.span,
        ));
    }
}

/// A non-unit return type requires a body to produce it.
fn pass_return_presence(ctx: &Context<'_>, id: NodeId, diags: &mut Vec<Diagnostic>) {
    let node = ctx.ast.node(id);
    let NodeKind::FnDef { name, ty, body, .. } = &node.kind else {
        return;
    };
    if *ty.ret == Type::Unit {
        return;
    }
    let body_empty = match body {
        None => true,
        Some(b) => matches!(&ctx.ast.node(*b).kind, NodeKind::Block { items } if items.is_empty()),
    };
    if body_empty {
        diags.push(Diagnostic::new(
            DiagnosticKind::MissingReturnValue {
                function: name.clone(),
                declared: (*ty.ret).clone(),
            },
            node.span,
        ));
    }
}

/// Whether `actual` may appear where `expected` is required: equal types,
/// a widening edge, or a narrowed variant where its family is expected.
/// `Any` and `Undefined` are compatible with everything.
fn assignable(expected: &Type, actual: &Type) -> bool {
    if matches!(expected, Type::Undefined | Type::Any)
        || matches!(actual, Type::Undefined | Type::Any)
    {
        return true;
    }
    // An uninstantiated parameter anywhere means generic resolution
    // already failed and reported; do not pile a mismatch on top.
    if expected.mentions_param() || actual.mentions_param() {
        return true;
    }
    if expected == actual || is_subtype(actual, expected) {
        return true;
    }
    if let (Type::Variant(e), Type::Variant(a)) = (expected, actual) {
        if e.selected.is_none() && a.selected.is_some() {
            let mut widened = a.clone();
            widened.selected = None;
            return *e == widened;
        }
    }
    false
}

/// Type equality at every checked position.
fn pass_type_equality(ctx: &Context<'_>, id: NodeId, diags: &mut Vec<Diagnostic>) {
    let node = ctx.ast.node(id);
    let expect = |expected: &Type, actual: &Type, diags: &mut Vec<Diagnostic>| {
        if !assignable(expected, actual) {
            diags.push(Diagnostic::new(
                DiagnosticKind::TypeMismatch {
                    expected: expected.clone(),
                    found: actual.clone(),
                },
                node.span,
            ));
        }
    };
    match &node.kind {
        NodeKind::Let { declared: Some(declared), value, .. } => {
            expect(declared, ctx.ty(*value), diags);
        }
        NodeKind::Assign { name, value } => {
            // Checked against the declared binding, not any narrowed fact.
            if let Some(sym) = ctx.ns.scopes.symbol(node.scope, name) {
                expect(&sym.ty.clone(), ctx.ty(*value), diags);
            }
        }
        NodeKind::Call { callee, type_args, args } => {
            let Type::Function(f) = ctx.ty(*callee) else {
                return;
            };
            let arg_tys: Vec<Type> = args.iter().map(|a| ctx.ty(*a).clone()).collect();
            let (subst, _) = generic_binding(f, type_args, &arg_tys);
            for (param, arg) in f.params.iter().zip(arg_tys.iter()) {
                expect(&instantiate(param, &subst), arg, diags);
            }
        }
        NodeKind::Infix { lhs, rhs, .. } => {
            expect(ctx.ty(*lhs), ctx.ty(*rhs), diags);
        }
        NodeKind::Prefix { op: PrefixOp::Not, operand } => {
            expect(&Type::Bool, ctx.ty(*operand), diags);
        }
        NodeKind::Cast { target, .. } => {
            expect(&Type::Bool, target, diags);
        }
        _ => {}
    }
}

/// If/else agreement, independent of (and in addition to) the generic
/// type-equality pass.
fn pass_branches(ctx: &Context<'_>, id: NodeId, diags: &mut Vec<Diagnostic>) {
    let node = ctx.ast.node(id);
    let NodeKind::If { then_branch, else_branch: Some(else_branch), .. } = &node.kind else {
        return;
    };
    let then_ty = ctx.ty(*then_branch);
    let else_ty = ctx.ty(*else_branch);
    if *then_ty == Type::Undefined || *else_ty == Type::Undefined {
        return;
    }
    if then_ty != else_ty {
        diags.push(Diagnostic::new(
            DiagnosticKind::IfElseBranchesTypeMismatch {
                then_ty: then_ty.clone(),
                else_ty: else_ty.clone(),
            },
            node.span,
        ));
    }
}

/// `val` bindings cannot be assigned.
fn pass_mutability(ctx: &Context<'_>, id: NodeId, diags: &mut Vec<Diagnostic>) {
    let node = ctx.ast.node(id);
    let NodeKind::Assign { name, .. } = &node.kind else {
        return;
    };
    if let Some(sym) = ctx.ns.scopes.symbol(node.scope, name) {
        if !sym.mutable {
            diags.push(Diagnostic::new(
                DiagnosticKind::CannotChangeImmutableVariable { name: name.clone() },
                node.span,
            ));
        }
    }
}

/// Member access requires a narrowed variant receiver with the field.
fn pass_members(ctx: &Context<'_>, id: NodeId, diags: &mut Vec<Diagnostic>) {
    let node = ctx.ast.node(id);
    let NodeKind::Field { receiver, member } = &node.kind else {
        return;
    };
    let receiver_ty = ctx.ty(*receiver);
    let kind = match receiver_ty {
        Type::Undefined | Type::Any => return,
        Type::Variant(vt) if vt.selected.is_some() => {
            if ctx.member_type(receiver_ty, member).is_some() {
                return;
            }
            DiagnosticKind::MemberDoesNotExist {
                ty: receiver_ty.clone(),
                member: member.clone(),
            }
        }
        // An un-narrowed family has no single field layout.
        found => DiagnosticKind::ExpectedVariantType { found: found.clone() },
    };
    diags.push(Diagnostic::new(kind, node.span));
}
