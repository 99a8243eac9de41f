//! The AST surface the parser hands to the analyzer.
//!
//! Nodes live in a per-unit arena and refer to each other (and to their
//! scopes) through plain index handles, so the whole tree shares one
//! lifetime and carries no references. The AST builder has already done
//! two things by the time the analyzer sees a node: attached the scope the
//! node is evaluated in, and resolved every written type annotation to a
//! concrete [`Type`] via the namespace's generic resolver.

use tarn_common::Span;

use crate::scope::ScopeId;
use crate::ty::{FunctionType, Type};

/// Handle to a node in an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl InfixOp {
    /// Whether the operator's result is `bool` regardless of operand type.
    pub fn yields_bool(self) -> bool {
        matches!(
            self,
            InfixOp::Eq
                | InfixOp::Ne
                | InfixOp::Lt
                | InfixOp::Le
                | InfixOp::Gt
                | InfixOp::Ge
                | InfixOp::And
                | InfixOp::Or
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    /// Logical negation; operand must be `bool`.
    Not,
    /// Numeric negation.
    Neg,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    UnitLit,
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    StringLit(String),
    /// A variable or function reference.
    Name(String),
    /// Dotted access through a package alias: `geo.area`.
    PackageAccess { alias: String, name: String },
    /// `val`/`var` declaration. `declared` is the written annotation,
    /// already resolved; `None` means the type is taken from the value.
    Let {
        name: String,
        mutable: bool,
        declared: Option<Type>,
        value: NodeId,
    },
    Assign { name: String, value: NodeId },
    /// Sequence of statements/expressions; evaluates to its last item.
    Block { items: Vec<NodeId> },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    /// Runtime tag check, `x is Some`. The builder attaches the narrowed
    /// fact to the guarded branch's scope.
    Is { name: String, tag: String },
    Call {
        callee: NodeId,
        /// Explicit type arguments, `identity[int](5)`. Empty when the
        /// call relies on inference.
        type_args: Vec<Type>,
        args: Vec<NodeId>,
    },
    Field { receiver: NodeId, member: String },
    Infix { op: InfixOp, lhs: NodeId, rhs: NodeId },
    Prefix { op: PrefixOp, operand: NodeId },
    /// The language's only cast form coerces a value for use as a
    /// condition; the target is checked against `bool`.
    Cast { value: NodeId, target: Type },
    /// Function or lambda definition. The signature is fully resolved;
    /// parameter symbols live in the body's scope.
    FnDef {
        name: String,
        ty: FunctionType,
        params: Vec<String>,
        body: Option<NodeId>,
    },
}

/// One AST node: its shape, source span, and evaluation scope.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub scope: ScopeId,
}

/// Arena of nodes for one compilation unit.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NodeKind, span: Span, scope: ScopeId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span, scope });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A node's children in evaluation order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.node(id).kind {
            NodeKind::UnitLit
            | NodeKind::IntLit(_)
            | NodeKind::FloatLit(_)
            | NodeKind::BoolLit(_)
            | NodeKind::StringLit(_)
            | NodeKind::Name(_)
            | NodeKind::PackageAccess { .. }
            | NodeKind::Is { .. } => Vec::new(),
            NodeKind::Let { value, .. } | NodeKind::Assign { value, .. } => vec![*value],
            NodeKind::Block { items } => items.clone(),
            NodeKind::If { cond, then_branch, else_branch } => {
                let mut out = vec![*cond, *then_branch];
                out.extend(*else_branch);
                out
            }
            NodeKind::Call { callee, args, .. } => {
                let mut out = vec![*callee];
                out.extend(args.iter().copied());
                out
            }
            NodeKind::Field { receiver, .. } => vec![*receiver],
            NodeKind::Infix { lhs, rhs, .. } => vec![*lhs, *rhs],
            NodeKind::Prefix { operand, .. } => vec![*operand],
            NodeKind::Cast { value, .. } => vec![*value],
            NodeKind::FnDef { body, .. } => body.iter().copied().collect(),
        }
    }

    /// Every node reachable from `root`, children before parents.
    pub fn post_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            stack.push((id, true));
            let children = self.children(id);
            for child in children.into_iter().rev() {
                stack.push((child, false));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeArena;

    #[test]
    fn post_order_visits_children_first() {
        let mut scopes = ScopeArena::new();
        let scope = scopes.alloc(None);
        let mut ast = Ast::new();
        let span = Span::point(0);
        let lhs = ast.push(NodeKind::IntLit(1), span, scope);
        let rhs = ast.push(NodeKind::IntLit(2), span, scope);
        let sum = ast.push(NodeKind::Infix { op: InfixOp::Add, lhs, rhs }, span, scope);
        let root = ast.push(NodeKind::Block { items: vec![sum] }, span, scope);
        assert_eq!(ast.post_order(root), vec![lhs, rhs, sum, root]);
    }

    #[test]
    fn if_children_include_both_branches() {
        let mut scopes = ScopeArena::new();
        let scope = scopes.alloc(None);
        let mut ast = Ast::new();
        let span = Span::point(0);
        let cond = ast.push(NodeKind::BoolLit(true), span, scope);
        let then_branch = ast.push(NodeKind::IntLit(1), span, scope);
        let else_branch = ast.push(NodeKind::IntLit(2), span, scope);
        let node = ast.push(
            NodeKind::If { cond, then_branch, else_branch: Some(else_branch) },
            span,
            scope,
        );
        assert_eq!(ast.children(node), vec![cond, then_branch, else_branch]);
    }
}
