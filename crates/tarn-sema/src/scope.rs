//! Hierarchical symbol tables.
//!
//! Scopes live in a [`ScopeArena`] owned by the global namespace and are
//! addressed by [`ScopeId`] handles; AST nodes store handles, never
//! references, so every scope of a compilation shares one lifetime. Lookup
//! walks the parent chain. Flow-sensitive narrowing is a per-scope map of
//! "narrowed facts" consulted before the scope's own symbols, so a
//! refinement cannot outlive the branch that established it.

use rustc_hash::FxHashMap;

use crate::ty::{OverloadedFunctionType, Type};

/// Handle to a scope in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// Where a binding lives, for the code generator's instruction selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// A binding introduced in a function body or block.
    Local,
    /// A function parameter.
    Argument,
    /// A top-level binding in a package root scope.
    Package,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// One name bound in one scope.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub kind: SymbolKind,
    pub visibility: Visibility,
    pub mutable: bool,
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    symbols: FxHashMap<String, Symbol>,
    /// Narrowed types established by an `is` check on the branch this
    /// scope belongs to. Checked before `symbols` during lookup.
    facts: FxHashMap<String, Type>,
}

/// Arena of parent-linked scopes.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a scope. `parent: None` makes it a top-level (package root)
    /// scope.
    pub fn alloc(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            symbols: FxHashMap::default(),
            facts: FxHashMap::default(),
        });
        id
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes[id.0 as usize].parent
    }

    /// A scope is top-level iff it has no parent.
    pub fn is_top_level(&self, id: ScopeId) -> bool {
        self.scopes[id.0 as usize].parent.is_none()
    }

    /// Bind `name` in exactly this scope.
    ///
    /// Rebinding a function-typed name to a new, shape-distinct function
    /// type merges the two into an overload set rather than replacing;
    /// rebinding to anything else replaces outright.
    pub fn add_symbol(
        &mut self,
        id: ScopeId,
        name: impl Into<String>,
        ty: Type,
        kind: SymbolKind,
        visibility: Visibility,
        mutable: bool,
    ) {
        let name = name.into();
        let scope = &mut self.scopes[id.0 as usize];
        let ty = match (scope.symbols.get(&name).map(|s| &s.ty), ty) {
            (Some(Type::Function(old)), Type::Function(new)) if !old.same_shape(&new) => {
                Type::Overloaded(OverloadedFunctionType {
                    candidates: vec![old.clone(), new],
                })
            }
            (Some(Type::Overloaded(set)), Type::Function(new)) => {
                let mut set = set.clone();
                set.merge(new);
                Type::Overloaded(set)
            }
            (_, ty) => ty,
        };
        scope.symbols.insert(
            name.clone(),
            Symbol {
                name,
                ty,
                kind,
                visibility,
                mutable,
            },
        );
    }

    /// Record a flow-sensitive refinement of `name` for this scope only.
    pub fn add_fact(&mut self, id: ScopeId, name: impl Into<String>, ty: Type) {
        self.scopes[id.0 as usize].facts.insert(name.into(), ty);
    }

    /// Whether `name` is bound in exactly this frame. Used to detect
    /// illegal redeclaration, as opposed to legal shadowing of a parent.
    pub fn contains_directly(&self, id: ScopeId, name: &str) -> bool {
        self.scopes[id.0 as usize].symbols.contains_key(name)
    }

    /// The symbol bound in exactly this frame, if any.
    pub fn symbol_directly(&self, id: ScopeId, name: &str) -> Option<&Symbol> {
        self.scopes[id.0 as usize].symbols.get(name)
    }

    /// Walk the parent chain for the nearest binding of `name`.
    pub fn symbol(&self, id: ScopeId, name: &str) -> Option<&Symbol> {
        let mut cursor = Some(id);
        while let Some(sid) = cursor {
            let scope = &self.scopes[sid.0 as usize];
            if let Some(sym) = scope.symbols.get(name) {
                return Some(sym);
            }
            cursor = scope.parent;
        }
        None
    }

    /// The static type of `name` seen from this scope: the nearest
    /// narrowed fact wins over the nearest symbol binding.
    pub fn type_of(&self, id: ScopeId, name: &str) -> Option<Type> {
        let mut cursor = Some(id);
        while let Some(sid) = cursor {
            if let Some(ty) = self.type_in_frame(sid, name) {
                return Some(ty);
            }
            cursor = self.scopes[sid.0 as usize].parent;
        }
        None
    }

    /// The static type of `name` in exactly this frame, facts first.
    pub fn type_in_frame(&self, id: ScopeId, name: &str) -> Option<Type> {
        let scope = &self.scopes[id.0 as usize];
        scope
            .facts
            .get(name)
            .cloned()
            .or_else(|| scope.symbols.get(name).map(|s| s.ty.clone()))
    }

    /// Names bound directly in this frame, for import validation.
    pub fn names_in(&self, id: ScopeId) -> impl Iterator<Item = &str> {
        self.scopes[id.0 as usize].symbols.keys().map(String::as_str)
    }
}
