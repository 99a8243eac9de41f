//! Prelude registration.
//!
//! Seeds the `std.core` package with the handful of functions every Tarn
//! program can use unqualified, and applies the corresponding prelude
//! imports to a unit's import table. The driver calls this once per unit
//! before user imports so that user definitions shadow the prelude, never
//! the other way around.

use crate::imports::ImportContext;
use crate::namespace::GlobalNamespace;
use crate::scope::{SymbolKind, Visibility};
use crate::ty::Type;

/// The names the prelude makes visible without an import clause.
const PRELUDE_NAMES: &[&str] = &["println", "print", "to_string"];

/// Seed `std.core` (idempotent) and apply the prelude imports to `imports`.
pub fn install_prelude(ns: &mut GlobalNamespace, imports: &mut ImportContext) {
    seed_std_core(ns);
    imports.add_prelude_names(ns, "std", "core", PRELUDE_NAMES);
}

fn seed_std_core(ns: &mut GlobalNamespace) {
    let scope = ns.get_or_create_package("std", "core").scope;
    let add = |ns: &mut GlobalNamespace, name: &str, ty: Type| {
        ns.scopes
            .add_symbol(scope, name, ty, SymbolKind::Package, Visibility::Public, false);
    };
    add(ns, "println", Type::function(vec![Type::String], Type::Unit));
    add(ns, "print", Type::function(vec![Type::String], Type::Unit));
    // Deliberately two shapes: the scope table merges them into one
    // overload set, the same path user overloads take.
    add(ns, "to_string", Type::function(vec![Type::Int], Type::String));
    add(ns, "to_string", Type::function(vec![Type::Float], Type::String));
}
