//! Per-compilation-unit imports.
//!
//! An [`ImportContext`] records which foreign names a unit can see and
//! where they come from. Imported names resolve *live* through the
//! namespace at lookup time (nothing is copied), so a package may be
//! imported before it is fully populated. The raw request list is kept so
//! the analyzer can validate every user import after the fact; prelude
//! imports are applied first, are never validated, and lose to same-name
//! user imports.

use rustc_hash::FxHashMap;

use tarn_common::Span;

use crate::namespace::GlobalNamespace;
use crate::scope::Visibility;
use crate::ty::Type;

/// Where an imported name points: the target package and the name it has
/// there.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedName {
    pub module: String,
    pub package: String,
    pub original: String,
}

/// One user-written import clause.
#[derive(Debug, Clone)]
pub enum ImportRequest {
    /// `import demo.geometry (area, Shape)`
    Names {
        module: String,
        package: String,
        names: Vec<String>,
        span: Option<Span>,
    },
    /// `import demo.geometry as geo`
    Alias {
        module: String,
        package: String,
        alias: String,
        span: Option<Span>,
    },
}

/// The import table of one compilation unit.
#[derive(Debug)]
pub struct ImportContext {
    /// The unit's home module.
    pub module: String,
    /// The unit's home package.
    pub package: String,
    requests: Vec<ImportRequest>,
    names: FxHashMap<String, ImportedName>,
    aliases: FxHashMap<String, (String, String)>,
}

impl ImportContext {
    pub fn new(module: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            package: package.into(),
            requests: Vec::new(),
            names: FxHashMap::default(),
            aliases: FxHashMap::default(),
        }
    }

    /// Record and apply one import clause.
    ///
    /// Names that resolve to a variant family in the target package's
    /// registry import the family *and* one symbol per constructor; every
    /// other name imports as a plain symbol. Missing names are still
    /// recorded -- the analyzer's import-validity pass reports them.
    pub fn add_import(&mut self, ns: &GlobalNamespace, request: ImportRequest) {
        match &request {
            ImportRequest::Names { module, package, names, .. } => {
                let (module, package, names) =
                    (module.clone(), package.clone(), names.clone());
                self.apply_names(ns, &module, &package, &names);
            }
            ImportRequest::Alias { module, package, alias, .. } => {
                self.aliases
                    .insert(alias.clone(), (module.clone(), package.clone()));
            }
        }
        self.requests.push(request);
    }

    /// Apply prelude imports: same mechanics as [`Self::add_import`] but
    /// unrecorded, so they are exempt from validation and shadowable.
    pub(crate) fn add_prelude_names(
        &mut self,
        ns: &GlobalNamespace,
        module: &str,
        package: &str,
        names: &[&str],
    ) {
        let names: Vec<String> = names.iter().map(|n| (*n).to_owned()).collect();
        self.apply_names(ns, module, package, &names);
    }

    fn apply_names(
        &mut self,
        ns: &GlobalNamespace,
        module: &str,
        package: &str,
        names: &[String],
    ) {
        for name in names {
            self.names.insert(
                name.clone(),
                ImportedName {
                    module: module.to_owned(),
                    package: package.to_owned(),
                    original: name.clone(),
                },
            );
            // A variant family drags its constructors along.
            let tags: Vec<String> = ns
                .package(module, package)
                .and_then(|pkg| pkg.types.def(name))
                .map(|def| def.variants.iter().map(|v| v.tag.clone()).collect())
                .unwrap_or_default();
            for tag in tags {
                self.names.insert(
                    tag.clone(),
                    ImportedName {
                        module: module.to_owned(),
                        package: package.to_owned(),
                        original: tag,
                    },
                );
            }
        }
    }

    /// The import-table entry for `name`, if any.
    pub fn imported(&self, name: &str) -> Option<&ImportedName> {
        self.names.get(name)
    }

    /// The package an alias stands for, if any.
    pub fn alias(&self, alias: &str) -> Option<(&str, &str)> {
        self.aliases
            .get(alias)
            .map(|(m, p)| (m.as_str(), p.as_str()))
    }

    /// All user-written import clauses, for validation.
    pub fn requests(&self) -> &[ImportRequest] {
        &self.requests
    }

    /// Resolve an imported name to the public symbol it points at.
    pub fn resolve_value(&self, ns: &GlobalNamespace, name: &str) -> Option<Type> {
        let imp = self.names.get(name)?;
        let pkg = ns.package(&imp.module, &imp.package)?;
        let sym = ns.scopes.symbol_directly(pkg.scope, &imp.original)?;
        (sym.visibility == Visibility::Public).then(|| sym.ty.clone())
    }
}
