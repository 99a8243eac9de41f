//! Per-package storage of variant (sum) type definitions.
//!
//! A [`TypeRegistry`] holds every `data` definition of one package: the
//! family's generic parameters and, once the second definition pass has
//! run, its variants with resolved field types. Field shapes live here --
//! not inside [`crate::ty::Type`] -- so mutually recursive families stay
//! finite; the analyzer reaches back through the namespace when it needs a
//! field's type.
//!
//! A reverse index maps every variant tag to its owning family, which is
//! what `is`-narrowing and bare-constructor type references resolve
//! through.

use rustc_hash::FxHashMap;

use crate::generics::TypeRef;
use crate::ty::{Type, VariantType};

/// One case of a variant family: a tag plus its ordered, typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub tag: String,
    pub fields: Vec<VariantField>,
}

impl Variant {
    pub fn field(&self, name: &str) -> Option<&VariantField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantField {
    pub name: String,
    /// May mention the family's generic parameters as [`Type::Param`].
    pub ty: Type,
}

/// A registered variant family. Between the two definition passes the
/// variant list is empty (a "shell"), which is exactly what lets sibling
/// definitions reference each other.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantDef {
    pub name: String,
    pub generic_params: Vec<String>,
    pub variants: Vec<Variant>,
}

impl VariantDef {
    pub fn variant(&self, tag: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.tag == tag)
    }

    /// The tag a bare family reference selects by default: single-variant
    /// families are field-addressable without narrowing.
    pub fn default_selected(&self) -> Option<&str> {
        match self.variants.as_slice() {
            [only] => Some(&only.tag),
            _ => None,
        }
    }
}

/// An unresolved `data` definition as the parser hands it over.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub generic_params: Vec<String>,
    pub constructors: Vec<ConstructorDef>,
}

/// One constructor clause of a [`TypeDef`]: tag plus named field
/// references, still unresolved.
#[derive(Debug, Clone)]
pub struct ConstructorDef {
    pub tag: String,
    pub fields: Vec<(String, TypeRef)>,
}

/// The variant-type store of one package.
#[derive(Debug)]
pub struct TypeRegistry {
    module: String,
    package: String,
    defs: FxHashMap<String, VariantDef>,
    /// tag name -> owning family name.
    tag_owner: FxHashMap<String, String>,
}

impl TypeRegistry {
    pub fn new(module: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            package: package.into(),
            defs: FxHashMap::default(),
            tag_owner: FxHashMap::default(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn def(&self, name: &str) -> Option<&VariantDef> {
        self.defs.get(name)
    }

    /// The family owning `tag`, if any.
    pub fn family_of_tag(&self, tag: &str) -> Option<&str> {
        self.tag_owner.get(tag).map(String::as_str)
    }

    /// First definition pass: register the bare shell and claim the tags.
    pub(crate) fn insert_shell(&mut self, def: &TypeDef) {
        for ctor in &def.constructors {
            self.tag_owner.insert(ctor.tag.clone(), def.name.clone());
        }
        self.defs.insert(
            def.name.clone(),
            VariantDef {
                name: def.name.clone(),
                generic_params: def.generic_params.clone(),
                variants: Vec::new(),
            },
        );
    }

    /// Second definition pass: attach the resolved variants to the shell.
    pub(crate) fn attach_variants(&mut self, name: &str, variants: Vec<Variant>) {
        if let Some(def) = self.defs.get_mut(name) {
            def.variants = variants;
        }
    }

    /// Resolve `name` -- a family name or a variant tag -- to a type
    /// reference. Families with exactly one variant come back already
    /// selected; tags come back narrowed to themselves.
    pub fn reference(&self, name: &str) -> Option<VariantType> {
        if let Some(def) = self.defs.get(name) {
            let mut vt = VariantType::family(
                self.module.clone(),
                self.package.clone(),
                def.name.clone(),
                def.generic_params.clone(),
            );
            vt.selected = def.default_selected().map(str::to_owned);
            return Some(vt);
        }
        let owner = self.tag_owner.get(name)?;
        let def = self.defs.get(owner)?;
        let vt = VariantType::family(
            self.module.clone(),
            self.package.clone(),
            def.name.clone(),
            def.generic_params.clone(),
        );
        Some(vt.narrowed(name))
    }

    /// Field lookup against a (narrowed) reference, without instantiation.
    pub fn field_type(&self, vt: &VariantType, field: &str) -> Option<&Type> {
        let tag = vt.selected.as_deref()?;
        self.defs
            .get(&vt.name)?
            .variant(tag)?
            .field(field)
            .map(|f| &f.ty)
    }
}
