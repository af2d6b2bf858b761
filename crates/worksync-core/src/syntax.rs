use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub type SymbolId = Uuid;

/// Metadata name of the component marker interface. A partial class is only
/// treated as a component fragment when one of its bases resolves to this
/// symbol, by identity.
pub const COMPONENT_MARKER_TYPE: &str = "Toolkit.Components.IComponent";

/// A base-or-interface reference as written in source, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A class declaration found in a document, with its nested declarations.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub is_partial: bool,
    pub bases: Vec<TypeRef>,
    pub nested: Vec<ClassDecl>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_partial: false,
            bases: Vec::new(),
            nested: Vec::new(),
        }
    }

    pub fn partial(mut self) -> Self {
        self.is_partial = true;
        self
    }

    pub fn with_base(mut self, base: impl Into<TypeRef>) -> Self {
        self.bases.push(base.into());
        self
    }

    pub fn with_nested(mut self, nested: ClassDecl) -> Self {
        self.nested.push(nested);
        self
    }
}

/// Parsed structure of a document: its class declarations, in source order.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    classes: Vec<ClassDecl>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: ClassDecl) -> Self {
        self.classes.push(class);
        self
    }

    pub fn classes(&self) -> &[ClassDecl] {
        &self.classes
    }
}

/// Resolved semantic information for a document. Bindings map a written type
/// reference to the symbol it denotes; well-known symbols are looked up by
/// metadata name. Two references are the same type only when they resolve to
/// the same `SymbolId`.
#[derive(Debug, Clone, Default)]
pub struct SemanticModel {
    bindings: HashMap<String, SymbolId>,
    well_known: HashMap<String, SymbolId>,
}

impl SemanticModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binding(mut self, reference: impl Into<String>, symbol: SymbolId) -> Self {
        self.bindings.insert(reference.into(), symbol);
        self
    }

    pub fn with_well_known(mut self, metadata_name: impl Into<String>, symbol: SymbolId) -> Self {
        self.well_known.insert(metadata_name.into(), symbol);
        self
    }

    pub fn resolve(&self, reference: &TypeRef) -> Option<SymbolId> {
        self.bindings.get(reference.name()).copied()
    }

    pub fn well_known_type(&self, metadata_name: &str) -> Option<SymbolId> {
        self.well_known.get(metadata_name).copied()
    }
}
