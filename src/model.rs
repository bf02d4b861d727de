//! Core data model: locations, symbols, definitions, references.
//!
//! Mirrors the value types described in the cross-reference index
//! specification: a [`Symbol`] identifies a function or method structurally
//! (by name and, for methods, owning class); a [`Definition`]/[`Reference`]
//! pair carries a location plus the nested calls or enclosing definitions
//! that give the cross-reference graph its bidirectional shape.
//!
//! Full values ([`Definition`], [`Reference`]) carry cyclic-looking payloads
//! (`calls`, `called_by`) that would otherwise make the store self-referential.
//! Pure fingerprints ([`PureDefinition`], [`PureReference`]) break the cycle:
//! they are location-only identities used as map keys, and `to_pure()`
//! projects a full value down to one.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An immutable source location. Bytes are authoritative for exact range
/// matching; line/column are carried for display and for the well-formedness
/// invariant in [`CodeLocation::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeLocation {
    pub file_path: PathBuf,
    pub start_lineno: u32,
    pub start_col: u32,
    pub end_lineno: u32,
    pub end_col: u32,
    pub start_byte: u32,
    pub end_byte: u32,
}

impl CodeLocation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        file_path: impl Into<PathBuf>,
        start_lineno: u32,
        start_col: u32,
        end_lineno: u32,
        end_col: u32,
        start_byte: u32,
        end_byte: u32,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            start_lineno,
            start_col,
            end_lineno,
            end_col,
            start_byte,
            end_byte,
        }
    }

    /// Checks the well-formedness invariant from the data model: bytes must
    /// be non-decreasing and the line/column pair must not decrease either.
    pub fn is_well_formed(&self) -> bool {
        self.start_byte <= self.end_byte
            && (self.start_lineno, self.start_col) <= (self.end_lineno, self.end_col)
    }
}

/// A function-or-method identity, independent of any one location.
///
/// Equality and hashing are structural over all fields including the tag, so
/// a free function and a method can share a name without colliding as a map
/// key. For method *calls* the receiver type is never resolved syntactically,
/// so `class_name` is always `None` on a reference-side `Method`; it is only
/// ever `Some` on the definition side, when the enclosing class is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Symbol {
    Function { name: String },
    Method { name: String, class_name: Option<String> },
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Function { name } | Symbol::Method { name, .. } => name,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self, Symbol::Method { .. })
    }
}

/// Location-only identity fingerprint of a call site. Used as the store key
/// for references so that the full [`Reference`] (with its `called_by` list)
/// never needs to be compared or hashed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PureReference {
    pub location: CodeLocation,
}

/// Location-only identity fingerprint of a definition body/header region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PureDefinition {
    pub location: CodeLocation,
}

/// An outbound call edge fragment, stored on the caller's `Definition.calls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolReference {
    pub symbol: Symbol,
    pub reference: PureReference,
}

/// An inbound call edge fragment, stored on the callee's `Reference.called_by`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolDefinition {
    pub symbol: Symbol,
    pub definition: PureDefinition,
}

/// A specific call site in source, extended with the set of enclosing
/// definitions that textually contain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub location: CodeLocation,
    #[serde(default)]
    pub called_by: Vec<SymbolDefinition>,
}

impl Reference {
    pub fn new(location: CodeLocation) -> Self {
        Self { location, called_by: Vec::new() }
    }

    pub fn to_pure(&self) -> PureReference {
        PureReference { location: self.location.clone() }
    }
}

/// A specific occurrence of a symbol's body in source, extended with the
/// list of call sites nested inside the definition body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub location: CodeLocation,
    #[serde(default)]
    pub calls: Vec<SymbolReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_note: Option<serde_json::Value>,
}

impl Definition {
    pub fn new(location: CodeLocation) -> Self {
        Self { location, calls: Vec::new(), doc: None, llm_note: None }
    }

    pub fn with_calls(mut self, calls: Vec<SymbolReference>) -> Self {
        self.calls = calls;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn to_pure(&self) -> PureDefinition {
        PureDefinition { location: self.location.clone() }
    }
}

/// External, list-shaped view of a symbol's entry: every stored definition
/// and reference, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionLikeInfo {
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub references: Vec<Reference>,
}

/// One `(symbol, info)` entry in the serializable flat form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDataEntry {
    pub symbol: Symbol,
    pub info: FunctionLikeInfo,
}

/// The serializable flat form of a [`crate::index::CrossRefIndex`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexData {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub data: Vec<IndexDataEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl IndexData {
    pub fn new(type_tag: impl Into<String>, data: Vec<IndexDataEntry>) -> Self {
        Self { type_tag: type_tag.into(), data, metadata: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(start: u32, end: u32) -> CodeLocation {
        CodeLocation::new("a.py", 1, start, 1, end, start, end)
    }

    #[test]
    fn well_formed_rejects_inverted_range() {
        let good = loc(0, 5);
        assert!(good.is_well_formed());

        let mut bad = loc(0, 5);
        bad.end_byte = 0;
        assert!(!bad.is_well_formed());
    }

    #[test]
    fn symbol_equality_is_structural_and_tag_sensitive() {
        let f = Symbol::Function { name: "m".into() };
        let m = Symbol::Method { name: "m".into(), class_name: None };
        assert_ne!(f, m, "function and method with the same name are distinct keys");

        let m_with_class = Symbol::Method { name: "m".into(), class_name: Some("C".into()) };
        assert_ne!(m, m_with_class);
    }

    #[test]
    fn symbol_serializes_with_type_discriminator() {
        let f = Symbol::Function { name: "foo".into() };
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["type"], "function");
        assert_eq!(v["name"], "foo");

        let m = Symbol::Method { name: "bar".into(), class_name: Some("C".into()) };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["type"], "method");
        assert_eq!(v["class_name"], "C");
    }

    #[test]
    fn pure_projection_round_trips() {
        let def = Definition::new(loc(0, 10)).with_doc("docstring");
        let pure = def.to_pure();
        assert_eq!(pure.location, def.location);
    }
}
