//! Cross-reference index: a content-addressed store keyed by symbol
//! identity, maintaining the invariant that a call recorded on the caller's
//! side is always mirrored on the callee's side.
//!
//! Grounded on `examples/original_source/code_index/index/impl/cross_ref_index.py`
//! for the overall shape (`Info` = definitions-map + references-map per
//! symbol), with the bidirectional mirroring spelled out explicitly here —
//! the original's own `add_definition`/`add_reference` only insert one side;
//! `spec.md`'s invariant 2 requires both sides be induced, so that is what
//! this store actually does.

use indexmap::IndexMap;
use regex::Regex;

use crate::error::QueryError;
use crate::model::{
    Definition, FunctionLikeInfo, IndexData, IndexDataEntry, PureDefinition, PureReference,
    Reference, Symbol, SymbolDefinition, SymbolReference,
};

pub const INDEX_DATA_TYPE_TAG: &str = "codanna-xref/cross-ref-index";

/// Per-symbol store: every definition and reference seen for that symbol,
/// keyed by fingerprint so re-indexing the same location merges in place.
#[derive(Debug, Clone, Default)]
pub struct Info {
    pub definitions: IndexMap<PureDefinition, Definition>,
    pub references: IndexMap<PureReference, Reference>,
}

impl Info {
    fn to_function_like_info(&self) -> FunctionLikeInfo {
        FunctionLikeInfo {
            definitions: self.definitions.values().cloned().collect(),
            references: self.references.values().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    Function,
    Method,
    All,
}

impl TypeFilter {
    fn matches(&self, symbol: &Symbol) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Function => matches!(symbol, Symbol::Function { .. }),
            TypeFilter::Method => matches!(symbol, Symbol::Method { .. }),
        }
    }
}

pub enum Query {
    ByKey { symbol: Symbol },
    ByName { name: String, type_filter: TypeFilter },
    ByNameRegex { pattern: String, type_filter: TypeFilter },
}

/// Content-addressed store mapping `Symbol -> Info`, plus an auxiliary
/// fingerprint-to-symbol map so `find_full_definition` is O(1) on the
/// common path.
#[derive(Debug, Clone, Default)]
pub struct CrossRefIndex {
    data: IndexMap<Symbol, Info>,
    def_fingerprint_owner: std::collections::HashMap<PureDefinition, Symbol>,
}

impl CrossRefIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `def` into `symbol`'s definitions, then induces the mirrored
    /// `Reference.called_by` entry on each callee named in `def.calls`.
    pub fn add_definition(&mut self, symbol: Symbol, def: Definition) {
        let pure = def.to_pure();
        self.def_fingerprint_owner.insert(pure.clone(), symbol.clone());

        let entry = self.data.entry(symbol.clone()).or_default();
        merge_calls(entry.definitions.entry(pure.clone()).or_insert_with(|| Definition::new(def.location.clone())), &def);

        let calls = def.calls.clone();
        for SymbolReference { symbol: callee, reference: pref } in calls {
            let callee_entry = self.data.entry(callee.clone()).or_default();
            let reference = callee_entry
                .references
                .entry(pref.clone())
                .or_insert_with(|| Reference::new(pref.location.clone()));
            push_unique_symbol_definition(
                &mut reference.called_by,
                SymbolDefinition { symbol: symbol.clone(), definition: pure.clone() },
            );
        }
    }

    /// Merges `reference` into `symbol`'s references, then induces the
    /// mirrored `Definition.calls` entry on each caller named in
    /// `reference.called_by`.
    pub fn add_reference(&mut self, symbol: Symbol, reference: Reference) {
        let pure = reference.to_pure();
        let entry = self.data.entry(symbol.clone()).or_default();
        merge_called_by(
            entry.references.entry(pure.clone()).or_insert_with(|| Reference::new(reference.location.clone())),
            &reference,
        );

        let called_by = reference.called_by.clone();
        for SymbolDefinition { symbol: caller, definition: pdef } in called_by {
            self.def_fingerprint_owner.insert(pdef.clone(), caller.clone());
            let caller_entry = self.data.entry(caller.clone()).or_default();
            let definition = caller_entry
                .definitions
                .entry(pdef.clone())
                .or_insert_with(|| Definition::new(pdef.location.clone()));
            push_unique_symbol_reference(
                &mut definition.calls,
                SymbolReference { symbol: symbol.clone(), reference: pure.clone() },
            );
        }
    }

    pub fn get_info(&self, symbol: &Symbol) -> Option<&Info> {
        self.data.get(symbol)
    }

    pub fn get_definitions(&self, symbol: &Symbol) -> Vec<&Definition> {
        self.data.get(symbol).map(|i| i.definitions.values().collect()).unwrap_or_default()
    }

    pub fn get_references(&self, symbol: &Symbol) -> Vec<&Reference> {
        self.data.get(symbol).map(|i| i.references.values().collect()).unwrap_or_default()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.data.keys()
    }

    /// Looks up the owning symbol and full `Definition` for a fingerprint.
    /// On a miss in the auxiliary map, falls back to a linear scan and
    /// repairs the map for next time.
    pub fn find_full_definition(&mut self, pdef: &PureDefinition) -> Option<(Symbol, Definition)> {
        if let Some(sym) = self.def_fingerprint_owner.get(pdef) {
            if let Some(info) = self.data.get(sym) {
                if let Some(def) = info.definitions.get(pdef) {
                    return Some((sym.clone(), def.clone()));
                }
            }
        }

        for (sym, info) in self.data.iter() {
            if let Some(def) = info.definitions.get(pdef) {
                self.def_fingerprint_owner.insert(pdef.clone(), sym.clone());
                return Some((sym.clone(), def.clone()));
            }
        }
        None
    }

    pub fn handle_query(&self, query: &Query) -> Result<Vec<(Symbol, FunctionLikeInfo)>, QueryError> {
        match query {
            Query::ByKey { symbol } => Ok(self
                .data
                .get(symbol)
                .map(|info| vec![(symbol.clone(), info.to_function_like_info())])
                .unwrap_or_default()),
            Query::ByName { name, type_filter } => Ok(self
                .data
                .iter()
                .filter(|(sym, _)| sym.name() == name && type_filter.matches(sym))
                .map(|(sym, info)| (sym.clone(), info.to_function_like_info()))
                .collect()),
            Query::ByNameRegex { pattern, type_filter } => {
                let re = Regex::new(pattern)
                    .map_err(|source| QueryError::InvalidRegex { pattern: pattern.clone(), source })?;
                Ok(self
                    .data
                    .iter()
                    .filter(|(sym, _)| re.is_match(sym.name()) && type_filter.matches(sym))
                    .map(|(sym, info)| (sym.clone(), info.to_function_like_info()))
                    .collect())
            }
        }
    }

    pub fn as_data(&self) -> IndexData {
        let entries = self
            .data
            .iter()
            .map(|(symbol, info)| IndexDataEntry { symbol: symbol.clone(), info: info.to_function_like_info() })
            .collect();
        IndexData::new(INDEX_DATA_TYPE_TAG, entries)
    }

    /// Ingests a decoded [`IndexData`], repairing malformed entries by
    /// dropping them: any `Definition`/`Reference` whose `CodeLocation` fails
    /// [`crate::model::CodeLocation::is_well_formed`] is skipped (and logged)
    /// rather than admitted into the store.
    pub fn update_from_data(&mut self, data: IndexData) {
        for entry in data.data {
            for def in entry.info.definitions {
                if !def.location.is_well_formed() {
                    tracing::warn!(
                        symbol = ?entry.symbol,
                        location = ?def.location,
                        "dropping malformed definition on decode"
                    );
                    continue;
                }
                self.add_definition(entry.symbol.clone(), def);
            }
            for reference in entry.info.references {
                if !reference.location.is_well_formed() {
                    tracing::warn!(
                        symbol = ?entry.symbol,
                        location = ?reference.location,
                        "dropping malformed reference on decode"
                    );
                    continue;
                }
                self.add_reference(entry.symbol.clone(), reference);
            }
        }
    }
}

fn push_unique_symbol_definition(list: &mut Vec<SymbolDefinition>, item: SymbolDefinition) {
    if !list.iter().any(|sd| sd.symbol == item.symbol && sd.definition == item.definition) {
        list.push(item);
    }
}

fn push_unique_symbol_reference(list: &mut Vec<SymbolReference>, item: SymbolReference) {
    if !list.iter().any(|sr| sr.symbol == item.symbol && sr.reference == item.reference) {
        list.push(item);
    }
}

fn merge_calls(target: &mut Definition, incoming: &Definition) {
    target.location = incoming.location.clone();
    if target.doc.is_none() {
        target.doc = incoming.doc.clone();
    }
    if target.llm_note.is_none() {
        target.llm_note = incoming.llm_note.clone();
    }
    for call in &incoming.calls {
        push_unique_symbol_reference(&mut target.calls, call.clone());
    }
}

fn merge_called_by(target: &mut Reference, incoming: &Reference) {
    target.location = incoming.location.clone();
    for cb in &incoming.called_by {
        push_unique_symbol_definition(&mut target.called_by, cb.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CodeLocation;

    fn loc(path: &str, a: u32, b: u32) -> CodeLocation {
        CodeLocation::new(path, 1, a, 1, b, a, b)
    }

    #[test]
    fn add_definition_mirrors_a_called_by_entry() {
        let mut idx = CrossRefIndex::new();
        let caller = Symbol::Function { name: "main".into() };
        let callee = Symbol::Function { name: "helper".into() };

        let call_loc = loc("a.py", 10, 20);
        let def_loc = loc("a.py", 0, 30);
        let def = Definition::new(def_loc.clone()).with_calls(vec![SymbolReference {
            symbol: callee.clone(),
            reference: crate::model::PureReference { location: call_loc.clone() },
        }]);

        idx.add_definition(caller.clone(), def);

        let refs = idx.get_references(&callee);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].location, call_loc);
        assert_eq!(refs[0].called_by.len(), 1);
        assert_eq!(refs[0].called_by[0].symbol, caller);
        assert_eq!(refs[0].called_by[0].definition.location, def_loc);
    }

    #[test]
    fn add_reference_mirrors_a_calls_entry() {
        let mut idx = CrossRefIndex::new();
        let caller = Symbol::Function { name: "main".into() };
        let callee = Symbol::Function { name: "helper".into() };

        let call_loc = loc("a.py", 10, 20);
        let def_loc = loc("a.py", 0, 30);
        let reference = Reference {
            location: call_loc.clone(),
            called_by: vec![SymbolDefinition {
                symbol: caller.clone(),
                definition: crate::model::PureDefinition { location: def_loc.clone() },
            }],
        };

        idx.add_reference(callee.clone(), reference);

        let defs = idx.get_definitions(&caller);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].calls.len(), 1);
        assert_eq!(defs[0].calls[0].symbol, callee);
    }

    #[test]
    fn merge_on_reindex_deduplicates_by_fingerprint() {
        let mut idx = CrossRefIndex::new();
        let caller = Symbol::Function { name: "main".into() };
        let callee = Symbol::Function { name: "helper".into() };
        let call_loc = loc("a.py", 10, 20);
        let def_loc = loc("a.py", 0, 30);

        let make_def = || {
            Definition::new(def_loc.clone()).with_calls(vec![SymbolReference {
                symbol: callee.clone(),
                reference: crate::model::PureReference { location: call_loc.clone() },
            }])
        };

        idx.add_definition(caller.clone(), make_def());
        idx.add_definition(caller.clone(), make_def());

        assert_eq!(idx.get_definitions(&caller).len(), 1);
        assert_eq!(idx.get_definitions(&caller)[0].calls.len(), 1);
        assert_eq!(idx.get_references(&callee).len(), 1);
        assert_eq!(idx.get_references(&callee)[0].called_by.len(), 1);
    }

    #[test]
    fn query_by_name_regex_rejects_invalid_pattern() {
        let idx = CrossRefIndex::new();
        let result = idx.handle_query(&Query::ByNameRegex {
            pattern: "(".into(),
            type_filter: TypeFilter::All,
        });
        assert!(result.is_err());
    }

    #[test]
    fn update_from_data_drops_malformed_locations() {
        let mut idx = CrossRefIndex::new();
        let sym = Symbol::Function { name: "f".into() };

        let mut bad_loc = loc("a.py", 0, 10);
        bad_loc.end_byte = 0; // end before start: not well-formed.
        let good_loc = loc("a.py", 0, 10);

        let data = IndexData::new(
            INDEX_DATA_TYPE_TAG,
            vec![IndexDataEntry {
                symbol: sym.clone(),
                info: FunctionLikeInfo {
                    definitions: vec![Definition::new(bad_loc), Definition::new(good_loc.clone())],
                    references: vec![],
                },
            }],
        );

        idx.update_from_data(data);

        let defs = idx.get_definitions(&sym);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].location, good_loc);
    }

    #[test]
    fn find_full_definition_falls_back_to_scan() {
        let mut idx = CrossRefIndex::new();
        let sym = Symbol::Function { name: "f".into() };
        let def_loc = loc("a.py", 0, 10);
        idx.add_definition(sym.clone(), Definition::new(def_loc.clone()));

        idx.def_fingerprint_owner.clear();
        let found = idx.find_full_definition(&crate::model::PureDefinition { location: def_loc });
        assert_eq!(found.unwrap().0, sym);
    }
}
