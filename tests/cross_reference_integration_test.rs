//! End-to-end scenarios exercising the indexer driver, the cross-reference
//! store's bidirectional invariant, call-graph construction, and the JSON
//! persistence round-trip, against real tree-sitter parses rather than
//! hand-built fixtures.

use codanna_xref::graph::{build_call_graph, GraphConstructOptions};
use codanna_xref::index::TypeFilter;
use codanna_xref::indexer::index_repository;
use codanna_xref::model::Symbol;
use codanna_xref::parsing::{processor_for, Language};
use codanna_xref::persist::{load_index, save_index};

#[test]
fn python_bidirectional_invariant_holds_on_a_real_parse() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.py"), "def main():\n    helper()\n\n\ndef helper():\n    pass\n").unwrap();

    let processor = processor_for(Language::Python);
    let (index, stats) = index_repository(dir.path(), processor.as_ref());
    assert_eq!(stats.files_indexed, 1);

    let main_sym = Symbol::Function { name: "main".into() };
    let helper_sym = Symbol::Function { name: "helper".into() };

    let defs = index.get_definitions(&main_sym);
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].calls.len(), 1);
    assert_eq!(defs[0].calls[0].symbol, helper_sym);

    let refs = index.get_references(&helper_sym);
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].called_by.len(), 1);
    assert_eq!(refs[0].called_by[0].symbol, main_sym);
}

#[test]
fn python_method_and_attribute_call_are_distinct_symbol_keys() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("c.py"),
        "class C:\n    def m(self):\n        pass\n\n\nx.m()\n",
    )
    .unwrap();

    let processor = processor_for(Language::Python);
    let (index, _) = index_repository(dir.path(), processor.as_ref());

    let method_def_key = Symbol::Method { name: "m".into(), class_name: Some("C".into()) };
    let method_call_key = Symbol::Method { name: "m".into(), class_name: None };

    assert_eq!(index.get_definitions(&method_def_key).len(), 1);
    assert_eq!(index.get_references(&method_call_key).len(), 1);
    assert!(index.get_references(&method_def_key).is_empty());
    assert!(index.get_definitions(&method_call_key).is_empty());
}

#[test]
fn ambiguous_c_call_is_unresolved_unless_expand_calls_is_set() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("one.c"), "void f(void) {}\n").unwrap();
    std::fs::write(dir.path().join("two.c"), "void f(void) {}\nvoid caller(void) { f(); }\n").unwrap();

    let processor = processor_for(Language::C);
    let (index, _) = index_repository(dir.path(), processor.as_ref());

    let strict = build_call_graph(
        &index,
        &GraphConstructOptions { expand_calls: false, ..GraphConstructOptions::default() },
    );
    assert_eq!(strict.unresolved.len(), 1);
    assert_eq!(strict.unresolved[0].reason, "ambiguous_targets");
    assert!(strict.edges.is_empty());

    let expanded = build_call_graph(
        &index,
        &GraphConstructOptions { expand_calls: true, ..GraphConstructOptions::default() },
    );
    assert_eq!(expanded.edges.len(), 2);
    assert!(expanded.unresolved.is_empty());
}

#[test]
fn index_round_trips_through_json_persistence() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.py"), "def main():\n    helper()\n\n\ndef helper():\n    pass\n").unwrap();

    let processor = processor_for(Language::Python);
    let (index, _) = index_repository(dir.path(), processor.as_ref());

    let json_path = dir.path().join("index.json");
    save_index(&index, &json_path).unwrap();
    let reloaded = load_index(&json_path).unwrap();

    let main_sym = Symbol::Function { name: "main".into() };
    assert_eq!(
        reloaded.get_definitions(&main_sym).len(),
        index.get_definitions(&main_sym).len()
    );
    let helper_sym = Symbol::Function { name: "helper".into() };
    let reloaded_refs = reloaded.get_references(&helper_sym);
    assert_eq!(reloaded_refs.len(), 1);
    assert_eq!(reloaded_refs[0].called_by[0].symbol, main_sym);
}

#[test]
fn query_by_kind_filters_methods_from_functions() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("mix.py"),
        "def free():\n    pass\n\n\nclass C:\n    def free(self):\n        pass\n",
    )
    .unwrap();

    let processor = processor_for(Language::Python);
    let (index, _) = index_repository(dir.path(), processor.as_ref());

    let functions = index
        .handle_query(&codanna_xref::index::Query::ByName { name: "free".into(), type_filter: TypeFilter::Function })
        .unwrap();
    assert_eq!(functions.len(), 1);

    let methods = index
        .handle_query(&codanna_xref::index::Query::ByName { name: "free".into(), type_filter: TypeFilter::Method })
        .unwrap();
    assert_eq!(methods.len(), 1);
}
