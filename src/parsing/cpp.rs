//! C++ processor.
//!
//! Reuses the C query and handler shape verbatim, per the open-question
//! resolution that member calls stay out of scope: a call through a
//! `field_expression` (`obj.foo()`, `obj->foo()`) has a `function` field of
//! kind `field_expression`, not `identifier`, so [`CProcessor`]-style
//! handling already skips it — no `Method` reference is ever produced from a
//! C++ call site. A qualified definition name (`Class::method`) is likewise
//! skipped: its declarator name is a `qualified_identifier`, not a bare
//! `identifier`.

use tree_sitter::Node;

use crate::model::{Definition, Reference, Symbol};
use crate::parsing::c::extract_function_name;

use super::{collect_by_kind, node_location, LanguageProcessor, QueryContext};

pub struct CppProcessor;

impl LanguageProcessor for CppProcessor {
    fn name(&self) -> &'static str {
        "cpp"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cpp", "hpp", "cc", "cxx", "hxx"]
    }

    fn new_parser(&self) -> tree_sitter::Parser {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .expect("tree-sitter-cpp grammar is compiled into this binary");
        parser
    }

    fn definition_nodes<'t>(&self, root: Node<'t>) -> Vec<Node<'t>> {
        let mut out = Vec::new();
        collect_by_kind(root, "function_definition", &mut out);
        out
    }

    fn reference_nodes<'t>(&self, root: Node<'t>) -> Vec<Node<'t>> {
        let mut out = Vec::new();
        collect_by_kind(root, "call_expression", &mut out);
        out
    }

    fn handle_definition(&self, node: Node, ctx: &QueryContext) -> Option<(Symbol, Definition)> {
        let func_name = extract_function_name(node, ctx)?;

        let mut calls = Vec::new();
        if let Some(body_node) = node.child_by_field_name("body") {
            for call_node in self.reference_nodes(body_node) {
                if let Some((symbol, reference)) = self.handle_reference(call_node, ctx) {
                    calls.push(crate::model::SymbolReference {
                        symbol,
                        reference: reference.to_pure(),
                    });
                }
            }
        }

        let definition = Definition::new(node_location(ctx, node)).with_calls(calls);
        Some((Symbol::Function { name: func_name }, definition))
    }

    fn handle_reference(&self, node: Node, ctx: &QueryContext) -> Option<(Symbol, Reference)> {
        let name_node = node.child_by_field_name("function")?;
        if name_node.kind() != "identifier" {
            return None;
        }
        let func_name = ctx.text(name_node).to_string();
        Some((Symbol::Function { name: func_name }, Reference::new(node_location(ctx, node))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(src: &str) -> tree_sitter::Tree {
        let p = CppProcessor;
        let mut parser = p.new_parser();
        parser.parse(src, None).unwrap()
    }

    #[test]
    fn free_function_call_is_captured() {
        let src = "int add(int a, int b) {\n    return helper(a, b);\n}\n";
        let tree = parse(src);
        let ctx = QueryContext::new(Path::new("m.cpp"), src.as_bytes());
        let p = CppProcessor;
        let defs = p.definition_nodes(tree.root_node());
        assert_eq!(defs.len(), 1);
        let (symbol, def) = p.handle_definition(defs[0], &ctx).unwrap();
        assert_eq!(symbol, Symbol::Function { name: "add".into() });
        assert_eq!(def.calls.len(), 1);
    }

    #[test]
    fn member_call_is_not_resolved() {
        let src = "int add(Obj o) {\n    return o.helper();\n}\n";
        let tree = parse(src);
        let ctx = QueryContext::new(Path::new("m.cpp"), src.as_bytes());
        let p = CppProcessor;
        let defs = p.definition_nodes(tree.root_node());
        let (_, def) = p.handle_definition(defs[0], &ctx).unwrap();
        assert!(def.calls.is_empty(), "member calls never resolve to a symbol");
    }

    #[test]
    fn qualified_method_definition_is_skipped() {
        let src = "int C::method() {\n    return 0;\n}\n";
        let tree = parse(src);
        let ctx = QueryContext::new(Path::new("m.cpp"), src.as_bytes());
        let p = CppProcessor;
        let defs = p.definition_nodes(tree.root_node());
        assert_eq!(defs.len(), 1);
        assert!(p.handle_definition(defs[0], &ctx).is_none());
    }
}
