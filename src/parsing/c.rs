//! C processor.
//!
//! Definitions: every `function_definition` node, anywhere in the tree (C has
//! no nesting). The function name is found by unwrapping however many
//! `pointer_declarator` layers sit in front of the `function_declarator`.
//!
//! References: every `call_expression` node whose `function` field is a bare
//! `identifier` — calls through a function pointer expression are skipped.
//! The reference's location is the *entire* call expression (name, parens,
//! and arguments), not just the callee name.

use tree_sitter::Node;

use crate::model::{Definition, Reference, Symbol};

use super::{collect_by_kind, node_location, LanguageProcessor, QueryContext};

pub struct CProcessor;

impl LanguageProcessor for CProcessor {
    fn name(&self) -> &'static str {
        "c"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["c", "h"]
    }

    fn new_parser(&self) -> tree_sitter::Parser {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .expect("tree-sitter-c grammar is compiled into this binary");
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

/// `function_definition -> declarator` is either a `function_declarator`
/// directly, or one or more `pointer_declarator` layers wrapping it.
pub(crate) fn extract_function_name(function_def: Node, ctx: &QueryContext) -> Option<String> {
    let mut declarator = function_def.child_by_field_name("declarator")?;

    while declarator.kind() == "pointer_declarator" {
        declarator = declarator
            .children(&mut declarator.walk())
            .find(|c| c.kind() == "function_declarator")
            .or_else(|| declarator.child_by_field_name("declarator"))?;
    }

    if declarator.kind() != "function_declarator" {
        return None;
    }

    let name_node = declarator.child_by_field_name("declarator")?;
    if name_node.kind() != "identifier" {
        return None;
    }
    Some(ctx.text(name_node).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(src: &str) -> tree_sitter::Tree {
        let p = CProcessor;
        let mut parser = p.new_parser();
        parser.parse(src, None).unwrap()
    }

    #[test]
    fn plain_function_definition() {
        let src = "int add(int a, int b) {\n    return helper(a, b);\n}\n";
        let tree = parse(src);
        let ctx = QueryContext::new(Path::new("m.c"), src.as_bytes());
        let p = CProcessor;
        let defs = p.definition_nodes(tree.root_node());
        assert_eq!(defs.len(), 1);
        let (symbol, def) = p.handle_definition(defs[0], &ctx).unwrap();
        assert_eq!(symbol, Symbol::Function { name: "add".into() });
        assert_eq!(def.calls.len(), 1);
        assert_eq!(def.calls[0].symbol, Symbol::Function { name: "helper".into() });
    }

    #[test]
    fn pointer_returning_function() {
        let src = "char *make(void) {\n    return alloc();\n}\n";
        let tree = parse(src);
        let ctx = QueryContext::new(Path::new("m.c"), src.as_bytes());
        let p = CProcessor;
        let defs = p.definition_nodes(tree.root_node());
        assert_eq!(defs.len(), 1);
        let (symbol, _) = p.handle_definition(defs[0], &ctx).unwrap();
        assert_eq!(symbol, Symbol::Function { name: "make".into() });
    }

    #[test]
    fn call_reference_spans_full_expression() {
        let src = "int f(void) {\n    return g(1, 2);\n}\n";
        let tree = parse(src);
        let ctx = QueryContext::new(Path::new("m.c"), src.as_bytes());
        let p = CProcessor;
        let defs = p.definition_nodes(tree.root_node());
        let (_, def) = p.handle_definition(defs[0], &ctx).unwrap();
        let call_ref = &def.calls[0].reference;
        let text = std::str::from_utf8(
            &src.as_bytes()[call_ref.location.start_byte as usize..call_ref.location.end_byte as usize],
        )
        .unwrap();
        assert_eq!(text, "g(1, 2)");
    }
}
