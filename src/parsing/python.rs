//! Python processor.
//!
//! Definitions: every `function_definition` node. One directly inside a
//! class body block is a method; one with no `class_definition` ancestor at
//! all is a free function. A function nested inside another function that is
//! itself nested inside a class (neither a direct class-body child nor
//! ancestor-free) matches neither shape and is skipped — the same gap the
//! original tree-sitter query leaves.
//!
//! References: every `call` node, anywhere. A call through a bare name
//! (`foo()`) is a `Function`; a call through an attribute (`obj.foo()`)
//! is a `Method` with `class_name: None` — the receiver's type is never
//! resolved syntactically.

use tree_sitter::Node;

use crate::model::{Definition, Reference, Symbol};

use super::{collect_by_kind, node_location, LanguageProcessor, QueryContext};

pub struct PythonProcessor;

impl LanguageProcessor for PythonProcessor {
    fn name(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn new_parser(&self) -> tree_sitter::Parser {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .expect("tree-sitter-python grammar is compiled into this binary");
        parser
    }

    fn definition_nodes<'t>(&self, root: Node<'t>) -> Vec<Node<'t>> {
        let mut all = Vec::new();
        collect_by_kind(root, "function_definition", &mut all);
        all.into_iter().filter(|n| capture_kind(*n).is_some()).collect()
    }

    fn reference_nodes<'t>(&self, root: Node<'t>) -> Vec<Node<'t>> {
        let mut out = Vec::new();
        collect_by_kind(root, "call", &mut out);
        out
    }

    fn handle_definition(&self, node: Node, ctx: &QueryContext) -> Option<(Symbol, Definition)> {
        let name_node = node.child_by_field_name("name")?;
        let func_name = ctx.text(name_node).to_string();

        let is_method = is_method_definition(node);

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

        let symbol = if is_method {
            Symbol::Method { name: func_name, class_name: class_name_for_method(node, ctx) }
        } else {
            Symbol::Function { name: func_name }
        };

        let mut definition = Definition::new(node_location(ctx, node)).with_calls(calls);
        if let Some(body_node) = node.child_by_field_name("body") {
            definition.doc = extract_docstring(body_node, ctx);
        }

        Some((symbol, definition))
    }

    fn handle_reference(&self, node: Node, ctx: &QueryContext) -> Option<(Symbol, Reference)> {
        let function_node = node.child_by_field_name("function")?;

        match function_node.kind() {
            "identifier" => {
                let func_name = ctx.text(function_node).to_string();
                Some((
                    Symbol::Function { name: func_name },
                    Reference::new(node_location(ctx, node)),
                ))
            }
            "attribute" => {
                let method_name_node = function_node
                    .children(&mut function_node.walk())
                    .filter(|c| c.kind() == "identifier")
                    .last()?;
                let method_name = ctx.text(method_name_node).to_string();
                Some((
                    Symbol::Method { name: method_name, class_name: None },
                    Reference::new(node_location(ctx, node)),
                ))
            }
            _ => None,
        }
    }
}

/// `Some("method")` / `Some("function")` mirrors the two alternatives of the
/// original tree-sitter query; `None` means neither pattern matches.
fn capture_kind(node: Node) -> Option<&'static str> {
    if let Some(parent) = node.parent() {
        if parent.kind() == "block" {
            if let Some(grandparent) = parent.parent() {
                if grandparent.kind() == "class_definition" {
                    return Some("method");
                }
            }
        }
    }
    if !has_class_ancestor(node) {
        return Some("function");
    }
    None
}

fn has_class_ancestor(node: Node) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "class_definition" {
            return true;
        }
        current = n.parent();
    }
    false
}

fn is_method_definition(node: Node) -> bool {
    has_class_ancestor(node)
}

fn class_name_for_method(node: Node, ctx: &QueryContext) -> Option<String> {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "class_definition" {
            let name_node = n.child_by_field_name("name")?;
            return Some(ctx.text(name_node).to_string());
        }
        current = n.parent();
    }
    None
}

/// First statement of `body` is an `expression_statement` wrapping a bare
/// `string` node: the Python docstring convention.
fn extract_docstring(body: Node, ctx: &QueryContext) -> Option<String> {
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string_node = first.named_child(0)?;
    if string_node.kind() != "string" {
        return None;
    }
    Some(ctx.text(string_node).trim_matches(['"', '\'', ' ', '\n']).to_string())
}
