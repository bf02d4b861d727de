//! Language processors: per-language tree-sitter grammars plus the
//! definition/reference extraction logic that turns an AST node into a
//! [`Symbol`] + [`Definition`]/[`Reference`] pair.
//!
//! Each processor walks the tree by hand (`node.kind()` matching and
//! `node.children(&mut node.walk())` recursion) rather than compiling
//! tree-sitter query strings, following the same style the teacher's Rust
//! processor uses for import/call extraction.

pub mod c;
pub mod cpp;
pub mod python;

use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::model::{CodeLocation, Definition, Reference, Symbol};

/// Per-file context threaded through definition/reference handling: the
/// repository-relative path stamped onto every [`crate::model::CodeLocation`],
/// and the raw source bytes node ranges are sliced out of.
pub struct QueryContext<'a> {
    pub file_path: &'a Path,
    pub source: &'a [u8],
}

impl<'a> QueryContext<'a> {
    pub fn new(file_path: &'a Path, source: &'a [u8]) -> Self {
        Self { file_path, source }
    }

    pub fn text(&self, node: Node) -> &'a str {
        std::str::from_utf8(&self.source[node.byte_range()]).unwrap_or("")
    }
}

/// The in-scope language tags. Unknown tags are rejected by the driver before
/// a processor is ever looked up; the core never sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    C,
    Cpp,
}

impl Language {
    pub fn tag(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "python" => Some(Language::Python),
            "c" => Some(Language::C),
            "cpp" => Some(Language::Cpp),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" => Some(Language::Python),
            "c" | "h" => Some(Language::C),
            "cpp" | "hpp" | "cc" | "cxx" | "hxx" => Some(Language::Cpp),
            _ => None,
        }
    }
}

/// Common interface every language processor implements. A processor is
/// stateless configuration plus pure tree-walking functions; the mutable
/// `tree_sitter::Parser` is created fresh per call via [`LanguageProcessor::new_parser`]
/// so processors themselves stay `Send + Sync` and shareable across the
/// parallel driver's worker threads.
pub trait LanguageProcessor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extensions(&self) -> &'static [&'static str];

    fn new_parser(&self) -> Parser;

    /// Collects every node that should be handed to [`Self::handle_definition`],
    /// in document order.
    fn definition_nodes<'t>(&self, root: Node<'t>) -> Vec<Node<'t>>;

    /// Collects every node that should be handed to [`Self::handle_reference`],
    /// in document order.
    fn reference_nodes<'t>(&self, root: Node<'t>) -> Vec<Node<'t>>;

    /// Turns a definition-shaped node into its symbol and `Definition`,
    /// including nested `calls` extracted from the definition's body.
    /// Returns `None` for a malformed node (missing name, unrecognized
    /// declarator shape); the caller skips it and continues.
    fn handle_definition(&self, node: Node, ctx: &QueryContext) -> Option<(Symbol, Definition)>;

    /// Turns a call-expression-shaped node into its callee symbol and
    /// `Reference`. Returns `None` when the callee cannot be resolved to a
    /// plain name (e.g. a call through a function pointer, or — for C++ — a
    /// member call through a `field_expression`).
    fn handle_reference(&self, node: Node, ctx: &QueryContext) -> Option<(Symbol, Reference)>;
}

/// Builds the processor for a given language tag.
pub fn processor_for(lang: Language) -> Box<dyn LanguageProcessor> {
    match lang {
        Language::Python => Box::new(python::PythonProcessor),
        Language::C => Box::new(c::CProcessor),
        Language::Cpp => Box::new(cpp::CppProcessor),
    }
}

/// Recursively visits every descendant of `node` (node included) whose kind
/// matches `kind`, calling `visit` on each in document order. Shared by all
/// three processors' `reference_nodes` implementations, which have no
/// ancestor constraint — every call node anywhere in the subtree counts.
pub(crate) fn collect_by_kind<'t>(node: Node<'t>, kind: &str, out: &mut Vec<Node<'t>>) {
    if node.kind() == kind {
        out.push(node);
    }
    for child in node.children(&mut node.walk()) {
        collect_by_kind(child, kind, out);
    }
}

/// Builds a `CodeLocation` spanning `node`'s full byte/line/column range,
/// stamped with the file path from `ctx`. Tree-sitter rows/columns are
/// 0-based; `start_lineno`/`end_lineno` are stored 1-based per the data
/// model.
pub(crate) fn node_location(ctx: &QueryContext, node: Node) -> CodeLocation {
    let start = node.start_position();
    let end = node.end_position();
    CodeLocation::new(
        ctx.file_path.to_path_buf(),
        start.row as u32 + 1,
        start.column as u32,
        end.row as u32 + 1,
        end.column as u32,
        node.start_byte() as u32,
        node.end_byte() as u32,
    )
}
