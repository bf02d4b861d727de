//! Call-graph analyzer: definition-level graph construction, Tarjan SCC,
//! reachability-based subgraph extraction, depth-bounded k-path enumeration,
//! and SCC-topological BFS traversal.
//!
//! Types and algorithms are transcribed from
//! `examples/original_source/code_index/analyzer/models.py` and
//! `analyzer/simple_analyzer.py`: node indices are stable integers assigned
//! in first-seen order, edges reference nodes by index for compact
//! serialization, and SCCs/the SCC-DAG are represented by integer ids.

mod build;
mod paths;
mod traverse;

pub use build::{build_call_graph, get_subgraph};
pub use paths::find_paths;
pub use traverse::bfs_traverse_graph;

use serde::{Deserialize, Serialize};

use crate::model::{PureDefinition, PureReference, Symbol, SymbolDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Must,
    May,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    pub src: usize,
    pub dst: usize,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CallGraphStats {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub unresolved_calls: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_seconds: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnresolvedCall {
    pub caller_def: PureDefinition,
    pub via_symbol: Symbol,
    pub call_sites: Vec<PureReference>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallGraph {
    pub nodes: Vec<PureDefinition>,
    pub owners: Vec<Symbol>,
    pub edges: Vec<CallEdge>,
    pub sccs: Vec<Vec<usize>>,
    pub scc_edges: Vec<(usize, usize)>,
    pub unresolved: Vec<UnresolvedCall>,
    pub stats: CallGraphStats,
}

#[derive(Debug, Clone)]
pub struct GraphConstructOptions {
    pub expand_calls: bool,
    pub direction: Direction,
    pub entrypoints: Option<Vec<PureDefinition>>,
    pub compute_scc: bool,
}

impl Default for GraphConstructOptions {
    fn default() -> Self {
        Self { expand_calls: true, direction: Direction::Forward, entrypoints: None, compute_scc: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathReturnMode {
    Node,
    Scc,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntraSccStrategy {
    None,
    Shortest,
    BoundedEnumerate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePath {
    pub nodes: Vec<SymbolDefinition>,
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.nodes.iter().map(|sd| symbol_display(&sd.symbol)).collect();
        write!(f, "{}", parts.join("->"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SccPath {
    pub scc_ids: Vec<usize>,
}

impl std::fmt::Display for SccPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.scc_ids.is_empty() {
            return write!(f, "SCC[]");
        }
        let parts: Vec<String> = self.scc_ids.iter().map(|i| format!("SCC[{i}]")).collect();
        write!(f, "{}", parts.join("->"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridSegment {
    pub scc_id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<SymbolDefinition>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridPath {
    pub segments: Vec<HybridSegment>,
}

impl std::fmt::Display for HybridPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .segments
            .iter()
            .map(|seg| {
                let head = format!("SCC[{}]", seg.scc_id);
                match &seg.nodes {
                    Some(nodes) if !nodes.is_empty() => {
                        let names: Vec<String> =
                            nodes.iter().map(|sd| symbol_display(&sd.symbol)).collect();
                        format!("{head}({})", names.join("->"))
                    }
                    _ => head,
                }
            })
            .collect();
        write!(f, "{}", parts.join("->"))
    }
}

fn symbol_display(symbol: &Symbol) -> String {
    match symbol {
        Symbol::Method { name, class_name: Some(class) } => format!("{class}.{name}"),
        Symbol::Method { name, class_name: None } => name.clone(),
        Symbol::Function { name } => name.clone(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PathValue {
    Node(NodePath),
    Scc(SccPath),
    Hybrid(HybridPath),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindPathsResult {
    pub mode: PathReturnMode,
    pub paths: Vec<PathValue>,
}
