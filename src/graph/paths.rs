//! Depth-bounded k-path enumeration, at node, SCC, or hybrid granularity.
//!
//! `_dfs_k_paths` is transcribed directly from `simple_analyzer.py`: plain
//! backtracking DFS, no vertex repeated, stops at `k` found paths or
//! `max_depth`. The hybrid mode's intra-SCC expansion goes beyond the
//! original, which emits unexpanded SCC segments "for simplicity" — here
//! `Shortest` and `BoundedEnumerate` actually walk the induced subgraph of
//! each SCC to produce a node sequence for the segment.

use std::collections::{HashMap, VecDeque};

use crate::error::GraphError;
use crate::model::SymbolDefinition;

use super::build::{scc_edges_from, sccs_from_assignment, tarjan_scc};
use super::{
    CallGraph, FindPathsResult, HybridPath, HybridSegment, IntraSccStrategy, NodePath,
    PathReturnMode, PathValue, SccPath,
};

fn adjacency(graph: &CallGraph) -> HashMap<usize, Vec<usize>> {
    let mut adj: HashMap<usize, Vec<usize>> = HashMap::new();
    for e in &graph.edges {
        adj.entry(e.src).or_default().push(e.dst);
    }
    adj
}

/// Backtracking DFS enumeration of up to `k` simple paths from `src` to
/// `dst`. Neighbors are explored in adjacency-list (insertion) order, making
/// output deterministic.
fn dfs_k_paths(
    adj: &HashMap<usize, Vec<usize>>,
    src: usize,
    dst: usize,
    k: usize,
    max_depth: Option<usize>,
) -> Vec<Vec<usize>> {
    let mut paths = Vec::new();
    let mut path = Vec::new();

    fn dfs(
        u: usize,
        depth: usize,
        dst: usize,
        adj: &HashMap<usize, Vec<usize>>,
        k: usize,
        max_depth: Option<usize>,
        path: &mut Vec<usize>,
        paths: &mut Vec<Vec<usize>>,
    ) {
        if paths.len() >= k {
            return;
        }
        if let Some(limit) = max_depth {
            if depth > limit {
                return;
            }
        }
        path.push(u);
        if u == dst {
            paths.push(path.clone());
            path.pop();
            return;
        }
        if let Some(neighbors) = adj.get(&u) {
            for &v in neighbors {
                if path.contains(&v) {
                    continue;
                }
                dfs(v, depth + 1, dst, adj, k, max_depth, path, paths);
                if paths.len() >= k {
                    break;
                }
            }
        }
        path.pop();
    }

    dfs(src, 0, dst, adj, k, max_depth, &mut path, &mut paths);
    paths
}

#[allow(clippy::too_many_arguments)]
pub fn find_paths(
    graph: &CallGraph,
    src_idx: usize,
    dst_idx: usize,
    k: usize,
    max_depth: Option<usize>,
    return_mode: PathReturnMode,
    intra_scc: IntraSccStrategy,
    intra_scc_step_cap: usize,
) -> Result<FindPathsResult, GraphError> {
    if src_idx >= graph.nodes.len() {
        return Err(GraphError::NodeOutOfBounds { idx: src_idx, len: graph.nodes.len() });
    }
    if dst_idx >= graph.nodes.len() {
        return Err(GraphError::NodeOutOfBounds { idx: dst_idx, len: graph.nodes.len() });
    }

    let adj = adjacency(graph);

    if return_mode == PathReturnMode::Scc {
        let (node_to_scc, sccs) = scc_assignment(graph);
        let (Some(&src_scc), Some(&dst_scc)) = (
            node_to_scc.get(&src_idx),
            node_to_scc.get(&dst_idx),
        ) else {
            return Err(GraphError::SccUnavailable {
                reason: "stored SCC data does not cover every node in the graph".to_string(),
            });
        };

        let scc_edges = if graph.scc_edges.is_empty() && !sccs.is_empty() {
            scc_edges_from(&graph.edges, &assignment_vec(&node_to_scc, graph.nodes.len()))
        } else {
            graph.scc_edges.clone()
        };
        let mut dag_adj: HashMap<usize, Vec<usize>> = HashMap::new();
        for &(u, v) in &scc_edges {
            dag_adj.entry(u).or_default().push(v);
        }

        let scc_paths = dfs_k_paths(&dag_adj, src_scc, dst_scc, k, max_depth);
        return Ok(FindPathsResult {
            mode: PathReturnMode::Scc,
            paths: scc_paths.into_iter().map(|p| PathValue::Scc(SccPath { scc_ids: p })).collect(),
        });
    }

    let node_paths = dfs_k_paths(&adj, src_idx, dst_idx, k, max_depth);

    if return_mode == PathReturnMode::Node {
        let paths = node_paths
            .into_iter()
            .map(|p| {
                PathValue::Node(NodePath {
                    nodes: p
                        .into_iter()
                        .map(|i| SymbolDefinition {
                            symbol: graph.owners[i].clone(),
                            definition: graph.nodes[i].clone(),
                        })
                        .collect(),
                })
            })
            .collect();
        return Ok(FindPathsResult { mode: PathReturnMode::Node, paths });
    }

    // Hybrid.
    let (node_to_scc, sccs) = scc_assignment(graph);

    let hybrid_paths = node_paths
        .into_iter()
        .map(|p| hybrid_path_for(graph, &p, &node_to_scc, &sccs, intra_scc, intra_scc_step_cap))
        .collect();

    Ok(FindPathsResult { mode: PathReturnMode::Hybrid, paths: hybrid_paths })
}

/// Returns a node→SCC mapping. If the graph was built with `compute_scc:
/// false` (or its `sccs` are otherwise missing), SCCs are computed fresh
/// here. If `sccs` are present but stale — left over from a prior, different
/// node set, so they don't cover every node — that staleness is surfaced by
/// `find_paths` as `GraphError::SccUnavailable` rather than silently treated
/// as "no path".
fn scc_assignment(graph: &CallGraph) -> (HashMap<usize, usize>, Vec<Vec<usize>>) {
    if !graph.sccs.is_empty() {
        let mut node_to_scc = HashMap::new();
        for (sid, comp) in graph.sccs.iter().enumerate() {
            for &n in comp {
                node_to_scc.insert(n, sid);
            }
        }
        return (node_to_scc, graph.sccs.clone());
    }
    let assignment = tarjan_scc(graph.nodes.len(), &graph.edges);
    let sccs = sccs_from_assignment(&assignment);
    let node_to_scc = assignment.iter().enumerate().map(|(n, &sid)| (n, sid)).collect();
    (node_to_scc, sccs)
}

fn assignment_vec(node_to_scc: &HashMap<usize, usize>, n: usize) -> Vec<usize> {
    (0..n).map(|i| *node_to_scc.get(&i).unwrap_or(&usize::MAX)).collect()
}

fn hybrid_path_for(
    graph: &CallGraph,
    node_path: &[usize],
    node_to_scc: &HashMap<usize, usize>,
    sccs: &[Vec<usize>],
    intra_scc: IntraSccStrategy,
    step_cap: usize,
) -> PathValue {
    let mut segments: Vec<HybridSegment> = Vec::new();

    let scc_of = |i: usize| node_to_scc.get(&i).copied();

    let mut i = 0;
    while i < node_path.len() {
        let sid = match scc_of(node_path[i]) {
            Some(sid) => sid,
            None => {
                i += 1;
                continue;
            }
        };
        let mut j = i;
        while j + 1 < node_path.len() && scc_of(node_path[j + 1]) == Some(sid) {
            j += 1;
        }
        let entry = node_path[i];
        let exit = node_path[j];
        let nodes = expand_intra_scc(graph, sccs.get(sid).map(|v| v.as_slice()).unwrap_or(&[]), entry, exit, intra_scc, step_cap);
        segments.push(HybridSegment { scc_id: sid, nodes });
        i = j + 1;
    }

    PathValue::Hybrid(HybridPath { segments })
}

fn expand_intra_scc(
    graph: &CallGraph,
    component: &[usize],
    entry: usize,
    exit: usize,
    strategy: IntraSccStrategy,
    step_cap: usize,
) -> Option<Vec<SymbolDefinition>> {
    if strategy == IntraSccStrategy::None {
        return None;
    }
    if entry == exit {
        return Some(vec![SymbolDefinition { symbol: graph.owners[entry].clone(), definition: graph.nodes[entry].clone() }]);
    }

    let in_component: std::collections::HashSet<usize> = component.iter().copied().collect();
    let mut adj: HashMap<usize, Vec<usize>> = HashMap::new();
    for e in &graph.edges {
        if in_component.contains(&e.src) && in_component.contains(&e.dst) {
            adj.entry(e.src).or_default().push(e.dst);
        }
    }

    let path = match strategy {
        IntraSccStrategy::Shortest => bfs_shortest(&adj, entry, exit, step_cap),
        IntraSccStrategy::BoundedEnumerate => {
            dfs_k_paths(&adj, entry, exit, 1, Some(step_cap)).into_iter().next()
        }
        IntraSccStrategy::None => unreachable!(),
    }?;

    Some(
        path.into_iter()
            .map(|i| SymbolDefinition { symbol: graph.owners[i].clone(), definition: graph.nodes[i].clone() })
            .collect(),
    )
}

fn bfs_shortest(adj: &HashMap<usize, Vec<usize>>, src: usize, dst: usize, step_cap: usize) -> Option<Vec<usize>> {
    let mut visited = std::collections::HashSet::new();
    let mut queue = VecDeque::new();
    let mut parent: HashMap<usize, usize> = HashMap::new();
    queue.push_back((src, 0usize));
    visited.insert(src);

    while let Some((u, d)) = queue.pop_front() {
        if u == dst {
            let mut path = vec![dst];
            let mut cur = dst;
            while let Some(&p) = parent.get(&cur) {
                path.push(p);
                cur = p;
            }
            path.reverse();
            return Some(path);
        }
        if d >= step_cap {
            continue;
        }
        if let Some(neighbors) = adj.get(&u) {
            for &v in neighbors {
                if visited.insert(v) {
                    parent.insert(v, u);
                    queue.push_back((v, d + 1));
                }
            }
        }
    }
    None
}
