//! Graph construction, reachability pruning, and Tarjan SCC computation.
//!
//! Transcribed from `simple_analyzer.py`'s `get_call_graph`/`get_subgraph`
//! and their `_reachable_mask`/`_prune_to_mask`/`_tarjan_scc`/`_scc_edges`
//! helpers.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use crate::index::CrossRefIndex;
use crate::model::{PureDefinition, Symbol};

use super::{CallEdge, CallGraph, CallGraphStats, Direction, EdgeKind, GraphConstructOptions, UnresolvedCall};

pub fn build_call_graph(index: &CrossRefIndex, options: &GraphConstructOptions) -> CallGraph {
    let start = Instant::now();

    let mut nodes: Vec<PureDefinition> = Vec::new();
    let mut owners: Vec<Symbol> = Vec::new();
    let mut index_of: HashMap<PureDefinition, usize> = HashMap::new();

    for symbol in index.symbols() {
        for def in index.get_definitions(symbol) {
            let pd = def.to_pure();
            index_of.entry(pd.clone()).or_insert_with(|| {
                nodes.push(pd.clone());
                owners.push(symbol.clone());
                nodes.len() - 1
            });
        }
    }

    let mut edges: Vec<CallEdge> = Vec::new();
    let mut unresolved: Vec<UnresolvedCall> = Vec::new();
    let mut def_defs_cache: HashMap<Symbol, Vec<PureDefinition>> = HashMap::new();

    // Node set can grow while edges reference definitions the index doesn't
    // expose via `symbols()` for some other owner; mirror the original's
    // on-demand node-insertion inside `add_edge` by looking the owner back
    // up in the index the same way `find_full_definition` would.
    let ensure_node = |pd: &PureDefinition,
                           nodes: &mut Vec<PureDefinition>,
                           owners: &mut Vec<Symbol>,
                           index_of: &mut HashMap<PureDefinition, usize>|
     -> Option<usize> {
        if let Some(&i) = index_of.get(pd) {
            return Some(i);
        }
        for symbol in index.symbols() {
            if index.get_definitions(symbol).iter().any(|d| &d.to_pure() == pd) {
                let i = nodes.len();
                nodes.push(pd.clone());
                owners.push(symbol.clone());
                index_of.insert(pd.clone(), i);
                return Some(i);
            }
        }
        None
    };

    for symbol in index.symbols() {
        for def in index.get_definitions(symbol) {
            let caller_pd = def.to_pure();
            for symref in &def.calls {
                let callee = &symref.symbol;
                let targets = def_defs_cache
                    .entry(callee.clone())
                    .or_insert_with(|| index.get_definitions(callee).iter().map(|d| d.to_pure()).collect());

                if targets.is_empty() {
                    unresolved.push(UnresolvedCall {
                        caller_def: caller_pd.clone(),
                        via_symbol: callee.clone(),
                        call_sites: vec![symref.reference.clone()],
                        reason: "no_definitions_found".to_string(),
                    });
                    continue;
                }

                if targets.len() == 1 {
                    let target = targets[0].clone();
                    if let (Some(src), Some(dst)) = (
                        ensure_node(&caller_pd, &mut nodes, &mut owners, &mut index_of),
                        ensure_node(&target, &mut nodes, &mut owners, &mut index_of),
                    ) {
                        edges.push(CallEdge { src, dst, kind: EdgeKind::Must });
                    }
                } else if options.expand_calls {
                    for target in targets.clone() {
                        if let (Some(src), Some(dst)) = (
                            ensure_node(&caller_pd, &mut nodes, &mut owners, &mut index_of),
                            ensure_node(&target, &mut nodes, &mut owners, &mut index_of),
                        ) {
                            edges.push(CallEdge { src, dst, kind: EdgeKind::May });
                        }
                    }
                } else {
                    unresolved.push(UnresolvedCall {
                        caller_def: caller_pd.clone(),
                        via_symbol: callee.clone(),
                        call_sites: vec![symref.reference.clone()],
                        reason: "ambiguous_targets".to_string(),
                    });
                }
            }
        }
    }

    dedup_edges(&mut edges);

    match options.direction {
        Direction::Forward => {}
        Direction::Backward => {
            for e in &mut edges {
                std::mem::swap(&mut e.src, &mut e.dst);
            }
        }
        Direction::Both => {
            let reversed: Vec<CallEdge> =
                edges.iter().map(|e| CallEdge { src: e.dst, dst: e.src, kind: e.kind }).collect();
            edges.extend(reversed);
            dedup_edges(&mut edges);
        }
    }

    let (mut nodes, mut owners, mut edges) = (nodes, owners, edges);
    if let Some(entrypoints) = &options.entrypoints {
        let mask = reachable_mask(&nodes, &edges, Some(entrypoints), false, None);
        let (n, o, _idx, e) = prune_to_mask(&nodes, &owners, &edges, &mask);
        nodes = n;
        owners = o;
        edges = e;
    }

    let (sccs, scc_edges) = if options.compute_scc {
        let node_to_scc = tarjan_scc(nodes.len(), &edges);
        let sccs = sccs_from_assignment(&node_to_scc);
        let scc_edges = scc_edges_from(&edges, &node_to_scc);
        (sccs, scc_edges)
    } else {
        (Vec::new(), Vec::new())
    };

    CallGraph {
        stats: CallGraphStats {
            num_nodes: nodes.len(),
            num_edges: edges.len(),
            unresolved_calls: unresolved.len(),
            build_seconds: Some(start.elapsed().as_secs_f64()),
        },
        nodes,
        owners,
        edges,
        sccs,
        scc_edges,
        unresolved,
    }
}

pub fn get_subgraph(
    graph: &CallGraph,
    roots: Option<&[usize]>,
    depth: Option<usize>,
    include_reverse: bool,
) -> CallGraph {
    let no_roots = roots.is_none_or(|r| r.is_empty());
    if no_roots && depth.is_none() && !include_reverse {
        return graph.clone();
    }

    let entrypoints: Option<Vec<PureDefinition>> =
        roots.filter(|r| !r.is_empty()).map(|r| r.iter().filter_map(|&i| graph.nodes.get(i).cloned()).collect());

    let mask = reachable_mask(&graph.nodes, &graph.edges, entrypoints.as_deref(), include_reverse, depth);
    let (nodes, owners, _idx, edges) = prune_to_mask(&graph.nodes, &graph.owners, &graph.edges, &mask);

    let node_to_scc = tarjan_scc(nodes.len(), &edges);
    let sccs = sccs_from_assignment(&node_to_scc);
    let scc_edges = scc_edges_from(&edges, &node_to_scc);

    CallGraph {
        stats: CallGraphStats {
            num_nodes: nodes.len(),
            num_edges: edges.len(),
            unresolved_calls: graph.unresolved.len(),
            build_seconds: None,
        },
        nodes,
        owners,
        edges,
        sccs,
        scc_edges,
        unresolved: graph.unresolved.clone(),
    }
}

fn dedup_edges(edges: &mut Vec<CallEdge>) {
    let mut seen = std::collections::HashSet::new();
    edges.retain(|e| seen.insert((e.src, e.dst, e.kind)));
}

pub(crate) fn reachable_mask(
    nodes: &[PureDefinition],
    edges: &[CallEdge],
    entrypoints: Option<&[PureDefinition]>,
    include_reverse: bool,
    depth: Option<usize>,
) -> Vec<bool> {
    let Some(entrypoints) = entrypoints else {
        return vec![true; nodes.len()];
    };
    if entrypoints.is_empty() {
        return vec![true; nodes.len()];
    }

    let index_of: HashMap<&PureDefinition, usize> =
        nodes.iter().enumerate().map(|(i, n)| (n, i)).collect();

    let mut adj: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut radj: HashMap<usize, Vec<usize>> = HashMap::new();
    for e in edges {
        adj.entry(e.src).or_default().push(e.dst);
        radj.entry(e.dst).or_default().push(e.src);
    }

    let mut seen = std::collections::HashSet::new();
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    for ep in entrypoints {
        if let Some(&i) = index_of.get(ep) {
            if seen.insert(i) {
                queue.push_back((i, 0));
            }
        }
    }

    while let Some((u, d)) = queue.pop_front() {
        if let Some(limit) = depth {
            if d >= limit {
                continue;
            }
        }
        if let Some(neighbors) = adj.get(&u) {
            for &v in neighbors {
                if seen.insert(v) {
                    queue.push_back((v, d + 1));
                }
            }
        }
        if include_reverse {
            if let Some(neighbors) = radj.get(&u) {
                for &v in neighbors {
                    if seen.insert(v) {
                        queue.push_back((v, d + 1));
                    }
                }
            }
        }
    }

    let mut mask = vec![false; nodes.len()];
    for i in seen {
        mask[i] = true;
    }
    mask
}

pub(crate) fn prune_to_mask(
    nodes: &[PureDefinition],
    owners: &[Symbol],
    edges: &[CallEdge],
    mask: &[bool],
) -> (Vec<PureDefinition>, Vec<Symbol>, HashMap<usize, usize>, Vec<CallEdge>) {
    let mut new_indices = HashMap::new();
    let mut new_nodes = Vec::new();
    let mut new_owners = Vec::new();
    for (i, &keep) in mask.iter().enumerate() {
        if keep {
            new_indices.insert(i, new_nodes.len());
            new_nodes.push(nodes[i].clone());
            new_owners.push(owners[i].clone());
        }
    }

    let new_edges = edges
        .iter()
        .filter(|e| mask[e.src] && mask[e.dst])
        .map(|e| CallEdge { src: new_indices[&e.src], dst: new_indices[&e.dst], kind: e.kind })
        .collect();

    (new_nodes, new_owners, new_indices, new_edges)
}

/// Classic Tarjan: returns each node's SCC id.
pub(crate) fn tarjan_scc(n: usize, edges: &[CallEdge]) -> Vec<usize> {
    let mut adj: HashMap<usize, Vec<usize>> = HashMap::new();
    for e in edges {
        adj.entry(e.src).or_default().push(e.dst);
    }

    let mut index = 0usize;
    let mut indices = vec![usize::MAX; n];
    let mut lowlink = vec![0usize; n];
    let mut onstack = vec![false; n];
    let mut stack = Vec::new();
    let mut node_to_scc = vec![usize::MAX; n];
    let mut next_scc = 0usize;

    struct Frame {
        v: usize,
        iter_pos: usize,
    }

    for start in 0..n {
        if indices[start] != usize::MAX {
            continue;
        }
        let mut call_stack = vec![Frame { v: start, iter_pos: 0 }];
        indices[start] = index;
        lowlink[start] = index;
        index += 1;
        stack.push(start);
        onstack[start] = true;

        while let Some(frame) = call_stack.last_mut() {
            let v = frame.v;
            let neighbors = adj.get(&v).cloned().unwrap_or_default();
            if frame.iter_pos < neighbors.len() {
                let w = neighbors[frame.iter_pos];
                frame.iter_pos += 1;
                if indices[w] == usize::MAX {
                    indices[w] = index;
                    lowlink[w] = index;
                    index += 1;
                    stack.push(w);
                    onstack[w] = true;
                    call_stack.push(Frame { v: w, iter_pos: 0 });
                } else if onstack[w] {
                    lowlink[v] = lowlink[v].min(indices[w]);
                }
            } else {
                call_stack.pop();
                if let Some(parent) = call_stack.last() {
                    lowlink[parent.v] = lowlink[parent.v].min(lowlink[v]);
                }
                if lowlink[v] == indices[v] {
                    loop {
                        let w = stack.pop().unwrap();
                        onstack[w] = false;
                        node_to_scc[w] = next_scc;
                        if w == v {
                            break;
                        }
                    }
                    next_scc += 1;
                }
            }
        }
    }

    node_to_scc
}

pub(crate) fn sccs_from_assignment(node_to_scc: &[usize]) -> Vec<Vec<usize>> {
    if node_to_scc.is_empty() {
        return Vec::new();
    }
    let num_sccs = node_to_scc.iter().max().map(|&m| m + 1).unwrap_or(0);
    let mut sccs = vec![Vec::new(); num_sccs];
    for (node, &scc) in node_to_scc.iter().enumerate() {
        sccs[scc].push(node);
    }
    sccs
}

pub(crate) fn scc_edges_from(edges: &[CallEdge], node_to_scc: &[usize]) -> Vec<(usize, usize)> {
    let mut pairs = std::collections::HashSet::new();
    for e in edges {
        let su = node_to_scc[e.src];
        let sv = node_to_scc[e.dst];
        if su != sv {
            pairs.insert((su, sv));
        }
    }
    let mut out: Vec<_> = pairs.into_iter().collect();
    out.sort_unstable();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CodeLocation, Definition, SymbolReference};

    fn loc(path: &str, line: u32) -> CodeLocation {
        CodeLocation::new(path, line, 0, line, 10, 0, 10)
    }

    fn make_index() -> CrossRefIndex {
        let mut idx = CrossRefIndex::new();
        let main = Symbol::Function { name: "main".into() };
        let helper = Symbol::Function { name: "helper".into() };

        let main_def = Definition::new(loc("a.c", 1)).with_calls(vec![SymbolReference {
            symbol: helper.clone(),
            reference: crate::model::PureReference { location: loc("a.c", 2) },
        }]);
        idx.add_definition(main.clone(), main_def);
        idx.add_definition(helper.clone(), Definition::new(loc("a.c", 10)));
        idx
    }

    #[test]
    fn builds_a_must_edge_for_a_unique_callee() {
        let idx = make_index();
        let graph = build_call_graph(&idx, &GraphConstructOptions::default());
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].kind, EdgeKind::Must);
        assert!(graph.unresolved.is_empty());
    }

    #[test]
    fn unresolved_call_is_recorded_when_callee_has_no_definitions() {
        let mut idx = CrossRefIndex::new();
        let main = Symbol::Function { name: "main".into() };
        let ghost = Symbol::Function { name: "ghost".into() };
        let main_def = Definition::new(loc("a.c", 1)).with_calls(vec![SymbolReference {
            symbol: ghost,
            reference: crate::model::PureReference { location: loc("a.c", 2) },
        }]);
        idx.add_definition(main, main_def);
        // Adding a `Definition` mirrors a bare `Reference` for `ghost` with no
        // `Definition` entry — get_definitions(ghost) stays empty.

        let graph = build_call_graph(&idx, &GraphConstructOptions::default());
        assert_eq!(graph.unresolved.len(), 1);
        assert_eq!(graph.unresolved[0].reason, "no_definitions_found");
    }

    #[test]
    fn self_loop_forms_its_own_scc() {
        let mut idx = CrossRefIndex::new();
        let f = Symbol::Function { name: "f".into() };
        let def = Definition::new(loc("a.c", 1)).with_calls(vec![SymbolReference {
            symbol: f.clone(),
            reference: crate::model::PureReference { location: loc("a.c", 2) },
        }]);
        idx.add_definition(f, def);

        let graph = build_call_graph(&idx, &GraphConstructOptions::default());
        assert_eq!(graph.sccs.len(), 1);
        assert_eq!(graph.sccs[0].len(), 1);
    }

    #[test]
    fn direction_backward_reverses_edges() {
        let idx = make_index();
        let mut opts = GraphConstructOptions::default();
        opts.direction = Direction::Backward;
        let graph = build_call_graph(&idx, &opts);
        let forward = build_call_graph(&idx, &GraphConstructOptions::default());
        assert_eq!(graph.edges[0].src, forward.edges[0].dst);
        assert_eq!(graph.edges[0].dst, forward.edges[0].src);
    }
}
