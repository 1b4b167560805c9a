// mulerift/src/engine/merger.rs
//
// Stage 2 — merge raw groups that share at least one account.
//
// "Shares an account" is closed transitively: {A,B} {B,C} {C,D} become one
// cluster even though the first and last groups never touch. Pattern kind
// plays no part in merging; each cluster carries the kinds that fed it so the
// resolver never has to look back at the raw list.
//
// Two strategies, same partition:
//   Indexed      — reverse index account → first group seen, union-find over
//                  group indices. One pass over all members.
//   OverlapGraph — undirected graph of groups, an edge per non-empty pairwise
//                  intersection, connected components. O(groups²).

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use tracing::debug;

use super::collector::TaggedGroup;
use crate::config::MergeStrategy;
use crate::events::{AccountId, PatternKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedCluster {
    pub members: BTreeSet<AccountId>,
    /// Kind of every contributing raw group (a multiset, in collection order).
    pub kinds:   Vec<PatternKind>,
    /// Indices into the collected group list, ascending.
    pub groups:  Vec<usize>,
}

/// Merge raw groups into disjoint clusters. Empty groups are dropped and never
/// produce a cluster. Clusters come back ordered by their first raw group.
pub fn merge(groups: &[TaggedGroup], strategy: MergeStrategy) -> Vec<MergedCluster> {
    let live: Vec<usize> = groups
        .iter()
        .enumerate()
        .filter(|(_, g)| !g.is_empty())
        .map(|(i, _)| i)
        .collect();

    let dropped = groups.len() - live.len();
    if dropped > 0 {
        debug!("dropped {} empty raw groups before merging", dropped);
    }

    let components = match strategy {
        MergeStrategy::Indexed      => indexed_components(groups, &live),
        MergeStrategy::OverlapGraph => overlap_graph_components(groups, &live),
    };

    let clusters: Vec<MergedCluster> = components
        .into_iter()
        .map(|idx| assemble(groups, idx))
        .collect();

    debug!("merged {} raw groups into {} clusters ({:?})", live.len(), clusters.len(), strategy);
    clusters
}

fn indexed_components(groups: &[TaggedGroup], live: &[usize]) -> Vec<Vec<usize>> {
    let mut uf = UnionFind::<usize>::new(groups.len());
    let mut owner: HashMap<&str, usize> = HashMap::new();

    for &i in live {
        for account in &groups[i].members {
            match owner.entry(account.as_str()) {
                Entry::Occupied(first) => {
                    uf.union(*first.get(), i);
                }
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
            }
        }
    }

    let mut by_root: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Vec<usize>> = Vec::new();
    for &i in live {
        let slot = *by_root.entry(uf.find(i)).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[slot].push(i);
    }
    components
}

fn overlap_graph_components(groups: &[TaggedGroup], live: &[usize]) -> Vec<Vec<usize>> {
    let sets: Vec<HashSet<&str>> = live
        .iter()
        .map(|&i| groups[i].members.iter().map(String::as_str).collect())
        .collect();

    let mut graph = UnGraph::<usize, ()>::with_capacity(live.len(), 0);
    let nodes: Vec<NodeIndex> = live.iter().map(|&i| graph.add_node(i)).collect();

    for x in 0..sets.len() {
        for y in (x + 1)..sets.len() {
            if !sets[x].is_disjoint(&sets[y]) {
                graph.add_edge(nodes[x], nodes[y], ());
            }
        }
    }

    let mut components: Vec<Vec<usize>> = kosaraju_scc(&graph)
        .into_iter()
        .map(|comp| {
            let mut idx: Vec<usize> = comp.into_iter().map(|n| graph[n]).collect();
            idx.sort_unstable();
            idx
        })
        .collect();
    components.sort_unstable_by_key(|idx| idx[0]);
    components
}

fn assemble(groups: &[TaggedGroup], idx: Vec<usize>) -> MergedCluster {
    let mut members = BTreeSet::new();
    let mut kinds = Vec::with_capacity(idx.len());
    for &i in &idx {
        members.extend(groups[i].members.iter().cloned());
        kinds.push(groups[i].kind);
    }
    MergedCluster { members, kinds, groups: idx }
}
