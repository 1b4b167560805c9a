// mulerift/src/engine/resolver.rs
//
// Stage 3 — one label per cluster, then a total order over clusters.
//
// Label: highest-priority kind among the contributing raw groups
// (cycle > smurfing > shell), not the first one seen.
// Order: members alphabetical; clusters by their smallest member. Clusters
// are disjoint, so smallest members are unique and the order is total.

use super::merger::MergedCluster;
use crate::events::{AccountId, PatternKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCluster {
    pub members: Vec<AccountId>,
    pub pattern: PatternKind,
    pub groups:  Vec<usize>,
}

impl ResolvedCluster {
    pub fn sort_key(&self) -> &str {
        self.members.first().map(String::as_str).unwrap_or("")
    }
}

pub fn resolve_pattern(kinds: &[PatternKind]) -> PatternKind {
    PatternKind::highest(kinds.iter().copied()).unwrap_or(PatternKind::Shell)
}

pub fn resolve(clusters: Vec<MergedCluster>) -> Vec<ResolvedCluster> {
    let mut out: Vec<ResolvedCluster> = clusters
        .into_iter()
        .map(|c| ResolvedCluster {
            pattern: resolve_pattern(&c.kinds),
            // BTreeSet iteration is already sorted and unique
            members: c.members.into_iter().collect(),
            groups:  c.groups,
        })
        .collect();

    out.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
    out
}
