// mulerift/src/engine/scorer.rs
//
// Stage 4 — ring ids and ring risk scores.
//
//   base_avg   = Σ score[a] / |members|    (missing accounts add 0, still counted)
//   bonus      = 25 × |{a : multiplicity[a] > 1}|
//   risk_score = round1(min(base_avg + bonus, 100))
//
// Multiplicity is taken from the raw groups before merging. With the default
// scope only cycle groups count, so a large shell or smurfing group alone
// never earns the bonus.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::collector::TaggedGroup;
use super::resolver::ResolvedCluster;
use crate::config::{BonusScope, RingConfig};
use crate::error::{Result, RingError};
use crate::events::{AccountId, FraudRing, PatternKind, ScoreMap};

// ── Multiplicity ──────────────────────────────────────────────────────────────

/// account → number of distinct raw groups (within scope) containing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Multiplicity {
    counts: HashMap<AccountId, usize>,
}

impl Multiplicity {
    pub fn build(groups: &[TaggedGroup], scope: BonusScope) -> Self {
        let mut counts: HashMap<AccountId, usize> = HashMap::new();
        for group in groups.iter().filter(|g| in_scope(g.kind, scope)) {
            // An account listed twice in one group is still one membership
            let unique: HashSet<&AccountId> = group.members.iter().collect();
            for account in unique {
                *counts.entry(account.clone()).or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    pub fn count(&self, account: &str) -> usize {
        self.counts.get(account).copied().unwrap_or(0)
    }

    pub fn is_overlapping(&self, account: &str) -> bool {
        self.count(account) > 1
    }

    pub fn overlapping_accounts(&self) -> usize {
        self.counts.values().filter(|&&c| c > 1).count()
    }
}

fn in_scope(kind: PatternKind, scope: BonusScope) -> bool {
    match scope {
        BonusScope::CycleOnly  => kind == PatternKind::Cycle,
        BonusScope::AnyPattern => true,
    }
}

// ── Scores ────────────────────────────────────────────────────────────────────

/// Reject NaN / infinite base scores on ring members; one bad entry would
/// poison that ring's mean. Scores of accounts outside every ring are never
/// read and are not checked.
pub fn validate_member_scores(clusters: &[ResolvedCluster], scores: &ScoreMap) -> Result<()> {
    let bad = clusters
        .iter()
        .flat_map(|c| c.members.iter())
        .filter(|a| scores.get(*a).map(|s| !s.score.is_finite()).unwrap_or(false))
        .min();
    match bad {
        Some(account) => Err(RingError::InvalidScore { account: account.clone() }),
        None => Ok(()),
    }
}

/// One decimal, ties to even on the exact binary value. The formatter works
/// on the exact decimal expansion, so 10.25 → 10.2 and 1.15 (stored just
/// below) → 1.1; scaling by 10 first would add its own error.
pub fn round1(x: f64) -> f64 {
    format!("{:.1}", x).parse::<f64>().unwrap_or(x)
}

pub fn ring_score(
    members:      &[AccountId],
    scores:       &ScoreMap,
    multiplicity: &Multiplicity,
    cfg:          &RingConfig,
) -> f64 {
    if members.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    let mut overlapping = 0usize;
    for account in members {
        match scores.get(account) {
            Some(s) => total += s.score,
            None    => debug!("no base score for {}; counting as 0", account),
        }
        if multiplicity.is_overlapping(account) {
            overlapping += 1;
        }
    }

    let base_avg = total / members.len() as f64;
    let bonus = cfg.bonus_per_overlap * overlapping as f64;
    round1((base_avg + bonus).min(cfg.score_cap))
}

// ── Ids ───────────────────────────────────────────────────────────────────────

/// `RING_001` for `idx = 1` under the default config.
pub fn ring_id(idx: usize, cfg: &RingConfig) -> String {
    format!("{}_{:0width$}", cfg.id_prefix, idx, width = cfg.id_width)
}

/// Number the ordered clusters and score each one.
pub fn assign(
    clusters:     Vec<ResolvedCluster>,
    scores:       &ScoreMap,
    multiplicity: &Multiplicity,
    cfg:          &RingConfig,
) -> Result<Vec<FraudRing>> {
    if clusters.len() > cfg.max_rings() {
        warn!(
            "{} rings do not fit {}-digit ids; raise id_width",
            clusters.len(),
            cfg.id_width
        );
        return Err(RingError::RingIdSpaceExhausted {
            rings: clusters.len(),
            width: cfg.id_width,
        });
    }

    Ok(clusters
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let risk_score = ring_score(&c.members, scores, multiplicity, cfg);
            FraudRing {
                ring_id:         ring_id(i + 1, cfg),
                member_accounts: c.members,
                pattern_type:    c.pattern,
                risk_score,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::AccountScore;

    fn ids(v: &[&str]) -> Vec<AccountId> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn tg(kind: PatternKind, v: &[&str]) -> TaggedGroup {
        TaggedGroup { kind, source: 0, members: ids(v) }
    }

    fn flat(v: &[&str], score: f64) -> ScoreMap {
        v.iter().map(|a| (a.to_string(), AccountScore::new(score))).collect()
    }

    #[test]
    fn multiplicity_counts_cycle_groups_only_by_default() {
        use PatternKind::*;
        let groups = vec![
            tg(Cycle, &["A", "B"]),
            tg(Cycle, &["A", "C"]),
            tg(Shell, &["B", "X"]),
            tg(Smurfing, &["B", "Y"]),
        ];
        let m = Multiplicity::build(&groups, BonusScope::CycleOnly);
        assert_eq!(m.count("A"), 2);
        assert_eq!(m.count("B"), 1);
        assert_eq!(m.count("X"), 0);
        assert_eq!(m.count("nobody"), 0);
        assert_eq!(m.overlapping_accounts(), 1);

        let any = Multiplicity::build(&groups, BonusScope::AnyPattern);
        assert_eq!(any.count("B"), 3);
        assert!(any.is_overlapping("B"));
    }

    #[test]
    fn repeated_member_in_one_group_counts_once() {
        let m = Multiplicity::build(&[tg(PatternKind::Cycle, &["A", "B", "A"])], BonusScope::CycleOnly);
        assert_eq!(m.count("A"), 1);
    }

    #[test]
    fn overlapping_cycles_score_65() {
        let groups = vec![tg(PatternKind::Cycle, &["A", "B", "C"]), tg(PatternKind::Cycle, &["A", "D", "F"])];
        let m = Multiplicity::build(&groups, BonusScope::CycleOnly);
        let scores = flat(&["A", "B", "C", "D", "F"], 40.0);
        let s = ring_score(&ids(&["A", "B", "C", "D", "F"]), &scores, &m, &RingConfig::default());
        assert_eq!(s, 65.0);
    }

    #[test]
    fn score_is_capped() {
        // Average 90, two overlapping members → 90 + 50 clamps to 100.
        let groups = vec![
            tg(PatternKind::Cycle, &["A", "B"]),
            tg(PatternKind::Cycle, &["A", "B", "C"]),
        ];
        let m = Multiplicity::build(&groups, BonusScope::CycleOnly);
        let scores = flat(&["A", "B", "C"], 90.0);
        let s = ring_score(&ids(&["A", "B", "C"]), &scores, &m, &RingConfig::default());
        assert_eq!(s, 100.0);
    }

    #[test]
    fn missing_scores_count_as_zero_in_denominator() {
        let scores = flat(&["A"], 50.0);
        let s = ring_score(&ids(&["A", "B"]), &scores, &Multiplicity::default(), &RingConfig::default());
        assert_eq!(s, 25.0);
    }

    #[test]
    fn rounds_to_one_decimal() {
        let mut scores = flat(&["A", "B"], 10.0);
        scores.insert("C".into(), AccountScore::new(11.0));
        // 31 / 3 = 10.333…
        let s = ring_score(&ids(&["A", "B", "C"]), &scores, &Multiplicity::default(), &RingConfig::default());
        assert_eq!(s, 10.3);
        assert_eq!(round1(66.66), 66.7);
        assert_eq!(round1(0.04), 0.0);
    }

    #[test]
    fn empty_members_score_zero() {
        let s = ring_score(&[], &ScoreMap::new(), &Multiplicity::default(), &RingConfig::default());
        assert_eq!(s, 0.0);
    }

    #[test]
    fn custom_bonus_and_cap() {
        let cfg = RingConfig { bonus_per_overlap: 10.0, score_cap: 60.0, ..Default::default() };
        let groups = vec![tg(PatternKind::Cycle, &["A"]), tg(PatternKind::Cycle, &["A"])];
        let m = Multiplicity::build(&groups, cfg.bonus_scope);
        let scores = flat(&["A"], 45.0);
        assert_eq!(ring_score(&ids(&["A"]), &scores, &m, &cfg), 55.0);

        let scores = flat(&["A"], 55.0);
        assert_eq!(ring_score(&ids(&["A"]), &scores, &m, &cfg), 60.0);
    }

    #[test]
    fn ids_are_zero_padded() {
        let cfg = RingConfig::default();
        assert_eq!(ring_id(1, &cfg), "RING_001");
        assert_eq!(ring_id(42, &cfg), "RING_042");
        assert_eq!(ring_id(999, &cfg), "RING_999");

        let wide = RingConfig { id_prefix: "FR".into(), id_width: 5, ..Default::default() };
        assert_eq!(ring_id(7, &wide), "FR_00007");
    }

    #[test]
    fn id_space_exhaustion_is_an_error() {
        let cfg = RingConfig { id_width: 1, ..Default::default() };
        let clusters: Vec<ResolvedCluster> = (0..10)
            .map(|i| ResolvedCluster {
                members: vec![format!("acct_{}", i)],
                pattern: PatternKind::Shell,
                groups:  vec![i],
            })
            .collect();

        let ok = assign(clusters[..9].to_vec(), &ScoreMap::new(), &Multiplicity::default(), &cfg).unwrap();
        assert_eq!(ok.last().map(|r| r.ring_id.as_str()), Some("RING_9"));

        let err = assign(clusters, &ScoreMap::new(), &Multiplicity::default(), &cfg).unwrap_err();
        assert!(matches!(err, RingError::RingIdSpaceExhausted { rings: 10, width: 1 }));
    }

    #[test]
    fn rounding_ties_go_to_even() {
        assert_eq!(round1(10.25), 10.2);
        assert_eq!(round1(10.35), 10.3); // stored as 10.3499…
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(round1(0.75), 0.8);
        assert_eq!(round1(1.15), 1.1);
        assert_eq!(round1(30.75), 30.8);
    }

    #[test]
    fn four_member_quarter_mean_rounds_down() {
        let mut scores = flat(&["A", "B", "C"], 10.0);
        scores.insert("D".into(), AccountScore::new(11.0));
        // 41 / 4 = 10.25 exactly
        let s = ring_score(&ids(&["A", "B", "C", "D"]), &scores, &Multiplicity::default(), &RingConfig::default());
        assert_eq!(s, 10.2);
    }

    fn cluster(v: &[&str]) -> ResolvedCluster {
        ResolvedCluster { members: ids(v), pattern: PatternKind::Shell, groups: vec![] }
    }

    #[test]
    fn non_finite_member_scores_rejected() {
        let mut scores = flat(&["A", "B"], 10.0);
        scores.insert("Z".into(), AccountScore::new(f64::NAN));
        scores.insert("M".into(), AccountScore::new(f64::INFINITY));

        let clusters = vec![cluster(&["A", "Z"]), cluster(&["B", "M"])];
        match validate_member_scores(&clusters, &scores) {
            Err(RingError::InvalidScore { account }) => assert_eq!(account, "M"),
            other => panic!("expected InvalidScore, got {:?}", other),
        }
    }

    #[test]
    fn non_finite_scores_outside_rings_ignored() {
        let mut scores = flat(&["A", "B"], 10.0);
        scores.insert("Z".into(), AccountScore::new(f64::NAN));
        assert!(validate_member_scores(&[cluster(&["A", "B"])], &scores).is_ok());
    }
}
