// mulerift/src/engine/mod.rs
//
// Ring consolidation pipeline:
//
//   collector → merger → resolver → scorer
//
// Every stage is a pure function over in-memory collections; the engine only
// holds configuration. Running it twice on the same input — in any detector
// order — yields the same rings, ids and scores.

pub mod collector;
pub mod merger;
pub mod resolver;
pub mod scorer;

use std::collections::BTreeMap;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::config::RingConfig;
use crate::error::Result;
use crate::events::{
    AccountId, AnalysisReport, DetectionResults, FraudRing, GroupRef, PatternKind, RingSummary,
    ScoreMap, SuspiciousAccount,
};
use scorer::Multiplicity;

type RingSources = BTreeMap<String, Vec<GroupRef>>;

pub struct RingEngine {
    cfg: RingConfig,
}

impl RingEngine {
    pub fn new(cfg: RingConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &RingConfig {
        &self.cfg
    }

    /// Merge, label, order, number and score. Empty detections give no rings.
    pub fn group_rings(&self, detections: &DetectionResults, scores: &ScoreMap) -> Result<Vec<FraudRing>> {
        Ok(self.build(detections, scores)?.0)
    }

    /// Rings plus the account table, account → ring lookup, ring sources and
    /// summary.
    pub fn analyze(&self, detections: &DetectionResults, scores: &ScoreMap) -> Result<AnalysisReport> {
        let (fraud_rings, ring_sources) = self.build(detections, scores)?;
        let account_rings = account_ring_map(&fraud_rings);
        let suspicious_accounts = suspicious_accounts(&fraud_rings, scores);
        let summary = summarize(&fraud_rings, &account_rings, self.fingerprint(detections, scores));

        Ok(AnalysisReport { suspicious_accounts, fraud_rings, account_rings, ring_sources, summary })
    }

    fn build(&self, detections: &DetectionResults, scores: &ScoreMap) -> Result<(Vec<FraudRing>, RingSources)> {
        let groups = collector::collect(detections)?;
        if groups.is_empty() {
            info!("no pattern groups detected; 0 rings");
            return Ok((Vec::new(), RingSources::new()));
        }

        // Built from raw groups before merging; merging must not change it
        let multiplicity = Multiplicity::build(&groups, self.cfg.bonus_scope);
        let clusters = merger::merge(&groups, self.cfg.merge_strategy);
        let ordered = resolver::resolve(clusters);
        scorer::validate_member_scores(&ordered, scores)?;

        let sources: Vec<Vec<GroupRef>> = ordered
            .iter()
            .map(|c| {
                let mut refs: Vec<GroupRef> = c.groups.iter().map(|&i| groups[i].group_ref()).collect();
                refs.sort_unstable();
                refs
            })
            .collect();
        let rings = scorer::assign(ordered, scores, &multiplicity, &self.cfg)?;
        let ring_sources: RingSources =
            rings.iter().map(|r| r.ring_id.clone()).zip(sources).collect();

        info!(
            "{} raw groups → {} rings ({} multi-membership accounts)",
            groups.len(),
            rings.len(),
            multiplicity.overlapping_accounts()
        );
        Ok((rings, ring_sources))
    }

    /// SHA-256[:16] over the canonical input and the active config. Detector
    /// order and member order inside a group do not affect it.
    pub fn fingerprint(&self, detections: &DetectionResults, scores: &ScoreMap) -> String {
        let mut h = Sha256::new();

        for kind in PatternKind::ALL {
            let mut groups: Vec<Vec<&str>> = detections
                .groups_of(kind)
                .iter()
                .map(|g| {
                    let mut m: Vec<&str> = g.iter().map(String::as_str).collect();
                    m.sort_unstable();
                    m.dedup();
                    m
                })
                .collect();
            groups.sort();
            for g in groups {
                h.update(kind.to_string().as_bytes());
                h.update(b":");
                h.update(g.join(",").as_bytes());
                h.update(b"\n");
            }
        }

        let ordered: BTreeMap<&AccountId, f64> = scores.iter().map(|(a, s)| (a, s.score)).collect();
        for (account, score) in ordered {
            h.update(format!("{}={:?}\n", account, score).as_bytes());
        }

        h.update(serde_json::to_string(&self.cfg).unwrap_or_default().as_bytes());
        hex::encode(&h.finalize()[..16])
    }
}

impl Default for RingEngine {
    fn default() -> Self {
        Self { cfg: RingConfig::default() }
    }
}

pub fn account_ring_map(rings: &[FraudRing]) -> BTreeMap<AccountId, String> {
    rings
        .iter()
        .flat_map(|r| r.member_accounts.iter().map(move |a| (a.clone(), r.ring_id.clone())))
        .collect()
}

/// Ring members annotated with base score and detector tags, highest score
/// first, ties broken by account id.
pub fn suspicious_accounts(rings: &[FraudRing], scores: &ScoreMap) -> Vec<SuspiciousAccount> {
    let mut out: Vec<SuspiciousAccount> = rings
        .iter()
        .flat_map(|r| {
            r.member_accounts.iter().map(move |a| {
                let record = scores.get(a);
                SuspiciousAccount {
                    account_id:        a.clone(),
                    suspicion_score:   record.map(|s| s.score).unwrap_or(0.0),
                    detected_patterns: record.map(|s| s.patterns.clone()).unwrap_or_default(),
                    ring_id:           r.ring_id.clone(),
                }
            })
        })
        .collect();

    out.sort_by(|a, b| {
        b.suspicion_score
            .total_cmp(&a.suspicion_score)
            .then_with(|| a.account_id.cmp(&b.account_id))
    });
    out
}

fn summarize(
    rings:         &[FraudRing],
    account_rings: &BTreeMap<AccountId, String>,
    fingerprint:   String,
) -> RingSummary {
    let by_kind = |k: PatternKind| rings.iter().filter(|r| r.pattern_type == k).count();
    RingSummary {
        total_rings:       rings.len(),
        cycle_rings:       by_kind(PatternKind::Cycle),
        smurfing_rings:    by_kind(PatternKind::Smurfing),
        shell_rings:       by_kind(PatternKind::Shell),
        accounts_flagged:  account_rings.len(),
        largest_ring:      rings.iter().map(|r| r.member_accounts.len()).max().unwrap_or(0),
        max_risk_score:    rings.iter().map(|r| r.risk_score).fold(0.0, f64::max),
        input_fingerprint: fingerprint,
        generated_at:      Utc::now(),
    }
}
