// mulerift/src/events.rs
//
// Shared domain types flowing through MuleRift.
//
// Inputs come from the upstream detectors (cycle / smurfing / shell groups)
// and the per-account scorer. Outputs are consumed by the dashboard, which
// reads `fraud_rings`, `suspicious_accounts` and `summary` by these exact
// field names.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RingError};

pub type AccountId = String;

/// Per-account base scores keyed by account id.
pub type ScoreMap = HashMap<AccountId, AccountScore>;

// ── Pattern kinds ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Cycle,    // circular fund flow A → B → … → A
    Smurfing, // fan-in / fan-out structuring
    Shell,    // low-activity layering chain
}

impl PatternKind {
    /// Collection order of the detector sequences.
    pub const ALL: [PatternKind; 3] = [Self::Cycle, Self::Smurfing, Self::Shell];

    /// Severity rank used to label a merged ring. Higher wins.
    pub fn priority(self) -> u8 {
        match self {
            Self::Cycle    => 3,
            Self::Smurfing => 2,
            Self::Shell    => 1,
        }
    }

    /// Highest-priority kind present, regardless of the order it was seen in.
    pub fn highest<I>(kinds: I) -> Option<PatternKind>
    where
        I: IntoIterator<Item = PatternKind>,
    {
        kinds.into_iter().max_by_key(|k| k.priority())
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cycle    => write!(f, "cycle"),
            Self::Smurfing => write!(f, "smurfing"),
            Self::Shell    => write!(f, "shell"),
        }
    }
}

// ── Detector output ───────────────────────────────────────────────────────────

/// Raw groups reported by the pattern detectors. Any missing sequence
/// deserializes as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionResults {
    pub cycle_groups:    Vec<Vec<AccountId>>,
    pub smurfing_groups: Vec<Vec<AccountId>>,
    pub shell_groups:    Vec<Vec<AccountId>>,
}

impl DetectionResults {
    pub fn groups_of(&self, kind: PatternKind) -> &[Vec<AccountId>] {
        match kind {
            PatternKind::Cycle    => &self.cycle_groups,
            PatternKind::Smurfing => &self.smurfing_groups,
            PatternKind::Shell    => &self.shell_groups,
        }
    }

    pub fn is_empty(&self) -> bool {
        PatternKind::ALL.iter().all(|k| self.groups_of(*k).is_empty())
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = read_file(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountScore {
    pub score:    f64,
    #[serde(default)]
    pub patterns: Vec<String>, // detector tags, e.g. "cycle_length_3"
}

impl AccountScore {
    pub fn new(score: f64) -> Self {
        Self { score, patterns: Vec::new() }
    }
}

pub fn load_score_map(path: &Path) -> Result<ScoreMap> {
    let raw = read_file(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| RingError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Engine output ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudRing {
    pub ring_id:         String,
    pub member_accounts: Vec<AccountId>, // sorted, deduplicated
    pub pattern_type:    PatternKind,
    pub risk_score:      f64,            // 0.0–100.0, one decimal
}

/// One raw detector group: its kind and position in that detector's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupRef {
    pub kind:  PatternKind,
    pub index: usize,
}

impl std::fmt::Display for GroupRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind, self.index)
    }
}

/// A ring member annotated for the account table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousAccount {
    pub account_id:        AccountId,
    pub suspicion_score:   f64,
    pub detected_patterns: Vec<String>,
    pub ring_id:           String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingSummary {
    pub total_rings:       usize,
    pub cycle_rings:       usize,
    pub smurfing_rings:    usize,
    pub shell_rings:       usize,
    pub accounts_flagged:  usize,
    pub largest_ring:      usize,
    pub max_risk_score:    f64,
    /// SHA-256[:16] over the canonical input; equal inputs give equal values.
    pub input_fingerprint: String,
    pub generated_at:      DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    pub fraud_rings:         Vec<FraudRing>,
    pub account_rings:       BTreeMap<AccountId, String>,
    /// ring id → raw detector groups merged into it. Indices refer to the
    /// input lists as given, so they move when detectors reorder their output.
    #[serde(default)]
    pub ring_sources:        BTreeMap<String, Vec<GroupRef>>,
    pub summary:             RingSummary,
}

impl AnalysisReport {
    pub fn ring_of(&self, account_id: &str) -> Option<&str> {
        self.account_rings.get(account_id).map(String::as_str)
    }

    pub fn ring(&self, ring_id: &str) -> Option<&FraudRing> {
        self.fraud_rings.iter().find(|r| r.ring_id == ring_id)
    }

    pub fn sources_of(&self, ring_id: &str) -> &[GroupRef] {
        self.ring_sources.get(ring_id).map(Vec::as_slice).unwrap_or(&[])
    }
}
