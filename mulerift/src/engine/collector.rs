// mulerift/src/engine/collector.rs
//
// Stage 1 — flatten the three detector sequences into one tagged list.
// Order: cycle groups, then smurfing, then shell; detector order is kept
// within each kind. Nothing is merged or deduplicated here.

use tracing::debug;

use crate::error::{Result, RingError};
use crate::events::{AccountId, DetectionResults, GroupRef, PatternKind};

/// One raw detector group with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedGroup {
    pub kind:    PatternKind,
    /// Position within its detector's sequence.
    pub source:  usize,
    pub members: Vec<AccountId>,
}

impl TaggedGroup {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn group_ref(&self) -> GroupRef {
        GroupRef { kind: self.kind, index: self.source }
    }
}

pub fn collect(detections: &DetectionResults) -> Result<Vec<TaggedGroup>> {
    let mut out = Vec::new();

    for kind in PatternKind::ALL {
        let groups = detections.groups_of(kind);
        for (source, members) in groups.iter().enumerate() {
            validate_members(kind, source, members)?;
            out.push(TaggedGroup { kind, source, members: members.clone() });
        }
        debug!("collected {} {} groups", groups.len(), kind);
    }

    Ok(out)
}

// Ids are opaque: only the empty string is refused, since it would sort ahead
// of every real account. " " or "acct 1" pass through unchanged.
fn validate_members(kind: PatternKind, group: usize, members: &[AccountId]) -> Result<()> {
    match members.iter().position(|a| a.is_empty()) {
        Some(position) => Err(RingError::InvalidAccountId { kind, group, position }),
        None => Ok(()),
    }
}
