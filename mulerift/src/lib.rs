// mulerift/src/lib.rs
//
// MuleRift ring engine — consolidates overlapping fraud-pattern detections
// (cycles, smurfing fan-in, shell layering) into numbered, scored fraud rings.
//
// The engine does no I/O. Callers hand it detector output and per-account
// base scores; it hands back rings in a fixed order:
//
//   let engine = RingEngine::new(RingConfig::default())?;
//   let report = engine.analyze(&detections, &scores)?;

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod report;

pub use config::{BonusScope, MergeStrategy, RingConfig};
pub use engine::RingEngine;
pub use error::{Result, RingError};
pub use events::{
    AccountId, AccountScore, AnalysisReport, DetectionResults, FraudRing, GroupRef,
    PatternKind, RingSummary, ScoreMap, SuspiciousAccount,
};
