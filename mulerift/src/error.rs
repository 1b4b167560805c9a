// mulerift/src/error.rs
//
// Library error type. The binary wraps these in anyhow at the top level.

use std::path::PathBuf;

use thiserror::Error;

use crate::events::PatternKind;

pub type Result<T> = std::result::Result<T, RingError>;

#[derive(Error, Debug)]
pub enum RingError {
    /// Empty account id. Rejected before merging because it would sort ahead
    /// of every real account and shift ring numbering. Other ids are opaque.
    #[error("invalid account id in {kind} group {group} at position {position}")]
    InvalidAccountId {
        kind:     PatternKind,
        group:    usize,
        position: usize,
    },

    /// NaN or infinite base score on a ring member.
    #[error("score for account {account} is not a finite number")]
    InvalidScore { account: String },

    #[error("{rings} rings exceed the {width}-digit ring id space")]
    RingIdSpaceExhausted { rings: usize, width: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
