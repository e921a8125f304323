//! Domain error types.

use chrono::{DateTime, FixedOffset};

/// Top-level error type for investats.
#[derive(Debug, thiserror::Error)]
pub enum InvestatsError {
    #[error("invalid event kind: {kind:?} (expected invest or chkpt)")]
    InvalidEventKind { kind: String },

    #[error("invalid investment at entry {index}: {reason}")]
    InvalidInvestment { index: usize, reason: String },

    #[error("entry {index} is out of order: {current} follows {previous}")]
    EventOrder {
        index: usize,
        previous: DateTime<FixedOffset>,
        current: DateTime<FixedOffset>,
    },

    #[error("the number of series must be >= 2, got {count}")]
    InsufficientSeriesCount { count: usize },

    #[error("series {name} has {actual} checkpoints, expected {expected}")]
    SeriesLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("series {name} checkpoint {index} is at {actual}, expected {expected}")]
    CheckpointAlignmentMismatch {
        name: String,
        index: usize,
        expected: DateTime<FixedOffset>,
        actual: DateTime<FixedOffset>,
    },

    #[error("series name {name} is used more than once")]
    DuplicateSeriesName { name: String },

    #[error("series argument {arg} has no matching file")]
    UnpairedSeriesArgument { arg: String },

    #[error("invalid transaction: {block}")]
    InvalidTransaction { block: String },

    #[error("invalid frequency {value:?} (expected daily, weekly, monthly or yearly)")]
    InvalidFrequency { value: String },

    #[error("count should be >= 2, got {count}")]
    InvalidGeneratorCount { count: usize },

    #[error("invalid timestamp: {value:?}")]
    InvalidTimestamp { value: String },

    #[error("event log error: {reason}")]
    EventLog { reason: String },

    #[error("series error: {reason}")]
    Series { reason: String },

    #[error("missing column {column}")]
    MissingColumn { column: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&InvestatsError> for std::process::ExitCode {
    fn from(err: &InvestatsError) -> Self {
        let code: u8 = match err {
            InvestatsError::Io(_) => 1,
            InvestatsError::ConfigParse { .. }
            | InvestatsError::ConfigMissing { .. }
            | InvestatsError::ConfigInvalid { .. }
            | InvestatsError::DuplicateSeriesName { .. }
            | InvestatsError::UnpairedSeriesArgument { .. }
            | InvestatsError::InvalidFrequency { .. }
            | InvestatsError::InvalidGeneratorCount { .. } => 2,
            InvestatsError::EventLog { .. }
            | InvestatsError::Series { .. }
            | InvestatsError::MissingColumn { .. } => 3,
            InvestatsError::InvalidEventKind { .. }
            | InvestatsError::InvalidInvestment { .. }
            | InvestatsError::EventOrder { .. }
            | InvestatsError::InvalidTransaction { .. }
            | InvestatsError::InvalidTimestamp { .. } => 4,
            InvestatsError::InsufficientSeriesCount { .. }
            | InvestatsError::SeriesLengthMismatch { .. }
            | InvestatsError::CheckpointAlignmentMismatch { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
