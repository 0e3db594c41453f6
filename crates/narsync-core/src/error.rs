//! Fatal engine errors.
//!
//! Only structurally invalid input escapes the engine as an error. Everything
//! recoverable is reported as a [`Finding`](crate::Finding) instead.

use thiserror::Error;

/// Input the engine refuses to process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The script produced no segments.
    #[error("script has no segments")]
    EmptyScript,

    /// The synthesizer returned no word boundaries.
    #[error("timing mark list is empty; nothing to align against")]
    EmptyTimingMarks,

    /// A timing mark lies before the start of the audio.
    #[error("timing mark {index} has negative offset {offset_ms} ms")]
    NegativeOffset { index: usize, offset_ms: i64 },

    /// A timing mark reports a negative spoken length.
    #[error("timing mark {index} has negative duration {duration_ms} ms")]
    NegativeDuration { index: usize, duration_ms: i64 },

    /// A timing mark ends too late to do arithmetic on.
    #[error("timing mark {index} at {offset_ms} ms ends past the supported range")]
    MarkOutOfRange { index: usize, offset_ms: i64 },

    /// The declared audio length is negative or too large.
    #[error("declared total duration {total_ms} ms is out of range")]
    InvalidTotalDuration { total_ms: i64 },

    /// Timing marks go backwards in time.
    #[error("timing mark {index} goes backwards ({offset_ms} ms after {previous_ms} ms)")]
    NonMonotonicMarks {
        index: usize,
        previous_ms: i64,
        offset_ms: i64,
    },

    /// An annotation has nothing to search for.
    #[error("annotation {index} has an empty trigger")]
    EmptyTrigger { index: usize },

    /// A configuration value the engine cannot honor.
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    /// The input could not be serialized for fingerprinting.
    #[error("failed to fingerprint lesson input: {0}")]
    Fingerprint(String),
}
