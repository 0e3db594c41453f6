//! Engine configuration.
//!
//! Every threshold, padding and policy table the engine consults lives in one
//! immutable [`EngineConfig`] that each component borrows at construction.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::OverlayCategory;

/// How long an overlay stays on screen before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayDuration {
    /// A fixed window in milliseconds.
    Fixed(i64),
    /// Until the end of the segment containing the trigger.
    UntilSegmentEnd,
}

/// Default duration, lane and priority for one overlay category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    pub duration: DisplayDuration,
    /// Exclusivity group; events sharing a lane never overlap after resolution.
    pub lane: String,
    /// Higher wins a lane collision.
    pub priority: i32,
}

/// Per-category policy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    pub caption: CategoryPolicy,
    pub highlight: CategoryPolicy,
    pub emphasis: CategoryPolicy,
}

impl CategoryTable {
    pub const fn get(&self, category: OverlayCategory) -> &CategoryPolicy {
        match category {
            OverlayCategory::Caption => &self.caption,
            OverlayCategory::Highlight => &self.highlight,
            OverlayCategory::Emphasis => &self.emphasis,
        }
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        // Captions and emphasis callouts share the lower-third region.
        Self {
            caption: CategoryPolicy {
                duration: DisplayDuration::Fixed(4_000),
                lane: "lower-third".to_string(),
                priority: 30,
            },
            highlight: CategoryPolicy {
                duration: DisplayDuration::UntilSegmentEnd,
                lane: "keyword".to_string(),
                priority: 10,
            },
            emphasis: CategoryPolicy {
                duration: DisplayDuration::Fixed(6_000),
                lane: "lower-third".to_string(),
                priority: 20,
            },
        }
    }
}

/// Configuration for the timing and overlay engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum edit distance for a script word to match a synthesizer word.
    /// Only applied to words of at least four chars.
    /// Default: 1.
    pub word_match_tolerance: usize,

    /// How many marks past the cursor to search for a word before giving up on it.
    /// Default: 3.
    pub resync_window: usize,

    /// A segment with more unmatched words than this percentage of its words
    /// is re-timed by interpolation.
    /// Default: 25.
    pub max_unmatched_percent: u32,

    /// Spoken length assumed for a word whose mark carries no duration.
    /// Default: 350.
    pub default_word_ms: i64,

    /// Duration given to a segment with no speakable words.
    /// Default: 500.
    pub empty_segment_floor_ms: i64,

    /// Shortest time an overlay may be shown.
    /// Default: 1000.
    pub min_display_ms: i64,

    /// How far past its segment an overlay may run.
    /// Default: 700 (the silence inserted between synthesized segments).
    pub trailing_pad_ms: i64,

    /// Segments shorter than this are reported as errors.
    /// Default: 400.
    pub min_speech_ms: i64,

    /// Segments longer than this are reported as errors.
    /// Default: 30000.
    pub max_segment_ms: i64,

    /// Silent gaps longer than this are reported as warnings.
    /// Default: 4000.
    pub max_gap_ms: i64,

    /// Segments with more words than this are reported as warnings.
    /// Default: 55.
    pub max_segment_words: usize,

    /// Duration, lane and priority per overlay category.
    pub categories: CategoryTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            word_match_tolerance: 1,
            resync_window: 3,
            max_unmatched_percent: 25,
            default_word_ms: 350,
            empty_segment_floor_ms: 500,
            min_display_ms: 1_000,
            trailing_pad_ms: 700,
            min_speech_ms: 400,
            max_segment_ms: 30_000,
            max_gap_ms: 4_000,
            max_segment_words: 55,
            categories: CategoryTable::default(),
        }
    }
}

/// Latest time, in ms, a mark may end at or a configured duration may span.
///
/// Sums of a few such values stay within `i64`.
pub const MAX_TIME_MS: i64 = i64::MAX / 4;

impl EngineConfig {
    /// Rejects configurations the engine cannot honor.
    pub fn validate(&self) -> Result<(), EngineError> {
        let bounded = [
            ("default_word_ms", self.default_word_ms),
            ("empty_segment_floor_ms", self.empty_segment_floor_ms),
            ("min_display_ms", self.min_display_ms),
            ("min_speech_ms", self.min_speech_ms),
            ("trailing_pad_ms", self.trailing_pad_ms),
        ];
        if let Some(&(field, _)) = bounded.iter().find(|(_, value)| *value > MAX_TIME_MS) {
            return Err(EngineError::InvalidConfig {
                field,
                reason: "is too large",
            });
        }
        let positive = [
            ("default_word_ms", self.default_word_ms),
            ("empty_segment_floor_ms", self.empty_segment_floor_ms),
            ("min_display_ms", self.min_display_ms),
            ("min_speech_ms", self.min_speech_ms),
        ];
        for (field, value) in positive {
            if value <= 0 {
                return Err(EngineError::InvalidConfig {
                    field,
                    reason: "must be positive",
                });
            }
        }
        if self.trailing_pad_ms < 0 {
            return Err(EngineError::InvalidConfig {
                field: "trailing_pad_ms",
                reason: "must not be negative",
            });
        }
        if self.max_segment_ms < self.min_speech_ms {
            return Err(EngineError::InvalidConfig {
                field: "max_segment_ms",
                reason: "must not be below min_speech_ms",
            });
        }
        if self.max_unmatched_percent > 100 {
            return Err(EngineError::InvalidConfig {
                field: "max_unmatched_percent",
                reason: "must be at most 100",
            });
        }
        for category in OverlayCategory::ALL {
            let policy = self.categories.get(category);
            if matches!(policy.duration, DisplayDuration::Fixed(ms) if ms <= 0) {
                return Err(EngineError::InvalidConfig {
                    field: "categories.duration",
                    reason: "fixed durations must be positive",
                });
            }
            if matches!(policy.duration, DisplayDuration::Fixed(ms) if ms > MAX_TIME_MS) {
                return Err(EngineError::InvalidConfig {
                    field: "categories.duration",
                    reason: "fixed durations are too large",
                });
            }
            if policy.lane.trim().is_empty() {
                return Err(EngineError::InvalidConfig {
                    field: "categories.lane",
                    reason: "must not be empty",
                });
            }
        }
        Ok(())
    }
}
