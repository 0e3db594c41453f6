//! Core domain types: engine inputs, timed segments, overlay events, timelines.
//!
//! All times are integer milliseconds so that repeated runs over the same
//! input are bit-identical. Character offsets count `char`s, not bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::Finding;

/// Error type for unknown overlay category strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown overlay category: {0}")]
pub struct UnknownCategory(pub String);

/// The closed set of overlay kinds a script can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayCategory {
    /// Short phrase shown while the trigger is spoken.
    Caption,
    /// Keyword kept on screen until its sentence ends.
    Highlight,
    /// Longer callout (definition, key fact).
    Emphasis,
}

impl OverlayCategory {
    pub const ALL: [Self; 3] = [Self::Caption, Self::Highlight, Self::Emphasis];

    /// Stable string form used in files and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Caption => "caption",
            Self::Highlight => "highlight",
            Self::Emphasis => "emphasis",
        }
    }
}

impl fmt::Display for OverlayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OverlayCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "caption" | "captions" => Ok(Self::Caption),
            "highlight" | "highlights" | "keyword" => Ok(Self::Highlight),
            "emphasis" | "emphasis_point" => Ok(Self::Emphasis),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

fn default_emotion() -> String {
    "neutral".to_string()
}

/// One spoken unit as declared by the script, before any timing is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLine {
    pub speaker: String,
    pub text: String,
    #[serde(default = "default_emotion")]
    pub emotion: String,
}

impl ScriptLine {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            emotion: default_emotion(),
        }
    }

    #[must_use]
    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = emotion.into();
        self
    }
}

/// A word boundary reported by the speech synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingMark {
    pub word: String,
    pub offset_ms: i64,
    /// Spoken length of the word, when the synthesizer reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
}

impl TimingMark {
    pub fn new(word: impl Into<String>, offset_ms: i64) -> Self {
        Self {
            word: word.into(),
            offset_ms,
            duration_ms: None,
        }
    }

    #[must_use]
    pub const fn with_duration(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Author-declared overlay intent. Carries no timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayAnnotation {
    pub category: OverlayCategory,
    /// Text to locate in the narration.
    pub trigger: String,
    /// What to display.
    pub payload: String,
    /// Overrides the category's default priority in collision resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl OverlayAnnotation {
    pub fn new(
        category: OverlayCategory,
        trigger: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            category,
            trigger: trigger.into(),
            payload: payload.into(),
            priority: None,
        }
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Start time of one word inside a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    /// Position of the word's first char within the segment text.
    pub char_offset: usize,
    pub start_ms: i64,
    /// False when the time was interpolated rather than taken from a mark.
    pub matched: bool,
}

/// A timed unit of spoken narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub speaker: String,
    pub text: String,
    pub emotion: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub words: Vec<WordTiming>,
}

impl Segment {
    pub const fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }

    /// Moves the whole segment, words included, later by `delta_ms`.
    pub(crate) fn shift(&mut self, delta_ms: i64) {
        self.start_ms += delta_ms;
        self.end_ms += delta_ms;
        for word in &mut self.words {
            word.start_ms += delta_ms;
        }
    }
}

/// A scheduled, timed overlay derived from one annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayEvent {
    pub category: OverlayCategory,
    pub payload: String,
    pub start_ms: i64,
    pub end_ms: i64,
    /// Index of the segment whose text contained the trigger.
    pub segment_index: usize,
    /// Index of the annotation this event was scheduled from.
    pub annotation_index: usize,
    pub lane: String,
    pub priority: i32,
}

impl OverlayEvent {
    pub const fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }
}

/// Everything a renderer needs to place overlays in sync with the audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub segments: Vec<Segment>,
    pub events: Vec<OverlayEvent>,
    pub total_duration_ms: i64,
    /// Findings raised while the timeline was built, aggregated by QA.
    #[serde(default)]
    pub diagnostics: Vec<Finding>,
}

impl Timeline {
    /// Events occupying `lane`, in timeline order.
    pub fn lane_events<'a>(&'a self, lane: &'a str) -> impl Iterator<Item = &'a OverlayEvent> {
        self.events.iter().filter(move |e| e.lane == lane)
    }
}
