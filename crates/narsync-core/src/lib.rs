//! Narration timing and overlay synchronization.
//!
//! This crate turns a lesson's script, the speech synthesizer's word timing
//! marks and the author's overlay annotations into:
//! - a [`Timeline`] of timed segments and collision-free overlay events
//! - a [`QaReport`] of severity-tagged findings
//!
//! The pipeline runs forward only: extraction, trigger lookup, scheduling,
//! lane resolution, then validation. [`Engine`] wires the stages together.

pub mod config;
mod engine;
mod error;
mod extract;
mod locate;
pub mod overlay_plan;
pub mod report;
mod resolve;
mod schedule;
pub mod script;
mod text;
pub mod types;
mod validate;

pub use config::{CategoryPolicy, CategoryTable, DisplayDuration, EngineConfig, MAX_TIME_MS};
pub use engine::{Engine, LessonInput, LessonOutput};
pub use error::EngineError;
pub use extract::{Extraction, TimingExtractor};
pub use locate::{Located, Location, locate_annotations};
pub use overlay_plan::{CaptionPhrase, EmphasisPoint, OverlayPlan};
pub use report::{Finding, FindingCategory, FindingRef, QaReport, Severity, format_ms};
pub use resolve::{CollisionResolver, Resolution, sweep_lane};
pub use schedule::TimelineScheduler;
pub use script::{ScriptError, parse_script};
pub use types::{
    OverlayAnnotation, OverlayCategory, OverlayEvent, ScriptLine, Segment, Timeline, TimingMark,
    UnknownCategory, WordTiming,
};
pub use validate::{Expectations, QaValidator};
