//! Engine facade: boundary checks, the component pipeline, and batch runs.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::{EngineConfig, MAX_TIME_MS};
use crate::error::EngineError;
use crate::extract::TimingExtractor;
use crate::locate::{Location, locate_annotations};
use crate::overlay_plan::OverlayPlan;
use crate::report::{Finding, FindingCategory, FindingRef, QaReport, Severity};
use crate::resolve::CollisionResolver;
use crate::schedule::TimelineScheduler;
use crate::types::{OverlayAnnotation, OverlayEvent, ScriptLine, Timeline, TimingMark};
use crate::validate::{Expectations, QaValidator};

/// Everything needed to time one lesson's narration and overlays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonInput {
    #[serde(default)]
    pub lesson: String,
    pub script: Vec<ScriptLine>,
    pub timing_marks: Vec<TimingMark>,
    #[serde(default)]
    pub annotations: Vec<OverlayAnnotation>,
    /// Authoring-tool overlay plan, converted after `annotations`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_plan: Option<OverlayPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_segment_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_speakers: Option<Vec<String>>,
    /// Length of the synthesized audio, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<i64>,
}

impl LessonInput {
    pub fn expectations(&self) -> Expectations {
        Expectations {
            segment_count: self.expected_segment_count,
            speakers: self.expected_speakers.clone(),
        }
    }

    /// Explicit annotations followed by those derived from the overlay plan.
    pub fn all_annotations(&self) -> Vec<OverlayAnnotation> {
        let mut annotations = self.annotations.clone();
        if let Some(plan) = &self.overlay_plan {
            annotations.extend(plan.to_annotations());
        }
        annotations
    }

    /// SHA-256 hex digest of everything that influences the output.
    ///
    /// The lesson title is excluded, so renaming a lesson keeps its key.
    pub fn fingerprint(&self, config: &EngineConfig) -> Result<String, EngineError> {
        #[derive(Serialize)]
        struct CacheKey<'a> {
            script: &'a [ScriptLine],
            timing_marks: &'a [TimingMark],
            annotations: Vec<OverlayAnnotation>,
            expectations: Expectations,
            total_duration_ms: Option<i64>,
            config: &'a EngineConfig,
        }

        let key = CacheKey {
            script: &self.script,
            timing_marks: &self.timing_marks,
            annotations: self.all_annotations(),
            expectations: self.expectations(),
            total_duration_ms: self.total_duration_ms,
            config,
        };
        let bytes = serde_json::to_vec(&key).map_err(|e| EngineError::Fingerprint(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Result of running the engine on one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonOutput {
    pub lesson: String,
    pub fingerprint: String,
    pub timeline: Timeline,
    pub report: QaReport,
}

/// Runs lessons through extraction, location, scheduling, resolution and QA.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub const fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the timeline and QA report for one lesson.
    ///
    /// Only structurally invalid input or configuration is an error; every
    /// other defect is reported in the returned [`QaReport`].
    pub fn run(&self, input: &LessonInput) -> Result<LessonOutput, EngineError> {
        let _span = tracing::debug_span!("lesson", lesson = %input.lesson).entered();

        self.config.validate()?;
        let annotations = input.all_annotations();
        check_input(input, &annotations, self.config.default_word_ms)?;
        let fingerprint = input.fingerprint(&self.config)?;

        let timeline = self.build_timeline(
            &input.script,
            &input.timing_marks,
            &annotations,
            input.total_duration_ms,
        );
        let report = self.revalidate(&timeline, &input.expectations());

        tracing::info!(
            lesson = %input.lesson,
            segments = timeline.segments.len(),
            events = timeline.events.len(),
            summary = %report.summary(),
            "lesson timed"
        );

        Ok(LessonOutput {
            lesson: input.lesson.clone(),
            fingerprint,
            timeline,
            report,
        })
    }

    /// Runs independent lessons in parallel. Results keep input order.
    pub fn run_batch(&self, inputs: &[LessonInput]) -> Vec<Result<LessonOutput, EngineError>> {
        inputs.par_iter().map(|input| self.run(input)).collect()
    }

    /// QA for a timeline, e.g. one loaded back from disk.
    pub fn revalidate(&self, timeline: &Timeline, expectations: &Expectations) -> QaReport {
        QaValidator::new(&self.config).validate(timeline, expectations)
    }

    fn build_timeline(
        &self,
        script: &[ScriptLine],
        marks: &[TimingMark],
        annotations: &[OverlayAnnotation],
        declared_total_ms: Option<i64>,
    ) -> Timeline {
        let extraction = TimingExtractor::new(&self.config).extract(script, marks, declared_total_ms);
        let located = locate_annotations(&extraction.segments, annotations);
        let raw = TimelineScheduler::new(&self.config).schedule(
            &extraction.segments,
            annotations,
            &located.locations,
            extraction.total_duration_ms,
        );
        let resolution = CollisionResolver::new(&self.config).resolve(raw);

        let mut diagnostics = extraction.findings;
        diagnostics.extend(located.findings);
        diagnostics.extend(resolution.findings);
        diagnostics.extend(fully_dropped(annotations, &located.locations, &resolution.events));

        Timeline {
            segments: extraction.segments,
            events: resolution.events,
            total_duration_ms: extraction.total_duration_ms,
            diagnostics,
        }
    }
}

/// Rejects input no component can work with.
fn check_input(
    input: &LessonInput,
    annotations: &[OverlayAnnotation],
    default_word_ms: i64,
) -> Result<(), EngineError> {
    if input.script.is_empty() {
        return Err(EngineError::EmptyScript);
    }
    if input.timing_marks.is_empty() {
        return Err(EngineError::EmptyTimingMarks);
    }

    let mut previous_ms = 0;
    for (index, mark) in input.timing_marks.iter().enumerate() {
        if mark.offset_ms < 0 {
            return Err(EngineError::NegativeOffset {
                index,
                offset_ms: mark.offset_ms,
            });
        }
        if let Some(duration_ms) = mark.duration_ms.filter(|d| *d < 0) {
            return Err(EngineError::NegativeDuration { index, duration_ms });
        }
        if mark.offset_ms < previous_ms {
            return Err(EngineError::NonMonotonicMarks {
                index,
                previous_ms,
                offset_ms: mark.offset_ms,
            });
        }
        let end_ms = mark
            .offset_ms
            .checked_add(mark.duration_ms.unwrap_or(default_word_ms));
        if end_ms.is_none_or(|end| end > MAX_TIME_MS) {
            return Err(EngineError::MarkOutOfRange {
                index,
                offset_ms: mark.offset_ms,
            });
        }
        previous_ms = mark.offset_ms;
    }

    if let Some(total_ms) = input
        .total_duration_ms
        .filter(|total| !(0..=MAX_TIME_MS).contains(total))
    {
        return Err(EngineError::InvalidTotalDuration { total_ms });
    }

    if let Some(index) = annotations.iter().position(|a| a.trigger.trim().is_empty()) {
        return Err(EngineError::EmptyTrigger { index });
    }
    Ok(())
}

/// Coverage notes for located annotations that lost every collision.
fn fully_dropped(
    annotations: &[OverlayAnnotation],
    locations: &[Option<Location>],
    events: &[OverlayEvent],
) -> Vec<Finding> {
    let shown: HashSet<usize> = events.iter().map(|e| e.annotation_index).collect();
    annotations
        .iter()
        .zip(locations)
        .enumerate()
        .filter(|(index, (_, location))| location.is_some() && !shown.contains(index))
        .map(|(index, (annotation, _))| {
            Finding::new(
                Severity::Info,
                FindingCategory::Coverage,
                format!(
                    "{} '{}' was found but never shown; it lost its lane to another overlay",
                    annotation.category,
                    annotation.trigger.trim()
                ),
            )
            .with_reference(FindingRef::Annotation(index))
        })
        .collect()
}
