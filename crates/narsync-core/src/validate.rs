//! QA validation of a finished timeline.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::report::{Finding, FindingCategory, FindingRef, QaReport, Severity, format_ms};
use crate::types::Timeline;

/// What the caller expected the narration to look like.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectations {
    /// Number of segments the script was split into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_count: Option<usize>,
    /// Speaker of each segment, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speakers: Option<Vec<String>>,
}

/// Aggregates timeline checks and queued diagnostics into a [`QaReport`].
///
/// Validation never fails and never mutates the timeline, so validating the
/// same timeline twice yields the same report.
#[derive(Debug, Clone, Copy)]
pub struct QaValidator<'a> {
    config: &'a EngineConfig,
}

impl<'a> QaValidator<'a> {
    pub const fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, timeline: &Timeline, expectations: &Expectations) -> QaReport {
        let mut findings = Vec::new();

        self.check_segment_timing(timeline, &mut findings);
        queued(timeline, FindingCategory::TimingGap, &mut findings);

        check_segment_overlap(timeline, &mut findings);
        queued(timeline, FindingCategory::TimingOverlap, &mut findings);

        check_alignment(timeline, expectations, &mut findings);
        queued(timeline, FindingCategory::Alignment, &mut findings);

        queued(timeline, FindingCategory::Coverage, &mut findings);

        queued(timeline, FindingCategory::Collision, &mut findings);
        check_lane_overlap(timeline, &mut findings);

        let report = QaReport::from_findings(findings);
        tracing::debug!(
            findings = report.findings.len(),
            max_severity = ?report.max_severity,
            "validated timeline"
        );
        report
    }

    fn check_segment_timing(&self, timeline: &Timeline, findings: &mut Vec<Finding>) {
        let mut previous_end = 0;
        for (index, segment) in timeline.segments.iter().enumerate() {
            let gap = segment.start_ms - previous_end;
            if gap > self.config.max_gap_ms {
                let what = if index == 0 { "lead-in silence" } else { "silent gap" };
                findings.push(
                    Finding::new(
                        Severity::Warning,
                        FindingCategory::TimingGap,
                        format!(
                            "{what} of {} exceeds {}",
                            format_ms(gap),
                            format_ms(self.config.max_gap_ms)
                        ),
                    )
                    .with_reference(FindingRef::Segment(index)),
                );
            }
            previous_end = previous_end.max(segment.end_ms);

            let duration = segment.duration_ms();
            if duration < self.config.min_speech_ms {
                findings.push(
                    Finding::new(
                        Severity::Error,
                        FindingCategory::TimingGap,
                        format!(
                            "segment lasts {}, shorter than {}",
                            format_ms(duration),
                            format_ms(self.config.min_speech_ms)
                        ),
                    )
                    .with_reference(FindingRef::Segment(index)),
                );
            } else if duration > self.config.max_segment_ms {
                findings.push(
                    Finding::new(
                        Severity::Error,
                        FindingCategory::TimingGap,
                        format!(
                            "segment lasts {}, longer than {}",
                            format_ms(duration),
                            format_ms(self.config.max_segment_ms)
                        ),
                    )
                    .with_reference(FindingRef::Segment(index)),
                );
            }

            let words = segment.text.split_whitespace().count();
            if words > self.config.max_segment_words {
                findings.push(
                    Finding::new(
                        Severity::Warning,
                        FindingCategory::TimingGap,
                        format!(
                            "segment has {words} words, more than {}",
                            self.config.max_segment_words
                        ),
                    )
                    .with_reference(FindingRef::Segment(index)),
                );
            }
        }
    }
}

/// Appends diagnostics of `category` carried by the timeline.
fn queued(timeline: &Timeline, category: FindingCategory, findings: &mut Vec<Finding>) {
    findings.extend(
        timeline
            .diagnostics
            .iter()
            .filter(|f| f.category == category)
            .cloned(),
    );
}

fn check_segment_overlap(timeline: &Timeline, findings: &mut Vec<Finding>) {
    let segments = &timeline.segments;
    for (i, a) in segments.iter().enumerate() {
        for (j, b) in segments.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                findings.push(
                    Finding::new(
                        Severity::Error,
                        FindingCategory::TimingOverlap,
                        format!(
                            "segment {} ({}-{}) overlaps segment {} ({}-{})",
                            i + 1,
                            format_ms(a.start_ms),
                            format_ms(a.end_ms),
                            j + 1,
                            format_ms(b.start_ms),
                            format_ms(b.end_ms)
                        ),
                    )
                    .with_reference(FindingRef::Segment(j)),
                );
            }
        }
    }
}

fn check_alignment(timeline: &Timeline, expectations: &Expectations, findings: &mut Vec<Finding>) {
    if let Some(expected) = expectations.segment_count {
        let actual = timeline.segments.len();
        if expected != actual {
            findings.push(Finding::new(
                Severity::Error,
                FindingCategory::Alignment,
                format!("expected {expected} segments, timeline has {actual}"),
            ));
        }
    }

    if let Some(speakers) = &expectations.speakers {
        for (index, (expected, segment)) in speakers.iter().zip(&timeline.segments).enumerate() {
            if speaker_key(expected) != speaker_key(&segment.speaker) {
                findings.push(
                    Finding::new(
                        Severity::Warning,
                        FindingCategory::Alignment,
                        format!(
                            "expected speaker '{}', segment is spoken by '{}'",
                            expected.trim(),
                            segment.speaker.trim()
                        ),
                    )
                    .with_reference(FindingRef::Segment(index)),
                );
            }
        }
        if speakers.len() != timeline.segments.len() {
            findings.push(Finding::new(
                Severity::Warning,
                FindingCategory::Alignment,
                format!(
                    "expected {} speakers, timeline has {} segments",
                    speakers.len(),
                    timeline.segments.len()
                ),
            ));
        }
    }
}

fn speaker_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn check_lane_overlap(timeline: &Timeline, findings: &mut Vec<Finding>) {
    let events = &timeline.events;
    for (i, a) in events.iter().enumerate() {
        for (j, b) in events.iter().enumerate().skip(i + 1) {
            if a.lane == b.lane && a.overlaps(b) {
                findings.push(
                    Finding::new(
                        Severity::Error,
                        FindingCategory::Collision,
                        format!(
                            "events {} and {} overlap in lane {}",
                            i + 1,
                            j + 1,
                            a.lane
                        ),
                    )
                    .with_reference(FindingRef::Event(j)),
                );
            }
        }
    }
}
