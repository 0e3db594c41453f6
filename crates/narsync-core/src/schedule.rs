//! Event scheduling: turns located triggers into timed overlay windows.

use crate::config::{DisplayDuration, EngineConfig};
use crate::locate::Location;
use crate::text::scale;
use crate::types::{OverlayAnnotation, OverlayEvent, Segment};

/// Computes raw, possibly colliding, overlay events.
#[derive(Debug, Clone, Copy)]
pub struct TimelineScheduler<'a> {
    config: &'a EngineConfig,
}

impl<'a> TimelineScheduler<'a> {
    pub const fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// One event per located annotation, in annotation order.
    ///
    /// `locations` is parallel to `annotations`; unlocated annotations are
    /// skipped.
    pub fn schedule(
        &self,
        segments: &[Segment],
        annotations: &[OverlayAnnotation],
        locations: &[Option<Location>],
        total_duration_ms: i64,
    ) -> Vec<OverlayEvent> {
        let events: Vec<OverlayEvent> = annotations
            .iter()
            .zip(locations)
            .enumerate()
            .filter_map(|(annotation_index, (annotation, location))| {
                let location = (*location)?;
                let segment = segments.get(location.segment_index)?;
                let policy = self.config.categories.get(annotation.category);
                let start = time_at(segment, location.char_offset);
                let (start_ms, end_ms) =
                    self.window(segment, start, policy.duration, total_duration_ms);

                Some(OverlayEvent {
                    category: annotation.category,
                    payload: annotation.payload.clone(),
                    start_ms,
                    end_ms,
                    segment_index: location.segment_index,
                    annotation_index,
                    lane: policy.lane.clone(),
                    priority: annotation.priority.unwrap_or(policy.priority),
                })
            })
            .collect();

        tracing::debug!(events = events.len(), "scheduled overlay events");
        events
    }

    /// Display window for an event starting at `start_ms` in `segment`.
    fn window(
        &self,
        segment: &Segment,
        start_ms: i64,
        duration: DisplayDuration,
        total_duration_ms: i64,
    ) -> (i64, i64) {
        let floor = self.config.min_display_ms;
        let limit = segment.end_ms.saturating_add(self.config.trailing_pad_ms);

        let wanted_end = match duration {
            DisplayDuration::Fixed(ms) => start_ms.saturating_add(ms),
            DisplayDuration::UntilSegmentEnd => segment.end_ms,
        };
        let mut start = start_ms;
        let mut end = wanted_end.min(limit);

        // The floor wins over the trigger time: the start stays on the spoken
        // word when the floor fits before the limit, otherwise it moves back
        // (never before the segment start) and only then does the end overrun.
        if end - start < floor {
            if start.saturating_add(floor) <= limit {
                end = start + floor;
            } else {
                end = limit;
                start = (limit - floor).max(segment.start_ms).min(start);
                end = end.max(start + floor);
            }
        }

        let start = start.clamp(0, total_duration_ms);
        let end = end.min(total_duration_ms);
        if end > start {
            (start, end)
        } else {
            ((end - 1).max(0), end.max(1))
        }
    }
}

/// Time at which the char at `char_offset` is spoken.
///
/// Interpolates by char position between the surrounding word boundaries; the
/// boundary after the last word is the segment end.
fn time_at(segment: &Segment, char_offset: usize) -> i64 {
    let text_len = segment.text.chars().count();
    let span = segment.end_ms - segment.start_ms;
    let Some(i) = segment.words.iter().rposition(|w| w.char_offset <= char_offset) else {
        if segment.words.is_empty() {
            return segment.start_ms + scale(span, char_offset, text_len);
        }
        return segment.start_ms;
    };

    let word = &segment.words[i];
    let (next_offset, next_ms) = segment
        .words
        .get(i + 1)
        .map_or((text_len, segment.end_ms), |next| (next.char_offset, next.start_ms));

    word.start_ms
        + scale(
            next_ms - word.start_ms,
            char_offset - word.char_offset,
            next_offset.saturating_sub(word.char_offset),
        )
}
