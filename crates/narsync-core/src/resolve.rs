//! Lane collision resolution.
//!
//! Events are grouped by lane and swept independently. Within a lane the sweep
//! keeps one active event; each newcomer that intersects it is compared by
//! priority, and the loser is truncated or dropped. Lanes never interact.

use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::report::{Finding, FindingCategory, FindingRef, Severity, format_ms};
use crate::types::OverlayEvent;

/// Events that survived resolution plus one finding per truncation or drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub events: Vec<OverlayEvent>,
    pub findings: Vec<Finding>,
}

/// Resolves same-lane overlaps between scheduled events.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver<'a> {
    config: &'a EngineConfig,
}

impl<'a> CollisionResolver<'a> {
    pub const fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Returns collision-free events ordered by (start, end, lane, annotation).
    pub fn resolve(&self, events: Vec<OverlayEvent>) -> Resolution {
        let mut lanes: BTreeMap<String, Vec<OverlayEvent>> = BTreeMap::new();
        for event in events {
            lanes.entry(event.lane.clone()).or_default().push(event);
        }

        let mut resolution = Resolution::default();
        for (lane, lane_events) in lanes {
            let swept = sweep_lane(lane_events, self.config.min_display_ms);
            if !swept.findings.is_empty() {
                tracing::debug!(
                    lane = %lane,
                    collisions = swept.findings.len(),
                    "resolved lane collisions"
                );
            }
            resolution.events.extend(swept.events);
            resolution.findings.extend(swept.findings);
        }

        resolution.events.sort_by(|a, b| {
            (a.start_ms, a.end_ms, &a.lane, a.annotation_index)
                .cmp(&(b.start_ms, b.end_ms, &b.lane, b.annotation_index))
        });
        resolution
    }
}

/// Sweeps the events of a single lane.
///
/// Order of processing is (start, priority descending, annotation index). A
/// newcomer that outranks the active event cuts it short at the newcomer's
/// start; otherwise the newcomer loses and is dropped, so ties go to the event
/// already on screen. A truncated event shorter than `min_display_ms` is
/// dropped instead.
pub fn sweep_lane(mut events: Vec<OverlayEvent>, min_display_ms: i64) -> Resolution {
    events.sort_by(|a, b| {
        a.start_ms
            .cmp(&b.start_ms)
            .then(b.priority.cmp(&a.priority))
            .then(a.annotation_index.cmp(&b.annotation_index))
    });

    let mut kept = Vec::with_capacity(events.len());
    let mut findings = Vec::new();
    let mut active: Option<OverlayEvent> = None;

    for event in events {
        let Some(mut current) = active.take() else {
            active = Some(event);
            continue;
        };

        if event.start_ms >= current.end_ms {
            kept.push(current);
            active = Some(event);
            continue;
        }

        if event.priority > current.priority {
            let truncated_ms = event.start_ms - current.start_ms;
            if truncated_ms >= min_display_ms {
                findings.push(truncated(&current, &event));
                current.end_ms = event.start_ms;
                kept.push(current);
            } else {
                findings.push(dropped(&current, &event, min_display_ms));
            }
            active = Some(event);
        } else {
            findings.push(dropped(&event, &current, min_display_ms));
            active = Some(current);
        }
    }
    kept.extend(active);

    Resolution {
        events: kept,
        findings,
    }
}

fn truncated(loser: &OverlayEvent, winner: &OverlayEvent) -> Finding {
    Finding::new(
        Severity::Warning,
        FindingCategory::Collision,
        format!(
            "{} '{}' cut to end at {} by {} '{}' in lane {}",
            loser.category,
            loser.payload,
            format_ms(winner.start_ms),
            winner.category,
            winner.payload,
            loser.lane
        ),
    )
    .with_reference(FindingRef::Annotation(loser.annotation_index))
}

fn dropped(loser: &OverlayEvent, winner: &OverlayEvent, min_display_ms: i64) -> Finding {
    // Events already under the floor were never going to display well.
    let severity = if loser.duration_ms() < min_display_ms {
        Severity::Info
    } else {
        Severity::Warning
    };
    Finding::new(
        severity,
        FindingCategory::Collision,
        format!(
            "{} '{}' dropped; lane {} is held by {} '{}'",
            loser.category, loser.payload, loser.lane, winner.category, winner.payload
        ),
    )
    .with_reference(FindingRef::Annotation(loser.annotation_index))
}
