//! Trigger lookup: finds where each annotation's trigger is spoken.

use crate::report::{Finding, FindingCategory, FindingRef, Severity};
use crate::text::{find_folded, fold};
use crate::types::{OverlayAnnotation, Segment};

/// Where a trigger was found in the narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub segment_index: usize,
    /// Char offset of the match within the segment text.
    pub char_offset: usize,
}

/// Locator output: one slot per annotation, in annotation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub locations: Vec<Option<Location>>,
    /// One `coverage` warning per unmatched annotation.
    pub findings: Vec<Finding>,
}

/// Finds the first occurrence of every trigger, by segment then char offset.
///
/// Matching ignores case and treats any whitespace run as a single space.
pub fn locate_annotations(segments: &[Segment], annotations: &[OverlayAnnotation]) -> Located {
    let folded: Vec<Vec<(char, usize)>> = segments.iter().map(|s| fold(&s.text)).collect();
    let mut findings = Vec::new();

    let locations = annotations
        .iter()
        .enumerate()
        .map(|(index, annotation)| {
            let needle: Vec<char> = fold(&annotation.trigger).into_iter().map(|(c, _)| c).collect();
            let found = folded.iter().enumerate().find_map(|(segment_index, haystack)| {
                find_folded(haystack, &needle).map(|char_offset| Location {
                    segment_index,
                    char_offset,
                })
            });

            if found.is_none() {
                tracing::warn!(
                    annotation = index,
                    trigger = %annotation.trigger,
                    "overlay trigger not found in narration"
                );
                findings.push(
                    Finding::new(
                        Severity::Warning,
                        FindingCategory::Coverage,
                        format!(
                            "{} trigger '{}' not found in narration",
                            annotation.category,
                            annotation.trigger.trim()
                        ),
                    )
                    .with_reference(FindingRef::Annotation(index)),
                );
            }
            found
        })
        .collect();

    Located {
        locations,
        findings,
    }
}
