//! Timing extraction: aligns synthesizer word marks to script segments.
//!
//! # Algorithm Summary
//!
//! 1. Walk the marks with a cursor, matching each script word to the mark at
//!    the cursor (or a few marks ahead) by normalized, fuzzy comparison.
//! 2. Segments whose words mostly matched take their timing from the marks.
//!    Others are rolled back and re-timed by interpolation over the window
//!    left between their reconciled neighbours.
//! 3. A final forward pass removes any residual overlap between segments.

use crate::config::EngineConfig;
use crate::report::{Finding, FindingCategory, FindingRef, Severity, format_ms};
use crate::text::{Token, preview, scale, tokenize, words_match};
use crate::types::{ScriptLine, Segment, TimingMark, WordTiming};

/// How many leading words must line up to re-anchor after a lost segment.
const ANCHOR_WORDS: usize = 2;

/// Output of the timing extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub segments: Vec<Segment>,
    /// `alignment` findings for interpolated and empty segments.
    pub findings: Vec<Finding>,
    /// Length of the narration, including the trailing pad.
    pub total_duration_ms: i64,
}

/// A synthesizer mark that survived normalization.
#[derive(Debug, Clone)]
struct SpokenWord {
    norm: String,
    start_ms: i64,
    end_ms: i64,
}

/// Word-to-mark matching for one segment.
#[derive(Debug, Clone)]
struct SegmentMatch {
    tokens: Vec<Token>,
    /// Index into the spoken words for each token, if matched.
    marks: Vec<Option<usize>>,
    reconciled: bool,
}

impl SegmentMatch {
    fn matched_count(&self) -> usize {
        self.marks.iter().flatten().count()
    }
}

/// Aligns timing marks to segments.
#[derive(Debug, Clone, Copy)]
pub struct TimingExtractor<'a> {
    config: &'a EngineConfig,
}

impl<'a> TimingExtractor<'a> {
    pub const fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Builds timed segments from script lines and synthesizer marks.
    ///
    /// Marks must already be validated as non-empty and non-decreasing.
    /// Extraction itself never fails: segments that cannot be aligned are
    /// interpolated and reported.
    pub fn extract(
        &self,
        lines: &[ScriptLine],
        marks: &[TimingMark],
        declared_total_ms: Option<i64>,
    ) -> Extraction {
        let spoken = self.spoken_words(marks);
        let last_mark_end = marks
            .iter()
            .map(|m| {
                m.offset_ms
                    .saturating_add(m.duration_ms.unwrap_or(self.config.default_word_ms))
            })
            .max()
            .unwrap_or(0);

        let matches = self.match_segments(lines, &spoken);

        let mut timed: Vec<Option<Segment>> = lines
            .iter()
            .zip(&matches)
            .map(|(line, m)| m.reconciled.then(|| self.timed_from_marks(line, m, &spoken)))
            .collect();

        let mut findings = Vec::new();
        self.fill_unreconciled(
            lines,
            &matches,
            &mut timed,
            declared_total_ms.unwrap_or(0).max(last_mark_end),
            &mut findings,
        );

        let mut segments: Vec<Segment> = timed.into_iter().flatten().collect();
        enforce_order(&mut segments);

        let last_end = segments.last().map_or(0, |s| s.end_ms);
        let total_duration_ms = declared_total_ms
            .unwrap_or(0)
            .max(last_end.saturating_add(self.config.trailing_pad_ms));

        tracing::debug!(
            segments = segments.len(),
            interpolated = findings.len(),
            total_duration_ms,
            "extracted segment timing"
        );

        Extraction {
            segments,
            findings,
            total_duration_ms,
        }
    }

    fn spoken_words(&self, marks: &[TimingMark]) -> Vec<SpokenWord> {
        marks
            .iter()
            .filter_map(|mark| {
                let norm = crate::text::normalize_word(&mark.word);
                if norm.is_empty() {
                    return None;
                }
                let duration = mark.duration_ms.unwrap_or(self.config.default_word_ms);
                Some(SpokenWord {
                    norm,
                    start_ms: mark.offset_ms,
                    end_ms: mark.offset_ms.saturating_add(duration),
                })
            })
            .collect()
    }

    /// Greedy left-to-right matching of script words to spoken words.
    fn match_segments(&self, lines: &[ScriptLine], spoken: &[SpokenWord]) -> Vec<SegmentMatch> {
        let tolerance = self.config.word_match_tolerance;
        let mut cursor = 0;
        let mut lost = false;
        let mut matches = Vec::with_capacity(lines.len());

        for line in lines {
            let tokens = tokenize(&line.text);
            if tokens.is_empty() {
                matches.push(SegmentMatch {
                    tokens,
                    marks: Vec::new(),
                    reconciled: false,
                });
                continue;
            }

            let start = if lost {
                find_anchor(&tokens, spoken, cursor, tolerance).unwrap_or(cursor)
            } else {
                cursor
            };

            let mut position = start;
            let mut marks = Vec::with_capacity(tokens.len());
            for token in &tokens {
                let limit = (position + self.config.resync_window + 1).min(spoken.len());
                let found = (position..limit)
                    .find(|&i| words_match(&token.norm, &spoken[i].norm, tolerance));
                if let Some(i) = found {
                    position = i + 1;
                }
                marks.push(found);
            }

            let segment = SegmentMatch {
                tokens,
                marks,
                reconciled: false,
            };
            let matched = segment.matched_count();
            let unmatched = segment.tokens.len() - matched;
            let reconciled = matched > 0
                && unmatched * 100
                    <= self.config.max_unmatched_percent as usize * segment.tokens.len();

            if reconciled {
                cursor = position;
                lost = false;
            } else {
                // Leave the marks for the segments that follow.
                lost = true;
            }

            matches.push(SegmentMatch {
                reconciled,
                ..segment
            });
        }

        matches
    }

    /// Times a reconciled segment from its matched marks.
    fn timed_from_marks(&self, line: &ScriptLine, m: &SegmentMatch, spoken: &[SpokenWord]) -> Segment {
        let times: Vec<Option<i64>> = m.marks.iter().map(|i| i.map(|i| spoken[i].start_ms)).collect();
        let mut words = Vec::with_capacity(m.tokens.len());
        let mut end_ms = i64::MIN;

        for (i, token) in m.tokens.iter().enumerate() {
            let (start_ms, matched) = match m.marks[i] {
                Some(mark) => {
                    end_ms = end_ms.max(spoken[mark].end_ms);
                    (spoken[mark].start_ms, true)
                }
                None => {
                    let start_ms = interpolate_gap(&times, i, self.config.default_word_ms);
                    end_ms = end_ms.max(start_ms.saturating_add(self.config.default_word_ms));
                    (start_ms, false)
                }
            };
            words.push(WordTiming {
                word: token.text.clone(),
                char_offset: token.char_offset,
                start_ms,
                matched,
            });
        }

        let start_ms = words.first().map_or(0, |w| w.start_ms);
        Segment {
            speaker: line.speaker.clone(),
            text: line.text.clone(),
            emotion: line.emotion.clone(),
            start_ms,
            end_ms: end_ms.max(start_ms.saturating_add(1)),
            words,
        }
    }

    /// Interpolates every run of unreconciled segments over the window its
    /// neighbours leave free.
    fn fill_unreconciled(
        &self,
        lines: &[ScriptLine],
        matches: &[SegmentMatch],
        timed: &mut [Option<Segment>],
        audio_end_ms: i64,
        findings: &mut Vec<Finding>,
    ) {
        let mut i = 0;
        while i < timed.len() {
            if timed[i].is_some() {
                i += 1;
                continue;
            }
            let run_start = i;
            let mut run_end = i;
            while run_end < timed.len() && timed[run_end].is_none() {
                run_end += 1;
            }

            let window_start = timed[..run_start]
                .iter()
                .rev()
                .flatten()
                .next()
                .map_or(0, |s| s.end_ms);
            let floors: i64 = (run_start..run_end)
                .map(|j| self.floor_for(&matches[j]))
                .sum();
            let next_start = timed.get(run_end).and_then(Option::as_ref).map(|s| s.start_ms);
            let window_end = match next_start {
                Some(start) => start,
                None => {
                    if audio_end_ms - window_start >= floors {
                        audio_end_ms
                    } else {
                        let estimate: i64 = (run_start..run_end)
                            .map(|j| {
                                i64::try_from(matches[j].tokens.len())
                                    .unwrap_or(i64::MAX)
                                    .saturating_mul(self.config.default_word_ms)
                            })
                            .fold(0, i64::saturating_add);
                        window_start.saturating_add(estimate.max(floors))
                    }
                }
            };

            let durations = self.share_window(
                &matches[run_start..run_end],
                window_end - window_start,
                next_start.is_some(),
            );
            let mut cursor = window_start;
            for (offset, duration) in durations.into_iter().enumerate() {
                let j = run_start + offset;
                let segment = interpolated_segment(&lines[j], &matches[j], cursor, cursor.saturating_add(duration));
                findings.push(interpolation_finding(j, &matches[j], &segment));
                cursor = segment.end_ms;
                timed[j] = Some(segment);
            }

            i = run_end;
        }
    }

    fn floor_for(&self, m: &SegmentMatch) -> i64 {
        if m.tokens.is_empty() {
            self.config.empty_segment_floor_ms
        } else {
            self.config.min_speech_ms
        }
    }

    /// Splits `available_ms` across a run of segments.
    ///
    /// Every segment gets its floor. Empty segments get only that; the rest of
    /// the window is shared in proportion to text length.
    ///
    /// When the window cannot hold the floors, a run `bounded` by an aligned
    /// segment is squeezed into it in equal parts, so the aligned segment keeps
    /// its marks. An open-ended run, or a window too small for 1 ms each,
    /// gets the floors and overruns.
    fn share_window(&self, run: &[SegmentMatch], available_ms: i64, bounded: bool) -> Vec<i64> {
        let floors: Vec<i64> = run.iter().map(|m| self.floor_for(m)).collect();
        let floor_total: i64 = floors.iter().fold(0, |acc, f| acc.saturating_add(*f));
        let surplus = available_ms - floor_total;
        if surplus <= 0 {
            let count = i64::try_from(run.len()).unwrap_or(i64::MAX);
            if bounded && available_ms >= count {
                let part = available_ms / count;
                let mut durations = vec![part; run.len()];
                if let Some(last) = durations.last_mut() {
                    *last += available_ms - part * count;
                }
                return durations;
            }
            return floors;
        }

        let weights: Vec<usize> = run
            .iter()
            .map(|m| {
                if m.tokens.is_empty() {
                    0
                } else {
                    m.tokens.iter().map(|t| t.text.chars().count()).sum::<usize>().max(1)
                }
            })
            .collect();
        let weight_total: usize = weights.iter().sum();
        if weight_total == 0 {
            return floors;
        }

        let mut durations = floors;
        let mut handed_out = 0;
        let last_weighted = weights.iter().rposition(|&w| w > 0);
        for (k, weight) in weights.iter().enumerate() {
            if *weight == 0 {
                continue;
            }
            let share = if Some(k) == last_weighted {
                surplus - handed_out
            } else {
                scale(surplus, *weight, weight_total)
            };
            handed_out += share;
            durations[k] += share;
        }
        durations
    }
}

fn interpolation_finding(index: usize, m: &SegmentMatch, segment: &Segment) -> Finding {
    let message = if m.tokens.is_empty() {
        tracing::warn!(segment = index, "segment has no speakable words");
        format!(
            "segment has no speakable words; assigned {} at {}",
            format_ms(segment.duration_ms()),
            format_ms(segment.start_ms)
        )
    } else {
        tracing::warn!(
            segment = index,
            matched = m.matched_count(),
            words = m.tokens.len(),
            "segment timing interpolated"
        );
        format!(
            "'{}': {}/{} words matched timing marks; timing interpolated over {}-{}",
            preview(&segment.text),
            m.matched_count(),
            m.tokens.len(),
            format_ms(segment.start_ms),
            format_ms(segment.end_ms)
        )
    };
    Finding::new(Severity::Warning, FindingCategory::Alignment, message)
        .with_reference(FindingRef::Segment(index))
}

/// First position at or after `cursor` where the segment's opening words line up.
fn find_anchor(
    tokens: &[Token],
    spoken: &[SpokenWord],
    cursor: usize,
    tolerance: usize,
) -> Option<usize> {
    let needed = tokens.len().min(ANCHOR_WORDS);
    (cursor..spoken.len()).find(|&start| {
        spoken.len() - start >= needed
            && tokens
                .iter()
                .take(needed)
                .zip(&spoken[start..])
                .all(|(token, word)| words_match(&token.norm, &word.norm, tolerance))
    })
}

/// Start time for an unmatched word between matched neighbours.
fn interpolate_gap(times: &[Option<i64>], index: usize, default_word_ms: i64) -> i64 {
    let before = times[..index]
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, t)| t.map(|t| (i, t)));
    let after = times[index + 1..]
        .iter()
        .enumerate()
        .find_map(|(i, t)| t.map(|t| (index + 1 + i, t)));

    match (before, after) {
        (Some((i0, t0)), Some((i1, t1))) => t0 + scale(t1 - t0, index - i0, i1 - i0),
        (Some((i0, t0)), None) => t0.saturating_add(
            i64::try_from(index - i0)
                .unwrap_or(i64::MAX)
                .saturating_mul(default_word_ms),
        ),
        (None, Some((_, t1))) => t1,
        (None, None) => 0,
    }
}

/// A segment whose word times are spread by char position over `[start, end]`.
fn interpolated_segment(line: &ScriptLine, m: &SegmentMatch, start_ms: i64, end_ms: i64) -> Segment {
    let words = m
        .tokens
        .iter()
        .map(|token| WordTiming {
            word: token.text.clone(),
            char_offset: token.char_offset,
            start_ms,
            matched: false,
        })
        .collect();

    let mut segment = Segment {
        speaker: line.speaker.clone(),
        text: line.text.clone(),
        emotion: line.emotion.clone(),
        start_ms,
        end_ms,
        words,
    };
    spread_by_chars(&mut segment);
    segment
}

/// Re-spreads every word over the segment's window by char position.
fn spread_by_chars(segment: &mut Segment) {
    let text_len = segment.text.chars().count();
    let span = segment.end_ms - segment.start_ms;
    for word in &mut segment.words {
        word.start_ms = segment.start_ms + scale(span, word.char_offset, text_len);
    }
}

/// Ends `segment` at `limit`, pulling unmatched trailing words inside it.
///
/// Matched words keep their marks. The words after the last matched one are
/// spaced evenly between it and `limit`; a segment with no matched words is
/// re-spread by char position.
fn fit_tail(segment: &mut Segment, limit: i64) {
    segment.end_ms = limit;
    match segment.words.iter().rposition(|w| w.matched) {
        Some(last) => {
            let anchor = segment.words[last].start_ms;
            let tail = &mut segment.words[last + 1..];
            if tail.iter().all(|w| w.start_ms < limit) {
                return;
            }
            let slots = tail.len() + 1;
            for (k, word) in tail.iter_mut().enumerate() {
                word.start_ms = anchor + scale(limit - anchor, k + 1, slots);
            }
        }
        None => {
            if segment.words.iter().any(|w| w.start_ms >= limit) {
                spread_by_chars(segment);
            }
        }
    }
}

/// Starts an interpolated `segment` at `start_ms`, keeping its end if it can.
fn delay_start(segment: &mut Segment, start_ms: i64) {
    if start_ms < segment.end_ms {
        segment.start_ms = start_ms;
        spread_by_chars(segment);
    } else {
        segment.shift(start_ms - segment.start_ms);
    }
}

/// Guarantees segments are ordered and non-overlapping.
///
/// The predecessor yields first: it is cut back to where the next segment
/// starts as long as none of its matched words start later. Otherwise an
/// interpolated next segment starts late. An aligned next segment is shifted
/// only when its predecessor cannot shrink at all.
fn enforce_order(segments: &mut [Segment]) {
    for i in 1..segments.len() {
        let (head, tail) = segments.split_at_mut(i);
        let prev = &mut head[i - 1];
        let next = &mut tail[0];
        if next.start_ms >= prev.end_ms {
            continue;
        }
        let limit = next.start_ms;
        let last_matched = prev.words.iter().rev().find(|w| w.matched).map(|w| w.start_ms);
        if limit > prev.start_ms && last_matched.is_none_or(|t| limit >= t) {
            fit_tail(prev, limit);
        } else if next.words.iter().any(|w| w.matched) {
            tracing::warn!(segment = i, "shifting aligned segment past its predecessor");
            next.shift(prev.end_ms - next.start_ms);
        } else {
            delay_start(next, prev.end_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> ScriptLine {
        ScriptLine::new("Narrator", text)
    }

    /// Marks for `text` starting at `start_ms`, one word every `step_ms`.
    fn marks_for(text: &str, start_ms: i64, step_ms: i64) -> Vec<TimingMark> {
        text.split_whitespace()
            .zip(0..)
            .map(|(word, i)| TimingMark::new(word, start_ms + i * step_ms).with_duration(step_ms))
            .collect()
    }

    fn extract(lines: &[ScriptLine], marks: &[TimingMark]) -> Extraction {
        let config = EngineConfig::default();
        TimingExtractor::new(&config).extract(lines, marks, None)
    }

    #[test]
    fn test_exact_marks_give_exact_segment_bounds() {
        let lines = vec![line("Welcome to the lesson"), line("Plants need light")];
        let mut marks = marks_for("Welcome to the lesson", 0, 500);
        marks.extend(marks_for("Plants need light", 2_500, 500));

        let result = extract(&lines, &marks);

        assert!(result.findings.is_empty());
        assert_eq!(result.segments[0].start_ms, 0);
        assert_eq!(result.segments[0].end_ms, 2_000);
        assert_eq!(result.segments[1].start_ms, 2_500);
        assert_eq!(result.segments[1].end_ms, 4_000);
        assert_eq!(result.segments[1].words[2].start_ms, 3_500);
        assert!(result.segments[1].words.iter().all(|w| w.matched));
        assert_eq!(result.total_duration_ms, 4_700);
    }

    #[test]
    fn test_punctuation_and_case_are_ignored() {
        let lines = vec![line("Hello, World!")];
        let marks = vec![
            TimingMark::new("hello", 100).with_duration(300),
            TimingMark::new(",", 400),
            TimingMark::new("world", 500).with_duration(400),
        ];

        let result = extract(&lines, &marks);

        assert!(result.findings.is_empty());
        assert_eq!(result.segments[0].start_ms, 100);
        assert_eq!(result.segments[0].end_ms, 900);
    }

    #[test]
    fn test_near_miss_words_match_within_tolerance() {
        let lines = vec![line("The colour of leaves")];
        let marks = marks_for("The color of leaves", 0, 400);

        let result = extract(&lines, &marks);

        assert!(result.findings.is_empty());
        assert!(result.segments[0].words.iter().all(|w| w.matched));
    }

    #[test]
    fn test_single_unmatched_word_is_interpolated_inside_segment() {
        let lines = vec![line("We count 3 apples today")];
        let marks = marks_for("We count three apples today", 0, 400);

        let result = extract(&lines, &marks);

        assert!(result.findings.is_empty());
        let words = &result.segments[0].words;
        assert!(!words[2].matched);
        // "apples" matched the fourth mark at 1200 after skipping "three".
        assert_eq!(words[3].start_ms, 1_200);
        assert_eq!(words[2].start_ms, 800);
    }

    #[test]
    fn test_missing_segment_is_interpolated_between_neighbours() {
        let lines = vec![
            line("Welcome to our lesson today"),
            line("Plants turn light into sugar"),
            line("Thanks for watching"),
        ];
        let mut marks = marks_for("Welcome to our lesson today", 0, 400);
        marks.extend(marks_for("Thanks for watching", 5_000, 400));

        let result = extract(&lines, &marks);

        assert_eq!(result.segments.len(), 3);
        let middle = &result.segments[1];
        assert_eq!(middle.start_ms, 2_000);
        assert_eq!(middle.end_ms, 5_000);
        assert!(middle.words.iter().all(|w| !w.matched));
        assert_eq!(middle.words[0].start_ms, 2_000);
        assert_eq!(result.segments[2].start_ms, 5_000);

        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].category, FindingCategory::Alignment);
        assert_eq!(result.findings[0].severity, Severity::Warning);
        assert_eq!(result.findings[0].reference, Some(FindingRef::Segment(1)));
    }

    #[test]
    fn test_missing_segment_sharing_a_word_does_not_steal_marks() {
        let lines = vec![
            line("The first idea"),
            line("The missing part"),
            line("The final idea"),
        ];
        let mut marks = marks_for("The first idea", 0, 400);
        marks.extend(marks_for("The final idea", 3_000, 400));

        let result = extract(&lines, &marks);

        assert_eq!(result.segments[2].start_ms, 3_000);
        assert!(result.segments[2].words.iter().all(|w| w.matched));
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].reference, Some(FindingRef::Segment(1)));
    }

    #[test]
    fn test_trailing_missing_segment_uses_word_estimate() {
        let lines = vec![line("Hello there"), line("Goodbye now friends")];
        let marks = marks_for("Hello there", 0, 400);

        let result = extract(&lines, &marks);

        let last = &result.segments[1];
        assert_eq!(last.start_ms, 800);
        // Three words at the default word length.
        assert_eq!(last.end_ms, 800 + 3 * 350);
        assert_eq!(result.findings.len(), 1);
    }

    #[test]
    fn test_empty_segment_gets_floor_and_warning() {
        let lines = vec![line("Start here"), line("..."), line("End here")];
        let mut marks = marks_for("Start here", 0, 400);
        marks.extend(marks_for("End here", 2_000, 400));

        let result = extract(&lines, &marks);

        let empty = &result.segments[1];
        assert_eq!(empty.start_ms, 800);
        assert_eq!(empty.end_ms, 1_300);
        assert!(empty.words.is_empty());
        assert_eq!(result.findings.len(), 1);
        assert!(result.findings[0].message.contains("no speakable words"));
    }

    #[test]
    fn test_consecutive_missing_segments_share_window_by_length() {
        let lines = vec![
            line("Open"),
            line("aaaa"),
            line("bbbbbbbbbbbb"),
            line("Close"),
        ];
        let marks = vec![
            TimingMark::new("Open", 0).with_duration(1_000),
            TimingMark::new("Close", 9_000).with_duration(1_000),
        ];

        let result = extract(&lines, &marks);

        // Window 1000..9000 = 8000 ms; floors 400 + 400, surplus 7200 split 4:12.
        assert_eq!(result.segments[1].start_ms, 1_000);
        assert_eq!(result.segments[1].end_ms, 1_000 + 400 + 1_800);
        assert_eq!(result.segments[2].start_ms, 3_200);
        assert_eq!(result.segments[2].end_ms, 9_000);
        assert_eq!(result.findings.len(), 2);
    }

    #[test]
    fn test_floor_overrun_is_trimmed_at_next_segment() {
        let lines = vec![line("One"), line("zzz"), line("Two")];
        let marks = vec![
            TimingMark::new("One", 0).with_duration(1_000),
            TimingMark::new("Two", 1_100).with_duration(500),
        ];

        let result = extract(&lines, &marks);

        // The interpolated middle segment wants 400 ms but only 100 ms is free;
        // it is trimmed so the matched segment keeps its marks.
        assert_eq!(result.segments[1].start_ms, 1_000);
        assert_eq!(result.segments[1].end_ms, 1_100);
        assert_eq!(result.segments[2].start_ms, 1_100);
        for pair in result.segments.windows(2) {
            assert!(pair[0].end_ms <= pair[1].start_ms);
        }
    }

    #[test]
    fn test_marks_without_duration_use_default_word_length() {
        let lines = vec![line("Short line")];
        let marks = vec![TimingMark::new("Short", 0), TimingMark::new("line", 300)];

        let result = extract(&lines, &marks);

        assert_eq!(result.segments[0].end_ms, 650);
    }

    #[test]
    fn test_declared_total_extends_timeline() {
        let config = EngineConfig::default();
        let lines = vec![line("Hi")];
        let marks = vec![TimingMark::new("Hi", 0).with_duration(500)];

        let result = TimingExtractor::new(&config).extract(&lines, &marks, Some(10_000));

        assert_eq!(result.total_duration_ms, 10_000);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let lines = vec![line("Alpha beta"), line("missing words here"), line("gamma delta")];
        let mut marks = marks_for("Alpha beta", 0, 300);
        marks.extend(marks_for("gamma delta", 4_000, 300));

        assert_eq!(extract(&lines, &marks), extract(&lines, &marks));
    }

    #[test]
    fn test_trailing_unmatched_words_yield_to_next_segment() {
        let lines = vec![
            line("one two three four five six seven eight"),
            line("Next part here"),
        ];
        let mut marks = marks_for("one two three four five six", 0, 200);
        marks.extend(marks_for("Next part here", 1_300, 300));

        let result = extract(&lines, &marks);

        assert!(result.findings.is_empty());
        let first = &result.segments[0];
        let second = &result.segments[1];
        assert_eq!(second.start_ms, 1_300);
        assert_eq!(second.words[1].start_ms, 1_600);
        assert!(second.words.iter().all(|w| w.matched));
        assert_eq!(first.end_ms, 1_300);
        assert_eq!(first.words[5].start_ms, 1_000);
        assert!(first.words[5].matched);
        // "seven" and "eight" are spaced between "six" and the next segment.
        assert_eq!(first.words[6].start_ms, 1_100);
        assert_eq!(first.words[7].start_ms, 1_200);
    }

    #[test]
    fn test_missing_segment_is_squeezed_before_aligned_neighbour() {
        let lines = vec![line("One"), line("first gap"), line("second gap"), line("Two")];
        let marks = vec![
            TimingMark::new("One", 0).with_duration(1_000),
            TimingMark::new("Two", 1_300).with_duration(500),
        ];

        let result = extract(&lines, &marks);

        assert_eq!(result.segments[1].start_ms, 1_000);
        assert_eq!(result.segments[1].end_ms, 1_150);
        assert_eq!(result.segments[2].start_ms, 1_150);
        assert_eq!(result.segments[2].end_ms, 1_300);
        assert_eq!(result.segments[3].start_ms, 1_300);
        assert!(result.segments[3].words[0].matched);
    }

    fn interpolated(text: &str, start_ms: i64, end_ms: i64) -> Segment {
        let m = SegmentMatch {
            tokens: tokenize(text),
            marks: Vec::new(),
            reconciled: false,
        };
        interpolated_segment(&line(text), &m, start_ms, end_ms)
    }

    #[test]
    fn test_interpolated_segment_starts_late_behind_unyielding_predecessor() {
        let mut segments = vec![
            interpolated("first part", 0, 1_000),
            interpolated("second part", 0, 1_500),
            interpolated("third", 0, 600),
        ];

        enforce_order(&mut segments[..2]);
        assert_eq!(segments[1].start_ms, 1_000);
        assert_eq!(segments[1].end_ms, 1_500);
        assert_eq!(segments[1].words[0].start_ms, 1_000);

        segments.swap(1, 2);
        enforce_order(&mut segments[..2]);
        // Nothing of the window is left, so the whole segment moves.
        assert_eq!(segments[1].start_ms, 1_000);
        assert_eq!(segments[1].end_ms, 1_600);
    }

    #[test]
    fn test_aligned_segment_shifts_only_when_predecessor_cannot_shrink() {
        let mut aligned = interpolated("spoken", 500, 900);
        aligned.words[0].matched = true;
        let mut segments = vec![interpolated("long pause", 0, 1_200), aligned.clone()];

        enforce_order(&mut segments);
        assert_eq!(segments[0].end_ms, 500);
        assert_eq!(segments[1].start_ms, 500);

        let mut segments = vec![interpolated("long pause", 500, 1_200), aligned];
        enforce_order(&mut segments);
        assert_eq!(segments[1].start_ms, 1_200);
        assert_eq!(segments[1].end_ms, 1_600);
    }
}
