//! Build command: times lessons and writes timelines plus QA reports.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use narsync_core::{Engine, LessonInput, LessonOutput};

use crate::Config;

/// A lesson file that parsed, ready for the engine.
struct LoadedLesson {
    name: String,
    input: LessonInput,
}

pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    lessons: &[PathBuf],
    out_dir: Option<&Path>,
) -> Result<()> {
    let out_dir = out_dir.unwrap_or(config.output_dir.as_path());
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut failures = 0;
    let mut loaded = Vec::with_capacity(lessons.len());
    for path in lessons {
        match load_lesson(path) {
            Ok(lesson) => loaded.push(lesson),
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "skipping unreadable lesson");
                writeln!(writer, "{}: failed: {e:#}", lesson_name(path))?;
                failures += 1;
            }
        }
    }

    let engine = Engine::new(config.engine.clone());
    let inputs: Vec<LessonInput> = loaded.iter().map(|l| l.input.clone()).collect();
    let results = engine.run_batch(&inputs);

    for (lesson, result) in loaded.iter().zip(results) {
        match result {
            Ok(output) => {
                write_outputs(out_dir, &lesson.name, &output)?;
                writeln!(writer, "{}: {}", lesson.name, output.report.summary())?;
            }
            Err(e) => {
                tracing::warn!(lesson = %lesson.name, error = %e, "lesson rejected");
                writeln!(writer, "{}: failed: {e}", lesson.name)?;
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} lessons failed", lessons.len());
    }
    Ok(())
}

fn lesson_name(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "lesson".to_string(), |s| s.to_string_lossy().into_owned())
}

fn load_lesson(path: &Path) -> Result<LoadedLesson> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut input: LessonInput = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let name = lesson_name(path);
    if input.lesson.trim().is_empty() {
        input.lesson.clone_from(&name);
    }
    Ok(LoadedLesson { name, input })
}

fn write_outputs(out_dir: &Path, name: &str, output: &LessonOutput) -> Result<()> {
    let timeline_path = out_dir.join(format!("{name}.timeline.json"));
    let timeline = serde_json::to_string_pretty(&output.timeline)?;
    std::fs::write(&timeline_path, timeline)
        .with_context(|| format!("failed to write {}", timeline_path.display()))?;

    let qa_path = out_dir.join(format!("{name}.qa.json"));
    let qa = serde_json::to_string_pretty(&output.report)?;
    std::fs::write(&qa_path, qa).with_context(|| format!("failed to write {}", qa_path.display()))?;

    let log_path = out_dir.join(format!("{name}_qa_report.txt"));
    std::fs::write(&log_path, render_text_report(output))
        .with_context(|| format!("failed to write {}", log_path.display()))?;

    tracing::debug!(lesson = name, dir = ?out_dir, "wrote lesson outputs");
    Ok(())
}

/// Text log written next to the timeline.
fn render_text_report(output: &LessonOutput) -> String {
    let mut text = format!("QA report: {}\nfingerprint: {}\n\n", output.lesson, output.fingerprint);
    if !output.report.is_clean() {
        text.push_str(&output.report.render_log());
        text.push_str("\n\n");
    }
    text.push_str(&output.report.summary());
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    const LESSON: &str = r#"{
        "lesson": "Plants",
        "script": [
            {"speaker": "Narrator", "text": "Plants need light"},
            {"speaker": "Narrator", "text": "Leaves are green"}
        ],
        "timing_marks": [
            {"word": "Plants", "offset_ms": 0, "duration_ms": 400},
            {"word": "need", "offset_ms": 500, "duration_ms": 400},
            {"word": "light", "offset_ms": 1000, "duration_ms": 400},
            {"word": "Leaves", "offset_ms": 2000, "duration_ms": 400},
            {"word": "are", "offset_ms": 2500, "duration_ms": 400},
            {"word": "green", "offset_ms": 3000, "duration_ms": 400}
        ],
        "annotations": [
            {"category": "highlight", "trigger": "green", "payload": "green"},
            {"category": "caption", "trigger": "sunlight", "payload": "Sunlight"}
        ],
        "expected_segment_count": 2
    }"#;

    #[test]
    fn test_build_writes_timeline_and_reports() {
        let temp = tempfile::tempdir().unwrap();
        let lesson_path = temp.path().join("plants.json");
        std::fs::write(&lesson_path, LESSON).unwrap();
        let out_dir = temp.path().join("out");

        let mut output = Vec::new();
        run(&mut output, &Config::default(), &[lesson_path], Some(out_dir.as_path())).unwrap();

        assert_snapshot!(
            String::from_utf8(output).unwrap(),
            @"plants: 1 finding (0 error, 1 warning, 0 info); max severity: warning"
        );
        assert!(out_dir.join("plants.timeline.json").exists());
        assert!(out_dir.join("plants.qa.json").exists());

        let log = std::fs::read_to_string(out_dir.join("plants_qa_report.txt")).unwrap();
        assert!(log.starts_with("QA report: Plants\n"));
        assert!(log.contains(
            "[WARNING] coverage: caption trigger 'sunlight' not found in narration (annotation 2)"
        ));
    }

    #[test]
    fn test_build_continues_past_bad_lessons() {
        let temp = tempfile::tempdir().unwrap();
        let good = temp.path().join("good.json");
        std::fs::write(&good, LESSON).unwrap();
        let bad = temp.path().join("bad.json");
        std::fs::write(&bad, r#"{"script": [], "timing_marks": []}"#).unwrap();
        let out_dir = temp.path().join("out");

        let mut output = Vec::new();
        let result = run(&mut output, &Config::default(), &[bad, good], Some(out_dir.as_path()));

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 lessons failed");
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        bad: failed: script has no segments
        good: 1 finding (0 error, 1 warning, 0 info); max severity: warning
        ");
        assert!(out_dir.join("good.timeline.json").exists());
        assert!(!out_dir.join("bad.timeline.json").exists());
    }

    #[test]
    fn test_lesson_title_defaults_to_file_name() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("untitled.json");
        std::fs::write(&path, LESSON.replace(r#""lesson": "Plants","#, "")).unwrap();

        let lesson = load_lesson(&path).unwrap();

        assert_eq!(lesson.input.lesson, "untitled");
    }
}
