//! Validate command: re-runs QA on a timeline saved by `build`.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};

use narsync_core::{Engine, Expectations, QaReport, Timeline};

use crate::Config;

pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    timeline_path: &Path,
    expectations: &Expectations,
    strict: bool,
    json: bool,
) -> Result<()> {
    let content = std::fs::read_to_string(timeline_path)
        .with_context(|| format!("failed to read {}", timeline_path.display()))?;
    let timeline: Timeline = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", timeline_path.display()))?;

    let report = Engine::new(config.engine.clone()).revalidate(&timeline, expectations);
    write_report(writer, &report, json)?;

    if strict && report.has_errors() {
        bail!("timeline has {} error findings", report.count(narsync_core::Severity::Error));
    }
    Ok(())
}

fn write_report<W: Write>(writer: &mut W, report: &QaReport, json: bool) -> Result<()> {
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(report)?)?;
        return Ok(());
    }
    if !report.is_clean() {
        writeln!(writer, "{}", report.render_log())?;
    }
    writeln!(writer, "{}", report.summary())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    const TIMELINE: &str = r#"{
        "segments": [
            {"speaker": "Narrator", "text": "Hello there", "emotion": "neutral",
             "start_ms": 0, "end_ms": 900, "words": []},
            {"speaker": "Narrator", "text": "Goodbye", "emotion": "neutral",
             "start_ms": 6000, "end_ms": 7000, "words": []}
        ],
        "events": [],
        "total_duration_ms": 7700
    }"#;

    fn write_timeline() -> (tempfile::TempDir, std::path::PathBuf) {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("lesson.timeline.json");
        std::fs::write(&path, TIMELINE).unwrap();
        (temp, path)
    }

    #[test]
    fn test_validate_prints_log_and_summary() {
        let (_temp, path) = write_timeline();
        let expectations = Expectations {
            segment_count: Some(3),
            speakers: None,
        };

        let mut output = Vec::new();
        run(&mut output, &Config::default(), &path, &expectations, false, false).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        [WARNING] timing-gap: silent gap of 5.10s exceeds 4.00s (segment 2)
        [ERROR] alignment: expected 3 segments, timeline has 2
        2 findings (1 error, 1 warning, 0 info); max severity: error
        ");
    }

    #[test]
    fn test_strict_mode_fails_on_errors() {
        let (_temp, path) = write_timeline();
        let expectations = Expectations {
            segment_count: Some(3),
            speakers: None,
        };

        let mut output: Vec<u8> = Vec::new();
        let err = run(&mut output, &Config::default(), &path, &expectations, true, false).unwrap_err();

        assert_eq!(err.to_string(), "timeline has 1 error findings");
    }

    #[test]
    fn test_json_output_is_a_report() {
        let (_temp, path) = write_timeline();

        let mut output = Vec::new();
        run(&mut output, &Config::default(), &path, &Expectations::default(), true, true).unwrap();

        let report: QaReport = serde_json::from_slice(&output).unwrap();
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.max_severity, Some(narsync_core::Severity::Warning));
    }
}
