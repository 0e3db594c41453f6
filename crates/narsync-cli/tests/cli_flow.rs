//! End-to-end tests driving the `narsync` binary.
//!
//! Tests the full flow: parse-script → build → validate.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn narsync_binary() -> String {
    env!("CARGO_BIN_EXE_narsync").to_string()
}

/// Runs narsync with an isolated home and config directory.
fn narsync(home: &Path, args: &[&str]) -> Output {
    Command::new(narsync_binary())
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run narsync")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

const SCRIPT: &str = "\
Introduction:
Ada (excited): Welcome to our science lesson.
Narrator (calm): Plants turn light into sugar.
Summary:
Ada (happy): Thanks for watching!
";

/// Marks for the first and last lines only; the synthesizer dropped the middle.
const MARKS: &str = r#"[
    {"word": "Welcome", "offset_ms": 0, "duration_ms": 350},
    {"word": "to", "offset_ms": 400, "duration_ms": 350},
    {"word": "our", "offset_ms": 800, "duration_ms": 350},
    {"word": "science", "offset_ms": 1200, "duration_ms": 350},
    {"word": "lesson", "offset_ms": 1600, "duration_ms": 350},
    {"word": "Thanks", "offset_ms": 5000, "duration_ms": 350},
    {"word": "for", "offset_ms": 5400, "duration_ms": 350},
    {"word": "watching", "offset_ms": 5800, "duration_ms": 350}
]"#;

#[test]
fn test_script_to_timeline_flow() {
    let temp = TempDir::new().unwrap();
    let script_path = temp.path().join("script.txt");
    std::fs::write(&script_path, SCRIPT).unwrap();

    let parsed = narsync(
        temp.path(),
        &["parse-script", script_path.to_str().unwrap(), "--character", "Ada"],
    );
    assert!(
        parsed.status.success(),
        "parse-script should succeed: {}",
        String::from_utf8_lossy(&parsed.stderr)
    );
    let script: serde_json::Value = serde_json::from_slice(&parsed.stdout).unwrap();
    assert_eq!(script.as_array().unwrap().len(), 3);

    let lesson = format!(
        r#"{{
            "lesson": "Photosynthesis",
            "script": {script},
            "timing_marks": {MARKS},
            "annotations": [
                {{"category": "highlight", "trigger": "science", "payload": "Science"}},
                {{"category": "caption", "trigger": "light into sugar", "payload": "Light -> Sugar"}}
            ],
            "expected_segment_count": 3,
            "expected_speakers": ["Ada", "Narrator", "Ada"]
        }}"#
    );
    let lesson_path = temp.path().join("photosynthesis.json");
    std::fs::write(&lesson_path, lesson).unwrap();
    let out_dir = temp.path().join("out");

    let built = narsync(
        temp.path(),
        &[
            "build",
            lesson_path.to_str().unwrap(),
            "--out-dir",
            out_dir.to_str().unwrap(),
        ],
    );
    assert!(
        built.status.success(),
        "build should succeed: {}",
        String::from_utf8_lossy(&built.stderr)
    );
    assert_eq!(
        stdout(&built).trim(),
        "photosynthesis: 1 finding (0 error, 1 warning, 0 info); max severity: warning"
    );

    let timeline_path = out_dir.join("photosynthesis.timeline.json");
    let timeline: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&timeline_path).unwrap()).unwrap();
    assert_eq!(timeline["segments"].as_array().unwrap().len(), 3);
    assert_eq!(timeline["segments"][1]["start_ms"], 1950);
    assert_eq!(timeline["segments"][1]["end_ms"], 5000);
    assert_eq!(timeline["events"].as_array().unwrap().len(), 2);

    let log = std::fs::read_to_string(out_dir.join("photosynthesis_qa_report.txt")).unwrap();
    assert!(log.contains("[WARNING] alignment:"), "{log}");

    let validated = narsync(
        temp.path(),
        &[
            "validate",
            timeline_path.to_str().unwrap(),
            "--expected-segments",
            "4",
            "--strict",
        ],
    );
    assert!(!validated.status.success(), "strict validate should fail on errors");
    let text = stdout(&validated);
    assert!(text.contains("[ERROR] alignment: expected 4 segments, timeline has 3"), "{text}");
    assert!(text.contains("[WARNING] alignment:"), "{text}");
}

#[test]
fn test_build_reports_failed_lessons() {
    let temp = TempDir::new().unwrap();
    let lesson_path = temp.path().join("broken.json");
    std::fs::write(
        &lesson_path,
        r#"{"script": [{"speaker": "Narrator", "text": "Hi"}], "timing_marks": []}"#,
    )
    .unwrap();

    let output = narsync(
        temp.path(),
        &[
            "build",
            lesson_path.to_str().unwrap(),
            "--out-dir",
            temp.path().join("out").to_str().unwrap(),
        ],
    );

    assert!(!output.status.success());
    assert!(stdout(&output).contains("broken: failed: timing mark list is empty"));
}

#[test]
fn test_config_file_and_env_layering() {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join(".config/narsync");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "output_dir = \"renders\"\n\n[engine]\nmax_gap_ms = 2500\nmin_display_ms = 1200\n",
    )
    .unwrap();

    let output = Command::new(narsync_binary())
        .env("HOME", temp.path())
        .env("XDG_CONFIG_HOME", temp.path().join(".config"))
        .env("NARSYNC_ENGINE__MIN_DISPLAY_MS", "1500")
        .arg("config")
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "config should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let text = stdout(&output);
    assert!(text.contains("output_dir = \"renders\""), "{text}");
    assert!(text.contains("max_gap_ms = 2500"), "{text}");
    assert!(text.contains("min_display_ms = 1500"), "{text}");
}
