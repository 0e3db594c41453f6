//! Parsing of authored narration scripts into [`ScriptLine`]s.
//!
//! Scripts look like:
//!
//! ```text
//! Introduction:
//! Ada (excited): Today we look at plants.
//! Narrator (calm): Plants make their own food.
//! They use light to do it.
//! ```
//!
//! Section headers are skipped, lines without a speaker tag continue the
//! previous speaker, and text before the first speaker tag is ignored.

use regex::Regex;
use thiserror::Error;

use crate::types::ScriptLine;

const SECTION_HEADERS: [&str; 4] = ["Introduction", "Body", "Summary/Call to Action", "Summary"];

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("invalid speaker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Splits `script` into one line per speaker turn.
///
/// `character` is the lesson's on-screen character; `Narrator` is always
/// accepted as a speaker.
pub fn parse_script(script: &str, character: &str) -> Result<Vec<ScriptLine>, ScriptError> {
    let pattern = format!(
        r"^({}|Narrator)\s*(?:\(([^)]*)\))?:\s*(.*)$",
        regex::escape(character.trim())
    );
    let speaker_re = Regex::new(&pattern)?;

    let mut lines = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for raw in script.lines() {
        let line = raw.trim();
        if line.is_empty() || is_section_header(line) {
            continue;
        }

        if let Some(caps) = speaker_re.captures(line) {
            flush(&mut lines, current.take(), &mut buffer);
            let speaker = caps.get(1).map_or("", |m| m.as_str()).to_string();
            let emotion = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|e| !e.is_empty())
                .unwrap_or("neutral")
                .to_string();
            current = Some((speaker, emotion));
            if let Some(text) = caps.get(3).map(|m| m.as_str().trim()).filter(|t| !t.is_empty()) {
                buffer.push(text);
            }
        } else if current.is_some() {
            buffer.push(line);
        }
    }
    flush(&mut lines, current, &mut buffer);

    tracing::debug!(segments = lines.len(), "parsed script");
    Ok(lines)
}

fn is_section_header(line: &str) -> bool {
    let name = line.strip_suffix(':').unwrap_or(line).trim_end();
    SECTION_HEADERS.contains(&name)
}

fn flush(lines: &mut Vec<ScriptLine>, speaker: Option<(String, String)>, buffer: &mut Vec<&str>) {
    let text = buffer.join(" ");
    buffer.clear();
    let Some((speaker, emotion)) = speaker else {
        return;
    };
    if text.trim().is_empty() {
        return;
    }
    lines.push(ScriptLine::new(speaker, text).with_emotion(emotion));
}
