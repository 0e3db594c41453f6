//! Parse-script command: splits an authored script into speaker lines.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

pub fn run<W: Write>(writer: &mut W, script_path: &Path, character: &str) -> Result<()> {
    let script = std::fs::read_to_string(script_path)
        .with_context(|| format!("failed to read {}", script_path.display()))?;
    let lines = narsync_core::parse_script(&script, character)
        .with_context(|| format!("failed to parse script for character '{character}'"))?;

    if lines.is_empty() {
        tracing::warn!(path = ?script_path, "script has no speaker lines");
    }
    writeln!(writer, "{}", serde_json::to_string_pretty(&lines)?)?;
    Ok(())
}
