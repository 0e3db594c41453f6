//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Narration timing and overlay synchronization.
///
/// Aligns speech-synthesizer word timing to lesson scripts, schedules overlay
/// captions, highlights and emphasis callouts, and reports timing defects.
#[derive(Debug, Parser)]
#[command(name = "narsync", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build timelines and QA reports for lesson input files.
    ///
    /// Writes `<name>.timeline.json`, `<name>.qa.json` and
    /// `<name>_qa_report.txt` per lesson. Lessons run in parallel; a failed
    /// lesson does not stop the others.
    Build {
        /// Lesson input JSON files.
        #[arg(required = true)]
        lessons: Vec<PathBuf>,

        /// Output directory (overrides `output_dir` from config).
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Re-run QA on a saved timeline.
    Validate {
        /// Timeline JSON file written by `build`.
        timeline: PathBuf,

        /// Number of segments the script was split into.
        #[arg(long)]
        expected_segments: Option<usize>,

        /// Expected speaker of each segment, in order.
        #[arg(long = "speaker")]
        speakers: Vec<String>,

        /// Exit with an error if any finding is an error.
        #[arg(long)]
        strict: bool,

        /// Print the report as JSON instead of a log.
        #[arg(long)]
        json: bool,
    },

    /// Split an authored script into speaker lines (JSON).
    ParseScript {
        /// Script text file.
        script: PathBuf,

        /// Name of the lesson's character; `Narrator` is always recognized.
        #[arg(long)]
        character: String,
    },

    /// Print the effective configuration as TOML.
    Config,
}
