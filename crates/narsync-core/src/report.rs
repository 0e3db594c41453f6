//! QA findings and the aggregated report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How serious a finding is. Ordered `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Upper-case tag used in the text log.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which kind of defect a finding describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCategory {
    TimingGap,
    TimingOverlap,
    Alignment,
    Coverage,
    Collision,
}

impl FindingCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TimingGap => "timing-gap",
            Self::TimingOverlap => "timing-overlap",
            Self::Alignment => "alignment",
            Self::Coverage => "coverage",
            Self::Collision => "collision",
        }
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a finding points at. Indices are zero-based; display is one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "lowercase")]
pub enum FindingRef {
    Segment(usize),
    Annotation(usize),
    Event(usize),
}

impl fmt::Display for FindingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Segment(i) => write!(f, "segment {}", i + 1),
            Self::Annotation(i) => write!(f, "annotation {}", i + 1),
            Self::Event(i) => write!(f, "event {}", i + 1),
        }
    }
}

/// One diagnostic produced while building or validating a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: FindingCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<FindingRef>,
}

impl Finding {
    pub fn new(severity: Severity, category: FindingCategory, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            reference: None,
        }
    }

    #[must_use]
    pub const fn with_reference(mut self, reference: FindingRef) -> Self {
        self.reference = Some(reference);
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.severity.label(),
            self.category,
            self.message
        )?;
        if let Some(reference) = &self.reference {
            write!(f, " ({reference})")?;
        }
        Ok(())
    }
}

/// Ordered findings plus the highest severity among them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaReport {
    pub findings: Vec<Finding>,
    /// `None` when the report is clean.
    pub max_severity: Option<Severity>,
}

impl QaReport {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let max_severity = findings.iter().map(|f| f.severity).max();
        Self {
            findings,
            max_severity,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.max_severity == Some(Severity::Error)
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Findings of one category, in report order.
    pub fn by_category(&self, category: FindingCategory) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.category == category)
    }

    /// Human-readable log, one severity-tagged finding per line.
    pub fn render_log(&self) -> String {
        self.findings
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One-line count summary for status output.
    pub fn summary(&self) -> String {
        let total = self.findings.len();
        let noun = if total == 1 { "finding" } else { "findings" };
        let max = self.max_severity.map_or("none", Severity::as_str);
        format!(
            "{total} {noun} ({} error, {} warning, {} info); max severity: {max}",
            self.count(Severity::Error),
            self.count(Severity::Warning),
            self.count(Severity::Info),
        )
    }
}

/// Formats milliseconds as seconds with two decimals, e.g. `4.25s`.
pub fn format_ms(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let abs = ms.unsigned_abs();
    format!("{sign}{}.{:02}s", abs / 1000, (abs % 1000) / 10)
}
