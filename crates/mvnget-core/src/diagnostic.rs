//! Diagnostic records collected over a run and reported at exit.
//!
//! Expected per-artifact problems (missing files, license findings, checksum
//! mismatches, unresolvable versions) are recorded here instead of being
//! returned as errors, so that resolution of sibling artifacts continues.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use mvnget_util::errors::MvnGetError;

/// One finding about an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    #[serde(rename = "msg")]
    pub message: String,
    /// Coordinate id (or raw request) the finding is attributed to.
    #[serde(rename = "artifact")]
    pub subject: String,
    pub files: Vec<PathBuf>,
    /// A policy violation; the listed files may be removed at exit.
    #[serde(rename = "file_violation")]
    pub violation: bool,
}

impl DiagnosticRecord {
    pub fn new(
        subject: impl Into<String>,
        files: Vec<PathBuf>,
        violation: bool,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            subject: subject.into(),
            files,
            violation,
        }
    }
}

impl fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violation {
            write!(f, "VIOLATION {} - {}", self.subject, self.message)
        } else {
            write!(f, "{} - {}", self.subject, self.message)
        }
    }
}

/// Shared, append-only list of diagnostics.
///
/// Cloning yields another handle onto the same list, so download tasks
/// running concurrently can record into it.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    records: Arc<Mutex<Vec<DiagnosticRecord>>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: DiagnosticRecord) {
        tracing::debug!("recorded: {record}");
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }

    /// Record an informational finding.
    pub fn note(
        &self,
        subject: impl Into<String>,
        files: Vec<PathBuf>,
        message: impl Into<String>,
    ) {
        self.push(DiagnosticRecord::new(subject, files, false, message));
    }

    /// Record a policy violation.
    pub fn violation(
        &self,
        subject: impl Into<String>,
        files: Vec<PathBuf>,
        message: impl Into<String>,
    ) {
        self.push(DiagnosticRecord::new(subject, files, true, message));
    }

    /// Copy of every record so far, in recording order.
    pub fn snapshot(&self) -> Vec<DiagnosticRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_violations(&self) -> bool {
        self.snapshot().iter().any(|r| r.violation)
    }
}

/// Lines printed at exit, or `None` when there is nothing to report.
pub fn report_lines(records: &[DiagnosticRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }
    let mut out = String::from("Discovered problems:\n");
    for record in records {
        out.push_str("    ");
        out.push_str(&record.to_string());
        out.push('\n');
    }
    Some(out)
}

/// Append `records` to `path`: a JSON array when the name ends in `.json`,
/// otherwise one line per record.
pub fn append_problem_file(path: &Path, records: &[DiagnosticRecord]) -> miette::Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let body = if is_json {
        serde_json::to_string(records).map_err(|e| MvnGetError::Generic {
            message: format!("Failed to serialize problems: {e}"),
        })?
    } else {
        let mut lines: String = records
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        lines.push('\n');
        lines
    };
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(MvnGetError::Io)?;
    file.write_all(body.as_bytes()).map_err(MvnGetError::Io)?;
    Ok(())
}

/// Delete every existing file named by a violation record. Returns the
/// files removed.
pub fn clean_violations(records: &[DiagnosticRecord]) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    for record in records.iter().filter(|r| r.violation) {
        for file in &record.files {
            if file.is_file() {
                tracing::info!(
                    "{} - file in violation of policies; removing {}",
                    record.subject,
                    file.display()
                );
                mvnget_util::fs::delete_file(file);
                removed.push(file.clone());
            }
        }
    }
    removed
}
