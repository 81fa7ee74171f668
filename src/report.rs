use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AlreadyProtected,
    ReadError,
    PermissionDenied,
    Unknown,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::AlreadyProtected => "already protected",
            ErrorKind::ReadError => "read error",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::Unknown => "error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Success { source: PathBuf, output: PathBuf },
    Failure(Failure),
}

impl ProcessingOutcome {
    pub fn failure(path: &Path, kind: ErrorKind, message: impl Into<String>) -> Self {
        ProcessingOutcome::Failure(Failure {
            path: path.to_path_buf(),
            kind,
            message: message.into(),
        })
    }
}

/// Per-run tally. Only the worker that owns it appends; the completion
/// observer receives it once the run is over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultReport {
    pub success_count: usize,
    pub failures: Vec<Failure>,
    pub outputs: Vec<PathBuf>,
    pub cancelled: bool,
}

impl ResultReport {
    pub fn record(&mut self, outcome: ProcessingOutcome) {
        match outcome {
            ProcessingOutcome::Success { output, .. } => {
                self.success_count += 1;
                self.outputs.push(output);
            }
            ProcessingOutcome::Failure(failure) => self.failures.push(failure),
        }
    }

    pub fn attempted(&self) -> usize {
        self.success_count + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn headline(&self) -> String {
        let mut line = if self.failures.is_empty() {
            format!("Protected {} file(s).", self.success_count)
        } else if self.success_count > 0 {
            format!(
                "Protected {} file(s); {} failed.",
                self.success_count,
                self.failures.len()
            )
        } else {
            format!("All {} file(s) failed.", self.failures.len())
        };
        if self.cancelled {
            line.push_str(" Run cancelled before the remaining files.");
        }
        line
    }

    /// Summary text. Every failure is listed; trimming is left to the caller.
    pub fn render(&self) -> String {
        let mut out = self.headline();
        for failure in &self.failures {
            out.push('\n');
            out.push_str(&format!(
                "{} \u{2014} {}",
                failure.path.display(),
                failure.message
            ));
        }
        out
    }
}
