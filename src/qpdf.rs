use crate::document::{Cipher, DocumentBackend, DocumentError};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::NamedTempFile;

const PDF_MAGIC: &[u8] = b"%PDF-";
const HEADER_WINDOW: u64 = 1024;

/// Backend driving the `qpdf` program.
#[derive(Debug, Clone)]
pub struct QpdfBackend {
    program: PathBuf,
}

#[derive(Debug)]
pub struct SourcePdf {
    path: PathBuf,
    encrypted: bool,
}

#[derive(Debug)]
pub struct ProtectedPdf {
    file: NamedTempFile,
}

impl QpdfBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Confirms the program can be launched at all.
    pub fn check_available(&self) -> Result<String, DocumentError> {
        let output = self.exec(|cmd| {
            cmd.arg("--version");
        })?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or("qpdf").trim().to_string())
    }

    fn exec(&self, configure: impl FnOnce(&mut Command)) -> Result<Output, DocumentError> {
        let mut cmd = Command::new(&self.program);
        configure(&mut cmd);
        cmd.output().map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                DocumentError::Tool(format!(
                    "qpdf not found at '{}'; install qpdf or pass --qpdf",
                    self.program.display()
                ))
            } else {
                DocumentError::Tool(format!("failed to launch qpdf: {err}"))
            }
        })
    }

    fn probe_encryption(&self, path: &Path) -> Result<bool, DocumentError> {
        let output = self.exec(|cmd| {
            cmd.arg("--show-encryption").arg(path);
        })?;
        if succeeded(&output) {
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Ok(!stdout.contains("File is not encrypted"));
        }
        let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
        if stderr.contains("invalid password") {
            return Ok(true);
        }
        Err(classify_failure(&output))
    }
}

impl DocumentBackend for QpdfBackend {
    type Document = SourcePdf;
    type Protected = ProtectedPdf;

    fn read(&self, path: &Path) -> Result<SourcePdf, DocumentError> {
        let file = File::open(path)?;
        let mut head = Vec::with_capacity(HEADER_WINDOW as usize);
        file.take(HEADER_WINDOW).read_to_end(&mut head)?;
        if !head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
            return Err(DocumentError::Unreadable("missing %PDF- header".into()));
        }
        let encrypted = self.probe_encryption(path)?;
        Ok(SourcePdf {
            path: path.to_path_buf(),
            encrypted,
        })
    }

    fn is_protected(&self, document: &SourcePdf) -> bool {
        document.encrypted
    }

    fn protect(
        &self,
        document: SourcePdf,
        password: &str,
        cipher: Cipher,
    ) -> Result<ProtectedPdf, DocumentError> {
        if password.contains(['\n', '\r']) {
            return Err(DocumentError::Tool(
                "password may not contain line breaks".into(),
            ));
        }
        let output = tempfile::Builder::new()
            .prefix("pdf-locker-")
            .suffix(".pdf")
            .tempfile()?;

        // qpdf reads one argument per line from an @file, which keeps the
        // password off the process command line. The named forms keep a
        // password starting with `--` from being read as an option.
        let mut args = tempfile::Builder::new().prefix("pdf-locker-args-").tempfile()?;
        let lines = [
            "--encrypt".to_string(),
            format!("--user-password={password}"),
            format!("--owner-password={password}"),
            format!("--bits={}", cipher.key_bits()),
            "--".to_string(),
            document.path.to_string_lossy().to_string(),
            output.path().to_string_lossy().to_string(),
        ];
        for line in &lines {
            writeln!(args, "{line}")?;
        }
        args.flush()?;

        let mut argfile = std::ffi::OsString::from("@");
        argfile.push(args.path());
        let result = self.exec(|cmd| {
            cmd.arg(&argfile);
        })?;
        drop(args);

        if !succeeded(&result) {
            return Err(classify_failure(&result));
        }
        Ok(ProtectedPdf { file: output })
    }

    fn write(&self, protected: ProtectedPdf, path: &Path) -> Result<(), DocumentError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // A fresh file takes the process umask instead of the temp file's 0600.
        let mut staged = File::open(protected.file.path())?;
        let mut out = File::create(path)?;
        io::copy(&mut staged, &mut out)?;
        out.sync_all()?;
        Ok(())
    }
}

// qpdf exits 3 when it succeeded with warnings.
fn succeeded(output: &Output) -> bool {
    matches!(output.status.code(), Some(0) | Some(3))
}

fn classify_failure(output: &Output) -> DocumentError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = stderr
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("qpdf failed")
        .to_string();
    let lower = message.to_lowercase();
    if lower.contains("permission denied") {
        DocumentError::PermissionDenied(message)
    } else if output.status.code() == Some(2) {
        DocumentError::Unreadable(message)
    } else {
        DocumentError::Tool(message)
    }
}
