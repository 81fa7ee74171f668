use std::path::{Path, PathBuf};

pub const OUTPUT_PREFIX: &str = "locked_";
pub const MIN_PASSWORD_LEN: usize = 4;
pub const SKIPPED_PREVIEW: usize = 5;

/// Settings shared by intake, job construction and the qpdf backend.
#[derive(Debug, Clone)]
pub struct LockerConfig {
    pub output_prefix: String,
    pub extensions: Vec<String>,
    pub min_password_len: usize,
    pub skipped_preview: usize,
    pub qpdf_program: PathBuf,
}

impl Default for LockerConfig {
    fn default() -> Self {
        Self {
            output_prefix: OUTPUT_PREFIX.to_string(),
            extensions: vec!["pdf".to_string()],
            min_password_len: MIN_PASSWORD_LEN,
            skipped_preview: SKIPPED_PREVIEW,
            qpdf_program: PathBuf::from("qpdf"),
        }
    }
}

impl LockerConfig {
    pub fn with_qpdf(mut self, program: Option<PathBuf>) -> Self {
        if let Some(program) = program {
            self.qpdf_program = program;
        }
        self
    }

    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        let cleaned: Vec<String> = extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        if !cleaned.is_empty() {
            self.extensions = cleaned;
        }
        self
    }

    /// How accepted files are named in messages: "PDF" by default, the
    /// extension list otherwise.
    pub fn document_label(&self) -> String {
        match self.extensions.as_slice() {
            [only] if only == "pdf" => "PDF".to_string(),
            exts => exts
                .iter()
                .map(|ext| format!(".{ext}"))
                .collect::<Vec<_>>()
                .join("/"),
        }
    }

    pub fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false)
    }
}
