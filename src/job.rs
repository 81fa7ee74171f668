use crate::config::LockerConfig;
use crate::error::{LockerError, Result};
use crate::utils;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// One batch worth of work. Immutable once built.
pub struct ProtectionJob {
    password: Zeroizing<String>,
    output_directory: Option<PathBuf>,
    files: Vec<PathBuf>,
    output_prefix: String,
}

impl ProtectionJob {
    pub fn new(
        password: String,
        output_directory: Option<PathBuf>,
        files: Vec<PathBuf>,
        config: &LockerConfig,
    ) -> Result<Self> {
        let password = Zeroizing::new(password);
        if password.chars().count() < config.min_password_len {
            return Err(LockerError::InvalidJob(format!(
                "password must be at least {} characters",
                config.min_password_len
            )));
        }
        if files.is_empty() {
            return Err(LockerError::InvalidJob("no files selected".into()));
        }
        if let Some(dir) = output_directory.as_ref() {
            if dir.exists() && !dir.is_dir() {
                return Err(LockerError::InvalidJob(format!(
                    "output is not a directory: {}",
                    dir.display()
                )));
            }
        }

        let job = Self {
            password,
            output_directory,
            files,
            output_prefix: config.output_prefix.clone(),
        };
        for (target, sources) in job.output_collisions() {
            tracing::warn!(
                output = %target.display(),
                sources = sources.len(),
                "several inputs share an output path; later files overwrite earlier ones"
            );
        }
        Ok(job)
    }

    /// Builds a job from a password and its confirmation entry.
    pub fn confirmed(
        password: String,
        confirmation: &str,
        output_directory: Option<PathBuf>,
        files: Vec<PathBuf>,
        config: &LockerConfig,
    ) -> Result<Self> {
        if password != confirmation {
            drop(Zeroizing::new(password));
            return Err(LockerError::InvalidJob("passwords do not match".into()));
        }
        Self::new(password, output_directory, files, config)
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    pub fn output_directory(&self) -> Option<&Path> {
        self.output_directory.as_deref()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn output_path(&self, source: &Path) -> PathBuf {
        output_path_with_prefix(source, self.output_directory(), &self.output_prefix)
    }

    /// Output paths claimed by more than one source, with the sources in job order.
    pub fn output_collisions(&self) -> Vec<(PathBuf, Vec<PathBuf>)> {
        let mut by_key: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(PathBuf, Vec<PathBuf>)> = Vec::new();
        for source in &self.files {
            let target = self.output_path(source);
            let key = utils::path_key(&target);
            match by_key.get(&key) {
                Some(&idx) => groups[idx].1.push(source.clone()),
                None => {
                    by_key.insert(key, groups.len());
                    groups.push((target, vec![source.clone()]));
                }
            }
        }
        groups.retain(|(_, sources)| sources.len() > 1);
        groups
    }
}

impl fmt::Debug for ProtectionJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectionJob")
            .field("password", &"<redacted>")
            .field("output_directory", &self.output_directory)
            .field("files", &self.files)
            .finish()
    }
}

/// `locked_<name>` next to the source, or inside `output_directory` when given.
pub fn output_path(source: &Path, output_directory: Option<&Path>) -> PathBuf {
    output_path_with_prefix(source, output_directory, crate::config::OUTPUT_PREFIX)
}

fn output_path_with_prefix(
    source: &Path,
    output_directory: Option<&Path>,
    prefix: &str,
) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document.pdf".to_string());
    let dir = match output_directory {
        Some(dir) => dir.to_path_buf(),
        None => source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    dir.join(format!("{prefix}{name}"))
}
