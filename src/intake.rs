use crate::config::LockerConfig;
use crate::error::Result;
use crate::utils;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

static BRACED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Missing,
    UnsupportedExtension,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Result of parsing one drop payload or selection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DropScan {
    pub accepted: Vec<PathBuf>,
    pub skipped: Vec<Skipped>,
}

impl DropScan {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty() && self.skipped.is_empty()
    }

    pub fn skipped_with(&self, reason: SkipReason) -> impl Iterator<Item = &Skipped> {
        self.skipped.iter().filter(move |s| s.reason == reason)
    }

    /// Names of the first `limit` skipped items, then a tally of the rest.
    pub fn skipped_preview(&self, limit: usize) -> Option<String> {
        if self.skipped.is_empty() {
            return None;
        }
        let mut lines: Vec<String> = self
            .skipped
            .iter()
            .take(limit)
            .map(|s| utils::display_name(&s.path))
            .collect();
        if self.skipped.len() > limit {
            lines.push(format!("...and {} more", self.skipped.len() - limit));
        }
        Some(lines.join("\n"))
    }
}

/// Splits a raw drop payload into candidate tokens.
///
/// Brace groups win over newlines, newlines win over spaces. A payload
/// without either is split on whitespace only when the whole string is not
/// itself an existing path.
pub fn split_payload(raw: &str) -> Vec<String> {
    let tokens: Vec<String> = if raw.contains('{') {
        BRACED
            .captures_iter(raw)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .collect()
    } else if raw.contains('\n') {
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        let trimmed = raw.trim();
        if trimmed.contains(' ') && !Path::new(trimmed).exists() {
            trimmed.split_whitespace().map(str::to_string).collect()
        } else {
            vec![trimmed.to_string()]
        }
    };

    tokens
        .iter()
        .map(|token| clean_token(token))
        .filter(|token| !token.is_empty())
        .collect()
}

fn clean_token(token: &str) -> String {
    let trimmed = token.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

#[derive(Debug, Clone, Default)]
pub struct PathNormalizer {
    config: LockerConfig,
}

impl PathNormalizer {
    pub fn new(config: LockerConfig) -> Self {
        Self { config }
    }

    pub fn normalize(&self, raw: &str) -> DropScan {
        let candidates = split_payload(raw).into_iter().map(PathBuf::from);
        self.classify(candidates)
    }

    pub fn normalize_selection<I>(&self, paths: I) -> DropScan
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.classify(paths)
    }

    /// Like `normalize_selection`, but directories are walked for documents.
    pub fn expand_selection<I>(&self, paths: I) -> Result<DropScan>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut expanded = Vec::new();
        for path in paths {
            if !path.is_dir() {
                expanded.push(path);
                continue;
            }
            let mut found = Vec::new();
            for entry in WalkDir::new(&path).follow_links(false) {
                let entry = entry?;
                if entry.file_type().is_file() && self.config.is_document(entry.path()) {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            expanded.extend(found);
        }
        Ok(self.classify(expanded))
    }

    fn classify<I>(&self, candidates: I) -> DropScan
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut scan = DropScan::default();
        let mut seen = HashSet::new();
        for candidate in candidates {
            let path = match utils::absolutize(&candidate) {
                Ok(path) => path,
                Err(_) => candidate,
            };
            if !seen.insert(utils::path_key(&path)) {
                continue;
            }
            let reason = if !path.is_file() {
                Some(SkipReason::Missing)
            } else if !self.config.is_document(&path) {
                Some(SkipReason::UnsupportedExtension)
            } else {
                None
            };
            match reason {
                Some(reason) => {
                    tracing::debug!(path = %path.display(), ?reason, "skipping dropped item");
                    scan.skipped.push(Skipped { path, reason });
                }
                None => scan.accepted.push(path),
            }
        }
        scan
    }
}

/// Files waiting to be protected, in the order they arrived.
#[derive(Debug)]
pub struct IntakeList {
    paths: Vec<PathBuf>,
    keys: Vec<String>,
    seen: HashSet<String>,
    label: String,
}

impl Default for IntakeList {
    fn default() -> Self {
        Self::for_config(&LockerConfig::default())
    }
}

impl IntakeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty list whose status line names the configured file types.
    pub fn for_config(config: &LockerConfig) -> Self {
        Self {
            paths: Vec::new(),
            keys: Vec::new(),
            seen: HashSet::new(),
            label: config.document_label(),
        }
    }

    pub fn add(&mut self, path: PathBuf) -> bool {
        let key = utils::path_key(&path);
        if !self.seen.insert(key.clone()) {
            return false;
        }
        self.paths.push(path);
        self.keys.push(key);
        true
    }

    pub fn add_all<I>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = PathBuf>,
    {
        paths.into_iter().map(|p| self.add(p)).filter(|added| *added).count()
    }

    pub fn remove(&mut self, index: usize) -> Option<PathBuf> {
        if index >= self.paths.len() {
            return None;
        }
        let key = self.keys.remove(index);
        self.seen.remove(&key);
        Some(self.paths.remove(index))
    }

    pub fn clear(&mut self) {
        self.paths.clear();
        self.keys.clear();
        self.seen.clear();
    }

    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    pub fn status_line(&self) -> String {
        match self.paths.len() {
            0 => format!("Select {} files to protect", self.label),
            1 => "1 file selected".to_string(),
            n => format!("{n} files selected"),
        }
    }
}
