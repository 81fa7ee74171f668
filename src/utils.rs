use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub fn print_banner() {
    const GOLD: &str = "\x1b[38;5;179m";
    const DIM: &str = "\x1b[38;5;245m";
    const RESET: &str = "\x1b[0m";
    println!(
        "{DIM}------------------------------------------------{RESET}\n\
{GOLD}  pdf-locker :: password protection for PDF batches{RESET}\n\
{DIM}------------------------------------------------{RESET}"
    );
}

pub fn progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template("[{bar:40.yellow/black}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Comparison key for a path: canonical when possible, forward slashes,
/// case-folded on Windows.
pub fn path_key(path: &Path) -> String {
    let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let key = canonical.to_string_lossy().replace('\\', "/");
    #[cfg(target_os = "windows")]
    {
        key.to_lowercase()
    }
    #[cfg(not(target_os = "windows"))]
    {
        key
    }
}

pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
