use crate::batch::BatchProcessor;
use crate::cli::WizardArgs;
use crate::config::LockerConfig;
use crate::document::DocumentBackend;
use crate::error::{LockerError, Result};
use crate::intake::{IntakeList, PathNormalizer};
use crate::job::ProtectionJob;
use crate::lock::{self, ProgressObserver};
use crate::prompt;
use crate::qpdf::QpdfBackend;
use crate::report::ResultReport;
use std::path::PathBuf;

pub fn run(args: WizardArgs, config: &LockerConfig) -> Result<ResultReport> {
    let backend = QpdfBackend::new(config.qpdf_program.clone());
    backend
        .check_available()
        .map_err(|e| LockerError::InvalidInput(e.to_string()))?;
    run_with(args, config, backend)
}

pub fn run_with<B: DocumentBackend>(
    args: WizardArgs,
    config: &LockerConfig,
    backend: B,
) -> Result<ResultReport> {
    let normalizer = PathNormalizer::new(config.clone());
    let processor = BatchProcessor::new(backend);
    let mut intake = IntakeList::for_config(config);

    println!(
        "Drag {} files into this window (or paste their paths) and press Enter.",
        config.document_label()
    );
    println!("Commands: list, remove <n>, clear, quit. Empty line or 'done' to continue.");
    loop {
        let line = match prompt::read_line("> ")? {
            Some(line) => line,
            None if intake.is_empty() => return Err(LockerError::Cancelled),
            None => break,
        };
        let command = line.trim();
        match command {
            "" | "done" => {
                if intake.is_empty() {
                    println!("{}", intake.status_line());
                    continue;
                }
                break;
            }
            "quit" | "exit" => return Err(LockerError::Cancelled),
            "clear" => {
                intake.clear();
                println!("{}", intake.status_line());
            }
            "list" => {
                for (idx, path) in intake.iter().enumerate() {
                    println!("{:>3}. {}", idx + 1, path.display());
                }
                println!("{}", intake.status_line());
            }
            _ if command.starts_with("remove ") => {
                let removed = command["remove ".len()..]
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|idx| intake.remove(idx));
                match removed {
                    Some(path) => println!("Removed {}", path.display()),
                    None => println!("No such entry."),
                }
            }
            _ => {
                let scan = normalizer.normalize(&terminal_payload(&line));
                let added = intake.add_all(scan.accepted.iter().cloned());
                lock::warn_skipped(&scan, config);
                println!("Added {added}. {}", intake.status_line());
            }
        }
    }

    let password = prompt::read_confirmed_password(config.min_password_len)?;
    let output_dir = ask_output_dir(args.output_dir)?;
    let job = ProtectionJob::new(password, output_dir, intake.snapshot(), config)?;

    let run = processor.run(job)?;
    let mut observer = ProgressObserver::new(intake.len(), true);
    let report = run.wait(&mut observer);
    intake.clear();

    println!("{}", report.render());
    Ok(report)
}

fn ask_output_dir(default: Option<PathBuf>) -> Result<Option<PathBuf>> {
    let hint = default
        .as_ref()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| "next to each source".into());
    let answer = prompt::read_line(&format!("Output folder [{hint}]: "))?;
    let answer = answer
        .map(|a| terminal_payload(&a))
        .unwrap_or_default();
    let answer = answer.trim().trim_matches(['{', '}']);
    if answer.is_empty() {
        return Ok(default);
    }
    Ok(Some(PathBuf::from(answer)))
}

/// Rewrites a line pasted by a terminal drop (shell-quoted, possibly with
/// backslash escapes) as a brace payload. Lines without quoting pass
/// through untouched.
pub fn terminal_payload(line: &str) -> String {
    let line = line.trim();
    let escapes = !cfg!(windows);
    let quoted = line.contains(['\'', '"']) || (escapes && line.contains('\\'));
    if line.contains('{') || !quoted {
        return line.to_string();
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if escapes && c == '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_token = true;
                }
                '\\' if escapes => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                        in_token = true;
                    }
                }
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }
    if in_token {
        tokens.push(current);
    }

    if tokens.iter().any(|t| t.contains('}')) {
        tokens.join("\n")
    } else {
        tokens
            .iter()
            .map(|t| format!("{{{t}}}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
