use crate::batch::{BatchObserver, BatchProcessor};
use crate::cli::{LockArgs, ScanArgs};
use crate::config::LockerConfig;
use crate::document::DocumentBackend;
use crate::error::{LockerError, Result};
use crate::intake::{DropScan, IntakeList, PathNormalizer, SkipReason};
use crate::job::ProtectionJob;
use crate::prompt;
use crate::qpdf::QpdfBackend;
use crate::report::ResultReport;
use crate::utils;
use indicatif::ProgressBar;
use std::io::{self, Read};

/// Drives an indicatif bar from batch events.
pub struct ProgressObserver {
    pb: ProgressBar,
    total: u64,
}

impl ProgressObserver {
    pub fn new(total: usize, visible: bool) -> Self {
        let pb = if visible {
            utils::progress_bar(total as u64, "locking")
        } else {
            ProgressBar::hidden()
        };
        Self {
            pb,
            total: total as u64,
        }
    }
}

impl BatchObserver for ProgressObserver {
    fn on_file_started(&mut self, _index: usize, _total: usize, file_name: &str) {
        self.pb.set_message(format!("processing: {file_name}"));
    }

    fn on_progress(&mut self, fraction: f64, _file_name: &str) {
        let pos = (fraction * self.total as f64).round() as u64;
        self.pb.set_position(pos.min(self.total));
    }

    fn on_complete(&mut self, _report: &ResultReport) {
        self.pb.finish_and_clear();
    }
}

pub fn lock(args: LockArgs, config: &LockerConfig) -> Result<ResultReport> {
    let backend = QpdfBackend::new(config.qpdf_program.clone());
    let version = backend
        .check_available()
        .map_err(|e| LockerError::InvalidInput(e.to_string()))?;
    tracing::debug!(%version, "using qpdf");
    lock_with(args, config, backend)
}

/// Runs the `lock` flow against any backend.
pub fn lock_with<B: DocumentBackend>(
    args: LockArgs,
    config: &LockerConfig,
    backend: B,
) -> Result<ResultReport> {
    let normalizer = PathNormalizer::new(config.clone());
    let scan = if args.recursive {
        normalizer.expand_selection(args.inputs)?
    } else {
        normalizer.normalize_selection(args.inputs)
    };
    warn_skipped(&scan, config);

    let mut intake = IntakeList::for_config(config);
    intake.add_all(scan.accepted);
    if intake.is_empty() {
        return Err(LockerError::InvalidInput(format!(
            "no {} files to protect",
            config.document_label()
        )));
    }
    if !args.json {
        println!("{}", intake.status_line());
    }

    let password = match args.password {
        Some(password) => password,
        None => prompt::read_confirmed_password(config.min_password_len)?,
    };
    let job = ProtectionJob::new(password, args.output_dir, intake.snapshot(), config)?;

    let processor = BatchProcessor::new(backend);
    let run = processor.run(job)?;
    let mut observer = ProgressObserver::new(intake.len(), !args.json);
    let report = run.wait(&mut observer);
    intake.clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.render());
        if report.success_count > 0 {
            println!(
                "Protected copies are saved with the \"{}\" prefix.",
                config.output_prefix
            );
        }
    }
    Ok(report)
}

pub fn scan(args: ScanArgs, config: &LockerConfig) -> Result<DropScan> {
    let payload = match args.payload {
        Some(payload) => payload,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let scan = PathNormalizer::new(config.clone()).normalize(&payload);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&scan)?);
        return Ok(scan);
    }
    for path in &scan.accepted {
        println!("accepted  {}", path.display());
    }
    for skipped in &scan.skipped {
        let label = match skipped.reason {
            SkipReason::Missing => "missing ",
            SkipReason::UnsupportedExtension => "skipped ",
        };
        println!("{label}  {}", skipped.path.display());
    }
    println!(
        "{} accepted, {} skipped",
        scan.accepted.len(),
        scan.skipped.len()
    );
    Ok(scan)
}

pub fn warn_skipped(scan: &DropScan, config: &LockerConfig) {
    if let Some(preview) = scan.skipped_preview(config.skipped_preview) {
        let missing = scan.skipped_with(SkipReason::Missing).count();
        let foreign = scan.skipped_with(SkipReason::UnsupportedExtension).count();
        eprintln!(
            "Skipped {} item(s) ({missing} missing, {foreign} not {}):\n{preview}",
            scan.skipped.len(),
            config.document_label()
        );
    }
}
