mod common;

use common::{config, write_file, write_pdf, FakeBackend, ENCRYPTED_BODY};
use pdf_locker::cli::LockArgs;
use pdf_locker::job::output_path;
use pdf_locker::lock::lock_with;
use pdf_locker::{
    BatchObserver, BatchProcessor, ErrorKind, LockerError, ProtectionJob, ResultReport,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct Recorder {
    started: Vec<(usize, usize, String)>,
    progress: Vec<(f64, String)>,
    completions: Vec<ResultReport>,
}

impl BatchObserver for Recorder {
    fn on_file_started(&mut self, index: usize, total: usize, file_name: &str) {
        self.started.push((index, total, file_name.to_string()));
    }

    fn on_progress(&mut self, fraction: f64, file_name: &str) {
        self.progress.push((fraction, file_name.to_string()));
    }

    fn on_complete(&mut self, report: &ResultReport) {
        self.completions.push(report.clone());
    }
}

fn job(files: Vec<PathBuf>, output: Option<PathBuf>) -> ProtectionJob {
    ProtectionJob::new("s3cret".to_string(), output, files, &config()).unwrap()
}

#[test]
fn all_readable_files_succeed_with_monotonic_progress() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let files: Vec<PathBuf> = ["a.pdf", "b.pdf", "c.pdf", "d.pdf"]
        .iter()
        .map(|n| write_pdf(root, n))
        .collect();

    let processor = BatchProcessor::new(FakeBackend::default());
    let run = processor.run(job(files.clone(), None)).unwrap();
    let mut recorder = Recorder::default();
    let report = run.wait(&mut recorder);

    assert_eq!(report.success_count, 4);
    assert!(report.failures.is_empty());
    assert!(!report.cancelled);
    assert_eq!(recorder.completions.len(), 1);
    assert_eq!(recorder.completions[0], report);

    assert_eq!(recorder.progress.len(), 4);
    let fractions: Vec<f64> = recorder.progress.iter().map(|(f, _)| *f).collect();
    assert!(fractions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(*fractions.last().unwrap(), 1.0);

    let started: Vec<&str> = recorder.started.iter().map(|(_, _, n)| n.as_str()).collect();
    assert_eq!(started, vec!["a.pdf", "b.pdf", "c.pdf", "d.pdf"]);
    assert!(recorder.started.iter().all(|(_, total, _)| *total == 4));

    for source in &files {
        let out = output_path(source, None);
        let body = fs::read(&out).unwrap();
        assert!(body.starts_with(b"LOCKED[s3cret:256]%PDF"));
    }
    assert_eq!(report.outputs.len(), 4);
    assert!(!processor.is_running());
}

#[test]
fn already_protected_file_is_reported_and_run_continues() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let a = write_pdf(root, "a.pdf");
    let locked = write_file(root, "locked.pdf", ENCRYPTED_BODY);
    let c = write_pdf(root, "c.pdf");

    let processor = BatchProcessor::new(FakeBackend::default());
    let report = processor
        .run(job(vec![a, locked.clone(), c.clone()], None))
        .unwrap()
        .wait(&mut Recorder::default());

    assert_eq!(report.success_count, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, locked);
    assert_eq!(report.failures[0].kind, ErrorKind::AlreadyProtected);
    assert!(output_path(&c, None).exists());
    assert!(!output_path(&locked, None).exists());
}

#[test]
fn per_file_errors_are_classified() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let corrupt = write_file(root, "corrupt.pdf", b"not a pdf at all");
    let stale = write_pdf(root, "stale.pdf");
    let boom = write_file(root, "boom.pdf", b"%PDF-1.4 PANIC");
    let fine = write_pdf(root, "fine.pdf");
    fs::remove_file(&stale).unwrap();

    let processor = BatchProcessor::new(FakeBackend::default());
    let report = processor
        .run(job(vec![corrupt.clone(), stale.clone(), boom.clone(), fine], None))
        .unwrap()
        .wait(&mut Recorder::default());

    assert_eq!(report.success_count, 1);
    let kinds: Vec<(PathBuf, ErrorKind)> = report
        .failures
        .iter()
        .map(|f| (f.path.clone(), f.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (corrupt, ErrorKind::ReadError),
            (stale, ErrorKind::Unknown),
            (boom, ErrorKind::Unknown),
        ]
    );
    assert!(report.failures.iter().all(|f| !f.message.is_empty()));
}

#[test]
fn every_file_failing_is_still_a_completion() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let a = write_file(root, "a.pdf", ENCRYPTED_BODY);
    let b = write_file(root, "b.pdf", b"garbage");

    let mut recorder = Recorder::default();
    let report = BatchProcessor::new(FakeBackend::default())
        .run(job(vec![a, b], None))
        .unwrap()
        .wait(&mut recorder);

    assert_eq!(report.success_count, 0);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(recorder.completions.len(), 1);
    assert!(report.headline().starts_with("All 2 file(s) failed"));
}

#[test]
fn second_run_while_busy_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let a = write_pdf(root, "a.pdf");
    let b = write_pdf(root, "b.pdf");

    let (backend, gate) = FakeBackend::gated();
    let processor = BatchProcessor::new(backend);
    let first = processor.run(job(vec![a.clone()], None)).unwrap();
    assert!(processor.is_running());

    let err = processor.run(job(vec![b.clone()], None)).unwrap_err();
    assert!(matches!(err, LockerError::Busy));
    assert!(!output_path(&b, None).exists());

    gate.send(()).unwrap();
    let report = first.wait(&mut Recorder::default());
    assert_eq!(report.success_count, 1);
    assert!(!processor.is_running());

    gate.send(()).unwrap();
    let report = processor
        .run(job(vec![b.clone()], None))
        .unwrap()
        .wait(&mut Recorder::default());
    assert_eq!(report.success_count, 1);
    assert!(output_path(&b, None).exists());
}

#[test]
fn worker_dying_outside_a_file_still_releases_busy() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let doomed = write_file(root, "doomed.pdf", b"%PDF-1.7\nBOMB\n");
    let fine = write_pdf(root, "fine.pdf");

    let processor = BatchProcessor::new(FakeBackend::default());
    let mut recorder = Recorder::default();
    let report = processor
        .run(job(vec![doomed, fine.clone()], None))
        .unwrap()
        .wait(&mut recorder);
    assert_eq!(recorder.completions.len(), 1);
    assert_eq!(report.attempted(), 0);
    assert!(!processor.is_running());

    let report = processor
        .run(job(vec![fine.clone()], None))
        .unwrap()
        .wait(&mut Recorder::default());
    assert_eq!(report.success_count, 1);
    assert!(output_path(&fine, None).exists());
}

#[test]
fn cancelled_run_reports_only_attempted_files() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let files: Vec<PathBuf> = ["a.pdf", "b.pdf", "c.pdf"]
        .iter()
        .map(|n| write_pdf(root, n))
        .collect();

    let (backend, gate) = FakeBackend::gated();
    let processor = BatchProcessor::new(backend);
    let mut run = processor.run(job(files.clone(), None)).unwrap();

    let mut recorder = Recorder::default();
    while recorder.started.is_empty() {
        run.poll(&mut recorder);
        thread::sleep(Duration::from_millis(5));
    }
    run.cancel();
    gate.send(()).unwrap();

    while !run.poll(&mut recorder) {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(run.is_finished());
    assert_eq!(recorder.completions.len(), 1);
    let report = &recorder.completions[0];
    assert!(report.cancelled);
    assert_eq!(report.attempted(), 1);
    assert_eq!(report.success_count, 1);
    assert!(output_path(&files[0], None).exists());
    assert!(!output_path(&files[1], None).exists());
    assert!(!processor.is_running());
}

#[test]
fn output_directory_override_is_used() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let out = root.join("out");
    fs::create_dir_all(&out).unwrap();
    let a = write_pdf(root, "report.pdf");

    let report = BatchProcessor::new(FakeBackend::default())
        .run(job(vec![a], Some(out.clone())))
        .unwrap()
        .wait(&mut Recorder::default());

    assert_eq!(report.outputs, vec![out.join("locked_report.pdf")]);
    assert!(out.join("locked_report.pdf").exists());
    assert!(!root.join("locked_report.pdf").exists());
}

#[test]
fn output_path_naming() {
    assert_eq!(
        output_path(Path::new("/a/report.pdf"), None),
        PathBuf::from("/a/locked_report.pdf")
    );
    assert_eq!(
        output_path(Path::new("/a/report.pdf"), Some(Path::new("/tmp/out"))),
        PathBuf::from("/tmp/out/locked_report.pdf")
    );
}

#[test]
fn collisions_under_an_override_are_listed() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("left")).unwrap();
    fs::create_dir_all(root.join("right")).unwrap();
    let left = write_pdf(&root.join("left"), "same.pdf");
    let right = write_pdf(&root.join("right"), "same.pdf");

    let job = job(vec![left.clone(), right.clone()], Some(root.join("out")));
    let collisions = job.output_collisions();
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].0, root.join("out").join("locked_same.pdf"));
    assert_eq!(collisions[0].1, vec![left, right]);
}

#[test]
fn invalid_jobs_are_rejected_up_front() {
    let tmp = tempfile::tempdir().unwrap();
    let a = write_pdf(tmp.path(), "a.pdf");

    let err = ProtectionJob::new("abc".into(), None, vec![a.clone()], &config()).unwrap_err();
    assert!(matches!(err, LockerError::InvalidJob(_)));
    assert!(!output_path(&a, None).exists());

    let err = ProtectionJob::new("long enough".into(), None, Vec::new(), &config()).unwrap_err();
    assert!(matches!(err, LockerError::InvalidJob(_)));

    let err = ProtectionJob::confirmed("abcd".into(), "abce", None, vec![a.clone()], &config())
        .unwrap_err();
    assert!(matches!(err, LockerError::InvalidJob(msg) if msg.contains("do not match")));

    let not_dir = write_pdf(tmp.path(), "b.pdf");
    let err = ProtectionJob::new("abcd".into(), Some(not_dir), vec![a.clone()], &config())
        .unwrap_err();
    assert!(matches!(err, LockerError::InvalidJob(_)));

    let ok = ProtectionJob::confirmed("åäöü".into(), "åäöü", None, vec![a], &config()).unwrap();
    assert_eq!(ok.len(), 1);
}

#[test]
fn report_rendering() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let good = write_pdf(root, "good.pdf");
    let bad = write_file(root, "bad.pdf", ENCRYPTED_BODY);

    let clean = BatchProcessor::new(FakeBackend::default())
        .run(job(vec![good.clone()], None))
        .unwrap()
        .wait(&mut Recorder::default());
    assert_eq!(clean.render(), "Protected 1 file(s).");

    let mixed = BatchProcessor::new(FakeBackend::default())
        .run(job(vec![good, bad.clone()], None))
        .unwrap()
        .wait(&mut Recorder::default());
    let text = mixed.render();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Protected 1 file(s); 1 failed.");
    assert_eq!(
        lines[1],
        format!("{} \u{2014} already password protected", bad.display())
    );
}

#[test]
fn lock_flow_with_fake_backend() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let a = write_pdf(root, "a.pdf");
    let txt = write_file(root, "a.txt", b"text");

    let report = lock_with(
        LockArgs {
            inputs: vec![a.clone(), txt, a.clone()],
            output_dir: None,
            password: Some("hunter22".into()),
            recursive: false,
            json: true,
        },
        &config(),
        FakeBackend::default(),
    )
    .unwrap();
    assert_eq!(report.success_count, 1);
    assert!(report.is_clean());
    assert!(output_path(&a, None).exists());

    let err = lock_with(
        LockArgs {
            inputs: vec![root.join("missing.pdf")],
            output_dir: None,
            password: Some("hunter22".into()),
            recursive: false,
            json: true,
        },
        &config(),
        FakeBackend::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LockerError::InvalidInput(_)));

    let err = lock_with(
        LockArgs {
            inputs: vec![a],
            output_dir: None,
            password: Some("hunter22".into()),
            recursive: false,
            json: true,
        },
        &config().with_extensions(&["ai".to_string()]),
        FakeBackend::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LockerError::InvalidInput(msg) if msg == "no .ai files to protect"));
}
