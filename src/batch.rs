use crate::document::{Cipher, DocumentBackend, DocumentError};
use crate::error::{LockerError, Result};
use crate::job::ProtectionJob;
use crate::report::{ErrorKind, ProcessingOutcome, ResultReport};
use crate::utils;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Messages from the worker to the thread that owns the run.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    FileStarted {
        index: usize,
        total: usize,
        file_name: String,
    },
    Progress {
        fraction: f64,
        file_name: String,
    },
    Completed(ResultReport),
}

/// Callbacks invoked on the thread that drains a [`BatchRun`].
pub trait BatchObserver {
    fn on_file_started(&mut self, _index: usize, _total: usize, _file_name: &str) {}

    fn on_progress(&mut self, fraction: f64, file_name: &str);

    fn on_complete(&mut self, report: &ResultReport);
}

pub struct BatchProcessor<B: DocumentBackend> {
    backend: Arc<B>,
    running: Arc<AtomicBool>,
}

impl<B: DocumentBackend> Clone for BatchProcessor<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            running: self.running.clone(),
        }
    }
}

impl<B: DocumentBackend> BatchProcessor<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts `job` on a background thread. Fails with `Busy` while a
    /// previous run of this processor has not completed.
    pub fn run(&self, job: ProtectionJob) -> Result<BatchRun> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LockerError::Busy);
        }

        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            backend: self.backend.clone(),
            running: RunningGuard {
                flag: self.running.clone(),
                released: false,
            },
            cancel: cancel.clone(),
            events: tx,
        };
        tracing::info!(files = job.len(), "starting batch");
        let spawned = thread::Builder::new()
            .name("pdf-locker-batch".into())
            .spawn(move || worker.process(job));
        match spawned {
            Ok(handle) => Ok(BatchRun {
                events: rx,
                cancel,
                handle: Some(handle),
                finished: false,
            }),
            Err(err) => {
                self.running.store(false, Ordering::Release);
                Err(LockerError::Io(err))
            }
        }
    }
}

/// Handle for one in-flight run, owned by the interactive thread.
#[derive(Debug)]
pub struct BatchRun {
    events: Receiver<BatchEvent>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    finished: bool,
}

impl BatchRun {
    /// Stops the run before the next file. Files already attempted stay in
    /// the report.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Dispatches whatever events are queued without blocking. Returns true
    /// once the completion has been delivered.
    pub fn poll(&mut self, observer: &mut impl BatchObserver) -> bool {
        while !self.finished {
            match self.events.try_recv() {
                Ok(event) => self.dispatch(event, observer),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finish_abandoned(observer);
                }
            }
        }
        self.finished
    }

    /// Blocks until the run completes, dispatching events as they arrive.
    pub fn wait(mut self, observer: &mut impl BatchObserver) -> ResultReport {
        let mut report = None;
        while !self.finished {
            match self.events.recv() {
                Ok(BatchEvent::Completed(done)) => {
                    observer.on_complete(&done);
                    self.finished = true;
                    report = Some(done);
                }
                Ok(event) => self.dispatch(event, observer),
                Err(_) => {
                    let done = ResultReport::default();
                    observer.on_complete(&done);
                    self.finished = true;
                    report = Some(done);
                }
            }
        }
        self.join();
        report.unwrap_or_default()
    }

    fn dispatch(&mut self, event: BatchEvent, observer: &mut impl BatchObserver) {
        match event {
            BatchEvent::FileStarted {
                index,
                total,
                file_name,
            } => observer.on_file_started(index, total, &file_name),
            BatchEvent::Progress {
                fraction,
                file_name,
            } => observer.on_progress(fraction, &file_name),
            BatchEvent::Completed(report) => {
                observer.on_complete(&report);
                self.finished = true;
                self.join();
            }
        }
    }

    // The worker always sends a completion; a closed channel without one
    // means it died, and the observer still gets its single report.
    fn finish_abandoned(&mut self, observer: &mut impl BatchObserver) {
        tracing::error!("batch worker exited without a report");
        observer.on_complete(&ResultReport::default());
        self.finished = true;
        self.join();
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// Clears the busy flag exactly once, even when the worker unwinds. Declared
// ahead of `events` in `Worker` so the flag drops before the channel closes.
struct RunningGuard {
    flag: Arc<AtomicBool>,
    released: bool,
}

impl RunningGuard {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.flag.store(false, Ordering::Release);
        }
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.release();
    }
}

struct Worker<B: DocumentBackend> {
    backend: Arc<B>,
    running: RunningGuard,
    cancel: Arc<AtomicBool>,
    events: Sender<BatchEvent>,
}

impl<B: DocumentBackend> Worker<B> {
    fn process(mut self, job: ProtectionJob) {
        let total = job.len();
        let mut report = ResultReport::default();

        for (index, path) in job.files().iter().enumerate() {
            if self.cancel.load(Ordering::Acquire) {
                tracing::info!(done = index, total, "batch cancelled");
                report.cancelled = true;
                break;
            }
            let file_name = utils::display_name(path);
            self.send(BatchEvent::FileStarted {
                index,
                total,
                file_name: file_name.clone(),
            });

            let outcome = self.protect_one(&job, path);
            match &outcome {
                ProcessingOutcome::Success { output, .. } => {
                    tracing::debug!(source = %path.display(), output = %output.display(), "protected");
                }
                ProcessingOutcome::Failure(failure) => {
                    tracing::warn!(
                        path = %path.display(),
                        kind = %failure.kind,
                        "{}",
                        failure.message
                    );
                }
            }
            report.record(outcome);

            self.send(BatchEvent::Progress {
                fraction: (index + 1) as f64 / total as f64,
                file_name,
            });
        }

        tracing::info!(
            succeeded = report.success_count,
            failed = report.failures.len(),
            "batch finished"
        );
        self.running.release();
        self.send(BatchEvent::Completed(report));
    }

    fn protect_one(&self, job: &ProtectionJob, path: &Path) -> ProcessingOutcome {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.try_protect(job, path)));
        match attempt {
            Ok(Ok(Some(output))) => ProcessingOutcome::Success {
                source: path.to_path_buf(),
                output,
            },
            Ok(Ok(None)) => ProcessingOutcome::failure(
                path,
                ErrorKind::AlreadyProtected,
                "already password protected",
            ),
            Ok(Err(err)) => ProcessingOutcome::failure(path, err.kind(), err.to_string()),
            Err(_) => ProcessingOutcome::failure(
                path,
                ErrorKind::Unknown,
                "internal error while protecting file",
            ),
        }
    }

    fn try_protect(
        &self,
        job: &ProtectionJob,
        path: &Path,
    ) -> std::result::Result<Option<PathBuf>, DocumentError> {
        let document = self.backend.read(path)?;
        if self.backend.is_protected(&document) {
            return Ok(None);
        }
        let protected = self
            .backend
            .protect(document, job.password(), Cipher::Aes256)?;
        let output = job.output_path(path);
        self.backend.write(protected, &output)?;
        Ok(Some(output))
    }

    // The receiver may already be gone if the owner dropped its handle;
    // the run still finishes so the busy flag is released.
    fn send(&self, event: BatchEvent) {
        let _ = self.events.send(event);
    }
}
