pub mod batch;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod intake;
pub mod job;
pub mod lock;
pub mod prompt;
pub mod qpdf;
pub mod report;
pub mod utils;
pub mod wizard;

pub use batch::{BatchEvent, BatchObserver, BatchProcessor, BatchRun};
pub use config::LockerConfig;
pub use document::{Cipher, DocumentBackend, DocumentError};
pub use error::{LockerError, Result};
pub use intake::{DropScan, IntakeList, PathNormalizer, SkipReason, Skipped};
pub use job::ProtectionJob;
pub use report::{ErrorKind, Failure, ProcessingOutcome, ResultReport};
