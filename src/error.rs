use std::io;

#[derive(thiserror::Error, Debug)]
pub enum LockerError {
    #[error("a batch is already running")]
    Busy,
    #[error("invalid job: {0}")]
    InvalidJob(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LockerError>;

impl From<walkdir::Error> for LockerError {
    fn from(err: walkdir::Error) -> Self {
        LockerError::InvalidInput(err.to_string())
    }
}
