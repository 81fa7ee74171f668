use crate::report::ErrorKind;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cipher {
    /// AES-256, the only strong (non-legacy) option.
    #[default]
    Aes256,
}

impl Cipher {
    pub fn key_bits(self) -> u32 {
        match self {
            Cipher::Aes256 => 256,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("not a readable PDF: {0}")]
    Unreadable(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error(transparent)]
    Io(io::Error),
    #[error("{0}")]
    Tool(String),
}

impl From<io::Error> for DocumentError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied {
            DocumentError::PermissionDenied(err.to_string())
        } else {
            DocumentError::Io(err)
        }
    }
}

impl DocumentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocumentError::Unreadable(_) => ErrorKind::ReadError,
            DocumentError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            DocumentError::Io(_) | DocumentError::Tool(_) => ErrorKind::Unknown,
        }
    }
}

/// The protection capability. Implementations read a document, report
/// whether it already carries a password, encrypt it (pages, content and
/// whatever metadata exists) and write the result.
pub trait DocumentBackend: Send + Sync + 'static {
    type Document: Send;
    type Protected: Send;

    fn read(&self, path: &Path) -> Result<Self::Document, DocumentError>;

    fn is_protected(&self, document: &Self::Document) -> bool;

    fn protect(
        &self,
        document: Self::Document,
        password: &str,
        cipher: Cipher,
    ) -> Result<Self::Protected, DocumentError>;

    fn write(&self, protected: Self::Protected, path: &Path) -> Result<(), DocumentError>;
}
