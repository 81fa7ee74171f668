#![allow(dead_code)]

use pdf_locker::{Cipher, DocumentBackend, DocumentError, LockerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

pub const PDF_BODY: &[u8] = b"%PDF-1.7\n1 0 obj << /Type /Catalog >> endobj\n%%EOF\n";
pub const ENCRYPTED_BODY: &[u8] = b"%PDF-1.7\ntrailer << /Encrypt 5 0 R >>\n%%EOF\n";

/// In-memory stand-in for qpdf: `/Encrypt` marks a protected file and
/// anything without a `%PDF` header is unreadable. `PANIC` makes protect
/// panic; `BOMB` panics with a payload whose drop panics again.
#[derive(Default)]
pub struct FakeBackend {
    gate: Option<Mutex<Receiver<()>>>,
}

pub struct FakeDoc {
    bytes: Vec<u8>,
}

impl FakeBackend {
    /// Every `read` waits for one message on the returned sender.
    pub fn gated() -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                gate: Some(Mutex::new(rx)),
            },
            tx,
        )
    }
}

impl DocumentBackend for FakeBackend {
    type Document = FakeDoc;
    type Protected = Vec<u8>;

    fn read(&self, path: &Path) -> Result<FakeDoc, DocumentError> {
        if let Some(gate) = &self.gate {
            let _ = gate.lock().unwrap().recv();
        }
        let bytes = fs::read(path)?;
        if !bytes.starts_with(b"%PDF") {
            return Err(DocumentError::Unreadable("missing %PDF- header".into()));
        }
        Ok(FakeDoc { bytes })
    }

    fn is_protected(&self, document: &FakeDoc) -> bool {
        contains(&document.bytes, b"/Encrypt")
    }

    fn protect(
        &self,
        document: FakeDoc,
        password: &str,
        cipher: Cipher,
    ) -> Result<Vec<u8>, DocumentError> {
        if contains(&document.bytes, b"PANIC") {
            panic!("backend blew up");
        }
        if contains(&document.bytes, b"BOMB") {
            std::panic::panic_any(DropBomb);
        }
        let mut out = format!("LOCKED[{password}:{}]", cipher.key_bits()).into_bytes();
        out.extend_from_slice(&document.bytes);
        Ok(out)
    }

    fn write(&self, protected: Vec<u8>, path: &Path) -> Result<(), DocumentError> {
        fs::write(path, protected)?;
        Ok(())
    }
}

/// Panic payload that panics again when dropped.
pub struct DropBomb;

impl Drop for DropBomb {
    fn drop(&mut self) {
        panic!("panic payload dropped");
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

pub fn write_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, PDF_BODY).unwrap();
    path
}

pub fn write_file(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

pub fn config() -> LockerConfig {
    LockerConfig::default()
}
