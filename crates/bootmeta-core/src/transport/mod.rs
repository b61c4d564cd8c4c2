//! Remote file transport abstraction.
//!
//! The sync engine needs exactly three primitives against the console's
//! filesystem: list a directory, download a file, upload a file. The
//! concrete session layer (FTP or otherwise) lives behind this trait;
//! "not found" must stay distinguishable from every other failure
//! because the engine treats the two very differently.

mod local;
mod memory;

pub use local::LocalTransport;
pub use memory::MemoryTransport;

use thiserror::Error;

/// Errors produced by a transport
#[derive(Error, Debug)]
pub enum TransportError {
    /// The remote path does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other session, protocol or I/O failure
    #[error("{0}")]
    Other(String),
}

/// Result type alias for transport operations
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Blocking file transfer session against the console.
pub trait Transport: Send + Sync {
    /// List the entry names directly under `path`.
    fn list(&self, path: &str) -> TransportResult<Vec<String>>;

    /// Download the file at `path` in full.
    fn download(&self, path: &str) -> TransportResult<Vec<u8>>;

    /// Upload `data` to `path`, replacing any existing file.
    fn upload(&self, path: &str, data: &[u8]) -> TransportResult<()>;
}
