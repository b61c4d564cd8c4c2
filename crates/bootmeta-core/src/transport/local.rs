//! Directory-rooted transport for mounted console filesystems.

use std::fs;
use std::io;
use std::path::PathBuf;

use super::{Transport, TransportError, TransportResult};

/// Serves remote paths out of a local directory tree.
///
/// Useful against an sd-card dump or a network mount of the console's
/// filesystem; the remote path convention maps 1:1 onto directories
/// under `root`.
pub struct LocalTransport {
    root: PathBuf,
}

impl LocalTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

fn map_io(path: &str, err: io::Error) -> TransportError {
    if err.kind() == io::ErrorKind::NotFound {
        TransportError::NotFound(path.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

impl Transport for LocalTransport {
    fn list(&self, path: &str) -> TransportResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.resolve(path)).map_err(|e| map_io(path, e))? {
            let entry = entry.map_err(|e| map_io(path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn download(&self, path: &str) -> TransportResult<Vec<u8>> {
        fs::read(self.resolve(path)).map_err(|e| map_io(path, e))
    }

    fn upload(&self, path: &str, data: &[u8]) -> TransportResult<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| TransportError::Other(e.to_string()))?;
        }
        fs::write(full, data).map_err(|e| TransportError::Other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_roundtrip_and_list() {
        let dir = tempdir().unwrap();
        let transport = LocalTransport::new(dir.path());

        transport.upload("/a/b/one.bin", b"data").unwrap();
        transport.upload("/a/b/two.bin", b"more").unwrap();

        assert_eq!(transport.download("/a/b/one.bin").unwrap(), b"data");
        assert_eq!(transport.list("/a/b").unwrap(), vec!["one.bin", "two.bin"]);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let transport = LocalTransport::new(dir.path());
        assert!(matches!(
            transport.download("/nope"),
            Err(TransportError::NotFound(_))
        ));
        assert!(matches!(
            transport.list("/nope"),
            Err(TransportError::NotFound(_))
        ));
    }
}
