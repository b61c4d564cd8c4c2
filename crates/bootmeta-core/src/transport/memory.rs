//! In-memory transport for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{Transport, TransportError, TransportResult};

/// Transport backed by a path→bytes map.
///
/// Counts downloads per path so tests can assert that caching really
/// avoided repeat transfers, and can be told to fail one upload path to
/// exercise abort behavior.
#[derive(Default)]
pub struct MemoryTransport {
    files: Mutex<HashMap<String, Vec<u8>>>,
    downloads: Mutex<HashMap<String, usize>>,
    fail_upload: Mutex<Option<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transport pre-populated with files.
    pub fn with_files<I, P, D>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, D)>,
        P: Into<String>,
        D: Into<Vec<u8>>,
    {
        let transport = Self::default();
        for (path, data) in files {
            transport.insert(path, data);
        }
        transport
    }

    pub fn insert(&self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .unwrap()
            .insert(normalize(&path.into()), data.into());
    }

    pub fn remove(&self, path: &str) {
        self.files.lock().unwrap().remove(&normalize(path));
    }

    /// Current contents of one file, if present.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(&normalize(path)).cloned()
    }

    /// Every stored path, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// How many times `path` has been downloaded.
    pub fn download_count(&self, path: &str) -> usize {
        self.downloads
            .lock()
            .unwrap()
            .get(&normalize(path))
            .copied()
            .unwrap_or(0)
    }

    /// Make every upload to `path` fail with a non-"not found" error.
    pub fn fail_upload_to(&self, path: &str) {
        *self.fail_upload.lock().unwrap() = Some(normalize(path));
    }
}

fn normalize(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

impl Transport for MemoryTransport {
    fn list(&self, path: &str) -> TransportResult<Vec<String>> {
        let prefix = format!("{}/", normalize(path).trim_end_matches('/'));
        let files = self.files.lock().unwrap();
        let mut names: Vec<String> = files
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .map(|rest| rest.split('/').next().unwrap_or(rest).to_string())
            .collect();
        names.sort();
        names.dedup();
        if names.is_empty() {
            return Err(TransportError::NotFound(path.to_string()));
        }
        Ok(names)
    }

    fn download(&self, path: &str) -> TransportResult<Vec<u8>> {
        let path = normalize(path);
        *self.downloads.lock().unwrap().entry(path.clone()).or_insert(0) += 1;
        self.files
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .ok_or(TransportError::NotFound(path))
    }

    fn upload(&self, path: &str, data: &[u8]) -> TransportResult<()> {
        let path = normalize(path);
        if self.fail_upload.lock().unwrap().as_deref() == Some(path.as_str()) {
            return Err(TransportError::Other(format!("upload refused: {path}")));
        }
        self.files.lock().unwrap().insert(path, data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_direct_children() {
        let transport = MemoryTransport::with_files([
            ("/root/a/x.bin", b"1".as_slice()),
            ("/root/a/y.bin", b"2".as_slice()),
            ("/root/b/z.bin", b"3".as_slice()),
        ]);
        assert_eq!(transport.list("/root").unwrap(), vec!["a", "b"]);
        assert_eq!(transport.list("/root/a").unwrap(), vec!["x.bin", "y.bin"]);
        assert!(matches!(
            transport.list("/other"),
            Err(TransportError::NotFound(_))
        ));
    }

    #[test]
    fn test_download_counting() {
        let transport = MemoryTransport::with_files([("/f", b"x".as_slice())]);
        transport.download("/f").unwrap();
        transport.download("/f").unwrap();
        assert_eq!(transport.download_count("/f"), 2);
    }

    #[test]
    fn test_injected_upload_failure() {
        let transport = MemoryTransport::new();
        transport.fail_upload_to("/locked");
        assert!(matches!(
            transport.upload("/locked", b"x"),
            Err(TransportError::Other(_))
        ));
        transport.upload("/open", b"x").unwrap();
    }
}
