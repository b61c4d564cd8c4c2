//! Main synchronization engine

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};
use crate::image::TgaDepth;
use crate::meta::TitleMeta;
use crate::progress::ProgressReport;
use crate::title::{
    Storage, TitleId, BACKUP_FILES, BOOT_DRC_TEX, BOOT_LOGO_TEX, BOOT_SOUND, BOOT_TV_TEX,
    DLC_HIGH_DIR, ICON_TEX, META_FILES,
};
use crate::transport::{Transport, TransportError};

/// Five metadata files re-encoded and uploaded per dirty title.
const UPLOADS_PER_TITLE: usize = META_FILES.len();

/// Six downloads plus one archive flush per title during backup.
const BACKUP_STEPS_PER_TITLE: usize = BACKUP_FILES.len() + 1;

/// Orchestrates fetch, edit tracking and batch transfer of boot assets.
///
/// Every method takes `&self`; the engine is meant to live in an `Arc`,
/// with one caller-owned worker thread running the blocking operations
/// (`connect`, `get_title`, `sync_dirty`, `backup`, `restore`) while
/// other threads poll `is_dirty`, `dirty_titles` and already-cached
/// `get_title` results. The engine performs no internal queuing: callers
/// must not start a blocking operation before the previous one finished.
///
/// The metadata cache and the raw-file cache each sit behind their own
/// lock, held only for lookup/insert/clear; no transport call ever runs
/// while a cache lock is held.
pub struct TitleSyncEngine {
    session: Mutex<Option<Arc<dyn Transport>>>,
    titles: Mutex<Vec<TitleId>>,
    meta_cache: Mutex<HashMap<TitleId, Arc<Mutex<TitleMeta>>>>,
    file_cache: Mutex<HashMap<String, Vec<u8>>>,
    last_error: Mutex<Option<String>>,
}

impl TitleSyncEngine {
    pub fn new() -> Self {
        Self {
            session: Mutex::new(None),
            titles: Mutex::new(Vec::new()),
            meta_cache: Mutex::new(HashMap::new()),
            file_cache: Mutex::new(HashMap::new()),
            last_error: Mutex::new(None),
        }
    }

    pub fn connected(&self) -> bool {
        self.session.lock().unwrap().is_some()
    }

    /// Message of the most recent failed operation, for display.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }

    /// Open a session over `transport` and enumerate every installed title.
    ///
    /// Both caches and the title list are cleared up front. Enumeration
    /// walks the two storage roots, skips the DLC high directory, and
    /// combines each high/low directory pair into a title id. Any listing
    /// failure discards everything found so far and drops the session.
    pub fn connect(&self, transport: Arc<dyn Transport>) -> Result<()> {
        self.meta_cache.lock().unwrap().clear();
        self.file_cache.lock().unwrap().clear();
        self.titles.lock().unwrap().clear();
        *self.session.lock().unwrap() = Some(transport.clone());

        match enumerate_titles(transport.as_ref()) {
            Ok(titles) => {
                tracing::info!("connected, {} titles found", titles.len());
                *self.titles.lock().unwrap() = titles;
                Ok(())
            }
            Err(err) => {
                *self.session.lock().unwrap() = None;
                Err(self.record(Error::Connection(err.to_string())))
            }
        }
    }

    /// Titles discovered by the last successful `connect`, in listing order.
    pub fn titles(&self) -> Vec<TitleId> {
        self.titles.lock().unwrap().clone()
    }

    /// Fetch (or return the cached) metadata bundle for `id`.
    ///
    /// Downloads go through the raw-file cache, so bytes already pulled
    /// by an earlier backup are parsed without further I/O. Progress is
    /// reset to one step per file, advanced before each fetch.
    pub fn get_title(
        &self,
        id: &TitleId,
        progress: Option<&ProgressReport>,
    ) -> Result<Arc<Mutex<TitleMeta>>> {
        self.get_title_inner(id, progress)
            .map_err(|err| self.record(err))
    }

    fn get_title_inner(
        &self,
        id: &TitleId,
        progress: Option<&ProgressReport>,
    ) -> Result<Arc<Mutex<TitleMeta>>> {
        if let Some(meta) = self.meta_cache.lock().unwrap().get(id) {
            return Ok(meta.clone());
        }
        let transport = self.transport()?;

        if let Some(progress) = progress {
            progress.set_total(META_FILES.len());
        }

        let mut blobs = Vec::with_capacity(META_FILES.len());
        for filename in META_FILES {
            if let Some(progress) = progress {
                progress.advance(filename);
            }
            let path = id.meta_path(filename);
            let bytes = self
                .download_cached(transport.as_ref(), &path)
                .map_err(|err| match err {
                    TransportError::NotFound(_) => Error::MissingFile {
                        filename: filename.to_string(),
                    },
                    other => Error::Connection(other.to_string()),
                })?;
            blobs.push(bytes);
        }

        let meta = TitleMeta::from_files(&blobs[0], &blobs[1], &blobs[2], &blobs[3], &blobs[4])?;
        let meta = Arc::new(Mutex::new(meta));
        self.meta_cache.lock().unwrap().insert(id.clone(), meta.clone());
        tracing::debug!("cached metadata for {}", id);
        Ok(meta)
    }

    /// Whether `id` has unsynced local edits.
    pub fn is_dirty(&self, id: &TitleId) -> bool {
        self.meta_cache
            .lock()
            .unwrap()
            .get(id)
            .is_some_and(|meta| meta.lock().unwrap().is_dirty())
    }

    /// Every title with unsynced local edits, in title-list order.
    pub fn dirty_titles(&self) -> Vec<TitleId> {
        let cache = self.meta_cache.lock().unwrap();
        self.titles
            .lock()
            .unwrap()
            .iter()
            .filter(|id| cache.get(id).is_some_and(|m| m.lock().unwrap().is_dirty()))
            .cloned()
            .collect()
    }

    /// Re-encode and upload every dirty title's five metadata files.
    ///
    /// The dirty set is snapshotted once; titles edited mid-run wait for
    /// the next call. Per title the upload order is fixed: boot sound,
    /// then the two boot textures at 24 bits, then logo and icon at 32.
    /// The first failing upload aborts the whole call, and a title's
    /// dirty flag clears only after all five of its files are up.
    pub fn sync_dirty(&self, progress: Option<&ProgressReport>) -> Result<()> {
        self.sync_dirty_inner(progress).map_err(|err| self.record(err))
    }

    fn sync_dirty_inner(&self, progress: Option<&ProgressReport>) -> Result<()> {
        let transport = self.transport()?;
        let dirty = self.dirty_titles();

        if let Some(progress) = progress {
            progress.set_total(dirty.len() * UPLOADS_PER_TITLE);
        }

        for id in &dirty {
            let meta = match self.meta_cache.lock().unwrap().get(id) {
                Some(meta) => meta.clone(),
                None => continue,
            };

            let files: [(&str, Vec<u8>); UPLOADS_PER_TITLE] = {
                let meta = meta.lock().unwrap();
                [
                    (BOOT_SOUND, meta.sound().to_btsnd()),
                    (BOOT_DRC_TEX, meta.drc_tex().to_tga(TgaDepth::Bpp24)),
                    (BOOT_TV_TEX, meta.tv_tex().to_tga(TgaDepth::Bpp24)),
                    (BOOT_LOGO_TEX, meta.logo_tex().to_tga(TgaDepth::Bpp32)),
                    (ICON_TEX, meta.icon_tex().to_tga(TgaDepth::Bpp32)),
                ]
            };

            for (filename, bytes) in files {
                let path = id.meta_path(filename);
                if let Some(progress) = progress {
                    progress.advance(path.clone());
                }
                transport
                    .upload(&path, &bytes)
                    .map_err(|err| Error::Connection(err.to_string()))?;
                self.file_cache.lock().unwrap().insert(path, bytes);
            }

            meta.lock().unwrap().clear_dirty();
            tracing::info!("synced {}", id);
        }

        Ok(())
    }

    /// Snapshot every known title's metadata directory into a zip archive.
    ///
    /// Any existing file at `archive_path` is overwritten. Six files per
    /// title are attempted; a file absent on the console is simply left
    /// out of the archive, while any other transport failure aborts. The
    /// archive is flushed after each title, so a mid-run failure leaves
    /// the titles already processed durably recorded.
    pub fn backup(&self, archive_path: &Path, progress: Option<&ProgressReport>) -> Result<()> {
        self.backup_inner(archive_path, progress)
            .map_err(|err| self.record(err))
    }

    fn backup_inner(&self, archive_path: &Path, progress: Option<&ProgressReport>) -> Result<()> {
        let transport = self.transport()?;
        let titles = self.titles();

        if let Some(progress) = progress {
            progress.set_total(titles.len() * BACKUP_STEPS_PER_TITLE);
        }

        let file = File::create(archive_path).map_err(|err| Error::Archive(err.to_string()))?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for id in &titles {
            for filename in BACKUP_FILES {
                let path = id.meta_path(filename);
                if let Some(progress) = progress {
                    progress.advance(path.clone());
                }
                let bytes = match self.download_cached(transport.as_ref(), &path) {
                    Ok(bytes) => bytes,
                    // A title without e.g. meta.xml is legal; skip the entry.
                    Err(TransportError::NotFound(_)) => continue,
                    Err(err) => return Err(Error::Connection(err.to_string())),
                };
                zip.start_file(format!("{}/{}", id.archive_dir(), filename), options)
                    .map_err(|err| Error::Archive(err.to_string()))?;
                zip.write_all(&bytes)
                    .map_err(|err| Error::Archive(err.to_string()))?;
            }
            if let Some(progress) = progress {
                progress.advance(format!("{id}: flush"));
            }
            zip.flush().map_err(|err| Error::Archive(err.to_string()))?;
            tracing::debug!("archived {}", id);
        }

        zip.finish().map_err(|err| Error::Archive(err.to_string()))?;
        tracing::info!("backup written to {}", archive_path.display());
        Ok(())
    }

    /// Upload archived metadata files back to the console.
    ///
    /// Entries absent from the archive are skipped; partial archives are
    /// legal. Any upload failure aborts. On completion both caches are
    /// cleared so subsequent reads reflect the restored data.
    pub fn restore(&self, archive_path: &Path, progress: Option<&ProgressReport>) -> Result<()> {
        self.restore_inner(archive_path, progress)
            .map_err(|err| self.record(err))
    }

    fn restore_inner(&self, archive_path: &Path, progress: Option<&ProgressReport>) -> Result<()> {
        let transport = self.transport()?;

        let file = File::open(archive_path).map_err(|err| Error::Archive(err.to_string()))?;
        let mut archive = ZipArchive::new(file).map_err(|err| Error::Archive(err.to_string()))?;

        let titles = self.titles();
        if let Some(progress) = progress {
            progress.set_total(titles.len() * BACKUP_FILES.len());
        }

        for id in &titles {
            for filename in BACKUP_FILES {
                let entry_name = format!("{}/{}", id.archive_dir(), filename);
                if let Some(progress) = progress {
                    progress.advance(entry_name.clone());
                }
                let mut bytes = Vec::new();
                match archive.by_name(&entry_name) {
                    Ok(mut entry) => {
                        entry
                            .read_to_end(&mut bytes)
                            .map_err(|err| Error::Archive(err.to_string()))?;
                    }
                    Err(ZipError::FileNotFound) => continue,
                    Err(err) => return Err(Error::Archive(err.to_string())),
                }
                transport
                    .upload(&id.meta_path(filename), &bytes)
                    .map_err(|err| Error::Connection(err.to_string()))?;
            }
        }

        // Everything parsed or fetched before the restore is stale now.
        self.meta_cache.lock().unwrap().clear();
        self.file_cache.lock().unwrap().clear();
        tracing::info!("restore from {} complete", archive_path.display());
        Ok(())
    }

    fn transport(&self) -> Result<Arc<dyn Transport>> {
        self.session
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Connection("not connected".to_string()))
    }

    /// Check the raw-file cache before issuing network I/O; a fresh
    /// download populates it. The lock is never held across the transfer.
    fn download_cached(
        &self,
        transport: &dyn Transport,
        path: &str,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        if let Some(bytes) = self.file_cache.lock().unwrap().get(path) {
            return Ok(bytes.clone());
        }
        let bytes = transport.download(path)?;
        self.file_cache
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.clone());
        Ok(bytes)
    }

    fn record(&self, err: Error) -> Error {
        tracing::warn!("{}", err);
        *self.last_error.lock().unwrap() = Some(err.to_string());
        err
    }
}

impl Default for TitleSyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn enumerate_titles(
    transport: &dyn Transport,
) -> std::result::Result<Vec<TitleId>, TransportError> {
    let mut titles = Vec::new();
    for storage in [Storage::Mlc, Storage::Usb] {
        let base = format!("/{}/usr/title", storage.root());
        for high in transport.list(&base)? {
            if high == DLC_HIGH_DIR {
                continue;
            }
            for low in transport.list(&format!("{base}/{high}"))? {
                titles.push(TitleId::new(&high, &low, storage));
            }
        }
    }
    Ok(titles)
}
