//! # bootmeta-core
//!
//! Core library for editing the boot-time assets (four textures and one
//! sound) of titles installed on a game console, over a remote
//! file-transfer session.
//!
//! This crate provides the foundational functionality for:
//! - Decoding and encoding the console's native texture format (a
//!   restricted TGA variant) and boot sound format ("btsnd")
//! - Converting to and from interchange formats (PNG, RIFF/WAVE)
//! - Enumerating installed titles and lazily fetching their metadata
//! - Tracking local edits and syncing them back in batches
//! - Bulk backup and restore of title metadata to a zip archive
//!
//! ## Modules
//!
//! - [`config`] - Persisted CLI settings
//! - [`error`] - Error types and Result alias
//! - [`image`] - Boot texture type and TGA/PNG codecs
//! - [`meta`] - Per-title metadata bundle and edit tracking
//! - [`progress`] - Thread-safe progress reporting
//! - [`sound`] - Boot sound type and btsnd/WAVE codecs
//! - [`sync`] - The title synchronization engine
//! - [`title`] - Title identity and remote path conventions
//! - [`transport`] - Remote file transfer abstraction
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bootmeta_core::{LocalTransport, TitleSyncEngine};
//!
//! let engine = TitleSyncEngine::new();
//! engine
//!     .connect(Arc::new(LocalTransport::new("/mnt/wiiu")))
//!     .expect("connect failed");
//! for id in engine.titles() {
//!     println!("{id}");
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod image;
pub mod meta;
pub mod progress;
pub mod sound;
pub mod sync;
pub mod title;
pub mod transport;

// Re-export key types for convenience

pub use config::Config;
pub use error::{Error, Result};
pub use image::{Image, ImageError, TgaDepth};
pub use meta::TitleMeta;
pub use progress::ProgressReport;
pub use sound::{Sound, SoundError, SoundTarget, WaveError};
pub use sync::TitleSyncEngine;
pub use title::{Storage, TitleId};
pub use transport::{LocalTransport, MemoryTransport, Transport, TransportError};
