//! Error types for bootmeta-core

use thiserror::Error;

use crate::image::ImageError;
use crate::sound::SoundError;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum Error {
    /// Any transport or session failure other than "not found"
    #[error("connection error: {0}")]
    Connection(String),

    /// A metadata file that should exist on the console is absent
    #[error("missing file on console: {filename}")]
    MissingFile { filename: String },

    /// A replacement image must match the dimensions of the slot it targets
    #[error("image is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    SizeMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Sound(#[from] SoundError),

    /// Failed to create, open or write a backup archive
    #[error("archive error: {0}")]
    Archive(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;
