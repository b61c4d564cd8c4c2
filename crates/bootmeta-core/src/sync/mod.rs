//! Title synchronization engine and batch transfer operations.

mod engine;

pub use engine::TitleSyncEngine;
